//! Collection management commands

use aivo_vector::CollectionAdmin;
use std::io::{self, BufRead, Write};

/// Requested admin operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminAction {
    List,
    Delete(String),
}

impl AdminAction {
    /// Map command-line flags to an action; `None` means print usage
    ///
    /// An empty `--delete` name counts as no action.
    pub fn from_flags(list: bool, delete: Option<String>) -> Option<Self> {
        if list {
            Some(Self::List)
        } else {
            delete.filter(|name| !name.is_empty()).map(Self::Delete)
        }
    }
}

/// Ask the operator to confirm a deletion
///
/// Only a literal `yes` (any case, surrounding whitespace ignored) confirms.
pub fn confirm_delete<R, W>(input: &mut R, out: &mut W, name: &str) -> io::Result<bool>
where
    R: BufRead,
    W: Write,
{
    write!(
        out,
        "Are you sure you want to delete collection '{name}'? This cannot be undone! (yes/no): "
    )?;
    out.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(answer.trim().eq_ignore_ascii_case("yes"))
}

/// Carry out an admin action
pub async fn execute<R, W>(
    action: AdminAction,
    admin: &CollectionAdmin,
    input: &mut R,
    out: &mut W,
) -> anyhow::Result<()>
where
    R: BufRead,
    W: Write,
{
    match action {
        AdminAction::List => {
            for name in admin.list().await? {
                writeln!(out, "{name}")?;
            }
        }
        AdminAction::Delete(name) => {
            if !confirm_delete(input, out, &name)? {
                writeln!(out, "Operation cancelled")?;
                return Ok(());
            }
            if admin.delete(&name).await {
                writeln!(out, "Deleted collection '{name}'")?;
            } else {
                writeln!(out, "Collection '{name}' was not deleted")?;
            }
        }
    }
    Ok(())
}
