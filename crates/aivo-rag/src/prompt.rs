//! Prompt assembly
//!
//! Splices retrieved passages and the recent conversation into the
//! persona template sent to the language model.

use aivo_core::{ChatConfig, Exchange};

/// Appended to any text cut short by [`truncate_text`]
pub const ELLIPSIS: &str = "...";

/// Separator between reference passages
pub const PASSAGE_SEPARATOR: &str = "\n---\n";

/// Speaker label for the user in rendered history
pub const ASKER_LABEL: &str = "Student";

/// Speaker label for the assistant in rendered history
pub const RESPONDER_LABEL: &str = "Prof. AIVO";

/// Default persona preamble
pub const DEFAULT_PERSONA: &str = "Role: Your name is AIVO (Advanced Intelligent Virtual Orator). You are a knowledgeable professor at KTU University.

Objective: Keep your responses strictly focused on the question asked, providing clear, concise explanations using only the relevant context.

Guidelines:
- If any part of the provided input contains image content, ignore it and process the remaining details.
- Ensure responses are direct, non-conversational, and contain no additional or unrelated information.
- If the exact answer is not found in the context provided, state explicitly: \"Insufficient information.\"
- Process only text-based information from the reference materials.
- Maintain a professional, academic tone throughout responses.
- Focus solely on factual information from the provided context.";

/// Default closing instruction
pub const DEFAULT_CLOSING: &str =
    "Provide a focused explanation addressing only the specific question:";

/// Cut `text` to at most `max_chars` characters
///
/// The cut backs up to the last whitespace inside the limit so words stay
/// whole; with no whitespace to back up to it falls at the limit. Cut text
/// gets [`ELLIPSIS`] appended, text within the limit is returned as is.
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    let Some((cut, _)) = text.char_indices().nth(max_chars) else {
        return text.to_string();
    };

    let prefix = &text[..cut];
    let end = match prefix.rfind(char::is_whitespace) {
        Some(pos) if pos > 0 => pos,
        _ => prefix.len(),
    };

    format!("{}{ELLIPSIS}", &prefix[..end])
}

/// Prompt template settings
#[derive(Debug, Clone)]
pub struct PromptConfig {
    /// Persona/style preamble
    pub persona: String,

    /// Final instruction after the question
    pub closing: String,

    /// Character budget per passage
    pub passage_max_chars: usize,

    /// Character budget per prior answer
    pub response_max_chars: usize,

    /// Number of most recent exchanges rendered
    pub history_window: usize,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            persona: DEFAULT_PERSONA.to_string(),
            closing: DEFAULT_CLOSING.to_string(),
            passage_max_chars: 500,
            response_max_chars: 200,
            history_window: 2,
        }
    }
}

impl From<&ChatConfig> for PromptConfig {
    fn from(config: &ChatConfig) -> Self {
        Self {
            passage_max_chars: config.passage_max_chars,
            response_max_chars: config.response_max_chars,
            history_window: config.history_window,
            ..Default::default()
        }
    }
}

/// Builds the generation prompt
#[derive(Debug, Clone, Default)]
pub struct PromptBuilder {
    config: PromptConfig,
}

impl PromptBuilder {
    pub fn new(config: PromptConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PromptConfig {
        &self.config
    }

    /// Render the prompt for one turn
    ///
    /// Only the last `history_window` entries of `recent` are used.
    pub fn build(&self, query: &str, passages: &[String], recent: &[&Exchange]) -> String {
        let context = passages
            .iter()
            .map(|p| truncate_text(p, self.config.passage_max_chars))
            .collect::<Vec<_>>()
            .join(PASSAGE_SEPARATOR);

        let skip = recent.len().saturating_sub(self.config.history_window);
        let history = recent[skip..]
            .iter()
            .map(|exchange| {
                format!(
                    "{ASKER_LABEL}: {}\n{RESPONDER_LABEL}: {}",
                    exchange.query(),
                    truncate_text(exchange.response(), self.config.response_max_chars)
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            "{persona}\n\nReference Material:\n{context}\n\nConversation History:\n{history}\n\n{ASKER_LABEL}: {query}\n\n{closing}",
            persona = self.config.persona,
            closing = self.config.closing,
        )
    }
}
