//! Interactive chat loop

use aivo_rag::ChatBot;
use std::future::Future;
use std::io::{self, BufRead, Write};
use tokio::sync::mpsc;

pub const FAREWELL: &str = "Goodbye!";

const BANNER: &str = "Welcome to KTU Virtual Professor Assistant - AIVO\n\
Type 'quit' to exit the session.\n\
You can ask questions about the course materials.";

/// What a line of user input asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Quit,
    Empty,
    Query(String),
}

impl Input {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Self::Empty;
        }
        match line.to_lowercase().as_str() {
            "quit" | "exit" | "bye" => Self::Quit,
            _ => Self::Query(line.to_string()),
        }
    }
}

/// Read stdin lines on a dedicated thread
///
/// A blocking stdin read cannot be cancelled, so it stays off the runtime;
/// the thread ends with the process.
pub fn spawn_stdin_lines() -> mpsc::Receiver<io::Result<String>> {
    spawn_line_reader(io::BufReader::new(io::stdin()))
}

/// Forward lines from `reader` until it ends or the receiver goes away
///
/// A line that is not valid UTF-8 is sent as an `InvalidData` error and
/// reading continues with the next line.
pub fn spawn_line_reader<R>(mut reader: R) -> mpsc::Receiver<io::Result<String>>
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = mpsc::channel(1);
    std::thread::spawn(move || {
        let mut buf = Vec::new();
        loop {
            buf.clear();
            let line = match reader.read_until(b'\n', &mut buf) {
                Ok(0) => break,
                Ok(_) => decode_line(&buf),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    let _ = tx.blocking_send(Err(e));
                    break;
                }
            };
            if tx.blocking_send(line).is_err() {
                break;
            }
        }
    });
    rx
}

fn decode_line(raw: &[u8]) -> io::Result<String> {
    let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8(raw.to_vec()).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

/// Run the chat session until the user quits, input ends, or `shutdown` fires
///
/// Errors from a single turn are printed and the loop continues.
pub async fn run<W, S>(
    bot: &mut ChatBot,
    mut lines: mpsc::Receiver<io::Result<String>>,
    out: &mut W,
    shutdown: S,
) -> io::Result<()>
where
    W: Write,
    S: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    writeln!(out, "{BANNER}")?;

    loop {
        write!(out, "\nYou: ")?;
        out.flush()?;

        let line = tokio::select! {
            _ = &mut shutdown => break,
            line = lines.recv() => line,
        };

        let line = match line {
            Some(Ok(line)) => line,
            Some(Err(e)) => {
                writeln!(out, "An error occurred: {e}")?;
                continue;
            }
            None => break,
        };

        let query = match Input::parse(&line) {
            Input::Quit => break,
            Input::Empty => continue,
            Input::Query(query) => query,
        };

        let reply = tokio::select! {
            _ = &mut shutdown => break,
            reply = bot.respond(&query) => reply,
        };

        match reply {
            Ok(answer) => writeln!(out, "\nProf. AIVO: {answer}")?,
            Err(e) => {
                tracing::error!(kind = e.kind(), "Turn failed: {e}");
                writeln!(out, "An error occurred: {e}")?;
            }
        }
    }

    writeln!(out, "\n{FAREWELL}")?;
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use aivo_core::{AivoError, GenerationParams, LlmClient, Passage, PassageSearch, Result};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct OnePassage;

    #[async_trait]
    impl PassageSearch for OnePassage {
        async fn search(&self, _query: &str, _top_k: usize) -> Result<Vec<Passage>> {
            Ok(vec![Passage::new("Context.", 1.0)])
        }

        fn name(&self) -> &str {
            "one"
        }
    }

    /// Echoes the call number; fails on the calls listed
    struct CountingLlm {
        calls: AtomicUsize,
        fail_on: Vec<usize>,
    }

    #[async_trait]
    impl LlmClient for CountingLlm {
        async fn generate(&self, _prompt: &str, _params: &GenerationParams) -> Result<String> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if self.fail_on.contains(&n) {
                return Err(AivoError::Backend {
                    status: 503,
                    body: "loading".to_string(),
                });
            }
            Ok(format!("answer {n}"))
        }

        fn model(&self) -> &str {
            "counting"
        }
    }

    fn bot(fail_on: Vec<usize>) -> (ChatBot, Arc<CountingLlm>) {
        let llm = Arc::new(CountingLlm {
            calls: AtomicUsize::new(0),
            fail_on,
        });
        (ChatBot::new(Arc::new(OnePassage), llm.clone()), llm)
    }

    fn feed(lines: &[&str]) -> mpsc::Receiver<io::Result<String>> {
        let (tx, rx) = mpsc::channel(lines.len().max(1));
        for line in lines {
            tx.try_send(Ok(line.to_string())).unwrap();
        }
        rx
    }

    async fn transcript(bot: &mut ChatBot, lines: &[&str]) -> String {
        let mut out = Vec::new();
        run(bot, feed(lines), &mut out, std::future::pending())
            .await
            .unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_input_parse() {
        assert_eq!(Input::parse("  QUIT "), Input::Quit);
        assert_eq!(Input::parse("Exit"), Input::Quit);
        assert_eq!(Input::parse("bye"), Input::Quit);
        assert_eq!(Input::parse("   "), Input::Empty);
        assert_eq!(
            Input::parse(" What is a semaphore? "),
            Input::Query("What is a semaphore?".to_string())
        );
        assert_eq!(
            Input::parse("quit please"),
            Input::Query("quit please".to_string())
        );
    }

    #[tokio::test]
    async fn test_quit_ends_session_with_farewell() {
        let (mut bot, llm) = bot(vec![]);
        let out = transcript(&mut bot, &["What is paging?", "quit", "ignored"]).await;

        assert!(out.starts_with("Welcome to KTU Virtual Professor Assistant - AIVO"));
        assert!(out.contains("Prof. AIVO: answer 1"));
        assert!(out.trim_end().ends_with(FAREWELL));
        assert_eq!(llm.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_empty_lines_are_skipped() {
        let (mut bot, llm) = bot(vec![]);
        transcript(&mut bot, &["", "   ", "q"]).await;

        assert_eq!(llm.calls.load(Ordering::SeqCst), 1);
        assert_eq!(bot.session().len(), 1);
    }

    #[tokio::test]
    async fn test_end_of_input_says_goodbye() {
        let (mut bot, _) = bot(vec![]);
        let out = transcript(&mut bot, &[]).await;
        assert!(out.trim_end().ends_with(FAREWELL));
    }

    #[tokio::test]
    async fn test_generation_failure_prints_apology_and_continues() {
        let (mut bot, _) = bot(vec![1]);
        let out = transcript(&mut bot, &["first", "second"]).await;

        assert!(out.contains(&format!("Prof. AIVO: {}", aivo_rag::APOLOGY)));
        assert!(out.contains("Prof. AIVO: answer 2"));
        assert_eq!(bot.session().len(), 1);
    }

    #[tokio::test]
    async fn test_read_error_is_printed_and_loop_continues() {
        let (tx, rx) = mpsc::channel(3);
        tx.try_send(Err(io::Error::new(io::ErrorKind::InvalidData, "bad utf-8")))
            .unwrap();
        tx.try_send(Ok("q".to_string())).unwrap();
        drop(tx);

        let (mut bot, _) = bot(vec![]);
        let mut out = Vec::new();
        run(&mut bot, rx, &mut out, std::future::pending())
            .await
            .unwrap();
        let out = String::from_utf8(out).unwrap();

        assert!(out.contains("An error occurred: bad utf-8"));
        assert!(out.contains("Prof. AIVO: answer 1"));
    }

    #[test]
    fn test_decode_line_strips_line_endings() {
        assert_eq!(decode_line(b"paging\r\n").unwrap(), "paging");
        assert_eq!(decode_line(b"paging\n").unwrap(), "paging");
        assert_eq!(decode_line(b"paging").unwrap(), "paging");
        let err = decode_line(b"bad\xff\n").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[tokio::test]
    async fn test_undecodable_line_does_not_end_session() {
        let reader = io::Cursor::new(b"bad\xff\nq\nquit\n".to_vec());
        let (mut bot, llm) = bot(vec![]);
        let mut out = Vec::new();
        run(
            &mut bot,
            spawn_line_reader(reader),
            &mut out,
            std::future::pending(),
        )
        .await
        .unwrap();
        let out = String::from_utf8(out).unwrap();

        assert!(out.contains("An error occurred:"));
        assert!(out.contains("Prof. AIVO: answer 1"));
        assert_eq!(llm.calls.load(Ordering::SeqCst), 1);
        assert!(out.trim_end().ends_with(FAREWELL));
    }

    #[tokio::test]
    async fn test_shutdown_signal_ends_session() {
        let (_tx, rx) = mpsc::channel::<io::Result<String>>(1);
        let (mut bot, _) = bot(vec![]);
        let mut out = Vec::new();

        run(&mut bot, rx, &mut out, async {}).await.unwrap();

        let out = String::from_utf8(out).unwrap();
        assert!(out.trim_end().ends_with(FAREWELL));
    }
}
