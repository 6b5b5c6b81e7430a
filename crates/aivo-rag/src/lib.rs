//! AIVO RAG - Retrieval-Augmented Generation chat pipeline
//!
//! This crate implements the per-turn pipeline:
//! - Passage retrieval through a [`aivo_core::PassageSearch`] backend
//! - Prompt assembly with character budgets and a bounded history window
//! - Generation through a hosted language model
//! - Bounded, FIFO-evicting conversation history
//!
//! Author: hephaex@gmail.com

pub mod chatbot;
pub mod llm;
pub mod prompt;
pub mod session;

pub use chatbot::{ChatBot, APOLOGY};
pub use llm::{create_llm_client, HuggingFaceClient, OllamaClient};
pub use prompt::{truncate_text, PromptBuilder, PromptConfig, ELLIPSIS};
pub use session::ConversationSession;
