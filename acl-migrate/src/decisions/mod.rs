//! Operator decision port.
//!
//! Matching never prompts directly. It asks a [`DecisionResolver`], which is
//! the terminal in normal runs and a [`ScriptedResolver`] in headless runs and
//! tests.

pub mod scripted;
pub mod terminal;

use async_trait::async_trait;
use migrate_core::error::AppError;
use secrecy::SecretString;
use thiserror::Error;

pub use scripted::{Answer, ScriptedResolver};
pub use terminal::TerminalResolver;

/// Appended to every candidate list; choosing it declines the match.
pub const NONE_OF_THESE: &str = "None of these";

/// Typed at a free-text prompt to decline.
pub const MANUAL_DECLINE: &str = "None";

#[derive(Error, Debug)]
pub enum DecisionError {
    #[error("Terminal error: {0}")]
    Io(String),

    #[error("Prompt interrupted")]
    Interrupted,

    #[error("No scripted answer left for prompt: {0}")]
    ScriptExhausted(String),

    #[error("Scripted answer {answer} does not fit prompt: {prompt}")]
    UnexpectedPrompt { answer: String, prompt: String },

    #[error("Choice not offered: {0}")]
    UnknownChoice(String),
}

impl From<DecisionError> for AppError {
    fn from(err: DecisionError) -> Self {
        match err {
            DecisionError::Interrupted => AppError::abort("prompt interrupted"),
            other => AppError::Decision(anyhow::Error::new(other)),
        }
    }
}

#[async_trait]
pub trait DecisionResolver: Send + Sync {
    /// Pick exactly one of `choices`. Returns the chosen text.
    async fn select_one(&self, prompt: &str, choices: &[String]) -> Result<String, DecisionError>;

    async fn confirm(&self, prompt: &str) -> Result<bool, DecisionError>;

    /// Free text, completed against `candidates` when there are any.
    async fn free_text(&self, prompt: &str, candidates: &[String])
    -> Result<String, DecisionError>;

    async fn secret(&self, prompt: &str) -> Result<SecretString, DecisionError>;

    /// Show a message to the operator.
    fn display(&self, message: &str);
}

/// Lay out `names` in rows of `per_row`, three spaces apart.
pub fn format_rows(names: &[&str], per_row: usize) -> String {
    names
        .chunks(per_row.max(1))
        .map(|row| row.join("   "))
        .collect::<Vec<_>>()
        .join("\n")
}
