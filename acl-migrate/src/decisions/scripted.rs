//! Deterministic resolver that answers prompts from a fixed script.

use super::{DecisionError, DecisionResolver};
use async_trait::async_trait;
use secrecy::SecretString;
use std::collections::VecDeque;
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    Select(String),
    Confirm(bool),
    Text(String),
    Secret(String),
}

impl Answer {
    pub fn select(choice: impl Into<String>) -> Self {
        Answer::Select(choice.into())
    }

    pub fn text(text: impl Into<String>) -> Self {
        Answer::Text(text.into())
    }

    fn describe(&self) -> String {
        format!("{:?}", self)
    }
}

#[derive(Debug, Default)]
struct ScriptState {
    answers: VecDeque<Answer>,
    prompts: Vec<String>,
    displayed: Vec<String>,
}

/// Answers prompts in order from a queue. A prompt of the wrong kind, or one
/// arriving after the queue is empty, is an error rather than a guess.
#[derive(Debug, Default)]
pub struct ScriptedResolver {
    state: Mutex<ScriptState>,
}

impl ScriptedResolver {
    pub fn new(answers: impl IntoIterator<Item = Answer>) -> Self {
        Self {
            state: Mutex::new(ScriptState {
                answers: answers.into_iter().collect(),
                ..Default::default()
            }),
        }
    }

    /// Every prompt asked so far.
    pub fn prompts(&self) -> Vec<String> {
        self.with_state(|s| s.prompts.clone())
    }

    /// Every message shown so far.
    pub fn displayed(&self) -> Vec<String> {
        self.with_state(|s| s.displayed.clone())
    }

    pub fn remaining(&self) -> usize {
        self.with_state(|s| s.answers.len())
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut ScriptState) -> T) -> T {
        let mut guard = self
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut guard)
    }

    fn next(&self, prompt: &str) -> Result<Answer, DecisionError> {
        self.with_state(|s| {
            s.prompts.push(prompt.to_string());
            s.answers
                .pop_front()
                .ok_or_else(|| DecisionError::ScriptExhausted(prompt.to_string()))
        })
    }
}

fn unexpected(answer: &Answer, prompt: &str) -> DecisionError {
    DecisionError::UnexpectedPrompt {
        answer: answer.describe(),
        prompt: prompt.to_string(),
    }
}

#[async_trait]
impl DecisionResolver for ScriptedResolver {
    async fn select_one(&self, prompt: &str, choices: &[String]) -> Result<String, DecisionError> {
        match self.next(prompt)? {
            Answer::Select(choice) if choices.contains(&choice) => Ok(choice),
            Answer::Select(choice) => Err(DecisionError::UnknownChoice(choice)),
            other => Err(unexpected(&other, prompt)),
        }
    }

    async fn confirm(&self, prompt: &str) -> Result<bool, DecisionError> {
        match self.next(prompt)? {
            Answer::Confirm(yes) => Ok(yes),
            other => Err(unexpected(&other, prompt)),
        }
    }

    async fn free_text(
        &self,
        prompt: &str,
        _candidates: &[String],
    ) -> Result<String, DecisionError> {
        match self.next(prompt)? {
            Answer::Text(text) => Ok(text),
            other => Err(unexpected(&other, prompt)),
        }
    }

    async fn secret(&self, prompt: &str) -> Result<SecretString, DecisionError> {
        match self.next(prompt)? {
            Answer::Secret(text) => Ok(SecretString::new(text)),
            other => Err(unexpected(&other, prompt)),
        }
    }

    fn display(&self, message: &str) {
        self.with_state(|s| s.displayed.push(message.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_answers_in_order() {
        let resolver = ScriptedResolver::new([Answer::Confirm(true), Answer::text("Finance")]);
        assert!(resolver.confirm("Continue?").await.unwrap());
        assert_eq!(resolver.free_text("Group:", &[]).await.unwrap(), "Finance");
        assert_eq!(resolver.remaining(), 0);
        assert_eq!(resolver.prompts(), vec!["Continue?", "Group:"]);
    }

    #[tokio::test]
    async fn test_exhausted_script_is_an_error() {
        let resolver = ScriptedResolver::new([]);
        let err = resolver.confirm("Continue?").await.unwrap_err();
        assert!(matches!(err, DecisionError::ScriptExhausted(_)));
    }

    #[tokio::test]
    async fn test_wrong_answer_kind_is_an_error() {
        let resolver = ScriptedResolver::new([Answer::Confirm(true)]);
        let err = resolver.free_text("Group:", &[]).await.unwrap_err();
        assert!(matches!(err, DecisionError::UnexpectedPrompt { .. }));
    }

    #[tokio::test]
    async fn test_selection_must_be_offered() {
        let resolver = ScriptedResolver::new([Answer::select("Payroll")]);
        let choices = vec!["Finance".to_string()];
        let err = resolver.select_one("Pick:", &choices).await.unwrap_err();
        assert!(matches!(err, DecisionError::UnknownChoice(_)));
    }
}
