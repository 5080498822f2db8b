//! Interactive terminal resolver built on rustyline.
//!
//! Each prompt runs on a dedicated thread with its own editor so the async
//! pipeline is never parked on stdin.

use super::{DecisionError, DecisionResolver};
use async_trait::async_trait;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};
use secrecy::SecretString;
use std::borrow::Cow;

/// Completion candidates shown per Tab press.
const MAX_COMPLETIONS: usize = 20;

#[derive(Debug, Default, Clone)]
pub struct TerminalResolver;

impl TerminalResolver {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DecisionResolver for TerminalResolver {
    async fn select_one(&self, prompt: &str, choices: &[String]) -> Result<String, DecisionError> {
        if choices.is_empty() {
            return Err(DecisionError::UnknownChoice(prompt.to_string()));
        }
        let prompt = prompt.to_string();
        let choices = choices.to_vec();

        run_on_prompt_thread(move || {
            let mut rl = plain_editor()?;
            println!("{}", prompt);
            for (i, choice) in choices.iter().enumerate() {
                println!("  {:>3}) {}", i + 1, choice);
            }
            loop {
                let line = read(&mut rl, &format!("Select [1-{}]: ", choices.len()))?;
                let line = line.trim();
                if let Ok(n) = line.parse::<usize>()
                    && (1..=choices.len()).contains(&n)
                {
                    return Ok(choices[n - 1].clone());
                }
                if let Some(choice) = choices.iter().find(|c| c.as_str() == line) {
                    return Ok(choice.clone());
                }
                println!("Please enter a number between 1 and {}.", choices.len());
            }
        })
        .await
    }

    async fn confirm(&self, prompt: &str) -> Result<bool, DecisionError> {
        let prompt = format!("{} (y/n) ", prompt);

        run_on_prompt_thread(move || {
            let mut rl = plain_editor()?;
            loop {
                let line = read(&mut rl, &prompt)?;
                match line.trim().to_lowercase().as_str() {
                    "y" | "yes" => return Ok(true),
                    "n" | "no" => return Ok(false),
                    _ => println!("Please answer y or n."),
                }
            }
        })
        .await
    }

    async fn free_text(
        &self,
        prompt: &str,
        candidates: &[String],
    ) -> Result<String, DecisionError> {
        let prompt = prompt.to_string();
        let candidates = candidates.to_vec();

        run_on_prompt_thread(move || {
            let mut rl: Editor<PromptHelper, DefaultHistory> =
                Editor::new().map_err(|e| DecisionError::Io(e.to_string()))?;
            rl.set_helper(Some(PromptHelper {
                candidates,
                masked: false,
            }));
            Ok(read(&mut rl, &prompt)?.trim().to_string())
        })
        .await
    }

    async fn secret(&self, prompt: &str) -> Result<SecretString, DecisionError> {
        let prompt = prompt.to_string();

        run_on_prompt_thread(move || {
            let mut rl: Editor<PromptHelper, DefaultHistory> =
                Editor::new().map_err(|e| DecisionError::Io(e.to_string()))?;
            rl.set_helper(Some(PromptHelper {
                candidates: Vec::new(),
                masked: true,
            }));
            Ok(SecretString::new(read(&mut rl, &prompt)?))
        })
        .await
    }

    fn display(&self, message: &str) {
        println!("{}", message);
    }
}

/// Run one prompt on its own OS thread. A detached thread never holds up
/// runtime shutdown, so a signal during an open prompt still exits.
async fn run_on_prompt_thread<T, F>(f: F) -> Result<T, DecisionError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, DecisionError> + Send + 'static,
{
    let (tx, rx) = tokio::sync::oneshot::channel();
    std::thread::Builder::new()
        .name("acl-prompt".into())
        .spawn(move || {
            let _ = tx.send(f());
        })
        .map_err(|e| DecisionError::Io(e.to_string()))?;

    rx.await.map_err(|e| DecisionError::Io(e.to_string()))?
}

fn plain_editor() -> Result<Editor<(), DefaultHistory>, DecisionError> {
    Editor::new().map_err(|e| DecisionError::Io(e.to_string()))
}

fn read<H: Helper>(rl: &mut Editor<H, DefaultHistory>, prompt: &str) -> Result<String, DecisionError> {
    match rl.readline(prompt) {
        Ok(line) => Ok(line),
        Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => Err(DecisionError::Interrupted),
        Err(e) => Err(DecisionError::Io(e.to_string())),
    }
}

/// Rank `candidates` against `input`: every input character must appear in
/// order (case-insensitive), closer names first.
pub fn fuzzy_rank<'a>(input: &str, candidates: &'a [String]) -> Vec<&'a String> {
    let needle = input.to_lowercase();
    let mut ranked: Vec<(f64, &String)> = candidates
        .iter()
        .filter(|c| is_subsequence(&needle, &c.to_lowercase()))
        .map(|c| (strsim::jaro_winkler(&needle, &c.to_lowercase()), c))
        .collect();
    ranked.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
    ranked.into_iter().map(|(_, c)| c).collect()
}

fn is_subsequence(needle: &str, haystack: &str) -> bool {
    let mut hay = haystack.chars();
    needle.chars().all(|n| hay.any(|h| h == n))
}

struct PromptHelper {
    candidates: Vec<String>,
    masked: bool,
}

impl Completer for PromptHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        // Names contain spaces, so the whole line is the word being completed.
        let matches = fuzzy_rank(&line[..pos], &self.candidates)
            .into_iter()
            .take(MAX_COMPLETIONS)
            .map(|c| Pair {
                display: c.clone(),
                replacement: c.clone(),
            })
            .collect();
        Ok((0, matches))
    }
}

impl Hinter for PromptHelper {
    type Hint = String;
}

impl Highlighter for PromptHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if self.masked {
            Cow::Owned("*".repeat(line.chars().count()))
        } else {
            Cow::Borrowed(line)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        self.masked
    }
}

impl Validator for PromptHelper {}

impl Helper for PromptHelper {}
