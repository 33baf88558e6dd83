//! Interactive yes/no confirmation.
//!
//! Every destructive or state-changing action goes through a [`Prompt`]
//! so the decision logic can be exercised in tests without a terminal.

use std::io::{self, Write};

use colored::Colorize;

/// Asks yes/no questions and returns the operator's decision.
pub trait Prompt {
    fn confirm(&mut self, question: &str, default: bool) -> io::Result<bool>;
}

/// Reads answers from stdin.
pub struct StdinPrompt;

impl Prompt for StdinPrompt {
    fn confirm(&mut self, question: &str, default: bool) -> io::Result<bool> {
        let hint = if default { "[Y/n]" } else { "[y/N]" };
        print!("{} {} ", question, hint.dimmed());
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;

        Ok(match input.trim().to_lowercase().as_str() {
            "y" | "yes" => true,
            "n" | "no" => false,
            _ => default,
        })
    }
}

/// Answers yes to everything. Backs the global `--yes` flag.
pub struct AssumeYes;

impl Prompt for AssumeYes {
    fn confirm(&mut self, _question: &str, _default: bool) -> io::Result<bool> {
        Ok(true)
    }
}

/// Scripted answers for tests, consumed in order.
#[cfg(test)]
pub struct ScriptedPrompt {
    answers: std::collections::VecDeque<bool>,
}

#[cfg(test)]
impl ScriptedPrompt {
    pub fn new(answers: impl IntoIterator<Item = bool>) -> Self {
        Self {
            answers: answers.into_iter().collect(),
        }
    }
}

#[cfg(test)]
impl Prompt for ScriptedPrompt {
    fn confirm(&mut self, question: &str, _default: bool) -> io::Result<bool> {
        self.answers
            .pop_front()
            .ok_or_else(|| io::Error::other(format!("unexpected prompt: {question}")))
    }
}
