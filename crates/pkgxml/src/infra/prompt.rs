//! Confirmation and path-input prompts.
//!
//! Commands never talk to the terminal directly; they go through [`Prompter`] so tests can
//! script the answers.

use std::collections::VecDeque;

use anyhow::{Context, Result, anyhow};
use dialoguer::{Confirm, Input};

/// Attempts allowed before [`prompt_output_path`] gives up on invalid input.
pub const MAX_PATH_ATTEMPTS: usize = 3;

const RETRY_MESSAGE: &str = "Invalid path, do you want to try again?";

/// Synchronous yes/no and text-input oracle.
pub trait Prompter {
    /// Ask a yes/no question.
    fn confirm(&mut self, message: &str) -> Result<bool>;

    /// Ask for a line of text, pre-filled with `default`. `None` means the user dismissed the
    /// prompt.
    fn input(&mut self, label: &str, default: &str) -> Result<Option<String>>;
}

/// Interactive prompts on the controlling terminal.
#[derive(Debug, Default)]
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn confirm(&mut self, message: &str) -> Result<bool> {
        Confirm::new()
            .with_prompt(message)
            .default(false)
            .interact()
            .context("failed to read confirmation")
    }

    fn input(&mut self, label: &str, default: &str) -> Result<Option<String>> {
        let value: String = Input::new()
            .with_prompt(label)
            .with_initial_text(default)
            .allow_empty(true)
            .interact_text()
            .context("failed to read input")?;
        Ok(Some(value))
    }
}

/// Non-interactive answers: every question is confirmed and every default accepted.
#[derive(Debug, Default)]
pub struct AssumeYes;

impl Prompter for AssumeYes {
    fn confirm(&mut self, message: &str) -> Result<bool> {
        tracing::info!(%message, "assuming yes");
        Ok(true)
    }

    fn input(&mut self, _label: &str, default: &str) -> Result<Option<String>> {
        Ok(Some(default.to_owned()))
    }
}

/// A queued answer for [`ScriptedPrompter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    Confirm(bool),
    Input(Option<String>),
    /// Accept whatever default the prompt offers.
    AcceptDefault,
}

/// Replays queued answers and records every question asked.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: VecDeque<Answer>,
    asked: Vec<String>,
}

impl ScriptedPrompter {
    pub fn new(answers: impl IntoIterator<Item = Answer>) -> Self {
        Self {
            answers: answers.into_iter().collect(),
            asked: Vec::new(),
        }
    }

    /// Messages and labels in the order they were asked.
    pub fn asked(&self) -> &[String] {
        &self.asked
    }

    /// Answers that were queued but never consumed.
    pub fn remaining(&self) -> usize {
        self.answers.len()
    }

    fn next(&mut self, question: &str) -> Result<Answer> {
        self.asked.push(question.to_owned());
        self.answers
            .pop_front()
            .ok_or_else(|| anyhow!("no scripted answer for '{question}'"))
    }
}

impl Prompter for ScriptedPrompter {
    fn confirm(&mut self, message: &str) -> Result<bool> {
        match self.next(message)? {
            Answer::Confirm(value) => Ok(value),
            Answer::AcceptDefault => Ok(false),
            other => Err(anyhow!("expected a confirmation for '{message}', got {other:?}")),
        }
    }

    fn input(&mut self, label: &str, default: &str) -> Result<Option<String>> {
        match self.next(label)? {
            Answer::Input(value) => Ok(value),
            Answer::AcceptDefault => Ok(Some(default.to_owned())),
            other => Err(anyhow!("expected input for '{label}', got {other:?}")),
        }
    }
}

/// Ask for an output path until `validate` accepts it or the user gives up.
///
/// Empty or rejected input asks whether to retry; the retry prompt starts blank. Returns
/// `Ok(None)` when the user declines or [`MAX_PATH_ATTEMPTS`] is exhausted.
pub fn prompt_output_path<P, F>(
    prompter: &mut P,
    label: &str,
    default: &str,
    validate: F,
) -> Result<Option<String>>
where
    P: Prompter + ?Sized,
    F: Fn(&str) -> bool,
{
    let mut label = label.to_owned();
    let mut default = default.to_owned();

    for attempt in 1..=MAX_PATH_ATTEMPTS {
        let answer = prompter.input(&label, &default)?;
        match answer.map(|value| value.trim().to_owned()) {
            Some(value) if !value.is_empty() && validate(&value) => return Ok(Some(value)),
            _ => tracing::debug!(attempt, "rejected output path"),
        }

        if attempt == MAX_PATH_ATTEMPTS || !prompter.confirm(RETRY_MESSAGE)? {
            break;
        }
        label = "Please input path".to_owned();
        default.clear();
    }

    Ok(None)
}
