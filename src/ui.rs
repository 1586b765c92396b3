// UI layer: interactive prompts built on `dialoguer`, input validators and
// the small amount of terminal formatting the commands share. Prompting
// goes through the `Prompter` trait so flows can be driven without a TTY.

use anyhow::Result;
use dialoguer::{Input, Password};
use indicatif::{ProgressBar, ProgressStyle};
use once_cell::sync::Lazy;
use regex::Regex;
use std::time::Duration;

static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@]+@[^@]+\.[a-zA-Z0-9\-]+$").unwrap());

static ORGANIZATION_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[a-zA-Z][a-zA-Z0-9\-]*[a-zA-Z0-9]").unwrap());

/// Checks a line of input, returning the message to show on rejection.
pub type Validator = fn(&str) -> Result<(), String>;

/// Source of interactive answers.
pub trait Prompter {
    /// Ask for a visible line of text, re-asking until `validate` accepts.
    fn input(&mut self, prompt: &str, validate: Option<Validator>) -> Result<String>;

    /// Ask for a masked secret.
    fn password(&mut self, prompt: &str) -> Result<String>;
}

/// Prompts on the controlling terminal.
#[derive(Debug, Default)]
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn input(&mut self, prompt: &str, validate: Option<Validator>) -> Result<String> {
        let mut input = Input::<String>::new();
        input.with_prompt(prompt);
        if let Some(check) = validate {
            input.validate_with(move |value: &String| check(value));
        }
        Ok(input.interact_text()?)
    }

    fn password(&mut self, prompt: &str) -> Result<String> {
        Ok(Password::new().with_prompt(prompt).interact()?)
    }
}

pub fn validate_email(value: &str) -> Result<(), String> {
    if EMAIL_PATTERN.is_match(value) {
        Ok(())
    } else {
        Err("Must be a valid e-mail address".to_string())
    }
}

/// Organization names need an alphanumeric run and may not contain `--`.
pub fn validate_organization_name(value: &str) -> Result<(), String> {
    if ORGANIZATION_PATTERN.is_match(value) && !value.contains("--") {
        Ok(())
    } else {
        Err(
            "must start with a letter, end with a letter or number, and contain only A-Z, a-z, 0-9 or -"
                .to_string(),
        )
    }
}

/// Spinner shown while a request is in flight. Call `finish_and_clear`
/// once the response arrives.
pub fn spinner(message: &str) -> Result<ProgressBar> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner} {msg}")?);
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(80));
    Ok(spinner)
}

/// Canned answers, consumed in order. Used by tests.
#[cfg(test)]
pub struct ScriptedPrompter {
    answers: std::collections::VecDeque<String>,
    pub asked: Vec<String>,
}

#[cfg(test)]
impl ScriptedPrompter {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ScriptedPrompter {
            answers: answers.into_iter().map(Into::into).collect(),
            asked: Vec::new(),
        }
    }

    fn next(&mut self, prompt: &str) -> Result<String> {
        self.asked.push(prompt.to_string());
        self.answers
            .pop_front()
            .ok_or_else(|| anyhow::anyhow!("no scripted answer for {prompt:?}"))
    }
}

#[cfg(test)]
impl Prompter for ScriptedPrompter {
    /// Rejected answers are skipped, as a re-ask on a terminal would.
    fn input(&mut self, prompt: &str, validate: Option<Validator>) -> Result<String> {
        loop {
            let answer = self.next(prompt)?;
            match validate {
                Some(check) if check(&answer).is_err() => continue,
                _ => return Ok(answer),
            }
        }
    }

    fn password(&mut self, prompt: &str) -> Result<String> {
        self.next(prompt)
    }
}
