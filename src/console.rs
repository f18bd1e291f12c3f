//! Operator console.
//!
//! Everything the loader says to or asks of the person running it goes through
//! [`Console`], so the pipeline can be driven from tests with a
//! [`ScriptedConsole`] instead of a terminal.

use std::{
    collections::VecDeque,
    io::{self, BufRead, Write},
};

use anyhow::{Context, Result};

use crate::clear::ClearStrategy;

pub trait Console {
    /// Shows `prompt` and reads one line without its line ending. `None` at
    /// end of input.
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>>;

    fn show(&mut self, message: &str);
}

#[derive(Debug, Default)]
pub struct TerminalConsole;

impl TerminalConsole {
    pub fn new() -> Self {
        Self
    }
}

impl Console for TerminalConsole {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        let mut stdout = io::stdout().lock();
        write!(stdout, "{prompt}").context("Writing prompt")?;
        stdout.flush().context("Flushing prompt")?;
        let mut line = String::new();
        let read = io::stdin()
            .lock()
            .read_line(&mut line)
            .context("Reading console input")?;
        if read == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    fn show(&mut self, message: &str) {
        println!("{message}");
    }
}

/// Replays canned answers and records everything shown.
#[derive(Debug, Default)]
pub struct ScriptedConsole {
    answers: VecDeque<String>,
    transcript: Vec<String>,
}

impl ScriptedConsole {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            transcript: Vec::new(),
        }
    }

    pub fn transcript(&self) -> &[String] {
        &self.transcript
    }

    pub fn saw(&self, fragment: &str) -> bool {
        self.transcript.iter().any(|line| line.contains(fragment))
    }

    pub fn remaining_answers(&self) -> usize {
        self.answers.len()
    }
}

impl Console for ScriptedConsole {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        self.transcript.push(prompt.to_string());
        Ok(self.answers.pop_front())
    }

    fn show(&mut self, message: &str) {
        self.transcript.push(message.to_string());
    }
}

/// Answer to the clear-strategy menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyChoice {
    Strategy(ClearStrategy),
    Cancel,
}

const STRATEGY_MENU: &[&str] = &[
    "How should existing data in the table be handled?",
    "  1) Truncate         - remove all existing rows before loading",
    "  2) Delete by period - remove only rows for each file's data period",
    "  3) Append           - keep existing rows (duplicate keys may be rejected)",
    "  4) Cancel",
];

/// Shows the four-option menu until a valid choice is made. End of input
/// counts as cancel.
pub fn prompt_strategy<C: Console + ?Sized>(console: &mut C) -> Result<StrategyChoice> {
    for line in STRATEGY_MENU {
        console.show(line);
    }
    loop {
        let Some(answer) = console.read_line("Enter choice (1-4): ")? else {
            return Ok(StrategyChoice::Cancel);
        };
        match answer.trim() {
            "1" => return Ok(StrategyChoice::Strategy(ClearStrategy::Truncate)),
            "2" => return Ok(StrategyChoice::Strategy(ClearStrategy::DeleteByPeriod)),
            "3" => return Ok(StrategyChoice::Strategy(ClearStrategy::Append)),
            "4" => return Ok(StrategyChoice::Cancel),
            other => console.show(&format!("'{other}' is not a valid choice. Enter 1, 2, 3 or 4.")),
        }
    }
}

/// Yes/no question whose default (blank answer or end of input) is no.
pub fn confirm<C: Console + ?Sized>(console: &mut C, question: &str) -> Result<bool> {
    let answer = console.read_line(&format!("{question} [y/N]: "))?;
    Ok(matches!(
        answer.as_deref().map(str::trim),
        Some(reply) if reply.eq_ignore_ascii_case("y") || reply.eq_ignore_ascii_case("yes")
    ))
}
