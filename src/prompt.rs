//! Operator collaborators that answer column-selection prompts.
//!
//! The resolver only sees the [`Operator`] trait. [`TerminalOperator`] talks to
//! a human over any `BufRead`/`Write` pair (stdin plus stdout or stderr in
//! the binary); [`ScriptedOperator`] replays a fixed response sequence and
//! backs both the `--accept-defaults` mode and the tests.

use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

use crate::error::{AuditError, AuditResult};

/// One question put to the operator.
#[derive(Debug, Clone, Copy)]
pub struct PromptRequest<'a> {
    pub role: &'a str,
    pub columns: &'a [String],
    pub default: Option<&'a str>,
    /// The answer rejected on the previous attempt, when this is a retry.
    pub rejected: Option<&'a str>,
}

pub trait Operator {
    /// Returns the raw answer. An empty string accepts the default.
    fn respond(&mut self, request: &PromptRequest<'_>) -> AuditResult<String>;
}

pub struct TerminalOperator<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> TerminalOperator<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    fn write_prompt(&mut self, request: &PromptRequest<'_>) -> io::Result<()> {
        let out = &mut self.output;
        if let Some(rejected) = request.rejected {
            writeln!(
                out,
                " -> ERROR: '{rejected}' is not a valid column name. Please choose from the list above."
            )?;
            writeln!(out)?;
            writeln!(out, "Columns found in available columns:")?;
            for column in request.columns {
                writeln!(out, " - {column}")?;
            }
            write!(out, "Try again (enter column name exactly): ")?;
        } else {
            writeln!(out)?;
            writeln!(out, "Which column should be used for '{}'?", request.role)?;
            match request.default {
                Some(default) => writeln!(out, "Press Enter to accept default: '{default}'")?,
                None => writeln!(
                    out,
                    "No good default detected; you must type one of the column names shown above."
                )?,
            }
            writeln!(
                out,
                "Type the column name exactly (or press Enter to accept default): "
            )?;
            write!(out, "> ")?;
        }
        out.flush()
    }
}

impl<R: BufRead, W: Write> Operator for TerminalOperator<R, W> {
    fn respond(&mut self, request: &PromptRequest<'_>) -> AuditResult<String> {
        self.write_prompt(request).map_err(AuditError::Prompt)?;
        let mut line = String::new();
        // EOF reads as an empty answer, i.e. "accept the default".
        self.input.read_line(&mut line).map_err(AuditError::Prompt)?;
        Ok(line.trim().to_string())
    }
}

/// Replays canned answers in order; once exhausted every answer is empty.
#[derive(Debug, Default)]
pub struct ScriptedOperator {
    responses: VecDeque<String>,
    asked: Vec<String>,
}

impl ScriptedOperator {
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            responses: responses.into_iter().map(Into::into).collect(),
            asked: Vec::new(),
        }
    }

    /// An operator that accepts every detected default.
    pub fn accept_defaults() -> Self {
        Self::default()
    }

    /// Roles asked so far, retries included.
    pub fn asked(&self) -> &[String] {
        &self.asked
    }
}

impl Operator for ScriptedOperator {
    fn respond(&mut self, request: &PromptRequest<'_>) -> AuditResult<String> {
        self.asked.push(request.role.to_string());
        Ok(self
            .responses
            .pop_front()
            .map(|response| response.trim().to_string())
            .unwrap_or_default())
    }
}
