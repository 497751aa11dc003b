//! Human-in-the-loop confirmation before the output artifact is written.
//!
//! The orchestrator builds an [`IssueDigest`] (the first
//! [`DIGEST_LIMIT`] issues plus a truncation notice) and hands it to a
//! [`ConfirmationPrompt`]. The prompt blocks until it has a yes/no answer;
//! the orchestrator runs it on the blocking pool so async workers are not
//! stalled while a human reads the terminal.

use crate::issue::Issue;
use std::fmt;
use std::io::{self, BufRead, Write};

/// Issues shown before the prompt.
pub const DIGEST_LIMIT: usize = 10;

/// Summary of a run's issues as presented to the operator.
#[derive(Debug, Clone)]
pub struct IssueDigest {
    /// The first issues in discovery order.
    pub shown: Vec<Issue>,
    /// Total issues found.
    pub total: usize,
}

impl IssueDigest {
    pub fn new(issues: &[Issue]) -> Self {
        Self {
            shown: issues.iter().take(DIGEST_LIMIT).cloned().collect(),
            total: issues.len(),
        }
    }

    /// Issues not shown.
    pub fn remaining(&self) -> usize {
        self.total.saturating_sub(self.shown.len())
    }
}

impl fmt::Display for IssueDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(50);
        writeln!(f, "{rule}")?;
        writeln!(f, "Found {} potential issues:", self.total)?;
        writeln!(f, "{rule}")?;
        for (i, issue) in self.shown.iter().enumerate() {
            match issue.page() {
                Some(page) => writeln!(f, "{}. Page {}: {}", i + 1, page, issue.message())?,
                None => writeln!(f, "{}. Document: {}", i + 1, issue.message())?,
            }
            if let Some(context) = issue.context() {
                writeln!(f, "   Context: \"{}\"", context.trim())?;
            }
            if !issue.suggestions().is_empty() {
                writeln!(f, "   Suggestions: {}", issue.suggestions().join(", "))?;
            }
            writeln!(f)?;
        }
        if self.remaining() > 0 {
            writeln!(f, "... and {} more issues", self.remaining())?;
        }
        Ok(())
    }
}

/// Yes/no decision on whether to write the output artifact.
pub trait ConfirmationPrompt: Send + Sync {
    /// Present `digest` and block until the operator decides.
    fn confirm(&self, digest: &IssueDigest) -> bool;
}

/// Prompt on stderr, read the answer from stdin.
pub struct TerminalPrompt;

impl ConfirmationPrompt for TerminalPrompt {
    fn confirm(&self, digest: &IssueDigest) -> bool {
        let stdin = io::stdin();
        let mut reader = stdin.lock();
        let mut writer = io::stderr();
        match ask(digest, &mut reader, &mut writer) {
            Ok(answer) => answer,
            Err(e) => {
                tracing::warn!("Confirmation prompt failed, treating as decline: {}", e);
                false
            }
        }
    }
}

/// A prompt with a fixed answer, for non-terminal callers and tests.
pub struct FixedAnswer(pub bool);

impl ConfirmationPrompt for FixedAnswer {
    fn confirm(&self, _digest: &IssueDigest) -> bool {
        self.0
    }
}

/// Write the digest and question to `writer`, read one line from `reader`.
///
/// Only an exact (case-insensitive, trimmed) `yes` approves; anything else,
/// including end of input, declines.
pub fn ask<R: BufRead, W: Write>(
    digest: &IssueDigest,
    reader: &mut R,
    writer: &mut W,
) -> io::Result<bool> {
    writeln!(writer)?;
    write!(writer, "{digest}")?;
    write!(writer, "\nApply corrections? (yes/no): ")?;
    writer.flush()?;

    let mut line = String::new();
    reader.read_line(&mut line)?;
    Ok(line.trim().eq_ignore_ascii_case("yes"))
}
