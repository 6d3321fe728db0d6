//! Progress dots followed by the plain-text summary.

use std::io::{self, Write};

use stepbridge_protocol::{Message, TestStatus};

use super::{Formatter, SummaryFormatter};
use crate::Summary;

const fn progress_char(status: TestStatus) -> char {
    match status {
        TestStatus::Passed => '.',
        TestStatus::Failed => 'F',
        TestStatus::Pending => 'P',
        TestStatus::Undefined => 'U',
        TestStatus::Skipped => '-',
        TestStatus::Ambiguous => 'A',
    }
}

/// Prints one character per finished step, then a [`SummaryFormatter`]
/// report on the same writer. This is the default formatter.
#[derive(Debug)]
pub struct DotFormatter<W> {
    summary: SummaryFormatter<W>,
}

impl DotFormatter<io::Stdout> {
    /// Create a formatter writing to standard output.
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> DotFormatter<W> {
    /// Create a formatter writing to `out`.
    pub fn new(out: W) -> Self {
        Self {
            summary: SummaryFormatter::new(out),
        }
    }

    /// Recover the writer.
    pub fn into_inner(self) -> W {
        self.summary.into_inner()
    }
}

impl<W: Write + Send> Formatter for DotFormatter<W> {
    fn process_message(&mut self, message: &Message) -> io::Result<()> {
        match message {
            Message::StepFinished { result, .. } => {
                let out = self.summary.writer();
                write!(out, "{}", progress_char(result.status))?;
                out.flush()?;
            }
            Message::RunFinished { .. } => writeln!(self.summary.writer())?,
            _ => {}
        }
        self.summary.process_message(message)
    }

    fn display_summary(&mut self, summary: &Summary) -> io::Result<()> {
        self.summary.display_summary(summary)
    }
}
