//! Formatter sink receiving every engine message and the final summary.
//!
//! Formatters are observers: a write failure is logged by the coordinator and
//! never changes the outcome of the run.

mod dots;
mod json;
mod summary;

use std::io;

use stepbridge_protocol::Message;

use crate::Summary;

pub use dots::DotFormatter;
pub use json::JsonFormatter;
pub use summary::{FailedStep, SummaryFormatter};

/// Observer of a run.
pub trait Formatter: Send {
    /// Handle one engine message, before the coordinator reacts to it.
    ///
    /// # Errors
    ///
    /// Returns any error raised while writing output.
    fn process_message(&mut self, message: &Message) -> io::Result<()>;

    /// Handle the final summary. Called exactly once per completed run.
    ///
    /// # Errors
    ///
    /// Returns any error raised while writing output.
    fn display_summary(&mut self, summary: &Summary) -> io::Result<()>;
}

impl<F: Formatter + ?Sized> Formatter for Box<F> {
    fn process_message(&mut self, message: &Message) -> io::Result<()> {
        (**self).process_message(message)
    }

    fn display_summary(&mut self, summary: &Summary) -> io::Result<()> {
        (**self).display_summary(summary)
    }
}

/// Formatter that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NopFormatter;

impl Formatter for NopFormatter {
    fn process_message(&mut self, _message: &Message) -> io::Result<()> {
        Ok(())
    }

    fn display_summary(&mut self, _summary: &Summary) -> io::Result<()> {
        Ok(())
    }
}

/// Formatter that logs every message and the summary through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DebugFormatter;

impl Formatter for DebugFormatter {
    fn process_message(&mut self, message: &Message) -> io::Result<()> {
        tracing::debug!(?message, "engine message");
        Ok(())
    }

    fn display_summary(&mut self, summary: &Summary) -> io::Result<()> {
        tracing::info!(?summary, "run summary");
        Ok(())
    }
}
