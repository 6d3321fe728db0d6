//! Newline-delimited JSON of every message followed by the summary.
//!
//! Each line is one self-describing object: engine messages keep their
//! `type` tag and the closing line has `"type":"summary"`.

use std::io::{self, Write};

use serde::Serialize;

use stepbridge_protocol::Message;

use super::Formatter;
use crate::Summary;

#[derive(Serialize)]
struct SummaryRecord<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    #[serde(flatten)]
    summary: &'a Summary,
}

/// Streams messages and the summary as JSON lines.
#[derive(Debug)]
pub struct JsonFormatter<W> {
    out: W,
}

impl<W: Write> JsonFormatter<W> {
    /// Create a formatter writing to `out`.
    pub const fn new(out: W) -> Self {
        Self { out }
    }

    /// Recover the writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_line<T: Serialize>(&mut self, value: &T) -> io::Result<()> {
        serde_json::to_writer(&mut self.out, value).map_err(io::Error::other)?;
        writeln!(self.out)
    }
}

impl<W: Write + Send> Formatter for JsonFormatter<W> {
    fn process_message(&mut self, message: &Message) -> io::Result<()> {
        self.write_line(message)
    }

    fn display_summary(&mut self, summary: &Summary) -> io::Result<()> {
        self.write_line(&SummaryRecord {
            kind: "summary",
            summary,
        })?;
        self.out.flush()
    }
}
