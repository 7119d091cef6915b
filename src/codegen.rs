//! An append-only buffer for emitting generated source code.

use anyhow::{Result, anyhow};
use std::fmt;

/// Accumulates generated source text.
///
/// Formatted fragments go through the [`fmt::Write`] impl (`write!`,
/// `writeln!`); plain lines through [`Writer::line`]. The buffer stays
/// unformatted until [`Writer::format`] runs it through the pretty
/// printer, so emitters never worry about indentation.
#[derive(Default)]
pub struct Writer {
    buf: String,
}

impl Writer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emits a line of text.
    pub fn line(&mut self, text: &str) {
        self.buf.push_str(text);
        self.buf.push('\n');
    }

    /// Returns the raw generated source, useful for debugging.
    pub fn raw(&self) -> &str {
        &self.buf
    }

    /// Returns the pretty-printed source. Fails if the buffer does not
    /// parse as Rust; the error carries the raw buffer so the broken
    /// output can be inspected.
    pub fn format(&self) -> Result<String> {
        let file = syn::parse_file(&self.buf)
            .map_err(|err| anyhow!("error formatting code: {err}\ncode: {}", self.buf))?;
        Ok(prettyplease::unparse(&file))
    }
}

impl fmt::Write for Writer {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.buf.push_str(s);
        Ok(())
    }
}
