//! Two-state scanner that pulls a file out of marker-delimited command output.
//!
//! Markers are matched by containment, not line equality. A transferred file
//! whose content contains a marker string will toggle the scanner early; the
//! markers must not appear in real file content.

use std::io::{self, Write};

pub const MARK_START: &str = "-- START --";
pub const MARK_END: &str = "-- END --";

/// Routes lines inside the START/END block to `sink` and collects the rest.
///
/// The first write error is kept; every line after it is rejected so a
/// failed download never keeps going silently.
#[derive(Debug)]
pub struct MarkerScanner<W> {
    inside: bool,
    extra: Vec<String>,
    sink: Option<W>,
    write_error: Option<String>,
}

impl<W: Write> MarkerScanner<W> {
    pub fn new(sink: W) -> Self {
        Self {
            inside: false,
            extra: Vec::new(),
            sink: Some(sink),
            write_error: None,
        }
    }

    /// Feed one raw line of output (without its trailing newline).
    ///
    /// Bytes are passed to the sink untouched; only the markers are matched,
    /// and they are plain ASCII.
    ///
    /// # Errors
    ///
    /// Returns the write error for the line that failed, and an error for
    /// every line after a failure or after the sink was closed.
    pub fn feed(&mut self, line: &[u8]) -> io::Result<()> {
        if let Some(reason) = &self.write_error {
            return Err(io::Error::other(format!(
                "download sink already failed: {reason}"
            )));
        }
        if contains(line, MARK_START.as_bytes()) {
            self.inside = true;
            return Ok(());
        }
        if contains(line, MARK_END.as_bytes()) {
            self.inside = false;
            return Ok(());
        }
        if !self.inside {
            self.extra.push(String::from_utf8_lossy(line).into_owned());
            return Ok(());
        }
        let Some(sink) = self.sink.as_mut() else {
            return Err(io::Error::other("download sink is closed"));
        };
        let written = sink.write_all(line).and_then(|()| sink.write_all(b"\n"));
        if let Err(err) = written {
            self.write_error = Some(err.to_string());
            return Err(err);
        }
        Ok(())
    }

    #[must_use]
    pub fn is_inside(&self) -> bool {
        self.inside
    }

    /// Lines seen outside the marker block, in arrival order.
    #[must_use]
    pub fn extra_output(&self) -> &[String] {
        &self.extra
    }

    /// Drain the lines seen outside the marker block.
    pub fn take_extra_output(&mut self) -> Vec<String> {
        std::mem::take(&mut self.extra)
    }

    /// Flush and drop the sink. Closing twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns the flush error, if any.
    pub fn close(&mut self) -> io::Result<()> {
        match self.sink.take() {
            Some(mut sink) => sink.flush(),
            None => Ok(()),
        }
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.sink.is_none()
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|window| window == needle)
}

/// Split raw command output into lines on `\n`.
///
/// A trailing newline does not produce an empty last line. Carriage returns
/// are kept, since they may be file content.
pub fn split_lines(output: &[u8]) -> impl Iterator<Item = &[u8]> {
    let body = output.strip_suffix(b"\n").unwrap_or(output);
    let empty = output.is_empty();
    body.split(|&b| b == b'\n').filter(move |_| !empty)
}
