//! Bounded line reader.

use kp_common::{DecodeError, Error, Result};
use std::io::{BufRead, Read};

/// Reads newline-terminated lines, refusing any line longer than `max_bytes`.
///
/// The terminator is stripped; a final line without one is still returned.
pub struct LineScanner<R> {
    reader: R,
    max_bytes: usize,
    line_no: u64,
    buf: Vec<u8>,
}

impl<R: BufRead> LineScanner<R> {
    pub fn new(reader: R, max_bytes: usize) -> Self {
        Self {
            reader,
            max_bytes,
            line_no: 0,
            buf: Vec::new(),
        }
    }

    /// Number of lines returned so far.
    pub fn lines_read(&self) -> u64 {
        self.line_no
    }

    /// Next `(line_no, line)` pair, or `None` at end of input. Lines are 1-based.
    pub fn next_line(&mut self) -> Result<Option<(u64, String)>> {
        self.buf.clear();
        // One byte over the limit is enough to tell "too long" from "exactly at the limit".
        let limit = self.max_bytes as u64 + 1;
        let read = (&mut self.reader)
            .take(limit)
            .read_until(b'\n', &mut self.buf)?;
        if read == 0 {
            return Ok(None);
        }
        self.line_no += 1;

        if self.buf.last() == Some(&b'\n') {
            self.buf.pop();
        }
        if self.buf.len() > self.max_bytes {
            return Err(Error::Decode(DecodeError::LineTooLong {
                line: self.line_no,
                limit: self.max_bytes,
            }));
        }

        let line = String::from_utf8(std::mem::take(&mut self.buf))
            .map_err(|_| Error::Decode(DecodeError::InvalidUtf8 { line: self.line_no }))?;
        Ok(Some((self.line_no, line)))
    }
}
