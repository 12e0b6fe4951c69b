// Diagnostics output
// Log lines written next to a raw-mode prompt start on a clean line and use CRLF

use std::io::{self, IsTerminal, Stderr, Write};

use super::escape::{CLEAR_LINE, CURSOR_TO_LINE_START};

/// Writer for log output that shares a terminal with the prompt
///
/// In terminal mode each write first erases the partially drawn prompt line
/// and every `\n` becomes `\r\n`, since raw mode turns off the terminal's own
/// newline translation. Otherwise bytes pass through untouched.
pub struct DiagnosticWriter<W> {
    inner: W,
    terminal: bool,
}

impl DiagnosticWriter<Stderr> {
    /// Standard error, translating only when it is a terminal
    pub fn stderr() -> Self {
        let stderr = io::stderr();
        let terminal = stderr.is_terminal();
        Self::new(stderr, terminal)
    }
}

impl<W: Write> DiagnosticWriter<W> {
    pub fn new(inner: W, terminal: bool) -> Self {
        Self { inner, terminal }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for DiagnosticWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if !self.terminal {
            return self.inner.write(buf);
        }

        let mut out = Vec::with_capacity(buf.len() + 8);
        out.extend_from_slice(CLEAR_LINE.as_bytes());
        out.extend_from_slice(CURSOR_TO_LINE_START.as_bytes());

        let mut prev = None;
        for &byte in buf {
            if byte == b'\n' && prev != Some(b'\r') {
                out.push(b'\r');
            }
            out.push(byte);
            prev = Some(byte);
        }

        self.inner.write_all(&out)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
