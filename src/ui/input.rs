// Line input
// Turns the configured input stream into submitted lines, one at a time

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::IsTerminal;

use crossterm::event::{Event, EventStream};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use futures::StreamExt;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};
use tracing::{debug, warn};

use super::keys::{Key, KeyDecoder};
use super::prompt::{Edit, PromptLine};
use super::{Result, TerminalError};

const READ_CHUNK: usize = 1024;

/// Where typed input comes from
pub enum InputStream {
    /// The process's standard input
    Stdin,

    /// Any async byte source, e.g. an in-memory buffer in tests
    Reader(Box<dyn AsyncRead + Unpin>),
}

/// Restores cooked mode when dropped
struct RawModeGuard;

impl RawModeGuard {
    fn enable() -> Result<Self> {
        enable_raw_mode().map_err(|e| TerminalError::RawMode(e.to_string()))?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if let Err(e) = disable_raw_mode() {
            warn!("failed to restore terminal mode: {}", e);
        }
    }
}

enum Source {
    /// Line-buffered input, no local editing
    Lines(Box<dyn AsyncBufRead + Unpin>),

    /// Raw bytes typed at a terminal
    Bytes {
        reader: Box<dyn AsyncRead + Unpin>,
        decoder: KeyDecoder,
    },

    /// Key events from the controlling terminal in raw mode
    Terminal {
        events: EventStream,
        _raw: RawModeGuard,
    },
}

/// Reads submitted lines from one input stream
pub struct LineReader {
    source: Source,
    pending: VecDeque<Key>,
    closed: bool,
}

impl LineReader {
    /// Resolve `input` into a reader
    ///
    /// Terminal mode on stdin only takes effect when stdin is a tty; otherwise
    /// it falls back to line-buffered reading. Returns the reader and whether
    /// terminal mode is actually in effect.
    pub fn open(input: InputStream, terminal: bool) -> Result<(Self, bool)> {
        let (source, terminal) = match input {
            InputStream::Stdin if terminal && std::io::stdin().is_terminal() => {
                let raw = RawModeGuard::enable()?;
                debug!("reading key events from terminal in raw mode");
                (Source::Terminal { events: EventStream::new(), _raw: raw }, true)
            }
            InputStream::Stdin => {
                if terminal {
                    debug!("stdin is not a terminal, reading lines");
                }
                let stdin: Box<dyn AsyncBufRead + Unpin> = Box::new(BufReader::new(tokio::io::stdin()));
                (Source::Lines(stdin), false)
            }
            InputStream::Reader(reader) if terminal => (
                Source::Bytes {
                    reader,
                    decoder: KeyDecoder::new(),
                },
                true,
            ),
            InputStream::Reader(reader) => (Source::Lines(Box::new(BufReader::new(reader))), false),
        };

        Ok((
            Self {
                source,
                pending: VecDeque::new(),
                closed: false,
            },
            terminal,
        ))
    }

    /// Wait for the next submitted line
    ///
    /// Returns `None` once the input has ended or the user closed it. The
    /// prompt is only borrowed between reads, never across an await.
    pub async fn next_line(&mut self, line: &RefCell<PromptLine>) -> Result<Option<String>> {
        if self.closed {
            return Ok(None);
        }

        if let Source::Lines(reader) = &mut self.source {
            let mut raw = Vec::new();
            if reader.read_until(b'\n', &mut raw).await? == 0 {
                self.closed = true;
                return Ok(None);
            }
            // Invalid UTF-8 is replaced, never fatal to the session
            let mut text = String::from_utf8_lossy(&raw).into_owned();
            trim_line_ending(&mut text);
            return Ok(Some(text));
        }

        loop {
            while let Some(key) = self.pending.pop_front() {
                match line.borrow_mut().apply(key) {
                    Edit::Pending => {}
                    Edit::Submitted(text) => return Ok(Some(text)),
                    Edit::Closed => {
                        debug!("input closed by user");
                        self.closed = true;
                        self.pending.clear();
                        return Ok(None);
                    }
                }
            }

            if !self.fill().await? {
                self.closed = true;
                // Deliver whatever was typed before the stream ended
                let mut line = line.borrow_mut();
                if line.buffer().is_empty() {
                    return Ok(None);
                }
                return Ok(Some(line.submit()));
            }
        }
    }

    /// Read more keys into the queue. Returns false at end of input.
    async fn fill(&mut self) -> Result<bool> {
        match &mut self.source {
            Source::Lines(_) => Ok(false),
            Source::Bytes { reader, decoder } => {
                let mut buf = [0u8; READ_CHUNK];
                let n = reader.read(&mut buf).await?;
                if n == 0 {
                    return Ok(false);
                }
                self.pending.extend(decoder.decode(&buf[..n]));
                Ok(true)
            }
            Source::Terminal { events, .. } => match events.next().await {
                Some(Ok(Event::Key(event))) => {
                    self.pending.extend(Key::from_event(&event));
                    Ok(true)
                }
                Some(Ok(Event::Paste(text))) => {
                    self.pending.extend(text.chars().filter(|c| !c.is_control()).map(Key::Char));
                    Ok(true)
                }
                Some(Ok(_)) => Ok(true),
                Some(Err(e)) => Err(TerminalError::Io(e)),
                None => Ok(false),
            },
        }
    }
}

fn trim_line_ending(text: &mut String) {
    if text.ends_with('\n') {
        text.pop();
        if text.ends_with('\r') {
            text.pop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reader(bytes: &'static [u8], terminal: bool) -> LineReader {
        LineReader::open(InputStream::Reader(Box::new(bytes)), terminal)
            .unwrap()
            .0
    }

    fn prompt(terminal: bool) -> RefCell<PromptLine> {
        RefCell::new(PromptLine::new(None, "> ", terminal))
    }

    async fn collect(reader: &mut LineReader, line: &RefCell<PromptLine>) -> Vec<String> {
        let mut lines = Vec::new();
        while let Some(text) = reader.next_line(line).await.unwrap() {
            lines.push(text);
        }
        lines
    }

    #[test]
    fn test_trim_line_ending() {
        let mut s = "a\r\n".to_string();
        trim_line_ending(&mut s);
        assert_eq!(s, "a");

        let mut s = "b".to_string();
        trim_line_ending(&mut s);
        assert_eq!(s, "b");
    }

    #[tokio::test]
    async fn test_line_mode_reads_lines_in_order() {
        let mut r = reader(b"one\r\ntwo\n\nlast", false);
        let line = prompt(false);
        assert_eq!(collect(&mut r, &line).await, vec!["one", "two", "", "last"]);
        assert_eq!(r.next_line(&line).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_line_mode_survives_invalid_utf8() {
        let mut r = reader(b"ok\n\xff\nafter\n", false);
        let line = prompt(false);
        assert_eq!(collect(&mut r, &line).await, vec!["ok", "\u{fffd}", "after"]);
    }

    #[tokio::test]
    async fn test_terminal_mode_edits_before_submitting() {
        let mut r = reader(b"helo\x7flo\rsecond\n", true);
        let line = prompt(true);
        assert_eq!(collect(&mut r, &line).await, vec!["hello", "second"]);
    }

    #[tokio::test]
    async fn test_terminal_mode_keeps_typing_order() {
        let mut r = reader(b"first\nsec", true);
        let line = prompt(true);

        assert_eq!(r.next_line(&line).await.unwrap().as_deref(), Some("first"));
        // Keys after the Enter have not been applied yet
        assert_eq!(line.borrow().buffer(), "");

        assert_eq!(r.next_line(&line).await.unwrap().as_deref(), Some("sec"));
        assert_eq!(r.next_line(&line).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_ctrl_d_on_empty_line_closes() {
        let mut r = reader(b"a\n\x04ignored\n", true);
        let line = prompt(true);
        assert_eq!(collect(&mut r, &line).await, vec!["a"]);
    }

    #[tokio::test]
    async fn test_ctrl_c_closes() {
        let mut r = reader(b"half\x03typed\n", true);
        let line = prompt(true);
        assert!(collect(&mut r, &line).await.is_empty());
    }
}
