// Prompt line state
// Owns the output stream, the prompt string and the partially typed input

use std::fmt;
use std::io::Write;

use tracing::warn;

use super::escape::{CLEAR_LINE, CURSOR_TO_LINE_START, SUBMIT};
use super::keys::Key;
use super::printer::LineSink;

pub const DEFAULT_PROMPT: &str = "> ";

/// Result of applying one key to the prompt line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit {
    /// The line is still being typed
    Pending,

    /// The user pressed Enter
    Submitted(String),

    /// Ctrl+C, or Ctrl+D on an empty line
    Closed,
}

/// The single interactive prompt bound to one output stream
///
/// Every rendering operation degrades to a no-op once the output is absent;
/// a failed write detaches the output instead of surfacing the error.
pub struct PromptLine {
    output: Option<Box<dyn Write>>,
    prompt: String,
    buffer: String,
    terminal: bool,
    visible: bool,
}

impl PromptLine {
    pub fn new(output: Option<Box<dyn Write>>, prompt: impl Into<String>, terminal: bool) -> Self {
        Self {
            output,
            prompt: prompt.into(),
            buffer: String::new(),
            terminal,
            visible: false,
        }
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Change the prompt string. Takes effect on the next redraw.
    pub fn set_prompt(&mut self, prompt: impl Into<String>) {
        self.prompt = prompt.into();
    }

    /// Text typed so far on the current line
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn is_terminal(&self) -> bool {
        self.terminal
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Erase the visible line and render the prompt again
    ///
    /// With `preserve_text` the typed text is rendered after the prompt,
    /// otherwise it is discarded.
    pub fn redraw(&mut self, preserve_text: bool) {
        if !preserve_text {
            self.buffer.clear();
        }

        if self.output.is_none() {
            return;
        }

        let line = if self.terminal {
            format!("{CURSOR_TO_LINE_START}{CLEAR_LINE}{}{}", self.prompt, self.buffer)
        } else {
            self.prompt.clone()
        };

        self.write_raw(&line);
        self.flush_output();
        self.visible = self.output.is_some();
    }

    /// Apply one key typed at the prompt, echoing it in terminal mode
    pub fn apply(&mut self, key: Key) -> Edit {
        match key {
            Key::Char(c) => {
                self.buffer.push(c);
                if self.terminal {
                    let mut utf8 = [0u8; 4];
                    self.write_raw(c.encode_utf8(&mut utf8));
                    self.flush_output();
                }
                Edit::Pending
            }
            Key::Backspace => {
                if self.buffer.pop().is_some() && self.terminal {
                    self.redraw(true);
                }
                Edit::Pending
            }
            Key::Enter => Edit::Submitted(self.submit()),
            Key::Eof if !self.buffer.is_empty() => Edit::Pending,
            Key::Eof | Key::Interrupt => {
                if self.terminal {
                    self.write_raw(SUBMIT);
                    self.flush_output();
                }
                self.visible = false;
                Edit::Closed
            }
        }
    }

    /// Take the typed text as a submitted line
    pub fn submit(&mut self) -> String {
        if self.terminal {
            self.write_raw(SUBMIT);
            self.flush_output();
        }
        self.visible = false;
        std::mem::take(&mut self.buffer)
    }

    fn write_raw(&mut self, s: &str) {
        if let Some(out) = self.output.as_mut() {
            if let Err(e) = out.write_all(s.as_bytes()) {
                warn!("output stream closed, detaching prompt: {}", e);
                self.detach();
            }
        }
    }

    fn flush_output(&mut self) {
        if let Some(out) = self.output.as_mut() {
            if let Err(e) = out.flush() {
                warn!("output stream closed, detaching prompt: {}", e);
                self.detach();
            }
        }
    }

    fn detach(&mut self) {
        self.output = None;
        self.visible = false;
    }
}

impl LineSink for PromptLine {
    fn is_attached(&self) -> bool {
        self.output.is_some()
    }

    fn write_str(&mut self, s: &str) {
        self.write_raw(s);
    }

    fn redraw(&mut self, preserve_text: bool) {
        PromptLine::redraw(self, preserve_text);
    }

    fn flush(&mut self) {
        self.flush_output();
    }
}

impl fmt::Debug for PromptLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PromptLine")
            .field("attached", &self.output.is_some())
            .field("prompt", &self.prompt)
            .field("buffer", &self.buffer)
            .field("terminal", &self.terminal)
            .field("visible", &self.visible)
            .finish()
    }
}
