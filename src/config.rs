// Chat channel configuration
// Streams are resolved once at construction, never reached for globally

use std::fmt;
use std::io::Write;

use tokio::io::AsyncRead;

use crate::ui::{InputStream, DEFAULT_PROMPT};

/// Where the prompt and printed output go
pub enum OutputStream {
    /// The process's standard output
    Stdout,

    /// Any writer, e.g. an in-memory buffer in tests
    Writer(Box<dyn Write>),

    /// No output: printing and prompt rendering become no-ops
    Closed,
}

impl OutputStream {
    pub(crate) fn into_writer(self) -> Option<Box<dyn Write>> {
        match self {
            OutputStream::Stdout => Some(Box::new(std::io::stdout())),
            OutputStream::Writer(writer) => Some(writer),
            OutputStream::Closed => None,
        }
    }
}

/// Construction options for a [`ChatChannel`](crate::chat::ChatChannel)
pub struct ChatConfig {
    pub input: InputStream,
    pub output: OutputStream,

    /// Raw terminal mode with local echo and editing
    pub terminal: bool,

    pub prompt: String,

    /// Sender label attached to lines typed at the prompt
    pub sender: Option<String>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            input: InputStream::Stdin,
            output: OutputStream::Stdout,
            terminal: true,
            prompt: DEFAULT_PROMPT.to_string(),
            sender: None,
        }
    }
}

impl ChatConfig {
    pub fn with_input<R: AsyncRead + Unpin + 'static>(mut self, reader: R) -> Self {
        self.input = InputStream::Reader(Box::new(reader));
        self
    }

    pub fn with_output<W: Write + 'static>(mut self, writer: W) -> Self {
        self.output = OutputStream::Writer(Box::new(writer));
        self
    }

    pub fn without_output(mut self) -> Self {
        self.output = OutputStream::Closed;
        self
    }

    pub fn with_terminal(mut self, terminal: bool) -> Self {
        self.terminal = terminal;
        self
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    pub fn with_sender(mut self, sender: impl Into<String>) -> Self {
        self.sender = Some(sender.into());
        self
    }
}

impl fmt::Debug for ChatConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let input = match self.input {
            InputStream::Stdin => "stdin",
            InputStream::Reader(_) => "reader",
        };
        let output = match self.output {
            OutputStream::Stdout => "stdout",
            OutputStream::Writer(_) => "writer",
            OutputStream::Closed => "closed",
        };

        f.debug_struct("ChatConfig")
            .field("input", &input)
            .field("output", &output)
            .field("terminal", &self.terminal)
            .field("prompt", &self.prompt)
            .field("sender", &self.sender)
            .finish()
    }
}
