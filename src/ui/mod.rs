// Terminal line module
// The interactive prompt, its input stream and the print-over-prompt protocol

pub mod diagnostics;
pub mod escape;
pub mod input;
pub mod keys;
pub mod printer;
pub mod prompt;

pub use diagnostics::DiagnosticWriter;
pub use input::{InputStream, LineReader};
pub use keys::{Key, KeyDecoder};
pub use printer::{print, LineSink, PrintOptions};
pub use prompt::{Edit, PromptLine, DEFAULT_PROMPT};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TerminalError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to switch terminal mode: {0}")]
    RawMode(String),
}

pub type Result<T> = std::result::Result<T, TerminalError>;
