// Print protocol
// Interleaves arbitrary output with a live prompt: clear -> write -> newline -> redraw

use super::escape::{CLEAR_LINE, CURSOR_TO_LINE_START, NEWLINE};

/// What the print protocol needs from the line it prints over
pub trait LineSink {
    /// False when there is no output stream, or it has been closed
    fn is_attached(&self) -> bool;

    /// Write raw text to the output stream
    fn write_str(&mut self, s: &str);

    /// Re-render the prompt, optionally restoring what the user had typed
    fn redraw(&mut self, preserve_text: bool);

    fn flush(&mut self) {}
}

/// Per-call options for [`print`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrintOptions {
    /// Advance past the printed text and redraw the prompt
    pub reset_cursor: bool,

    /// Keep whatever the user had typed when redrawing
    pub preserve_line: bool,

    /// Erase the stale prompt line before writing
    pub clear_line: bool,
}

impl Default for PrintOptions {
    fn default() -> Self {
        Self {
            reset_cursor: true,
            preserve_line: true,
            clear_line: true,
        }
    }
}

impl PrintOptions {
    /// Append output without touching the prompt
    pub fn inline() -> Self {
        Self {
            reset_cursor: false,
            ..Self::default()
        }
    }

    pub fn reset_cursor(mut self, value: bool) -> Self {
        self.reset_cursor = value;
        self
    }

    pub fn preserve_line(mut self, value: bool) -> Self {
        self.preserve_line = value;
        self
    }

    pub fn clear_line(mut self, value: bool) -> Self {
        self.clear_line = value;
        self
    }
}

/// Print `text` over the prompt held by `sink`
///
/// The order of the writes is fixed. Does nothing when the sink is detached.
pub fn print<S: LineSink + ?Sized>(sink: &mut S, text: &str, options: PrintOptions) {
    if !sink.is_attached() {
        return;
    }

    if options.reset_cursor && options.clear_line {
        sink.write_str(CLEAR_LINE);
        sink.write_str(CURSOR_TO_LINE_START);
    }

    sink.write_str(text);

    if options.reset_cursor {
        sink.write_str(NEWLINE);
        sink.redraw(options.preserve_line);
    }

    sink.flush();
}
