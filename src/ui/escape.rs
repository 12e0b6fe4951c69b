// Terminal control sequences written by the prompt and the print protocol
// These exact bytes are part of the output contract

/// Erase the entire current line (ESC [ 2 K)
pub const CLEAR_LINE: &str = "\x1b[2K";

/// Move the cursor back to column zero
pub const CURSOR_TO_LINE_START: &str = "\r";

/// Advance past printed output
pub const NEWLINE: &str = "\n";

/// Line ending used when the user submits a line in raw mode
pub const SUBMIT: &str = "\r\n";
