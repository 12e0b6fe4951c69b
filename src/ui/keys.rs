// Key input
// Normalizes crossterm key events and raw terminal bytes into one key type

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Editing keys understood by the prompt line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Backspace,
    Enter,
    /// Ctrl+C
    Interrupt,
    /// Ctrl+D
    Eof,
}

impl Key {
    /// Map a crossterm key event. Releases and unsupported keys give `None`.
    pub fn from_event(event: &KeyEvent) -> Option<Key> {
        if event.kind == KeyEventKind::Release {
            return None;
        }

        if event.modifiers.contains(KeyModifiers::CONTROL) {
            return match event.code {
                KeyCode::Char('c') => Some(Key::Interrupt),
                KeyCode::Char('d') => Some(Key::Eof),
                _ => None,
            };
        }

        match event.code {
            KeyCode::Char(c) => Some(Key::Char(c)),
            KeyCode::Backspace => Some(Key::Backspace),
            KeyCode::Enter => Some(Key::Enter),
            _ => None,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
enum Escape {
    #[default]
    None,
    Started,
    Csi,
    /// ESC O, one more byte follows
    Ss3,
}

/// Decodes a raw byte stream typed at a terminal into keys
///
/// Handles UTF-8 sequences split across reads, treats `\r\n` as a single
/// Enter and drops escape sequences (arrow keys and friends) and other
/// control bytes the prompt does not edit with.
#[derive(Debug, Default)]
pub struct KeyDecoder {
    pending: Vec<u8>,
    after_cr: bool,
    escape: Escape,
}

impl KeyDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn decode(&mut self, bytes: &[u8]) -> Vec<Key> {
        let mut pending = std::mem::take(&mut self.pending);
        pending.extend_from_slice(bytes);

        let mut keys = Vec::new();
        let mut consumed = 0;

        while consumed < pending.len() {
            let rest = &pending[consumed..];
            match std::str::from_utf8(rest) {
                Ok(s) => {
                    s.chars().for_each(|c| self.push_char(c, &mut keys));
                    consumed = pending.len();
                }
                Err(e) => {
                    let valid = e.valid_up_to();
                    if let Ok(s) = std::str::from_utf8(&rest[..valid]) {
                        s.chars().for_each(|c| self.push_char(c, &mut keys));
                    }
                    match e.error_len() {
                        // Invalid bytes are skipped
                        Some(bad) => consumed += valid + bad,
                        // Incomplete sequence, wait for the next read
                        None => {
                            consumed += valid;
                            break;
                        }
                    }
                }
            }
        }

        pending.drain(..consumed);
        self.pending = pending;
        keys
    }

    fn push_char(&mut self, c: char, keys: &mut Vec<Key>) {
        match self.escape {
            Escape::Started => {
                self.escape = match c {
                    '[' => Escape::Csi,
                    'O' => Escape::Ss3,
                    _ => Escape::None,
                };
                return;
            }
            Escape::Ss3 => {
                self.escape = Escape::None;
                return;
            }
            Escape::Csi => {
                if ('\x40'..='\x7e').contains(&c) {
                    self.escape = Escape::None;
                }
                return;
            }
            Escape::None => {}
        }

        let after_cr = std::mem::replace(&mut self.after_cr, c == '\r');

        match c {
            '\r' => keys.push(Key::Enter),
            '\n' if after_cr => {}
            '\n' => keys.push(Key::Enter),
            '\x7f' | '\x08' => keys.push(Key::Backspace),
            '\x03' => keys.push(Key::Interrupt),
            '\x04' => keys.push(Key::Eof),
            '\x1b' => self.escape = Escape::Started,
            c if c.is_control() => {}
            c => keys.push(Key::Char(c)),
        }
    }
}
