// Chat channel
// Couples the prompt line to the message event bus and prints over the prompt safely

use std::cell::RefCell;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::ChatConfig;
use crate::events::{EventBus, EventKind, HandlerId};
use crate::message::Message;
use crate::ui::{self, LineReader, PrintOptions, PromptLine, TerminalError};

#[derive(Error, Debug)]
pub enum ChatError {
    #[error("Terminal error: {0}")]
    Terminal(#[from] TerminalError),

    #[error("Chat input is already being read")]
    AlreadyRunning,
}

pub type Result<T> = std::result::Result<T, ChatError>;

/// A local chat prompt with a `message-sent` / `message-received` bus
///
/// Lines typed at the prompt are published as `message-sent` carrying the
/// configured default sender. Handlers get a reference to the channel, so
/// they can `print` or emit further events while they run.
pub struct ChatChannel {
    bus: EventBus<ChatChannel>,
    line: RefCell<PromptLine>,
    reader: RefCell<Option<LineReader>>,
    default_sender: Option<String>,
}

impl ChatChannel {
    /// Resolve the configured streams and render the prompt
    pub fn new(config: ChatConfig) -> Result<Self> {
        let ChatConfig {
            input,
            output,
            terminal,
            prompt,
            sender,
        } = config;

        let (reader, terminal) = LineReader::open(input, terminal)?;
        let mut line = PromptLine::new(output.into_writer(), prompt, terminal);
        line.redraw(false);

        info!(terminal, sender = sender.as_deref().unwrap_or("-"), "chat channel ready");

        Ok(Self {
            bus: EventBus::new(),
            line: RefCell::new(line),
            reader: RefCell::new(Some(reader)),
            default_sender: sender,
        })
    }

    /// Register a handler for `kind`
    pub fn on<F>(&self, kind: EventKind, handler: F) -> HandlerId
    where
        F: Fn(&ChatChannel, &Message) -> anyhow::Result<()> + 'static,
    {
        self.bus.on(kind, handler)
    }

    pub fn off(&self, id: HandlerId) -> bool {
        self.bus.off(id)
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.bus.listener_count(kind)
    }

    /// Synchronously dispatch `message` to every handler for `kind`
    ///
    /// Returns true if anyone was listening. A handler that re-emits its own
    /// triggering kind unconditionally recurses without bound.
    ///
    /// Failed handlers are logged, and the log line may land on the prompt's
    /// terminal line, so the prompt is redrawn after any failure.
    pub fn emit(&self, kind: EventKind, message: &Message) -> bool {
        let outcome = self.bus.dispatch(self, kind, message);
        if outcome.failed > 0 {
            self.restore_prompt();
        }
        outcome.handlers > 0
    }

    fn restore_prompt(&self) {
        match self.line.try_borrow_mut() {
            Ok(mut line) => line.redraw(true),
            Err(_) => warn!("prompt busy, skipping redraw"),
        }
    }

    /// Publish `message` as though it had been typed at the prompt
    ///
    /// The message goes out exactly as given: the default sender is only
    /// attached to lines that come from the prompt itself.
    pub fn send_message(&self, message: &Message) -> bool {
        self.emit(EventKind::MessageSent, message)
    }

    /// Publish a message that arrived from elsewhere
    pub fn receive_message(&self, message: &Message) -> bool {
        self.emit(EventKind::MessageReceived, message)
    }

    /// Print `text` above the prompt with the default options
    pub fn print(&self, text: &str) {
        self.print_with(text, PrintOptions::default());
    }

    pub fn print_with(&self, text: &str, options: PrintOptions) {
        match self.line.try_borrow_mut() {
            Ok(mut line) => ui::print(&mut *line, text, options),
            Err(_) => warn!("prompt busy, dropping print"),
        }
    }

    /// Change the prompt string and redraw it
    pub fn set_prompt(&self, prompt: impl Into<String>) {
        let mut line = self.line.borrow_mut();
        line.set_prompt(prompt);
        line.redraw(true);
    }

    pub fn default_sender(&self) -> Option<&str> {
        self.default_sender.as_deref()
    }

    pub fn is_prompt_visible(&self) -> bool {
        self.line.borrow().is_visible()
    }

    /// Text the user has typed but not yet submitted
    pub fn current_line(&self) -> String {
        self.line.borrow().buffer().to_string()
    }

    /// Read lines until the input ends, publishing each as `message-sent`
    ///
    /// There is no cancellation: this returns once the input stream closes,
    /// or the user ends it with Ctrl+C / Ctrl+D at the prompt.
    pub async fn run(&self) -> Result<()> {
        let mut reader = self
            .reader
            .borrow_mut()
            .take()
            .ok_or(ChatError::AlreadyRunning)?;

        while let Some(text) = reader.next_line(&self.line).await? {
            self.line_submitted(text);
        }

        debug!("chat input closed");
        Ok(())
    }

    fn line_submitted(&self, text: String) {
        let message = Message::new(text).with_sender_opt(self.default_sender.clone());
        if !self.send_message(&message) {
            debug!("line submitted with no message-sent listeners");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Write};
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

    impl SharedBuffer {
        fn take(&self) -> String {
            String::from_utf8(std::mem::take(&mut *self.0.borrow_mut())).unwrap()
        }
    }

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn channel(input: &'static [u8], sender: Option<&str>) -> (ChatChannel, SharedBuffer) {
        let out = SharedBuffer::default();
        let mut config = ChatConfig::default().with_input(input).with_output(out.clone());
        if let Some(sender) = sender {
            config = config.with_sender(sender);
        }
        (ChatChannel::new(config).unwrap(), out)
    }

    #[test]
    fn test_prompt_rendered_on_construction() {
        let (chat, out) = channel(b"", None);
        assert_eq!(out.take(), "\r\x1b[2K> ");
        assert!(chat.is_prompt_visible());
    }

    #[test]
    fn test_emit_reports_listeners() {
        let (chat, _out) = channel(b"", None);
        assert!(!chat.emit(EventKind::MessageReceived, &Message::new("x")));

        chat.on(EventKind::MessageReceived, |_, _| Ok(()));
        assert!(chat.emit(EventKind::MessageReceived, &Message::new("x")));
        assert!(!chat.send_message(&Message::new("x")));
    }

    #[test]
    fn test_send_message_does_not_inject_default_sender() {
        let (chat, _out) = channel(b"", Some("bot"));
        let seen = Rc::new(RefCell::new(Vec::new()));

        let s = Rc::clone(&seen);
        chat.on(EventKind::MessageSent, move |_, m| {
            s.borrow_mut().push((m.text().to_string(), m.sender().map(String::from)));
            Ok(())
        });

        assert!(chat.send_message(&Message::new("hi")));
        assert_eq!(*seen.borrow(), vec![("hi".to_string(), None)]);
    }

    #[test]
    fn test_handler_can_print_through_channel() {
        let (chat, out) = channel(b"", None);
        out.take();

        chat.on(EventKind::MessageReceived, |chat, m| {
            chat.print(&format!("<{}>: {}", m.sender().unwrap_or("unknown"), m.text()));
            Ok(())
        });

        chat.receive_message(&Message::new("hey").with_sender("eve"));
        assert_eq!(out.take(), "\x1b[2K\r<eve>: hey\n\r\x1b[2K> ");
    }

    #[test]
    fn test_failed_handler_redraws_prompt() {
        let (chat, out) = channel(b"", None);
        chat.on(EventKind::MessageReceived, |_, _| anyhow::bail!("transport down"));
        chat.on(EventKind::MessageReceived, |_, _| panic!("bad handler"));
        out.take();

        assert!(chat.receive_message(&Message::new("x")));
        assert_eq!(out.take(), "\r\x1b[2K> ");
        assert!(chat.is_prompt_visible());
    }

    #[test]
    fn test_successful_dispatch_leaves_prompt_alone() {
        let (chat, out) = channel(b"", None);
        chat.on(EventKind::MessageReceived, |_, _| Ok(()));
        out.take();

        chat.receive_message(&Message::new("x"));
        assert_eq!(out.take(), "");
    }

    #[test]
    fn test_print_without_output_is_noop() {
        let config = ChatConfig::default().with_input(&b""[..]).without_output();
        let chat = ChatChannel::new(config).unwrap();

        chat.print("into the void");
        assert!(!chat.is_prompt_visible());
    }

    #[test]
    fn test_set_prompt_redraws() {
        let (chat, out) = channel(b"", None);
        out.take();

        chat.set_prompt("# ");
        assert_eq!(out.take(), "\r\x1b[2K# ");
    }

    #[tokio::test]
    async fn test_run_translates_lines_with_default_sender() {
        let (chat, _out) = channel(b"hello\n", Some("alice"));
        let seen = Rc::new(RefCell::new(Vec::new()));

        let s = Rc::clone(&seen);
        chat.on(EventKind::MessageSent, move |_, m| {
            s.borrow_mut().push((
                m.text().to_string(),
                m.sender().map(String::from),
                m.extra().is_none(),
            ));
            Ok(())
        });

        chat.run().await.unwrap();
        assert_eq!(
            *seen.borrow(),
            vec![("hello".to_string(), Some("alice".to_string()), true)]
        );
    }

    #[tokio::test]
    async fn test_run_twice_fails() {
        let (chat, _out) = channel(b"", None);
        chat.run().await.unwrap();
        assert!(matches!(chat.run().await, Err(ChatError::AlreadyRunning)));
    }
}
