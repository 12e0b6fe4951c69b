// Chatline - local terminal chat prompt
// Typed lines and incoming messages share one terminal without garbling the prompt

use anyhow::Context;
use chatline::ui::DiagnosticWriter;
use chatline::{events, ChatChannel, ChatConfig, EventKind, Message};
use clap::Parser;
use tokio::time::{interval, Duration};
use tracing::debug;

#[derive(Parser, Debug)]
#[command(name = "chatline")]
#[command(author = "Chatline Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Terminal chat prompt with asynchronous output", long_about = None)]
struct Args {
    /// Prompt shown in front of the input line
    #[arg(short, long, default_value = "> ")]
    prompt: String,

    /// Sender label attached to the lines you type
    #[arg(short, long)]
    name: Option<String>,

    /// Read plain lines instead of switching the terminal to raw mode
    #[arg(long)]
    no_terminal: bool,

    /// Answer every sent line with a received echo
    #[arg(short, long)]
    echo: bool,

    /// Receive a message every N seconds, to watch output arrive mid-typing
    #[arg(short, long)]
    tick: Option<u64>,

    /// Prefix printed messages with the local time
    #[arg(long)]
    timestamps: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Logs go to stderr; stdout belongs to the prompt
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(DiagnosticWriter::stderr)
        .init();

    // Handler panics are caught and logged by the event bus
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        if !events::in_dispatch() {
            default_hook(info);
        }
    }));

    let args = Args::parse();

    if let Err(e) = run(args).await {
        eprintln!("\r❌ Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let mut config = ChatConfig::default()
        .with_prompt(args.prompt)
        .with_terminal(!args.no_terminal);
    config.sender = args.name;

    let chat = ChatChannel::new(config).context("failed to open terminal")?;

    let timestamps = args.timestamps;
    for kind in EventKind::ALL {
        chat.on(kind, move |chat, msg| {
            chat.print(&render(msg, timestamps));
            Ok(())
        });
    }

    if args.echo {
        chat.on(EventKind::MessageSent, |chat, msg| {
            if msg.text().trim().is_empty() {
                return Ok(());
            }
            let reply = Message::new(msg.text())
                .with_sender("echo")
                .with_extra("in_reply_to", msg.sender().unwrap_or("unknown"));
            chat.receive_message(&reply);
            Ok(())
        });
    }

    chat.receive_message(
        &Message::new("Type a message and press Enter. Ctrl+D to quit.").with_sender("chatline"),
    );

    let input = chat.run();
    tokio::pin!(input);

    let Some(secs) = args.tick else {
        return Ok(input.await?);
    };

    let mut ticker = interval(Duration::from_secs(secs.max(1)));
    ticker.tick().await; // Skip first immediate tick
    let mut count: u64 = 0;

    loop {
        tokio::select! {
            result = &mut input => {
                debug!(ticks = count, "input finished");
                return Ok(result?);
            }
            _ = ticker.tick() => {
                count += 1;
                chat.receive_message(
                    &Message::new(format!("tick #{}", count))
                        .with_sender("clock")
                        .with_extra("count", count),
                );
            }
        }
    }
}

fn render(msg: &Message, timestamps: bool) -> String {
    let line = format!("<{}>: {}", msg.sender().unwrap_or("unknown"), msg.text());
    if timestamps {
        format!("{} {}", chrono::Local::now().format("%H:%M:%S"), line)
    } else {
        line
    }
}
