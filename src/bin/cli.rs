//! `chat-stream-cli` - interactive client for a `chat_stream` server
//!
//! Each line read from stdin is submitted as a message and the reply is
//! printed as it streams in. `/cancel`, `/clear` and `/quit` are commands.

use chat_stream::api::HealthResponse;
use chat_stream::config::ClientConfig;
use chat_stream::consumer::{ApiClient, HttpOpener};
use chat_stream::protocol::Role;
use chat_stream::session::{Session, SessionObserver};
use chat_stream::state_machine::{Conversation, MessageStatus, SessionStatus};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::Instant;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, PartialEq, Eq)]
enum Command<'a> {
    Submit(&'a str),
    Cancel,
    Clear,
    Quit,
    Empty,
}

impl<'a> Command<'a> {
    fn parse(line: &'a str) -> Self {
        match line.trim() {
            "" => Command::Empty,
            "/cancel" => Command::Cancel,
            "/clear" => Command::Clear,
            "/quit" | "/exit" => Command::Quit,
            text => Command::Submit(text),
        }
    }
}

/// Prints the assistant's reply incrementally
#[derive(Default)]
struct Printer {
    /// Id of the reply being printed and how many bytes of it are out
    current: Option<(String, usize)>,
    finished: bool,
}

impl SessionObserver for Printer {
    fn on_messages_changed(&mut self, conversation: &Conversation) {
        let mut out = std::io::stdout().lock();
        let Some(last) = conversation.last() else {
            self.current = None;
            let _ = writeln!(out, "(conversation cleared)");
            return;
        };
        if last.role() != Role::Assistant {
            return;
        }

        let printed = match &self.current {
            Some((id, printed)) if id == last.id() => *printed,
            _ => {
                self.finished = false;
                let _ = write!(out, "assistant: ");
                0
            }
        };
        let content = last.content();
        if let Some(new) = content.get(printed..) {
            let _ = write!(out, "{new}");
        }
        self.current = Some((last.id().to_string(), content.len()));

        if last.status().is_final() && !self.finished {
            self.finished = true;
            if last.is_cancelled() {
                let _ = write!(out, " [cancelled]");
            } else if let MessageStatus::Errored { reason } = last.status() {
                let _ = write!(out, " [error: {reason}]");
            }
            let _ = writeln!(out);
        }
        let _ = out.flush();
    }

    fn on_status_changed(&mut self, status: &SessionStatus) {
        if *status == SessionStatus::Thinking {
            eprintln!("Thinking...");
        }
    }
}

async fn deadline_elapsed(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging on stderr so replies stay clean on stdout
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chat_stream=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = ClientConfig::from_env();
    let client = ApiClient::new(config.base_url.clone());

    match client.get_json::<HealthResponse>("/health", &[]).await {
        Ok(health) => eprintln!("Connected to {} (server {})", config.base_url, health.version),
        Err(e) => eprintln!("warning: {} is not reachable: {e}", config.base_url),
    }
    eprintln!("Type a message and press enter. Commands: /cancel /clear /quit");

    let mut session = Session::new(HttpOpener::new(client), Printer::default())
        .with_max_frame_bytes(config.max_frame_bytes);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut deadline: Option<Instant> = None;

    loop {
        tokio::select! {
            Some(_) = session.next_event(), if session.is_in_flight() => {}
            () = deadline_elapsed(deadline), if session.is_in_flight() => {
                eprintln!("Reply timed out");
                session.cancel();
            }
            signal = tokio::signal::ctrl_c() => {
                signal?;
                if session.is_in_flight() {
                    session.cancel();
                } else {
                    break;
                }
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    // Input closed; let the last reply finish
                    match config.timeout {
                        Some(timeout) => {
                            session.wait_idle_or_cancel(timeout).await;
                        }
                        None => session.wait_idle().await,
                    }
                    break;
                };

                match Command::parse(&line) {
                    Command::Empty => {}
                    Command::Quit => break,
                    Command::Cancel => {
                        if !session.is_in_flight() {
                            eprintln!("Nothing to cancel");
                        }
                        session.cancel();
                    }
                    Command::Clear => {
                        if let Err(e) = session.clear() {
                            eprintln!("{e}");
                        }
                    }
                    Command::Submit(text) => match session.submit(text) {
                        Ok(()) => deadline = config.timeout.map(|timeout| Instant::now() + timeout),
                        Err(e) => eprintln!("{e}"),
                    },
                }
            }
        }
    }

    session.cancel();
    Ok(())
}
