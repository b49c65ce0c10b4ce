//! A terminal host for the lead chat: plays the page that owns the language
//! switch, shows the transcript and opens the hand-off link.

#[macro_use]
extern crate tracing;

use std::env;
use std::io::Write as _;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use lead_chat::SessionBuilder;
use lead_chat::core::hand_off::{HandOffState, HandOffTrigger};
use lead_chat::core::i18n::{Persona, TextKey};
use lead_chat::core::locale::Locale;
use lead_chat::core::transcript::{Message, Role};
use lead_chat::core::{HandOffErrorKind, SendErrorKind};
use lead_chat_openai_model::{OpenAIConfigBuilder, OpenAIProvider};
use owo_colors::OwoColorize;
use tokio::io::{self, AsyncBufReadExt};
use tokio::select;
use tokio::sync::mpsc;
use tokio::time::sleep;

enum SessionEvent {
    Message(Message),
    Idle,
    HandOffReady(HandOffTrigger),
}

enum Command {
    Send(String),
    Lang(Option<Locale>),
    HandOff,
    Open,
    Close,
    Quit,
}

impl Command {
    fn parse(line: &str) -> Self {
        let line = line.trim();
        let Some(command) = line.strip_prefix('/') else {
            return Self::Send(line.to_owned());
        };
        let (name, arg) = command.split_once(' ').unwrap_or((command, ""));
        match name {
            "lang" => Self::Lang(arg.parse().ok()),
            "handoff" => Self::HandOff,
            "open" => Self::Open,
            "close" => Self::Close,
            "quit" | "exit" => Self::Quit,
            _ => Self::Send(line.to_owned()),
        }
    }
}

const BAR_CHAR: &str = "▎";

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut config = match env::var("LEAD_CHAT_API_KEY") {
        Ok(api_key) => OpenAIConfigBuilder::with_api_key(api_key),
        Err(_) => {
            eprintln!(
                "LEAD_CHAT_API_KEY is not set, every reply will be the fallback"
            );
            OpenAIConfigBuilder::without_api_key()
        }
    };
    if let Ok(base_url) = env::var("LEAD_CHAT_BASE_URL") {
        config = config.with_base_url(base_url);
    }
    if let Ok(model) = env::var("LEAD_CHAT_MODEL") {
        config = config.with_model(model);
    }
    let model_provider = OpenAIProvider::new(config.build());

    let persona = env::var("LEAD_CHAT_PERSONA")
        .map(|name| Persona::from_name(&name))
        .unwrap_or_default();
    let locale = match env::var("LEAD_CHAT_LANG") {
        Ok(code) => code.parse().unwrap_or_else(|err| {
            eprintln!("{err}, falling back to English");
            Locale::En
        }),
        Err(_) => Locale::En,
    };

    let (event_tx, mut event_rx) = mpsc::unbounded_channel();

    let session = SessionBuilder::with_model_provider(model_provider)
        .with_persona(persona)
        .with_locale(locale)
        .on_message({
            let event_tx = event_tx.clone();
            move |msg| {
                event_tx.send(SessionEvent::Message(msg.clone())).ok();
            }
        })
        .on_idle({
            let event_tx = event_tx.clone();
            move || {
                event_tx.send(SessionEvent::Idle).ok();
            }
        })
        .on_hand_off_ready(move |trigger| {
            event_tx
                .send(SessionEvent::HandOffReady(trigger.clone()))
                .ok();
        })
        .build();

    let progress_style = ProgressStyle::with_template("{spinner} {wide_msg}")
        .unwrap()
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");

    println!(
        "{}",
        "Commands: /lang en|es, /handoff, /open, /close, /quit".dimmed()
    );
    session.widget().open().await.ok();

    'outer: loop {
        // Render whatever happened since the last prompt.
        while let Ok(event) = event_rx.try_recv() {
            render(&session, event);
        }

        print!("> ");
        std::io::stdout().flush().unwrap();

        let Some(line) = read_line().await else {
            break;
        };

        match Command::parse(&line) {
            Command::Quit => break,
            Command::Lang(Some(locale)) => {
                session.set_locale(locale);
                println!("{}", format!("language: {locale}").dimmed());
                continue;
            }
            Command::Lang(None) => {
                println!("{}", "usage: /lang en|es".bright_red());
                continue;
            }
            Command::Open => {
                session.widget().open().await.ok();
                continue;
            }
            Command::Close => {
                session.widget().close().await.ok();
                println!("{}", "(widget hidden)".dimmed());
                continue;
            }
            Command::HandOff => {
                hand_off(&session).await;
                continue;
            }
            Command::Send(text) => {
                if let Err(err) = session.widget().send(text).await {
                    match err.kind() {
                        SendErrorKind::EmptyInput => {}
                        SendErrorKind::Busy => {
                            println!("{}", "Karu is still typing...".yellow());
                        }
                        SendErrorKind::ShutDown => break,
                    }
                    continue;
                }
            }
        }

        let mut progress_bar = None;

        loop {
            // Create a new progress bar if it has been finished.
            progress_bar
                .get_or_insert_with(|| {
                    let progress_bar = ProgressBar::new_spinner();
                    progress_bar.set_style(progress_style.clone());
                    progress_bar.set_message("Karu is typing...");
                    progress_bar
                })
                .inc(1);

            let sleep = sleep(Duration::from_millis(100));
            let event = select! {
                event = event_rx.recv() => {
                    let Some(event) = event else {
                        break 'outer;
                    };
                    event
                },
                _ = sleep => {
                    continue;
                }
            };

            // Finish the progress bar before printing anything else.
            if let Some(progress_bar) = &progress_bar {
                progress_bar.finish_and_clear();
            }
            progress_bar = None;

            if matches!(event, SessionEvent::Idle) {
                break;
            }
            render(&session, event);
        }
    }

    session.widget().shutdown();
}

fn render(session: &lead_chat::Session, event: SessionEvent) {
    match event {
        SessionEvent::Message(msg) => {
            if msg.role() == Role::Assistant {
                println!(
                    "{}{} {}",
                    BAR_CHAR.bright_cyan(),
                    "Karu:".bold(),
                    msg.content().bright_white()
                );
            }
        }
        SessionEvent::HandOffReady(trigger) => {
            debug!("hand-off ready: {trigger:?}");
            println!(
                "{}{}  {}",
                BAR_CHAR.bright_green(),
                session.text(TextKey::BookCall).bright_green().bold(),
                "(/handoff)".dimmed()
            );
        }
        SessionEvent::Idle => {}
    }
}

async fn hand_off(session: &lead_chat::Session) {
    match session.widget().hand_off().await {
        Ok(url) => println!("{}", format!("opened {url}").dimmed()),
        Err(err) => match err.kind() {
            HandOffErrorKind::NotReady => {
                let state = session.widget().hand_off_state().await;
                debug!("hand-off refused in state {state:?}");
                if state == Ok(HandOffState::NotReady) {
                    println!("{}", "Tell Karu a bit more first.".yellow());
                }
            }
            HandOffErrorKind::Launch => {
                println!("{}", err.bright_red());
                if let Some(url) = err.url() {
                    println!("open it yourself: {url}");
                }
            }
            HandOffErrorKind::ShutDown => println!("{}", err.bright_red()),
        },
    }
}

async fn read_line() -> Option<String> {
    let mut stdin = io::BufReader::new(io::stdin());
    let mut line = String::new();

    match stdin.read_line(&mut line).await {
        Ok(count) => {
            if count == 0 {
                return None;
            }
            Some(line)
        }
        Err(err) => {
            error!("error reading input: {}", err);
            None
        }
    }
}
