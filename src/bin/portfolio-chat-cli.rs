//! Terminal host for the chat widget.
//!
//! Each line typed is a submission. `/1`..`/N` pick a quick question while
//! the panel is still shown, `/clear` clears the chat and `/quit` exits.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;
use tracing_subscriber::EnvFilter;

use portfolio_chat::{
    services::portfolio::Portfolio,
    widget::{
        ChatWidget, WidgetConfig,
        api::HttpChatApi,
        events::{Dialogs, WidgetEvent},
        view::{ChatMessage, ChatView, Role},
    },
};

type SharedLines = Arc<Mutex<Lines<BufReader<Stdin>>>>;

struct TerminalDialogs {
    lines: SharedLines,
}

#[async_trait]
impl Dialogs for TerminalDialogs {
    async fn confirm(&self, prompt: &str) -> bool {
        println!("{prompt} [y/N]");
        match self.lines.lock().await.next_line().await {
            Ok(Some(answer)) => matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"),
            _ => false,
        }
    }

    async fn alert(&self, message: &str) {
        println!("!! {message}");
    }
}

fn print_message(message: &ChatMessage, bot_avatar: &str) {
    let who = match message.role {
        Role::User => "U",
        Role::Bot => bot_avatar,
    };
    println!("[{}] {who}: {}", message.timestamp, message.text.replace('\n', "\n    "));
}

fn print_quick_questions(view: &ChatView) {
    if let Some(questions) = &view.quick_questions {
        for (i, q) in questions.iter().enumerate() {
            println!("  /{} {}", i + 1, q.label);
        }
    }
}

fn print_view(view: &ChatView, bot_avatar: &str) {
    for message in &view.messages {
        print_message(message, bot_avatar);
    }
    print_quick_questions(view);
}

enum Command {
    Widget(WidgetEvent),
    Say(String),
    /// `/N` with no matching quick question on screen.
    NoSuchQuestion(usize),
}

fn parse_command(line: &str, view: &ChatView) -> Command {
    let trimmed = line.trim();
    if trimmed == "/clear" {
        return Command::Widget(WidgetEvent::ClearRequested);
    }
    if let Some(index) = trimmed.strip_prefix('/').and_then(|n| n.parse::<usize>().ok()) {
        let question = view
            .quick_questions
            .as_ref()
            .and_then(|qs| qs.get(index.checked_sub(1)?))
            .map(|q| q.question.clone());
        return match question {
            Some(question) => Command::Widget(WidgetEvent::QuickQuestion(question)),
            None => Command::NoSuchQuestion(index),
        };
    }
    Command::Say(line.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let server = std::env::var("CHAT_SERVER_URL").unwrap_or_else(|_| "http://127.0.0.1:5000".to_string());
    let portfolio = match std::env::var("PORTFOLIO_PATH") {
        Ok(path) => Portfolio::load(std::path::Path::new(&path)).await?,
        Err(_) => Portfolio::sample()?,
    };
    let config = WidgetConfig::for_portfolio(&portfolio);
    let bot_avatar = config.bot_avatar().to_string();

    let lines: SharedLines = Arc::new(Mutex::new(BufReader::new(tokio::io::stdin()).lines()));
    let api = HttpChatApi::new(&server).context("failed to build HTTP client")?;
    let mut widget = ChatWidget::new(api, TerminalDialogs { lines: lines.clone() }, &config);

    // Typing indicator, driven by view changes while a request is in flight.
    let mut changes = widget.subscribe();
    let typing_avatar = bot_avatar.clone();
    tokio::spawn(async move {
        let mut was_typing = false;
        while changes.changed().await.is_ok() {
            let typing = changes.borrow_and_update().input.typing;
            if typing && !was_typing {
                println!("{typing_avatar} is typing...");
            }
            was_typing = typing;
        }
    });

    println!("{} ({})", config.page.title, server);
    print_view(&widget.view(), &bot_avatar);
    widget.handle(WidgetEvent::Loaded).await;

    loop {
        let next = lines.lock().await.next_line().await?;
        let Some(line) = next else { break };
        if line.trim() == "/quit" {
            break;
        }

        let before = widget.view().messages.len();
        let command = parse_command(&line, &widget.view());
        match command {
            Command::Widget(WidgetEvent::ClearRequested) => {
                let snapshot = widget.view().clone();
                widget.handle(WidgetEvent::ClearRequested).await;
                if *widget.view() != snapshot {
                    println!("-- chat cleared --");
                    print_view(&widget.view(), &bot_avatar);
                }
                continue;
            }
            Command::Widget(event) => {
                widget.handle(event).await;
            }
            Command::Say(text) => {
                widget.handle(WidgetEvent::Input(text)).await;
                widget.handle(WidgetEvent::Submit).await;
            }
            Command::NoSuchQuestion(index) => {
                if widget.view().has_quick_questions() {
                    println!("no quick question /{index}; pick one from the list above");
                } else {
                    println!("quick questions are gone; type your question or /clear to bring them back");
                }
                continue;
            }
        }

        let view = widget.view();
        for message in view.messages.iter().skip(before) {
            print_message(message, &bot_avatar);
        }
    }
    Ok(())
}
