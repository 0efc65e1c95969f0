//! CLI `chat` command: an interactive terminal session.
//!
//! Background updates are joined before the next prompt, so tasks and
//! memories always land in turn order here.

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};

use saachi::config::SaachiConfig;
use saachi::conversation::{Session, TaskStatus};
use saachi::server::build_companion;

#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Message(&'a str),
    Tasks,
    Memory,
    Mood(u8),
    Toggle(usize),
    Refresh,
    Help,
    Quit,
    Invalid(String),
    Empty,
}

fn parse_input(line: &str) -> Input<'_> {
    let line = line.trim();
    if line.is_empty() {
        return Input::Empty;
    }
    let Some(command) = line.strip_prefix('/') else {
        return Input::Message(line);
    };
    let mut parts = command.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some("tasks"), None) => Input::Tasks,
        (Some("memory"), None) => Input::Memory,
        (Some("refresh"), None) => Input::Refresh,
        (Some("help"), None) => Input::Help,
        (Some("quit" | "exit"), None) => Input::Quit,
        (Some("mood"), Some(n)) => match n.parse() {
            Ok(score) => Input::Mood(score),
            Err(_) => Input::Invalid(format!("not a mood score: {n}")),
        },
        (Some("done"), Some(n)) => match n.parse::<usize>() {
            Ok(index) if index > 0 => Input::Toggle(index - 1),
            _ => Input::Invalid(format!("not a task number: {n}")),
        },
        _ => Input::Invalid(format!("unknown command: /{command}")),
    }
}

const HELP: &str = "\
Commands:
  /tasks        list tasks
  /done N       toggle task N between pending and completed
  /memory       show short- and long-term memory
  /mood N       log a mood score from 1 to 5
  /refresh      clear short-term context
  /quit         leave";

/// Run an interactive chat against the configured backend.
pub async fn chat(config: &SaachiConfig) -> Result<()> {
    let companion = build_companion(config)?;
    let mut session = Session::with_greeting();

    println!("Saachi: {}", session.conversation.turns()[0].content);
    println!("(type /help for commands)");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        match parse_input(&line) {
            Input::Empty => continue,
            Input::Quit => break,
            Input::Help => println!("{HELP}"),
            Input::Invalid(msg) => println!("{msg}"),
            Input::Tasks => print_tasks(&session),
            Input::Memory => print_memory(&session),
            Input::Refresh => {
                session.clear_short_term();
                println!("Short-term context cleared.");
            }
            Input::Mood(score) => match session.log_mood(score, None) {
                Ok(entry) => println!("Logged mood {}.", entry.score),
                Err(e) => println!("{e}"),
            },
            Input::Toggle(index) => {
                let Some(id) = session.tasks.get(index).map(|t| t.id.clone()) else {
                    println!("No task #{}.", index + 1);
                    continue;
                };
                if let Some(status) = session.toggle_task(&id) {
                    println!("Task #{} is now {:?}.", index + 1, status);
                }
            }
            Input::Message(text) => {
                let exchange = match companion.respond(&mut session, text).await {
                    Ok(exchange) => exchange,
                    Err(e) => {
                        tracing::error!(error = %e, "reply failed");
                        println!("Saachi: (something went wrong, please try again)");
                        continue;
                    }
                };
                println!("Saachi: {}", exchange.reply);

                let updates = exchange.pending.join().await;
                for task in &updates.tasks {
                    println!("  + task: {}", task.title);
                }
                if let Some(fact) = &updates.fact {
                    println!("  + remembered: {fact}");
                }
                session.apply(updates);
            }
        }
    }

    Ok(())
}

fn print_tasks(session: &Session) {
    if session.tasks.is_empty() {
        println!("No tasks yet.");
        return;
    }
    for (i, task) in session.tasks.iter().enumerate() {
        let mark = match task.status {
            TaskStatus::Completed => "x",
            TaskStatus::Pending => " ",
        };
        let due = task
            .due_date
            .as_deref()
            .map(|d| format!(" (due {d})"))
            .unwrap_or_default();
        println!("{:>3}. [{mark}] {}{due}", i + 1, task.title);
    }
}

fn print_memory(session: &Session) {
    println!("Long-term memory:");
    if session.long_term.is_empty() {
        println!("  No long-term memories formed yet.");
    }
    for item in &session.long_term {
        println!("  • {}", item.content);
    }
    println!("Short-term memory:");
    if session.short_term.is_empty() {
        println!("  No active context.");
    }
    for item in &session.short_term {
        println!("  {}", item.content);
    }
}
