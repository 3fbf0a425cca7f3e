//! Console front-end and admin tool for the assistant.
//!
//! Run with: cargo run -p assistant-cli -- chat
//!
//! Configuration via .env file or environment variables:
//!   DATABASE_URL             - SQLite URL (default: sqlite:data/bot.db?mode=rwc)
//!   GEMINI_API_KEY           - API key for GeminiBrain (required unless --mock)
//!   GEMINI_MODEL             - Model name (default: gemini-2.5-flash)
//!   ASSISTANT_ADMIN_IDS      - Comma-separated user ids allowed to run /stats
//!   ASSISTANT_DEFAULT_STYLE  - Style for new users (default: friendly)

mod console;

use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use brain_core::Brain;
use clap::{Parser, Subcommand};
use database::{legacy, Database};
use gemini_brain::GeminiBrain;
use mock_brain::EchoBrain;
use orchestrator::{
    ContextStore, Orchestrator, OrchestratorConfig, OrchestratorError, StyleRegistry,
    UserSettingsStore,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::console::{ConsoleInput, ConsoleSender};

const DEFAULT_DATABASE_URL: &str = "sqlite:data/bot.db?mode=rwc";

#[derive(Debug, Parser)]
#[command(name = "assistant")]
#[command(about = "Chat assistant with per-user styles and dialogue memory")]
struct Args {
    /// SQLite database URL. Falls back to DATABASE_URL env.
    #[arg(long, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Chat on the console as one user
    Chat {
        /// User id to chat as
        #[arg(long, default_value_t = 1)]
        user: i64,

        /// Display handle stored with the user's settings
        #[arg(long)]
        username: Option<String>,

        /// Answer with an echo brain instead of Gemini
        #[arg(long)]
        mock: bool,
    },

    /// Print user, style and context statistics
    Stats {
        /// Also show context stats for this user
        #[arg(long)]
        user: Option<i64>,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Delete a user's dialogue history
    Clear {
        /// User id whose history is removed
        #[arg(long)]
        user: i64,
    },

    /// Import the JSON files written by the flat-file version of the bot
    ImportLegacy {
        /// Settings file (array of settings records)
        #[arg(long, default_value = "data/user-settings.json")]
        settings: PathBuf,

        /// Contexts file (user id -> list of messages)
        #[arg(long, default_value = "data/user-contexts.json")]
        contexts: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("orchestrator=debug".parse()?)
                .add_directive("gemini_brain=info".parse()?)
                .add_directive("database=info".parse()?),
        )
        .init();

    let args = Args::parse();
    let url = args
        .database_url
        .or_else(|| env::var("DATABASE_URL").ok())
        .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());

    let db = Database::connect(&url).await?;
    db.migrate().await?;
    let db = Arc::new(db);

    let result = match args.command {
        Command::Chat {
            user,
            username,
            mock,
        } => chat(db.clone(), user, username, mock).await,
        Command::Stats { user, json } => stats(db.clone(), user, json).await,
        Command::Clear { user } => clear(db.clone(), user).await,
        Command::ImportLegacy { settings, contexts } => {
            let report = legacy::import_files(db.as_ref(), &settings, &contexts).await?;
            println!(
                "Imported {} users and {} messages ({} entries skipped)",
                report.users, report.messages, report.skipped
            );
            Ok(())
        }
    };

    db.close().await;
    result
}

async fn chat(
    db: Arc<Database>,
    user: i64,
    username: Option<String>,
    mock: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let brain: Arc<dyn Brain> = if mock {
        Arc::new(EchoBrain::with_prefix("echo: "))
    } else {
        Arc::new(GeminiBrain::from_env()?)
    };

    let orchestrator = Orchestrator::new(brain, ConsoleSender, db, OrchestratorConfig::from_env());

    println!("Chatting as user {}. Commands: /help, /styles, /context, /clear", user);
    println!("Attach files with !image <path> [caption], !voice <path> <secs>, !audio <path>");
    println!("Type !quit or press Ctrl+D to stop.\n");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let content = match console::parse_line(&line) {
            ConsoleInput::Quit => break,
            ConsoleInput::Invalid(usage) => {
                println!("{}", usage);
                continue;
            }
            ConsoleInput::Message(content) => content,
        };

        let message = console::inbound(user, username.as_deref(), content);
        match orchestrator.handle(message).await {
            Ok(()) => {}
            Err(OrchestratorError::Skipped(_)) => {}
            Err(e) => warn!("Failed to handle message: {}", e),
        }
    }

    info!("Console session for user {} ended", user);
    Ok(())
}

async fn stats(
    db: Arc<Database>,
    user: Option<i64>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let settings = UserSettingsStore::new(db.clone(), Arc::new(StyleRegistry::builtin()));
    let contexts = ContextStore::new(db);

    let users = settings.get_users_count().await;
    let styles = settings.get_style_stats().await;
    let global = contexts.get_global_stats().await;
    let user_stats = match user {
        Some(id) => Some((id, contexts.get_user_context_stats(id).await)),
        None => None,
    };

    if json {
        let styles: serde_json::Map<String, serde_json::Value> = styles
            .into_iter()
            .map(|(key, count)| (key, count.into()))
            .collect();
        let mut out = serde_json::json!({
            "users": users,
            "styles": styles,
            "context": global,
        });
        if let Some((id, stats)) = user_stats {
            out["user"] = serde_json::json!({ "user_id": id, "context": stats });
        }
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("Users: {}", users);
    println!("Styles:");
    for (key, count) in &styles {
        println!("  {:<14} {}", key, count);
    }
    println!(
        "Context: {} users with history, {} messages, {:.2} per user",
        global.total_users, global.total_messages, global.average_messages_per_user
    );
    if let Some((id, stats)) = user_stats {
        println!(
            "User {}: {} messages, ~{} tokens",
            id, stats.message_count, stats.estimated_tokens
        );
        if let (Some(oldest), Some(newest)) = (stats.oldest_message, stats.newest_message) {
            println!("  from {} to {}", oldest.to_rfc3339(), newest.to_rfc3339());
        }
    }
    Ok(())
}

async fn clear(db: Arc<Database>, user: i64) -> Result<(), Box<dyn std::error::Error>> {
    let removed = ContextStore::new(db).clear_user_context(user).await?;
    println!("Removed {} messages for user {}", removed, user);
    Ok(())
}
