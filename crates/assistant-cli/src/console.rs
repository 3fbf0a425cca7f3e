//! Console transport: stdin lines in, stdout replies out.

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use orchestrator::{InboundContent, InboundMessage, MediaRef, MessageSender, OrchestratorError};

/// Prints replies and chat actions to stdout.
#[derive(Debug, Clone, Default)]
pub struct ConsoleSender;

#[async_trait]
impl MessageSender for ConsoleSender {
    async fn send_message(&self, _chat_id: i64, text: &str) -> Result<(), OrchestratorError> {
        println!("\n{}\n", text);
        Ok(())
    }

    async fn send_chat_action(&self, _chat_id: i64, action: &str) -> Result<(), OrchestratorError> {
        println!("… {}", action);
        Ok(())
    }
}

/// What a console line asks for.
#[derive(Debug, PartialEq)]
pub enum ConsoleInput {
    Message(InboundContent),
    Quit,
    /// A `!` directive with bad arguments; the string is the usage hint.
    Invalid(&'static str),
}

const IMAGE_USAGE: &str = "usage: !image <path> [caption]";
const VOICE_USAGE: &str = "usage: !voice <path> <seconds>";
const AUDIO_USAGE: &str = "usage: !audio <path>";

/// Parse one line of console input.
///
/// `!image`, `!voice` and `!audio` attach a local file; `!quit` ends the
/// session. Anything else is sent as text, slash commands included.
pub fn parse_line(line: &str) -> ConsoleInput {
    let trimmed = line.trim();
    let Some(directive) = trimmed.strip_prefix('!') else {
        return ConsoleInput::Message(InboundContent::Text(line.to_string()));
    };

    let mut parts = directive.splitn(2, char::is_whitespace);
    let name = parts.next().unwrap_or_default();
    let rest = parts.next().unwrap_or_default().trim();

    match name {
        "quit" | "exit" => ConsoleInput::Quit,
        "image" => {
            let mut args = rest.splitn(2, char::is_whitespace);
            match args.next().filter(|p| !p.is_empty()) {
                Some(path) => {
                    let mut media = MediaRef::new(PathBuf::from(path));
                    if let Some(caption) = args.next().map(str::trim).filter(|c| !c.is_empty()) {
                        media = media.with_caption(caption);
                    }
                    ConsoleInput::Message(InboundContent::Image(media))
                }
                None => ConsoleInput::Invalid(IMAGE_USAGE),
            }
        }
        "voice" => {
            let args: Vec<&str> = rest.split_whitespace().collect();
            match args.as_slice() {
                [path, secs] => match secs.parse::<u32>() {
                    Ok(secs) => ConsoleInput::Message(InboundContent::Voice(
                        MediaRef::new(PathBuf::from(path)).with_duration(secs),
                    )),
                    Err(_) => ConsoleInput::Invalid(VOICE_USAGE),
                },
                _ => ConsoleInput::Invalid(VOICE_USAGE),
            }
        }
        "audio" => {
            if rest.is_empty() {
                return ConsoleInput::Invalid(AUDIO_USAGE);
            }
            let path = PathBuf::from(rest);
            let mut media = MediaRef::new(path.clone());
            if let Some(name) = path.file_name() {
                media = media.with_file_name(name.to_string_lossy());
            }
            ConsoleInput::Message(InboundContent::Audio(media))
        }
        // Unknown directives go through as text
        _ => ConsoleInput::Message(InboundContent::Text(line.to_string())),
    }
}

/// Build the inbound message for a console line.
pub fn inbound(user_id: i64, username: Option<&str>, content: InboundContent) -> InboundMessage {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default();

    let message = InboundMessage::new(user_id, content, timestamp);
    match username {
        Some(name) => message.with_username(name),
        None => message,
    }
}
