//! Media turn helpers: MIME resolution, reply headers and history labels.

use brain_core::{InboundContent, MediaRef};
use database::MessageType;

use crate::sender::TYPING_ACTION;

pub const DEFAULT_VOICE_MIME: &str = "audio/ogg";
pub const DEFAULT_AUDIO_MIME: &str = "audio/mpeg";
pub const DEFAULT_IMAGE_MIME: &str = "image/jpeg";

/// The message type recorded in history for inbound content.
pub fn message_type_of(content: &InboundContent) -> MessageType {
    match content {
        InboundContent::Text(_) => MessageType::Text,
        InboundContent::Image(_) => MessageType::Image,
        InboundContent::Voice(_) => MessageType::Voice,
        InboundContent::Audio(_) => MessageType::Audio,
    }
}

/// MIME type to upload `media` with.
///
/// An explicit type wins. Otherwise the file name (then the path) extension
/// is used when it maps to the right top-level type for `kind`, falling back
/// to a per-kind default.
pub fn resolve_mime_type(media: &MediaRef, kind: MessageType) -> String {
    if let Some(mime) = media.mime_type.as_deref().map(str::trim).filter(|m| !m.is_empty()) {
        return mime.to_string();
    }

    let (family, fallback) = match kind {
        MessageType::Image => ("image/", DEFAULT_IMAGE_MIME),
        MessageType::Voice => ("audio/", DEFAULT_VOICE_MIME),
        MessageType::Audio | MessageType::Text => ("audio/", DEFAULT_AUDIO_MIME),
    };

    let guessed_from_name = media
        .file_name
        .as_deref()
        .and_then(|name| mime_guess::from_path(name).first_raw());
    let guessed = guessed_from_name.or_else(|| mime_guess::from_path(media.path()).first_raw());

    match guessed {
        Some(mime) if mime.starts_with(family) => mime.to_string(),
        _ => fallback.to_string(),
    }
}

/// `"N сек"` up to a minute, `"m:ss мин"` beyond.
pub fn format_duration(secs: u32) -> String {
    if secs > 60 {
        format!("{}:{:02} мин", secs / 60, secs % 60)
    } else {
        format!("{} сек", secs)
    }
}

/// Prefix a media reply the way each kind is presented.
///
/// Images get an analysis header; voice messages with a known duration get
/// a header carrying it; audio files are returned as-is.
pub fn decorate_reply(kind: MessageType, duration_secs: Option<u32>, reply: &str) -> String {
    match (kind, duration_secs) {
        (MessageType::Image, _) => format!("📸 **Анализ изображения**\n\n{}", reply),
        (MessageType::Voice, Some(secs)) if secs > 0 => {
            format!("🎤 **Голосовое сообщение** ({})\n\n{}", format_duration(secs), reply)
        }
        _ => reply.to_string(),
    }
}

/// Text stored in history for a media user turn: the caption when there is
/// one, otherwise a label naming the kind of attachment.
pub fn describe_user_turn(media: &MediaRef, kind: MessageType) -> String {
    if let Some(caption) = media.caption.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        return caption.to_string();
    }

    match kind {
        MessageType::Image => "[Изображение]".to_string(),
        MessageType::Voice => match media.duration_secs {
            Some(secs) if secs > 0 => {
                format!("[Голосовое сообщение, {}]", format_duration(secs))
            }
            _ => "[Голосовое сообщение]".to_string(),
        },
        MessageType::Audio => match media.file_name.as_deref() {
            Some(name) => format!("[Аудиофайл: {}]", name),
            None => "[Аудиофайл]".to_string(),
        },
        MessageType::Text => String::new(),
    }
}

/// Chat action shown while a turn of `kind` is processed.
pub fn chat_action(kind: MessageType) -> &'static str {
    match kind {
        MessageType::Text => TYPING_ACTION,
        MessageType::Image => "upload_photo",
        MessageType::Voice | MessageType::Audio => "record_voice",
    }
}
