//! Message types shared by the chat transport and the orchestrator.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// A message received from a chat user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    /// Platform identity of the sender.
    pub user_id: i64,
    /// Sender's display handle, if the platform provides one.
    pub username: Option<String>,
    /// Chat the reply should go to.
    pub chat_id: i64,
    /// What the user sent.
    pub content: InboundContent,
    /// Receive time in milliseconds since epoch.
    pub timestamp: u64,
}

impl InboundMessage {
    /// Create a text message in the sender's private chat.
    pub fn text(user_id: i64, text: impl Into<String>, timestamp: u64) -> Self {
        Self::new(user_id, InboundContent::Text(text.into()), timestamp)
    }

    /// Create a message with arbitrary content in the sender's private chat.
    pub fn new(user_id: i64, content: InboundContent, timestamp: u64) -> Self {
        Self {
            user_id,
            username: None,
            chat_id: user_id,
            content,
            timestamp,
        }
    }

    /// Set the sender's display handle.
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Route the reply to a different chat.
    pub fn in_chat(mut self, chat_id: i64) -> Self {
        self.chat_id = chat_id;
        self
    }

    /// Text body, if this is a text message.
    pub fn as_text(&self) -> Option<&str> {
        match &self.content {
            InboundContent::Text(text) => Some(text),
            _ => None,
        }
    }
}

/// Content of an inbound message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum InboundContent {
    Text(String),
    Image(MediaRef),
    /// Recorded voice note.
    Voice(MediaRef),
    /// Uploaded audio file.
    Audio(MediaRef),
}

/// A media file downloaded to local disk by the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRef {
    pub path: PathBuf,
    /// MIME type reported by the platform.
    pub mime_type: Option<String>,
    /// Original file name, used to infer the MIME type.
    pub file_name: Option<String>,
    /// Duration in seconds for voice and audio.
    pub duration_secs: Option<u32>,
    /// Text the user attached to the media.
    pub caption: Option<String>,
    /// When true the file is deleted once processing finishes.
    pub temporary: bool,
}

impl MediaRef {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            mime_type: None,
            file_name: None,
            duration_secs: None,
            caption: None,
            temporary: false,
        }
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    pub fn with_duration(mut self, secs: u32) -> Self {
        self.duration_secs = Some(secs);
        self
    }

    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }

    /// Mark the file for deletion after processing.
    pub fn temporary(mut self) -> Self {
        self.temporary = true;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// A reply to deliver to a chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub chat_id: i64,
    pub text: String,
}

impl OutboundMessage {
    pub fn new(chat_id: i64, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            text: text.into(),
        }
    }

    /// Create a reply addressed to the chat the message came from.
    pub fn reply_to(message: &InboundMessage, text: impl Into<String>) -> Self {
        Self::new(message.chat_id, text)
    }
}

/// Handle for a file the backend has accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedMedia {
    /// Backend-specific reference to the file.
    pub uri: String,
    pub mime_type: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_message_defaults_to_private_chat() {
        let msg = InboundMessage::text(42, "hello", 1_700_000_000_000).with_username("alice");

        assert_eq!(msg.chat_id, 42);
        assert_eq!(msg.as_text(), Some("hello"));
        assert_eq!(msg.username.as_deref(), Some("alice"));
    }

    #[test]
    fn test_reply_goes_to_source_chat() {
        let msg = InboundMessage::text(42, "hi", 0).in_chat(-100);
        let reply = OutboundMessage::reply_to(&msg, "hey");

        assert_eq!(reply.chat_id, -100);
        assert_eq!(reply.text, "hey");
    }

    #[test]
    fn test_media_builder() {
        let media = MediaRef::new("/tmp/voice.ogg")
            .with_duration(75)
            .with_caption("listen")
            .temporary();
        let msg = InboundMessage::new(1, InboundContent::Voice(media), 0);

        assert!(msg.as_text().is_none());
        match msg.content {
            InboundContent::Voice(media) => {
                assert_eq!(media.duration_secs, Some(75));
                assert!(media.temporary);
                assert_eq!(media.path(), Path::new("/tmp/voice.ogg"));
            }
            other => panic!("unexpected content: {:?}", other),
        }
    }
}
