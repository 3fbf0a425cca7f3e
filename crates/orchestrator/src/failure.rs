//! Backend failure classification.

use brain_core::BrainError;
use database::MessageType;

/// Known categories of generation failure, each with its own reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    RegionUnavailable,
    QuotaExceeded,
    PayloadTooLarge,
    UnsupportedFormat,
    EmptyResponse,
    Unknown,
}

impl FailureKind {
    /// Classify by the text the backend reported.
    pub fn classify(error: &BrainError) -> Self {
        if matches!(error, BrainError::EmptyResponse) {
            return Self::EmptyResponse;
        }

        let text = error.to_string().to_lowercase();
        if text.contains("user location is not supported") {
            Self::RegionUnavailable
        } else if text.contains("quota") {
            Self::QuotaExceeded
        } else if text.contains("file size") {
            Self::PayloadTooLarge
        } else if text.contains("unsupported") {
            Self::UnsupportedFormat
        } else {
            Self::Unknown
        }
    }

    /// Reply shown to the user for a failure while handling `kind` input.
    pub fn user_message(&self, kind: MessageType) -> &'static str {
        match (self, kind) {
            (Self::RegionUnavailable, _) => {
                "😔 К сожалению, Gemini API недоступен в вашем регионе. Попробуйте использовать VPN."
            }
            (Self::QuotaExceeded, _) => "⚠️ Превышена квота API. Попробуйте позже.",
            (Self::PayloadTooLarge, MessageType::Image) => {
                "📁 Изображение слишком большое. Попробуйте отправить изображение меньшего размера."
            }
            (Self::PayloadTooLarge, MessageType::Voice | MessageType::Audio) => {
                "📁 Файл слишком большой. Попробуйте отправить более короткое аудио."
            }
            (Self::PayloadTooLarge, MessageType::Text) => {
                "📁 Запрос слишком большой. Попробуйте сократить сообщение."
            }
            (Self::UnsupportedFormat, MessageType::Image) => {
                "🚫 Неподдерживаемый формат изображения. Используйте JPG, PNG, WEBP, HEIC или HEIF."
            }
            (Self::UnsupportedFormat, MessageType::Voice | MessageType::Audio) => {
                "🚫 Неподдерживаемый формат аудио. Используйте MP3, OGG, WAV, M4A или FLAC."
            }
            (Self::UnsupportedFormat, MessageType::Text) => "🚫 Неподдерживаемый формат файла.",
            (Self::EmptyResponse, _) => "Извините, не удалось сгенерировать ответ.",
            (Self::Unknown, MessageType::Text) => {
                "Извините, произошла ошибка при обработке вашего запроса. Попробуйте еще раз."
            }
            (Self::Unknown, MessageType::Image) => {
                "Извините, произошла ошибка при обработке вашего изображения. Попробуйте еще раз или отправьте другое изображение."
            }
            (Self::Unknown, MessageType::Voice | MessageType::Audio) => {
                "Извините, произошла ошибка при обработке вашего аудиосообщения. Попробуйте еще раз или отправьте более короткое сообщение."
            }
        }
    }
}

/// Classify `error` and pick the reply for `kind` input.
pub fn failure_reply(error: &BrainError, kind: MessageType) -> &'static str {
    FailureKind::classify(error).user_message(kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        let cases = [
            (
                BrainError::ProcessingFailed(
                    "API error (400): User location is not supported for the API use.".into(),
                ),
                FailureKind::RegionUnavailable,
            ),
            (
                BrainError::ProcessingFailed("API error (429): Resource has been exhausted (e.g. check quota).".into()),
                FailureKind::QuotaExceeded,
            ),
            (
                BrainError::Upload("File size exceeds the limit".into()),
                FailureKind::PayloadTooLarge,
            ),
            (
                BrainError::ProcessingFailed("Unsupported MIME type: image/bmp".into()),
                FailureKind::UnsupportedFormat,
            ),
            (BrainError::EmptyResponse, FailureKind::EmptyResponse),
            (BrainError::Timeout, FailureKind::Unknown),
            (BrainError::Network("connection reset".into()), FailureKind::Unknown),
        ];

        for (error, expected) in cases {
            assert_eq!(FailureKind::classify(&error), expected, "{}", error);
        }
    }

    #[test]
    fn test_messages_are_distinct_per_category() {
        let kinds = [
            FailureKind::RegionUnavailable,
            FailureKind::QuotaExceeded,
            FailureKind::PayloadTooLarge,
            FailureKind::UnsupportedFormat,
            FailureKind::EmptyResponse,
            FailureKind::Unknown,
        ];
        for input in [MessageType::Text, MessageType::Image, MessageType::Voice] {
            let mut seen: Vec<&str> = kinds.iter().map(|k| k.user_message(input)).collect();
            seen.sort();
            seen.dedup();
            assert_eq!(seen.len(), kinds.len());
        }
    }

    #[test]
    fn test_image_specific_wording() {
        assert!(FailureKind::PayloadTooLarge
            .user_message(MessageType::Image)
            .contains("Изображение"));
        assert!(FailureKind::UnsupportedFormat
            .user_message(MessageType::Image)
            .contains("WEBP"));
        assert!(FailureKind::PayloadTooLarge
            .user_message(MessageType::Audio)
            .contains("аудио"));
        assert_eq!(
            failure_reply(&BrainError::Timeout, MessageType::Image),
            FailureKind::Unknown.user_message(MessageType::Image)
        );
    }
}
