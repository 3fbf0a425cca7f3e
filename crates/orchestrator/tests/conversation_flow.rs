//! Integration tests for the conversation flow.
//!
//! The orchestrator is wired to the in-memory backend and mock brains, so
//! these run without a database file or network access:
//!   cargo test -p orchestrator --test conversation_flow

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use database::{
    ContextBackend, ContextMessage, DatabaseError, MemoryBackend, SettingsBackend, UserSettings,
};
use mock_brain::{DelayedBrain, EchoBrain, FailAt, FailingBrain};
use orchestrator::{
    ContextSettings, InboundContent, InboundMessage, MediaRef, MessageSender, MessageType,
    NoOpSender, Orchestrator, OrchestratorConfig, OrchestratorError, Role, StyleRegistry,
    HELP_TEXT,
};
use tokio::sync::Mutex;

fn build(brain: Arc<dyn mock_brain::Brain>) -> Orchestrator<NoOpSender> {
    Orchestrator::new(
        brain,
        NoOpSender,
        Arc::new(MemoryBackend::new()),
        OrchestratorConfig::default(),
    )
}

async fn say(orchestrator: &Orchestrator<impl MessageSender>, user_id: i64, text: &str) -> String {
    orchestrator
        .process(InboundMessage::text(user_id, text, 0))
        .await
        .expect("every non-blank message gets a reply")
        .text
}

async fn history(orchestrator: &Orchestrator<impl MessageSender>, user_id: i64) -> Vec<ContextMessage> {
    let wide = ContextSettings {
        max_messages: 1000,
        max_tokens: 1_000_000,
        ..ContextSettings::default()
    };
    orchestrator.contexts().get_user_context(user_id, &wide).await
}

/// A file under the temp dir that the test owns.
fn temp_media(name: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("orchestrator-{}-{}", std::process::id(), name));
    std::fs::write(&path, b"not really media").unwrap();
    path
}

// ============================================================================
// Text turns
// ============================================================================

mod text_tests {
    use super::*;

    #[tokio::test]
    async fn test_context_reaches_the_next_prompt() {
        let brain = Arc::new(EchoBrain::new());
        let orchestrator = build(brain.clone());

        say(&orchestrator, 1, "Как дела?").await;
        say(&orchestrator, 1, "А погода?").await;

        let prompts = brain.prompts().await;
        assert_eq!(prompts.len(), 2);
        assert!(!prompts[0].contains("Контекст предыдущих сообщений"));
        assert!(prompts[1].contains("Контекст предыдущих сообщений:\nПользователь: Как дела?\nАссистент: "));
        assert!(prompts[1].ends_with("Запрос пользователя: А погода?"));

        let turns = history(&orchestrator, 1).await;
        let roles: Vec<Role> = turns.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant, Role::User, Role::Assistant]);
    }

    #[tokio::test]
    async fn test_users_do_not_share_context() {
        let brain = Arc::new(EchoBrain::new());
        let orchestrator = build(brain.clone());

        say(&orchestrator, 1, "секрет первого").await;
        say(&orchestrator, 2, "привет").await;

        let prompts = brain.prompts().await;
        assert!(!prompts[1].contains("секрет первого"));
        assert_eq!(history(&orchestrator, 2).await.len(), 2);
    }

    #[tokio::test]
    async fn test_disabled_context_is_neither_read_nor_written() {
        let brain = Arc::new(EchoBrain::new());
        let orchestrator = build(brain.clone());

        say(&orchestrator, 1, "до выключения").await;
        let reply = say(&orchestrator, 1, "/context off").await;
        assert!(reply.contains("Контекст: выключен"));

        say(&orchestrator, 1, "после выключения").await;

        let prompts = brain.prompts().await;
        assert!(!prompts[1].contains("до выключения"));
        assert_eq!(history(&orchestrator, 1).await.len(), 2);
    }

    #[tokio::test]
    async fn test_auto_cleanup_keeps_history_bounded() {
        let orchestrator = build(Arc::new(EchoBrain::with_prefix("ok ")));
        say(&orchestrator, 1, "/context messages 3").await;

        for i in 0..5 {
            say(&orchestrator, 1, &format!("сообщение {}", i)).await;
            let stats = orchestrator.contexts().get_user_context_stats(1).await;
            assert!(stats.message_count <= 3, "{} turns stored", stats.message_count);
        }

        let turns = history(&orchestrator, 1).await;
        assert_eq!(turns.last().map(|m| m.role), Some(Role::Assistant));
        assert!(turns.iter().any(|m| m.content == "сообщение 4"));
    }

    #[tokio::test]
    async fn test_style_shapes_the_prompt() {
        let brain = Arc::new(EchoBrain::new());
        let orchestrator = build(brain.clone());

        let reply = say(&orchestrator, 1, "/style expert").await;
        assert!(reply.contains("🧠 Экспертный"));

        say(&orchestrator, 1, "Что такое Rust?").await;

        let expert = StyleRegistry::builtin().prompt("expert").unwrap().to_string();
        let prompts = brain.prompts().await;
        assert!(prompts[0].starts_with(&expert));
    }
}

// ============================================================================
// Commands
// ============================================================================

mod command_tests {
    use super::*;

    #[tokio::test]
    async fn test_start_creates_settings_and_greets() {
        let orchestrator = build(Arc::new(EchoBrain::new()));
        let reply = orchestrator
            .process(InboundMessage::text(7, "/start", 0).with_username("masha"))
            .await
            .unwrap();

        assert!(reply.text.starts_with("Привет, masha! 👋"));
        let settings = orchestrator.settings().get_user_settings(7, None).await.unwrap();
        assert_eq!(settings.username.as_deref(), Some("masha"));
        assert_eq!(settings.response_style, "friendly");
    }

    #[tokio::test]
    async fn test_unknown_style_is_rejected_without_write() {
        let orchestrator = build(Arc::new(EchoBrain::new()));

        let reply = say(&orchestrator, 1, "/style pirate").await;
        assert!(reply.contains("Неизвестный стиль: pirate"));
        assert_eq!(orchestrator.settings().get_users_count().await, 0);
    }

    #[tokio::test]
    async fn test_context_limits_must_be_positive() {
        let orchestrator = build(Arc::new(EchoBrain::new()));

        let reply = say(&orchestrator, 1, "/context tokens 0").await;
        assert!(reply.contains("положительным"));

        let settings = orchestrator.settings().get_user_settings(1, None).await.unwrap();
        assert_eq!(settings.context_settings.max_tokens, 8000);
    }

    #[tokio::test]
    async fn test_context_show_reports_stats() {
        let orchestrator = build(Arc::new(EchoBrain::with_prefix("ok")));
        say(&orchestrator, 1, "один").await;

        let reply = say(&orchestrator, 1, "/context").await;
        assert!(reply.contains("Максимум сообщений: 20"));
        assert!(reply.contains("Сообщений: 2"));
    }

    #[tokio::test]
    async fn test_clear_reports_removed_count() {
        let orchestrator = build(Arc::new(EchoBrain::new()));
        say(&orchestrator, 1, "привет").await;

        assert!(say(&orchestrator, 1, "/clear").await.ends_with("Удалено сообщений: 2"));
        assert!(say(&orchestrator, 1, "/clear").await.contains("уже пуста"));
        assert!(history(&orchestrator, 1).await.is_empty());
    }

    #[tokio::test]
    async fn test_stats_are_admin_only() {
        let orchestrator = Orchestrator::new(
            Arc::new(EchoBrain::new()),
            NoOpSender,
            Arc::new(MemoryBackend::new()),
            OrchestratorConfig::default().with_admin(99),
        );
        say(&orchestrator, 1, "привет").await;

        assert!(say(&orchestrator, 1, "/stats").await.contains("только администраторам"));

        // Asking for stats does not register the admin as a user
        let stats = say(&orchestrator, 99, "/stats").await;
        assert!(stats.contains("👥 Пользователей: 1"));
        assert!(stats.contains("😊 Дружелюбный: 1"));
        assert!(stats.contains("🧘 Спокойный: 0"));
        assert!(stats.contains("Всего сообщений: 2"));
    }

    #[tokio::test]
    async fn test_help_and_unknown_commands() {
        let brain = Arc::new(EchoBrain::new());
        let orchestrator = build(brain.clone());

        assert_eq!(say(&orchestrator, 1, "/help@assistant_bot").await, HELP_TEXT);
        assert!(say(&orchestrator, 1, "/dance").await.contains("/help"));
        assert!(brain.prompts().await.is_empty());
    }

    #[tokio::test]
    async fn test_configured_default_style() {
        let orchestrator = Orchestrator::new(
            Arc::new(EchoBrain::new()),
            NoOpSender,
            Arc::new(MemoryBackend::new()),
            OrchestratorConfig::default().with_default_style("calm"),
        );
        assert!(say(&orchestrator, 3, "/style").await.contains("🧘 Спокойный"));
    }
}

// ============================================================================
// Media turns
// ============================================================================

mod media_tests {
    use super::*;

    #[tokio::test]
    async fn test_image_turn() {
        let brain = Arc::new(EchoBrain::new());
        let orchestrator = build(brain.clone());
        let path = temp_media("photo.png");

        let media = MediaRef::new(&path).with_caption("Что на фото?").temporary();
        let reply = orchestrator
            .process(InboundMessage::new(1, InboundContent::Image(media), 0))
            .await
            .unwrap();

        assert!(reply.text.starts_with("📸 **Анализ изображения**\n\n[image/png] "));
        assert!(!path.exists(), "temporary file should be removed");

        let prompt = &brain.prompts().await[0];
        assert!(prompt.contains("ЗАДАЧА: Проанализируй это изображение."));
        assert!(prompt.ends_with("Подпись пользователя: Что на фото?"));

        let turns = history(&orchestrator, 1).await;
        assert_eq!(turns[0].message_type, MessageType::Image);
        assert_eq!(turns[0].content, "Что на фото?");
    }

    #[tokio::test]
    async fn test_long_voice_turn() {
        let brain = Arc::new(EchoBrain::new());
        let orchestrator = build(brain.clone());
        let path = temp_media("long-voice");

        let media = MediaRef::new(&path).with_duration(95);
        let reply = orchestrator
            .process(InboundMessage::new(1, InboundContent::Voice(media), 0))
            .await
            .unwrap();

        assert!(reply.text.starts_with("🎤 **Голосовое сообщение** (1:35 мин)\n\n[audio/ogg] "));
        assert!(brain.prompts().await[0].contains("Транскрибируй"));
        assert!(path.exists(), "non-temporary files are left alone");
        std::fs::remove_file(&path).ok();

        // A later text turn sees the voice turn tagged in its context
        say(&orchestrator, 1, "спасибо").await;
        assert!(brain.prompts().await[1].contains("Пользователь [voice]: [Голосовое сообщение, 1:35 мин]"));
    }

    #[tokio::test]
    async fn test_audio_file_turn() {
        let brain = Arc::new(EchoBrain::new());
        let orchestrator = build(brain.clone());

        let media = MediaRef::new("/nonexistent/track").with_file_name("lecture.mp3");
        let reply = orchestrator
            .process(InboundMessage::new(1, InboundContent::Audio(media), 0))
            .await
            .unwrap();

        assert!(reply.text.starts_with("[audio/mpeg] "));
        assert!(brain.prompts().await[0].contains("аудиофайл"));
        assert_eq!(history(&orchestrator, 1).await[0].content, "[Аудиофайл: lecture.mp3]");
    }
}

// ============================================================================
// Failures
// ============================================================================

mod failure_tests {
    use super::*;

    async fn image_reply(brain: FailingBrain) -> (String, usize) {
        let orchestrator = build(Arc::new(brain));
        let media = MediaRef::new("/nonexistent/photo.jpg");
        let reply = orchestrator
            .process(InboundMessage::new(1, InboundContent::Image(media), 0))
            .await
            .unwrap();
        let stored = history(&orchestrator, 1).await.len();
        (reply.text, stored)
    }

    #[tokio::test]
    async fn test_region_failure() {
        let orchestrator = build(Arc::new(FailingBrain::new(
            "API error (400): User location is not supported for the API use.",
        )));
        let reply = say(&orchestrator, 1, "привет").await;
        assert!(reply.contains("недоступен в вашем регионе"));
        assert!(history(&orchestrator, 1).await.is_empty());
    }

    #[tokio::test]
    async fn test_empty_response() {
        let orchestrator = build(Arc::new(FailingBrain::empty()));
        assert_eq!(
            say(&orchestrator, 1, "привет").await,
            "Извините, не удалось сгенерировать ответ."
        );
    }

    #[tokio::test]
    async fn test_unknown_text_failure() {
        let orchestrator = build(Arc::new(FailingBrain::new("socket closed")));
        assert!(say(&orchestrator, 1, "привет")
            .await
            .contains("ошибка при обработке вашего запроса"));
    }

    #[tokio::test]
    async fn test_image_upload_too_large() {
        let brain = FailingBrain::new("File size exceeds the allowed limit").at(FailAt::Upload);
        let (reply, stored) = image_reply(brain).await;
        assert!(reply.contains("Изображение слишком большое"));
        assert_eq!(stored, 0);
    }

    #[tokio::test]
    async fn test_image_unsupported_format() {
        let brain = FailingBrain::new("Unsupported MIME type").at(FailAt::Generation);
        let (reply, stored) = image_reply(brain).await;
        assert!(reply.contains("JPG, PNG, WEBP, HEIC или HEIF"));
        assert_eq!(stored, 0);
    }

    /// Storage that fails every call.
    struct BrokenStorage;

    fn broken() -> DatabaseError {
        DatabaseError::Io(std::io::Error::other("storage offline"))
    }

    #[async_trait]
    impl SettingsBackend for BrokenStorage {
        async fn load_settings(&self, _user_id: i64) -> database::Result<Option<UserSettings>> {
            Err(broken())
        }

        async fn insert_settings_if_absent(&self, _defaults: &UserSettings) -> database::Result<UserSettings> {
            Err(broken())
        }

        async fn save_settings(&self, _settings: &UserSettings) -> database::Result<()> {
            Err(broken())
        }

        async fn count_by_style(&self) -> database::Result<Vec<(String, i64)>> {
            Err(broken())
        }

        async fn count_users(&self) -> database::Result<i64> {
            Err(broken())
        }
    }

    #[async_trait]
    impl ContextBackend for BrokenStorage {
        async fn append_message(&self, _message: &ContextMessage) -> database::Result<()> {
            Err(broken())
        }

        async fn append_message_if_absent(&self, _message: &ContextMessage) -> database::Result<bool> {
            Err(broken())
        }

        async fn recent_messages(&self, _user_id: i64, _limit: usize) -> database::Result<Vec<ContextMessage>> {
            Err(broken())
        }

        async fn all_messages(&self, _user_id: i64) -> database::Result<Vec<ContextMessage>> {
            Err(broken())
        }

        async fn delete_messages(&self, _user_id: i64) -> database::Result<u64> {
            Err(broken())
        }

        async fn retain_latest(&self, _user_id: i64, _keep: usize) -> database::Result<u64> {
            Err(broken())
        }

        async fn global_counts(&self) -> database::Result<(i64, i64)> {
            Err(broken())
        }
    }

    #[tokio::test]
    async fn test_storage_outage_still_answers() {
        let orchestrator = Orchestrator::new(
            Arc::new(EchoBrain::with_prefix("ответ: ")),
            NoOpSender,
            Arc::new(BrokenStorage),
            OrchestratorConfig::default(),
        );

        let reply = say(&orchestrator, 1, "привет").await;
        assert!(reply.starts_with("ответ: "));
        assert!(reply.ends_with("Запрос пользователя: привет"));

        assert!(say(&orchestrator, 1, "/style calm").await.contains("Не удалось сохранить"));
        assert!(say(&orchestrator, 1, "/clear").await.contains("Не удалось сохранить"));
    }
}

// ============================================================================
// Transport and concurrency
// ============================================================================

mod transport_tests {
    use super::*;

    #[derive(Default)]
    struct RecordingSender {
        events: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl MessageSender for RecordingSender {
        async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), OrchestratorError> {
            self.events.lock().await.push(format!("message {}: {}", chat_id, text));
            Ok(())
        }

        async fn send_chat_action(&self, chat_id: i64, action: &str) -> Result<(), OrchestratorError> {
            self.events.lock().await.push(format!("action {}: {}", chat_id, action));
            Ok(())
        }
    }

    fn recording() -> Orchestrator<RecordingSender> {
        Orchestrator::new(
            Arc::new(EchoBrain::with_prefix("эхо")),
            RecordingSender::default(),
            Arc::new(MemoryBackend::new()),
            OrchestratorConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_handle_sends_action_then_reply() {
        let orchestrator = recording();
        let message = InboundMessage::text(5, "/help", 0).in_chat(-100);
        orchestrator.handle(message).await.unwrap();

        let events = orchestrator.sender().events.lock().await.clone();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], "action -100: typing");
        assert!(events[1].starts_with("message -100: 🤖"));
    }

    #[tokio::test]
    async fn test_handle_skips_blank_messages() {
        let orchestrator = recording();
        let result = orchestrator.handle(InboundMessage::text(5, " \n ", 0)).await;

        assert!(matches!(result, Err(OrchestratorError::Skipped(_))));
        assert!(orchestrator.sender().events.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_same_user_turns_do_not_interleave() {
        let brain = Arc::new(DelayedBrain::with_millis(EchoBrain::new(), 30));
        let orchestrator = build(brain);

        let questions: Vec<String> = (0..4).map(|i| format!("вопрос {}", i)).collect();
        futures::future::join_all(questions.iter().map(|q| say(&orchestrator, 1, q))).await;

        let turns = history(&orchestrator, 1).await;
        assert_eq!(turns.len(), 8);
        for pair in turns.chunks(2) {
            assert_eq!(pair[0].role, Role::User);
            assert_eq!(pair[1].role, Role::Assistant);
            assert!(pair[1].content.ends_with(&pair[0].content));
        }
    }

    #[tokio::test]
    async fn test_concurrent_first_contact_creates_one_record() {
        let orchestrator = build(Arc::new(EchoBrain::new()));

        futures::future::join_all((0..6).map(|_| say(&orchestrator, 9, "/style"))).await;
        assert_eq!(orchestrator.settings().get_users_count().await, 1);
    }
}
