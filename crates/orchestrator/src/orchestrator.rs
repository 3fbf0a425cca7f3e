//! Main orchestrator that coordinates message processing.

use std::sync::Arc;

use brain_core::{Brain, InboundContent, InboundMessage, MediaRef, OutboundMessage};
use database::{ContextBackend, ContextSettings, MessageType, SettingsBackend, UserSettings};
use tracing::{debug, error, info, warn};

use crate::commands::{self, Command, ContextCommand, ADMIN_ONLY_TEXT, HELP_TEXT, UNKNOWN_COMMAND_TEXT};
use crate::config::OrchestratorConfig;
use crate::context_store::ContextStore;
use crate::error::{OrchestratorError, ValidationError};
use crate::failure::failure_reply;
use crate::locks::KeyedLocks;
use crate::media::{
    chat_action, decorate_reply, describe_user_turn, message_type_of, resolve_mime_type,
};
use crate::prompt::{media_instruction, PromptComposer};
use crate::sender::MessageSender;
use crate::settings::UserSettingsStore;
use crate::styles::StyleRegistry;

/// Main orchestrator that coordinates message processing.
///
/// The orchestrator:
/// - Answers slash commands locally from the settings and context stores
/// - Composes style, context window and request into a prompt for the brain
/// - Uploads media and asks for a media-grounded reply
/// - Records both turns in the user's history and runs auto-cleanup
/// - Maps backend failures to user-facing replies
///
/// Turns for the same user are handled one at a time; other users proceed
/// concurrently while a brain call is in flight.
pub struct Orchestrator<S: MessageSender> {
    brain: Arc<dyn Brain>,
    sender: S,
    settings: UserSettingsStore,
    contexts: ContextStore,
    composer: PromptComposer,
    config: OrchestratorConfig,
    turn_locks: KeyedLocks,
}

impl<S: MessageSender> Orchestrator<S> {
    /// Create an orchestrator over a single backend that stores both
    /// settings and context, with the built-in styles.
    pub fn new<B>(
        brain: Arc<dyn Brain>,
        sender: S,
        backend: Arc<B>,
        config: OrchestratorConfig,
    ) -> Self
    where
        B: SettingsBackend + ContextBackend + 'static,
    {
        Self::with_backends(
            brain,
            sender,
            backend.clone(),
            backend,
            StyleRegistry::builtin(),
            config,
        )
    }

    /// Create an orchestrator with separate backends and a custom registry.
    pub fn with_backends(
        brain: Arc<dyn Brain>,
        sender: S,
        settings_backend: Arc<dyn SettingsBackend>,
        context_backend: Arc<dyn ContextBackend>,
        registry: StyleRegistry,
        config: OrchestratorConfig,
    ) -> Self {
        let registry = Arc::new(registry);
        let settings = UserSettingsStore::new(settings_backend, registry.clone())
            .with_default_style(&config.default_style);

        info!(
            "Orchestrator ready (brain: {}, styles: {}, default style: {}, admins: {})",
            brain.name(),
            registry.len(),
            settings.default_style(),
            config.admin_ids.len()
        );

        Self {
            brain,
            sender,
            settings,
            contexts: ContextStore::new(context_backend),
            composer: PromptComposer::new(registry),
            config,
            turn_locks: KeyedLocks::new(),
        }
    }

    pub fn brain(&self) -> &dyn Brain {
        self.brain.as_ref()
    }

    pub fn sender(&self) -> &S {
        &self.sender
    }

    pub fn settings(&self) -> &UserSettingsStore {
        &self.settings
    }

    pub fn contexts(&self) -> &ContextStore {
        &self.contexts
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Process an incoming message and send the reply.
    ///
    /// Shows the chat action for the message kind first. Blank text is
    /// skipped without any output.
    pub async fn handle(&self, message: InboundMessage) -> Result<(), OrchestratorError> {
        if is_blank(&message) {
            debug!("Skipping blank message from user {}", message.user_id);
            return Err(OrchestratorError::Skipped("blank message".to_string()));
        }

        let action = chat_action(message_type_of(&message.content));
        if let Err(e) = self.sender.send_chat_action(message.chat_id, action).await {
            warn!("Failed to send chat action: {}", e);
        }

        let response = self.process(message).await?;
        self.sender
            .send_message(response.chat_id, &response.text)
            .await
    }

    /// Process an incoming message end-to-end.
    ///
    /// Every non-blank message gets a reply, including when storage or the
    /// brain fails.
    pub async fn process(
        &self,
        message: InboundMessage,
    ) -> Result<OutboundMessage, OrchestratorError> {
        if is_blank(&message) {
            return Err(OrchestratorError::Skipped("blank message".to_string()));
        }

        let _turn = self.turn_locks.lock(message.user_id).await;
        info!(
            "Processing {} message from user {} in chat {}",
            message_type_of(&message.content),
            message.user_id,
            message.chat_id
        );

        let text = match &message.content {
            InboundContent::Text(text) => match Command::parse(text) {
                Some(command) => self.execute_command(&message, command).await,
                None => self.respond_to_text(&message, text).await,
            },
            InboundContent::Image(media) => {
                self.respond_to_media(&message, media, MessageType::Image).await
            }
            InboundContent::Voice(media) => {
                self.respond_to_media(&message, media, MessageType::Voice).await
            }
            InboundContent::Audio(media) => {
                self.respond_to_media(&message, media, MessageType::Audio).await
            }
        };

        Ok(OutboundMessage::reply_to(&message, text))
    }

    /// Settings for the sender of `message`, or unsaved defaults when the
    /// store cannot provide them.
    async fn load_settings(&self, message: &InboundMessage) -> UserSettings {
        let username = message.username.as_deref();
        match self.settings.get_user_settings(message.user_id, username).await {
            Ok(settings) => settings,
            Err(e) => {
                error!(
                    "Failed to create settings for user {}, using defaults: {}",
                    message.user_id, e
                );
                self.settings.defaults_for(message.user_id, username)
            }
        }
    }

    async fn respond_to_text(&self, message: &InboundMessage, text: &str) -> String {
        let settings = self.load_settings(message).await;
        let context_settings = settings.context_settings;

        let context = self
            .contexts
            .format_context_for_prompt(message.user_id, &context_settings)
            .await;
        let prompt = self
            .composer
            .compose(text, Some(&settings.response_style), &context);
        debug!(
            "Prompt for user {}: {} chars (style: {})",
            message.user_id,
            prompt.len(),
            settings.response_style
        );

        match self.brain.generate_text(&prompt).await {
            Ok(reply) => {
                info!("Generated reply for user {}: {} chars", message.user_id, reply.len());
                self.record_turn(message.user_id, text, MessageType::Text, &reply, &context_settings)
                    .await;
                reply
            }
            Err(e) => {
                warn!("Text generation failed for user {}: {}", message.user_id, e);
                failure_reply(&e, MessageType::Text).to_string()
            }
        }
    }

    async fn respond_to_media(
        &self,
        message: &InboundMessage,
        media: &MediaRef,
        kind: MessageType,
    ) -> String {
        let reply = self.generate_for_media(message, media, kind).await;

        if media.temporary {
            match tokio::fs::remove_file(media.path()).await {
                Ok(()) => debug!("Removed temporary file {}", media.path().display()),
                Err(e) => warn!(
                    "Failed to remove temporary file {}: {}",
                    media.path().display(),
                    e
                ),
            }
        }

        reply
    }

    async fn generate_for_media(
        &self,
        message: &InboundMessage,
        media: &MediaRef,
        kind: MessageType,
    ) -> String {
        let settings = self.load_settings(message).await;
        let context_settings = settings.context_settings;
        let mime_type = resolve_mime_type(media, kind);

        info!(
            "Uploading {} for user {} ({}, duration: {:?})",
            kind, message.user_id, mime_type, media.duration_secs
        );
        let uploaded = match self.brain.upload_media(media.path(), &mime_type).await {
            Ok(uploaded) => uploaded,
            Err(e) => {
                warn!("Upload failed for user {}: {}", message.user_id, e);
                return failure_reply(&e, kind).to_string();
            }
        };

        let context = self
            .contexts
            .format_context_for_prompt(message.user_id, &context_settings)
            .await;
        let prompt = self.composer.compose_media(
            media_instruction(kind, media.duration_secs),
            Some(&settings.response_style),
            &context,
            media.caption.as_deref(),
        );

        match self.brain.generate_from_media(&uploaded, &prompt).await {
            Ok(reply) => {
                info!(
                    "Generated {} reply for user {}: {} chars",
                    kind,
                    message.user_id,
                    reply.len()
                );
                let user_turn = describe_user_turn(media, kind);
                self.record_turn(message.user_id, &user_turn, kind, &reply, &context_settings)
                    .await;
                decorate_reply(kind, media.duration_secs, &reply)
            }
            Err(e) => {
                warn!("{} generation failed for user {}: {}", kind, message.user_id, e);
                failure_reply(&e, kind).to_string()
            }
        }
    }

    /// Write the user turn, then the assistant turn, then auto-cleanup.
    ///
    /// Nothing is written while context is disabled. A failed write is logged
    /// and stops the remaining writes; the reply is still delivered.
    async fn record_turn(
        &self,
        user_id: i64,
        user_text: &str,
        kind: MessageType,
        reply: &str,
        settings: &ContextSettings,
    ) {
        if !settings.enabled {
            return;
        }

        if let Err(e) = self.contexts.add_user_message(user_id, user_text, kind).await {
            error!("Failed to record user turn for user {}: {}", user_id, e);
            return;
        }
        if let Err(e) = self.contexts.add_assistant_message(user_id, reply).await {
            error!("Failed to record assistant turn for user {}: {}", user_id, e);
            return;
        }
        if let Err(e) = self.contexts.auto_cleanup_context(user_id, settings).await {
            error!("Auto-cleanup failed for user {}: {}", user_id, e);
        }
    }

    async fn execute_command(
        &self,
        message: &InboundMessage,
        parsed: Result<Command, ValidationError>,
    ) -> String {
        let command = match parsed {
            Ok(command) => command,
            Err(e) => {
                debug!("Rejected command from user {}: {}", message.user_id, e);
                return e.user_message();
            }
        };

        let user_id = message.user_id;
        let username = message.username.as_deref();
        info!("Command {:?} from user {}", command, user_id);

        match command {
            Command::Start => {
                self.load_settings(message).await;
                commands::welcome_text(username)
            }
            Command::Help => HELP_TEXT.to_string(),
            Command::Styles => {
                let settings = self.load_settings(message).await;
                commands::render_styles(&self.settings.get_all_styles(), &settings.response_style)
            }
            Command::Style(None) => {
                let settings = self.load_settings(message).await;
                let current = self.settings.get_style_description(&settings.response_style);
                commands::render_current_style(current.as_ref(), &settings.response_style)
            }
            Command::Style(Some(key)) => self.change_style(user_id, key, username).await,
            Command::Context(ContextCommand::Show) => {
                let settings = self.load_settings(message).await;
                let stats = self.contexts.get_user_context_stats(user_id).await;
                commands::render_context_status(&settings.context_settings, &stats)
            }
            Command::Context(change) => {
                let Some(patch) = change.patch() else {
                    return HELP_TEXT.to_string();
                };
                match self
                    .settings
                    .update_user_context_settings(user_id, patch, username)
                    .await
                {
                    Ok(updated) => commands::render_context_updated(&updated),
                    Err(e) => {
                        error!("Failed to update context settings for user {}: {}", user_id, e);
                        e.user_message()
                    }
                }
            }
            Command::Clear => match self.contexts.clear_user_context(user_id).await {
                Ok(removed) => {
                    info!("User {} cleared {} context messages", user_id, removed);
                    commands::render_cleared(removed)
                }
                Err(e) => {
                    error!("Failed to clear context for user {}: {}", user_id, e);
                    OrchestratorError::from(e).user_message()
                }
            },
            Command::Stats => {
                if !self.config.is_admin(user_id) {
                    warn!("User {} asked for stats without admin rights", user_id);
                    return ADMIN_ONLY_TEXT.to_string();
                }
                let users = self.settings.get_users_count().await;
                let style_stats = self.settings.get_style_stats().await;
                let global = self.contexts.get_global_stats().await;
                commands::render_admin_stats(users, &style_stats, &self.settings.get_all_styles(), &global)
            }
            Command::Unknown(name) => {
                warn!("Unknown command /{} from user {}", name, user_id);
                UNKNOWN_COMMAND_TEXT.to_string()
            }
        }
    }

    async fn change_style(&self, user_id: i64, key: String, username: Option<&str>) -> String {
        let Some(style) = self.settings.get_style_description(&key) else {
            return ValidationError::UnknownStyle(key).user_message();
        };

        match self.settings.update_user_style(user_id, &key, username).await {
            Ok(_) => commands::render_style_changed(&style),
            Err(e) => {
                error!("Failed to update style for user {}: {}", user_id, e);
                e.user_message()
            }
        }
    }
}

fn is_blank(message: &InboundMessage) -> bool {
    matches!(&message.content, InboundContent::Text(text) if text.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sender::NoOpSender;
    use database::MemoryBackend;
    use mock_brain::{EchoBrain, FailingBrain};

    fn orchestrator(brain: Arc<dyn Brain>) -> Orchestrator<NoOpSender> {
        Orchestrator::new(
            brain,
            NoOpSender,
            Arc::new(MemoryBackend::new()),
            OrchestratorConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_blank_text_is_skipped() {
        let orchestrator = orchestrator(Arc::new(EchoBrain::new()));
        let result = orchestrator.process(InboundMessage::text(1, "   ", 0)).await;
        assert!(matches!(result, Err(OrchestratorError::Skipped(_))));
    }

    #[tokio::test]
    async fn test_text_turn_is_recorded() {
        let orchestrator = orchestrator(Arc::new(EchoBrain::with_prefix("> ")));
        let reply = orchestrator
            .process(InboundMessage::text(1, "Привет", 0))
            .await
            .unwrap();

        assert_eq!(reply.chat_id, 1);
        assert!(reply.text.ends_with("Запрос пользователя: Привет"));

        let stats = orchestrator.contexts().get_user_context_stats(1).await;
        assert_eq!(stats.message_count, 2);
    }

    #[tokio::test]
    async fn test_failure_is_not_recorded() {
        let orchestrator = orchestrator(Arc::new(FailingBrain::new("quota exceeded")));
        let reply = orchestrator
            .process(InboundMessage::text(1, "Привет", 0))
            .await
            .unwrap();

        assert_eq!(reply.text, "⚠️ Превышена квота API. Попробуйте позже.");
        assert_eq!(orchestrator.contexts().get_user_context_stats(1).await.message_count, 0);
    }

    #[tokio::test]
    async fn test_commands_skip_the_brain() {
        let brain = Arc::new(EchoBrain::new());
        let orchestrator = orchestrator(brain.clone());

        let reply = orchestrator
            .process(InboundMessage::text(1, "/help", 0))
            .await
            .unwrap();
        assert_eq!(reply.text, HELP_TEXT);
        assert!(brain.prompts().await.is_empty());
    }
}
