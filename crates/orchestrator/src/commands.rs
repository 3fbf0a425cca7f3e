//! Slash command parsing and reply rendering.
//!
//! Commands are answered locally and never reach the brain. Parsing is pure;
//! the orchestrator executes the parsed [`Command`] against the stores and
//! renders the result with the helpers below.

use database::{ContextSettings, ContextSettingsPatch, UserSettings};
use indexmap::IndexMap;

use crate::context_store::{ContextStats, GlobalStats};
use crate::error::ValidationError;
use crate::styles::StyleDescription;

/// Help text shown for `/help`.
pub const HELP_TEXT: &str = "🤖 **Что умеет этот бот:**

📝 **Команды:**
/start - Начать взаимодействие с ботом
/help - Показать список доступных команд
/styles - Список стилей ответов
/style <ключ> - Выбрать стиль ответов
/context - Настройки и статистика контекста
/context on|off - Включить или выключить контекст
/context messages N - Сколько сообщений помнить
/context tokens N - Лимит токенов контекста
/context cleanup on|off - Автоочистка старых сообщений
/clear - Очистить историю диалога

💬 **Обработка сообщений:**
• **Текстовые сообщения** - отвечаю с помощью ИИ
• **Изображения** - анализирую и описываю содержимое
• **Голосовые сообщения** - транскрибирую и отвечаю
• **Аудиофайлы** - анализирую содержание (речь, музыка, подкасты)

🖼️ **Особенности изображений:**
• Описание содержимого и объектов
• Анализ текста на изображениях
• Ответы на вопросы об изображении
• Поддерживаю форматы: JPG, PNG, WEBP, HEIC, HEIF

🎵 **Особенности аудио:**
• Короткие голосовые - естественный разговор
• Длинные голосовые - структурированный анализ
• Аудиофайлы - определяю тип и описываю содержание
• Поддерживаю форматы: MP3, WAV, M4A, AAC, OGG, FLAC

Просто отправьте сообщение и я обработаю его! 🚀";

pub const UNKNOWN_COMMAND_TEXT: &str =
    "Я не понимаю эту команду. Используйте /help для получения списка доступных команд.";

pub const ADMIN_ONLY_TEXT: &str = "⛔ Эта команда доступна только администраторам.";

/// A parsed slash command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    Styles,
    /// `/style` alone shows the current style.
    Style(Option<String>),
    Context(ContextCommand),
    Clear,
    Stats,
    Unknown(String),
}

/// Sub-commands of `/context`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextCommand {
    Show,
    Enable(bool),
    MaxMessages(usize),
    MaxTokens(usize),
    AutoCleanup(bool),
}

impl ContextCommand {
    /// The settings change this sub-command asks for, if any.
    pub fn patch(&self) -> Option<ContextSettingsPatch> {
        let mut patch = ContextSettingsPatch::default();
        match *self {
            Self::Show => return None,
            Self::Enable(on) => patch.enabled = Some(on),
            Self::MaxMessages(n) => patch.max_messages = Some(n),
            Self::MaxTokens(n) => patch.max_tokens = Some(n),
            Self::AutoCleanup(on) => patch.auto_cleanup = Some(on),
        }
        Some(patch)
    }
}

impl Command {
    /// Parse `text` as a command.
    ///
    /// Returns `None` when the text is not a command at all, and an error
    /// when it is a known command with bad arguments.
    pub fn parse(text: &str) -> Option<Result<Self, ValidationError>> {
        let text = text.trim();
        let rest = text.strip_prefix('/')?;

        let mut parts = rest.split_whitespace();
        let head = parts.next()?;
        // Group chats address commands as /cmd@bot_name
        let name = head.split('@').next().unwrap_or(head).to_lowercase();
        let args: Vec<&str> = parts.collect();

        let command = match name.as_str() {
            "start" => Ok(Self::Start),
            "help" => Ok(Self::Help),
            "styles" => Ok(Self::Styles),
            "style" => Ok(Self::Style(args.first().map(|key| key.to_lowercase()))),
            "context" => parse_context(&args).map(Self::Context),
            "clear" => Ok(Self::Clear),
            "stats" => Ok(Self::Stats),
            _ => Ok(Self::Unknown(name)),
        };
        Some(command)
    }
}

fn parse_context(args: &[&str]) -> Result<ContextCommand, ValidationError> {
    let lowered: Vec<String> = args.iter().map(|a| a.to_lowercase()).collect();
    let args: Vec<&str> = lowered.iter().map(String::as_str).collect();

    match args.as_slice() {
        [] | ["show"] | ["status"] => Ok(ContextCommand::Show),
        ["on"] => Ok(ContextCommand::Enable(true)),
        ["off"] => Ok(ContextCommand::Enable(false)),
        ["messages", value] => parse_positive("max_messages", value).map(ContextCommand::MaxMessages),
        ["tokens", value] => parse_positive("max_tokens", value).map(ContextCommand::MaxTokens),
        ["cleanup", "on"] => Ok(ContextCommand::AutoCleanup(true)),
        ["cleanup", "off"] => Ok(ContextCommand::AutoCleanup(false)),
        _ => Err(ValidationError::InvalidArgument {
            command: "/context",
            reason: format!("unexpected arguments: {}", args.join(" ")),
        }),
    }
}

fn parse_positive(field: &'static str, value: &str) -> Result<usize, ValidationError> {
    match value.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ValidationError::NotPositive {
            field,
            value: value.to_string(),
        }),
    }
}

pub fn welcome_text(name: Option<&str>) -> String {
    format!(
        "Привет, {}! 👋

Добро пожаловать в наш Telegram бот с интеграцией Gemini API.

Просто напишите любой текст, отправьте изображение или аудио, и я отвечу вам с помощью искусственного интеллекта.

Используйте команду /help, чтобы узнать больше о функциях бота.",
        name.unwrap_or("пользователь")
    )
}

/// Style menu with the current style marked.
pub fn render_styles(styles: &[StyleDescription], current: &str) -> String {
    let mut out = String::from("🎨 **Доступные стили ответов:**\n\n");
    for style in styles {
        let marker = if style.key == current { " ✅" } else { "" };
        out.push_str(&format!(
            "{} **{}**{} - /style {}\n{}\n\n",
            style.emoji, style.name, marker, style.key, style.description
        ));
    }
    out.push_str("Выберите стиль командой /style <ключ>");
    out
}

pub fn render_current_style(style: Option<&StyleDescription>, key: &str) -> String {
    match style {
        Some(style) => format!(
            "Текущий стиль: {}\n{}\n\nИспользуйте /styles, чтобы выбрать другой.",
            style.label(),
            style.description
        ),
        None => format!(
            "Текущий стиль: {}\n\nИспользуйте /styles, чтобы выбрать другой.",
            key
        ),
    }
}

pub fn render_style_changed(style: &StyleDescription) -> String {
    format!(
        "✅ Стиль ответов изменен на: {}\n\n{}",
        style.label(),
        style.description
    )
}

fn on_off(flag: bool) -> &'static str {
    if flag {
        "включен"
    } else {
        "выключен"
    }
}

fn render_settings(settings: &ContextSettings) -> String {
    format!(
        "• Контекст: {}\n• Максимум сообщений: {}\n• Максимум токенов: {}\n• Автоочистка: {}",
        on_off(settings.enabled),
        settings.max_messages,
        settings.max_tokens,
        if settings.auto_cleanup { "включена" } else { "выключена" }
    )
}

/// `/context` reply: current settings plus stats over the stored history.
pub fn render_context_status(settings: &ContextSettings, stats: &ContextStats) -> String {
    let mut out = format!(
        "🧠 **Настройки контекста:**\n{}\n\n📊 **История:**\n• Сообщений: {}\n• Примерно токенов: {}",
        render_settings(settings),
        stats.message_count,
        stats.estimated_tokens
    );
    if let (Some(oldest), Some(newest)) = (stats.oldest_message, stats.newest_message) {
        out.push_str(&format!(
            "\n• Первое сообщение: {}\n• Последнее сообщение: {}",
            oldest.format("%d.%m.%Y %H:%M"),
            newest.format("%d.%m.%Y %H:%M")
        ));
    }
    out
}

pub fn render_context_updated(settings: &UserSettings) -> String {
    format!(
        "✅ Настройки контекста обновлены:\n{}",
        render_settings(&settings.context_settings)
    )
}

pub fn render_cleared(removed: usize) -> String {
    if removed == 0 {
        "🧹 История диалога уже пуста.".to_string()
    } else {
        format!("🧹 История диалога очищена. Удалено сообщений: {}", removed)
    }
}

/// `/stats` reply for admins.
pub fn render_admin_stats(
    users: usize,
    style_stats: &IndexMap<String, usize>,
    styles: &[StyleDescription],
    global: &GlobalStats,
) -> String {
    let mut out = format!("📊 **Статистика бота:**\n\n👥 Пользователей: {}\n\n🎨 **Стили:**\n", users);
    for (key, count) in style_stats {
        let label = styles
            .iter()
            .find(|style| &style.key == key)
            .map(StyleDescription::label)
            .unwrap_or_else(|| key.clone());
        out.push_str(&format!("• {}: {}\n", label, count));
    }
    out.push_str(&format!(
        "\n🧠 **Контекст:**\n• Пользователей с историей: {}\n• Всего сообщений: {}\n• В среднем на пользователя: {:.2}",
        global.total_users, global.total_messages, global.average_messages_per_user
    ));
    out
}
