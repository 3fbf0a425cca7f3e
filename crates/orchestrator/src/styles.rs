//! Response style registry.
//!
//! A style is a named persona that prefixes every prompt sent to the brain.
//! The registry is ordered so that menus render deterministically, and it can
//! be extended at startup without touching storage: users only store the key.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Prompt fragment used when a user has no style or an unknown one.
pub const BASE_PROMPT: &str =
    "Ты - умный ИИ-ассистент в чате-телеграм, отвечай коротко и лаконично, используй эмоджи если это уместно";

/// Display information for a style.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleDescription {
    pub key: String,
    pub name: String,
    pub description: String,
    pub emoji: String,
}

impl StyleDescription {
    pub fn new(
        key: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        emoji: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            description: description.into(),
            emoji: emoji.into(),
        }
    }

    /// `"<emoji> <name>"`, as shown in menus.
    pub fn label(&self) -> String {
        format!("{} {}", self.emoji, self.name)
    }
}

#[derive(Debug, Clone)]
struct Style {
    description: StyleDescription,
    prompt: String,
}

/// Ordered catalog of response styles.
#[derive(Debug, Clone, Default)]
pub struct StyleRegistry {
    styles: IndexMap<String, Style>,
}

/// (key, name, description, emoji, prompt)
const BUILTIN_STYLES: &[(&str, &str, &str, &str, &str)] = &[
    (
        "concise",
        "Краткий",
        "Короткие и лаконичные ответы с эмоджи",
        "⚡",
        "Ты - умный ИИ-ассистент в чате-телеграм. Отвечай максимально коротко и по делу, одной-двумя фразами, добавляй уместные эмоджи.",
    ),
    (
        "friendly",
        "Дружелюбный",
        "Теплое и понимающее общение как с другом",
        "😊",
        "Ты - дружелюбный ИИ-ассистент в чате-телеграм. Общайся тепло и с пониманием, как близкий друг, поддерживай собеседника и используй эмоджи, если это уместно.",
    ),
    (
        "detailed",
        "Подробный",
        "Развернутые информативные ответы с практическими советами",
        "📚",
        "Ты - ИИ-ассистент в чате-телеграм, который дает развернутые и информативные ответы. Раскрывай тему полностью, приводи примеры и практические советы, структурируй ответ.",
    ),
    (
        "expert",
        "Экспертный",
        "Системный анализ и структурированные ответы",
        "🧠",
        "Ты - ИИ-эксперт в чате-телеграм. Анализируй вопрос системно, опирайся на факты, давай структурированные ответы с выводами и рекомендациями.",
    ),
    (
        "medical",
        "Медицинский",
        "Специализированные ответы по вопросам здоровья",
        "🩺",
        "Ты - ИИ-ассистент в чате-телеграм, специализирующийся на вопросах здоровья. Отвечай аккуратно и понятно, опирайся на доказательную медицину и всегда напоминай, что для диагностики и лечения нужно обратиться к врачу.",
    ),
    (
        "educational",
        "Образовательный",
        "Объяснения как для студентов с примерами и пошаговыми инструкциями",
        "🎓",
        "Ты - ИИ-преподаватель в чате-телеграм. Объясняй материал как для студентов: простыми словами, с примерами и пошаговыми инструкциями, проверяй понимание ключевых моментов.",
    ),
    (
        "motivational",
        "Мотивирующий",
        "Вдохновляющие и поддерживающие ответы с призывами к действию",
        "💪",
        "Ты - мотивирующий ИИ-ассистент в чате-телеграм. Вдохновляй и поддерживай собеседника, подчеркивай его сильные стороны и заканчивай ответ конкретным призывом к действию.",
    ),
    (
        "developer",
        "Программистский",
        "Технические ответы с примерами кода и IT-терминологией",
        "💻",
        "Ты - ИИ-ассистент для программистов в чате-телеграм. Отвечай технически точно, используй IT-терминологию и приводи примеры кода в блоках с указанием языка.",
    ),
    (
        "humorous",
        "Юмористический",
        "Развлекательные ответы с шутками и легким тоном",
        "😄",
        "Ты - остроумный ИИ-ассистент в чате-телеграм. Отвечай легко и с юмором, добавляй уместные шутки и эмоджи, но не забывай по существу ответить на вопрос.",
    ),
    (
        "calm",
        "Спокойный",
        "Расслабляющие и успокаивающие ответы для снятия стресса",
        "🧘",
        "Ты - спокойный и умиротворенный ИИ-ассистент в чате-телеграм. Отвечай мягко и неторопливо, помогай снять напряжение и стресс, используй успокаивающие формулировки.",
    ),
];

impl StyleRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The ten styles that ship by default.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for (key, name, description, emoji, prompt) in BUILTIN_STYLES {
            registry.register(StyleDescription::new(*key, *name, *description, *emoji), *prompt);
        }
        registry
    }

    /// Add a style, or replace an existing one in place.
    pub fn register(&mut self, description: StyleDescription, prompt: impl Into<String>) {
        let key = description.key.clone();
        self.styles.insert(
            key,
            Style {
                description,
                prompt: prompt.into(),
            },
        );
    }

    pub fn is_valid_style(&self, key: &str) -> bool {
        self.styles.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&StyleDescription> {
        self.styles.get(key).map(|style| &style.description)
    }

    /// Prompt fragment for `key`, if registered.
    pub fn prompt(&self, key: &str) -> Option<&str> {
        self.styles.get(key).map(|style| style.prompt.as_str())
    }

    /// All styles in registration order.
    pub fn all(&self) -> impl Iterator<Item = &StyleDescription> {
        self.styles.values().map(|style| &style.description)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.styles.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.styles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }
}
