//! Prompt composition.
//!
//! A prompt is always `style fragment + context block + request`, in that
//! order. No truncation happens here; the context block arrives already
//! budgeted.

use std::sync::Arc;

use database::MessageType;

use crate::styles::{StyleRegistry, BASE_PROMPT};

/// Marker placed before the user's own words.
pub const REQUEST_MARKER: &str = "\n\nЗапрос пользователя: ";

/// Marker placed before a media caption.
pub const CAPTION_MARKER: &str = "\n\nПодпись пользователя: ";

/// Voice messages longer than this get the transcription-style instruction.
pub const LONG_VOICE_SECS: u32 = 60;

const LONG_VOICE_INSTRUCTION: &str = "ЗАДАЧА: Транскрибируй и проанализируй это голосовое сообщение.

ИНСТРУКЦИИ:
1. Сначала предоставь полную транскрипцию сообщения
2. Затем выдели основные моменты и ключевые идеи
3. Если есть вопросы - ответь на них
4. Если есть просьбы - выполни их
5. Отвечай на том же языке, что и в сообщении

ФОРМАТ ОТВЕТА:
📝 **Транскрипция:** [полный текст]

💡 **Основные моменты:** [краткое резюме]

❓ **Ответы на вопросы:** [если есть вопросы]";

const SHORT_VOICE_INSTRUCTION: &str = "ЗАДАЧА: Обработай это голосовое сообщение естественно и дружелюбно.

ИНСТРУКЦИИ:
1. Пойми, что говорит пользователь
2. Если это вопрос - дай полезный ответ
3. Если это просьба - выполни её
4. Если это просто общение - поддержи разговор
5. Отвечай на том же языке, что и в сообщении
6. Будь естественным и дружелюбным

Отвечай естественно, как будто это обычный разговор! 🗣️";

const AUDIO_FILE_INSTRUCTION: &str = "ЗАДАЧА: Проанализируй этот аудиофайл (может быть музыка, подкаст, лекция и т.д.).

ИНСТРУКЦИИ:
1. Определи тип контента (музыка, речь, подкаст и т.д.)
2. Если есть речь - предоставь транскрипцию
3. Если это музыка - опиши жанр, настроение, инструменты
4. Выдели основные темы или идеи
5. Дай краткое резюме содержания

ФОРМАТ ОТВЕТА:
🎵 **Тип контента:** [описание]

📄 **Содержание:** [транскрипция или описание]

💭 **Комментарий:** [анализ и выводы]";

const IMAGE_INSTRUCTION: &str = "ЗАДАЧА: Проанализируй это изображение.

ИНСТРУКЦИИ:
1. Опиши, что изображено: объекты, людей, обстановку
2. Если на изображении есть текст - приведи его
3. Если пользователь задал вопрос в подписи - ответь на него
4. Отвечай на русском языке, если подпись не на другом языке

ФОРМАТ ОТВЕТА:
🖼️ **Описание:** [что изображено]

🔍 **Детали:** [текст, важные мелочи]

💬 **Ответ:** [ответ на вопрос, если он есть]";

/// Builds model-ready prompts from a style key, a context block and a request.
#[derive(Debug, Clone)]
pub struct PromptComposer {
    registry: Arc<StyleRegistry>,
}

impl PromptComposer {
    pub fn new(registry: Arc<StyleRegistry>) -> Self {
        Self { registry }
    }

    /// Prompt fragment for `style_key`, or [`BASE_PROMPT`] when absent or unknown.
    pub fn style_prompt(&self, style_key: Option<&str>) -> &str {
        style_key
            .and_then(|key| self.registry.prompt(key))
            .unwrap_or(BASE_PROMPT)
    }

    /// `style + context + "Запрос пользователя: " + request`.
    pub fn compose(&self, request: &str, style_key: Option<&str>, context: &str) -> String {
        let style = self.style_prompt(style_key);
        let mut prompt =
            String::with_capacity(style.len() + context.len() + REQUEST_MARKER.len() + request.len());
        prompt.push_str(style);
        prompt.push_str(context);
        prompt.push_str(REQUEST_MARKER);
        prompt.push_str(request);
        prompt
    }

    /// Media prompt: style, context, then the task instruction and an
    /// optional caption.
    pub fn compose_media(
        &self,
        instruction: &str,
        style_key: Option<&str>,
        context: &str,
        caption: Option<&str>,
    ) -> String {
        let mut prompt = format!("{}{}\n\n{}", self.style_prompt(style_key), context, instruction);
        if let Some(caption) = caption.map(str::trim).filter(|c| !c.is_empty()) {
            prompt.push_str(CAPTION_MARKER);
            prompt.push_str(caption);
        }
        prompt
    }
}

/// Task instruction for a media turn.
///
/// Voice messages switch to the transcription format once they run longer
/// than [`LONG_VOICE_SECS`]. Text turns have no instruction.
pub fn media_instruction(kind: MessageType, duration_secs: Option<u32>) -> &'static str {
    match kind {
        MessageType::Image => IMAGE_INSTRUCTION,
        MessageType::Audio => AUDIO_FILE_INSTRUCTION,
        MessageType::Voice if duration_secs.unwrap_or(0) > LONG_VOICE_SECS => {
            LONG_VOICE_INSTRUCTION
        }
        MessageType::Voice => SHORT_VOICE_INSTRUCTION,
        MessageType::Text => "",
    }
}
