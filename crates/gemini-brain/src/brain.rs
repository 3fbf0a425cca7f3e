//! GeminiBrain implementation using the Gemini REST API.

use std::path::Path;

use brain_core::{async_trait, Brain, BrainError, UploadedMedia};
use reqwest::{Client, Response};
use tracing::{debug, info, warn};

use crate::api_types::{
    ApiError, Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, Part,
    UploadFileMetadata, UploadResponse, UploadStartRequest,
};
use crate::config::GeminiBrainConfig;

/// A brain implementation backed by Google's Gemini API.
///
/// GeminiBrain is stateless: conversation context is composed into the prompt
/// by the caller. Media goes through the resumable Files API upload and is
/// then referenced by URI in the generation request.
pub struct GeminiBrain {
    client: Client,
    config: GeminiBrainConfig,
}

impl GeminiBrain {
    /// Create a new GeminiBrain with the given configuration.
    pub fn new(config: GeminiBrainConfig) -> Result<Self, BrainError> {
        if config.api_key.trim().is_empty() {
            return Err(BrainError::Configuration("Gemini API key is empty".to_string()));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| BrainError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            "GeminiBrain initialized with model: {}, timeout: {}s",
            config.model,
            config.timeout.as_secs()
        );

        Ok(Self { client, config })
    }

    /// Create a GeminiBrain from environment variables.
    ///
    /// See [`GeminiBrainConfig::from_env`] for required environment variables.
    pub fn from_env() -> Result<Self, BrainError> {
        let config = GeminiBrainConfig::from_env()?;
        Self::new(config)
    }

    /// Get the configuration.
    pub fn config(&self) -> &GeminiBrainConfig {
        &self.config
    }

    fn generation_config(&self) -> Option<GenerationConfig> {
        if self.config.temperature.is_none() && self.config.max_output_tokens.is_none() {
            return None;
        }
        Some(GenerationConfig {
            temperature: self.config.temperature,
            max_output_tokens: self.config.max_output_tokens,
        })
    }

    /// Make a `generateContent` request and extract the reply text.
    async fn generate(&self, parts: Vec<Part>) -> Result<String, BrainError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.api_url.trim_end_matches('/'),
            self.config.model
        );

        let request = GenerateContentRequest {
            contents: vec![Content::user(parts)],
            generation_config: self.generation_config(),
        };

        debug!("Sending request to Gemini API: {:?}", request);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(map_send_error)?;

        let response = check_status(response, BrainError::ProcessingFailed).await?;

        let completion: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| BrainError::ProcessingFailed(format!("Failed to parse response: {}", e)))?;

        if let Some(ref usage) = completion.usage_metadata {
            debug!(
                "Token usage - prompt: {}, completion: {}, total: {}",
                usage.prompt_token_count, usage.candidates_token_count, usage.total_token_count
            );
        }

        completion.text().ok_or_else(|| {
            let reason = completion
                .candidates
                .first()
                .and_then(|c| c.finish_reason.as_deref())
                .unwrap_or("none");
            warn!("No text in Gemini response (finish reason: {})", reason);
            BrainError::EmptyResponse
        })
    }
}

#[async_trait]
impl Brain for GeminiBrain {
    async fn generate_text(&self, prompt: &str) -> Result<String, BrainError> {
        debug!("Generating text reply ({} chars)", prompt.len());
        self.generate(vec![Part::text(prompt)]).await
    }

    async fn upload_media(&self, path: &Path, mime_type: &str) -> Result<UploadedMedia, BrainError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| BrainError::Upload(format!("Failed to read {}: {}", path.display(), e)))?;

        let display_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());

        info!(
            "Uploading {} ({} bytes, {}) to Gemini",
            display_name,
            bytes.len(),
            mime_type
        );

        // Resumable upload: the start request returns a session URL.
        let start_url = format!(
            "{}/upload/v1beta/files",
            self.config.api_url.trim_end_matches('/')
        );
        let start = self
            .client
            .post(&start_url)
            .header("x-goog-api-key", &self.config.api_key)
            .header("X-Goog-Upload-Protocol", "resumable")
            .header("X-Goog-Upload-Command", "start")
            .header("X-Goog-Upload-Header-Content-Length", bytes.len().to_string())
            .header("X-Goog-Upload-Header-Content-Type", mime_type)
            .json(&UploadStartRequest {
                file: UploadFileMetadata { display_name },
            })
            .send()
            .await
            .map_err(map_send_error)?;

        let start = check_status(start, BrainError::Upload).await?;

        let upload_url = start
            .headers()
            .get("x-goog-upload-url")
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| BrainError::Upload("Missing upload URL in response".to_string()))?;

        let finish = self
            .client
            .post(&upload_url)
            .header("Content-Length", bytes.len().to_string())
            .header("X-Goog-Upload-Offset", "0")
            .header("X-Goog-Upload-Command", "upload, finalize")
            .body(bytes)
            .send()
            .await
            .map_err(map_send_error)?;

        let finish = check_status(finish, BrainError::Upload).await?;

        let uploaded: UploadResponse = finish
            .json()
            .await
            .map_err(|e| BrainError::Upload(format!("Failed to parse upload response: {}", e)))?;

        debug!("Uploaded file {:?} -> {}", uploaded.file.name, uploaded.file.uri);

        Ok(UploadedMedia {
            uri: uploaded.file.uri,
            mime_type: uploaded
                .file
                .mime_type
                .unwrap_or_else(|| mime_type.to_string()),
        })
    }

    async fn generate_from_media(
        &self,
        media: &UploadedMedia,
        prompt: &str,
    ) -> Result<String, BrainError> {
        debug!("Generating reply for {} media", media.mime_type);
        self.generate(vec![
            Part::file(&media.uri, &media.mime_type),
            Part::text(prompt),
        ])
        .await
    }

    fn name(&self) -> &str {
        "GeminiBrain"
    }
}

fn map_send_error(e: reqwest::Error) -> BrainError {
    if e.is_timeout() {
        BrainError::Timeout
    } else {
        BrainError::Network(format!("Failed to send request: {}", e))
    }
}

/// Turn a non-success response into an error carrying the provider's message.
async fn check_status(
    response: Response,
    wrap: fn(String) -> BrainError,
) -> Result<Response, BrainError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let error_text = response.text().await.unwrap_or_default();
    Err(wrap(describe_api_error(status.as_u16(), &error_text)))
}

fn describe_api_error(status: u16, body: &str) -> String {
    match serde_json::from_str::<ApiError>(body) {
        Ok(api_error) => format!("API error ({}): {}", status, api_error.error.message),
        Err(_) => format!("API error ({}): {}", status, body),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_brain() -> GeminiBrain {
        let config = GeminiBrainConfig::builder().api_key("test-key").build();
        GeminiBrain::new(config).unwrap()
    }

    #[test]
    fn test_brain_name() {
        assert_eq!(test_brain().name(), "GeminiBrain");
    }

    #[test]
    fn test_empty_key_rejected() {
        let result = GeminiBrain::new(GeminiBrainConfig::default());
        assert!(matches!(result, Err(BrainError::Configuration(_))));
    }

    #[test]
    fn test_generation_config_omitted_by_default() {
        assert!(test_brain().generation_config().is_none());

        let config = GeminiBrainConfig::builder()
            .api_key("k")
            .temperature(0.2)
            .build();
        let brain = GeminiBrain::new(config).unwrap();
        let generation = brain.generation_config().unwrap();
        assert_eq!(generation.temperature, Some(0.2));
        assert_eq!(generation.max_output_tokens, None);
    }

    #[test]
    fn test_describe_api_error_keeps_provider_message() {
        let body = r#"{"error": {"code": 429, "message": "Resource has been exhausted (e.g. check quota).", "status": "RESOURCE_EXHAUSTED"}}"#;
        let described = describe_api_error(429, body);
        assert_eq!(
            described,
            "API error (429): Resource has been exhausted (e.g. check quota)."
        );

        let raw = describe_api_error(502, "Bad Gateway");
        assert_eq!(raw, "API error (502): Bad Gateway");
    }

    #[tokio::test]
    async fn test_upload_missing_file() {
        let brain = test_brain();
        let result = brain
            .upload_media(Path::new("/nonexistent/voice.ogg"), "audio/ogg")
            .await;

        assert!(matches!(result, Err(BrainError::Upload(_))));
    }
}
