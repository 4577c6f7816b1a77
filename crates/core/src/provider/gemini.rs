//! Google Gemini adapter over the `generateContent` REST endpoint.

use super::{ImageRef, ProviderClient, decode_base64};
use crate::{
    error::ProviderError,
    message::{HistoryTurn, Role},
    prompt::PromptSet,
    subject::{Difficulty, Subject},
};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_CHAT_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-2.5-flash-image";
pub const DEFAULT_SPEECH_MODEL: &str = "gemini-2.5-flash-preview-tts";
pub const DEFAULT_VOICE: &str = "Kore";

const TEMPERATURE: f64 = 0.7;
const IMAGE_ASPECT_RATIO: &str = "16:9";

/// Model identifiers for the three capabilities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeminiModels {
    pub chat: String,
    pub image: String,
    pub speech: String,
}

impl Default for GeminiModels {
    fn default() -> Self {
        Self {
            chat: DEFAULT_CHAT_MODEL.to_string(),
            image: DEFAULT_IMAGE_MODEL.to_string(),
            speech: DEFAULT_SPEECH_MODEL.to_string(),
        }
    }
}

/// `ProviderClient` backed by the Gemini HTTP API.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
    models: GeminiModels,
    voice: String,
    prompts: PromptSet,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            models: GeminiModels::default(),
            voice: DEFAULT_VOICE.to_string(),
            prompts: PromptSet::default(),
        }
    }

    pub fn with_models(mut self, models: GeminiModels) -> Self {
        self.models = models;
        self
    }

    pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = voice.into();
        self
    }

    pub fn with_prompts(mut self, prompts: PromptSet) -> Self {
        self.prompts = prompts;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn generate(
        &self,
        model: &str,
        body: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, ProviderError> {
        if self.api_key.is_empty() {
            return Err(ProviderError::MissingCredential("GEMINI_API_KEY".to_string()));
        }
        let url = format!("{}/models/{model}:generateContent", self.base_url);
        debug!(%model, "Sending Gemini generateContent request");

        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(http_error(status.as_u16(), &body));
        }

        response
            .json::<GenerateContentResponse>()
            .await
            .map_err(|e| ProviderError::Malformed(format!("Failed to parse Gemini response: {e}")))
    }
}

#[async_trait]
impl ProviderClient for GeminiClient {
    async fn complete_text(
        &self,
        prompt: &str,
        subject: Subject,
        difficulty: Difficulty,
        history: &[HistoryTurn],
    ) -> Result<String, ProviderError> {
        let body = text_request(
            prompt,
            history,
            self.prompts.tutor_instruction(subject, difficulty),
        );
        let response = self.generate(&self.models.chat, &body).await?;
        Ok(response.text())
    }

    async fn generate_image(&self, prompt_seed: &str) -> Result<Option<ImageRef>, ProviderError> {
        let body = GenerateContentRequest {
            contents: vec![Content::text(None, self.prompts.visual_aid(prompt_seed))],
            system_instruction: None,
            generation_config: Some(GenerationConfig {
                image_config: Some(ImageConfig {
                    aspect_ratio: IMAGE_ASPECT_RATIO.to_string(),
                }),
                ..Default::default()
            }),
        };
        let response = self.generate(&self.models.image, &body).await?;
        Ok(response.first_inline_data().map(|blob| {
            let mime_type = blob.mime_type.as_deref().unwrap_or("image/png");
            ImageRef::from_base64(mime_type, &blob.data)
        }))
    }

    async fn synthesize_speech(&self, text: &str) -> Result<Option<Bytes>, ProviderError> {
        let body = GenerateContentRequest {
            contents: vec![Content::text(None, self.prompts.speech(text))],
            system_instruction: None,
            generation_config: Some(GenerationConfig {
                response_modalities: Some(vec![ResponseModality::Audio]),
                speech_config: Some(SpeechConfig {
                    voice_config: VoiceConfig {
                        prebuilt_voice_config: PrebuiltVoiceConfig {
                            voice_name: self.voice.clone(),
                        },
                    },
                }),
                ..Default::default()
            }),
        };
        let response = self.generate(&self.models.speech, &body).await?;
        match response.first_inline_data() {
            Some(blob) => Ok(Some(Bytes::from(decode_base64(&blob.data)?))),
            None => Ok(None),
        }
    }
}

fn text_request(prompt: &str, history: &[HistoryTurn], instruction: String) -> GenerateContentRequest {
    let mut contents: Vec<Content> = history
        .iter()
        .map(|turn| Content::text(Some(gemini_role(turn.role)), turn.content.clone()))
        .collect();
    contents.push(Content::text(Some("user"), prompt.to_string()));

    GenerateContentRequest {
        contents,
        system_instruction: Some(Content::text(None, instruction)),
        generation_config: Some(GenerationConfig {
            temperature: Some(TEMPERATURE),
            ..Default::default()
        }),
    }
}

fn gemini_role(role: Role) -> &'static str {
    match role {
        Role::User => "user",
        Role::Assistant => "model",
    }
}

fn http_error(status: u16, body: &str) -> ProviderError {
    let message = serde_json::from_str::<ErrorWrapper>(body)
        .ok()
        .and_then(|wrapper| wrapper.error.message)
        .unwrap_or_else(|| body.to_string());
    ProviderError::Http { status, message }
}

// --- Wire types ---

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize, Debug)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part>,
}

impl Content {
    fn text(role: Option<&'static str>, text: String) -> Self {
        Self {
            role,
            parts: vec![Part { text }],
        }
    }
}

#[derive(Serialize, Debug)]
struct Part {
    text: String,
}

#[derive(Serialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_modalities: Option<Vec<ResponseModality>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    speech_config: Option<SpeechConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    image_config: Option<ImageConfig>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "UPPERCASE")]
enum ResponseModality {
    Audio,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct SpeechConfig {
    voice_config: VoiceConfig,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct VoiceConfig {
    prebuilt_voice_config: PrebuiltVoiceConfig,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct PrebuiltVoiceConfig {
    voice_name: String,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct ImageConfig {
    aspect_ratio: String,
}

#[derive(Deserialize, Debug)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

impl GenerateContentResponse {
    fn parts(&self) -> impl Iterator<Item = &ResponsePart> {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .into_iter()
            .flat_map(|content| content.parts.iter())
    }

    /// Concatenates every text part of the first candidate.
    fn text(&self) -> String {
        self.parts().filter_map(|p| p.text.as_deref()).collect()
    }

    fn first_inline_data(&self) -> Option<&Blob> {
        self.parts().find_map(|p| p.inline_data.as_ref())
    }
}

#[derive(Deserialize, Debug)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Deserialize, Debug)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct ResponsePart {
    text: Option<String>,
    inline_data: Option<Blob>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct Blob {
    mime_type: Option<String>,
    data: String,
}

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_text_request_maps_history_roles() {
        let history = vec![
            HistoryTurn {
                role: Role::User,
                content: "What is recursion?".to_string(),
            },
            HistoryTurn {
                role: Role::Assistant,
                content: "Recursion is...".to_string(),
            },
        ];
        let body = text_request("And a base case?", &history, "Be a tutor".to_string());
        let value = serde_json::to_value(&body).unwrap();

        assert_eq!(
            value,
            json!({
                "contents": [
                    { "role": "user", "parts": [{ "text": "What is recursion?" }] },
                    { "role": "model", "parts": [{ "text": "Recursion is..." }] },
                    { "role": "user", "parts": [{ "text": "And a base case?" }] }
                ],
                "systemInstruction": { "parts": [{ "text": "Be a tutor" }] },
                "generationConfig": { "temperature": 0.7 }
            })
        );
    }

    #[test]
    fn test_speech_config_serialization() {
        let config = GenerationConfig {
            response_modalities: Some(vec![ResponseModality::Audio]),
            speech_config: Some(SpeechConfig {
                voice_config: VoiceConfig {
                    prebuilt_voice_config: PrebuiltVoiceConfig {
                        voice_name: "Kore".to_string(),
                    },
                },
            }),
            ..Default::default()
        };
        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(
            value,
            json!({
                "responseModalities": ["AUDIO"],
                "speechConfig": { "voiceConfig": { "prebuiltVoiceConfig": { "voiceName": "Kore" } } }
            })
        );
    }

    #[test]
    fn test_response_text_joins_parts() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{ "content": { "role": "model", "parts": [
                { "text": "# Recursion\n" },
                { "text": "A function calling itself." }
            ]}}]
        }))
        .unwrap();
        assert_eq!(response.text(), "# Recursion\nA function calling itself.");
    }

    #[test]
    fn test_response_without_candidates_is_empty() {
        let response: GenerateContentResponse = serde_json::from_value(json!({})).unwrap();
        assert_eq!(response.text(), "");
        assert!(response.first_inline_data().is_none());
    }

    #[test]
    fn test_first_inline_data_skips_text_parts() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{ "content": { "parts": [
                { "text": "Here is your diagram" },
                { "inlineData": { "mimeType": "image/jpeg", "data": "/9j/4AAQ" } }
            ]}}]
        }))
        .unwrap();
        let blob = response.first_inline_data().unwrap();
        assert_eq!(blob.mime_type.as_deref(), Some("image/jpeg"));
        assert_eq!(blob.data, "/9j/4AAQ");
    }

    #[test]
    fn test_http_error_prefers_error_message() {
        let err = http_error(
            429,
            r#"{"error":{"code":429,"message":"Quota exceeded","status":"RESOURCE_EXHAUSTED"}}"#,
        );
        match err {
            ProviderError::Http { status, message } => {
                assert_eq!(status, 429);
                assert_eq!(message, "Quota exceeded");
            }
            other => panic!("Expected Http error, got {other:?}"),
        }

        let err = http_error(502, "Bad Gateway");
        assert!(matches!(err, ProviderError::Http { message, .. } if message == "Bad Gateway"));
    }

    #[tokio::test]
    async fn test_missing_key_fails_without_network() {
        let client = GeminiClient::new("");
        let err = client
            .complete_text("Hi", Subject::Science, Difficulty::Beginner, &[])
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::MissingCredential(_)));
    }
}
