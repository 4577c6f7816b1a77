//! OpenAI adapter built on `async-openai`: chat completions, image generation
//! and text-to-speech with raw PCM output.

use super::{ImageRef, ProviderClient};
use crate::{
    error::ProviderError,
    message::{HistoryTurn, Role},
    prompt::PromptSet,
    subject::{Difficulty, Subject},
};
use async_openai::{
    Client,
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs, CreateImageRequestArgs, CreateSpeechRequestArgs, Image,
        ImageModel, ImageResponseFormat, ImageSize, SpeechModel, SpeechResponseFormat, Voice,
    },
};
use async_trait::async_trait;
use bytes::Bytes;
use tracing::warn;

pub const DEFAULT_CHAT_MODEL: &str = "gpt-4o";
pub const DEFAULT_IMAGE_MODEL: &str = "dall-e-3";
pub const DEFAULT_SPEECH_MODEL: &str = "tts-1";
pub const DEFAULT_VOICE: &str = "alloy";

const TEMPERATURE: f32 = 0.7;

/// Model identifiers for the three capabilities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenAIModels {
    pub chat: String,
    pub image: String,
    pub speech: String,
}

impl Default for OpenAIModels {
    fn default() -> Self {
        Self {
            chat: DEFAULT_CHAT_MODEL.to_string(),
            image: DEFAULT_IMAGE_MODEL.to_string(),
            speech: DEFAULT_SPEECH_MODEL.to_string(),
        }
    }
}

/// `ProviderClient` for any OpenAI-compatible API.
///
/// Speech is requested as `pcm`, which OpenAI returns as 24 kHz mono PCM16 LE.
pub struct OpenAIClient {
    client: Client<OpenAIConfig>,
    models: OpenAIModels,
    voice: Voice,
    prompts: PromptSet,
}

impl OpenAIClient {
    pub fn new(config: OpenAIConfig) -> Self {
        Self {
            client: Client::with_config(config),
            models: OpenAIModels::default(),
            voice: Voice::Alloy,
            prompts: PromptSet::default(),
        }
    }

    pub fn with_models(mut self, models: OpenAIModels) -> Self {
        self.models = models;
        self
    }

    /// Selects a voice by its API name (e.g. "nova"); unknown names keep the current voice.
    pub fn with_voice(mut self, voice: &str) -> Self {
        match parse_voice(voice) {
            Some(parsed) => self.voice = parsed,
            None => warn!(%voice, "Unknown OpenAI voice, keeping default"),
        }
        self
    }

    pub fn with_prompts(mut self, prompts: PromptSet) -> Self {
        self.prompts = prompts;
        self
    }
}

fn parse_voice(name: &str) -> Option<Voice> {
    match name.to_lowercase().as_str() {
        "alloy" => Some(Voice::Alloy),
        "echo" => Some(Voice::Echo),
        "fable" => Some(Voice::Fable),
        "onyx" => Some(Voice::Onyx),
        "nova" => Some(Voice::Nova),
        "shimmer" => Some(Voice::Shimmer),
        _ => None,
    }
}

/// Size and response format a model accepts. DALL-E models need base64
/// requested explicitly and support different sizes; newer image models
/// always answer in base64 and pick their own size.
fn image_options(model: &str) -> (Option<ImageSize>, Option<ImageResponseFormat>) {
    match model {
        "dall-e-3" => (
            Some(ImageSize::S1792x1024),
            Some(ImageResponseFormat::B64Json),
        ),
        "dall-e-2" => (
            Some(ImageSize::S1024x1024),
            Some(ImageResponseFormat::B64Json),
        ),
        _ => (None, None),
    }
}

fn chat_messages(
    instruction: String,
    history: &[HistoryTurn],
    prompt: &str,
) -> Result<Vec<ChatCompletionRequestMessage>, ProviderError> {
    let mut messages: Vec<ChatCompletionRequestMessage> = vec![
        ChatCompletionRequestSystemMessageArgs::default()
            .content(instruction)
            .build()?
            .into(),
    ];
    for turn in history {
        match turn.role {
            Role::User => messages.push(
                ChatCompletionRequestUserMessageArgs::default()
                    .content(turn.content.clone())
                    .build()?
                    .into(),
            ),
            Role::Assistant => messages.push(
                ChatCompletionRequestAssistantMessageArgs::default()
                    .content(turn.content.clone())
                    .build()?
                    .into(),
            ),
        };
    }
    messages.push(
        ChatCompletionRequestUserMessageArgs::default()
            .content(prompt)
            .build()?
            .into(),
    );
    Ok(messages)
}

#[async_trait]
impl ProviderClient for OpenAIClient {
    async fn complete_text(
        &self,
        prompt: &str,
        subject: Subject,
        difficulty: Difficulty,
        history: &[HistoryTurn],
    ) -> Result<String, ProviderError> {
        let messages = chat_messages(
            self.prompts.tutor_instruction(subject, difficulty),
            history,
            prompt,
        )?;
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.models.chat)
            .messages(messages)
            .temperature(TEMPERATURE)
            .build()?;

        let response = self.client.chat().create(request).await?;
        Ok(response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .unwrap_or_default())
    }

    async fn generate_image(&self, prompt_seed: &str) -> Result<Option<ImageRef>, ProviderError> {
        let mut args = CreateImageRequestArgs::default();
        args.prompt(self.prompts.visual_aid(prompt_seed))
            .model(ImageModel::Other(self.models.image.clone()))
            .n(1);
        let (size, response_format) = image_options(&self.models.image);
        if let Some(size) = size {
            args.size(size);
        }
        if let Some(response_format) = response_format {
            args.response_format(response_format);
        }
        let request = args.build()?;

        let response = self.client.images().create(request).await?;
        Ok(response
            .data
            .first()
            .and_then(|image| match image.as_ref() {
                Image::B64Json { b64_json, .. } => {
                    Some(ImageRef::from_base64("image/png", b64_json.as_str()))
                }
                _ => {
                    warn!("Image response carried no inline data");
                    None
                }
            }))
    }

    async fn synthesize_speech(&self, text: &str) -> Result<Option<Bytes>, ProviderError> {
        let request = CreateSpeechRequestArgs::default()
            .input(self.prompts.speech(text))
            .model(SpeechModel::Other(self.models.speech.clone()))
            .voice(self.voice.clone())
            .response_format(SpeechResponseFormat::Pcm)
            .build()?;

        let response = self.client.audio().speech(request).await?;
        if response.bytes.is_empty() {
            return Ok(None);
        }
        Ok(Some(response.bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_voice() {
        assert!(matches!(parse_voice("nova"), Some(Voice::Nova)));
        assert!(matches!(parse_voice("Alloy"), Some(Voice::Alloy)));
        assert!(parse_voice("Kore").is_none());
    }

    #[test]
    fn test_image_options_per_model() {
        assert!(matches!(
            image_options("dall-e-3"),
            (Some(ImageSize::S1792x1024), Some(ImageResponseFormat::B64Json))
        ));
        assert!(matches!(
            image_options("dall-e-2"),
            (Some(ImageSize::S1024x1024), Some(ImageResponseFormat::B64Json))
        ));
        assert!(matches!(image_options("gpt-image-1"), (None, None)));
    }

    #[test]
    fn test_chat_messages_order() {
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
        let messages = chat_messages("Be a tutor".to_string(), &history, "Show me one").unwrap();

        assert_eq!(messages.len(), 4);
        assert!(matches!(messages[0], ChatCompletionRequestMessage::System(_)));
        assert!(matches!(messages[1], ChatCompletionRequestMessage::User(_)));
        assert!(matches!(messages[2], ChatCompletionRequestMessage::Assistant(_)));
        assert!(matches!(messages[3], ChatCompletionRequestMessage::User(_)));
    }
}
