//! OpenAI-backed reconciliation engine.

use super::{validate_merged, Manuscript, MergedTranscript, Reconciler};
use crate::config::{MergeSettings, Prompts};
use crate::error::{Result, TolkError};
use crate::openai::create_client;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs, ResponseFormat,
    ResponseFormatJsonSchema,
};
use async_trait::async_trait;
use std::collections::HashMap;
use tracing::{debug, info, instrument};

/// Reconciliation engine using OpenAI chat completions with schema-constrained
/// output.
pub struct OpenAiReconciler {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    merge_model: String,
    manuscript_model: String,
    prompts: Prompts,
}

impl OpenAiReconciler {
    /// Create a new reconciler from the merge settings.
    pub fn from_settings(settings: &MergeSettings) -> Self {
        Self {
            client: create_client(settings.timeout_secs),
            merge_model: settings.model.clone(),
            manuscript_model: settings.manuscript_model.clone(),
            prompts: Prompts::default(),
        }
    }

    /// Set custom prompts.
    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    /// Run a schema-constrained completion and parse the single choice.
    async fn structured_completion<T: serde::de::DeserializeOwned>(
        &self,
        model: &str,
        messages: Vec<ChatCompletionRequestMessage>,
        schema_name: &str,
        schema: serde_json::Value,
    ) -> Result<T> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(model)
            .messages(messages)
            .response_format(ResponseFormat::JsonSchema {
                json_schema: ResponseFormatJsonSchema {
                    description: None,
                    name: schema_name.to_string(),
                    schema: Some(schema),
                    strict: Some(true),
                },
            })
            .build()
            .map_err(|e| TolkError::Merge(format!("Failed to build request: {}", e)))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| TolkError::OpenAI(format!("{} API error: {}", model, e)))?;

        let content = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .ok_or_else(|| TolkError::Merge("Empty response from model".to_string()))?;

        serde_json::from_str(content)
            .map_err(|e| TolkError::Merge(format!("Model output failed schema parse: {}", e)))
    }
}

/// JSON schema for [`MergedTranscript`].
fn merged_transcript_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "sentences": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "text": {
                            "type": "string",
                            "description": "The corrected and finalized sentence."
                        },
                        "is_uncertain": {
                            "type": "boolean",
                            "description": "True if the two source transcripts disagree significantly here."
                        },
                        "has_medical_terminology": {
                            "type": "boolean",
                            "description": "True if the sentence contains specialist medical terminology."
                        },
                        "uncertain_words": {
                            "type": "array",
                            "items": { "type": "string" },
                            "description": "Doubted words, verbatim exact matches to words in the text field."
                        }
                    },
                    "required": ["text", "is_uncertain", "has_medical_terminology", "uncertain_words"],
                    "additionalProperties": false
                }
            },
            "medical_term_source": {
                "type": "string",
                "enum": ["whisper", "clinical", "tie"],
                "description": "Which source transcript was better for medical terms."
            },
            "everyday_speech_source": {
                "type": "string",
                "enum": ["whisper", "clinical", "tie"],
                "description": "Which source transcript was better for everyday speech."
            }
        },
        "required": ["sentences", "medical_term_source", "everyday_speech_source"],
        "additionalProperties": false
    })
}

/// JSON schema for [`Manuscript`].
fn manuscript_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "title": {
                "type": "string",
                "description": "A concise and fitting title for the manuscript."
            },
            "prose": {
                "type": "string",
                "description": "The main body, written as realistic case prose."
            },
            "key_takeaways": {
                "type": "array",
                "items": { "type": "string" },
                "description": "3-5 bullet points summarizing the prose."
            }
        },
        "required": ["title", "prose", "key_takeaways"],
        "additionalProperties": false
    })
}

#[async_trait]
impl Reconciler for OpenAiReconciler {
    #[instrument(skip_all, fields(whisper_len = whisper_text.len(), clinical_len = clinical_text.len()))]
    async fn merge(&self, whisper_text: &str, clinical_text: &str) -> Result<MergedTranscript> {
        debug!("Requesting transcript reconciliation from {}", self.merge_model);

        let mut vars = HashMap::new();
        vars.insert("whisper".to_string(), whisper_text.to_string());
        vars.insert("clinical".to_string(), clinical_text.to_string());
        let user_prompt = Prompts::render(&self.prompts.merge.user, &vars);

        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(self.prompts.merge.system.clone())
                .build()
                .map_err(|e| TolkError::Merge(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(user_prompt)
                .build()
                .map_err(|e| TolkError::Merge(e.to_string()))?
                .into(),
        ];

        let merged: MergedTranscript = self
            .structured_completion(
                &self.merge_model,
                messages,
                "merged_transcript",
                merged_transcript_schema(),
            )
            .await?;

        validate_merged(&merged)?;
        info!("Reconciled transcript with {} sentences", merged.sentences.len());
        Ok(merged)
    }

    #[instrument(skip(self))]
    async fn manuscript(&self, topic: &str) -> Result<Manuscript> {
        debug!("Requesting manuscript from {}", self.manuscript_model);

        let mut vars = HashMap::new();
        vars.insert("topic".to_string(), topic.to_string());
        let system_prompt = Prompts::render(&self.prompts.manuscript.system, &vars);

        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(system_prompt)
                .build()
                .map_err(|e| TolkError::Manuscript(e.to_string()))?
                .into(),
        ];

        let manuscript: Manuscript = self
            .structured_completion(
                &self.manuscript_model,
                messages,
                "manuscript",
                manuscript_schema(),
            )
            .await
            .map_err(|e| match e {
                TolkError::Merge(msg) => TolkError::Manuscript(msg),
                other => other,
            })?;

        info!("Generated manuscript: {}", manuscript.title);
        Ok(manuscript)
    }
}
