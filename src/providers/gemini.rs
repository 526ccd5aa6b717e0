//! Gemini provider implementation for CemtrAS
//!
//! Calls the Generative Language API `generateContent` endpoint with the
//! persona as system instruction, the prompt as a single user turn, and image
//! or PDF attachments as inline data parts. The reply text is cleaned of
//! `**bold**` markers before it is returned.

use crate::attachments::FileAttachment;
use crate::config::{GenerationConfig, ProviderConfig};
use crate::error::{CemtrasError, ProviderError, Result};
use crate::providers::ModelClient;
use crate::roles::Role;

use async_trait::async_trait;
use regex::Regex;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use std::time::Duration;

/// Longest slice of an error body kept in a `Technical` detail
const MAX_ERROR_DETAIL: usize = 800;

/// Request body for `models/{model}:generateContent`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    system_instruction: Content,
    contents: Vec<Content>,
    generation_config: GenerationParams,
}

/// A turn (or the system instruction) made of parts
#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

/// One text or inline-data part
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationParams {
    temperature: f32,
    top_p: f32,
    top_k: u32,
    max_output_tokens: u32,
}

impl From<&GenerationConfig> for GenerationParams {
    fn from(config: &GenerationConfig) -> Self {
        Self {
            temperature: config.temperature,
            top_p: config.top_p,
            top_k: config.top_k,
            max_output_tokens: config.max_output_tokens,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

/// Remove `**bold**` markers and surrounding whitespace
///
/// # Examples
///
/// ```
/// use cemtras::providers::gemini::clean_markdown;
///
/// assert_eq!(clean_markdown("  **Check** the **kiln**\n"), "Check the kiln");
/// ```
pub fn clean_markdown(text: &str) -> String {
    static BOLD: OnceLock<Regex> = OnceLock::new();
    let bold = BOLD.get_or_init(|| Regex::new(r"\*\*(.*?)\*\*").expect("bold pattern is valid"));
    bold.replace_all(text, "$1").trim().to_string()
}

/// Map a non-success HTTP response to a provider error
///
/// # Examples
///
/// ```
/// use cemtras::error::ProviderError;
/// use cemtras::providers::gemini::classify_http_error;
/// use reqwest::StatusCode;
///
/// let err = classify_http_error(StatusCode::TOO_MANY_REQUESTS, "");
/// assert!(matches!(err, ProviderError::RateLimited(_)));
/// ```
pub fn classify_http_error(status: StatusCode, body: &str) -> ProviderError {
    let lower = body.to_lowercase();
    let detail = truncate_detail(status, body);

    if status == StatusCode::UNAUTHORIZED
        || status == StatusCode::FORBIDDEN
        || body.contains("API_KEY")
        || lower.contains("api key")
    {
        ProviderError::Configuration(detail)
    } else if status == StatusCode::TOO_MANY_REQUESTS
        || body.contains("RESOURCE_EXHAUSTED")
        || lower.contains("quota")
    {
        ProviderError::RateLimited(detail)
    } else if lower.contains("blocked") || body.contains("SAFETY") {
        ProviderError::ContentBlocked(detail)
    } else {
        ProviderError::Technical(detail)
    }
}

fn truncate_detail(status: StatusCode, body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        return format!("Gemini returned error {}", status);
    }
    let body: String = if body.chars().count() > MAX_ERROR_DETAIL {
        let head: String = body.chars().take(MAX_ERROR_DETAIL).collect();
        format!("{}...", head)
    } else {
        body.to_string()
    };
    format!("Gemini returned error {}: {}", status, body)
}

fn is_safety_finish(reason: &str) -> bool {
    matches!(
        reason,
        "SAFETY" | "BLOCKLIST" | "PROHIBITED_CONTENT" | "SPII" | "RECITATION"
    )
}

/// Extract, validate and clean the reply text of a successful response
fn extract_reply(response: GenerateContentResponse) -> std::result::Result<String, ProviderError> {
    if let Some(reason) = response
        .prompt_feedback
        .and_then(|feedback| feedback.block_reason)
    {
        return Err(ProviderError::ContentBlocked(format!(
            "Prompt blocked: {}",
            reason
        )));
    }

    let candidate = response.candidates.into_iter().next();
    let finish_reason = candidate
        .as_ref()
        .and_then(|c| c.finish_reason.clone())
        .unwrap_or_default();

    let text: String = candidate
        .and_then(|c| c.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect()
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        if is_safety_finish(&finish_reason) {
            return Err(ProviderError::ContentBlocked(format!(
                "Response blocked: {}",
                finish_reason
            )));
        }
        return Err(ProviderError::EmptyResponse);
    }

    Ok(clean_markdown(&text))
}

/// Gemini API client
///
/// # Examples
///
/// ```
/// use cemtras::config::ProviderConfig;
/// use cemtras::providers::{GeminiClient, ModelClient};
///
/// let config = ProviderConfig::default();
/// let client = GeminiClient::new(&config, "test-key").unwrap();
/// assert_eq!(client.model(), "gemini-1.5-flash");
/// ```
pub struct GeminiClient {
    client: Client,
    api_key: String,
    api_base: String,
    model: String,
    generation: GenerationConfig,
}

impl GeminiClient {
    /// Create a client for `config` using `api_key`
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    pub fn new(config: &ProviderConfig, api_key: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("cemtras/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CemtrasError::Config(format!("Failed to create HTTP client: {}", e)))?;

        tracing::info!(
            "Initialized Gemini provider: api_base={}, model={}",
            config.api_base,
            config.model
        );

        Ok(Self {
            client,
            api_key: api_key.to_string(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            generation: config.generation.clone(),
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.api_base, self.model
        )
    }

    fn build_request(
        &self,
        prompt: &str,
        role: Role,
        attachments: &[FileAttachment],
    ) -> GenerateContentRequest {
        let mut parts = vec![Part {
            text: Some(prompt.to_string()),
            inline_data: None,
        }];

        for file in attachments {
            if file.is_inline_supported() {
                parts.push(Part {
                    text: None,
                    inline_data: Some(InlineData {
                        mime_type: file.mime_type.clone(),
                        data: file.content.clone(),
                    }),
                });
            } else {
                tracing::debug!(name = %file.name, mime = %file.mime_type, "Attachment not sent inline");
            }
        }

        GenerateContentRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part {
                    text: Some(role.system_instruction().to_string()),
                    inline_data: None,
                }],
            },
            contents: vec![Content {
                role: Some("user".to_string()),
                parts,
            }],
            generation_config: GenerationParams::from(&self.generation),
        }
    }
}

#[async_trait]
impl ModelClient for GeminiClient {
    async fn generate(
        &self,
        prompt: &str,
        role: Role,
        attachments: &[FileAttachment],
    ) -> std::result::Result<String, ProviderError> {
        let request = self.build_request(prompt, role, attachments);
        let url = self.endpoint();
        tracing::debug!("Sending Gemini request to {}", url);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!("Failed to reach Gemini: {}", e);
                ProviderError::Technical(format!("Failed to reach Gemini: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = classify_http_error(status, &body);
            tracing::error!("Gemini returned error {}: {}", status, err);
            return Err(err);
        }

        let body: GenerateContentResponse = response.json().await.map_err(|e| {
            tracing::error!("Failed to parse Gemini response: {}", e);
            ProviderError::Technical(format!("Failed to parse Gemini response: {}", e))
        })?;

        extract_reply(body)
    }

    fn model(&self) -> &str {
        &self.model
    }
}
