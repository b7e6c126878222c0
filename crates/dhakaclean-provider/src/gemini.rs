//! Google Gemini API provider
//!
//! https://ai.google.dev/api/generate-content

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use dhakaclean_schema::GroundingChunk;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::{GenerateRequest, GenerateResponse, GenerativeModel, Part};

pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Clone)]
pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl GeminiProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, GEMINI_API_BASE)
    }

    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn build_request(&self, request: &GenerateRequest) -> GeminiRequest {
        let contents = request
            .contents
            .iter()
            .filter(|turn| !turn.parts.is_empty())
            .map(|turn| GeminiContent {
                role: Some(turn.role.as_str().to_string()),
                parts: turn
                    .parts
                    .iter()
                    .map(|part| match part {
                        Part::Text(text) => GeminiPart::Text { text: text.clone() },
                        Part::InlineData { mime_type, data } => GeminiPart::InlineData {
                            inline_data: GeminiBlob {
                                mime_type: mime_type.clone(),
                                data: data.clone(),
                            },
                        },
                    })
                    .collect(),
            })
            .collect();

        let generation_config = if request.temperature.is_some() || request.response_format.is_some() {
            Some(GeminiGenerationConfig {
                temperature: request.temperature,
                response_mime_type: request.response_format.as_ref().map(|f| f.mime_type.clone()),
                response_schema: request.response_format.as_ref().map(|f| f.schema.clone()),
            })
        } else {
            None
        };

        let tools = request.maps_grounding.then(|| {
            vec![GeminiTool {
                google_maps: Some(GeminiGoogleMaps {}),
            }]
        });

        // Location bias only means something to the maps tool.
        let tool_config = request
            .location_bias
            .filter(|_| request.maps_grounding)
            .map(|loc| GeminiToolConfig {
                retrieval_config: GeminiRetrievalConfig {
                    lat_lng: GeminiLatLng {
                        latitude: loc.latitude,
                        longitude: loc.longitude,
                    },
                },
            });

        GeminiRequest {
            contents,
            system_instruction: request.system.as_ref().map(|s| GeminiContent {
                role: Some("user".to_string()),
                parts: vec![GeminiPart::Text { text: s.clone() }],
            }),
            generation_config,
            tools,
            tool_config,
        }
    }
}

#[async_trait]
impl GenerativeModel for GeminiProvider {
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, request.model, self.api_key
        );

        let payload = self.build_request(&request);
        tracing::debug!(model = %request.model, turns = payload.contents.len(), "gemini generateContent");

        let resp = match self
            .client
            .post(&url)
            .header("content-type", "application/json")
            .json(&payload)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) if e.is_timeout() => {
                return Err(anyhow!(
                    "gemini api error (timeout) [retryable]: request timed out"
                ));
            }
            Err(e) if e.is_connect() => {
                return Err(anyhow!("gemini api error (connect) [retryable]: {e}"));
            }
            Err(e) => return Err(e.into()),
        };

        let status = resp.status();
        if status != StatusCode::OK {
            let text = resp.text().await?;
            return Err(format_api_error(status, &text));
        }

        let body: GeminiResponse = resp.json().await?;
        to_generate_response(body)
    }
}

fn to_generate_response(body: GeminiResponse) -> Result<GenerateResponse> {
    let candidate = body
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("gemini api error: empty candidates"))?;

    let text: String = candidate
        .content
        .parts
        .iter()
        .filter_map(|part| match part {
            GeminiPart::Text { text } => Some(text.as_str()),
            _ => None,
        })
        .collect();

    let stop_reason = match candidate.finish_reason.as_deref() {
        Some("STOP") => Some("end_turn".to_string()),
        Some("MAX_TOKENS") => Some("max_tokens".to_string()),
        Some("SAFETY") => Some("safety".to_string()),
        Some(r) => Some(r.to_lowercase()),
        None => None,
    };

    Ok(GenerateResponse {
        text,
        grounding_chunks: candidate
            .grounding_metadata
            .map(|m| m.grounding_chunks)
            .unwrap_or_default(),
        input_tokens: body.usage_metadata.as_ref().map(|u| u.prompt_token_count),
        output_tokens: body
            .usage_metadata
            .as_ref()
            .map(|u| u.candidates_token_count),
        stop_reason,
    })
}

fn format_api_error(status: StatusCode, text: &str) -> anyhow::Error {
    let retryable = match status.as_u16() {
        429 | 500..=599 => " [retryable]",
        _ => "",
    };
    anyhow!("gemini api error ({status}){retryable}: {text}")
}

// ============================================================
// Gemini API Types
// ============================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GeminiGenerationConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<GeminiTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_config: Option<GeminiToolConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum GeminiPart {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: GeminiBlob,
    },
    /// Function calls and other parts this client never asks for.
    Other(serde_json::Value),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiBlob {
    mime_type: String,
    data: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiTool {
    #[serde(skip_serializing_if = "Option::is_none")]
    google_maps: Option<GeminiGoogleMaps>,
}

#[derive(Debug, Clone, Serialize)]
struct GeminiGoogleMaps {}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiToolConfig {
    retrieval_config: GeminiRetrievalConfig,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRetrievalConfig {
    lat_lng: GeminiLatLng,
}

#[derive(Debug, Clone, Serialize)]
struct GeminiLatLng {
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    usage_metadata: Option<GeminiUsageMetadata>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    #[serde(default)]
    content: GeminiContent,
    #[serde(default)]
    finish_reason: Option<String>,
    #[serde(default)]
    grounding_metadata: Option<GeminiGroundingMetadata>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}
