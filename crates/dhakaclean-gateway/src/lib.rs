//! Fail-soft front door to the generative model.
//!
//! Every operation makes exactly one remote attempt. Failures are logged here
//! and converted into a renderable value, so callers never see an error.

pub mod prompts;

use std::sync::Arc;

use anyhow::{anyhow, Result};
use dhakaclean_provider::{
    GenerateRequest, GenerateResponse, GenerativeModel, Part, ResponseFormat, Turn, TurnRole,
    DEFAULT_MODEL,
};
use dhakaclean_schema::*;
use serde_json::json;

use crate::prompts::*;

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub model: String,
    pub classify_temperature: f32,
    pub analysis_instruction: String,
    pub chat_instruction: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            classify_temperature: 0.4,
            analysis_instruction: WASTE_ANALYSIS_SYSTEM_INSTRUCTION.to_string(),
            chat_instruction: CHAT_SYSTEM_INSTRUCTION.to_string(),
        }
    }
}

impl GatewayConfig {
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

pub struct AiGateway {
    model: Arc<dyn GenerativeModel>,
    config: GatewayConfig,
}

impl AiGateway {
    pub fn new(model: Arc<dyn GenerativeModel>, config: GatewayConfig) -> Self {
        Self { model, config }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub async fn classify_waste(&self, image: &CapturedImage) -> WasteAnalysisResult {
        match self.try_classify(image).await {
            Ok(result) => {
                tracing::info!(
                    category = %result.category,
                    confidence = result.confidence,
                    "waste classified"
                );
                result
            }
            Err(err) => {
                tracing::error!("Error analyzing waste: {err:#}");
                WasteAnalysisResult::fallback()
            }
        }
    }

    pub async fn converse(&self, history: &[ChatMessage], message: &str) -> String {
        match self.try_converse(history, message).await {
            Ok(text) => text,
            Err(err) => {
                tracing::error!("Chat error: {err:#}");
                CHAT_FALLBACK_REPLY.to_string()
            }
        }
    }

    pub async fn find_nearby(
        &self,
        query: &str,
        location: Option<GeolocationSample>,
    ) -> NearbyResult {
        match self.try_find_nearby(query, location).await {
            Ok(result) => result,
            Err(err) => {
                tracing::error!("Maps grounding error: {err:#}");
                NearbyResult {
                    text: NEARBY_FALLBACK_REPLY.to_string(),
                    chunks: vec![],
                }
            }
        }
    }

    async fn generate(
        &self,
        operation: &'static str,
        request: GenerateRequest,
    ) -> Result<GenerateResponse> {
        let response = self.model.generate(request).await?;
        tracing::debug!(
            operation,
            input_tokens = ?response.input_tokens,
            output_tokens = ?response.output_tokens,
            stop_reason = ?response.stop_reason,
            "model call finished"
        );
        Ok(response)
    }

    async fn try_classify(&self, image: &CapturedImage) -> Result<WasteAnalysisResult> {
        let turn = Turn {
            role: TurnRole::User,
            parts: vec![
                Part::InlineData {
                    mime_type: image.mime_type.clone(),
                    data: image.data.clone(),
                },
                Part::Text(WASTE_ANALYSIS_PROMPT.to_string()),
            ],
        };
        let request = GenerateRequest::new(self.config.model.clone(), vec![turn])
            .with_system(self.config.analysis_instruction.clone())
            .with_response_format(ResponseFormat::json(waste_analysis_schema()))
            .with_temperature(self.config.classify_temperature);

        let response = self.generate("classify", request).await?;
        parse_analysis(&response.text)
    }

    async fn try_converse(&self, history: &[ChatMessage], message: &str) -> Result<String> {
        let mut contents: Vec<Turn> = history
            .iter()
            .map(|m| match m.role {
                ChatRole::User => Turn::user(m.text.clone()),
                ChatRole::Assistant => Turn::model(m.text.clone()),
            })
            .collect();
        contents.push(Turn::user(message));

        let request = GenerateRequest::new(self.config.model.clone(), contents)
            .with_system(self.config.chat_instruction.clone());

        let response = self.generate("converse", request).await?;
        if response.text.trim().is_empty() {
            return Err(anyhow!("no response text from model"));
        }
        Ok(response.text)
    }

    async fn try_find_nearby(
        &self,
        query: &str,
        location: Option<GeolocationSample>,
    ) -> Result<NearbyResult> {
        let request = GenerateRequest::new(
            self.config.model.clone(),
            vec![Turn::user(nearby_prompt(query))],
        )
        .with_maps_grounding(location);

        let response = self.generate("find_nearby", request).await?;
        Ok(NearbyResult {
            text: response.text,
            chunks: response.grounding_chunks,
        })
    }
}

/// Response shape the classifier must answer with.
pub fn waste_analysis_schema() -> serde_json::Value {
    let categories: Vec<&str> = WasteCategory::ALL.iter().map(|c| c.as_str()).collect();
    let potentials: Vec<&str> = RecyclingPotential::ALL.iter().map(|p| p.as_str()).collect();
    json!({
        "type": "OBJECT",
        "properties": {
            "category": {
                "type": "STRING",
                "enum": categories,
                "description": "The primary category of the waste detected."
            },
            "confidence": {
                "type": "NUMBER",
                "description": "Confidence score between 0 and 100."
            },
            "description": {
                "type": "STRING",
                "description": "A short physical description of the item."
            },
            "disposalAdvice": {
                "type": "STRING",
                "description": "Specific instructions on how to dispose of this in Dhaka (e.g., 'Green bin for composting', 'Give to Tokai/local collector')."
            },
            "recyclingPotential": {
                "type": "STRING",
                "enum": potentials,
                "description": "The potential for this item to be recycled."
            },
            "estimatedDecompositionTime": {
                "type": "STRING",
                "description": "Estimated time to decompose in a landfill."
            }
        },
        "required": [
            "category",
            "confidence",
            "description",
            "disposalAdvice",
            "recyclingPotential",
            "estimatedDecompositionTime"
        ]
    })
}

fn parse_analysis(text: &str) -> Result<WasteAnalysisResult> {
    let body = strip_code_fence(text.trim());
    if body.is_empty() {
        return Err(anyhow!("no response text from model"));
    }
    let mut result: WasteAnalysisResult = serde_json::from_str(body)?;
    if !result.confidence.is_finite() {
        return Err(anyhow!("confidence is not a number"));
    }
    result.confidence = result.confidence.clamp(0.0, 100.0);
    Ok(result)
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
