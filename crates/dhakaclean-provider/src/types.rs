use dhakaclean_schema::{GeolocationSample, GroundingChunk};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnRole {
    User,
    Model,
}

impl TurnRole {
    pub fn as_str(self) -> &'static str {
        match self {
            TurnRole::User => "user",
            TurnRole::Model => "model",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Part {
    Text(String),
    /// Base64 payload with its mime type
    InlineData { mime_type: String, data: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Turn {
    pub role: TurnRole,
    pub parts: Vec<Part>,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            parts: vec![Part::Text(text.into())],
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Model,
            parts: vec![Part::Text(text.into())],
        }
    }

    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|p| match p {
                Part::Text(t) => Some(t.as_str()),
                Part::InlineData { .. } => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Constrains the reply to a structured document.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseFormat {
    pub mime_type: String,
    pub schema: serde_json::Value,
}

impl ResponseFormat {
    pub fn json(schema: serde_json::Value) -> Self {
        Self {
            mime_type: "application/json".to_string(),
            schema,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerateRequest {
    pub model: String,
    pub system: Option<String>,
    pub contents: Vec<Turn>,
    pub temperature: Option<f32>,
    pub response_format: Option<ResponseFormat>,
    /// Enables the maps grounding tool
    pub maps_grounding: bool,
    /// Bias for maps grounding; ignored without it
    pub location_bias: Option<GeolocationSample>,
}

impl GenerateRequest {
    pub fn new(model: impl Into<String>, contents: Vec<Turn>) -> Self {
        Self {
            model: model.into(),
            system: None,
            contents,
            temperature: None,
            response_format: None,
            maps_grounding: false,
            location_bias: None,
        }
    }

    pub fn simple(model: impl Into<String>, system: Option<String>, text: impl Into<String>) -> Self {
        let mut req = Self::new(model, vec![Turn::user(text)]);
        req.system = system;
        req
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_response_format(mut self, format: ResponseFormat) -> Self {
        self.response_format = Some(format);
        self
    }

    pub fn with_maps_grounding(mut self, bias: Option<GeolocationSample>) -> Self {
        self.maps_grounding = true;
        self.location_bias = bias;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerateResponse {
    pub text: String,
    pub grounding_chunks: Vec<GroundingChunk>,
    pub input_tokens: Option<u32>,
    pub output_tokens: Option<u32>,
    pub stop_reason: Option<String>,
}
