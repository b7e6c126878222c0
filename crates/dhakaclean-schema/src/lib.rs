pub mod dashboard;
pub mod grounding;

pub use dashboard::*;
pub use grounding::*;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Fixed waste classes the classifier may answer with.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum WasteCategory {
    #[serde(rename = "Organic")]
    Organic,
    #[serde(rename = "Recyclable (Plastic)")]
    RecyclablePlastic,
    #[serde(rename = "Recyclable (Paper)")]
    RecyclablePaper,
    #[serde(rename = "Recyclable (Glass)")]
    RecyclableGlass,
    #[serde(rename = "Recyclable (Metal)")]
    RecyclableMetal,
    #[serde(rename = "Hazardous")]
    Hazardous,
    #[serde(rename = "E-Waste")]
    EWaste,
    #[serde(rename = "General Waste")]
    General,
    #[serde(rename = "Unknown")]
    Unknown,
}

/// Badge grouping used by the scanner result card.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CategoryGroup {
    Organic,
    Recyclable,
    Hazardous,
    Neutral,
}

impl WasteCategory {
    pub const ALL: [WasteCategory; 9] = [
        WasteCategory::Organic,
        WasteCategory::RecyclablePlastic,
        WasteCategory::RecyclablePaper,
        WasteCategory::RecyclableGlass,
        WasteCategory::RecyclableMetal,
        WasteCategory::Hazardous,
        WasteCategory::EWaste,
        WasteCategory::General,
        WasteCategory::Unknown,
    ];

    /// Wire name, identical to the serde representation.
    pub fn as_str(self) -> &'static str {
        match self {
            WasteCategory::Organic => "Organic",
            WasteCategory::RecyclablePlastic => "Recyclable (Plastic)",
            WasteCategory::RecyclablePaper => "Recyclable (Paper)",
            WasteCategory::RecyclableGlass => "Recyclable (Glass)",
            WasteCategory::RecyclableMetal => "Recyclable (Metal)",
            WasteCategory::Hazardous => "Hazardous",
            WasteCategory::EWaste => "E-Waste",
            WasteCategory::General => "General Waste",
            WasteCategory::Unknown => "Unknown",
        }
    }

    pub fn color_group(self) -> CategoryGroup {
        match self {
            WasteCategory::Organic => CategoryGroup::Organic,
            WasteCategory::RecyclablePlastic
            | WasteCategory::RecyclablePaper
            | WasteCategory::RecyclableGlass
            | WasteCategory::RecyclableMetal => CategoryGroup::Recyclable,
            WasteCategory::Hazardous | WasteCategory::EWaste => CategoryGroup::Hazardous,
            WasteCategory::General | WasteCategory::Unknown => CategoryGroup::Neutral,
        }
    }
}

impl std::fmt::Display for WasteCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RecyclingPotential {
    High,
    Medium,
    Low,
    None,
}

impl RecyclingPotential {
    pub const ALL: [RecyclingPotential; 4] = [
        RecyclingPotential::High,
        RecyclingPotential::Medium,
        RecyclingPotential::Low,
        RecyclingPotential::None,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RecyclingPotential::High => "High",
            RecyclingPotential::Medium => "Medium",
            RecyclingPotential::Low => "Low",
            RecyclingPotential::None => "None",
        }
    }
}

impl std::fmt::Display for RecyclingPotential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured classifier verdict for one captured image.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WasteAnalysisResult {
    pub category: WasteCategory,
    /// 0..=100
    pub confidence: f64,
    pub description: String,
    pub disposal_advice: String,
    pub recycling_potential: RecyclingPotential,
    pub estimated_decomposition_time: String,
}

impl WasteAnalysisResult {
    /// Result reported when classification could not be completed.
    pub fn fallback() -> Self {
        Self {
            category: WasteCategory::Unknown,
            confidence: 0.0,
            description: "Could not analyze image.".to_string(),
            disposal_advice: "Please try again or dispose of in general waste if unsure."
                .to_string(),
            recycling_potential: RecyclingPotential::None,
            estimated_decomposition_time: "Unknown".to_string(),
        }
    }

    pub fn is_high_confidence(&self) -> bool {
        self.confidence > 80.0
    }

    pub fn rounded_confidence(&self) -> u8 {
        self.confidence.clamp(0.0, 100.0).round() as u8
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub id: String,
    pub role: ChatRole,
    pub text: String,
    /// Epoch millis
    pub timestamp: i64,
}

impl ChatMessage {
    pub fn new(role: ChatRole, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            text: text.into(),
            timestamp: Utc::now().timestamp_millis(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(ChatRole::User, text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(ChatRole::Assistant, text)
    }
}

/// Encoded still image, held between capture and analysis.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CapturedImage {
    pub mime_type: String,
    /// Base64, no data-URL prefix
    pub data: String,
}

impl CapturedImage {
    pub fn new(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}

/// Raw RGB8 video frame as delivered by a camera stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GeolocationSample {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AppView {
    #[default]
    Scanner,
    Dashboard,
    Chat,
}

impl AppView {
    pub const ALL: [AppView; 3] = [AppView::Scanner, AppView::Dashboard, AppView::Chat];

    pub fn label(self) -> &'static str {
        match self {
            AppView::Scanner => "Scanner",
            AppView::Dashboard => "City Data",
            AppView::Chat => "Assistant",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_wire_names_match_serde() {
        for category in WasteCategory::ALL {
            let json = serde_json::to_string(&category).unwrap();
            assert_eq!(json, format!("\"{}\"", category.as_str()));
        }
    }

    #[test]
    fn category_groups() {
        assert_eq!(WasteCategory::Organic.color_group(), CategoryGroup::Organic);
        assert_eq!(
            WasteCategory::RecyclableGlass.color_group(),
            CategoryGroup::Recyclable
        );
        assert_eq!(WasteCategory::EWaste.color_group(), CategoryGroup::Hazardous);
        assert_eq!(WasteCategory::Unknown.color_group(), CategoryGroup::Neutral);
    }

    #[test]
    fn analysis_result_parses_model_reply() {
        let raw = r#"{
            "category": "Recyclable (Plastic)",
            "confidence": 92,
            "description": "A clear PET bottle.",
            "disposalAdvice": "Rinse and give to a local collector.",
            "recyclingPotential": "High",
            "estimatedDecompositionTime": "450 years"
        }"#;
        let result: WasteAnalysisResult = serde_json::from_str(raw).unwrap();
        assert_eq!(result.category, WasteCategory::RecyclablePlastic);
        assert_eq!(result.recycling_potential, RecyclingPotential::High);
        assert!(result.is_high_confidence());
        assert_eq!(result.rounded_confidence(), 92);
    }

    #[test]
    fn fallback_is_unknown_with_zero_confidence() {
        let result = WasteAnalysisResult::fallback();
        assert_eq!(result.category, WasteCategory::Unknown);
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.recycling_potential, RecyclingPotential::None);
        assert!(!result.is_high_confidence());
    }

    #[test]
    fn chat_messages_get_distinct_ids() {
        let a = ChatMessage::user("hi");
        let b = ChatMessage::assistant("hello");
        assert_ne!(a.id, b.id);
        assert_eq!(a.role, ChatRole::User);
        assert_eq!(b.role, ChatRole::Assistant);
    }

    #[test]
    fn captured_image_data_url() {
        let image = CapturedImage::new("image/jpeg", "AAAA");
        assert_eq!(image.data_url(), "data:image/jpeg;base64,AAAA");
    }

    #[test]
    fn default_view_is_scanner() {
        assert_eq!(AppView::default(), AppView::Scanner);
        let parsed: AppView = serde_json::from_str("\"chat\"").unwrap();
        assert_eq!(parsed, AppView::Chat);
    }
}
