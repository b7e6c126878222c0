//! Location-grounding records returned alongside nearby-search replies.

use serde::{Deserialize, Serialize};

/// One `web` or `maps` entry of a grounding chunk. Every field may be absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct GroundingLink {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Raw citation record as the model reports it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct GroundingChunk {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web: Option<GroundingLink>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maps: Option<GroundingLink>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Citation {
    Web { uri: String, title: Option<String> },
    Maps { uri: String, title: Option<String> },
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

impl GroundingChunk {
    pub fn web(uri: impl Into<String>, title: Option<&str>) -> Self {
        Self {
            web: Some(GroundingLink {
                uri: Some(uri.into()),
                title: title.map(str::to_string),
            }),
            maps: None,
        }
    }

    pub fn maps(uri: impl Into<String>, title: Option<&str>) -> Self {
        Self {
            web: None,
            maps: Some(GroundingLink {
                uri: Some(uri.into()),
                title: title.map(str::to_string),
            }),
        }
    }

    /// Web links win over map links; `None` when neither carries a URI.
    pub fn citation(&self) -> Option<Citation> {
        if let Some(link) = &self.web {
            if let Some(uri) = non_empty(&link.uri) {
                return Some(Citation::Web {
                    uri: uri.to_string(),
                    title: non_empty(&link.title).map(str::to_string),
                });
            }
        }
        if let Some(link) = &self.maps {
            if let Some(uri) = non_empty(&link.uri) {
                return Some(Citation::Maps {
                    uri: uri.to_string(),
                    title: non_empty(&link.title).map(str::to_string),
                });
            }
        }
        None
    }
}

impl Citation {
    pub fn uri(&self) -> &str {
        match self {
            Citation::Web { uri, .. } | Citation::Maps { uri, .. } => uri,
        }
    }

    /// Title to display, substituting a generic label when the record has none.
    pub fn label(&self) -> &str {
        match self {
            Citation::Web { title, .. } => title.as_deref().unwrap_or("Link"),
            Citation::Maps { title, .. } => title.as_deref().unwrap_or("Map Location"),
        }
    }

    /// Markdown bullet line: `• [label](uri)`.
    pub fn render_line(&self) -> String {
        format!("• [{}]({})", self.label(), self.uri())
    }
}

/// Narrative reply of a nearby-collection-point search.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct NearbyResult {
    pub text: String,
    #[serde(default)]
    pub chunks: Vec<GroundingChunk>,
}

impl NearbyResult {
    pub fn citations(&self) -> Vec<Citation> {
        self.chunks.iter().filter_map(GroundingChunk::citation).collect()
    }
}
