use serde::{Deserialize, Serialize};

/// Share of the city's waste stream, in percent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompositionSlice {
    pub name: String,
    pub value: u32,
    /// Hex color used by the composition chart
    pub color: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ZoneStat {
    pub name: String,
    /// Collection efficiency, 0..=100
    pub efficiency: u32,
    pub volume_tons: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KeyMetric {
    pub label: String,
    pub value: String,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DashboardAlert {
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DashboardSnapshot {
    pub metrics: Vec<KeyMetric>,
    pub composition: Vec<CompositionSlice>,
    pub zones: Vec<ZoneStat>,
    pub alerts: Vec<DashboardAlert>,
}
