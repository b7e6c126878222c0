//! Per-message routing between general chat and nearby-point lookup.
//!
//! Plain case-insensitive substring test: "combine" and "binary" route to the
//! location path too. Clients rely on that profile, keep it as is.

use serde::Serialize;

pub const LOCATION_KEYWORDS: [&str; 5] = ["where", "nearby", "location", "center", "bin"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Route {
    Location,
    General,
}

pub fn is_location_query(text: &str) -> bool {
    let lower = text.to_lowercase();
    LOCATION_KEYWORDS.iter().any(|kw| lower.contains(kw))
}

pub fn route_message(text: &str) -> Route {
    if is_location_query(text) {
        Route::Location
    } else {
        Route::General
    }
}
