//! Plain-text rendering for terminal output.

use std::fmt::Write;

use dhakaclean_core::dashboard::{composition_total, least_efficient_zone};
use dhakaclean_schema::{DashboardSnapshot, WasteAnalysisResult};

pub fn analysis(result: &WasteAnalysisResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} ({}% confidence)", result.category, result.rounded_confidence());
    if !result.is_high_confidence() {
        let _ = writeln!(out, "  low confidence, double-check before disposal");
    }
    let _ = writeln!(out, "  {}", result.description);
    let _ = writeln!(out, "  Disposal:      {}", result.disposal_advice);
    let _ = writeln!(out, "  Recycling:     {}", result.recycling_potential);
    let _ = writeln!(out, "  Decomposition: {}", result.estimated_decomposition_time);
    out
}

pub fn dashboard(snapshot: &DashboardSnapshot) -> String {
    let mut out = String::new();

    for metric in &snapshot.metrics {
        let value = match &metric.unit {
            Some(unit) => format!("{} {unit}", metric.value),
            None => metric.value.clone(),
        };
        let _ = write!(out, "{:<20} {value:>12}", metric.label);
        if let Some(note) = &metric.note {
            let _ = write!(out, "  ({note})");
        }
        out.push('\n');
    }

    let _ = writeln!(out, "\nWaste composition ({}%)", composition_total(snapshot));
    for slice in &snapshot.composition {
        let _ = writeln!(out, "  {:<12} {:>3}%", slice.name, slice.value);
    }

    let _ = writeln!(out, "\n{:<12} {:>10} {:>12}", "Zone", "Efficiency", "Volume (t)");
    for zone in &snapshot.zones {
        let _ = writeln!(
            out,
            "{:<12} {:>9}% {:>12}",
            zone.name, zone.efficiency, zone.volume_tons
        );
    }
    if let Some(zone) = least_efficient_zone(snapshot) {
        let _ = writeln!(out, "Lowest efficiency: {} ({}%)", zone.name, zone.efficiency);
    }

    for alert in &snapshot.alerts {
        let _ = writeln!(out, "\n! {}\n  {}", alert.title, alert.body);
    }
    out
}
