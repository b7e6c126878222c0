//! Static city overview shown on the dashboard view.

use dhakaclean_schema::{
    CompositionSlice, DashboardAlert, DashboardSnapshot, KeyMetric, ZoneStat,
};

const COMPOSITION: [(&str, u32, &str); 5] = [
    ("Organic", 65, "#22c55e"),
    ("Plastic", 12, "#3b82f6"),
    ("Paper", 8, "#fbbf24"),
    ("Glass/Metal", 5, "#94a3b8"),
    ("Others", 10, "#ef4444"),
];

/// (zone, efficiency %, daily volume in tons)
const ZONES: [(&str, u32, u32); 6] = [
    ("Gulshan", 85, 120),
    ("Banani", 82, 90),
    ("Mirpur", 65, 350),
    ("Dhanmondi", 78, 150),
    ("Uttara", 75, 200),
    ("Old Dhaka", 55, 280),
];

pub fn sample_snapshot() -> DashboardSnapshot {
    DashboardSnapshot {
        metrics: vec![
            metric("Total Daily Waste", "6,500", Some("Tons"), "↑ 2.4% from last month"),
            metric("Recycling Rate", "34%", None, "Target: 50% by 2026"),
            metric("STS Operational", "54/60", None, "6 requiring maintenance"),
        ],
        composition: COMPOSITION
            .iter()
            .map(|(name, value, color)| CompositionSlice {
                name: name.to_string(),
                value: *value,
                color: color.to_string(),
            })
            .collect(),
        zones: ZONES
            .iter()
            .map(|(name, efficiency, volume_tons)| ZoneStat {
                name: name.to_string(),
                efficiency: *efficiency,
                volume_tons: *volume_tons,
            })
            .collect(),
        alerts: vec![DashboardAlert {
            title: "High Waste Volume Alert".into(),
            body: "Mirpur Section 12 reporting 15% above average waste generation today due to local market activity. Additional trucks dispatched.".into(),
        }],
    }
}

fn metric(label: &str, value: &str, unit: Option<&str>, note: &str) -> KeyMetric {
    KeyMetric {
        label: label.to_string(),
        value: value.to_string(),
        unit: unit.map(str::to_string),
        note: Some(note.to_string()),
    }
}

pub fn composition_total(snapshot: &DashboardSnapshot) -> u32 {
    snapshot.composition.iter().map(|s| s.value).sum()
}

pub fn least_efficient_zone(snapshot: &DashboardSnapshot) -> Option<&ZoneStat> {
    snapshot.zones.iter().min_by_key(|z| z.efficiency)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composition_sums_to_one_hundred() {
        assert_eq!(composition_total(&sample_snapshot()), 100);
    }

    #[test]
    fn old_dhaka_is_least_efficient() {
        let snapshot = sample_snapshot();
        let zone = least_efficient_zone(&snapshot).unwrap();
        assert_eq!(zone.name, "Old Dhaka");
        assert_eq!(zone.volume_tons, 280);
    }

    #[test]
    fn snapshot_carries_mirpur_alert_and_metrics() {
        let snapshot = sample_snapshot();
        assert_eq!(snapshot.metrics.len(), 3);
        assert_eq!(snapshot.metrics[0].unit.as_deref(), Some("Tons"));
        assert!(snapshot.alerts[0].body.starts_with("Mirpur Section 12"));
        assert_eq!(snapshot.zones.len(), 6);
    }

    #[test]
    fn least_efficient_of_empty_is_none() {
        let mut snapshot = sample_snapshot();
        snapshot.zones.clear();
        assert!(least_efficient_zone(&snapshot).is_none());
    }
}
