//! Pure render functions: store snapshot in, widget content out.
//!
//! None of these touch the store or the view; the controller applies their
//! output. That keeps every rendering rule testable with plain JSON.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::charts::ChartSeries;
use super::model::{LoadId, LoadReading, LOAD_COUNT};
use super::numeric::{coerce_number, is_truthy, to_fixed};

/// Checkbox state for every relay from a `relays` snapshot
pub fn relay_states(relays: &Value) -> [bool; LOAD_COUNT] {
    let mut states = [false; LOAD_COUNT];
    for id in LoadId::all() {
        states[id.index()] = is_truthy(relays.get(id.relay_key()));
    }
    states
}

/// Text content of one live tile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileView {
    pub load: u8,
    pub voltage: String,
    pub current: String,
    pub power: String,
    pub energy: String,
}

impl TileView {
    /// A freshly created tile, before any snapshot arrived
    pub fn initial(id: LoadId) -> Self {
        Self {
            load: id.number(),
            voltage: "0 V".to_string(),
            current: "0 A".to_string(),
            power: "0 W".to_string(),
            energy: "0 Wh".to_string(),
        }
    }

    pub fn from_reading(id: LoadId, reading: &LoadReading) -> Self {
        Self {
            load: id.number(),
            voltage: format!("{} V", to_fixed(reading.voltage, 2)),
            current: format!("{} A", to_fixed(reading.current, 3)),
            power: format!("{} W", to_fixed(reading.power, 2)),
            energy: format!("{} Wh", to_fixed(reading.energy, 2)),
        }
    }
}

/// The four tiles as first shown
pub fn initial_tiles() -> Vec<TileView> {
    LoadId::all().map(TileView::initial).collect()
}

/// Full redraw of all four tiles from a `loads` snapshot
pub fn render_tiles(loads: &Value) -> Vec<TileView> {
    let readings = LoadReading::all_from_snapshot(loads);
    LoadId::all()
        .map(|id| TileView::from_reading(id, &readings[id.index()]))
        .collect()
}

/// Text of one notification entry
pub fn notification_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => match n.as_f64() {
            // Integral floats print without a fraction, as a browser would
            Some(f) if n.is_f64() && f == 0.0 => "0".to_string(),
            Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e21 => format!("{:.0}", f),
            _ => n.to_string(),
        },
        other => other.to_string(),
    }
}

/// Chart content from a `logs/<period>` snapshot.
///
/// Returns `None` for an empty snapshot; the chart keeps what it had.
/// Labels keep the store's key order.
pub fn chart_series(log: &Value) -> Option<ChartSeries> {
    let Value::Object(periods) = log else {
        return None;
    };

    let labels: Vec<String> = periods.keys().cloned().collect();
    let mut data: [Vec<String>; LOAD_COUNT] = Default::default();

    for id in LoadId::all() {
        data[id.index()] = labels
            .iter()
            .map(|label| {
                let energy = periods
                    .get(label)
                    .and_then(|entry| entry.get(id.load_key()))
                    .and_then(|load| load.get("energy"));
                to_fixed(coerce_number(energy), 2)
            })
            .collect();
    }

    Some(ChartSeries { labels, data })
}

/// One line of the snapshot report for a load
pub fn report_line(id: LoadId, reading: &LoadReading) -> String {
    format!(
        "Load {}: V={}V  I={}A  P={}W  E={}Wh",
        id.number(),
        to_fixed(reading.voltage, 2),
        to_fixed(reading.current, 3),
        to_fixed(reading.power, 2),
        to_fixed(reading.energy, 2),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_relay_states() {
        let states = relay_states(&json!({"relay1": true, "relay3": 1, "relay4": false}));
        assert_eq!(states, [true, false, true, false]);
        assert_eq!(relay_states(&Value::Null), [false; 4]);
    }

    #[test]
    fn test_initial_tiles() {
        let tiles = initial_tiles();
        assert_eq!(tiles.len(), 4);
        assert_eq!(tiles[2].load, 3);
        assert_eq!(tiles[2].voltage, "0 V");
        assert_eq!(tiles[2].energy, "0 Wh");
    }

    #[test]
    fn test_render_tiles_formats_precision() {
        let tiles = render_tiles(&json!({
            "load1": {"voltage": 229.456, "current": 0.12345, "power": 28.3, "energy": 1500}
        }));
        assert_eq!(tiles[0].voltage, "229.46 V");
        assert_eq!(tiles[0].current, "0.123 A");
        assert_eq!(tiles[0].power, "28.30 W");
        assert_eq!(tiles[0].energy, "1500.00 Wh");
    }

    #[test]
    fn test_render_tiles_missing_fields_are_zero() {
        let tiles = render_tiles(&json!({"load2": {"voltage": "NaN", "current": "abc"}}));
        for tile in &tiles {
            assert_eq!(tile.voltage, "0.00 V");
            assert_eq!(tile.current, "0.000 A");
            assert_eq!(tile.power, "0.00 W");
            assert_eq!(tile.energy, "0.00 Wh");
        }

        let tiles = render_tiles(&Value::Null);
        assert_eq!(tiles[3].current, "0.000 A");
    }

    #[test]
    fn test_notification_text() {
        assert_eq!(notification_text(&json!("Load 1 limit reached")), "Load 1 limit reached");
        assert_eq!(notification_text(&json!(42)), "42");
        assert_eq!(notification_text(&json!(42.0)), "42");
        assert_eq!(notification_text(&json!(1.5)), "1.5");
        assert_eq!(notification_text(&json!(1e20)), "100000000000000000000");
        assert_eq!(notification_text(&json!(-3e19)), "-30000000000000000000");
        assert_eq!(notification_text(&json!(-0.0)), "0");
        assert_eq!(notification_text(&Value::Null), "");
        assert_eq!(notification_text(&json!(true)), "true");
    }

    #[test]
    fn test_chart_series_from_log() {
        let series = chart_series(&json!({
            "2024-01-01": {"load1": {"energy": 5}, "load2": {"energy": "x"}}
        }))
        .unwrap();

        assert_eq!(series.labels, vec!["2024-01-01"]);
        assert_eq!(series.data[0], vec!["5.00"]);
        assert_eq!(series.data[1], vec!["0.00"]);
        assert_eq!(series.data[2], vec!["0.00"]);
        assert_eq!(series.data[3], vec!["0.00"]);
    }

    #[test]
    fn test_chart_series_keeps_store_order_and_aligns_labels() {
        let series = chart_series(&json!({
            "2024-01-01": {"load4": {"energy": 1.234}},
            "2024-01-02": {"load4": {"energy": 2}, "load1": {"energy": 0.5}}
        }))
        .unwrap();

        assert_eq!(series.labels, vec!["2024-01-01", "2024-01-02"]);
        assert_eq!(series.data[0], vec!["0.00", "0.50"]);
        assert_eq!(series.data[3], vec!["1.23", "2.00"]);
    }

    #[test]
    fn test_chart_series_empty_snapshot_is_ignored() {
        assert!(chart_series(&Value::Null).is_none());
        assert!(chart_series(&json!(3)).is_none());
    }

    #[test]
    fn test_report_line_all_missing() {
        let id = LoadId::new(1).unwrap();
        assert_eq!(
            report_line(id, &LoadReading::default()),
            "Load 1: V=0.00V  I=0.000A  P=0.00W  E=0.00Wh"
        );
    }
}
