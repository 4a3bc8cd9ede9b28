//! Dashboard view model
//!
//! The render target the controller writes into. It mirrors the widgets on
//! the page: relay checkboxes, the timer form, live tiles, the notification
//! list and the charts.

use serde::{Deserialize, Serialize};

use super::charts::{ChartView, UsageCharts};
use super::model::{LogPeriod, LOAD_COUNT};
use super::render::{initial_tiles, TileView};

/// Shared timer form: load selector plus minute field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerForm {
    pub selected_load: u8,
    /// Raw field text; parsed only when the timer is applied
    pub minutes: String,
}

impl Default for TimerForm {
    fn default() -> Self {
        Self {
            selected_load: 1,
            minutes: String::new(),
        }
    }
}

/// Everything currently shown on the dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardView {
    pub relays: [bool; LOAD_COUNT],
    pub timer_form: TimerForm,
    pub tiles: Vec<TileView>,
    pub notifications: Vec<String>,
    pub charts: UsageCharts,
    pub range_chart: ChartView,
    /// Bumped once per applied [`ViewUpdate`]
    #[serde(default)]
    pub revision: u64,
}

impl Default for DashboardView {
    fn default() -> Self {
        Self {
            relays: [false; LOAD_COUNT],
            timer_form: TimerForm::default(),
            tiles: initial_tiles(),
            notifications: Vec::new(),
            charts: UsageCharts::default(),
            range_chart: ChartView::range(),
            revision: 0,
        }
    }
}

/// A change to the view, pushed to live clients
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ViewUpdate {
    /// Relay checkboxes re-applied from a snapshot
    Relays { states: [bool; LOAD_COUNT] },
    /// All four tiles redrawn
    Tiles { tiles: Vec<TileView> },
    /// One notification appended
    Notification { text: String },
    /// One usage chart redrawn
    Chart { period: LogPeriod, chart: ChartView },
}

/// A [`ViewUpdate`] stamped with the view revision it produced
#[derive(Debug, Clone, PartialEq)]
pub struct ViewChange {
    pub revision: u64,
    pub update: ViewUpdate,
}

impl ViewUpdate {
    /// Topic live clients subscribe to for this update
    pub fn topic(&self) -> String {
        match self {
            ViewUpdate::Relays { .. } => "relays".to_string(),
            ViewUpdate::Tiles { .. } => "loads".to_string(),
            ViewUpdate::Notification { .. } => "notifications".to_string(),
            ViewUpdate::Chart { period, .. } => format!("charts.{}", period.key()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_view() {
        let view = DashboardView::default();
        assert_eq!(view.relays, [false; 4]);
        assert_eq!(view.tiles.len(), 4);
        assert!(view.notifications.is_empty());
        assert_eq!(view.timer_form.selected_load, 1);
        assert_eq!(view.charts.get(LogPeriod::Weekly).title, "Weekly Usage (Wh)");
    }

    #[test]
    fn test_update_topics() {
        let update = ViewUpdate::Chart {
            period: LogPeriod::Monthly,
            chart: ChartView::usage(LogPeriod::Monthly),
        };
        assert_eq!(update.topic(), "charts.monthly");
        assert_eq!(ViewUpdate::Relays { states: [false; 4] }.topic(), "relays");
    }

    #[test]
    fn test_update_serialization() {
        let update = ViewUpdate::Notification {
            text: "Load 2 timer expired".to_string(),
        };
        let json = serde_json::to_string(&update).unwrap();
        assert!(json.contains("\"type\":\"notification\""));
        assert!(json.contains("\"text\":\"Load 2 timer expired\""));
    }
}
