//! Global Application State
//!
//! Reactive state management using Leptos signals. The signals mirror the
//! server's dashboard view; they are filled once over HTTP and then kept
//! current by WebSocket updates.

use leptos::*;
use serde::Deserialize;

pub const LOAD_COUNT: usize = 4;

/// One live telemetry tile, values already formatted by the server
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct Tile {
    pub load: u8,
    pub voltage: String,
    pub current: String,
    pub power: String,
    pub energy: String,
}

/// Timer form as last confirmed by the server
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct TimerForm {
    pub selected_load: u8,
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

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct Dataset {
    pub label: String,
    pub data: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct Chart {
    pub title: String,
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
    #[serde(default)]
    pub revision: u64,
}

impl Chart {
    /// Dataset values as numbers; unparseable entries count as zero
    pub fn values(&self) -> Vec<Vec<f64>> {
        self.datasets
            .iter()
            .map(|ds| ds.data.iter().map(|v| v.parse().unwrap_or(0.0)).collect())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// The three usage charts
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct UsageCharts {
    pub daily: Chart,
    pub weekly: Chart,
    pub monthly: Chart,
}

impl UsageCharts {
    pub fn get(&self, period: &str) -> Option<&Chart> {
        match period {
            "daily" => Some(&self.daily),
            "weekly" => Some(&self.weekly),
            "monthly" => Some(&self.monthly),
            _ => None,
        }
    }

    /// Replace one chart; returns false for an unknown period
    pub fn set(&mut self, period: &str, chart: Chart) -> bool {
        let slot = match period {
            "daily" => &mut self.daily,
            "weekly" => &mut self.weekly,
            "monthly" => &mut self.monthly,
            _ => return false,
        };
        *slot = chart;
        true
    }
}

/// `GET /dashboard` body
#[derive(Clone, Debug, Deserialize)]
pub struct DashboardSnapshot {
    pub relays: [bool; LOAD_COUNT],
    pub timer_form: TimerForm,
    pub tiles: Vec<Tile>,
    pub notifications: Vec<String>,
    pub charts: UsageCharts,
    pub timer_presets: Vec<u32>,
}

/// Global application state provided to all components
#[derive(Clone, Copy)]
pub struct GlobalState {
    pub relays: RwSignal<[bool; LOAD_COUNT]>,
    pub timer_form: RwSignal<TimerForm>,
    pub timer_presets: RwSignal<Vec<u32>>,
    pub tiles: RwSignal<Vec<Tile>>,
    pub notifications: RwSignal<Vec<String>>,
    pub charts: RwSignal<UsageCharts>,
    /// WebSocket connection status
    pub ws_connected: RwSignal<bool>,
    /// Time of the last view update, epoch millis
    pub last_sync: RwSignal<Option<i64>>,
    pub loading: RwSignal<bool>,
    pub error: RwSignal<Option<String>>,
    pub success: RwSignal<Option<String>>,
}

/// Provide global state to the component tree
pub fn provide_global_state() {
    let state = GlobalState {
        relays: create_rw_signal([false; LOAD_COUNT]),
        timer_form: create_rw_signal(TimerForm::default()),
        timer_presets: create_rw_signal(vec![15, 30, 60, 120]),
        tiles: create_rw_signal(Vec::new()),
        notifications: create_rw_signal(Vec::new()),
        charts: create_rw_signal(UsageCharts::default()),
        ws_connected: create_rw_signal(false),
        last_sync: create_rw_signal(None),
        loading: create_rw_signal(false),
        error: create_rw_signal(None),
        success: create_rw_signal(None),
    };

    provide_context(state);
}

impl GlobalState {
    /// Overwrite every widget from a full view
    pub fn apply_snapshot(&self, snapshot: DashboardSnapshot) {
        self.relays.set(snapshot.relays);
        self.timer_form.set(snapshot.timer_form);
        self.timer_presets.set(snapshot.timer_presets);
        self.tiles.set(snapshot.tiles);
        self.notifications.set(snapshot.notifications);
        self.charts.set(snapshot.charts);
        self.touch();
    }

    /// Record that the view just changed
    pub fn touch(&self) {
        self.last_sync.set(Some(chrono::Utc::now().timestamp_millis()));
    }

    /// Show a success message (auto-clears after timeout)
    pub fn show_success(&self, message: &str) {
        self.success.set(Some(message.to_string()));

        let success_signal = self.success;
        gloo_timers::callback::Timeout::new(3000, move || {
            success_signal.set(None);
        })
        .forget();
    }

    /// Show an error message (auto-clears after timeout)
    pub fn show_error(&self, message: &str) {
        self.error.set(Some(message.to_string()));

        let error_signal = self.error;
        gloo_timers::callback::Timeout::new(5000, move || {
            error_signal.set(None);
        })
        .forget();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chart_values_tolerate_bad_entries() {
        let chart = Chart {
            title: "Daily Usage (Wh)".to_string(),
            labels: vec!["d1".to_string(), "d2".to_string()],
            datasets: vec![Dataset {
                label: "Load 1".to_string(),
                data: vec!["1.50".to_string(), "NaN".to_string(), "x".to_string()],
            }],
            revision: 1,
        };
        let values = chart.values();
        assert_eq!(values[0][0], 1.5);
        assert!(values[0][1].is_nan());
        assert_eq!(values[0][2], 0.0);
    }

    #[test]
    fn test_usage_charts_set() {
        let mut charts = UsageCharts::default();
        let chart = Chart {
            title: "Weekly Usage (Wh)".to_string(),
            revision: 3,
            ..Chart::default()
        };
        assert!(charts.set("weekly", chart.clone()));
        assert_eq!(charts.get("weekly"), Some(&chart));
        assert!(!charts.set("hourly", chart));
        assert_eq!(charts.get("hourly"), None);
    }

    #[test]
    fn test_snapshot_ignores_range_chart() {
        let body = r#"{
            "relays": [true, false, false, true],
            "timer_form": {"selected_load": 2, "minutes": "30"},
            "tiles": [{"load": 1, "voltage": "230.00 V", "current": "0.43 A", "power": "99.10 W", "energy": "1520.40 Wh"}],
            "notifications": ["Load 2 timer expired"],
            "charts": {
                "daily": {"kind": "bar", "title": "Daily Usage (Wh)", "labels": [], "datasets": [], "revision": 0},
                "weekly": {"kind": "bar", "title": "Weekly Usage (Wh)", "labels": [], "datasets": [], "revision": 0},
                "monthly": {"kind": "bar", "title": "Monthly Usage (Wh)", "labels": [], "datasets": [], "revision": 0}
            },
            "range_chart": {"kind": "line", "title": "Usage", "labels": [], "datasets": [], "revision": 0},
            "timer_presets": [15, 30, 60, 120]
        }"#;
        let snapshot: DashboardSnapshot = serde_json::from_str(body).unwrap();
        assert_eq!(snapshot.relays, [true, false, false, true]);
        assert_eq!(snapshot.timer_form.minutes, "30");
        assert_eq!(snapshot.tiles[0].power, "99.10 W");
        assert_eq!(snapshot.charts.monthly.title, "Monthly Usage (Wh)");
        assert_eq!(snapshot.timer_presets.len(), 4);
    }
}
