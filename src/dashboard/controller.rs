//! Dashboard Controller
//!
//! Binds user gestures to store writes and store subscriptions to the view.
//!
//! ```text
//! gesture ──► store.set(path)            (never touches the view)
//! store change ──► subscription task ──► render fn ──► view + ViewUpdate
//! ```
//!
//! The view only ever changes through subscriptions, so a relay click shows
//! up once its write echoes back from the store.

use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock, RwLockReadGuard};
use tokio::task::JoinHandle;

use super::error::{DashboardError, DashboardResult};
use super::model::{paths, LoadId, LogPeriod, LOAD_COUNT};
use super::numeric::{parse_float_prefix, parse_int_prefix};
use super::render::{chart_series, notification_text, relay_states, render_tiles};
use super::report::{SnapshotReport, REPORT_FILE_NAME};
use super::view::{DashboardView, TimerForm, ViewChange, ViewUpdate};
use crate::store::{EventKind, ObservableStore, Subscription};

/// Controller behaviour that is configurable
#[derive(Debug, Clone)]
pub struct DashboardSettings {
    /// Minute values offered as preset buttons
    pub timer_presets: Vec<u32>,
    /// Hours used for a blank or unparsable limit field
    pub default_limit_hours: f64,
    /// Price used for a blank or unparsable price field
    pub default_unit_price: f64,
    /// Capacity of the view update channel
    pub update_capacity: usize,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            timer_presets: vec![15, 30, 60, 120],
            default_limit_hours: 12.0,
            default_unit_price: 8.0,
            update_capacity: 256,
        }
    }
}

/// A timer value as written to the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimerWrite {
    pub load: u8,
    pub minutes: i64,
}

/// Handles of the running subscription tasks
pub struct Bindings {
    handles: Vec<JoinHandle<()>>,
}

impl Bindings {
    /// Stop every binding task
    pub fn abort(&self) {
        for handle in &self.handles {
            handle.abort();
        }
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

/// Binds the dashboard to an observable store
pub struct DashboardController {
    store: Arc<dyn ObservableStore>,
    view: Arc<RwLock<DashboardView>>,
    updates: broadcast::Sender<ViewChange>,
    settings: DashboardSettings,
}

impl DashboardController {
    pub fn new(store: Arc<dyn ObservableStore>, settings: DashboardSettings) -> Self {
        let (updates, _) = broadcast::channel(settings.update_capacity.max(1));
        Self {
            store,
            view: Arc::new(RwLock::new(DashboardView::default())),
            updates,
            settings,
        }
    }

    pub fn settings(&self) -> &DashboardSettings {
        &self.settings
    }

    pub fn store(&self) -> &Arc<dyn ObservableStore> {
        &self.store
    }

    /// Current view contents
    pub async fn view(&self) -> DashboardView {
        self.view.read().await.clone()
    }

    /// Hold the view still. No binding applies a change while the guard
    /// lives, so a client can take the snapshot and start listening for
    /// later revisions without a gap.
    pub async fn read_view(&self) -> RwLockReadGuard<'_, DashboardView> {
        self.view.read().await
    }

    /// Receive every view change from now on, in revision order
    pub fn subscribe_updates(&self) -> broadcast::Receiver<ViewChange> {
        self.updates.subscribe()
    }

    /// Establish all read-side subscriptions and start applying them.
    ///
    /// Every subscription is registered before any task starts, so a
    /// failure leaves nothing running.
    pub async fn start(&self) -> DashboardResult<Bindings> {
        let relays = self.store.subscribe(&paths::relays()?, EventKind::Value).await?;
        let loads = self.store.subscribe(&paths::loads()?, EventKind::Value).await?;
        let notifications = self
            .store
            .subscribe(&paths::notifications()?, EventKind::ChildAdded)
            .await?;

        let mut logs = Vec::with_capacity(LogPeriod::ALL.len());
        for period in LogPeriod::ALL {
            let sub = self.store.subscribe(&paths::logs(period)?, EventKind::Value).await?;
            logs.push((period, sub));
        }

        let mut handles = Vec::with_capacity(3 + logs.len());

        handles.push(self.spawn_binding("relays", relays, |view, value| {
            view.relays = relay_states(value);
            Some(ViewUpdate::Relays { states: view.relays })
        }));

        handles.push(self.spawn_binding("loads", loads, |view, value| {
            view.tiles = render_tiles(value);
            Some(ViewUpdate::Tiles {
                tiles: view.tiles.clone(),
            })
        }));

        handles.push(self.spawn_binding("notifications", notifications, |view, value| {
            let text = notification_text(value);
            view.notifications.push(text.clone());
            Some(ViewUpdate::Notification { text })
        }));

        for (period, sub) in logs {
            handles.push(self.spawn_binding(period.key(), sub, move |view, value| {
                let series = chart_series(value)?;
                let chart = view.charts.get_mut(period);
                chart.apply(series);
                Some(ViewUpdate::Chart {
                    period,
                    chart: chart.clone(),
                })
            }));
        }

        tracing::info!(bindings = handles.len(), "Dashboard bindings started");
        Ok(Bindings { handles })
    }

    /// Run `apply` for every event of `sub` until the store goes away
    fn spawn_binding<F>(&self, name: &'static str, mut sub: Subscription, apply: F) -> JoinHandle<()>
    where
        F: Fn(&mut DashboardView, &Value) -> Option<ViewUpdate> + Send + 'static,
    {
        let view = Arc::clone(&self.view);
        let updates = self.updates.clone();

        tokio::spawn(async move {
            while let Some(snapshot) = sub.next().await {
                let mut current = view.write().await;
                let Some(update) = apply(&mut current, &snapshot.value) else {
                    continue;
                };

                // Sent under the lock so channel order matches revision order
                current.revision += 1;
                tracing::trace!(
                    binding = name,
                    path = %snapshot.path,
                    revision = current.revision,
                    "View updated"
                );
                // No live clients is fine
                let _ = updates.send(ViewChange {
                    revision: current.revision,
                    update,
                });
            }
            tracing::debug!(binding = name, "Binding ended");
        })
    }

    /// Relay checkbox toggled: one boolean write, no local state change
    pub async fn toggle_relay(&self, relay: u8, checked: bool) -> DashboardResult<()> {
        let id = LoadId::new(relay)?;
        self.store.set(&paths::relay(id)?, Value::Bool(checked)).await?;
        tracing::info!(relay = relay, checked, "Relay toggled");
        Ok(())
    }

    /// Preset button pressed: copy its minutes into the minute field
    pub async fn select_preset(&self, minutes: u32) -> TimerForm {
        let mut view = self.view.write().await;
        view.timer_form.minutes = minutes.to_string();
        view.timer_form.clone()
    }

    /// Load selector or minute field edited
    pub async fn edit_timer_form(
        &self,
        load: Option<u8>,
        minutes: Option<String>,
    ) -> DashboardResult<TimerForm> {
        let load = load.map(LoadId::new).transpose()?;

        let mut view = self.view.write().await;
        if let Some(id) = load {
            view.timer_form.selected_load = id.number();
        }
        if let Some(minutes) = minutes {
            view.timer_form.minutes = minutes;
        }
        Ok(view.timer_form.clone())
    }

    /// Apply the timer. Arguments override the form; missing ones are read
    /// from it.
    pub async fn apply_timer(
        &self,
        load: Option<u8>,
        minutes: Option<String>,
    ) -> DashboardResult<TimerWrite> {
        let (load, field) = {
            let view = self.view.read().await;
            (
                load.unwrap_or(view.timer_form.selected_load),
                minutes.unwrap_or_else(|| view.timer_form.minutes.clone()),
            )
        };

        let id = LoadId::new(load)?;
        let minutes = timer_minutes(&field);
        self.store
            .set(&paths::timer_minutes(id)?, Value::from(minutes))
            .await?;

        tracing::info!(load = load, minutes, "Timer applied");
        Ok(TimerWrite { load, minutes })
    }

    /// Save all four usage limits. Every write is attempted; failures are
    /// reported together afterwards.
    pub async fn save_limits(&self, fields: &[String; LOAD_COUNT]) -> DashboardResult<[i64; LOAD_COUNT]> {
        let mut seconds = [0i64; LOAD_COUNT];
        let mut failed = Vec::new();

        for id in LoadId::all() {
            let value = limit_seconds(&fields[id.index()], self.settings.default_limit_hours);
            seconds[id.index()] = value;

            let result = match paths::limit_seconds(id) {
                Ok(path) => self.store.set(&path, Value::from(value)).await,
                Err(e) => Err(e),
            };
            if let Err(e) = result {
                tracing::warn!(load = id.number(), error = %e, "Limit write failed");
                failed.push(format!("{}: {}", id.load_key(), e));
            }
        }

        if !failed.is_empty() {
            return Err(DashboardError::LimitWrites { failed });
        }

        tracing::info!(seconds = ?seconds, "Usage limits saved");
        Ok(seconds)
    }

    /// Save the unit price
    pub async fn save_price(&self, field: &str) -> DashboardResult<f64> {
        let price = unit_price(field, self.settings.default_unit_price);
        self.store.set(&paths::unit_price()?, Value::from(price)).await?;
        tracing::info!(price, "Unit price saved");
        Ok(price)
    }

    /// The date-range chart trigger. The range chart is not wired to any
    /// query, so this does nothing.
    pub fn load_range_chart(&self) {
        tracing::debug!("Range chart requested; not wired");
    }

    /// Fetch `loads` once and build the report from it
    pub async fn snapshot_report(&self) -> DashboardResult<SnapshotReport> {
        let loads = self.store.get(&paths::loads()?).await?;
        Ok(SnapshotReport::from_loads(&loads))
    }

    /// Build the report and write it as `Power_Report.pdf` into `dir`
    pub async fn save_report(&self, dir: &Path) -> DashboardResult<PathBuf> {
        let report = self.snapshot_report().await?;
        tokio::fs::create_dir_all(dir).await?;

        let path = dir.join(REPORT_FILE_NAME);
        tokio::fs::write(&path, report.to_pdf()).await?;

        tracing::info!(path = %path.display(), "Snapshot report saved");
        Ok(path)
    }
}

/// Minutes written for a timer field: leading integer, never negative
pub fn timer_minutes(field: &str) -> i64 {
    let field = if field.is_empty() { "0" } else { field };
    parse_int_prefix(field).unwrap_or(0).max(0)
}

/// Seconds written for a limit field given in hours, at least 1
pub fn limit_seconds(field: &str, default_hours: f64) -> i64 {
    let hours = if field.is_empty() {
        default_hours
    } else {
        parse_float_prefix(field).unwrap_or(default_hours)
    };
    // Half-up rounding
    let seconds = (hours * 3600.0 + 0.5).floor();
    (seconds as i64).max(1)
}

/// Price written for a price field
pub fn unit_price(field: &str, default_price: f64) -> f64 {
    if field.is_empty() {
        return default_price;
    }
    parse_float_prefix(field).unwrap_or(default_price)
}
