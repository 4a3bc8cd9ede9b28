//! Dashboard domain types and store layout
//!
//! Every key the dashboard reads or writes is built here, so the path
//! strings shared with the device firmware live in one place:
//!
//! ```text
//! relays/relay{1..4}                         bool
//! timers/minutes/load{1..4}                  integer minutes ≥ 0
//! limits/seconds/load{1..4}                  integer seconds ≥ 1
//! settings/unitPrice                         float
//! loads/load{1..4}/{voltage,current,power,energy}
//! notifications/{pushKey}                    string
//! logs/{daily,weekly,monthly}/{label}/load{1..4}/energy
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use super::error::{DashboardError, DashboardResult};
use super::numeric::coerce_number;
use crate::store::{StorePath, StoreResult};

/// Number of monitored/controlled channels
pub const LOAD_COUNT: usize = 4;

/// One of the four load channels, numbered from 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(into = "u8")]
pub struct LoadId(u8);

impl LoadId {
    pub fn new(n: u8) -> DashboardResult<Self> {
        if (1..=LOAD_COUNT as u8).contains(&n) {
            Ok(Self(n))
        } else {
            Err(DashboardError::InvalidLoad(n))
        }
    }

    /// All channels in display order
    pub fn all() -> impl Iterator<Item = LoadId> {
        (1..=LOAD_COUNT as u8).map(LoadId)
    }

    pub fn number(self) -> u8 {
        self.0
    }

    /// Zero-based position in per-load arrays
    pub fn index(self) -> usize {
        usize::from(self.0 - 1)
    }

    /// `load{n}`
    pub fn load_key(self) -> String {
        format!("load{}", self.0)
    }

    /// `relay{n}`
    pub fn relay_key(self) -> String {
        format!("relay{}", self.0)
    }
}

impl From<LoadId> for u8 {
    fn from(id: LoadId) -> Self {
        id.0
    }
}

impl fmt::Display for LoadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Load {}", self.0)
    }
}

/// Usage log granularity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogPeriod {
    Daily,
    Weekly,
    Monthly,
}

impl LogPeriod {
    pub const ALL: [LogPeriod; 3] = [LogPeriod::Daily, LogPeriod::Weekly, LogPeriod::Monthly];

    /// Key under `logs/`
    pub fn key(self) -> &'static str {
        match self {
            LogPeriod::Daily => "daily",
            LogPeriod::Weekly => "weekly",
            LogPeriod::Monthly => "monthly",
        }
    }

    /// Chart title
    pub fn title(self) -> &'static str {
        match self {
            LogPeriod::Daily => "Daily Usage (Wh)",
            LogPeriod::Weekly => "Weekly Usage (Wh)",
            LogPeriod::Monthly => "Monthly Usage (Wh)",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.key() == s)
    }
}

/// Store paths used by the dashboard
pub mod paths {
    use super::*;

    pub fn relays() -> StoreResult<StorePath> {
        StorePath::parse("relays")
    }

    pub fn relay(id: LoadId) -> StoreResult<StorePath> {
        relays()?.child(&id.relay_key())
    }

    pub fn timer_minutes(id: LoadId) -> StoreResult<StorePath> {
        StorePath::parse("timers/minutes")?.child(&id.load_key())
    }

    pub fn limit_seconds(id: LoadId) -> StoreResult<StorePath> {
        StorePath::parse("limits/seconds")?.child(&id.load_key())
    }

    pub fn unit_price() -> StoreResult<StorePath> {
        StorePath::parse("settings/unitPrice")
    }

    pub fn loads() -> StoreResult<StorePath> {
        StorePath::parse("loads")
    }

    pub fn load(id: LoadId) -> StoreResult<StorePath> {
        loads()?.child(&id.load_key())
    }

    pub fn notifications() -> StoreResult<StorePath> {
        StorePath::parse("notifications")
    }

    pub fn logs(period: LogPeriod) -> StoreResult<StorePath> {
        StorePath::parse("logs")?.child(period.key())
    }
}

/// Electrical readings of one load after coercion
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct LoadReading {
    pub voltage: f64,
    pub current: f64,
    pub power: f64,
    pub energy: f64,
}

impl LoadReading {
    /// Coerce one `loads/load{n}` record; missing record or fields read as 0
    pub fn from_value(record: Option<&Value>) -> Self {
        let field = |name: &str| coerce_number(record.and_then(|r| r.get(name)));
        Self {
            voltage: field("voltage"),
            current: field("current"),
            power: field("power"),
            energy: field("energy"),
        }
    }

    /// Read every load out of a `loads` snapshot
    pub fn all_from_snapshot(loads: &Value) -> [LoadReading; LOAD_COUNT] {
        let mut readings = [LoadReading::default(); LOAD_COUNT];
        for id in LoadId::all() {
            readings[id.index()] = Self::from_value(loads.get(id.load_key()));
        }
        readings
    }
}
