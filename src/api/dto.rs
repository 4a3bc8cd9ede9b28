//! Data Transfer Objects
//!
//! Request and response types for the API endpoints.
//! These types are serialized/deserialized to/from JSON.

use serde::{Deserialize, Serialize};

use crate::dashboard::{DashboardView, LOAD_COUNT};

// ============================================
// FORM FIELDS
// ============================================

/// Raw contents of a form field. Clients may send text or a number;
/// either way it is parsed leniently by the controller.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FormField {
    Text(String),
    Number(serde_json::Number),
}

impl FormField {
    pub fn into_text(self) -> String {
        match self {
            FormField::Text(s) => s,
            FormField::Number(n) => n.to_string(),
        }
    }
}

impl Default for FormField {
    fn default() -> Self {
        FormField::Text(String::new())
    }
}

// ============================================
// CONTROL DTOs
// ============================================

/// Relay toggle request
#[derive(Debug, Deserialize)]
pub struct RelayRequest {
    /// New checkbox state
    pub checked: bool,
}

/// Relay toggle response; the view follows once the write echoes back
#[derive(Debug, Serialize)]
pub struct RelayResponse {
    pub relay: u8,
    pub checked: bool,
}

/// Timer preset button
#[derive(Debug, Deserialize)]
pub struct PresetRequest {
    pub minutes: u32,
}

/// Timer form edit or apply. Missing fields keep the form's contents.
#[derive(Debug, Default, Deserialize)]
pub struct TimerRequest {
    #[serde(default)]
    pub load: Option<u8>,
    #[serde(default)]
    pub minutes: Option<FormField>,
}

/// Save usage limits, in hours per load
#[derive(Debug, Deserialize)]
pub struct LimitsRequest {
    pub hours: [FormField; LOAD_COUNT],
}

/// Seconds written per load
#[derive(Debug, Serialize)]
pub struct LimitsResponse {
    pub seconds: [i64; LOAD_COUNT],
}

/// Save unit price
#[derive(Debug, Deserialize)]
pub struct PriceRequest {
    #[serde(default)]
    pub price: FormField,
}

/// Price written
#[derive(Debug, Serialize)]
pub struct PriceResponse {
    pub unit_price: f64,
}

// ============================================
// VIEW DTOs
// ============================================

/// Everything the dashboard page needs to draw itself
#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    #[serde(flatten)]
    pub view: DashboardView,
    /// Preset button values in minutes
    pub timer_presets: Vec<u32>,
}

// ============================================
// STORE DTOs
// ============================================

/// Result of appending a child
#[derive(Debug, Serialize)]
pub struct PushResponse {
    /// Generated time-ordered key
    pub key: String,
    /// Full path of the new child
    pub path: String,
}

// ============================================
// HEALTH DTOs
// ============================================

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Overall status: healthy, unhealthy
    pub status: String,
    /// Store status
    pub store: String,
    /// Connected WebSocket clients
    pub websocket_connections: usize,
    /// Server uptime in seconds
    pub uptime_seconds: u64,
    /// Application version
    pub version: String,
}
