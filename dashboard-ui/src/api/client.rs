//! HTTP API Client
//!
//! One function per dashboard gesture, against the energy tracker REST API.

use gloo_net::http::{Request, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::state::global::{DashboardSnapshot, TimerForm, LOAD_COUNT};

/// Default API base URL
pub const DEFAULT_API_BASE: &str = "http://localhost:8090/api/v1";

const API_URL_KEY: &str = "energy_tracker_api_url";

/// API base URL from local storage, or the default
pub fn get_api_base() -> String {
    let stored = web_sys::window()
        .and_then(|window| window.local_storage().ok().flatten())
        .and_then(|storage| storage.get_item(API_URL_KEY).ok().flatten())
        .filter(|url| !url.trim().is_empty());

    stored
        .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
        .trim_end_matches('/')
        .to_string()
}

/// Set the API base URL in local storage
pub fn set_api_base(url: &str) {
    if let Some(window) = web_sys::window() {
        if let Ok(Some(storage)) = window.local_storage() {
            let _ = storage.set_item(API_URL_KEY, url);
        }
    }
}

/// Where the browser downloads the snapshot report from
pub fn report_url() -> String {
    format!("{}/report", get_api_base())
}

/// Server root for `/health`, derived from the API base
pub fn server_root(api_base: &str) -> &str {
    api_base.strip_suffix("/api/v1").unwrap_or(api_base)
}

// ============ Response Types ============

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TimerWrite {
    pub load: u8,
    pub minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LimitsWrite {
    pub seconds: [i64; LOAD_COUNT],
}

#[derive(Debug, Clone, Deserialize)]
pub struct PriceWrite {
    pub unit_price: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub store: String,
    pub websocket_connections: usize,
    pub uptime_seconds: u64,
    pub version: String,
}

// ============ Request Types ============

#[derive(Serialize)]
struct RelayBody {
    checked: bool,
}

#[derive(Serialize)]
struct PresetBody {
    minutes: u32,
}

#[derive(Serialize, Default)]
struct TimerBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    load: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    minutes: Option<&'a str>,
}

#[derive(Serialize)]
struct LimitsBody<'a> {
    hours: &'a [String; LOAD_COUNT],
}

#[derive(Serialize)]
struct PriceBody<'a> {
    price: &'a str,
}

// ============ Helpers ============

async fn error_message(response: Response) -> String {
    let status = response.status();
    match response.json::<ErrorBody>().await {
        Ok(body) => body.error.message,
        Err(_) => format!("Request failed with status {}", status),
    }
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, String> {
    if !response.ok() {
        return Err(error_message(response).await);
    }
    response
        .json()
        .await
        .map_err(|e| format!("Parse error: {}", e))
}

async fn expect_ok(response: Response) -> Result<(), String> {
    if response.ok() {
        Ok(())
    } else {
        Err(error_message(response).await)
    }
}

fn network_error(e: gloo_net::Error) -> String {
    format!("Network error: {}", e)
}

// ============ API Functions ============

/// Full dashboard view
pub async fn fetch_dashboard() -> Result<DashboardSnapshot, String> {
    let response = Request::get(&format!("{}/dashboard", get_api_base()))
        .send()
        .await
        .map_err(network_error)?;
    read_json(response).await
}

/// Relay checkbox changed. The checkbox follows once the write echoes back.
pub async fn toggle_relay(relay: u8, checked: bool) -> Result<(), String> {
    let response = Request::put(&format!("{}/relays/{}", get_api_base(), relay))
        .json(&RelayBody { checked })
        .map_err(|e| format!("Request build error: {}", e))?
        .send()
        .await
        .map_err(network_error)?;
    expect_ok(response).await
}

/// Preset button; returns the updated form
pub async fn select_preset(minutes: u32) -> Result<TimerForm, String> {
    let response = Request::post(&format!("{}/timer/preset", get_api_base()))
        .json(&PresetBody { minutes })
        .map_err(|e| format!("Request build error: {}", e))?
        .send()
        .await
        .map_err(network_error)?;
    read_json(response).await
}

/// Load selector or minute field edited
pub async fn edit_timer_form(load: Option<u8>, minutes: Option<&str>) -> Result<TimerForm, String> {
    let response = Request::put(&format!("{}/timer/form", get_api_base()))
        .json(&TimerBody { load, minutes })
        .map_err(|e| format!("Request build error: {}", e))?
        .send()
        .await
        .map_err(network_error)?;
    read_json(response).await
}

/// Apply the timer form as the server holds it
pub async fn apply_timer() -> Result<TimerWrite, String> {
    let response = Request::post(&format!("{}/timer/apply", get_api_base()))
        .json(&TimerBody::default())
        .map_err(|e| format!("Request build error: {}", e))?
        .send()
        .await
        .map_err(network_error)?;
    read_json(response).await
}

/// Save all four limit fields, in hours
pub async fn save_limits(hours: &[String; LOAD_COUNT]) -> Result<LimitsWrite, String> {
    let response = Request::post(&format!("{}/limits", get_api_base()))
        .json(&LimitsBody { hours })
        .map_err(|e| format!("Request build error: {}", e))?
        .send()
        .await
        .map_err(network_error)?;
    read_json(response).await
}

pub async fn save_price(price: &str) -> Result<PriceWrite, String> {
    let response = Request::post(&format!("{}/price", get_api_base()))
        .json(&PriceBody { price })
        .map_err(|e| format!("Request build error: {}", e))?
        .send()
        .await
        .map_err(network_error)?;
    read_json(response).await
}

/// Range chart trigger; the server accepts it and draws nothing
pub async fn load_range_chart() -> Result<(), String> {
    let response = Request::post(&format!("{}/charts/range", get_api_base()))
        .send()
        .await
        .map_err(network_error)?;
    expect_ok(response).await
}

pub async fn fetch_health(api_base: &str) -> Result<HealthResponse, String> {
    let response = Request::get(&format!("{}/health", server_root(api_base)))
        .send()
        .await
        .map_err(network_error)?;
    read_json(response).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_root() {
        assert_eq!(server_root("http://localhost:8090/api/v1"), "http://localhost:8090");
        assert_eq!(server_root("http://proxy/tracker"), "http://proxy/tracker");
    }

    #[test]
    fn test_timer_body_omits_missing_fields() {
        let body = serde_json::to_string(&TimerBody::default()).unwrap();
        assert_eq!(body, "{}");

        let body = serde_json::to_string(&TimerBody {
            load: Some(3),
            minutes: Some("45"),
        })
        .unwrap();
        assert_eq!(body, r#"{"load":3,"minutes":"45"}"#);
    }

    #[test]
    fn test_limits_body_shape() {
        let hours = ["1".to_string(), String::new(), "2.5".to_string(), "x".to_string()];
        let body = serde_json::to_string(&LimitsBody { hours: &hours }).unwrap();
        assert_eq!(body, r#"{"hours":["1","","2.5","x"]}"#);
    }
}
