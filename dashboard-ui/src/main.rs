//! Energy Tracker Dashboard
//!
//! Browser front-end for the Smart Energy Tracker, built with Leptos (WASM).
//!
//! # Features
//!
//! - Relay switches for the four loads
//! - Timer, usage limit and unit price forms
//! - Live telemetry tiles and notifications
//! - Daily, weekly and monthly usage charts
//! - Snapshot report download
//!
//! # Architecture
//!
//! Client-side rendered (CSR). Gestures go to the energy tracker API over
//! HTTP; widget state arrives over the `/api/v1/ws` WebSocket.

use leptos::*;

mod api;
mod app;
mod components;
mod pages;
mod state;

fn main() {
    console_error_panic_hook::set_once();

    mount_to_body(|| view! { <app::App /> });
}
