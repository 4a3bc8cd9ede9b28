//! Energy Tracker CLI
//!
//! Command-line interface for a running energy tracker server:
//! - Switch relays, set timers, limits and the unit price
//! - Show the dashboard view
//! - Download the snapshot report
//! - Publish device-side telemetry, notifications and usage logs

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::{json, Value};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "energy-tracker-cli")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Control and inspect a Smart Energy Tracker")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// API server URL
    #[arg(long, default_value = "http://localhost:8090", global = true)]
    pub api_url: String,

    /// Output format (table, json)
    #[arg(short, long, default_value = "table", global = true)]
    pub format: String,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum RelayState {
    On,
    Off,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum Period {
    Daily,
    Weekly,
    Monthly,
}

impl Period {
    fn key(self) -> &'static str {
        match self {
            Period::Daily => "daily",
            Period::Weekly => "weekly",
            Period::Monthly => "monthly",
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Switch a relay on or off
    Relay {
        /// Relay number (1-4)
        relay: u8,
        #[arg(value_enum)]
        state: RelayState,
    },

    /// Set a load's timer
    Timer {
        /// Load number (1-4)
        load: u8,
        /// Minutes; parsed like the dashboard's minute field
        minutes: String,
    },

    /// Save usage limits in hours for all four loads
    Limits {
        /// Hours for loads 1 to 4; pass "" for the default
        #[arg(num_args = 4, required = true)]
        hours: Vec<String>,
    },

    /// Save the unit price
    Price {
        price: String,
    },

    /// Show the dashboard view
    View,

    /// Download the snapshot report
    Report {
        /// Output file
        #[arg(short, long, default_value = "Power_Report.pdf")]
        output: PathBuf,
    },

    /// Append a notification
    Notify {
        text: String,
    },

    /// Publish telemetry for a load
    Telemetry {
        /// Load number (1-4)
        load: u8,
        #[arg(long)]
        voltage: Option<f64>,
        #[arg(long)]
        current: Option<f64>,
        #[arg(long)]
        power: Option<f64>,
        #[arg(long)]
        energy: Option<f64>,
    },

    /// Record a usage log entry
    Log {
        #[arg(value_enum)]
        period: Period,
        /// Period label, e.g. 2024-01-01
        label: String,
        /// Load number (1-4)
        load: u8,
        /// Energy in Wh
        energy: f64,
    },

    /// Show server status
    Status,

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let api = cli.api_url.trim_end_matches('/').to_string();

    match cli.command {
        Commands::Relay { relay, state } => {
            let checked = matches!(state, RelayState::On);
            let response = client
                .put(format!("{}/api/v1/relays/{}", api, relay))
                .json(&json!({ "checked": checked }))
                .send()
                .await?;
            check(response).await?;
            println!("Relay {} {}", relay, if checked { "on" } else { "off" });
        }

        Commands::Timer { load, minutes } => {
            let response = client
                .post(format!("{}/api/v1/timer/apply", api))
                .json(&json!({ "load": load, "minutes": minutes }))
                .send()
                .await?;
            let written: Value = check(response).await?.json().await?;
            println!(
                "Timer for load {} set to {} minutes",
                load,
                written["minutes"].as_i64().unwrap_or(0)
            );
        }

        Commands::Limits { hours } => {
            let response = client
                .post(format!("{}/api/v1/limits", api))
                .json(&json!({ "hours": hours }))
                .send()
                .await?;
            let written: Value = check(response).await?.json().await?;

            match cli.format.as_str() {
                "json" => println!("{}", serde_json::to_string_pretty(&written)?),
                _ => {
                    println!("{:<8} {:>10}", "Load", "Seconds");
                    println!("{}", "-".repeat(19));
                    for (i, seconds) in written["seconds"]
                        .as_array()
                        .map(Vec::as_slice)
                        .unwrap_or_default()
                        .iter()
                        .enumerate()
                    {
                        println!("{:<8} {:>10}", i + 1, seconds);
                    }
                }
            }
        }

        Commands::Price { price } => {
            let response = client
                .post(format!("{}/api/v1/price", api))
                .json(&json!({ "price": price }))
                .send()
                .await?;
            let written: Value = check(response).await?.json().await?;
            println!("Unit price set to {}", written["unit_price"]);
        }

        Commands::View => {
            let response = client
                .get(format!("{}/api/v1/dashboard", api))
                .send()
                .await?;
            let view: Value = check(response).await?.json().await?;

            match cli.format.as_str() {
                "json" => println!("{}", serde_json::to_string_pretty(&view)?),
                _ => print_view(&view),
            }
        }

        Commands::Report { output } => {
            let response = client.get(format!("{}/api/v1/report", api)).send().await?;
            let bytes = check(response).await?.bytes().await?;

            if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&output, &bytes)
                .with_context(|| format!("Failed to write {:?}", output))?;
            println!("Report saved to {:?} ({} bytes)", output, bytes.len());
        }

        Commands::Notify { text } => {
            let response = client
                .post(store_url(&api, &["notifications"]))
                .json(&Value::String(text))
                .send()
                .await?;
            let pushed: Value = check(response).await?.json().await?;
            println!("Notification {}", pushed["key"].as_str().unwrap_or("-"));
        }

        Commands::Telemetry {
            load,
            voltage,
            current,
            power,
            energy,
        } => {
            let key = load_key(load)?;
            let fields = [
                ("voltage", voltage),
                ("current", current),
                ("power", power),
                ("energy", energy),
            ];
            if fields.iter().all(|(_, v)| v.is_none()) {
                bail!("Nothing to publish; pass at least one of --voltage, --current, --power, --energy");
            }

            for (field, value) in fields {
                let Some(value) = value else { continue };
                let response = client
                    .put(store_url(&api, &["loads", &key, field]))
                    .json(&value)
                    .send()
                    .await?;
                check(response).await?;
            }
            println!("Telemetry published for load {}", load);
        }

        Commands::Log {
            period,
            label,
            load,
            energy,
        } => {
            let key = load_key(load)?;
            let response = client
                .put(store_url(
                    &api,
                    &["logs", period.key(), &label, &key, "energy"],
                ))
                .json(&energy)
                .send()
                .await?;
            check(response).await?;
            println!("Logged {} Wh for load {} at {} {}", energy, load, period.key(), label);
        }

        Commands::Status => {
            let response = client.get(format!("{}/health", api)).send().await;

            match response {
                Ok(resp) if resp.status().is_success() => {
                    let health: Value = resp.json().await?;

                    println!("Energy tracker v{}", env!("CARGO_PKG_VERSION"));
                    println!();
                    println!(
                        "API Status: {}",
                        health["status"].as_str().unwrap_or("unknown")
                    );
                    println!("Store: {}", health["store"].as_str().unwrap_or("unknown"));
                    println!(
                        "Live clients: {}",
                        health["websocket_connections"].as_u64().unwrap_or(0)
                    );
                    if let Some(uptime) = health["uptime_seconds"].as_u64() {
                        println!("Uptime: {}", format_duration(uptime));
                    }
                }
                Ok(resp) => bail!("API returned error: {}", resp.status()),
                Err(e) => {
                    eprintln!("Cannot connect to energy tracker API at {}", api);
                    eprintln!();
                    eprintln!("Make sure the server is running:");
                    eprintln!("  cargo run --bin energy-tracker");
                    return Err(e.into());
                }
            }
        }

        Commands::Config { output } => {
            let config = energy_tracker::config::generate_default_config();

            match output {
                Some(path) => {
                    if let Some(parent) = path.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(&path, &config)?;
                    println!("Config written to {:?}", path);
                }
                None => {
                    print!("{}", config);
                }
            }
        }
    }

    Ok(())
}

/// Fail with the server's error body on a non-success status
async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&text)
        .ok()
        .and_then(|body| body["error"]["message"].as_str().map(str::to_string))
        .unwrap_or(text);
    bail!("Request failed ({}): {}", status, message)
}

fn load_key(load: u8) -> Result<String> {
    if !(1..=4).contains(&load) {
        bail!("Invalid load number: {} (expected 1-4)", load);
    }
    Ok(format!("load{}", load))
}

/// Store URL with each path segment percent-encoded
fn store_url(api: &str, segments: &[&str]) -> String {
    let encoded: Vec<String> = segments
        .iter()
        .map(|s| urlencoding::encode(s).into_owned())
        .collect();
    format!("{}/api/v1/store/{}", api, encoded.join("/"))
}

fn format_duration(seconds: u64) -> String {
    if seconds < 60 {
        format!("{}s", seconds)
    } else if seconds < 3600 {
        format!("{}m {}s", seconds / 60, seconds % 60)
    } else if seconds < 86400 {
        format!("{}h {}m", seconds / 3600, (seconds % 3600) / 60)
    } else {
        format!("{}d {}h", seconds / 86400, (seconds % 86400) / 3600)
    }
}

fn print_view(view: &Value) {
    let empty = Vec::new();
    let relays = view["relays"].as_array().unwrap_or(&empty);
    let tiles = view["tiles"].as_array().unwrap_or(&empty);

    println!(
        "{:<6} {:<6} {:>12} {:>12} {:>12} {:>14}",
        "Load", "Relay", "Voltage", "Current", "Power", "Energy"
    );
    println!("{}", "-".repeat(67));

    for (i, tile) in tiles.iter().enumerate() {
        let relay = match relays.get(i).and_then(Value::as_bool) {
            Some(true) => "on",
            _ => "off",
        };
        println!(
            "{:<6} {:<6} {:>12} {:>12} {:>12} {:>14}",
            tile["load"],
            relay,
            tile["voltage"].as_str().unwrap_or("-"),
            tile["current"].as_str().unwrap_or("-"),
            tile["power"].as_str().unwrap_or("-"),
            tile["energy"].as_str().unwrap_or("-"),
        );
    }

    let form = &view["timer_form"];
    println!();
    println!(
        "Timer form: load {} / {} min",
        form["selected_load"],
        form["minutes"].as_str().filter(|m| !m.is_empty()).unwrap_or("-")
    );

    let notifications = view["notifications"].as_array().unwrap_or(&empty);
    println!();
    if notifications.is_empty() {
        println!("No notifications");
    } else {
        println!("Notifications:");
        for text in notifications {
            println!("  {}", text.as_str().unwrap_or("-"));
        }
    }
}
