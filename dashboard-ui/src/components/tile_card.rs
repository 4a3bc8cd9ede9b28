//! Telemetry Tile
//!
//! Voltage, current, power and energy for one load.

use leptos::*;

use crate::state::global::GlobalState;

#[component]
pub fn TileCard(
    /// Load number, 1-4
    load: u8,
) -> impl IntoView {
    let state = expect_context::<GlobalState>();
    let index = usize::from(load.saturating_sub(1));

    let tile = create_memo(move |_| state.tiles.get().get(index).cloned().unwrap_or_default());
    let is_on = create_memo(move |_| state.relays.get().get(index).copied().unwrap_or(false));

    view! {
        <div class="bg-gray-800 rounded-lg p-4 border border-gray-700">
            <div class="flex items-center justify-between">
                <span class="text-gray-400 text-sm">{format!("Load {}", load)}</span>
                <span class=move || {
                    if is_on.get() { "w-2 h-2 rounded-full bg-green-400" } else { "w-2 h-2 rounded-full bg-gray-500" }
                } />
            </div>

            <div class="text-3xl font-bold mt-2">{move || display(&tile.get().power)}</div>

            <dl class="grid grid-cols-3 gap-2 mt-3 text-sm">
                <Reading label="Voltage" value=Signal::derive(move || tile.get().voltage) />
                <Reading label="Current" value=Signal::derive(move || tile.get().current) />
                <Reading label="Energy" value=Signal::derive(move || tile.get().energy) />
            </dl>
        </div>
    }
}

#[component]
fn Reading(label: &'static str, value: Signal<String>) -> impl IntoView {
    view! {
        <div>
            <dt class="text-gray-500 text-xs">{label}</dt>
            <dd class="font-medium">{move || display(&value.get())}</dd>
        </div>
    }
}

/// Placeholder until the first snapshot
fn display(text: &str) -> String {
    if text.is_empty() {
        "—".to_string()
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_placeholder() {
        assert_eq!(display(""), "—");
        assert_eq!(display("99.10 W"), "99.10 W");
    }
}
