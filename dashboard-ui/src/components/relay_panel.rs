//! Relay Switches
//!
//! One checkbox per load. A click only writes the relay path; the checkbox
//! state comes back through the `relays` topic.

use leptos::*;

use crate::api;
use crate::state::global::{GlobalState, LOAD_COUNT};

#[component]
pub fn RelayPanel() -> impl IntoView {
    view! {
        <div class="grid grid-cols-2 md:grid-cols-4 gap-4">
            {(1..=LOAD_COUNT as u8)
                .map(|relay| view! { <RelaySwitch relay=relay /> })
                .collect_view()}
        </div>
    }
}

#[component]
fn RelaySwitch(relay: u8) -> impl IntoView {
    let state = expect_context::<GlobalState>();
    let index = usize::from(relay - 1);
    let is_on = create_memo(move |_| state.relays.get()[index]);
    let input_ref = create_node_ref::<html::Input>();

    let on_change = move |ev| {
        let checked = event_target_checked(&ev);
        spawn_local(async move {
            if let Err(e) = api::toggle_relay(relay, checked).await {
                // No echo will come, so undo the click by hand
                if let Some(input) = input_ref.get_untracked() {
                    input.set_checked(state_after_failed_write(&state.relays.get_untracked(), relay));
                }
                state.show_error(&format!("Relay {}: {}", relay, e));
            }
        });
    };

    view! {
        <label class="flex items-center justify-between bg-gray-700 rounded-lg px-4 py-3 cursor-pointer">
            <span class="font-medium">{format!("Load {}", relay)}</span>
            <span class="flex items-center space-x-2">
                <span class=move || if is_on.get() { "text-green-400 text-sm" } else { "text-gray-400 text-sm" }>
                    {move || if is_on.get() { "ON" } else { "OFF" }}
                </span>
                <input
                    type="checkbox"
                    class="w-5 h-5 accent-primary-500"
                    node_ref=input_ref
                    prop:checked=is_on
                    on:change=on_change
                />
            </span>
        </label>
    }
}

/// Checkbox state after a rejected write: the last state the store
/// confirmed, not the click
fn state_after_failed_write(confirmed: &[bool; LOAD_COUNT], relay: u8) -> bool {
    confirmed
        .get(usize::from(relay.saturating_sub(1)))
        .copied()
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_write_restores_confirmed_state() {
        let confirmed = [false, true, false, false];
        // Clicked on, write failed: back to off
        assert!(!state_after_failed_write(&confirmed, 1));
        // Clicked off, write failed: back to on
        assert!(state_after_failed_write(&confirmed, 2));
        assert!(!state_after_failed_write(&confirmed, 9));
    }
}
