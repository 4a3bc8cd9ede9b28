//! Timer Form
//!
//! Preset buttons, load selector and minute field. The form lives on the
//! server so every open dashboard shares it; edits are sent as they happen
//! and "Apply" writes whatever the server form holds.

use leptos::*;

use crate::api;
use crate::state::global::{GlobalState, LOAD_COUNT};

#[component]
pub fn TimerPanel() -> impl IntoView {
    let state = expect_context::<GlobalState>();
    let (applying, set_applying) = create_signal(false);

    let on_load_change = move |ev| {
        let Ok(load) = event_target_value(&ev).parse::<u8>() else {
            return;
        };
        spawn_local(async move {
            match api::edit_timer_form(Some(load), None).await {
                Ok(form) => state.timer_form.set(form),
                Err(e) => state.show_error(&e),
            }
        });
    };

    let on_minutes_input = move |ev| {
        let minutes = event_target_value(&ev);
        spawn_local(async move {
            match api::edit_timer_form(None, Some(&minutes)).await {
                Ok(form) => state.timer_form.set(form),
                Err(e) => state.show_error(&e),
            }
        });
    };

    let on_apply = move |_| {
        set_applying.set(true);
        spawn_local(async move {
            match api::apply_timer().await {
                Ok(written) => state.show_success(&format!(
                    "Timer for load {} set to {} min",
                    written.load, written.minutes
                )),
                Err(e) => state.show_error(&e),
            }
            set_applying.set(false);
        });
    };

    view! {
        <div class="space-y-4">
            <div class="flex flex-wrap gap-2">
                {move || {
                    state.timer_presets.get()
                        .into_iter()
                        .map(|minutes| view! { <PresetButton minutes=minutes /> })
                        .collect_view()
                }}
            </div>

            <div class="flex items-center gap-3">
                <select
                    class="bg-gray-700 rounded-lg px-3 py-2"
                    prop:value=move || state.timer_form.get().selected_load.to_string()
                    on:change=on_load_change
                >
                    {(1..=LOAD_COUNT as u8)
                        .map(|load| view! {
                            <option value=load.to_string()>{format!("Load {}", load)}</option>
                        })
                        .collect_view()}
                </select>

                <input
                    type="number"
                    min="0"
                    placeholder="Minutes"
                    class="bg-gray-700 rounded-lg px-3 py-2 w-32"
                    prop:value=move || state.timer_form.get().minutes
                    on:change=on_minutes_input
                />

                <button
                    class="px-4 py-2 bg-primary-600 hover:bg-primary-700 rounded-lg font-medium disabled:opacity-50"
                    disabled=applying
                    on:click=on_apply
                >
                    "Apply"
                </button>
            </div>
        </div>
    }
}

/// Fills the minute field; nothing is written until "Apply"
#[component]
fn PresetButton(minutes: u32) -> impl IntoView {
    let state = expect_context::<GlobalState>();

    let on_click = move |_| {
        spawn_local(async move {
            match api::select_preset(minutes).await {
                Ok(form) => state.timer_form.set(form),
                Err(e) => state.show_error(&e),
            }
        });
    };

    view! {
        <button
            class="px-3 py-1 rounded-lg text-sm bg-gray-700 hover:bg-gray-600"
            on:click=on_click
        >
            {preset_label(minutes)}
        </button>
    }
}

fn preset_label(minutes: u32) -> String {
    if minutes >= 60 && minutes % 60 == 0 {
        format!("{}h", minutes / 60)
    } else {
        format!("{}m", minutes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_label() {
        assert_eq!(preset_label(15), "15m");
        assert_eq!(preset_label(60), "1h");
        assert_eq!(preset_label(90), "90m");
        assert_eq!(preset_label(120), "2h");
    }
}
