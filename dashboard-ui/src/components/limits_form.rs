//! Usage Limits Form
//!
//! Four hour fields saved together. Empty or unreadable fields fall back to
//! the server's default limit.

use leptos::*;

use crate::api;
use crate::state::global::{GlobalState, LOAD_COUNT};

#[component]
pub fn LimitsForm() -> impl IntoView {
    let state = expect_context::<GlobalState>();
    let hours = create_rw_signal(<[String; LOAD_COUNT]>::default());
    let (saving, set_saving) = create_signal(false);

    let on_save = move |_| {
        let fields = hours.get_untracked();
        set_saving.set(true);
        spawn_local(async move {
            match api::save_limits(&fields).await {
                Ok(written) => state.show_success(&format!("Limits saved: {}", describe_seconds(&written.seconds))),
                Err(e) => state.show_error(&e),
            }
            set_saving.set(false);
        });
    };

    view! {
        <div class="space-y-3">
            <div class="grid grid-cols-2 gap-3">
                {(0..LOAD_COUNT)
                    .map(|index| view! {
                        <label class="block">
                            <span class="text-sm text-gray-400">{format!("Load {} (hours)", index + 1)}</span>
                            <input
                                type="number"
                                min="0"
                                step="0.25"
                                class="mt-1 w-full bg-gray-700 rounded-lg px-3 py-2"
                                prop:value=move || hours.get()[index].clone()
                                on:input=move |ev| {
                                    let value = event_target_value(&ev);
                                    hours.update(|h| h[index] = value);
                                }
                            />
                        </label>
                    })
                    .collect_view()}
            </div>

            <button
                class="px-4 py-2 bg-primary-600 hover:bg-primary-700 rounded-lg font-medium disabled:opacity-50"
                disabled=saving
                on:click=on_save
            >
                "Save Limits"
            </button>
        </div>
    }
}

fn describe_seconds(seconds: &[i64; LOAD_COUNT]) -> String {
    seconds
        .iter()
        .enumerate()
        .map(|(i, s)| format!("L{} {}s", i + 1, s))
        .collect::<Vec<_>>()
        .join(", ")
}
