//! Unit Price Form

use leptos::*;

use crate::api;
use crate::state::global::GlobalState;

#[component]
pub fn PriceForm() -> impl IntoView {
    let state = expect_context::<GlobalState>();
    let (price, set_price) = create_signal(String::new());

    let on_save = move |_| {
        let value = price.get_untracked();
        spawn_local(async move {
            match api::save_price(&value).await {
                Ok(written) => state.show_success(&format!("Unit price set to {}", written.unit_price)),
                Err(e) => state.show_error(&e),
            }
        });
    };

    view! {
        <div class="flex items-end gap-3">
            <label class="block flex-1">
                <span class="text-sm text-gray-400">"Price per unit"</span>
                <input
                    type="number"
                    min="0"
                    step="0.01"
                    class="mt-1 w-full bg-gray-700 rounded-lg px-3 py-2"
                    prop:value=price
                    on:input=move |ev| set_price.set(event_target_value(&ev))
                />
            </label>
            <button
                class="px-4 py-2 bg-primary-600 hover:bg-primary-700 rounded-lg font-medium"
                on:click=on_save
            >
                "Save"
            </button>
        </div>
    }
}
