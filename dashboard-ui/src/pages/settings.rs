//! Settings Page
//!
//! API connection and server status.

use leptos::*;

use crate::api::{self, HealthResponse};
use crate::state::global::GlobalState;

#[component]
pub fn Settings() -> impl IntoView {
    view! {
        <div class="space-y-8">
            <div>
                <h1 class="text-3xl font-bold">"Settings"</h1>
                <p class="text-gray-400 mt-1">"Connect the dashboard to an energy tracker server"</p>
            </div>

            <ApiSettings />
        </div>
    }
}

#[component]
fn ApiSettings() -> impl IntoView {
    let state = expect_context::<GlobalState>();

    let (api_url, set_api_url) = create_signal(api::get_api_base());
    let (testing, set_testing) = create_signal(false);
    let (health, set_health) = create_signal(None::<Result<HealthResponse, String>>);

    let test_connection = move |_| {
        set_testing.set(true);
        set_health.set(None);

        let url = api_url.get_untracked();
        spawn_local(async move {
            let result = api::fetch_health(url.trim_end_matches('/')).await;
            if let Err(e) = &result {
                state.show_error(&format!("Connection failed: {}", e));
            }
            set_health.set(Some(result));
            set_testing.set(false);
        });
    };

    let save_url = move |_| {
        api::set_api_base(&api_url.get_untracked());
        state.show_success("API URL saved; reload to reconnect");
    };

    view! {
        <section class="bg-gray-800 rounded-xl p-6">
            <h2 class="text-xl font-semibold mb-4">"API Connection"</h2>

            <div class="space-y-4">
                <div>
                    <label class="block text-sm text-gray-400 mb-2">"Energy tracker API URL"</label>
                    <div class="flex space-x-2">
                        <input
                            type="text"
                            prop:value=move || api_url.get()
                            on:input=move |ev| set_api_url.set(event_target_value(&ev))
                            class="flex-1 bg-gray-700 rounded-lg px-4 py-3
                                   border border-gray-600 focus:border-primary-500 focus:outline-none"
                        />
                        <button
                            on:click=test_connection
                            disabled=move || testing.get()
                            class="px-4 py-3 bg-gray-600 hover:bg-gray-500 disabled:bg-gray-700
                                   rounded-lg font-medium transition-colors"
                        >
                            {move || if testing.get() { "Testing..." } else { "Test" }}
                        </button>
                        <button
                            on:click=save_url
                            class="px-4 py-3 bg-primary-600 hover:bg-primary-700
                                   rounded-lg font-medium transition-colors"
                        >
                            "Save"
                        </button>
                    </div>
                </div>

                {move || match health.get() {
                    Some(Ok(h)) => view! {
                        <dl class="grid grid-cols-2 gap-2 text-sm">
                            <dt class="text-gray-400">"Status"</dt>
                            <dd class="text-green-400">{h.status}</dd>
                            <dt class="text-gray-400">"Store"</dt>
                            <dd>{h.store}</dd>
                            <dt class="text-gray-400">"Live clients"</dt>
                            <dd>{h.websocket_connections}</dd>
                            <dt class="text-gray-400">"Uptime"</dt>
                            <dd>{format!("{}s", h.uptime_seconds)}</dd>
                            <dt class="text-gray-400">"Version"</dt>
                            <dd>{h.version}</dd>
                        </dl>
                    }.into_view(),
                    Some(Err(_)) => view! {
                        <span class="text-red-400">"✕ Unreachable"</span>
                    }.into_view(),
                    None => view! {
                        <span class="text-gray-500 text-sm">"Not tested"</span>
                    }.into_view(),
                }}
            </div>
        </section>
    }
}
