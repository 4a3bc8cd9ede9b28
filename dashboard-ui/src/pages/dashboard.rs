//! Dashboard Page
//!
//! Controls on top, live tiles and notifications in the middle, usage
//! charts below.

use leptos::*;

use crate::api;
use crate::components::{
    LimitsForm, Loading, NotificationList, PriceForm, RangeChart, RelayPanel, TileCard, TimerPanel,
    UsageChart,
};
use crate::state::global::{GlobalState, LOAD_COUNT};

#[component]
pub fn Dashboard() -> impl IntoView {
    let state = expect_context::<GlobalState>();
    let (ready, set_ready) = create_signal(false);

    // Timer form and presets only arrive over HTTP; the rest is kept
    // current by the live connection
    spawn_local(async move {
        state.loading.set(true);
        match api::fetch_dashboard().await {
            Ok(snapshot) => state.apply_snapshot(snapshot),
            Err(e) => {
                web_sys::console::error_1(&format!("Failed to fetch dashboard: {}", e).into());
                state.show_error(&e);
            }
        }
        state.loading.set(false);
        set_ready.set(true);
    });

    view! {
        <div class="space-y-8">
            <div class="flex items-center justify-between">
                <div>
                    <h1 class="text-3xl font-bold">"Dashboard"</h1>
                    <p class="text-gray-400 mt-1">"Four loads, live"</p>
                </div>
                <ReportButton />
            </div>

            <section class="bg-gray-800 rounded-xl p-6">
                <h2 class="text-xl font-semibold mb-4">"Relays"</h2>
                <RelayPanel />
            </section>

            <section>
                <h2 class="text-lg font-semibold mb-4">"Live Readings"</h2>
                {move || {
                    if ready.get() {
                        view! {
                            <div class="grid grid-cols-1 sm:grid-cols-2 lg:grid-cols-4 gap-4">
                                {(1..=LOAD_COUNT as u8)
                                    .map(|load| view! { <TileCard load=load /> })
                                    .collect_view()}
                            </div>
                        }.into_view()
                    } else {
                        view! { <Loading /> }.into_view()
                    }
                }}
            </section>

            <div class="grid md:grid-cols-3 gap-8">
                <section class="bg-gray-800 rounded-xl p-6">
                    <h2 class="text-xl font-semibold mb-4">"Timer"</h2>
                    <TimerPanel />
                </section>

                <section class="bg-gray-800 rounded-xl p-6">
                    <h2 class="text-xl font-semibold mb-4">"Usage Limits"</h2>
                    <LimitsForm />
                </section>

                <section class="bg-gray-800 rounded-xl p-6 space-y-8">
                    <div>
                        <h2 class="text-xl font-semibold mb-4">"Unit Price"</h2>
                        <PriceForm />
                    </div>
                    <div>
                        <h2 class="text-xl font-semibold mb-4">"Notifications"</h2>
                        <NotificationList />
                    </div>
                </section>
            </div>

            <section class="space-y-6">
                <UsageChart period="daily" />
                <UsageChart period="weekly" />
                <UsageChart period="monthly" />
                <RangeChart />
            </section>
        </div>
    }
}

/// Download link for the one-page snapshot report
#[component]
fn ReportButton() -> impl IntoView {
    view! {
        <a
            href=api::report_url()
            download="Power_Report.pdf"
            class="px-4 py-2 bg-primary-600 hover:bg-primary-700 rounded-lg font-medium transition-colors"
        >
            "Export PDF"
        </a>
    }
}
