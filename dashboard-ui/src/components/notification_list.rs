//! Notifications Feed
//!
//! Entries in arrival order, newest at the bottom.

use leptos::*;

use crate::state::global::GlobalState;

#[component]
pub fn NotificationList() -> impl IntoView {
    let state = expect_context::<GlobalState>();

    view! {
        <ul class="space-y-2 max-h-72 overflow-y-auto">
            {move || {
                let entries = state.notifications.get();
                if entries.is_empty() {
                    view! {
                        <li class="text-gray-400 text-sm">"No notifications"</li>
                    }.into_view()
                } else {
                    entries
                        .into_iter()
                        .map(|text| view! {
                            <li class="py-2 border-b border-gray-700 last:border-0 text-sm">{text}</li>
                        })
                        .collect_view()
                }
            }}
        </ul>
    }
}
