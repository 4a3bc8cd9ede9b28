//! Chart Components
//!
//! Grouped bar charts drawn on an HTML5 canvas, one bar per load for each
//! period label.

use leptos::*;
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use crate::api;
use crate::state::global::{Chart, GlobalState};

/// One color per load
const SERIES_COLORS: [&str; 4] = ["#FF9800", "#4CAF50", "#2196F3", "#9C27B0"];

const MARGIN_LEFT: f64 = 60.0;
const MARGIN_RIGHT: f64 = 20.0;
const MARGIN_TOP: f64 = 20.0;
const MARGIN_BOTTOM: f64 = 40.0;

/// Usage chart for one log period ("daily", "weekly" or "monthly")
#[component]
pub fn UsageChart(period: &'static str) -> impl IntoView {
    let state = expect_context::<GlobalState>();
    let canvas_ref = create_node_ref::<html::Canvas>();

    let chart = create_memo(move |_| {
        state.charts.with(|charts| charts.get(period).cloned().unwrap_or_default())
    });

    create_effect(move |_| {
        let chart = chart.get();
        if let Some(canvas) = canvas_ref.get() {
            draw_bars(&canvas, &chart);
        }
    });

    view! {
        <div class="bg-gray-800 rounded-xl p-6">
            <h3 class="text-lg font-semibold mb-4">{move || chart.get().title}</h3>
            <canvas
                node_ref=canvas_ref
                width="800"
                height="320"
                class="w-full h-64 rounded-lg"
            />
            <ChartLegend chart=chart />
        </div>
    }
}

#[component]
fn ChartLegend(chart: Memo<Chart>) -> impl IntoView {
    view! {
        <div class="flex justify-center flex-wrap gap-4 mt-4">
            {move || {
                chart.get()
                    .datasets
                    .into_iter()
                    .enumerate()
                    .map(|(idx, ds)| {
                        let color = SERIES_COLORS[idx % SERIES_COLORS.len()];
                        view! {
                            <div class="flex items-center space-x-2">
                                <div class="w-3 h-3 rounded-full" style=format!("background-color: {}", color) />
                                <span class="text-sm text-gray-300">{ds.label}</span>
                            </div>
                        }
                    })
                    .collect_view()
            }}
        </div>
    }
}

/// The custom-range chart. Its trigger reaches the server, which draws nothing.
#[component]
pub fn RangeChart() -> impl IntoView {
    let state = expect_context::<GlobalState>();

    let on_click = move |_| {
        spawn_local(async move {
            if let Err(e) = api::load_range_chart().await {
                state.show_error(&e);
            }
        });
    };

    view! {
        <div class="bg-gray-800 rounded-xl p-6">
            <div class="flex items-center justify-between mb-4">
                <h3 class="text-lg font-semibold">"Custom Range"</h3>
                <button
                    class="px-4 py-2 rounded-lg text-sm bg-gray-700 hover:bg-gray-600"
                    on:click=on_click
                >
                    "Load"
                </button>
            </div>
            <div class="h-32 flex items-center justify-center text-gray-500 text-sm">
                "No range data"
            </div>
        </div>
    }
}

/// Largest finite value, at least 1 so an all-zero chart still has an axis
fn y_max(values: &[Vec<f64>]) -> f64 {
    values
        .iter()
        .flatten()
        .copied()
        .filter(|v| v.is_finite())
        .fold(1.0, f64::max)
}

/// Width of one label group and of one bar inside it
fn bar_layout(groups: usize, series: usize, chart_width: f64) -> (f64, f64) {
    if groups == 0 || series == 0 {
        return (0.0, 0.0);
    }
    let group_width = chart_width / groups as f64;
    // 20% of each group is left as a gap
    let bar_width = group_width * 0.8 / series as f64;
    (group_width, bar_width)
}

fn draw_bars(canvas: &HtmlCanvasElement, chart: &Chart) {
    let ctx = match canvas.get_context("2d") {
        Ok(Some(ctx)) => match ctx.dyn_into::<CanvasRenderingContext2d>() {
            Ok(ctx) => ctx,
            Err(_) => return,
        },
        _ => return,
    };

    let width = canvas.width() as f64;
    let height = canvas.height() as f64;
    let chart_width = width - MARGIN_LEFT - MARGIN_RIGHT;
    let chart_height = height - MARGIN_TOP - MARGIN_BOTTOM;

    ctx.set_fill_style(&"#1f2937".into());
    ctx.fill_rect(0.0, 0.0, width, height);

    if chart.is_empty() {
        ctx.set_fill_style(&"#6b7280".into());
        ctx.set_font("16px sans-serif");
        let _ = ctx.fill_text("No usage logged yet", width / 2.0 - 70.0, height / 2.0);
        return;
    }

    let values = chart.values();
    let max = y_max(&values);

    ctx.set_stroke_style(&"#374151".into());
    ctx.set_line_width(1.0);
    ctx.set_font("12px sans-serif");
    for i in 0..=5 {
        let y = MARGIN_TOP + (i as f64 / 5.0) * chart_height;
        ctx.begin_path();
        ctx.move_to(MARGIN_LEFT, y);
        ctx.line_to(width - MARGIN_RIGHT, y);
        ctx.stroke();

        let value = max - (i as f64 / 5.0) * max;
        ctx.set_fill_style(&"#9ca3af".into());
        let _ = ctx.fill_text(&format!("{:.1}", value), 5.0, y + 4.0);
    }

    let (group_width, bar_width) = bar_layout(chart.labels.len(), values.len(), chart_width);
    for (series, data) in values.iter().enumerate() {
        ctx.set_fill_style(&SERIES_COLORS[series % SERIES_COLORS.len()].into());
        for (group, value) in data.iter().enumerate().take(chart.labels.len()) {
            if !value.is_finite() || *value <= 0.0 {
                continue;
            }
            let bar_height = value / max * chart_height;
            let x = MARGIN_LEFT + group as f64 * group_width + group_width * 0.1 + series as f64 * bar_width;
            ctx.fill_rect(x, MARGIN_TOP + chart_height - bar_height, bar_width, bar_height);
        }
    }

    // Skip labels so at most ~10 are drawn
    ctx.set_fill_style(&"#9ca3af".into());
    let step = (chart.labels.len() / 10).max(1);
    for (group, label) in chart.labels.iter().enumerate().step_by(step) {
        let x = MARGIN_LEFT + group as f64 * group_width + 2.0;
        let _ = ctx.fill_text(label, x, height - 10.0);
    }
}
