//! Smart Energy Dashboard
//!
//! The client-side logic of the energy tracker: four loads, each with a
//! relay, a timer, a usage limit, live telemetry and usage logs.
//!
//! - **model**: load ids, log periods, store paths and telemetry readings
//! - **numeric**: lenient number coercion and fixed-point formatting
//! - **render**: pure functions from store snapshots to widget content
//! - **charts**: chart data models
//! - **view**: the view model and the updates pushed to live clients
//! - **report**: the PDF snapshot report
//! - **controller**: binds gestures to store writes and subscriptions to
//!   the view
//!
//! # Data flow
//!
//! ```text
//! gesture ─► DashboardController ─► ObservableStore.set
//!                                        │
//!             view ◄─ render fn ◄─ Subscription
//! ```

pub mod charts;
pub mod controller;
pub mod error;
pub mod model;
pub mod numeric;
pub mod render;
pub mod report;
pub mod view;

pub use charts::{ChartKind, ChartSeries, ChartView, Dataset, UsageCharts};
pub use controller::{Bindings, DashboardController, DashboardSettings, TimerWrite};
pub use error::{DashboardError, DashboardResult};
pub use model::{paths, LoadId, LoadReading, LogPeriod, LOAD_COUNT};
pub use render::TileView;
pub use report::{SnapshotReport, REPORT_FILE_NAME, REPORT_TITLE};
pub use view::{DashboardView, TimerForm, ViewChange, ViewUpdate};
