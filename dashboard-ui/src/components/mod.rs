//! UI Components
//!
//! Widgets for the dashboard page.

pub mod chart;
pub mod limits_form;
pub mod loading;
pub mod nav;
pub mod notification_list;
pub mod price_form;
pub mod relay_panel;
pub mod tile_card;
pub mod timer_form;
pub mod toast;

pub use chart::{RangeChart, UsageChart};
pub use limits_form::LimitsForm;
pub use loading::Loading;
pub use nav::Nav;
pub use notification_list::NotificationList;
pub use price_form::PriceForm;
pub use relay_panel::RelayPanel;
pub use tile_card::TileCard;
pub use timer_form::TimerPanel;
pub use toast::Toast;
