//! API Routes
//!
//! Route handlers organized by functionality.

pub mod controls;
pub mod health;
pub mod report;
pub mod store;
pub mod view;
