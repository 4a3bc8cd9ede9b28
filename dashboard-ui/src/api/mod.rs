//! API Access
//!
//! HTTP calls to the energy tracker server.

pub mod client;

pub use client::*;
