//! Core domain + application logic for the Discord → Telegram mirror.
//!
//! This crate is intentionally framework-agnostic. Discord and Telegram live
//! behind ports (traits) implemented in adapter crates.

pub mod config;
pub mod domain;
pub mod errors;
pub mod formatting;
pub mod forwarder;
pub mod history;
pub mod logging;
pub mod pipeline;
pub mod ports;
pub mod utils;
pub mod window;

pub use errors::{Error, Result};
