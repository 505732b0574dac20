//! Streamgate - media byte-range streaming server
//!
//! This library crate exposes the core functionality for integration testing.

pub mod cache;
pub mod config;
pub mod range;
pub mod server;
pub mod storage;
pub mod token;
