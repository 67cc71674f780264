//! Configuration and shared helpers.

pub mod config;

pub use config::SageConfig;
