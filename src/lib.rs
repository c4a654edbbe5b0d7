// Core modules
pub mod api;
pub mod cache;
pub mod config;
pub mod models;
pub mod persistence;
pub mod regime;
pub mod server;

// Re-export commonly used types
pub use crate::config::Settings;
pub use models::*;
pub use regime::{classify_regime, RegimeService};
