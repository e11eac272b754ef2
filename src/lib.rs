pub mod config;
pub mod errors;
pub mod ingestion;
pub mod intelligence;
pub mod metrics;
pub mod models;
pub mod polymarket;
pub mod services;
pub mod ui;

pub use config::{AppConfig, DisplayConfig};
pub use errors::TrackerError;
pub use models::{Side, SourceKind, Trade};
