pub mod anomaly;
pub mod clean;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod store;
pub mod transform;
