//! Twin Tower survey insight: loads the student satisfaction survey, applies
//! faculty / study-program filters and computes the dashboard views.

pub mod charts;
pub mod config;
pub mod data;
pub mod report;
pub mod session;
pub mod stats;

pub use config::{ConfigError, DashboardConfig};
pub use report::DashboardReport;
pub use session::Session;
