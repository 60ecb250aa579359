//! HTTP API 层

pub mod middleware;
pub mod services;

pub use middleware::CaptureAnalytics;
pub use services::{analytics_routes, health_routes, predict_routes};
