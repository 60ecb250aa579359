//! 业务服务层

pub mod analytics_service;
pub mod geoip;

pub use analytics_service::{AnalyticsService, DashboardData, Period};
pub use geoip::{ExternalApiProvider, GeoIpLookup};
