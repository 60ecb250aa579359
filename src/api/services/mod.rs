pub mod analytics;
pub mod health;
pub mod predict;

pub use analytics::{AnalyticsApiService, analytics_routes};
pub use health::{HealthService, health_routes};
pub use predict::{PredictService, predict_routes};
