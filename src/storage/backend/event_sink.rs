//! EventSink implementation for SeaOrmStorage
//!
//! Single independent inserts, no retry: the capture path is at-most-once
//! by design and the ingestion path surfaces its own failures.

use async_trait::async_trait;
use sea_orm::EntityTrait;
use tracing::debug;

use super::SeaOrmStorage;
use super::converters::event_to_active_model;
use crate::analytics::{AnalyticsEvent, EventSink};

use migration::entities::analytics_log;

#[async_trait]
impl EventSink for SeaOrmStorage {
    async fn store_event(&self, event: AnalyticsEvent) -> anyhow::Result<()> {
        let model = event_to_active_model(&event);

        analytics_log::Entity::insert(model)
            .exec(&self.db)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to insert analytics event: {}", e))?;

        debug!(
            "Analytics event written to {} database ({} {})",
            self.backend_name.to_uppercase(),
            event.method,
            event.path
        );

        Ok(())
    }
}
