//! 数据清理
//!
//! 删除超过保留期的事件记录，防止数据库无限增长。
//! 按调用方提供的天数阈值一次性执行，调度由部署侧负责。

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{Duration, Utc};
use tracing::{debug, info, warn};

use crate::storage::backend::SeaOrmStorage;

/// 默认保留天数
pub const DEFAULT_RETENTION_DAYS: u64 = 30;

/// 事件保留清理器
pub struct RetentionSweeper {
    storage: Arc<SeaOrmStorage>,
    /// 每次删除批量大小
    batch_size: u64,
}

impl RetentionSweeper {
    pub fn new(storage: Arc<SeaOrmStorage>) -> Self {
        Self {
            storage,
            batch_size: 10000,
        }
    }

    /// 删除所有早于 `now - max_age_days` 的事件，返回删除数量
    ///
    /// 分批删除避免长事务；删除不可恢复，无 dry-run。
    pub async fn cleanup(&self, max_age_days: u64) -> anyhow::Result<u64> {
        let cutoff = Utc::now() - Duration::days(max_age_days as i64);

        let mut total_deleted = 0u64;
        let mut iterations = 0;
        let max_iterations = 1000; // 防止无限循环

        loop {
            if iterations >= max_iterations {
                warn!(
                    "Event cleanup reached max iterations {} (deleted {} rows)",
                    max_iterations, total_deleted
                );
                break;
            }

            let ids = self
                .storage
                .find_event_ids_before(cutoff, self.batch_size)
                .await?;

            if ids.is_empty() {
                break;
            }

            let deleted = self.storage.delete_events_by_ids(ids).await?;
            total_deleted += deleted;
            iterations += 1;

            debug!(
                "Event cleanup batch {}: deleted {} rows (total {})",
                iterations, deleted, total_deleted
            );

            if deleted < self.batch_size {
                break;
            }

            // 短暂暂停，避免对数据库造成过大压力
            tokio::time::sleep(StdDuration::from_millis(100)).await;
        }

        info!(
            "Event cleanup completed: {} events older than {} days removed",
            total_deleted, max_age_days
        );

        Ok(total_deleted)
    }
}
