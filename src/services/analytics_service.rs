//! Analytics 业务服务
//!
//! 在存储查询之上组装仪表盘数据、日志明细和保留清理，
//! 并为事件入库提供地理位置富化。

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::Serialize;
use tracing::debug;

use crate::analytics::{AnalyticsEvent, EventSink, RetentionSweeper, actions, dispatch_event};
use crate::errors::{Result, WeblyticsError};
use crate::services::geoip::GeoIpLookup;
use crate::storage::SeaOrmStorage;
use crate::storage::backend::model_to_event;

/// 国家分布的最大条目数
const COUNTRY_STATS_LIMIT: u64 = 10;

/// 最近日志的默认条数
pub const RECENT_LOGS_LIMIT: u64 = 50;

/// 单个 IP 日志的默认条数
pub const IP_LOGS_LIMIT: u64 = 100;

/// 仪表盘统计的时间窗口
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Day,
    Week,
    Month,
}

impl Period {
    /// 解析查询参数；无法识别的值回退到 7 天
    pub fn parse(value: &str) -> Self {
        match value {
            "1d" => Period::Day,
            "30d" => Period::Month,
            _ => Period::Week,
        }
    }

    pub fn days(&self) -> i64 {
        match self {
            Period::Day => 1,
            Period::Week => 7,
            Period::Month => 30,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Period::Day => "1d",
            Period::Week => "7d",
            Period::Month => "30d",
        }
    }
}

impl Default for Period {
    fn default() -> Self {
        Period::Week
    }
}

/// 分类统计条目（browser / os / country）
#[derive(Debug, Clone, Serialize)]
pub struct CategoryCount {
    pub name: String,
    pub count: i64,
}

/// 小时分布条目
#[derive(Debug, Clone, Serialize)]
pub struct HourlyCount {
    pub hour: i32,
    pub count: i64,
}

/// 仪表盘核心计数
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_visits: u64,
    pub unique_visitors: u64,
    pub form_submissions: u64,
    pub predictions: u64,
    pub avg_response_time: f64,
}

/// 仪表盘聚合数据
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardData {
    pub period: &'static str,
    pub stats: DashboardStats,
    pub browser_stats: Vec<CategoryCount>,
    pub os_stats: Vec<CategoryCount>,
    pub country_stats: Vec<CategoryCount>,
    pub hourly_activity: Vec<HourlyCount>,
}

/// Analytics 服务
pub struct AnalyticsService {
    storage: Arc<SeaOrmStorage>,
    sink: Arc<dyn EventSink>,
    geoip: Option<Arc<dyn GeoIpLookup>>,
}

impl AnalyticsService {
    pub fn new(storage: Arc<SeaOrmStorage>, geoip: Option<Arc<dyn GeoIpLookup>>) -> Self {
        let sink = storage.as_event_sink();
        Self {
            storage,
            sink,
            geoip,
        }
    }

    /// 用自定义 Sink 构造（测试注入用）
    pub fn with_sink(
        storage: Arc<SeaOrmStorage>,
        sink: Arc<dyn EventSink>,
        geoip: Option<Arc<dyn GeoIpLookup>>,
    ) -> Self {
        Self {
            storage,
            sink,
            geoip,
        }
    }

    pub fn storage(&self) -> &Arc<SeaOrmStorage> {
        &self.storage
    }

    // ============ 事件入库 ============

    /// 地理位置富化：仅在事件尚无位置且 IP 可用时查询。
    /// 只用于客户端上报路径，服务端捕获的事件不富化。
    async fn enrich_location(&self, event: &mut AnalyticsEvent) {
        if event.location.is_some() || event.ip == crate::utils::UNKNOWN_IP {
            return;
        }

        if let Some(geoip) = &self.geoip
            && let Some(location) = geoip.lookup(&event.ip).await
        {
            debug!(
                "GeoIP resolved {} via {}: {:?}",
                event.ip,
                geoip.name(),
                location.country
            );
            event.location = Some(location);
        }
    }

    /// 富化并写入一条事件，失败时返回错误（用于前端上报路径）
    pub async fn ingest_event(&self, mut event: AnalyticsEvent) -> Result<()> {
        self.enrich_location(&mut event).await;

        self.sink
            .store_event(event)
            .await
            .map_err(|e| WeblyticsError::database_operation(e.to_string()))
    }

    /// 派发一条事件到后台写入，失败只记日志（用于请求捕获路径，at-most-once）
    ///
    /// 服务端捕获的事件原样落库，`location` 只出现在客户端上报的事件上。
    pub fn dispatch_event(&self, event: AnalyticsEvent) {
        dispatch_event(Arc::clone(&self.sink), event);
    }

    // ============ 仪表盘聚合 ============

    pub async fn get_dashboard(&self, period: Period) -> Result<DashboardData> {
        let start = Utc::now() - Duration::days(period.days());
        let map_err = |e: anyhow::Error| WeblyticsError::database_operation(e.to_string());

        let total_visits = self
            .storage
            .count_events_by_action(actions::PAGE_VIEW, start)
            .await
            .map_err(map_err)?;
        let unique_visitors = self.storage.count_distinct_ips(start).await.map_err(map_err)?;
        let form_submissions = self
            .storage
            .count_events_by_action(actions::FORM_SUBMISSION, start)
            .await
            .map_err(map_err)?;
        let predictions = self
            .storage
            .count_events_by_action(actions::PREDICTION_RESULT, start)
            .await
            .map_err(map_err)?;
        let avg_response_time = self.storage.avg_response_time(start).await.map_err(map_err)?;

        let browser_stats = self.storage.browser_stats(start).await.map_err(map_err)?;
        let os_stats = self.storage.os_stats(start).await.map_err(map_err)?;
        let country_stats = self
            .storage
            .country_stats(start, COUNTRY_STATS_LIMIT)
            .await
            .map_err(map_err)?;
        let hourly_activity = self.storage.hourly_activity(start).await.map_err(map_err)?;

        let to_category = |rows: Vec<crate::storage::backend::CategoryRow>| {
            rows.into_iter()
                .map(|r| CategoryCount {
                    name: r.name,
                    count: r.count,
                })
                .collect()
        };

        Ok(DashboardData {
            period: period.label(),
            stats: DashboardStats {
                total_visits,
                unique_visitors,
                form_submissions,
                predictions,
                avg_response_time,
            },
            browser_stats: to_category(browser_stats),
            os_stats: to_category(os_stats),
            country_stats: to_category(country_stats),
            hourly_activity: hourly_activity
                .into_iter()
                .map(|r| HourlyCount {
                    hour: r.hour,
                    count: r.count,
                })
                .collect(),
        })
    }

    // ============ 日志明细 ============

    pub async fn recent_logs(&self, limit: u64) -> Result<Vec<AnalyticsEvent>> {
        let models = self
            .storage
            .recent_events(limit)
            .await
            .map_err(|e| WeblyticsError::database_operation(e.to_string()))?;
        Ok(models.into_iter().map(model_to_event).collect())
    }

    pub async fn logs_for_ip(&self, ip: &str, limit: u64) -> Result<Vec<AnalyticsEvent>> {
        let models = self
            .storage
            .events_for_ip(ip, limit)
            .await
            .map_err(|e| WeblyticsError::database_operation(e.to_string()))?;
        Ok(models.into_iter().map(model_to_event).collect())
    }

    pub async fn logs_for_session(&self, session_id: &str) -> Result<Vec<AnalyticsEvent>> {
        let models = self
            .storage
            .events_for_session(session_id)
            .await
            .map_err(|e| WeblyticsError::database_operation(e.to_string()))?;
        Ok(models.into_iter().map(model_to_event).collect())
    }

    pub async fn prediction_history(&self) -> Result<Vec<AnalyticsEvent>> {
        let models = self
            .storage
            .recent_events_by_action(actions::PREDICTION_RESULT, RECENT_LOGS_LIMIT)
            .await
            .map_err(|e| WeblyticsError::database_operation(e.to_string()))?;
        Ok(models.into_iter().map(model_to_event).collect())
    }

    // ============ 健康检查 ============

    pub async fn health_stats(&self) -> Result<(u64, u64)> {
        let total = self
            .storage
            .count_all_events()
            .await
            .map_err(|e| WeblyticsError::database_operation(e.to_string()))?;
        let last_hour = self
            .storage
            .count_events_since(Utc::now() - Duration::hours(1))
            .await
            .map_err(|e| WeblyticsError::database_operation(e.to_string()))?;
        Ok((total, last_hour))
    }

    // ============ 保留清理 ============

    /// 删除早于 max_age_days 的事件，返回删除数量
    pub async fn cleanup(&self, max_age_days: u64) -> Result<u64> {
        let sweeper = RetentionSweeper::new(Arc::clone(&self.storage));
        sweeper
            .cleanup(max_age_days)
            .await
            .map_err(|e| WeblyticsError::database_operation(e.to_string()))
    }
}
