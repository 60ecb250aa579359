//! AnalyticsService 集成测试
//!
//! 覆盖仪表盘聚合、日志明细查询、事件入库与保留清理。
//! 使用临时 SQLite 数据库，每个测试独立建库。

use std::sync::Arc;

use chrono::{Duration, Utc};
use tempfile::TempDir;

use weblytics::analytics::{AnalyticsEvent, EventSink, actions};
use weblytics::services::{AnalyticsService, Period};
use weblytics::storage::SeaOrmStorage;

// =============================================================================
// 测试辅助
// =============================================================================

async fn create_temp_storage() -> (Arc<SeaOrmStorage>, TempDir) {
    let td = TempDir::new().unwrap();
    let p = td.path().join("analytics_svc_test.db");
    let u = format!("sqlite://{}?mode=rwc", p.display());
    let s = SeaOrmStorage::new(&u, 5).await.unwrap();
    (Arc::new(s), td)
}

fn service(storage: &Arc<SeaOrmStorage>) -> Arc<AnalyticsService> {
    Arc::new(AnalyticsService::new(Arc::clone(storage), None))
}

fn event(ip: &str, action: Option<&str>) -> AnalyticsEvent {
    AnalyticsEvent {
        ip: ip.to_string(),
        action: action.map(str::to_string),
        method: "GET".to_string(),
        path: "/".to_string(),
        url: "/".to_string(),
        ..AnalyticsEvent::new()
    }
}

async fn seed(storage: &Arc<SeaOrmStorage>, events: Vec<AnalyticsEvent>) {
    for e in events {
        storage.store_event(e).await.unwrap();
    }
}

// =============================================================================
// 仪表盘聚合
// =============================================================================

#[cfg(test)]
mod dashboard_tests {
    use super::*;

    #[tokio::test]
    async fn test_counts_by_action() {
        let (storage, _td) = create_temp_storage().await;
        seed(
            &storage,
            vec![
                event("1.1.1.1", Some(actions::PAGE_VIEW)),
                event("1.1.1.1", Some(actions::PAGE_VIEW)),
                event("1.1.1.1", Some(actions::FORM_SUBMISSION)),
                event("1.1.1.1", Some(actions::PREDICTION_RESULT)),
                event("1.1.1.1", None),
            ],
        )
        .await;

        let data = service(&storage).get_dashboard(Period::Week).await.unwrap();
        assert_eq!(data.period, "7d");
        assert_eq!(data.stats.total_visits, 2);
        assert_eq!(data.stats.form_submissions, 1);
        assert_eq!(data.stats.predictions, 1);
    }

    #[tokio::test]
    async fn test_unique_visitors_counts_distinct_ips() {
        let (storage, _td) = create_temp_storage().await;
        // 3 个事件来自 2 个不同 IP
        seed(
            &storage,
            vec![
                event("10.0.0.1", Some(actions::PAGE_VIEW)),
                event("10.0.0.1", None),
                event("10.0.0.2", Some(actions::PAGE_VIEW)),
            ],
        )
        .await;

        let data = service(&storage).get_dashboard(Period::Week).await.unwrap();
        assert_eq!(data.stats.unique_visitors, 2);
    }

    #[tokio::test]
    async fn test_window_excludes_old_events() {
        let (storage, _td) = create_temp_storage().await;
        let mut old = event("1.1.1.1", Some(actions::PAGE_VIEW));
        old.timestamp = Utc::now() - Duration::days(10);
        seed(
            &storage,
            vec![old, event("1.1.1.1", Some(actions::PAGE_VIEW))],
        )
        .await;

        let week = service(&storage).get_dashboard(Period::Week).await.unwrap();
        assert_eq!(week.stats.total_visits, 1);

        let month = service(&storage).get_dashboard(Period::Month).await.unwrap();
        assert_eq!(month.stats.total_visits, 2);
    }

    #[tokio::test]
    async fn test_avg_response_time_ignores_missing() {
        let (storage, _td) = create_temp_storage().await;
        let mut a = event("1.1.1.1", None);
        a.response_time = Some(100);
        let mut b = event("1.1.1.1", None);
        b.response_time = Some(200);
        // response_time 缺失的事件不参与平均
        let c = event("1.1.1.1", None);
        seed(&storage, vec![a, b, c]).await;

        let data = service(&storage).get_dashboard(Period::Week).await.unwrap();
        assert!((data.stats.avg_response_time - 150.0).abs() < 0.001);
    }

    #[tokio::test]
    async fn test_avg_response_time_zero_when_empty() {
        let (storage, _td) = create_temp_storage().await;
        let data = service(&storage).get_dashboard(Period::Week).await.unwrap();
        assert_eq!(data.stats.avg_response_time, 0.0);
    }

    #[tokio::test]
    async fn test_browser_stats_sorted_desc() {
        let (storage, _td) = create_temp_storage().await;
        let mut chrome1 = event("1.1.1.1", None);
        chrome1.browser = "Chrome".to_string();
        let mut chrome2 = event("1.1.1.2", None);
        chrome2.browser = "Chrome".to_string();
        let mut firefox = event("1.1.1.3", None);
        firefox.browser = "Firefox".to_string();
        seed(&storage, vec![chrome1, chrome2, firefox]).await;

        let data = service(&storage).get_dashboard(Period::Week).await.unwrap();
        assert_eq!(data.browser_stats.len(), 2);
        assert_eq!(data.browser_stats[0].name, "Chrome");
        assert_eq!(data.browser_stats[0].count, 2);
        assert_eq!(data.browser_stats[1].name, "Firefox");
    }

    #[tokio::test]
    async fn test_country_stats_top_10_excludes_missing() {
        let (storage, _td) = create_temp_storage().await;
        let mut events = Vec::new();
        // 11 个国家，其中 Country0 出现两次
        for i in 0..11 {
            let mut e = event(&format!("10.0.0.{i}"), None);
            e.location = Some(weblytics::analytics::GeoLocation {
                country: Some(format!("Country{i}")),
                ..Default::default()
            });
            events.push(e);
        }
        let mut extra = event("10.0.1.1", None);
        extra.location = Some(weblytics::analytics::GeoLocation {
            country: Some("Country0".to_string()),
            ..Default::default()
        });
        events.push(extra);
        // 无位置信息的事件不参与国家统计
        events.push(event("10.0.2.1", None));
        seed(&storage, events).await;

        let data = service(&storage).get_dashboard(Period::Week).await.unwrap();
        assert_eq!(data.country_stats.len(), 10);
        assert_eq!(data.country_stats[0].name, "Country0");
        assert_eq!(data.country_stats[0].count, 2);
    }

    #[tokio::test]
    async fn test_hourly_activity_omits_empty_hours() {
        let (storage, _td) = create_temp_storage().await;
        let at_14 = Utc::now()
            .date_naive()
            .and_hms_opt(14, 0, 0)
            .unwrap()
            .and_utc();
        let mut a = event("1.1.1.1", None);
        a.timestamp = at_14;
        let mut b = event("1.1.1.2", None);
        b.timestamp = at_14 + Duration::minutes(30);
        seed(&storage, vec![a, b]).await;

        let data = service(&storage).get_dashboard(Period::Week).await.unwrap();
        assert_eq!(data.hourly_activity.len(), 1);
        assert_eq!(data.hourly_activity[0].hour, 14);
        assert_eq!(data.hourly_activity[0].count, 2);
    }
}

// =============================================================================
// 日志明细查询
// =============================================================================

#[cfg(test)]
mod log_query_tests {
    use super::*;

    #[tokio::test]
    async fn test_recent_logs_desc_with_limit() {
        let (storage, _td) = create_temp_storage().await;
        let base = Utc::now();
        let mut events = Vec::new();
        for i in 0..5 {
            let mut e = event("1.1.1.1", None);
            e.timestamp = base - Duration::minutes(i);
            e.path = format!("/page/{i}");
            events.push(e);
        }
        seed(&storage, events).await;

        let logs = service(&storage).recent_logs(3).await.unwrap();
        assert_eq!(logs.len(), 3);
        // 最新的在最前
        assert_eq!(logs[0].path, "/page/0");
        assert!(logs[0].timestamp >= logs[1].timestamp);
        assert!(logs[1].timestamp >= logs[2].timestamp);
    }

    #[tokio::test]
    async fn test_logs_for_ip_filters() {
        let (storage, _td) = create_temp_storage().await;
        seed(
            &storage,
            vec![
                event("10.0.0.1", None),
                event("10.0.0.1", None),
                event("10.0.0.2", None),
            ],
        )
        .await;

        let logs = service(&storage)
            .logs_for_ip("10.0.0.1", 100)
            .await
            .unwrap();
        assert_eq!(logs.len(), 2);
        assert!(logs.iter().all(|l| l.ip == "10.0.0.1"));
    }

    #[tokio::test]
    async fn test_logs_for_session_chronological() {
        let (storage, _td) = create_temp_storage().await;
        let base = Utc::now();
        // 乱序插入
        for offset in [2i64, 0, 1] {
            let mut e = event("1.1.1.1", Some(actions::BUTTON_CLICK));
            e.session_id = Some("sess-42".to_string());
            e.timestamp = base + Duration::seconds(offset);
            e.path = format!("/step/{offset}");
            storage.store_event(e).await.unwrap();
        }
        let mut other = event("1.1.1.1", None);
        other.session_id = Some("sess-other".to_string());
        storage.store_event(other).await.unwrap();

        let logs = service(&storage).logs_for_session("sess-42").await.unwrap();
        assert_eq!(logs.len(), 3);
        assert_eq!(logs[0].path, "/step/0");
        assert_eq!(logs[1].path, "/step/1");
        assert_eq!(logs[2].path, "/step/2");
    }

    #[tokio::test]
    async fn test_prediction_history_filters_action() {
        let (storage, _td) = create_temp_storage().await;
        seed(
            &storage,
            vec![
                event("1.1.1.1", Some(actions::PREDICTION_RESULT)),
                event("1.1.1.1", Some(actions::PAGE_VIEW)),
            ],
        )
        .await;

        let logs = service(&storage).prediction_history().await.unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].action.as_deref(), Some(actions::PREDICTION_RESULT));
    }
}

// =============================================================================
// 事件入库与富化
// =============================================================================

#[cfg(test)]
mod ingest_tests {
    use super::*;
    use async_trait::async_trait;
    use weblytics::analytics::GeoLocation;
    use weblytics::services::GeoIpLookup;

    struct FixedGeo;

    #[async_trait]
    impl GeoIpLookup for FixedGeo {
        async fn lookup(&self, ip: &str) -> Option<GeoLocation> {
            assert_ne!(ip, "unknown");
            Some(GeoLocation {
                country: Some("Turkey".to_string()),
                city: Some("Istanbul".to_string()),
                ..Default::default()
            })
        }

        fn name(&self) -> &'static str {
            "fixed"
        }
    }

    #[tokio::test]
    async fn test_ingest_enriches_location() {
        let (storage, _td) = create_temp_storage().await;
        let svc = AnalyticsService::new(Arc::clone(&storage), Some(Arc::new(FixedGeo)));

        svc.ingest_event(event("203.0.113.9", Some(actions::PAGE_VIEW)))
            .await
            .unwrap();

        let logs = svc.recent_logs(10).await.unwrap();
        assert_eq!(logs.len(), 1);
        let location = logs[0].location.as_ref().expect("location enriched");
        assert_eq!(location.country.as_deref(), Some("Turkey"));
    }

    #[tokio::test]
    async fn test_ingest_skips_lookup_for_unknown_ip() {
        let (storage, _td) = create_temp_storage().await;
        // FixedGeo 对 "unknown" 会 panic，走到 lookup 即失败
        let svc = AnalyticsService::new(Arc::clone(&storage), Some(Arc::new(FixedGeo)));

        svc.ingest_event(event("unknown", None)).await.unwrap();

        let logs = svc.recent_logs(10).await.unwrap();
        assert!(logs[0].location.is_none());
    }

    #[tokio::test]
    async fn test_dispatch_does_not_geo_enrich() {
        let (storage, _td) = create_temp_storage().await;
        // GeoIP 已配置，但捕获路径派发的事件不做富化
        let svc = Arc::new(AnalyticsService::new(
            Arc::clone(&storage),
            Some(Arc::new(FixedGeo)),
        ));

        svc.dispatch_event(event("203.0.113.9", None));

        // 等待后台写入完成
        for _ in 0..50 {
            if storage.count_all_events().await.unwrap() >= 1 {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }

        let logs = svc.recent_logs(10).await.unwrap();
        assert_eq!(logs.len(), 1);
        assert!(logs[0].location.is_none());
    }

    struct FailingSink;

    #[async_trait]
    impl EventSink for FailingSink {
        async fn store_event(&self, _event: AnalyticsEvent) -> anyhow::Result<()> {
            anyhow::bail!("simulated store outage")
        }
    }

    #[tokio::test]
    async fn test_dispatch_swallows_sink_failure() {
        let (storage, _td) = create_temp_storage().await;
        let svc = Arc::new(AnalyticsService::with_sink(
            Arc::clone(&storage),
            Arc::new(FailingSink),
            None,
        ));

        // 不 panic、不传播，事件被静默丢弃
        svc.dispatch_event(event("1.1.1.1", None));
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;

        let (total, _) = svc.health_stats().await.unwrap();
        assert_eq!(total, 0);
    }

    #[tokio::test]
    async fn test_ingest_keeps_submitted_location() {
        let (storage, _td) = create_temp_storage().await;
        let svc = AnalyticsService::new(Arc::clone(&storage), Some(Arc::new(FixedGeo)));

        let mut e = event("203.0.113.9", None);
        e.location = Some(GeoLocation {
            country: Some("Germany".to_string()),
            ..Default::default()
        });
        svc.ingest_event(e).await.unwrap();

        let logs = svc.recent_logs(10).await.unwrap();
        assert_eq!(
            logs[0].location.as_ref().unwrap().country.as_deref(),
            Some("Germany")
        );
    }
}

// =============================================================================
// 保留清理
// =============================================================================

#[cfg(test)]
mod cleanup_tests {
    use super::*;

    #[tokio::test]
    async fn test_cleanup_deletes_only_expired() {
        let (storage, _td) = create_temp_storage().await;
        let mut expired = event("1.1.1.1", None);
        expired.timestamp = Utc::now() - Duration::days(31);
        let mut fresh = event("1.1.1.1", None);
        fresh.timestamp = Utc::now() - Duration::days(29);
        seed(&storage, vec![expired, fresh]).await;

        let svc = service(&storage);
        let deleted = svc.cleanup(30).await.unwrap();
        assert_eq!(deleted, 1);

        let (total, _) = svc.health_stats().await.unwrap();
        assert_eq!(total, 1);
    }

    #[tokio::test]
    async fn test_cleanup_empty_store() {
        let (storage, _td) = create_temp_storage().await;
        let deleted = service(&storage).cleanup(30).await.unwrap();
        assert_eq!(deleted, 0);
    }
}

// =============================================================================
// 健康统计
// =============================================================================

#[cfg(test)]
mod health_tests {
    use super::*;

    #[tokio::test]
    async fn test_health_stats_counts() {
        let (storage, _td) = create_temp_storage().await;
        let mut old = event("1.1.1.1", None);
        old.timestamp = Utc::now() - Duration::hours(2);
        seed(&storage, vec![old, event("1.1.1.1", None)]).await;

        let (total, last_hour) = service(&storage).health_stats().await.unwrap();
        assert_eq!(total, 2);
        assert_eq!(last_hour, 1);
    }
}
