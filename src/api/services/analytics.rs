//! Analytics HTTP 接口
//!
//! 事件上报、仪表盘聚合、日志明细与保留清理。
//! 上报与清理的失败会返回给调用方；聚合查询整体成功或整体失败。

use std::sync::Arc;

use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, error, info};

use crate::analytics::EventSubmission;
use crate::analytics::retention::DEFAULT_RETENTION_DAYS;
use crate::services::{AnalyticsService, Period};
use crate::services::analytics_service::{IP_LOGS_LIMIT, RECENT_LOGS_LIMIT};

#[derive(Debug, Deserialize)]
pub struct DashboardQuery {
    period: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    limit: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct CleanupQuery {
    days: Option<u64>,
}

pub struct AnalyticsApiService;

impl AnalyticsApiService {
    /// POST /api/analytics/log
    pub async fn log_event(
        service: web::Data<Arc<AnalyticsService>>,
        submission: web::Json<EventSubmission>,
    ) -> impl Responder {
        let event = submission.into_inner().into_event();
        debug!(
            "Ingesting client event: session={:?} action={:?}",
            event.session_id, event.action
        );

        match service.ingest_event(event).await {
            Ok(()) => HttpResponse::Ok().json(json!({
                "success": true,
                "message": "Log recorded"
            })),
            Err(e) => {
                error!("Failed to ingest analytics event: {}", e);
                HttpResponse::build(e.http_status()).json(json!({
                    "error": "Failed to record log"
                }))
            }
        }
    }

    /// GET /api/analytics/dashboard?period=7d
    pub async fn dashboard(
        service: web::Data<Arc<AnalyticsService>>,
        query: web::Query<DashboardQuery>,
    ) -> impl Responder {
        let period = query
            .period
            .as_deref()
            .map(Period::parse)
            .unwrap_or_default();

        match service.get_dashboard(period).await {
            Ok(data) => HttpResponse::Ok().json(data),
            Err(e) => {
                error!("Dashboard query failed: {}", e);
                HttpResponse::build(e.http_status()).json(json!({
                    "error": "Failed to load dashboard data"
                }))
            }
        }
    }

    /// GET /api/analytics/recent-logs?limit=50
    pub async fn recent_logs(
        service: web::Data<Arc<AnalyticsService>>,
        query: web::Query<LimitQuery>,
    ) -> impl Responder {
        let limit = query.limit.unwrap_or(RECENT_LOGS_LIMIT);

        match service.recent_logs(limit).await {
            Ok(logs) => HttpResponse::Ok().json(logs),
            Err(e) => {
                error!("Recent logs query failed: {}", e);
                HttpResponse::build(e.http_status()).json(json!({
                    "error": "Failed to load logs"
                }))
            }
        }
    }

    /// GET /api/analytics/ip/{ip}?limit=100
    pub async fn logs_for_ip(
        service: web::Data<Arc<AnalyticsService>>,
        path: web::Path<String>,
        query: web::Query<LimitQuery>,
    ) -> impl Responder {
        let ip = path.into_inner();
        let limit = query.limit.unwrap_or(IP_LOGS_LIMIT);

        match service.logs_for_ip(&ip, limit).await {
            Ok(logs) => HttpResponse::Ok().json(logs),
            Err(e) => {
                error!("IP logs query failed for {}: {}", ip, e);
                HttpResponse::build(e.http_status()).json(json!({
                    "error": "Failed to load IP logs"
                }))
            }
        }
    }

    /// GET /api/analytics/session/{session_id}
    pub async fn logs_for_session(
        service: web::Data<Arc<AnalyticsService>>,
        path: web::Path<String>,
    ) -> impl Responder {
        let session_id = path.into_inner();

        match service.logs_for_session(&session_id).await {
            Ok(logs) => HttpResponse::Ok().json(logs),
            Err(e) => {
                error!("Session logs query failed for {}: {}", session_id, e);
                HttpResponse::build(e.http_status()).json(json!({
                    "error": "Failed to load session logs"
                }))
            }
        }
    }

    /// DELETE /api/analytics/cleanup?days=30
    pub async fn cleanup(
        service: web::Data<Arc<AnalyticsService>>,
        query: web::Query<CleanupQuery>,
    ) -> impl Responder {
        let days = query.days.unwrap_or(DEFAULT_RETENTION_DAYS);

        match service.cleanup(days).await {
            Ok(deleted) => {
                info!("Retention cleanup removed {} events (>{} days)", deleted, days);
                HttpResponse::Ok().json(json!({
                    "success": true,
                    "deletedCount": deleted,
                    "message": format!("{} logs deleted", deleted)
                }))
            }
            Err(e) => {
                error!("Retention cleanup failed: {}", e);
                HttpResponse::build(e.http_status()).json(json!({
                    "error": "Failed to clean up logs"
                }))
            }
        }
    }
}

pub fn analytics_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/analytics")
            .route("/log", web::post().to(AnalyticsApiService::log_event))
            .route("/dashboard", web::get().to(AnalyticsApiService::dashboard))
            .route("/recent-logs", web::get().to(AnalyticsApiService::recent_logs))
            .route("/ip/{ip}", web::get().to(AnalyticsApiService::logs_for_ip))
            .route(
                "/session/{session_id}",
                web::get().to(AnalyticsApiService::logs_for_session),
            )
            .route("/cleanup", web::delete().to(AnalyticsApiService::cleanup)),
    );
}
