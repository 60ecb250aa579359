//! 健康检查接口
//!
//! 返回服务状态与采集管道的基本统计。统计查询失败时仍返回 200，
//! 只在 analytics 字段里标记错误（k8s probe 只关心进程活性）。

use std::sync::Arc;

use actix_web::{HttpResponse, Responder, web};
use serde_json::json;
use tracing::{error, trace};

use crate::services::AnalyticsService;

pub struct HealthService;

impl HealthService {
    /// GET /api/health
    pub async fn health_check(service: web::Data<Arc<AnalyticsService>>) -> impl Responder {
        trace!("Received health check request");

        match service.health_stats().await {
            Ok((total_logs, logs_last_hour)) => HttpResponse::Ok().json(json!({
                "status": "ok",
                "message": "Backend is running",
                "analytics": {
                    "database": service.storage().get_backend_name(),
                    "totalLogs": total_logs,
                    "logsLastHour": logs_last_hour
                }
            })),
            Err(e) => {
                error!("Health check statistics failed: {}", e);
                HttpResponse::Ok().json(json!({
                    "status": "ok",
                    "message": "Backend is running",
                    "analytics": {
                        "database": "error",
                        "error": e.to_string()
                    }
                }))
            }
        }
    }
}

pub fn health_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/health", web::get().to(HealthService::health_check));
}
