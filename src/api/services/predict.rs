//! 预测代理接口
//!
//! 校验必填字段后把请求转发给 ML 服务，原样回传其响应。
//! ML 服务不可达时返回 502，不影响其他子系统。

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use actix_web::{HttpResponse, Responder, http::StatusCode, web};
use serde_json::{Value, json};
use tracing::{error, warn};

use crate::config::MlConfig;
use crate::services::AnalyticsService;

/// ML 服务推理可能较慢，超时比 GeoIP 宽松
const ML_TIMEOUT_SECS: u64 = 30;

/// 预测请求的必填字段（与 ML 服务的特征列一致）
const REQUIRED_FIELDS: &[&str] = &[
    "Yaş",
    "Maç",
    "Gol",
    "Asist",
    "Şut_Maç",
    "İsabetli_Şut_Maç",
    "Pas",
    "Dribbling_Maç",
    "Top_Kazanma_Maç",
    "Hava_Topu_Kazanma_Maç",
    "İkili_Mücadele_Kazanma_Maç",
    "Başarılı_Pas_Maç",
    "İsabetli_Orta_Maç",
    "Ülke_encoded",
    "Takım_encoded",
    "Pozisyon_encoded",
];

static ML_AGENT: OnceLock<ureq::Agent> = OnceLock::new();

fn ml_agent() -> &'static ureq::Agent {
    ML_AGENT.get_or_init(|| {
        ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(ML_TIMEOUT_SECS)))
            // 非 2xx 也要拿到响应体，错误详情原样回传给调用方
            .http_status_as_error(false)
            .build()
            .into()
    })
}

fn forward_blocking(url: &str, payload: &Value) -> anyhow::Result<(u16, Value)> {
    let mut response = ml_agent().post(url).send_json(payload)?;
    let status = response.status().as_u16();
    let body: Value = response.body_mut().read_json()?;
    Ok((status, body))
}

pub struct PredictService;

impl PredictService {
    /// POST /api/predict
    pub async fn predict(
        ml: web::Data<MlConfig>,
        payload: web::Json<Value>,
    ) -> impl Responder {
        let payload = payload.into_inner();

        for field in REQUIRED_FIELDS {
            if payload.get(field).is_none() {
                return HttpResponse::BadRequest().json(json!({
                    "error": format!("Field '{}' is required", field)
                }));
            }
        }

        let url = format!("{}/predict", ml.service_url.trim_end_matches('/'));
        let result =
            tokio::task::spawn_blocking(move || forward_blocking(&url, &payload)).await;

        match result {
            Ok(Ok((status, body))) => {
                let status =
                    StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                if !status.is_success() {
                    warn!("ML service returned {} for prediction request", status);
                }
                HttpResponse::build(status).json(body)
            }
            Ok(Err(e)) => {
                error!("ML service request failed: {}", e);
                HttpResponse::BadGateway().json(json!({
                    "error": "ML service unavailable"
                }))
            }
            Err(e) => {
                error!("ML forwarding task failed: {}", e);
                HttpResponse::InternalServerError().json(json!({
                    "error": "Internal server error"
                }))
            }
        }
    }

    /// GET /api/predictions/history
    pub async fn history(service: web::Data<Arc<AnalyticsService>>) -> impl Responder {
        match service.prediction_history().await {
            Ok(events) => HttpResponse::Ok().json(events),
            Err(e) => {
                error!("Prediction history query failed: {}", e);
                HttpResponse::build(e.http_status()).json(json!({
                    "error": "Failed to load prediction history"
                }))
            }
        }
    }
}

pub fn predict_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/predict", web::post().to(PredictService::predict))
        .route(
            "/api/predictions/history",
            web::get().to(PredictService::history),
        );
}
