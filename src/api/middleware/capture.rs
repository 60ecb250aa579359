//! 请求捕获中间件
//!
//! 在每个请求入口记录时间，响应完成后构造 `AnalyticsEvent` 并异步派发。
//! 派发失败只记日志，永不影响响应本身；JSON 请求体会被先读出再放回，
//! 供事件提取使用，下游 handler 不感知。

use std::rc::Rc;
use std::sync::Arc;
use std::time::Instant;

use actix_service::{Service, Transform};
use actix_web::{
    Error, HttpMessage,
    dev::{Payload, ServiceRequest, ServiceResponse},
    error::PayloadError,
    http::header,
    web::BytesMut,
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use futures_util::{StreamExt, stream};
use tracing::warn;

use crate::analytics::extractor::{ClientEnvelope, build_event};
use crate::services::AnalyticsService;

/// 超过此大小的请求体不再尝试解析客户端字段（仍会完整放回）
const MAX_PARSE_BYTES: usize = 256 * 1024;

/// 捕获中间件工厂
pub struct CaptureAnalytics {
    service: Arc<AnalyticsService>,
}

impl CaptureAnalytics {
    pub fn new(service: Arc<AnalyticsService>) -> Self {
        Self { service }
    }
}

impl<S, B> Transform<S, ServiceRequest> for CaptureAnalytics
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = CaptureService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(CaptureService {
            service: Rc::new(service),
            analytics: Arc::clone(&self.service),
        }))
    }
}

pub struct CaptureService<S> {
    service: Rc<S>,
    analytics: Arc<AnalyticsService>,
}

fn is_json_request(req: &ServiceRequest) -> bool {
    req.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.starts_with("application/json"))
        .unwrap_or(false)
}

fn declared_content_length(req: &ServiceRequest) -> usize {
    req.headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(0)
}

/// 读出请求体并重新注入，返回读到的字节
///
/// 大于 `MAX_PARSE_BYTES` 的请求体不会整体驻留内存：超限时把已读
/// 部分接回剩余流原样交给下游，中间件不做解析。
async fn buffer_request_body(req: &mut ServiceRequest) -> Option<BytesMut> {
    if declared_content_length(req) > MAX_PARSE_BYTES {
        return None;
    }

    let mut body = BytesMut::new();
    let mut payload = req.take_payload();

    while let Some(chunk) = payload.next().await {
        match chunk {
            Ok(bytes) => {
                body.extend_from_slice(&bytes);
                if body.len() > MAX_PARSE_BYTES {
                    let prefix = stream::iter([Ok::<_, PayloadError>(body.freeze())]);
                    req.set_payload(Payload::Stream {
                        payload: Box::pin(prefix.chain(payload)),
                    });
                    return None;
                }
            }
            Err(e) => {
                warn!("Failed to read request body for capture: {}", e);
                break;
            }
        }
    }

    let (_, mut rebuilt) = actix_http::h1::Payload::create(true);
    rebuilt.unread_data(body.clone().freeze());
    req.set_payload(rebuilt.into());

    Some(body)
}

impl<S, B> Service<ServiceRequest> for CaptureService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        ctx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, mut req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();
        let analytics = Arc::clone(&self.analytics);
        let start = Instant::now();

        Box::pin(async move {
            let envelope = if is_json_request(&req) {
                buffer_request_body(&mut req)
                    .await
                    .and_then(|body| ClientEnvelope::parse(&body))
            } else {
                None
            };

            // HttpRequest 是引用计数的，留一份响应后构造事件用
            let http_req = req.request().clone();

            let result = srv.call(req).await;

            let response_time = start.elapsed().as_millis() as i64;
            // contentLength 取自响应头；chunked/流式响应无 Content-Length，记 0
            let (status_code, content_length) = match &result {
                Ok(response) => (
                    response.status().as_u16(),
                    response
                        .headers()
                        .get(header::CONTENT_LENGTH)
                        .and_then(|v| v.to_str().ok())
                        .and_then(|v| v.parse::<i64>().ok())
                        .unwrap_or(0),
                ),
                Err(e) => (e.as_response_error().status_code().as_u16(), 0),
            };

            let event = build_event(
                &http_req,
                status_code,
                response_time,
                content_length,
                envelope.as_ref(),
            );
            analytics.dispatch_event(event);

            result
        })
    }
}
