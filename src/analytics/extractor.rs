//! 事件提取
//!
//! 从一对请求/响应构造 `AnalyticsEvent`。所有字段缺失时落到默认值，
//! 对任何合法请求都不会失败。

use actix_web::HttpRequest;
use serde::Deserialize;

use super::{AnalyticsEvent, ClientData, classify_user_agent};
use crate::utils::client_ip;

/// 请求体里客户端自报的遥测字段（与原始 POST 体平铺）
///
/// 只有携带 `sessionId` 的请求体才会被合并进事件——这是"本请求
/// 本身是一次遥测上报或带遥测的表单提交"的信号；其余 POST 体被忽略。
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ClientEnvelope {
    pub session_id: Option<String>,
    pub action: Option<String>,
    pub language: Option<String>,
    pub screen_resolution: Option<String>,
    pub timezone: Option<String>,
    pub viewport: Option<String>,
    pub cookies_enabled: Option<bool>,
    pub online: Option<bool>,
}

impl ClientEnvelope {
    /// 宽容解析：非 JSON 或形状不符时返回 None，绝不报错
    pub fn parse(body: &[u8]) -> Option<Self> {
        if body.is_empty() {
            return None;
        }
        serde_json::from_slice(body).ok()
    }
}

fn header_string(req: &HttpRequest, name: &str) -> String {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// 从请求与响应元数据构造事件
///
/// `response_time_ms` 为拦截器入口到响应完成的墙钟毫秒数，
/// `content_length` 为响应体字节数（空响应为 0）。
pub fn build_event(
    req: &HttpRequest,
    status_code: u16,
    response_time_ms: i64,
    content_length: i64,
    envelope: Option<&ClientEnvelope>,
) -> AnalyticsEvent {
    let user_agent = header_string(req, "user-agent");
    let (browser, os) = classify_user_agent(if user_agent.is_empty() {
        None
    } else {
        Some(user_agent.as_str())
    });

    let mut event = AnalyticsEvent {
        method: req.method().to_string(),
        url: req.uri().to_string(),
        path: req.path().to_string(),
        ip: client_ip(req),
        referer: header_string(req, "referer"),
        accept_language: header_string(req, "accept-language"),
        accept_encoding: header_string(req, "accept-encoding"),
        host: header_string(req, "host"),
        status_code: Some(status_code),
        response_time: Some(response_time_ms.max(0)),
        content_length,
        browser: browser.to_string(),
        os: os.to_string(),
        user_agent,
        ..AnalyticsEvent::new()
    };

    // 仅当请求体携带 sessionId 时合并客户端字段
    if let Some(envelope) = envelope
        && envelope.session_id.is_some()
    {
        event.session_id = envelope.session_id.clone();
        event.action = envelope.action.clone();
        let client_data = ClientData {
            language: envelope.language.clone(),
            screen_resolution: envelope.screen_resolution.clone(),
            timezone: envelope.timezone.clone(),
            viewport: envelope.viewport.clone(),
            cookies_enabled: envelope.cookies_enabled,
            online: envelope.online,
        };
        if !client_data.is_empty() {
            event.client_data = Some(client_data);
        }
    }

    event
}
