pub mod extractor;
pub mod retention;
pub mod sink;
pub mod user_agent;

pub use retention::RetentionSweeper;
pub use sink::{EventSink, dispatch_event};
pub use user_agent::classify_user_agent;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::UNKNOWN_IP;

/// 客户端事件标签
pub mod actions {
    pub const PAGE_VIEW: &str = "page_view";
    pub const FORM_SUBMISSION: &str = "form_submission";
    pub const PREDICTION_RESULT: &str = "prediction_result";
    pub const BUTTON_CLICK: &str = "button_click";
}

/// 客户端环境信息，仅由客户端上报的事件携带
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ClientData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screen_resolution: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub viewport: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cookies_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub online: Option<bool>,
}

impl ClientData {
    pub fn is_empty(&self) -> bool {
        self.language.is_none()
            && self.screen_resolution.is_none()
            && self.timezone.is_none()
            && self.viewport.is_none()
            && self.cookies_enabled.is_none()
            && self.online.is_none()
    }
}

/// 地理位置信息，仅由 GeoIP 查询成功时填充
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GeoLocation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

/// 一条分析事件，对应一次 HTTP 交互或一次客户端上报
///
/// `timestamp` 在构造时确定，持久化后不可变更；
/// 存储层只有插入和按时间批量删除两种写操作。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsEvent {
    pub timestamp: DateTime<Utc>,
    pub method: String,
    pub url: String,
    pub path: String,
    pub ip: String,
    pub user_agent: String,
    pub referer: String,
    pub accept_language: String,
    pub accept_encoding: String,
    pub host: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time: Option<i64>,
    pub content_length: i64,
    pub browser: String,
    pub os: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_data: Option<ClientData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<GeoLocation>,
}

impl AnalyticsEvent {
    /// 创建一条空事件，所有字段取文档约定的默认值
    pub fn new() -> Self {
        Self {
            timestamp: Utc::now(),
            method: String::new(),
            url: String::new(),
            path: String::new(),
            ip: UNKNOWN_IP.to_string(),
            user_agent: String::new(),
            referer: String::new(),
            accept_language: String::new(),
            accept_encoding: String::new(),
            host: String::new(),
            status_code: None,
            response_time: None,
            content_length: 0,
            browser: "Unknown".to_string(),
            os: "Unknown".to_string(),
            session_id: None,
            action: None,
            client_data: None,
            location: None,
        }
    }
}

impl Default for AnalyticsEvent {
    fn default() -> Self {
        Self::new()
    }
}

/// 客户端上报的事件（Log Ingestion Endpoint 的输入）
///
/// 与 `AnalyticsEvent` 同形，但所有字段可缺省，未知字段在边界直接拒绝。
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EventSubmission {
    pub timestamp: Option<DateTime<Utc>>,
    pub method: Option<String>,
    pub url: Option<String>,
    pub path: Option<String>,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub referer: Option<String>,
    pub accept_language: Option<String>,
    pub accept_encoding: Option<String>,
    pub host: Option<String>,
    pub status_code: Option<u16>,
    pub response_time: Option<i64>,
    pub content_length: Option<i64>,
    pub browser: Option<String>,
    pub os: Option<String>,
    pub session_id: Option<String>,
    pub action: Option<String>,
    pub client_data: Option<ClientData>,
    pub location: Option<GeoLocation>,
}

impl EventSubmission {
    /// 转换为事件，缺省字段落到文档约定的默认值
    ///
    /// browser/os 缺省时从上报的 userAgent 解析。
    pub fn into_event(self) -> AnalyticsEvent {
        let user_agent = self.user_agent.unwrap_or_default();
        let (parsed_browser, parsed_os) = classify_user_agent(if user_agent.is_empty() {
            None
        } else {
            Some(user_agent.as_str())
        });

        AnalyticsEvent {
            timestamp: self.timestamp.unwrap_or_else(Utc::now),
            method: self.method.unwrap_or_default(),
            url: self.url.unwrap_or_default(),
            path: self.path.unwrap_or_default(),
            ip: self.ip.unwrap_or_else(|| UNKNOWN_IP.to_string()),
            user_agent,
            referer: self.referer.unwrap_or_default(),
            accept_language: self.accept_language.unwrap_or_default(),
            accept_encoding: self.accept_encoding.unwrap_or_default(),
            host: self.host.unwrap_or_default(),
            status_code: self.status_code,
            response_time: self.response_time,
            content_length: self.content_length.unwrap_or(0),
            browser: self.browser.unwrap_or_else(|| parsed_browser.to_string()),
            os: self.os.unwrap_or_else(|| parsed_os.to_string()),
            session_id: self.session_id,
            action: self.action,
            client_data: self.client_data.filter(|d| !d.is_empty()),
            location: self.location,
        }
    }
}
