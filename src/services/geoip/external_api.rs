//! 外部 HTTP API GeoIP Provider
//!
//! 通过 ip-api.com 风格的 HTTP 接口查询 IP 地理位置。
//! 所有请求带全局超时，结果缓存 15 分钟；并发查询同一 IP 时只发出一次请求。

use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use serde::Deserialize;
use tracing::{debug, warn};

use super::provider::GeoIpLookup;
use crate::analytics::GeoLocation;

/// 单次查询的全局超时（连接 + 读取）
const HTTP_TIMEOUT_SECS: u64 = 2;

/// 缓存 TTL
const CACHE_TTL_SECS: u64 = 15 * 60;

/// 缓存容量上限
const CACHE_MAX_CAPACITY: u64 = 10_000;

static HTTP_AGENT: OnceLock<ureq::Agent> = OnceLock::new();

fn http_agent() -> &'static ureq::Agent {
    HTTP_AGENT.get_or_init(|| {
        ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(HTTP_TIMEOUT_SECS)))
            .build()
            .into()
    })
}

/// ip-api.com 响应格式
#[derive(Debug, Deserialize)]
struct IpApiResponse {
    status: String,
    message: Option<String>,
    country: Option<String>,
    #[serde(rename = "regionName")]
    region_name: Option<String>,
    city: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
}

/// 基于外部 API 的 GeoIP 查询，带内存缓存
pub struct ExternalApiProvider {
    api_url_template: String,
    cache: Cache<String, Option<GeoLocation>>,
}

impl ExternalApiProvider {
    pub fn new(api_url_template: String) -> Self {
        let cache = Cache::builder()
            .max_capacity(CACHE_MAX_CAPACITY)
            .time_to_live(Duration::from_secs(CACHE_TTL_SECS))
            .build();

        Self {
            api_url_template,
            cache,
        }
    }

    fn build_url(&self, ip: &str) -> String {
        self.api_url_template.replace("{ip}", ip)
    }

    /// 同步 HTTP 查询，在 spawn_blocking 中运行
    fn fetch_blocking(url: &str) -> anyhow::Result<IpApiResponse> {
        let mut response = http_agent().get(url).call()?;
        let parsed: IpApiResponse = response.body_mut().read_json()?;
        Ok(parsed)
    }

    async fn fetch(&self, ip: &str) -> Option<GeoLocation> {
        let url = self.build_url(ip);
        let result = tokio::task::spawn_blocking(move || Self::fetch_blocking(&url)).await;

        let parsed = match result {
            Ok(Ok(parsed)) => parsed,
            Ok(Err(e)) => {
                warn!("GeoIP lookup failed for {}: {}", ip, e);
                return None;
            }
            Err(e) => {
                warn!("GeoIP lookup task panicked for {}: {}", ip, e);
                return None;
            }
        };

        if parsed.status != "success" {
            debug!(
                "GeoIP lookup returned no data for {}: {}",
                ip,
                parsed.message.as_deref().unwrap_or("unknown reason")
            );
            return None;
        }

        Some(GeoLocation {
            country: parsed.country,
            city: parsed.city,
            region: parsed.region_name,
            latitude: parsed.lat,
            longitude: parsed.lon,
        })
    }
}

#[async_trait]
impl GeoIpLookup for ExternalApiProvider {
    async fn lookup(&self, ip: &str) -> Option<GeoLocation> {
        if ip.is_empty() || ip == crate::utils::ip::UNKNOWN_IP {
            return None;
        }

        // get_with 保证同一 IP 的并发查询只发一次请求
        self.cache
            .get_with(ip.to_string(), self.fetch(ip))
            .await
    }

    fn name(&self) -> &'static str {
        "external_api"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_url_replaces_placeholder() {
        let provider = ExternalApiProvider::new(
            "http://ip-api.com/json/{ip}?fields=status,country".to_string(),
        );
        assert_eq!(
            provider.build_url("203.0.113.9"),
            "http://ip-api.com/json/203.0.113.9?fields=status,country"
        );
    }

    #[tokio::test]
    async fn test_lookup_skips_unknown_ip() {
        let provider = ExternalApiProvider::new("http://ip-api.com/json/{ip}".to_string());
        assert!(provider.lookup("unknown").await.is_none());
        assert!(provider.lookup("").await.is_none());
    }

    #[test]
    fn test_parse_success_response() {
        let json = r#"{"status":"success","country":"Turkey","regionName":"Istanbul","city":"Istanbul","lat":41.0,"lon":28.9}"#;
        let parsed: IpApiResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.status, "success");
        assert_eq!(parsed.country.as_deref(), Some("Turkey"));
        assert_eq!(parsed.region_name.as_deref(), Some("Istanbul"));
    }

    #[test]
    fn test_parse_failure_response() {
        let json = r#"{"status":"fail","message":"private range"}"#;
        let parsed: IpApiResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.status, "fail");
        assert_eq!(parsed.message.as_deref(), Some("private range"));
    }
}
