use async_trait::async_trait;

use crate::analytics::GeoLocation;

/// GeoIP 查询接口
#[async_trait]
pub trait GeoIpLookup: Send + Sync {
    /// 查询 IP 地理位置，失败时返回 None
    async fn lookup(&self, ip: &str) -> Option<GeoLocation>;

    /// Provider 名称
    fn name(&self) -> &'static str;
}
