//! GeoIP 服务模块
//!
//! 提供 IP 地址地理位置查询功能（外部 API，best-effort）：
//! 任何网络失败、超时或非成功响应都退化为"无位置信息"，不向上传播。

mod external_api;
mod provider;

pub use external_api::ExternalApiProvider;
pub use provider::GeoIpLookup;
