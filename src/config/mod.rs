//! 配置加载
//!
//! 从环境变量（含 .env）加载 AppConfig，所有字段都有可用的默认值，
//! 嵌套字段使用 `__` 分隔（如 `SERVER__PORT=8080`）。
//! 配置对象在启动时加载一次，之后显式传递，不使用全局状态。

use serde::Deserialize;

use crate::errors::{Result, WeblyticsError};

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub geoip: GeoIpConfig,
    pub ml: MlConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub pool_size: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://weblytics.db?mode=rwc".to_string(),
            pool_size: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeoIpConfig {
    /// 是否启用地理位置查询
    pub enabled: bool,
    /// 查询 API 模板，`{ip}` 为占位符
    pub api_url_template: String,
}

impl Default for GeoIpConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_url_template:
                "http://ip-api.com/json/{ip}?fields=status,message,country,regionName,city,lat,lon"
                    .to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MlConfig {
    /// 预测服务地址
    pub service_url: String,
}

impl Default for MlConfig {
    fn default() -> Self {
        Self {
            service_url: "http://localhost:8000".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// 日志文件路径，空或缺省输出到控制台
    pub file: Option<String>,
    /// "plain" 或 "json"
    pub format: String,
    pub enable_rotation: bool,
    pub max_backups: u32,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            format: "plain".to_string(),
            enable_rotation: true,
            max_backups: 7,
        }
    }
}

impl AppConfig {
    /// 从环境变量加载配置
    pub fn load() -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::Environment::default().separator("__"))
            .build()
            .map_err(|e| WeblyticsError::config(format!("Failed to read environment: {}", e)))?;

        settings
            .try_deserialize()
            .map_err(|e| WeblyticsError::config(format!("Invalid configuration: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.server.port, 5000);
        assert_eq!(cfg.database.pool_size, 10);
        assert!(cfg.geoip.enabled);
        assert!(cfg.geoip.api_url_template.contains("{ip}"));
        assert_eq!(cfg.logging.level, "info");
        assert!(cfg.logging.file.is_none());
    }
}
