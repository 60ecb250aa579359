use std::fmt;

use actix_web::http::StatusCode;

#[derive(Debug, Clone)]
pub enum WeblyticsError {
    Config(String),
    DatabaseConnection(String),
    DatabaseOperation(String),
    Validation(String),
    NotFound(String),
    Serialization(String),
    Upstream(String),
}

impl WeblyticsError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            WeblyticsError::Config(_) => "E001",
            WeblyticsError::DatabaseConnection(_) => "E002",
            WeblyticsError::DatabaseOperation(_) => "E003",
            WeblyticsError::Validation(_) => "E004",
            WeblyticsError::NotFound(_) => "E005",
            WeblyticsError::Serialization(_) => "E006",
            WeblyticsError::Upstream(_) => "E007",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            WeblyticsError::Config(_) => "Configuration Error",
            WeblyticsError::DatabaseConnection(_) => "Database Connection Error",
            WeblyticsError::DatabaseOperation(_) => "Database Operation Error",
            WeblyticsError::Validation(_) => "Validation Error",
            WeblyticsError::NotFound(_) => "Resource Not Found",
            WeblyticsError::Serialization(_) => "Serialization Error",
            WeblyticsError::Upstream(_) => "Upstream Service Error",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> &str {
        match self {
            WeblyticsError::Config(msg) => msg,
            WeblyticsError::DatabaseConnection(msg) => msg,
            WeblyticsError::DatabaseOperation(msg) => msg,
            WeblyticsError::Validation(msg) => msg,
            WeblyticsError::NotFound(msg) => msg,
            WeblyticsError::Serialization(msg) => msg,
            WeblyticsError::Upstream(msg) => msg,
        }
    }

    /// 映射到 HTTP 状态码
    pub fn http_status(&self) -> StatusCode {
        match self {
            WeblyticsError::Validation(_) => StatusCode::BAD_REQUEST,
            WeblyticsError::NotFound(_) => StatusCode::NOT_FOUND,
            WeblyticsError::Upstream(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for WeblyticsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.error_type(), self.message())
    }
}

impl std::error::Error for WeblyticsError {}

// 便捷的构造函数
impl WeblyticsError {
    pub fn config<T: Into<String>>(msg: T) -> Self {
        WeblyticsError::Config(msg.into())
    }

    pub fn database_connection<T: Into<String>>(msg: T) -> Self {
        WeblyticsError::DatabaseConnection(msg.into())
    }

    pub fn database_operation<T: Into<String>>(msg: T) -> Self {
        WeblyticsError::DatabaseOperation(msg.into())
    }

    pub fn validation<T: Into<String>>(msg: T) -> Self {
        WeblyticsError::Validation(msg.into())
    }

    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        WeblyticsError::NotFound(msg.into())
    }

    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        WeblyticsError::Serialization(msg.into())
    }

    pub fn upstream<T: Into<String>>(msg: T) -> Self {
        WeblyticsError::Upstream(msg.into())
    }
}

// 为常见的错误类型实现 From trait
impl From<sea_orm::DbErr> for WeblyticsError {
    fn from(err: sea_orm::DbErr) -> Self {
        WeblyticsError::DatabaseOperation(err.to_string())
    }
}

impl From<std::io::Error> for WeblyticsError {
    fn from(err: std::io::Error) -> Self {
        WeblyticsError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for WeblyticsError {
    fn from(err: serde_json::Error) -> Self {
        WeblyticsError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, WeblyticsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_unique() {
        let errors = [
            WeblyticsError::config("a"),
            WeblyticsError::database_connection("b"),
            WeblyticsError::database_operation("c"),
            WeblyticsError::validation("d"),
            WeblyticsError::not_found("e"),
            WeblyticsError::serialization("f"),
            WeblyticsError::upstream("g"),
        ];
        let mut codes: Vec<&str> = errors.iter().map(|e| e.code()).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn test_http_status_mapping() {
        assert_eq!(
            WeblyticsError::validation("bad input").http_status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            WeblyticsError::not_found("missing").http_status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            WeblyticsError::upstream("ml down").http_status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            WeblyticsError::database_operation("oops").http_status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_from_db_err() {
        let err: WeblyticsError = sea_orm::DbErr::Custom("boom".to_string()).into();
        assert!(matches!(err, WeblyticsError::DatabaseOperation(_)));
        assert!(err.message().contains("boom"));
    }
}
