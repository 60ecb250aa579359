//! 客户端 IP 解析
//!
//! 按固定优先级解析客户端地址：
//! 1. X-Forwarded-For（取第一个，即原始客户端 IP）
//! 2. X-Real-IP
//! 3. 连接层 peer 地址
//! 4. 哨兵值 "unknown"

use actix_web::HttpRequest;
use actix_web::http::header::HeaderMap;

/// 无法解析客户端地址时的哨兵值
pub const UNKNOWN_IP: &str = "unknown";

/// 从请求头提取转发的 IP（X-Forwarded-For 或 X-Real-IP）
pub fn forwarded_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|h| h.to_str().ok())
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        })
}

/// 解析客户端 IP，解析失败时返回 "unknown"
pub fn client_ip(req: &HttpRequest) -> String {
    forwarded_ip(req.headers())
        .or_else(|| req.peer_addr().map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| UNKNOWN_IP.to_string())
}
