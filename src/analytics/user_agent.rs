//! User-Agent 分类
//!
//! 按固定顺序的子串规则把原始 User-Agent 映射为 (browser, os)。
//! 纯函数，无 I/O，无错误分支：缺省输入返回 ("Unknown", "Unknown")。

/// 从 User-Agent 解析 (browser, os)
///
/// 浏览器匹配顺序：Chrome（含 "Chrome" 且不含 "Edg"）→ Firefox →
/// Safari（含 "Safari" 且不含 "Chrome"）→ Edge（含 "Edg"）→ Opera，
/// 首个命中即返回。操作系统独立匹配：Windows → macOS（"Mac"）→
/// Linux → Android → iOS。
pub fn classify_user_agent(user_agent: Option<&str>) -> (&'static str, &'static str) {
    let Some(ua) = user_agent else {
        return ("Unknown", "Unknown");
    };

    let browser = if ua.contains("Chrome") && !ua.contains("Edg") {
        "Chrome"
    } else if ua.contains("Firefox") {
        "Firefox"
    } else if ua.contains("Safari") && !ua.contains("Chrome") {
        "Safari"
    } else if ua.contains("Edg") {
        "Edge"
    } else if ua.contains("Opera") {
        "Opera"
    } else {
        "Unknown"
    };

    let os = if ua.contains("Windows") {
        "Windows"
    } else if ua.contains("Mac") {
        "macOS"
    } else if ua.contains("Linux") {
        "Linux"
    } else if ua.contains("Android") {
        "Android"
    } else if ua.contains("iOS") {
        "iOS"
    } else {
        "Unknown"
    };

    (browser, os)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chrome_without_edg() {
        let (browser, os) = classify_user_agent(Some(
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 Chrome/120.0 Safari/537.36",
        ));
        assert_eq!(browser, "Chrome");
        assert_eq!(os, "Windows");
    }

    #[test]
    fn test_edge_wins_over_chrome() {
        // Edge 的 UA 同时包含 Chrome 和 Edg
        let (browser, _) = classify_user_agent(Some(
            "Mozilla/5.0 (Windows NT 10.0) AppleWebKit/537.36 Chrome/120.0 Safari/537.36 Edg/120.0",
        ));
        assert_eq!(browser, "Edge");
    }

    #[test]
    fn test_safari_without_chrome() {
        let (browser, os) = classify_user_agent(Some(
            "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 Version/17.0 Safari/605.1.15",
        ));
        assert_eq!(browser, "Safari");
        assert_eq!(os, "macOS");
    }

    #[test]
    fn test_firefox_on_linux() {
        let (browser, os) =
            classify_user_agent(Some("Mozilla/5.0 (X11; Linux x86_64; rv:121.0) Firefox/121.0"));
        assert_eq!(browser, "Firefox");
        assert_eq!(os, "Linux");
    }

    #[test]
    fn test_opera() {
        let (browser, _) = classify_user_agent(Some("Opera/9.80 (Windows NT 6.1) Presto/2.12"));
        assert_eq!(browser, "Opera");
    }

    #[test]
    fn test_android() {
        let (_, os) = classify_user_agent(Some("Mozilla/5.0 (Android 14; Mobile) Firefox/121.0"));
        assert_eq!(os, "Android");
    }

    #[test]
    fn test_absent_header() {
        assert_eq!(classify_user_agent(None), ("Unknown", "Unknown"));
    }

    #[test]
    fn test_unmatched_string() {
        assert_eq!(classify_user_agent(Some("curl/8.4.0")), ("Unknown", "Unknown"));
    }
}
