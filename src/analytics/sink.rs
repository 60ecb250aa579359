//! 事件持久化 Sink
//!
//! 捕获路径上的持久化通过 `dispatch_event` 派发为独立任务：
//! 调用方不等待结果，写入失败只记录到运行日志，不重试（at-most-once）。

use std::sync::Arc;

use tracing::error;

use super::AnalyticsEvent;

/// 事件写入 Sink
#[async_trait::async_trait]
pub trait EventSink: Send + Sync {
    async fn store_event(&self, event: AnalyticsEvent) -> anyhow::Result<()>;
}

/// 把事件派发到后台写入任务（fire-and-forget）
///
/// 调用方永远不会观察到写入结果；失败的事件被静默丢弃。
pub fn dispatch_event(sink: Arc<dyn EventSink>, event: AnalyticsEvent) {
    tokio::spawn(async move {
        if let Err(e) = sink.store_event(event).await {
            error!("Failed to persist analytics event: {}", e);
        }
    });
}
