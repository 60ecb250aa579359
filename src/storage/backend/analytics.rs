//! Analytics 相关的数据库查询
//!
//! 提供事件日志的统计查询方法，供 AnalyticsService 调用。

use chrono::{DateTime, Utc};
use sea_orm::{
    ColumnTrait, DbBackend, EntityTrait, FromQueryResult, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, sea_query::Expr,
};

use migration::entities::analytics_log;

// ============ 查询结果类型 ============

/// 分类统计结果行（browser / os / country）
#[derive(Debug, Clone, FromQueryResult)]
pub struct CategoryRow {
    pub name: String,
    pub count: i64,
}

/// 小时分布结果行
#[derive(Debug, Clone, FromQueryResult)]
pub struct HourlyRow {
    pub hour: i32,
    pub count: i64,
}

#[derive(Debug, FromQueryResult)]
struct CountRow {
    count: i64,
}

#[derive(Debug, FromQueryResult)]
struct AvgRow {
    avg: Option<f64>,
}

// ============ SeaOrmStorage Analytics 方法 ============

impl super::SeaOrmStorage {
    fn db_backend(&self) -> DbBackend {
        match self.get_backend_name() {
            "sqlite" => DbBackend::Sqlite,
            "mysql" => DbBackend::MySql,
            _ => DbBackend::Postgres,
        }
    }

    /// 按小时分组的表达式（跨后端）
    fn hour_expr(&self) -> Expr {
        match self.db_backend() {
            DbBackend::Sqlite => Expr::cust("CAST(strftime('%H', \"timestamp\") AS INTEGER)"),
            DbBackend::MySql => Expr::cust("HOUR(`timestamp`)"),
            _ => Expr::cust("CAST(EXTRACT(HOUR FROM \"timestamp\") AS INTEGER)"),
        }
    }

    /// AVG 表达式（跨后端，统一返回浮点）
    fn avg_response_time_expr(&self) -> Expr {
        match self.db_backend() {
            DbBackend::Sqlite => Expr::cust("AVG(response_time)"),
            DbBackend::MySql => Expr::cust("CAST(AVG(response_time) AS DOUBLE)"),
            _ => Expr::cust("AVG(response_time)::float8"),
        }
    }

    /// 统计时间窗口内指定 action 的事件数
    pub async fn count_events_by_action(
        &self,
        action: &str,
        start: DateTime<Utc>,
    ) -> anyhow::Result<u64> {
        analytics_log::Entity::find()
            .filter(analytics_log::Column::Timestamp.gte(start))
            .filter(analytics_log::Column::Action.eq(action))
            .count(&self.db)
            .await
            .map_err(Into::into)
    }

    /// 统计时间窗口内不同 ip 的数量（不限 action）
    pub async fn count_distinct_ips(&self, start: DateTime<Utc>) -> anyhow::Result<u64> {
        let row = analytics_log::Entity::find()
            .select_only()
            .column_as(Expr::cust("COUNT(DISTINCT ip)"), "count")
            .filter(analytics_log::Column::Timestamp.gte(start))
            .into_model::<CountRow>()
            .one(&self.db)
            .await?;

        Ok(row.map(|r| r.count.max(0) as u64).unwrap_or(0))
    }

    /// 时间窗口内平均响应时间（毫秒）；无记录时为 0
    pub async fn avg_response_time(&self, start: DateTime<Utc>) -> anyhow::Result<f64> {
        let row = analytics_log::Entity::find()
            .select_only()
            .column_as(self.avg_response_time_expr(), "avg")
            .filter(analytics_log::Column::Timestamp.gte(start))
            .filter(analytics_log::Column::ResponseTime.is_not_null())
            .into_model::<AvgRow>()
            .one(&self.db)
            .await?;

        Ok(row.and_then(|r| r.avg).unwrap_or(0.0))
    }

    /// 浏览器分布（按数量降序，不限数量）
    pub async fn browser_stats(&self, start: DateTime<Utc>) -> anyhow::Result<Vec<CategoryRow>> {
        analytics_log::Entity::find()
            .select_only()
            .column_as(analytics_log::Column::Browser, "name")
            .column_as(analytics_log::Column::Id.count(), "count")
            .filter(analytics_log::Column::Timestamp.gte(start))
            .group_by(analytics_log::Column::Browser)
            .order_by_desc(Expr::cust("count"))
            .into_model::<CategoryRow>()
            .all(&self.db)
            .await
            .map_err(Into::into)
    }

    /// 操作系统分布（按数量降序，不限数量）
    pub async fn os_stats(&self, start: DateTime<Utc>) -> anyhow::Result<Vec<CategoryRow>> {
        analytics_log::Entity::find()
            .select_only()
            .column_as(analytics_log::Column::Os, "name")
            .column_as(analytics_log::Column::Id.count(), "count")
            .filter(analytics_log::Column::Timestamp.gte(start))
            .group_by(analytics_log::Column::Os)
            .order_by_desc(Expr::cust("count"))
            .into_model::<CategoryRow>()
            .all(&self.db)
            .await
            .map_err(Into::into)
    }

    /// 国家分布（仅统计有 country 的事件，按数量降序，限量）
    pub async fn country_stats(
        &self,
        start: DateTime<Utc>,
        limit: u64,
    ) -> anyhow::Result<Vec<CategoryRow>> {
        analytics_log::Entity::find()
            .select_only()
            .column_as(analytics_log::Column::Country, "name")
            .column_as(analytics_log::Column::Id.count(), "count")
            .filter(analytics_log::Column::Timestamp.gte(start))
            .filter(analytics_log::Column::Country.is_not_null())
            .group_by(analytics_log::Column::Country)
            .order_by_desc(Expr::cust("count"))
            .limit(limit)
            .into_model::<CategoryRow>()
            .all(&self.db)
            .await
            .map_err(Into::into)
    }

    /// 按时间戳的小时 (0-23) 分组统计；没有事件的小时不出现在结果里
    pub async fn hourly_activity(&self, start: DateTime<Utc>) -> anyhow::Result<Vec<HourlyRow>> {
        let hour_expr = self.hour_expr();
        analytics_log::Entity::find()
            .select_only()
            .column_as(hour_expr.clone(), "hour")
            .column_as(analytics_log::Column::Id.count(), "count")
            .filter(analytics_log::Column::Timestamp.gte(start))
            .group_by(hour_expr)
            .order_by_asc(Expr::cust("hour"))
            .into_model::<HourlyRow>()
            .all(&self.db)
            .await
            .map_err(Into::into)
    }

    // ============ 明细查询 ============

    /// 最近的事件（按时间倒序）
    pub async fn recent_events(&self, limit: u64) -> anyhow::Result<Vec<analytics_log::Model>> {
        analytics_log::Entity::find()
            .order_by_desc(analytics_log::Column::Timestamp)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(Into::into)
    }

    /// 指定 IP 的事件（按时间倒序）
    pub async fn events_for_ip(
        &self,
        ip: &str,
        limit: u64,
    ) -> anyhow::Result<Vec<analytics_log::Model>> {
        analytics_log::Entity::find()
            .filter(analytics_log::Column::Ip.eq(ip))
            .order_by_desc(analytics_log::Column::Timestamp)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(Into::into)
    }

    /// 指定会话的事件（按时间正序，用于会话回放）
    pub async fn events_for_session(
        &self,
        session_id: &str,
    ) -> anyhow::Result<Vec<analytics_log::Model>> {
        analytics_log::Entity::find()
            .filter(analytics_log::Column::SessionId.eq(session_id))
            .order_by_asc(analytics_log::Column::Timestamp)
            .all(&self.db)
            .await
            .map_err(Into::into)
    }

    /// 指定 action 的最近事件（按时间倒序）
    pub async fn recent_events_by_action(
        &self,
        action: &str,
        limit: u64,
    ) -> anyhow::Result<Vec<analytics_log::Model>> {
        analytics_log::Entity::find()
            .filter(analytics_log::Column::Action.eq(action))
            .order_by_desc(analytics_log::Column::Timestamp)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(Into::into)
    }

    // ============ 健康检查统计 ============

    /// 事件总数
    pub async fn count_all_events(&self) -> anyhow::Result<u64> {
        analytics_log::Entity::find()
            .count(&self.db)
            .await
            .map_err(Into::into)
    }

    /// 某时间点之后的事件数
    pub async fn count_events_since(&self, start: DateTime<Utc>) -> anyhow::Result<u64> {
        analytics_log::Entity::find()
            .filter(analytics_log::Column::Timestamp.gte(start))
            .count(&self.db)
            .await
            .map_err(Into::into)
    }

    // ============ 保留清理 ============

    /// 查找早于截止时间的事件 ID（升序，限量，供分批删除）
    pub async fn find_event_ids_before(
        &self,
        cutoff: DateTime<Utc>,
        limit: u64,
    ) -> anyhow::Result<Vec<i64>> {
        analytics_log::Entity::find()
            .select_only()
            .column(analytics_log::Column::Id)
            .filter(analytics_log::Column::Timestamp.lt(cutoff))
            .order_by_asc(analytics_log::Column::Id)
            .limit(limit)
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(Into::into)
    }

    /// 按 ID 批量删除事件，返回删除数量
    pub async fn delete_events_by_ids(&self, ids: Vec<i64>) -> anyhow::Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let deleted = analytics_log::Entity::delete_many()
            .filter(analytics_log::Column::Id.is_in(ids))
            .exec(&self.db)
            .await?
            .rows_affected;

        Ok(deleted)
    }
}
