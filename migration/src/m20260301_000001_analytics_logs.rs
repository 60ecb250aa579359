//! 分析日志表迁移
//!
//! 创建 analytics_logs 表，每条记录对应一次 HTTP 交互或一次客户端上报，包括：
//! - 请求标识（method, url, path）与原始请求头
//! - 响应信息（status_code, response_time, content_length）
//! - UA 解析结果（browser, os）
//! - 客户端会话字段（session_id, action, client_*）
//! - 地理位置信息（country, city, region, latitude, longitude）

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AnalyticsLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AnalyticsLogs::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(AnalyticsLogs::Timestamp)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AnalyticsLogs::Method)
                            .string_len(16)
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(AnalyticsLogs::Url)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(AnalyticsLogs::Path)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(AnalyticsLogs::Ip)
                            .string_len(45)
                            .not_null()
                            .default("unknown"),
                    )
                    .col(
                        ColumnDef::new(AnalyticsLogs::UserAgent)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(AnalyticsLogs::Referer)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(AnalyticsLogs::AcceptLanguage)
                            .string_len(255)
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(AnalyticsLogs::AcceptEncoding)
                            .string_len(255)
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(AnalyticsLogs::Host)
                            .string_len(255)
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(AnalyticsLogs::StatusCode).small_integer().null())
                    .col(ColumnDef::new(AnalyticsLogs::ResponseTime).big_integer().null())
                    .col(
                        ColumnDef::new(AnalyticsLogs::ContentLength)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(AnalyticsLogs::Browser)
                            .string_len(32)
                            .not_null()
                            .default("Unknown"),
                    )
                    .col(
                        ColumnDef::new(AnalyticsLogs::Os)
                            .string_len(32)
                            .not_null()
                            .default("Unknown"),
                    )
                    .col(ColumnDef::new(AnalyticsLogs::SessionId).string_len(128).null())
                    .col(ColumnDef::new(AnalyticsLogs::Action).string_len(64).null())
                    .col(ColumnDef::new(AnalyticsLogs::ClientLanguage).string_len(64).null())
                    .col(
                        ColumnDef::new(AnalyticsLogs::ClientScreenResolution)
                            .string_len(32)
                            .null(),
                    )
                    .col(ColumnDef::new(AnalyticsLogs::ClientTimezone).string_len(64).null())
                    .col(ColumnDef::new(AnalyticsLogs::ClientViewport).string_len(32).null())
                    .col(ColumnDef::new(AnalyticsLogs::ClientCookiesEnabled).boolean().null())
                    .col(ColumnDef::new(AnalyticsLogs::ClientOnline).boolean().null())
                    .col(ColumnDef::new(AnalyticsLogs::Country).string_len(100).null())
                    .col(ColumnDef::new(AnalyticsLogs::City).string_len(100).null())
                    .col(ColumnDef::new(AnalyticsLogs::Region).string_len(100).null())
                    .col(ColumnDef::new(AnalyticsLogs::Latitude).double().null())
                    .col(ColumnDef::new(AnalyticsLogs::Longitude).double().null())
                    .to_owned(),
            )
            .await?;

        // timestamp 索引（时间范围查询 + 倒序扫描）
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_analytics_logs_timestamp")
                    .table(AnalyticsLogs::Table)
                    .col(AnalyticsLogs::Timestamp)
                    .to_owned(),
            )
            .await?;

        // ip 索引（单 IP 查询 + distinct 统计）
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_analytics_logs_ip")
                    .table(AnalyticsLogs::Table)
                    .col(AnalyticsLogs::Ip)
                    .to_owned(),
            )
            .await?;

        // session_id 索引（会话回放查询）
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_analytics_logs_session_id")
                    .table(AnalyticsLogs::Table)
                    .col(AnalyticsLogs::SessionId)
                    .to_owned(),
            )
            .await?;

        // action 索引（按 action 计数）
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_analytics_logs_action")
                    .table(AnalyticsLogs::Table)
                    .col(AnalyticsLogs::Action)
                    .to_owned(),
            )
            .await?;

        // 复合索引（时间窗口内按 action 计数）
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_analytics_logs_action_time")
                    .table(AnalyticsLogs::Table)
                    .col(AnalyticsLogs::Action)
                    .col(AnalyticsLogs::Timestamp)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_analytics_logs_action_time")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(Index::drop().name("idx_analytics_logs_action").to_owned())
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("idx_analytics_logs_session_id")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(Index::drop().name("idx_analytics_logs_ip").to_owned())
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("idx_analytics_logs_timestamp")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(AnalyticsLogs::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum AnalyticsLogs {
    #[sea_orm(iden = "analytics_logs")]
    Table,
    Id,
    Timestamp,
    Method,
    Url,
    Path,
    Ip,
    UserAgent,
    Referer,
    AcceptLanguage,
    AcceptEncoding,
    Host,
    StatusCode,
    ResponseTime,
    ContentLength,
    Browser,
    Os,
    SessionId,
    Action,
    ClientLanguage,
    ClientScreenResolution,
    ClientTimezone,
    ClientViewport,
    ClientCookiesEnabled,
    ClientOnline,
    Country,
    City,
    Region,
    Latitude,
    Longitude,
}
