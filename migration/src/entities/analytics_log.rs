//! Analytics log entity for request/interaction telemetry

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "analytics_logs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub timestamp: DateTimeUtc,
    pub method: String,
    #[sea_orm(column_type = "Text")]
    pub url: String,
    #[sea_orm(column_type = "Text")]
    pub path: String,
    pub ip: String,
    #[sea_orm(column_type = "Text")]
    pub user_agent: String,
    #[sea_orm(column_type = "Text")]
    pub referer: String,
    pub accept_language: String,
    pub accept_encoding: String,
    pub host: String,
    pub status_code: Option<i16>,
    pub response_time: Option<i64>,
    pub content_length: i64,
    pub browser: String,
    pub os: String,
    pub session_id: Option<String>,
    pub action: Option<String>,
    pub client_language: Option<String>,
    pub client_screen_resolution: Option<String>,
    pub client_timezone: Option<String>,
    pub client_viewport: Option<String>,
    pub client_cookies_enabled: Option<bool>,
    pub client_online: Option<bool>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
