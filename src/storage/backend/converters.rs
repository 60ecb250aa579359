use crate::analytics::{AnalyticsEvent, ClientData, GeoLocation};
use migration::entities::analytics_log;

/// 将 Sea-ORM Model 转换为 AnalyticsEvent（内部 id 不外泄）
pub fn model_to_event(model: analytics_log::Model) -> AnalyticsEvent {
    let client_data = ClientData {
        language: model.client_language,
        screen_resolution: model.client_screen_resolution,
        timezone: model.client_timezone,
        viewport: model.client_viewport,
        cookies_enabled: model.client_cookies_enabled,
        online: model.client_online,
    };

    let location = GeoLocation {
        country: model.country,
        city: model.city,
        region: model.region,
        latitude: model.latitude,
        longitude: model.longitude,
    };

    let has_location = location.country.is_some()
        || location.city.is_some()
        || location.region.is_some()
        || location.latitude.is_some()
        || location.longitude.is_some();

    AnalyticsEvent {
        timestamp: model.timestamp,
        method: model.method,
        url: model.url,
        path: model.path,
        ip: model.ip,
        user_agent: model.user_agent,
        referer: model.referer,
        accept_language: model.accept_language,
        accept_encoding: model.accept_encoding,
        host: model.host,
        status_code: model.status_code.map(|c| c as u16),
        response_time: model.response_time,
        content_length: model.content_length,
        browser: model.browser,
        os: model.os,
        session_id: model.session_id,
        action: model.action,
        client_data: (!client_data.is_empty()).then_some(client_data),
        location: has_location.then_some(location),
    }
}

/// 将 AnalyticsEvent 转换为 ActiveModel（用于插入）
pub fn event_to_active_model(event: &AnalyticsEvent) -> analytics_log::ActiveModel {
    use sea_orm::ActiveValue::Set;

    let client = event.client_data.clone().unwrap_or_default();
    let location = event.location.clone().unwrap_or_default();

    analytics_log::ActiveModel {
        timestamp: Set(event.timestamp),
        method: Set(event.method.clone()),
        url: Set(event.url.clone()),
        path: Set(event.path.clone()),
        ip: Set(event.ip.clone()),
        user_agent: Set(event.user_agent.clone()),
        referer: Set(event.referer.clone()),
        accept_language: Set(event.accept_language.clone()),
        accept_encoding: Set(event.accept_encoding.clone()),
        host: Set(event.host.clone()),
        status_code: Set(event.status_code.map(|c| c as i16)),
        response_time: Set(event.response_time),
        content_length: Set(event.content_length),
        browser: Set(event.browser.clone()),
        os: Set(event.os.clone()),
        session_id: Set(event.session_id.clone()),
        action: Set(event.action.clone()),
        client_language: Set(client.language),
        client_screen_resolution: Set(client.screen_resolution),
        client_timezone: Set(client.timezone),
        client_viewport: Set(client.viewport),
        client_cookies_enabled: Set(client.cookies_enabled),
        client_online: Set(client.online),
        country: Set(location.country),
        city: Set(location.city),
        region: Set(location.region),
        latitude: Set(location.latitude),
        longitude: Set(location.longitude),
        ..Default::default()
    }
}
