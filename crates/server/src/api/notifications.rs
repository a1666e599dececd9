use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;

use wegroup_core::domain::notification::Notification;
use wegroup_db::repositories::{NotificationRepository, SqlNotificationRepository};

use crate::api::{ok, ApiEnvelope, ApiError, ApiState};
use crate::auth::authenticate;

const DEFAULT_LIMIT: u32 = 20;
const MAX_LIMIT: u32 = 100;

#[derive(Debug, Deserialize, Default)]
pub struct NotificationQuery {
    pub limit: Option<u32>,
}

pub async fn list_notifications(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Query(query): Query<NotificationQuery>,
) -> Result<Json<ApiEnvelope<Vec<Notification>>>, ApiError> {
    let session = authenticate(&state.db_pool, &headers).await?;
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);

    let notifications = SqlNotificationRepository::new(state.db_pool.clone())
        .list_for_tenant(&session.tenant_id, limit)
        .await
        .map_err(ApiError::internal)?;

    Ok(ok(notifications))
}
