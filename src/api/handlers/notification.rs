use axum::{extract::{Path, Query, State}, http::StatusCode, response::IntoResponse, Json};
use crate::api::dtos::requests::NotificationListQuery;
use crate::api::dtos::responses::{NotificationListResponse, NotificationResponse};
use crate::api::extractors::auth::AuthUser;
use crate::domain::models::notification::NotificationFilter;
use crate::error::AppError;
use crate::state::AppState;
use crate::validation::{is_uuid, Validator};
use serde_json::json;
use std::sync::Arc;

const MAX_PAGE_SIZE: i64 = 100;

pub async fn list_notifications(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(query): Query<NotificationListQuery>,
) -> Result<impl IntoResponse, AppError> {
    Validator::new()
        .optional("limit", query.limit, |l| (1..=MAX_PAGE_SIZE).contains(&l), "Limit must be between 1 and 100")
        .optional("offset", query.offset, |o| o >= 0, "Offset must be a non-negative integer")
        .validate()?;

    let defaults = NotificationFilter::default();
    let filter = NotificationFilter {
        unread_only: query.unread_only.unwrap_or(false),
        notification_type: query.notification_type,
        limit: query.limit.unwrap_or(defaults.limit),
        offset: query.offset.unwrap_or(defaults.offset),
    };

    let (notifications, unread_count) = tokio::try_join!(
        state.notification_repo.list_for_user(&user.id, &filter),
        state.notification_repo.count_unread(&user.id),
    )?;

    Ok(Json(NotificationListResponse {
        notifications: notifications.into_iter().map(NotificationResponse::from).collect(),
        unread_count,
        limit: filter.limit,
        offset: filter.offset,
    }))
}

pub async fn mark_read(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Validator::new().check("id", is_uuid(&id), "Invalid notification ID").validate()?;

    state.notification_repo.mark_read(&user.id, &id).await?;
    let notification = state.notification_repo.find_by_id(&user.id, &id).await?
        .ok_or(AppError::NotFound("Notification not found".into()))?;

    Ok(Json(NotificationResponse::from(notification)))
}

pub async fn mark_all_read(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let updated = state.notification_repo.mark_all_read(&user.id).await?;
    Ok(Json(json!({ "updated": updated })))
}

pub async fn delete_notification(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Validator::new().check("id", is_uuid(&id), "Invalid notification ID").validate()?;

    state.notification_repo.delete(&user.id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_all(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let deleted = state.notification_repo.delete_all(&user.id).await?;
    Ok(Json(json!({ "deleted": deleted })))
}
