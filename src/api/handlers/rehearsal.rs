use axum::{extract::{Path, Query, State}, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;
use crate::api::dtos::requests::{AttendanceRequest, CreateRehearsalRequest, RehearsalListQuery, UpdateRehearsalRequest};
use crate::api::dtos::responses::RehearsalDetailResponse;
use crate::api::extractors::auth::AuthUser;
use crate::domain::models::rehearsal::{
    Rehearsal, RehearsalAttendee, RehearsalFilter, ATTENDANCE_STATUSES, REHEARSAL_STATUSES, STATUS_CANCELLED,
};
use crate::domain::models::{notification, realtime};
use crate::domain::services::{membership, notifier};
use crate::error::AppError;
use crate::state::AppState;
use crate::validation::{is_uuid, not_blank, parse_timestamp, Validator};
use serde_json::json;
use std::sync::Arc;
use tracing::info;

fn is_rehearsal_status(status: &str) -> bool {
    REHEARSAL_STATUSES.contains(&status)
}

async fn load_rehearsal(state: &AppState, id: &str) -> Result<Rehearsal, AppError> {
    state.rehearsal_repo.find_by_id(id).await?
        .ok_or(AppError::NotFound("Rehearsal not found".into()))
}

/// Creator or band admin.
async fn ensure_can_manage(state: &AppState, rehearsal: &Rehearsal, user_id: &str) -> Result<(), AppError> {
    let member = membership::require_member(state.band_repo.as_ref(), &rehearsal.band_id, user_id).await?;
    if rehearsal.created_by == user_id || member.is_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden("Only the creator or a band admin can modify this rehearsal".into()))
    }
}

async fn other_members(state: &AppState, band_id: &str, except: &str) -> Result<Vec<String>, AppError> {
    Ok(state.band_repo.list_members(band_id).await?
        .into_iter()
        .map(|m| m.user_id)
        .filter(|id| id != except)
        .collect())
}

pub async fn list_rehearsals(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(query): Query<RehearsalListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let start = query.start_date.as_deref().map(|v| parse_timestamp(v, chrono_tz::UTC));
    let end = query.end_date.as_deref().map(|v| parse_timestamp(v, chrono_tz::UTC));

    Validator::new()
        .optional("band_id", query.band_id.as_deref(), is_uuid, "Invalid band ID")
        .check("start_date", !matches!(start, Some(None)), "Invalid start date format")
        .check("end_date", !matches!(end, Some(None)), "Invalid end date format")
        .optional("status", query.status.as_deref(), is_rehearsal_status, "Invalid status")
        .validate()?;

    let filter = RehearsalFilter {
        band_id: query.band_id,
        start: start.flatten(),
        end: end.flatten(),
        status: query.status,
    };

    let rehearsals = state.rehearsal_repo.list_for_user(&user.id, &filter).await?;
    Ok(Json(rehearsals))
}

pub async fn create_rehearsal(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(payload): Json<CreateRehearsalRequest>,
) -> Result<impl IntoResponse, AppError> {
    let start = parse_timestamp(&payload.start_time, chrono_tz::UTC);
    let end = parse_timestamp(&payload.end_time, chrono_tz::UTC);

    Validator::new()
        .check("band_id", is_uuid(&payload.band_id), "Valid band ID is required")
        .check("title", not_blank(&payload.title), "Title is required")
        .optional("venue_id", payload.venue_id.as_deref(), is_uuid, "Invalid venue ID")
        .check("start_time", start.is_some(), "Valid start time is required")
        .check("end_time", end.is_some(), "Valid end time is required")
        .check("end_time", match (start, end) { (Some(s), Some(e)) => e > s, _ => true }, "End time must be after start time")
        .validate()?;

    let (Some(start), Some(end)) = (start, end) else {
        return Err(AppError::Internal);
    };

    membership::require_member(state.band_repo.as_ref(), &payload.band_id, &user.id).await?;

    if let Some(venue_id) = &payload.venue_id {
        state.venue_repo.find_by_id(venue_id).await?
            .ok_or(AppError::NotFound("Venue not found".into()))?;
    }

    let mut rehearsal = Rehearsal::new(payload.band_id.clone(), payload.title.trim().to_string(), start, end, user.id.clone());
    rehearsal.description = payload.description;
    rehearsal.venue_id = payload.venue_id;

    let members = state.band_repo.list_members(&rehearsal.band_id).await?;
    let attendees: Vec<RehearsalAttendee> = members.iter()
        .map(|m| RehearsalAttendee::new(rehearsal.id.clone(), m.user_id.clone()))
        .collect();

    let created = state.rehearsal_repo.create(&rehearsal, &attendees).await?;

    let recipients: Vec<String> = members.into_iter().map(|m| m.user_id).filter(|id| *id != user.id).collect();
    notifier::notify_users(
        state.notification_repo.as_ref(),
        &recipients,
        notification::REHEARSAL_CREATED,
        "New rehearsal scheduled",
        &format!("{} on {}", created.title, created.start_time.format("%Y-%m-%d %H:%M UTC")),
        &json!({ "rehearsal_id": created.id, "band_id": created.band_id }),
    ).await?;
    notifier::publish(state.broadcaster.as_ref(), realtime::REHEARSAL_CREATED, &created.band_id, json!(created)).await;

    info!("Created rehearsal {} for band {}", created.id, created.band_id);
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn get_rehearsal(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let rehearsal = load_rehearsal(&state, &id).await?;
    membership::require_member(state.band_repo.as_ref(), &rehearsal.band_id, &user.id).await?;

    let attendees = state.rehearsal_repo.list_attendees(&rehearsal.id).await?;
    Ok(Json(RehearsalDetailResponse { rehearsal, attendees }))
}

pub async fn update_rehearsal(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(payload): Json<UpdateRehearsalRequest>,
) -> Result<impl IntoResponse, AppError> {
    let start = payload.start_time.as_deref().map(|v| parse_timestamp(v, chrono_tz::UTC));
    let end = payload.end_time.as_deref().map(|v| parse_timestamp(v, chrono_tz::UTC));

    Validator::new()
        .optional("title", payload.title.as_deref(), not_blank, "Title cannot be empty")
        .optional("venue_id", payload.venue_id.as_deref(), is_uuid, "Invalid venue ID")
        .check("start_time", !matches!(start, Some(None)), "Invalid start time format")
        .check("end_time", !matches!(end, Some(None)), "Invalid end time format")
        .optional("status", payload.status.as_deref(), is_rehearsal_status, "Invalid status")
        .validate()?;

    let mut rehearsal = load_rehearsal(&state, &id).await?;
    ensure_can_manage(&state, &rehearsal, &user.id).await?;

    if let Some(venue_id) = &payload.venue_id {
        state.venue_repo.find_by_id(venue_id).await?
            .ok_or(AppError::NotFound("Venue not found".into()))?;
    }

    let new_start = start.flatten().unwrap_or(rehearsal.start_time);
    let new_end = end.flatten().unwrap_or(rehearsal.end_time);
    Validator::new()
        .check("end_time", new_end > new_start, "End time must be after start time")
        .validate()?;

    if new_start != rehearsal.start_time {
        rehearsal.reminder_sent = false;
    }
    rehearsal.start_time = new_start;
    rehearsal.end_time = new_end;
    if let Some(title) = payload.title { rehearsal.title = title.trim().to_string(); }
    if let Some(description) = payload.description { rehearsal.description = Some(description); }
    if let Some(venue_id) = payload.venue_id { rehearsal.venue_id = Some(venue_id); }

    let was_cancelled = rehearsal.status == STATUS_CANCELLED;
    if let Some(status) = payload.status { rehearsal.status = status; }
    rehearsal.updated_at = Utc::now();

    let updated = state.rehearsal_repo.update(&rehearsal).await?;

    let (kind, title) = if updated.status == STATUS_CANCELLED && !was_cancelled {
        (notification::REHEARSAL_CANCELLED, "Rehearsal cancelled")
    } else {
        (notification::REHEARSAL_UPDATED, "Rehearsal updated")
    };
    let recipients = other_members(&state, &updated.band_id, &user.id).await?;
    notifier::notify_users(
        state.notification_repo.as_ref(),
        &recipients,
        kind,
        title,
        &format!("{} on {}", updated.title, updated.start_time.format("%Y-%m-%d %H:%M UTC")),
        &json!({ "rehearsal_id": updated.id, "band_id": updated.band_id }),
    ).await?;
    notifier::publish(state.broadcaster.as_ref(), realtime::REHEARSAL_UPDATED, &updated.band_id, json!(updated)).await;

    Ok(Json(updated))
}

pub async fn delete_rehearsal(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let rehearsal = load_rehearsal(&state, &id).await?;
    ensure_can_manage(&state, &rehearsal, &user.id).await?;

    state.rehearsal_repo.delete(&rehearsal.id).await?;

    if rehearsal.status != STATUS_CANCELLED && rehearsal.start_time > Utc::now() {
        let recipients = other_members(&state, &rehearsal.band_id, &user.id).await?;
        notifier::notify_users(
            state.notification_repo.as_ref(),
            &recipients,
            notification::REHEARSAL_CANCELLED,
            "Rehearsal cancelled",
            &format!("{} on {} was removed", rehearsal.title, rehearsal.start_time.format("%Y-%m-%d %H:%M UTC")),
            &json!({ "rehearsal_id": rehearsal.id, "band_id": rehearsal.band_id }),
        ).await?;
    }
    notifier::publish(
        state.broadcaster.as_ref(),
        realtime::REHEARSAL_DELETED,
        &rehearsal.band_id,
        json!({ "rehearsal_id": rehearsal.id }),
    ).await;

    info!("Deleted rehearsal {}", rehearsal.id);
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_attendees(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let rehearsal = load_rehearsal(&state, &id).await?;
    membership::require_member(state.band_repo.as_ref(), &rehearsal.band_id, &user.id).await?;

    let attendees = state.rehearsal_repo.list_attendees(&rehearsal.id).await?;
    Ok(Json(attendees))
}

/// Records the caller's own response.
pub async fn update_attendance(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(payload): Json<AttendanceRequest>,
) -> Result<impl IntoResponse, AppError> {
    Validator::new()
        .check("status", ATTENDANCE_STATUSES.contains(&payload.status.as_str()), "Invalid attendance status")
        .validate()?;

    let rehearsal = load_rehearsal(&state, &id).await?;
    membership::require_member(state.band_repo.as_ref(), &rehearsal.band_id, &user.id).await?;

    let mut attendee = RehearsalAttendee::new(rehearsal.id.clone(), user.id.clone());
    attendee.status = payload.status;
    attendee.comment = payload.comment;
    attendee.responded_at = Some(Utc::now());

    let saved = state.rehearsal_repo.upsert_attendance(&attendee).await?;
    notifier::publish(
        state.broadcaster.as_ref(),
        realtime::ATTENDANCE_UPDATED,
        &rehearsal.band_id,
        json!({ "rehearsal_id": rehearsal.id, "user_id": saved.user_id, "status": saved.status }),
    ).await;

    Ok(Json(saved))
}
