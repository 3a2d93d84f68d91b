use axum::{extract::{Path, State}, http::StatusCode, response::IntoResponse, Json};
use crate::api::dtos::requests::{AddMemberRequest, CreateBandRequest, UpdateBandRequest, UpdateMemberRequest};
use crate::api::dtos::responses::BandDetailResponse;
use crate::api::extractors::{auth::AuthUser, band::BandMembership};
use crate::domain::models::band::{Band, BandMember, ROLE_ADMIN, ROLE_MEMBER};
use crate::domain::models::{notification, realtime};
use crate::domain::services::notifier;
use crate::error::AppError;
use crate::state::AppState;
use crate::validation::{is_email, not_blank, Validator};
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

fn is_band_role(role: &str) -> bool {
    role == ROLE_ADMIN || role == ROLE_MEMBER
}

pub async fn list_bands(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let bands = state.band_repo.list_for_user(&user.id).await?;
    Ok(Json(bands))
}

pub async fn create_band(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(payload): Json<CreateBandRequest>,
) -> Result<impl IntoResponse, AppError> {
    Validator::new()
        .check("name", not_blank(&payload.name), "Band name is required")
        .check("name", payload.name.chars().count() <= 100, "Band name must be at most 100 characters")
        .validate()?;

    let mut band = Band::new(payload.name.trim().to_string(), user.id.clone());
    band.description = payload.description;
    band.genre = payload.genre;
    band.logo_url = payload.logo_url;
    band.website = payload.website;

    let founder = BandMember::new(band.id.clone(), user.id.clone(), ROLE_ADMIN);
    let created = state.band_repo.create(&band, &founder).await?;

    info!("Created band {} by user {}", created.id, user.id);
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn get_band(
    State(state): State<Arc<AppState>>,
    access: BandMembership,
) -> Result<impl IntoResponse, AppError> {
    let band = state.band_repo.find_by_id(access.band_id()).await?
        .ok_or(AppError::NotFound("Band not found".into()))?;
    let members = state.band_repo.list_members(access.band_id()).await?;

    Ok(Json(BandDetailResponse { band, members }))
}

pub async fn update_band(
    State(state): State<Arc<AppState>>,
    access: BandMembership,
    Json(payload): Json<UpdateBandRequest>,
) -> Result<impl IntoResponse, AppError> {
    access.require_admin()?;

    Validator::new()
        .optional("name", payload.name.as_deref(), not_blank, "Band name must not be empty")
        .validate()?;

    let mut band = state.band_repo.find_by_id(access.band_id()).await?
        .ok_or(AppError::NotFound("Band not found".into()))?;

    if let Some(name) = payload.name { band.name = name.trim().to_string(); }
    if let Some(description) = payload.description { band.description = Some(description); }
    if let Some(genre) = payload.genre { band.genre = Some(genre); }
    if let Some(logo_url) = payload.logo_url { band.logo_url = Some(logo_url); }
    if let Some(website) = payload.website { band.website = Some(website); }
    band.updated_at = Utc::now();

    let updated = state.band_repo.update(&band).await?;
    Ok(Json(updated))
}

pub async fn delete_band(
    State(state): State<Arc<AppState>>,
    access: BandMembership,
) -> Result<impl IntoResponse, AppError> {
    access.require_admin()?;
    state.band_repo.delete(access.band_id()).await?;

    info!("Deleted band {}", access.band_id());
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_members(
    State(state): State<Arc<AppState>>,
    access: BandMembership,
) -> Result<impl IntoResponse, AppError> {
    let members = state.band_repo.list_members(access.band_id()).await?;
    Ok(Json(members))
}

pub async fn add_member(
    State(state): State<Arc<AppState>>,
    access: BandMembership,
    Json(payload): Json<AddMemberRequest>,
) -> Result<impl IntoResponse, AppError> {
    access.require_admin()?;

    Validator::new()
        .check("email", is_email(payload.email.trim()), "Please provide a valid email")
        .optional("role", payload.role.as_deref(), is_band_role, "Role must be admin or member")
        .validate()?;

    let user = state.user_repo.find_by_email(payload.email.trim()).await?
        .ok_or(AppError::NotFound("User not found".into()))?;

    if state.band_repo.find_member(access.band_id(), &user.id).await?.is_some() {
        return Err(AppError::Conflict("User is already a member of this band".into()));
    }

    let role = payload.role.as_deref().unwrap_or(ROLE_MEMBER);
    let mut member = BandMember::new(access.band_id().to_string(), user.id.clone(), role);
    member.instrument = payload.instrument;
    member.nickname = payload.nickname;

    let created = state.band_repo.add_member(&member).await?;

    let band_name = state.band_repo.find_by_id(access.band_id()).await?
        .map(|b| b.name)
        .unwrap_or_default();
    notifier::notify_users(
        state.notification_repo.as_ref(),
        std::slice::from_ref(&user.id),
        notification::BAND_MEMBER_ADDED,
        "Added to band",
        &format!("You have been added to {}", band_name),
        &json!({ "band_id": access.band_id(), "role": created.role }),
    ).await?;
    notifier::publish(
        state.broadcaster.as_ref(),
        realtime::MEMBER_ADDED,
        access.band_id(),
        json!({ "user_id": created.user_id, "role": created.role }),
    ).await;

    info!("Added user {} to band {}", user.id, access.band_id());
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_member(
    State(state): State<Arc<AppState>>,
    access: BandMembership,
    Path((_, user_id)): Path<(String, String)>,
    Json(payload): Json<UpdateMemberRequest>,
) -> Result<impl IntoResponse, AppError> {
    access.require_admin()?;

    Validator::new()
        .optional("role", payload.role.as_deref(), is_band_role, "Role must be admin or member")
        .validate()?;

    let mut member = state.band_repo.find_member(access.band_id(), &user_id).await?
        .ok_or(AppError::NotFound("Member not found".into()))?;

    if let Some(role) = payload.role {
        if member.is_admin() && role != ROLE_ADMIN && state.band_repo.count_admins(access.band_id()).await? <= 1 {
            return Err(AppError::Conflict("Cannot demote the last admin of the band".into()));
        }
        member.role = role;
    }
    if let Some(instrument) = payload.instrument { member.instrument = Some(instrument); }
    if let Some(nickname) = payload.nickname { member.nickname = Some(nickname); }

    let updated = state.band_repo.update_member(&member).await?;
    Ok(Json(updated))
}

/// Admins remove anyone; members may remove themselves.
pub async fn remove_member(
    State(state): State<Arc<AppState>>,
    access: BandMembership,
    Path((_, user_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    if access.user.id != user_id {
        access.require_admin()?;
    }

    let member = state.band_repo.find_member(access.band_id(), &user_id).await?
        .ok_or(AppError::NotFound("Member not found".into()))?;

    if member.is_admin() && state.band_repo.count_admins(access.band_id()).await? <= 1 {
        return Err(AppError::Conflict("Cannot remove the last admin of the band".into()));
    }

    state.band_repo.remove_member(access.band_id(), &user_id).await?;
    notifier::publish(
        state.broadcaster.as_ref(),
        realtime::MEMBER_REMOVED,
        access.band_id(),
        json!({ "user_id": user_id }),
    ).await;

    info!("Removed user {} from band {}", user_id, access.band_id());
    Ok(StatusCode::NO_CONTENT)
}
