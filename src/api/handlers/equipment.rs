use axum::{extract::{Path, Query, State}, http::StatusCode, response::IntoResponse, Json};
use chrono::{NaiveDate, Utc};
use crate::api::dtos::requests::{AssignEquipmentRequest, EquipmentListQuery, EquipmentRequest};
use crate::api::extractors::auth::AuthUser;
use crate::domain::models::equipment::{Equipment, EquipmentFilter, RehearsalEquipment};
use crate::domain::models::rehearsal::Rehearsal;
use crate::domain::services::membership;
use crate::error::AppError;
use crate::state::AppState;
use crate::validation::{is_uuid, not_blank, Validator};
use serde_json::json;
use std::sync::Arc;
use tracing::info;

fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

fn non_negative(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

fn validate_equipment(payload: &EquipmentRequest, creating: bool) -> Result<(), AppError> {
    let mut validator = Validator::new();
    if creating {
        validator = validator
            .check("name", payload.name.as_deref().is_some_and(not_blank), "Equipment name is required")
            .check("type", payload.equipment_type.as_deref().is_some_and(not_blank), "Equipment type is required")
            .optional("band_id", payload.band_id.as_deref(), is_uuid, "Invalid band ID")
            .optional("user_id", payload.user_id.as_deref(), is_uuid, "Invalid user ID")
            .check("band_id", !(payload.band_id.is_some() && payload.user_id.is_some()), "Equipment belongs to a band or a user, not both");
    } else {
        validator = validator
            .optional("name", payload.name.as_deref(), not_blank, "Equipment name cannot be empty")
            .optional("type", payload.equipment_type.as_deref(), not_blank, "Equipment type cannot be empty")
            .check("band_id", payload.band_id.is_none() && payload.user_id.is_none(), "Ownership cannot be changed");
    }

    validator
        .optional("purchase_date", payload.purchase_date.as_deref(), |d| parse_date(d).is_some(), "Purchase date must be YYYY-MM-DD")
        .optional("purchase_price", payload.purchase_price, non_negative, "Purchase price must be a positive number")
        .optional("weight_kg", payload.weight_kg, non_negative, "Weight must be a positive number")
        .validate()
}

fn apply(equipment: &mut Equipment, payload: EquipmentRequest) {
    if let Some(name) = payload.name { equipment.name = name.trim().to_string(); }
    if let Some(kind) = payload.equipment_type { equipment.equipment_type = kind.trim().to_string(); }
    if let Some(description) = payload.description { equipment.description = Some(description); }
    if let Some(brand) = payload.brand { equipment.brand = Some(brand); }
    if let Some(model) = payload.model { equipment.model = Some(model); }
    if let Some(serial) = payload.serial_number { equipment.serial_number = Some(serial); }
    if let Some(date) = payload.purchase_date.as_deref().and_then(parse_date) { equipment.purchase_date = Some(date); }
    if let Some(price) = payload.purchase_price { equipment.purchase_price = Some(price); }
    if let Some(notes) = payload.notes { equipment.notes = Some(notes); }
    if let Some(is_backline) = payload.is_backline { equipment.is_backline = is_backline; }
    if let Some(needs_power) = payload.needs_power { equipment.needs_power = needs_power; }
    if let Some(weight) = payload.weight_kg { equipment.weight_kg = Some(weight); }
    if let Some(dimensions) = payload.dimensions { equipment.dimensions = Some(dimensions); }
    if let Some(photos) = payload.photos { equipment.photos_json = json!(photos).to_string(); }
}

/// Personal gear is visible to its owner, band gear to every band member.
async fn ensure_visible(state: &AppState, equipment: &Equipment, user_id: &str) -> Result<(), AppError> {
    match (&equipment.band_id, &equipment.user_id) {
        (Some(band_id), _) => {
            membership::require_member(state.band_repo.as_ref(), band_id, user_id).await?;
            Ok(())
        }
        (None, Some(owner)) if owner == user_id => Ok(()),
        _ => Err(AppError::Forbidden("This equipment belongs to another user".into())),
    }
}

/// Personal gear is managed by its owner, band gear by band admins.
async fn ensure_can_manage(state: &AppState, equipment: &Equipment, user_id: &str) -> Result<(), AppError> {
    match (&equipment.band_id, &equipment.user_id) {
        (Some(band_id), _) => {
            let member = membership::require_member(state.band_repo.as_ref(), band_id, user_id).await?;
            membership::ensure_admin(&member)
        }
        (None, Some(owner)) if owner == user_id => Ok(()),
        _ => Err(AppError::Forbidden("Only the owner can modify this equipment".into())),
    }
}

async fn load_equipment(state: &AppState, id: &str) -> Result<Equipment, AppError> {
    Validator::new().check("id", is_uuid(id), "Invalid equipment ID").validate()?;

    state.equipment_repo.find_by_id(id).await?
        .ok_or(AppError::NotFound("Equipment not found".into()))
}

async fn load_rehearsal(state: &AppState, rehearsal_id: &str, user_id: &str) -> Result<Rehearsal, AppError> {
    Validator::new().check("rehearsal_id", is_uuid(rehearsal_id), "Invalid rehearsal ID").validate()?;

    let rehearsal = state.rehearsal_repo.find_by_id(rehearsal_id).await?
        .ok_or(AppError::NotFound("Rehearsal not found".into()))?;
    membership::require_member(state.band_repo.as_ref(), &rehearsal.band_id, user_id).await?;
    Ok(rehearsal)
}

pub async fn list_equipment(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(query): Query<EquipmentListQuery>,
) -> Result<impl IntoResponse, AppError> {
    Validator::new()
        .optional("band_id", query.band_id.as_deref(), is_uuid, "Invalid band ID")
        .optional("user_id", query.user_id.as_deref(), is_uuid, "Invalid user ID")
        .validate()?;

    let filter = EquipmentFilter {
        band_id: query.band_id,
        user_id: query.user_id,
        equipment_type: query.equipment_type.filter(|t| !t.trim().is_empty()),
        search: query.search.filter(|s| !s.trim().is_empty()),
    };

    let equipment = state.equipment_repo.list_visible(&user.id, &filter).await?;
    Ok(Json(equipment))
}

/// Without a band the item is the caller's own gear.
pub async fn create_equipment(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(mut payload): Json<EquipmentRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_equipment(&payload, true)?;

    let band_id = payload.band_id.take();
    let owner = payload.user_id.take();

    if let Some(band_id) = &band_id {
        membership::require_member(state.band_repo.as_ref(), band_id, &user.id).await?;
    } else if owner.as_deref().is_some_and(|owner| owner != user.id) {
        return Err(AppError::Forbidden("Personal equipment can only be added for yourself".into()));
    }

    let mut equipment = Equipment::new(String::new(), String::new());
    equipment.user_id = if band_id.is_none() { Some(user.id.clone()) } else { None };
    equipment.band_id = band_id;
    apply(&mut equipment, payload);

    let created = state.equipment_repo.create(&equipment).await?;
    info!("Created equipment {} by user {}", created.id, user.id);
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn get_equipment(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let equipment = load_equipment(&state, &id).await?;
    ensure_visible(&state, &equipment, &user.id).await?;
    Ok(Json(equipment))
}

pub async fn update_equipment(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(payload): Json<EquipmentRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_equipment(&payload, false)?;

    let mut equipment = load_equipment(&state, &id).await?;
    ensure_can_manage(&state, &equipment, &user.id).await?;

    apply(&mut equipment, payload);
    equipment.updated_at = Utc::now();

    let updated = state.equipment_repo.update(&equipment).await?;
    Ok(Json(updated))
}

pub async fn delete_equipment(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let equipment = load_equipment(&state, &id).await?;
    ensure_can_manage(&state, &equipment, &user.id).await?;

    state.equipment_repo.delete(&equipment.id).await?;
    info!("Deleted equipment {}", equipment.id);
    Ok(StatusCode::NO_CONTENT)
}

pub async fn rehearsal_equipment(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(rehearsal_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let rehearsal = load_rehearsal(&state, &rehearsal_id, &user.id).await?;
    let assigned = state.equipment_repo.list_for_rehearsal(&rehearsal.id).await?;
    Ok(Json(assigned))
}

/// Already assigned gear is skipped. Band gear must belong to the rehearsing band.
pub async fn assign_equipment(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(rehearsal_id): Path<String>,
    Json(payload): Json<AssignEquipmentRequest>,
) -> Result<impl IntoResponse, AppError> {
    Validator::new()
        .check("equipment_ids", !payload.equipment_ids.is_empty(), "At least one equipment ID is required")
        .check("equipment_ids", payload.equipment_ids.iter().all(|id| is_uuid(id)), "Invalid equipment ID")
        .validate()?;

    let rehearsal = load_rehearsal(&state, &rehearsal_id, &user.id).await?;

    let mut checked = Vec::with_capacity(payload.equipment_ids.len());
    for equipment_id in &payload.equipment_ids {
        let equipment = load_equipment(&state, equipment_id).await?;
        ensure_visible(&state, &equipment, &user.id).await?;
        if equipment.band_id.as_deref().is_some_and(|band_id| band_id != rehearsal.band_id) {
            return Err(AppError::Validation(format!("Equipment {} belongs to another band", equipment.id)));
        }
        checked.push(equipment);
    }

    let mut inserted = 0;
    for equipment in checked {
        let mut assignment = RehearsalEquipment::new(rehearsal.id.clone(), equipment.id, user.id.clone());
        assignment.notes = payload.notes.clone();
        if state.equipment_repo.assign(&assignment).await? {
            inserted += 1;
        }
    }

    info!("Assigned {} equipment items to rehearsal {}", inserted, rehearsal.id);
    let assigned = state.equipment_repo.list_for_rehearsal(&rehearsal.id).await?;
    Ok((StatusCode::CREATED, Json(assigned)))
}

pub async fn unassign_equipment(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path((rehearsal_id, equipment_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let rehearsal = load_rehearsal(&state, &rehearsal_id, &user.id).await?;
    state.equipment_repo.unassign(&rehearsal.id, &equipment_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
