use axum::{extract::{Path, Query, State}, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;
use crate::api::dtos::requests::{VenueListQuery, VenueRequest};
use crate::api::extractors::auth::AuthUser;
use crate::domain::models::venue::{Venue, VenueFilter};
use crate::error::AppError;
use crate::state::AppState;
use crate::validation::{is_email, is_uuid, not_blank, Validator};
use std::sync::Arc;
use tracing::info;

fn validate_venue(payload: &VenueRequest, creating: bool) -> Result<(), AppError> {
    let mut validator = Validator::new();
    if creating {
        validator = validator.check("name", payload.name.as_deref().is_some_and(not_blank), "Venue name is required");
    } else {
        validator = validator.optional("name", payload.name.as_deref(), not_blank, "Venue name cannot be empty");
    }

    validator
        .optional("contact_email", payload.contact_email.as_deref(), is_email, "Invalid contact email")
        .optional("hourly_rate", payload.hourly_rate, |rate| rate.is_finite() && rate >= 0.0, "Hourly rate must be a positive number")
        .validate()
}

fn apply(venue: &mut Venue, payload: VenueRequest) {
    if let Some(name) = payload.name { venue.name = name.trim().to_string(); }
    if let Some(address) = payload.address { venue.address = Some(address); }
    if let Some(city) = payload.city { venue.city = Some(city); }
    if let Some(state) = payload.state { venue.state = Some(state); }
    if let Some(country) = payload.country { venue.country = Some(country); }
    if let Some(postal_code) = payload.postal_code { venue.postal_code = Some(postal_code); }
    if let Some(email) = payload.contact_email { venue.contact_email = Some(email.trim().to_string()); }
    if let Some(phone) = payload.contact_phone { venue.contact_phone = Some(phone); }
    if let Some(website) = payload.website { venue.website = Some(website); }
    if let Some(has_pa) = payload.has_pa { venue.has_pa = has_pa; }
    if let Some(has_backline) = payload.has_backline { venue.has_backline = has_backline; }
    if let Some(notes) = payload.notes { venue.notes = Some(notes); }
    if let Some(rate) = payload.hourly_rate { venue.hourly_rate = Some(rate); }
}

async fn load_owned(state: &AppState, id: &str, user_id: &str) -> Result<Venue, AppError> {
    Validator::new().check("id", is_uuid(id), "Invalid venue ID").validate()?;

    let venue = state.venue_repo.find_by_id(id).await?
        .ok_or(AppError::NotFound("Venue not found".into()))?;
    if venue.created_by != user_id {
        return Err(AppError::Forbidden("Only the creator can modify this venue".into()));
    }
    Ok(venue)
}

pub async fn list_venues(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Query(query): Query<VenueListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let filter = VenueFilter {
        search: query.search.filter(|s| !s.trim().is_empty()),
        city: query.city,
        has_pa: query.has_pa,
        has_backline: query.has_backline,
    };

    let venues = state.venue_repo.list(&filter).await?;
    Ok(Json(venues))
}

pub async fn create_venue(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(payload): Json<VenueRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_venue(&payload, true)?;

    let mut venue = Venue::new(String::new(), user.id.clone());
    apply(&mut venue, payload);

    let created = state.venue_repo.create(&venue).await?;
    info!("Created venue {} by user {}", created.id, user.id);
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn get_venue(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Validator::new().check("id", is_uuid(&id), "Invalid venue ID").validate()?;

    let venue = state.venue_repo.find_by_id(&id).await?
        .ok_or(AppError::NotFound("Venue not found".into()))?;
    Ok(Json(venue))
}

pub async fn update_venue(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(payload): Json<VenueRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_venue(&payload, false)?;

    let mut venue = load_owned(&state, &id, &user.id).await?;
    apply(&mut venue, payload);
    venue.updated_at = Utc::now();

    let updated = state.venue_repo.update(&venue).await?;
    Ok(Json(updated))
}

pub async fn delete_venue(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let venue = load_owned(&state, &id, &user.id).await?;
    state.venue_repo.delete(&venue.id).await?;

    info!("Deleted venue {}", venue.id);
    Ok(StatusCode::NO_CONTENT)
}
