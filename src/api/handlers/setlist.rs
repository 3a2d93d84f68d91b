use axum::{extract::{Path, Query, State}, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;
use crate::api::dtos::requests::{ReorderSetlistRequest, SetlistEntryRequest, SetlistListQuery, SetlistRequest};
use crate::api::dtos::responses::SetlistDetailResponse;
use crate::api::extractors::auth::AuthUser;
use crate::domain::models::setlist::{Setlist, SetlistFilter, SetlistSong, SetlistSongDetail};
use crate::domain::services::membership;
use crate::error::AppError;
use crate::state::AppState;
use crate::validation::{is_uuid, not_blank, Validator};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;

fn entry_rules<'a>(validator: Validator<'a>, field: &str, entry: &SetlistEntryRequest) -> Validator<'a> {
    validator
        .check(field, is_uuid(&entry.song_id), "Invalid song ID")
        .optional(field, entry.position, |p| p >= 0, "Position must be zero or greater")
        .optional(field, entry.duration_sec, |d| d >= 1, "Duration must be at least one second")
}

fn validate_setlist(payload: &SetlistRequest, creating: bool) -> Result<(), AppError> {
    let mut validator = Validator::new();
    if creating {
        validator = validator
            .check("band_id", payload.band_id.as_deref().is_some_and(is_uuid), "Valid band ID is required")
            .check("name", payload.name.as_deref().is_some_and(not_blank), "Setlist name is required");
    } else {
        validator = validator
            .optional("name", payload.name.as_deref(), not_blank, "Setlist name cannot be empty")
            .check("songs", payload.songs.is_none(), "Songs are managed through the setlist song endpoints");
    }

    validator = validator.optional("duration_min", payload.duration_min, |d| d >= 0, "Duration must be zero or greater");

    if let Some(songs) = &payload.songs {
        for (i, entry) in songs.iter().enumerate() {
            validator = entry_rules(validator, &format!("songs[{}]", i), entry);
        }
        let distinct_songs: HashSet<&str> = songs.iter().map(|e| e.song_id.as_str()).collect();
        let distinct_positions: HashSet<i32> = songs.iter().enumerate()
            .map(|(i, e)| e.position.unwrap_or(i as i32))
            .collect();
        validator = validator
            .check("songs", distinct_songs.len() == songs.len(), "A song can appear only once per setlist")
            .check("songs", distinct_positions.len() == songs.len(), "Song positions must be distinct");
    }

    validator.validate()
}

async fn load_setlist(state: &AppState, id: &str, user_id: &str) -> Result<Setlist, AppError> {
    Validator::new().check("id", is_uuid(id), "Invalid setlist ID").validate()?;

    let setlist = state.setlist_repo.find_by_id(id).await?
        .ok_or(AppError::NotFound("Setlist not found".into()))?;
    membership::require_member(state.band_repo.as_ref(), &setlist.band_id, user_id).await?;
    Ok(setlist)
}

/// Creator or band admin.
async fn load_managed(state: &AppState, id: &str, user_id: &str) -> Result<Setlist, AppError> {
    Validator::new().check("id", is_uuid(id), "Invalid setlist ID").validate()?;

    let setlist = state.setlist_repo.find_by_id(id).await?
        .ok_or(AppError::NotFound("Setlist not found".into()))?;
    let member = membership::require_member(state.band_repo.as_ref(), &setlist.band_id, user_id).await?;
    if setlist.created_by != user_id && !member.is_admin() {
        return Err(AppError::Forbidden("Only the creator or a band admin can modify this setlist".into()));
    }
    Ok(setlist)
}

/// Songs must come from the setlist's own band.
async fn ensure_band_song(state: &AppState, band_id: &str, song_id: &str) -> Result<(), AppError> {
    let song = state.song_repo.find_by_id(song_id).await?
        .ok_or(AppError::NotFound(format!("Song {} not found", song_id)))?;
    if song.band_id != band_id {
        return Err(AppError::Validation(format!("Song {} does not belong to this band", song_id)));
    }
    Ok(())
}

fn total_duration(songs: &[SetlistSongDetail]) -> i64 {
    songs.iter()
        .map(|s| s.duration_sec.or(s.song_duration_sec).unwrap_or(0) as i64)
        .sum()
}

async fn detail(state: &AppState, setlist: Setlist) -> Result<SetlistDetailResponse, AppError> {
    let songs = state.setlist_repo.list_songs(&setlist.id).await?;
    let total_duration_sec = total_duration(&songs);
    Ok(SetlistDetailResponse { setlist, songs, total_duration_sec })
}

pub async fn list_setlists(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(query): Query<SetlistListQuery>,
) -> Result<impl IntoResponse, AppError> {
    Validator::new()
        .optional("band_id", query.band_id.as_deref(), is_uuid, "Invalid band ID")
        .validate()?;

    if let Some(band_id) = &query.band_id {
        membership::require_member(state.band_repo.as_ref(), band_id, &user.id).await?;
    }

    let filter = SetlistFilter {
        band_id: query.band_id,
        search: query.search.filter(|s| !s.trim().is_empty()),
    };

    let setlists = state.setlist_repo.list_for_user(&user.id, &filter).await?;
    Ok(Json(setlists))
}

pub async fn create_setlist(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(payload): Json<SetlistRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_setlist(&payload, true)?;

    let band_id = payload.band_id.clone().unwrap_or_default();
    membership::require_member(state.band_repo.as_ref(), &band_id, &user.id).await?;

    let mut setlist = Setlist::new(band_id, payload.name.unwrap_or_default().trim().to_string(), user.id.clone());
    setlist.description = payload.description;
    setlist.is_template = payload.is_template.unwrap_or(false);
    setlist.duration_min = payload.duration_min;

    let mut entries = Vec::new();
    for (i, entry) in payload.songs.unwrap_or_default().into_iter().enumerate() {
        ensure_band_song(&state, &setlist.band_id, &entry.song_id).await?;
        let mut song = SetlistSong::new(setlist.id.clone(), entry.song_id, entry.position.unwrap_or(i as i32));
        song.duration_sec = entry.duration_sec;
        song.notes = entry.notes;
        entries.push(song);
    }

    let created = state.setlist_repo.create(&setlist, &entries).await?;
    info!("Created setlist {} with {} songs for band {}", created.id, entries.len(), created.band_id);
    Ok((StatusCode::CREATED, Json(detail(&state, created).await?)))
}

pub async fn get_setlist(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let setlist = load_setlist(&state, &id, &user.id).await?;
    Ok(Json(detail(&state, setlist).await?))
}

pub async fn update_setlist(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(payload): Json<SetlistRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_setlist(&payload, false)?;

    let mut setlist = load_managed(&state, &id, &user.id).await?;
    if let Some(name) = payload.name { setlist.name = name.trim().to_string(); }
    if let Some(description) = payload.description { setlist.description = Some(description); }
    if let Some(is_template) = payload.is_template { setlist.is_template = is_template; }
    if let Some(duration) = payload.duration_min { setlist.duration_min = Some(duration); }
    setlist.updated_at = Utc::now();

    let updated = state.setlist_repo.update(&setlist).await?;
    Ok(Json(updated))
}

pub async fn delete_setlist(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let setlist = load_managed(&state, &id, &user.id).await?;
    state.setlist_repo.delete(&setlist.id).await?;

    info!("Deleted setlist {}", setlist.id);
    Ok(StatusCode::NO_CONTENT)
}

/// Appends after the current last slot unless a position is given.
pub async fn add_song(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(payload): Json<SetlistEntryRequest>,
) -> Result<impl IntoResponse, AppError> {
    entry_rules(Validator::new(), "song_id", &payload).validate()?;

    let setlist = load_managed(&state, &id, &user.id).await?;
    ensure_band_song(&state, &setlist.band_id, &payload.song_id).await?;

    let position = match payload.position {
        Some(position) => position,
        None => state.setlist_repo.list_songs(&setlist.id).await?
            .iter()
            .map(|s| s.position + 1)
            .max()
            .unwrap_or(0),
    };

    let mut entry = SetlistSong::new(setlist.id.clone(), payload.song_id, position);
    entry.duration_sec = payload.duration_sec;
    entry.notes = payload.notes;

    let created = state.setlist_repo.add_song(&entry).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn remove_song(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path((id, song_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let setlist = load_managed(&state, &id, &user.id).await?;
    state.setlist_repo.remove_song(&setlist.id, &song_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Takes `{ songs: [{ id, position }] }` where `id` is the setlist entry.
pub async fn reorder_songs(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(payload): Json<ReorderSetlistRequest>,
) -> Result<impl IntoResponse, AppError> {
    let distinct_ids: HashSet<&str> = payload.songs.iter().map(|e| e.id.as_str()).collect();
    let distinct_positions: HashSet<i32> = payload.songs.iter().map(|e| e.position).collect();

    Validator::new()
        .check("songs", !payload.songs.is_empty(), "At least one entry is required")
        .check("songs", distinct_ids.len() == payload.songs.len(), "Entries must be distinct")
        .check("songs", distinct_positions.len() == payload.songs.len(), "Positions must be distinct")
        .check("songs", payload.songs.iter().all(|e| e.position >= 0), "Positions must be zero or greater")
        .validate()?;

    let setlist = load_managed(&state, &id, &user.id).await?;

    let order: Vec<(String, i32)> = payload.songs.into_iter().map(|e| (e.id, e.position)).collect();
    state.setlist_repo.reorder(&setlist.id, &order).await?;

    let songs = state.setlist_repo.list_songs(&setlist.id).await?;
    Ok(Json(songs))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(position: i32, duration_sec: Option<i32>, song_duration_sec: Option<i32>) -> SetlistSongDetail {
        SetlistSongDetail {
            id: format!("entry-{}", position),
            song_id: format!("song-{}", position),
            position,
            duration_sec,
            notes: None,
            title: "Song".into(),
            artist: None,
            key_signature: None,
            bpm: None,
            song_duration_sec,
        }
    }

    #[test]
    fn slot_duration_overrides_song_length() {
        let songs = vec![slot(0, Some(300), Some(200)), slot(1, None, Some(180)), slot(2, None, None)];
        assert_eq!(total_duration(&songs), 480);
    }

    #[test]
    fn duplicate_songs_are_rejected_before_touching_the_database() {
        let entry = |song_id: &str| SetlistEntryRequest { song_id: song_id.into(), position: None, duration_sec: None, notes: None };
        let id = uuid::Uuid::new_v4().to_string();
        let payload = SetlistRequest {
            band_id: Some(uuid::Uuid::new_v4().to_string()),
            name: Some("Friday".into()),
            songs: Some(vec![entry(&id), entry(&id)]),
            ..Default::default()
        };

        let Err(AppError::InvalidFields(errors)) = validate_setlist(&payload, true) else {
            panic!("expected field errors");
        };
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "songs");
    }
}
