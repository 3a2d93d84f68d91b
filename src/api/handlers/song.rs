use axum::{extract::{Path, Query, State}, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;
use crate::api::dtos::requests::{AttachmentRequest, SongListQuery, SongNoteRequest, SongRequest};
use crate::api::dtos::responses::SongDetailResponse;
use crate::api::extractors::auth::AuthUser;
use crate::domain::models::band::BandMember;
use crate::domain::models::song::{Song, SongAttachment, SongFilter, SongNote, DIFFICULTIES, SONG_STATUSES};
use crate::domain::services::membership;
use crate::error::AppError;
use crate::state::AppState;
use crate::validation::{is_url, is_uuid, not_blank, Validator};
use std::sync::Arc;
use tracing::info;

fn validate_song(payload: &SongRequest, creating: bool) -> Result<(), AppError> {
    let mut validator = Validator::new();
    if creating {
        validator = validator
            .check("band_id", payload.band_id.as_deref().is_some_and(is_uuid), "Valid band ID is required")
            .check("title", payload.title.as_deref().is_some_and(not_blank), "Song title is required");
    } else {
        validator = validator.optional("title", payload.title.as_deref(), not_blank, "Song title cannot be empty");
    }

    validator
        .optional("bpm", payload.bpm, |bpm| (1..=300).contains(&bpm), "BPM must be between 1 and 300")
        .optional("duration_sec", payload.duration_sec, |d| d >= 1, "Duration must be at least one second")
        .optional("status", payload.status.as_deref(), |s| SONG_STATUSES.contains(&s), "Invalid status")
        .optional("difficulty", payload.difficulty.as_deref(), |d| DIFFICULTIES.contains(&d), "Invalid difficulty")
        .optional("reference_url", payload.reference_url.as_deref(), is_url, "Reference URL must be a valid URL")
        .validate()
}

fn apply(song: &mut Song, payload: SongRequest) {
    if let Some(title) = payload.title { song.title = title.trim().to_string(); }
    if let Some(artist) = payload.artist { song.artist = Some(artist); }
    if let Some(key) = payload.key_signature { song.key_signature = Some(key); }
    if let Some(bpm) = payload.bpm { song.bpm = Some(bpm); }
    if let Some(duration) = payload.duration_sec { song.duration_sec = Some(duration); }
    if let Some(lyrics) = payload.lyrics { song.lyrics = Some(lyrics); }
    if let Some(chart) = payload.chord_chart { song.chord_chart = Some(chart); }
    if let Some(notes) = payload.notes { song.notes = Some(notes); }
    if let Some(status) = payload.status { song.status = status; }
    if let Some(difficulty) = payload.difficulty { song.difficulty = difficulty; }
    if let Some(url) = payload.reference_url { song.reference_url = Some(url); }
}

/// Loads the song and checks the caller plays in its band.
async fn load_song(state: &AppState, id: &str, user_id: &str) -> Result<(Song, BandMember), AppError> {
    Validator::new().check("id", is_uuid(id), "Invalid song ID").validate()?;

    let song = state.song_repo.find_by_id(id).await?
        .ok_or(AppError::NotFound("Song not found".into()))?;
    let member = membership::require_member(state.band_repo.as_ref(), &song.band_id, user_id).await?;
    Ok((song, member))
}

/// Creator or band admin.
async fn load_managed(state: &AppState, id: &str, user_id: &str) -> Result<Song, AppError> {
    let (song, member) = load_song(state, id, user_id).await?;
    if song.created_by != user_id && !member.is_admin() {
        return Err(AppError::Forbidden("Only the creator or a band admin can modify this song".into()));
    }
    Ok(song)
}

pub async fn list_songs(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(query): Query<SongListQuery>,
) -> Result<impl IntoResponse, AppError> {
    Validator::new()
        .optional("band_id", query.band_id.as_deref(), is_uuid, "Invalid band ID")
        .optional("status", query.status.as_deref(), |s| SONG_STATUSES.contains(&s), "Invalid status")
        .validate()?;

    if let Some(band_id) = &query.band_id {
        membership::require_member(state.band_repo.as_ref(), band_id, &user.id).await?;
    }

    let filter = SongFilter {
        band_id: query.band_id,
        status: query.status,
        search: query.search.filter(|s| !s.trim().is_empty()),
    };

    let songs = state.song_repo.list_for_user(&user.id, &filter).await?;
    Ok(Json(songs))
}

pub async fn create_song(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(payload): Json<SongRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_song(&payload, true)?;

    let band_id = payload.band_id.clone().unwrap_or_default();
    membership::require_member(state.band_repo.as_ref(), &band_id, &user.id).await?;

    let mut song = Song::new(band_id, String::new(), user.id.clone());
    apply(&mut song, payload);

    let created = state.song_repo.create(&song).await?;
    info!("Created song {} for band {}", created.id, created.band_id);
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn get_song(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let (song, _) = load_song(&state, &id, &user.id).await?;

    let attachments = state.song_repo.list_attachments(&song.id).await?;
    let member_notes = state.song_repo.list_notes(&song.id).await?;
    Ok(Json(SongDetailResponse { song, attachments, member_notes }))
}

pub async fn update_song(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(payload): Json<SongRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_song(&payload, false)?;

    let mut song = load_managed(&state, &id, &user.id).await?;
    apply(&mut song, payload);
    song.updated_at = Utc::now();

    let updated = state.song_repo.update(&song).await?;
    Ok(Json(updated))
}

pub async fn delete_song(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let song = load_managed(&state, &id, &user.id).await?;
    state.song_repo.delete(&song.id).await?;

    info!("Deleted song {}", song.id);
    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_attachment(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(payload): Json<AttachmentRequest>,
) -> Result<impl IntoResponse, AppError> {
    Validator::new()
        .check("name", payload.name.as_deref().is_some_and(not_blank), "Attachment name is required")
        .check("file_url", payload.file_url.as_deref().is_some_and(not_blank), "File URL is required")
        .validate()?;

    let (song, _) = load_song(&state, &id, &user.id).await?;

    let mut attachment = SongAttachment::new(
        song.id,
        payload.name.unwrap_or_default().trim().to_string(),
        payload.file_url.unwrap_or_default(),
        user.id.clone(),
    );
    attachment.file_type = payload.file_type;
    attachment.description = payload.description;

    let created = state.song_repo.add_attachment(&attachment).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Uploader or band admin.
pub async fn delete_attachment(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path((id, attachment_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let (song, member) = load_song(&state, &id, &user.id).await?;
    let attachment = state.song_repo.find_attachment(&song.id, &attachment_id).await?
        .ok_or(AppError::NotFound("Attachment not found".into()))?;

    if attachment.uploaded_by != user.id {
        membership::ensure_admin(&member)?;
    }

    state.song_repo.delete_attachment(&attachment.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_notes(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let (song, _) = load_song(&state, &id, &user.id).await?;
    let notes = state.song_repo.list_notes(&song.id).await?;
    Ok(Json(notes))
}

pub async fn create_note(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(payload): Json<SongNoteRequest>,
) -> Result<impl IntoResponse, AppError> {
    Validator::new()
        .check("content", payload.content.as_deref().is_some_and(not_blank), "Note content is required")
        .validate()?;

    let (song, _) = load_song(&state, &id, &user.id).await?;
    let note = SongNote::new(song.id, user.id.clone(), payload.content.unwrap_or_default());

    let created = state.song_repo.create_note(&note).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Notes are edited only by their author.
async fn load_own_note(state: &AppState, song_id: &str, note_id: &str, user_id: &str) -> Result<SongNote, AppError> {
    let (song, _) = load_song(state, song_id, user_id).await?;
    let note = state.song_repo.find_note(&song.id, note_id).await?
        .ok_or(AppError::NotFound("Note not found".into()))?;
    if note.user_id != user_id {
        return Err(AppError::Forbidden("Only the author can modify this note".into()));
    }
    Ok(note)
}

pub async fn update_note(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path((id, note_id)): Path<(String, String)>,
    Json(payload): Json<SongNoteRequest>,
) -> Result<impl IntoResponse, AppError> {
    Validator::new()
        .check("content", payload.content.as_deref().is_some_and(not_blank), "Note content is required")
        .validate()?;

    let mut note = load_own_note(&state, &id, &note_id, &user.id).await?;
    note.content = payload.content.unwrap_or_default();
    note.updated_at = Utc::now();

    let updated = state.song_repo.update_note(&note).await?;
    Ok(Json(updated))
}

pub async fn delete_note(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path((id, note_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let note = load_own_note(&state, &id, &note_id, &user.id).await?;
    state.song_repo.delete_note(&note.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
