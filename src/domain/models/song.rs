use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

pub const SONG_STATUSES: &[&str] = &["active", "learning", "archived"];
pub const DIFFICULTIES: &[&str] = &["easy", "medium", "hard"];

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Song {
    pub id: String,
    pub band_id: String,
    pub title: String,
    pub artist: Option<String>,
    pub key_signature: Option<String>,
    pub bpm: Option<i32>,
    pub duration_sec: Option<i32>,
    pub lyrics: Option<String>,
    pub chord_chart: Option<String>,
    pub notes: Option<String>,
    pub status: String,
    pub difficulty: String,
    pub reference_url: Option<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Song {
    pub fn new(band_id: String, title: String, created_by: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            band_id,
            title,
            artist: None,
            key_signature: None,
            bpm: None,
            duration_sec: None,
            lyrics: None,
            chord_chart: None,
            notes: None,
            status: "active".to_string(),
            difficulty: "medium".to_string(),
            reference_url: None,
            created_by,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct SongAttachment {
    pub id: String,
    pub song_id: String,
    pub name: String,
    pub file_url: String,
    pub file_type: Option<String>,
    pub description: Option<String>,
    pub uploaded_by: String,
    pub created_at: DateTime<Utc>,
}

impl SongAttachment {
    pub fn new(song_id: String, name: String, file_url: String, uploaded_by: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            song_id,
            name,
            file_url,
            file_type: None,
            description: None,
            uploaded_by,
            created_at: Utc::now(),
        }
    }
}

/// A member's private practice note on a song.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct SongNote {
    pub id: String,
    pub song_id: String,
    pub user_id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SongNote {
    pub fn new(song_id: String, user_id: String, content: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            song_id,
            user_id,
            content,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Default)]
pub struct SongFilter {
    pub band_id: Option<String>,
    pub status: Option<String>,
    pub search: Option<String>,
}
