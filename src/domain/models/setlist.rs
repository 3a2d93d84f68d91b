use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Setlist {
    pub id: String,
    pub band_id: String,
    pub name: String,
    pub description: Option<String>,
    pub is_template: bool,
    pub duration_min: Option<i32>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Setlist {
    pub fn new(band_id: String, name: String, created_by: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            band_id,
            name,
            description: None,
            is_template: false,
            duration_min: None,
            created_by,
            created_at: now,
            updated_at: now,
        }
    }
}

/// One slot of a setlist. `position` is unique within the setlist.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct SetlistSong {
    pub id: String,
    pub setlist_id: String,
    pub song_id: String,
    pub position: i32,
    pub duration_sec: Option<i32>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SetlistSong {
    pub fn new(setlist_id: String, song_id: String, position: i32) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            setlist_id,
            song_id,
            position,
            duration_sec: None,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A setlist slot joined with its song.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct SetlistSongDetail {
    pub id: String,
    pub song_id: String,
    pub position: i32,
    pub duration_sec: Option<i32>,
    pub notes: Option<String>,
    pub title: String,
    pub artist: Option<String>,
    pub key_signature: Option<String>,
    pub bpm: Option<i32>,
    pub song_duration_sec: Option<i32>,
}

#[derive(Debug, Default)]
pub struct SetlistFilter {
    pub band_id: Option<String>,
    pub search: Option<String>,
}
