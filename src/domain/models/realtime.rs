use serde::Serialize;
use chrono::{DateTime, Utc};
use uuid::Uuid;

pub const REHEARSAL_CREATED: &str = "rehearsal_created";
pub const REHEARSAL_UPDATED: &str = "rehearsal_updated";
pub const REHEARSAL_DELETED: &str = "rehearsal_deleted";
pub const ATTENDANCE_UPDATED: &str = "attendance_updated";
pub const MEMBER_ADDED: &str = "member_added";
pub const MEMBER_REMOVED: &str = "member_removed";
pub const AVAILABILITY_UPDATED: &str = "availability_updated";
pub const REHEARSAL_REMINDER: &str = "rehearsal_reminder";

/// Change notification relayed to everyone subscribed to a band topic.
#[derive(Debug, Clone, Serialize)]
pub struct BandEvent {
    pub id: String,
    pub event: String,
    pub band_id: String,
    pub data: serde_json::Value,
    pub emitted_at: DateTime<Utc>,
}

impl BandEvent {
    pub fn new(event: &str, band_id: &str, data: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            event: event.to_string(),
            band_id: band_id.to_string(),
            data,
            emitted_at: Utc::now(),
        }
    }
}

pub fn band_topic(band_id: &str) -> String {
    format!("band-{}", band_id)
}
