use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

pub const STATUS_SCHEDULED: &str = "scheduled";
pub const STATUS_COMPLETED: &str = "completed";
pub const STATUS_CANCELLED: &str = "cancelled";
pub const REHEARSAL_STATUSES: [&str; 3] = [STATUS_SCHEDULED, STATUS_COMPLETED, STATUS_CANCELLED];

pub const ATTENDANCE_PENDING: &str = "pending";
pub const ATTENDANCE_STATUSES: [&str; 3] = [ATTENDANCE_PENDING, "confirmed", "declined"];

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Rehearsal {
    pub id: String,
    pub band_id: String,
    pub venue_id: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: String,
    pub created_by: String,
    pub reminder_sent: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Rehearsal {
    pub fn new(band_id: String, title: String, start_time: DateTime<Utc>, end_time: DateTime<Utc>, created_by: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            band_id,
            venue_id: None,
            title,
            description: None,
            start_time,
            end_time,
            status: STATUS_SCHEDULED.to_string(),
            created_by,
            reminder_sent: false,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct RehearsalAttendee {
    pub id: String,
    pub rehearsal_id: String,
    pub user_id: String,
    pub status: String,
    pub comment: Option<String>,
    pub responded_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl RehearsalAttendee {
    pub fn new(rehearsal_id: String, user_id: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            rehearsal_id,
            user_id,
            status: ATTENDANCE_PENDING.to_string(),
            comment: None,
            responded_at: None,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Default)]
pub struct RehearsalFilter {
    pub band_id: Option<String>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub status: Option<String>,
}
