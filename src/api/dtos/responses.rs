use chrono::{DateTime, Utc};
use serde::Serialize;
use crate::domain::models::{
    availability::{AvailabilityException, CandidateSlot, MemberAvailability, RecurringAvailability, UserAvailability},
    band::{Band, BandMemberDetail},
    notification::Notification,
    rehearsal::{Rehearsal, RehearsalAttendee},
    setlist::{Setlist, SetlistSongDetail},
    song::{Song, SongAttachment, SongNote},
};

#[derive(Serialize)]
pub struct BandDetailResponse {
    #[serde(flatten)]
    pub band: Band,
    pub members: Vec<BandMemberDetail>,
}

#[derive(Serialize)]
pub struct RehearsalDetailResponse {
    #[serde(flatten)]
    pub rehearsal: Rehearsal,
    pub attendees: Vec<RehearsalAttendee>,
}

#[derive(Serialize)]
pub struct SongDetailResponse {
    #[serde(flatten)]
    pub song: Song,
    pub attachments: Vec<SongAttachment>,
    pub member_notes: Vec<SongNote>,
}

#[derive(Serialize)]
pub struct SetlistDetailResponse {
    #[serde(flatten)]
    pub setlist: Setlist,
    pub songs: Vec<SetlistSongDetail>,
    /// Sum of per-slot durations, falling back to each song's own length.
    pub total_duration_sec: i64,
}

#[derive(Serialize)]
pub struct MyAvailabilityResponse {
    pub intervals: Vec<UserAvailability>,
    pub recurring: Vec<RecurringAvailability>,
    pub exceptions: Vec<AvailabilityException>,
}

#[derive(Serialize)]
pub struct BandAvailabilityResponse {
    pub band_id: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub members: Vec<MemberAvailability>,
}

#[derive(Serialize)]
pub struct SlotResponse {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub duration_minutes: i64,
    pub covered_member_ids: Vec<String>,
    pub covered_members: usize,
    pub priority_sum: i32,
    pub preferred_day: bool,
}

impl From<CandidateSlot> for SlotResponse {
    fn from(slot: CandidateSlot) -> Self {
        Self {
            duration_minutes: slot.duration_minutes(),
            start: slot.start,
            end: slot.end,
            covered_members: slot.score.covered_members,
            priority_sum: slot.score.priority_sum,
            preferred_day: slot.score.preferred_day,
            covered_member_ids: slot.covered_member_ids,
        }
    }
}

#[derive(Serialize)]
pub struct OptimalTimesResponse {
    pub band_id: String,
    pub duration_minutes: i64,
    pub slots: Vec<SlotResponse>,
}

#[derive(Serialize)]
pub struct NotificationResponse {
    pub id: String,
    pub notification_type: String,
    pub title: String,
    pub message: String,
    pub data: serde_json::Value,
    pub is_read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<Notification> for NotificationResponse {
    fn from(n: Notification) -> Self {
        Self {
            data: serde_json::from_str(&n.data_json).unwrap_or(serde_json::Value::Null),
            id: n.id,
            notification_type: n.notification_type,
            title: n.title,
            message: n.message,
            is_read: n.is_read,
            read_at: n.read_at,
            created_at: n.created_at,
        }
    }
}

#[derive(Serialize)]
pub struct NotificationListResponse {
    pub notifications: Vec<NotificationResponse>,
    pub unread_count: i64,
    pub limit: i64,
    pub offset: i64,
}
