use serde::{Deserialize, Serialize};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;
use std::cmp::Ordering;

pub const DEFAULT_PRIORITY: i32 = 5;

/// Explicit, date-bound availability or unavailability of one user.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct UserAvailability {
    pub id: String,
    pub user_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub is_available: bool,
    pub priority: i32,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl UserAvailability {
    pub fn new(user_id: String, start_time: DateTime<Utc>, end_time: DateTime<Utc>, is_available: bool) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id,
            start_time,
            end_time,
            is_available,
            priority: DEFAULT_PRIORITY,
            notes: None,
            created_at: Utc::now(),
        }
    }
}

/// Weekly rule. `day_of_week` counts from Sunday (0) to Saturday (6); times are
/// wall-clock times in the owner's timezone.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct RecurringAvailability {
    pub id: String,
    pub user_id: String,
    pub day_of_week: i32,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub is_available: bool,
    pub priority: i32,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl RecurringAvailability {
    pub fn new(user_id: String, day_of_week: i32, start_time: NaiveTime, end_time: NaiveTime, is_available: bool) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id,
            day_of_week,
            start_time,
            end_time,
            is_available,
            priority: DEFAULT_PRIORITY,
            notes: None,
            created_at: Utc::now(),
        }
    }
}

/// Whole-day override for one user and one calendar date.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct AvailabilityException {
    pub id: String,
    pub user_id: String,
    pub exception_date: NaiveDate,
    pub is_available: bool,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl AvailabilityException {
    pub fn new(user_id: String, exception_date: NaiveDate, is_available: bool) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id,
            exception_date,
            is_available,
            reason: None,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct AvailabilityWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub priority: i32,
}

#[derive(Debug, Serialize, Clone)]
pub struct MemberAvailability {
    pub user_id: String,
    pub windows: Vec<AvailabilityWindow>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct SlotScore {
    pub covered_members: usize,
    pub priority_sum: i32,
    pub preferred_day: bool,
}

impl Ord for SlotScore {
    fn cmp(&self, other: &Self) -> Ordering {
        self.covered_members.cmp(&other.covered_members)
            .then(self.priority_sum.cmp(&other.priority_sum))
            .then(self.preferred_day.cmp(&other.preferred_day))
    }
}

impl PartialOrd for SlotScore {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Proposed rehearsal window. Derived per request, never stored.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct CandidateSlot {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub covered_member_ids: Vec<String>,
    pub score: SlotScore,
}

impl CandidateSlot {
    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }
}
