use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

pub const REHEARSAL_CREATED: &str = "rehearsal_created";
pub const REHEARSAL_UPDATED: &str = "rehearsal_updated";
pub const REHEARSAL_CANCELLED: &str = "rehearsal_cancelled";
pub const REHEARSAL_REMINDER: &str = "rehearsal_reminder";
pub const BAND_MEMBER_ADDED: &str = "band_member_added";

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Notification {
    pub id: String,
    pub user_id: String,
    pub notification_type: String,
    pub title: String,
    pub message: String,
    pub data_json: String,
    pub is_read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(user_id: String, notification_type: &str, title: String, message: String, data: &serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id,
            notification_type: notification_type.to_string(),
            title,
            message,
            data_json: data.to_string(),
            is_read: false,
            read_at: None,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug)]
pub struct NotificationFilter {
    pub unread_only: bool,
    pub notification_type: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

impl Default for NotificationFilter {
    fn default() -> Self {
        Self { unread_only: false, notification_type: None, limit: 20, offset: 0 }
    }
}
