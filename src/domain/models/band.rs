use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_MEMBER: &str = "member";

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Band {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub genre: Option<String>,
    pub logo_url: Option<String>,
    pub website: Option<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Band {
    pub fn new(name: String, created_by: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            description: None,
            genre: None,
            logo_url: None,
            website: None,
            created_by,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct BandMember {
    pub id: String,
    pub band_id: String,
    pub user_id: String,
    pub role: String,
    pub instrument: Option<String>,
    pub nickname: Option<String>,
    pub joined_at: DateTime<Utc>,
}

impl BandMember {
    pub fn new(band_id: String, user_id: String, role: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            band_id,
            user_id,
            role: role.to_string(),
            instrument: None,
            nickname: None,
            joined_at: Utc::now(),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }
}

/// Band member joined with the user columns the roster and the resolver need.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct BandMemberDetail {
    pub user_id: String,
    pub band_id: String,
    pub role: String,
    pub instrument: Option<String>,
    pub nickname: Option<String>,
    pub joined_at: DateTime<Utc>,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub timezone: String,
}
