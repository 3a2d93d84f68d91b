use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Venue {
    pub id: String,
    pub name: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub postal_code: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub website: Option<String>,
    pub has_pa: bool,
    pub has_backline: bool,
    pub notes: Option<String>,
    pub hourly_rate: Option<f64>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Venue {
    pub fn new(name: String, created_by: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            address: None,
            city: None,
            state: None,
            country: None,
            postal_code: None,
            contact_email: None,
            contact_phone: None,
            website: None,
            has_pa: false,
            has_backline: false,
            notes: None,
            hourly_rate: None,
            created_by,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Default)]
pub struct VenueFilter {
    pub search: Option<String>,
    pub city: Option<String>,
    pub has_pa: Option<bool>,
    pub has_backline: Option<bool>,
}
