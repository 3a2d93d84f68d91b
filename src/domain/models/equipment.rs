use serde::{Deserialize, Serialize};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Gear owned either by a band or by a single user, never both.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Equipment {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub equipment_type: String,
    pub description: Option<String>,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub serial_number: Option<String>,
    pub purchase_date: Option<NaiveDate>,
    pub purchase_price: Option<f64>,
    pub notes: Option<String>,
    pub band_id: Option<String>,
    pub user_id: Option<String>,
    pub is_backline: bool,
    pub needs_power: bool,
    pub weight_kg: Option<f64>,
    pub dimensions: Option<String>,
    pub photos_json: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Equipment {
    pub fn new(name: String, equipment_type: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            equipment_type,
            description: None,
            brand: None,
            model: None,
            serial_number: None,
            purchase_date: None,
            purchase_price: None,
            notes: None,
            band_id: None,
            user_id: None,
            is_backline: false,
            needs_power: false,
            weight_kg: None,
            dimensions: None,
            photos_json: "[]".to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct RehearsalEquipment {
    pub id: String,
    pub rehearsal_id: String,
    pub equipment_id: String,
    pub notes: Option<String>,
    pub assigned_by: String,
    pub created_at: DateTime<Utc>,
}

impl RehearsalEquipment {
    pub fn new(rehearsal_id: String, equipment_id: String, assigned_by: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            rehearsal_id,
            equipment_id,
            notes: None,
            assigned_by,
            created_at: Utc::now(),
        }
    }
}

/// An assignment joined with the assigned gear.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct AssignedEquipment {
    pub assignment_id: String,
    pub equipment_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub equipment_type: String,
    pub band_id: Option<String>,
    pub user_id: Option<String>,
    pub needs_power: bool,
    pub notes: Option<String>,
    pub assigned_by: String,
    pub created_at: DateTime<Utc>,
}

/// Listing is always scoped to gear the caller may see.
#[derive(Debug, Default)]
pub struct EquipmentFilter {
    pub band_id: Option<String>,
    pub user_id: Option<String>,
    pub equipment_type: Option<String>,
    pub search: Option<String>,
}
