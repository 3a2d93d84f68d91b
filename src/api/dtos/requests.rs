use serde::Deserialize;

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub timezone: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct CreateBandRequest {
    pub name: String,
    pub description: Option<String>,
    pub genre: Option<String>,
    pub logo_url: Option<String>,
    pub website: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateBandRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub genre: Option<String>,
    pub logo_url: Option<String>,
    pub website: Option<String>,
}

#[derive(Deserialize)]
pub struct AddMemberRequest {
    pub email: String,
    pub role: Option<String>,
    pub instrument: Option<String>,
    pub nickname: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateMemberRequest {
    pub role: Option<String>,
    pub instrument: Option<String>,
    pub nickname: Option<String>,
}

/// One explicit interval; timestamps are RFC 3339.
#[derive(Deserialize, Clone)]
pub struct AvailabilityPeriod {
    pub start_time: String,
    pub end_time: String,
    pub priority: Option<i32>,
    pub notes: Option<String>,
}

#[derive(Deserialize)]
pub struct SetAvailabilityRequest {
    pub available_periods: Vec<AvailabilityPeriod>,
    pub unavailable_periods: Option<Vec<AvailabilityPeriod>>,
}

#[derive(Deserialize)]
pub struct CreateRecurringRequest {
    pub day_of_week: i32,
    pub start_time: String,
    pub end_time: String,
    pub is_available: Option<bool>,
    pub priority: Option<i32>,
    pub notes: Option<String>,
}

#[derive(Deserialize)]
pub struct ExceptionRequest {
    pub exception_date: String,
    pub is_available: bool,
    pub reason: Option<String>,
}

#[derive(Deserialize)]
pub struct DateRangeQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub timezone: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateRehearsalRequest {
    pub band_id: String,
    pub title: String,
    pub description: Option<String>,
    pub venue_id: Option<String>,
    pub start_time: String,
    pub end_time: String,
}

#[derive(Deserialize)]
pub struct UpdateRehearsalRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub venue_id: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub status: Option<String>,
}

#[derive(Deserialize)]
pub struct RehearsalListQuery {
    pub band_id: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub status: Option<String>,
}

#[derive(Deserialize)]
pub struct AttendanceRequest {
    pub status: String,
    pub comment: Option<String>,
}

#[derive(Deserialize, Default)]
pub struct VenueRequest {
    pub name: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub postal_code: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub website: Option<String>,
    pub has_pa: Option<bool>,
    pub has_backline: Option<bool>,
    pub notes: Option<String>,
    pub hourly_rate: Option<f64>,
}

#[derive(Deserialize)]
pub struct VenueListQuery {
    pub search: Option<String>,
    pub city: Option<String>,
    pub has_pa: Option<bool>,
    pub has_backline: Option<bool>,
}

#[derive(Deserialize)]
pub struct NotificationListQuery {
    pub unread_only: Option<bool>,
    pub notification_type: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Deserialize, Default)]
pub struct SongRequest {
    pub band_id: Option<String>,
    pub title: Option<String>,
    pub artist: Option<String>,
    #[serde(alias = "key")]
    pub key_signature: Option<String>,
    pub bpm: Option<i32>,
    pub duration_sec: Option<i32>,
    pub lyrics: Option<String>,
    pub chord_chart: Option<String>,
    pub notes: Option<String>,
    pub status: Option<String>,
    pub difficulty: Option<String>,
    pub reference_url: Option<String>,
}

#[derive(Deserialize)]
pub struct SongListQuery {
    pub band_id: Option<String>,
    pub status: Option<String>,
    pub search: Option<String>,
}

#[derive(Deserialize)]
pub struct AttachmentRequest {
    pub name: Option<String>,
    pub file_url: Option<String>,
    pub file_type: Option<String>,
    pub description: Option<String>,
}

#[derive(Deserialize)]
pub struct SongNoteRequest {
    pub content: Option<String>,
}

#[derive(Deserialize)]
pub struct SetlistEntryRequest {
    pub song_id: String,
    #[serde(alias = "order")]
    pub position: Option<i32>,
    pub duration_sec: Option<i32>,
    pub notes: Option<String>,
}

#[derive(Deserialize, Default)]
pub struct SetlistRequest {
    pub band_id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_template: Option<bool>,
    pub duration_min: Option<i32>,
    pub songs: Option<Vec<SetlistEntryRequest>>,
}

#[derive(Deserialize)]
pub struct SetlistListQuery {
    pub band_id: Option<String>,
    pub search: Option<String>,
}

#[derive(Deserialize)]
pub struct ReorderEntry {
    pub id: String,
    #[serde(alias = "order")]
    pub position: i32,
}

#[derive(Deserialize)]
pub struct ReorderSetlistRequest {
    pub songs: Vec<ReorderEntry>,
}

#[derive(Deserialize, Default)]
pub struct EquipmentRequest {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub equipment_type: Option<String>,
    pub description: Option<String>,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub serial_number: Option<String>,
    pub purchase_date: Option<String>,
    pub purchase_price: Option<f64>,
    pub notes: Option<String>,
    pub band_id: Option<String>,
    pub user_id: Option<String>,
    pub is_backline: Option<bool>,
    pub needs_power: Option<bool>,
    pub weight_kg: Option<f64>,
    pub dimensions: Option<String>,
    pub photos: Option<Vec<String>>,
}

#[derive(Deserialize)]
pub struct EquipmentListQuery {
    pub band_id: Option<String>,
    pub user_id: Option<String>,
    #[serde(rename = "type")]
    pub equipment_type: Option<String>,
    pub search: Option<String>,
}

#[derive(Deserialize)]
pub struct AssignEquipmentRequest {
    pub equipment_ids: Vec<String>,
    pub notes: Option<String>,
}
