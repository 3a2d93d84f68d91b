pub mod sqlite_auth_repo;
pub mod sqlite_availability_repo;
pub mod sqlite_band_repo;
pub mod sqlite_equipment_repo;
pub mod sqlite_notification_repo;
pub mod sqlite_rehearsal_repo;
pub mod sqlite_setlist_repo;
pub mod sqlite_song_repo;
pub mod sqlite_user_repo;
pub mod sqlite_venue_repo;

pub mod postgres_auth_repo;
pub mod postgres_availability_repo;
pub mod postgres_band_repo;
pub mod postgres_equipment_repo;
pub mod postgres_notification_repo;
pub mod postgres_rehearsal_repo;
pub mod postgres_setlist_repo;
pub mod postgres_song_repo;
pub mod postgres_user_repo;
pub mod postgres_venue_repo;
