use crate::domain::models::{
    user::User, auth::RefreshTokenRecord,
    band::{Band, BandMember, BandMemberDetail},
    availability::{UserAvailability, RecurringAvailability, AvailabilityException},
    rehearsal::{Rehearsal, RehearsalAttendee, RehearsalFilter},
    venue::{Venue, VenueFilter},
    song::{Song, SongAttachment, SongFilter, SongNote},
    setlist::{Setlist, SetlistFilter, SetlistSong, SetlistSongDetail},
    equipment::{AssignedEquipment, Equipment, EquipmentFilter, RehearsalEquipment},
    notification::{Notification, NotificationFilter},
    realtime::BandEvent,
};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::broadcast;
use uuid::Uuid;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: &User) -> Result<User, AppError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError>;
}

#[async_trait]
pub trait AuthRepository: Send + Sync {
    async fn create_refresh_token(&self, record: &RefreshTokenRecord) -> Result<(), AppError>;
    async fn find_refresh_token(&self, token_hash: &str) -> Result<Option<RefreshTokenRecord>, AppError>;
    async fn delete_refresh_token(&self, token_hash: &str) -> Result<(), AppError>;
    async fn delete_refresh_family(&self, family_id: Uuid) -> Result<(), AppError>;
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, AppError>;
}

#[async_trait]
pub trait BandRepository: Send + Sync {
    /// Inserts the band and its creator as first admin in one transaction.
    async fn create(&self, band: &Band, founder: &BandMember) -> Result<Band, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Band>, AppError>;
    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Band>, AppError>;
    async fn update(&self, band: &Band) -> Result<Band, AppError>;
    async fn delete(&self, id: &str) -> Result<(), AppError>;

    async fn add_member(&self, member: &BandMember) -> Result<BandMember, AppError>;
    async fn find_member(&self, band_id: &str, user_id: &str) -> Result<Option<BandMember>, AppError>;
    async fn list_members(&self, band_id: &str) -> Result<Vec<BandMemberDetail>, AppError>;
    async fn update_member(&self, member: &BandMember) -> Result<BandMember, AppError>;
    async fn remove_member(&self, band_id: &str, user_id: &str) -> Result<(), AppError>;
    async fn count_admins(&self, band_id: &str) -> Result<i64, AppError>;
    async fn list_band_ids_for_user(&self, user_id: &str) -> Result<Vec<String>, AppError>;
}

/// Storage of the three availability sources. The `fetch_*` methods form the
/// read contract of the availability resolver.
#[async_trait]
pub trait AvailabilityRepository: Send + Sync {
    async fn list_intervals(&self, user_id: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<UserAvailability>, AppError>;
    /// Deletes the user's explicit intervals overlapping `[start, end)` and inserts `intervals`, atomically.
    async fn replace_intervals(&self, user_id: &str, start: DateTime<Utc>, end: DateTime<Utc>, intervals: &[UserAvailability]) -> Result<Vec<UserAvailability>, AppError>;

    async fn create_recurring(&self, rule: &RecurringAvailability) -> Result<RecurringAvailability, AppError>;
    async fn list_recurring(&self, user_id: &str) -> Result<Vec<RecurringAvailability>, AppError>;
    async fn delete_recurring(&self, user_id: &str, id: &str) -> Result<(), AppError>;

    async fn upsert_exception(&self, exception: &AvailabilityException) -> Result<AvailabilityException, AppError>;
    async fn list_exceptions(&self, user_id: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<AvailabilityException>, AppError>;
    async fn delete_exception(&self, user_id: &str, date: NaiveDate) -> Result<(), AppError>;

    async fn fetch_recurring_rules(&self, user_ids: &[String]) -> Result<Vec<RecurringAvailability>, AppError>;
    async fn fetch_explicit_intervals(&self, user_ids: &[String], start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<UserAvailability>, AppError>;
    async fn fetch_exceptions(&self, user_ids: &[String], start: NaiveDate, end: NaiveDate) -> Result<Vec<AvailabilityException>, AppError>;
}

#[async_trait]
pub trait RehearsalRepository: Send + Sync {
    /// Inserts the rehearsal together with its initial attendee rows.
    async fn create(&self, rehearsal: &Rehearsal, attendees: &[RehearsalAttendee]) -> Result<Rehearsal, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Rehearsal>, AppError>;
    async fn list_for_user(&self, user_id: &str, filter: &RehearsalFilter) -> Result<Vec<Rehearsal>, AppError>;
    async fn update(&self, rehearsal: &Rehearsal) -> Result<Rehearsal, AppError>;
    async fn delete(&self, id: &str) -> Result<(), AppError>;

    async fn list_attendees(&self, rehearsal_id: &str) -> Result<Vec<RehearsalAttendee>, AppError>;
    async fn upsert_attendance(&self, attendee: &RehearsalAttendee) -> Result<RehearsalAttendee, AppError>;

    async fn find_due_reminders(&self, now: DateTime<Utc>, horizon: DateTime<Utc>, limit: i64) -> Result<Vec<Rehearsal>, AppError>;
    /// Flags the reminder as sent. False when another worker already did.
    async fn claim_reminder(&self, id: &str) -> Result<bool, AppError>;
}

#[async_trait]
pub trait VenueRepository: Send + Sync {
    async fn create(&self, venue: &Venue) -> Result<Venue, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Venue>, AppError>;
    async fn list(&self, filter: &VenueFilter) -> Result<Vec<Venue>, AppError>;
    async fn update(&self, venue: &Venue) -> Result<Venue, AppError>;
    async fn delete(&self, id: &str) -> Result<(), AppError>;
}

#[async_trait]
pub trait SongRepository: Send + Sync {
    async fn create(&self, song: &Song) -> Result<Song, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Song>, AppError>;
    /// Songs of every band the user belongs to, narrowed by `filter`.
    async fn list_for_user(&self, user_id: &str, filter: &SongFilter) -> Result<Vec<Song>, AppError>;
    async fn update(&self, song: &Song) -> Result<Song, AppError>;
    async fn delete(&self, id: &str) -> Result<(), AppError>;

    async fn add_attachment(&self, attachment: &SongAttachment) -> Result<SongAttachment, AppError>;
    async fn find_attachment(&self, song_id: &str, id: &str) -> Result<Option<SongAttachment>, AppError>;
    async fn list_attachments(&self, song_id: &str) -> Result<Vec<SongAttachment>, AppError>;
    async fn delete_attachment(&self, id: &str) -> Result<(), AppError>;

    async fn create_note(&self, note: &SongNote) -> Result<SongNote, AppError>;
    async fn find_note(&self, song_id: &str, id: &str) -> Result<Option<SongNote>, AppError>;
    async fn list_notes(&self, song_id: &str) -> Result<Vec<SongNote>, AppError>;
    async fn update_note(&self, note: &SongNote) -> Result<SongNote, AppError>;
    async fn delete_note(&self, id: &str) -> Result<(), AppError>;
}

#[async_trait]
pub trait SetlistRepository: Send + Sync {
    /// Inserts the setlist and its initial songs in one transaction.
    async fn create(&self, setlist: &Setlist, songs: &[SetlistSong]) -> Result<Setlist, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Setlist>, AppError>;
    async fn list_for_user(&self, user_id: &str, filter: &SetlistFilter) -> Result<Vec<Setlist>, AppError>;
    async fn update(&self, setlist: &Setlist) -> Result<Setlist, AppError>;
    async fn delete(&self, id: &str) -> Result<(), AppError>;

    /// Ordered by position.
    async fn list_songs(&self, setlist_id: &str) -> Result<Vec<SetlistSongDetail>, AppError>;
    async fn add_song(&self, entry: &SetlistSong) -> Result<SetlistSong, AppError>;
    async fn remove_song(&self, setlist_id: &str, song_id: &str) -> Result<(), AppError>;
    /// Applies `(entry id, position)` pairs atomically.
    async fn reorder(&self, setlist_id: &str, order: &[(String, i32)]) -> Result<(), AppError>;
}

#[async_trait]
pub trait EquipmentRepository: Send + Sync {
    async fn create(&self, equipment: &Equipment) -> Result<Equipment, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Equipment>, AppError>;
    /// The user's own gear plus gear of bands they belong to.
    async fn list_visible(&self, user_id: &str, filter: &EquipmentFilter) -> Result<Vec<Equipment>, AppError>;
    async fn update(&self, equipment: &Equipment) -> Result<Equipment, AppError>;
    async fn delete(&self, id: &str) -> Result<(), AppError>;

    /// False when the gear was already assigned to the rehearsal.
    async fn assign(&self, assignment: &RehearsalEquipment) -> Result<bool, AppError>;
    async fn list_for_rehearsal(&self, rehearsal_id: &str) -> Result<Vec<AssignedEquipment>, AppError>;
    async fn unassign(&self, rehearsal_id: &str, equipment_id: &str) -> Result<(), AppError>;
}

#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn create_many(&self, notifications: &[Notification]) -> Result<(), AppError>;
    async fn find_by_id(&self, user_id: &str, id: &str) -> Result<Option<Notification>, AppError>;
    async fn list_for_user(&self, user_id: &str, filter: &NotificationFilter) -> Result<Vec<Notification>, AppError>;
    async fn count_unread(&self, user_id: &str) -> Result<i64, AppError>;
    async fn mark_read(&self, user_id: &str, id: &str) -> Result<(), AppError>;
    async fn mark_all_read(&self, user_id: &str) -> Result<u64, AppError>;
    async fn delete(&self, user_id: &str, id: &str) -> Result<(), AppError>;
    async fn delete_all(&self, user_id: &str) -> Result<u64, AppError>;
}

/// Topic based publish/subscribe relay.
#[async_trait]
pub trait EventBroadcaster: Send + Sync {
    /// Returns the number of subscribers the event reached.
    async fn publish(&self, topic: &str, event: BandEvent) -> usize;
    async fn subscribe(&self, topic: &str) -> broadcast::Receiver<BandEvent>;
}
