use std::sync::Arc;
use crate::domain::ports::{
    AuthRepository, AvailabilityRepository, BandRepository, EquipmentRepository, EventBroadcaster,
    NotificationRepository, RehearsalRepository, SetlistRepository, SongRepository, UserRepository,
    VenueRepository,
};
use crate::domain::services::auth_service::AuthService;
use crate::domain::services::availability::AvailabilityResolver;
use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub user_repo: Arc<dyn UserRepository>,
    pub auth_repo: Arc<dyn AuthRepository>,
    pub band_repo: Arc<dyn BandRepository>,
    pub availability_repo: Arc<dyn AvailabilityRepository>,
    pub rehearsal_repo: Arc<dyn RehearsalRepository>,
    pub venue_repo: Arc<dyn VenueRepository>,
    pub song_repo: Arc<dyn SongRepository>,
    pub setlist_repo: Arc<dyn SetlistRepository>,
    pub equipment_repo: Arc<dyn EquipmentRepository>,
    pub notification_repo: Arc<dyn NotificationRepository>,
    pub broadcaster: Arc<dyn EventBroadcaster>,
    pub auth_service: Arc<AuthService>,
    pub resolver: Arc<AvailabilityResolver>,
}
