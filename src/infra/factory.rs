use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use sqlx::{postgres::{PgPoolOptions, PgConnectOptions}, sqlite::{SqlitePoolOptions, SqliteJournalMode, SqliteConnectOptions}};
use sqlx::{PgPool, SqlitePool, ConnectOptions};
use tracing::info;
use tracing::log::LevelFilter;

use crate::config::Config;
use crate::domain::ports::{AuthRepository, AvailabilityRepository, BandRepository, EventBroadcaster};
use crate::domain::services::auth_service::AuthService;
use crate::domain::services::availability::AvailabilityResolver;
use crate::error::AppError;
use crate::infra::realtime::topic_broadcaster::TopicBroadcaster;
use crate::infra::repositories::{
    postgres_auth_repo::PostgresAuthRepo, postgres_availability_repo::PostgresAvailabilityRepo,
    postgres_band_repo::PostgresBandRepo, postgres_equipment_repo::PostgresEquipmentRepo,
    postgres_notification_repo::PostgresNotificationRepo, postgres_rehearsal_repo::PostgresRehearsalRepo,
    postgres_setlist_repo::PostgresSetlistRepo, postgres_song_repo::PostgresSongRepo,
    postgres_user_repo::PostgresUserRepo, postgres_venue_repo::PostgresVenueRepo,
    sqlite_auth_repo::SqliteAuthRepo, sqlite_availability_repo::SqliteAvailabilityRepo,
    sqlite_band_repo::SqliteBandRepo, sqlite_equipment_repo::SqliteEquipmentRepo,
    sqlite_notification_repo::SqliteNotificationRepo, sqlite_rehearsal_repo::SqliteRehearsalRepo,
    sqlite_setlist_repo::SqliteSetlistRepo, sqlite_song_repo::SqliteSongRepo,
    sqlite_user_repo::SqliteUserRepo, sqlite_venue_repo::SqliteVenueRepo,
};
use crate::state::AppState;

/// Buffered events per band topic.
const TOPIC_CAPACITY: usize = 100;

pub async fn bootstrap_state(config: &Config) -> AppState {
    let database_url = &config.database_url;

    if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        info!("Initializing PostgreSQL connection...");

        let mut opts: PgConnectOptions = database_url.parse().expect("Invalid Postgres URL");
        opts = opts.log_statements(LevelFilter::Debug)
            .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect_with(opts)
            .await
            .expect("Failed to connect to Postgres");

        run_postgres_migrations(&pool).await;

        postgres_state(pool, config).expect("Failed to build application state")
    } else {
        info!("Initializing SQLite connection with WAL Mode...");

        let opts = SqliteConnectOptions::from_str(database_url)
            .expect("Invalid SQLite connection string")
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5))
            .log_statements(LevelFilter::Debug)
            .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(opts)
            .await
            .expect("Failed to connect to SQLite");

        run_sqlite_migrations(&pool).await;

        sqlite_state(pool, config).expect("Failed to build application state")
    }
}

pub fn sqlite_state(pool: SqlitePool, config: &Config) -> Result<AppState, AppError> {
    let band_repo: Arc<dyn BandRepository> = Arc::new(SqliteBandRepo::new(pool.clone()));
    let availability_repo: Arc<dyn AvailabilityRepository> = Arc::new(SqliteAvailabilityRepo::new(pool.clone()));
    let auth_repo: Arc<dyn AuthRepository> = Arc::new(SqliteAuthRepo::new(pool.clone()));

    Ok(AppState {
        config: config.clone(),
        user_repo: Arc::new(SqliteUserRepo::new(pool.clone())),
        rehearsal_repo: Arc::new(SqliteRehearsalRepo::new(pool.clone())),
        venue_repo: Arc::new(SqliteVenueRepo::new(pool.clone())),
        song_repo: Arc::new(SqliteSongRepo::new(pool.clone())),
        setlist_repo: Arc::new(SqliteSetlistRepo::new(pool.clone())),
        equipment_repo: Arc::new(SqliteEquipmentRepo::new(pool.clone())),
        notification_repo: Arc::new(SqliteNotificationRepo::new(pool)),
        broadcaster: broadcaster(),
        auth_service: Arc::new(AuthService::new(auth_repo.clone(), config.clone())?),
        resolver: Arc::new(AvailabilityResolver::new(band_repo.clone(), availability_repo.clone())),
        auth_repo,
        band_repo,
        availability_repo,
    })
}

pub fn postgres_state(pool: PgPool, config: &Config) -> Result<AppState, AppError> {
    let band_repo: Arc<dyn BandRepository> = Arc::new(PostgresBandRepo::new(pool.clone()));
    let availability_repo: Arc<dyn AvailabilityRepository> = Arc::new(PostgresAvailabilityRepo::new(pool.clone()));
    let auth_repo: Arc<dyn AuthRepository> = Arc::new(PostgresAuthRepo::new(pool.clone()));

    Ok(AppState {
        config: config.clone(),
        user_repo: Arc::new(PostgresUserRepo::new(pool.clone())),
        rehearsal_repo: Arc::new(PostgresRehearsalRepo::new(pool.clone())),
        venue_repo: Arc::new(PostgresVenueRepo::new(pool.clone())),
        song_repo: Arc::new(PostgresSongRepo::new(pool.clone())),
        setlist_repo: Arc::new(PostgresSetlistRepo::new(pool.clone())),
        equipment_repo: Arc::new(PostgresEquipmentRepo::new(pool.clone())),
        notification_repo: Arc::new(PostgresNotificationRepo::new(pool)),
        broadcaster: broadcaster(),
        auth_service: Arc::new(AuthService::new(auth_repo.clone(), config.clone())?),
        resolver: Arc::new(AvailabilityResolver::new(band_repo.clone(), availability_repo.clone())),
        auth_repo,
        band_repo,
        availability_repo,
    })
}

fn broadcaster() -> Arc<dyn EventBroadcaster> {
    Arc::new(TopicBroadcaster::new(TOPIC_CAPACITY))
}

async fn run_postgres_migrations(pool: &PgPool) {
    sqlx::migrate!("./migrations/postgres")
        .run(pool)
        .await
        .expect("Failed to run Postgres migrations");
}

async fn run_sqlite_migrations(pool: &SqlitePool) {
    sqlx::migrate!("./migrations/sqlite")
        .run(pool)
        .await
        .expect("Failed to run SQLite migrations");
}
