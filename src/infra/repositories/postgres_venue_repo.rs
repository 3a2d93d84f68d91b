use crate::domain::{
    models::venue::{Venue, VenueFilter},
    ports::VenueRepository,
};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::PgPool;

pub struct PostgresVenueRepo {
    pool: PgPool,
}

impl PostgresVenueRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VenueRepository for PostgresVenueRepo {
    async fn create(&self, venue: &Venue) -> Result<Venue, AppError> {
        sqlx::query_as::<_, Venue>(
            "INSERT INTO venues (id, name, address, city, state, country, postal_code, contact_email, contact_phone, website, has_pa, has_backline, notes, hourly_rate, created_by, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
             RETURNING *"
        )
            .bind(&venue.id).bind(&venue.name).bind(&venue.address).bind(&venue.city)
            .bind(&venue.state).bind(&venue.country).bind(&venue.postal_code).bind(&venue.contact_email)
            .bind(&venue.contact_phone).bind(&venue.website).bind(venue.has_pa).bind(venue.has_backline)
            .bind(&venue.notes).bind(venue.hourly_rate).bind(&venue.created_by)
            .bind(venue.created_at).bind(venue.updated_at)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Venue>, AppError> {
        sqlx::query_as::<_, Venue>("SELECT * FROM venues WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn list(&self, filter: &VenueFilter) -> Result<Vec<Venue>, AppError> {
        let query = r#"
            SELECT * FROM venues
            WHERE ($1 IS NULL OR LOWER(name) LIKE $2 OR LOWER(city) LIKE $3 OR LOWER(address) LIKE $4)
            AND ($5 IS NULL OR LOWER(city) = $6)
            AND ($7 IS NULL OR has_pa = $8)
            AND ($9 IS NULL OR has_backline = $10)
            ORDER BY name ASC
        "#;

        let pattern = filter.search.as_ref().map(|s| format!("%{}%", s.to_lowercase()));
        let city = filter.city.as_ref().map(|c| c.to_lowercase());

        sqlx::query_as::<_, Venue>(query)
            .bind(&pattern).bind(&pattern).bind(&pattern).bind(&pattern)
            .bind(&city).bind(&city)
            .bind(filter.has_pa).bind(filter.has_pa)
            .bind(filter.has_backline).bind(filter.has_backline)
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn update(&self, venue: &Venue) -> Result<Venue, AppError> {
        sqlx::query_as::<_, Venue>(
            "UPDATE venues SET name=$1, address=$2, city=$3, state=$4, country=$5, postal_code=$6, contact_email=$7, contact_phone=$8, website=$9, has_pa=$10, has_backline=$11, notes=$12, hourly_rate=$13, updated_at=$14
             WHERE id=$15
             RETURNING *"
        )
            .bind(&venue.name).bind(&venue.address).bind(&venue.city).bind(&venue.state)
            .bind(&venue.country).bind(&venue.postal_code).bind(&venue.contact_email).bind(&venue.contact_phone)
            .bind(&venue.website).bind(venue.has_pa).bind(venue.has_backline).bind(&venue.notes)
            .bind(venue.hourly_rate).bind(venue.updated_at)
            .bind(&venue.id)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }

    async fn delete(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM venues WHERE id = $1")
            .bind(id)
            .execute(&self.pool).await.map_err(AppError::Database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Venue not found".into()));
        }
        Ok(())
    }
}
