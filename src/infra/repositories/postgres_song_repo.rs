use crate::domain::{
    models::song::{Song, SongAttachment, SongFilter, SongNote},
    ports::SongRepository,
};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::PgPool;

pub struct PostgresSongRepo {
    pool: PgPool,
}

impl PostgresSongRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SongRepository for PostgresSongRepo {
    async fn create(&self, song: &Song) -> Result<Song, AppError> {
        sqlx::query_as::<_, Song>(
            "INSERT INTO songs (id, band_id, title, artist, key_signature, bpm, duration_sec, lyrics, chord_chart, notes, status, difficulty, reference_url, created_by, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
             RETURNING *"
        )
            .bind(&song.id).bind(&song.band_id).bind(&song.title).bind(&song.artist)
            .bind(&song.key_signature).bind(song.bpm).bind(song.duration_sec).bind(&song.lyrics)
            .bind(&song.chord_chart).bind(&song.notes).bind(&song.status).bind(&song.difficulty)
            .bind(&song.reference_url).bind(&song.created_by).bind(song.created_at).bind(song.updated_at)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Song>, AppError> {
        sqlx::query_as::<_, Song>("SELECT * FROM songs WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_for_user(&self, user_id: &str, filter: &SongFilter) -> Result<Vec<Song>, AppError> {
        let query = r#"
            SELECT s.*
            FROM songs s
            JOIN band_members bm ON bm.band_id = s.band_id
            WHERE bm.user_id = $1
            AND ($2 IS NULL OR s.band_id = $3)
            AND ($4 IS NULL OR s.status = $5)
            AND ($6 IS NULL OR LOWER(s.title) LIKE $7 OR LOWER(s.artist) LIKE $8)
            ORDER BY s.title ASC
        "#;

        let pattern = filter.search.as_ref().map(|s| format!("%{}%", s.to_lowercase()));

        sqlx::query_as::<_, Song>(query)
            .bind(user_id)
            .bind(&filter.band_id).bind(&filter.band_id)
            .bind(&filter.status).bind(&filter.status)
            .bind(&pattern).bind(&pattern).bind(&pattern)
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn update(&self, song: &Song) -> Result<Song, AppError> {
        sqlx::query_as::<_, Song>(
            "UPDATE songs SET title=$1, artist=$2, key_signature=$3, bpm=$4, duration_sec=$5, lyrics=$6, chord_chart=$7, notes=$8, status=$9, difficulty=$10, reference_url=$11, updated_at=$12
             WHERE id=$13
             RETURNING *"
        )
            .bind(&song.title).bind(&song.artist).bind(&song.key_signature).bind(song.bpm)
            .bind(song.duration_sec).bind(&song.lyrics).bind(&song.chord_chart).bind(&song.notes)
            .bind(&song.status).bind(&song.difficulty).bind(&song.reference_url).bind(song.updated_at)
            .bind(&song.id)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }

    async fn delete(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM songs WHERE id = $1")
            .bind(id)
            .execute(&self.pool).await.map_err(AppError::Database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Song not found".into()));
        }
        Ok(())
    }

    async fn add_attachment(&self, attachment: &SongAttachment) -> Result<SongAttachment, AppError> {
        sqlx::query_as::<_, SongAttachment>(
            "INSERT INTO song_attachments (id, song_id, name, file_url, file_type, description, uploaded_by, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING *"
        )
            .bind(&attachment.id).bind(&attachment.song_id).bind(&attachment.name).bind(&attachment.file_url)
            .bind(&attachment.file_type).bind(&attachment.description).bind(&attachment.uploaded_by)
            .bind(attachment.created_at)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }

    async fn find_attachment(&self, song_id: &str, id: &str) -> Result<Option<SongAttachment>, AppError> {
        sqlx::query_as::<_, SongAttachment>("SELECT * FROM song_attachments WHERE song_id = $1 AND id = $2")
            .bind(song_id)
            .bind(id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_attachments(&self, song_id: &str) -> Result<Vec<SongAttachment>, AppError> {
        sqlx::query_as::<_, SongAttachment>("SELECT * FROM song_attachments WHERE song_id = $1 ORDER BY created_at ASC")
            .bind(song_id)
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn delete_attachment(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM song_attachments WHERE id = $1")
            .bind(id)
            .execute(&self.pool).await.map_err(AppError::Database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Attachment not found".into()));
        }
        Ok(())
    }

    async fn create_note(&self, note: &SongNote) -> Result<SongNote, AppError> {
        sqlx::query_as::<_, SongNote>(
            "INSERT INTO song_notes (id, song_id, user_id, content, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6) RETURNING *"
        )
            .bind(&note.id).bind(&note.song_id).bind(&note.user_id).bind(&note.content)
            .bind(note.created_at).bind(note.updated_at)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }

    async fn find_note(&self, song_id: &str, id: &str) -> Result<Option<SongNote>, AppError> {
        sqlx::query_as::<_, SongNote>("SELECT * FROM song_notes WHERE song_id = $1 AND id = $2")
            .bind(song_id)
            .bind(id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_notes(&self, song_id: &str) -> Result<Vec<SongNote>, AppError> {
        sqlx::query_as::<_, SongNote>("SELECT * FROM song_notes WHERE song_id = $1 ORDER BY created_at DESC")
            .bind(song_id)
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn update_note(&self, note: &SongNote) -> Result<SongNote, AppError> {
        sqlx::query_as::<_, SongNote>("UPDATE song_notes SET content=$1, updated_at=$2 WHERE id=$3 RETURNING *")
            .bind(&note.content).bind(note.updated_at)
            .bind(&note.id)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }

    async fn delete_note(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM song_notes WHERE id = $1")
            .bind(id)
            .execute(&self.pool).await.map_err(AppError::Database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Note not found".into()));
        }
        Ok(())
    }
}
