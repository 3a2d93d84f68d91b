use crate::domain::models::band::BandMember;
use crate::domain::ports::BandRepository;
use crate::error::AppError;

/// Resolves the caller's membership. Unknown bands are 404, foreign bands 403.
pub async fn require_member(repo: &dyn BandRepository, band_id: &str, user_id: &str) -> Result<BandMember, AppError> {
    if let Some(member) = repo.find_member(band_id, user_id).await? {
        return Ok(member);
    }

    if repo.find_by_id(band_id).await?.is_none() {
        return Err(AppError::NotFound("Band not found".into()));
    }
    Err(AppError::Forbidden("Not a member of this band".into()))
}

pub fn ensure_admin(member: &BandMember) -> Result<(), AppError> {
    if member.is_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden("Band admin role required".into()))
    }
}
