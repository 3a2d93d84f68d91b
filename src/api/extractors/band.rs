use axum::extract::{FromRequestParts, Path};
use axum::http::request::Parts;
use std::collections::HashMap;
use std::sync::Arc;
use crate::api::extractors::auth::AuthUser;
use crate::domain::models::band::BandMember;
use crate::domain::services::membership;
use crate::error::AppError;
use crate::state::AppState;
use crate::validation::{is_uuid, Validator};

/// Caller's membership in the band named by the `{band_id}` path segment.
pub struct BandMembership {
    pub user: AuthUser,
    pub member: BandMember,
}

impl BandMembership {
    pub fn band_id(&self) -> &str {
        &self.member.band_id
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        membership::ensure_admin(&self.member)
    }
}

impl FromRequestParts<Arc<AppState>> for BandMembership {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;

        let params: Path<HashMap<String, String>> = Path::from_request_parts(parts, state)
            .await
            .map_err(|_| AppError::Validation("Invalid path".into()))?;

        let band_id = params.get("band_id")
            .ok_or(AppError::Validation("Missing band id".into()))?;

        Validator::new()
            .check("band_id", is_uuid(band_id), "Invalid band ID")
            .validate()?;

        let member = membership::require_member(state.band_repo.as_ref(), band_id, &user.id).await?;

        Ok(BandMembership { user, member })
    }
}
