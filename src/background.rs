use std::sync::Arc;
use std::time::Duration;
use chrono::{DateTime, Utc};
use tokio::time::sleep;
use tracing::{debug, error, info, info_span, Instrument};
use crate::domain::models::rehearsal::Rehearsal;
use crate::domain::models::{notification, realtime};
use crate::domain::services::notifier;
use crate::error::AppError;
use crate::state::AppState;
use serde_json::json;

/// Rehearsals reminded per poll.
const REMINDER_BATCH: i64 = 50;

pub async fn start_background_worker(state: Arc<AppState>) {
    info!("Starting rehearsal reminder worker...");

    let poll = Duration::from_secs(state.config.reminder_poll_secs.max(1));
    loop {
        let now = Utc::now();

        match send_due_reminders(&state, now).await {
            Ok(0) => {}
            Ok(sent) => info!("Sent reminders for {} rehearsals", sent),
            Err(e) => error!("Failed to process rehearsal reminders: {:?}", e),
        }

        match state.auth_repo.purge_expired(now).await {
            Ok(0) => {}
            Ok(purged) => info!("Purged {} expired refresh tokens", purged),
            Err(e) => error!("Failed to purge refresh tokens: {:?}", e),
        }

        sleep(poll).await;
    }
}

/// Reminds the members of every scheduled rehearsal starting within the lead
/// window, once per rehearsal. Returns how many rehearsals were handled.
pub async fn send_due_reminders(state: &AppState, now: DateTime<Utc>) -> Result<usize, AppError> {
    let horizon = now + chrono::Duration::hours(state.config.reminder_lead_hours);
    let due = state.rehearsal_repo.find_due_reminders(now, horizon, REMINDER_BATCH).await?;

    let mut sent = 0;
    for rehearsal in due {
        let span = info_span!(
            "rehearsal_reminder",
            rehearsal_id = %rehearsal.id,
            band_id = %rehearsal.band_id
        );

        match remind(state, &rehearsal).instrument(span).await {
            Ok(true) => sent += 1,
            Ok(false) => {}
            Err(e) => error!(rehearsal_id = %rehearsal.id, "Reminder failed: {:?}", e),
        }
    }
    Ok(sent)
}

/// Claims the rehearsal before notifying, so a failure further down never
/// leads to a second reminder on the next poll.
async fn remind(state: &AppState, rehearsal: &Rehearsal) -> Result<bool, AppError> {
    if !state.rehearsal_repo.claim_reminder(&rehearsal.id).await? {
        debug!("Reminder already claimed");
        return Ok(false);
    }

    let recipients: Vec<String> = state.band_repo.list_members(&rehearsal.band_id).await?
        .into_iter()
        .map(|m| m.user_id)
        .collect();

    let data = json!({ "rehearsal_id": rehearsal.id, "band_id": rehearsal.band_id, "start_time": rehearsal.start_time });
    notifier::notify_users(
        state.notification_repo.as_ref(),
        &recipients,
        notification::REHEARSAL_REMINDER,
        "Upcoming rehearsal",
        &format!("{} starts at {}", rehearsal.title, rehearsal.start_time.format("%Y-%m-%d %H:%M UTC")),
        &data,
    ).await?;
    notifier::publish(state.broadcaster.as_ref(), realtime::REHEARSAL_REMINDER, &rehearsal.band_id, data).await;

    info!("Reminder sent to {} members", recipients.len());
    Ok(true)
}
