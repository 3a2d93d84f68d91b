//! Fan-out of band changes: stored notifications for members plus a live
//! event on the band topic.

use crate::domain::models::notification::Notification;
use crate::domain::models::realtime::{band_topic, BandEvent};
use crate::domain::ports::{EventBroadcaster, NotificationRepository};
use crate::error::AppError;
use serde_json::Value;
use tracing::debug;

pub async fn notify_users(
    repo: &dyn NotificationRepository,
    recipients: &[String],
    notification_type: &str,
    title: &str,
    message: &str,
    data: &Value,
) -> Result<(), AppError> {
    if recipients.is_empty() {
        return Ok(());
    }

    let notifications: Vec<Notification> = recipients
        .iter()
        .map(|user_id| Notification::new(user_id.clone(), notification_type, title.to_string(), message.to_string(), data))
        .collect();

    repo.create_many(&notifications).await?;
    debug!(notification_type, recipients = recipients.len(), "Stored notifications");
    Ok(())
}

pub async fn publish(broadcaster: &dyn EventBroadcaster, event: &str, band_id: &str, data: Value) -> usize {
    broadcaster.publish(&band_topic(band_id), BandEvent::new(event, band_id, data)).await
}
