use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use crate::api::extractors::band::BandMembership;
use crate::domain::models::realtime::band_topic;
use crate::state::AppState;
use futures::stream::{Stream, StreamExt};
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, warn};

const KEEP_ALIVE_SECS: u64 = 30;

/// Live band events for members. Lagged receivers skip the missed events.
pub async fn band_events(
    State(state): State<Arc<AppState>>,
    access: BandMembership,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let topic = band_topic(access.band_id());
    debug!(user_id = %access.user.id, %topic, "Realtime subscriber connected");

    let rx = state.broadcaster.subscribe(&topic).await;

    let stream = BroadcastStream::new(rx).filter_map(|result| async move {
        match result {
            Ok(event) => match Event::default().event(event.event.clone()).id(event.id.clone()).json_data(&event) {
                Ok(sse) => Some(Ok(sse)),
                Err(e) => {
                    warn!("Failed to serialize band event: {}", e);
                    None
                }
            },
            Err(e) => {
                warn!("Band event stream lagged: {:?}", e);
                None
            }
        }
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(KEEP_ALIVE_SECS))
            .text("keep-alive"),
    )
}
