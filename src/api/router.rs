use axum::{
    body::Body,
    extract::Request,
    http::{header, HeaderName, HeaderValue, Method},
    routing::{get, post, put, delete},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use crate::state::AppState;
use crate::api::handlers::{
    auth, availability, band, equipment, health, notification, realtime, rehearsal, setlist, song, venue,
};
use tower_http::{
    classify::ServerErrorsFailureClass,
    cors::CorsLayer,
    trace::TraceLayer,
};
use tower_cookies::CookieManagerLayer;
use tracing::{info_span, warn, Span, error, info};
use uuid::Uuid;

pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config.client_url);

    Router::new()
        .route("/health", get(health::health_check))

        // Auth
        .route("/api/v1/auth/register", post(auth::register))
        .route("/api/v1/auth/login", post(auth::login))
        .route("/api/v1/auth/refresh", post(auth::refresh))
        .route("/api/v1/auth/logout", post(auth::logout))
        .route("/api/v1/auth/me", get(auth::me))

        // Bands
        .route("/api/v1/bands", get(band::list_bands).post(band::create_band))
        .route("/api/v1/bands/{band_id}", get(band::get_band).put(band::update_band).delete(band::delete_band))
        .route("/api/v1/bands/{band_id}/members", get(band::list_members).post(band::add_member))
        .route("/api/v1/bands/{band_id}/members/{user_id}", put(band::update_member).delete(band::remove_member))
        .route("/api/v1/bands/{band_id}/events", get(realtime::band_events))

        // Availability
        .route("/api/v1/availability", get(availability::get_my_availability).put(availability::set_my_availability))
        .route("/api/v1/availability/recurring", get(availability::list_recurring).post(availability::create_recurring))
        .route("/api/v1/availability/recurring/{id}", delete(availability::delete_recurring))
        .route("/api/v1/availability/exceptions", get(availability::list_exceptions).post(availability::upsert_exception))
        .route("/api/v1/availability/exceptions/{date}", delete(availability::delete_exception))
        .route("/api/v1/availability/band/{band_id}", get(availability::band_availability))
        .route("/api/v1/availability/optimal-times/{band_id}", get(availability::optimal_times))

        // Rehearsals
        .route("/api/v1/rehearsals", get(rehearsal::list_rehearsals).post(rehearsal::create_rehearsal))
        .route("/api/v1/rehearsals/{id}", get(rehearsal::get_rehearsal).put(rehearsal::update_rehearsal).delete(rehearsal::delete_rehearsal))
        .route("/api/v1/rehearsals/{id}/attendees", get(rehearsal::list_attendees))
        .route("/api/v1/rehearsals/{id}/attendance", put(rehearsal::update_attendance))

        // Venues
        .route("/api/v1/venues", get(venue::list_venues).post(venue::create_venue))
        .route("/api/v1/venues/{id}", get(venue::get_venue).put(venue::update_venue).delete(venue::delete_venue))

        // Songs
        .route("/api/v1/songs", get(song::list_songs).post(song::create_song))
        .route("/api/v1/songs/{id}", get(song::get_song).put(song::update_song).delete(song::delete_song))
        .route("/api/v1/songs/{id}/attachments", post(song::add_attachment))
        .route("/api/v1/songs/{id}/attachments/{attachment_id}", delete(song::delete_attachment))
        .route("/api/v1/songs/{id}/notes", get(song::list_notes).post(song::create_note))
        .route("/api/v1/songs/{id}/notes/{note_id}", put(song::update_note).delete(song::delete_note))

        // Setlists
        .route("/api/v1/setlists", get(setlist::list_setlists).post(setlist::create_setlist))
        .route("/api/v1/setlists/{id}", get(setlist::get_setlist).put(setlist::update_setlist).delete(setlist::delete_setlist))
        .route("/api/v1/setlists/{id}/songs", post(setlist::add_song))
        .route("/api/v1/setlists/{id}/songs/order", put(setlist::reorder_songs))
        .route("/api/v1/setlists/{id}/songs/{song_id}", delete(setlist::remove_song))

        // Equipment
        .route("/api/v1/equipment", get(equipment::list_equipment).post(equipment::create_equipment))
        .route("/api/v1/equipment/{id}", get(equipment::get_equipment).put(equipment::update_equipment).delete(equipment::delete_equipment))
        .route("/api/v1/equipment/rehearsal/{rehearsal_id}", get(equipment::rehearsal_equipment).post(equipment::assign_equipment))
        .route("/api/v1/equipment/rehearsal/{rehearsal_id}/{equipment_id}", delete(equipment::unassign_equipment))

        // Notifications
        .route("/api/v1/notifications", get(notification::list_notifications).delete(notification::delete_all))
        .route("/api/v1/notifications/read-all", put(notification::mark_all_read))
        .route("/api/v1/notifications/{id}/read", put(notification::mark_read))
        .route("/api/v1/notifications/{id}", delete(notification::delete_notification))

        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    let request_id = Uuid::new_v4().to_string();
                    info_span!(
                        "http_request",
                        request_id = %request_id,
                        method = ?request.method(),
                        uri = ?request.uri(),
                        version = ?request.version(),
                        user_id = tracing::field::Empty,
                    )
                })
                .on_request(|request: &Request<Body>, _span: &Span| {
                    info!("started processing request: {} {}", request.method(), request.uri().path());
                })
                .on_response(|response: &axum::http::Response<Body>, latency: Duration, _span: &Span| {
                    info!(
                        status = response.status().as_u16(),
                        latency_ms = latency.as_millis(),
                        "finished processing request"
                    );
                })
                .on_failure(|error: ServerErrorsFailureClass, _latency: Duration, _span: &Span| {
                    error!("request failed: {:?}", error);
                })
        )
        .layer(cors)
        .layer(CookieManagerLayer::new())
        .with_state(state)
}

/// Credentialed CORS for the single configured frontend origin.
fn cors_layer(client_url: &str) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static("x-csrf-token")])
        .allow_credentials(true);

    match HeaderValue::from_str(client_url) {
        Ok(origin) => layer.allow_origin(origin),
        Err(_) => {
            warn!("Invalid CLIENT_URL {:?}, cross-origin requests disabled", client_url);
            layer
        }
    }
}
