use axum::{extract::{Path, Query, State}, http::StatusCode, response::IntoResponse, Json};
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use crate::api::dtos::requests::{AvailabilityPeriod, CreateRecurringRequest, DateRangeQuery, ExceptionRequest, SetAvailabilityRequest};
use crate::api::dtos::responses::{BandAvailabilityResponse, MyAvailabilityResponse, OptimalTimesResponse, SlotResponse};
use crate::api::extractors::{auth::AuthUser, band::BandMembership};
use crate::domain::models::availability::{AvailabilityException, RecurringAvailability, UserAvailability, DEFAULT_PRIORITY};
use crate::domain::models::realtime;
use crate::domain::services::availability::{SlotQuery, MAX_RANGE_DAYS};
use crate::domain::services::notifier;
use crate::error::{AppError, FieldError};
use crate::state::AppState;
use crate::validation::{is_timezone, is_uuid, parse_hhmm, parse_timestamp, Validator};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info};

const MIN_DURATION_MINUTES: i64 = 30;
const MAX_DURATION_MINUTES: i64 = 480;

fn is_priority(p: i32) -> bool {
    (1..=10).contains(&p)
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

fn range_fits(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> bool {
    match (start, end) {
        (Some(s), Some(e)) => e - s <= chrono::Duration::days(MAX_RANGE_DAYS),
        _ => true,
    }
}

/// Parses and checks a `start_date`/`end_date` pair, both required.
fn date_range(start: Option<&str>, end: Option<&str>, tz: Tz) -> Result<(DateTime<Utc>, DateTime<Utc>), AppError> {
    let start = start.and_then(|v| parse_timestamp(v, tz));
    let end = end.and_then(|v| parse_timestamp(v, tz));

    Validator::new()
        .check("start_date", start.is_some(), "Valid start date is required")
        .check("end_date", end.is_some(), "Valid end date is required")
        .check("end_date", match (start, end) { (Some(s), Some(e)) => e > s, _ => true }, "End date must be after start date")
        .check("end_date", range_fits(start, end), "Date range cannot exceed 366 days")
        .validate()?;

    match (start, end) {
        (Some(s), Some(e)) => Ok((s, e)),
        _ => Err(AppError::Internal),
    }
}

/// Zone used to read date-only bounds; unknown names are rejected.
fn query_timezone(timezone: Option<&str>) -> Result<Tz, AppError> {
    Validator::new()
        .check("timezone", timezone.is_none_or(is_timezone), "Unknown timezone")
        .validate()?;
    Ok(timezone.and_then(|name| name.parse().ok()).unwrap_or(chrono_tz::UTC))
}

/// Tells every band of `user_id` that its availability changed.
async fn announce_change(state: &AppState, user_id: &str) -> Result<(), AppError> {
    for band_id in state.band_repo.list_band_ids_for_user(user_id).await? {
        notifier::publish(
            state.broadcaster.as_ref(),
            realtime::AVAILABILITY_UPDATED,
            &band_id,
            json!({ "user_id": user_id }),
        ).await;
    }
    Ok(())
}

pub async fn get_my_availability(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(query): Query<DateRangeQuery>,
) -> Result<impl IntoResponse, AppError> {
    let tz = query_timezone(query.timezone.as_deref())?;
    let (start, end) = date_range(query.start_date.as_deref(), query.end_date.as_deref(), tz)?;

    let (intervals, recurring, exceptions) = tokio::try_join!(
        state.availability_repo.list_intervals(&user.id, start, end),
        state.availability_repo.list_recurring(&user.id),
        state.availability_repo.list_exceptions(&user.id, start.date_naive(), end.date_naive()),
    )?;

    Ok(Json(MyAvailabilityResponse { intervals, recurring, exceptions }))
}

fn collect_periods(
    user_id: &str,
    periods: &[AvailabilityPeriod],
    field: &str,
    is_available: bool,
    errors: &mut Vec<FieldError>,
    out: &mut Vec<UserAvailability>,
) {
    for (i, period) in periods.iter().enumerate() {
        let start = parse_timestamp(&period.start_time, chrono_tz::UTC);
        let end = parse_timestamp(&period.end_time, chrono_tz::UTC);
        let priority = period.priority.unwrap_or(DEFAULT_PRIORITY);

        let mut report = Validator::new()
            .check(&format!("{}[{}].start_time", field, i), start.is_some(), "Valid start time is required")
            .check(&format!("{}[{}].end_time", field, i), end.is_some(), "Valid end time is required")
            .check(&format!("{}[{}].priority", field, i), is_priority(priority), "Priority must be between 1 and 10")
            .errors();

        match (start, end) {
            (Some(s), Some(e)) if e > s => {
                if report.is_empty() {
                    let mut interval = UserAvailability::new(user_id.to_string(), s, e, is_available);
                    interval.priority = priority;
                    interval.notes = period.notes.clone();
                    out.push(interval);
                }
            }
            (Some(_), Some(_)) => report.push(FieldError {
                field: format!("{}[{}].end_time", field, i),
                message: "End time must be after start time".into(),
            }),
            _ => {}
        }
        errors.append(&mut report);
    }
}

/// Replaces the caller's explicit intervals inside the span the payload covers.
pub async fn set_my_availability(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(payload): Json<SetAvailabilityRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut errors = Vec::new();
    let mut intervals = Vec::new();
    collect_periods(&user.id, &payload.available_periods, "available_periods", true, &mut errors, &mut intervals);
    collect_periods(&user.id, payload.unavailable_periods.as_deref().unwrap_or_default(), "unavailable_periods", false, &mut errors, &mut intervals);

    if !errors.is_empty() {
        return Err(AppError::InvalidFields(errors));
    }

    let (Some(span_start), Some(span_end)) = (
        intervals.iter().map(|i| i.start_time).min(),
        intervals.iter().map(|i| i.end_time).max(),
    ) else {
        return Ok(Json(Vec::new()));
    };

    let saved = state.availability_repo.replace_intervals(&user.id, span_start, span_end, &intervals).await?;
    announce_change(&state, &user.id).await?;

    info!(user_id = %user.id, intervals = saved.len(), "Replaced availability intervals");
    Ok(Json(saved))
}

pub async fn list_recurring(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let rules = state.availability_repo.list_recurring(&user.id).await?;
    Ok(Json(rules))
}

pub async fn create_recurring(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(payload): Json<CreateRecurringRequest>,
) -> Result<impl IntoResponse, AppError> {
    let start = parse_hhmm(&payload.start_time);
    let end = parse_hhmm(&payload.end_time);
    let priority = payload.priority.unwrap_or(DEFAULT_PRIORITY);

    Validator::new()
        .check("day_of_week", (0..=6).contains(&payload.day_of_week), "Day must be between 0 (Sunday) and 6 (Saturday)")
        .check("start_time", start.is_some(), "Start time must be in HH:MM format")
        .check("end_time", end.is_some(), "End time must be in HH:MM format")
        .check("end_time", match (start, end) { (Some(s), Some(e)) => e > s, _ => true }, "End time must be after start time")
        .check("priority", is_priority(priority), "Priority must be between 1 and 10")
        .validate()?;

    let (Some(start), Some(end)) = (start, end) else {
        return Err(AppError::Internal);
    };

    let mut rule = RecurringAvailability::new(user.id.clone(), payload.day_of_week, start, end, payload.is_available.unwrap_or(true));
    rule.priority = priority;
    rule.notes = payload.notes;

    let created = state.availability_repo.create_recurring(&rule).await?;
    announce_change(&state, &user.id).await?;

    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn delete_recurring(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state.availability_repo.delete_recurring(&user.id, &id).await?;
    announce_change(&state, &user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_exceptions(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(query): Query<DateRangeQuery>,
) -> Result<impl IntoResponse, AppError> {
    let start = query.start_date.as_deref().map(parse_date);
    let end = query.end_date.as_deref().map(parse_date);

    Validator::new()
        .check("start_date", !matches!(start, Some(None)), "Start date must be YYYY-MM-DD")
        .check("end_date", !matches!(end, Some(None)), "End date must be YYYY-MM-DD")
        .validate()?;

    let start = start.flatten().unwrap_or_default();
    let end = end.flatten().unwrap_or_else(|| Utc::now().date_naive() + chrono::Duration::days(3650));

    let exceptions = state.availability_repo.list_exceptions(&user.id, start, end).await?;
    Ok(Json(exceptions))
}

pub async fn upsert_exception(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(payload): Json<ExceptionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let date = parse_date(&payload.exception_date);

    Validator::new()
        .check("exception_date", date.is_some(), "Exception date must be YYYY-MM-DD")
        .validate()?;

    let Some(date) = date else {
        return Err(AppError::Internal);
    };

    let mut exception = AvailabilityException::new(user.id.clone(), date, payload.is_available);
    exception.reason = payload.reason;

    let saved = state.availability_repo.upsert_exception(&exception).await?;
    announce_change(&state, &user.id).await?;

    Ok(Json(saved))
}

pub async fn delete_exception(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(date): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let parsed = parse_date(&date);
    Validator::new()
        .check("date", parsed.is_some(), "Date must be YYYY-MM-DD")
        .validate()?;

    let Some(date) = parsed else {
        return Err(AppError::Internal);
    };

    state.availability_repo.delete_exception(&user.id, date).await?;
    announce_change(&state, &user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn band_availability(
    State(state): State<Arc<AppState>>,
    access: BandMembership,
    Query(query): Query<DateRangeQuery>,
) -> Result<impl IntoResponse, AppError> {
    let tz = query_timezone(query.timezone.as_deref())?;
    let (start, end) = date_range(query.start_date.as_deref(), query.end_date.as_deref(), tz)?;
    let members = state.resolver.band_availability(access.band_id(), start, end).await?;

    Ok(Json(BandAvailabilityResponse {
        band_id: access.band_id().to_string(),
        start_date: start,
        end_date: end,
        members,
    }))
}

/// Raw optimal-times parameters. Array parameters may repeat, use the `[]`
/// suffix, or carry comma-separated values.
#[derive(Default)]
struct OptimalTimesParams {
    start_date: Option<String>,
    end_date: Option<String>,
    duration_minutes: Option<String>,
    timezone: Option<String>,
    required_members: Vec<String>,
    preferred_days: Vec<String>,
}

impl OptimalTimesParams {
    fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut params = Self::default();
        for (key, value) in pairs {
            match key.as_str() {
                "start_date" => params.start_date = Some(value),
                "end_date" => params.end_date = Some(value),
                "duration_minutes" => params.duration_minutes = Some(value),
                "timezone" => params.timezone = Some(value),
                "required_members" | "required_members[]" => params.required_members.extend(split_list(&value)),
                "preferred_days" | "preferred_days[]" => params.preferred_days.extend(split_list(&value)),
                _ => {}
            }
        }
        params
    }

    fn into_query(self) -> Result<SlotQuery, AppError> {
        let timezone_valid = self.timezone.as_deref().is_none_or(is_timezone);
        let tz: Tz = self.timezone.as_deref().and_then(|t| t.parse().ok()).unwrap_or(chrono_tz::UTC);

        let start = self.start_date.as_deref().and_then(|v| parse_timestamp(v, tz));
        let end = self.end_date.as_deref().and_then(|v| parse_timestamp(v, tz));
        let duration = self.duration_minutes.as_deref().and_then(|v| v.trim().parse::<i64>().ok());
        let preferred: Vec<Option<u32>> = self.preferred_days.iter()
            .map(|d| d.parse::<u32>().ok().filter(|d| *d <= 6))
            .collect();

        Validator::new()
            .check("timezone", timezone_valid, "Unknown timezone")
            .check("start_date", start.is_some(), "Valid start date is required")
            .check("end_date", end.is_some(), "Valid end date is required")
            .check("end_date", match (start, end) { (Some(s), Some(e)) => e > s, _ => true }, "End date must be after start date")
            .check("end_date", range_fits(start, end), "Date range cannot exceed 366 days")
            .check(
                "duration_minutes",
                duration.is_some_and(|d| (MIN_DURATION_MINUTES..=MAX_DURATION_MINUTES).contains(&d)),
                "Duration must be between 30 and 480 minutes",
            )
            .check("required_members", self.required_members.iter().all(|id| is_uuid(id)), "Each required member must be a valid user ID")
            .check("preferred_days", preferred.iter().all(Option::is_some), "Day must be between 0 (Sunday) and 6 (Saturday)")
            .validate()?;

        let (Some(range_start), Some(range_end), Some(duration_minutes)) = (start, end, duration) else {
            return Err(AppError::Internal);
        };

        Ok(SlotQuery {
            range_start,
            range_end,
            duration_minutes,
            required_member_ids: self.required_members,
            preferred_days: preferred.into_iter().flatten().collect(),
            timezone: tz,
        })
    }
}

fn split_list(value: &str) -> impl Iterator<Item = String> + '_ {
    value.split(',').map(str::trim).filter(|v| !v.is_empty()).map(String::from)
}

pub async fn optimal_times(
    State(state): State<Arc<AppState>>,
    access: BandMembership,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<impl IntoResponse, AppError> {
    let query = OptimalTimesParams::from_pairs(pairs).into_query()?;
    debug!(band_id = %access.band_id(), start = %query.range_start, end = %query.range_end, "Computing optimal times");

    let slots = state.resolver.resolve(access.band_id(), &query).await?;

    Ok(Json(OptimalTimesResponse {
        band_id: access.band_id().to_string(),
        duration_minutes: query.duration_minutes,
        slots: slots.into_iter().map(SlotResponse::from).collect(),
    }))
}
