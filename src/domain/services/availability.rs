use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use crate::domain::models::availability::{
    AvailabilityException, AvailabilityWindow, CandidateSlot, MemberAvailability,
    RecurringAvailability, SlotScore, UserAvailability, DEFAULT_PRIORITY,
};
use crate::domain::models::band::BandMemberDetail;
use crate::domain::ports::{AvailabilityRepository, BandRepository};
use crate::domain::services::intervals::Timeline;
use crate::error::AppError;
use crate::validation::Validator;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{debug, info};

/// Longest date range a single query may span.
pub const MAX_RANGE_DAYS: i64 = 366;

fn within_max_range(start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
    end - start <= Duration::days(MAX_RANGE_DAYS)
}

/// Parameters of one optimal-rehearsal-time query.
#[derive(Debug, Clone)]
pub struct SlotQuery {
    pub range_start: DateTime<Utc>,
    pub range_end: DateTime<Utc>,
    pub duration_minutes: i64,
    /// Empty means every band member is required.
    pub required_member_ids: Vec<String>,
    /// Days counted from Sunday (0) to Saturday (6).
    pub preferred_days: Vec<u32>,
    /// Zone in which `preferred_days` are evaluated.
    pub timezone: Tz,
}

/// The three availability sources of a single member.
#[derive(Debug, Default)]
pub struct MemberSources<'a> {
    pub recurring: Vec<&'a RecurringAvailability>,
    pub explicit: Vec<&'a UserAvailability>,
    pub exceptions: Vec<&'a AvailabilityException>,
}

pub struct AvailabilityResolver {
    band_repo: Arc<dyn BandRepository>,
    availability_repo: Arc<dyn AvailabilityRepository>,
}

impl AvailabilityResolver {
    pub fn new(band_repo: Arc<dyn BandRepository>, availability_repo: Arc<dyn AvailabilityRepository>) -> Self {
        Self { band_repo, availability_repo }
    }

    pub async fn resolve(&self, band_id: &str, query: &SlotQuery) -> Result<Vec<CandidateSlot>, AppError> {
        Validator::new()
            .check("end_date", query.range_end > query.range_start, "End date must be after start date")
            .check("end_date", within_max_range(query.range_start, query.range_end), "Date range cannot exceed 366 days")
            .check("duration_minutes", query.duration_minutes > 0, "Duration must be a positive number of minutes")
            .check(
                "preferred_days",
                query.preferred_days.iter().all(|d| *d <= 6),
                "Day must be between 0 (Sunday) and 6 (Saturday)",
            )
            .validate()?;

        let members = self.load_members(band_id).await?;
        let required = required_members(&members, &query.required_member_ids)?;

        let windows = self.member_windows(&members, query.range_start, query.range_end).await?;
        let slots = find_candidate_slots(
            &windows,
            &required,
            query.duration_minutes,
            &query.preferred_days,
            query.timezone,
        );

        info!(
            band_id = %band_id,
            members = members.len(),
            required = required.len(),
            slots = slots.len(),
            "Resolved optimal rehearsal times"
        );
        Ok(slots)
    }

    /// Merged availability windows of every band member in `[start, end)`.
    pub async fn band_availability(&self, band_id: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<MemberAvailability>, AppError> {
        Validator::new()
            .check("end_date", end > start, "End date must be after start date")
            .check("end_date", within_max_range(start, end), "Date range cannot exceed 366 days")
            .validate()?;

        let members = self.load_members(band_id).await?;
        let windows = self.member_windows(&members, start, end).await?;

        Ok(windows
            .into_iter()
            .map(|(user_id, windows)| MemberAvailability { user_id, windows })
            .collect())
    }

    async fn load_members(&self, band_id: &str) -> Result<Vec<BandMemberDetail>, AppError> {
        self.band_repo.find_by_id(band_id).await?
            .ok_or(AppError::NotFound("Band not found".into()))?;

        let mut members = self.band_repo.list_members(band_id).await?;
        members.sort_by(|a, b| a.user_id.cmp(&b.user_id));
        Ok(members)
    }

    async fn member_windows(
        &self,
        members: &[BandMemberDetail],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<(String, Vec<AvailabilityWindow>)>, AppError> {
        let user_ids: Vec<String> = members.iter().map(|m| m.user_id.clone()).collect();

        // Widen by a day so exceptions in any member timezone are covered.
        let first_date = (start - Duration::days(1)).date_naive();
        let last_date = (end + Duration::days(1)).date_naive();

        let (recurring, explicit, exceptions) = tokio::try_join!(
            self.availability_repo.fetch_recurring_rules(&user_ids),
            self.availability_repo.fetch_explicit_intervals(&user_ids, start, end),
            self.availability_repo.fetch_exceptions(&user_ids, first_date, last_date),
        )?;

        debug!(
            recurring = recurring.len(),
            explicit = explicit.len(),
            exceptions = exceptions.len(),
            "Fetched availability sources"
        );

        let mut sources: HashMap<&str, MemberSources> = HashMap::new();
        for rule in &recurring {
            sources.entry(rule.user_id.as_str()).or_default().recurring.push(rule);
        }
        for interval in &explicit {
            sources.entry(interval.user_id.as_str()).or_default().explicit.push(interval);
        }
        for exception in &exceptions {
            sources.entry(exception.user_id.as_str()).or_default().exceptions.push(exception);
        }

        let empty = MemberSources::default();
        Ok(members
            .iter()
            .map(|member| {
                let tz: Tz = member.timezone.parse().unwrap_or(chrono_tz::UTC);
                let member_sources = sources.get(member.user_id.as_str()).unwrap_or(&empty);
                (member.user_id.clone(), merge_member_availability(tz, start, end, member_sources))
            })
            .collect())
    }
}

fn required_members(members: &[BandMemberDetail], requested: &[String]) -> Result<Vec<String>, AppError> {
    if requested.is_empty() {
        return Ok(members.iter().map(|m| m.user_id.clone()).collect());
    }

    let known: BTreeSet<&str> = members.iter().map(|m| m.user_id.as_str()).collect();
    let mut required = BTreeSet::new();
    for id in requested {
        if !known.contains(id.as_str()) {
            return Err(AppError::Membership(id.clone()));
        }
        required.insert(id.clone());
    }
    Ok(required.into_iter().collect())
}

fn local_to_utc(tz: Tz, naive: NaiveDateTime) -> Option<DateTime<Utc>> {
    // Wall-clock times skipped by a DST jump resolve to the first instant after the gap.
    tz.from_local_datetime(&naive)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(naive + Duration::hours(1))).earliest())
        .map(|dt| dt.with_timezone(&Utc))
}

fn day_span(tz: Tz, date: NaiveDate) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let next = date.succ_opt()?;
    Some((
        local_to_utc(tz, date.and_time(NaiveTime::MIN))?,
        local_to_utc(tz, next.and_time(NaiveTime::MIN))?,
    ))
}

fn rule_span(tz: Tz, date: NaiveDate, rule: &RecurringAvailability) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let start = local_to_utc(tz, date.and_time(rule.start_time))?;
    // 23:59 closes the day
    let end = if rule.end_time.hour() == 23 && rule.end_time.minute() == 59 {
        local_to_utc(tz, date.succ_opt()?.and_time(NaiveTime::MIN))?
    } else {
        local_to_utc(tz, date.and_time(rule.end_time))?
    };
    (start < end).then_some((start, end))
}

fn clamp_priority(priority: i32) -> i32 {
    priority.clamp(1, 10)
}

/// Merges one member's sources into maximal available windows inside
/// `[start, end)`.
///
/// Layers apply in increasing precedence: recurring rules, then whole-day
/// exceptions, then explicit intervals in creation order.
pub fn merge_member_availability(
    tz: Tz,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    sources: &MemberSources,
) -> Vec<AvailabilityWindow> {
    if start >= end {
        return Vec::new();
    }

    let first_day = start.with_timezone(&tz).date_naive();
    let last_day = end.with_timezone(&tz).date_naive();
    let days: Vec<NaiveDate> = first_day.iter_days().take_while(|d| *d <= last_day).collect();

    let mut timeline = Timeline::new();

    for day in &days {
        let dow = day.weekday().num_days_from_sunday() as i32;
        for rule in sources.recurring.iter().filter(|r| r.is_available && r.day_of_week == dow) {
            if let Some((s, e)) = rule_span(tz, *day, rule) {
                timeline.union(s, e, clamp_priority(rule.priority));
            }
        }
    }
    for day in &days {
        let dow = day.weekday().num_days_from_sunday() as i32;
        for rule in sources.recurring.iter().filter(|r| !r.is_available && r.day_of_week == dow) {
            if let Some((s, e)) = rule_span(tz, *day, rule) {
                timeline.remove(s, e);
            }
        }
    }

    for exception in &sources.exceptions {
        if exception.exception_date < first_day || exception.exception_date > last_day {
            continue;
        }
        if let Some((s, e)) = day_span(tz, exception.exception_date) {
            if exception.is_available {
                timeline.union(s, e, DEFAULT_PRIORITY);
            } else {
                timeline.remove(s, e);
            }
        }
    }

    let mut explicit = sources.explicit.clone();
    explicit.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
    for interval in explicit {
        if interval.is_available {
            timeline.overlay(interval.start_time, interval.end_time, clamp_priority(interval.priority));
        } else {
            timeline.remove(interval.start_time, interval.end_time);
        }
    }

    timeline.clip(start, end);
    timeline.into_windows()
}

/// Intersects member windows with an endpoint sweep and ranks the result.
///
/// `members` pairs each user id with its merged windows; `required` empty
/// means every member is required. A slot is a maximal span during which
/// every required member is available, lasting at least `duration_minutes`.
/// Other members add to a slot's coverage only when they are free for the
/// whole span, so they never split it.
pub fn find_candidate_slots(
    members: &[(String, Vec<AvailabilityWindow>)],
    required: &[String],
    duration_minutes: i64,
    preferred_days: &[u32],
    tz: Tz,
) -> Vec<CandidateSlot> {
    let required_idx: Vec<usize> = members
        .iter()
        .enumerate()
        .filter(|(_, (id, _))| required.is_empty() || required.contains(id))
        .map(|(idx, _)| idx)
        .collect();
    if required_idx.is_empty() || required_idx.len() < required.len() {
        // A required id without windows can never be covered.
        return Vec::new();
    }

    // Ends sort before starts so touching windows do not overlap.
    let mut events: Vec<(DateTime<Utc>, i32)> = Vec::new();
    for idx in &required_idx {
        for w in &members[*idx].1 {
            events.push((w.start, 1));
            events.push((w.end, -1));
        }
    }
    events.sort();

    let needed = required_idx.len() as i32;
    let mut active = 0;
    let mut open: Option<DateTime<Utc>> = None;
    let mut spans: Vec<(DateTime<Utc>, DateTime<Utc>)> = Vec::new();

    for (at, delta) in events {
        active += delta;
        if active == needed {
            open = Some(at);
        } else if let Some(start) = open.take() {
            if at > start {
                spans.push((start, at));
            }
        }
    }

    let min_len = Duration::minutes(duration_minutes);
    let mut slots: Vec<CandidateSlot> = spans
        .into_iter()
        .filter(|(start, end)| *end - *start >= min_len)
        .map(|(start, end)| {
            let covering: Vec<(&String, i32)> = members
                .iter()
                .filter_map(|(id, windows)| {
                    windows.iter()
                        .find(|w| w.start <= start && w.end >= end)
                        .map(|w| (id, w.priority))
                })
                .collect();
            let dow = start.with_timezone(&tz).weekday().num_days_from_sunday();

            CandidateSlot {
                start,
                end,
                covered_member_ids: covering.iter().map(|(id, _)| (*id).clone()).collect(),
                score: SlotScore {
                    covered_members: covering.len(),
                    priority_sum: covering.iter().map(|(_, p)| p).sum(),
                    preferred_day: preferred_days.contains(&dow),
                },
            }
        })
        .collect();

    slots.sort_by(|a, b| {
        b.score.cmp(&a.score)
            .then(a.start.cmp(&b.start))
            .then(a.end.cmp(&b.end))
    });
    slots
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2025-06-16 is a Monday.
    fn utc(d: u32, h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, d, h, m, 0).unwrap()
    }

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn rule(user: &str, day: i32, start: NaiveTime, end: NaiveTime, available: bool) -> RecurringAvailability {
        RecurringAvailability::new(user.to_string(), day, start, end, available)
    }

    fn merged(sources: &MemberSources) -> Vec<AvailabilityWindow> {
        merge_member_availability(chrono_tz::UTC, utc(16, 0, 0), utc(17, 0, 0), sources)
    }

    #[test]
    fn overlapping_evenings_yield_single_slot() {
        let a = rule("a", 1, hm(18, 0), hm(22, 0), true);
        let b = rule("b", 1, hm(19, 0), hm(21, 0), true);

        let members = vec![
            ("a".to_string(), merged(&MemberSources { recurring: vec![&a], ..Default::default() })),
            ("b".to_string(), merged(&MemberSources { recurring: vec![&b], ..Default::default() })),
        ];
        let required = vec!["a".to_string(), "b".to_string()];

        let slots = find_candidate_slots(&members, &required, 120, &[], chrono_tz::UTC);

        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].start, utc(16, 19, 0));
        assert_eq!(slots[0].end, utc(16, 21, 0));
        assert_eq!(slots[0].covered_member_ids, required);
        assert_eq!(slots[0].score.priority_sum, 10);
    }

    #[test]
    fn short_overlap_is_dropped() {
        let a = rule("a", 1, hm(18, 0), hm(22, 0), true);
        let b = rule("b", 1, hm(19, 0), hm(20, 0), true);

        let members = vec![
            ("a".to_string(), merged(&MemberSources { recurring: vec![&a], ..Default::default() })),
            ("b".to_string(), merged(&MemberSources { recurring: vec![&b], ..Default::default() })),
        ];

        let slots = find_candidate_slots(&members, &["a".to_string(), "b".to_string()], 90, &[], chrono_tz::UTC);
        assert!(slots.is_empty());
    }

    #[test]
    fn unavailable_exception_blocks_recurring_day() {
        let weekly = rule("a", 1, hm(18, 0), hm(22, 0), true);
        let mut off = AvailabilityException::new("a".into(), NaiveDate::from_ymd_opt(2025, 6, 16).unwrap(), false);
        off.reason = Some("Gig".into());

        let windows = merged(&MemberSources { recurring: vec![&weekly], exceptions: vec![&off], ..Default::default() });
        assert!(windows.is_empty());
    }

    #[test]
    fn explicit_interval_outranks_exception() {
        let on = AvailabilityException::new("a".into(), NaiveDate::from_ymd_opt(2025, 6, 16).unwrap(), true);
        let busy = UserAvailability::new("a".into(), utc(16, 12, 0), utc(16, 14, 0), false);

        let windows = merged(&MemberSources { exceptions: vec![&on], explicit: vec![&busy], ..Default::default() });

        assert_eq!(windows.len(), 2);
        assert_eq!((windows[0].start, windows[0].end), (utc(16, 0, 0), utc(16, 12, 0)));
        assert_eq!((windows[1].start, windows[1].end), (utc(16, 14, 0), utc(17, 0, 0)));
        assert!(windows.iter().all(|w| w.priority == DEFAULT_PRIORITY));
    }

    #[test]
    fn later_explicit_interval_wins() {
        let free = UserAvailability::new("a".into(), utc(16, 10, 0), utc(16, 16, 0), true);
        let mut busy = UserAvailability::new("a".into(), utc(16, 12, 0), utc(16, 13, 0), false);
        busy.created_at = free.created_at + Duration::seconds(1);

        // Insertion order must not matter, only creation order.
        let windows = merged(&MemberSources { explicit: vec![&busy, &free], ..Default::default() });

        assert_eq!(windows.len(), 2);
        assert_eq!(windows[0].end, utc(16, 12, 0));
        assert_eq!(windows[1].start, utc(16, 13, 0));
    }

    #[test]
    fn unavailable_rule_subtracts_from_available_rule() {
        let evening = rule("a", 1, hm(17, 0), hm(23, 0), true);
        let dinner = rule("a", 1, hm(19, 0), hm(20, 0), false);

        let windows = merged(&MemberSources { recurring: vec![&dinner, &evening], ..Default::default() });

        assert_eq!(windows.len(), 2);
        assert_eq!(windows[0].end, utc(16, 19, 0));
        assert_eq!(windows[1].start, utc(16, 20, 0));
    }

    #[test]
    fn rule_ending_2359_runs_to_midnight() {
        let late = rule("a", 1, hm(20, 0), hm(23, 59), true);
        let windows = merge_member_availability(
            chrono_tz::UTC,
            utc(16, 0, 0),
            utc(18, 0, 0),
            &MemberSources { recurring: vec![&late], ..Default::default() },
        );

        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].end, utc(17, 0, 0));
    }

    #[test]
    fn rules_follow_member_timezone() {
        // 19:00-21:00 in Berlin (UTC+2 in June).
        let a = rule("a", 1, hm(19, 0), hm(21, 0), true);
        let windows = merge_member_availability(
            chrono_tz::Europe::Berlin,
            utc(16, 0, 0),
            utc(17, 0, 0),
            &MemberSources { recurring: vec![&a], ..Default::default() },
        );

        assert_eq!(windows.len(), 1);
        assert_eq!((windows[0].start, windows[0].end), (utc(16, 17, 0), utc(16, 19, 0)));
    }

    #[test]
    fn skipped_wall_clock_time_starts_after_gap() {
        // 2025-03-30 is a Sunday; Berlin jumps from 02:00 to 03:00.
        let night = rule("a", 0, hm(2, 30), hm(4, 0), true);
        let start = Utc.with_ymd_and_hms(2025, 3, 29, 12, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2025, 3, 31, 0, 0, 0).unwrap();

        let windows = merge_member_availability(
            chrono_tz::Europe::Berlin,
            start,
            end,
            &MemberSources { recurring: vec![&night], ..Default::default() },
        );

        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].start, Utc.with_ymd_and_hms(2025, 3, 30, 1, 30, 0).unwrap());
        assert_eq!(windows[0].end, Utc.with_ymd_and_hms(2025, 3, 30, 2, 0, 0).unwrap());
    }

    #[test]
    fn windows_are_clipped_to_range() {
        let all_day = UserAvailability::new("a".into(), utc(15, 0, 0), utc(18, 0, 0), true);
        let windows = merged(&MemberSources { explicit: vec![&all_day], ..Default::default() });

        assert_eq!(windows, vec![AvailabilityWindow { start: utc(16, 0, 0), end: utc(17, 0, 0), priority: DEFAULT_PRIORITY }]);
    }

    #[test]
    fn no_sources_means_no_slots() {
        let members = vec![
            ("a".to_string(), merged(&MemberSources::default())),
            ("b".to_string(), merged(&MemberSources::default())),
        ];
        assert!(members.iter().all(|(_, w)| w.is_empty()));

        let slots = find_candidate_slots(&members, &["a".to_string()], 30, &[], chrono_tz::UTC);
        assert!(slots.is_empty());
    }

    #[test]
    fn wider_coverage_ranks_first() {
        let a = vec![
            AvailabilityWindow { start: utc(16, 10, 0), end: utc(16, 12, 0), priority: 5 },
            AvailabilityWindow { start: utc(16, 14, 0), end: utc(16, 16, 0), priority: 5 },
        ];
        let b = vec![AvailabilityWindow { start: utc(16, 13, 0), end: utc(16, 17, 0), priority: 5 }];
        let members = vec![("a".to_string(), a), ("b".to_string(), b)];

        let slots = find_candidate_slots(&members, &["a".to_string()], 60, &[], chrono_tz::UTC);

        assert_eq!(slots.len(), 2);
        assert_eq!((slots[0].start, slots[0].end), (utc(16, 14, 0), utc(16, 16, 0)));
        assert_eq!(slots[0].covered_member_ids, vec!["a".to_string(), "b".to_string()]);
        assert_eq!((slots[1].start, slots[1].end), (utc(16, 10, 0), utc(16, 12, 0)));
        assert_eq!(slots[1].covered_member_ids, vec!["a".to_string()]);
    }

    #[test]
    fn optional_member_does_not_split_required_window() {
        let a = vec![AvailabilityWindow { start: utc(16, 18, 0), end: utc(16, 22, 0), priority: 5 }];
        let b = vec![AvailabilityWindow { start: utc(16, 19, 0), end: utc(16, 20, 0), priority: 5 }];
        let required = vec!["a".to_string()];

        let alone = find_candidate_slots(&[("a".to_string(), a.clone())], &required, 150, &[], chrono_tz::UTC);
        let with_b = find_candidate_slots(&[("a".to_string(), a), ("b".to_string(), b)], &required, 150, &[], chrono_tz::UTC);

        assert_eq!(with_b, alone);
        assert_eq!(with_b.len(), 1);
        assert_eq!((with_b[0].start, with_b[0].end), (utc(16, 18, 0), utc(16, 22, 0)));
        assert_eq!(with_b[0].covered_member_ids, required);
    }

    #[test]
    fn recurring_and_explicit_sources_intersect() {
        // A: every Monday 18-22. B: a one-off 19-21 on Monday 2025-06-16.
        let weekly = rule("a", 1, hm(18, 0), hm(22, 0), true);
        let once = UserAvailability::new("b".into(), utc(16, 19, 0), utc(16, 21, 0), true);

        let members = vec![
            ("a".to_string(), merged(&MemberSources { recurring: vec![&weekly], ..Default::default() })),
            ("b".to_string(), merged(&MemberSources { explicit: vec![&once], ..Default::default() })),
        ];

        let slots = find_candidate_slots(&members, &[], 60, &[], chrono_tz::UTC);

        assert_eq!(slots.len(), 1);
        assert_eq!((slots[0].start, slots[0].end), (utc(16, 19, 0), utc(16, 21, 0)));
        assert_eq!(slots[0].covered_member_ids, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn requiring_more_members_only_narrows_slots() {
        let a = vec![
            AvailabilityWindow { start: utc(16, 8, 0), end: utc(16, 12, 0), priority: 5 },
            AvailabilityWindow { start: utc(16, 18, 0), end: utc(16, 22, 0), priority: 5 },
        ];
        let b = vec![AvailabilityWindow { start: utc(16, 19, 0), end: utc(16, 21, 0), priority: 5 }];
        let members = vec![("a".to_string(), a), ("b".to_string(), b)];

        let loose = find_candidate_slots(&members, &["a".to_string()], 60, &[], chrono_tz::UTC);
        let strict = find_candidate_slots(&members, &["a".to_string(), "b".to_string()], 60, &[], chrono_tz::UTC);

        assert_eq!(loose.len(), 2);
        assert_eq!(strict.len(), 1);
        assert!(strict.len() <= loose.len());
        for slot in &strict {
            assert!(loose.iter().any(|l| l.start <= slot.start && slot.end <= l.end));
        }
    }

    #[test]
    fn overlapping_explicit_intervals_count_once() {
        let early = UserAvailability::new("a".into(), utc(16, 18, 0), utc(16, 21, 0), true);
        let mut late = UserAvailability::new("a".into(), utc(16, 19, 0), utc(16, 22, 0), true);
        late.priority = 7;
        late.created_at = early.created_at + Duration::seconds(1);

        let windows = merged(&MemberSources { explicit: vec![&early, &late], ..Default::default() });
        assert_eq!(windows, vec![AvailabilityWindow { start: utc(16, 18, 0), end: utc(16, 22, 0), priority: 7 }]);

        let b = vec![AvailabilityWindow { start: utc(16, 18, 0), end: utc(16, 22, 0), priority: 5 }];
        let members = vec![("a".to_string(), windows), ("b".to_string(), b)];
        let slots = find_candidate_slots(&members, &[], 60, &[], chrono_tz::UTC);

        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].covered_member_ids, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(slots[0].score.covered_members, 2);
        assert_eq!(slots[0].score.priority_sum, 12);
    }

    #[test]
    fn preferred_day_breaks_ties() {
        // Monday and Tuesday with equal coverage and priority.
        let a = vec![
            AvailabilityWindow { start: utc(16, 18, 0), end: utc(16, 20, 0), priority: 5 },
            AvailabilityWindow { start: utc(17, 18, 0), end: utc(17, 20, 0), priority: 5 },
        ];
        let members = vec![("a".to_string(), a)];

        let slots = find_candidate_slots(&members, &[], 60, &[2], chrono_tz::UTC);

        assert_eq!(slots.len(), 2);
        assert_eq!(slots[0].start, utc(17, 18, 0));
        assert!(slots[0].score.preferred_day);
        assert!(!slots[1].score.preferred_day);
    }

    #[test]
    fn required_member_without_windows_yields_nothing() {
        let a = vec![AvailabilityWindow { start: utc(16, 18, 0), end: utc(16, 20, 0), priority: 5 }];
        let members = vec![("a".to_string(), a)];

        let slots = find_candidate_slots(&members, &["ghost".to_string()], 60, &[], chrono_tz::UTC);
        assert!(slots.is_empty());
    }

    #[test]
    fn adding_availability_never_removes_slots() {
        let a = vec![AvailabilityWindow { start: utc(16, 18, 0), end: utc(16, 21, 0), priority: 5 }];
        let b = vec![AvailabilityWindow { start: utc(16, 18, 0), end: utc(16, 21, 0), priority: 5 }];
        let required = vec!["a".to_string()];

        let before = find_candidate_slots(&[("a".to_string(), a.clone())], &required, 60, &[], chrono_tz::UTC);
        let after = find_candidate_slots(&[("a".to_string(), a), ("b".to_string(), b)], &required, 60, &[], chrono_tz::UTC);

        assert_eq!(before.len(), 1);
        assert_eq!(after.len(), 1);
        assert!(after[0].score > before[0].score);
    }

    #[test]
    fn repeated_resolution_is_stable() {
        let weekly = rule("a", 1, hm(18, 0), hm(22, 0), true);
        let sources = MemberSources { recurring: vec![&weekly], ..Default::default() };
        let members = vec![("a".to_string(), merged(&sources))];

        let first = find_candidate_slots(&members, &[], 60, &[1], chrono_tz::UTC);
        let second = find_candidate_slots(&members, &[], 60, &[1], chrono_tz::UTC);

        assert_eq!(first, second);
        assert_eq!(merged(&sources), members[0].1);
        for slot in &first {
            assert!(slot.duration_minutes() >= 60);
            assert!(slot.start >= utc(16, 0, 0) && slot.end <= utc(17, 0, 0));
        }
    }

    #[test]
    fn unknown_required_member_is_rejected() {
        let member = BandMemberDetail {
            user_id: "a".into(),
            band_id: "band".into(),
            role: "admin".into(),
            instrument: None,
            nickname: None,
            joined_at: Utc::now(),
            email: "a@example.com".into(),
            first_name: "A".into(),
            last_name: "A".into(),
            timezone: "UTC".into(),
        };

        let err = required_members(std::slice::from_ref(&member), &["stranger".to_string()]).unwrap_err();
        assert!(matches!(err, AppError::Membership(id) if id == "stranger"));

        let all = required_members(&[member], &[]).unwrap();
        assert_eq!(all, vec!["a".to_string()]);
    }
}
