use chrono::{DateTime, Utc};
use crate::domain::models::availability::AvailabilityWindow;
use std::cmp::{max, min};

/// Sorted, non-overlapping available spans of a single member. Neighbouring
/// spans may touch when their priorities differ; [`Timeline::into_windows`]
/// coalesces them.
#[derive(Debug, Default, Clone)]
pub struct Timeline {
    segments: Vec<AvailabilityWindow>,
}

fn window(start: DateTime<Utc>, end: DateTime<Utc>, priority: i32) -> AvailabilityWindow {
    AvailabilityWindow { start, end, priority }
}

impl Timeline {
    pub fn new() -> Self {
        Self { segments: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Adds `[start, end)`. Where the span is already available the higher
    /// priority is kept.
    pub fn union(&mut self, start: DateTime<Utc>, end: DateTime<Utc>, priority: i32) {
        if start >= end {
            return;
        }

        let mut out = Vec::with_capacity(self.segments.len() + 2);
        let mut cursor = start;

        for seg in self.segments.drain(..) {
            if seg.end <= start || seg.start >= end {
                out.push(seg);
                continue;
            }

            if seg.start < start {
                out.push(window(seg.start, start, seg.priority));
            }
            if seg.start > cursor {
                out.push(window(cursor, seg.start, priority));
            }

            let overlap_end = min(seg.end, end);
            out.push(window(max(seg.start, start), overlap_end, max(seg.priority, priority)));

            if seg.end > end {
                out.push(window(end, seg.end, seg.priority));
            }
            cursor = max(cursor, overlap_end);
        }

        if cursor < end {
            out.push(window(cursor, end, priority));
        }

        out.sort_by_key(|w| w.start);
        self.segments = out;
    }

    /// Replaces whatever covers `[start, end)` with a single span of `priority`.
    pub fn overlay(&mut self, start: DateTime<Utc>, end: DateTime<Utc>, priority: i32) {
        if start >= end {
            return;
        }
        self.remove(start, end);
        let idx = self.segments.partition_point(|w| w.start < start);
        self.segments.insert(idx, window(start, end, priority));
    }

    pub fn remove(&mut self, start: DateTime<Utc>, end: DateTime<Utc>) {
        if start >= end {
            return;
        }

        let mut out = Vec::with_capacity(self.segments.len() + 1);
        for seg in self.segments.drain(..) {
            if seg.end <= start || seg.start >= end {
                out.push(seg);
                continue;
            }
            if seg.start < start {
                out.push(window(seg.start, start, seg.priority));
            }
            if seg.end > end {
                out.push(window(end, seg.end, seg.priority));
            }
        }
        self.segments = out;
    }

    /// Drops everything outside `[start, end)`.
    pub fn clip(&mut self, start: DateTime<Utc>, end: DateTime<Utc>) {
        self.segments.retain_mut(|seg| {
            seg.start = max(seg.start, start);
            seg.end = min(seg.end, end);
            seg.start < seg.end
        });
    }

    pub fn into_windows(self) -> Vec<AvailabilityWindow> {
        coalesce(self.segments)
    }
}

/// Merges overlapping or touching windows into maximal disjoint windows
/// sorted by start. A merged window keeps the highest priority it absorbed.
pub fn coalesce(mut windows: Vec<AvailabilityWindow>) -> Vec<AvailabilityWindow> {
    windows.retain(|w| w.start < w.end);
    windows.sort_by_key(|w| (w.start, w.end));

    let mut merged: Vec<AvailabilityWindow> = Vec::with_capacity(windows.len());
    for w in windows {
        match merged.last_mut() {
            Some(last) if w.start <= last.end => {
                last.end = max(last.end, w.end);
                last.priority = max(last.priority, w.priority);
            }
            _ => merged.push(w),
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 6, h, 0, 0).unwrap()
    }

    #[test]
    fn union_keeps_higher_priority_on_overlap() {
        let mut t = Timeline::new();
        t.union(at(8), at(12), 3);
        t.union(at(10), at(14), 7);

        assert_eq!(
            t.segments,
            vec![window(at(8), at(10), 3), window(at(10), at(12), 7), window(at(12), at(14), 7)]
        );
        assert_eq!(t.into_windows(), vec![window(at(8), at(14), 7)]);
    }

    #[test]
    fn union_fills_gaps_between_segments() {
        let mut t = Timeline::new();
        t.union(at(8), at(9), 5);
        t.union(at(11), at(12), 5);
        t.union(at(7), at(13), 2);

        let windows = t.into_windows();
        assert_eq!(windows, vec![window(at(7), at(13), 5)]);
    }

    #[test]
    fn remove_splits_segment() {
        let mut t = Timeline::new();
        t.union(at(8), at(18), 5);
        t.remove(at(12), at(13));

        assert_eq!(t.into_windows(), vec![window(at(8), at(12), 5), window(at(13), at(18), 5)]);
    }

    #[test]
    fn overlay_replaces_priority() {
        let mut t = Timeline::new();
        t.union(at(8), at(18), 9);
        t.overlay(at(10), at(11), 1);

        assert_eq!(
            t.segments,
            vec![window(at(8), at(10), 9), window(at(10), at(11), 1), window(at(11), at(18), 9)]
        );
    }

    #[test]
    fn empty_spans_are_ignored() {
        let mut t = Timeline::new();
        t.union(at(10), at(10), 5);
        t.overlay(at(12), at(11), 5);
        assert!(t.is_empty());
    }

    #[test]
    fn clip_trims_and_drops() {
        let mut t = Timeline::new();
        t.union(at(1), at(3), 5);
        t.union(at(6), at(10), 5);
        t.clip(at(4), at(8));

        assert_eq!(t.into_windows(), vec![window(at(6), at(8), 5)]);
    }

    #[test]
    fn coalesce_merges_touching_windows() {
        let merged = coalesce(vec![
            window(at(12), at(14), 2),
            window(at(8), at(10), 4),
            window(at(10), at(12), 6),
            window(at(16), at(16), 9),
        ]);

        assert_eq!(merged, vec![window(at(8), at(14), 6)]);
    }
}
