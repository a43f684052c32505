// libs/scheduling-cell/src/intervals.rs
//
// Half-open time interval arithmetic backing the slot resolver.
// Every interval is `[start, end)`: touching endpoints neither overlap
// nor conflict.

use chrono::{DateTime, Duration, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Interval {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    pub fn overlaps(&self, other: &Interval) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Intersection with `bounds`, or `None` when nothing remains.
    pub fn clamp(&self, bounds: &Interval) -> Option<Interval> {
        let clamped = Interval::new(self.start.max(bounds.start), self.end.min(bounds.end));
        (!clamped.is_empty()).then_some(clamped)
    }

    /// Remove `cut` from this interval. Yields zero, one, or two
    /// remaining pieces depending on where the cut lands.
    pub fn subtract(&self, cut: &Interval) -> Vec<Interval> {
        if !self.overlaps(cut) {
            return vec![*self];
        }

        let mut pieces = Vec::with_capacity(2);
        if cut.start > self.start {
            pieces.push(Interval::new(self.start, cut.start));
        }
        if cut.end < self.end {
            pieces.push(Interval::new(cut.end, self.end));
        }
        pieces
    }
}

/// Sort and coalesce overlapping or touching intervals into a disjoint,
/// chronologically ordered set.
pub fn merge(mut intervals: Vec<Interval>) -> Vec<Interval> {
    intervals.retain(|iv| !iv.is_empty());
    intervals.sort_by_key(|iv| iv.start);

    let mut merged: Vec<Interval> = Vec::with_capacity(intervals.len());
    for interval in intervals {
        match merged.last_mut() {
            Some(last) if interval.start <= last.end => {
                last.end = last.end.max(interval.end);
            }
            _ => merged.push(interval),
        }
    }
    merged
}

/// Subtract every cut from every candidate, preserving chronological
/// order and dropping anything reduced to zero length.
pub fn subtract_all(candidates: Vec<Interval>, cuts: &[Interval]) -> Vec<Interval> {
    let mut remaining = candidates;
    for cut in cuts {
        remaining = remaining
            .into_iter()
            .flat_map(|candidate| candidate.subtract(cut))
            .collect();
    }
    remaining.retain(|iv| !iv.is_empty());
    remaining
}

/// Slice open intervals into fixed-size steps. Steps that would run
/// past the end of their interval are discarded: no partial slots.
pub fn slice_slots(intervals: &[Interval], step_minutes: i64) -> Vec<Interval> {
    let step = Duration::minutes(step_minutes);
    let mut slots = Vec::new();

    for interval in intervals {
        let mut cursor = interval.start;
        while cursor + step <= interval.end {
            slots.push(Interval::new(cursor, cursor + step));
            cursor += step;
        }
    }
    slots
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 9, 7, hour, min, 0).unwrap()
    }

    fn iv(h1: u32, m1: u32, h2: u32, m2: u32) -> Interval {
        Interval::new(at(h1, m1), at(h2, m2))
    }

    #[test]
    fn subtract_middle_splits_in_two() {
        let pieces = iv(9, 0, 12, 0).subtract(&iv(10, 0, 10, 30));
        assert_eq!(pieces, vec![iv(9, 0, 10, 0), iv(10, 30, 12, 0)]);
    }

    #[test]
    fn subtract_leading_edge_leaves_tail() {
        let pieces = iv(9, 0, 12, 0).subtract(&iv(8, 0, 10, 0));
        assert_eq!(pieces, vec![iv(10, 0, 12, 0)]);
    }

    #[test]
    fn subtract_covering_cut_leaves_nothing() {
        assert!(iv(9, 0, 12, 0).subtract(&iv(8, 0, 13, 0)).is_empty());
    }

    #[test]
    fn subtract_touching_cut_is_noop() {
        let pieces = iv(9, 0, 12, 0).subtract(&iv(12, 0, 13, 0));
        assert_eq!(pieces, vec![iv(9, 0, 12, 0)]);
    }

    #[test]
    fn merge_coalesces_overlapping_and_touching() {
        let merged = merge(vec![iv(14, 0, 16, 0), iv(9, 0, 10, 0), iv(10, 0, 11, 0)]);
        assert_eq!(merged, vec![iv(9, 0, 11, 0), iv(14, 0, 16, 0)]);
    }

    #[test]
    fn slice_discards_partial_step() {
        let slots = slice_slots(&[iv(9, 0, 10, 10)], 30);
        assert_eq!(slots, vec![iv(9, 0, 9, 30), iv(9, 30, 10, 0)]);
    }

    #[test]
    fn subtract_all_handles_multiple_cuts() {
        let open = subtract_all(
            vec![iv(9, 0, 12, 0)],
            &[iv(9, 30, 10, 0), iv(11, 0, 11, 15)],
        );
        assert_eq!(
            open,
            vec![iv(9, 0, 9, 30), iv(10, 0, 11, 0), iv(11, 15, 12, 0)]
        );
    }
}
