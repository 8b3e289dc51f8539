//! Neighbor queries
//!
//! A record is a neighbor of a center record when it is both temporally and
//! spatially proximate to it. The temporal test is deliberately loose: a
//! candidate passes when either of its interval endpoints falls inside the
//! center's padded window. It is not a full interval-intersection test, so a
//! long candidate interval that strictly contains the window does not pass.

use chrono::{DateTime, Duration, Utc};

use crate::geo::great_circle_distance;
use crate::types::EventRecord;

/// Convert a temporal epsilon in (possibly fractional) seconds to a duration.
///
/// Resolution is one microsecond.
pub fn seconds_to_duration(seconds: f64) -> Duration {
    Duration::microseconds((seconds * 1_000_000.0).round() as i64)
}

/// Inclusive time window around a center record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemporalWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TemporalWindow {
    /// `[center.initial_time - eps, center.end_time + eps]`
    pub fn around(center: &EventRecord, eps_temporal_s: f64) -> Self {
        let pad = seconds_to_duration(eps_temporal_s);
        Self {
            start: center
                .initial_time
                .checked_sub_signed(pad)
                .unwrap_or(DateTime::<Utc>::MIN_UTC),
            end: center
                .end_time
                .checked_add_signed(pad)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        }
    }

    pub fn contains(&self, t: &DateTime<Utc>) -> bool {
        *t >= self.start && *t <= self.end
    }

    /// True if either endpoint of the candidate interval lies in the window
    pub fn admits(&self, candidate: &EventRecord) -> bool {
        self.contains(&candidate.initial_time) || self.contains(&candidate.end_time)
    }
}

/// Indices of the records that neighbor `records[center_index]`.
///
/// A neighbor passes the loose temporal test of [`TemporalWindow::admits`] and
/// lies within `eps_spatial_m` meters (inclusive) of the center. The center
/// itself is never returned. Indices come back in input order.
///
/// # Panics
/// Panics if `center_index` is out of bounds.
pub fn find_neighbors(
    center_index: usize,
    records: &[EventRecord],
    eps_spatial_m: f64,
    eps_temporal_s: f64,
) -> Vec<usize> {
    let center = &records[center_index];
    let window = TemporalWindow::around(center, eps_temporal_s);
    let origin = center.coordinates();

    records
        .iter()
        .enumerate()
        .filter(|(_, candidate)| window.admits(candidate))
        .filter(|(index, _)| *index != center_index)
        .filter(|(_, candidate)| {
            great_circle_distance(&origin, &candidate.coordinates()) <= eps_spatial_m
        })
        .map(|(index, _)| index)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    fn at(offset_s: i64) -> DateTime<Utc> {
        t0() + Duration::seconds(offset_s)
    }

    #[test]
    fn test_window_bounds() {
        let center = EventRecord::new("c", 0.0, 0.0, at(0), at(60));
        let window = TemporalWindow::around(&center, 30.0);
        assert_eq!(window.start, at(-30));
        assert_eq!(window.end, at(90));
    }

    #[test]
    fn test_fractional_epsilon() {
        assert_eq!(seconds_to_duration(1.5), Duration::milliseconds(1500));
        assert_eq!(seconds_to_duration(0.0), Duration::zero());
    }

    #[test]
    fn test_window_is_inclusive() {
        let center = EventRecord::instant("c", 0.0, 0.0, at(0));
        let window = TemporalWindow::around(&center, 10.0);
        assert!(window.admits(&EventRecord::instant("edge", 0.0, 0.0, at(10))));
        assert!(window.admits(&EventRecord::instant("edge", 0.0, 0.0, at(-10))));
        assert!(!window.admits(&EventRecord::instant("out", 0.0, 0.0, at(11))));
    }

    #[test]
    fn test_either_endpoint_admits() {
        let center = EventRecord::instant("c", 0.0, 0.0, at(0));
        let window = TemporalWindow::around(&center, 10.0);

        // Starts before the window, ends inside it
        assert!(window.admits(&EventRecord::new("a", 0.0, 0.0, at(-100), at(5))));
        // Starts inside the window, ends after it
        assert!(window.admits(&EventRecord::new("b", 0.0, 0.0, at(5), at(100))));
    }

    #[test]
    fn test_spanning_interval_is_not_admitted() {
        // Overlaps the window but neither endpoint lies inside it
        let center = EventRecord::instant("c", 0.0, 0.0, at(0));
        let window = TemporalWindow::around(&center, 10.0);
        assert!(!window.admits(&EventRecord::new("long", 0.0, 0.0, at(-100), at(100))));
    }

    #[test]
    fn test_excludes_center() {
        let records = vec![
            EventRecord::instant("a", 0.0, 0.0, at(0)),
            EventRecord::instant("b", 0.0, 0.0, at(0)),
        ];
        assert_eq!(find_neighbors(0, &records, 100.0, 1.0), vec![1]);
        assert_eq!(find_neighbors(1, &records, 100.0, 1.0), vec![0]);
    }

    #[test]
    fn test_zero_epsilon_identical_timestamps() {
        let records = vec![
            EventRecord::instant("a", 0.0, 0.0, at(0)),
            EventRecord::instant("b", 0.001, 0.0, at(0)),
        ];
        assert!(find_neighbors(0, &records, 0.0, 0.0).is_empty());
    }

    #[test]
    fn test_colocated_records_with_zero_epsilon() {
        let records = vec![
            EventRecord::instant("a", 1.0, 1.0, at(0)),
            EventRecord::instant("b", 1.0, 1.0, at(0)),
        ];
        assert_eq!(find_neighbors(0, &records, 0.0, 0.0), vec![1]);
    }

    #[test]
    fn test_filters_by_distance_and_time() {
        let records = vec![
            EventRecord::instant("center", 0.0, 0.0, at(0)),
            EventRecord::instant("near_far_time", 0.0, 0.0, at(3600)),
            EventRecord::instant("far_same_time", 1.0, 1.0, at(0)),
            EventRecord::instant("near", 0.0001, 0.0001, at(1)),
            EventRecord::instant("near_too", 0.0, 0.0005, at(-1)),
        ];
        assert_eq!(find_neighbors(0, &records, 100.0, 1.0), vec![3, 4]);
    }
}
