//! Cluster aggregation
//!
//! Folds labeled records into one summary per distinct label. Records are
//! visited through a stably sorted index, so the arena is never reordered and
//! member ids keep their input order within each summary.

use chrono::{DateTime, Utc};

use crate::types::{ClusterLabel, ClusterSummary, Coordinates, EventRecord};

/// Running totals for the label currently being folded
struct GroupAccumulator {
    label: ClusterLabel,
    ids: Vec<String>,
    initial_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    latitude_sum: f64,
    longitude_sum: f64,
}

impl GroupAccumulator {
    fn seed(record: &EventRecord) -> Self {
        Self {
            label: record.cluster,
            ids: vec![record.id.clone()],
            initial_time: record.initial_time,
            end_time: record.end_time,
            latitude_sum: record.latitude,
            longitude_sum: record.longitude,
        }
    }

    fn fold(&mut self, record: &EventRecord) {
        self.ids.push(record.id.clone());
        self.latitude_sum += record.latitude;
        self.longitude_sum += record.longitude;
        if record.initial_time < self.initial_time {
            self.initial_time = record.initial_time;
        }
        if record.end_time > self.end_time {
            self.end_time = record.end_time;
        }
    }

    fn finish(self) -> ClusterSummary {
        // Seeded with one record, so never zero
        let count = self.ids.len() as f64;
        ClusterSummary {
            cluster: self.label,
            total_time: self.end_time - self.initial_time,
            initial_time: self.initial_time,
            end_time: self.end_time,
            estimated_center: Coordinates::new(
                self.latitude_sum / count,
                self.longitude_sum / count,
            ),
            ids: self.ids,
        }
    }
}

/// Reduces labeled records to cluster summaries
pub struct ClusterAggregator;

impl ClusterAggregator {
    /// One summary per distinct label, ordered noise first then by cluster id.
    ///
    /// Empty input yields no summaries.
    pub fn aggregate(records: &[EventRecord]) -> Vec<ClusterSummary> {
        let mut order: Vec<usize> = (0..records.len()).collect();
        order.sort_by_key(|&index| records[index].cluster);

        let mut summaries = Vec::new();
        let mut current: Option<GroupAccumulator> = None;

        for index in order {
            let record = &records[index];
            if let Some(group) = current.as_mut().filter(|g| g.label == record.cluster) {
                group.fold(record);
                continue;
            }

            if let Some(done) = current.take() {
                summaries.push(done.finish());
            }
            current = Some(GroupAccumulator::seed(record));
        }

        if let Some(done) = current {
            summaries.push(done.finish());
        }

        summaries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use pretty_assertions::assert_eq;

    fn at(offset_s: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap() + Duration::seconds(offset_s)
    }

    fn labeled(
        id: &str,
        lat: f64,
        lng: f64,
        start: i64,
        end: i64,
        cluster: ClusterLabel,
    ) -> EventRecord {
        let mut record = EventRecord::new(id, lat, lng, at(start), at(end));
        record.cluster = cluster;
        record
    }

    #[test]
    fn test_empty_input() {
        assert!(ClusterAggregator::aggregate(&[]).is_empty());
    }

    #[test]
    fn test_single_record() {
        let records = vec![labeled("a", 1.0, 2.0, 0, 30, ClusterLabel::Cluster(1))];
        let summaries = ClusterAggregator::aggregate(&records);

        assert_eq!(summaries.len(), 1);
        assert_eq!(
            summaries[0],
            ClusterSummary {
                cluster: ClusterLabel::Cluster(1),
                ids: vec!["a".to_string()],
                initial_time: at(0),
                end_time: at(30),
                total_time: Duration::seconds(30),
                estimated_center: Coordinates::new(1.0, 2.0),
            }
        );
    }

    #[test]
    fn test_groups_sorted_by_label() {
        let records = vec![
            labeled("c2-a", 0.0, 0.0, 0, 10, ClusterLabel::Cluster(2)),
            labeled("c1-a", 1.0, 1.0, 0, 10, ClusterLabel::Cluster(1)),
            labeled("noise", 5.0, 5.0, 0, 10, ClusterLabel::Noise),
            labeled("c2-b", 2.0, 4.0, 0, 10, ClusterLabel::Cluster(2)),
            labeled("c1-b", 3.0, 3.0, 0, 10, ClusterLabel::Cluster(1)),
        ];
        let summaries = ClusterAggregator::aggregate(&records);

        let labels: Vec<ClusterLabel> = summaries.iter().map(|s| s.cluster).collect();
        assert_eq!(
            labels,
            vec![
                ClusterLabel::Noise,
                ClusterLabel::Cluster(1),
                ClusterLabel::Cluster(2),
            ]
        );
        assert_eq!(summaries[1].ids, vec!["c1-a", "c1-b"]);
        assert_eq!(summaries[2].ids, vec!["c2-a", "c2-b"]);
        assert_eq!(summaries[0].ids, vec!["noise"]);
    }

    #[test]
    fn test_time_span_and_centroid() {
        let records = vec![
            labeled("a", 10.0, 20.0, 100, 200, ClusterLabel::Cluster(1)),
            labeled("b", 12.0, 22.0, 50, 150, ClusterLabel::Cluster(1)),
            labeled("c", 14.0, 27.0, 120, 400, ClusterLabel::Cluster(1)),
        ];
        let summaries = ClusterAggregator::aggregate(&records);
        let summary = &summaries[0];

        assert_eq!(summary.initial_time, at(50));
        assert_eq!(summary.end_time, at(400));
        assert_eq!(summary.total_time, Duration::seconds(350));
        assert!((summary.estimated_center.latitude - 12.0).abs() < 1e-9);
        assert!((summary.estimated_center.longitude - 23.0).abs() < 1e-9);
    }

    #[test]
    fn test_inverted_interval_gives_negative_total_time() {
        let records = vec![labeled("bad", 0.0, 0.0, 100, 40, ClusterLabel::Cluster(1))];
        let summaries = ClusterAggregator::aggregate(&records);
        assert_eq!(summaries[0].total_time, Duration::seconds(-60));
    }

    #[test]
    fn test_does_not_reorder_arena() {
        let records = vec![
            labeled("b", 0.0, 0.0, 0, 0, ClusterLabel::Cluster(2)),
            labeled("a", 0.0, 0.0, 0, 0, ClusterLabel::Cluster(1)),
        ];
        let before = records.clone();
        ClusterAggregator::aggregate(&records);
        assert_eq!(records, before);
    }

    #[test]
    fn test_unmarked_records_form_last_group() {
        let records = vec![
            labeled("u", 0.0, 0.0, 0, 0, ClusterLabel::Unmarked),
            labeled("a", 0.0, 0.0, 0, 0, ClusterLabel::Cluster(1)),
        ];
        let summaries = ClusterAggregator::aggregate(&records);
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[1].cluster, ClusterLabel::Unmarked);
    }
}
