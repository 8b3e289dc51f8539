//! Density-based cluster expansion
//!
//! Records are labeled in place. The outer scan visits records in input order;
//! each unmarked record with a large enough neighborhood seeds a new cluster,
//! which is then grown by draining an explicit LIFO frontier of record indices.
//!
//! Cluster numbering depends on input order. Grouping does not.

use log::{debug, info};

use crate::config::ClusterConfig;
use crate::neighbors::find_neighbors;
use crate::types::{ClusterLabel, EventRecord};

/// Counters describing one expansion run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExpansionStats {
    /// Cluster ids handed out. A later seed can take over every member of an
    /// earlier cluster, so fewer distinct labels may survive.
    pub clusters: u32,
    /// Records left labeled as noise
    pub noise: usize,
    /// Neighborhood queries that met `min_neighbors`. A record that is seeded
    /// and later drained again counts once per query.
    pub core_points: usize,
    /// Neighborhood queries issued
    pub neighbor_queries: usize,
}

/// Assigns cluster labels to a record arena
#[derive(Debug, Clone)]
pub struct ClusterExpander {
    eps_spatial_m: f64,
    eps_temporal_s: f64,
    min_neighbors: usize,
}

impl ClusterExpander {
    pub fn new(eps_spatial_m: f64, eps_temporal_s: f64, min_neighbors: usize) -> Self {
        Self {
            eps_spatial_m,
            eps_temporal_s,
            min_neighbors,
        }
    }

    pub fn from_config(config: &ClusterConfig) -> Self {
        Self::new(
            config.eps_spatial_m,
            config.eps_temporal_s,
            config.min_neighbors,
        )
    }

    /// Label every record as noise or a cluster id.
    ///
    /// Existing labels are discarded first. On return no record is unmarked.
    pub fn expand(&self, records: &mut [EventRecord]) -> ExpansionStats {
        for record in records.iter_mut() {
            record.cluster = ClusterLabel::Unmarked;
        }

        let mut stats = ExpansionStats::default();
        let mut cluster_id: u32 = 0;
        let mut frontier: Vec<usize> = Vec::new();

        for index in 0..records.len() {
            if !records[index].cluster.is_unmarked() {
                continue;
            }

            let neighborhood = self.neighbors_of(index, records, &mut stats);
            if neighborhood.len() < self.min_neighbors {
                records[index].cluster = ClusterLabel::Noise;
                continue;
            }

            stats.core_points += 1;
            cluster_id += 1;
            let label = ClusterLabel::Cluster(cluster_id);
            records[index].cluster = label;

            // Seed neighbors join unconditionally
            for &neighbor in &neighborhood {
                records[neighbor].cluster = label;
                frontier.push(neighbor);
            }

            while let Some(current) = frontier.pop() {
                let next = self.neighbors_of(current, records, &mut stats);
                if next.len() < self.min_neighbors {
                    // border point, already labeled
                    continue;
                }

                stats.core_points += 1;
                for neighbor in next {
                    if records[neighbor].cluster.is_absorbable() {
                        records[neighbor].cluster = label;
                        frontier.push(neighbor);
                    }
                }
            }

            debug!(
                "cluster {} seeded by record {} ({}) with {} direct neighbors",
                cluster_id,
                index,
                records[index].id,
                neighborhood.len()
            );
        }

        stats.clusters = cluster_id;
        stats.noise = records.iter().filter(|r| r.cluster.is_noise()).count();

        info!(
            "expanded {} records with {} cluster ids ({} noise, {} neighbor queries)",
            records.len(),
            stats.clusters,
            stats.noise,
            stats.neighbor_queries
        );

        stats
    }

    fn neighbors_of(
        &self,
        index: usize,
        records: &[EventRecord],
        stats: &mut ExpansionStats,
    ) -> Vec<usize> {
        stats.neighbor_queries += 1;
        find_neighbors(index, records, self.eps_spatial_m, self.eps_temporal_s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::ClusterAggregator;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn at(offset_s: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap() + Duration::seconds(offset_s)
    }

    fn labels(records: &[EventRecord]) -> Vec<ClusterLabel> {
        records.iter().map(|r| r.cluster).collect()
    }

    #[test]
    fn test_empty_input() {
        let mut records: Vec<EventRecord> = Vec::new();
        let stats = ClusterExpander::new(100.0, 1.0, 0).expand(&mut records);
        assert_eq!(stats.clusters, 0);
        assert_eq!(stats.neighbor_queries, 0);
    }

    #[test]
    fn test_two_groups_with_zero_min_neighbors() {
        let mut records = vec![
            EventRecord::instant("a", 0.0, 0.0, at(0)),
            EventRecord::instant("b", 0.0001, 0.0001, at(0)),
            EventRecord::instant("c", 10.0, 10.0, at(3600)),
        ];
        let stats = ClusterExpander::new(100.0, 1.0, 0).expand(&mut records);

        assert_eq!(
            labels(&records),
            vec![
                ClusterLabel::Cluster(1),
                ClusterLabel::Cluster(1),
                ClusterLabel::Cluster(2),
            ]
        );
        assert_eq!(stats.clusters, 2);
        assert_eq!(stats.noise, 0);
    }

    #[test]
    fn test_sparse_record_becomes_noise() {
        let mut records = vec![
            EventRecord::instant("lonely", 5.0, 5.0, at(0)),
            EventRecord::instant("a", 0.0, 0.0, at(0)),
            EventRecord::instant("b", 0.0001, 0.0, at(0)),
            EventRecord::instant("c", 0.0, 0.0001, at(0)),
        ];
        let stats = ClusterExpander::new(100.0, 1.0, 2).expand(&mut records);

        assert_eq!(records[0].cluster, ClusterLabel::Noise);
        assert_eq!(records[1].cluster, ClusterLabel::Cluster(1));
        assert_eq!(records[2].cluster, ClusterLabel::Cluster(1));
        assert_eq!(records[3].cluster, ClusterLabel::Cluster(1));
        assert_eq!(stats.noise, 1);
        assert_eq!(stats.clusters, 1);
    }

    #[test]
    fn test_noise_is_absorbed_as_border_point() {
        // "edge" is visited first and has only one neighbor ("core"), so it
        // starts as noise. "core" has two neighbors and pulls it back in.
        let mut records = vec![
            EventRecord::instant("edge", 0.0, 0.0008, at(0)),
            EventRecord::instant("core", 0.0, 0.0, at(0)),
            EventRecord::instant("other", 0.0, -0.0008, at(0)),
        ];
        ClusterExpander::new(100.0, 0.0, 2).expand(&mut records);

        assert_eq!(records[0].cluster, ClusterLabel::Cluster(1));
        assert_eq!(records[1].cluster, ClusterLabel::Cluster(1));
        assert_eq!(records[2].cluster, ClusterLabel::Cluster(1));
    }

    #[test]
    fn test_chained_reachability() {
        // Consecutive points are ~89 m apart; the ends are ~356 m apart
        let mut records: Vec<EventRecord> = (0..5)
            .map(|i| EventRecord::instant(format!("p{}", i), 0.0, i as f64 * 0.0008, at(0)))
            .collect();
        ClusterExpander::new(100.0, 0.0, 0).expand(&mut records);

        assert!(records
            .iter()
            .all(|r| r.cluster == ClusterLabel::Cluster(1)));
    }

    #[test]
    fn test_core_and_border_points() {
        // p0 has one neighbor and starts as noise. p1 is core and absorbs p0
        // and p2; p2 is core too and pulls p3 in. p3 stays a border point.
        let mut records: Vec<EventRecord> = (0..4)
            .map(|i| EventRecord::instant(format!("p{}", i), 0.0, i as f64 * 0.0008, at(0)))
            .collect();
        let stats = ClusterExpander::new(100.0, 0.0, 2).expand(&mut records);
        assert_eq!(stats.core_points, 2);

        assert!(records
            .iter()
            .all(|r| r.cluster == ClusterLabel::Cluster(1)));

        // With min_neighbors = 3 nobody is core
        ClusterExpander::new(100.0, 0.0, 3).expand(&mut records);
        assert!(records.iter().all(|r| r.cluster == ClusterLabel::Noise));
    }

    #[test]
    fn test_later_seed_takes_over_earlier_cluster() {
        // "wide" spans 200 s, so its padded window admits "a" and "b", while
        // their 1 s windows miss both of its endpoints. "a" seeds cluster 1
        // with "b"; "wide" then seeds cluster 2 and relabels both.
        let start = at(0);
        let mut records = vec![
            EventRecord::instant("a", 0.0, 0.0, start),
            EventRecord::instant("b", 0.0001, 0.0, start),
            EventRecord::new("wide", 0.0002, 0.0, at(-100), at(100)),
        ];
        let stats = ClusterExpander::new(100.0, 1.0, 0).expand(&mut records);

        assert_eq!(labels(&records), vec![ClusterLabel::Cluster(2); 3]);
        assert_eq!(stats.clusters, 2);
        assert_eq!(stats.core_points, 5);

        let summaries = ClusterAggregator::aggregate(&records);
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].cluster, ClusterLabel::Cluster(2));
        assert_eq!(summaries[0].ids, vec!["a", "b", "wide"]);
    }

    #[test]
    fn test_relabels_previous_run() {
        let mut records = vec![EventRecord::instant("a", 0.0, 0.0, at(0))];
        records[0].cluster = ClusterLabel::Cluster(42);
        ClusterExpander::new(100.0, 1.0, 0).expand(&mut records);
        assert_eq!(records[0].cluster, ClusterLabel::Cluster(1));
    }

    #[test]
    fn test_no_unmarked_after_expansion() {
        let mut records: Vec<EventRecord> = (0..20)
            .map(|i| {
                EventRecord::instant(
                    format!("r{}", i),
                    (i % 4) as f64 * 0.01,
                    (i % 3) as f64 * 0.0005,
                    at((i % 5) * 30),
                )
            })
            .collect();

        for min_neighbors in 0..4 {
            ClusterExpander::new(120.0, 45.0, min_neighbors).expand(&mut records);
            assert!(records.iter().all(|r| !r.cluster.is_unmarked()));
        }
    }
}
