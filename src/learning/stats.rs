use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::learning::scheduler::Scheduler;
use crate::store::NodeMap;

/// Aggregate view of a knowledge graph.
#[derive(Debug, Serialize)]
pub struct GraphStats {
    pub total_concepts: usize,
    pub reviewed: usize,
    pub never_reviewed: usize,
    pub due_now: usize,
    pub mean_p_know: f64,
    pub mean_retention: f64,
    pub total_lapses: u64,
    pub total_reviews: usize,
    /// Bloom level (1-6) to concept count.
    pub by_bloom_level: BTreeMap<u8, usize>,
    pub store_size_bytes: u64,
}

/// Compute graph statistics at `now`.
///
/// `store_path` is only used for the on-disk size; pass `None` when there is no file.
pub fn graph_stats(
    nodes: &NodeMap,
    scheduler: &Scheduler,
    now: DateTime<Utc>,
    store_path: Option<&Path>,
) -> GraphStats {
    let total = nodes.len();
    let reviewed = nodes.values().filter(|n| !n.is_new()).count();

    let mut by_bloom_level = BTreeMap::new();
    for node in nodes.values() {
        *by_bloom_level.entry(node.bloom_level).or_insert(0) += 1;
    }

    let (sum_p, sum_retention) = nodes.values().fold((0.0, 0.0), |(p, r), node| {
        (p + node.p_know, r + scheduler.calculate_retention(node, now))
    });
    let mean = |sum: f64| if total == 0 { 0.0 } else { sum / total as f64 };

    let store_size_bytes = store_path
        .and_then(|p| std::fs::metadata(p).ok())
        .map(|m| m.len())
        .unwrap_or(0);

    GraphStats {
        total_concepts: total,
        reviewed,
        never_reviewed: total - reviewed,
        due_now: scheduler.get_due(nodes, now).len(),
        mean_p_know: mean(sum_p),
        mean_retention: mean(sum_retention),
        total_lapses: nodes.values().map(|n| u64::from(n.lapses)).sum(),
        total_reviews: nodes.values().map(|n| n.review_history.len()).sum(),
        by_bloom_level,
        store_size_bytes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::learning::types::{KnowledgeNode, Quality};

    #[test]
    fn empty_graph_has_zero_means() {
        let stats = graph_stats(&NodeMap::new(), &Scheduler::default(), Utc::now(), None);
        assert_eq!(stats.total_concepts, 0);
        assert_eq!(stats.mean_p_know, 0.0);
        assert_eq!(stats.store_size_bytes, 0);
    }

    #[test]
    fn counts_reviews_and_levels() {
        let srs = Scheduler::default();
        let now = Utc::now();
        let mut nodes = NodeMap::new();
        let mut a = KnowledgeNode::new("c000", "A", "");
        srs.schedule(&mut a, Quality::new(1).unwrap(), now);
        let mut b = KnowledgeNode::new("c001", "B", "");
        b.bloom_level = 3;
        nodes.insert(a.concept_id.clone(), a);
        nodes.insert(b.concept_id.clone(), b);

        let stats = graph_stats(&nodes, &srs, now, None);
        assert_eq!(stats.reviewed, 1);
        assert_eq!(stats.never_reviewed, 1);
        assert_eq!(stats.total_lapses, 1);
        assert_eq!(stats.total_reviews, 1);
        assert_eq!(stats.by_bloom_level.get(&1), Some(&1));
        assert_eq!(stats.by_bloom_level.get(&3), Some(&1));
        // both have zero repetitions, so both are due
        assert_eq!(stats.due_now, 2);
    }
}
