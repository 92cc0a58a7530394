//! Interleaved session sequencing.
//!
//! Concepts are scored on urgency (forgetting), difficulty match (closeness to the
//! learner's ability frontier) and prerequisite readiness, then sampled into a
//! session. A random fraction of picks switch to a different Bloom tier so the
//! session mixes cognitive demand instead of blocking it.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;

use crate::config::SequencerConfig;
use crate::learning::graph::compare_concept_ids;
use crate::learning::scheduler::Scheduler;
use crate::learning::types::KnowledgeNode;
use crate::store::NodeMap;

const URGENCY_WEIGHT: f64 = 0.4;
const DIFFICULTY_WEIGHT: f64 = 0.3;
const READINESS_BONUS: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sequencer {
    /// Probability of attempting a Bloom-tier switch on each pick.
    pub interleave_ratio: f64,
    /// A prerequisite counts as met once its `p_know` exceeds this.
    pub prereq_threshold: f64,
}

impl Default for Sequencer {
    fn default() -> Self {
        Self {
            interleave_ratio: 0.3,
            prereq_threshold: 0.6,
        }
    }
}

/// Ranking inputs and result for one concept.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredConcept {
    pub concept_id: String,
    pub score: f64,
    pub bloom_level: u8,
    pub retention: f64,
    pub prereqs_met: bool,
}

impl Sequencer {
    pub fn from_config(config: &SequencerConfig) -> Self {
        Self {
            interleave_ratio: config.interleave_ratio.clamp(0.0, 1.0),
            prereq_threshold: config.prereq_threshold,
        }
    }

    /// `true` when every prerequisite exists and exceeds the readiness threshold.
    pub fn prereqs_met(&self, node: &KnowledgeNode, nodes: &NodeMap) -> bool {
        node.prerequisites.iter().all(|p| {
            nodes
                .get(p)
                .is_some_and(|pre| pre.p_know > self.prereq_threshold)
        })
    }

    /// Score every node and sort best first. Ties are ordered by numeric concept id.
    pub fn rank(
        &self,
        nodes: &NodeMap,
        scheduler: &Scheduler,
        now: DateTime<Utc>,
    ) -> Vec<ScoredConcept> {
        let mut scored: Vec<ScoredConcept> = nodes
            .values()
            .map(|node| {
                let prereqs_met = self.prereqs_met(node, nodes);
                let retention = scheduler.calculate_retention(node, now);
                let urgency = 1.0 - retention;
                let difficulty_match = 1.0 - (node.p_know - 0.5).abs();
                let readiness = if prereqs_met { READINESS_BONUS } else { 0.0 };
                ScoredConcept {
                    concept_id: node.concept_id.clone(),
                    score: urgency * URGENCY_WEIGHT + difficulty_match * DIFFICULTY_WEIGHT + readiness,
                    bloom_level: node.bloom_level,
                    retention,
                    prereqs_met,
                }
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| compare_concept_ids(&a.concept_id, &b.concept_id))
        });
        scored
    }

    /// Build a session of at most `session_length` concept ids using the thread RNG.
    pub fn get_optimal_sequence(
        &self,
        nodes: &NodeMap,
        scheduler: &Scheduler,
        session_length: usize,
        now: DateTime<Utc>,
    ) -> Vec<String> {
        self.sequence_with_rng(nodes, scheduler, session_length, now, &mut rand::rng())
    }

    /// Same as [`get_optimal_sequence`](Self::get_optimal_sequence) with a caller RNG.
    pub fn sequence_with_rng<R: Rng + ?Sized>(
        &self,
        nodes: &NodeMap,
        scheduler: &Scheduler,
        session_length: usize,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Vec<String> {
        if nodes.is_empty() || session_length == 0 {
            return Vec::new();
        }

        let scored = self.rank(nodes, scheduler, now);
        let pool_size = session_length.saturating_mul(2).min(scored.len());

        let mut sequence: Vec<String> = Vec::with_capacity(pool_size);
        let mut last_bloom: Option<u8> = None;

        for candidate in &scored[..pool_size] {
            if sequence.len() >= session_length {
                break;
            }
            if sequence.contains(&candidate.concept_id) {
                continue;
            }

            let mut pick = candidate;
            if let Some(last) = last_bloom {
                if rng.random::<f64>() < self.interleave_ratio {
                    if let Some(switch) = scored
                        .iter()
                        .find(|s| s.bloom_level != last && !sequence.contains(&s.concept_id))
                    {
                        pick = switch;
                    }
                }
            }

            sequence.push(pick.concept_id.clone());
            last_bloom = Some(pick.bloom_level);
        }

        sequence
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 10, 18, 30, 0).unwrap()
    }

    fn node(id: &str, p_know: f64, bloom: u8) -> KnowledgeNode {
        let mut n = KnowledgeNode::new(id, format!("concept {id}"), "");
        n.p_know = p_know;
        n.bloom_level = bloom;
        n
    }

    fn graph(nodes: Vec<KnowledgeNode>) -> NodeMap {
        nodes
            .into_iter()
            .map(|n| (n.concept_id.clone(), n))
            .collect()
    }

    #[test]
    fn session_length_is_respected() {
        let nodes = graph((0..12).map(|i| node(&format!("c{i:03}"), 0.1, (i % 3 + 1) as u8)).collect());
        let seq = Sequencer::default();
        let srs = Scheduler::default();
        let mut rng = StdRng::seed_from_u64(7);
        for k in 1..=15 {
            let session = seq.sequence_with_rng(&nodes, &srs, k, now(), &mut rng);
            assert!(session.len() <= k);
            if 2 * k <= nodes.len() {
                assert_eq!(session.len(), k);
            }
        }
    }

    #[test]
    fn session_has_no_duplicates() {
        let nodes = graph((0..8).map(|i| node(&format!("c{i:03}"), 0.3, (i % 2 + 1) as u8)).collect());
        let seq = Sequencer {
            interleave_ratio: 1.0,
            ..Sequencer::default()
        };
        let mut rng = StdRng::seed_from_u64(42);
        let session = seq.sequence_with_rng(&nodes, &Scheduler::default(), 5, now(), &mut rng);
        let mut unique = session.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), session.len());
    }

    #[test]
    fn oversized_session_length_is_bounded_by_graph() {
        let nodes = graph((0..4).map(|i| node(&format!("c{i:03}"), 0.2, 1)).collect());
        let mut rng = StdRng::seed_from_u64(9);
        let session =
            Sequencer::default().sequence_with_rng(&nodes, &Scheduler::default(), usize::MAX, now(), &mut rng);
        assert_eq!(session.len(), 4);
    }

    #[test]
    fn rank_ties_follow_numeric_ids() {
        let nodes = graph(vec![node("c1000", 0.4, 1), node("c999", 0.4, 1)]);
        let ranked = Sequencer::default().rank(&nodes, &Scheduler::default(), now());
        let ids: Vec<&str> = ranked.iter().map(|s| s.concept_id.as_str()).collect();
        assert_eq!(ids, vec!["c999", "c1000"]);
    }

    #[test]
    fn empty_graph_yields_empty_session() {
        let seq = Sequencer::default();
        assert!(seq
            .get_optimal_sequence(&NodeMap::new(), &Scheduler::default(), 5, now())
            .is_empty());
    }

    #[test]
    fn unmet_prerequisites_lower_the_score() {
        let mut advanced = node("c001", 0.5, 2);
        advanced.prerequisites = vec!["c000".into()];
        let basic = node("c000", 0.2, 1);
        let nodes = graph(vec![basic, advanced]);

        let seq = Sequencer::default();
        let ranked = seq.rank(&nodes, &Scheduler::default(), now());
        let adv = ranked.iter().find(|s| s.concept_id == "c001").unwrap();
        assert!(!adv.prereqs_met);
        assert_eq!(ranked[0].concept_id, "c000");
    }

    #[test]
    fn missing_prerequisite_counts_as_unmet() {
        let mut orphan = node("c005", 0.5, 1);
        orphan.prerequisites = vec!["c999".into()];
        let nodes = graph(vec![orphan]);
        let seq = Sequencer::default();
        assert!(!seq.prereqs_met(&nodes["c005"], &nodes));
    }

    #[test]
    fn forgotten_concepts_outrank_fresh_ones() {
        let mut stale = node("c001", 0.5, 1);
        stale.interval_days = 1.0;
        stale.last_review = Some(now() - Duration::days(20));
        let fresh = node("c000", 0.5, 1);
        let nodes = graph(vec![fresh, stale]);

        let ranked = Sequencer::default().rank(&nodes, &Scheduler::default(), now());
        assert_eq!(ranked[0].concept_id, "c001");
        assert!(ranked[0].retention < 0.01);
    }

    #[test]
    fn no_interleaving_follows_score_order() {
        let nodes = graph(vec![
            node("c000", 0.5, 1),
            node("c001", 0.3, 2),
            node("c002", 0.1, 3),
        ]);
        let seq = Sequencer {
            interleave_ratio: 0.0,
            ..Sequencer::default()
        };
        let mut rng = StdRng::seed_from_u64(1);
        let session = seq.sequence_with_rng(&nodes, &Scheduler::default(), 3, now(), &mut rng);
        assert_eq!(session, vec!["c000", "c001", "c002"]);
    }

    #[test]
    fn full_interleaving_switches_bloom_tier() {
        // c000 and c001 share tier 1 and score highest; c002 is tier 4.
        let nodes = graph(vec![
            node("c000", 0.5, 1),
            node("c001", 0.5, 1),
            node("c002", 0.2, 4),
        ]);
        let seq = Sequencer {
            interleave_ratio: 1.0,
            ..Sequencer::default()
        };
        let mut rng = StdRng::seed_from_u64(3);
        let session = seq.sequence_with_rng(&nodes, &Scheduler::default(), 2, now(), &mut rng);
        assert_eq!(session, vec!["c000", "c002"]);
    }
}
