//! SM-2 spaced-repetition scheduling with a mastery-scaled interval boost.
//!
//! Vanilla SM-2 grows the interval by the ease factor alone. Here the growth is
//! additionally multiplied by `1 + p_know * 0.3`, so well-understood concepts are
//! pushed further out. Retention between reviews is modeled as exponential decay
//! with a stability derived from the interval and ease.

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::config::SchedulerConfig;
use crate::learning::graph::compare_concept_ids;
use crate::learning::types::{KnowledgeNode, Quality, ReviewEntry, DEFAULT_EASE, MIN_EASE};
use crate::store::NodeMap;

const MS_PER_DAY: f64 = 86_400_000.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scheduler {
    pub min_ease: f64,
    pub max_interval_days: f64,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self {
            min_ease: MIN_EASE,
            max_interval_days: 365.0,
        }
    }
}

impl Scheduler {
    pub fn from_config(config: &SchedulerConfig) -> Self {
        Self {
            min_ease: config.min_ease.max(MIN_EASE),
            max_interval_days: config.max_interval_days,
        }
    }

    /// Apply one review of `quality` to `node` at time `now`.
    ///
    /// The review-history entry snapshots `p_know` and `interval_days` before the
    /// interval update. A quality below 3 is a lapse.
    pub fn schedule(&self, node: &mut KnowledgeNode, quality: Quality, now: DateTime<Utc>) {
        node.review_history.push(ReviewEntry {
            timestamp: now,
            quality: quality.get(),
            p_know: node.p_know,
            interval_days: node.interval_days,
        });

        if quality.is_correct() {
            node.interval_days = match node.repetitions {
                0 => 1.0,
                1 => 6.0,
                _ => {
                    let mastery_boost = 1.0 + node.p_know * 0.3;
                    (node.interval_days * node.ease_factor * mastery_boost)
                        .min(self.max_interval_days)
                }
            };
            node.repetitions += 1;
            let miss = f64::from(Quality::MAX - quality.get());
            node.ease_factor =
                (node.ease_factor + 0.1 - miss * (0.08 + miss * 0.02)).max(self.min_ease);
        } else {
            node.lapses += 1;
            node.repetitions = 0;
            node.interval_days = 1.0;
            node.ease_factor = (node.ease_factor - 0.2).max(self.min_ease);
        }

        node.mastery = (node.mastery + (f64::from(quality.get()) - 2.5) * 0.1).clamp(0.0, 1.0);
        node.last_review = Some(now);
        node.next_review = Some(now + interval_duration(node.interval_days));

        debug!(
            concept_id = %node.concept_id,
            quality = quality.get(),
            interval_days = node.interval_days,
            ease_factor = node.ease_factor,
            repetitions = node.repetitions,
            "review scheduled"
        );
    }

    /// Concept ids due for review at `now`, most overdue first.
    ///
    /// A node is due if it has no successful repetitions yet, or its `next_review`
    /// has passed. Nodes without repetitions count as zero days overdue, so they sort
    /// behind anything actually overdue. Ties are ordered by numeric concept id.
    pub fn get_due(&self, nodes: &NodeMap, now: DateTime<Utc>) -> Vec<String> {
        self.due_with_overdue(nodes, now)
            .into_iter()
            .map(|(id, _)| id)
            .collect()
    }

    /// Same as [`get_due`](Self::get_due) but keeps the whole days overdue.
    pub fn due_with_overdue(&self, nodes: &NodeMap, now: DateTime<Utc>) -> Vec<(String, i64)> {
        let mut due: Vec<(String, i64)> = nodes
            .iter()
            .filter_map(|(id, node)| {
                if node.repetitions == 0 {
                    return Some((id.clone(), 0));
                }
                let next = node.next_review?;
                (now >= next).then(|| (id.clone(), (now - next).num_days()))
            })
            .collect();

        due.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| compare_concept_ids(&a.0, &b.0)));
        due
    }

    /// Estimated probability the concept is still recalled at `now`.
    ///
    /// `exp(-days_since / stability)` where `stability = interval * ease / 2.5`.
    /// Exactly 1.0 before the first review, 0.0 when stability is not positive.
    pub fn calculate_retention(&self, node: &KnowledgeNode, now: DateTime<Utc>) -> f64 {
        let Some(last) = node.last_review else {
            return 1.0;
        };
        let days_since = (now - last).num_days().max(0) as f64;
        let stability = node.interval_days * (node.ease_factor / DEFAULT_EASE);
        if stability <= 0.0 || !stability.is_finite() {
            return 0.0;
        }
        (-days_since / stability).exp().clamp(0.0, 1.0)
    }
}

fn interval_duration(interval_days: f64) -> Duration {
    Duration::milliseconds((interval_days * MS_PER_DAY).round() as i64)
}
