//! Bayesian Knowledge Tracing.
//!
//! A two-state hidden Markov model per concept: the learner either knows it or
//! doesn't. Each observed answer updates the posterior, then the learning
//! transition gives a chance of moving from "unknown" to "known".

use crate::config::TracerConfig;
use crate::learning::types::{P_KNOW_CEIL, P_KNOW_FLOOR};

/// Fixed BKT model parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KnowledgeTracer {
    /// Prior for a new concept. Only used at node creation.
    pub p_init: f64,
    /// Chance of learning the concept per opportunity.
    pub p_learn: f64,
    /// Chance of a correct answer without knowing.
    pub p_guess: f64,
    /// Chance of a wrong answer despite knowing.
    pub p_slip: f64,
}

impl Default for KnowledgeTracer {
    fn default() -> Self {
        Self {
            p_init: 0.1,
            p_learn: 0.15,
            p_guess: 0.25,
            p_slip: 0.1,
        }
    }
}

impl KnowledgeTracer {
    pub fn from_config(config: &TracerConfig) -> Self {
        Self {
            p_init: config.p_init,
            p_learn: config.p_learn,
            p_guess: config.p_guess,
            p_slip: config.p_slip,
        }
    }

    /// Update `p_know` after one observed answer.
    ///
    /// Returns `(new_p_know, confidence)`. `new_p_know` is clamped to `[0.01, 0.99]`;
    /// `confidence` is 0 at 0.5 and approaches 1 at either extreme. Inputs outside
    /// `[0, 1]` are clamped first, non-finite input falls back to the prior.
    pub fn update(&self, p_know: f64, correct: bool) -> (f64, f64) {
        let p_know = if p_know.is_finite() {
            p_know.clamp(0.0, 1.0)
        } else {
            self.p_init
        };

        let (p_obs, p_joint) = if correct {
            (
                p_know * (1.0 - self.p_slip) + (1.0 - p_know) * self.p_guess,
                p_know * (1.0 - self.p_slip),
            )
        } else {
            (
                p_know * self.p_slip + (1.0 - p_know) * (1.0 - self.p_guess),
                p_know * self.p_slip,
            )
        };

        let p_post = if p_obs > 0.0 { p_joint / p_obs } else { p_know };
        let new_p_know = (p_post + (1.0 - p_post) * self.p_learn).clamp(P_KNOW_FLOOR, P_KNOW_CEIL);
        let confidence = (new_p_know - 0.5).abs() * 2.0;

        (new_p_know, confidence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-4;

    #[test]
    fn correct_answer_from_low_prior() {
        let bkt = KnowledgeTracer::default();
        let (p, confidence) = bkt.update(0.1, true);
        // p_obs = 0.315, p_post = 0.2857, plus learning transition
        assert!((p - 0.392857).abs() < EPS, "got {p}");
        assert!((confidence - (0.5 - p) * 2.0).abs() < EPS);
    }

    #[test]
    fn success_never_scores_below_failure() {
        let bkt = KnowledgeTracer::default();
        for i in 1..100 {
            let prior = f64::from(i) / 100.0;
            let (hit, _) = bkt.update(prior, true);
            let (miss, _) = bkt.update(prior, false);
            assert!(hit >= miss, "prior {prior}: {hit} < {miss}");
        }
    }

    #[test]
    fn extreme_inputs_stay_in_bounds() {
        let bkt = KnowledgeTracer::default();
        for prior in [0.0, 1.0, -3.0, 7.5, f64::NAN] {
            for correct in [true, false] {
                let (p, c) = bkt.update(prior, correct);
                assert!((P_KNOW_FLOOR..=P_KNOW_CEIL).contains(&p), "{prior} -> {p}");
                assert!((0.0..=1.0).contains(&c));
            }
        }
    }

    #[test]
    fn certain_knowledge_caps_at_ceiling() {
        let bkt = KnowledgeTracer::default();
        let (p, confidence) = bkt.update(1.0, false);
        assert_eq!(p, P_KNOW_CEIL);
        assert!((confidence - 0.98).abs() < EPS);
    }

    #[test]
    fn repeated_success_converges_upward() {
        let bkt = KnowledgeTracer::default();
        let mut p = bkt.p_init;
        for _ in 0..10 {
            let (next, _) = bkt.update(p, true);
            assert!(next >= p);
            p = next;
        }
        assert!(p > 0.95);
    }
}
