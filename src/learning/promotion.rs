//! Bloom-tier promotion.
//!
//! The only path that raises a node's `bloom_level`. It is never applied
//! automatically; callers invoke it after a study or test cycle.

use serde::Serialize;

use crate::learning::types::{BloomLevel, KnowledgeNode};

/// Default `p_know` a concept must exceed before it can move up a tier.
pub const PROMOTION_THRESHOLD: f64 = 0.7;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PromotionOutcome {
    pub concept_id: String,
    pub promoted: bool,
    pub bloom_level: u8,
    pub bloom_name: &'static str,
    pub message: String,
}

/// Raise `node` one Bloom tier if `p_know > threshold` and it is below Create.
pub fn promote(node: &mut KnowledgeNode, threshold: f64) -> PromotionOutcome {
    let current = node.bloom();
    let next = current.next().filter(|_| node.p_know > threshold);

    match next {
        Some(level) => {
            node.bloom_level = level.level();
            PromotionOutcome {
                concept_id: node.concept_id.clone(),
                promoted: true,
                bloom_level: level.level(),
                bloom_name: level.as_str(),
                message: format!("Promoted to Bloom level {}: {level}", level.level()),
            }
        }
        None => PromotionOutcome {
            concept_id: node.concept_id.clone(),
            promoted: false,
            bloom_level: current.level(),
            bloom_name: current.as_str(),
            message: ineligible_reason(node.p_know, current, threshold),
        },
    }
}

fn ineligible_reason(p_know: f64, current: BloomLevel, threshold: f64) -> String {
    if current == BloomLevel::Create {
        "Not eligible for promotion: already at the highest Bloom level".to_string()
    } else {
        format!(
            "Not eligible for promotion: mastery {:.0}% must exceed {:.0}%",
            p_know * 100.0,
            threshold * 100.0
        )
    }
}
