//! Core learning-state type definitions.
//!
//! Defines [`KnowledgeNode`] (the per-concept learning record), [`ReviewEntry`]
//! (one line of a node's review log), [`Quality`] (validated recall rating) and
//! [`BloomLevel`] (the six cognitive-demand tiers).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Initial probability of mastery for a freshly built node.
pub const DEFAULT_P_KNOW: f64 = 0.1;
/// Starting ease factor for the scheduler.
pub const DEFAULT_EASE: f64 = 2.5;
/// Ease factor can never fall below this.
pub const MIN_EASE: f64 = 1.3;
/// Lower/upper clamp for `p_know`.
pub const P_KNOW_FLOOR: f64 = 0.01;
pub const P_KNOW_CEIL: f64 = 0.99;

/// Learning state for one atomic concept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeNode {
    /// Stable id of the form `cNNN`, assigned at build time and never reused.
    pub concept_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Concepts that should be known before this one is scheduled.
    #[serde(default)]
    pub prerequisites: Vec<String>,
    /// Coarse progress signal in `[0.0, 1.0]`, nudged by every review.
    #[serde(default)]
    pub mastery: f64,
    /// Target Bloom tier, 1 (Remember) through 6 (Create).
    #[serde(default = "default_bloom_level")]
    pub bloom_level: u8,
    #[serde(default = "default_ease")]
    pub ease_factor: f64,
    #[serde(default = "default_interval")]
    pub interval_days: f64,
    /// Consecutive successful reviews since the last lapse.
    #[serde(default)]
    pub repetitions: u32,
    /// Lifetime failed reviews.
    #[serde(default)]
    pub lapses: u32,
    #[serde(default)]
    pub last_review: Option<DateTime<Utc>>,
    #[serde(default)]
    pub next_review: Option<DateTime<Utc>>,
    /// Bayesian posterior probability of mastery, kept within `[0.01, 0.99]`.
    #[serde(default = "default_p_know")]
    pub p_know: f64,
    #[serde(default)]
    pub study_count: u32,
    #[serde(default)]
    pub total_study_minutes: u32,
    /// Append-only. Never pruned.
    #[serde(default)]
    pub review_history: Vec<ReviewEntry>,
}

/// One review event, snapshotting state as it was when the review was scheduled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewEntry {
    pub timestamp: DateTime<Utc>,
    pub quality: u8,
    pub p_know: f64,
    pub interval_days: f64,
}

fn default_bloom_level() -> u8 {
    BloomLevel::Remember.level()
}

fn default_ease() -> f64 {
    DEFAULT_EASE
}

fn default_interval() -> f64 {
    1.0
}

fn default_p_know() -> f64 {
    DEFAULT_P_KNOW
}

impl KnowledgeNode {
    pub fn new(
        concept_id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            concept_id: concept_id.into(),
            name: name.into(),
            description: description.into(),
            prerequisites: Vec::new(),
            mastery: 0.0,
            bloom_level: default_bloom_level(),
            ease_factor: DEFAULT_EASE,
            interval_days: default_interval(),
            repetitions: 0,
            lapses: 0,
            last_review: None,
            next_review: None,
            p_know: DEFAULT_P_KNOW,
            study_count: 0,
            total_study_minutes: 0,
            review_history: Vec::new(),
        }
    }

    /// `true` until the first review has been recorded.
    pub fn is_new(&self) -> bool {
        self.last_review.is_none()
    }

    pub fn bloom(&self) -> BloomLevel {
        BloomLevel::from_level(self.bloom_level).unwrap_or(BloomLevel::Remember)
    }

    /// Pull every numeric field back inside its invariant range.
    ///
    /// Returns `true` if anything had to change. Used when loading records written
    /// by other tools or older versions.
    pub fn sanitize(&mut self) -> bool {
        let before = (
            self.p_know,
            self.mastery,
            self.ease_factor,
            self.bloom_level,
            self.interval_days,
            self.prerequisites.len(),
        );

        self.p_know = if self.p_know.is_finite() {
            self.p_know.clamp(P_KNOW_FLOOR, P_KNOW_CEIL)
        } else {
            DEFAULT_P_KNOW
        };
        self.mastery = if self.mastery.is_finite() {
            self.mastery.clamp(0.0, 1.0)
        } else {
            0.0
        };
        if !self.ease_factor.is_finite() || self.ease_factor < MIN_EASE {
            self.ease_factor = MIN_EASE;
        }
        self.bloom_level = self
            .bloom_level
            .clamp(BloomLevel::Remember.level(), BloomLevel::Create.level());
        if !self.interval_days.is_finite() || self.interval_days < 0.0 {
            self.interval_days = default_interval();
        }
        let own_id = self.concept_id.clone();
        self.prerequisites.retain(|p| *p != own_id);

        let after = (
            self.p_know,
            self.mastery,
            self.ease_factor,
            self.bloom_level,
            self.interval_days,
            self.prerequisites.len(),
        );
        before != after
    }
}

/// Recall quality on the 0-5 SM-2 scale. Construct with [`Quality::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Quality(u8);

impl Quality {
    pub const MAX: u8 = 5;
    /// Ratings at or above this count as a successful recall.
    pub const PASS: u8 = 3;

    pub fn new(value: u8) -> Result<Self, EngineError> {
        if value > Self::MAX {
            return Err(EngineError::validation(
                "quality",
                format!("must be between 0 and {}, got {value}", Self::MAX),
            ));
        }
        Ok(Self(value))
    }

    pub fn get(self) -> u8 {
        self.0
    }

    pub fn is_correct(self) -> bool {
        self.0 >= Self::PASS
    }
}

impl TryFrom<i64> for Quality {
    type Error = EngineError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        u8::try_from(value)
            .map_err(|_| {
                EngineError::validation("quality", format!("must be between 0 and 5, got {value}"))
            })
            .and_then(Self::new)
    }
}

/// Bloom's taxonomy tiers, lowest to highest cognitive demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BloomLevel {
    Remember = 1,
    Understand = 2,
    Apply = 3,
    Analyze = 4,
    Evaluate = 5,
    Create = 6,
}

impl BloomLevel {
    pub const ALL: [BloomLevel; 6] = [
        Self::Remember,
        Self::Understand,
        Self::Apply,
        Self::Analyze,
        Self::Evaluate,
        Self::Create,
    ];

    pub fn from_level(level: u8) -> Option<Self> {
        Self::ALL.get(usize::from(level).checked_sub(1)?).copied()
    }

    pub fn level(self) -> u8 {
        self as u8
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Remember => "Remember",
            Self::Understand => "Understand",
            Self::Apply => "Apply",
            Self::Analyze => "Analyze",
            Self::Evaluate => "Evaluate",
            Self::Create => "Create",
        }
    }

    /// Action verbs that questions at this tier should use.
    pub fn verbs(&self) -> &'static [&'static str] {
        match self {
            Self::Remember => &["define", "list", "recall", "identify", "name"],
            Self::Understand => &["explain", "describe", "summarize", "interpret", "classify"],
            Self::Apply => &["apply", "demonstrate", "solve", "use", "implement"],
            Self::Analyze => &["analyze", "compare", "contrast", "differentiate", "examine"],
            Self::Evaluate => &["evaluate", "judge", "critique", "justify", "assess"],
            Self::Create => &["create", "design", "construct", "develop", "formulate"],
        }
    }

    pub fn next(self) -> Option<Self> {
        Self::from_level(self.level() + 1)
    }
}

impl std::fmt::Display for BloomLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
