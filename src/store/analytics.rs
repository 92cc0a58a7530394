//! Append-only study-event log and the metacognitive summary built from it.
//!
//! The engine only appends here; nothing in the scheduling path reads it back.
//! [`summarize`] turns the log into the figures the insights report shows.

use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Datelike, Local, Timelike, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::StoreError;
use crate::learning::types::BloomLevel;

/// Number of trailing events shown in progression and recent-activity views.
const RECENT_WINDOW: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activity {
    Study,
    Feynman,
    Review,
    Bloom,
}

impl Activity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Study => "study",
            Self::Feynman => "feynman",
            Self::Review => "review",
            Self::Bloom => "bloom",
        }
    }
}

impl std::fmt::Display for Activity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One line of the analytics log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyEvent {
    pub timestamp: DateTime<Utc>,
    /// Local hour of day, 0-23.
    pub hour: u32,
    /// Local weekday, Monday = 0.
    pub weekday: u32,
    pub concept: String,
    pub activity: Activity,
    pub score: f64,
    pub bloom_level: u8,
    pub duration_minutes: u32,
}

impl StudyEvent {
    pub fn new(
        concept: impl Into<String>,
        activity: Activity,
        score: f64,
        bloom_level: u8,
        duration_minutes: u32,
        at: DateTime<Utc>,
    ) -> Self {
        let local = at.with_timezone(&Local);
        Self {
            timestamp: at,
            hour: local.hour(),
            weekday: local.weekday().num_days_from_monday(),
            concept: concept.into(),
            activity,
            score,
            bloom_level,
            duration_minutes,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AnalyticsLog {
    path: PathBuf,
}

impl AnalyticsLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, event: &StudyEvent) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
            }
        }
        let mut line =
            serde_json::to_string(event).map_err(|e| StoreError::corrupt(&self.path, e))?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| StoreError::io(&self.path, e))?;
        file.write_all(line.as_bytes())
            .map_err(|e| StoreError::io(&self.path, e))
    }

    /// Read every event. Unparseable lines are skipped with a warning.
    pub fn load(&self) -> Result<Vec<StudyEvent>, StoreError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::io(&self.path, e)),
        };

        let events = contents
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .filter_map(|(n, line)| match serde_json::from_str(line) {
                Ok(event) => Some(event),
                Err(e) => {
                    warn!(line = n + 1, error = %e, "skipping unreadable analytics line");
                    None
                }
            })
            .collect();
        Ok(events)
    }

    pub fn clear(&self) -> Result<(), StoreError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::io(&self.path, e)),
        }
    }
}

/// Result of [`summarize`].
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Insights {
    /// Not enough events yet.
    NeedMoreSessions { recorded: usize, remaining: usize },
    Ready(InsightsSummary),
}

#[derive(Debug, Clone, Serialize)]
pub struct InsightsSummary {
    pub total_sessions: usize,
    pub total_minutes: u64,
    pub average_score: f64,
    pub activity_counts: BTreeMap<Activity, usize>,
    /// Local hour with the best average score.
    pub best_hour: u32,
    pub bloom_progression: Vec<u8>,
    pub recent: Vec<StudyEvent>,
    pub recommendations: Vec<String>,
}

impl InsightsSummary {
    pub fn bloom_progression_names(&self) -> Vec<&'static str> {
        self.bloom_progression
            .iter()
            .map(|level| BloomLevel::from_level(*level).map_or("?", |b| b.as_str()))
            .collect()
    }
}

/// Summarize `events`, or report how many more are needed.
pub fn summarize(events: &[StudyEvent], min_sessions: usize) -> Insights {
    if events.is_empty() || events.len() < min_sessions {
        return Insights::NeedMoreSessions {
            recorded: events.len(),
            remaining: min_sessions.saturating_sub(events.len()).max(1),
        };
    }

    let total_sessions = events.len();
    let total_minutes = events.iter().map(|e| u64::from(e.duration_minutes)).sum();
    let average_score = events.iter().map(|e| e.score).sum::<f64>() / total_sessions as f64;

    let mut activity_counts = BTreeMap::new();
    let mut by_hour: BTreeMap<u32, (usize, f64)> = BTreeMap::new();
    for event in events {
        *activity_counts.entry(event.activity).or_insert(0) += 1;
        let slot = by_hour.entry(event.hour).or_insert((0, 0.0));
        slot.0 += 1;
        slot.1 += event.score;
    }

    let mut best_hour = 12;
    let mut best_average = f64::NEG_INFINITY;
    for (hour, (count, sum)) in &by_hour {
        let avg = sum / *count as f64;
        if avg > best_average {
            best_average = avg;
            best_hour = *hour;
        }
    }

    let recent: Vec<StudyEvent> = events[total_sessions.saturating_sub(RECENT_WINDOW)..].to_vec();
    let bloom_progression = recent.iter().map(|e| e.bloom_level).collect();

    let recommendations = vec![
        format!("Best time to study: around {best_hour}:00"),
        if average_score > 7.0 {
            "Focus on harder concepts".to_string()
        } else {
            "Review fundamentals before advancing".to_string()
        },
        if total_sessions > 20 {
            "Great consistency!".to_string()
        } else {
            "Try to study more regularly".to_string()
        },
    ];

    Insights::Ready(InsightsSummary {
        total_sessions,
        total_minutes,
        average_score,
        activity_counts,
        best_hour,
        bloom_progression,
        recent,
        recommendations,
    })
}
