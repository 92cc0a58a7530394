//! Typed failures for the engine's operation surface.
//!
//! Every public engine operation returns [`EngineError`] on failure. The variants
//! mirror the failure taxonomy callers branch on: a missing concept, bad caller
//! input, a failed content-generation dependency, a rejected prerequisite cycle,
//! or a storage problem. None of them abort the host process.

use serde::Serialize;
use thiserror::Error;

use crate::generator::GeneratorError;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum EngineError {
    /// The addressed `concept_id` is not in the store. Nothing was mutated.
    #[error("concept not found: {concept_id}")]
    NotFound { concept_id: String },

    /// Caller-supplied input is out of range (quality, session length, empty text).
    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    /// The content generator failed or returned data of the wrong shape.
    /// The operation was aborted before anything was persisted.
    #[error("{operation}: content generator failed: {source}")]
    DependencyFailure {
        operation: &'static str,
        #[source]
        source: GeneratorError,
    },

    /// A build produced a prerequisite cycle and cycle rejection is enabled.
    #[error("prerequisite cycle: {}", cycle.join(" -> "))]
    PrerequisiteCycle { cycle: Vec<String> },

    #[error(transparent)]
    Storage(#[from] StoreError),

    #[error("failed to write report {path}: {source}")]
    Report {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Structured form of an [`EngineError`], suitable for JSON responses.
#[derive(Debug, Serialize)]
pub struct ErrorReport {
    pub kind: &'static str,
    pub operation: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concept_id: Option<String>,
    pub message: String,
}

impl EngineError {
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }

    pub fn not_found(concept_id: impl Into<String>) -> Self {
        Self::NotFound {
            concept_id: concept_id.into(),
        }
    }

    /// Stable machine-readable tag for the variant.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::Validation { .. } => "validation",
            Self::DependencyFailure { .. } => "dependency_failure",
            Self::PrerequisiteCycle { .. } => "prerequisite_cycle",
            Self::Storage(_) => "storage",
            Self::Report { .. } => "report",
        }
    }

    /// `true` when retrying the whole operation may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::DependencyFailure { .. })
    }

    pub fn to_report(&self, operation: &'static str) -> ErrorReport {
        let concept_id = match self {
            Self::NotFound { concept_id } => Some(concept_id.clone()),
            _ => None,
        };
        ErrorReport {
            kind: self.kind(),
            operation,
            concept_id,
            message: self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_report_names_the_concept() {
        let err = EngineError::not_found("c042");
        let report = err.to_report("review");
        assert_eq!(report.kind, "not_found");
        assert_eq!(report.operation, "review");
        assert_eq!(report.concept_id.as_deref(), Some("c042"));
        assert!(report.message.contains("c042"));
    }

    #[test]
    fn only_dependency_failures_are_retryable() {
        let dep = EngineError::DependencyFailure {
            operation: "build",
            source: GeneratorError::EmptyResponse,
        };
        assert!(dep.is_retryable());
        assert!(!EngineError::validation("quality", "must be 0-5").is_retryable());
    }

    #[test]
    fn cycle_message_lists_the_path() {
        let err = EngineError::PrerequisiteCycle {
            cycle: vec!["c000".into(), "c001".into()],
        };
        assert_eq!(err.to_string(), "prerequisite cycle: c000 -> c001");
    }
}
