//! Error and warning taxonomy.
//!
//! Hard failures are `AnalysisError` and abort the call. Numeric anomalies that the
//! chat export is known to contain are `ComputationWarning`s: they are returned next
//! to the result and logged, never raised.

use serde::Serialize;

use crate::records::InteractionCategory;

pub type Result<T> = std::result::Result<T, AnalysisError>;

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    /// Input records or edges are malformed. Raised before any computation.
    #[error("Invalid {context}: {message}")]
    Validation { context: String, message: String },

    /// The requested thread has no messages at all.
    #[error("No messages found for thread '{0}'")]
    ThreadNotFound(String),

    /// A category filter left nothing to build a graph from.
    #[error("No data found for the interaction category: {0}")]
    NoCategoryData(InteractionCategory),

    /// Reading, parsing or writing the settings file failed.
    #[error("Settings error: {0}")]
    Settings(String),
}

impl AnalysisError {
    pub fn validation(context: impl Into<String>, message: impl Into<String>) -> Self {
        AnalysisError::Validation {
            context: context.into(),
            message: message.into(),
        }
    }

    /// True for "no data for this slice", as opposed to malformed input.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            AnalysisError::ThreadNotFound(_) | AnalysisError::NoCategoryData(_)
        )
    }
}

/// Non-fatal anomaly recorded during an otherwise successful computation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ComputationWarning {
    /// The reacting message predates the message it reacts to.
    NegativeTimeDiff {
        category: InteractionCategory,
        source_participant: String,
        target_participant: String,
        time_diff_secs: f64,
    },
    /// The batch percentile gave no usable half-life; weights were not decayed.
    DegenerateHalfLife {
        category: InteractionCategory,
        half_life_secs: f64,
    },
    /// Power iteration hit the iteration cap; every score was set to 0.
    EigenvectorNotConverged { iterations: usize },
    /// Outward ranking requested for a participant without outbound edges.
    NoOutboundEdges { participant: String },
}

impl std::fmt::Display for ComputationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ComputationWarning::NegativeTimeDiff {
                category,
                source_participant,
                target_participant,
                time_diff_secs,
            } => write!(
                f,
                "negative {} time difference ({:.3}s) from {} to {}",
                category, time_diff_secs, source_participant, target_participant
            ),
            ComputationWarning::DegenerateHalfLife {
                category,
                half_life_secs,
            } => write!(
                f,
                "{} half-life of {}s is not positive, weights left undecayed",
                category, half_life_secs
            ),
            ComputationWarning::EigenvectorNotConverged { iterations } => write!(
                f,
                "eigenvector centrality failed to converge in {} iterations, scores set to 0",
                iterations
            ),
            ComputationWarning::NoOutboundEdges { participant } => {
                write!(f, "participant {} has no outbound interactions", participant)
            }
        }
    }
}

/// A computed value together with the warnings raised while computing it.
#[derive(Debug, Clone, Serialize)]
pub struct MetricOutcome<T> {
    pub value: T,
    pub warnings: Vec<ComputationWarning>,
}

impl<T> MetricOutcome<T> {
    pub fn clean(value: T) -> Self {
        MetricOutcome {
            value,
            warnings: Vec::new(),
        }
    }
}
