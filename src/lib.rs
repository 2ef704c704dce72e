//! Interaction weighting and social-graph analytics for group-chat exports.
//!
//! Raw messages and reactions go through extraction (responses, quotations, emoji
//! reactions), time-decay weighting and standardization into one edge table. The
//! edge table can be restricted to a date range, built into a directed graph and
//! ranked.

pub mod decay;
pub mod error;
pub mod extraction;
pub mod graph;
pub mod metrics;
pub mod participants;
pub mod pipeline;
pub mod records;
pub mod settings;
pub mod standardize;
pub mod window;

pub use error::{AnalysisError, ComputationWarning, MetricOutcome, Result};
pub use graph::{BuildMode, InteractionGraph};
pub use metrics::{eigenvector_ranking, outward_response_metrics, outward_response_ranking, Ranking};
pub use participants::ParticipantDirectory;
pub use pipeline::{analyze_window, build_edge_table, EdgeTable, WindowAnalysis};
pub use records::{EdgeRecord, InteractionCategory, InteractionEdge, RawMessage, RawReaction};
pub use settings::AnalysisSettings;
pub use window::TimeWindow;
