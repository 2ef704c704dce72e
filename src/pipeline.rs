//! End-to-end analysis entry points.
//!
//! `build_edge_table` turns one thread of a chat export into the standardized edge
//! table; `analyze_window` ranks the participants active in a date range. Both are
//! pure: every call rebuilds from its inputs.

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{ComputationWarning, Result};
use crate::extraction::{extract_emoji, extract_quotations, extract_responses, weigh_pairs, InteractionPair};
use crate::graph::{BuildMode, InteractionGraph};
use crate::metrics::{eigenvector_ranking, Ranking};
use crate::participants::ParticipantDirectory;
use crate::records::{validate_messages, validate_reactions, InteractionEdge, RawMessage, RawReaction};
use crate::settings::AnalysisSettings;
use crate::standardize::{concat, Standardizer};
use crate::window::{filter_edges, TimeWindow};

/// Standardized edges of one thread plus every warning raised while weighting.
#[derive(Debug, Clone, Serialize)]
pub struct EdgeTable {
    pub edges: Vec<InteractionEdge>,
    pub warnings: Vec<ComputationWarning>,
}

#[derive(Debug, Clone)]
pub struct WindowAnalysis {
    /// Ascending participant ids of the windowed graph
    pub participants: Vec<String>,
    pub graph: InteractionGraph,
    pub ranking: Ranking,
    pub warnings: Vec<ComputationWarning>,
}

fn weigh_and_standardize<P: InteractionPair>(
    pairs: Vec<P>,
    settings: &AnalysisSettings,
    standardizer: &Standardizer<'_>,
    warnings: &mut Vec<ComputationWarning>,
) -> Result<Vec<InteractionEdge>> {
    let weighted = weigh_pairs(
        pairs,
        settings.base_values.for_category(P::CATEGORY),
        settings.half_life_percentile,
    );
    warnings.extend(weighted.warnings);
    standardizer.standardize(&weighted.value)
}

/// Extract, weight and standardize all three interaction categories of a thread.
///
/// Edges are concatenated response, emoji, quotation. A thread with no messages is
/// `ThreadNotFound`; a thread without quotes or reactions just contributes no
/// edges for those categories.
pub fn build_edge_table(
    messages: &[RawMessage],
    reactions: &[RawReaction],
    thread_id: &str,
    settings: &AnalysisSettings,
    directory: Option<&ParticipantDirectory>,
) -> Result<EdgeTable> {
    settings.validate()?;
    validate_messages(messages)?;
    validate_reactions(reactions)?;

    let standardizer = Standardizer::new(directory);
    let mut warnings = Vec::new();

    let responses = extract_responses(messages, thread_id, settings.response_fanout)?;
    let emoji = extract_emoji(messages, reactions, thread_id)?;
    let quotations = extract_quotations(messages, thread_id)?;

    let edges = concat(vec![
        weigh_and_standardize(responses, settings, &standardizer, &mut warnings)?,
        weigh_and_standardize(emoji, settings, &standardizer, &mut warnings)?,
        weigh_and_standardize(quotations, settings, &standardizer, &mut warnings)?,
    ]);

    debug!(
        "[Pipeline] thread {}: {} edges, {} warnings",
        thread_id,
        edges.len(),
        warnings.len()
    );
    Ok(EdgeTable { edges, warnings })
}

/// Restrict edges to a window, build the aggregated graph and rank by influence.
pub fn analyze_window(
    edges: &[InteractionEdge],
    window: &TimeWindow,
    settings: &AnalysisSettings,
) -> Result<WindowAnalysis> {
    settings.validate()?;

    let windowed = filter_edges(edges, window);
    if windowed.is_empty() {
        warn!(
            "[Pipeline] no interactions between {} and {}",
            window.start(),
            window.end()
        );
    }

    let graph = InteractionGraph::build(&windowed, None, BuildMode::Aggregated)?;
    let ranked = eigenvector_ranking(&graph, &settings.eigenvector);

    Ok(WindowAnalysis {
        participants: graph.nodes().map(str::to_string).collect(),
        graph,
        ranking: ranked.value,
        warnings: ranked.warnings,
    })
}
