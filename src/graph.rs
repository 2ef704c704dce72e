//! Directed interaction graph built from standardized edges.
//!
//! Two build modes:
//! - `Multi` keeps one edge per interaction with its weight, category and both
//!   timestamps (inspection / visualization).
//! - `Aggregated` keeps one edge per ordered (source, target) pair with the weights
//!   of every interaction between them summed (ranking).
//!
//! Nodes and aggregated edges live in ordered maps so that building twice from the
//! same input gives identical graphs.

use serde::Serialize;
use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use crate::error::{AnalysisError, Result};
use crate::records::{InteractionCategory, InteractionEdge};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildMode {
    Multi,
    Aggregated,
}

#[derive(Debug, Clone, PartialEq)]
enum GraphEdges {
    Multi(Vec<InteractionEdge>),
    /// (source, target) -> summed weight
    Aggregated(BTreeMap<(String, String), f64>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct InteractionGraph {
    nodes: BTreeSet<String>,
    edges: GraphEdges,
}

/// Edges of one category, or all edges when `category` is None.
///
/// Asking for a category that has no edges is a `NoCategoryData` error; an empty
/// input without a category filter is fine.
pub fn filter_by_category(
    edges: &[InteractionEdge],
    category: Option<InteractionCategory>,
) -> Result<Vec<&InteractionEdge>> {
    match category {
        None => Ok(edges.iter().collect()),
        Some(category) => {
            let filtered: Vec<&InteractionEdge> = edges.iter().filter(|e| e.category == category).collect();
            if filtered.is_empty() {
                return Err(AnalysisError::NoCategoryData(category));
            }
            Ok(filtered)
        }
    }
}

fn aggregate<'a>(edges: impl Iterator<Item = &'a InteractionEdge>) -> BTreeMap<(String, String), f64> {
    let mut summed: BTreeMap<(String, String), f64> = BTreeMap::new();
    for e in edges {
        *summed
            .entry((e.source_participant.clone(), e.target_participant.clone()))
            .or_insert(0.0) += e.weight;
    }
    summed
}

impl InteractionGraph {
    /// Validate, optionally filter by category, and assemble the graph.
    pub fn build(
        edges: &[InteractionEdge],
        category: Option<InteractionCategory>,
        mode: BuildMode,
    ) -> Result<Self> {
        let selected = filter_by_category(edges, category)?;
        for edge in &selected {
            edge.validate()?;
        }

        let mut nodes = BTreeSet::new();
        for e in &selected {
            nodes.insert(e.source_participant.clone());
            nodes.insert(e.target_participant.clone());
        }

        let graph_edges = match mode {
            BuildMode::Multi => GraphEdges::Multi(selected.into_iter().cloned().collect()),
            BuildMode::Aggregated => GraphEdges::Aggregated(aggregate(selected.into_iter())),
        };

        let graph = InteractionGraph {
            nodes,
            edges: graph_edges,
        };
        debug!(
            "[Graph] built {:?} graph ({}): {} nodes, {} edges",
            mode,
            category.map(|c| c.as_str()).unwrap_or("all categories"),
            graph.node_count(),
            graph.edge_count()
        );
        Ok(graph)
    }

    pub fn mode(&self) -> BuildMode {
        match self.edges {
            GraphEdges::Multi(_) => BuildMode::Multi,
            GraphEdges::Aggregated(_) => BuildMode::Aggregated,
        }
    }

    /// Participants in ascending id order.
    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(String::as_str)
    }

    pub fn contains_node(&self, participant: &str) -> bool {
        self.nodes.contains(participant)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Interactions in multi mode, distinct ordered pairs in aggregated mode.
    pub fn edge_count(&self) -> usize {
        match &self.edges {
            GraphEdges::Multi(edges) => edges.len(),
            GraphEdges::Aggregated(summed) => summed.len(),
        }
    }

    /// Per-interaction edges. None for an aggregated graph.
    pub fn multi_edges(&self) -> Option<&[InteractionEdge]> {
        match &self.edges {
            GraphEdges::Multi(edges) => Some(edges),
            GraphEdges::Aggregated(_) => None,
        }
    }

    /// Summed weight per ordered pair. Borrowed from an aggregated graph, computed
    /// for a multi graph.
    pub fn weighted_edges(&self) -> Cow<'_, BTreeMap<(String, String), f64>> {
        match &self.edges {
            GraphEdges::Multi(edges) => Cow::Owned(aggregate(edges.iter())),
            GraphEdges::Aggregated(summed) => Cow::Borrowed(summed),
        }
    }

    /// Summed weight per ordered pair, whatever the build mode.
    pub fn aggregated_weights(&self) -> BTreeMap<(String, String), f64> {
        self.weighted_edges().into_owned()
    }

    /// Collapse a multi graph into its aggregated form.
    pub fn to_aggregated(&self) -> InteractionGraph {
        InteractionGraph {
            nodes: self.nodes.clone(),
            edges: GraphEdges::Aggregated(self.aggregated_weights()),
        }
    }

    /// Summed weight from `source` to `target`, None if they never interacted.
    pub fn weight(&self, source: &str, target: &str) -> Option<f64> {
        match &self.edges {
            GraphEdges::Aggregated(summed) => summed.get(&(source.to_string(), target.to_string())).copied(),
            GraphEdges::Multi(edges) => {
                let mut total = None;
                for e in edges
                    .iter()
                    .filter(|e| e.source_participant == source && e.target_participant == target)
                {
                    *total.get_or_insert(0.0) += e.weight;
                }
                total
            }
        }
    }

    /// Direct targets of `source` with summed weights, ascending by target id.
    pub fn out_edges(&self, source: &str) -> Vec<(String, f64)> {
        match &self.edges {
            GraphEdges::Aggregated(summed) => summed
                .range((source.to_string(), String::new())..)
                .take_while(|((s, _), _)| s == source)
                .map(|((_, t), &w)| (t.clone(), w))
                .collect(),
            GraphEdges::Multi(edges) => {
                aggregate(edges.iter().filter(|e| e.source_participant == source))
                    .into_iter()
                    .map(|((_, t), w)| (t, w))
                    .collect()
            }
        }
    }

    /// Direct sources pointing at `target` with summed weights, ascending by source id.
    pub fn in_edges(&self, target: &str) -> Vec<(String, f64)> {
        match &self.edges {
            GraphEdges::Aggregated(summed) => summed
                .iter()
                .filter(|((_, t), _)| t == target)
                .map(|((s, _), &w)| (s.clone(), w))
                .collect(),
            GraphEdges::Multi(edges) => {
                aggregate(edges.iter().filter(|e| e.target_participant == target))
                    .into_iter()
                    .map(|((s, _), w)| (s, w))
                    .collect()
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
