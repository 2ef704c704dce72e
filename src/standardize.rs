//! Maps typed weighted pairs onto the common `InteractionEdge` shape.
//!
//! Direction convention used everywhere downstream: the target is the earlier,
//! reacted-to message's author; the source is the participant who reacted.

use crate::error::{AnalysisError, Result};
use crate::extraction::{InteractionPair, WeightedPair};
use crate::participants::ParticipantDirectory;
use crate::records::{EdgeRecord, InteractionEdge};

pub struct Standardizer<'a> {
    directory: Option<&'a ParticipantDirectory>,
}

impl<'a> Standardizer<'a> {
    /// `directory` relabels participant ids; None keeps raw ids.
    pub fn new(directory: Option<&'a ParticipantDirectory>) -> Self {
        Self { directory }
    }

    fn label(&self, id: &str) -> String {
        match self.directory {
            Some(directory) => directory.resolve(id).to_string(),
            None => id.to_string(),
        }
    }

    pub fn standardize<P: InteractionPair>(&self, weighted: &[WeightedPair<P>]) -> Result<Vec<InteractionEdge>> {
        weighted
            .iter()
            .map(|w| {
                let (target_id, target_time) = w.pair.target();
                let (source_id, source_time) = w.pair.source();
                let edge = InteractionEdge {
                    source_participant: self.label(source_id),
                    source_time,
                    target_participant: self.label(target_id),
                    target_time,
                    weight: w.weight,
                    category: P::CATEGORY,
                };
                if P::CATEGORY.excludes_self_interaction()
                    && edge.source_participant == edge.target_participant
                {
                    return Err(AnalysisError::validation(
                        "participant directory",
                        format!(
                            "{} and {} both resolve to '{}'",
                            source_id, target_id, edge.source_participant
                        ),
                    ));
                }
                Ok(edge)
            })
            .collect()
    }
}

/// Stack per-category edge lists into one table, preserving order.
pub fn concat(parts: Vec<Vec<InteractionEdge>>) -> Vec<InteractionEdge> {
    parts.into_iter().flatten().collect()
}

/// Export rows for the persisted edge table.
pub fn to_edge_records(edges: &[InteractionEdge]) -> Result<Vec<EdgeRecord>> {
    edges.iter().map(EdgeRecord::try_from).collect()
}
