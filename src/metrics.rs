//! Participant rankings over an interaction graph.
//!
//! - **Influence**: weighted eigenvector centrality. A participant's score is fed by
//!   the scores of the participants who react to them, scaled by edge weight.
//! - **Outward response**: for one participant, their direct targets ordered by the
//!   summed weight of the interactions they initiated towards each.
//!
//! Ties on score are broken by ascending participant id, so rankings are stable
//! across runs. Influence ties are first broken by summed incoming weight.

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

use crate::error::{ComputationWarning, MetricOutcome};
use crate::graph::InteractionGraph;
use crate::settings::EigenvectorSettings;

/// 1-based ranks and raw scores for one metric.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Ranking {
    pub rank: BTreeMap<String, usize>,
    pub score: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedParticipant {
    pub participant: String,
    pub rank: usize,
    pub score: f64,
}

impl Ranking {
    /// Rank by descending score, ties by ascending participant id.
    pub fn from_scores(scores: Vec<(String, f64)>) -> Self {
        Self::from_scores_and_tiebreak(scores.into_iter().map(|(p, s)| (p, s, 0.0)).collect())
    }

    /// Rank `(participant, score, tiebreak)` by descending score, then descending
    /// tiebreak, then ascending participant id.
    pub fn from_scores_and_tiebreak(mut entries: Vec<(String, f64, f64)>) -> Self {
        entries.sort_by(|a, b| {
            b.1.total_cmp(&a.1)
                .then_with(|| b.2.total_cmp(&a.2))
                .then_with(|| a.0.cmp(&b.0))
        });

        let mut ranking = Ranking::default();
        for (i, (participant, score, _)) in entries.into_iter().enumerate() {
            ranking.rank.insert(participant.clone(), i + 1);
            ranking.score.insert(participant, score);
        }
        ranking
    }

    pub fn len(&self) -> usize {
        self.rank.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rank.is_empty()
    }

    pub fn rank_of(&self, participant: &str) -> Option<usize> {
        self.rank.get(participant).copied()
    }

    pub fn score_of(&self, participant: &str) -> Option<f64> {
        self.score.get(participant).copied()
    }

    /// Rows sorted by rank, as shown in a leaderboard table.
    pub fn ordered(&self) -> Vec<RankedParticipant> {
        let mut rows: Vec<RankedParticipant> = self
            .rank
            .iter()
            .map(|(participant, &rank)| RankedParticipant {
                participant: participant.clone(),
                rank,
                score: self.score.get(participant).copied().unwrap_or(0.0),
            })
            .collect();
        rows.sort_by_key(|r| r.rank);
        rows
    }
}

// ---------------------------------------------------------------------------
// Influence (eigenvector centrality)
// ---------------------------------------------------------------------------

/// Power iteration on x ← (Aᵀ + I)x with L2 normalization, uniform start.
/// Returns None when the L1 change never drops below `n * tolerance`.
fn power_iteration(
    node_count: usize,
    incoming: &[Vec<(usize, f64)>],
    settings: &EigenvectorSettings,
) -> Option<(Vec<f64>, usize)> {
    let mut x = vec![1.0 / node_count as f64; node_count];

    for iteration in 1..=settings.max_iter {
        let last = x.clone();
        for (v, sources) in incoming.iter().enumerate() {
            for &(u, w) in sources {
                x[v] += last[u] * w;
            }
        }

        let norm = x.iter().map(|s| s * s).sum::<f64>().sqrt();
        let norm = if norm > 0.0 { norm } else { 1.0 };
        for s in &mut x {
            *s /= norm;
        }

        let change: f64 = x.iter().zip(&last).map(|(a, b)| (a - b).abs()).sum();
        if change < node_count as f64 * settings.tolerance {
            return Some((x, iteration));
        }
    }
    None
}

/// Eigenvector-style influence ranking over the graph's aggregated edges.
///
/// Equal scores are ordered by summed incoming weight, then id. If the iteration
/// does not converge every participant scores 0, so the order falls to incoming
/// weight alone, and an `EigenvectorNotConverged` warning is returned.
pub fn eigenvector_ranking(graph: &InteractionGraph, settings: &EigenvectorSettings) -> MetricOutcome<Ranking> {
    let nodes: Vec<String> = graph.nodes().map(str::to_string).collect();
    if nodes.is_empty() {
        return MetricOutcome::clean(Ranking::default());
    }

    let index: HashMap<&str, usize> = nodes.iter().enumerate().map(|(i, n)| (n.as_str(), i)).collect();
    let mut incoming: Vec<Vec<(usize, f64)>> = vec![Vec::new(); nodes.len()];
    for ((source, target), &weight) in graph.weighted_edges().iter() {
        if let (Some(&u), Some(&v)) = (index.get(source.as_str()), index.get(target.as_str())) {
            incoming[v].push((u, weight));
        }
    }
    let in_weight: Vec<f64> = incoming
        .iter()
        .map(|sources| sources.iter().map(|&(_, w)| w).sum())
        .collect();

    let mut warnings = Vec::new();
    let scores: Vec<f64> = match power_iteration(nodes.len(), &incoming, settings) {
        Some((scores, iterations)) => {
            debug!("[Metrics] eigenvector centrality converged after {} iterations", iterations);
            scores
        }
        None => {
            warn!(
                "[Metrics] eigenvector centrality failed to converge in {} iterations, setting scores to 0",
                settings.max_iter
            );
            warnings.push(ComputationWarning::EigenvectorNotConverged {
                iterations: settings.max_iter,
            });
            vec![0.0; nodes.len()]
        }
    };

    MetricOutcome {
        value: Ranking::from_scores_and_tiebreak(
            nodes
                .into_iter()
                .zip(scores)
                .zip(in_weight)
                .map(|((participant, score), tiebreak)| (participant, score, tiebreak))
                .collect(),
        ),
        warnings,
    }
}

// ---------------------------------------------------------------------------
// Outward response
// ---------------------------------------------------------------------------

/// Direct targets of `source`, strongest summed interaction weight first.
pub fn outward_response_ranking(graph: &InteractionGraph, source: &str) -> MetricOutcome<Ranking> {
    let targets = graph.out_edges(source);
    if targets.is_empty() {
        warn!("[Metrics] {} has no outbound interactions in this graph", source);
        return MetricOutcome {
            value: Ranking::default(),
            warnings: vec![ComputationWarning::NoOutboundEdges {
                participant: source.to_string(),
            }],
        };
    }
    MetricOutcome::clean(Ranking::from_scores(targets))
}

/// Outward response ranking for every participant that initiated anything.
pub fn outward_response_metrics(graph: &InteractionGraph) -> BTreeMap<String, Ranking> {
    let mut per_source: BTreeMap<String, Vec<(String, f64)>> = BTreeMap::new();
    for ((source, target), &weight) in graph.weighted_edges().iter() {
        per_source.entry(source.clone()).or_default().push((target.clone(), weight));
    }
    per_source
        .into_iter()
        .map(|(source, targets)| (source, Ranking::from_scores(targets)))
        .collect()
}
