//! Time-decay weighting of interactions.
//!
//! A reaction's strength decays exponentially with its latency. The half-life is
//! not a constant: it is the chosen percentile (default 75th) of the latencies in
//! the batch being weighted, so every category and every invocation gets its own.
//!
//! ```text
//! decay_constant = ln 2 / half_life
//! weight(dt)     = base_value * exp(-decay_constant * dt)
//! ```

use std::f64::consts::LN_2;
use tracing::{debug, warn};

use crate::error::{ComputationWarning, MetricOutcome};
use crate::records::InteractionCategory;

/// Seconds between two epoch-ms timestamps. Negative when `later_ms` is earlier.
pub fn time_diff_secs(later_ms: i64, earlier_ms: i64) -> f64 {
    if later_ms == earlier_ms {
        return 0.0;
    }
    (later_ms as f64 - earlier_ms as f64) / 1000.0
}

/// Quantile with linear interpolation between closest ranks.
/// Returns None for an empty slice.
pub fn percentile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted: Vec<f64> = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

pub fn decay_constant(half_life_secs: f64) -> f64 {
    LN_2 / half_life_secs
}

/// Decayed weight. Strictly decreasing in `time_diff_secs` for a positive constant.
pub fn weight(base_value: f64, decay_constant: f64, time_diff_secs: f64) -> f64 {
    base_value * (-decay_constant * time_diff_secs).exp()
}

/// Decay parameters fitted to one category batch.
#[derive(Debug, Clone, PartialEq)]
pub struct DecayModel {
    pub category: InteractionCategory,
    pub base_value: f64,
    /// None when the batch was empty.
    pub half_life_secs: Option<f64>,
    pub decay_constant: f64,
}

impl DecayModel {
    /// Fit the half-life to `time_diffs` at quantile `q`.
    ///
    /// A non-positive (or non-finite) half-life cannot define a decay, so the model
    /// falls back to a constant of 0 and reports `DegenerateHalfLife`.
    pub fn fit(
        category: InteractionCategory,
        base_value: f64,
        time_diffs: &[f64],
        q: f64,
    ) -> MetricOutcome<DecayModel> {
        let half_life = percentile(time_diffs, q);
        let mut warnings = Vec::new();

        let decay_constant = match half_life {
            Some(h) if h.is_finite() && h > 0.0 => decay_constant(h),
            Some(h) => {
                warn!("[Decay] {} half-life is {}s over {} interactions, weights left undecayed", category, h, time_diffs.len());
                warnings.push(ComputationWarning::DegenerateHalfLife {
                    category,
                    half_life_secs: h,
                });
                0.0
            }
            None => 0.0,
        };

        debug!(
            "[Decay] {}: {} interactions, half-life {:?}s, decay constant {}",
            category,
            time_diffs.len(),
            half_life,
            decay_constant
        );

        MetricOutcome {
            value: DecayModel {
                category,
                base_value,
                half_life_secs: half_life,
                decay_constant,
            },
            warnings,
        }
    }

    /// Weight for one interaction. A negative latency weighs more than the base
    /// value; callers flag it through `check_time_diff`.
    pub fn weight(&self, time_diff_secs: f64) -> f64 {
        weight(self.base_value, self.decay_constant, time_diff_secs)
    }
}

/// Record a negative latency without rejecting it.
pub(crate) fn check_time_diff(
    category: InteractionCategory,
    source: &str,
    target: &str,
    time_diff_secs: f64,
    warnings: &mut Vec<ComputationWarning>,
) {
    if time_diff_secs < 0.0 {
        warn!(
            "[Decay] negative {} time difference {}s ({} -> {})",
            category, time_diff_secs, source, target
        );
        warnings.push(ComputationWarning::NegativeTimeDiff {
            category,
            source_participant: source.to_string(),
            target_participant: target.to_string(),
            time_diff_secs,
        });
    }
}
