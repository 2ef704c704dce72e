//! Date-range restriction of an edge set.
//!
//! Edges are kept by their `target_time`. Changing the window means filtering the
//! full edge set again and rebuilding the graph; nothing is patched in place.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};
use crate::records::{datetime_from_millis, InteractionEdge};

/// Inclusive [start, end] bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "WindowBounds")]
pub struct TimeWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

/// Unchecked wire form of a `TimeWindow`.
#[derive(Deserialize)]
struct WindowBounds {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TryFrom<WindowBounds> for TimeWindow {
    type Error = AnalysisError;

    fn try_from(bounds: WindowBounds) -> Result<Self> {
        TimeWindow::new(bounds.start, bounds.end)
    }
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if start > end {
            return Err(AnalysisError::validation(
                "time window",
                format!("start {} is after end {}", start, end),
            ));
        }
        Ok(Self { start, end })
    }

    /// Smallest window covering every edge's target time. None for no edges.
    pub fn spanning(edges: &[InteractionEdge]) -> Result<Option<Self>> {
        let min = edges.iter().map(|e| e.target_time).min();
        let max = edges.iter().map(|e| e.target_time).max();
        match (min, max) {
            (Some(min), Some(max)) => Ok(Some(Self {
                start: datetime_from_millis(min)?,
                end: datetime_from_millis(max)?,
            })),
            _ => Ok(None),
        }
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn contains_millis(&self, ms: i64) -> bool {
        ms >= self.start.timestamp_millis() && ms <= self.end.timestamp_millis()
    }
}

/// Edges whose target time falls inside the window.
pub fn filter_edges(edges: &[InteractionEdge], window: &TimeWindow) -> Vec<InteractionEdge> {
    edges
        .iter()
        .filter(|e| window.contains_millis(e.target_time))
        .cloned()
        .collect()
}
