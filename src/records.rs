//! Raw chat-export records and the standardized interaction edge.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{AnalysisError, Result};

/// A message row from the chat export. Treated as read-only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawMessage {
    pub id: String,
    pub thread_id: String,
    pub author_id: String,
    pub sent_at: i64,  // epoch ms
    #[serde(default)]
    pub body: String,
    /// `sent_at` of the message this one quotes, if any.
    #[serde(default)]
    pub quote_ref: Option<i64>,
    #[serde(default)]
    pub quote_author: Option<String>,
    #[serde(default)]
    pub quote_body: Option<String>,
}

/// An emoji reaction attached to one message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawReaction {
    pub id: String,
    pub message_id: String,
    pub author_id: String,
    pub sent_at: i64,  // epoch ms
    pub emoji: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum InteractionCategory {
    Response,
    Quotation,
    Emoji,
}

impl InteractionCategory {
    pub const ALL: [InteractionCategory; 3] = [
        InteractionCategory::Response,
        InteractionCategory::Quotation,
        InteractionCategory::Emoji,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InteractionCategory::Response => "response",
            InteractionCategory::Quotation => "quotation",
            InteractionCategory::Emoji => "emoji",
        }
    }

    /// Response and quotation edges can never point back at their author.
    pub fn excludes_self_interaction(&self) -> bool {
        !matches!(self, InteractionCategory::Emoji)
    }
}

impl std::fmt::Display for InteractionCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InteractionCategory {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "response" => Ok(InteractionCategory::Response),
            "quotation" => Ok(InteractionCategory::Quotation),
            "emoji" => Ok(InteractionCategory::Emoji),
            other => Err(AnalysisError::validation(
                "interaction_category",
                format!(
                    "expected one of response, emoji, quotation, but got '{}'",
                    other
                ),
            )),
        }
    }
}

/// Standardized interaction: `source` reacted to `target`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InteractionEdge {
    pub source_participant: String,
    pub source_time: i64,
    pub target_participant: String,
    pub target_time: i64,
    pub weight: f64,
    pub category: InteractionCategory,
}

impl InteractionEdge {
    /// Boundary check used by the graph builder for edges coming from outside
    /// the extractor (e.g. a reloaded edge table).
    pub fn validate(&self) -> Result<()> {
        let context = || format!("{} edge", self.category);
        if self.source_participant.is_empty() || self.target_participant.is_empty() {
            return Err(AnalysisError::validation(context(), "participant id is empty"));
        }
        if !self.weight.is_finite() || self.weight < 0.0 {
            return Err(AnalysisError::validation(
                context(),
                format!("weight must be finite and non-negative, got {}", self.weight),
            ));
        }
        if self.category.excludes_self_interaction()
            && self.source_participant == self.target_participant
        {
            return Err(AnalysisError::validation(
                context(),
                format!("self-interaction by {}", self.source_participant),
            ));
        }
        Ok(())
    }
}

/// One row of the exported edge table. Field names match the persisted columns.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EdgeRecord {
    pub target_participant_id: String,
    pub target_datetime: DateTime<Utc>,
    pub source_participant_id: String,
    pub source_datetime: DateTime<Utc>,
    pub weight: f64,
    pub interaction_category: InteractionCategory,
}

pub fn datetime_from_millis(ms: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms)
        .ok_or_else(|| AnalysisError::validation("timestamp", format!("{} ms is out of range", ms)))
}

impl TryFrom<&InteractionEdge> for EdgeRecord {
    type Error = AnalysisError;

    fn try_from(edge: &InteractionEdge) -> Result<Self> {
        Ok(EdgeRecord {
            target_participant_id: edge.target_participant.clone(),
            target_datetime: datetime_from_millis(edge.target_time)?,
            source_participant_id: edge.source_participant.clone(),
            source_datetime: datetime_from_millis(edge.source_time)?,
            weight: edge.weight,
            interaction_category: edge.category,
        })
    }
}

impl From<&EdgeRecord> for InteractionEdge {
    fn from(record: &EdgeRecord) -> Self {
        InteractionEdge {
            source_participant: record.source_participant_id.clone(),
            source_time: record.source_datetime.timestamp_millis(),
            target_participant: record.target_participant_id.clone(),
            target_time: record.target_datetime.timestamp_millis(),
            weight: record.weight,
            category: record.interaction_category,
        }
    }
}

// ---------------------------------------------------------------------------
// Input validation
// ---------------------------------------------------------------------------

fn require_field(table: &str, row: usize, field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(AnalysisError::validation(
            format!("{} row {}", table, row),
            format!("required field '{}' is empty", field),
        ));
    }
    Ok(())
}

/// Reject message rows missing any identifying field.
pub fn validate_messages(messages: &[RawMessage]) -> Result<()> {
    for (row, msg) in messages.iter().enumerate() {
        require_field("message", row, "id", &msg.id)?;
        require_field("message", row, "thread_id", &msg.thread_id)?;
        require_field("message", row, "author_id", &msg.author_id)?;
    }
    Ok(())
}

/// Reject reaction rows missing any identifying field.
pub fn validate_reactions(reactions: &[RawReaction]) -> Result<()> {
    for (row, reaction) in reactions.iter().enumerate() {
        require_field("reaction", row, "id", &reaction.id)?;
        require_field("reaction", row, "message_id", &reaction.message_id)?;
        require_field("reaction", row, "author_id", &reaction.author_id)?;
    }
    Ok(())
}
