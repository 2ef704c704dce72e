//! Participant id → display name resolution.
//!
//! The exporting device's own account usually has no system (contact) name, so the
//! caller names it explicitly through `default_author`. There is no process-wide
//! default.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{AnalysisError, Result};

pub type AuthorMap = HashMap<String, String>;

/// A recipient row of the chat export.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecipientRow {
    pub id: String,
    #[serde(default)]
    pub profile_name: Option<String>,
    #[serde(default)]
    pub system_name: Option<String>,
}

/// Which recipient column provides the display name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NameField {
    ProfileName,
    SystemName,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParticipantDirectory {
    names: AuthorMap,
}

impl ParticipantDirectory {
    /// Build a directory from recipient rows.
    ///
    /// The row whose profile name equals `default_author` also gets it as its system
    /// name. Rows without a value in `field` are left unmapped.
    pub fn from_recipients(rows: &[RecipientRow], default_author: &str, field: NameField) -> Result<Self> {
        let has_default = rows
            .iter()
            .any(|r| r.profile_name.as_deref() == Some(default_author));
        if !has_default {
            return Err(AnalysisError::validation(
                "recipients",
                format!("default author name '{}' not found", default_author),
            ));
        }

        let mut names = HashMap::new();
        for row in rows {
            if row.id.trim().is_empty() {
                return Err(AnalysisError::validation("recipients", "recipient id is empty"));
            }
            let is_default = row.profile_name.as_deref() == Some(default_author);
            let name = match field {
                NameField::ProfileName => row.profile_name.clone(),
                NameField::SystemName if is_default => Some(default_author.to_string()),
                NameField::SystemName => row.system_name.clone(),
            };
            if let Some(name) = name.filter(|n| !n.trim().is_empty()) {
                names.insert(row.id.clone(), name);
            }
        }

        Ok(Self { names })
    }

    pub fn from_author_map(names: AuthorMap) -> Self {
        Self { names }
    }

    /// Display name for `id`, or the id itself when unmapped.
    pub fn resolve<'a>(&'a self, id: &'a str) -> &'a str {
        self.names.get(id).map(String::as_str).unwrap_or(id)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
