//! Analysis settings storage
//!
//! Tunable priors and iteration limits, stored as a JSON file. Settings are passed
//! explicitly into every operation; nothing here is global.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{AnalysisError, Result};
use crate::records::InteractionCategory;

/// Fixed priors for the relative social significance of each interaction type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BaseValues {
    #[serde(default = "default_response_base")]
    pub response: f64,
    #[serde(default = "default_emoji_base")]
    pub emoji: f64,
    #[serde(default = "default_quotation_base")]
    pub quotation: f64,
}

impl BaseValues {
    pub fn for_category(&self, category: InteractionCategory) -> f64 {
        match category {
            InteractionCategory::Response => self.response,
            InteractionCategory::Emoji => self.emoji,
            InteractionCategory::Quotation => self.quotation,
        }
    }
}

impl Default for BaseValues {
    fn default() -> Self {
        Self {
            response: default_response_base(),
            emoji: default_emoji_base(),
            quotation: default_quotation_base(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EigenvectorSettings {
    #[serde(default = "default_max_iter")]
    pub max_iter: usize,
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
}

impl Default for EigenvectorSettings {
    fn default() -> Self {
        Self {
            max_iter: default_max_iter(),
            tolerance: default_tolerance(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisSettings {
    #[serde(default)]
    pub base_values: BaseValues,
    /// Quantile of the batch's time differences used as the half-life (default: 0.75)
    #[serde(default = "default_half_life_percentile")]
    pub half_life_percentile: f64,
    /// Responses paired per comment. None = number of distinct authors in the thread.
    #[serde(default)]
    pub response_fanout: Option<usize>,
    #[serde(default)]
    pub eigenvector: EigenvectorSettings,
}

fn default_response_base() -> f64 {
    1.0
}

fn default_emoji_base() -> f64 {
    1.5
}

fn default_quotation_base() -> f64 {
    2.0
}

fn default_half_life_percentile() -> f64 {
    0.75
}

fn default_max_iter() -> usize {
    100
}

fn default_tolerance() -> f64 {
    1.0e-6
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            base_values: BaseValues::default(),
            half_life_percentile: default_half_life_percentile(),
            response_fanout: None,
            eigenvector: EigenvectorSettings::default(),
        }
    }
}

impl AnalysisSettings {
    /// Load settings from disk, or defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(AnalysisSettings::default());
        }
        let content = fs::read_to_string(path)
            .map_err(|e| AnalysisError::Settings(format!("Failed to read {}: {}", path.display(), e)))?;
        let settings: AnalysisSettings = serde_json::from_str(&content)
            .map_err(|e| AnalysisError::Settings(format!("Failed to parse {}: {}", path.display(), e)))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Save settings to disk
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| AnalysisError::Settings(format!("Failed to serialize settings: {}", e)))?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| AnalysisError::Settings(format!("Failed to create config directory: {}", e)))?;
        }

        fs::write(path, content)
            .map_err(|e| AnalysisError::Settings(format!("Failed to write settings file: {}", e)))?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        for category in InteractionCategory::ALL {
            let base = self.base_values.for_category(category);
            if !base.is_finite() || base < 0.0 {
                return Err(AnalysisError::validation(
                    "settings",
                    format!("{} base value must be finite and non-negative, got {}", category, base),
                ));
            }
        }
        if !(0.0..=1.0).contains(&self.half_life_percentile) {
            return Err(AnalysisError::validation(
                "settings",
                format!("half_life_percentile must be within [0, 1], got {}", self.half_life_percentile),
            ));
        }
        if self.response_fanout == Some(0) {
            return Err(AnalysisError::validation("settings", "response_fanout must be at least 1"));
        }
        if self.eigenvector.max_iter == 0 || !(self.eigenvector.tolerance > 0.0) {
            return Err(AnalysisError::validation(
                "settings",
                "eigenvector max_iter and tolerance must be positive",
            ));
        }
        Ok(())
    }
}
