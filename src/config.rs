//! Study configuration: scale definitions, sentinel-code policy, control
//! variables and output locations.
//!
//! `StudyConfig::default()` is the 7th-wave KWCS full-sample study. A JSON
//! file with the same shape can replace it.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::utils::PipelineError;

/// Role a scale plays in the downstream moderation model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleRole {
    Dependent,
    Independent,
    Moderator,
}

/// A named construct measured by an ordered set of item columns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaleDefinition {
    /// Composite column name, e.g. `PsychologicalHazards`
    pub name: String,
    pub role: ScaleRole,
    pub items: Vec<String>,
    /// Name of the mean-centered column, for scales that get centered
    #[serde(default)]
    pub centered_name: Option<String>,
}

/// Raw codes that mean "don't know" / "no response", and where they apply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingCodePolicy {
    pub codes: Vec<i64>,
    pub columns: Vec<String>,
}

impl MissingCodePolicy {
    pub fn is_sentinel(&self, value: f64) -> bool {
        self.codes.iter().any(|&code| code as f64 == value)
    }
}

/// A control variable copied into the output under a stable label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlVariable {
    pub source: String,
    pub label: String,
}

/// Output file names, relative to the output directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputFiles {
    pub analysis_data: String,
    pub reliability: String,
    pub descriptives: String,
    pub correlations: String,
}

impl Default for OutputFiles {
    fn default() -> Self {
        Self {
            analysis_data: "data_for_r_analysis_FULL_SAMPLE.csv".to_string(),
            reliability: "reliability_results_FULL_SAMPLE.csv".to_string(),
            descriptives: "descriptive_statistics_FULL_SAMPLE.csv".to_string(),
            correlations: "correlation_matrix_FULL_SAMPLE.csv".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyConfig {
    /// WHATWG label of the raw CSV encoding
    pub encoding: String,
    pub scales: Vec<ScaleDefinition>,
    pub controls: Vec<ControlVariable>,
    pub missing_codes: MissingCodePolicy,
    /// Below this many complete rows a scale gets no alpha
    pub min_reliability_rows: usize,
    /// Name of the interaction column (product of the two centered columns)
    pub interaction_name: String,
    #[serde(default)]
    pub outputs: OutputFiles,
}

fn items(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

impl Default for StudyConfig {
    fn default() -> Self {
        let psy_hazard = items(&["hazard_psy1", "hazard_psy2", "hazard_psy3"]);
        let health_prob = items(&["heal_prob1", "heal_prob2", "heal_prob3"]);
        let engagement = items(&["weng1", "weng2", "weng3"]);

        let all_items = psy_hazard
            .iter()
            .chain(&health_prob)
            .chain(&engagement)
            .cloned()
            .collect();

        let control = |source: &str, label: &str| ControlVariable {
            source: source.to_string(),
            label: label.to_string(),
        };

        Self {
            encoding: "euc-kr".to_string(),
            scales: vec![
                ScaleDefinition {
                    name: "PsychologicalHazards".to_string(),
                    role: ScaleRole::Independent,
                    items: psy_hazard,
                    centered_name: Some("PH_centered".to_string()),
                },
                ScaleDefinition {
                    name: "HealthProblems".to_string(),
                    role: ScaleRole::Dependent,
                    items: health_prob,
                    centered_name: None,
                },
                ScaleDefinition {
                    name: "WorkEngagement".to_string(),
                    role: ScaleRole::Moderator,
                    items: engagement,
                    centered_name: Some("WE_centered".to_string()),
                },
            ],
            controls: vec![
                control("gender", "Gender"),
                control("age", "Age"),
                control("edu", "Education"),
                control("emp_type", "EmpType"),
            ],
            // 8 = don't know, 9 = no response / not applicable.
            // Controls keep their raw codes.
            missing_codes: MissingCodePolicy {
                codes: vec![8, 9],
                columns: all_items,
            },
            min_reliability_rows: 10,
            interaction_name: "PH_x_WE".to_string(),
            outputs: OutputFiles::default(),
        }
    }
}

impl StudyConfig {
    /// Load a configuration from a JSON file
    pub fn from_json_file(path: &Path) -> Result<Self, PipelineError> {
        if !path.exists() {
            return Err(PipelineError::FileNotFound(path.to_path_buf()));
        }
        let content = fs::read_to_string(path)?;
        let config: StudyConfig = serde_json::from_str(&content)
            .map_err(|e| PipelineError::ConfigError(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Check the structural assumptions the composer relies on
    pub fn validate(&self) -> Result<(), PipelineError> {
        for role in [ScaleRole::Dependent, ScaleRole::Independent, ScaleRole::Moderator] {
            let count = self.scales.iter().filter(|s| s.role == role).count();
            if count != 1 {
                return Err(PipelineError::ConfigError(format!(
                    "expected exactly one {:?} scale, found {}",
                    role, count
                )));
            }
        }
        for scale in &self.scales {
            if scale.items.is_empty() {
                return Err(PipelineError::ConfigError(format!(
                    "scale '{}' has no items",
                    scale.name
                )));
            }
            let needs_center = matches!(scale.role, ScaleRole::Independent | ScaleRole::Moderator);
            if needs_center && scale.centered_name.is_none() {
                return Err(PipelineError::ConfigError(format!(
                    "scale '{}' needs a centered_name",
                    scale.name
                )));
            }
        }
        Ok(())
    }

    pub fn scale(&self, role: ScaleRole) -> Result<&ScaleDefinition, PipelineError> {
        self.scales
            .iter()
            .find(|s| s.role == role)
            .ok_or_else(|| PipelineError::ConfigError(format!("no {:?} scale configured", role)))
    }

    /// Every item column of every scale, followed by the control source columns
    pub fn working_columns(&self) -> Vec<String> {
        self.scales
            .iter()
            .flat_map(|s| s.items.iter().cloned())
            .chain(self.controls.iter().map(|c| c.source.clone()))
            .collect()
    }

    /// Composites followed by control labels, the set the reporter describes
    pub fn descriptive_columns(&self) -> Vec<String> {
        self.scales
            .iter()
            .map(|s| s.name.clone())
            .chain(self.controls.iter().map(|c| c.label.clone()))
            .collect()
    }
}
