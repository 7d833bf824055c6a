//! # Project Data Structures
//!
//! The `Project` struct is the root container for one takeoff. Projects
//! serialize to `.tko` files as human-readable JSON.
//!
//! ## Structure
//!
//! ```text
//! Project
//! ├── meta: ProjectMetadata (version, estimator, job info, timestamps)
//! ├── settings: ProjectSettings (project rates, engine tuning)
//! └── lines: Vec<LineItem> (the takeoff, in sequence order)
//! ```
//!
//! Company-wide rates live in a separate [`CompanySettings`] file shared by
//! every project; both levels reach the pricing code through a
//! [`SettingsProvider`].
//!
//! ## Example
//!
//! ```rust
//! use takeoff_core::project::Project;
//!
//! let project = Project::new("Dana Estimator", "25-118", "Riverside Clinic");
//! let json = serde_json::to_string_pretty(&project).unwrap();
//! assert!(json.contains("25-118"));
//! ```

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::line::LineItem;
use crate::rates::RateSettings;

/// Current schema version for .tko files
pub const SCHEMA_VERSION: &str = "0.1.0";

/// Root project container, serialized to `.tko` files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    /// Project metadata (version, estimator, job info)
    pub meta: ProjectMetadata,

    /// Project-level rates and engine settings
    #[serde(default)]
    pub settings: ProjectSettings,

    /// All line items, ordered by sequence
    #[serde(default)]
    pub lines: Vec<LineItem>,
}

impl Project {
    /// Create a new empty project.
    ///
    /// # Example
    ///
    /// ```rust
    /// use takeoff_core::project::Project;
    ///
    /// let project = Project::new("Dana Estimator", "25-118", "Riverside Clinic");
    /// assert_eq!(project.meta.estimator, "Dana Estimator");
    /// assert!(project.lines.is_empty());
    /// ```
    pub fn new(estimator: impl Into<String>, job_id: impl Into<String>, client: impl Into<String>) -> Self {
        let now = Utc::now();
        Project {
            meta: ProjectMetadata {
                version: SCHEMA_VERSION.to_string(),
                estimator: estimator.into(),
                job_id: job_id.into(),
                client: client.into(),
                created: now,
                modified: now,
            },
            settings: ProjectSettings::default(),
            lines: Vec::new(),
        }
    }

    /// Get a line by ID
    pub fn line(&self, id: &Uuid) -> Option<&LineItem> {
        self.lines.iter().find(|l| l.id == *id)
    }

    /// Update the modified timestamp
    pub fn touch(&mut self) {
        self.meta.modified = Utc::now();
    }

    /// Get the number of line items (Void included)
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }
}

impl Default for Project {
    fn default() -> Self {
        Project::new("", "", "")
    }
}

/// Project metadata stored in the file header.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectMetadata {
    /// Schema version (for migration compatibility)
    pub version: String,

    /// Name of the responsible estimator
    pub estimator: String,

    /// Job/bid number
    pub job_id: String,

    /// Client name
    pub client: String,

    /// When the project was created
    pub created: DateTime<Utc>,

    /// When the project was last modified
    pub modified: DateTime<Utc>,
}

/// Settings stored inside the project file.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectSettings {
    /// Project rates; anything unset falls back to company rates
    pub rates: RateSettings,
    pub engine: EngineSettings,
}

/// Engine tuning knobs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Quiet period after the last edit before a save is issued
    pub save_debounce_ms: u64,

    /// Maximum undo steps kept
    pub history_capacity: usize,

    /// Stock length multiple for lines with stock rounding on, feet
    pub stock_length_increment_ft: f64,
}

impl EngineSettings {
    pub fn save_debounce(&self) -> Duration {
        Duration::from_millis(self.save_debounce_ms)
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        EngineSettings {
            save_debounce_ms: 500,
            history_capacity: crate::history::DEFAULT_CAPACITY,
            stock_length_increment_ft: 1.0,
        }
    }
}

/// Company-wide settings, kept in their own file.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CompanySettings {
    pub company_name: String,
    pub rates: RateSettings,
}

/// Read-only source of company and project settings.
pub trait SettingsProvider {
    fn company(&self) -> &CompanySettings;
    fn project(&self) -> &ProjectSettings;
}

/// Settings held in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticSettings {
    pub company: CompanySettings,
    pub project: ProjectSettings,
}

impl StaticSettings {
    pub fn new(company: CompanySettings, project: ProjectSettings) -> Self {
        StaticSettings { company, project }
    }
}

impl SettingsProvider for StaticSettings {
    fn company(&self) -> &CompanySettings {
        &self.company
    }

    fn project(&self) -> &ProjectSettings {
        &self.project
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_creation() {
        let project = Project::new("Dana Estimator", "25-118", "Riverside Clinic");
        assert_eq!(project.meta.estimator, "Dana Estimator");
        assert_eq!(project.meta.job_id, "25-118");
        assert_eq!(project.meta.client, "Riverside Clinic");
        assert_eq!(project.meta.version, SCHEMA_VERSION);
        assert_eq!(project.settings.engine, EngineSettings::default());
    }

    #[test]
    fn test_project_serialization() {
        let mut project = Project::new("Dana Estimator", "25-118", "Test Client");
        project.lines.push(LineItem::new(1));
        project.settings.rates.material_rates.insert("A992".to_string(), 0.91);
        let json = serde_json::to_string_pretty(&project).unwrap();

        assert!(json.contains("Dana Estimator"));
        assert!(json.contains("A992"));

        let roundtrip: Project = serde_json::from_str(&json).unwrap();
        assert_eq!(roundtrip.lines.len(), 1);
        assert_eq!(roundtrip.settings, project.settings);
        assert!(roundtrip.line(&project.lines[0].id).is_some());
    }

    #[test]
    fn test_engine_defaults() {
        let engine = EngineSettings::default();
        assert_eq!(engine.save_debounce(), Duration::from_millis(500));
        assert_eq!(engine.history_capacity, crate::history::DEFAULT_CAPACITY);
        assert_eq!(engine.history_capacity, 100);
        assert_eq!(engine.stock_length_increment_ft, 1.0);

        // Older files without an engine block still load
        let settings: ProjectSettings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings.engine, engine);
    }

    #[test]
    fn test_static_provider() {
        let mut company = CompanySettings::default();
        company.company_name = "Northside Steel".to_string();
        let provider = StaticSettings::new(company, ProjectSettings::default());
        assert_eq!(provider.company().company_name, "Northside Steel");
        assert_eq!(provider.project().engine.history_capacity, 100);
    }
}
