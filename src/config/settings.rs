use super::types::PipelineSettings;
use crate::{PipelineError, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Settings file looked up in the working directory when none is given
pub const DEFAULT_SETTINGS_FILE: &str = "evtrust.yaml";

/// Command-line values that take precedence over the settings file
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub ev_config: Option<PathBuf>,
    pub roots_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub asset_input_dir: Option<PathBuf>,
    pub staging_dir: Option<PathBuf>,
}

impl PipelineSettings {
    /// Load settings from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            PipelineError::Config(format!(
                "Failed to read settings file {}: {}",
                path.display(),
                e
            ))
        })?;

        let settings: PipelineSettings = serde_yaml_ng::from_str(&contents).map_err(|e| {
            PipelineError::Config(format!(
                "Failed to parse settings file {}: {}",
                path.display(),
                e
            ))
        })?;

        settings.validate()?;
        debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Resolve the settings for a run: explicit file, else `evtrust.yaml` in
    /// `working_dir` if present, else defaults. Overrides are applied last.
    pub fn resolve(
        explicit: Option<&Path>,
        working_dir: &Path,
        overrides: &SettingsOverrides,
    ) -> Result<Self> {
        let mut settings = match explicit {
            Some(path) => Self::load(path)?,
            None => {
                let candidate = working_dir.join(DEFAULT_SETTINGS_FILE);
                if candidate.exists() {
                    Self::load(candidate)?
                } else {
                    Self::default()
                }
            }
        };

        settings.apply(overrides);
        settings.validate()?;
        Ok(settings)
    }

    pub fn apply(&mut self, overrides: &SettingsOverrides) {
        if let Some(path) = &overrides.ev_config {
            self.ev_config = path.clone();
        }
        if let Some(path) = &overrides.roots_dir {
            self.roots_dir = path.clone();
        }
        if let Some(path) = &overrides.output_dir {
            self.output_dir = path.clone();
        }
        if let Some(path) = &overrides.asset_input_dir {
            self.asset.input_dir = path.clone();
        }
        if let Some(path) = &overrides.staging_dir {
            self.asset.staging_dir = path.clone();
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.tools.timeout_seconds == 0 {
            return Err(PipelineError::Config(
                "tools.timeout_seconds must be greater than zero".to_string(),
            ));
        }
        if self.keychain.name.trim().is_empty() {
            return Err(PipelineError::Config("keychain.name is empty".to_string()));
        }
        if self.database.name.trim().is_empty() {
            return Err(PipelineError::Config("database.name is empty".to_string()));
        }
        if self.asset.collection.trim().is_empty() || self.asset.asset_type.trim().is_empty() {
            return Err(PipelineError::Config(
                "asset.collection and asset.asset_type must be set".to_string(),
            ));
        }
        Ok(())
    }
}
