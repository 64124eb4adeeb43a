//! Config loading, layering, and validation.

use super::model::Config;
use super::types::Overrides;
use crate::acquire::AcquireOptions;
use crate::entry::sanitize_field;
use crate::error::{LockError, Result};
use std::path::Path;
use std::time::Duration;

impl Config {
    /// Load config from a YAML file.
    ///
    /// Unknown fields in the YAML are silently ignored for forward compatibility.
    ///
    /// # Returns
    ///
    /// * `Ok(Config)` - Successfully loaded and validated config
    /// * `Err(LockError::Config)` - Read error, parse error, or validation failure
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path).map_err(|e| {
            LockError::Config(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        Self::from_yaml(&content)
    }

    /// Parse config from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        // An empty document is not a mapping, treat it as "all defaults"
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = serde_yaml::from_str(yaml)
            .map_err(|e| LockError::Config(format!("failed to parse config YAML: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Serialize config to YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self)
            .map_err(|e| LockError::Config(format!("failed to serialize config to YAML: {}", e)))
    }

    /// Build the effective config: defaults, then the optional file, then
    /// command-line overrides.
    pub fn resolve(file: Option<&Path>, overrides: &Overrides) -> Result<Self> {
        let base = match file {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };

        let config = base.with_overrides(overrides);
        config.validate()?;
        Ok(config)
    }

    /// Apply command-line overrides. Blank strings count as "not given".
    pub fn with_overrides(mut self, overrides: &Overrides) -> Self {
        if let Some(dir) = &overrides.dir
            && !dir.as_os_str().is_empty()
        {
            self.dir = dir.clone();
        }
        if let Some(name) = &overrides.name
            && !name.trim().is_empty()
        {
            self.name = name.trim().to_string();
        }
        if let Some(secs) = overrides.poll_interval_secs {
            self.poll_interval_secs = secs;
        }
        if let Some(secs) = overrides.max_wait_secs {
            self.max_wait_secs = secs;
        }
        if overrides.no_verify {
            self.verify_after_create = false;
        }
        self
    }

    /// Validate config values and return error on invalid values.
    ///
    /// Validation rules:
    /// - `dir` must be non-empty
    /// - `name` must keep at least one character after normalization
    /// - `poll_interval_secs` must be positive
    pub fn validate(&self) -> Result<()> {
        if self.dir.as_os_str().is_empty() {
            return Err(LockError::Config("dir must not be empty".to_string()));
        }

        if sanitize_field(&self.name).is_empty() {
            return Err(LockError::Config(format!(
                "name '{}' is empty after normalization",
                self.name
            )));
        }

        if self.poll_interval_secs == 0 {
            return Err(LockError::Config(
                "poll_interval_secs must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Normalized lock name, as it appears in entry file names.
    pub fn normalized_name(&self) -> String {
        sanitize_field(&self.name)
    }

    /// Protocol options for this config.
    pub fn acquire_options(&self) -> AcquireOptions {
        AcquireOptions::new(self.dir.clone(), self.normalized_name())
            .with_poll_interval(Duration::from_secs(self.poll_interval_secs))
            .with_max_wait(Duration::from_secs(self.max_wait_secs))
            .with_verify_after_create(self.verify_after_create)
    }
}
