// Configuration module - handles exporter settings
//
// This module is responsible for:
// 1. Loading exporter settings from an optional JSON file
// 2. Filling in defaults for anything the file leaves out
// 3. Validating the result
// 4. Providing strongly-typed access to settings

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::metrics::DEFAULT_NAMESPACE;

/// Upper bound for `sink_capacity`; a full attribute table is a few hundred points
pub const MAX_SINK_CAPACITY: usize = 1_000_000;

/// Errors that can occur during configuration loading
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read settings file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid settings format: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid settings: {0}")]
    InvalidSettings(String),
}

/// Exporter settings
///
/// # Example settings file
/// ```json
/// {
///   "namespace": "smartctl",
///   "sink_capacity": 2000,
///   "max_parallel": 4,
///   "extractors": {
///     "statistics": { "enabled": false }
///   }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExporterSettings {
    /// Prefix of every metric name
    pub namespace: String,

    /// Capacity of the sink handed to each per-device collector.
    /// Must hold a full attribute table (hundreds of points).
    pub sink_capacity: usize,

    /// Maximum number of devices collected concurrently
    pub max_parallel: usize,

    /// Per-extractor settings, keyed by extractor name.
    /// Extractors not listed are enabled.
    pub extractors: HashMap<String, ExtractorSettings>,
}

/// Settings for an individual extractor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractorSettings {
    pub enabled: bool,
}

impl Default for ExporterSettings {
    fn default() -> Self {
        ExporterSettings {
            namespace: DEFAULT_NAMESPACE.to_string(),
            sink_capacity: 1000,
            max_parallel: num_cpus::get(),
            extractors: HashMap::new(),
        }
    }
}

impl ExporterSettings {
    /// Whether the named extractor should run
    pub fn is_extractor_enabled(&self, name: &str) -> bool {
        self.extractors.get(name).map(|e| e.enabled).unwrap_or(true)
    }

    pub fn disable_extractor(&mut self, name: &str) {
        self.extractors
            .insert(name.to_string(), ExtractorSettings { enabled: false });
    }

    /// Checks the values a scrape cannot work without
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.namespace.is_empty() {
            return Err(ConfigError::InvalidSettings("namespace must not be empty".to_string()));
        }
        if !self
            .namespace
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(ConfigError::InvalidSettings(format!(
                "namespace {:?} may only contain [A-Za-z0-9_]",
                self.namespace
            )));
        }
        if self.sink_capacity == 0 {
            return Err(ConfigError::InvalidSettings("sink_capacity must be at least 1".to_string()));
        }
        if self.sink_capacity > MAX_SINK_CAPACITY {
            return Err(ConfigError::InvalidSettings(format!(
                "sink_capacity must be at most {}",
                MAX_SINK_CAPACITY
            )));
        }
        if self.max_parallel == 0 {
            return Err(ConfigError::InvalidSettings("max_parallel must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// Loads exporter settings
pub struct ConfigManager;

impl ConfigManager {
    /// Parses and validates settings from JSON text
    pub fn parse(text: &str) -> Result<ExporterSettings, ConfigError> {
        let settings: ExporterSettings = serde_json::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reads settings from `path`, or returns the defaults when no path is given
    pub async fn load(path: Option<&Path>) -> Result<ExporterSettings, ConfigError> {
        let Some(path) = path else {
            info!("No settings file given, using defaults");
            return Ok(ExporterSettings::default());
        };

        info!("Loading exporter settings from {}", path.display());

        let text = tokio::fs::read_to_string(path).await.map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let settings = Self::parse(&text).map_err(|e| {
            warn!("Rejected settings file {}: {}", path.display(), e);
            e
        })?;

        info!(
            "Loaded settings: namespace '{}', sink capacity {}, {} parallel collector(s)",
            settings.namespace, settings.sink_capacity, settings.max_parallel
        );
        for (name, extractor) in &settings.extractors {
            info!("  extractor '{}' enabled: {}", name, extractor.enabled);
        }

        Ok(settings)
    }
}
