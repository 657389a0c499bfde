use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use shared_logging::LogLevel;

use crate::{
    features::FeatureTables, growth::GrowthSettings, models::ModelSettings,
    scoring::ScoringTables, telemetry::IntelTelemetry,
};

/// Log output settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// JSON-lines log file; no file sink when absent.
    pub path: Option<PathBuf>,
    /// Records below this level are dropped.
    pub min_level: LogLevel,
}

impl LoggingSettings {
    /// Builds a telemetry handle for `module`.
    pub fn telemetry(&self, module: &str) -> Result<IntelTelemetry> {
        let mut builder = IntelTelemetry::builder(module).min_level(self.min_level);
        if let Some(path) = &self.path {
            builder = builder.log_path(path);
        }
        builder.build()
    }
}

/// Engine configuration, one section per component.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntelConfig {
    /// Model bank and training.
    pub models: ModelSettings,
    /// Classification tables.
    pub scoring: ScoringTables,
    /// Feature extraction tables.
    pub features: FeatureTables,
    /// Growth analysis.
    pub growth: GrowthSettings,
    /// Logging.
    pub logging: LoggingSettings,
}

/// Partial configuration as read from a file. Absent sections keep their
/// current values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntelConfigOverlay {
    /// `[models]` overrides.
    #[serde(default)]
    pub models: Option<Value>,
    /// `[scoring]` overrides.
    #[serde(default)]
    pub scoring: Option<Value>,
    /// `[features]` overrides.
    #[serde(default)]
    pub features: Option<Value>,
    /// `[growth]` overrides.
    #[serde(default)]
    pub growth: Option<Value>,
    /// `[logging]` overrides.
    #[serde(default)]
    pub logging: Option<Value>,
}

impl IntelConfigOverlay {
    /// Parses an overlay from TOML text.
    pub fn from_toml(raw: &str) -> Result<Self> {
        toml::from_str(raw).context("parsing configuration overlay")
    }
}

impl IntelConfig {
    /// Loads the defaults overlaid with the TOML file at `path`. Relative
    /// paths inside the file resolve against its directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let overlay = IntelConfigOverlay::from_toml(&raw)
            .with_context(|| format!("parsing {}", path.display()))?;
        let mut config = Self::default()
            .merge(overlay)
            .with_context(|| format!("applying {}", path.display()))?;
        let base = path
            .parent()
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        if config.models.model_dir.is_relative() {
            config.models.model_dir = base.join(&config.models.model_dir);
        }
        if let Some(log) = config.logging.path.as_mut() {
            if log.is_relative() {
                *log = base.join(&*log);
            }
        }
        Ok(config)
    }

    /// Applies an overlay. Tables merge key by key, lists and scalars are
    /// replaced. Fails when an override does not fit its section.
    pub fn merge(self, overlay: IntelConfigOverlay) -> Result<Self> {
        Ok(Self {
            models: merge_section("models", self.models, overlay.models)?,
            scoring: merge_section("scoring", self.scoring, overlay.scoring)?,
            features: merge_section("features", self.features, overlay.features)?,
            growth: merge_section("growth", self.growth, overlay.growth)?,
            logging: merge_section("logging", self.logging, overlay.logging)?,
        })
    }
}

fn merge_section<T>(name: &str, base: T, overlay: Option<Value>) -> Result<T>
where
    T: Serialize + DeserializeOwned,
{
    let Some(overlay) = overlay else {
        return Ok(base);
    };
    let mut value = serde_json::to_value(&base).with_context(|| format!("encoding [{name}]"))?;
    merge_value(&mut value, overlay);
    serde_json::from_value(value).with_context(|| format!("invalid [{name}] section"))
}

fn merge_value(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(slot) => merge_value(slot, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (slot, overlay) => *slot = overlay,
    }
}
