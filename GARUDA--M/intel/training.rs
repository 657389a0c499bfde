//! Batch training: extraction, synthetic labels, the three units, and a
//! persisted summary.

use std::{fs, path::Path};

use anyhow::Context;
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::json;
use shared_logging::LogLevel;
use uuid::Uuid;

use crate::{
    asset::Asset,
    error::TrainingError,
    features::{Extraction, FeatureExtractor, FeatureVector},
    models::{
        reporter::{AnomalyMetrics, RegressionMetrics},
        simulate::TargetSimulator,
        Backend, ModelBank, ModelKind, ModelSettings,
    },
    telemetry::{emit, IntelTelemetry},
};

/// File written next to the model state after every run.
pub const SUMMARY_FILE: &str = "training_summary.json";

/// Outcome of one training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSummary {
    /// Run identifier.
    pub run_id: Uuid,
    /// Completion time.
    pub training_completed: DateTime<Utc>,
    /// Rows the units were fitted on.
    pub samples_trained: usize,
    /// Assets left out because their features were defaulted.
    #[serde(default)]
    pub skipped_assets: usize,
    /// Growth regressor metrics.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub growth_model: Option<RegressionMetrics>,
    /// Threat regressor metrics.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threat_model: Option<RegressionMetrics>,
    /// Anomaly detector metrics.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anomaly_model: Option<AnomalyMetrics>,
    /// True when the trainable backend was in use.
    pub trainable_backend: bool,
    /// Set when the whole batch failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TrainingSummary {
    fn failed(run_id: Uuid, backend: Backend, err: &TrainingError) -> Self {
        Self {
            run_id,
            training_completed: Utc::now(),
            samples_trained: 0,
            skipped_assets: 0,
            growth_model: None,
            threat_model: None,
            anomaly_model: None,
            trainable_backend: backend == Backend::Trainable,
            error: Some(err.to_string()),
        }
    }

    /// True when the batch failed as a whole.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        self.error.is_some()
    }

    /// One line per unit, in the bank's log format.
    #[must_use]
    pub fn summary(&self) -> String {
        if let Some(error) = &self.error {
            return format!("[ML] run={} failed: {error}", self.run_id);
        }
        let mut lines = vec![format!(
            "[ML] run={} samples={} skipped={} trainable={}",
            self.run_id, self.samples_trained, self.skipped_assets, self.trainable_backend
        )];
        if let Some(metrics) = &self.growth_model {
            lines.push(metrics.summary(ModelKind::Growth.name()));
        }
        if let Some(metrics) = &self.threat_model {
            lines.push(metrics.summary(ModelKind::Threat.name()));
        }
        if let Some(metrics) = &self.anomaly_model {
            lines.push(metrics.summary());
        }
        lines.join("\n")
    }
}

/// Runs extraction, label simulation and fitting over a batch of assets.
#[derive(Debug, Clone)]
pub struct TrainingOrchestrator {
    extractor: FeatureExtractor,
    settings: ModelSettings,
    telemetry: Option<IntelTelemetry>,
}

impl TrainingOrchestrator {
    /// Creates an orchestrator. Label noise and seed come from `settings`.
    #[must_use]
    pub const fn new(extractor: FeatureExtractor, settings: ModelSettings) -> Self {
        Self {
            extractor,
            settings,
            telemetry: None,
        }
    }

    /// Attaches telemetry.
    #[must_use]
    pub fn with_telemetry(mut self, telemetry: IntelTelemetry) -> Self {
        self.telemetry = Some(telemetry.scoped("training"));
        self
    }

    /// Trains every unit of `bank`, persists fitted state and writes the
    /// summary file. Never panics; batch-level failures come back as an error
    /// summary with zero samples.
    pub fn train_all(&self, bank: &mut ModelBank, assets: &[Asset]) -> TrainingSummary {
        let run_id = Uuid::new_v4();
        self.log(
            LogLevel::Info,
            "training_started",
            json!({ "run_id": run_id, "assets": assets.len(), "backend": bank.backend() }),
        );
        let summary = match self.run(run_id, bank, assets) {
            Ok(summary) => {
                self.log(
                    LogLevel::Info,
                    "training_completed",
                    json!({
                        "run_id": run_id,
                        "samples": summary.samples_trained,
                        "skipped": summary.skipped_assets,
                    }),
                );
                summary
            }
            Err(err) => {
                self.log(
                    LogLevel::Error,
                    "training_failed",
                    json!({ "run_id": run_id, "error": err.to_string() }),
                );
                TrainingSummary::failed(run_id, bank.backend(), &err)
            }
        };
        if let Err(err) = write_summary(bank.model_dir(), &summary) {
            self.log(
                LogLevel::Warn,
                "training_summary_unwritten",
                json!({ "run_id": run_id, "error": err.to_string() }),
            );
        }
        summary
    }

    fn run(
        &self,
        run_id: Uuid,
        bank: &mut ModelBank,
        assets: &[Asset],
    ) -> Result<TrainingSummary, TrainingError> {
        let dir = bank.model_dir().to_path_buf();
        fs::create_dir_all(&dir).map_err(|source| TrainingError::ModelDir {
            path: dir.clone(),
            source,
        })?;

        let extractions: Vec<Extraction> = assets
            .par_iter()
            .map(|asset| self.extractor.extract(asset))
            .collect();

        let mut simulator = TargetSimulator::new(
            self.settings.simulation.clone(),
            self.settings.seed,
            self.settings.growth_noise_std,
            self.settings.threat_noise_std,
        );
        let mut features: Vec<FeatureVector> = Vec::with_capacity(assets.len());
        let mut growth_targets = Vec::with_capacity(assets.len());
        let mut threat_targets = Vec::with_capacity(assets.len());
        let mut skipped = 0;
        for (asset, extraction) in assets.iter().zip(&extractions) {
            if extraction.is_defaulted() {
                skipped += 1;
                continue;
            }
            let priority = asset.effective_priority();
            growth_targets.push(simulator.growth_rate(&asset.asset_type, priority));
            threat_targets.push(simulator.threat_score(priority, &extraction.vector));
            features.push(extraction.vector);
        }
        self.log(
            LogLevel::Debug,
            "training_data_prepared",
            json!({ "run_id": run_id, "samples": features.len(), "skipped": skipped }),
        );

        let growth = bank.train_regressor(ModelKind::Growth, &features, &growth_targets);
        let threat = bank.train_regressor(ModelKind::Threat, &features, &threat_targets);
        let anomaly = bank.train_anomaly(&features);
        bank.persist()?;

        Ok(TrainingSummary {
            run_id,
            training_completed: Utc::now(),
            samples_trained: features.len(),
            skipped_assets: skipped,
            growth_model: Some(growth),
            threat_model: Some(threat),
            anomaly_model: Some(anomaly),
            trainable_backend: bank.backend() == Backend::Trainable,
            error: None,
        })
    }

    fn log(&self, level: LogLevel, message: &str, metadata: serde_json::Value) {
        emit(self.telemetry.as_ref(), level, message, metadata);
    }
}

/// Writes `summary` as pretty JSON to `dir/training_summary.json`.
pub fn write_summary(dir: &Path, summary: &TrainingSummary) -> anyhow::Result<()> {
    let path = dir.join(SUMMARY_FILE);
    let body = serde_json::to_string_pretty(summary).context("encoding training summary")?;
    fs::write(&path, body).with_context(|| format!("writing {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        asset::{AssetType, Priority},
        features::FeatureTables,
        models::BackendPreference,
    };
    use shared_logging::MemoryLogger;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn setup(dir: &Path, backend: BackendPreference) -> (TrainingOrchestrator, ModelBank) {
        let settings = ModelSettings {
            model_dir: dir.to_path_buf(),
            backend,
            ..ModelSettings::default()
        };
        let tables = FeatureTables::default();
        let bank = ModelBank::new(settings.clone(), &tables);
        (
            TrainingOrchestrator::new(FeatureExtractor::new(tables), settings),
            bank,
        )
    }

    fn assets() -> Vec<Asset> {
        let kinds = [AssetType::Bridge, AssetType::Airport, AssetType::PowerInfrastructure];
        let priorities = [Priority::Low, Priority::Medium, Priority::High];
        (0..24_u32)
            .map(|idx| {
                let i = usize::try_from(idx).unwrap_or_default();
                Asset::new(format!("Asset {idx}"), kinds[i % 3].clone())
                    .with_location(
                        0.7_f64.mul_add(f64::from(idx), 12.0),
                        0.4_f64.mul_add(f64::from(idx), 73.0),
                    )
                    .with_area(5_000.0 + 1_000.0 * f64::from(idx))
                    .with_priority(priorities[i % 3])
            })
            .collect()
    }

    #[test]
    fn empty_batch_trains_nothing_without_panicking() {
        let dir = tempdir().unwrap();
        let (orchestrator, mut bank) = setup(dir.path(), BackendPreference::Auto);
        let summary = orchestrator.train_all(&mut bank, &[]);
        assert_eq!(summary.samples_trained, 0);
        assert!(!summary.is_failure());
        assert_eq!(summary.growth_model, Some(RegressionMetrics::SENTINEL));
        assert_eq!(summary.anomaly_model, Some(AnomalyMetrics::SENTINEL));
        assert!(dir.path().join(SUMMARY_FILE).exists());
    }

    #[test]
    fn defaulted_assets_are_skipped() {
        let dir = tempdir().unwrap();
        let (orchestrator, mut bank) = setup(dir.path(), BackendPreference::Fallback);
        let mut batch = assets();
        batch.push(Asset::new("Nowhere", AssetType::Bridge));
        batch.push(Asset::new("Bad Area", AssetType::Bridge).with_location(20.0, 78.0).with_area(-5.0));
        let summary = orchestrator.train_all(&mut bank, &batch);
        assert_eq!(summary.samples_trained, 24);
        assert_eq!(summary.skipped_assets, 2);
        assert!(!summary.trainable_backend);
        assert!(summary.summary().contains("samples=24 skipped=2"));
    }

    #[test]
    fn summary_file_records_metrics_and_backend() {
        let dir = tempdir().unwrap();
        let (orchestrator, mut bank) = setup(dir.path(), BackendPreference::Auto);
        let summary = orchestrator.train_all(&mut bank, &assets());
        let raw = fs::read_to_string(dir.path().join(SUMMARY_FILE)).unwrap();
        let stored: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(stored["samples_trained"], 24);
        assert_eq!(stored["run_id"], summary.run_id.to_string());
        assert!(stored["growth_model"]["mse"].is_number());
        assert!(stored["anomaly_model"]["anomaly_rate"].is_number());
        assert_eq!(stored["trainable_backend"], Backend::trainable_available());
        assert!(stored.get("error").is_none());
    }

    #[test]
    fn unusable_model_dir_yields_error_summary() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("blocked");
        fs::write(&blocker, b"not a directory").unwrap();
        let memory = Arc::new(MemoryLogger::new());
        let telemetry = IntelTelemetry::builder("garuda")
            .sink(memory.clone())
            .build()
            .unwrap();
        let (orchestrator, mut bank) = setup(&blocker, BackendPreference::Auto);
        let orchestrator = orchestrator.with_telemetry(telemetry);
        let summary = orchestrator.train_all(&mut bank, &assets());
        assert!(summary.is_failure());
        assert_eq!(summary.samples_trained, 0);
        assert!(summary.growth_model.is_none());
        assert!(memory.contains("training_failed"));
        assert!(memory.contains("training_summary_unwritten"));
    }

    #[cfg(feature = "trainable")]
    #[test]
    fn trained_units_answer_after_a_run() {
        let dir = tempdir().unwrap();
        let (orchestrator, mut bank) = setup(dir.path(), BackendPreference::Trainable);
        let batch = assets();
        let summary = orchestrator.train_all(&mut bank, &batch);
        assert!(summary.trainable_backend);
        assert!(bank.is_trained(ModelKind::Growth));
        assert!(bank.is_trained(ModelKind::Anomaly));
        assert!(dir.path().join("growth_predictor.json").exists());
        let extraction = FeatureExtractor::default().extract(&batch[4]);
        let growth = bank.predict_growth(&extraction.vector);
        assert!(growth.rate >= 0.0);
    }
}
