//! Engine facade: one instance of every component behind the public
//! operations used by the orchestration layer.

use std::collections::BTreeMap;

use anyhow::Result;
use parking_lot::RwLock;
use serde_json::json;
use shared_logging::LogLevel;

use crate::{
    asset::Asset,
    config::IntelConfig,
    error::ModelError,
    features::{Extraction, FeatureExtractor},
    growth::{
        forecast::GrowthForecast, hotspot::Hotspot, GrowthPatternAnalyzer, GrowthPatterns,
        PatternKey,
    },
    models::{AnomalyPrediction, GrowthPrediction, ModelBank, ThreatPrediction},
    scoring::{ClassificationResult, GeospatialScorer},
    telemetry::{emit, IntelTelemetry},
    training::{TrainingOrchestrator, TrainingSummary},
};

/// Scoring, prediction, training and growth analysis behind one handle.
///
/// Prediction and classification take `&self` and may run concurrently;
/// training takes the bank's write lock for the duration of the run.
#[derive(Debug)]
pub struct GarudaEngine {
    config: IntelConfig,
    telemetry: IntelTelemetry,
    extractor: FeatureExtractor,
    scorer: GeospatialScorer,
    bank: RwLock<ModelBank>,
    orchestrator: TrainingOrchestrator,
    analyzer: GrowthPatternAnalyzer,
    last_patterns: RwLock<Option<GrowthPatterns>>,
}

impl GarudaEngine {
    /// Builds the engine, creating telemetry from the logging section.
    pub fn new(config: IntelConfig) -> Result<Self> {
        let telemetry = config.logging.telemetry("garuda")?;
        Ok(Self::with_telemetry(config, telemetry))
    }

    /// Builds the engine around an existing telemetry handle.
    #[must_use]
    pub fn with_telemetry(config: IntelConfig, telemetry: IntelTelemetry) -> Self {
        let extractor =
            FeatureExtractor::new(config.features.clone()).with_telemetry(telemetry.clone());
        let scorer = GeospatialScorer::new(config.scoring.clone()).with_telemetry(telemetry.clone());
        let bank = ModelBank::with_telemetry(
            config.models.clone(),
            &config.features,
            telemetry.clone(),
        );
        let orchestrator = TrainingOrchestrator::new(extractor.clone(), config.models.clone())
            .with_telemetry(telemetry.clone());
        let analyzer =
            GrowthPatternAnalyzer::new(config.growth.clone()).with_telemetry(telemetry.clone());
        emit(
            Some(&telemetry),
            LogLevel::Info,
            "engine_ready",
            json!({ "backend": bank.backend(), "model_dir": bank.model_dir() }),
        );
        Self {
            config,
            telemetry,
            extractor,
            scorer,
            bank: RwLock::new(bank),
            orchestrator,
            analyzer,
            last_patterns: RwLock::new(None),
        }
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &IntelConfig {
        &self.config
    }

    /// Root telemetry handle.
    #[must_use]
    pub const fn telemetry(&self) -> &IntelTelemetry {
        &self.telemetry
    }

    /// Classifies one asset.
    #[must_use]
    pub fn classify(&self, asset: &Asset) -> ClassificationResult {
        self.scorer.classify_asset(asset)
    }

    /// Classifies a batch in parallel, preserving input order.
    #[must_use]
    pub fn classify_batch(&self, assets: &[Asset]) -> Vec<ClassificationResult> {
        self.scorer.classify_batch(assets)
    }

    /// Classifies a batch and writes each computed priority back onto its
    /// asset.
    pub fn annotate_priorities(&self, assets: &mut [Asset]) -> Vec<ClassificationResult> {
        let results = self.classify_batch(assets);
        for (asset, result) in assets.iter_mut().zip(&results) {
            asset.priority = Some(result.priority);
        }
        results
    }

    /// Feature vector of one asset.
    #[must_use]
    pub fn extract(&self, asset: &Asset) -> Extraction {
        self.extractor.extract(asset)
    }

    /// Trains every model on `assets`, persists them and writes the summary.
    pub fn train_all(&self, assets: &[Asset]) -> TrainingSummary {
        let mut bank = self.bank.write();
        self.orchestrator.train_all(&mut bank, assets)
    }

    /// Loads persisted model state. Returns the number of units loaded.
    pub fn load_models(&self) -> Result<usize, ModelError> {
        self.bank.write().load()
    }

    /// Predicted annual growth rate of an asset.
    #[must_use]
    pub fn predict_growth(&self, asset: &Asset) -> GrowthPrediction {
        let extraction = self.extract(asset);
        self.bank.read().predict_growth(&extraction.vector)
    }

    /// Predicted threat of an asset.
    #[must_use]
    pub fn predict_threat(&self, asset: &Asset) -> ThreatPrediction {
        let extraction = self.extract(asset);
        self.bank.read().predict_threat(&extraction.vector)
    }

    /// Anomaly verdict for an asset.
    #[must_use]
    pub fn detect_anomaly(&self, asset: &Asset) -> AnomalyPrediction {
        let extraction = self.extract(asset);
        self.bank.read().detect_anomaly(&extraction.vector)
    }

    /// Rebuilds growth patterns from `assets` and keeps them for hotspot
    /// ranking and the report.
    pub fn analyze_growth_patterns(&self, assets: &[Asset]) -> GrowthPatterns {
        let patterns = self.analyzer.analyze(assets);
        *self.last_patterns.write() = Some(patterns.clone());
        patterns
    }

    /// Forecasts every pattern. `None` uses the configured horizon.
    #[must_use]
    pub fn forecast(
        &self,
        patterns: &GrowthPatterns,
        horizon_months: Option<u32>,
    ) -> BTreeMap<PatternKey, GrowthForecast> {
        let horizon =
            horizon_months.unwrap_or(self.analyzer.settings().default_horizon_months);
        patterns.forecast_all(horizon)
    }

    /// Top hotspots of the last analysis, empty before any analysis. `None`
    /// uses the configured limit.
    #[must_use]
    pub fn top_hotspots(&self, limit: Option<usize>) -> Vec<Hotspot> {
        let limit = limit.unwrap_or(self.analyzer.settings().hotspot_limit);
        self.last_patterns
            .read()
            .as_ref()
            .map(|patterns| patterns.top_hotspots(limit))
            .unwrap_or_default()
    }

    /// Text report of the last analysis.
    #[must_use]
    pub fn growth_report(&self) -> String {
        self.last_patterns.read().as_ref().map_or_else(
            || "No growth patterns analyzed yet. Run a growth analysis first.".to_string(),
            GrowthPatterns::report,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        asset::{AssetType, Priority},
        growth::region::Region,
        models::{BackendPreference, PredictionMethod},
        scoring::ThreatLevel,
    };
    use shared_logging::MemoryLogger;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn build_engine(dir: &std::path::Path, backend: BackendPreference) -> (GarudaEngine, Arc<MemoryLogger>) {
        let mut config = IntelConfig::default();
        config.models.model_dir = dir.join("models");
        config.models.backend = backend;
        let memory = Arc::new(MemoryLogger::new());
        let telemetry = IntelTelemetry::builder("garuda")
            .sink(memory.clone())
            .build()
            .unwrap();
        (GarudaEngine::with_telemetry(config, telemetry), memory)
    }

    fn fleet() -> Vec<Asset> {
        let mut assets: Vec<Asset> = (0..12_u32)
            .map(|idx| {
                Asset::new(format!("Delhi Flyover {idx}"), AssetType::Bridge)
                    .with_location(0.01_f64.mul_add(f64::from(idx), 28.55), 77.2)
                    .with_area(20_000.0)
            })
            .collect();
        assets.push(
            Asset::new("Chennai International Airport", AssetType::Airport)
                .with_location(12.99, 80.17)
                .with_area(2_500_000.0),
        );
        assets.push(
            Asset::new("Attari Power Station", AssetType::PowerInfrastructure)
                .with_location(31.60, 74.60)
                .with_priority(Priority::High),
        );
        assets
    }

    #[test]
    fn engine_from_default_config_starts() {
        let dir = tempdir().unwrap();
        let mut config = IntelConfig::default();
        config.models.model_dir = dir.path().join("models");
        config.logging.path = Some(dir.path().join("intel.jsonl"));
        let engine = GarudaEngine::new(config).unwrap();
        assert_eq!(engine.telemetry().module(), "garuda");
        let raw = std::fs::read_to_string(dir.path().join("intel.jsonl")).unwrap();
        assert!(raw.contains("engine_ready"));
    }

    #[test]
    fn engine_starts_when_a_log_sink_fails() {
        struct ClosedSink;

        impl shared_logging::LogSink for ClosedSink {
            fn write(&self, _record: &shared_logging::LogRecord) -> Result<()> {
                anyhow::bail!("closed")
            }
        }

        let memory = Arc::new(MemoryLogger::new());
        let telemetry = IntelTelemetry::builder("garuda")
            .sink(Arc::new(ClosedSink))
            .sink(memory.clone())
            .build()
            .unwrap();
        let engine = GarudaEngine::with_telemetry(IntelConfig::default(), telemetry);
        assert!(memory.contains("engine_ready"));
        assert_eq!(engine.telemetry().module(), "garuda");
    }

    #[test]
    fn classification_matches_the_scorer_and_annotates() {
        let dir = tempdir().unwrap();
        let (engine, _) = build_engine(dir.path(), BackendPreference::Fallback);
        let mut assets = fleet();
        let single = engine.classify(&assets[12]);
        let results = engine.annotate_priorities(&mut assets);
        assert_eq!(results.len(), assets.len());
        assert_eq!(results[12], single);
        assert!(assets.iter().all(|asset| asset.priority.is_some()));
        assert_eq!(assets[12].priority, Some(single.priority));
        assert_ne!(single.threat_level, ThreatLevel::Low);
    }

    #[test]
    fn predictions_fall_back_before_training() {
        let dir = tempdir().unwrap();
        let (engine, memory) = build_engine(dir.path(), BackendPreference::Auto);
        let asset = Asset::new("Unplaced Depot", AssetType::Bridge);
        let growth = engine.predict_growth(&asset);
        assert_eq!(growth.method, PredictionMethod::Formula);
        assert!(growth.rate >= 0.0);
        let threat = engine.predict_threat(&asset);
        assert!((0.0..=1.0).contains(&threat.score));
        assert!(!engine.detect_anomaly(&asset).is_anomaly);
        assert!(memory.contains("feature_extraction_defaulted"));
    }

    #[test]
    fn train_then_reload_from_a_fresh_engine() {
        let dir = tempdir().unwrap();
        let (engine, _) = build_engine(dir.path(), BackendPreference::Auto);
        let summary = engine.train_all(&fleet());
        assert_eq!(summary.samples_trained, 14);
        assert!(dir.path().join("models").join("training_summary.json").exists());

        let (fresh, _) = build_engine(dir.path(), BackendPreference::Auto);
        let loaded = fresh.load_models().unwrap();
        if summary.trainable_backend {
            assert!(loaded >= 1);
        } else {
            assert_eq!(loaded, 0);
        }
    }

    #[test]
    fn empty_training_is_harmless() {
        let dir = tempdir().unwrap();
        let (engine, _) = build_engine(dir.path(), BackendPreference::Auto);
        let summary = engine.train_all(&[]);
        assert_eq!(summary.samples_trained, 0);
        assert!(summary.error.is_none());
    }

    #[test]
    fn growth_analysis_feeds_hotspots_and_report() {
        let dir = tempdir().unwrap();
        let (engine, _) = build_engine(dir.path(), BackendPreference::Fallback);
        assert!(engine.top_hotspots(None).is_empty());
        assert!(engine.growth_report().starts_with("No growth patterns"));

        let patterns = engine.analyze_growth_patterns(&fleet());
        assert_eq!(patterns.len(), 3);
        let key = PatternKey::new(AssetType::Bridge, Region::NorthDelhiNcr);
        assert_eq!(patterns.get(&key).unwrap().total_assets, 12);

        let forecasts = engine.forecast(&patterns, None);
        assert_eq!(forecasts[&key].monthly_counts.len(), 12);
        assert_eq!(engine.forecast(&patterns, Some(3))[&key].monthly_counts.len(), 3);

        let hotspots = engine.top_hotspots(Some(2));
        assert_eq!(hotspots.len(), 2);
        assert_eq!(hotspots[0].key(), key);
        assert!(engine.growth_report().contains("TOP GROWTH HOTSPOTS:"));
    }
}
