//! Predictive model bank: growth and threat regressors plus an anomaly
//! detector, each with a formula fallback.

/// Trainable anomaly detector.
#[cfg(feature = "trainable")]
pub mod anomaly;
/// Deterministic formula fallback.
pub mod formula;
/// Split and metric helpers.
pub mod func;
/// Trainable linear regressor.
#[cfg(feature = "trainable")]
pub mod linear;
/// Training metric reports.
pub mod reporter;
/// Feature standardization.
#[cfg(feature = "trainable")]
pub mod scaler;
/// Synthetic label generation.
pub mod simulate;

use std::{
    fmt, fs,
    path::{Path, PathBuf},
};

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::json;
use shared_logging::LogLevel;

use crate::{
    error::ModelError,
    features::{FeatureTables, FeatureVector},
    scoring::ThreatLevel,
    telemetry::{emit, IntelTelemetry},
};
use formula::FormulaModel;
use func::{mean_squared_error, r2_score, train_test_split};
use reporter::{AnomalyMetrics, RegressionMetrics};
use simulate::SimulationTables;

/// Confidence attached to growth predictions.
pub const GROWTH_CONFIDENCE: f64 = 0.85;
/// Confidence attached to threat predictions.
pub const THREAT_CONFIDENCE: f64 = 0.75;

/// The three model units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    /// Growth-rate regressor.
    Growth,
    /// Threat-score regressor.
    Threat,
    /// Anomaly detector.
    Anomaly,
}

impl ModelKind {
    /// File stem used when persisting.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Growth => "growth_predictor",
            Self::Threat => "threat_predictor",
            Self::Anomaly => "anomaly_detector",
        }
    }

    /// Valid output range. Anomaly outputs are decision scores, negative for
    /// outliers.
    #[must_use]
    pub const fn bounds(self) -> (f64, f64) {
        match self {
            Self::Growth => (0.0, f64::INFINITY),
            Self::Threat => (0.0, 1.0),
            Self::Anomaly => (-1.0, 1.0),
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which path produced a prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionMethod {
    /// Fitted trainable model.
    Trained,
    /// Deterministic formula.
    Formula,
}

/// Model backend compiled into the bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    /// Scaler plus gradient-descent regressors and z-score detector.
    Trainable,
    /// Formula units only.
    Fallback,
}

/// Requested backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendPreference {
    /// Trainable when compiled in.
    #[default]
    Auto,
    /// Trainable; downgraded with a warning when unavailable.
    Trainable,
    /// Formula units only.
    Fallback,
}

impl Backend {
    /// True when the `trainable` feature is enabled.
    #[must_use]
    pub const fn trainable_available() -> bool {
        cfg!(feature = "trainable")
    }

    /// Resolves a preference. Forcing `trainable` without the feature is an error.
    pub const fn resolve(preference: BackendPreference) -> Result<Self, ModelError> {
        match preference {
            BackendPreference::Fallback => Ok(Self::Fallback),
            BackendPreference::Auto if Self::trainable_available() => Ok(Self::Trainable),
            BackendPreference::Auto => Ok(Self::Fallback),
            BackendPreference::Trainable if Self::trainable_available() => Ok(Self::Trainable),
            BackendPreference::Trainable => Err(ModelError::BackendUnavailable),
        }
    }
}

/// Model bank settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    /// Directory for persisted parameters and the training summary.
    pub model_dir: PathBuf,
    /// Backend request.
    pub backend: BackendPreference,
    /// Seed for splits, weight init, and label noise.
    pub seed: u64,
    /// Held-out share.
    pub test_ratio: f64,
    /// Gradient-descent step.
    pub learning_rate: f64,
    /// Gradient-descent epochs.
    pub epochs: usize,
    /// Expected outlier share.
    pub contamination: f64,
    /// Growth label noise standard deviation.
    pub growth_noise_std: f64,
    /// Threat label noise standard deviation.
    pub threat_noise_std: f64,
    /// Label and formula tables.
    pub simulation: SimulationTables,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("models"),
            backend: BackendPreference::Auto,
            seed: 42,
            test_ratio: 0.2,
            learning_rate: 0.05,
            epochs: 500,
            contamination: 0.1,
            growth_noise_std: 0.005,
            threat_noise_std: 0.05,
            simulation: SimulationTables::default(),
        }
    }
}

/// One trainable unit.
pub trait PredictiveModel: Send + Sync + fmt::Debug {
    /// Unit kind.
    fn kind(&self) -> ModelKind;
    /// Path recorded on predictions.
    fn method(&self) -> PredictionMethod;
    /// True once fitted or loaded.
    fn is_fitted(&self) -> bool;
    /// Fits on rows and targets (targets are ignored by the anomaly unit).
    fn fit(&mut self, features: &[FeatureVector], targets: &[f64]) -> Result<(), ModelError>;
    /// Predicts one value.
    fn predict(&self, features: &FeatureVector) -> Result<f64, ModelError>;
    /// Writes fitted state under `dir`.
    fn persist(&self, dir: &Path) -> Result<(), ModelError>;
    /// Reads fitted state from `dir`; `false` when nothing was stored.
    fn load(&mut self, dir: &Path) -> Result<bool, ModelError>;
}

/// Parameter and scaler file paths for a unit.
#[must_use]
pub fn unit_paths(dir: &Path, kind: ModelKind) -> (PathBuf, PathBuf) {
    (
        dir.join(format!("{}.json", kind.name())),
        dir.join(format!("{}_scaler.json", kind.name())),
    )
}

pub(crate) fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), ModelError> {
    fs::write(path, serde_json::to_vec_pretty(value)?)?;
    Ok(())
}

pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ModelError> {
    Ok(serde_json::from_slice(&fs::read(path)?)?)
}

/// Growth-rate band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GrowthCategory {
    /// At least 0.06.
    Rapid,
    /// At least 0.03.
    Moderate,
    /// At least 0.01.
    Slow,
    /// Below 0.01.
    Stable,
}

impl GrowthCategory {
    /// Band for a predicted rate.
    #[must_use]
    pub fn from_rate(rate: f64) -> Self {
        if rate >= 0.06 {
            Self::Rapid
        } else if rate >= 0.03 {
            Self::Moderate
        } else if rate >= 0.01 {
            Self::Slow
        } else {
            Self::Stable
        }
    }
}

/// Threat band for a predicted threat score in `[0, 1]`.
#[must_use]
pub fn categorize_threat(score: f64) -> ThreatLevel {
    if score >= 0.7 {
        ThreatLevel::High
    } else if score >= 0.4 {
        ThreatLevel::Medium
    } else {
        ThreatLevel::Low
    }
}

/// Anomaly band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnomalyLevel {
    /// Score below -0.5.
    HighAnomaly,
    /// Score below -0.2.
    ModerateAnomaly,
    /// Anything else.
    Normal,
}

impl AnomalyLevel {
    /// Band for a decision score.
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score < -0.5 {
            Self::HighAnomaly
        } else if score < -0.2 {
            Self::ModerateAnomaly
        } else {
            Self::Normal
        }
    }
}

/// Threat risk factor derived from features.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskFactor {
    /// Border proxy below 50.
    BorderProximity,
    /// HIGH priority.
    HighValueTarget,
    /// Density above 10000.
    HighPopulationArea,
    /// Economic activity above 50.
    EconomicImportance,
}

impl RiskFactor {
    /// Factors present in a feature vector.
    #[must_use]
    pub fn identify(features: &FeatureVector) -> Vec<Self> {
        let mut factors = Vec::new();
        if features.border_proximity() < 50.0 {
            factors.push(Self::BorderProximity);
        }
        if features.priority_score() >= 3.0 {
            factors.push(Self::HighValueTarget);
        }
        if features.population_density() > 10_000.0 {
            factors.push(Self::HighPopulationArea);
        }
        if features.economic_activity() > 50.0 {
            factors.push(Self::EconomicImportance);
        }
        factors
    }
}

/// Growth prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthPrediction {
    /// Predicted annual growth rate.
    pub rate: f64,
    /// Band.
    pub category: GrowthCategory,
    /// Fixed confidence.
    pub confidence: f64,
    /// Producing path.
    pub method: PredictionMethod,
}

/// Threat prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreatPrediction {
    /// Predicted threat score.
    pub score: f64,
    /// Band.
    pub level: ThreatLevel,
    /// Feature-derived risk factors.
    pub risk_factors: Vec<RiskFactor>,
    /// Fixed confidence.
    pub confidence: f64,
    /// Producing path.
    pub method: PredictionMethod,
}

/// Anomaly detection result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyPrediction {
    /// True for outliers.
    pub is_anomaly: bool,
    /// Decision score; negative means outlier.
    pub score: f64,
    /// Band.
    pub level: AnomalyLevel,
    /// Producing path.
    pub method: PredictionMethod,
}

/// Owns the three units and their formula fallbacks.
#[derive(Debug)]
pub struct ModelBank {
    settings: ModelSettings,
    backend: Backend,
    growth: Box<dyn PredictiveModel>,
    threat: Box<dyn PredictiveModel>,
    anomaly: Box<dyn PredictiveModel>,
    growth_formula: FormulaModel,
    threat_formula: FormulaModel,
    anomaly_formula: FormulaModel,
    telemetry: Option<IntelTelemetry>,
}

impl ModelBank {
    /// Creates a bank, choosing the backend from the settings.
    #[must_use]
    pub fn new(settings: ModelSettings, features: &FeatureTables) -> Self {
        Self::build(settings, features, None)
    }

    /// Creates a bank that logs through `telemetry`.
    #[must_use]
    pub fn with_telemetry(
        settings: ModelSettings,
        features: &FeatureTables,
        telemetry: IntelTelemetry,
    ) -> Self {
        Self::build(settings, features, Some(telemetry.scoped("models")))
    }

    fn build(
        settings: ModelSettings,
        features: &FeatureTables,
        telemetry: Option<IntelTelemetry>,
    ) -> Self {
        let backend = match Backend::resolve(settings.backend) {
            Ok(backend) => backend,
            Err(err) => {
                emit(
                    telemetry.as_ref(),
                    LogLevel::Warn,
                    "model_backend_unavailable",
                    json!({ "requested": settings.backend, "error": err.to_string() }),
                );
                Backend::Fallback
            }
        };
        let formula = |kind| {
            FormulaModel::new(
                kind,
                settings.simulation.clone(),
                features.clone(),
            )
        };
        let (growth_formula, threat_formula, anomaly_formula) = (
            formula(ModelKind::Growth),
            formula(ModelKind::Threat),
            formula(ModelKind::Anomaly),
        );
        emit(
            telemetry.as_ref(),
            LogLevel::Info,
            "model_bank_ready",
            json!({ "backend": backend, "model_dir": settings.model_dir }),
        );
        Self {
            growth: build_unit(ModelKind::Growth, backend, &settings, &growth_formula),
            threat: build_unit(ModelKind::Threat, backend, &settings, &threat_formula),
            anomaly: build_unit(ModelKind::Anomaly, backend, &settings, &anomaly_formula),
            growth_formula,
            threat_formula,
            anomaly_formula,
            settings,
            backend,
            telemetry,
        }
    }

    /// Active backend.
    #[must_use]
    pub const fn backend(&self) -> Backend {
        self.backend
    }

    /// Settings in use.
    #[must_use]
    pub const fn settings(&self) -> &ModelSettings {
        &self.settings
    }

    /// Directory holding persisted state.
    #[must_use]
    pub fn model_dir(&self) -> &Path {
        &self.settings.model_dir
    }

    /// True when the unit answers from fitted state rather than a formula.
    #[must_use]
    pub fn is_trained(&self, kind: ModelKind) -> bool {
        let unit = self.unit(kind);
        unit.is_fitted() && unit.method() == PredictionMethod::Trained
    }

    fn unit(&self, kind: ModelKind) -> &dyn PredictiveModel {
        match kind {
            ModelKind::Growth => self.growth.as_ref(),
            ModelKind::Threat => self.threat.as_ref(),
            ModelKind::Anomaly => self.anomaly.as_ref(),
        }
    }

    fn unit_mut(&mut self, kind: ModelKind) -> &mut dyn PredictiveModel {
        match kind {
            ModelKind::Growth => self.growth.as_mut(),
            ModelKind::Threat => self.threat.as_mut(),
            ModelKind::Anomaly => self.anomaly.as_mut(),
        }
    }

    const fn formula(&self, kind: ModelKind) -> &FormulaModel {
        match kind {
            ModelKind::Growth => &self.growth_formula,
            ModelKind::Threat => &self.threat_formula,
            ModelKind::Anomaly => &self.anomaly_formula,
        }
    }

    /// Trains a regression unit on a seeded 80/20 split and reports held-out
    /// metrics. Failures yield the sentinel and leave other units untouched.
    pub fn train_regressor(
        &mut self,
        kind: ModelKind,
        features: &[FeatureVector],
        targets: &[f64],
    ) -> RegressionMetrics {
        match self.try_train_regressor(kind, features, targets) {
            Ok(metrics) => {
                self.log(
                    LogLevel::Info,
                    "model_trained",
                    json!({ "model": kind, "mse": metrics.mse, "r2": metrics.r2 }),
                );
                metrics
            }
            Err(err) => {
                self.log(
                    LogLevel::Error,
                    "model_training_failed",
                    json!({ "model": kind, "error": err.to_string() }),
                );
                RegressionMetrics::SENTINEL
            }
        }
    }

    fn try_train_regressor(
        &mut self,
        kind: ModelKind,
        features: &[FeatureVector],
        targets: &[f64],
    ) -> Result<RegressionMetrics, ModelError> {
        if features.len() != targets.len() {
            return Err(ModelError::LengthMismatch {
                features: features.len(),
                targets: targets.len(),
            });
        }
        if features.is_empty() {
            return Err(ModelError::InsufficientSamples {
                model: kind.name().to_string(),
                needed: 1,
                got: 0,
            });
        }
        let (train_idx, test_idx) =
            train_test_split(features.len(), self.settings.test_ratio, self.settings.seed);
        let pick = |idx: &[usize]| -> (Vec<FeatureVector>, Vec<f64>) {
            idx.iter().map(|&i| (features[i], targets[i])).unzip()
        };
        let (train_x, train_y) = pick(&train_idx);
        let (test_x, test_y) = if test_idx.is_empty() {
            (train_x.clone(), train_y.clone())
        } else {
            pick(&test_idx)
        };
        let unit = self.unit_mut(kind);
        unit.fit(&train_x, &train_y)?;
        let predictions = test_x
            .iter()
            .map(|row| unit.predict(row))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(RegressionMetrics {
            mse: mean_squared_error(&predictions, &test_y),
            r2: r2_score(&predictions, &test_y),
        })
    }

    /// Fits the anomaly unit on every row and reports the flagged share.
    pub fn train_anomaly(&mut self, features: &[FeatureVector]) -> AnomalyMetrics {
        match self.try_train_anomaly(features) {
            Ok(metrics) => {
                self.log(
                    LogLevel::Info,
                    "model_trained",
                    json!({ "model": ModelKind::Anomaly, "anomaly_rate": metrics.anomaly_rate }),
                );
                metrics
            }
            Err(err) => {
                self.log(
                    LogLevel::Error,
                    "model_training_failed",
                    json!({ "model": ModelKind::Anomaly, "error": err.to_string() }),
                );
                AnomalyMetrics::SENTINEL
            }
        }
    }

    fn try_train_anomaly(&mut self, features: &[FeatureVector]) -> Result<AnomalyMetrics, ModelError> {
        if features.is_empty() {
            return Err(ModelError::InsufficientSamples {
                model: ModelKind::Anomaly.name().to_string(),
                needed: 1,
                got: 0,
            });
        }
        let unit = self.unit_mut(ModelKind::Anomaly);
        unit.fit(features, &[])?;
        let mut flagged = 0_usize;
        for row in features {
            if unit.predict(row)? < 0.0 {
                flagged += 1;
            }
        }
        #[allow(clippy::cast_precision_loss)]
        let anomaly_rate = flagged as f64 / features.len() as f64;
        Ok(AnomalyMetrics { anomaly_rate })
    }

    /// Answers from the unit when it is fitted, otherwise from the formula.
    fn predict_value(&self, kind: ModelKind, features: &FeatureVector) -> (f64, PredictionMethod) {
        let unit = self.unit(kind);
        if unit.is_fitted() {
            match unit.predict(features) {
                Ok(value) => return (value, unit.method()),
                Err(err) => self.log(
                    LogLevel::Warn,
                    "model_prediction_fallback",
                    json!({ "model": kind, "error": err.to_string() }),
                ),
            }
        }
        (self.formula(kind).evaluate(features), PredictionMethod::Formula)
    }

    /// Predicts the annual growth rate.
    #[must_use]
    pub fn predict_growth(&self, features: &FeatureVector) -> GrowthPrediction {
        let (rate, method) = self.predict_value(ModelKind::Growth, features);
        GrowthPrediction {
            rate,
            category: GrowthCategory::from_rate(rate),
            confidence: GROWTH_CONFIDENCE,
            method,
        }
    }

    /// Predicts the threat score.
    #[must_use]
    pub fn predict_threat(&self, features: &FeatureVector) -> ThreatPrediction {
        let (score, method) = self.predict_value(ModelKind::Threat, features);
        ThreatPrediction {
            score,
            level: categorize_threat(score),
            risk_factors: RiskFactor::identify(features),
            confidence: THREAT_CONFIDENCE,
            method,
        }
    }

    /// Scores a vector for abnormality.
    #[must_use]
    pub fn detect_anomaly(&self, features: &FeatureVector) -> AnomalyPrediction {
        let (score, method) = self.predict_value(ModelKind::Anomaly, features);
        AnomalyPrediction {
            is_anomaly: score < 0.0,
            score,
            level: AnomalyLevel::from_score(score),
            method,
        }
    }

    /// Writes every fitted trainable unit to the model directory. Returns the
    /// number of units written.
    pub fn persist(&self) -> Result<usize, ModelError> {
        fs::create_dir_all(&self.settings.model_dir)?;
        let mut written = 0;
        for kind in [ModelKind::Growth, ModelKind::Threat, ModelKind::Anomaly] {
            if self.is_trained(kind) {
                self.unit(kind).persist(&self.settings.model_dir)?;
                written += 1;
            }
        }
        self.log(
            LogLevel::Info,
            "models_persisted",
            json!({ "units": written, "model_dir": self.settings.model_dir }),
        );
        Ok(written)
    }

    /// Loads stored state for every unit that has it. Returns the number loaded.
    pub fn load(&mut self) -> Result<usize, ModelError> {
        let dir = self.settings.model_dir.clone();
        let mut loaded = 0;
        for kind in [ModelKind::Growth, ModelKind::Threat, ModelKind::Anomaly] {
            if self.unit_mut(kind).load(&dir)? {
                loaded += 1;
            }
        }
        self.log(
            LogLevel::Info,
            "models_loaded",
            json!({ "units": loaded, "model_dir": dir }),
        );
        Ok(loaded)
    }

    fn log(&self, level: LogLevel, message: &str, metadata: serde_json::Value) {
        emit(self.telemetry.as_ref(), level, message, metadata);
    }
}

fn build_unit(
    kind: ModelKind,
    backend: Backend,
    settings: &ModelSettings,
    formula: &FormulaModel,
) -> Box<dyn PredictiveModel> {
    #[cfg(feature = "trainable")]
    {
        if backend == Backend::Trainable {
            return match kind {
                ModelKind::Growth | ModelKind::Threat => {
                    Box::new(linear::LinearUnit::new(kind, settings))
                }
                ModelKind::Anomaly => Box::new(anomaly::AnomalyUnit::new(settings.contamination)),
            };
        }
    }
    #[cfg(not(feature = "trainable"))]
    let _ = (kind, backend, settings);
    Box::new(formula.clone())
}
