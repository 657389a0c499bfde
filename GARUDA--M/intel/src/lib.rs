#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

//! GARUDA intelligence core: asset scoring, predictive models, and regional
//! infrastructure growth forecasting.

/// Domain error types.
#[path = "../error.rs"]
pub mod error;

/// Telemetry handle threaded through every component.
#[path = "../telemetry.rs"]
pub mod telemetry;

/// Great-circle math and reference coordinates.
#[path = "../geo.rs"]
pub mod geo;

/// Asset records supplied by the geometry collaborator.
#[path = "../asset.rs"]
pub mod asset;

/// Numeric feature extraction.
#[path = "../features.rs"]
pub mod features;

/// Multi-factor priority and threat classification.
#[path = "../scoring/main.rs"]
pub mod scoring;

/// Trainable predictive models with formula fallbacks.
#[path = "../models/main.rs"]
pub mod models;

/// Regional growth pattern analysis and forecasting.
#[path = "../growth/main.rs"]
pub mod growth;

/// Batch training pipeline.
#[path = "../training.rs"]
pub mod training;

/// Typed engine configuration.
#[path = "../config.rs"]
pub mod config;

/// Engine facade exposing the public operations.
#[path = "../main.rs"]
pub mod runtime;

pub use asset::{Asset, AssetType, Footprint, LocationSource, Priority, Tags};
pub use config::{IntelConfig, IntelConfigOverlay, LoggingSettings};
pub use error::{ModelError, TrainingError};
pub use features::{Extraction, ExtractionOutcome, FeatureExtractor, FeatureVector};
pub use geo::{GeoPoint, ResolvedPoint};
pub use growth::{
    forecast::GrowthForecast, hotspot::Hotspot, region::Region, GrowthPattern,
    GrowthPatternAnalyzer, GrowthPatterns, GrowthSettings, PatternKey,
};
pub use models::{
    AnomalyPrediction, Backend, GrowthPrediction, ModelBank, ModelKind, PredictiveModel,
    ThreatPrediction,
};
pub use runtime::GarudaEngine;
pub use scoring::{ClassificationResult, GeospatialScorer, ThreatLevel};
pub use telemetry::{IntelTelemetry, IntelTelemetryBuilder};
pub use training::{TrainingOrchestrator, TrainingSummary};
