use std::{fmt, path::PathBuf, sync::Arc};

use anyhow::Result;
use serde_json::Value;
use shared_logging::{JsonLogger, LogLevel, LogRecord, LogSink};

/// Builder configuring telemetry for the intelligence engine.
pub struct IntelTelemetryBuilder {
    module: String,
    log_path: Option<PathBuf>,
    sinks: Vec<Arc<dyn LogSink>>,
    min_level: LogLevel,
}

impl IntelTelemetryBuilder {
    /// Creates a new builder.
    #[must_use]
    pub fn new(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            log_path: None,
            sinks: Vec::new(),
            min_level: LogLevel::Debug,
        }
    }

    /// Sets the JSON log path.
    #[must_use]
    pub fn log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_path = Some(path.into());
        self
    }

    /// Adds an extra sink, typically a `MemoryLogger` in tests.
    #[must_use]
    pub fn sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Drops records below this level.
    #[must_use]
    pub const fn min_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    /// Finalizes the builder.
    pub fn build(self) -> Result<IntelTelemetry> {
        let mut sinks = self.sinks;
        if let Some(path) = self.log_path {
            sinks.push(Arc::new(JsonLogger::new(path)?));
        }
        Ok(IntelTelemetry {
            module: self.module,
            inner: Arc::new(TelemetryInner {
                sinks,
                min_level: self.min_level,
            }),
        })
    }
}

/// Telemetry handle shared by the scoring, model, growth, and training components.
#[derive(Clone)]
pub struct IntelTelemetry {
    module: String,
    inner: Arc<TelemetryInner>,
}

impl fmt::Debug for IntelTelemetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntelTelemetry")
            .field("module", &self.module)
            .field("sinks", &self.inner.sinks.len())
            .field("min_level", &self.inner.min_level)
            .finish()
    }
}

struct TelemetryInner {
    sinks: Vec<Arc<dyn LogSink>>,
    min_level: LogLevel,
}

impl IntelTelemetry {
    /// Returns a builder for this telemetry helper.
    #[must_use]
    pub fn builder(module: impl Into<String>) -> IntelTelemetryBuilder {
        IntelTelemetryBuilder::new(module)
    }

    /// Telemetry that discards every record.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            module: "garuda".into(),
            inner: Arc::new(TelemetryInner {
                sinks: Vec::new(),
                min_level: LogLevel::Error,
            }),
        }
    }

    /// Same sinks, records tagged with a component name (`garuda.scoring`, ...).
    #[must_use]
    pub fn scoped(&self, component: &str) -> Self {
        Self {
            module: format!("{}.{component}", self.root_module()),
            inner: Arc::clone(&self.inner),
        }
    }

    /// Module label attached to records.
    #[must_use]
    pub fn module(&self) -> &str {
        &self.module
    }

    fn root_module(&self) -> &str {
        self.module
            .split_once('.')
            .map_or(self.module.as_str(), |(root, _)| root)
    }

    /// Logs a structured record to every sink.
    pub fn log(&self, level: LogLevel, message: &str, metadata: Value) -> Result<()> {
        if level < self.inner.min_level || self.inner.sinks.is_empty() {
            return Ok(());
        }
        let record = LogRecord::new(&self.module, level, message).with_metadata(&metadata);
        let mut first_failure = None;
        for sink in &self.inner.sinks {
            if let Err(err) = sink.write(&record) {
                first_failure.get_or_insert(err);
            }
        }
        first_failure.map_or(Ok(()), Err)
    }
}

/// Logs through an optional handle. Sink failures go to stderr.
pub(crate) fn emit(
    telemetry: Option<&IntelTelemetry>,
    level: LogLevel,
    message: &str,
    metadata: Value,
) {
    if let Some(tel) = telemetry {
        if let Err(err) = tel.log(level, message, metadata) {
            eprintln!("telemetry log failed for {message}: {err:?}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use shared_logging::MemoryLogger;
    use tempfile::tempdir;

    struct BrokenSink;

    impl LogSink for BrokenSink {
        fn write(&self, _record: &LogRecord) -> Result<()> {
            anyhow::bail!("sink closed")
        }
    }

    #[test]
    fn telemetry_logs_to_file_and_memory() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("intel.log");
        let memory = Arc::new(MemoryLogger::new());
        let telemetry = IntelTelemetry::builder("garuda")
            .log_path(&log_path)
            .sink(memory.clone())
            .build()
            .unwrap();
        telemetry
            .log(LogLevel::Info, "intel.test", json!({ "assets": 3 }))
            .unwrap();
        let content = std::fs::read_to_string(log_path).unwrap();
        assert!(content.contains("intel.test"));
        assert!(memory.contains("intel.test"));
    }

    #[test]
    fn scoped_handles_share_sinks_and_filter_levels() {
        let memory = Arc::new(MemoryLogger::new());
        let telemetry = IntelTelemetry::builder("garuda")
            .sink(memory.clone())
            .min_level(LogLevel::Warn)
            .build()
            .unwrap();
        let scoring = telemetry.scoped("scoring");
        let nested = scoring.scoped("tables");
        assert_eq!(scoring.module(), "garuda.scoring");
        assert_eq!(nested.module(), "garuda.tables");

        scoring.log(LogLevel::Info, "dropped", json!({})).unwrap();
        scoring.log(LogLevel::Warn, "kept", json!({})).unwrap();
        let records = memory.snapshot();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].module, "garuda.scoring");
    }

    #[test]
    fn failing_sink_does_not_starve_the_others() {
        let memory = Arc::new(MemoryLogger::new());
        let telemetry = IntelTelemetry::builder("garuda")
            .sink(Arc::new(BrokenSink))
            .sink(memory.clone())
            .build()
            .unwrap();
        let err = telemetry
            .log(LogLevel::Info, "first", json!({}))
            .unwrap_err();
        assert!(err.to_string().contains("sink closed"));
        assert!(memory.contains("first"));

        emit(Some(&telemetry), LogLevel::Warn, "second", json!({}));
        assert!(memory.contains("second"));
    }
}
