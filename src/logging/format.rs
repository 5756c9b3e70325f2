//! Log setup for the CLI: human-readable lines or flattened JSON objects on stderr.
//! stdout is left to reports (training metrics, CSV) so it can be piped.

use crate::config::LogConfig;
use crate::error::{ProcwatchError, Result};
use serde::Serialize;
use std::io::Write;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

pub struct StructuredLogger;

impl StructuredLogger {
    /// Install the global subscriber. RUST_LOG wins over `config.level`; `verbose`
    /// lowers the configured level to debug. Fails if a subscriber is already set.
    pub fn init(config: &LogConfig, verbose: bool) -> Result<()> {
        let level = if verbose { "debug" } else { config.level.as_str() };
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(level))
            .map_err(|e| ProcwatchError::Configuration(format!("log level {:?}: {}", level, e)))?;

        let registry = tracing_subscriber::registry().with(filter);
        let installed = if config.json {
            registry
                .with(
                    fmt::layer()
                        .json()
                        .flatten_event(true)
                        .with_current_span(false)
                        .with_writer(std::io::stderr),
                )
                .try_init()
        } else {
            registry
                .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
                .try_init()
        };
        installed.map_err(|e| ProcwatchError::Configuration(format!("logger: {}", e)))
    }

    /// Write `report` as a single JSON line.
    pub fn emit_json<T: Serialize, W: Write>(report: &T, mut w: W) -> Result<()> {
        serde_json::to_writer(&mut w, report)?;
        writeln!(w)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::training::EvaluationReport;
    use crate::features::Label;

    #[test]
    fn report_is_one_json_line() {
        let report = EvaluationReport::from_predictions(&[Label::Normal], &[Label::Normal]);
        let mut buf = Vec::new();
        StructuredLogger::emit_json(&report, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text.lines().count(), 1);
        assert!(text.ends_with('\n'));
        let v: serde_json::Value = serde_json::from_str(text.trim()).unwrap();
        assert_eq!(v["accuracy"], 1.0);
    }

    #[test]
    fn second_init_is_rejected() {
        let config = LogConfig::default();
        let _ = StructuredLogger::init(&config, false);
        assert!(matches!(
            StructuredLogger::init(&config, true),
            Err(ProcwatchError::Configuration(_))
        ));
    }
}
