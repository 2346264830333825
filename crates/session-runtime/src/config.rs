//! Runtime configuration loading
//!
//! Layers an optional config file under `PROCTOR_`-prefixed environment
//! variables; anything not supplied falls back to the calibration
//! defaults.

use crate::RuntimeError;
use calibration::CalibrationConfig;
use serde::Deserialize;

/// Top-level runtime configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub calibration: CalibrationConfig,
}

impl RuntimeConfig {
    /// Load configuration from an optional file path plus environment
    /// overrides (e.g. `PROCTOR_CALIBRATION__DWELL_MS=3000`).
    pub fn load(path: Option<&str>) -> Result<Self, RuntimeError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path));
        }
        let settings = builder
            .add_source(
                config::Environment::with_prefix("PROCTOR")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        Ok(settings.try_deserialize()?)
    }
}
