//! Configuration for training and serving.
//!
//! Every field has a default, so the binary runs with no file at all. A TOML
//! file may override any subset:
//!
//! ```toml
//! [paths]
//! model_path = "artifacts/model.bin"
//! confusion_matrix_path = "confusion_matrix.svg"
//!
//! [training]
//! experiment_name = "iris-classifier"
//! test_size = 0.2
//! seed = 42
//! max_iterations = 200
//! alpha = 1.0
//!
//! [tracking]
//! enabled = true
//! dir = "mlruns"
//!
//! [server]
//! bind = "127.0.0.1"
//! port = 8000
//!
//! [logging]
//! level = "info"
//! ```

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::Level;

use crate::classifiers::LogisticRegressionParams;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub paths: PathsConfig,
    pub training: TrainingConfig,
    pub tracking: TrackingConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Written by `train`, read once by `serve` at startup
    pub model_path: PathBuf,
    /// `.svg`, `.csv` or `.json`
    pub confusion_matrix_path: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("artifacts/model.bin"),
            confusion_matrix_path: PathBuf::from("confusion_matrix.svg"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub experiment_name: String,
    /// Fraction of each class held out for evaluation
    pub test_size: f64,
    pub seed: u64,
    pub max_iterations: u64,
    /// L2 penalty
    pub alpha: f64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        let params = LogisticRegressionParams::default();
        Self {
            experiment_name: "iris-classifier".into(),
            test_size: 0.2,
            seed: 42,
            max_iterations: params.max_iterations,
            alpha: params.alpha,
        }
    }
}

impl TrainingConfig {
    pub fn model_params(&self) -> LogisticRegressionParams {
        LogisticRegressionParams {
            max_iterations: self.max_iterations,
            alpha: self.alpha,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    pub enabled: bool,
    pub dir: PathBuf,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: PathBuf::from("mlruns"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".into(),
            port: 8000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// trace, debug, info, warn or error
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

impl LoggingConfig {
    pub fn tracing_level(&self) -> Result<Level, ConfigError> {
        Level::from_str(&self.level)
            .map_err(|_| ConfigError::Invalid(format!("unknown log level {:?}", self.level)))
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parses and validates.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// File config when a path is given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.training;
        if !(t.test_size > 0.0 && t.test_size < 1.0) {
            return Err(ConfigError::Invalid(format!(
                "training.test_size must be in (0, 1), got {}",
                t.test_size
            )));
        }
        if t.max_iterations == 0 {
            return Err(ConfigError::Invalid(
                "training.max_iterations must be > 0".into(),
            ));
        }
        if !t.alpha.is_finite() || t.alpha < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "training.alpha must be a finite value >= 0, got {}",
                t.alpha
            )));
        }
        if t.experiment_name.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "training.experiment_name must not be empty".into(),
            ));
        }
        if self.paths.model_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("paths.model_path must not be empty".into()));
        }
        self.logging.tracing_level()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn defaults_match_fixed_layout() {
        let c = Config::default();
        assert_eq!(c.paths.model_path, PathBuf::from("artifacts/model.bin"));
        assert_eq!(
            c.paths.confusion_matrix_path,
            PathBuf::from("confusion_matrix.svg")
        );
        assert_eq!(c.training.experiment_name, "iris-classifier");
        assert_eq!(c.training.test_size, 0.2);
        assert_eq!(c.training.seed, 42);
        assert_eq!(c.training.max_iterations, 200);
        assert_eq!(c.tracking.dir, PathBuf::from("mlruns"));
        assert!(c.tracking.enabled);
        assert_eq!(c.server.port, 8000);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let c = Config::from_toml(
            r#"
            [server]
            port = 9001

            [training]
            seed = 7
            "#,
        )
        .unwrap();
        assert_eq!(c.server.port, 9001);
        assert_eq!(c.server.bind, "127.0.0.1");
        assert_eq!(c.training.seed, 7);
        assert_eq!(c.training.test_size, 0.2);
        assert_eq!(c.logging.level, "info");
    }

    #[test]
    fn rejects_invalid_values() {
        for toml in [
            "[training]\ntest_size = 1.0",
            "[training]\ntest_size = 0.0",
            "[training]\nmax_iterations = 0",
            "[training]\nalpha = -0.1",
            "[training]\nexperiment_name = \"  \"",
            "[logging]\nlevel = \"loud\"",
        ] {
            assert!(
                matches!(Config::from_toml(toml), Err(ConfigError::Invalid(_))),
                "accepted: {toml}"
            );
        }
    }

    #[test]
    fn rejects_malformed_toml() {
        assert!(matches!(
            Config::from_toml("[server\nport = 1"),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            Config::from_toml("[server]\nport = \"eighty\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn loads_from_file() {
        let f = NamedTempFile::new().unwrap();
        std::fs::write(f.path(), "[paths]\nmodel_path = \"out/m.bin\"\n").unwrap();
        let c = Config::load(f.path()).unwrap();
        assert_eq!(c.paths.model_path, PathBuf::from("out/m.bin"));

        assert!(matches!(
            Config::load("/definitely/not/here.toml"),
            Err(ConfigError::Io { .. })
        ));
        assert_eq!(Config::load_or_default(None).unwrap(), Config::default());
    }

    #[test]
    fn log_level_parses_case_insensitively() {
        let l = LoggingConfig {
            level: "DEBUG".into(),
        };
        assert_eq!(l.tracing_level().unwrap(), Level::DEBUG);
    }
}
