//! Error types for the analyzer
//!
//! Only a missing snapshot aborts an analysis. Rule failures become error
//! findings and never reach the caller as [`AnalyzeError`].

use precheck_model::ModelError;

/// Analysis errors
#[derive(Debug, thiserror::Error)]
pub enum AnalyzeError {
    /// No cluster snapshot supplied
    #[error("no data: cluster snapshot is absent")]
    NoSnapshot,

    /// Analyzer configuration unusable
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Input document malformed
    #[error("input error: {0}")]
    Model(#[from] ModelError),
}

impl AnalyzeError {
    /// Whether the error is caused by missing input rather than malformed input
    #[inline]
    #[must_use]
    pub fn is_missing_input(&self) -> bool {
        matches!(self, Self::NoSnapshot)
    }
}

/// Configuration parsing errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Unsupported file extension
    #[error("unknown configuration format: {0}")]
    UnknownFormat(String),

    /// JSON decode failure
    #[error("invalid JSON configuration: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML decode failure
    #[error("invalid YAML configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// TOML decode failure
    #[error("invalid TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_snapshot_display() {
        let err = AnalyzeError::NoSnapshot;
        assert_eq!(err.to_string(), "no data: cluster snapshot is absent");
        assert!(err.is_missing_input());
    }

    #[test]
    fn config_error_converts() {
        let err: AnalyzeError = ConfigError::UnknownFormat("ini".to_string()).into();
        assert!(matches!(err, AnalyzeError::Config(ConfigError::UnknownFormat(_))));
        assert!(!err.is_missing_input());
        assert!(err.to_string().contains("unknown configuration format: ini"));
    }
}
