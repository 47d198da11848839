//! Runtime configuration
//!
//! Defaults match the public report form: three photos, 10 MB each,
//! images only. Values can be overridden from a TOML file.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Core configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CivicConfig {
    /// Maximum images held by one report, cumulative across updates
    pub max_attachments: usize,
    /// Largest accepted image in bytes
    pub max_image_bytes: usize,
    /// Content-type prefix an upload must carry
    pub accepted_content_prefix: String,
    /// How long a position lookup may take before it counts as a timeout
    pub geolocation_timeout_ms: u64,
    /// First sequence number handed out in each reporting year
    pub first_tracking_sequence: u32,
    /// Buffered events per subscriber
    pub event_channel_capacity: usize,
}

impl CivicConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With attachment cap
    #[inline]
    #[must_use]
    pub fn with_max_attachments(mut self, max: usize) -> Self {
        self.max_attachments = max;
        self
    }

    /// With per-image size limit
    #[inline]
    #[must_use]
    pub fn with_max_image_bytes(mut self, bytes: usize) -> Self {
        self.max_image_bytes = bytes;
        self
    }

    /// With geolocation timeout
    #[inline]
    #[must_use]
    pub fn with_geolocation_timeout(mut self, timeout: Duration) -> Self {
        self.geolocation_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// With first tracking sequence number
    #[inline]
    #[must_use]
    pub fn with_first_tracking_sequence(mut self, sequence: u32) -> Self {
        self.first_tracking_sequence = sequence;
        self
    }

    #[inline]
    #[must_use]
    pub fn geolocation_timeout(&self) -> Duration {
        Duration::from_millis(self.geolocation_timeout_ms)
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let input = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&input)?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Reject values no workflow can operate with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attachments == 0 {
            return Err(ConfigError::Invalid("max_attachments must be at least 1".into()));
        }
        if self.max_image_bytes == 0 {
            return Err(ConfigError::Invalid("max_image_bytes must be positive".into()));
        }
        if self.geolocation_timeout_ms == 0 {
            return Err(ConfigError::Invalid("geolocation_timeout_ms must be positive".into()));
        }
        if self.first_tracking_sequence == 0 {
            return Err(ConfigError::Invalid("first_tracking_sequence starts at 1".into()));
        }
        if self.event_channel_capacity == 0 {
            return Err(ConfigError::Invalid("event_channel_capacity must be positive".into()));
        }
        Ok(())
    }
}

impl Default for CivicConfig {
    fn default() -> Self {
        Self {
            max_attachments: 3,
            max_image_bytes: 10 * 1024 * 1024,
            accepted_content_prefix: "image/".to_string(),
            geolocation_timeout_ms: 10_000,
            first_tracking_sequence: 1,
            event_channel_capacity: 64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = CivicConfig::from_toml_str("first_tracking_sequence = 156\n").unwrap();
        assert_eq!(config.first_tracking_sequence, 156);
        assert_eq!(config.max_attachments, 3);
        assert_eq!(config.geolocation_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn rejects_zero_cap() {
        let err = CivicConfig::from_toml_str("max_attachments = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_malformed_toml() {
        let err = CivicConfig::from_toml_str("max_attachments = \"three\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "geolocation_timeout_ms = 2500").unwrap();

        let config = CivicConfig::load(file.path()).unwrap();
        assert_eq!(config.geolocation_timeout(), Duration::from_millis(2500));
    }

    #[test]
    fn load_missing_file() {
        let err = CivicConfig::load("/nonexistent/civic.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
