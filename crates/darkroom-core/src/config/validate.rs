//! Configuration validation with range checks.

use crate::error::ConfigError;
use crate::pipeline::MAX_THUMBNAIL_SIZE;

/// 1 TiB; inputs are held in memory whole.
const MAX_FILE_SIZE_MB: u64 = 1024 * 1024;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.backend.task_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "backend.task_timeout_ms must be > 0".into(),
            ));
        }
        if self.compress.max_width == 0 || self.compress.max_height == 0 {
            return Err(ConfigError::ValidationError(
                "compress.max_width and compress.max_height must be > 0".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.compress.quality) {
            return Err(ConfigError::ValidationError(
                "compress.quality must be between 0.0 and 1.0".into(),
            ));
        }
        if self.thumbnail.size == 0 || self.thumbnail.size > MAX_THUMBNAIL_SIZE {
            return Err(ConfigError::ValidationError(format!(
                "thumbnail.size must be between 1 and {MAX_THUMBNAIL_SIZE}"
            )));
        }
        if !(1..=MAX_FILE_SIZE_MB).contains(&self.limits.max_file_size_mb) {
            return Err(ConfigError::ValidationError(format!(
                "limits.max_file_size_mb must be between 1 and {MAX_FILE_SIZE_MB}"
            )));
        }
        if self.limits.max_image_dimension == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_image_dimension must be > 0".into(),
            ));
        }
        if self.limits.decode_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "limits.decode_timeout_ms must be > 0".into(),
            ));
        }
        Ok(())
    }
}
