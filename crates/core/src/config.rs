//! Engine configuration loaded from JSON.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::grammar::emit::EmitConfig;

/// Errors that can occur when loading or validating a [`LabelConfig`].
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ConfigError {
    /// JSON deserialization failed.
    #[error("invalid config JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// A field value is out of its valid range.
    #[error("invalid {field}: {reason}")]
    InvalidField {
        /// The name of the field that failed validation.
        field: String,
        /// A human-readable explanation of why the field value is invalid.
        reason: String,
    },
}

/// Record discipline used when the label does not dictate one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordType {
    /// Terminator-delimited lines.
    #[default]
    Stream,
    /// Fixed-length records of `record_bytes` bytes.
    Fixed,
}

/// Line terminator for stream records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Terminator {
    /// `\r\n`
    Crlf,
    /// `\r`
    Cr,
    /// `\n`
    Lf,
}

impl Terminator {
    /// The terminator native to the host platform.
    pub fn platform_default() -> Self {
        if cfg!(windows) {
            Terminator::Crlf
        } else {
            Terminator::Lf
        }
    }

    /// Terminator bytes.
    pub fn as_bytes(self) -> &'static [u8] {
        match self {
            Terminator::Crlf => b"\r\n",
            Terminator::Cr => b"\r",
            Terminator::Lf => b"\n",
        }
    }
}

impl Default for Terminator {
    fn default() -> Self {
        Self::platform_default()
    }
}

/// Bounds for the wrapper end-marker search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WrapperScanConfig {
    /// Bytes read per chunk.
    pub chunk_size: usize,
    /// Chunks read before giving up on the end marker.
    pub max_chunks: usize,
}

impl Default for WrapperScanConfig {
    fn default() -> Self {
        Self {
            chunk_size: 2048,
            max_chunks: 64,
        }
    }
}

/// Engine-wide settings carried by a [`LabelContext`](crate::LabelContext).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LabelConfig {
    /// Match object classes by their trailing `_` segments, ignoring
    /// numeric suffixes (`IMAGE_2` matches `IMAGE`).
    pub generic_class: bool,
    /// Default discipline when the label's `RECORD_TYPE` is unknown.
    pub record_type: RecordType,
    /// Default fixed record length.
    pub record_bytes: usize,
    /// Stream terminator.
    pub terminator: Terminator,
    /// Statement layout.
    pub emit: EmitConfig,
    /// Wrapper end-marker search bounds.
    pub wrapper_scan: WrapperScanConfig,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            generic_class: false,
            record_type: RecordType::Stream,
            record_bytes: 512,
            terminator: Terminator::platform_default(),
            emit: EmitConfig::default(),
            wrapper_scan: WrapperScanConfig::default(),
        }
    }
}

/// Load and validate a [`LabelConfig`] from a JSON string.
///
/// Every field is optional and defaults as in [`LabelConfig::default`].
/// Validation after deserialization:
/// - `record_bytes` must be > 0
/// - `wrapper_scan.chunk_size` must be at least 32, enough for one
///   end marker plus overlap
/// - `wrapper_scan.max_chunks` must be >= 1
/// - `emit.indent_width` must be <= 16
pub fn load_config_from_str(s: &str) -> Result<LabelConfig, ConfigError> {
    let config: LabelConfig = serde_json::from_str(s)?;
    config.validate()?;
    Ok(config)
}

impl LabelConfig {
    /// Range-check fields that serde cannot.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.record_bytes == 0 {
            return Err(ConfigError::InvalidField {
                field: "record_bytes".into(),
                reason: "must be > 0".into(),
            });
        }
        if self.wrapper_scan.chunk_size < 32 {
            return Err(ConfigError::InvalidField {
                field: "wrapper_scan.chunk_size".into(),
                reason: format!("{} is below the minimum (32)", self.wrapper_scan.chunk_size),
            });
        }
        if self.wrapper_scan.max_chunks == 0 {
            return Err(ConfigError::InvalidField {
                field: "wrapper_scan.max_chunks".into(),
                reason: "must be >= 1".into(),
            });
        }
        if self.emit.indent_width > 16 {
            return Err(ConfigError::InvalidField {
                field: "emit.indent_width".into(),
                reason: format!("{} exceeds the maximum (16)", self.emit.indent_width),
            });
        }
        Ok(())
    }
}
