//! Unified error types for the zonal ecosystem
//!
//! This module provides a common error type [`ZonalError`] shared by every
//! crate in the workspace. Fatal conditions (missing CRS, degenerate
//! geometry, broken invariants) are surfaced as errors; recoverable defects
//! (isolated sources, self-overlapping targets, missing quantity columns)
//! are collected as [`crate::Diagnostics`] instead and never abort a call.

use thiserror::Error;

/// Unified error type for all zonal operations.
#[derive(Error, Debug)]
pub enum ZonalError {
    /// I/O errors (file access, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A partition was supplied without a declared coordinate reference system
    #[error("partition '{0}' declares no coordinate reference system")]
    MissingCrs(String),

    /// A declared CRS tag is not one the normalizer can project
    #[error("unsupported CRS tag '{0}' (expected a geographic tag or EPSG:3857)")]
    Crs(String),

    /// A geometry is not a polygonal region, even after repair
    #[error("zone '{zone}' in partition '{partition}' is not a polygonal region")]
    InvalidGeometry { partition: String, zone: String },

    /// A zone projects to zero planar area and cannot be used as a ratio denominator
    #[error("zone '{zone}' in partition '{partition}' has zero area after projection")]
    ZeroAreaZone { partition: String, zone: String },

    /// Two zones in the same partition carry the same label
    #[error("duplicate zone label '{label}' in partition '{partition}'")]
    DuplicateLabel { partition: String, label: String },

    /// Data validation / internal invariant errors
    #[error("validation error: {0}")]
    Validation(String),

    /// Parsing/deserialization errors
    #[error("parse error: {0}")]
    Parse(String),

    /// Generic errors (for wrapping external errors)
    #[error("{0}")]
    Other(String),
}

/// Convenience type alias for Results using ZonalError.
pub type ZonalResult<T> = Result<T, ZonalError>;

impl From<anyhow::Error> for ZonalError {
    fn from(err: anyhow::Error) -> Self {
        ZonalError::Other(err.to_string())
    }
}

impl From<String> for ZonalError {
    fn from(s: String) -> Self {
        ZonalError::Other(s)
    }
}

impl From<&str> for ZonalError {
    fn from(s: &str) -> Self {
        ZonalError::Other(s.to_string())
    }
}

impl From<serde_json::Error> for ZonalError {
    fn from(err: serde_json::Error) -> Self {
        ZonalError::Parse(err.to_string())
    }
}
