//! Error types for the conversion pipeline.
//!
//! Each variant is a distinct, caller-visible failure kind. The hosting layer
//! decides how to present them; the core only keeps them apart.

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::storage::StoreError;

/// Pipeline stage names, used to tag wrapped conversion failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Extract,
    Serialize,
    Cad,
    Mesh,
    Validate,
    Deliver,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Extract => "extract",
            Self::Serialize => "serialize",
            Self::Cad => "cad",
            Self::Mesh => "mesh",
            Self::Validate => "validate",
            Self::Deliver => "deliver",
        };
        f.write_str(name)
    }
}

/// Errors that can end a conversion request.
#[derive(Error, Debug)]
pub enum ConversionError {
    /// The input raster could not be read or decoded.
    #[error("Failed to load image {path}: {source}")]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// The image decoded fine but no edges could be traced.
    #[error("No geometry found in image; try a clearer image with stronger lines")]
    NoGeometryFound,

    /// An intermediate artifact could not be written.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A stage's transform failed.
    #[error("{stage} stage failed: {source:#}")]
    Conversion {
        stage: Stage,
        #[source]
        source: anyhow::Error,
    },

    /// Tracing succeeded but no polygon survived extrusion.
    #[error("No valid geometry for mesh: {skipped} polygon(s) rejected")]
    NoValidGeometryForMesh { skipped: usize },

    /// The produced artifact is missing or too small to be real output.
    #[error("Artifact {path} rejected: {reason}")]
    ArtifactRejected { path: PathBuf, reason: String },

    /// The artifact exists locally but the storage handoff failed.
    #[error("Delivery of {artifact} failed: {source}")]
    Delivery {
        artifact: PathBuf,
        #[source]
        source: StoreError,
    },

    /// The configuration was rejected before any work started.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A batch worker panicked or was cancelled before reporting back.
    #[error("Conversion of {input} did not complete: {reason}")]
    TaskFailed { input: PathBuf, reason: String },
}

impl ConversionError {
    pub(crate) fn conversion(stage: Stage, source: anyhow::Error) -> Self {
        Self::Conversion { stage, source }
    }

    /// True for failures the end user can fix by supplying a different image.
    pub fn is_user_correctable(&self) -> bool {
        matches!(
            self,
            Self::NoGeometryFound | Self::NoValidGeometryForMesh { .. } | Self::ImageLoad { .. }
        )
    }
}

/// Result type alias for pipeline operations.
pub type ConversionResult<T> = Result<T, ConversionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversion_error_display() {
        let err = ConversionError::NoGeometryFound;
        assert_eq!(
            err.to_string(),
            "No geometry found in image; try a clearer image with stronger lines"
        );

        let err = ConversionError::NoValidGeometryForMesh { skipped: 3 };
        assert_eq!(
            err.to_string(),
            "No valid geometry for mesh: 3 polygon(s) rejected"
        );

        let err = ConversionError::InvalidConfig("extrusion_height must be positive".into());
        assert_eq!(
            err.to_string(),
            "Invalid configuration: extrusion_height must be positive"
        );
    }

    #[test]
    fn test_wrapped_stage_error() {
        let err = ConversionError::conversion(Stage::Cad, anyhow::anyhow!("disk full"));
        assert_eq!(err.to_string(), "cad stage failed: disk full");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_user_correctable() {
        assert!(ConversionError::NoGeometryFound.is_user_correctable());
        let io_err = ConversionError::Io {
            path: PathBuf::from("out.svg"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(!io_err.is_user_correctable());
    }

    #[test]
    fn test_task_failure_names_the_input() {
        let err = ConversionError::TaskFailed {
            input: PathBuf::from("scan.png"),
            reason: "task 7 panicked".into(),
        };
        assert_eq!(
            err.to_string(),
            "Conversion of scan.png did not complete: task 7 panicked"
        );
        assert!(!err.is_user_correctable());
        assert!(!matches!(err, ConversionError::Conversion { .. }));
    }
}
