use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::error::ConversionError;

/// Artifact a conversion request should produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum OutputKind {
    /// The traced SVG document itself
    Vector,
    /// A DXF drawing of line entities
    Cad2d,
    /// An extruded solid
    Mesh,
}

impl OutputKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Vector => "vector",
            Self::Cad2d => "cad2d",
            Self::Mesh => "mesh",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum MeshFormat {
    Stl,
    Obj,
}

impl MeshFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Stl => "stl",
            Self::Obj => "obj",
        }
    }
}

/// Where the extruder takes its polygons from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum MeshSource {
    /// Traced pixel contours with at least three points
    Contours,
    /// Line-only paths re-parsed from the serialized SVG
    VectorDocument,
}

/// Settings for one pipeline instance, fixed at construction time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionConfig {
    pub edge_low_threshold: f32,
    pub edge_high_threshold: f32,
    /// Optional Gaussian pre-blur before edge detection
    pub blur_sigma: Option<f32>,
    /// L-infinity dilation radius applied to the edge mask (0 disables)
    pub edge_dilation: u8,
    /// Contour simplification tolerance in pixels (0 keeps every chain vertex)
    pub simplify_tolerance: f64,
    pub extrusion_height: f64,
    pub smoothing_iterations: u32,
    pub output_kind: OutputKind,
    pub mesh_format: MeshFormat,
    pub mesh_source: MeshSource,
    pub min_artifact_bytes: u64,
    #[serde(rename = "cleanup_max_age_hours", with = "hours")]
    pub cleanup_max_age: Duration,
    /// Directory for every intermediate and output file
    pub work_dir: PathBuf,
    /// Destination folder handed to the storage collaborator
    pub storage_folder: String,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            edge_low_threshold: 100.0,
            edge_high_threshold: 200.0,
            blur_sigma: None,
            edge_dilation: 1,
            simplify_tolerance: 2.0,
            extrusion_height: 10.0,
            smoothing_iterations: 0,
            output_kind: OutputKind::Cad2d,
            mesh_format: MeshFormat::Stl,
            mesh_source: MeshSource::Contours,
            min_artifact_bytes: 128,
            cleanup_max_age: Duration::from_secs(24 * 60 * 60),
            work_dir: PathBuf::from("output"),
            storage_folder: "outputs".to_string(),
        }
    }
}

impl ConversionConfig {
    /// Load a config from a JSON file; missing fields take their defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    pub fn with_output_kind(mut self, kind: OutputKind) -> Self {
        self.output_kind = kind;
        self
    }

    pub fn with_extrusion_height(mut self, height: f64) -> Self {
        self.extrusion_height = height;
        self
    }

    pub fn with_work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = dir.into();
        self
    }

    pub fn with_cleanup_max_age(mut self, max_age: Duration) -> Self {
        self.cleanup_max_age = max_age;
        self
    }

    /// Reject settings that would make every request fail or misbehave.
    pub fn validate(&self) -> Result<(), ConversionError> {
        let low = self.edge_low_threshold;
        let high = self.edge_high_threshold;
        if !low.is_finite() || !high.is_finite() || low < 0.0 {
            return Err(ConversionError::InvalidConfig(format!(
                "edge thresholds must be finite and non-negative (got {low}, {high})"
            )));
        }
        if low > high {
            return Err(ConversionError::InvalidConfig(format!(
                "edge_low_threshold {low} is above edge_high_threshold {high}"
            )));
        }
        if let Some(sigma) = self.blur_sigma {
            if !(sigma.is_finite() && sigma > 0.0) {
                return Err(ConversionError::InvalidConfig(format!(
                    "blur_sigma must be positive (got {sigma})"
                )));
            }
        }
        if !(self.simplify_tolerance.is_finite() && self.simplify_tolerance >= 0.0) {
            return Err(ConversionError::InvalidConfig(format!(
                "simplify_tolerance must be non-negative (got {})",
                self.simplify_tolerance
            )));
        }
        if !(self.extrusion_height.is_finite() && self.extrusion_height > 0.0) {
            return Err(ConversionError::InvalidConfig(format!(
                "extrusion_height must be positive (got {})",
                self.extrusion_height
            )));
        }
        if self.storage_folder.trim().is_empty() {
            return Err(ConversionError::InvalidConfig(
                "storage_folder must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Serde helper storing a `Duration` as fractional hours.
mod hours {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64() / 3600.0)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let hours = f64::deserialize(deserializer)?;
        if !(hours.is_finite() && hours >= 0.0) {
            return Err(serde::de::Error::custom(format!(
                "cleanup_max_age_hours must be a non-negative number, got {hours}"
            )));
        }
        Ok(Duration::from_secs_f64(hours * 3600.0))
    }
}
