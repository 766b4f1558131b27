pub mod cleanup;
pub mod config;
pub mod detection;
pub mod error;
pub mod mesh;
pub mod models;
pub mod pipeline;
pub mod storage;
pub mod vector;

pub use cleanup::{sweep_stale_files, sweep_stale_files_at, SweepReport};
pub use config::{ConversionConfig, MeshFormat, MeshSource, OutputKind};
pub use detection::ContourExtractor;
pub use error::{ConversionError, ConversionResult, Stage};
pub use models::{Contour, LineSegment, Path, PathSet, PixelPoint, Point2, SkippedItem};
pub use pipeline::{
    convert_batch, BatchItem, ConversionOutcome, DebugConfig, Pipeline, RequestState, StageReport,
};
pub use storage::{ArtifactStore, Destination, InlineStore, LocalDirectoryStore, Locator, StoreError};
