mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from vectorforge for tests
pub use vectorforge::{
    ConversionConfig, ConversionError, MeshFormat, MeshSource, OutputKind, Pipeline, RequestState,
    StageReport,
};
