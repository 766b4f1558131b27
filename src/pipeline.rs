use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::{ConversionConfig, MeshSource, OutputKind};
use crate::detection::{preprocessing, ContourExtractor};
use crate::error::{ConversionError, ConversionResult, Stage};
use crate::cleanup::{self, SweepReport};
use crate::mesh::{self, extrude_polygons, MeshReport, Polygon, ProfileCandidate};
use crate::models::{Contour, SkippedItem};
use crate::storage::{ArtifactStore, Destination, Locator};
use crate::vector::{self, build_path_set, CadReport, VectorDocument};

/// Where a request is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestState {
    Received,
    Extracted,
    Serialized,
    Converted,
    Validated,
    Delivered,
    Failed,
}

impl fmt::Display for RequestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Received => "RECEIVED",
            Self::Extracted => "EXTRACTED",
            Self::Serialized => "SERIALIZED",
            Self::Converted => "CONVERTED",
            Self::Validated => "VALIDATED",
            Self::Delivered => "DELIVERED",
            Self::Failed => "FAILED",
        };
        f.write_str(name)
    }
}

/// What the conversion stage reported for the requested output kind
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StageReport {
    Vector { segments: usize },
    Cad(CadReport),
    Mesh(MeshReport),
}

impl StageReport {
    /// Every item the stage skipped instead of failing
    pub fn skipped(&self) -> Vec<&SkippedItem> {
        match self {
            Self::Vector { .. } => Vec::new(),
            Self::Cad(report) => report.rejected.iter().chain(report.failed.iter()).collect(),
            Self::Mesh(report) => report.skipped.iter().collect(),
        }
    }
}

/// Result of a delivered request
#[derive(Debug, Clone, Serialize)]
pub struct ConversionOutcome {
    pub request_id: Uuid,
    pub input: PathBuf,
    pub kind: OutputKind,
    /// The serialized intermediate vector document
    pub vector_document: PathBuf,
    /// Final artifact, kept in the work directory
    pub artifact: PathBuf,
    pub artifact_bytes: u64,
    pub contours: usize,
    pub paths: usize,
    pub report: StageReport,
    /// Set when a store accepted the artifact
    pub locator: Option<Locator>,
    pub history: Vec<RequestState>,
}

/// Debug configuration for pipeline execution
#[derive(Clone, Debug)]
pub struct DebugConfig {
    /// Directory receiving the grayscale input and edge mask of each request
    pub output_dir: PathBuf,
}

/// Per-request bookkeeping: id, state history and the files written so far
struct Request {
    id: Uuid,
    history: Vec<RequestState>,
    written: Vec<PathBuf>,
}

impl Request {
    fn new() -> Self {
        let id = Uuid::new_v4();
        info!("Request {} {}", id, RequestState::Received);
        Self {
            id,
            history: vec![RequestState::Received],
            written: Vec::new(),
        }
    }

    fn advance(&mut self, state: RequestState) {
        info!("Request {} {}", self.id, state);
        self.history.push(state);
    }

    /// Reserve `<id>.<ext>` in the work directory
    fn file(&mut self, work_dir: &Path, extension: &str) -> PathBuf {
        let path = work_dir.join(format!("{}.{}", self.id, extension));
        self.written.push(path.clone());
        path
    }

    /// Remove everything this request wrote
    fn discard(&self) {
        for path in &self.written {
            match fs::remove_file(path) {
                Ok(()) => debug!("Removed {}", path.display()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!("Failed to remove {}: {}", path.display(), e),
            }
        }
    }
}

/// Runs conversion requests from raster input to a delivered artifact
pub struct Pipeline {
    config: ConversionConfig,
    extractor: ContourExtractor,
    store: Option<Arc<dyn ArtifactStore>>,
    debug: Option<DebugConfig>,
}

impl Pipeline {
    /// Create a pipeline with a validated configuration
    pub fn new(config: ConversionConfig) -> ConversionResult<Self> {
        config.validate()?;
        Ok(Self {
            extractor: ContourExtractor::from_config(&config),
            config,
            store: None,
            debug: None,
        })
    }

    /// Hand delivered artifacts to a store
    pub fn with_store(mut self, store: Arc<dyn ArtifactStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Enable debug mode with output directory
    /// The directory must be empty or non-existent
    pub fn with_debug(mut self, output_dir: PathBuf) -> Result<Self> {
        if output_dir.exists() {
            let entries = fs::read_dir(&output_dir)?;
            if entries.count() > 0 {
                return Err(anyhow::anyhow!(
                    "Debug directory is not empty: {}",
                    output_dir.display()
                ));
            }
        } else {
            fs::create_dir_all(&output_dir)?;
        }

        self.debug = Some(DebugConfig { output_dir });
        Ok(self)
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    /// Remove work-directory files older than the configured `cleanup_max_age`
    pub fn sweep_stale(&self) -> Result<SweepReport> {
        cleanup::sweep_stale_files(&self.config.work_dir, self.config.cleanup_max_age)
    }

    /// Convert one raster file.
    ///
    /// On any failure before delivery the request's files are removed. When
    /// only delivery fails the artifact stays on disk and the error names it.
    pub fn run(&self, input: &Path) -> ConversionResult<ConversionOutcome> {
        let mut request = Request::new();
        match self.execute(input, &mut request) {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                request.advance(RequestState::Failed);
                if !matches!(e, ConversionError::Delivery { .. }) {
                    request.discard();
                }
                warn!("Request {} failed: {}", request.id, e);
                Err(e)
            }
        }
    }

    fn execute(&self, input: &Path, request: &mut Request) -> ConversionResult<ConversionOutcome> {
        let work_dir = &self.config.work_dir;
        fs::create_dir_all(work_dir).map_err(|source| ConversionError::Io {
            path: work_dir.clone(),
            source,
        })?;

        // Step 1: Edges and contours
        let gray = preprocessing::load_grayscale(input)?;
        let extraction = self.extractor.extract_with_edges(&gray);
        self.save_debug_images(request.id, &gray, &extraction.edges);

        let contours = extraction.contours;
        let paths = build_path_set(&contours);
        if paths.is_empty() {
            return Err(ConversionError::NoGeometryFound);
        }
        info!(
            "Extracted {} contour(s), {} path(s) from {} for {} output",
            contours.len(),
            paths.len(),
            input.display(),
            self.config.output_kind.as_str()
        );
        request.advance(RequestState::Extracted);

        // Step 2: Vector document
        let svg_path = request.file(work_dir, "svg");
        vector::write_svg(&paths, &svg_path).map_err(|source| ConversionError::Io {
            path: svg_path.clone(),
            source,
        })?;
        request.advance(RequestState::Serialized);

        // Step 3: Requested output
        let (artifact, report) = match self.config.output_kind {
            OutputKind::Vector => (
                svg_path.clone(),
                StageReport::Vector {
                    segments: paths.segment_count(),
                },
            ),
            OutputKind::Cad2d => {
                let dxf_path = request.file(work_dir, "dxf");
                let report = vector::svg_to_dxf(&svg_path, &dxf_path)
                    .map_err(|e| ConversionError::conversion(Stage::Cad, e))?;
                (dxf_path, StageReport::Cad(report))
            }
            OutputKind::Mesh => {
                let extension = self.config.mesh_format.extension();
                let mesh_path = request.file(work_dir, extension);
                let report = self.build_mesh(&contours, &svg_path, &mesh_path)?;
                (mesh_path, StageReport::Mesh(report))
            }
        };
        request.advance(RequestState::Converted);

        // Step 4: Artifact sanity
        let artifact_bytes = self.validate_artifact(&artifact)?;
        request.advance(RequestState::Validated);

        // Step 5: Delivery
        let locator = match &self.store {
            Some(store) => {
                let name = artifact
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| request.id.to_string());
                let destination = Destination::new(self.config.storage_folder.clone(), name);
                debug!("Uploading {} via {}", artifact.display(), store.name());
                let locator = store.upload(&artifact, &destination).map_err(|source| {
                    ConversionError::Delivery {
                        artifact: artifact.clone(),
                        source,
                    }
                })?;
                Some(locator)
            }
            None => None,
        };
        request.advance(RequestState::Delivered);

        Ok(ConversionOutcome {
            request_id: request.id,
            input: input.to_path_buf(),
            kind: self.config.output_kind,
            vector_document: svg_path,
            artifact,
            artifact_bytes,
            contours: contours.len(),
            paths: paths.len(),
            report,
            locator,
            history: request.history.clone(),
        })
    }

    /// Extrude the configured polygon source and write the mesh file
    fn build_mesh(
        &self,
        contours: &[Contour],
        svg_path: &Path,
        mesh_path: &Path,
    ) -> ConversionResult<MeshReport> {
        let candidates: Vec<ProfileCandidate> = match self.config.mesh_source {
            MeshSource::Contours => contours
                .iter()
                .enumerate()
                .filter(|(idx, contour)| {
                    let usable = contour.len() >= 3;
                    if !usable {
                        debug!("Contour {} has {} points, not extruded", idx, contour.len());
                    }
                    usable
                })
                .map(|(idx, contour)| {
                    ProfileCandidate::new(idx, Ok(Polygon::from_contour(contour)))
                })
                .collect(),
            MeshSource::VectorDocument => {
                let document = VectorDocument::read(svg_path)
                    .map_err(|e| ConversionError::conversion(Stage::Mesh, e))?;
                document
                    .paths
                    .iter()
                    .enumerate()
                    .flat_map(|(idx, path)| {
                        let parts = Polygon::split_parsed_path(path);
                        let multi = parts.len() > 1;
                        parts.into_iter().enumerate().map(move |(part, polygon)| {
                            let candidate = ProfileCandidate::new(idx, polygon);
                            if multi {
                                candidate.with_part(part)
                            } else {
                                candidate
                            }
                        })
                    })
                    .collect()
            }
        };

        let (solids, skipped) = extrude_polygons(
            candidates,
            self.config.extrusion_height,
            self.config.smoothing_iterations,
        );
        if solids.is_empty() {
            return Err(ConversionError::NoValidGeometryForMesh {
                skipped: skipped.len(),
            });
        }

        let triangles = mesh::write_mesh(&solids, self.config.mesh_format, mesh_path)
            .map_err(|e| ConversionError::conversion(Stage::Mesh, e))?;
        info!(
            "Extruded {} solid(s), {} triangle(s) to {}",
            solids.len(),
            triangles,
            mesh_path.display()
        );

        Ok(MeshReport {
            solids: solids.len(),
            faces: solids.face_count(),
            triangles,
            skipped,
        })
    }

    fn validate_artifact(&self, artifact: &Path) -> ConversionResult<u64> {
        let metadata = fs::metadata(artifact).map_err(|_| ConversionError::ArtifactRejected {
            path: artifact.to_path_buf(),
            reason: "artifact was not written".to_string(),
        })?;
        let bytes = metadata.len();
        if bytes < self.config.min_artifact_bytes {
            return Err(ConversionError::ArtifactRejected {
                path: artifact.to_path_buf(),
                reason: format!(
                    "{} bytes is below the {} byte minimum",
                    bytes, self.config.min_artifact_bytes
                ),
            });
        }
        Ok(bytes)
    }

    /// Save the grayscale input and edge mask if debug mode is enabled
    fn save_debug_images(&self, id: Uuid, gray: &image::GrayImage, edges: &image::GrayImage) {
        let Some(debug_config) = &self.debug else {
            return;
        };
        for (suffix, image) in [("gray", gray), ("edges", edges)] {
            let path = debug_config.output_dir.join(format!("{id}_{suffix}.png"));
            match image.save(&path) {
                Ok(()) => debug!("Debug: saved {}", path.display()),
                Err(e) => warn!("Failed to save debug image {}: {}", path.display(), e),
            }
        }
    }
}

/// One input of a batch and how it ended
#[derive(Debug)]
pub struct BatchItem {
    pub input: PathBuf,
    pub result: ConversionResult<ConversionOutcome>,
}

/// Run independent requests concurrently on the blocking pool.
///
/// Results come back in input order.
pub async fn convert_batch(pipeline: Arc<Pipeline>, inputs: Vec<PathBuf>) -> Vec<BatchItem> {
    let handles: Vec<_> = inputs
        .into_iter()
        .map(|input| {
            let pipeline = Arc::clone(&pipeline);
            let task_input = input.clone();
            let handle = tokio::task::spawn_blocking(move || pipeline.run(&task_input));
            (input, handle)
        })
        .collect();

    let mut items = Vec::with_capacity(handles.len());
    for (input, handle) in handles {
        let result = match handle.await {
            Ok(result) => result,
            Err(e) => Err(ConversionError::TaskFailed {
                input: input.clone(),
                reason: e.to_string(),
            }),
        };
        items.push(BatchItem { input, result });
    }
    items
}
