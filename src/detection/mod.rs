pub mod preprocessing;
pub mod contours;
pub mod simplify;

use image::GrayImage;
use tracing::debug;

use crate::config::ConversionConfig;
use crate::models::Contour;

/// Edge detection and contour tracing settings
#[derive(Debug, Clone, PartialEq)]
pub struct ContourExtractor {
    pub low_threshold: f32,
    pub high_threshold: f32,
    pub blur_sigma: Option<f32>,
    pub dilation: u8,
    pub simplify_tolerance: f64,
}

/// Intermediate rasters kept for debug output
pub struct Extraction {
    pub edges: GrayImage,
    pub contours: Vec<Contour>,
}

impl ContourExtractor {
    pub fn from_config(config: &ConversionConfig) -> Self {
        Self {
            low_threshold: config.edge_low_threshold,
            high_threshold: config.edge_high_threshold,
            blur_sigma: config.blur_sigma,
            dilation: config.edge_dilation,
            simplify_tolerance: config.simplify_tolerance,
        }
    }

    /// Trace contours from a grayscale raster, keeping the edge mask.
    /// An empty result is not an error here.
    pub fn extract_with_edges(&self, gray: &GrayImage) -> Extraction {
        // Step 1: Optional denoise
        let blurred;
        let source = match self.blur_sigma {
            Some(sigma) => {
                blurred = preprocessing::apply_blur(gray, sigma);
                &blurred
            }
            None => gray,
        };

        // Step 2: Detect edges and bridge small breaks
        let edges = preprocessing::detect_edges(source, self.low_threshold, self.high_threshold);
        let edges = preprocessing::close_gaps(&edges, self.dilation);

        // Step 3: Trace outer borders
        let traced = contours::find_external_contours(&edges);
        debug!(
            "Traced {} external contour(s) from {}x{} edge mask",
            traced.len(),
            edges.width(),
            edges.height()
        );

        // Step 4: Simplify each closed ring
        let contours = traced
            .into_iter()
            .map(|contour| {
                if contour.closed && self.simplify_tolerance > 0.0 {
                    let points = simplify::simplify_ring(&contour.points, self.simplify_tolerance);
                    Contour::new(points, true)
                } else {
                    contour
                }
            })
            .filter(|contour| contour.len() >= 2)
            .collect();

        Extraction { edges, contours }
    }
}

impl Default for ContourExtractor {
    fn default() -> Self {
        Self::from_config(&ConversionConfig::default())
    }
}
