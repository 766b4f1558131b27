use std::path::Path;

use image::{DynamicImage, GrayImage, ImageReader};
use imageproc::distance_transform::Norm;
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;
use imageproc::morphology::dilate;

use crate::error::ConversionError;

/// Decode an image file and convert it to grayscale
pub fn load_grayscale(path: &Path) -> Result<GrayImage, ConversionError> {
    let to_load_error = |source: image::ImageError| ConversionError::ImageLoad {
        path: path.to_path_buf(),
        source,
    };

    let img = ImageReader::open(path)
        .map_err(|e| to_load_error(image::ImageError::IoError(e)))?
        .with_guessed_format()
        .map_err(|e| to_load_error(image::ImageError::IoError(e)))?
        .decode()
        .map_err(to_load_error)?;

    Ok(to_grayscale(&img))
}

/// Convert image to grayscale
pub fn to_grayscale(img: &DynamicImage) -> GrayImage {
    img.to_luma8()
}

/// Apply Gaussian blur to reduce noise
pub fn apply_blur(img: &GrayImage, sigma: f32) -> GrayImage {
    gaussian_blur_f32(img, sigma)
}

/// Detect edges using Canny edge detector
pub fn detect_edges(img: &GrayImage, low_threshold: f32, high_threshold: f32) -> GrayImage {
    canny(img, low_threshold, high_threshold)
}

/// Thicken edge strokes so one-pixel breaks don't split a boundary
pub fn close_gaps(edges: &GrayImage, radius: u8) -> GrayImage {
    if radius == 0 {
        return edges.clone();
    }
    dilate(edges, Norm::LInf, radius)
}
