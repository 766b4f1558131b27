use std::path::{Path, PathBuf};

use image::{GrayImage, Luma};
use tempfile::{NamedTempFile, TempDir};
use vectorforge::{ConversionConfig, OutputKind};

/// Writes a grayscale image to a temp PNG file.
/// The file will be automatically cleaned up when dropped.
pub fn save_temp_png(img: &GrayImage) -> NamedTempFile {
    let file = tempfile::Builder::new()
        .suffix(".png")
        .tempfile()
        .expect("Failed to create temp image file");
    img.save_with_format(file.path(), image::ImageFormat::Png)
        .expect("Failed to save test image");
    file
}

/// White canvas with filled black rectangles, each given as (x, y, width, height).
pub fn draw_rects(width: u32, height: u32, rects: &[(u32, u32, u32, u32)]) -> GrayImage {
    GrayImage::from_fn(width, height, |x, y| {
        let inside = rects
            .iter()
            .any(|&(rx, ry, rw, rh)| x >= rx && x < rx + rw && y >= ry && y < ry + rh);
        if inside { Luma([0u8]) } else { Luma([255u8]) }
    })
}

/// 100x100 white image with a centered 40x40 black square.
pub fn create_square_image() -> NamedTempFile {
    save_temp_png(&draw_rects(100, 100, &[(30, 30, 40, 40)]))
}

/// Image of a single flat intensity.
pub fn create_uniform_image(value: u8) -> NamedTempFile {
    save_temp_png(&GrayImage::from_pixel(100, 100, Luma([value])))
}

/// Two separated squares.
pub fn create_two_squares_image() -> NamedTempFile {
    save_temp_png(&draw_rects(160, 100, &[(20, 30, 40, 40), (100, 30, 40, 40)]))
}

/// Config writing into a fresh temp work directory.
/// Returns both the config and the directory (which must be kept alive).
pub fn test_config(kind: OutputKind) -> (ConversionConfig, TempDir) {
    let dir = TempDir::new().expect("Failed to create temp directory");
    let config = ConversionConfig::default()
        .with_output_kind(kind)
        .with_work_dir(dir.path().join("work"));
    (config, dir)
}

/// Files currently in a directory; empty if it does not exist.
pub fn list_files(dir: &Path) -> Vec<PathBuf> {
    match std::fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file())
            .collect(),
        Err(_) => Vec::new(),
    }
}
