//! Failure kinds and the no-leftovers guarantee.

mod common;

use std::path::Path;
use std::sync::Arc;

use vectorforge::{ArtifactStore, Destination, Locator, StoreError};

use common::*;

struct FailingStore;

impl ArtifactStore for FailingStore {
    fn upload(&self, _artifact: &Path, _destination: &Destination) -> Result<Locator, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    fn name(&self) -> &str {
        "failing"
    }
}

#[test]
fn test_blank_images_have_no_geometry() -> anyhow::Result<()> {
    for value in [0u8, 255u8] {
        let image = create_uniform_image(value);
        let (config, _dir) = test_config(OutputKind::Cad2d);
        let work_dir = config.work_dir.clone();
        let pipeline = Pipeline::new(config)?;

        let err = pipeline.run(image.path()).unwrap_err();
        assert!(matches!(err, ConversionError::NoGeometryFound), "{err}");
        assert!(err.is_user_correctable());
        assert!(list_files(&work_dir).is_empty());
    }
    Ok(())
}

#[test]
fn test_undecodable_image_is_image_load_error() -> anyhow::Result<()> {
    let file = tempfile::Builder::new().suffix(".png").tempfile()?;
    std::fs::write(file.path(), b"definitely not a png")?;
    let (config, _dir) = test_config(OutputKind::Vector);

    let err = Pipeline::new(config)?.run(file.path()).unwrap_err();
    assert!(matches!(err, ConversionError::ImageLoad { .. }), "{err}");
    Ok(())
}

#[test]
fn test_missing_image_is_image_load_error() -> anyhow::Result<()> {
    let (config, dir) = test_config(OutputKind::Vector);
    let err = Pipeline::new(config)?
        .run(&dir.path().join("missing.png"))
        .unwrap_err();
    assert!(matches!(err, ConversionError::ImageLoad { .. }), "{err}");
    Ok(())
}

#[test]
fn test_undersized_artifact_is_rejected_and_removed() -> anyhow::Result<()> {
    let image = create_square_image();
    let (mut config, _dir) = test_config(OutputKind::Cad2d);
    config.min_artifact_bytes = 50_000_000;
    let work_dir = config.work_dir.clone();

    let err = Pipeline::new(config)?.run(image.path()).unwrap_err();
    assert!(matches!(err, ConversionError::ArtifactRejected { .. }), "{err}");
    assert!(list_files(&work_dir).is_empty());
    Ok(())
}

#[test]
fn test_delivery_failure_keeps_artifact() -> anyhow::Result<()> {
    let image = create_square_image();
    let (config, _dir) = test_config(OutputKind::Cad2d);
    let pipeline = Pipeline::new(config)?.with_store(Arc::new(FailingStore));

    let err = pipeline.run(image.path()).unwrap_err();
    match err {
        ConversionError::Delivery { artifact, source } => {
            assert!(artifact.exists());
            assert!(matches!(source, StoreError::Unavailable(_)));
        }
        other => anyhow::bail!("expected delivery failure, got {other}"),
    }
    Ok(())
}

#[test]
fn test_invalid_config_is_rejected_up_front() {
    let mut config = ConversionConfig::default();
    config.edge_low_threshold = 250.0;
    config.edge_high_threshold = 100.0;
    assert!(matches!(
        Pipeline::new(config),
        Err(ConversionError::InvalidConfig(_))
    ));

    let config = ConversionConfig::default().with_extrusion_height(0.0);
    assert!(matches!(
        Pipeline::new(config),
        Err(ConversionError::InvalidConfig(_))
    ));
}

#[test]
fn test_debug_directory_must_be_empty() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    std::fs::write(dir.path().join("leftover.png"), b"x")?;
    let result = Pipeline::new(ConversionConfig::default())?.with_debug(dir.path().to_path_buf());
    assert!(result.is_err());
    Ok(())
}

#[test]
fn test_debug_images_are_saved() -> anyhow::Result<()> {
    let image = create_square_image();
    let (config, dir) = test_config(OutputKind::Vector);
    let debug_dir = dir.path().join("debug");
    let outcome = Pipeline::new(config)?
        .with_debug(debug_dir.clone())?
        .run(image.path())?;

    assert!(debug_dir.join(format!("{}_gray.png", outcome.request_id)).exists());
    assert!(debug_dir.join(format!("{}_edges.png", outcome.request_id)).exists());
    Ok(())
}
