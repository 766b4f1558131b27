//! Time-based sweep of pipeline output.

mod common;

use std::time::Duration;

use time::OffsetDateTime;
use vectorforge::{sweep_stale_files, sweep_stale_files_at};

use common::*;

#[test]
fn test_sweep_removes_old_outputs_once() -> anyhow::Result<()> {
    let image = create_square_image();
    let (config, _dir) = test_config(OutputKind::Cad2d);
    let work_dir = config.work_dir.clone();
    let max_age = config.cleanup_max_age;
    let outcome = Pipeline::new(config)?.run(image.path())?;

    // svg + dxf
    assert_eq!(list_files(&work_dir).len(), 2);

    let fresh = sweep_stale_files(&work_dir, max_age)?;
    assert!(fresh.deleted.is_empty());
    assert_eq!(fresh.kept, 2);

    let later = OffsetDateTime::now_utc() + max_age + Duration::from_secs(60);
    let first = sweep_stale_files_at(&work_dir, max_age, later)?;
    assert_eq!(first.deleted.len(), 2);
    assert!(!outcome.artifact.exists());

    let second = sweep_stale_files_at(&work_dir, max_age, later)?;
    assert!(second.deleted.is_empty());
    assert!(list_files(&work_dir).is_empty());
    Ok(())
}

#[test]
fn test_pipeline_sweep_uses_configured_age() -> anyhow::Result<()> {
    let image = create_square_image();
    let (config, _dir) = test_config(OutputKind::Vector);
    let work_dir = config.work_dir.clone();

    let keeping = Pipeline::new(config.clone())?;
    keeping.run(image.path())?;
    assert_eq!(list_files(&work_dir).len(), 1);

    let report = keeping.sweep_stale()?;
    assert!(report.deleted.is_empty());
    assert_eq!(report.kept, 1);

    std::thread::sleep(Duration::from_millis(20));
    let purging = Pipeline::new(config.with_cleanup_max_age(Duration::ZERO))?;
    let report = purging.sweep_stale()?;
    assert_eq!(report.deleted.len(), 1);
    assert!(list_files(&work_dir).is_empty());

    // idempotent
    assert!(purging.sweep_stale()?.deleted.is_empty());
    Ok(())
}
