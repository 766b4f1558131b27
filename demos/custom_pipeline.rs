use std::env;
use std::path::PathBuf;

use vectorforge::{ConversionConfig, MeshFormat, OutputKind, Pipeline, StageReport};

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <image_path>", args[0]);
        std::process::exit(1);
    }
    let image_path = PathBuf::from(&args[1]);

    // Example 1: Default settings, DXF output
    println!("=== 2D Drawing ===");
    let pipeline = Pipeline::new(ConversionConfig::default().with_work_dir("demo_output"))?;
    let outcome = pipeline.run(&image_path)?;
    println!("Artifact: {}", outcome.artifact.display());
    println!("Paths: {}", outcome.paths);
    if let StageReport::Cad(report) = &outcome.report {
        println!("Line entities: {} ({} skipped)", report.entities, report.skipped_count());
    }

    // Example 2: Softer edges, smoothed OBJ extrusion
    println!("\n=== Extruded Mesh ===");
    let mut config = ConversionConfig::default()
        .with_work_dir("demo_output")
        .with_output_kind(OutputKind::Mesh)
        .with_extrusion_height(5.0);
    config.edge_low_threshold = 50.0;
    config.edge_high_threshold = 100.0;
    config.blur_sigma = Some(1.5);
    config.smoothing_iterations = 2;
    config.mesh_format = MeshFormat::Obj;

    let outcome = Pipeline::new(config)?.run(&image_path)?;
    println!("Artifact: {}", outcome.artifact.display());
    if let StageReport::Mesh(report) = &outcome.report {
        println!(
            "Solids: {}, faces: {}, triangles: {}",
            report.solids, report.faces, report.triangles
        );
        for skipped in &report.skipped {
            println!("  skipped polygon {}: {}", skipped.source, skipped.reason);
        }
    }

    Ok(())
}
