use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};

use vectorforge::{
    convert_batch, ConversionConfig, LocalDirectoryStore, Locator, MeshFormat,
    MeshSource, OutputKind, Pipeline, StageReport,
};

#[derive(Parser)]
#[command(name = "vectorforge")]
#[command(about = "Turn line-drawing photos into SVG, DXF and extruded meshes")]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert one or more raster images
    Convert {
        /// Input image files
        #[arg(value_name = "IMAGE", required = true)]
        images: Vec<PathBuf>,

        /// JSON configuration file
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Output kind
        #[arg(long, value_enum)]
        kind: Option<OutputKind>,

        /// Extrusion height for mesh output
        #[arg(long)]
        height: Option<f64>,

        /// Mesh file format
        #[arg(long, value_enum)]
        format: Option<MeshFormat>,

        /// Polygon source for mesh output
        #[arg(long, value_enum)]
        mesh_source: Option<MeshSource>,

        /// Work directory for intermediate and output files
        #[arg(long, value_name = "DIR")]
        out_dir: Option<PathBuf>,

        /// Copy delivered artifacts under this directory
        #[arg(long, value_name = "DIR")]
        store: Option<PathBuf>,

        /// Save grayscale and edge images to directory (must be empty)
        #[arg(long, value_name = "DIR")]
        debug_out: Option<PathBuf>,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete stale files from the work directory
    Sweep {
        /// JSON configuration file supplying `work_dir` and `cleanup_max_age_hours`
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Directory to sweep (overrides the configured work directory)
        #[arg(long, value_name = "DIR")]
        dir: Option<PathBuf>,

        /// Maximum file age in hours (overrides the configured age)
        #[arg(long)]
        max_age_hours: Option<f64>,
    },
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    let env_filter = EnvFilter::from_default_env().add_directive(level.into());

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

fn load_config(path: Option<PathBuf>) -> anyhow::Result<ConversionConfig> {
    match path {
        Some(path) => ConversionConfig::from_json_file(&path),
        None => Ok(ConversionConfig::default()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    init_logging(args.verbose);

    match args.command {
        Command::Convert {
            images,
            config,
            kind,
            height,
            format,
            mesh_source,
            out_dir,
            store,
            debug_out,
            json,
        } => {
            let mut config = load_config(config)?;
            if let Some(kind) = kind {
                config.output_kind = kind;
            }
            if let Some(height) = height {
                config.extrusion_height = height;
            }
            if let Some(format) = format {
                config.mesh_format = format;
            }
            if let Some(source) = mesh_source {
                config.mesh_source = source;
            }
            if let Some(dir) = out_dir {
                config.work_dir = dir;
            }

            let mut pipeline = Pipeline::new(config)?;
            if let Some(root) = store {
                pipeline = pipeline.with_store(Arc::new(LocalDirectoryStore::new(root)));
            }
            if let Some(debug_dir) = debug_out {
                pipeline = pipeline.with_debug(debug_dir)?;
            }

            let total = images.len();
            let items = convert_batch(Arc::new(pipeline), images).await;
            let failed = items.iter().filter(|item| item.result.is_err()).count();

            if json {
                let results: Vec<serde_json::Value> = items
                    .iter()
                    .map(|item| match &item.result {
                        Ok(outcome) => serde_json::json!({
                            "input": item.input,
                            "outcome": outcome,
                        }),
                        Err(e) => serde_json::json!({
                            "input": item.input,
                            "error": e.to_string(),
                            "user_correctable": e.is_user_correctable(),
                        }),
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&results)?);
            } else {
                println!("\n=== Conversion Results ===");
                for item in &items {
                    match &item.result {
                        Ok(outcome) => {
                            println!(
                                "  {} -> {} ({} bytes, {} path(s))",
                                item.input.display(),
                                outcome.artifact.display(),
                                outcome.artifact_bytes,
                                outcome.paths
                            );
                            match &outcome.report {
                                StageReport::Vector { segments } => {
                                    println!("    {} segment(s)", segments)
                                }
                                StageReport::Cad(report) => println!(
                                    "    {} line entities, {} skipped",
                                    report.entities,
                                    report.skipped_count()
                                ),
                                StageReport::Mesh(report) => println!(
                                    "    {} solid(s), {} triangle(s), {} skipped",
                                    report.solids,
                                    report.triangles,
                                    report.skipped.len()
                                ),
                            }
                            if let Some(Locator::Url(url)) = &outcome.locator {
                                println!("    stored at {}", url);
                            }
                        }
                        Err(e) => println!("  {} failed: {}", item.input.display(), e),
                    }
                }
            }

            if failed > 0 {
                anyhow::bail!("{} of {} conversion(s) failed", failed, total);
            }
        }
        Command::Sweep {
            config,
            dir,
            max_age_hours,
        } => {
            let mut config = load_config(config)?;
            if let Some(dir) = dir {
                config.work_dir = dir;
            }
            if let Some(hours) = max_age_hours {
                if !(hours.is_finite() && hours >= 0.0) {
                    anyhow::bail!("--max-age-hours must be a non-negative number");
                }
                config.cleanup_max_age = Duration::from_secs_f64(hours * 3600.0);
            }

            let pipeline = Pipeline::new(config)?;
            let work_dir = &pipeline.config().work_dir;
            let report = pipeline
                .sweep_stale()
                .with_context(|| format!("Sweep of {} failed", work_dir.display()))?;
            println!(
                "Removed {} stale file(s) from {}, kept {}",
                report.deleted.len(),
                work_dir.display(),
                report.kept
            );
        }
    }

    Ok(())
}
