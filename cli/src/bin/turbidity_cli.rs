use clap::{Parser, Subcommand};
use cli::{analyze_files, resolve_config, run_monitor, ConfigFile, ConfigOverrides, DirectoryFrameSource, MonitorOptions};
use color_eyre::eyre::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{self, EnvFilter};
use turbidity::{AnalysisConfig, Pipeline};

#[derive(Parser)]
#[command(author, version, about = "Estimate water turbidity by counting particles in camera frames", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze one or more still images
    Analyze {
        /// Images to analyze
        #[arg(short, long = "image", required = true, num_args = 1..)]
        images: Vec<PathBuf>,
        /// Path to a TOML or JSON configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[command(flatten)]
        overrides: ConfigOverrides,
        /// Write annotated overlays (<stem>_annotated.png) into this directory
        #[arg(long)]
        annotate_dir: Option<PathBuf>,
        /// Write particle contours as GeoJSON (<stem>.geojson) into this directory
        #[arg(long)]
        geojson_dir: Option<PathBuf>,
        /// Print results as JSON instead of a text report
        #[arg(long)]
        json: bool,
    },
    /// Analyze a directory of frames as a live camera feed
    Monitor {
        /// Directory of frames, replayed in file-name order
        #[arg(short, long)]
        frames: PathBuf,
        /// Path to a TOML or JSON configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[command(flatten)]
        overrides: ConfigOverrides,
        /// Pause between captures in milliseconds
        #[arg(long, default_value = "100")]
        interval_ms: u64,
        /// Save every analyzed frame with its contours into this directory
        #[arg(long)]
        capture_dir: Option<PathBuf>,
    },
    /// Write a configuration file (defaults plus any overrides)
    Init {
        /// Destination, .toml or .json
        #[arg(short, long, default_value = "turbidity.toml")]
        output: PathBuf,
        #[command(flatten)]
        overrides: ConfigOverrides,
    },
    /// Print the JSON Schema of the configuration file
    Schema,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            images,
            config,
            overrides,
            annotate_dir,
            geojson_dir,
            json,
        } => {
            let config = resolve_config(config.as_deref(), &overrides)?;
            analyze_images(&images, &config, annotate_dir.as_deref(), geojson_dir.as_deref(), json).await?;
        }
        Commands::Monitor {
            frames,
            config,
            overrides,
            interval_ms,
            capture_dir,
        } => {
            let config = resolve_config(config.as_deref(), &overrides)?;
            monitor_frames(&frames, &config, interval_ms, capture_dir).await?;
        }
        Commands::Init { output, overrides } => {
            let config = resolve_config(None, &overrides)?;
            config.to_file(&output)?;
            info!("Configuration written to: {:?}", output);
        }
        Commands::Schema => {
            println!("{}", serde_json::to_string_pretty(&AnalysisConfig::schema())?);
        }
    }

    Ok(())
}

async fn analyze_images(
    images: &[PathBuf],
    config: &AnalysisConfig,
    annotate_dir: Option<&Path>,
    geojson_dir: Option<&Path>,
    json: bool,
) -> Result<()> {
    let pipeline = Arc::new(Pipeline::from_config(config)?);
    info!("{}", pipeline.info());

    for dir in [annotate_dir, geojson_dir].into_iter().flatten() {
        std::fs::create_dir_all(dir)?;
    }

    let analyzed = analyze_files(images, pipeline, config.threshold).await?;

    let mut reports = Vec::with_capacity(analyzed.len());
    for item in &analyzed {
        let stem = item
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "frame".to_string());

        if let Some(dir) = annotate_dir {
            let out = dir.join(format!("{stem}_annotated.png"));
            item.result.save_overlay(&item.frame, &out)?;
            info!("Annotated frame saved to: {:?}", out);
        }
        if let Some(dir) = geojson_dir {
            let out = dir.join(format!("{stem}.geojson"));
            item.result.save_geojson(&out)?;
            info!("Contours saved to: {:?}", out);
        }

        if json {
            reports.push(serde_json::json!({
                "path": item.path,
                "result": item.result,
            }));
        } else {
            println!("{}", item.path.display());
            for line in item.result.status_lines() {
                println!("  {line}");
            }
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    }
    Ok(())
}

async fn monitor_frames(
    frames: &Path,
    config: &AnalysisConfig,
    interval_ms: u64,
    capture_dir: Option<PathBuf>,
) -> Result<()> {
    let source = DirectoryFrameSource::new(frames)?;
    let pipeline = Arc::new(Pipeline::from_config(config)?);
    let options = MonitorOptions {
        interval: Duration::from_millis(interval_ms),
        capture_dir,
        threshold: config.threshold,
    };

    let summary = run_monitor(source, pipeline, options).await?;
    if summary.frames_rejected > 0 {
        warn!("{} frames were rejected as invalid", summary.frames_rejected);
    }

    match &summary.last {
        Some(result) => {
            println!("Last frame:");
            for line in result.status_lines() {
                println!("  {line}");
            }
        }
        None => println!("No frames analyzed"),
    }
    println!(
        "Frames: {} captured, {} analyzed, {} dropped ({} invalid)",
        summary.frames_captured, summary.frames_analyzed, summary.frames_dropped, summary.frames_rejected
    );
    Ok(())
}
