//! Spectrum contour renderer.
//!
//! Synthesizes 2D spectra, contours them through the asynchronous pipeline
//! (or the immediate path) and writes the result as a PNG.

mod synth;

use anyhow::{Context, Result};
use clap::Parser;
use std::{env, path::PathBuf, sync::Arc};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use contour_engine::{AxisWindow, ContourStyle, PixmapSurface, WindowedSource};
use render_pipeline::{render_immediate, ContourLayer, ContourPipeline, PipelineConfig};

/// Positive/negative color pairs for overlaid datasets.
const PALETTE: &[([u8; 4], [u8; 4])] = &[
    ([20, 20, 20, 255], [200, 30, 30, 255]),
    ([30, 90, 200, 255], [230, 140, 20, 255]),
    ([20, 150, 60, 255], [150, 40, 170, 255]),
];

#[derive(Parser, Debug)]
#[command(name = "spectrum-render")]
#[command(about = "Render contour plots of synthetic 2D spectra")]
struct Args {
    /// Output PNG path
    #[arg(short, long, default_value = "spectrum.png")]
    output: PathBuf,

    /// Image width in pixels
    #[arg(long, default_value = "800")]
    width: u32,

    /// Image height in pixels
    #[arg(long, default_value = "800")]
    height: u32,

    /// Spectrum size in samples per axis
    #[arg(long, default_value = "1024")]
    samples: usize,

    /// Chunk edge in samples
    #[arg(long, env = "CONTOUR_CHUNK_SIZE", default_value = "256")]
    chunk_size: usize,

    /// Number of overlaid datasets
    #[arg(long, default_value = "1")]
    datasets: usize,

    /// Zoom factor around the spectrum center
    #[arg(long, default_value = "1.0")]
    zoom: f64,

    /// Contour style JSON file (defaults are used otherwise)
    #[arg(long, env = "CONTOUR_STYLE")]
    style: Option<PathBuf>,

    /// Render synchronously instead of through the pipeline
    #[arg(long)]
    immediate: bool,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    /// Number of tokio worker threads (default: number of CPU cores)
    #[arg(long)]
    worker_threads: Option<usize>,
}

fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();

    if let Some(threads) = args.worker_threads {
        runtime_builder.worker_threads(threads);
    } else if let Ok(threads_str) = env::var("TOKIO_WORKER_THREADS") {
        if let Ok(threads) = threads_str.parse::<usize>() {
            runtime_builder.worker_threads(threads);
        }
    }

    let runtime = runtime_builder.build()?;
    runtime.block_on(async_main(args))?;
    Ok(())
}

async fn async_main(args: Args) -> Result<()> {
    init_tracing(&args)?;

    let config = PipelineConfig::from_env();
    config.validate().map_err(anyhow::Error::msg)?;

    let base_style = match &args.style {
        Some(path) => ContourStyle::from_file(&path.to_string_lossy())
            .with_context(|| format!("loading style {}", path.display()))?,
        None => ContourStyle {
            base_level: 40.0,
            multiplier: 1.3,
            n_levels: 12,
            ..ContourStyle::default()
        },
    };

    let layers = build_layers(&args, &base_style)?;
    let mut surface = PixmapSurface::new(args.width, args.height)?;
    surface.fill([255, 255, 255, 255]);

    info!(
        datasets = layers.len(),
        samples = args.samples,
        chunk_size = args.chunk_size,
        immediate = args.immediate,
        "Rendering spectrum"
    );

    let surface = if args.immediate {
        let report = render_immediate(
            &mut surface,
            layers,
            config.immediate_budget(),
            config.immediate_mode,
        )?;
        info!(report = %serde_json::to_string(&report)?, "Immediate render finished");
        surface
    } else {
        let pipeline = ContourPipeline::new(config, surface)?;
        let report = pipeline.start_draw(layers)?.wait().await?;
        info!(
            report = %serde_json::to_string(&report)?,
            stats = %serde_json::to_string(&pipeline.stats())?,
            "Pipeline render finished"
        );
        pipeline.shutdown().await?
    };

    let png = surface.encode_png()?;
    std::fs::write(&args.output, &png)
        .with_context(|| format!("writing {}", args.output.display()))?;
    info!(
        path = %args.output.display(),
        bytes = png.len(),
        strokes = surface.stroke_count(),
        "Wrote PNG"
    );
    Ok(())
}

fn init_tracing(args: &Args) -> Result<()> {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    if args.json_logs {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(level)
            .json()
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
        tracing::subscriber::set_global_default(subscriber)?;
    }
    Ok(())
}

/// One layer per dataset, each a shifted copy of the synthetic spectrum
/// viewed through the same zoom window.
fn build_layers(args: &Args, base_style: &ContourStyle) -> Result<Vec<ContourLayer>> {
    let n = args.samples.max(2);
    let last = (n - 1) as f64;
    let half_span = last / (2.0 * args.zoom.max(1.0));
    let center = last / 2.0;

    // Columns run left to right, rows bottom to top.
    let x = AxisWindow::new(center - half_span, center + half_span, 0.0, args.width as f64);
    let y = AxisWindow::new(center - half_span, center + half_span, args.height as f64, 0.0);

    let mut layers = Vec::with_capacity(args.datasets);
    for i in 0..args.datasets.max(1) {
        let name = format!("spectrum-{}", i + 1);
        let data = Arc::new(synth::synthesize(n, n, 0.02 * i as f64));
        let source = WindowedSource::new(&name, data, x, y, args.chunk_size)?;
        let (positive, negative) = PALETTE[i % PALETTE.len()];
        let style = ContourStyle {
            positive_color: positive,
            negative_color: negative,
            ..base_style.clone()
        };
        layers.push(ContourLayer::new(name, style, source));
    }
    Ok(layers)
}
