//! lenswarp - batch lens reprojection
//!
//! Converts a dataset of images captured through one lens model into images
//! as seen through another, and writes the matching scene config.

use anyhow::{Context, Result, bail};
use clap::{ArgAction, ArgGroup, Parser, ValueEnum};
use lenswarp_batch::{BatchConfig, BatchPipeline, FileCodec, FrameFilter, collect_inputs};
use lenswarp_io::Format;
use lenswarp_ops::{ColorProcessor, Kernel, Reprojector};
use std::path::PathBuf;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod lens_args;

use config::SceneConfig;
use lens_args::{EquisolidArg, OutputLens, RectilinearArg};

#[derive(Parser, Debug)]
#[command(name = "lenswarp")]
#[command(author, version, about = "Reproject image datasets between camera lens models")]
#[command(long_about = "
Reprojects every image of a dataset from the lens described in the input
scene config to a new lens, and writes a scene config for the result.

Fisheye field of view is given in radians. When downscaling, raise
--samples to avoid aliasing (e.g. --scale 0.5 -s 2, --scale 0.25 -s 4).

--filter nearest|bilinear|bicubic replaces the old --nn, --bl and --bc
switches (bicubic is the default).

Examples:
  lenswarp --input-cfg in.json --output-cfg out.json --input-dir frames -o rect --exr \\
           --rectilinear 12,36
  lenswarp --input-cfg in.json --output-cfg out.json --single frames/0001.png -o half --png \\
           --no-reproject --scale 0.5 -s 2 --auto-exposure --reinhard 4
")]
#[command(group(ArgGroup::new("input").required(true).args(["input_dir", "single"])))]
#[command(group(ArgGroup::new("format").required(true).multiple(true).args(["png", "exr"])))]
#[command(group(
    ArgGroup::new("lens")
        .required(true)
        .args(["rectilinear", "equisolid", "equidistant", "no_reproject"])
))]
struct Cli {
    /// Scene config describing the input lens and frames (JSON)
    #[arg(long, value_name = "JSON")]
    input_cfg: PathBuf,

    /// Where to write the scene config for the output images
    #[arg(long, value_name = "JSON")]
    output_cfg: PathBuf,

    /// Process every PNG/EXR file in this directory
    #[arg(long, value_name = "DIR")]
    input_dir: Option<PathBuf>,

    /// Process a single image
    #[arg(long, value_name = "FILE")]
    single: Option<PathBuf>,

    /// Output directory (created if missing)
    #[arg(short, long = "output-dir", value_name = "DIR")]
    output_dir: PathBuf,

    /// Write PNG output
    #[arg(long)]
    png: bool,

    /// Write EXR output
    #[arg(long)]
    exr: bool,

    /// Only include frames whose name starts with this
    #[arg(long, default_value = "", value_name = "PREFIX")]
    filter_prefix: String,

    /// Only include frames whose name ends with this
    #[arg(long, default_value = "", value_name = "SUFFIX")]
    filter_suffix: String,

    /// Samples per dimension per output pixel
    #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    samples: u32,

    /// Interpolation filter
    #[arg(long, value_enum, default_value_t = Filter::Bicubic)]
    filter: Filter,

    /// Output size as a fraction of the input size (rounded down)
    #[arg(long, default_value_t = 1.0)]
    scale: f64,

    /// Rectilinear output lens
    #[arg(long, value_name = "FOCAL_LENGTH,SENSOR_WIDTH", value_parser = lens_args::parse_rectilinear)]
    rectilinear: Option<RectilinearArg>,

    /// Equisolid fisheye output lens
    #[arg(long, value_name = "FOCAL_LENGTH,SENSOR_WIDTH,FOV", value_parser = lens_args::parse_equisolid)]
    equisolid: Option<EquisolidArg>,

    /// Equidistant fisheye output lens (36 mm square sensor)
    #[arg(long, value_name = "FOV", value_parser = lens_args::parse_fov)]
    equidistant: Option<f64>,

    /// Keep the input lens
    #[arg(long)]
    no_reproject: bool,

    /// Automatic exposure and white balance
    #[arg(long)]
    auto_exposure: bool,

    /// Exposure compensation in stops
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true, value_name = "EV")]
    exposure: f32,

    /// Reinhard tonemapping with this white point (after exposure)
    #[arg(long, value_name = "MAX")]
    reinhard: Option<f32>,

    /// Skip inputs whose outputs all exist
    #[arg(long)]
    skip_if_exists: bool,

    /// Images processed in parallel (0 = one per CPU)
    #[arg(short = 'j', long, default_value_t = 1, value_name = "N")]
    parallel: usize,

    /// Only write the output config
    #[arg(long)]
    dry_run: bool,

    /// Verbose output (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Filter {
    Nearest,
    Bilinear,
    Bicubic,
}

impl From<Filter> for Kernel {
    fn from(f: Filter) -> Self {
        match f {
            Filter::Nearest => Kernel::Nearest,
            Filter::Bilinear => Kernel::Bilinear,
            Filter::Bicubic => Kernel::Bicubic,
        }
    }
}

impl Cli {
    fn output_lens(&self) -> OutputLens {
        if let Some(r) = self.rectilinear {
            OutputLens::Rectilinear(r)
        } else if let Some(e) = self.equisolid {
            OutputLens::Equisolid(e)
        } else if let Some(fov) = self.equidistant {
            OutputLens::Equidistant { fov }
        } else {
            OutputLens::Keep
        }
    }

    fn formats(&self) -> Vec<Format> {
        let mut formats = Vec::with_capacity(2);
        if self.png {
            formats.push(Format::Png);
        }
        if self.exr {
            formats.push(Format::Exr);
        }
        formats
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    run(cli)
}

fn run(cli: Cli) -> Result<()> {
    if !(cli.scale.is_finite() && cli.scale > 0.0) {
        bail!("--scale must be a positive number, got {}", cli.scale);
    }
    if let Some(max) = cli.reinhard.filter(|m| !(m.is_finite() && *m > 0.0)) {
        bail!("--reinhard must be a positive number, got {max}");
    }

    let scene = SceneConfig::load(&cli.input_cfg)?;
    info!(
        "Found camera config: {} {:?}",
        scene.camera.name(),
        scene.resolution
    );

    let [width, height] = scene.scaled_resolution(cli.scale);
    let selection = cli.output_lens();
    let output_lens = selection
        .resolve(scene.camera, width, height)
        .context("Invalid output lens")?;
    debug!(
        ?output_lens,
        width,
        height,
        fov_in = scene.camera.fov_horizontal().to_degrees(),
        fov_out = output_lens.fov_horizontal().to_degrees(),
        "output lens"
    );

    let filter = FrameFilter::new(cli.filter_prefix.as_str(), cli.filter_suffix.as_str());
    let out_scene = scene.output_config(output_lens, &filter, cli.scale);
    if !filter.is_empty() {
        info!(
            kept = out_scene.frames.len(),
            total = scene.frames.len(),
            "frames filtered"
        );
    }

    info!("Creating directory: {}", cli.output_dir.display());
    std::fs::create_dir_all(&cli.output_dir)
        .with_context(|| format!("Failed to create {}", cli.output_dir.display()))?;

    info!("Saving output config: {}", cli.output_cfg.display());
    out_scene.save(&cli.output_cfg)?;

    if cli.dry_run {
        info!("Dry-run. Exiting.");
        return Ok(());
    }

    let inputs = match (&cli.input_dir, &cli.single) {
        (Some(dir), _) => collect_inputs(dir, &filter)
            .with_context(|| format!("Failed to list {}", dir.display()))?,
        (None, Some(file)) => vec![file.clone()],
        (None, None) => bail!("No input specified"),
    };
    if inputs.is_empty() {
        warn!("No input images found");
    }

    let mut config = BatchConfig::new(scene.camera, cli.output_dir.clone());
    config.reprojector = Reprojector {
        output_lens: (!selection.is_keep()).then_some(output_lens),
        scale: cli.scale,
        samples_per_dim: cli.samples,
        kernel: cli.filter.into(),
    };
    config.color = ColorProcessor {
        exposure_ev: cli.exposure,
        reinhard_max: cli.reinhard,
        auto_exposure: cli.auto_exposure,
    };
    config.formats = cli.formats();
    config.skip_if_exists = cli.skip_if_exists;
    if cli.parallel > 0 {
        config.parallelism = cli.parallel;
    }

    let mut pipeline = BatchPipeline::new(config, FileCodec).context("Failed to start workers")?;
    info!(
        files = inputs.len(),
        workers = pipeline.width(),
        "Starting batch processing"
    );
    for path in inputs {
        pipeline.submit(path);
    }
    let summary = pipeline.shutdown();

    println!(
        "Processed {} files: {} done, {} skipped, {} failed",
        summary.submitted, summary.done, summary.skipped, summary.failed
    );
    for report in summary.failures() {
        println!("  FAILED: {}", report.path.display());
    }

    if !summary.is_success() {
        bail!("{} files failed", summary.failed);
    }
    Ok(())
}
