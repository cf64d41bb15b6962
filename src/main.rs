//! Command-line host for the shadow view.
//!
//! Loads an image, lays it out with a blurred shadow and writes the
//! flattened frame to disk.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use image::{ImageFormat, Rgba};
use tracing::{Level, info, warn};
use tracing_subscriber::EnvFilter;

use shadow_image::config::{Configuration, ShadowParams};
use shadow_image::processing::composite::flatten;
use shadow_image::processing::layout::{ContentMode, Size};
use shadow_image::view::ShadowView;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    AspectFit,
    Fill,
}

impl From<ModeArg> for ContentMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::AspectFit => ContentMode::AspectFit,
            ModeArg::Fill => ContentMode::Fill,
        }
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "shadow-image",
    version,
    about = "Render an image over its own blurred shadow"
)]
struct Cli {
    /// Source image
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Where to write the flattened frame; always PNG whatever the extension
    #[arg(short, long, value_name = "FILE")]
    output: PathBuf,

    /// Optional YAML config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// View width (defaults to the image width)
    #[arg(long)]
    width: Option<u32>,

    /// View height (defaults to the image height)
    #[arg(long)]
    height: Option<u32>,

    #[arg(long)]
    blur_radius: Option<f32>,

    #[arg(long)]
    corner_radius: Option<f32>,

    #[arg(long, allow_negative_numbers = true)]
    radius_offset_percent: Option<f32>,

    #[arg(long, allow_negative_numbers = true)]
    offset_x: Option<f32>,

    #[arg(long, allow_negative_numbers = true)]
    offset_y: Option<f32>,

    /// Shadow opacity
    #[arg(long)]
    alpha: Option<f32>,

    #[arg(long, value_enum)]
    content_mode: Option<ModeArg>,

    /// How long to wait for the shadow render
    #[arg(long, value_name = "MILLIS", default_value_t = 10_000)]
    timeout_ms: u64,

    /// Increase log verbosity (repeatable)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn shadow_params(&self, base: ShadowParams) -> ShadowParams {
        ShadowParams {
            blur_radius: self.blur_radius.unwrap_or(base.blur_radius),
            corner_radius: self.corner_radius.unwrap_or(base.corner_radius),
            shadow_radius_offset_percent: self
                .radius_offset_percent
                .unwrap_or(base.shadow_radius_offset_percent),
            shadow_offset_x: self.offset_x.unwrap_or(base.shadow_offset_x),
            shadow_offset_y: self.offset_y.unwrap_or(base.shadow_offset_y),
            shadow_alpha: self.alpha.unwrap_or(base.shadow_alpha),
            content_mode: self.content_mode.map_or(base.content_mode, Into::into),
        }
    }
}

fn init_tracing(verbosity: u8) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => {
            let level = match verbosity {
                0 => Level::INFO,
                1 => Level::DEBUG,
                _ => Level::TRACE,
            };
            EnvFilter::new("warn").add_directive(
                format!("shadow_image={level}")
                    .parse()
                    .context("invalid log directive")?,
            )
        }
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    let cfg = match &cli.config {
        Some(path) => Configuration::from_yaml_file(path)
            .with_context(|| format!("failed to load configuration from {}", path.display()))?,
        None => Configuration::default(),
    }
    .validated()
    .context("invalid configuration values")?;
    let params = cli.shadow_params(cfg.shadow);

    let source = image::open(&cli.input)
        .with_context(|| format!("failed to open {}", cli.input.display()))?
        .to_rgba8();
    let bounds = Size::from_pixels(
        cli.width.unwrap_or(source.width()),
        cli.height.unwrap_or(source.height()),
    );
    info!(
        input = %cli.input.display(),
        width = source.width(),
        height = source.height(),
        ?bounds,
        "loaded source image"
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .thread_name("shadow-worker")
        .enable_time()
        .build()
        .context("failed to start worker runtime")?;

    let mut view = ShadowView::new(runtime.handle().clone(), &cfg);
    view.apply_params(params);
    view.set_bounds(bounds);
    view.attach();
    view.set_image(source);

    if !view.settle(Duration::from_millis(cli.timeout_ms)) {
        warn!(
            pending = view.pending_renders(),
            "timed out waiting for shadow render"
        );
    }
    if view.background().image().is_none() {
        warn!("no shadow rendered; writing the foreground alone");
    }

    let frame = flatten(
        bounds,
        view.background(),
        view.foreground(),
        Rgba(cfg.output.backdrop),
        cfg.pipeline.resize_filter,
    )
    .context("failed to flatten frame")?;
    frame
        .save_with_format(&cli.output, ImageFormat::Png)
        .with_context(|| format!("failed to write {}", cli.output.display()))?;
    info!(output = %cli.output.display(), "wrote frame");

    drop(view);
    runtime.shutdown_background();
    Ok(())
}
