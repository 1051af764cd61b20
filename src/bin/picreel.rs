use std::path::{Path, PathBuf};

use anyhow::{bail, Context as _};
use clap::{Parser, ValueEnum};
use picreel::image_loader::{has_extension, ImageAsset, AUDIO_EXTENSIONS};
use picreel::{AspectLock, AudioOutcome, CanvasTarget, H264Backend, RunRequest, Sequence};
use tracing_subscriber::EnvFilter;

/// Turn still images (and optional background audio) into an MP4 slideshow.
///
/// Each image becomes one frame, letterboxed onto the output canvas.
#[derive(Parser, Debug)]
#[command(name = "picreel", version)]
struct Cli {
    /// Image files (PNG/JPEG/BMP) or directories containing them.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Output MP4 path.
    #[arg(short, long)]
    output: PathBuf,

    /// Background audio (MP3/WAV); the video is cut to the shorter of the two.
    #[arg(long)]
    audio: Option<PathBuf>,

    /// Frames per second.
    #[arg(long, default_value_t = CanvasTarget::DEFAULT_FPS,
          value_parser = clap::value_parser!(u32).range(1..=60))]
    fps: u32,

    /// Output width (defaults to the widest image).
    #[arg(long)]
    width: Option<u32>,

    /// Output height (defaults to the tallest image).
    #[arg(long)]
    height: Option<u32>,

    /// Derive the missing dimension from the detected aspect ratio.
    #[arg(long)]
    keep_aspect: bool,

    /// Keep the order given on the command line instead of sorting naturally.
    #[arg(long)]
    no_sort: bool,

    /// Move an image before encoding, as FROM:TO (0-based, applied in order).
    #[arg(long = "move", value_name = "FROM:TO", value_parser = parse_move)]
    moves: Vec<(usize, usize)>,

    /// H.264 encoder.
    #[arg(long, value_enum, default_value_t = EncoderArg::Openh264)]
    encoder: EncoderArg,

    /// Explicit ffmpeg binary (audio muxing, and --encoder x264).
    #[arg(long)]
    ffmpeg: Option<PathBuf>,

    /// More log output (-v debug, -vv trace). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum EncoderArg {
    /// Built in, no external tools needed
    Openh264,
    /// libx264 through ffmpeg
    X264,
}

fn parse_move(s: &str) -> Result<(usize, usize), String> {
    let (from, to) = s
        .split_once(':')
        .ok_or_else(|| format!("expected FROM:TO, got '{s}'"))?;
    let from = from.trim().parse().map_err(|e| format!("bad FROM in '{s}': {e}"))?;
    let to = to.trim().parse().map_err(|e| format!("bad TO in '{s}': {e}"))?;
    Ok((from, to))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let sequence = collect_sequence(&cli.inputs, !cli.no_sort)?;
    let sequence = apply_moves(sequence, &cli.moves)?;
    if sequence.is_empty() {
        bail!("no PNG/JPEG/BMP images found in the given inputs");
    }

    if let Some(audio) = &cli.audio {
        if !has_extension(audio, AUDIO_EXTENSIONS) {
            tracing::warn!(audio = %audio.display(), "audio is not MP3/WAV, ffmpeg will try anyway");
        }
    }

    let canvas = resolve_canvas(&cli, sequence.paths())?;
    tracing::info!(
        images = sequence.len(),
        width = canvas.width,
        height = canvas.height,
        fps = canvas.fps,
        "encoding slideshow"
    );

    let request = RunRequest {
        images: sequence.into_paths(),
        audio: cli.audio.clone(),
        output: cli.output.clone(),
        canvas,
    };

    let mut last = None;
    let backend = match cli.encoder {
        EncoderArg::Openh264 => H264Backend::OpenH264,
        EncoderArg::X264 => H264Backend::Ffmpeg(cli.ffmpeg.clone()),
    };
    let report = picreel::slideshow_with_encoder(
        &request,
        backend,
        cli.ffmpeg.as_deref(),
        &mut |percent| {
            if last != Some(percent) {
                eprint!("\r{percent:3}%");
                last = Some(percent);
            }
        },
    );
    eprintln!();

    let report = report
        .with_context(|| format!("failed to create '{}'", request.output.display()))?;

    if let AudioOutcome::Dropped { reason } = &report.audio {
        eprintln!("warning: audio was not added ({reason})");
    }
    println!("{} ({} frames)", report.output.display(), report.frames);

    Ok(())
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "picreel=info",
        1 => "picreel=debug",
        _ => "picreel=trace",
    };
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::builder().from_env_lossy()
    } else {
        EnvFilter::builder().parse_lossy(default)
    };

    let _ = tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .try_init();
}

/// Expand directories and build the sequence
///
/// Files keep their command-line order unless `sort` is set; each
/// directory contributes its images in natural order.
fn collect_sequence(inputs: &[PathBuf], sort: bool) -> anyhow::Result<Sequence> {
    let mut paths = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let dir = Sequence::from_dir(input)
                .with_context(|| format!("read directory '{}'", input.display()))?;
            paths.extend(dir.into_paths());
        } else {
            paths.push(input.clone());
        }
    }

    Ok(if sort {
        Sequence::from_selection(paths)
    } else {
        Sequence::new(paths)
    })
}

fn apply_moves(mut sequence: Sequence, moves: &[(usize, usize)]) -> anyhow::Result<Sequence> {
    for &(from, to) in moves {
        sequence
            .move_item(from, to)
            .with_context(|| format!("--move {from}:{to}"))?;
    }
    Ok(sequence)
}

fn resolve_canvas(cli: &Cli, images: &[PathBuf]) -> anyhow::Result<CanvasTarget> {
    let canvas = match (cli.width, cli.height) {
        (Some(width), Some(height)) => {
            if cli.keep_aspect {
                bail!("--keep-aspect takes only one of --width/--height");
            }
            CanvasTarget::new(width, height, cli.fps)
        }
        (width, height) => {
            let dims = images
                .iter()
                .map(|p| probe(p))
                .collect::<anyhow::Result<Vec<_>>>()?;

            let mut lock = AspectLock::new(CanvasTarget::fit_images(dims, cli.fps));
            lock.set_locked(cli.keep_aspect);
            if let Some(width) = width {
                check_bound("--width", width, CanvasTarget::MAX_WIDTH)?;
                lock.set_width(width);
            }
            if let Some(height) = height {
                check_bound("--height", height, CanvasTarget::MAX_HEIGHT)?;
                lock.set_height(height);
            }
            lock.canvas()
        }
    };

    canvas.validate()?;
    Ok(canvas)
}

fn check_bound(flag: &str, value: u32, max: u32) -> anyhow::Result<()> {
    if !(1..=max).contains(&value) {
        bail!("{flag} must be between 1 and {max}, got {value}");
    }
    Ok(())
}

fn probe(path: &Path) -> anyhow::Result<(u32, u32)> {
    let asset = ImageAsset::probe(path)?;
    Ok((asset.width, asset.height))
}
