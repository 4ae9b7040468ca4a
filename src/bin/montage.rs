use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "montage", version)]
struct Cli {
    /// Engine configuration JSON (defaults when missing).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load a sequence document and check every invariant.
    Validate(ValidateArgs),
    /// Render a single frame as a PNG.
    Frame(FrameArgs),
    /// Mix a sample window to raw little-endian f32.
    Mix(MixArgs),
    /// Format a frame number as timecode.
    Timecode(TimecodeArgs),
}

#[derive(Parser, Debug)]
struct ValidateArgs {
    /// Input sequence JSON.
    #[arg(long = "in")]
    in_path: PathBuf,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Input sequence JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Timeline frame (0-based).
    #[arg(long)]
    frame: u64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Directory holding still images named by media id (defaults to the document's directory).
    #[arg(long)]
    stills: Option<PathBuf>,

    /// Draw title/action-safe guides.
    #[arg(long)]
    guides: bool,

    /// Extra font directory for text effects (repeatable).
    #[arg(long = "fonts")]
    fonts: Vec<PathBuf>,
}

#[derive(Parser, Debug)]
struct MixArgs {
    /// Input sequence JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// First timeline sample frame.
    #[arg(long, default_value_t = 0)]
    start: u64,

    /// Sample frames to mix.
    #[arg(long)]
    frames: usize,

    /// Output path for interleaved f32le samples.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct TimecodeArgs {
    /// Frame rate as `num/den` or an integer.
    #[arg(long, value_parser = parse_fps)]
    fps: montage::Fps,

    /// Frame number.
    #[arg(long)]
    frame: u64,

    /// Display format (defaults to the config's `timecode_view`).
    #[arg(long, value_enum)]
    view: Option<ViewChoice>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ViewChoice {
    DropFrame,
    NonDropFrame,
    Frames,
}

impl From<ViewChoice> for montage::TimecodeView {
    fn from(v: ViewChoice) -> Self {
        match v {
            ViewChoice::DropFrame => Self::DropFrame,
            ViewChoice::NonDropFrame => Self::NonDropFrame,
            ViewChoice::Frames => Self::Frames,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    match cli.cmd {
        Command::Validate(args) => cmd_validate(args),
        Command::Frame(args) => cmd_frame(args, config),
        Command::Mix(args) => cmd_mix(args, config),
        Command::Timecode(args) => cmd_timecode(args, &config),
    }
}

fn parse_fps(s: &str) -> Result<montage::Fps, String> {
    let (num, den) = match s.split_once('/') {
        Some((n, d)) => (n.trim(), d.trim()),
        None => (s.trim(), "1"),
    };
    let num: u32 = num.parse().map_err(|e| format!("fps numerator: {e}"))?;
    let den: u32 = den.parse().map_err(|e| format!("fps denominator: {e}"))?;
    montage::Fps::new(num, den).map_err(|e| e.to_string())
}

fn load_config(path: Option<&Path>) -> anyhow::Result<montage::EngineConfig> {
    match path {
        Some(p) => montage::EngineConfig::load(p)
            .with_context(|| format!("load config '{}'", p.display())),
        None => Ok(montage::EngineConfig::default()),
    }
}

fn read_sequence(path: &Path) -> anyhow::Result<montage::Sequence> {
    montage::load_from_path(path).with_context(|| format!("load sequence '{}'", path.display()))
}

fn cmd_validate(args: ValidateArgs) -> anyhow::Result<()> {
    let seq = read_sequence(&args.in_path)?;
    let clips: usize = seq.all_tracks().map(|t| t.clips.len()).sum();
    println!(
        "ok: '{}' {}x{} @ {}/{} fps, {} video / {} audio tracks, {} clips, {} frames",
        seq.name,
        seq.width,
        seq.height,
        seq.fps.num,
        seq.fps.den,
        seq.video_tracks.len(),
        seq.audio_tracks.len(),
        clips,
        seq.duration().0,
    );
    Ok(())
}

fn cmd_frame(args: FrameArgs, mut config: montage::EngineConfig) -> anyhow::Result<()> {
    let seq = read_sequence(&args.in_path)?;
    let stills = match args.stills {
        Some(dir) => dir,
        None => args
            .in_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf(),
    };
    config.font_dirs.extend(args.fonts);
    let decoder = Arc::new(montage::StillImageDecoder::new(stills));
    let compositor = montage::Compositor::new(config, decoder)?;

    let at = montage::FrameIndex(args.frame);
    let frame = if args.guides {
        let cfg = &compositor.config().title_safe;
        montage::title_safe_overlay(&compositor.render_frame(&seq, at), cfg)
    } else {
        compositor.render_preview(&seq, at)
    };

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    image::save_buffer_with_format(
        &args.out,
        &frame.to_straight_rgba8(),
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_mix(args: MixArgs, config: montage::EngineConfig) -> anyhow::Result<()> {
    let seq = read_sequence(&args.in_path)?;
    // Without a codec every clip contributes silence; generator effects still sound.
    let decoder = Arc::new(montage::MemoryDecoder::new());
    let compositor = montage::Compositor::new(config, decoder)?;
    let samples = compositor.mix_audio(&seq, args.start, args.frames);

    let bytes: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
    std::fs::write(&args.out, bytes)
        .with_context(|| format!("write samples '{}'", args.out.display()))?;

    eprintln!(
        "wrote {} ({} samples, {} channels)",
        args.out.display(),
        samples.len(),
        compositor.config().audio_channels
    );
    Ok(())
}

fn cmd_timecode(args: TimecodeArgs, config: &montage::EngineConfig) -> anyhow::Result<()> {
    let view = args.view.map_or(config.timecode_view, Into::into);
    println!(
        "{}",
        montage::format_timecode(montage::FrameIndex(args.frame), args.fps, view)
    );
    Ok(())
}
