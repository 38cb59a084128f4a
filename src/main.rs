use anyhow::{anyhow, Context, Result};
use asciivid::{
    AppConfig, CancelToken, CharSet, ColorMode, DisplayMode, ExportPhase, FileSink, RenderConfig,
    Session, SystemClock, TerminalSink, ThreadSleeper, TickOutcome, VideoSource,
};
use clap::Parser;
use dialoguer::FuzzySelect;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use walkdir::WalkDir;

fn load_config() -> Result<AppConfig> {
    // Look for asciivid.json in app support, current dir fallback, then built-in default
    let mut tried: Vec<PathBuf> = Vec::new();
    if let Some(mut d) = dirs::data_dir() {
        d.push("asciivid");
        d.push("asciivid.json");
        tried.push(d);
    }
    tried.push(PathBuf::from("asciivid.json"));

    for p in &tried {
        if p.exists() {
            let text =
                fs::read_to_string(p).with_context(|| format!("reading config {}", p.display()))?;
            let cfg: AppConfig = serde_json::from_str(&text).context("parsing config json")?;
            if !cfg.presets.contains_key(&cfg.default_preset) {
                return Err(anyhow!(
                    "Config file {} names default preset '{}' but does not define it.",
                    p.display(),
                    cfg.default_preset
                ));
            }
            return Ok(cfg);
        }
    }

    // Built-in defaults
    Ok(AppConfig::default())
}

#[derive(Parser, Debug)]
#[command(version, about = "Play videos as ASCII art in the terminal, or export them to text.")]
struct Args {
    /// Input video file
    input: Option<PathBuf>,

    /// Output width in characters
    #[arg(long)]
    width: Option<u32>,

    /// Contrast multiplier around mid-gray
    #[arg(long)]
    contrast: Option<f32>,

    /// Target frames per second
    #[arg(long)]
    fps: Option<u32>,

    /// Character ramp
    #[arg(long, value_enum, default_value = "standard")]
    charset: CharSet,

    /// Color mode
    #[arg(long, value_enum, default_value = "mono")]
    color_mode: ColorMode,

    /// Triple the width, capped at 350 characters
    #[arg(long, default_value_t = false)]
    fullscreen: bool,

    /// Export every frame to a text file instead of playing
    #[arg(long, default_value_t = false)]
    export: bool,

    /// Directory for exported text files
    #[arg(long)]
    out: Option<PathBuf>,
}

fn main() -> Result<()> {
    let mut args = Args::parse();

    if args.input.is_none() {
        let files = find_media_files()?;
        if files.is_empty() {
            return Err(anyhow!("No media files found in current directory."));
        }
        let selection = FuzzySelect::with_theme(&dialoguer::theme::ColorfulTheme::default())
            .with_prompt("Choose an input file")
            .default(0)
            .items(&files)
            .interact()?;
        args.input = Some(PathBuf::from(&files[selection]));
    }
    let input = args.input.as_ref().unwrap();

    let cfg = load_config()?;
    let preset = cfg.default_render_config();
    let fps = args
        .fps
        .or_else(|| cfg.presets.get(&cfg.default_preset).map(|p| p.fps))
        .unwrap_or(asciivid::DEFAULT_FPS);

    let render = RenderConfig {
        width: args.width.unwrap_or(preset.width),
        contrast: args.contrast.unwrap_or(preset.contrast),
        charset: args.charset,
        color_mode: args.color_mode,
    };

    let source = VideoSource::open(input)
        .with_context(|| format!("opening {}", input.display()))?;
    let mut session = Session::new(source, SystemClock::default(), render, fps);
    if args.fullscreen {
        session.set_display_mode(DisplayMode::Fullscreen);
    }

    if args.export {
        run_export(session, fps, args.out)
    } else {
        run_playback(session)
    }
}

fn run_playback(mut session: Session<VideoSource, SystemClock>) -> Result<()> {
    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = stop.clone();
        ctrlc::set_handler(move || stop.store(true, Ordering::SeqCst))
            .context("installing Ctrl-C handler")?;
    }

    let mut sink = TerminalSink::stdout();
    session.play();
    loop {
        if stop.load(Ordering::SeqCst) {
            session.pause();
            break;
        }
        match session.tick(&mut sink) {
            TickOutcome::Ended => {
                println!("\nPlayback finished.");
                break;
            }
            TickOutcome::Failed(msg) => {
                return Err(anyhow!(msg));
            }
            _ => thread::sleep(Duration::from_millis(4)),
        }
    }
    Ok(())
}

fn run_export(
    mut session: Session<VideoSource, SystemClock>,
    fps: u32,
    out: Option<PathBuf>,
) -> Result<()> {
    let out_dir = out.unwrap_or_else(|| PathBuf::from("."));
    fs::create_dir_all(&out_dir).context("creating output dir")?;
    let mut sink = FileSink::new(&out_dir);

    let cancel = CancelToken::new();
    {
        let cancel = cancel.clone();
        ctrlc::set_handler(move || cancel.cancel())
            .context("installing Ctrl-C handler")?;
    }

    println!("Exporting frames...");
    let mut bar: Option<ProgressBar> = None;
    let summary = session.export(fps, &mut sink, &ThreadSleeper, &cancel, |p| {
        if p.phase != ExportPhase::CapturingFrames {
            return;
        }
        let bar = bar.get_or_insert_with(|| {
            let pb = ProgressBar::new(p.total as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template(
                        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%)",
                    )
                    .unwrap()
                    .progress_chars("#>-"),
            );
            pb.set_message("Capturing frames");
            pb
        });
        bar.set_position(p.completed as u64);
    })?;
    if let Some(bar) = bar {
        bar.finish_with_message("Done");
    }

    println!(
        "\nExport complete: {} of {} frame(s) captured ({} skipped) in {}",
        summary.captured,
        summary.total_frames,
        summary.skipped,
        summary.path.display()
    );
    Ok(())
}

fn find_media_files() -> Result<Vec<String>> {
    Ok(WalkDir::new(".")
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| {
            e.path().is_file()
                && e.path().extension().is_some_and(|ext| {
                    matches!(ext.to_str(), Some("mp4" | "mkv" | "mov" | "avi" | "webm"))
                })
        })
        .map(|e| e.path().to_str().unwrap_or("").to_string())
        .collect())
}
