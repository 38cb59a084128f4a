//! Full-video text export: a sequential timeline sweep that renders one
//! frame per export instant and writes a single annotated document.
//!
//! The sweep is strictly ordered. Each instant seeks, waits a bounded
//! settle delay for the decoder to land on the new position, renders, and
//! appends. A frame that fails to render is skipped with a warning; only
//! a dead sink or a cancel request aborts the sweep.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use chrono::Local;

use crate::error::ExportError;
use crate::frame::{self, DisplayMode};
use crate::sink::ExportSink;
use crate::source::FrameSource;
use crate::RenderConfig;

/// Delay between seek and readback, giving the decoder time to settle.
pub const SETTLE_MS: u64 = 75;

/// Frame delimiter in the exported document.
pub const FRAME_DELIMITER: &str = "===FRAME===";

/// Injectable settle delay so sweeps are testable without real time.
pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

/// Real delay via the current thread.
#[derive(Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        thread::sleep(duration);
    }
}

/// Cooperative cancellation shared with a signal handler or UI thread.
#[derive(Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Current phase of an export sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportPhase {
    /// Seeking and rendering frames along the timeline
    CapturingFrames,
    /// Writing the assembled document to the sink
    Writing,
    /// Export finished
    Complete,
}

/// Progress information for export sweeps, suitable for driving a
/// progress bar or status line.
#[derive(Debug, Clone)]
pub struct ExportProgress {
    pub phase: ExportPhase,
    /// Frames captured so far (skipped frames do not count).
    pub completed: usize,
    /// Total export instants on the timeline.
    pub total: usize,
    /// Percentage complete (0.0 to 100.0)
    pub percentage: f64,
    pub message: String,
}

impl ExportProgress {
    fn capturing(completed: usize, total: usize) -> Self {
        let percentage = if total > 0 {
            (completed as f64 / total as f64) * 100.0
        } else {
            0.0
        };
        Self {
            phase: ExportPhase::CapturingFrames,
            completed,
            total,
            percentage,
            message: format!("Capturing frame {} of {}", completed, total),
        }
    }

    fn writing(captured: usize, total: usize) -> Self {
        Self {
            phase: ExportPhase::Writing,
            completed: captured,
            total,
            percentage: 100.0,
            message: "Writing export file...".to_string(),
        }
    }

    fn complete(captured: usize, total: usize) -> Self {
        Self {
            phase: ExportPhase::Complete,
            completed: captured,
            total,
            percentage: 100.0,
            message: format!("Export complete: {} frames", captured),
        }
    }
}

/// What an export sweep produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    /// Instants on the timeline, frames attempted.
    pub total_frames: usize,
    /// Frames that rendered and made it into the document.
    pub captured: usize,
    /// Frames dropped because their render failed.
    pub skipped: usize,
    /// Where the sink stored the document.
    pub path: std::path::PathBuf,
}

/// Export settings; playback pacing state is irrelevant here.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub render: RenderConfig,
    /// Export instants per second of timeline.
    pub fps: u32,
    pub settle: Duration,
}

impl ExportOptions {
    pub fn new(render: RenderConfig, fps: u32) -> Self {
        Self {
            render,
            fps: fps.max(1),
            settle: Duration::from_millis(SETTLE_MS),
        }
    }
}

/// Sweep the whole timeline and write one annotated text document.
///
/// `total = floor(duration * fps)`, positions `i / fps` for `i` in
/// `0..total`. The source is paused for the duration of the sweep and
/// left wherever the last seek put it.
pub fn export_all<S, K, E, F>(
    source: &mut S,
    options: &ExportOptions,
    sink: &mut K,
    sleeper: &E,
    cancel: &CancelToken,
    mut progress: F,
) -> Result<ExportSummary, ExportError>
where
    S: FrameSource,
    K: ExportSink,
    E: Sleeper,
    F: FnMut(ExportProgress),
{
    let duration = source.duration();
    let total = (duration * options.fps as f64).floor() as usize;
    source.pause();

    let mut captured: Vec<String> = Vec::with_capacity(total);
    let mut skipped = 0usize;

    for i in 0..total {
        if cancel.is_cancelled() {
            log::info!("export cancelled at instant {} of {}", i, total);
            return Err(ExportError::Cancelled {
                captured: captured.len(),
                total,
            });
        }

        let position = i as f64 / options.fps as f64;
        source.seek(position);
        sleeper.sleep(options.settle);

        match frame::render(source, &options.render, DisplayMode::Windowed) {
            Ok(ascii) => {
                captured.push(format!("Frame {}:\n{}", i + 1, ascii.into_plain()));
                progress(ExportProgress::capturing(captured.len(), total));
            }
            Err(e) => {
                skipped += 1;
                log::warn!("skipping frame {} at {:.3}s: {}", i + 1, position, e);
            }
        }
    }

    progress(ExportProgress::writing(captured.len(), total));
    let document = assemble(options, total, &captured);
    let path = sink.save(&document).map_err(|source| {
        ExportError::SinkUnavailable {
            captured: captured.len(),
            source,
        }
    })?;

    progress(ExportProgress::complete(captured.len(), total));
    Ok(ExportSummary {
        total_frames: total,
        captured: captured.len(),
        skipped,
        path,
    })
}

fn assemble(options: &ExportOptions, total: usize, frames: &[String]) -> String {
    let header = format!(
        "ASCII Video Export\n\
         Generated: {}\n\
         Resolution: {} chars\n\
         FPS: {}\n\
         Total Frames: {}\n\
         Character Set: {}\n\
         ================================\n\n",
        Local::now().format("%Y-%m-%d %H:%M:%S"),
        options.render.width,
        options.fps,
        total,
        options.render.charset.name(),
    );
    let body = frames.join(&format!("\n{}\n", FRAME_DELIMITER));
    format!("{}{}", header, body)
}
