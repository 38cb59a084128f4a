//! Frame sources: the decodable-video abstraction and its ffmpeg backing.
//!
//! The core never decodes video itself. [`VideoSource`] delegates to the
//! host `ffmpeg`/`ffprobe` executables: metadata comes from one ffprobe
//! call, and each pixel readback grabs a single frame at the current
//! position into a guarded temp PNG decoded with the `image` crate.

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command as ProcCommand;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use crate::error::SampleError;

/// Status events a frame source reports, consumed by the session
/// controller's transition function.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceEvent {
    /// Natural dimensions and duration are known.
    MetadataReady,
    /// Playback started or resumed.
    PlaybackStarted,
    /// The timeline reached its end.
    PlaybackEnded,
    /// The source stalled; rendering should suspend without stopping.
    BufferingStarted,
    /// The decoder rejected the media.
    DecodeError(String),
}

/// A decodable video supplying raster frames and a timeline position.
///
/// Implementations own their offscreen readback surface: `read_rgb` draws
/// the frame at the current position into a buffer of exactly
/// `width * height` RGB triples.
pub trait FrameSource {
    /// Natural (decoded) width and height in pixels.
    fn natural_size(&self) -> (u32, u32);

    /// Total duration in seconds.
    fn duration(&self) -> f64;

    /// Current timeline position in seconds.
    fn position(&self) -> f64;

    /// Move the timeline position, clamped into `[0, duration]`.
    fn seek(&mut self, secs: f64);

    /// Start or resume the playback clock.
    fn play(&mut self);

    /// Pause the playback clock, keeping the position.
    fn pause(&mut self);

    /// Whether the playback clock is running.
    fn is_playing(&self) -> bool;

    /// Drain pending status events in the order they occurred.
    fn poll_events(&mut self) -> Vec<SourceEvent>;

    /// Read the current frame as `width * height` RGB triples, row-major.
    fn read_rgb(&mut self, width: u32, height: u32) -> Result<Vec<u8>, SampleError>;
}

/// Which external executables handle decoding.
#[derive(Debug, Clone)]
pub struct FfmpegConfig {
    pub ffmpeg: String,
    pub ffprobe: String,
}

impl Default for FfmpegConfig {
    fn default() -> Self {
        Self {
            ffmpeg: "ffmpeg".to_string(),
            ffprobe: "ffprobe".to_string(),
        }
    }
}

/// Removes a temp file when dropped.
pub struct TempFileGuard {
    path: PathBuf,
}

impl TempFileGuard {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: ProbeFormat,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    width: Option<u32>,
    height: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

/// File-backed video source decoded through ffmpeg.
///
/// The playback clock is wall-time based: while playing, `position()`
/// advances from the last anchor. A file source never stalls, so it never
/// emits [`SourceEvent::BufferingStarted`]; that event exists for sources
/// that do.
pub struct VideoSource {
    path: PathBuf,
    width: u32,
    height: u32,
    duration: f64,
    base_position: f64,
    playing_since: Option<Instant>,
    ended: bool,
    pending: Vec<SourceEvent>,
    ffmpeg: FfmpegConfig,
}

impl VideoSource {
    /// Probe `path` with ffprobe and build a paused source at position 0.
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with(path, FfmpegConfig::default())
    }

    pub fn open_with(path: &Path, ffmpeg: FfmpegConfig) -> Result<Self> {
        let output = ProcCommand::new(&ffmpeg.ffprobe)
            .args([
                "-v",
                "error",
                "-select_streams",
                "v:0",
                "-show_entries",
                "stream=width,height",
                "-show_entries",
                "format=duration",
                "-of",
                "json",
            ])
            .arg(path)
            .output()
            .context("running ffprobe")?;

        if !output.status.success() {
            return Err(anyhow!(
                "ffprobe failed for {}: {}",
                path.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            ));
        }

        let probe: ProbeOutput =
            serde_json::from_slice(&output.stdout).context("parsing ffprobe json")?;
        let stream = probe
            .streams
            .first()
            .ok_or_else(|| anyhow!("no video stream in {}", path.display()))?;
        let width = stream.width.unwrap_or(0);
        let height = stream.height.unwrap_or(0);
        let duration = probe
            .format
            .duration
            .as_deref()
            .and_then(|d| d.parse::<f64>().ok())
            .unwrap_or(0.0);

        if width == 0 || height == 0 {
            return Err(anyhow!(
                "{} reports {}x{}; not a decodable video",
                path.display(),
                width,
                height
            ));
        }

        Ok(Self {
            path: path.to_path_buf(),
            width,
            height,
            duration,
            base_position: 0.0,
            playing_since: None,
            ended: false,
            pending: vec![SourceEvent::MetadataReady],
            ffmpeg,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn clock_position(&self) -> f64 {
        let elapsed = self
            .playing_since
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0);
        (self.base_position + elapsed).min(self.duration)
    }
}

impl FrameSource for VideoSource {
    fn natural_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn duration(&self) -> f64 {
        self.duration
    }

    fn position(&self) -> f64 {
        self.clock_position()
    }

    fn seek(&mut self, secs: f64) {
        self.base_position = secs.clamp(0.0, self.duration);
        if self.playing_since.is_some() {
            self.playing_since = Some(Instant::now());
        }
        if self.base_position < self.duration {
            self.ended = false;
        }
    }

    fn play(&mut self) {
        if self.playing_since.is_none() {
            self.playing_since = Some(Instant::now());
            self.pending.push(SourceEvent::PlaybackStarted);
        }
    }

    fn pause(&mut self) {
        if let Some(since) = self.playing_since.take() {
            self.base_position =
                (self.base_position + since.elapsed().as_secs_f64()).min(self.duration);
        }
    }

    fn is_playing(&self) -> bool {
        self.playing_since.is_some()
    }

    fn poll_events(&mut self) -> Vec<SourceEvent> {
        if !self.ended && self.playing_since.is_some() && self.clock_position() >= self.duration {
            self.pause();
            self.ended = true;
            self.pending.push(SourceEvent::PlaybackEnded);
        }
        std::mem::take(&mut self.pending)
    }

    fn read_rgb(&mut self, width: u32, height: u32) -> Result<Vec<u8>, SampleError> {
        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        let out_path = std::env::temp_dir().join(format!(
            "asciivid_grab_{}_{}.png",
            std::process::id(),
            stamp
        ));
        let guard = TempFileGuard::new(out_path);

        let position = self.clock_position();
        let status = ProcCommand::new(&self.ffmpeg.ffmpeg)
            .arg("-loglevel")
            .arg("error")
            .arg("-y")
            .arg("-ss")
            .arg(format!("{:.4}", position))
            .arg("-i")
            .arg(&self.path)
            .arg("-frames:v")
            .arg("1")
            .arg("-vf")
            .arg(format!("scale={}:{}", width, height))
            .arg(guard.path())
            .status()
            .map_err(|e| SampleError::PixelAccessDenied {
                reason: format!("could not run {}: {}", self.ffmpeg.ffmpeg, e),
            })?;

        if !status.success() {
            return Err(SampleError::PixelAccessDenied {
                reason: format!("{} exited with {}", self.ffmpeg.ffmpeg, status),
            });
        }

        let img = image::open(guard.path())
            .map_err(|e| SampleError::PixelAccessDenied {
                reason: format!("no frame decoded at {:.3}s: {}", position, e),
            })?
            .to_rgb8();

        log::debug!(
            "grabbed {}x{} frame at {:.3}s from {}",
            width,
            height,
            position,
            self.path.display()
        );
        Ok(img.into_raw())
    }
}

#[cfg(test)]
pub(crate) mod testutil {
    //! Deterministic in-memory source for exercising the pipeline.

    use super::{FrameSource, SourceEvent};
    use crate::error::SampleError;

    pub(crate) struct MockSource {
        pub width: u32,
        pub height: u32,
        pub duration: f64,
        pub position: f64,
        pub playing: bool,
        pub pending: Vec<SourceEvent>,
        /// Positions (seconds) at which `read_rgb` fails.
        pub fail_read_at: Vec<f64>,
        /// Every position `seek` was asked for, in order.
        pub seeks: Vec<f64>,
        pub reads: usize,
        /// Pixel generator: (x, y) -> (r, g, b).
        pub pixel: fn(u32, u32) -> (u8, u8, u8),
    }

    impl MockSource {
        pub(crate) fn new(width: u32, height: u32, duration: f64) -> Self {
            Self {
                width,
                height,
                duration,
                position: 0.0,
                playing: false,
                pending: Vec::new(),
                fail_read_at: Vec::new(),
                seeks: Vec::new(),
                reads: 0,
                pixel: |_, _| (128, 128, 128),
            }
        }

        pub(crate) fn with_pixel(mut self, pixel: fn(u32, u32) -> (u8, u8, u8)) -> Self {
            self.pixel = pixel;
            self
        }
    }

    impl FrameSource for MockSource {
        fn natural_size(&self) -> (u32, u32) {
            (self.width, self.height)
        }

        fn duration(&self) -> f64 {
            self.duration
        }

        fn position(&self) -> f64 {
            self.position
        }

        fn seek(&mut self, secs: f64) {
            self.position = secs.clamp(0.0, self.duration);
            self.seeks.push(secs);
        }

        fn play(&mut self) {
            self.playing = true;
            self.pending.push(SourceEvent::PlaybackStarted);
        }

        fn pause(&mut self) {
            self.playing = false;
        }

        fn is_playing(&self) -> bool {
            self.playing
        }

        fn poll_events(&mut self) -> Vec<SourceEvent> {
            std::mem::take(&mut self.pending)
        }

        fn read_rgb(&mut self, width: u32, height: u32) -> Result<Vec<u8>, SampleError> {
            self.reads += 1;
            if self
                .fail_read_at
                .iter()
                .any(|p| (p - self.position).abs() < 1e-6)
            {
                return Err(SampleError::PixelAccessDenied {
                    reason: format!("scripted failure at {:.3}s", self.position),
                });
            }
            let mut data = Vec::with_capacity((width * height * 3) as usize);
            for y in 0..height {
                for x in 0..width {
                    let (r, g, b) = (self.pixel)(x, y);
                    data.extend_from_slice(&[r, g, b]);
                }
            }
            Ok(data)
        }
    }
}
