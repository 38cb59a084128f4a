//! # asciivid - ASCII video player library
//!
//! `asciivid` turns video into live ASCII art: it samples frames from a
//! decoder, maps pixels to glyphs through a contrast-adjusted brightness
//! ramp, paces rendering at a target frame rate, and can sweep a whole
//! timeline into a single annotated text export.
//!
//! ## Features
//!
//! - Per-frame pixel sampling via ffmpeg with aspect-corrected sizing
//! - Five character ramps and five color modes (mono, green, amber,
//!   per-glyph color, neon banding)
//! - Drift-free frame pacing with a measured-FPS window
//! - Full-timeline text export with progress reporting and cancellation
//! - Terminal display with truecolor spans
//!
//! ## Example
//!
//! ```no_run
//! use asciivid::{RenderConfig, Session, SystemClock, TerminalSink, VideoSource};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let source = VideoSource::open(Path::new("input.mp4"))?;
//! let mut session = Session::new(
//!     source,
//!     SystemClock::default(),
//!     RenderConfig::default(),
//!     asciivid::DEFAULT_FPS,
//! );
//! let mut sink = TerminalSink::stdout();
//! session.play();
//! loop {
//!     match session.tick(&mut sink) {
//!         asciivid::TickOutcome::Ended => break,
//!         asciivid::TickOutcome::Failed(msg) => {
//!             eprintln!("{}", msg);
//!             break;
//!         }
//!         _ => std::thread::sleep(std::time::Duration::from_millis(4)),
//!     }
//! }
//! # Ok(())
//! # }
//! ```

use serde::Deserialize;

pub mod error;
pub mod export;
pub mod frame;
pub mod glyph;
pub mod pacing;
pub mod sampler;
pub mod session;
pub mod sink;
pub mod source;

pub use error::{ExportError, RenderError, SampleError, SinkError};
pub use export::{
    CancelToken, ExportOptions, ExportPhase, ExportProgress, ExportSummary, Sleeper,
    ThreadSleeper,
};
pub use frame::{AsciiFrame, DisplayMode, StyledSpan};
pub use glyph::{CharSet, ColorMode, GlyphStyle};
pub use pacing::{Clock, LoopState, Playback, SystemClock, TickOutcome, TickReport};
pub use sampler::PixelGrid;
pub use session::{Role, Session};
pub use sink::{DisplaySink, ExportSink, FileSink, TerminalSink};
pub use source::{FfmpegConfig, FrameSource, SourceEvent, VideoSource};

/// Default output width in characters.
pub const DEFAULT_WIDTH: u32 = 100;
/// Default contrast multiplier.
pub const DEFAULT_CONTRAST: f32 = 1.2;
/// Default target frame rate for playback and export.
pub const DEFAULT_FPS: u32 = 30;

/// Per-frame rendering settings.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    /// Output width in characters (before any fullscreen scaling).
    pub width: u32,
    /// Contrast multiplier applied around mid-gray.
    pub contrast: f32,
    pub charset: CharSet,
    pub color_mode: ColorMode,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            contrast: DEFAULT_CONTRAST,
            charset: CharSet::Standard,
            color_mode: ColorMode::Mono,
        }
    }
}

/// Named playback preset from the app config file.
#[derive(Debug, Deserialize, Clone)]
pub struct Preset {
    pub width: u32,
    pub fps: u32,
    pub contrast: f32,
}

impl Preset {
    pub fn render_config(&self) -> RenderConfig {
        RenderConfig {
            width: self.width,
            contrast: self.contrast,
            ..RenderConfig::default()
        }
    }
}

/// Application configuration with playback presets.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub presets: std::collections::HashMap<String, Preset>,
    pub default_preset: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        let default_json = r#"{
            "presets": {
                "default": {"width": 100, "fps": 30, "contrast": 1.2},
                "small":   {"width": 60,  "fps": 24, "contrast": 1.2},
                "large":   {"width": 200, "fps": 30, "contrast": 1.2}
            },
            "default_preset": "default"
        }"#;
        serde_json::from_str(default_json).unwrap()
    }
}

impl AppConfig {
    pub fn default_render_config(&self) -> RenderConfig {
        self.presets
            .get(&self.default_preset)
            .map(Preset::render_config)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn built_in_config_parses_and_has_its_default_preset() {
        let cfg = AppConfig::default();
        assert!(cfg.presets.contains_key(&cfg.default_preset));
        let rc = cfg.default_render_config();
        assert_eq!(rc.width, DEFAULT_WIDTH);
        assert_eq!(rc.charset, CharSet::Standard);
    }

    #[test]
    fn render_config_defaults_match_documented_values() {
        let rc = RenderConfig::default();
        assert_eq!(rc.width, 100);
        assert_eq!(rc.contrast, 1.2);
        assert_eq!(rc.color_mode, ColorMode::Mono);
    }
}
