//! Display and export sinks.
//!
//! The terminal sink redraws in place with crossterm, emitting truecolor
//! spans for per-glyph modes and one frame-wide color for the mono family.
//! Glow has no terminal analog and maps to bold.

use chrono::Local;
use crossterm::style::{Attribute, Color, Print, ResetColor, SetAttribute, SetForegroundColor};
use crossterm::{cursor, queue, terminal};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::error::SinkError;
use crate::frame::AsciiFrame;
use crate::glyph::GlyphStyle;

/// On-screen presentation of rendered frames and user-visible messages.
pub trait DisplaySink {
    fn present(&mut self, frame: &AsciiFrame) -> Result<(), SinkError>;

    /// Show a diagnostic or status message in place of frame output.
    fn message(&mut self, text: &str);

    /// Update the status line under the frame.
    fn status(&mut self, line: &str);
}

/// Persists a finished export artifact under a timestamp-bearing name.
pub trait ExportSink {
    /// Write the artifact, returning where it landed.
    fn save(&mut self, contents: &str) -> Result<PathBuf, SinkError>;
}

/// Format seconds as `m:ss` for the status line.
pub fn format_clock(seconds: f64) -> String {
    let total = seconds.max(0.0).floor() as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

/// Frame display on the controlling terminal.
pub struct TerminalSink<W: Write> {
    out: W,
    cleared: bool,
    status_line: String,
}

impl TerminalSink<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> TerminalSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            cleared: false,
            status_line: String::new(),
        }
    }

    fn queue_style(&mut self, style: GlyphStyle) -> Result<(), SinkError> {
        let (r, g, b) = style.color;
        queue!(self.out, SetForegroundColor(Color::Rgb { r, g, b })).map_err(io_err)?;
        if style.glow {
            queue!(self.out, SetAttribute(Attribute::Bold)).map_err(io_err)?;
        }
        Ok(())
    }
}

fn io_err(e: io::Error) -> SinkError {
    SinkError::Io(e)
}

impl<W: Write> DisplaySink for TerminalSink<W> {
    fn present(&mut self, frame: &AsciiFrame) -> Result<(), SinkError> {
        if !self.cleared {
            queue!(self.out, terminal::Clear(terminal::ClearType::All)).map_err(io_err)?;
            self.cleared = true;
        }
        queue!(self.out, cursor::MoveTo(0, 0)).map_err(io_err)?;

        match frame.spans() {
            Some(spans) => {
                for span in spans {
                    if span.text == "\n" {
                        queue!(self.out, ResetColor, Print("\r\n")).map_err(io_err)?;
                        continue;
                    }
                    match span.style {
                        Some(style) => self.queue_style(style)?,
                        None => queue!(self.out, ResetColor).map_err(io_err)?,
                    }
                    queue!(self.out, Print(span.text.as_str())).map_err(io_err)?;
                }
                queue!(self.out, ResetColor).map_err(io_err)?;
            }
            None => {
                self.queue_style(frame.frame_style())?;
                for line in frame.plain_text().lines() {
                    queue!(self.out, Print(line), Print("\r\n")).map_err(io_err)?;
                }
                queue!(self.out, ResetColor, SetAttribute(Attribute::Reset)).map_err(io_err)?;
            }
        }

        if !self.status_line.is_empty() {
            queue!(
                self.out,
                terminal::Clear(terminal::ClearType::CurrentLine),
                Print(self.status_line.as_str()),
                Print("\r\n")
            )
            .map_err(io_err)?;
        }
        self.out.flush().map_err(io_err)?;
        Ok(())
    }

    fn message(&mut self, text: &str) {
        let _ = queue!(
            self.out,
            cursor::MoveTo(0, 0),
            terminal::Clear(terminal::ClearType::All),
            ResetColor,
            Print(text),
            Print("\r\n")
        );
        let _ = self.out.flush();
        self.cleared = false;
    }

    fn status(&mut self, line: &str) {
        self.status_line.clear();
        self.status_line.push_str(line);
    }
}

/// Writes `ascii_video_<timestamp>.txt` into a directory.
pub struct FileSink {
    dir: PathBuf,
}

impl FileSink {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
        }
    }
}

impl ExportSink for FileSink {
    fn save(&mut self, contents: &str) -> Result<PathBuf, SinkError> {
        fs::create_dir_all(&self.dir).map_err(|e| SinkError::Unavailable {
            reason: format!("cannot create {}: {}", self.dir.display(), e),
        })?;
        let stamp = Local::now().format("%Y-%m-%dT%H-%M-%S");
        let path = self.dir.join(format!("ascii_video_{}.txt", stamp));
        fs::write(&path, contents).map_err(|e| SinkError::Unavailable {
            reason: format!("cannot write {}: {}", path.display(), e),
        })?;
        Ok(path)
    }
}

#[cfg(test)]
pub(crate) mod testutil {
    use super::*;

    /// Records everything presented, for loop and export tests.
    #[derive(Default)]
    pub(crate) struct RecordingSink {
        pub frames: Vec<String>,
        pub messages: Vec<String>,
        pub statuses: Vec<String>,
        pub fail_present: bool,
    }

    impl DisplaySink for RecordingSink {
        fn present(&mut self, frame: &AsciiFrame) -> Result<(), SinkError> {
            if self.fail_present {
                return Err(SinkError::Unavailable {
                    reason: "scripted display failure".into(),
                });
            }
            self.frames.push(frame.plain_text().to_string());
            Ok(())
        }

        fn message(&mut self, text: &str) {
            self.messages.push(text.to_string());
        }

        fn status(&mut self, line: &str) {
            self.statuses.push(line.to_string());
        }
    }

    /// Export sink capturing the artifact, optionally unavailable.
    #[derive(Default)]
    pub(crate) struct CapturingExportSink {
        pub saved: Option<String>,
        pub fail: bool,
    }

    impl ExportSink for CapturingExportSink {
        fn save(&mut self, contents: &str) -> Result<PathBuf, SinkError> {
            if self.fail {
                return Err(SinkError::Unavailable {
                    reason: "scripted sink outage".into(),
                });
            }
            self.saved = Some(contents.to_string());
            Ok(PathBuf::from("captured.txt"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glyph::{CharSet, ColorMode};
    use crate::source::testutil::MockSource;
    use crate::{frame, RenderConfig};

    #[test]
    fn clock_formatting() {
        assert_eq!(format_clock(0.0), "0:00");
        assert_eq!(format_clock(65.4), "1:05");
        assert_eq!(format_clock(600.0), "10:00");
        assert_eq!(format_clock(-3.0), "0:00");
    }

    #[test]
    fn file_sink_writes_timestamped_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = FileSink::new(dir.path());
        let path = sink.save("header\n===FRAME===\nbody\n").unwrap();
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("ascii_video_"));
        assert!(name.ends_with(".txt"));
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "header\n===FRAME===\nbody\n"
        );
    }

    #[test]
    fn file_sink_reports_unwritable_directory() {
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("not_a_dir");
        fs::write(&file_path, "x").unwrap();
        let mut sink = FileSink::new(&file_path);
        let err = sink.save("contents").unwrap_err();
        assert!(matches!(err, SinkError::Unavailable { .. }));
    }

    #[test]
    fn terminal_sink_emits_frame_text() {
        let mut out = Vec::new();
        {
            let mut sink = TerminalSink::new(&mut out);
            let mut src = MockSource::new(640, 480, 5.0).with_pixel(|_, _| (255, 255, 255));
            let cfg = RenderConfig {
                width: 4,
                contrast: 1.0,
                charset: CharSet::Standard,
                color_mode: ColorMode::Mono,
            };
            let f = frame::render(&mut src, &cfg, frame::DisplayMode::Windowed).unwrap();
            sink.present(&f).unwrap();
        }
        let text = String::from_utf8_lossy(&out);
        assert!(text.contains("@@@@"));
    }

    #[test]
    fn terminal_sink_sets_truecolor_for_styled_spans() {
        let mut out = Vec::new();
        {
            let mut sink = TerminalSink::new(&mut out);
            let mut src = MockSource::new(640, 480, 5.0).with_pixel(|_, _| (10, 200, 30));
            let cfg = RenderConfig {
                width: 4,
                contrast: 1.0,
                charset: CharSet::Standard,
                color_mode: ColorMode::Color,
            };
            let f = frame::render(&mut src, &cfg, frame::DisplayMode::Windowed).unwrap();
            sink.present(&f).unwrap();
        }
        let text = String::from_utf8_lossy(&out);
        assert!(text.contains("38;2;10;200;30"));
    }
}
