//! Frame assembly: sampled grid in, complete ASCII frame out.

use crate::error::RenderError;
use crate::glyph::{self, GlyphStyle};
use crate::sampler::{self, PixelGrid};
use crate::source::FrameSource;
use crate::RenderConfig;

/// How the frame will be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayMode {
    #[default]
    Windowed,
    /// Larger viewport: width is scaled up before height derivation,
    /// trading resolution for readability.
    Fullscreen,
}

/// Fullscreen width multiplier.
pub const FULLSCREEN_SCALE: u32 = 3;
/// Upper bound on the scaled fullscreen width.
pub const FULLSCREEN_MAX_WIDTH: u32 = 350;

/// Output width after display-mode scaling.
pub fn effective_width(width: u32, mode: DisplayMode) -> u32 {
    match mode {
        DisplayMode::Windowed => width,
        DisplayMode::Fullscreen => (width * FULLSCREEN_SCALE).min(FULLSCREEN_MAX_WIDTH),
    }
}

/// Rows for a given output width and source aspect ratio.
///
/// The division by 2 compensates for character cells being roughly twice
/// as tall as wide.
pub fn derived_height(width: u32, source_width: u32, source_height: u32) -> u32 {
    ((width as f64 * source_height as f64 / source_width as f64) / 2.0).floor() as u32
}

/// A run of consecutive glyphs sharing one style.
///
/// `style: None` marks unstyled text (row separators, mono-family runs).
#[derive(Debug, Clone, PartialEq)]
pub struct StyledSpan {
    pub text: String,
    pub style: Option<GlyphStyle>,
}

/// One complete rendered frame.
///
/// The plain-text form is always present regardless of color mode, since
/// export stores plain text. Per-glyph modes additionally carry coalesced
/// styled spans for on-screen presentation. Frames are built fresh each
/// tick and discarded after display.
#[derive(Debug, Clone)]
pub struct AsciiFrame {
    pub width: u32,
    pub height: u32,
    plain: String,
    spans: Option<Vec<StyledSpan>>,
    style: GlyphStyle,
}

impl AsciiFrame {
    /// `\n`-separated character rows.
    pub fn plain_text(&self) -> &str {
        &self.plain
    }

    /// Coalesced styled spans, present only for per-glyph color modes.
    pub fn spans(&self) -> Option<&[StyledSpan]> {
        self.spans.as_deref()
    }

    /// Frame-wide foreground style (mono family; white otherwise).
    pub fn frame_style(&self) -> GlyphStyle {
        self.style
    }

    /// Consume the frame, keeping only its plain text.
    pub fn into_plain(self) -> String {
        self.plain
    }
}

/// Render one frame from the source's current position.
///
/// Sampler failures are wrapped; callers in the pacing loop catch the
/// result instead of unwinding.
pub fn render<S: FrameSource>(
    source: &mut S,
    config: &RenderConfig,
    mode: DisplayMode,
) -> Result<AsciiFrame, RenderError> {
    let width = effective_width(config.width, mode);
    let (nw, nh) = source.natural_size();
    if nw == 0 || nh == 0 {
        return Err(crate::error::SampleError::InvalidSourceDimensions {
            width: nw,
            height: nh,
        }
        .into());
    }
    // Degenerate aspect ratios still get one row.
    let height = derived_height(width, nw, nh).max(1);

    let grid = sampler::sample(source, width, height)?;
    let ramp = config.charset.ramp();

    let frame = if config.color_mode.is_per_glyph() {
        assemble_styled(&grid, config, &ramp)
    } else {
        assemble_plain(&grid, config, &ramp)
    };
    Ok(frame)
}

fn assemble_plain(grid: &PixelGrid, config: &RenderConfig, ramp: &[char]) -> AsciiFrame {
    let mut plain = String::with_capacity((grid.width as usize + 1) * grid.height as usize);
    for y in 0..grid.height {
        for x in 0..grid.width {
            let (r, g, b) = grid.rgb_at(x, y);
            plain.push(glyph::map_pixel(r, g, b, config.contrast, ramp));
        }
        plain.push('\n');
    }
    AsciiFrame {
        width: grid.width,
        height: grid.height,
        plain,
        spans: None,
        style: glyph::frame_style(config.color_mode),
    }
}

fn assemble_styled(grid: &PixelGrid, config: &RenderConfig, ramp: &[char]) -> AsciiFrame {
    let mut plain = String::with_capacity((grid.width as usize + 1) * grid.height as usize);
    let mut spans: Vec<StyledSpan> = Vec::new();
    let mut run_text = String::new();
    let mut run_style: Option<GlyphStyle> = None;

    let mut flush = |text: &mut String, style: Option<GlyphStyle>, spans: &mut Vec<StyledSpan>| {
        if !text.is_empty() {
            spans.push(StyledSpan {
                text: std::mem::take(text),
                style,
            });
        }
    };

    for y in 0..grid.height {
        for x in 0..grid.width {
            let (r, g, b) = grid.rgb_at(x, y);
            let ch = glyph::map_pixel(r, g, b, config.contrast, ramp);
            plain.push(ch);

            let style = glyph::style_for(r, g, b, config.color_mode);
            if style != run_style {
                flush(&mut run_text, run_style, &mut spans);
                run_style = style;
            }
            run_text.push(ch);
        }
        plain.push('\n');
        flush(&mut run_text, run_style, &mut spans);
        run_style = None;
        spans.push(StyledSpan {
            text: "\n".to_string(),
            style: None,
        });
    }

    AsciiFrame {
        width: grid.width,
        height: grid.height,
        plain,
        spans: Some(spans),
        style: glyph::frame_style(config.color_mode),
    }
}
