//! Glyph ramps, color modes, and per-pixel character mapping.

use clap::ValueEnum;

/// Standard 10-level density ramp, darkest to brightest.
pub const STANDARD_RAMP: &str = " .:-=+*#%@";

/// Detailed 70-level ramp for high-resolution output.
pub const DETAILED_RAMP: &str =
    " .'`^\",:;Il!i><~+_-?][}{1)(|/tfjrxnuvczXYUJCLQ0OZmwqpdbkhao*#MW&8%B@$";

/// Unicode block characters, 5 levels.
pub const BLOCKS_RAMP: &str = " ░▒▓█";

/// Two-level binary look.
pub const BINARY_RAMP: &str = " 01";

/// Halfwidth katakana with digits, matrix-rain style.
pub const MATRIX_RAMP: &str = " ｦｱｳｴｵｶｷｹｺｻｼｽｾｿﾀﾂﾃﾅﾆﾇﾈﾊﾋﾎﾏﾐﾑﾒﾓﾔﾕﾗﾘﾜ012345789Z";

/// Named glyph ramp preset.
///
/// Each preset is an ordered darkest-to-brightest sequence; brightness
/// index selection is monotonic along the ramp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum CharSet {
    /// 10-level ASCII density ramp
    #[default]
    Standard,
    /// 70-level ramp for fine gradients
    Detailed,
    /// Unicode block characters
    Blocks,
    /// Space/0/1 only
    Binary,
    /// Halfwidth katakana rain
    Matrix,
}

impl CharSet {
    /// The ramp glyphs for this preset, darkest first.
    pub fn ramp(&self) -> Vec<char> {
        let s = match self {
            CharSet::Standard => STANDARD_RAMP,
            CharSet::Detailed => DETAILED_RAMP,
            CharSet::Blocks => BLOCKS_RAMP,
            CharSet::Binary => BINARY_RAMP,
            CharSet::Matrix => MATRIX_RAMP,
        };
        s.chars().collect()
    }

    /// Human-readable preset name, used in the export header.
    pub fn name(&self) -> &'static str {
        match self {
            CharSet::Standard => "standard",
            CharSet::Detailed => "detailed",
            CharSet::Blocks => "blocks",
            CharSet::Binary => "binary",
            CharSet::Matrix => "matrix",
        }
    }
}

/// Color treatment applied to rendered frames.
///
/// The mono family (`Mono`, `Green`, `Amber`) uses a single frame-wide
/// foreground; `Color` and `Neon` style each glyph individually. The split
/// keeps the common modes cheap at high resolutions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ColorMode {
    /// Plain white text
    #[default]
    Mono,
    /// Phosphor-green terminal look
    Green,
    /// Amber terminal look
    Amber,
    /// Per-pixel RGB passthrough
    Color,
    /// Three-band magenta/cyan/green quantization with glow
    Neon,
}

impl ColorMode {
    /// Whether this mode styles each glyph individually.
    pub fn is_per_glyph(&self) -> bool {
        matches!(self, ColorMode::Color | ColorMode::Neon)
    }
}

/// Foreground style for one glyph or one whole frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlyphStyle {
    pub color: (u8, u8, u8),
    pub glow: bool,
}

/// Map one RGB sample to a ramp glyph.
///
/// Brightness is the channel average; contrast is a linear stretch around
/// the 128 midpoint. The index is clamped into the ramp even at the 255
/// boundary, and degenerate (NaN) input maps to the darkest glyph.
pub fn map_pixel(r: u8, g: u8, b: u8, contrast: f32, ramp: &[char]) -> char {
    debug_assert!(ramp.len() >= 2, "glyph ramp must have at least 2 entries");
    let brightness = (r as f32 + g as f32 + b as f32) / 3.0;
    let mut adjusted = (brightness - 128.0) * contrast + 128.0;
    if adjusted.is_nan() {
        adjusted = 0.0;
    }
    let adjusted = adjusted.clamp(0.0, 255.0);
    let idx = (adjusted / 255.0 * (ramp.len() - 1) as f32).floor() as usize;
    ramp[idx.min(ramp.len() - 1)]
}

/// Per-glyph style for the given color mode.
///
/// Returns `None` for the mono family, which takes a single frame-wide
/// style from [`frame_style`] instead.
pub fn style_for(r: u8, g: u8, b: u8, mode: ColorMode) -> Option<GlyphStyle> {
    match mode {
        ColorMode::Mono | ColorMode::Green | ColorMode::Amber => None,
        ColorMode::Color => Some(GlyphStyle {
            color: (r, g, b),
            glow: false,
        }),
        ColorMode::Neon => {
            let avg = (r as f32 + g as f32 + b as f32) / 3.0;
            let color = if avg > 170.0 {
                (0xff, 0x00, 0xff)
            } else if avg > 85.0 {
                (0x00, 0xff, 0xff)
            } else {
                (0x00, 0xff, 0x00)
            };
            Some(GlyphStyle { color, glow: true })
        }
    }
}

/// Frame-wide foreground style for mono-family modes.
///
/// Per-glyph modes fall back to plain white; their real color lives in the
/// styled spans.
pub fn frame_style(mode: ColorMode) -> GlyphStyle {
    match mode {
        ColorMode::Green => GlyphStyle {
            color: (0x00, 0xff, 0x41),
            glow: true,
        },
        ColorMode::Amber => GlyphStyle {
            color: (0xff, 0xb0, 0x00),
            glow: true,
        },
        _ => GlyphStyle {
            color: (0xff, 0xff, 0xff),
            glow: false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp() -> Vec<char> {
        CharSet::Standard.ramp()
    }

    #[test]
    fn presets_have_at_least_two_glyphs() {
        for cs in [
            CharSet::Standard,
            CharSet::Detailed,
            CharSet::Blocks,
            CharSet::Binary,
            CharSet::Matrix,
        ] {
            assert!(cs.ramp().len() >= 2, "{} ramp too short", cs.name());
        }
    }

    #[test]
    fn extremes_hit_ramp_ends_at_unit_contrast() {
        let r = ramp();
        assert_eq!(map_pixel(0, 0, 0, 1.0, &r), r[0]);
        assert_eq!(map_pixel(255, 255, 255, 1.0, &r), r[r.len() - 1]);
    }

    #[test]
    fn mapping_is_monotonic_in_brightness() {
        for contrast in [0.0, 0.5, 1.0, 1.2, 3.0] {
            let r = ramp();
            let mut last_idx = 0usize;
            for v in 0..=255u8 {
                let ch = map_pixel(v, v, v, contrast, &r);
                let idx = r.iter().position(|&c| c == ch).unwrap();
                assert!(
                    idx >= last_idx,
                    "index regressed at brightness {} contrast {}",
                    v,
                    contrast
                );
                last_idx = idx;
            }
        }
    }

    #[test]
    fn mapping_stays_in_bounds_for_short_ramps() {
        let two = vec!['a', 'b'];
        for v in 0..=255u8 {
            let ch = map_pixel(v, v, v, 10.0, &two);
            assert!(ch == 'a' || ch == 'b');
        }
    }

    #[test]
    fn high_contrast_saturates() {
        let r = ramp();
        // Midpoint stays put, extremes clip hard.
        assert_eq!(map_pixel(200, 200, 200, 100.0, &r), r[r.len() - 1]);
        assert_eq!(map_pixel(50, 50, 50, 100.0, &r), r[0]);
    }

    #[test]
    fn zero_contrast_flattens_to_midpoint() {
        let r = ramp();
        let mid = map_pixel(128, 128, 128, 0.0, &r);
        assert_eq!(map_pixel(0, 0, 0, 0.0, &r), mid);
        assert_eq!(map_pixel(255, 255, 255, 0.0, &r), mid);
    }

    #[test]
    fn neon_band_boundaries() {
        let magenta = (0xff, 0x00, 0xff);
        let cyan = (0x00, 0xff, 0xff);
        let green = (0x00, 0xff, 0x00);

        let color_at = |v: u8| style_for(v, v, v, ColorMode::Neon).unwrap().color;
        assert_eq!(color_at(171), magenta);
        assert_eq!(color_at(170), cyan);
        assert_eq!(color_at(86), cyan);
        assert_eq!(color_at(85), green);
        assert_eq!(color_at(0), green);
        assert_eq!(color_at(255), magenta);
    }

    #[test]
    fn neon_always_glows() {
        assert!(style_for(10, 10, 10, ColorMode::Neon).unwrap().glow);
        assert!(style_for(200, 200, 200, ColorMode::Neon).unwrap().glow);
    }

    #[test]
    fn mono_family_has_no_per_glyph_style() {
        for mode in [ColorMode::Mono, ColorMode::Green, ColorMode::Amber] {
            assert_eq!(style_for(12, 34, 56, mode), None);
            assert!(!mode.is_per_glyph());
        }
    }

    #[test]
    fn color_mode_passes_rgb_through() {
        let style = style_for(12, 34, 56, ColorMode::Color).unwrap();
        assert_eq!(style.color, (12, 34, 56));
        assert!(!style.glow);
    }

    #[test]
    fn frame_styles_for_mono_family() {
        assert_eq!(frame_style(ColorMode::Mono).color, (255, 255, 255));
        assert!(!frame_style(ColorMode::Mono).glow);
        assert_eq!(frame_style(ColorMode::Green).color, (0x00, 0xff, 0x41));
        assert!(frame_style(ColorMode::Green).glow);
        assert_eq!(frame_style(ColorMode::Amber).color, (0xff, 0xb0, 0x00));
    }
}
