//! Pixel sampling: one RGB triple per output character cell.

use crate::error::SampleError;
use crate::source::FrameSource;

/// A sampled grid of RGB triples, row-major, flat `[r, g, b, r, g, b, ..]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelGrid {
    pub width: u32,
    pub height: u32,
    data: Vec<u8>,
}

impl PixelGrid {
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Self {
        debug_assert_eq!(data.len(), (width * height * 3) as usize);
        Self {
            width,
            height,
            data,
        }
    }

    /// RGB triple at (x, y). Panics out of bounds; callers iterate the
    /// grid's own dimensions.
    #[inline]
    pub fn rgb_at(&self, x: u32, y: u32) -> (u8, u8, u8) {
        let i = ((y * self.width + x) * 3) as usize;
        (self.data[i], self.data[i + 1], self.data[i + 2])
    }
}

/// Sample the source's current frame into a `width * height` grid.
///
/// The source draws into an intermediate raster sized exactly to the grid,
/// so the resampling filter is the decoder's; each call with the same
/// position and size yields the same grid. Readback denial surfaces as
/// [`SampleError::PixelAccessDenied`] and must not take down the caller's
/// loop.
pub fn sample<S: FrameSource>(
    source: &mut S,
    width: u32,
    height: u32,
) -> Result<PixelGrid, SampleError> {
    let (nw, nh) = source.natural_size();
    if nw == 0 || nh == 0 {
        return Err(SampleError::InvalidSourceDimensions {
            width: nw,
            height: nh,
        });
    }
    debug_assert!(width > 0 && height > 0, "target grid must be non-empty");

    let data = source.read_rgb(width, height)?;
    if data.len() != (width * height * 3) as usize {
        return Err(SampleError::PixelAccessDenied {
            reason: format!(
                "readback returned {} bytes for a {}x{} grid",
                data.len(),
                width,
                height
            ),
        });
    }
    Ok(PixelGrid::new(width, height, data))
}
