#![forbid(unsafe_code)]

//! Pixel-region differencing.
//!
//! Capture bounds are usually conservative — padded for brush radius, or a
//! whole deferred surface — while only a few pixels actually changed. The
//! differ shrinks them to the minimal rectangle that encloses every
//! differing pixel, so patch memory is proportional to the edit, not the
//! gesture.

use pentimento_raster::buffer::BYTES_PER_PIXEL;
use pentimento_raster::{PixelBuffer, PixelRegion};

/// Compare two equal-sized buffers covering `region` of a layer.
///
/// Returns the minimal enclosing rectangle of differing pixels, in layer
/// coordinates, or `None` when the buffers are identical. Dimension
/// mismatches also return `None` — a mismatched pair cannot produce a
/// coherent patch.
#[must_use]
pub fn diff(before: &PixelBuffer, after: &PixelBuffer, region: PixelRegion) -> Option<PixelRegion> {
    if before.width() != after.width() || before.height() != after.height() {
        return None;
    }
    if before.width() != region.width || before.height() != region.height {
        return None;
    }
    // Fast path: no-op tool actions (a click-drag ending where it started)
    // leave the buffers byte-identical.
    if before.as_bytes() == after.as_bytes() {
        return None;
    }

    let width = region.width as usize;
    let row_bytes = width * BYTES_PER_PIXEL;
    let mut min_x = usize::MAX;
    let mut min_y = usize::MAX;
    let mut max_x = 0usize;
    let mut max_y = 0usize;

    for y in 0..region.height as usize {
        let start = y * row_bytes;
        let before_row = &before.as_bytes()[start..start + row_bytes];
        let after_row = &after.as_bytes()[start..start + row_bytes];
        if before_row == after_row {
            continue;
        }
        for (x, (b, a)) in before_row
            .chunks_exact(BYTES_PER_PIXEL)
            .zip(after_row.chunks_exact(BYTES_PER_PIXEL))
            .enumerate()
        {
            if b != a {
                min_x = min_x.min(x);
                max_x = max_x.max(x);
                min_y = min_y.min(y);
                max_y = max_y.max(y);
            }
        }
    }

    // The slice comparison above said "different", but if no differing pixel
    // was found, report no change rather than a bogus rectangle.
    if min_x == usize::MAX {
        return None;
    }

    Some(PixelRegion::new(
        region.x + min_x as u32,
        region.y + min_y as u32,
        (max_x - min_x + 1) as u32,
        (max_y - min_y + 1) as u32,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(w: u32, h: u32) -> (PixelBuffer, PixelBuffer) {
        (PixelBuffer::new(w, h), PixelBuffer::new(w, h))
    }

    #[test]
    fn identical_buffers_diff_to_none() {
        let (before, after) = pair(8, 8);
        assert_eq!(diff(&before, &after, PixelRegion::from_size(8, 8)), None);
    }

    #[test]
    fn single_pixel_change_yields_unit_region() {
        let (before, mut after) = pair(20, 20);
        after.set_pixel(5, 5, [255, 0, 0, 255]);

        let region = PixelRegion::new(10, 10, 20, 20);
        // Buffer coordinates are region-relative; (5,5) maps to (15,15).
        assert_eq!(
            diff(&before, &after, region),
            Some(PixelRegion::new(15, 15, 1, 1))
        );
    }

    #[test]
    fn bounding_rect_encloses_scattered_changes() {
        let (before, mut after) = pair(10, 10);
        after.set_pixel(2, 3, [1, 0, 0, 0]);
        after.set_pixel(7, 8, [0, 1, 0, 0]);

        assert_eq!(
            diff(&before, &after, PixelRegion::from_size(10, 10)),
            Some(PixelRegion::new(2, 3, 6, 6))
        );
    }

    #[test]
    fn alpha_only_change_is_detected() {
        let (before, mut after) = pair(4, 4);
        after.set_pixel(0, 0, [0, 0, 0, 1]);

        assert_eq!(
            diff(&before, &after, PixelRegion::from_size(4, 4)),
            Some(PixelRegion::new(0, 0, 1, 1))
        );
    }

    #[test]
    fn full_surface_change_spans_region() {
        let (before, mut after) = pair(6, 4);
        after.fill(after.bounds(), [9, 9, 9, 9]);

        assert_eq!(
            diff(&before, &after, PixelRegion::new(3, 3, 6, 4)),
            Some(PixelRegion::new(3, 3, 6, 4))
        );
    }

    #[test]
    fn mismatched_dimensions_diff_to_none() {
        let before = PixelBuffer::new(4, 4);
        let after = PixelBuffer::new(5, 4);
        assert_eq!(diff(&before, &after, PixelRegion::from_size(4, 4)), None);
        // Region not matching the buffers is also refused.
        let (b, a) = pair(4, 4);
        assert_eq!(diff(&b, &a, PixelRegion::from_size(5, 5)), None);
    }

    #[test]
    fn empty_region_diffs_to_none() {
        let (before, after) = pair(0, 0);
        assert_eq!(diff(&before, &after, PixelRegion::default()), None);
    }
}
