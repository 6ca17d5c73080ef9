#![forbid(unsafe_code)]

//! RGBA8 pixel surface: the primary raster data model.
//!
//! The buffer owns a flat vector of bytes in row-major order, four bytes per
//! pixel, and provides the clamped region I/O the capture/diff/replay engine
//! is built on. All coordinates are layer-local; reads and writes that reach
//! past the surface are clipped, never errors.

use crate::geometry::PixelRegion;

/// Bytes per pixel (RGBA8).
pub const BYTES_PER_PIXEL: usize = 4;

/// A flat row-major RGBA8 pixel surface.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Create a new buffer filled with transparent black.
    pub fn new(width: u32, height: u32) -> Self {
        let len = width as usize * height as usize * BYTES_PER_PIXEL;
        Self {
            width,
            height,
            data: vec![0; len],
        }
    }

    /// Build a buffer from raw RGBA bytes.
    ///
    /// Returns `None` if `data` is not exactly `width * height * 4` bytes.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        let expected = width as usize * height as usize * BYTES_PER_PIXEL;
        if data.len() != expected {
            return None;
        }
        Some(Self {
            width,
            height,
            data,
        })
    }

    /// Width in pixels.
    #[inline]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[inline]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// The full surface as a region at the origin.
    #[inline]
    pub const fn bounds(&self) -> PixelRegion {
        PixelRegion::from_size(self.width, self.height)
    }

    /// Raw RGBA bytes, row-major.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Size of the backing store in bytes.
    #[inline]
    pub fn byte_len(&self) -> usize {
        self.data.len()
    }

    /// Get the RGBA value at `(x, y)`.
    ///
    /// Returns `None` if out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x < self.width && y < self.height {
            let i = self.index(x, y);
            Some([
                self.data[i],
                self.data[i + 1],
                self.data[i + 2],
                self.data[i + 3],
            ])
        } else {
            None
        }
    }

    /// Set the RGBA value at `(x, y)`.
    ///
    /// Returns `false` if out of bounds.
    pub fn set_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) -> bool {
        if x < self.width && y < self.height {
            let i = self.index(x, y);
            self.data[i..i + BYTES_PER_PIXEL].copy_from_slice(&rgba);
            true
        } else {
            false
        }
    }

    /// Fill a region with one RGBA value. The region is clamped to the
    /// surface.
    pub fn fill(&mut self, region: PixelRegion, rgba: [u8; 4]) {
        let Some(clamped) = region.intersection_opt(&self.bounds()) else {
            return;
        };
        for y in clamped.y..clamped.bottom() {
            let start = self.index(clamped.x, y);
            let end = start + clamped.width as usize * BYTES_PER_PIXEL;
            for px in self.data[start..end].chunks_exact_mut(BYTES_PER_PIXEL) {
                px.copy_from_slice(&rgba);
            }
        }
    }

    /// Copy a region of this surface into a new buffer.
    ///
    /// The region is clamped to the surface; a region fully outside it
    /// yields an empty (0x0) buffer.
    pub fn read_region(&self, region: PixelRegion) -> PixelBuffer {
        let Some(clamped) = region.intersection_opt(&self.bounds()) else {
            return PixelBuffer::new(0, 0);
        };
        let mut out = PixelBuffer::new(clamped.width, clamped.height);
        let row_bytes = clamped.width as usize * BYTES_PER_PIXEL;
        for (row, y) in (clamped.y..clamped.bottom()).enumerate() {
            let src_start = self.index(clamped.x, y);
            let dst_start = row * row_bytes;
            out.data[dst_start..dst_start + row_bytes]
                .copy_from_slice(&self.data[src_start..src_start + row_bytes]);
        }
        out
    }

    /// Write another buffer into this surface with its top-left corner at
    /// `(x, y)`. Source pixels falling outside the surface are clipped.
    pub fn write_region(&mut self, src: &PixelBuffer, x: u32, y: u32) {
        let dst_region = PixelRegion::new(x, y, src.width, src.height);
        let Some(clamped) = dst_region.intersection_opt(&self.bounds()) else {
            return;
        };
        let row_bytes = clamped.width as usize * BYTES_PER_PIXEL;
        for dy in clamped.y..clamped.bottom() {
            let src_start = src.index(clamped.x - x, dy - y);
            let dst_start = self.index(clamped.x, dy);
            self.data[dst_start..dst_start + row_bytes]
                .copy_from_slice(&src.data[src_start..src_start + row_bytes]);
        }
    }

    /// Convert `(x, y)` to a byte offset.
    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * BYTES_PER_PIXEL
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_buffer_is_transparent() {
        let buf = PixelBuffer::new(4, 3);
        assert_eq!(buf.width(), 4);
        assert_eq!(buf.height(), 3);
        assert_eq!(buf.byte_len(), 48);
        assert_eq!(buf.pixel(0, 0), Some([0, 0, 0, 0]));
    }

    #[test]
    fn from_raw_validates_length() {
        assert!(PixelBuffer::from_raw(2, 2, vec![0; 16]).is_some());
        assert!(PixelBuffer::from_raw(2, 2, vec![0; 15]).is_none());
        assert!(PixelBuffer::from_raw(2, 2, vec![0; 17]).is_none());
    }

    #[test]
    fn set_and_get_pixel() {
        let mut buf = PixelBuffer::new(5, 5);
        assert!(buf.set_pixel(2, 3, [10, 20, 30, 255]));
        assert_eq!(buf.pixel(2, 3), Some([10, 20, 30, 255]));
        assert_eq!(buf.pixel(3, 2), Some([0, 0, 0, 0]));
    }

    #[test]
    fn out_of_bounds_pixel_access_is_safe() {
        let mut buf = PixelBuffer::new(3, 3);
        assert_eq!(buf.pixel(3, 0), None);
        assert_eq!(buf.pixel(0, 3), None);
        assert!(!buf.set_pixel(99, 99, [1, 2, 3, 4]));
    }

    #[test]
    fn fill_clamps_to_surface() {
        let mut buf = PixelBuffer::new(4, 4);
        buf.fill(PixelRegion::new(2, 2, 10, 10), [255, 0, 0, 255]);
        assert_eq!(buf.pixel(2, 2), Some([255, 0, 0, 255]));
        assert_eq!(buf.pixel(3, 3), Some([255, 0, 0, 255]));
        assert_eq!(buf.pixel(1, 1), Some([0, 0, 0, 0]));
    }

    #[test]
    fn read_region_copies_rows() {
        let mut buf = PixelBuffer::new(4, 4);
        buf.set_pixel(1, 1, [1, 1, 1, 1]);
        buf.set_pixel(2, 2, [2, 2, 2, 2]);

        let sub = buf.read_region(PixelRegion::new(1, 1, 2, 2));
        assert_eq!(sub.width(), 2);
        assert_eq!(sub.height(), 2);
        assert_eq!(sub.pixel(0, 0), Some([1, 1, 1, 1]));
        assert_eq!(sub.pixel(1, 1), Some([2, 2, 2, 2]));
    }

    #[test]
    fn read_region_fully_outside_is_empty() {
        let buf = PixelBuffer::new(4, 4);
        let sub = buf.read_region(PixelRegion::new(10, 10, 2, 2));
        assert_eq!(sub.width(), 0);
        assert_eq!(sub.height(), 0);
    }

    #[test]
    fn write_then_read_region_round_trips() {
        let mut patch = PixelBuffer::new(2, 2);
        patch.fill(patch.bounds(), [9, 9, 9, 9]);

        let mut buf = PixelBuffer::new(6, 6);
        buf.write_region(&patch, 3, 2);

        assert_eq!(buf.pixel(3, 2), Some([9, 9, 9, 9]));
        assert_eq!(buf.pixel(4, 3), Some([9, 9, 9, 9]));
        assert_eq!(buf.pixel(2, 2), Some([0, 0, 0, 0]));
        assert_eq!(buf.read_region(PixelRegion::new(3, 2, 2, 2)), patch);
    }

    #[test]
    fn write_region_clips_at_edge() {
        let mut patch = PixelBuffer::new(3, 3);
        patch.fill(patch.bounds(), [7, 7, 7, 7]);

        let mut buf = PixelBuffer::new(4, 4);
        buf.write_region(&patch, 2, 2);

        assert_eq!(buf.pixel(3, 3), Some([7, 7, 7, 7]));
        assert_eq!(buf.pixel(2, 3), Some([7, 7, 7, 7]));
        // Nothing wrapped around.
        assert_eq!(buf.pixel(0, 0), Some([0, 0, 0, 0]));
    }

    #[test]
    fn zero_size_buffer() {
        let buf = PixelBuffer::new(0, 0);
        assert!(buf.bounds().is_empty());
        assert_eq!(buf.pixel(0, 0), None);
    }
}
