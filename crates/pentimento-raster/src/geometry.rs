#![forbid(unsafe_code)]

//! Geometric primitives.

/// A rectangle in a layer's local pixel coordinate space.
///
/// Coordinates are 0-indexed with the origin at the top-left. `right` and
/// `bottom` edges are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PixelRegion {
    /// Left edge (inclusive).
    pub x: u32,
    /// Top edge (inclusive).
    pub y: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl PixelRegion {
    /// Create a new region.
    #[inline]
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a region from the origin with the given size.
    #[inline]
    pub const fn from_size(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    /// The square padding region around a point: `2r` wide and tall,
    /// clamped at the coordinate origin.
    ///
    /// Used to grow capture bounds during continuous interaction, where
    /// `radius` is the brush radius for the stroke.
    pub const fn around_point(x: u32, y: u32, radius: u32) -> Self {
        let x0 = x.saturating_sub(radius);
        let y0 = y.saturating_sub(radius);
        let x1 = x.saturating_add(radius);
        let y1 = y.saturating_add(radius);
        Self::new(x0, y0, x1 - x0, y1 - y0)
    }

    /// Right edge (exclusive).
    #[inline]
    pub const fn right(&self) -> u32 {
        self.x.saturating_add(self.width)
    }

    /// Bottom edge (exclusive).
    #[inline]
    pub const fn bottom(&self) -> u32 {
        self.y.saturating_add(self.height)
    }

    /// Area in pixels.
    #[inline]
    pub const fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Check if the region has zero area.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Check if a point is inside the region.
    #[inline]
    pub const fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// The smallest region containing both `self` and `other`.
    pub fn union(&self, other: &PixelRegion) -> PixelRegion {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());

        PixelRegion {
            x,
            y,
            width: right.saturating_sub(x),
            height: bottom.saturating_sub(y),
        }
    }

    /// Compute the intersection with another region.
    ///
    /// Returns an empty region if the regions don't overlap.
    #[inline]
    pub fn intersection(&self, other: &PixelRegion) -> PixelRegion {
        self.intersection_opt(other).unwrap_or_default()
    }

    /// Compute the intersection with another region, returning `None` if
    /// there is no overlap.
    #[inline]
    pub fn intersection_opt(&self, other: &PixelRegion) -> Option<PixelRegion> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());

        if x < right && y < bottom {
            Some(PixelRegion::new(x, y, right - x, bottom - y))
        } else {
            None
        }
    }
}
