#![forbid(unsafe_code)]

//! History entry value types.
//!
//! A [`RasterPatch`] is the minimal before/after pixel pair for one layer;
//! a [`HistoryEntry`] bundles every patch of one logical user action with an
//! optional structural (layer-topology) change. Entries are immutable once
//! created and only ever move between the two ledger stacks.

use std::time::Instant;

use pentimento_raster::{LayerId, PixelBuffer, PixelRegion};
use smallvec::SmallVec;

use crate::eviction::ByteCost;
use crate::structural::StructuralChange;

/// Minimal before/after pixel pair for one layer within one entry.
///
/// Both buffers have exactly the dimensions of `region`; memory cost is
/// `width * height * 4 * 2` bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterPatch {
    layer: LayerId,
    region: PixelRegion,
    before: PixelBuffer,
    after: PixelBuffer,
}

impl RasterPatch {
    pub(crate) fn new(
        layer: LayerId,
        region: PixelRegion,
        before: PixelBuffer,
        after: PixelBuffer,
    ) -> Self {
        debug_assert_eq!(before.width(), region.width);
        debug_assert_eq!(before.height(), region.height);
        debug_assert_eq!(after.width(), region.width);
        debug_assert_eq!(after.height(), region.height);
        Self {
            layer,
            region,
            before,
            after,
        }
    }

    /// The layer this patch applies to.
    #[inline]
    pub const fn layer(&self) -> LayerId {
        self.layer
    }

    /// The patched rectangle in layer coordinates.
    #[inline]
    pub const fn region(&self) -> PixelRegion {
        self.region
    }

    /// Pixels as they were before the action.
    #[inline]
    pub const fn before(&self) -> &PixelBuffer {
        &self.before
    }

    /// Pixels as they were after the action.
    #[inline]
    pub const fn after(&self) -> &PixelBuffer {
        &self.after
    }
}

impl ByteCost for RasterPatch {
    fn byte_cost(&self) -> usize {
        self.before.byte_len() + self.after.byte_len()
    }
}

/// One undoable user action: raster patches plus an optional structural
/// change, under a display label.
#[derive(Debug)]
pub struct HistoryEntry {
    label: String,
    timestamp: Instant,
    patches: SmallVec<[RasterPatch; 2]>,
    structural: Option<StructuralChange>,
}

impl HistoryEntry {
    pub(crate) fn new(
        label: String,
        patches: SmallVec<[RasterPatch; 2]>,
        structural: Option<StructuralChange>,
    ) -> Self {
        Self {
            label,
            timestamp: Instant::now(),
            patches,
            structural,
        }
    }

    /// Human-readable action label (e.g. "Brush Stroke").
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// When the entry was committed.
    #[must_use]
    pub const fn timestamp(&self) -> Instant {
        self.timestamp
    }

    /// The entry's raster patches. Regions are disjoint per layer and may
    /// be applied in any order.
    #[must_use]
    pub fn patches(&self) -> &[RasterPatch] {
        &self.patches
    }

    /// The structural change, if this action touched layer topology.
    #[must_use]
    pub const fn structural(&self) -> Option<&StructuralChange> {
        self.structural.as_ref()
    }

    /// An entry with no patches and no structural change carries nothing
    /// to undo and must not be pushed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patches.is_empty() && self.structural.is_none()
    }
}

impl ByteCost for HistoryEntry {
    fn byte_cost(&self) -> usize {
        let patches: usize = self.patches.iter().map(ByteCost::byte_cost).sum();
        let structural = self
            .structural
            .as_ref()
            .map_or(0, StructuralChange::byte_cost);
        patches + structural + self.label.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    fn unit_patch(id: u32) -> RasterPatch {
        RasterPatch::new(
            LayerId::new(id),
            PixelRegion::new(3, 4, 2, 2),
            PixelBuffer::new(2, 2),
            PixelBuffer::new(2, 2),
        )
    }

    #[test]
    fn patch_cost_is_two_buffers() {
        let patch = unit_patch(1);
        assert_eq!(patch.byte_cost(), 2 * 2 * 4 * 2);
        assert_eq!(patch.region(), PixelRegion::new(3, 4, 2, 2));
    }

    #[test]
    fn entry_without_content_is_empty() {
        let entry = HistoryEntry::new("noop".to_string(), SmallVec::new(), None);
        assert!(entry.is_empty());
        assert_eq!(entry.byte_cost(), 4);
    }

    #[test]
    fn entry_cost_sums_patches_and_label() {
        let entry = HistoryEntry::new("ab".to_string(), smallvec![unit_patch(1), unit_patch(2)], None);
        assert!(!entry.is_empty());
        assert_eq!(entry.byte_cost(), 2 * 32 + 2);
        assert_eq!(entry.patches().len(), 2);
        assert_eq!(entry.label(), "ab");
    }
}
