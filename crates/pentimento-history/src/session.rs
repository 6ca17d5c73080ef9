#![forbid(unsafe_code)]

//! Open capture bracketing one user action.
//!
//! A session opens before the first pixel of an action lands and closes at
//! commit, where capture bounds are tightened against what actually changed
//! and the result becomes a [`HistoryEntry`]. Two capture strategies exist:
//!
//! - **Eager**: the caller knows the affected rectangle up front (brush
//!   strokes with a known radius). Only that rectangle is copied, and
//!   [`expand`] can grow it mid-stroke.
//! - **Deferred**: the caller cannot predict the rectangle (flood fill,
//!   filters). The whole surface is copied at open and the real extent is
//!   discovered by diffing at commit.
//!
//! Aborting is just dropping the session; nothing has touched the ledger
//! yet.
//!
//! [`expand`]: CaptureSession::expand

use ahash::AHashMap;
use smallvec::SmallVec;
use tracing::debug;

use pentimento_raster::{Layer, LayerId, LayerRepository, PixelBuffer, PixelRegion, SurfaceCopy};

use crate::differ;
use crate::patch::{HistoryEntry, RasterPatch};
use crate::structural::{StructuralChange, StructuralSnapshot};

#[derive(Debug)]
enum CaptureStrategy {
    Eager { before: PixelBuffer },
    Deferred { surface: SurfaceCopy },
}

#[derive(Debug)]
struct CaptureDescriptor {
    /// Current capture rectangle. `None` means the whole surface (deferred).
    bounds: Option<PixelRegion>,
    strategy: CaptureStrategy,
}

/// An in-flight capture of one user action across one or more layers.
#[derive(Debug)]
pub struct CaptureSession {
    label: String,
    layers: AHashMap<LayerId, CaptureDescriptor>,
    structural_before: Option<StructuralSnapshot>,
}

impl CaptureSession {
    /// Open a capture over `layer_ids`.
    ///
    /// With `bounds` set, each layer's pre-state is copied eagerly from the
    /// given rectangle (clamped to the layer surface). With `bounds` unset,
    /// each layer's whole surface is copied and the changed rectangle is
    /// discovered at commit. Unknown layer ids are skipped.
    #[must_use]
    pub fn begin(
        repo: &dyn LayerRepository,
        label: impl Into<String>,
        layer_ids: &[LayerId],
        bounds: Option<PixelRegion>,
    ) -> Self {
        let mut layers = AHashMap::with_capacity(layer_ids.len());
        for &id in layer_ids {
            let Some(layer) = repo.layer(id) else {
                debug!(layer = id.raw(), "capture requested for unknown layer");
                continue;
            };
            let descriptor = match bounds {
                Some(region) => {
                    let clamped = region.intersection(&layer.bounds());
                    CaptureDescriptor {
                        bounds: Some(clamped),
                        strategy: CaptureStrategy::Eager {
                            before: layer.read_region(clamped),
                        },
                    }
                }
                None => CaptureDescriptor {
                    bounds: None,
                    strategy: CaptureStrategy::Deferred {
                        surface: layer.surface_copy(),
                    },
                },
            };
            layers.insert(id, descriptor);
        }
        Self {
            label: label.into(),
            layers,
            structural_before: None,
        }
    }

    /// The action label this session will commit under.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Whether this session captures the given layer.
    #[must_use]
    pub fn captures(&self, id: LayerId) -> bool {
        self.layers.contains_key(&id)
    }

    /// Grow every eager capture to also cover a `radius`-padded square
    /// around `(x, y)`.
    ///
    /// Newly covered pixels are read from the live layer; pixels already
    /// captured keep their original pre-state even though the live layer
    /// has since been painted over. Deferred captures already hold the
    /// whole surface and are untouched.
    pub fn expand(&mut self, repo: &dyn LayerRepository, x: u32, y: u32, radius: u32) {
        let pad = PixelRegion::around_point(x, y, radius);
        for (&id, descriptor) in &mut self.layers {
            let Some(old_region) = descriptor.bounds else {
                continue;
            };
            let CaptureStrategy::Eager { before: old_before } = &mut descriptor.strategy else {
                continue;
            };
            let Some(layer) = repo.layer(id) else {
                debug!(layer = id.raw(), "captured layer vanished during expand");
                continue;
            };
            let new_region = old_region.union(&pad).intersection(&layer.bounds());
            if new_region == old_region {
                continue;
            }

            let mut grown = layer.read_region(new_region);
            // The live layer is already mid-stroke inside the old rectangle;
            // the original pre-state must win there. An empty old rectangle
            // (initial bounds fully off-surface) has nothing to carry over
            // and no valid offset into the grown buffer.
            if !old_region.is_empty() {
                grown.write_region(
                    old_before,
                    old_region.x - new_region.x,
                    old_region.y - new_region.y,
                );
            }
            *old_before = grown;
            descriptor.bounds = Some(new_region);
        }
    }

    /// Open the structural bracket: record layer topology before the action
    /// reorders, adds, or removes layers. Idempotent within one session.
    pub fn begin_structural(&mut self, repo: &dyn LayerRepository) {
        if self.structural_before.is_none() {
            self.structural_before = Some(StructuralSnapshot::capture(repo));
        }
    }

    /// Persist the full content of a layer about to be deleted.
    ///
    /// Requires an open structural bracket; after the layer is gone there
    /// is nothing left to copy.
    pub fn store_deleted_layer(&mut self, layer: &Layer) {
        match &mut self.structural_before {
            Some(snapshot) => snapshot.store_deleted_layer(layer),
            None => {
                debug!(
                    layer = layer.id().raw(),
                    "deleted layer stored without a structural bracket; ignoring"
                );
            }
        }
    }

    /// Close the session: diff every capture against the live repository
    /// and build the history entry.
    ///
    /// Returns `None` when nothing changed at all (no differing pixels, no
    /// structural change) — such an action must not enter the ledger.
    #[must_use]
    pub fn commit(self, repo: &dyn LayerRepository) -> Option<HistoryEntry> {
        let mut patches: SmallVec<[RasterPatch; 2]> = SmallVec::new();

        for (id, descriptor) in self.layers {
            let Some(layer) = repo.layer(id) else {
                debug!(layer = id.raw(), "captured layer vanished before commit");
                continue;
            };
            let (region, before) = match descriptor.strategy {
                CaptureStrategy::Eager { before } => match descriptor.bounds {
                    Some(region) => (region, before),
                    None => continue,
                },
                CaptureStrategy::Deferred { surface } => {
                    let region = surface.bounds().intersection(&layer.bounds());
                    (region, surface.extract(region))
                }
            };
            if region.is_empty() {
                continue;
            }
            let after = layer.read_region(region);
            let Some(tight) = differ::diff(&before, &after, region) else {
                continue;
            };

            // Cut both buffers down to the tight rectangle, in capture-local
            // coordinates.
            let local = PixelRegion::new(
                tight.x - region.x,
                tight.y - region.y,
                tight.width,
                tight.height,
            );
            patches.push(RasterPatch::new(
                id,
                tight,
                before.read_region(local),
                after.read_region(local),
            ));
        }

        let structural = self.structural_before.and_then(|before| {
            let mut after = StructuralSnapshot::capture(repo);
            // A bracket that closed on unchanged topology carries nothing to
            // undo; dropping it here lets a pure no-op action fall through
            // to the empty-entry discard below.
            if before.same_topology(&after) {
                return None;
            }
            // Layers added during the action need their payload in the
            // after-snapshot: undo removes them, and redo has nowhere else
            // to rebuild them from.
            let added: Vec<LayerId> = after
                .layer_order()
                .iter()
                .copied()
                .filter(|&id| !before.contains(id))
                .collect();
            for id in added {
                if let Some(layer) = repo.layer(id) {
                    after.store_deleted_layer(layer);
                }
            }
            Some(StructuralChange { before, after })
        });

        let entry = HistoryEntry::new(self.label, patches, structural);
        if entry.is_empty() {
            None
        } else {
            Some(entry)
        }
    }
}
