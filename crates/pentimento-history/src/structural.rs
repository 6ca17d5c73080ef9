#![forbid(unsafe_code)]

//! Structural (layer-topology) snapshots.
//!
//! A structural snapshot records layer order, the active index, and each
//! layer's mutable metadata — cost proportional to layer count, not pixel
//! count. Full pixel content enters only through [`store_deleted_layer`]
//! for layers that are about to disappear, because post-state can never
//! reconstruct them.
//!
//! Restore is two-path: surviving layers get their metadata reapplied in
//! place (their pixels are governed by the raster patches of the same
//! history entry), while deleted layers are resurrected wholesale from the
//! serialized payload. Duplicating surviving pixels here would double the
//! memory cost and risk divergence.
//!
//! [`store_deleted_layer`]: StructuralSnapshot::store_deleted_layer

use ahash::AHashMap;
use tracing::debug;

use pentimento_raster::{Layer, LayerId, LayerMeta, LayerRepository, SerializedLayer};

/// Per-layer metadata record inside a snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerRecord {
    /// The layer's identity.
    pub id: LayerId,
    /// Mutable metadata at snapshot time.
    pub meta: LayerMeta,
    /// Backing dimensions at snapshot time (informational; restore never
    /// resizes surviving layers).
    pub width: u32,
    pub height: u32,
}

/// Point-in-time record of layer topology.
#[derive(Debug, Clone)]
pub struct StructuralSnapshot {
    layer_order: Vec<LayerId>,
    active_index: usize,
    records: Vec<LayerRecord>,
    deleted: AHashMap<LayerId, SerializedLayer>,
}

impl StructuralSnapshot {
    /// Capture the current topology of `repo`. No pixel content is copied.
    #[must_use]
    pub fn capture(repo: &dyn LayerRepository) -> Self {
        let layer_order = repo.layer_order();
        let records = layer_order
            .iter()
            .filter_map(|&id| {
                repo.layer(id).map(|layer| LayerRecord {
                    id,
                    meta: layer.meta().clone(),
                    width: layer.width(),
                    height: layer.height(),
                })
            })
            .collect();
        Self {
            layer_order,
            active_index: repo.active_index(),
            records,
            deleted: AHashMap::new(),
        }
    }

    /// The recorded stacking order.
    #[must_use]
    pub fn layer_order(&self) -> &[LayerId] {
        &self.layer_order
    }

    /// The recorded active index.
    #[must_use]
    pub const fn active_index(&self) -> usize {
        self.active_index
    }

    /// Whether the snapshot recorded this layer as present.
    #[must_use]
    pub fn contains(&self, id: LayerId) -> bool {
        self.layer_order.contains(&id)
    }

    /// Whether two snapshots record the same order, active index, and
    /// per-layer metadata.
    ///
    /// Resurrection payloads are not compared: identical topology means the
    /// bracket closed without a structural change, whatever was stored along
    /// the way.
    #[must_use]
    pub fn same_topology(&self, other: &Self) -> bool {
        self.layer_order == other.layer_order
            && self.active_index == other.active_index
            && self.records == other.records
    }

    /// Persist a layer's full content, pixels included.
    ///
    /// Must be called before the layer leaves the repository; afterwards
    /// there is nothing left to serialize.
    pub fn store_deleted_layer(&mut self, layer: &Layer) {
        self.deleted.insert(layer.id(), layer.serialize());
    }

    /// Approximate memory held by this snapshot.
    #[must_use]
    pub fn byte_cost(&self) -> usize {
        let records: usize = self
            .records
            .iter()
            .map(|r| std::mem::size_of::<LayerRecord>() + r.meta.name.len())
            .sum();
        let deleted: usize = self.deleted.values().map(SerializedLayer::byte_cost).sum();
        records + deleted
    }

    /// Bring `repo` back to the recorded topology.
    ///
    /// Layers unknown to the snapshot are removed; surviving layers get
    /// their metadata reapplied and are moved to their recorded position;
    /// deleted layers are resurrected from their serialized payload. The
    /// active index is clamped to the restored count.
    pub fn restore(&self, repo: &mut dyn LayerRepository) {
        for id in repo.layer_order() {
            if !self.contains(id) {
                repo.remove_layer(id);
            }
        }

        for (position, record) in self.records.iter().enumerate() {
            if repo.layer(record.id).is_some() {
                if let Some(layer) = repo.layer_mut(record.id) {
                    *layer.meta_mut() = record.meta.clone();
                }
                repo.move_layer(record.id, position);
            } else if let Some(form) = self.deleted.get(&record.id) {
                match Layer::deserialize(form.clone()) {
                    Ok(layer) => repo.insert_layer(position, layer),
                    Err(err) => {
                        debug!(layer = record.id.raw(), %err, "skipping unrestorable layer");
                    }
                }
            } else {
                debug!(
                    layer = record.id.raw(),
                    "layer missing and no payload stored; skipping"
                );
            }
        }

        let count = repo.layer_count();
        let active = if count == 0 {
            0
        } else {
            self.active_index.min(count - 1)
        };
        repo.set_active_index(active);
    }
}

/// Before/after snapshot pair closed out at commit time.
#[derive(Debug, Clone)]
pub struct StructuralChange {
    /// Topology when the structural bracket opened.
    pub before: StructuralSnapshot,
    /// Topology at commit.
    pub after: StructuralSnapshot,
}

impl StructuralChange {
    /// Approximate memory held by both snapshots.
    #[must_use]
    pub fn byte_cost(&self) -> usize {
        self.before.byte_cost() + self.after.byte_cost()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pentimento_raster::{BlendMode, MemoryDocument, PixelRegion};

    fn doc_with(n: u32) -> MemoryDocument {
        let mut doc = MemoryDocument::new();
        for i in 0..n {
            let layer =
                Layer::raster(LayerId::new(i), 4, 4).with_meta(LayerMeta::named(format!("L{i}")));
            doc.push_layer(layer);
        }
        doc
    }

    #[test]
    fn capture_records_topology_only() {
        let mut doc = doc_with(3);
        doc.set_active_index(1);
        let snap = StructuralSnapshot::capture(&doc);

        assert_eq!(snap.layer_order().len(), 3);
        assert_eq!(snap.active_index(), 1);
        assert!(snap.contains(LayerId::new(2)));
        assert!(!snap.contains(LayerId::new(9)));
        // No serialized pixels: cost stays in metadata territory.
        assert!(snap.byte_cost() < 1024);
    }

    #[test]
    fn restore_reapplies_metadata_in_place() {
        let mut doc = doc_with(2);
        let snap = StructuralSnapshot::capture(&doc);

        {
            let meta = doc.layer_mut(LayerId::new(0)).unwrap().meta_mut();
            meta.opacity = 0.25;
            meta.blend_mode = BlendMode::Screen;
            meta.visible = false;
        }

        snap.restore(&mut doc);
        let meta = doc.layer(LayerId::new(0)).unwrap().meta();
        assert_eq!(meta.opacity, 1.0);
        assert_eq!(meta.blend_mode, BlendMode::Normal);
        assert!(meta.visible);
    }

    #[test]
    fn restore_resurrects_deleted_layer_bit_identical() {
        let mut doc = doc_with(3);
        doc.layer_mut(LayerId::new(1))
            .unwrap()
            .pixels_mut()
            .fill(PixelRegion::new(1, 1, 2, 2), [5, 6, 7, 8]);
        let original = doc.layer(LayerId::new(1)).unwrap().clone();

        let mut snap = StructuralSnapshot::capture(&doc);
        snap.store_deleted_layer(doc.layer(LayerId::new(1)).unwrap());
        doc.remove_layer(LayerId::new(1));

        snap.restore(&mut doc);
        let restored = doc.layer(LayerId::new(1)).unwrap();
        assert_eq!(*restored, original);
        // Reinserted at its recorded position.
        assert_eq!(doc.layer_order()[1], LayerId::new(1));
    }

    #[test]
    fn restore_removes_layers_added_after_capture() {
        let mut doc = doc_with(2);
        let snap = StructuralSnapshot::capture(&doc);

        doc.push_layer(Layer::raster(LayerId::new(9), 4, 4));
        assert_eq!(doc.layer_count(), 3);

        snap.restore(&mut doc);
        assert_eq!(doc.layer_count(), 2);
        assert!(doc.layer(LayerId::new(9)).is_none());
    }

    #[test]
    fn restore_reorders_to_recorded_positions() {
        let mut doc = doc_with(3);
        let snap = StructuralSnapshot::capture(&doc);

        doc.move_layer(LayerId::new(0), 2);
        assert_ne!(doc.layer_order(), snap.layer_order());

        snap.restore(&mut doc);
        assert_eq!(doc.layer_order(), snap.layer_order());
    }

    #[test]
    fn restore_clamps_active_index() {
        let mut doc = doc_with(3);
        doc.set_active_index(2);
        let mut snap = StructuralSnapshot::capture(&doc);

        // Make layer 2 unrestorable by not storing a payload for it.
        doc.remove_layer(LayerId::new(2));
        snap.deleted.clear();

        snap.restore(&mut doc);
        assert_eq!(doc.layer_count(), 2);
        assert_eq!(doc.active_index(), 1);
    }

    #[test]
    fn restore_skips_corrupt_payload_and_restores_rest() {
        let mut doc = doc_with(3);
        let mut snap = StructuralSnapshot::capture(&doc);
        let mut form = doc.layer(LayerId::new(1)).unwrap().serialize();
        form.pixels.pop();
        snap.deleted.insert(LayerId::new(1), form);
        doc.remove_layer(LayerId::new(1));

        snap.restore(&mut doc);
        // The undecodable layer stays gone; everyone else is back in place.
        assert!(doc.layer(LayerId::new(1)).is_none());
        assert_eq!(doc.layer_count(), 2);
        assert_eq!(doc.layer_order(), vec![LayerId::new(0), LayerId::new(2)]);
    }

    #[test]
    fn same_topology_tracks_order_and_meta() {
        let mut doc = doc_with(2);
        let snap = StructuralSnapshot::capture(&doc);
        assert!(snap.same_topology(&StructuralSnapshot::capture(&doc)));

        doc.layer_mut(LayerId::new(0)).unwrap().meta_mut().locked = true;
        assert!(!snap.same_topology(&StructuralSnapshot::capture(&doc)));

        doc.layer_mut(LayerId::new(0)).unwrap().meta_mut().locked = false;
        doc.move_layer(LayerId::new(0), 1);
        assert!(!snap.same_topology(&StructuralSnapshot::capture(&doc)));
    }

    #[test]
    fn stored_payload_dominates_cost() {
        let mut doc = doc_with(1);
        let mut snap = StructuralSnapshot::capture(&doc);
        let lean = snap.byte_cost();
        snap.store_deleted_layer(doc.layer_mut(LayerId::new(0)).unwrap());
        assert!(snap.byte_cost() >= lean + 4 * 4 * 4);
    }
}
