#![forbid(unsafe_code)]

//! The repository contract the history engine consumes, plus an in-memory
//! reference document.
//!
//! A host editor implements [`LayerRepository`] over its own document type;
//! [`MemoryDocument`] is the built-in implementation used by tests and by
//! embedders that have no document of their own. The engine never assumes
//! more than this trait: lookup by id, the ordered id list, the active
//! index, and insert/remove/move.

use crate::layer::{Layer, LayerId};

/// Ordered collection of layers with one active layer.
///
/// Implementations must keep ids unique. Indices are clamped, not rejected:
/// inserting past the end appends, and the active index is clamped to the
/// layer count whenever it is set.
pub trait LayerRepository {
    /// Look up a layer by id.
    fn layer(&self, id: LayerId) -> Option<&Layer>;

    /// Look up a layer by id, mutably.
    fn layer_mut(&mut self, id: LayerId) -> Option<&mut Layer>;

    /// The layer ids in stacking order (bottom first).
    fn layer_order(&self) -> Vec<LayerId>;

    /// Number of layers.
    fn layer_count(&self) -> usize;

    /// Index of the active layer (0 when the document is empty).
    fn active_index(&self) -> usize;

    /// Set the active layer index, clamped to the layer count.
    fn set_active_index(&mut self, index: usize);

    /// Insert a layer at `index` (clamped; past-the-end appends).
    fn insert_layer(&mut self, index: usize, layer: Layer);

    /// Remove a layer by id, returning it.
    fn remove_layer(&mut self, id: LayerId) -> Option<Layer>;

    /// Move a layer to `index` (clamped). Returns `false` if the id is
    /// unknown.
    fn move_layer(&mut self, id: LayerId, index: usize) -> bool;
}

/// In-memory reference document: a `Vec` of layers plus an active index.
#[derive(Debug, Default)]
pub struct MemoryDocument {
    layers: Vec<Layer>,
    active_index: usize,
}

impl MemoryDocument {
    /// Create an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a layer to the top of the stack.
    pub fn push_layer(&mut self, layer: Layer) {
        self.layers.push(layer);
    }

    fn position(&self, id: LayerId) -> Option<usize> {
        self.layers.iter().position(|l| l.id() == id)
    }

    fn clamp_active(&mut self) {
        let max = self.layers.len().saturating_sub(1);
        if self.active_index > max {
            self.active_index = max;
        }
    }
}

impl LayerRepository for MemoryDocument {
    fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.layers.iter().find(|l| l.id() == id)
    }

    fn layer_mut(&mut self, id: LayerId) -> Option<&mut Layer> {
        self.layers.iter_mut().find(|l| l.id() == id)
    }

    fn layer_order(&self) -> Vec<LayerId> {
        self.layers.iter().map(Layer::id).collect()
    }

    fn layer_count(&self) -> usize {
        self.layers.len()
    }

    fn active_index(&self) -> usize {
        self.active_index
    }

    fn set_active_index(&mut self, index: usize) {
        self.active_index = index;
        self.clamp_active();
    }

    fn insert_layer(&mut self, index: usize, layer: Layer) {
        let index = index.min(self.layers.len());
        self.layers.insert(index, layer);
    }

    fn remove_layer(&mut self, id: LayerId) -> Option<Layer> {
        let pos = self.position(id)?;
        let layer = self.layers.remove(pos);
        self.clamp_active();
        Some(layer)
    }

    fn move_layer(&mut self, id: LayerId, index: usize) -> bool {
        let Some(pos) = self.position(id) else {
            return false;
        };
        let layer = self.layers.remove(pos);
        let index = index.min(self.layers.len());
        self.layers.insert(index, layer);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc_with(n: u32) -> MemoryDocument {
        let mut doc = MemoryDocument::new();
        for i in 0..n {
            doc.push_layer(Layer::raster(LayerId::new(i), 4, 4));
        }
        doc
    }

    #[test]
    fn lookup_by_id() {
        let doc = doc_with(3);
        assert!(doc.layer(LayerId::new(1)).is_some());
        assert!(doc.layer(LayerId::new(9)).is_none());
        assert_eq!(doc.layer_count(), 3);
    }

    #[test]
    fn order_reflects_stacking() {
        let doc = doc_with(3);
        assert_eq!(
            doc.layer_order(),
            vec![LayerId::new(0), LayerId::new(1), LayerId::new(2)]
        );
    }

    #[test]
    fn insert_clamps_past_end() {
        let mut doc = doc_with(2);
        doc.insert_layer(99, Layer::raster(LayerId::new(5), 4, 4));
        assert_eq!(doc.layer_order().last(), Some(&LayerId::new(5)));
    }

    #[test]
    fn remove_adjusts_active_index() {
        let mut doc = doc_with(3);
        doc.set_active_index(2);
        doc.remove_layer(LayerId::new(2));
        assert_eq!(doc.active_index(), 1);
    }

    #[test]
    fn remove_unknown_is_none() {
        let mut doc = doc_with(1);
        assert!(doc.remove_layer(LayerId::new(9)).is_none());
        assert_eq!(doc.layer_count(), 1);
    }

    #[test]
    fn move_layer_reorders() {
        let mut doc = doc_with(3);
        assert!(doc.move_layer(LayerId::new(0), 2));
        assert_eq!(
            doc.layer_order(),
            vec![LayerId::new(1), LayerId::new(2), LayerId::new(0)]
        );
        assert!(!doc.move_layer(LayerId::new(9), 0));
    }

    #[test]
    fn active_index_clamps_on_set() {
        let mut doc = doc_with(2);
        doc.set_active_index(10);
        assert_eq!(doc.active_index(), 1);

        let mut empty = MemoryDocument::new();
        empty.set_active_index(5);
        assert_eq!(empty.active_index(), 0);
    }
}
