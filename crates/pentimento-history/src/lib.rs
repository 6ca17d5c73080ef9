#![forbid(unsafe_code)]

//! Region-based undo/redo for layered pixel editing.
//!
//! The engine records user actions as before/after patches over the minimal
//! changed rectangle instead of whole-document snapshots, so memory cost
//! scales with the edit, not the canvas. An action lives as a
//! [`CaptureSession`] while in flight and as a [`HistoryEntry`] once
//! committed to the [`HistoryLedger`]'s bounded stacks.
//!
//! The engine owns no document: the host implements
//! [`LayerRepository`](pentimento_raster::LayerRepository) over its own
//! layer storage and passes it into every operation that touches layers.
//!
//! ```
//! use pentimento_history::{HistoryConfig, HistoryLedger};
//! use pentimento_raster::{Layer, LayerId, LayerRepository, MemoryDocument, PixelRegion};
//!
//! let mut doc = MemoryDocument::new();
//! doc.push_layer(Layer::raster(LayerId::new(0), 64, 64));
//! let mut history = HistoryLedger::detached(HistoryConfig::default());
//!
//! history.begin_capture(&doc, "Brush Stroke", &[LayerId::new(0)], Some(PixelRegion::new(10, 10, 20, 20)));
//! doc.layer_mut(LayerId::new(0)).unwrap().pixels_mut().set_pixel(15, 15, [255, 0, 0, 255]);
//! history.commit_capture(&doc);
//!
//! assert!(history.undo(&mut doc));
//! assert_eq!(doc.layer(LayerId::new(0)).unwrap().pixels().pixel(15, 15), Some([0, 0, 0, 0]));
//! ```

pub mod differ;
pub mod eviction;
pub mod events;
pub mod ledger;
pub mod patch;
pub mod session;
pub mod structural;

pub use events::{EventSink, HistoryEvent, HistoryStatus, NullRenderer, NullSink, Renderer};
pub use eviction::{BudgetedDeque, ByteCost};
pub use ledger::{HistoryConfig, HistoryLedger};
pub use patch::{HistoryEntry, RasterPatch};
pub use session::CaptureSession;
pub use structural::{LayerRecord, StructuralChange, StructuralSnapshot};
