#![forbid(unsafe_code)]

//! Raster kernel for the pentimento undo/redo engine.
//!
//! This crate holds the data model the history engine operates on:
//!
//! - [`geometry::PixelRegion`]: integer rectangles in layer-local coordinates.
//! - [`buffer::PixelBuffer`]: flat row-major RGBA8 surfaces with clamped
//!   region I/O.
//! - [`layer`]: the closed set of layer variants (raster, vector, text)
//!   sharing one capability surface, plus full-fat serialization for
//!   deleted-layer resurrection.
//! - [`repository::LayerRepository`]: the contract a host document implements
//!   so the engine can look up, reorder, insert, and remove layers.
//!
//! The crate is deliberately free of editor policy: no tools, no compositing,
//! no history. Those live in `pentimento-history` and in the host editor.

pub mod buffer;
pub mod geometry;
pub mod layer;
pub mod repository;

pub use buffer::PixelBuffer;
pub use geometry::PixelRegion;
pub use layer::{
    BlendMode, Layer, LayerCodecError, LayerContent, LayerId, LayerKind, LayerMeta,
    SerializedLayer, SurfaceCopy,
};
pub use repository::{LayerRepository, MemoryDocument};
