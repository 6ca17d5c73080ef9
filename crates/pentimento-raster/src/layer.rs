#![forbid(unsafe_code)]

//! The layer model: a closed set of tagged variants behind one capability
//! surface.
//!
//! Raster layers own their pixels outright. Vector and text layers are
//! rendered by external engines; here they carry their source payload
//! opaquely plus a rasterized backing so the history engine can treat every
//! layer uniformly (pixel-region reads and writes, whole-surface copies,
//! full serialization). The variant set is deliberately explicit and
//! exhaustive — adding a layer kind means touching every `match`.

use std::fmt;

use crate::buffer::PixelBuffer;
use crate::geometry::PixelRegion;

/// Unique identifier for a layer within one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LayerId(pub u32);

impl LayerId {
    /// Create a new layer ID from a raw value.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// Compositing blend mode, matching the canvas `globalCompositeOperation`
/// vocabulary the editor exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BlendMode {
    #[default]
    Normal,
    Multiply,
    Screen,
    Overlay,
    Darken,
    Lighten,
    ColorDodge,
    ColorBurn,
    HardLight,
    SoftLight,
    Difference,
    Exclusion,
}

impl BlendMode {
    /// The interop name used by the editor frontend (kebab-case).
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Multiply => "multiply",
            Self::Screen => "screen",
            Self::Overlay => "overlay",
            Self::Darken => "darken",
            Self::Lighten => "lighten",
            Self::ColorDodge => "color-dodge",
            Self::ColorBurn => "color-burn",
            Self::HardLight => "hard-light",
            Self::SoftLight => "soft-light",
            Self::Difference => "difference",
            Self::Exclusion => "exclusion",
        }
    }

    /// Parse an interop name. Returns `None` for unknown names.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "normal" => Self::Normal,
            "multiply" => Self::Multiply,
            "screen" => Self::Screen,
            "overlay" => Self::Overlay,
            "darken" => Self::Darken,
            "lighten" => Self::Lighten,
            "color-dodge" => Self::ColorDodge,
            "color-burn" => Self::ColorBurn,
            "hard-light" => Self::HardLight,
            "soft-light" => Self::SoftLight,
            "difference" => Self::Difference,
            "exclusion" => Self::Exclusion,
            _ => return None,
        })
    }
}

/// Mutable per-layer metadata.
///
/// Everything here can change without touching pixel content, so structural
/// snapshots record it per layer and reapply it in place on restore.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LayerMeta {
    /// Display name.
    pub name: String,
    /// Position of the layer's top-left corner in document space.
    pub offset: (i32, i32),
    /// Opacity in `0.0..=1.0`.
    pub opacity: f32,
    /// Compositing mode.
    pub blend_mode: BlendMode,
    /// Whether the compositor draws the layer.
    pub visible: bool,
    /// Whether tools may edit the layer.
    pub locked: bool,
}

impl Default for LayerMeta {
    fn default() -> Self {
        Self {
            name: String::new(),
            offset: (0, 0),
            opacity: 1.0,
            blend_mode: BlendMode::Normal,
            visible: true,
            locked: false,
        }
    }
}

impl LayerMeta {
    /// Create metadata with the given display name and defaults otherwise.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Approximate heap size for memory accounting.
    #[must_use]
    pub fn byte_cost(&self) -> usize {
        std::mem::size_of::<Self>() + self.name.len()
    }
}

/// Layer kind discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LayerKind {
    Raster,
    Vector,
    Text,
}

/// Kind-specific payload.
///
/// Vector and text sources are opaque to this crate; their renderers live in
/// the host editor and keep the rasterized backing in sync.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LayerContent {
    Raster,
    Vector { source: Vec<u8> },
    Text { source: String },
}

impl LayerContent {
    /// The kind discriminant for this payload.
    #[must_use]
    pub const fn kind(&self) -> LayerKind {
        match self {
            Self::Raster => LayerKind::Raster,
            Self::Vector { .. } => LayerKind::Vector,
            Self::Text { .. } => LayerKind::Text,
        }
    }

    /// Approximate heap size for memory accounting.
    #[must_use]
    pub fn byte_cost(&self) -> usize {
        match self {
            Self::Raster => 0,
            Self::Vector { source } => source.len(),
            Self::Text { source } => source.len(),
        }
    }
}

/// One document layer: identity, metadata, pixel backing, and kind payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    id: LayerId,
    meta: LayerMeta,
    pixels: PixelBuffer,
    content: LayerContent,
}

impl Layer {
    /// Create a raster layer with a transparent backing.
    #[must_use]
    pub fn raster(id: LayerId, width: u32, height: u32) -> Self {
        Self {
            id,
            meta: LayerMeta::default(),
            pixels: PixelBuffer::new(width, height),
            content: LayerContent::Raster,
        }
    }

    /// Create a vector layer from an opaque source payload.
    #[must_use]
    pub fn vector(id: LayerId, width: u32, height: u32, source: Vec<u8>) -> Self {
        Self {
            id,
            meta: LayerMeta::default(),
            pixels: PixelBuffer::new(width, height),
            content: LayerContent::Vector { source },
        }
    }

    /// Create a text layer from its source string.
    #[must_use]
    pub fn text(id: LayerId, width: u32, height: u32, source: String) -> Self {
        Self {
            id,
            meta: LayerMeta::default(),
            pixels: PixelBuffer::new(width, height),
            content: LayerContent::Text { source },
        }
    }

    /// Replace the metadata (builder style).
    #[must_use]
    pub fn with_meta(mut self, meta: LayerMeta) -> Self {
        self.meta = meta;
        self
    }

    /// The layer's identifier.
    #[inline]
    pub const fn id(&self) -> LayerId {
        self.id
    }

    /// The layer's kind discriminant.
    #[inline]
    pub const fn kind(&self) -> LayerKind {
        self.content.kind()
    }

    /// Shared metadata access.
    #[inline]
    pub const fn meta(&self) -> &LayerMeta {
        &self.meta
    }

    /// Mutable metadata access.
    #[inline]
    pub fn meta_mut(&mut self) -> &mut LayerMeta {
        &mut self.meta
    }

    /// Backing width in pixels.
    #[inline]
    pub const fn width(&self) -> u32 {
        self.pixels.width()
    }

    /// Backing height in pixels.
    #[inline]
    pub const fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// The full backing surface as a region.
    #[inline]
    pub const fn bounds(&self) -> PixelRegion {
        self.pixels.bounds()
    }

    /// Shared access to the pixel backing.
    #[inline]
    pub const fn pixels(&self) -> &PixelBuffer {
        &self.pixels
    }

    /// Mutable access to the pixel backing.
    #[inline]
    pub fn pixels_mut(&mut self) -> &mut PixelBuffer {
        &mut self.pixels
    }

    /// Read a pixel region from the backing (clamped).
    pub fn read_region(&self, region: PixelRegion) -> PixelBuffer {
        self.pixels.read_region(region)
    }

    /// Write a pixel buffer into the backing at `(x, y)` (clipped).
    pub fn write_region(&mut self, src: &PixelBuffer, x: u32, y: u32) {
        self.pixels.write_region(src, x, y);
    }

    /// Take a whole-surface copy for deferred capture.
    ///
    /// In this in-memory model the copy is a clone of the backing store;
    /// the "before" buffer is materialized from it at commit time.
    #[must_use]
    pub fn surface_copy(&self) -> SurfaceCopy {
        SurfaceCopy {
            pixels: self.pixels.clone(),
        }
    }

    /// Serialize the full layer, pixel content included.
    ///
    /// Only used for layers about to disappear (or newly added ones whose
    /// redo needs resurrecting); surviving layers are reconciled from the
    /// live repository instead.
    #[must_use]
    pub fn serialize(&self) -> SerializedLayer {
        SerializedLayer {
            id: self.id,
            meta: self.meta.clone(),
            width: self.width(),
            height: self.height(),
            pixels: self.pixels.as_bytes().to_vec(),
            content: self.content.clone(),
        }
    }

    /// Rebuild a layer from its serialized form.
    pub fn deserialize(form: SerializedLayer) -> Result<Self, LayerCodecError> {
        let expected = form.width as usize * form.height as usize * 4;
        if form.pixels.len() != expected {
            return Err(LayerCodecError::PayloadSize {
                expected,
                actual: form.pixels.len(),
            });
        }
        // Length was just validated, so from_raw cannot fail.
        let pixels = PixelBuffer::from_raw(form.width, form.height, form.pixels)
            .ok_or(LayerCodecError::PayloadSize {
                expected,
                actual: 0,
            })?;
        Ok(Self {
            id: form.id,
            meta: form.meta,
            pixels,
            content: form.content,
        })
    }
}

/// Opaque whole-surface copy taken at capture-open time.
///
/// Holds the layer's pixels as they were when the session opened; the
/// session extracts the final "before" region from it at commit and then
/// drops it.
#[derive(Debug, Clone)]
pub struct SurfaceCopy {
    pixels: PixelBuffer,
}

impl SurfaceCopy {
    /// Dimensions of the copied surface.
    #[inline]
    pub const fn bounds(&self) -> PixelRegion {
        self.pixels.bounds()
    }

    /// Materialize a region of the copied surface (clamped).
    pub fn extract(&self, region: PixelRegion) -> PixelBuffer {
        self.pixels.read_region(region)
    }

    /// Size of the copied surface in bytes.
    #[inline]
    pub fn byte_len(&self) -> usize {
        self.pixels.byte_len()
    }
}

/// Full serialized form of a layer, raster content embedded.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SerializedLayer {
    pub id: LayerId,
    pub meta: LayerMeta,
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
    pub content: LayerContent,
}

impl SerializedLayer {
    /// Approximate size for memory accounting.
    #[must_use]
    pub fn byte_cost(&self) -> usize {
        self.pixels.len() + self.meta.byte_cost() + self.content.byte_cost()
    }
}

/// Errors from rebuilding a layer out of its serialized form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayerCodecError {
    /// Pixel payload length does not match the recorded dimensions.
    PayloadSize { expected: usize, actual: usize },
}

impl fmt::Display for LayerCodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PayloadSize { expected, actual } => {
                write!(
                    f,
                    "pixel payload is {} bytes, expected {} for recorded dimensions",
                    actual, expected
                )
            }
        }
    }
}

impl std::error::Error for LayerCodecError {}
