//! Draw target contract and per-frame summary.
use glam::{Affine2, UVec2, Vec2};

use crate::fragment::MapObject;

/// Raster pass a fragment is drawn in.
///
/// Image layers are drawn for the whole grid first, then the pool refreshes its
/// caches, then live layers are drawn. Object markers always come last.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LayerPass {
    /// Cached image layers.
    Image,
    /// Layers regenerated every frame.
    Live,
}

/// Graphics target receiving one frame of fragments and markers.
pub trait FrameTarget<F> {
    /// Draws one fragment. `transform` maps fragment-local world units to screen pixels.
    fn draw_fragment(&mut self, pass: LayerPass, fragment: &F, transform: Affine2, time: f32);

    /// Draws the marker of a visible object at its screen position.
    fn draw_marker(&mut self, object: &MapObject, position: Vec2);
}

/// What a completed [`crate::viewport::Viewport::draw`] produced.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSummary {
    /// Grid dimensions `(tile_width, tile_height)` after the frame.
    pub grid: UVec2,
    /// Screen size of one fragment in pixels.
    pub tile_px: u32,
    /// Normalized pan offset used for the frame.
    pub pan: Vec2,
    /// Fragment draw calls issued across both raster passes.
    pub fragments_drawn: usize,
    /// Object markers drawn.
    pub markers_drawn: usize,
}
