#![forbid(unsafe_code)]
//! map_viewport: Scrollable, zoomable viewport over an unbounded grid of recyclable map fragments.
//!
//! Modules:
//! - fragment: the pool/fragment/classifier contract implemented by content providers
//! - grid: the rectangular window of live fragments and its edge operations
//! - transform: pan/zoom math shared by drawing and hit-testing
//! - viewport: the thread-safe context that resizes, slides and draws the grid
//! - render: draw target contract and per-frame summary
//!
//! For examples, see the `map_viewport_examples` crate.
pub mod config;
pub mod error;
pub mod fragment;
pub mod grid;
pub mod render;
pub mod transform;
pub mod viewport;

#[cfg(test)]
mod test_support;

/// Convenient re-exports for common types. Import with `use map_viewport::prelude::*;`.
pub mod prelude {
    pub use crate::config::ViewportConfig;
    pub use crate::error::{Error, Result};
    pub use crate::fragment::{
        fragment_index, fragment_origin_containing, fragment_size, Classifier, Fragment,
        FragmentPool, LayerId, MapObject, DEFAULT_FRAGMENT_SHIFT, UNKNOWN_CLASSIFICATION,
    };
    pub use crate::grid::{Axis, Edge, TileGrid};
    pub use crate::render::{FrameSummary, FrameTarget, LayerPass};
    pub use crate::transform::{scaled_pan, tile_pixel_size, Camera, Projection};
    pub use crate::viewport::Viewport;
}
