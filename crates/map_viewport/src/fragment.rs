//! Fragment contract between the viewport and the content provider.
//!
//! A fragment is one square tile of the world, `1 << shift` world units on a side,
//! whose origin is always a multiple of that size. The viewport never creates
//! fragment content itself:
//! - [`FragmentPool`] hands out fragments bound to a world origin and takes them back.
//! - [`Fragment`] exposes the origin and the point features the viewport hit-tests.
//! - [`Classifier`] names the terrain under a fragment-local offset.
use glam::IVec2;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default fragment size shift: fragments span 512 world units.
pub const DEFAULT_FRAGMENT_SHIFT: u32 = 9;

/// Returned by classification queries when no loaded fragment contains the point.
pub const UNKNOWN_CLASSIFICATION: &str = "Unknown";

/// Identifier of the layer that owns a [`MapObject`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LayerId(pub u16);

/// Point feature stored inside a fragment.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MapObject {
    /// Layer controlling the visibility of this object.
    pub layer: LayerId,
    /// Position relative to the owning fragment's origin, in world units.
    pub position: IVec2,
    /// Display label.
    pub label: String,
}

impl MapObject {
    pub fn new(layer: LayerId, position: IVec2, label: impl Into<String>) -> Self {
        Self {
            layer,
            position,
            label: label.into(),
        }
    }
}

/// A grid node as seen by the viewport.
pub trait Fragment {
    /// World-space origin (top-left corner). Always a multiple of the fragment size.
    fn origin(&self) -> IVec2;

    /// Point features currently loaded for this fragment.
    fn objects(&self) -> &[MapObject];
}

/// Allocates, reclaims and regenerates fragment content.
///
/// The viewport owns a fragment from [`FragmentPool::allocate`] until it hands it
/// back through [`FragmentPool::reclaim`], after it has been removed from the grid.
pub trait FragmentPool {
    type Fragment: Fragment;

    /// Returns a fragment bound to `origin`. Content may be populated lazily.
    fn allocate(&mut self, origin: IVec2) -> Self::Fragment;

    /// Takes back a fragment that is no longer part of the grid.
    fn reclaim(&mut self, fragment: Self::Fragment);

    /// Regenerates stale raster caches. Called once per frame, between the image
    /// layer pass and the live layer pass, with every live fragment.
    fn refresh_all(
        &mut self,
        fragments: &mut dyn Iterator<Item = &mut Self::Fragment>,
        time: f32,
    );

    /// Forces all content of `fragment` to be regenerated.
    fn refresh_fragment(&mut self, fragment: &mut Self::Fragment);

    /// Forces a single layer of `fragment` to be regenerated.
    fn refresh_fragment_layer(&mut self, fragment: &mut Self::Fragment, _layer: LayerId) {
        self.refresh_fragment(fragment);
    }
}

/// Names the terrain category at a fragment-local offset.
pub trait Classifier<F> {
    fn name_at(&self, fragment: &F, local: IVec2) -> String;

    /// Short alias of the category. Defaults to [`Classifier::name_at`].
    fn alias_at(&self, fragment: &F, local: IVec2) -> String {
        self.name_at(fragment, local)
    }
}

/// Side length of a fragment in world units.
#[inline]
pub fn fragment_size(shift: u32) -> i32 {
    1 << shift
}

/// Grid-index coordinate of the fragment containing `world`.
#[inline]
pub fn fragment_index(world: IVec2, shift: u32) -> IVec2 {
    IVec2::new(world.x >> shift, world.y >> shift)
}

/// Origin of the fragment containing `world`, flooring toward negative infinity.
#[inline]
pub fn fragment_origin_containing(world: IVec2, shift: u32) -> IVec2 {
    fragment_index(world, shift) * fragment_size(shift)
}
