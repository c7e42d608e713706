//! Pan/zoom math for the viewport.
//!
//! [`Camera`] holds the continuous state: zoom factor, sub-fragment pan offset and
//! screen size. [`Projection`] is the per-frame snapshot used to place fragments
//! and their objects on screen; it is a plain value computed from the camera, so
//! rendering and hit-testing derive screen positions from the same function.
use glam::{Affine2, IVec2, UVec2, Vec2};

use crate::error::{Error, Result};
use crate::grid::Edge;

/// Screen size of one fragment in whole pixels: `floor(fragment_size * zoom)`.
///
/// Fails for non-finite or non-positive zoom factors and for zooms at which a
/// fragment would cover less than one pixel.
pub fn tile_pixel_size(fragment_size: i32, zoom: f32) -> Result<u32> {
    if !zoom.is_finite() || zoom <= 0.0 {
        return Err(Error::InvalidZoom { zoom });
    }
    let px = (fragment_size as f32 * zoom).floor();
    if px < 1.0 || px > u32::MAX as f32 {
        return Err(Error::InvalidZoom { zoom });
    }
    Ok(px as u32)
}

/// Fragment columns and rows needed to cover `screen` with one fragment of slack per axis.
pub fn required_tiles(screen: UVec2, tile_px: u32) -> UVec2 {
    debug_assert!(tile_px > 0, "tile_px must be > 0");
    screen / tile_px + UVec2::splat(2)
}

/// Direction the grid must shift along one axis to bring `pan` into `(-tile_px, 0]`.
///
/// `Leading` means a new row/column enters at the leading edge and the pan
/// offset decreases by one tile; `Trailing` is the opposite.
pub fn pan_shift(pan: f32, tile_px: f32) -> Option<Edge> {
    if pan > 0.0 {
        Some(Edge::Leading)
    } else if pan <= -tile_px {
        Some(Edge::Trailing)
    } else {
        None
    }
}

/// Pan offset delta that keeps `anchor` visually fixed across a zoom change.
///
/// Adding the result to the pan offset after switching from `old_zoom` to
/// `new_zoom` realizes "zoom toward point". Equal zooms yield a zero delta.
pub fn scaled_pan(pan: Vec2, old_zoom: f32, new_zoom: f32, anchor: Vec2) -> Vec2 {
    let base = anchor - pan;
    base - (base / old_zoom) * new_zoom
}

/// Continuous viewport state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    /// Screen pixels per world unit as requested by the caller.
    pub zoom: f32,
    /// Screen position of the first fragment's top-left corner.
    pub pan: Vec2,
    /// Screen size in pixels.
    pub screen: UVec2,
}

impl Camera {
    pub fn new(zoom: f32, screen: UVec2) -> Self {
        Self {
            zoom,
            pan: Vec2::ZERO,
            screen,
        }
    }

    /// Snapshot of the current placement of fragments on screen.
    pub fn projection(&self, fragment_size: i32) -> Result<Projection> {
        let tile_px = tile_pixel_size(fragment_size, self.zoom)?;
        Ok(Projection::new(self.pan, tile_px, fragment_size))
    }

    /// Pan offset that puts `local` (an offset inside the first fragment) at the
    /// centre of the screen.
    pub fn centered_pan(&self, local: IVec2, fragment_size: i32) -> Result<Vec2> {
        let projection = self.projection(fragment_size)?;
        let center = (self.screen / 2).as_vec2();
        Ok(center - local.as_vec2() * projection.scale)
    }
}

/// Per-frame mapping from grid cells and world positions to screen space.
///
/// Fragments are laid out `tile_px` pixels apart and drawn with `scale =
/// tile_px / fragment_size`, so the cell step and the in-fragment scale agree
/// exactly and [`Projection::screen_to_world`] inverts [`Projection::world_to_screen`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projection {
    pub pan: Vec2,
    pub tile_px: f32,
    pub scale: f32,
}

impl Projection {
    pub fn new(pan: Vec2, tile_px: u32, fragment_size: i32) -> Self {
        let tile_px = tile_px as f32;
        Self {
            pan,
            tile_px,
            scale: tile_px / fragment_size as f32,
        }
    }

    /// Screen position of the top-left corner of the fragment at `cell`.
    #[inline]
    pub fn cell_origin(&self, cell: UVec2) -> Vec2 {
        self.pan + cell.as_vec2() * self.tile_px
    }

    /// Transform from fragment-local world units to screen pixels for `cell`.
    pub fn cell_transform(&self, cell: UVec2) -> Affine2 {
        Affine2::from_scale_angle_translation(
            Vec2::splat(self.scale),
            0.0,
            self.cell_origin(cell),
        )
    }

    /// Screen position of a fragment-local offset inside the fragment at `cell`.
    #[inline]
    pub fn local_to_screen(&self, cell: UVec2, local: IVec2) -> Vec2 {
        self.cell_origin(cell) + local.as_vec2() * self.scale
    }

    /// Screen position of `world`, given the origin of the first loaded fragment.
    pub fn world_to_screen(&self, world: Vec2, first_origin: IVec2) -> Vec2 {
        self.pan + (world - first_origin.as_vec2()) * self.scale
    }

    /// World position under `screen`, given the origin of the first loaded fragment.
    pub fn screen_to_world(&self, screen: Vec2, first_origin: IVec2) -> Vec2 {
        (screen - self.pan) / self.scale + first_origin.as_vec2()
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn tile_pixel_size_floors() {
        assert_eq!(tile_pixel_size(512, 0.25), Ok(128));
        assert_eq!(tile_pixel_size(256, 0.3), Ok(76));
        assert_eq!(tile_pixel_size(256, 1.0), Ok(256));
    }

    #[test]
    fn tile_pixel_size_rejects_degenerate_zoom() {
        for zoom in [0.0, -1.0, f32::NAN, f32::INFINITY, 0.001] {
            assert!(tile_pixel_size(256, zoom).is_err(), "zoom {zoom} accepted");
        }
    }

    #[test]
    fn required_tiles_adds_two_of_slack() {
        assert_eq!(
            required_tiles(UVec2::new(600, 400), 256),
            UVec2::new(4, 3)
        );
        assert_eq!(required_tiles(UVec2::new(0, 0), 64), UVec2::new(2, 2));
    }

    #[test]
    fn pan_shift_targets_half_open_range() {
        assert_eq!(pan_shift(0.0, 128.0), None);
        assert_eq!(pan_shift(-127.5, 128.0), None);
        assert_eq!(pan_shift(0.5, 128.0), Some(Edge::Leading));
        assert_eq!(pan_shift(-128.0, 128.0), Some(Edge::Trailing));
    }

    #[test]
    fn scaled_pan_keeps_anchor_world_point() {
        let pan = Vec2::new(-40.0, -10.0);
        let anchor = Vec2::new(300.0, 200.0);
        let (old_zoom, new_zoom) = (1.0, 2.0);
        let world_before = (anchor - pan) / old_zoom;

        let new_pan = pan + scaled_pan(pan, old_zoom, new_zoom, anchor);
        let world_after = (anchor - new_pan) / new_zoom;
        assert!((world_before - world_after).length() < 1e-3);
    }

    #[test]
    fn centered_pan_uses_integer_half_screen() {
        let camera = Camera::new(1.0, UVec2::new(601, 401));
        let pan = camera.centered_pan(IVec2::new(232, 232), 256).unwrap();
        assert_eq!(pan, Vec2::new(300.0 - 232.0, 200.0 - 232.0));
    }

    #[test]
    fn cell_transform_matches_local_to_screen() {
        let projection = Projection::new(Vec2::new(-30.0, -5.0), 76, 256);
        let cell = UVec2::new(2, 1);
        let local = IVec2::new(100, 40);
        let via_affine = projection
            .cell_transform(cell)
            .transform_point2(local.as_vec2());
        let direct = projection.local_to_screen(cell, local);
        assert!((via_affine - direct).length() < 1e-3);
    }

    proptest! {
        #[test]
        fn equal_zoom_scaled_pan_is_zero(
            zoom in 0.01f32..16.0,
            px in -2000.0f32..2000.0,
            py in -2000.0f32..2000.0,
            pan_x in -500.0f32..0.0,
        ) {
            let delta = scaled_pan(Vec2::new(pan_x, 0.0), zoom, zoom, Vec2::new(px, py));
            prop_assert!(delta.length() < 1e-2, "delta {:?}", delta);
        }

        #[test]
        fn screen_to_world_inverts_world_to_screen(
            zoom in 0.05f32..8.0,
            wx in -4096.0f32..4096.0,
            wy in -4096.0f32..4096.0,
        ) {
            let tile_px = tile_pixel_size(256, zoom).unwrap();
            let projection = Projection::new(Vec2::new(-17.0, -3.0), tile_px, 256);
            let first = IVec2::new(-512, 256);
            let world = Vec2::new(wx, wy);
            let screen = projection.world_to_screen(world, first);
            let back = projection.screen_to_world(screen, first);
            prop_assert!((back - world).length() < 0.05, "{:?} -> {:?}", world, back);
        }
    }
}
