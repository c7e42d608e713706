//! Viewport configuration.
use glam::UVec2;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::fragment::{fragment_size, DEFAULT_FRAGMENT_SHIFT};
use crate::transform::tile_pixel_size;

/// Largest supported fragment size shift (fragments of 65536 world units).
pub const MAX_FRAGMENT_SHIFT: u32 = 16;

/// Initial state for a [`crate::viewport::Viewport`].
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ViewportConfig {
    /// Screen size in pixels.
    pub screen_size: UVec2,
    /// Screen pixels per world unit.
    pub zoom: f32,
    /// Fragments span `1 << fragment_shift` world units.
    pub fragment_shift: u32,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            screen_size: UVec2::ONE,
            zoom: 0.25,
            fragment_shift: DEFAULT_FRAGMENT_SHIFT,
        }
    }
}

impl ViewportConfig {
    /// Creates a new [`ViewportConfig`] for a screen of the given size.
    pub fn new(screen_size: UVec2) -> Self {
        Self {
            screen_size,
            ..Default::default()
        }
    }

    /// Sets the initial zoom factor.
    pub fn with_zoom(mut self, zoom: f32) -> Self {
        self.zoom = zoom;
        self
    }

    /// Sets the fragment size as a power of two.
    pub fn with_fragment_shift(mut self, fragment_shift: u32) -> Self {
        self.fragment_shift = fragment_shift;
        self
    }

    /// Side length of a fragment in world units.
    pub fn fragment_size(&self) -> i32 {
        fragment_size(self.fragment_shift)
    }

    /// Validates the configuration, returning an error if invalid.
    pub fn validate(&self) -> Result<()> {
        if self.fragment_shift == 0 || self.fragment_shift > MAX_FRAGMENT_SHIFT {
            return Err(Error::InvalidConfig(format!(
                "fragment_shift must be in 1..={MAX_FRAGMENT_SHIFT}"
            )));
        }
        tile_pixel_size(self.fragment_size(), self.zoom)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_single_pixel_screen() {
        let config = ViewportConfig::default();
        assert_eq!(config.screen_size, UVec2::ONE);
        assert_eq!(config.fragment_size(), 512);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn builder_sets_fields() {
        let config = ViewportConfig::new(UVec2::new(600, 400))
            .with_zoom(1.0)
            .with_fragment_shift(8);
        assert_eq!(config.screen_size, UVec2::new(600, 400));
        assert_eq!(config.zoom, 1.0);
        assert_eq!(config.fragment_size(), 256);
    }

    #[test]
    fn rejects_out_of_range_shift() {
        for shift in [0, MAX_FRAGMENT_SHIFT + 1] {
            let config = ViewportConfig::default().with_fragment_shift(shift);
            assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
        }
    }

    #[test]
    fn rejects_zoom_below_one_pixel_per_fragment() {
        let config = ViewportConfig::default()
            .with_fragment_shift(8)
            .with_zoom(1.0 / 512.0);
        assert!(matches!(
            config.validate(),
            Err(Error::InvalidZoom { .. })
        ));
    }
}
