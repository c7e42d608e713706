//! Error types and result alias for the crate.
//!
//! This module defines [`enum@crate::error::Error`] and the crate-wide [Result] alias. Variants cover
//! invalid configuration, rejected zoom factors and pan offsets, and structural
//! operations whose preconditions do not hold for the current grid. Spatial queries never return
//! errors; they report "not found" through `Option` or a sentinel string.
use glam::Vec2;
use thiserror::Error;

use crate::grid::Axis;

pub type Result<T> = std::result::Result<T, Error>;

#[non_exhaustive]
#[derive(Debug, Error, PartialEq)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid zoom factor {zoom}: scaled fragment must cover at least one pixel")]
    InvalidZoom { zoom: f32 },

    #[error("cannot shrink {axis}: grid already has a single {axis}")]
    GridUnderflow { axis: Axis },

    #[error("grid holds no fragments")]
    EmptyGrid,

    #[error("cannot extend the grid along {axis}: fragment origin outside the i32 world")]
    OutOfWorld { axis: Axis },

    #[error("invalid pan offset {pan}: components must be finite")]
    InvalidPan { pan: Vec2 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn underflow_message_names_axis() {
        let err = Error::GridUnderflow { axis: Axis::Column };
        assert_eq!(
            err.to_string(),
            "cannot shrink column: grid already has a single column"
        );
    }

    #[test]
    fn out_of_world_message_names_axis() {
        let err = Error::OutOfWorld { axis: Axis::Row };
        assert!(err.to_string().starts_with("cannot extend the grid along row"));
    }

    #[test]
    fn invalid_zoom_reports_value() {
        let err = Error::InvalidZoom { zoom: 0.0 };
        assert!(err.to_string().contains("invalid zoom factor 0"));
    }
}
