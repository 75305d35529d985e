//! A small hybrid-pressure grid: three model levels over a 2 x 2
//! horizontal grid, dimensions `(level, y, x)`.

use std::sync::Arc;

use isobar_core::{AuxCoord, Coordinate, Unit};
use ndarray::{array, Array};

use crate::DimTable;

/// Level pressure offsets `[0, 1, 2]` Pa on the level dimension.
pub fn level_pressure() -> AuxCoord {
    AuxCoord::builder(array![0.0, 1.0, 2.0])
        .long_name("level_pressure")
        .units(Unit::pascal())
        .build()
        .expect("valid level_pressure fixture")
}

/// Level coefficients `[1.0, 0.9, 0.8]` on the level dimension.
pub fn sigma() -> AuxCoord {
    AuxCoord::builder(array![1.0, 0.9, 0.8])
        .long_name("sigma")
        .units(Unit::dimensionless())
        .build()
        .expect("valid sigma fixture")
}

/// Surface pressure `[[0, 1], [2, 3]]` Pa on the horizontal dimensions.
pub fn surface_air_pressure() -> AuxCoord {
    let values = Array::range(0.0, 4.0, 1.0)
        .into_shape_with_order((2, 2))
        .expect("four values fill a 2 x 2 grid");
    AuxCoord::builder(values)
        .standard_name("surface_air_pressure")
        .units(Unit::pascal())
        .build()
        .expect("valid surface_air_pressure fixture")
}

/// [`level_pressure`] with bounds guessed with points on the lower edge.
pub fn bounded_level_pressure() -> AuxCoord {
    let mut c = level_pressure();
    c.guess_bounds(0.0).expect("level_pressure has two or more points");
    c
}

/// [`sigma`] with bounds guessed with points at cell centres.
pub fn bounded_sigma() -> AuxCoord {
    let mut c = sigma();
    c.guess_bounds(0.5).expect("sigma has two or more points");
    c
}

/// Dimension mapping for the fixture grid.
pub fn grid_dims() -> DimTable {
    DimTable::new()
        .with("level_pressure", &[0])
        .with("sigma", &[0])
        .with("surface_air_pressure", &[1, 2])
}

/// Erase a concrete coordinate into a shared dependency.
pub fn shared(coord: AuxCoord) -> Arc<dyn Coordinate> {
    Arc::new(coord)
}
