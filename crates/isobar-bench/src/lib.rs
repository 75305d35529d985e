//! Benchmark grids for Isobar derived coordinates.
//!
//! - [`hybrid_grid`]: a hybrid-pressure grid of `(level, y, x)` with
//!   deterministic values, optionally bounded
//! - [`reference_grid`]: 50 levels over 180 x 360 (~3.2M output points)

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::sync::Arc;

use isobar_core::{AuxCoord, CoordError, Coordinate, Dims, Unit};
use isobar_factory::{FactoryError, HybridPressureFactory};
use ndarray::{Array1, Array2};
use smallvec::smallvec;

/// A hybrid-pressure factory together with the grid it lives on.
pub struct HybridGrid {
    /// Factory over all three dependencies.
    pub factory: HybridPressureFactory,
    /// Level pressure offsets on dimension 0.
    pub delta: Arc<dyn Coordinate>,
    /// Level coefficients on dimension 0.
    pub sigma: Arc<dyn Coordinate>,
    /// Surface pressure on dimensions 1 and 2.
    pub surface_air_pressure: Arc<dyn Coordinate>,
}

impl HybridGrid {
    /// Grid dimensions of one of this grid's dependencies, by name.
    pub fn dims_of(&self, coord: &dyn Coordinate) -> Option<Dims> {
        match coord.name() {
            "level_pressure" | "sigma" => Some(smallvec![0]),
            "surface_air_pressure" => Some(smallvec![1, 2]),
            _ => None,
        }
    }
}

/// Build a `(levels, ny, nx)` hybrid-pressure grid.
///
/// Levels run from the surface (`sigma = 1`) to the model top
/// (`sigma = 0`); surface pressure varies smoothly around 1000 hPa in Pa.
/// With `bounded`, delta and sigma carry guessed cell bounds.
pub fn hybrid_grid(
    levels: usize,
    ny: usize,
    nx: usize,
    bounded: bool,
) -> Result<HybridGrid, FactoryError> {
    let step = 1.0 / levels.max(2).saturating_sub(1) as f64;
    let sigma_pts = Array1::from_shape_fn(levels, |k| 1.0 - k as f64 * step);
    let delta_pts = sigma_pts.mapv(|s| 5000.0 * s * (1.0 - s));
    let surface_pts = Array2::from_shape_fn((ny, nx), |(j, i)| {
        100_000.0 + 500.0 * ((j as f64) * 0.1).sin() * ((i as f64) * 0.05).cos()
    });

    let mut delta = AuxCoord::builder(delta_pts)
        .long_name("level_pressure")
        .units(Unit::pascal())
        .build()?;
    let mut sigma = AuxCoord::builder(sigma_pts).long_name("sigma").build()?;
    if bounded {
        guess(&mut delta, 0.5)?;
        guess(&mut sigma, 0.5)?;
    }
    let surface = AuxCoord::builder(surface_pts)
        .standard_name("surface_air_pressure")
        .units(Unit::pascal())
        .build()?;

    let delta: Arc<dyn Coordinate> = Arc::new(delta);
    let sigma: Arc<dyn Coordinate> = Arc::new(sigma);
    let surface: Arc<dyn Coordinate> = Arc::new(surface);
    let factory = HybridPressureFactory::builder()
        .delta(delta.clone())
        .sigma(sigma.clone())
        .surface_air_pressure(surface.clone())
        .build()?;

    Ok(HybridGrid {
        factory,
        delta,
        sigma,
        surface_air_pressure: surface,
    })
}

fn guess(coord: &mut AuxCoord, position: f64) -> Result<(), CoordError> {
    if coord.has_bounds() || coord.points().len() < 2 {
        return Ok(());
    }
    coord.guess_bounds(position)
}

/// 50 levels over a 1-degree global grid.
pub fn reference_grid(bounded: bool) -> Result<HybridGrid, FactoryError> {
    hybrid_grid(50, 180, 360, bounded)
}
