//! Integration tests for the hybrid-pressure factory.
//!
//! Construction and update rules run against mock coordinates, which
//! carry only a unit and a bound count. Synthesis runs against the
//! fixture grid from `isobar_test_utils::fixtures`: three levels over a
//! 2 x 2 horizontal grid.

use std::sync::Arc;

use isobar_core::{AuxCoord, Coordinate, Unit};
use isobar_factory::{
    AuxCoordFactory, DependencyError, FactoryError, HybridPressureDeps, HybridPressureFactory,
    Role,
};
use isobar_test_utils::fixtures::{
    bounded_level_pressure, bounded_sigma, grid_dims, level_pressure, shared, sigma,
    surface_air_pressure,
};
use isobar_test_utils::{same_dependencies, DimTable, MockCoord};
use ndarray::{array, ArrayD};
use proptest::prelude::*;

// ---------- helpers ----------

fn make(factory: &HybridPressureFactory, table: &DimTable) -> Result<AuxCoord, FactoryError> {
    factory.make_coord(&|c: &dyn Coordinate| table.dims_of(c))
}

fn deps(
    delta: Option<&Arc<dyn Coordinate>>,
    sigma: Option<&Arc<dyn Coordinate>>,
    surface: Option<&Arc<dyn Coordinate>>,
) -> HybridPressureDeps {
    HybridPressureDeps {
        delta: delta.cloned(),
        sigma: sigma.cloned(),
        surface_air_pressure: surface.cloned(),
    }
}

fn invalid(result: Result<HybridPressureFactory, FactoryError>) -> DependencyError {
    match result {
        Err(FactoryError::InvalidDependencies(e)) => e,
        other => panic!("expected invalid dependencies, got {other:?}"),
    }
}

fn assert_close(actual: &ArrayD<f64>, expected: &ArrayD<f64>) {
    assert_eq!(actual.shape(), expected.shape());
    for (ix, (a, e)) in actual.iter().zip(expected.iter()).enumerate() {
        assert!((a - e).abs() < 1e-12, "element {ix}: {a} != {e}");
    }
}

/// Mock dependencies with valid units and no bounds.
struct Mocks {
    delta: Arc<dyn Coordinate>,
    sigma: Arc<dyn Coordinate>,
    surface: Arc<dyn Coordinate>,
}

impl Mocks {
    fn new() -> Self {
        Self {
            delta: MockCoord::shared("level_pressure", "Pa", 0),
            sigma: MockCoord::shared("sigma", "1", 0),
            surface: MockCoord::shared("surface_air_pressure", "Pa", 0),
        }
    }

    fn factory(&self) -> HybridPressureFactory {
        HybridPressureFactory::new(deps(
            Some(&self.delta),
            Some(&self.sigma),
            Some(&self.surface),
        ))
        .unwrap()
    }
}

// ---------- construction ----------

#[test]
fn construct_with_every_valid_subset() {
    let m = Mocks::new();
    for d in [
        deps(Some(&m.delta), Some(&m.sigma), Some(&m.surface)),
        deps(Some(&m.delta), None, None),
        deps(Some(&m.delta), Some(&m.sigma), None),
        deps(Some(&m.delta), None, Some(&m.surface)),
        deps(None, Some(&m.sigma), Some(&m.surface)),
    ] {
        assert!(HybridPressureFactory::new(d).is_ok());
    }
}

#[test]
fn insufficient_coordinates_rejected() {
    let m = Mocks::new();
    for d in [
        deps(None, None, None),
        deps(None, Some(&m.sigma), None),
        deps(None, None, Some(&m.surface)),
    ] {
        assert_eq!(
            invalid(HybridPressureFactory::new(d)),
            DependencyError::Insufficient
        );
    }
}

#[test]
fn delta_must_be_pressure() {
    let m = Mocks::new();
    let delta = MockCoord::shared("level_pressure", "m", 0);
    let err = invalid(HybridPressureFactory::new(deps(
        Some(&delta),
        Some(&m.sigma),
        Some(&m.surface),
    )));
    assert_eq!(
        err,
        DependencyError::IncompatibleUnits {
            role: "delta",
            units: "m".to_string(),
            expected: "Pa",
        }
    );
}

#[test]
fn sigma_must_be_dimensionless() {
    let m = Mocks::new();
    let sigma = MockCoord::shared("sigma", "Pa", 0);
    let err = invalid(HybridPressureFactory::new(deps(
        Some(&m.delta),
        Some(&sigma),
        Some(&m.surface),
    )));
    assert!(matches!(
        err,
        DependencyError::IncompatibleUnits { role: "sigma", .. }
    ));
}

#[test]
fn surface_of_unknown_unit_rejected() {
    let m = Mocks::new();
    let surface = MockCoord::shared("surface_air_pressure", "unknown", 0);
    let err = invalid(HybridPressureFactory::new(deps(
        Some(&m.delta),
        Some(&m.sigma),
        Some(&surface),
    )));
    assert!(matches!(
        err,
        DependencyError::IncompatibleUnits {
            role: "surface_air_pressure",
            ..
        }
    ));
}

#[test]
fn convertible_but_different_pressure_units_rejected() {
    let m = Mocks::new();
    let delta = MockCoord::shared("level_pressure", "hPa", 0);
    let err = invalid(HybridPressureFactory::new(deps(
        Some(&delta),
        Some(&m.sigma),
        Some(&m.surface),
    )));
    assert_eq!(
        err,
        DependencyError::MismatchedPressureUnits {
            delta: "hPa".to_string(),
            surface_air_pressure: "Pa".to_string(),
        }
    );
}

#[test]
fn too_many_bounds_rejected() {
    let m = Mocks::new();
    let delta = MockCoord::shared("level_pressure", "Pa", 4);
    let err = invalid(HybridPressureFactory::new(deps(
        Some(&delta),
        Some(&m.sigma),
        Some(&m.surface),
    )));
    assert_eq!(
        err,
        DependencyError::TooManyBounds {
            role: "delta",
            nbounds: 4,
        }
    );

    let sigma = MockCoord::shared("sigma", "1", 4);
    let err = invalid(HybridPressureFactory::new(deps(
        Some(&m.delta),
        Some(&sigma),
        Some(&m.surface),
    )));
    assert!(matches!(
        err,
        DependencyError::TooManyBounds { role: "sigma", .. }
    ));

    let surface = MockCoord::shared("surface_air_pressure", "Pa", 4);
    let err = invalid(HybridPressureFactory::new(deps(
        Some(&m.delta),
        Some(&m.sigma),
        Some(&surface),
    )));
    assert_eq!(
        err,
        DependencyError::TooManyBounds {
            role: "surface_air_pressure",
            nbounds: 4,
        }
    );
}

#[test]
fn metadata_of_derived_coordinate() {
    let m = Mocks::new();
    let factory = m.factory();
    assert_eq!(factory.standard_name(), Some("air_pressure"));
    assert_eq!(factory.long_name(), None);
    assert_eq!(factory.var_name(), None);
    assert_eq!(factory.units(), m.delta.units());
    assert_eq!(factory.coord_system(), None);
    assert!(factory.attributes().is_empty());
    assert_eq!(factory.name(), "air_pressure");
}

#[test]
fn units_come_from_surface_without_delta() {
    let sigma = MockCoord::shared("sigma", "1", 0);
    let surface = MockCoord::shared("surface_air_pressure", "hPa", 0);
    let factory = HybridPressureFactory::new(deps(None, Some(&sigma), Some(&surface))).unwrap();
    assert_eq!(factory.units(), &Unit::parse("hPa").unwrap());
}

#[test]
fn dependencies_are_the_coordinates_given() {
    let m = Mocks::new();
    let factory = m.factory();
    let d = factory.dependencies();
    assert_eq!(
        d.keys().copied().collect::<Vec<_>>(),
        ["delta", "sigma", "surface_air_pressure"]
    );
    assert!(Arc::ptr_eq(d["delta"].as_ref().unwrap(), &m.delta));
    assert!(Arc::ptr_eq(d["sigma"].as_ref().unwrap(), &m.sigma));
    assert!(Arc::ptr_eq(
        d["surface_air_pressure"].as_ref().unwrap(),
        &m.surface
    ));

    let partial = HybridPressureFactory::builder()
        .delta(m.delta.clone())
        .build()
        .unwrap();
    let d = partial.dependencies();
    assert_eq!(d.len(), 3);
    assert!(d["sigma"].is_none());
    assert!(d["surface_air_pressure"].is_none());
}

#[test]
fn builder_matches_new() {
    let m = Mocks::new();
    let built = HybridPressureFactory::builder()
        .delta(m.delta.clone())
        .sigma(m.sigma.clone())
        .surface_air_pressure(m.surface.clone())
        .build()
        .unwrap();
    assert!(same_dependencies(
        &built.dependencies(),
        &m.factory().dependencies()
    ));
    assert!(Arc::ptr_eq(built.delta().unwrap(), &m.delta));
    assert!(Arc::ptr_eq(built.sigma().unwrap(), &m.sigma));
    assert!(Arc::ptr_eq(built.surface_air_pressure().unwrap(), &m.surface));
}

#[test]
fn display_names_each_slot() {
    let m = Mocks::new();
    assert_eq!(
        m.factory().to_string(),
        "HybridPressureFactory(delta=level_pressure, sigma=sigma, \
         surface_air_pressure=surface_air_pressure)"
    );
    let partial = HybridPressureFactory::builder()
        .delta(m.delta.clone())
        .build()
        .unwrap();
    assert_eq!(
        partial.to_string(),
        "HybridPressureFactory(delta=level_pressure, sigma=None, surface_air_pressure=None)"
    );
}

// ---------- make_coord ----------

struct Grid {
    delta: Arc<dyn Coordinate>,
    sigma: Arc<dyn Coordinate>,
    surface: Arc<dyn Coordinate>,
    dims: DimTable,
}

impl Grid {
    fn new() -> Self {
        Self {
            delta: shared(level_pressure()),
            sigma: shared(sigma()),
            surface: shared(surface_air_pressure()),
            dims: grid_dims(),
        }
    }

    /// `delta[i] + sigma[i] * surface[j, k]`, with absent terms dropped.
    fn expected(&self, delta: bool, sigma: bool, surface: bool) -> ArrayD<f64> {
        let d = self.delta.points();
        let s = self.sigma.points();
        let p = self.surface.points();
        ArrayD::from_shape_fn(vec![3, 2, 2], |ix| {
            let mut v = 0.0;
            if delta {
                v += d[[ix[0]]];
            }
            if sigma && surface {
                v += s[[ix[0]]] * p[[ix[1], ix[2]]];
            }
            v
        })
    }
}

#[test]
fn points_only() {
    let g = Grid::new();
    let factory =
        HybridPressureFactory::new(deps(Some(&g.delta), Some(&g.sigma), Some(&g.surface)))
            .unwrap();
    let coord = make(&factory, &g.dims).unwrap();

    assert_close(coord.points(), &g.expected(true, true, true));
    assert!(coord.bounds().is_none());
    assert_eq!(coord.standard_name(), Some("air_pressure"));
    assert_eq!(coord.units(), &Unit::pascal());
    assert_eq!(coord.metadata(), factory.metadata());
}

#[test]
fn points_without_delta() {
    let g = Grid::new();
    let factory =
        HybridPressureFactory::new(deps(None, Some(&g.sigma), Some(&g.surface))).unwrap();
    let coord = make(&factory, &g.dims).unwrap();
    assert_close(coord.points(), &g.expected(false, true, true));
}

#[test]
fn points_without_sigma() {
    let g = Grid::new();
    let factory =
        HybridPressureFactory::new(deps(Some(&g.delta), None, Some(&g.surface))).unwrap();
    let coord = make(&factory, &g.dims).unwrap();
    assert_close(coord.points(), &g.expected(true, false, true));
}

#[test]
fn points_without_surface() {
    let g = Grid::new();
    let factory =
        HybridPressureFactory::new(deps(Some(&g.delta), Some(&g.sigma), None)).unwrap();
    let coord = make(&factory, &g.dims).unwrap();
    assert_close(coord.points(), &array![0.0, 1.0, 2.0].into_dyn());
}

#[test]
fn bounds_combine_elementwise() {
    let g = Grid::new();
    let delta = shared(bounded_level_pressure());
    let sigma = shared(bounded_sigma());
    let factory =
        HybridPressureFactory::new(deps(Some(&delta), Some(&sigma), Some(&g.surface))).unwrap();
    let coord = make(&factory, &g.dims).unwrap();

    assert_close(coord.points(), &g.expected(true, true, true));
    let bounds = coord.bounds().unwrap();
    assert_eq!(bounds.shape(), &[3, 2, 2, 2]);
    assert_eq!(coord.nbounds(), 2);

    let db = delta.bounds().unwrap();
    let sb = sigma.bounds().unwrap();
    let p = g.surface.points();
    let expected = ArrayD::from_shape_fn(vec![3, 2, 2, 2], |ix| {
        db[[ix[0], ix[3]]] + sb[[ix[0], ix[3]]] * p[[ix[1], ix[2]]]
    });
    assert_close(bounds, &expected);
}

#[test]
fn surface_bounds_are_used() {
    let g = Grid::new();
    let surface = shared(
        AuxCoord::builder(array![[1.0, 2.0], [3.0, 4.0]])
            .standard_name("surface_air_pressure")
            .units(Unit::pascal())
            .bounds(array![[[0.5, 1.5], [1.5, 2.5]], [[2.5, 3.5], [3.5, 4.5]]])
            .build()
            .unwrap(),
    );
    let factory =
        HybridPressureFactory::new(deps(None, Some(&g.sigma), Some(&surface))).unwrap();
    let coord = make(&factory, &g.dims).unwrap();
    let bounds = coord.bounds().unwrap();
    assert_eq!(bounds.shape(), &[3, 2, 2, 2]);
    // level 1 (sigma 0.9), cell (1, 0), upper bound 3.5
    assert!((bounds[[1, 1, 0, 1]] - 0.9 * 3.5).abs() < 1e-12);
}

#[test]
fn descending_mapping_is_transposed() {
    let g = Grid::new();
    let surface_t = shared(
        AuxCoord::builder(array![[0.0, 2.0], [1.0, 3.0]])
            .standard_name("surface_air_pressure")
            .units(Unit::pascal())
            .build()
            .unwrap(),
    );
    let dims = DimTable::new()
        .with("level_pressure", &[0])
        .with("sigma", &[0])
        .with("surface_air_pressure", &[2, 1]);
    let factory =
        HybridPressureFactory::new(deps(Some(&g.delta), Some(&g.sigma), Some(&surface_t)))
            .unwrap();
    let coord = make(&factory, &dims).unwrap();
    assert_close(coord.points(), &g.expected(true, true, true));
}

#[test]
fn derived_dims_are_sorted_union() {
    let g = Grid::new();
    let factory =
        HybridPressureFactory::new(deps(Some(&g.delta), Some(&g.sigma), Some(&g.surface)))
            .unwrap();
    let table = &g.dims;
    let dims = factory
        .derived_dims(&|c: &dyn Coordinate| table.dims_of(c))
        .unwrap();
    assert_eq!(dims.as_slice(), &[0, 1, 2]);

    let delta_only = HybridPressureFactory::builder()
        .delta(g.delta.clone())
        .build()
        .unwrap();
    let dims = delta_only
        .derived_dims(&|c: &dyn Coordinate| table.dims_of(c))
        .unwrap();
    assert_eq!(dims.as_slice(), &[0]);
}

#[test]
fn unmapped_dependency_rejected() {
    let g = Grid::new();
    let factory =
        HybridPressureFactory::new(deps(Some(&g.delta), Some(&g.sigma), Some(&g.surface)))
            .unwrap();
    let partial = DimTable::new()
        .with("level_pressure", &[0])
        .with("sigma", &[0]);
    assert_eq!(
        make(&factory, &partial),
        Err(FactoryError::UnmappedDependency {
            role: "surface_air_pressure"
        })
    );
}

#[test]
fn inconsistent_lengths_rejected() {
    let g = Grid::new();
    let short_sigma = shared(
        AuxCoord::builder(array![1.0, 0.5])
            .long_name("sigma")
            .build()
            .unwrap(),
    );
    let factory =
        HybridPressureFactory::new(deps(Some(&g.delta), Some(&short_sigma), Some(&g.surface)))
            .unwrap();
    assert!(matches!(
        make(&factory, &g.dims),
        Err(FactoryError::BroadcastShape { .. })
    ));
}

#[test]
fn scalar_dependencies_give_length_one_output() {
    let delta = shared(
        AuxCoord::builder(ndarray::arr0(100.0))
            .long_name("level_pressure")
            .units(Unit::pascal())
            .build()
            .unwrap(),
    );
    let factory = HybridPressureFactory::builder()
        .delta(delta)
        .build()
        .unwrap();
    let coord = make(&factory, &DimTable::new().with("level_pressure", &[])).unwrap();
    assert_eq!(coord.shape(), &[1]);
    assert_eq!(coord.points()[[0]], 100.0);
}

#[test]
fn make_coord_returns_fresh_coordinates() {
    let g = Grid::new();
    let factory =
        HybridPressureFactory::new(deps(Some(&g.delta), Some(&g.sigma), Some(&g.surface)))
            .unwrap();
    let first = make(&factory, &g.dims).unwrap();
    let second = make(&factory, &g.dims).unwrap();
    assert_eq!(first, second);
    assert!(!std::ptr::eq(first.points(), second.points()));
}

// ---------- update ----------

#[test]
fn update_good_delta() {
    let m = Mocks::new();
    let mut factory = m.factory();
    let new_delta = MockCoord::shared("new_delta", "Pa", 2);
    factory.update(&m.delta, Some(new_delta.clone())).unwrap();
    assert!(Arc::ptr_eq(factory.delta().unwrap(), &new_delta));
}

#[test]
fn update_delta_with_wrong_unit_leaves_factory_unchanged() {
    let m = Mocks::new();
    let mut factory = m.factory();
    let before = factory.dependencies();
    let bad = MockCoord::shared("new_delta", "1", 0);
    assert!(matches!(
        factory.update(&m.delta, Some(bad)),
        Err(FactoryError::InvalidDependencies(
            DependencyError::IncompatibleUnits { role: "delta", .. }
        ))
    ));
    assert!(same_dependencies(&before, &factory.dependencies()));
}

#[test]
fn update_delta_with_too_many_bounds_rejected() {
    let m = Mocks::new();
    let mut factory = m.factory();
    let bad = MockCoord::shared("new_delta", "Pa", 4);
    assert!(matches!(
        factory.update(&m.delta, Some(bad)),
        Err(FactoryError::InvalidDependencies(
            DependencyError::TooManyBounds { role: "delta", nbounds: 4 }
        ))
    ));
    assert!(Arc::ptr_eq(factory.delta().unwrap(), &m.delta));
}

#[test]
fn update_good_surface() {
    let m = Mocks::new();
    let mut factory = m.factory();
    let new_surface = MockCoord::shared("new_surface", "Pa", 0);
    factory.update(&m.surface, Some(new_surface.clone())).unwrap();
    assert!(Arc::ptr_eq(
        factory.surface_air_pressure().unwrap(),
        &new_surface
    ));
}

#[test]
fn update_surface_with_length_unit_rejected() {
    let m = Mocks::new();
    let mut factory = m.factory();
    let bad = MockCoord::shared("new_surface", "km", 0);
    assert!(factory.update(&m.surface, Some(bad)).is_err());
    assert!(Arc::ptr_eq(factory.surface_air_pressure().unwrap(), &m.surface));
}

#[test]
fn update_non_dependency_is_a_no_op() {
    let m = Mocks::new();
    let mut factory = m.factory();
    let before = factory.dependencies();
    let stranger = MockCoord::shared("level_pressure", "Pa", 0);
    let replacement = MockCoord::shared("replacement", "Pa", 0);
    factory.update(&stranger, Some(replacement)).unwrap();
    assert!(same_dependencies(&before, &factory.dependencies()));
    assert!(!factory.depends_on(&stranger));
}

#[test]
fn update_removing_delta_allowed() {
    let m = Mocks::new();
    let mut factory = m.factory();
    factory.update(&m.delta, None).unwrap();
    assert!(factory.delta().is_none());
    assert!(!factory.depends_on(&m.delta));
}

#[test]
fn update_removing_sigma_allowed() {
    let m = Mocks::new();
    let mut factory = m.factory();
    factory.update(&m.sigma, None).unwrap();
    assert!(factory.sigma().is_none());
}

#[test]
fn update_to_insufficient_rejected() {
    let m = Mocks::new();
    let mut factory = m.factory();
    factory.update(&m.delta, None).unwrap();
    assert_eq!(
        factory.update(&m.surface, None),
        Err(FactoryError::InvalidDependencies(DependencyError::Insufficient))
    );
    assert!(Arc::ptr_eq(factory.surface_air_pressure().unwrap(), &m.surface));
    assert!(Arc::ptr_eq(factory.sigma().unwrap(), &m.sigma));
}

#[test]
fn update_refreshes_derived_units() {
    let delta = MockCoord::shared("level_pressure", "Pa", 0);
    let mut factory = HybridPressureFactory::builder()
        .delta(delta.clone())
        .build()
        .unwrap();
    let hpa = MockCoord::shared("level_pressure_hpa", "hPa", 0);
    factory.update(&delta, Some(hpa)).unwrap();
    assert_eq!(factory.units(), &Unit::parse("hPa").unwrap());
}

#[test]
fn update_to_mismatched_pressure_units_rejected() {
    let m = Mocks::new();
    let mut factory = m.factory();
    let hpa = MockCoord::shared("level_pressure_hpa", "hPa", 0);
    assert!(matches!(
        factory.update(&m.delta, Some(hpa)),
        Err(FactoryError::InvalidDependencies(
            DependencyError::MismatchedPressureUnits { .. }
        ))
    ));
    assert_eq!(factory.units(), &Unit::pascal());
}

#[test]
fn update_matches_by_identity_not_value() {
    let shared_coord = MockCoord::shared("twin", "1", 0);
    let delta = MockCoord::shared("level_pressure", "Pa", 0);
    let mut factory = HybridPressureFactory::builder()
        .delta(delta)
        .sigma(shared_coord.clone())
        .build()
        .unwrap();
    let twin = MockCoord::shared("twin", "1", 0);
    factory.update(&twin, None).unwrap();
    assert!(Arc::ptr_eq(factory.sigma().unwrap(), &shared_coord));
    assert_eq!(factory.deps().role_of(&shared_coord), Some(Role::Sigma));
}

// ---------- updated ----------

#[test]
fn updated_swaps_every_dependency() {
    let m = Mocks::new();
    let factory = m.factory();
    let copies = Mocks::new();
    let copy = factory
        .updated(|dep| {
            if Arc::ptr_eq(dep, &m.delta) {
                Some(copies.delta.clone())
            } else if Arc::ptr_eq(dep, &m.sigma) {
                Some(copies.sigma.clone())
            } else if Arc::ptr_eq(dep, &m.surface) {
                Some(copies.surface.clone())
            } else {
                None
            }
        })
        .unwrap();
    assert!(same_dependencies(
        &copy.dependencies(),
        &copies.factory().dependencies()
    ));
    assert!(Arc::ptr_eq(factory.delta().unwrap(), &m.delta));
}

#[test]
fn updated_without_mapping_rejected() {
    let m = Mocks::new();
    let factory = m.factory();
    let err = factory
        .updated(|dep| {
            if Arc::ptr_eq(dep, &m.delta) {
                None
            } else {
                Some(dep.clone())
            }
        })
        .unwrap_err();
    assert_eq!(err, FactoryError::UnmappedDependency { role: "delta" });
}

// ---------- properties ----------

const SPELLINGS: [&str; 7] = ["Pa", "hPa", "1", "m", "K", "unknown", "%"];

proptest! {
    /// An update either yields a valid set or leaves the factory exactly
    /// as it was.
    #[test]
    fn update_is_all_or_nothing(
        role in 0usize..3,
        spelling in 0usize..SPELLINGS.len(),
        nbounds in 0usize..5,
        remove in any::<bool>(),
    ) {
        let m = Mocks::new();
        let mut factory = m.factory();
        let before = factory.dependencies();
        let units_before = factory.units().clone();
        let old = [&m.delta, &m.sigma, &m.surface][role].clone();
        let new = (!remove).then(|| MockCoord::shared("candidate", SPELLINGS[spelling], nbounds));

        match factory.update(&old, new) {
            Ok(()) => {
                prop_assert!(factory.deps().validate().is_ok());
                prop_assert_eq!(factory.deps().validate().unwrap(), factory.units().clone());
            }
            Err(_) => {
                prop_assert!(same_dependencies(&before, &factory.dependencies()));
                prop_assert_eq!(factory.units(), &units_before);
            }
        }
    }
}
