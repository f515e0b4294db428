//! Query results checked against brute force over the whole store

use super::{scatter, small_grid, Agent};
use crate::foundation::collections::{Handle, HandleMap};
use crate::foundation::math::{constants::HALF_PI, Quat, Vec3};
use crate::spatial::{AxisAlignedBox, Capsule, Cone, QueryShape, RotatedBox, SparseGrid, Sphere};

fn populated_grid() -> (SparseGrid<Handle>, HandleMap<Agent>) {
    let mut store = HandleMap::new();
    // Spread past the grid edges so boundary cells hold outside objects too
    for position in scatter(300, 250.0, 350.0) {
        store.insert(Agent::at(position.x, position.y, position.z));
    }

    let mut grid = small_grid();
    grid.register_all(&mut store);
    grid.update(&mut store);
    (grid, store)
}

fn brute_force<Q: QueryShape>(store: &HandleMap<Agent>, shape: &Q) -> Vec<Handle> {
    let mut found: Vec<_> = store
        .iter()
        .filter(|(_, agent)| shape.contains(&agent.position))
        .map(|(handle, _)| handle)
        .collect();
    found.sort();
    found
}

fn sorted(mut handles: Vec<Handle>) -> Vec<Handle> {
    handles.sort();
    handles
}

fn assert_matches_brute_force<Q: QueryShape>(grid: &SparseGrid<Handle>, store: &HandleMap<Agent>, shape: &Q) {
    assert_eq!(sorted(grid.query(store, shape)), brute_force(store, shape), "{} query", shape.name());
}

#[test]
fn test_sphere_queries_match_brute_force() {
    let (grid, store) = populated_grid();
    for (center, radius) in [
        (Vec3::new(250.0, 250.0, 0.0), 60.0),
        (Vec3::new(20.0, 480.0, 0.0), 150.0),
        (Vec3::new(-200.0, 250.0, 0.0), 120.0),
        (Vec3::new(700.0, -100.0, 5.0), 300.0),
    ] {
        assert_matches_brute_force(&grid, &store, &Sphere::new(center, radius));
    }
}

#[test]
fn test_capsule_queries_match_brute_force() {
    let (grid, store) = populated_grid();
    for (center, up, radius, half_height) in [
        (Vec3::new(250.0, 250.0, 0.0), Vec3::x(), 30.0, 200.0),
        (Vec3::new(100.0, 400.0, 0.0), Vec3::new(1.0, -1.0, 0.0), 45.0, 300.0),
        (Vec3::new(250.0, 250.0, 0.0), Vec3::z(), 80.0, 20.0),
        (Vec3::new(-50.0, 250.0, 0.0), Vec3::y(), 60.0, 400.0),
    ] {
        assert_matches_brute_force(&grid, &store, &Capsule::new(center, up, radius, half_height));
    }
}

#[test]
fn test_box_queries_match_brute_force() {
    let (grid, store) = populated_grid();
    assert_matches_brute_force(
        &grid,
        &store,
        &AxisAlignedBox::new(Vec3::new(250.0, 250.0, 0.0), Vec3::new(100.0, 40.0, 20.0)),
    );
    assert_matches_brute_force(
        &grid,
        &store,
        &AxisAlignedBox::new(Vec3::new(0.0, 0.0, 0.0), Vec3::new(150.0, 150.0, 3.0)),
    );
}

#[test]
fn test_rotated_box_queries_match_brute_force() {
    let (grid, store) = populated_grid();
    let tilted = Quat::from_euler_angles(0.2, -0.1, 0.7);
    let spun = Quat::from_axis_angle(&Vec3::z_axis(), HALF_PI * 0.5);

    for rotation in [Quat::identity(), tilted, spun] {
        assert_matches_brute_force(
            &grid,
            &store,
            &RotatedBox::new(Vec3::new(260.0, 240.0, 0.0), rotation, Vec3::new(180.0, 30.0, 10.0)),
        );
    }
}

#[test]
fn test_cone_queries_match_brute_force() {
    let (grid, store) = populated_grid();
    for (apex, axis, length, half_angle) in [
        (Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 1.0, 0.0), 400.0, 0.3),
        (Vec3::new(250.0, 250.0, 0.0), -Vec3::y(), 200.0, HALF_PI * 0.5),
        (Vec3::new(450.0, 100.0, 0.0), Vec3::new(-1.0, 0.2, 0.1), 350.0, 0.05),
        (Vec3::new(250.0, 250.0, 0.0), Vec3::x(), 150.0, HALF_PI * 1.2),
    ] {
        assert_matches_brute_force(&grid, &store, &Cone::new(apex, axis, length, half_angle));
    }
}

#[test]
fn test_named_queries_use_the_same_shapes() {
    let (grid, store) = populated_grid();
    let center = Vec3::new(250.0, 250.0, 0.0);

    assert_eq!(
        sorted(grid.query_sphere(&store, center, 90.0)),
        brute_force(&store, &Sphere::new(center, 90.0))
    );
    assert_eq!(
        sorted(grid.query_capsule(&store, center, Vec3::y(), 20.0, 120.0)),
        brute_force(&store, &Capsule::new(center, Vec3::y(), 20.0, 120.0))
    );
    assert_eq!(
        sorted(grid.query_box(&store, center, Vec3::repeat(75.0))),
        brute_force(&store, &AxisAlignedBox::new(center, Vec3::repeat(75.0)))
    );
    assert_eq!(
        sorted(grid.query_rotated_box(&store, center, Quat::identity(), Vec3::repeat(75.0))),
        brute_force(&store, &AxisAlignedBox::new(center, Vec3::repeat(75.0)))
    );
    assert_eq!(
        sorted(grid.query_cone(&store, center, Vec3::x(), 200.0, 0.4)),
        brute_force(&store, &Cone::new(center, Vec3::x(), 200.0, 0.4))
    );
}

#[test]
fn test_query_into_appends() {
    let (grid, store) = populated_grid();
    let shape = Sphere::new(Vec3::new(250.0, 250.0, 0.0), 120.0);
    let expected = grid.query(&store, &shape);

    let mut found = vec![Handle::default()];
    grid.query_into(&store, &shape, &mut found);

    assert_eq!(found.len(), expected.len() + 1);
    assert_eq!(&found[1..], expected.as_slice());
}

#[test]
fn test_cone_includes_object_at_apex() {
    let mut store = HandleMap::new();
    let handle = store.insert(Agent::at(310.0, 120.0, 0.0));

    let mut grid = small_grid();
    grid.register(&mut store, handle);

    let found = grid.query_cone(&store, Vec3::new(310.0, 120.0, 0.0), Vec3::y(), 50.0, 0.2);
    assert_eq!(found, vec![handle]);
}

#[test]
fn test_box_query_is_inclusive() {
    let mut store = HandleMap::new();
    let inside = store.insert(Agent::at(200.0, 200.0, 0.0));
    let edge = store.insert(Agent::at(250.0, 200.0, 0.0));
    let outside = store.insert(Agent::at(260.0, 200.0, 0.0));

    let mut grid = small_grid();
    grid.register_all(&mut store);

    let found = sorted(grid.query_box(&store, Vec3::new(200.0, 200.0, 0.0), Vec3::new(50.0, 50.0, 50.0)));
    assert_eq!(found, sorted(vec![inside, edge]));
    assert!(!found.contains(&outside));
}

#[cfg(feature = "grid-bounds")]
#[test]
fn test_fast_reject_outside_tracked_bounds() {
    let mut store = HandleMap::new();
    store.insert(Agent::at(100.0, 100.0, 0.0));
    store.insert(Agent::at(200.0, 150.0, 0.0));

    let mut grid = small_grid();
    grid.register_all(&mut store);
    grid.update(&mut store);

    let bounds = grid.object_bounds().bounding_box().unwrap();
    assert_eq!(bounds.min, Vec3::new(100.0, 100.0, 0.0));
    assert_eq!(bounds.max, Vec3::new(200.0, 150.0, 0.0));

    // Above every object on Z
    assert!(grid.query_sphere(&store, Vec3::new(150.0, 125.0, 500.0), 100.0).is_empty());
    assert_eq!(grid.query_sphere(&store, Vec3::new(150.0, 125.0, 0.0), 100.0).len(), 2);
}

#[cfg(feature = "grid-bounds")]
#[test]
fn test_newly_registered_objects_are_not_fast_rejected() {
    let mut store = HandleMap::new();
    store.insert(Agent::at(100.0, 100.0, 0.0));

    let mut grid = small_grid();
    grid.register_all(&mut store);
    grid.update(&mut store);

    let late = store.insert(Agent::at(400.0, 400.0, 0.0));
    grid.register(&mut store, late);

    assert_eq!(grid.query_sphere(&store, Vec3::new(400.0, 400.0, 0.0), 5.0), vec![late]);
}
