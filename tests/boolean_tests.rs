use csgcore::float_types::EPSILON;
use csgcore::solid::Solid;
use csgcore::traits::{BooleanOps, TransformOps};

mod support;
use support::{assert_bounds, cube, cube_at, same_polygon_set};

#[test]
fn union_with_self_is_identity() {
    let a = cube(2.0);
    let result = a.union(&a);
    assert!(result.is_retesselated && result.is_canonicalized);
    assert_bounds(&result, [-1.0, -1.0, -1.0, 1.0, 1.0, 1.0], EPSILON);
    assert!(result.polygons.len() <= 6);
    for polygon in &result.polygons {
        assert!(polygon.check_convex());
    }
}

#[test]
fn intersection_with_self_is_identity() {
    let a = cube(2.0);
    let result = a.intersection(&a);
    assert_bounds(&result, [-1.0, -1.0, -1.0, 1.0, 1.0, 1.0], EPSILON);
    assert!(result.polygons.len() <= 6);
}

#[test]
fn difference_with_empty_is_identity() {
    let a = cube(2.0);
    let empty: Solid<()> = TransformOps::new();
    let result = a.difference(&empty);
    assert_bounds(&result, [-1.0, -1.0, -1.0, 1.0, 1.0, 1.0], EPSILON);
    assert_eq!(result.polygons.len(), 6);
}

#[test]
fn difference_with_self_annihilates() {
    let a = cube(2.0);
    let result = a.difference(&a);
    assert_eq!(result.polygons.len(), 0);
}

#[test]
fn intersection_with_empty_annihilates() {
    let a = cube(2.0);
    let empty: Solid<()> = TransformOps::new();
    assert_eq!(a.intersection(&empty).polygons.len(), 0);
    assert_eq!(empty.intersection(&a).polygons.len(), 0);
}

#[test]
fn union_bounds_are_the_componentwise_hull() {
    let a = cube(2.0);
    let b = cube_at(2.0, [1.0, 0.5, 0.25]);
    let result = a.union(&b);
    let bounds = result.bounding_box();
    let mine = a.bounding_box();
    let theirs = b.bounding_box();
    for axis in 0..3 {
        assert!((bounds.mins[axis] - mine.mins[axis].min(theirs.mins[axis])).abs() < EPSILON);
        assert!((bounds.maxs[axis] - mine.maxs[axis].max(theirs.maxs[axis])).abs() < EPSILON);
    }
}

#[test]
fn union_is_commutative_up_to_reordering() {
    let a = cube(2.0);
    let b = cube_at(2.0, [1.0, 0.0, 0.0]);
    let ab = a.union(&b);
    let ba = b.union(&a);
    assert!(
        same_polygon_set(&ab, &ba, 1e-4),
        "a∪b: {} polygons, b∪a: {} polygons",
        ab.polygons.len(),
        ba.polygons.len()
    );
}

#[test]
fn intersection_is_commutative_up_to_reordering() {
    let a = cube(2.0);
    let b = cube_at(2.0, [1.0, 0.0, 0.0]);
    let ab = a.intersection(&b);
    let ba = b.intersection(&a);
    assert!(same_polygon_set(&ab, &ba, 1e-4));
}

// Scenario: disjoint operands take the concatenation fast path.
#[test]
fn disjoint_union_concatenates() {
    let a = cube(2.0);
    let b = cube_at(2.0, [3.0, 0.0, 0.0]);
    assert!(!a.may_overlap(&b));
    let result = a.union(&b);
    assert_eq!(result.polygons.len(), a.polygons.len() + b.polygons.len());
    assert_bounds(&result, [-1.0, -1.0, -1.0, 4.0, 1.0, 1.0], EPSILON);
}

// Scenario: overlapping cubes, difference leaves a 1x2x2 box.
#[test]
fn difference_of_overlapping_cubes() {
    let a = cube(2.0);
    let b = cube_at(2.0, [1.0, 0.0, 0.0]);
    let result = a.difference(&b);
    assert_bounds(&result, [-1.0, -1.0, -1.0, 0.0, 1.0, 1.0], EPSILON);
    assert!(!result.polygons.is_empty());
    for polygon in &result.polygons {
        assert!(polygon.check_convex());
    }
}

// Scenario: overlapping cubes, intersection is the shared 1x2x2 box.
#[test]
fn intersection_of_overlapping_cubes() {
    let a = cube(2.0);
    let b = cube_at(2.0, [1.0, 0.0, 0.0]);
    let result = a.intersection(&b);
    assert_bounds(&result, [0.0, -1.0, -1.0, 1.0, 1.0, 1.0], EPSILON);
}

// Scenario: cube against the same cube rotated 45 degrees about z. The
// intersection is a prism over a regular octagon, and retesselation leaves
// no triangles behind.
#[test]
fn intersection_with_rotated_cube_is_an_octagonal_prism() {
    let a = cube(2.0);
    let b = cube(2.0).rotate(0.0, 0.0, 45.0);
    let result = a.intersection(&b);

    assert_bounds(&result, [-1.0, -1.0, -1.0, 1.0, 1.0, 1.0], 1e-4);
    assert!(!result.polygons.is_empty());
    for polygon in &result.polygons {
        assert!(
            polygon.vertices.len() >= 4,
            "triangle survived retesselation: {:?}",
            polygon.vertices
        );
        assert!(polygon.check_convex());
    }
}

// Scenario: a union with an epsilon-shifted copy collapses onto the
// original after canonicalization.
#[test]
fn union_with_epsilon_shifted_copy_collapses() {
    let a = cube(2.0);
    let b = cube_at(2.0, [EPSILON * 0.5, 0.0, 0.0]);
    let result = a.union(&b);
    assert_eq!(result.polygons.len(), 6);
    assert!(same_polygon_set(&result, &a.canonicalized(), 1e-4));
}

#[test]
fn retesselation_of_a_result_is_idempotent() {
    let result = cube(2.0).difference(&cube_at(2.0, [1.0, 0.5, 0.0]));
    assert!(result.is_retesselated);
    // Strip the flag by rebuilding from the same polygons.
    let again = Solid::from_polygons(result.polygons.clone()).retesselated();
    assert_eq!(again.polygons.len(), result.polygons.len());
}

#[test]
fn canonicalization_of_a_result_is_idempotent() {
    let result = cube(2.0).difference(&cube_at(2.0, [1.0, 0.5, 0.0]));
    assert!(result.is_canonicalized);
    let again = Solid::from_polygons(result.polygons.clone()).canonicalized();
    assert_eq!(again.polygons.len(), result.polygons.len());
    assert!(same_polygon_set(&result, &again, EPSILON));
}

#[test]
fn chained_unions_pair_up() {
    let a = cube(2.0);
    let parts: Vec<Solid<()>> = (1..4)
        .map(|i| cube_at(2.0, [1.0 * i as f64, 0.0, 0.0]))
        .collect();
    let result = a.union_many(&parts);
    assert_bounds(&result, [-1.0, -1.0, -1.0, 4.0, 1.0, 1.0], EPSILON);
    assert!(result.is_retesselated && result.is_canonicalized);
}

#[test]
fn chained_differences_fold_left() {
    let a = cube(2.0);
    let bites = [cube_at(2.0, [1.5, 0.0, 0.0]), cube_at(2.0, [-1.5, 0.0, 0.0])];
    let result = a.difference_many(&bites);
    assert_bounds(&result, [-0.5, -1.0, -1.0, 0.5, 1.0, 1.0], EPSILON);
}

#[test]
fn xor_of_identical_cubes_is_empty() {
    let a = cube(2.0);
    assert_eq!(a.xor(&a).polygons.len(), 0);
}

#[test]
fn properties_merge_across_booleans() {
    use csgcore::properties::PropertyValue;
    use nalgebra::Point3;

    let mut a = cube(2.0);
    a.properties
        .insert("anchor", PropertyValue::Point(Point3::origin()));
    let mut b = cube_at(2.0, [1.0, 0.0, 0.0]);
    b.properties
        .insert("anchor", PropertyValue::Point(Point3::new(9.0, 9.0, 9.0)));
    b.properties
        .insert("extra", PropertyValue::Point(Point3::new(1.0, 0.0, 0.0)));

    let result = a.union(&b);
    // Left operand wins on collision; everything else carries over.
    assert_eq!(
        result.properties.get("anchor"),
        Some(&PropertyValue::Point(Point3::origin()))
    );
    assert!(result.properties.get("extra").is_some());
}

#[test]
fn properties_merge_on_the_disjoint_difference_path() {
    use csgcore::properties::PropertyValue;
    use nalgebra::Point3;

    let mut a = cube(2.0);
    a.properties
        .insert("anchor", PropertyValue::Point(Point3::origin()));
    let mut b = cube_at(2.0, [5.0, 0.0, 0.0]);
    b.properties
        .insert("anchor", PropertyValue::Point(Point3::new(9.0, 9.0, 9.0)));
    b.properties
        .insert("extra", PropertyValue::Point(Point3::new(5.0, 0.0, 0.0)));
    assert!(!a.may_overlap(&b));

    // The fast path must merge annotations just like the BSP path does.
    let result = a.difference(&b);
    assert_eq!(
        result.properties.get("anchor"),
        Some(&PropertyValue::Point(Point3::origin()))
    );
    assert!(result.properties.get("extra").is_some());
}
