#![allow(clippy::float_cmp)]

use super::*;

fn pt(x: f64, y: f64) -> Point {
    Point::new(x, y)
}

fn square() -> Vec<Point> {
    vec![pt(0.0, 0.0), pt(10.0, 0.0), pt(10.0, 10.0), pt(0.0, 10.0)]
}

#[test]
fn distance_is_euclidean() {
    assert_eq!(Utils.distance(pt(0.0, 0.0), pt(3.0, 4.0)), 5.0);
}

#[test]
fn point_in_rect_includes_edges() {
    let rect = Rect::new(10.0, 10.0, 20.0, 20.0);
    assert!(Utils.point_in_rect(pt(10.0, 10.0), rect));
    assert!(Utils.point_in_rect(pt(30.0, 30.0), rect));
    assert!(!Utils.point_in_rect(pt(30.1, 15.0), rect));
}

#[test]
fn segment_distance_projects_onto_segment() {
    let d = Utils.point_to_segment_distance(pt(5.0, 3.0), pt(0.0, 0.0), pt(10.0, 0.0));
    assert!((d - 3.0).abs() < 1e-9);
}

#[test]
fn segment_distance_clamps_to_endpoints() {
    let d = Utils.point_to_segment_distance(pt(13.0, 4.0), pt(0.0, 0.0), pt(10.0, 0.0));
    assert!((d - 5.0).abs() < 1e-9);
}

#[test]
fn segment_distance_degenerate_segment() {
    let d = Utils.point_to_segment_distance(pt(3.0, 4.0), pt(0.0, 0.0), pt(0.0, 0.0));
    assert!((d - 5.0).abs() < 1e-9);
}

#[test]
fn polygon_contains_interior_point() {
    assert!(Utils.point_in_polygon(pt(5.0, 5.0), &square()));
    assert!(!Utils.point_in_polygon(pt(15.0, 5.0), &square()));
}

#[test]
fn polygon_with_two_vertices_contains_nothing() {
    assert!(!Utils.point_in_polygon(pt(0.0, 0.0), &[pt(0.0, 0.0), pt(1.0, 1.0)]));
}

#[test]
fn bounding_box_spans_all_points() {
    let bbox = Utils.bounding_box(&[pt(3.0, -1.0), pt(-2.0, 4.0), pt(1.0, 1.0)]).unwrap();
    assert_eq!(bbox, Rect::new(-2.0, -1.0, 5.0, 5.0));
}

#[test]
fn bounding_box_of_nothing_is_none() {
    assert!(Utils.bounding_box(&[]).is_none());
}
