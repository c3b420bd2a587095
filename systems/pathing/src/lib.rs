#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Path builder that converts ordered scene anchors into waypoint sequences.

use drover_core::PathAnchor;
use glam::Vec3;

/// Derives one waypoint per anchor, in anchor order.
///
/// Each waypoint keeps the anchor's horizontal position. Its height is the
/// anchor's nominal height (the top of the anchor's bounds when it carries
/// any, the anchor position otherwise) raised by `hover_height`.
/// The derived height is only the starting height; the motion controller
/// follows sampled ground at runtime.
///
/// Fewer than two anchors still produce the corresponding waypoints; the
/// spawn scheduler refuses to spawn onto such a path.
#[must_use]
pub fn build_waypoints(anchors: &[PathAnchor], hover_height: f32) -> Vec<Vec3> {
    anchors
        .iter()
        .map(|anchor| {
            Vec3::new(
                anchor.position.x,
                anchor.nominal_height() + hover_height,
                anchor.position.z,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::build_waypoints;
    use drover_core::PathAnchor;
    use glam::Vec3;

    #[test]
    fn anchor_order_is_preserved() {
        let anchors = vec![
            PathAnchor::at(Vec3::new(0.0, 0.0, 0.0)),
            PathAnchor::at(Vec3::new(3.0, 0.0, 1.0)),
            PathAnchor::at(Vec3::new(6.0, 0.0, -2.0)),
        ];

        let waypoints = build_waypoints(&anchors, 0.0);

        let horizontal: Vec<(f32, f32)> = waypoints
            .iter()
            .map(|waypoint| (waypoint.x, waypoint.z))
            .collect();
        assert_eq!(horizontal, vec![(0.0, 0.0), (3.0, 1.0), (6.0, -2.0)]);
    }

    #[test]
    fn bounds_top_substitutes_anchor_height() {
        let anchors = vec![
            PathAnchor::at(Vec3::new(0.0, 1.0, 0.0)),
            PathAnchor::with_bounds_top(Vec3::new(4.0, 1.0, 0.0), 3.5),
        ];

        let waypoints = build_waypoints(&anchors, 0.5);

        assert_eq!(waypoints[0].y, 1.5);
        assert_eq!(waypoints[1].y, 4.0);
    }

    #[test]
    fn empty_anchor_set_builds_empty_path() {
        assert!(build_waypoints(&[], 1.0).is_empty());
    }

    #[test]
    fn single_anchor_builds_single_waypoint() {
        let anchors = vec![PathAnchor::at(Vec3::new(2.0, 0.0, 2.0))];
        assert_eq!(build_waypoints(&anchors, 0.0).len(), 1);
    }
}
