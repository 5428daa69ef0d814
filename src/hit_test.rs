use eframe::egui::{Pos2, Vec2};

use crate::scale::{PolarScale, graph_to_polar};
use crate::transform::ViewTransform;

/// Index of the node under `screen`, or `None`.
///
/// Every node within `hit_radius` (graph units) is a candidate. The nearest
/// wins; on equal distance the node drawn last (front-most) wins. This is
/// stricter than taking the first front-most circle that contains the point:
/// with overlapping hit circles that would return a neighbour instead of the
/// node actually drawn under the pointer.
pub fn node_at(
    transform: ViewTransform,
    viewport: Vec2,
    positions: &[Vec2],
    screen: Pos2,
    hit_radius: f32,
) -> Option<usize> {
    let point = transform.screen_to_graph(screen, viewport);
    let hit_radius_sq = hit_radius * hit_radius;

    positions
        .iter()
        .enumerate()
        .rev()
        .filter_map(|(index, position)| {
            let distance_sq = (*position - point).length_sq();
            (distance_sq <= hit_radius_sq).then_some((index, distance_sq))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(index, _)| index)
}

/// Tag whose sector contains `screen`, or `None` outside the outer radius.
pub fn sector_at<'a>(
    transform: ViewTransform,
    viewport: Vec2,
    scale: &'a PolarScale,
    screen: Pos2,
) -> Option<&'a str> {
    if scale.angular.is_empty() {
        return None;
    }
    let (radius, angle) = graph_to_polar(transform.screen_to_graph(screen, viewport));
    if !radius.is_finite() || radius > scale.outer_radius {
        return None;
    }
    scale.angular.locate(angle)
}

#[cfg(test)]
mod tests {
    use eframe::egui::{pos2, vec2};
    use proptest::prelude::*;

    use super::*;
    use crate::scale::polar_to_graph;

    const VIEWPORT: Vec2 = vec2(400.0, 800.0);

    fn scale() -> PolarScale {
        PolarScale::for_viewport(VIEWPORT, 40.0, ["A", "B", "C"], 3)
    }

    #[test]
    fn front_most_wins_exact_overlap() {
        let positions = [vec2(10.0, 10.0), vec2(10.0, 10.0)];
        let screen = ViewTransform::IDENTITY.graph_to_screen(vec2(10.0, 10.0), VIEWPORT);
        let hit = node_at(ViewTransform::IDENTITY, VIEWPORT, &positions, screen, 24.0);
        assert_eq!(hit, Some(1));
    }

    #[test]
    fn generous_radius_catches_near_misses() {
        let positions = [vec2(0.0, 0.0)];
        let transform = ViewTransform {
            offset: vec2(30.0, 0.0),
            scale: 2.0,
        };
        let near = transform.graph_to_screen(vec2(20.0, 0.0), VIEWPORT);
        let far = transform.graph_to_screen(vec2(30.0, 0.0), VIEWPORT);
        assert_eq!(node_at(transform, VIEWPORT, &positions, near, 24.0), Some(0));
        assert_eq!(node_at(transform, VIEWPORT, &positions, far, 24.0), None);
    }

    #[test]
    fn sectors_follow_tag_order() {
        let scale = scale();
        let transform = ViewTransform::IDENTITY;
        let screen = |angle: f32| transform.graph_to_screen(polar_to_graph(angle, 100.0), VIEWPORT);
        assert_eq!(sector_at(transform, VIEWPORT, &scale, screen(1.0)), Some("A"));
        assert_eq!(sector_at(transform, VIEWPORT, &scale, screen(3.0)), Some("B"));
        assert_eq!(sector_at(transform, VIEWPORT, &scale, screen(5.0)), Some("C"));
    }

    #[test]
    fn sector_rejects_points_past_outer_radius() {
        let scale = scale();
        let outside = ViewTransform::IDENTITY
            .graph_to_screen(polar_to_graph(1.0, scale.outer_radius + 5.0), VIEWPORT);
        assert_eq!(
            sector_at(ViewTransform::IDENTITY, VIEWPORT, &scale, outside),
            None
        );
    }

    #[test]
    fn no_tags_means_no_sector() {
        let scale = PolarScale::for_viewport(VIEWPORT, 40.0, Vec::<String>::new(), 3);
        assert_eq!(
            sector_at(ViewTransform::IDENTITY, VIEWPORT, &scale, pos2(200.0, 400.0)),
            None
        );
    }

    proptest! {
        #[test]
        fn hit_test_inverts_render_transform(
            heights in proptest::collection::vec(-300.0f32..300.0, 1..40),
            offset_x in -200.0f32..200.0,
            offset_y in -200.0f32..200.0,
            scale in 0.5f32..3.0,
            pick in 0usize..40,
        ) {
            // Columns 60 units apart keep every other node out of the hit radius.
            let positions = heights
                .iter()
                .enumerate()
                .map(|(index, y)| vec2(index as f32 * 60.0 - 1200.0, *y))
                .collect::<Vec<_>>();
            let transform = ViewTransform { offset: vec2(offset_x, offset_y), scale };
            let index = pick % positions.len();
            let screen = transform.graph_to_screen(positions[index], VIEWPORT);
            prop_assert_eq!(node_at(transform, VIEWPORT, &positions, screen, 24.0), Some(index));
        }
    }
}
