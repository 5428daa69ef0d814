use std::f32::consts::TAU;

use eframe::egui::{Vec2, vec2};

use super::quadtree::{Cell, Quadtree};

const MIN_DISTANCE: f32 = 0.0001;

#[derive(Clone, Copy)]
pub(super) struct RepulsionParams {
    /// Already multiplied by alpha and the viewport scale factor.
    pub(super) strength: f32,
    pub(super) max_distance_sq: f32,
    pub(super) theta: f32,
}

#[derive(Clone, Copy)]
pub(super) struct CollisionParams {
    pub(super) min_distance: f32,
    pub(super) strength: f32,
}

/// Deterministic direction for coincident points so they can separate.
fn fallback_direction(first: usize, second: usize) -> Vec2 {
    let angle = ((first as f32) * 0.618_034 + (second as f32) * 0.414_214) * TAU;
    vec2(angle.cos(), angle.sin())
}

/// Velocity delta pushing a point away from a source, falling off as `1 / distance`.
fn repulsion_from(delta: Vec2, distance_sq: f32, mass: f32, params: RepulsionParams) -> Vec2 {
    if distance_sq > params.max_distance_sq {
        return Vec2::ZERO;
    }
    let distance = distance_sq.sqrt().max(1.0);
    (delta / distance) * (params.strength * mass / distance)
}

pub(super) fn accumulate_repulsion(
    tree: &Quadtree,
    cell: &Cell,
    index: usize,
    positions: &[Vec2],
    params: RepulsionParams,
    delta: &mut Vec2,
) {
    if cell.mass <= 0.0 {
        return;
    }

    let point = positions[index];

    if cell.is_leaf() {
        for &other in &cell.members {
            if other == index {
                continue;
            }
            let offset = point - positions[other];
            let distance_sq = offset.length_sq();
            let offset = if distance_sq > MIN_DISTANCE * MIN_DISTANCE {
                offset
            } else {
                fallback_direction(index, other)
            };
            *delta += repulsion_from(offset, distance_sq.max(MIN_DISTANCE), 1.0, params);
        }
        return;
    }

    let offset = point - cell.center_of_mass;
    let distance_sq = offset.length_sq().max(MIN_DISTANCE);
    let far_enough = !cell.bounds.contains(point)
        && cell.bounds.side() * cell.bounds.side() < params.theta * params.theta * distance_sq;

    if far_enough {
        *delta += repulsion_from(offset, distance_sq, cell.mass, params);
        return;
    }

    for child in tree.children(cell) {
        accumulate_repulsion(tree, child, index, positions, params, delta);
    }
}

fn resolve_overlap(
    from: usize,
    to: usize,
    positions: &[Vec2],
    fixed: &[bool],
    params: CollisionParams,
    deltas: &mut [Vec2],
) {
    if fixed[from] && fixed[to] {
        return;
    }

    let offset = positions[from] - positions[to];
    let distance = offset.length();
    if distance >= params.min_distance {
        return;
    }

    let direction = if distance > MIN_DISTANCE {
        offset / distance
    } else {
        fallback_direction(from, to)
    };
    let push = direction * (params.min_distance - distance) * params.strength;

    match (fixed[from], fixed[to]) {
        (true, _) => deltas[to] -= push,
        (_, true) => deltas[from] += push,
        _ => {
            deltas[from] += push * 0.5;
            deltas[to] -= push * 0.5;
        }
    }
}

/// Walks pairs of cells close enough to overlap and separates overlapping nodes.
pub(super) fn accumulate_collisions(
    tree: &Quadtree,
    cell_a: &Cell,
    cell_b: &Cell,
    same_cell: bool,
    positions: &[Vec2],
    fixed: &[bool],
    params: CollisionParams,
    deltas: &mut [Vec2],
) {
    if cell_a.bounds.gap_sq(cell_b.bounds) > params.min_distance * params.min_distance {
        return;
    }

    if cell_a.is_leaf() && cell_b.is_leaf() {
        if same_cell {
            for (offset, &from) in cell_a.members.iter().enumerate() {
                for &to in &cell_a.members[offset + 1..] {
                    resolve_overlap(from, to, positions, fixed, params, deltas);
                }
            }
        } else {
            for &from in &cell_a.members {
                for &to in &cell_b.members {
                    resolve_overlap(from, to, positions, fixed, params, deltas);
                }
            }
        }
        return;
    }

    if same_cell {
        let children = tree.children(cell_a).collect::<Vec<_>>();
        for (offset, child_a) in children.iter().enumerate() {
            accumulate_collisions(tree, child_a, child_a, true, positions, fixed, params, deltas);
            for child_b in &children[offset + 1..] {
                accumulate_collisions(
                    tree, child_a, child_b, false, positions, fixed, params, deltas,
                );
            }
        }
        return;
    }

    let split_a = if cell_a.is_leaf() {
        false
    } else if cell_b.is_leaf() {
        true
    } else {
        cell_a.bounds.half_extent >= cell_b.bounds.half_extent
    };

    if split_a {
        for child in tree.children(cell_a) {
            accumulate_collisions(tree, child, cell_b, false, positions, fixed, params, deltas);
        }
    } else {
        for child in tree.children(cell_b) {
            accumulate_collisions(tree, cell_a, child, false, positions, fixed, params, deltas);
        }
    }
}

/// Spring pulling each axis independently toward `target`.
pub(super) fn positional_pull(position: Vec2, target: Vec2, strength: f32) -> Vec2 {
    (target - position) * strength
}

/// Spring pulling the distance from the origin toward `radius`, ignoring angle.
pub(super) fn radial_pull(index: usize, position: Vec2, radius: f32, strength: f32) -> Vec2 {
    let current = position.length();
    let direction = if current > MIN_DISTANCE {
        position / current
    } else {
        fallback_direction(index, index + 1)
    };
    direction * (radius - current) * strength
}

/// Spring along an edge toward `rest_length`; returns the delta for the source node.
pub(super) fn link_pull(source: Vec2, target: Vec2, rest_length: f32, strength: f32) -> Vec2 {
    let offset = target - source;
    let distance = offset.length();
    if distance <= MIN_DISTANCE {
        return Vec2::ZERO;
    }
    offset / distance * (distance - rest_length) * strength * 0.5
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> CollisionParams {
        CollisionParams {
            min_distance: 10.0,
            strength: 1.0,
        }
    }

    fn collide(positions: &[Vec2], fixed: &[bool]) -> Vec<Vec2> {
        let tree = Quadtree::build(positions).unwrap();
        let mut deltas = vec![Vec2::ZERO; positions.len()];
        accumulate_collisions(
            &tree,
            tree.root(),
            tree.root(),
            true,
            positions,
            fixed,
            params(),
            &mut deltas,
        );
        deltas
    }

    #[test]
    fn overlapping_pair_separates_along_axis() {
        let deltas = collide(&[vec2(0.0, 0.0), vec2(4.0, 0.0)], &[false, false]);
        assert!((deltas[0] - vec2(-3.0, 0.0)).length() < 1e-4);
        assert!((deltas[1] - vec2(3.0, 0.0)).length() < 1e-4);
    }

    #[test]
    fn fixed_node_pushes_the_other_the_whole_way() {
        let deltas = collide(&[vec2(0.0, 0.0), vec2(4.0, 0.0)], &[true, false]);
        assert_eq!(deltas[0], Vec2::ZERO);
        assert!((deltas[1] - vec2(6.0, 0.0)).length() < 1e-4);
    }

    #[test]
    fn distant_pairs_are_untouched() {
        let deltas = collide(&[vec2(0.0, 0.0), vec2(40.0, 0.0)], &[false, false]);
        assert!(deltas.iter().all(|delta| *delta == Vec2::ZERO));
    }

    #[test]
    fn collisions_found_across_many_cells() {
        let mut positions = (0..60)
            .map(|index| vec2(index as f32 * 30.0, 0.0))
            .collect::<Vec<_>>();
        positions.push(vec2(1.0, 0.0));
        let deltas = collide(&positions, &vec![false; positions.len()]);
        assert!(deltas[0].x < 0.0);
        assert!(deltas[60].x > 0.0);
        assert_eq!(deltas[1], Vec2::ZERO);
    }

    #[test]
    fn repulsion_matches_direct_sum_for_small_sets() {
        let positions = vec![vec2(0.0, 0.0), vec2(20.0, 0.0), vec2(0.0, 40.0)];
        let tree = Quadtree::build(&positions).unwrap();
        let params = RepulsionParams {
            strength: 10.0,
            max_distance_sq: f32::INFINITY,
            theta: 0.72,
        };
        let mut delta = Vec2::ZERO;
        accumulate_repulsion(&tree, tree.root(), 0, &positions, params, &mut delta);
        let expected = vec2(-10.0 / 20.0, -10.0 / 40.0);
        assert!((delta - expected).length() < 1e-4);
    }

    #[test]
    fn repulsion_ignores_sources_past_max_distance() {
        let positions = vec![vec2(0.0, 0.0), vec2(100.0, 0.0)];
        let tree = Quadtree::build(&positions).unwrap();
        let params = RepulsionParams {
            strength: 10.0,
            max_distance_sq: 50.0 * 50.0,
            theta: 0.72,
        };
        let mut delta = Vec2::ZERO;
        accumulate_repulsion(&tree, tree.root(), 0, &positions, params, &mut delta);
        assert_eq!(delta, Vec2::ZERO);
    }

    #[test]
    fn radial_pull_ignores_angle() {
        let pull = radial_pull(0, vec2(30.0, 40.0), 100.0, 0.5);
        assert!((pull - vec2(0.6, 0.8) * 25.0).length() < 1e-4);
    }
}
