//! Iterative force layout over an arena of [`SimulationNode`]s.
//!
//! Nodes are addressed by their index in the arena for the lifetime of one
//! layout pass. Every tick copies positions out into a fresh
//! [`PositionSnapshot`]; published snapshots are never mutated.

mod forces;
mod quadtree;

use std::sync::Arc;

use eframe::egui::Vec2;
use log::debug;

use crate::config::ForceConfig;
use crate::layout::{LayoutMode, Seed};
use crate::model::{Category, NodeId};
use forces::{
    CollisionParams, RepulsionParams, accumulate_collisions, accumulate_repulsion, link_pull,
    positional_pull, radial_pull,
};
use quadtree::Quadtree;

const BARNES_HUT_THETA: f32 = 0.72;
const MAX_SPEED: f32 = 48.0;

#[derive(Clone, Debug, PartialEq)]
pub struct SimulationNode {
    pub id: NodeId,
    pub category: Category,
    pub position: Vec2,
    pub velocity: Vec2,
    /// While set, forces never move this node.
    pub fixed_position: Option<Vec2>,
    pub target_position: Option<Vec2>,
    pub target_radius: Option<f32>,
}

impl SimulationNode {
    pub fn new(id: NodeId, category: Category, position: Vec2) -> Self {
        Self {
            id,
            category,
            position,
            velocity: Vec2::ZERO,
            fixed_position: None,
            target_position: None,
            target_radius: None,
        }
    }

    pub fn with_target_position(mut self, target: Vec2) -> Self {
        self.target_position = Some(target);
        self
    }

    pub fn with_target_radius(mut self, radius: f32) -> Self {
        self.target_radius = Some(radius);
        self
    }
}

#[derive(Clone, Debug)]
pub struct PositionSnapshot {
    pub revision: u64,
    pub alpha: f32,
    pub ids: Arc<[NodeId]>,
    pub categories: Arc<[Category]>,
    pub edges: Arc<[(usize, usize)]>,
    pub positions: Vec<Vec2>,
    pub fixed: Vec<bool>,
}

impl PositionSnapshot {
    pub fn empty() -> Self {
        Self {
            revision: 0,
            alpha: 0.0,
            ids: Arc::from(Vec::new()),
            categories: Arc::from(Vec::new()),
            edges: Arc::from(Vec::new()),
            positions: Vec::new(),
            fixed: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.ids.iter().position(|candidate| candidate == id)
    }

    pub fn position_of(&self, id: &str) -> Option<Vec2> {
        self.index_of(id).map(|index| self.positions[index])
    }
}

#[derive(Default)]
struct Scratch {
    positions: Vec<Vec2>,
    fixed: Vec<bool>,
    deltas: Vec<Vec2>,
}

pub struct Simulation {
    config: ForceConfig,
    nodes: Vec<SimulationNode>,
    ids: Arc<[NodeId]>,
    categories: Arc<[Category]>,
    edges: Arc<[(usize, usize)]>,
    mode: LayoutMode,
    repulsion_scale: f32,
    alpha: f32,
    alpha_target: f32,
    revision: u64,
    ticks_since_start: u64,
    scratch: Scratch,
    latest: Arc<PositionSnapshot>,
}

impl Simulation {
    pub fn new(config: ForceConfig) -> Self {
        Self {
            config: config.sanitized(),
            nodes: Vec::new(),
            ids: Arc::from(Vec::new()),
            categories: Arc::from(Vec::new()),
            edges: Arc::from(Vec::new()),
            mode: LayoutMode::Overview,
            repulsion_scale: 1.0,
            alpha: 0.0,
            alpha_target: 0.0,
            revision: 0,
            ticks_since_start: 0,
            scratch: Scratch::default(),
            latest: Arc::new(PositionSnapshot::empty()),
        }
    }

    pub fn config(&self) -> &ForceConfig {
        &self.config
    }

    /// Replaces every node with the seeded set and restarts at full energy.
    pub fn start(&mut self, seed: Seed) -> Arc<PositionSnapshot> {
        self.repulsion_scale = if seed.viewport.min_elem() < self.config.mobile_breakpoint {
            self.config.mobile_repulsion_factor
        } else {
            1.0
        };
        self.ids = seed.nodes.iter().map(|node| node.id.clone()).collect();
        self.categories = seed.nodes.iter().map(|node| node.category.clone()).collect();
        self.edges = Arc::from(seed.edges);
        self.nodes = seed.nodes;
        self.mode = seed.mode;
        self.alpha_target = 0.0;
        self.alpha = if self.nodes.is_empty() { 0.0 } else { 1.0 };
        self.ticks_since_start = 0;
        debug!(
            "simulation started: {} nodes, {} edges, mode {:?}, repulsion x{}",
            self.nodes.len(),
            self.edges.len(),
            self.mode,
            self.repulsion_scale
        );
        self.publish()
    }

    /// Drops to zero energy and releases every pinned node.
    pub fn stop(&mut self) {
        self.alpha = 0.0;
        self.alpha_target = 0.0;
        let mut released = false;
        for node in &mut self.nodes {
            released |= node.fixed_position.take().is_some();
            node.velocity = Vec2::ZERO;
        }
        if released {
            self.publish();
        }
        debug!("simulation stopped");
    }

    pub fn reset(&mut self) {
        self.stop();
        self.nodes.clear();
        self.ids = Arc::from(Vec::new());
        self.categories = Arc::from(Vec::new());
        self.edges = Arc::from(Vec::new());
        self.publish();
    }

    pub fn is_running(&self) -> bool {
        !self.nodes.is_empty()
            && (self.alpha >= self.config.alpha_min || self.alpha_target > 0.0)
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn mode(&self) -> LayoutMode {
        self.mode
    }

    pub fn nodes(&self) -> &[SimulationNode] {
        &self.nodes
    }

    pub fn latest_snapshot(&self) -> Arc<PositionSnapshot> {
        Arc::clone(&self.latest)
    }

    /// Keeps the rest of the graph reacting by holding energy at `target`.
    pub fn reheat(&mut self, target: f32) {
        self.alpha_target = target.clamp(0.0, 1.0);
        self.alpha = self.alpha.max(self.alpha_target);
    }

    /// Lets energy decay toward zero so the simulation can go idle.
    pub fn cool(&mut self) {
        self.alpha_target = 0.0;
    }

    pub fn fix(&mut self, index: usize, position: Vec2) -> bool {
        let Some(node) = self.nodes.get_mut(index) else {
            return false;
        };
        if !position.is_finite() {
            return false;
        }
        node.fixed_position = Some(position);
        node.position = position;
        node.velocity = Vec2::ZERO;
        true
    }

    pub fn release(&mut self, index: usize) -> bool {
        self.nodes
            .get_mut(index)
            .is_some_and(|node| node.fixed_position.take().is_some())
    }

    /// Advances one integration step; `None` once the simulation is idle.
    pub fn tick(&mut self) -> Option<Arc<PositionSnapshot>> {
        if !self.is_running() {
            return None;
        }

        self.alpha += (self.alpha_target - self.alpha) * self.config.alpha_decay;
        self.step();
        self.ticks_since_start += 1;

        if !self.is_running() {
            debug!(
                "simulation idle after {} ticks since start",
                self.ticks_since_start
            );
        }
        Some(self.publish())
    }

    /// Ticks until idle or `max_ticks`, returning the number of ticks run.
    pub fn run_until_idle(&mut self, max_ticks: usize) -> usize {
        let mut ticks = 0;
        while ticks < max_ticks && self.tick().is_some() {
            ticks += 1;
        }
        ticks
    }

    fn publish(&mut self) -> Arc<PositionSnapshot> {
        self.revision = self.revision.wrapping_add(1);
        let snapshot = Arc::new(PositionSnapshot {
            revision: self.revision,
            alpha: self.alpha,
            ids: Arc::clone(&self.ids),
            categories: Arc::clone(&self.categories),
            edges: Arc::clone(&self.edges),
            positions: self.nodes.iter().map(|node| node.position).collect(),
            fixed: self
                .nodes
                .iter()
                .map(|node| node.fixed_position.is_some())
                .collect(),
        });
        self.latest = Arc::clone(&snapshot);
        snapshot
    }

    fn step(&mut self) {
        let node_count = self.nodes.len();
        let config = self.config;
        let alpha = self.alpha;

        let scratch = &mut self.scratch;
        scratch.positions.clear();
        scratch.fixed.clear();
        scratch.deltas.clear();
        scratch.deltas.resize(node_count, Vec2::ZERO);
        for node in &self.nodes {
            scratch
                .positions
                .push(node.fixed_position.unwrap_or(node.position));
            scratch.fixed.push(node.fixed_position.is_some());
        }

        let positions = &scratch.positions;
        let fixed = &scratch.fixed;
        let deltas = &mut scratch.deltas;

        if node_count >= 2
            && let Some(tree) = Quadtree::build(positions)
        {
            let repulsion = RepulsionParams {
                strength: config.repulsion_strength * self.repulsion_scale * alpha,
                max_distance_sq: config.repulsion_max_distance * config.repulsion_max_distance,
                theta: BARNES_HUT_THETA,
            };
            if repulsion.strength > 0.0 {
                for (index, delta) in deltas.iter_mut().enumerate() {
                    if fixed[index] || !positions[index].is_finite() {
                        continue;
                    }
                    accumulate_repulsion(&tree, tree.root(), index, positions, repulsion, delta);
                }
            }

            let collision = CollisionParams {
                min_distance: config.collision_radius * 2.0,
                strength: config.collision_strength,
            };
            if collision.min_distance > 0.0 && collision.strength > 0.0 {
                accumulate_collisions(
                    &tree,
                    tree.root(),
                    tree.root(),
                    true,
                    positions,
                    fixed,
                    collision,
                    deltas,
                );
            }
        }

        if config.link_strength > 0.0 {
            let strength = config.link_strength * alpha;
            for &(source, target) in self.edges.iter() {
                if source >= node_count || target >= node_count || source == target {
                    continue;
                }
                let pull = link_pull(
                    positions[source],
                    positions[target],
                    config.link_distance,
                    strength,
                );
                deltas[source] += pull;
                deltas[target] -= pull;
            }
        }

        for (index, node) in self.nodes.iter().enumerate() {
            if let Some(target) = node.target_position {
                deltas[index] +=
                    positional_pull(positions[index], target, config.position_strength * alpha);
            }
            if let Some(radius) = node.target_radius {
                let strength = match node.category {
                    Category::Unassigned => config.ring_strength,
                    Category::Tag(_) => config.zoomed_radial_strength,
                };
                deltas[index] += radial_pull(index, positions[index], radius, strength * alpha);
            }
        }

        let retain = 1.0 - config.velocity_decay;
        for (node, delta) in self.nodes.iter_mut().zip(deltas.iter()) {
            if let Some(pinned) = node.fixed_position {
                node.position = pinned;
                node.velocity = Vec2::ZERO;
                continue;
            }

            let mut velocity = (node.velocity + *delta) * retain;
            let speed = velocity.length();
            if speed > MAX_SPEED {
                velocity *= MAX_SPEED / speed;
            }
            if !velocity.is_finite() {
                velocity = Vec2::ZERO;
            }
            node.velocity = velocity;
            node.position += velocity;

            if !node.position.is_finite() {
                node.position = node.target_position.unwrap_or(Vec2::ZERO);
                node.velocity = Vec2::ZERO;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::vec2;

    use super::*;

    fn seed_of(nodes: Vec<SimulationNode>, edges: Vec<(usize, usize)>) -> Seed {
        Seed {
            nodes,
            edges,
            scale: crate::scale::PolarScale::for_viewport(
                vec2(1000.0, 1000.0),
                40.0,
                ["A"],
                3,
            ),
            mode: LayoutMode::Overview,
            viewport: vec2(1000.0, 1000.0),
        }
    }

    fn free(id: &str, position: Vec2) -> SimulationNode {
        SimulationNode::new(id.to_owned(), Category::Tag("A".to_owned()), position)
    }

    #[test]
    fn empty_simulation_never_ticks() {
        let mut simulation = Simulation::new(ForceConfig::default());
        let snapshot = simulation.start(seed_of(Vec::new(), Vec::new()));
        assert!(snapshot.is_empty());
        assert!(!simulation.is_running());
        assert!(simulation.tick().is_none());
    }

    #[test]
    fn target_attraction_converges() {
        let target = vec2(120.0, -40.0);
        let mut simulation = Simulation::new(ForceConfig::default());
        simulation.start(seed_of(
            vec![free("a", vec2(128.0, -34.0)).with_target_position(target)],
            Vec::new(),
        ));
        let ticks = simulation.run_until_idle(2_000);
        assert!(ticks > 0 && ticks < 2_000);
        let position = simulation.latest_snapshot().positions[0];
        assert!((position - target).length() < 0.5);
    }

    #[test]
    fn radial_spring_reaches_ring_at_any_angle() {
        let mut simulation = Simulation::new(ForceConfig::default());
        simulation.start(seed_of(
            vec![free("a", vec2(5.0, 5.0)).with_target_radius(90.0)],
            Vec::new(),
        ));
        simulation.run_until_idle(2_000);
        let radius = simulation.latest_snapshot().positions[0].length();
        assert!((radius - 90.0).abs() < 1.0);
    }

    #[test]
    fn stacked_nodes_are_pushed_apart() {
        let target = vec2(0.0, -100.0);
        let nodes = (0..4)
            .map(|index| {
                free(&format!("n{index}"), target + vec2(index as f32 * 0.5, 0.0))
                    .with_target_position(target)
            })
            .collect();
        let mut simulation = Simulation::new(ForceConfig::default());
        simulation.start(seed_of(nodes, Vec::new()));
        simulation.run_until_idle(5_000);

        let positions = &simulation.latest_snapshot().positions;
        let radius = ForceConfig::default().collision_radius;
        for i in 0..positions.len() {
            for j in (i + 1)..positions.len() {
                assert!((positions[i] - positions[j]).length() >= radius);
            }
        }
    }

    #[test]
    fn fixed_node_does_not_move_but_still_repels() {
        let mut simulation = Simulation::new(ForceConfig::default());
        simulation.start(seed_of(
            vec![free("pinned", vec2(0.0, 0.0)), free("other", vec2(3.0, 0.0))],
            Vec::new(),
        ));
        assert!(simulation.fix(0, vec2(0.0, 0.0)));
        for _ in 0..20 {
            simulation.tick();
        }
        let snapshot = simulation.latest_snapshot();
        assert_eq!(snapshot.positions[0], vec2(0.0, 0.0));
        assert!(snapshot.fixed[0]);
        assert!(snapshot.positions[1].x > 3.0);
    }

    #[test]
    fn drag_energy_holds_until_cooled() {
        let mut simulation = Simulation::new(ForceConfig::default());
        simulation.start(seed_of(vec![free("a", vec2(0.0, 0.0))], Vec::new()));
        simulation.run_until_idle(5_000);
        assert!(!simulation.is_running());

        simulation.reheat(0.3);
        for _ in 0..2_000 {
            simulation.tick();
        }
        assert!(simulation.is_running());
        assert!((simulation.alpha() - 0.3).abs() < 1e-3);

        simulation.cool();
        let ticks = simulation.run_until_idle(5_000);
        assert!(ticks > 0 && ticks < 5_000);
        assert!(!simulation.is_running());
    }

    #[test]
    fn stop_releases_pins_and_halts() {
        let mut simulation = Simulation::new(ForceConfig::default());
        simulation.start(seed_of(vec![free("a", vec2(0.0, 0.0))], Vec::new()));
        simulation.fix(0, vec2(10.0, 10.0));
        simulation.reheat(0.3);
        simulation.stop();
        assert!(!simulation.is_running());
        assert!(simulation.nodes()[0].fixed_position.is_none());
        assert!(!simulation.latest_snapshot().fixed[0]);
    }

    #[test]
    fn snapshots_are_independent_copies() {
        let mut simulation = Simulation::new(ForceConfig::default());
        let first = simulation.start(seed_of(
            vec![free("a", vec2(0.0, 0.0)).with_target_position(vec2(50.0, 0.0))],
            Vec::new(),
        ));
        let second = simulation.tick().unwrap();
        assert_eq!(first.positions[0], vec2(0.0, 0.0));
        assert_ne!(second.positions[0], first.positions[0]);
        assert!(second.revision > first.revision);
    }

    #[test]
    fn zero_strength_links_do_not_pull() {
        let mut simulation = Simulation::new(ForceConfig {
            repulsion_strength: 0.0,
            ..ForceConfig::default()
        });
        simulation.start(seed_of(
            vec![free("a", vec2(0.0, 0.0)), free("b", vec2(200.0, 0.0))],
            vec![(0, 1)],
        ));
        simulation.run_until_idle(100);
        let snapshot = simulation.latest_snapshot();
        assert_eq!(snapshot.positions[1] - snapshot.positions[0], vec2(200.0, 0.0));
        assert_eq!(&*snapshot.edges, &[(0, 1)]);
    }

    #[test]
    fn positive_link_strength_shortens_edges() {
        let mut simulation = Simulation::new(ForceConfig {
            repulsion_strength: 0.0,
            link_strength: 0.5,
            ..ForceConfig::default()
        });
        simulation.start(seed_of(
            vec![free("a", vec2(0.0, 0.0)), free("b", vec2(200.0, 0.0))],
            vec![(0, 1)],
        ));
        simulation.run_until_idle(1_000);
        let snapshot = simulation.latest_snapshot();
        assert!((snapshot.positions[1] - snapshot.positions[0]).length() < 150.0);
    }
}
