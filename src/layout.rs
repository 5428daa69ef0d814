use std::collections::{HashMap, HashSet};
use std::f32::consts::TAU;

use eframe::egui::Vec2;
use log::{debug, trace};
use rand::Rng;

use crate::config::LayoutConfig;
use crate::model::{Category, Difficulty, Focus, NodeId, SkillNode, Tag, Visibility};
use crate::physics::SimulationNode;
use crate::scale::{PolarScale, polar_to_graph};

#[derive(Clone, Copy, Debug)]
pub struct LayoutInput<'a> {
    pub nodes: &'a [SkillNode],
    pub tags: &'a [Tag],
    pub viewport: Vec2,
    pub focus: &'a Focus,
    pub show_difficulty: bool,
    pub visibility: &'a Visibility,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayoutMode {
    Overview,
    Zoomed,
}

#[derive(Clone, Debug)]
pub struct Seed {
    pub nodes: Vec<SimulationNode>,
    pub edges: Vec<(usize, usize)>,
    pub scale: PolarScale,
    pub mode: LayoutMode,
    pub viewport: Vec2,
}

/// Angular bands cover visible tags only, in tag-list order.
pub fn polar_scale(input: &LayoutInput<'_>, config: &LayoutConfig) -> PolarScale {
    let visible = input
        .tags
        .iter()
        .filter(|tag| input.visibility.is_shown(&tag.name))
        .map(|tag| tag.name.clone());
    PolarScale::for_viewport(input.viewport, config.margin, visible, Difficulty::ALL.len())
}

/// A primary tag missing from the tag list counts as unassigned.
pub fn categorize(node: &SkillNode, known_tags: &HashSet<&str>) -> Category {
    match node.primary_tag() {
        Some(tag) if known_tags.contains(tag) => Category::Tag(tag.to_owned()),
        _ => Category::Unassigned,
    }
}

fn random_in_disk(rng: &mut impl Rng, radius: f32) -> Vec2 {
    if radius <= 0.0 {
        return Vec2::ZERO;
    }
    let angle = rng.gen_range(0.0..TAU);
    let distance = radius * rng.gen_range(0.0_f32..1.0).sqrt();
    Vec2::angled(angle) * distance
}

fn collect_edges(
    active: &[(&SkillNode, Category)],
    index_by_id: &HashMap<&str, usize>,
) -> Vec<(usize, usize)> {
    let mut edges = Vec::new();
    for (source_index, (node, _)) in active.iter().enumerate() {
        for target_id in &node.links {
            match index_by_id.get(target_id.as_str()) {
                Some(&target_index) if target_index != source_index => {
                    edges.push((source_index, target_index));
                }
                Some(_) => {}
                None => trace!("dropping link {} -> {target_id}: target not in layout", node.id),
            }
        }
    }
    edges.sort_unstable();
    edges.dedup();
    edges
}

/// Builds a fresh set of simulation nodes for one layout pass.
///
/// `carry_over` supplies start positions for nodes that already existed in a
/// previous pass of the same mode; targets are always recomputed.
pub fn seed_layout(
    input: &LayoutInput<'_>,
    config: &LayoutConfig,
    carry_over: &HashMap<NodeId, Vec2>,
    rng: &mut impl Rng,
) -> Seed {
    let scale = polar_scale(input, config);
    let known_tags = input
        .tags
        .iter()
        .map(|tag| tag.name.as_str())
        .collect::<HashSet<_>>();
    let mode = if input.focus.is_zoomed() {
        LayoutMode::Zoomed
    } else {
        LayoutMode::Overview
    };

    let active = input
        .nodes
        .iter()
        .map(|node| (node, categorize(node, &known_tags)))
        .filter(|(_, category)| {
            input.visibility.shows(category) && input.focus.includes(category)
        })
        .collect::<Vec<_>>();

    let ring_radius = scale.unassigned_radius(config.unassigned_ring_offset);
    let shared_radius = scale.outer_radius * config.shared_ring_fraction;
    let unassigned_total = active
        .iter()
        .filter(|(_, category)| *category == Category::Unassigned)
        .count();
    let mut unassigned_slot = 0usize;

    let mut nodes = Vec::with_capacity(active.len());
    for (node, category) in &active {
        let band = category.tag().and_then(|tag| scale.angular.band(tag));
        let mut sim_node = match band {
            Some(band) => {
                let radius = if input.show_difficulty {
                    scale
                        .radial
                        .band(node.difficulty.rank())
                        .map(|band| band.mid())
                        .unwrap_or(shared_radius)
                } else {
                    shared_radius
                };

                match mode {
                    LayoutMode::Overview => {
                        let target = polar_to_graph(band.mid(), radius);
                        SimulationNode::new(
                            node.id.clone(),
                            category.clone(),
                            target + random_in_disk(rng, config.jitter_radius),
                        )
                        .with_target_position(target)
                    }
                    LayoutMode::Zoomed => SimulationNode::new(
                        node.id.clone(),
                        category.clone(),
                        random_in_disk(rng, config.zoomed_seed_radius),
                    )
                    .with_target_radius(radius),
                }
            }
            None => {
                let angle = unassigned_slot as f32 / unassigned_total.max(1) as f32 * TAU;
                unassigned_slot += 1;
                SimulationNode::new(
                    node.id.clone(),
                    Category::Unassigned,
                    polar_to_graph(angle, ring_radius),
                )
                .with_target_radius(ring_radius)
            }
        };

        if let Some(&previous) = carry_over.get(&node.id) {
            sim_node.position = previous;
        }
        nodes.push(sim_node);
    }

    let index_by_id = active
        .iter()
        .enumerate()
        .rev()
        .map(|(index, (node, _))| (node.id.as_str(), index))
        .collect::<HashMap<_, _>>();
    let edges = collect_edges(&active, &index_by_id);

    debug!(
        "seeded {} of {} nodes ({} unassigned, {} edges, {} sectors, mode {:?})",
        nodes.len(),
        input.nodes.len(),
        unassigned_total,
        edges.len(),
        scale.angular.len(),
        mode
    );

    Seed {
        nodes,
        edges,
        scale,
        mode,
        viewport: input.viewport,
    }
}
