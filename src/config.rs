use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub margin: f32,
    pub unassigned_ring_offset: f32,
    pub jitter_radius: f32,
    pub zoomed_seed_radius: f32,
    /// Fraction of the outer radius used when difficulty rings are hidden.
    pub shared_ring_fraction: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            margin: 40.0,
            unassigned_ring_offset: 36.0,
            jitter_radius: 10.0,
            zoomed_seed_radius: 24.0,
            shared_ring_fraction: 0.6,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForceConfig {
    pub repulsion_strength: f32,
    pub repulsion_max_distance: f32,
    pub mobile_breakpoint: f32,
    pub mobile_repulsion_factor: f32,
    pub collision_radius: f32,
    pub collision_strength: f32,
    pub position_strength: f32,
    pub zoomed_radial_strength: f32,
    pub ring_strength: f32,
    pub link_strength: f32,
    pub link_distance: f32,
    pub velocity_decay: f32,
    pub alpha_min: f32,
    pub alpha_decay: f32,
    pub drag_alpha_target: f32,
}

impl Default for ForceConfig {
    fn default() -> Self {
        Self {
            repulsion_strength: 30.0,
            repulsion_max_distance: 220.0,
            mobile_breakpoint: 600.0,
            mobile_repulsion_factor: 0.5,
            collision_radius: 12.0,
            collision_strength: 0.7,
            position_strength: 0.1,
            zoomed_radial_strength: 0.5,
            ring_strength: 0.3,
            link_strength: 0.0,
            link_distance: 60.0,
            velocity_decay: 0.4,
            alpha_min: 0.001,
            alpha_decay: 1.0 - 0.001_f32.powf(1.0 / 300.0),
            drag_alpha_target: 0.3,
        }
    }
}

impl ForceConfig {
    pub(crate) fn sanitized(self) -> Self {
        Self {
            repulsion_strength: self.repulsion_strength.max(0.0),
            repulsion_max_distance: self.repulsion_max_distance.max(1.0),
            mobile_repulsion_factor: self.mobile_repulsion_factor.clamp(0.0, 1.0),
            collision_radius: self.collision_radius.max(0.0),
            collision_strength: self.collision_strength.clamp(0.0, 1.0),
            position_strength: self.position_strength.clamp(0.0, 1.0),
            zoomed_radial_strength: self.zoomed_radial_strength.clamp(0.0, 1.0),
            ring_strength: self.ring_strength.clamp(0.0, 1.0),
            link_strength: self.link_strength.clamp(0.0, 1.0),
            velocity_decay: self.velocity_decay.clamp(0.0, 1.0),
            alpha_min: self.alpha_min.max(0.0),
            alpha_decay: self.alpha_decay.clamp(0.0, 1.0),
            drag_alpha_target: self.drag_alpha_target.clamp(0.0, 1.0),
            ..self
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    pub tap_threshold: f32,
    pub min_scale: f32,
    pub max_scale: f32,
    pub wheel_zoom_sensitivity: f32,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            tap_threshold: 5.0,
            min_scale: 0.5,
            max_scale: 3.0,
            wheel_zoom_sensitivity: 0.0018,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub layout: LayoutConfig,
    pub forces: ForceConfig,
    pub gesture: GestureConfig,
    pub node_radius: f32,
    pub hit_radius_factor: f32,
    /// Fixed jitter seed; `None` seeds from OS entropy.
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            layout: LayoutConfig::default(),
            forces: ForceConfig::default(),
            gesture: GestureConfig::default(),
            node_radius: 8.0,
            hit_radius_factor: 3.0,
            seed: None,
        }
    }
}

impl EngineConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read engine config {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse engine config {}", path.display()))
    }

    pub fn hit_radius(&self) -> f32 {
        self.node_radius * self.hit_radius_factor
    }
}
