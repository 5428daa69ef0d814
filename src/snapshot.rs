use std::collections::HashSet;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::model::{SkillNode, Tag};

const DEMO_SNAPSHOT: &str = include_str!("../demos/skills.json");

/// The node and tag lists handed to the engine for one session.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillSnapshot {
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub nodes: Vec<SkillNode>,
}

impl SkillSnapshot {
    pub fn parse(raw: &str) -> Result<Self> {
        let snapshot: Self = serde_json::from_str(raw).context("invalid skill snapshot JSON")?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read skill snapshot {}", path.display()))?;
        let snapshot = Self::parse(&raw)
            .with_context(|| format!("failed to load skill snapshot {}", path.display()))?;
        debug!(
            "loaded {} nodes and {} tags from {}",
            snapshot.nodes.len(),
            snapshot.tags.len(),
            path.display()
        );
        Ok(snapshot)
    }

    /// The bundled sample used when no snapshot file is given.
    pub fn demo() -> Result<Self> {
        Self::parse(DEMO_SNAPSHOT).context("bundled demo snapshot is broken")
    }

    pub fn node(&self, id: &str) -> Option<&SkillNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn tag(&self, name: &str) -> Option<&Tag> {
        self.tags.iter().find(|tag| tag.name == name)
    }

    /// Ids and tag names are keys; duplicates would make clicks ambiguous.
    fn validate(&self) -> Result<()> {
        let mut tag_names = HashSet::new();
        for tag in &self.tags {
            if !tag_names.insert(tag.name.as_str()) {
                return Err(anyhow!("duplicate tag name {:?}", tag.name));
            }
        }

        let mut node_ids = HashSet::new();
        for node in &self.nodes {
            if !node_ids.insert(node.id.as_str()) {
                return Err(anyhow!("duplicate node id {:?}", node.id));
            }
        }

        let unknown_primary = self
            .nodes
            .iter()
            .filter_map(SkillNode::primary_tag)
            .filter(|tag| !tag_names.contains(tag))
            .count();
        if unknown_primary > 0 {
            warn!("{unknown_primary} nodes have a primary tag missing from the tag list");
        }
        Ok(())
    }
}
