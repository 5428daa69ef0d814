use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub type NodeId = String;

/// Visibility key for the ring of nodes without a primary tag.
pub const UNASSIGNED_KEY: &str = "__unassigned__";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    #[serde(alias = "Easy")]
    Easy,
    #[serde(alias = "Medium")]
    Medium,
    #[serde(alias = "Hard")]
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Self::Easy, Self::Medium, Self::Hard];

    pub fn rank(self) -> usize {
        match self {
            Self::Easy => 0,
            Self::Medium => 1,
            Self::Hard => 2,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Easy => "Easy",
            Self::Medium => "Medium",
            Self::Hard => "Hard",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SkillNode {
    pub id: NodeId,
    pub title: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub links: Vec<NodeId>,
}

impl SkillNode {
    /// The first tag drives sector placement; blank tags count as no tag.
    pub fn primary_tag(&self) -> Option<&str> {
        self.tags
            .first()
            .map(|tag| tag.trim())
            .filter(|tag| !tag.is_empty())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    #[serde(default = "default_tag_color")]
    pub color: String,
}

fn default_tag_color() -> String {
    "#8c8c8c".to_owned()
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Category {
    Tag(String),
    Unassigned,
}

impl Category {
    pub fn tag(&self) -> Option<&str> {
        match self {
            Self::Tag(name) => Some(name),
            Self::Unassigned => None,
        }
    }

    pub fn visibility_key(&self) -> &str {
        match self {
            Self::Tag(name) => name,
            Self::Unassigned => UNASSIGNED_KEY,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Focus {
    #[default]
    Overview,
    Category(String),
    Unassigned,
}

impl Focus {
    pub fn is_zoomed(&self) -> bool {
        !matches!(self, Self::Overview)
    }

    pub fn includes(&self, category: &Category) -> bool {
        match (self, category) {
            (Self::Overview, _) => true,
            (Self::Category(focused), Category::Tag(name)) => focused == name,
            (Self::Unassigned, Category::Unassigned) => true,
            _ => false,
        }
    }
}

/// Tag name to shown/hidden. Names missing from the map are shown.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Visibility {
    shown: HashMap<String, bool>,
}

impl Visibility {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, shown: bool) {
        self.shown.insert(key.into(), shown);
    }

    pub fn is_shown(&self, key: &str) -> bool {
        self.shown.get(key).copied().unwrap_or(true)
    }

    pub fn shows(&self, category: &Category) -> bool {
        self.is_shown(category.visibility_key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(tags: &[&str]) -> SkillNode {
        SkillNode {
            id: "n".to_owned(),
            title: "Node".to_owned(),
            tags: tags.iter().map(|tag| (*tag).to_owned()).collect(),
            difficulty: Difficulty::Easy,
            links: Vec::new(),
        }
    }

    #[test]
    fn primary_tag_is_first_non_blank() {
        assert_eq!(node(&["A", "B"]).primary_tag(), Some("A"));
        assert_eq!(node(&[]).primary_tag(), None);
        assert_eq!(node(&["  "]).primary_tag(), None);
    }

    #[test]
    fn focus_membership() {
        let tag_a = Category::Tag("A".to_owned());
        assert!(Focus::Overview.includes(&tag_a));
        assert!(Focus::Overview.includes(&Category::Unassigned));
        assert!(Focus::Category("A".to_owned()).includes(&tag_a));
        assert!(!Focus::Category("B".to_owned()).includes(&tag_a));
        assert!(!Focus::Unassigned.includes(&tag_a));
        assert!(Focus::Unassigned.includes(&Category::Unassigned));
    }

    #[test]
    fn visibility_defaults_to_shown() {
        let mut visibility = Visibility::new();
        assert!(visibility.is_shown("B"));
        visibility.set("B", false);
        assert!(!visibility.is_shown("B"));
        assert!(visibility.shows(&Category::Unassigned));
    }

    #[test]
    fn difficulty_accepts_both_spellings() {
        let parsed: Vec<Difficulty> = serde_json::from_str(r#"["easy", "Medium", "hard"]"#).unwrap();
        assert_eq!(parsed, Difficulty::ALL.to_vec());
    }
}
