//! Vocabulary Cache
//!
//! Lowercased group and scene names mapped to bridge ids. Built as a whole
//! from a fresh bridge listing; never patched in place.

use crate::bridge::{GroupInfo, SceneInfo};
use crate::utils::fuzzy;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Vocabulary {
    groups: BTreeMap<String, u32>,
    /// Owning group (`None` = global) -> scene name -> scene id
    scenes: BTreeMap<Option<u32>, BTreeMap<String, String>>,
}

impl Vocabulary {
    /// Index a bridge listing of groups and scenes
    pub fn build(
        groups: &HashMap<String, GroupInfo>,
        scenes: &HashMap<String, SceneInfo>,
    ) -> Self {
        let mut vocab = Self::default();

        for (id, group) in groups {
            match id.parse::<u32>() {
                Ok(group_id) => {
                    vocab.groups.insert(group.name.to_lowercase(), group_id);
                }
                Err(_) => warn!("⚠️ Skipping group with non-numeric id '{}'", id),
            }
        }

        for (id, scene) in scenes {
            vocab
                .scenes
                .entry(scene.group_id())
                .or_default()
                .insert(scene.name.to_lowercase(), id.clone());
        }

        debug!(
            "Vocabulary built: {} groups, {} scenes",
            vocab.groups.len(),
            vocab.scene_count()
        );
        vocab
    }

    pub fn groups(&self) -> &BTreeMap<String, u32> {
        &self.groups
    }

    pub fn scene_count(&self) -> usize {
        self.scenes.values().map(BTreeMap::len).sum()
    }

    /// All names, for registering with a speech recognizer
    pub fn words(&self) -> Vec<String> {
        self.groups
            .keys()
            .chain(self.scenes.values().flat_map(BTreeMap::keys))
            .cloned()
            .collect()
    }

    /// Exact lookup by name or numeric id
    pub fn group_by_identifier(&self, identifier: &str) -> Option<u32> {
        if let Ok(id) = identifier.trim().parse::<u32>() {
            if id == 0 || self.groups.values().any(|g| *g == id) {
                return Some(id);
            }
        }
        self.groups.get(&identifier.trim().to_lowercase()).copied()
    }

    pub fn resolve_group(&self, name: &str) -> Option<u32> {
        fuzzy::resolve(&self.groups, name).copied()
    }

    /// Scenes owned by `group_id` win over global scenes of the same name
    pub fn resolve_scene(&self, group_id: u32, name: &str) -> Option<String> {
        self.scenes
            .get(&Some(group_id))
            .and_then(|scoped| fuzzy::resolve(scoped, name))
            .or_else(|| {
                self.scenes
                    .get(&None)
                    .and_then(|global| fuzzy::resolve(global, name))
            })
            .cloned()
    }
}
