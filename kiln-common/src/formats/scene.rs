//! Scene document (.scene)
//!
//! Flat list of entities. Hierarchy is expressed through `parent` / `children`
//! ids; mesh-bearing entities reference a mesh file.

use serde::{Deserialize, Serialize};

use super::AssetDocument;
use crate::math::Transform;

/// Identifier of an entity, unique within one scene document
pub type EntityId = u64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub id: EntityId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<EntityId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<EntityId>,
    /// Mesh file path (mesh entities only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mesh: Option<String>,
    pub transform: Transform,
    /// The parent's scale applies to this entity (set on parented entities)
    pub inherit_scale: bool,
}

impl EntityRecord {
    pub fn new(id: EntityId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            parent: None,
            children: Vec::new(),
            mesh: None,
            transform: Transform::IDENTITY,
            inherit_scale: false,
        }
    }

    pub fn is_mesh_entity(&self) -> bool {
        self.mesh.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneAsset {
    pub name: String,
    pub entities: Vec<EntityRecord>,
}

impl SceneAsset {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entities: Vec::new(),
        }
    }

    pub fn entity(&self, id: EntityId) -> Option<&EntityRecord> {
        self.entities.iter().find(|e| e.id == id)
    }

    pub fn entity_by_name(&self, name: &str) -> Option<&EntityRecord> {
        self.entities.iter().find(|e| e.name == name)
    }

    /// Entities without a parent
    pub fn roots(&self) -> impl Iterator<Item = &EntityRecord> {
        self.entities.iter().filter(|e| e.parent.is_none())
    }

    pub fn mesh_entities(&self) -> impl Iterator<Item = &EntityRecord> {
        self.entities.iter().filter(|e| e.is_mesh_entity())
    }
}

impl AssetDocument for SceneAsset {
    const KIND: &'static str = "scene";
}
