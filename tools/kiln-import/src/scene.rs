//! Scene assembly (foreign node tree -> .scene)
//!
//! Three passes over the foreign tree, all visiting children in source
//! order:
//!
//! 1. Instantiate (pre-order): one entity per node, a mesh entity when the
//!    node instances meshes. Ids come from the session counter. The parent
//!    node of each entity is recorded alongside it.
//! 2. Hierarchy (pre-order): wire every entity under its recorded parent.
//!    The root stays unparented.
//! 3. Transform (post-order): decompose each node's local matrix onto its
//!    entity, children before their parent.

use anyhow::Result;

use kiln_common::{AssetDocument, EntityId, EntityRecord, SceneAsset, Transform};

use crate::foreign::{ForeignScene, NodeId};
use crate::mesh::export_node_meshes;
use crate::naming::{scene_path, source_stem};
use crate::session::ImportSession;

/// Entity created in the instantiate pass
struct Instance {
    node: NodeId,
    parent: Option<NodeId>,
    record: EntityRecord,
}

/// Children-first walk of the whole tree, children in source order
fn postorder(scene: &ForeignScene) -> Vec<NodeId> {
    let mut order = Vec::with_capacity(scene.node_count());
    // (node, children already pushed)
    let mut stack = vec![(scene.root(), false)];
    while let Some((node, expanded)) = stack.pop() {
        if expanded {
            order.push(node);
        } else {
            stack.push((node, true));
            stack.extend(scene.children(node).iter().rev().map(|&c| (c, false)));
        }
    }
    order
}

/// Build the entity tree, writing each node's mesh asset on the way
pub fn assemble_scene(scene: &ForeignScene, session: &mut ImportSession) -> Result<SceneAsset> {
    // Pass 1: instantiate
    let mut instances: Vec<Instance> = Vec::with_capacity(scene.node_count());
    let mut slot_of: Vec<Option<usize>> = vec![None; scene.node_count()];
    for node in scene.preorder() {
        let mesh = export_node_meshes(scene, node, session)?;
        let mut record = EntityRecord::new(session.next_entity_id(), scene.node(node).name.clone());
        record.mesh = mesh;

        slot_of[node] = Some(instances.len());
        instances.push(Instance {
            node,
            parent: scene.parent(node),
            record,
        });
    }

    // Pass 2: hierarchy
    for slot in 0..instances.len() {
        let Some(parent_slot) = instances[slot].parent.and_then(|p| slot_of[p]) else {
            continue;
        };
        let child_id: EntityId = instances[slot].record.id;
        let parent_id: EntityId = instances[parent_slot].record.id;
        instances[slot].record.parent = Some(parent_id);
        instances[slot].record.inherit_scale = true;
        instances[parent_slot].record.children.push(child_id);
    }

    // Pass 3: transforms, children first
    for node in postorder(scene) {
        if let Some(slot) = slot_of[node] {
            debug_assert_eq!(instances[slot].node, node);
            instances[slot].record.transform = Transform::from_matrix(&scene.node(node).transform);
        }
    }

    let mut asset = SceneAsset::new(source_stem(session.source()));
    asset.entities = instances.into_iter().map(|i| i.record).collect();
    Ok(asset)
}

/// Write every mesh asset and the scene file of the current source
pub fn import_scene_and_meshes(scene: &ForeignScene, session: &mut ImportSession) -> Result<()> {
    let path = scene_path(session.dest(), session.source());
    session.record_used(&path);

    let asset = assemble_scene(scene, session)?;
    asset.save(&path)?;

    tracing::info!(
        "Exported scene '{}': {} entities, {} with meshes",
        asset.name,
        asset.entities.len(),
        asset.mesh_entities().count()
    );
    Ok(())
}
