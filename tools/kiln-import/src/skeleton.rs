//! Skeleton reconstruction (bone influences -> .skeleton)
//!
//! Bones are scattered across meshes as (name, weights, offset) records. The
//! skeleton is rebuilt from the foreign node tree:
//!
//! 1. For every bone of every mesh, register the bone's node and its
//!    ancestors up to (not including) the mesh node or the mesh node's
//!    parent, then every descendant of the bone node except the mesh node's
//!    subtree. Helper nodes between bones stay in, so the hierarchy is
//!    connected.
//! 2. Assign indices in one pre-order walk from the scene root. Nodes not in
//!    the table are passed through.
//! 3. Emit one bone per indexed node, parented to the nearest indexed
//!    ancestor, then fill in local and inverse bind transforms.

use anyhow::Result;
use glam::Mat4;
use hashbrown::HashMap;

use kiln_common::{AssetDocument, BoneRecord, KILN_ASSET_FORMAT, SkeletonAsset, Transform};

use crate::error::ImportError;
use crate::foreign::{ForeignBone, ForeignScene, NodeId};
use crate::naming::{skeleton_path, source_stem};
use crate::session::ImportSession;

/// A bone record inside a foreign mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoneRef {
    pub mesh: usize,
    /// Index into the mesh's bone list
    pub bone: usize,
}

/// A foreign node taking part in the skeleton
#[derive(Debug, Clone, PartialEq)]
pub struct BoneNode {
    pub node: NodeId,
    /// Bone record whose name matches this node, if any
    pub bone: Option<BoneRef>,
    /// Assigned in pre-order; `None` until [`assign_indices`] runs
    pub index: Option<u32>,
}

/// Node name -> [`BoneNode`]
#[derive(Debug, Clone, Default)]
pub struct SkeletonTable {
    nodes: HashMap<String, BoneNode>,
}

impl SkeletonTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `node`. Re-registering keeps the node's existing bone
    /// reference unless a matching one is supplied.
    pub fn register(&mut self, scene: &ForeignScene, node: NodeId, bone: Option<(BoneRef, &str)>) {
        let name = &scene.node(node).name;
        let matching = bone
            .filter(|(_, bone_name)| *bone_name == name.as_str())
            .map(|(r, _)| r);
        let entry = self.nodes.entry(name.clone()).or_insert(BoneNode {
            node,
            bone: None,
            index: None,
        });
        if matching.is_some() {
            entry.bone = matching;
        }
    }

    pub fn get(&self, name: &str) -> Option<&BoneNode> {
        self.nodes.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    /// Bone index of a registered node
    pub fn index_of(&self, name: &str) -> Option<u32> {
        self.nodes.get(name).and_then(|n| n.index)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Table entry for `node`, if this exact node was registered under its name
    fn entry_for(&self, scene: &ForeignScene, node: NodeId) -> Option<&BoneNode> {
        self.nodes
            .get(&scene.node(node).name)
            .filter(|entry| entry.node == node)
    }
}

/// Register every node needed to connect the bones of all meshes
pub fn collect_bone_nodes(scene: &ForeignScene) -> Result<SkeletonTable, ImportError> {
    let mut table = SkeletonTable::new();

    for (mesh_index, mesh) in scene.meshes().iter().enumerate() {
        let mesh_node = scene.mesh_owner(mesh_index);
        let mesh_parent = mesh_node.and_then(|n| scene.parent(n));

        for (bone_index, bone) in mesh.bones.iter().enumerate() {
            let bone_node = scene
                .find_node(&bone.name)
                .ok_or_else(|| ImportError::MissingBoneNode {
                    mesh: mesh.name.clone(),
                    bone: bone.name.clone(),
                })?;
            let bone_ref = Some((
                BoneRef {
                    mesh: mesh_index,
                    bone: bone_index,
                },
                bone.name.as_str(),
            ));

            // Up to the mesh node or its parent
            let mut cursor = Some(bone_node);
            while let Some(node) = cursor {
                if Some(node) == mesh_node || Some(node) == mesh_parent {
                    break;
                }
                table.register(scene, node, bone_ref);
                cursor = scene.parent(node);
            }

            // Down through every descendant, stopping at the mesh node
            let mut stack = vec![bone_node];
            while let Some(node) = stack.pop() {
                if Some(node) == mesh_node {
                    continue;
                }
                table.register(scene, node, bone_ref);
                stack.extend(scene.children(node).iter().rev());
            }
        }
    }

    // Every bone record names its own node; attach the ones the walks
    // reached only through other bones
    for (mesh_index, mesh) in scene.meshes().iter().enumerate() {
        for (bone_index, bone) in mesh.bones.iter().enumerate() {
            if let Some(entry) = table.nodes.get_mut(&bone.name) {
                entry.bone.get_or_insert(BoneRef {
                    mesh: mesh_index,
                    bone: bone_index,
                });
            }
        }
    }

    Ok(table)
}

/// Number the registered nodes in pre-order from the scene root
pub fn assign_indices(scene: &ForeignScene, table: &mut SkeletonTable) {
    let mut next = 0u32;
    for node in scene.preorder() {
        let name = &scene.node(node).name;
        if let Some(entry) = table.nodes.get_mut(name) {
            if entry.node == node && entry.index.is_none() {
                entry.index = Some(next);
                next += 1;
            }
        }
    }
}

fn foreign_bone<'a>(scene: &'a ForeignScene, bone: BoneRef) -> &'a ForeignBone {
    &scene.mesh(bone.mesh).bones[bone.bone]
}

/// Emit the skeleton asset for an indexed table
pub fn build_skeleton(scene: &ForeignScene, table: &SkeletonTable, name: &str) -> SkeletonAsset {
    let mut skeleton = SkeletonAsset::new(name);

    // Hierarchy: (node, nearest bone ancestor)
    let mut stack: Vec<(NodeId, Option<u32>)> = vec![(scene.root(), None)];
    while let Some((node, parent_bone)) = stack.pop() {
        let mut bone = parent_bone;
        if let Some(index) = table.entry_for(scene, node).and_then(|e| e.index) {
            skeleton.bones.push(BoneRecord::new(
                scene.node(node).name.clone(),
                index,
                parent_bone,
            ));
            bone = Some(index);
        }
        stack.extend(scene.children(node).iter().rev().map(|&c| (c, bone)));
    }

    // Transforms: local pose from the node, inverse bind from the bone offset
    for record in &mut skeleton.bones {
        let Some(entry) = table.get(&record.name) else {
            continue;
        };
        record.transform = Transform::from_matrix(&scene.node(entry.node).transform);
        if let Some(bone) = entry.bone {
            let offset: Mat4 = foreign_bone(scene, bone).offset;
            record.inverse_bind = Transform::from_matrix(&offset).to_matrix().to_cols_array();
        }
    }

    skeleton
}

/// Skeleton imported for the current source
#[derive(Debug, Clone)]
pub struct ImportedSkeleton {
    /// File name under the destination directory
    pub file_name: String,
    pub asset: SkeletonAsset,
    pub table: SkeletonTable,
}

impl ImportedSkeleton {
    pub fn bone_index(&self, name: &str) -> Option<u32> {
        self.table.index_of(name)
    }
}

/// Reconstruct and write the skeleton of the current source, if it has bones
pub fn import_skeleton(scene: &ForeignScene, session: &mut ImportSession) -> Result<()> {
    let mut table = collect_bone_nodes(scene)?;
    if table.is_empty() {
        tracing::debug!("No bones in {:?}, skipping skeleton", session.source());
        return Ok(());
    }
    assign_indices(scene, &mut table);

    let stem = source_stem(session.source());
    let asset = build_skeleton(scene, &table, &stem);
    let path = skeleton_path(session.dest(), session.source());
    asset.save(&path)?;
    session.record_used(&path);

    tracing::info!(
        "Exported skeleton '{}': {} bones",
        stem,
        asset.bone_count()
    );

    session.set_skeleton(ImportedSkeleton {
        file_name: KILN_ASSET_FORMAT.file_name(&stem, KILN_ASSET_FORMAT.skeleton_ext),
        asset,
        table,
    });
    Ok(())
}
