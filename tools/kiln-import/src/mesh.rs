//! Mesh conversion (foreign meshes -> .mesh / .skinMesh)
//!
//! One algorithm serves static and skinned meshes; passing a skeleton
//! binding turns on the influence gathering.

use anyhow::Result;
use smallvec::SmallVec;

use kiln_common::{AssetDocument, BONE_SLOTS, BoneInfluences, KILN_ASSET_FORMAT, MeshAsset, Vertex};

use crate::error::ImportError;
use crate::foreign::{ForeignMesh, ForeignScene, NodeId};
use crate::naming::{clear_forbidden, mesh_path};
use crate::session::ImportSession;
use crate::skeleton::ImportedSkeleton;

/// Influences of one vertex in encounter order
type Influences = SmallVec<[(u32, f32); BONE_SLOTS]>;

/// Skinning context for a mesh
#[derive(Debug, Clone, Copy)]
pub struct SkinBinding<'a> {
    pub skeleton: &'a ImportedSkeleton,
}

/// Gather per-vertex influences from the mesh's bone records.
///
/// Bones are visited in the mesh's bone order and weights in record order,
/// so slot order is encounter order. Returns the influence lists and the
/// number of vertices that had more than [`BONE_SLOTS`] influences.
fn gather_influences(
    mesh: &ForeignMesh,
    binding: SkinBinding<'_>,
) -> Result<(Vec<Influences>, usize), ImportError> {
    let mut influences: Vec<Influences> = vec![SmallVec::new(); mesh.vertex_count()];

    for bone in &mesh.bones {
        let index = binding
            .skeleton
            .bone_index(&bone.name)
            .ok_or_else(|| ImportError::MissingBoneNode {
                mesh: mesh.name.clone(),
                bone: bone.name.clone(),
            })?;
        for weight in &bone.weights {
            match influences.get_mut(weight.vertex as usize) {
                Some(list) => list.push((index, weight.weight)),
                None => tracing::warn!(
                    "Mesh '{}': bone '{}' weights vertex {} of {}, ignoring",
                    mesh.name,
                    bone.name,
                    weight.vertex,
                    mesh.vertex_count()
                ),
            }
        }
    }

    let overflow = influences.iter().filter(|l| l.len() > BONE_SLOTS).count();
    Ok((influences, overflow))
}

/// Flatten one foreign mesh into the engine vertex format
pub fn convert_mesh(
    mesh: &ForeignMesh,
    binding: Option<SkinBinding<'_>>,
    material: Option<&str>,
) -> Result<MeshAsset, ImportError> {
    if mesh.vertex_count() == 0 {
        return Err(ImportError::EmptyMesh {
            mesh: mesh.name.clone(),
        });
    }

    let binding = binding.filter(|_| mesh.has_bones());
    let influences = match binding {
        Some(binding) => {
            let (influences, overflow) = gather_influences(mesh, binding)?;
            if overflow > 0 {
                tracing::warn!(
                    "Mesh '{}': {} vertices have more than {} bone influences, extras dropped",
                    mesh.name,
                    overflow,
                    BONE_SLOTS
                );
            }
            Some(influences)
        }
        None => None,
    };

    let vertices = (0..mesh.vertex_count())
        .map(|i| Vertex {
            position: mesh.positions[i].to_array(),
            normal: attribute(&mesh.normals, i).map_or([0.0; 3], |n| n.to_array()),
            uv: attribute(&mesh.uvs, i).map_or([0.0; 2], |uv| uv.to_array()),
            bitangent: attribute(&mesh.bitangents, i).map_or([0.0; 3], |b| b.to_array()),
            skin: influences
                .as_ref()
                .map(|all| BoneInfluences::from_ordered(&all[i])),
        })
        .collect();

    let mut indices = Vec::with_capacity(mesh.faces.len() * 3);
    for (face_index, face) in mesh.faces.iter().enumerate() {
        if face.len() != 3 {
            return Err(ImportError::NonTriangularFace {
                mesh: mesh.name.clone(),
                face: face_index,
                corners: face.len(),
            });
        }
        indices.extend_from_slice(face);
    }

    let aabb = mesh
        .aabb
        .or_else(|| mesh.compute_aabb())
        .unwrap_or_default();

    Ok(MeshAsset {
        name: mesh.name.clone(),
        skinned: binding.is_some(),
        vertices,
        indices,
        aabb,
        material: material.map(str::to_owned),
        skeleton: binding.map(|b| b.skeleton.file_name.clone()),
        sub_meshes: Vec::new(),
    })
}

fn attribute<T: Copy>(values: &Option<Vec<T>>, index: usize) -> Option<T> {
    values.as_ref().and_then(|v| v.get(index).copied())
}

/// Convert the meshes instanced by `node` into one mesh asset.
///
/// A single mesh is the asset itself. Several meshes become sub-meshes of
/// an empty parent whose box is the union of theirs.
pub fn convert_node_meshes(
    scene: &ForeignScene,
    node: NodeId,
    session: &ImportSession,
) -> Result<Option<MeshAsset>, ImportError> {
    let foreign = scene.node(node);
    let binding = session
        .skeleton()
        .map(|s| SkinBinding { skeleton: s.as_ref() });

    let mut converted = Vec::with_capacity(foreign.meshes.len());
    for &index in &foreign.meshes {
        let mesh = scene.mesh(index);
        converted.push(convert_mesh(mesh, binding, session.material(mesh.material))?);
    }

    let mut asset = match converted.len() {
        0 => return Ok(None),
        1 => converted.remove(0),
        _ => {
            let aabb = converted
                .iter()
                .map(|m| m.aabb)
                .reduce(|a, b| a.union(&b))
                .unwrap_or_default();
            let skeleton = converted.iter().find_map(|m| m.skeleton.clone());
            MeshAsset {
                aabb,
                skeleton,
                sub_meshes: converted,
                ..Default::default()
            }
        }
    };
    asset.name = foreign.name.clone();
    Ok(Some(asset))
}

/// Convert and write the mesh asset of `node`. Returns its file name.
pub fn export_node_meshes(
    scene: &ForeignScene,
    node: NodeId,
    session: &mut ImportSession,
) -> Result<Option<String>> {
    let Some(asset) = convert_node_meshes(scene, node, session)? else {
        return Ok(None);
    };

    let skinned = asset.is_skinned();
    let path = mesh_path(session.dest(), &asset.name, skinned);
    session.record_used(&path);
    asset.save(&path)?;

    tracing::info!(
        "Exported {} '{}': {} vertices, {} indices, {} sub-meshes",
        if skinned { "skinned mesh" } else { "mesh" },
        asset.name,
        asset.vertex_count(),
        asset.index_count(),
        asset.sub_meshes.len()
    );

    Ok(Some(KILN_ASSET_FORMAT.file_name(
        &clear_forbidden(&asset.name),
        KILN_ASSET_FORMAT.mesh_ext_for(skinned),
    )))
}
