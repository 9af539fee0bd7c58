//! Programmatic foreign scenes for integration tests.
//!
//! Each builder returns a scene shaped like what a decoder would hand the
//! pipeline: a `RootNode` with the source's nodes below it.

#![allow(dead_code)]

use glam::{Mat4, Quat, Vec3};
use smallvec::smallvec;

use kiln_import::foreign::{
    ForeignBone, ForeignMaterial, ForeignMesh, ForeignScene, ForeignSceneBuilder, NodeChannel,
    QuatKey, ROOT_NODE_NAME, TextureRef, VectorKey, VertexWeight,
};

/// Joint chain of the skinned fixture below `Armature`
pub const RIG_CHAIN: [&str; 5] = ["Hips", "Spine", "Chest", "Neck", "Head"];

/// Skeleton of the skinned fixture, in expected index order
pub const RIG_BONES: [&str; 6] = ["Armature", "Hips", "Spine", "Chest", "Neck", "Head"];

/// Unit triangle in the XY plane with normals and UVs
pub fn triangle(name: &str) -> ForeignMesh {
    let mut mesh = ForeignMesh::new(name, vec![Vec3::ZERO, Vec3::X, Vec3::Y]);
    mesh.normals = Some(vec![Vec3::Z; 3]);
    mesh.uvs = Some(vec![
        glam::Vec2::new(0.0, 0.0),
        glam::Vec2::new(1.0, 0.0),
        glam::Vec2::new(0.0, 1.0),
    ]);
    mesh.faces = vec![smallvec![0, 1, 2]];
    mesh.aabb = mesh.compute_aabb();
    mesh
}

/// RootNode -> Crate (one static mesh, material "Wood")
pub fn static_mesh_scene() -> ForeignScene {
    let mut b = ForeignSceneBuilder::new(ROOT_NODE_NAME, Mat4::IDENTITY);
    let node = b.add_node(b.root(), "Crate", Mat4::IDENTITY);
    let material = b.add_material(ForeignMaterial::new("Wood"));
    let mut mesh = triangle("CrateMesh");
    mesh.material = material;
    let mesh = b.add_mesh(mesh);
    b.instance_mesh(node, mesh);
    b.build()
}

/// Two materials on two meshes, both referencing the same texture file
pub fn shared_texture_scene(texture: &str) -> ForeignScene {
    let mut b = ForeignSceneBuilder::new(ROOT_NODE_NAME, Mat4::IDENTITY);
    for (node_name, material_name) in [("Left", "Oak"), ("Right", "Pine")] {
        let node = b.add_node(b.root(), node_name, Mat4::IDENTITY);
        let mut material = ForeignMaterial::new(material_name);
        material.diffuse = Some(TextureRef::File(texture.to_string()));
        let material = b.add_material(material);
        let mut mesh = triangle(node_name);
        mesh.material = material;
        let mesh = b.add_mesh(mesh);
        b.instance_mesh(node, mesh);
    }
    b.build()
}

/// Two meshes whose materials are both named `Mat` but use different textures
pub fn duplicate_material_scene() -> ForeignScene {
    let mut b = ForeignSceneBuilder::new(ROOT_NODE_NAME, Mat4::IDENTITY);
    for (node_name, texture) in [("Left", "a.png"), ("Right", "b.png")] {
        let node = b.add_node(b.root(), node_name, Mat4::IDENTITY);
        let mut material = ForeignMaterial::new("Mat");
        material.diffuse = Some(TextureRef::File(texture.to_string()));
        let material = b.add_material(material);
        let mut mesh = triangle(node_name);
        mesh.material = material;
        let mesh = b.add_mesh(mesh);
        b.instance_mesh(node, mesh);
    }
    b.build()
}

/// One node carrying two meshes
pub fn multi_mesh_scene() -> ForeignScene {
    let mut b = ForeignSceneBuilder::new(ROOT_NODE_NAME, Mat4::IDENTITY);
    let node = b.add_node(b.root(), "Props", Mat4::IDENTITY);
    let material = b.add_material(ForeignMaterial::new("Paint"));
    for offset in [Vec3::ZERO, Vec3::new(4.0, 0.0, 0.0)] {
        let mut mesh = triangle("part");
        mesh.positions.iter_mut().for_each(|p| *p += offset);
        mesh.aabb = mesh.compute_aabb();
        mesh.material = material;
        let mesh = b.add_mesh(mesh);
        b.instance_mesh(node, mesh);
    }
    b.build()
}

fn influence(vertex: u32, weight: f32) -> VertexWeight {
    VertexWeight { vertex, weight }
}

/// Skinned character:
///
/// ```text
/// RootNode
/// ├── Body (skinned mesh)
/// └── Armature
///     └── Hips
///         └── Spine
///             └── Chest
///                 └── Neck (no weights)
///                     └── Head
/// ```
///
/// Vertex 0 is influenced by five bones (the `Armature` weight comes last),
/// vertex 1 by two, vertex 2 by one.
pub fn skinned_scene() -> ForeignScene {
    let mut b = ForeignSceneBuilder::new(ROOT_NODE_NAME, Mat4::IDENTITY);
    let root = b.root();
    let body = b.add_node(root, "Body", Mat4::IDENTITY);
    let armature = b.add_node(root, "Armature", Mat4::IDENTITY);
    let mut parent = armature;
    for name in RIG_CHAIN {
        parent = b.add_node(
            parent,
            name,
            Mat4::from_translation(Vec3::new(0.0, 1.0, 0.0)),
        );
    }

    let material = b.add_material(ForeignMaterial::new("Skin"));
    let mut mesh = triangle("BodyMesh");
    mesh.material = material;
    mesh.bones = vec![
        ForeignBone {
            name: "Hips".into(),
            weights: vec![influence(0, 0.2), influence(1, 0.5), influence(2, 1.0)],
            offset: Mat4::from_translation(Vec3::new(0.0, -1.0, 0.0)),
        },
        ForeignBone {
            name: "Spine".into(),
            weights: vec![influence(0, 0.2), influence(1, 0.5)],
            offset: Mat4::from_translation(Vec3::new(0.0, -2.0, 0.0)),
        },
        ForeignBone {
            name: "Chest".into(),
            weights: vec![influence(0, 0.2)],
            offset: Mat4::from_translation(Vec3::new(0.0, -3.0, 0.0)),
        },
        ForeignBone {
            name: "Head".into(),
            weights: vec![influence(0, 0.2)],
            offset: Mat4::from_translation(Vec3::new(0.0, -5.0, 0.0)),
        },
        ForeignBone {
            name: "Armature".into(),
            weights: vec![influence(0, 0.2)],
            offset: Mat4::IDENTITY,
        },
    ];
    let mesh = b.add_mesh(mesh);
    b.instance_mesh(body, mesh);
    b.build()
}

pub fn vector_key(time: f64, value: Vec3) -> VectorKey {
    VectorKey { time, value }
}

pub fn quat_key(time: f64, value: Quat) -> QuatKey {
    QuatKey { time, value }
}

/// Channel with one key per track
pub fn constant_channel(node: &str, position: Vec3, rotation: Quat, scale: Vec3) -> NodeChannel {
    NodeChannel {
        node_name: node.into(),
        positions: vec![vector_key(0.0, position)],
        rotations: vec![quat_key(0.0, rotation)],
        scales: vec![vector_key(0.0, scale)],
    }
}
