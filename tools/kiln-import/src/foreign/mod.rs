//! Foreign scene model
//!
//! Read-only view of a decoded third-party scene: a node tree plus the meshes,
//! bones, materials, embedded textures and animation channels hanging off it.
//! Decoders ([`gltf`], [`obj`]) and tests build scenes through
//! [`ForeignSceneBuilder`]; the import pipeline only reads them.
//!
//! Node names are the only cross-reference key between bones, animation
//! channels and nodes. They are treated as unique.

mod gltf;
mod obj;

use anyhow::Result;
use glam::{Mat4, Quat, Vec2, Vec3};
use kiln_common::Aabb;
use smallvec::SmallVec;
use std::path::Path;

use crate::error::ImportError;

pub use self::gltf::load_gltf;
pub use self::obj::load_obj;

/// Name of the synthetic root node decoders put above the source's roots
pub const ROOT_NODE_NAME: &str = "RootNode";

/// Name of the material decoders create for geometry without one
pub const DEFAULT_MATERIAL_NAME: &str = "DefaultMaterial";

/// Index of a node in [`ForeignScene`]
pub type NodeId = usize;

/// Polygon as an index list; triangulated sources hold exactly three indices
pub type Face = SmallVec<[u32; 4]>;

#[derive(Debug, Clone)]
pub struct ForeignNode {
    pub name: String,
    /// Local transform relative to the parent
    pub transform: Mat4,
    /// Indices into [`ForeignScene::meshes`]
    pub meshes: Vec<usize>,
    pub children: Vec<NodeId>,
    pub parent: Option<NodeId>,
}

/// One vertex influenced by a bone
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexWeight {
    pub vertex: u32,
    pub weight: f32,
}

#[derive(Debug, Clone)]
pub struct ForeignBone {
    /// Name of the node this bone drives
    pub name: String,
    pub weights: Vec<VertexWeight>,
    /// Mesh space to bone space (bind pose inverse)
    pub offset: Mat4,
}

#[derive(Debug, Clone)]
pub struct ForeignMesh {
    pub name: String,
    pub positions: Vec<Vec3>,
    pub normals: Option<Vec<Vec3>>,
    pub uvs: Option<Vec<Vec2>>,
    pub tangents: Option<Vec<Vec3>>,
    pub bitangents: Option<Vec<Vec3>>,
    pub faces: Vec<Face>,
    /// Index into [`ForeignScene::materials`]
    pub material: usize,
    pub bones: Vec<ForeignBone>,
    pub aabb: Option<Aabb>,
}

impl ForeignMesh {
    pub fn new(name: impl Into<String>, positions: Vec<Vec3>) -> Self {
        Self {
            name: name.into(),
            positions,
            normals: None,
            uvs: None,
            tangents: None,
            bitangents: None,
            faces: Vec::new(),
            material: 0,
            bones: Vec::new(),
            aabb: None,
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn has_bones(&self) -> bool {
        !self.bones.is_empty()
    }

    /// Box around the current positions
    pub fn compute_aabb(&self) -> Option<Aabb> {
        let points: Vec<[f32; 3]> = self.positions.iter().map(|p| p.to_array()).collect();
        Aabb::from_points(&points)
    }
}

#[derive(Debug, Clone)]
pub enum TextureRef {
    /// Path as written in the source file
    File(String),
    /// Index into [`ForeignScene::textures`]
    Embedded(usize),
}

#[derive(Debug, Clone)]
pub struct ForeignMaterial {
    /// May be empty
    pub name: String,
    pub diffuse: Option<TextureRef>,
}

impl ForeignMaterial {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            diffuse: None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum TexturePayload {
    /// Encoded image file bytes (PNG, JPEG, ...), written as-is
    Compressed(Vec<u8>),
    /// Raw RGBA8 pixels, encoded to PNG on extraction
    Rgba8 {
        width: u32,
        height: u32,
        pixels: Vec<u8>,
    },
}

#[derive(Debug, Clone)]
pub struct EmbeddedTexture {
    pub filename: String,
    /// File extension of the payload (e.g. "png")
    pub format_hint: Option<String>,
    pub payload: TexturePayload,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VectorKey {
    pub time: f64,
    pub value: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuatKey {
    pub time: f64,
    pub value: Quat,
}

/// Key tracks animating one node. Key times are in ticks and increasing.
#[derive(Debug, Clone)]
pub struct NodeChannel {
    pub node_name: String,
    pub positions: Vec<VectorKey>,
    pub rotations: Vec<QuatKey>,
    pub scales: Vec<VectorKey>,
}

#[derive(Debug, Clone)]
pub struct ForeignAnimation {
    pub name: String,
    /// Duration in ticks
    pub duration: f64,
    /// 0 when the source does not declare a rate
    pub ticks_per_second: f64,
    pub channels: Vec<NodeChannel>,
}

/// A decoded third-party scene
#[derive(Debug, Clone)]
pub struct ForeignScene {
    nodes: Vec<ForeignNode>,
    meshes: Vec<ForeignMesh>,
    materials: Vec<ForeignMaterial>,
    textures: Vec<EmbeddedTexture>,
    animations: Vec<ForeignAnimation>,
}

impl ForeignScene {
    pub fn root(&self) -> NodeId {
        0
    }

    pub fn node(&self, id: NodeId) -> &ForeignNode {
        &self.nodes[id]
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id].children
    }

    /// Node ids in pre-order, children in source order
    pub fn preorder(&self) -> Vec<NodeId> {
        self.preorder_from(self.root())
    }

    /// Pre-order walk of the subtree rooted at `start`
    pub fn preorder_from(&self, start: NodeId) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.nodes[id].children.iter().rev());
        }
        order
    }

    /// First node in pre-order with the given name
    pub fn find_node(&self, name: &str) -> Option<NodeId> {
        self.preorder()
            .into_iter()
            .find(|&id| self.nodes[id].name == name)
    }

    /// First node in pre-order instancing mesh `mesh`
    pub fn mesh_owner(&self, mesh: usize) -> Option<NodeId> {
        self.preorder()
            .into_iter()
            .find(|&id| self.nodes[id].meshes.contains(&mesh))
    }

    pub fn meshes(&self) -> &[ForeignMesh] {
        &self.meshes
    }

    pub fn mesh(&self, index: usize) -> &ForeignMesh {
        &self.meshes[index]
    }

    pub fn materials(&self) -> &[ForeignMaterial] {
        &self.materials
    }

    pub fn textures(&self) -> &[EmbeddedTexture] {
        &self.textures
    }

    pub fn texture(&self, index: usize) -> Option<&EmbeddedTexture> {
        self.textures.get(index)
    }

    pub fn animations(&self) -> &[ForeignAnimation] {
        &self.animations
    }
}

/// Incremental construction of a [`ForeignScene`]
#[derive(Debug, Clone)]
pub struct ForeignSceneBuilder {
    scene: ForeignScene,
}

impl ForeignSceneBuilder {
    /// Start a scene with its root node
    pub fn new(root_name: impl Into<String>, root_transform: Mat4) -> Self {
        let root = ForeignNode {
            name: root_name.into(),
            transform: root_transform,
            meshes: Vec::new(),
            children: Vec::new(),
            parent: None,
        };
        Self {
            scene: ForeignScene {
                nodes: vec![root],
                meshes: Vec::new(),
                materials: Vec::new(),
                textures: Vec::new(),
                animations: Vec::new(),
            },
        }
    }

    pub fn root(&self) -> NodeId {
        0
    }

    /// Append a child to `parent` (after its existing children)
    pub fn add_node(&mut self, parent: NodeId, name: impl Into<String>, transform: Mat4) -> NodeId {
        let id = self.scene.nodes.len();
        self.scene.nodes.push(ForeignNode {
            name: name.into(),
            transform,
            meshes: Vec::new(),
            children: Vec::new(),
            parent: Some(parent),
        });
        self.scene.nodes[parent].children.push(id);
        id
    }

    pub fn add_mesh(&mut self, mesh: ForeignMesh) -> usize {
        self.scene.meshes.push(mesh);
        self.scene.meshes.len() - 1
    }

    /// Reference mesh `mesh` from `node`
    pub fn instance_mesh(&mut self, node: NodeId, mesh: usize) {
        self.scene.nodes[node].meshes.push(mesh);
    }

    pub fn add_material(&mut self, material: ForeignMaterial) -> usize {
        self.scene.materials.push(material);
        self.scene.materials.len() - 1
    }

    pub fn material_count(&self) -> usize {
        self.scene.materials.len()
    }

    pub fn add_texture(&mut self, texture: EmbeddedTexture) -> usize {
        self.scene.textures.push(texture);
        self.scene.textures.len() - 1
    }

    pub fn add_animation(&mut self, animation: ForeignAnimation) {
        self.scene.animations.push(animation);
    }

    pub fn build(self) -> ForeignScene {
        self.scene
    }
}

/// Decoder settings
#[derive(Debug, Clone, Copy)]
pub struct DecodeOptions {
    /// Uniform scale applied to the root node
    pub scale: f32,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self { scale: 1.0 }
    }
}

impl DecodeOptions {
    pub(crate) fn root_transform(&self) -> Mat4 {
        Mat4::from_scale(Vec3::splat(self.scale))
    }
}

/// Decode a source file, picking the decoder by extension
pub fn load_scene(path: &Path, options: &DecodeOptions) -> Result<ForeignScene> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|s| s.to_lowercase())
        .unwrap_or_default();

    let scene = match ext.as_str() {
        "gltf" | "glb" => load_gltf(path, options)?,
        "obj" => load_obj(path, options)?,
        _ => {
            return Err(ImportError::UnsupportedSource {
                path: path.to_path_buf(),
            }
            .into());
        }
    };

    if scene.node_count() <= 1 && scene.meshes().is_empty() {
        return Err(ImportError::EmptyScene {
            path: path.to_path_buf(),
        }
        .into());
    }

    tracing::debug!(
        "Decoded {:?}: {} nodes, {} meshes, {} materials, {} textures, {} animations",
        path,
        scene.node_count(),
        scene.meshes().len(),
        scene.materials().len(),
        scene.textures().len(),
        scene.animations().len()
    );

    Ok(scene)
}
