//! Wavefront OBJ decoding into a [`ForeignScene`]

use anyhow::{Context, Result};
use glam::{Mat4, Vec2, Vec3};
use hashbrown::HashMap;
use smallvec::smallvec;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use super::{
    DEFAULT_MATERIAL_NAME, DecodeOptions, ForeignMaterial, ForeignMesh, ForeignScene,
    ForeignSceneBuilder, ROOT_NODE_NAME, TextureRef,
};

/// Corner reference: (position, uv, normal), already zero-based
type Corner = (usize, Option<usize>, Option<usize>);

/// Faces sharing one `usemtl`, expanded to one vertex per corner
#[derive(Default)]
struct MeshGroup {
    material: Option<String>,
    positions: Vec<Vec3>,
    uvs: Vec<Vec2>,
    normals: Vec<Vec3>,
    missing_uv: bool,
    missing_normal: bool,
}

impl MeshGroup {
    fn new(material: Option<String>) -> Self {
        Self {
            material,
            ..Default::default()
        }
    }
}

/// Raw attribute pools shared by every group
#[derive(Default)]
struct Pools {
    positions: Vec<Vec3>,
    uvs: Vec<Vec2>,
    normals: Vec<Vec3>,
}

/// Load an OBJ file (plus any `mtllib` it references)
pub fn load_obj(input: &Path, options: &DecodeOptions) -> Result<ForeignScene> {
    let file = File::open(input).with_context(|| format!("Failed to open OBJ: {:?}", input))?;
    let reader = BufReader::new(file);
    let base_dir = input.parent().unwrap_or_else(|| Path::new("."));

    let mut pools = Pools::default();
    let mut groups: Vec<MeshGroup> = vec![MeshGroup::new(None)];
    let mut library: HashMap<String, Option<String>> = HashMap::new();

    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        match parts[0] {
            "v" if parts.len() >= 4 => pools.positions.push(parse_vec3(&parts[1..4])),
            "vt" if parts.len() >= 3 => {
                let u: f32 = parts[1].parse().unwrap_or(0.0);
                let v: f32 = parts[2].parse().unwrap_or(0.0);
                pools.uvs.push(Vec2::new(u, 1.0 - v));
            }
            "vn" if parts.len() >= 4 => pools.normals.push(parse_vec3(&parts[1..4])),
            "usemtl" if parts.len() >= 2 => {
                let name = parts[1..].join(" ");
                match groups.iter().position(|g| g.material.as_deref() == Some(name.as_str())) {
                    // Move an existing group to the back so new faces land in it
                    Some(i) => {
                        let group = groups.remove(i);
                        groups.push(group);
                    }
                    None => groups.push(MeshGroup::new(Some(name))),
                }
            }
            "mtllib" if parts.len() >= 2 => {
                let path = base_dir.join(parts[1..].join(" "));
                match parse_mtl(&path) {
                    Ok(materials) => library.extend(materials),
                    Err(e) => tracing::warn!("Failed to read material library {:?}: {:#}", path, e),
                }
            }
            "f" if parts.len() >= 4 => {
                let corners: Vec<Corner> = parts[1..]
                    .iter()
                    .filter_map(|v| parse_obj_vertex(v, &pools))
                    .collect();
                if corners.len() < 3 {
                    continue;
                }
                if let Some(group) = groups.last_mut() {
                    // Fan triangulation for convex polygons
                    for i in 1..corners.len() - 1 {
                        for corner in [corners[0], corners[i], corners[i + 1]] {
                            push_corner(group, &pools, corner);
                        }
                    }
                }
            }
            _ => {}
        }
    }

    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("mesh")
        .to_string();

    let mut builder = ForeignSceneBuilder::new(ROOT_NODE_NAME, options.root_transform());
    let node = builder.add_node(builder.root(), stem.clone(), Mat4::IDENTITY);
    let mut material_slots: HashMap<String, usize> = HashMap::new();

    let groups: Vec<MeshGroup> = groups
        .into_iter()
        .filter(|g| !g.positions.is_empty())
        .collect();
    let group_count = groups.len();

    for (index, group) in groups.into_iter().enumerate() {
        let material_name = match group.material {
            Some(ref name) if library.contains_key(name) => name.clone(),
            Some(ref name) => {
                tracing::warn!("OBJ material '{}' not found in any mtllib, using default", name);
                DEFAULT_MATERIAL_NAME.to_string()
            }
            None => DEFAULT_MATERIAL_NAME.to_string(),
        };
        let material = *material_slots
            .entry(material_name.clone())
            .or_insert_with(|| {
                let mut material = ForeignMaterial::new(material_name.clone());
                material.diffuse = library
                    .get(&material_name)
                    .cloned()
                    .flatten()
                    .map(TextureRef::File);
                builder.add_material(material)
            });

        let name = if group_count > 1 {
            format!("{}_{}", stem, index)
        } else {
            stem.clone()
        };
        let vertex_count = group.positions.len() as u32;
        let mut mesh = ForeignMesh::new(name, group.positions);
        mesh.faces = (0..vertex_count / 3)
            .map(|t| smallvec![t * 3, t * 3 + 1, t * 3 + 2])
            .collect();
        if !group.missing_uv {
            mesh.uvs = Some(group.uvs);
        }
        if !group.missing_normal {
            mesh.normals = Some(group.normals);
        }
        mesh.material = material;
        mesh.aabb = mesh.compute_aabb();

        let mesh = builder.add_mesh(mesh);
        builder.instance_mesh(node, mesh);
    }

    Ok(builder.build())
}

fn push_corner(group: &mut MeshGroup, pools: &Pools, (vi, vti, vni): Corner) {
    group.positions.push(pools.positions[vi]);
    match vti.and_then(|i| pools.uvs.get(i)) {
        Some(&uv) => group.uvs.push(uv),
        None => group.missing_uv = true,
    }
    match vni.and_then(|i| pools.normals.get(i)) {
        Some(&n) => group.normals.push(n),
        None => group.missing_normal = true,
    }
}

fn parse_vec3(parts: &[&str]) -> Vec3 {
    let x: f32 = parts[0].parse().unwrap_or(0.0);
    let y: f32 = parts[1].parse().unwrap_or(0.0);
    let z: f32 = parts[2].parse().unwrap_or(0.0);
    Vec3::new(x, y, z)
}

/// Resolve a 1-based or negative (relative) OBJ index against a pool length
fn resolve_index(s: &str, len: usize) -> Option<usize> {
    let i: i64 = s.parse().ok()?;
    let resolved = if i < 0 { len as i64 + i } else { i - 1 };
    (0..len as i64)
        .contains(&resolved)
        .then_some(resolved as usize)
}

/// Parse OBJ vertex reference: "v", "v/vt", "v/vt/vn", or "v//vn"
fn parse_obj_vertex(s: &str, pools: &Pools) -> Option<Corner> {
    let parts: Vec<&str> = s.split('/').collect();

    let vi = resolve_index(parts.first()?, pools.positions.len())?;
    let vti = parts
        .get(1)
        .filter(|s| !s.is_empty())
        .and_then(|s| resolve_index(s, pools.uvs.len()));
    let vni = parts
        .get(2)
        .filter(|s| !s.is_empty())
        .and_then(|s| resolve_index(s, pools.normals.len()));

    Some((vi, vti, vni))
}

/// Parse a `.mtl` file: material name -> diffuse map
fn parse_mtl(path: &Path) -> Result<HashMap<String, Option<String>>> {
    let file = File::open(path).with_context(|| format!("Failed to open MTL: {:?}", path))?;
    let mut materials = HashMap::new();
    let mut current: Option<String> = None;

    for line in BufReader::new(file).lines() {
        let line = line?;
        let line = line.trim();
        if let Some(name) = line.strip_prefix("newmtl ") {
            let name = name.trim().to_string();
            materials.insert(name.clone(), None);
            current = Some(name);
        } else if let Some(map) = line.strip_prefix("map_Kd ") {
            // Options like "-bm 1" precede the file name; take the last token
            let texture = map.split_whitespace().last().map(str::to_owned);
            if let Some(ref name) = current {
                materials.insert(name.clone(), texture);
            }
        }
    }

    Ok(materials)
}
