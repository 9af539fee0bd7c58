//! glTF/GLB decoding into a [`ForeignScene`]
//!
//! Images are never decoded: external images stay file references and images
//! stored in buffer views become embedded textures.

use anyhow::{Context, Result};
use glam::{Mat4, Quat, Vec2, Vec3};
use gltf::animation::util::ReadOutputs;
use gltf::animation::{Interpolation, Property};
use gltf::mesh::Mode;
use hashbrown::HashMap;
use smallvec::smallvec;
use std::path::Path;

use super::{
    DEFAULT_MATERIAL_NAME, DecodeOptions, EmbeddedTexture, Face, ForeignAnimation, ForeignBone,
    ForeignMaterial, ForeignMesh, ForeignScene, ForeignSceneBuilder, NodeChannel, NodeId, QuatKey,
    ROOT_NODE_NAME, TexturePayload, TextureRef, VectorKey, VertexWeight,
};

/// glTF key times are seconds
const GLTF_TICKS_PER_SECOND: f64 = 1.0;

/// Joints of one glTF skin, in joint order
struct SkinJoints {
    names: Vec<String>,
    inverse_bind_matrices: Vec<Mat4>,
}

struct Decoder<'a> {
    buffers: &'a [gltf::buffer::Data],
    node_names: Vec<String>,
    builder: ForeignSceneBuilder,
    /// glTF image index -> material texture reference
    image_refs: Vec<Option<TextureRef>>,
    default_material: Option<usize>,
    /// (glTF mesh, glTF skin) -> converted primitive meshes
    mesh_cache: HashMap<(usize, Option<usize>), Vec<usize>>,
}

/// Load a glTF or GLB file
pub fn load_gltf(input: &Path, options: &DecodeOptions) -> Result<ForeignScene> {
    let gltf::Gltf { document, blob } =
        gltf::Gltf::open(input).with_context(|| format!("Failed to load glTF: {:?}", input))?;
    let buffers = gltf::import_buffers(&document, input.parent(), blob)
        .with_context(|| format!("Failed to load glTF buffers: {:?}", input))?;

    let node_names = document
        .nodes()
        .map(|n| {
            n.name()
                .filter(|s| !s.is_empty())
                .map(str::to_owned)
                .unwrap_or_else(|| format!("node{}", n.index()))
        })
        .collect();

    let mut decoder = Decoder {
        buffers: &buffers,
        node_names,
        builder: ForeignSceneBuilder::new(ROOT_NODE_NAME, options.root_transform()),
        image_refs: Vec::new(),
        default_material: None,
        mesh_cache: HashMap::new(),
    };

    decoder.read_images(&document);
    decoder.read_materials(&document);

    let scene = document
        .default_scene()
        .or_else(|| document.scenes().next())
        .context("No scenes found in glTF")?;
    let root = decoder.builder.root();
    for node in scene.nodes() {
        decoder.read_node(&node, root)?;
    }

    for (index, animation) in document.animations().enumerate() {
        let animation = decoder.read_animation(&animation, index)?;
        decoder.builder.add_animation(animation);
    }

    Ok(decoder.builder.build())
}

impl Decoder<'_> {
    fn read_images(&mut self, document: &gltf::Document) {
        for image in document.images() {
            let reference = match image.source() {
                gltf::image::Source::View { view, mime_type } => {
                    let buffer = &self.buffers[view.buffer().index()];
                    let start = view.offset();
                    let end = start + view.length();
                    let Some(bytes) = buffer.get(start..end) else {
                        tracing::warn!(
                            "Image {} points outside its buffer, skipping",
                            image.index()
                        );
                        self.image_refs.push(None);
                        continue;
                    };
                    let filename = image
                        .name()
                        .filter(|s| !s.is_empty())
                        .map(str::to_owned)
                        .unwrap_or_else(|| format!("image{}", image.index()));
                    let texture = EmbeddedTexture {
                        filename,
                        format_hint: format_hint_from_mime(mime_type),
                        payload: TexturePayload::Compressed(bytes.to_vec()),
                    };
                    Some(TextureRef::Embedded(self.builder.add_texture(texture)))
                }
                gltf::image::Source::Uri { uri, .. } if uri.starts_with("data:") => {
                    tracing::warn!(
                        "Image {} uses a data URI, which is not supported; skipping",
                        image.index()
                    );
                    None
                }
                gltf::image::Source::Uri { uri, .. } => Some(TextureRef::File(decode_uri(uri))),
            };
            self.image_refs.push(reference);
        }
    }

    fn read_materials(&mut self, document: &gltf::Document) {
        for material in document.materials() {
            let mut foreign = ForeignMaterial::new(material.name().unwrap_or_default());
            foreign.diffuse = material
                .pbr_metallic_roughness()
                .base_color_texture()
                .and_then(|info| {
                    let image = info.texture().source().index();
                    self.image_refs.get(image).cloned().flatten()
                });
            self.builder.add_material(foreign);
        }
    }

    fn material_index(&mut self, material: Option<usize>) -> usize {
        if let Some(index) = material {
            return index;
        }
        *self.default_material.get_or_insert_with(|| {
            self.builder
                .add_material(ForeignMaterial::new(DEFAULT_MATERIAL_NAME))
        })
    }

    fn read_node(&mut self, node: &gltf::Node, parent: NodeId) -> Result<()> {
        let transform = Mat4::from_cols_array_2d(&node.transform().matrix());
        let id = self
            .builder
            .add_node(parent, self.node_names[node.index()].clone(), transform);

        if let Some(mesh) = node.mesh() {
            let skin = node.skin();
            let key = (mesh.index(), skin.as_ref().map(|s| s.index()));
            let meshes = match self.mesh_cache.get(&key) {
                Some(meshes) => meshes.clone(),
                None => {
                    let joints = skin.as_ref().map(|s| self.read_skin(s));
                    let meshes = self.read_mesh(&mesh, joints.as_ref())?;
                    self.mesh_cache.insert(key, meshes.clone());
                    meshes
                }
            };
            for index in meshes {
                self.builder.instance_mesh(id, index);
            }
        }

        for child in node.children() {
            self.read_node(&child, id)?;
        }
        Ok(())
    }

    fn read_skin(&self, skin: &gltf::Skin) -> SkinJoints {
        let names: Vec<String> = skin
            .joints()
            .map(|joint| self.node_names[joint.index()].clone())
            .collect();
        let reader = skin.reader(|buffer| Some(&self.buffers[buffer.index()]));
        let mut inverse_bind_matrices: Vec<Mat4> = reader
            .read_inverse_bind_matrices()
            .map(|iter| iter.map(|m| Mat4::from_cols_array_2d(&m)).collect())
            .unwrap_or_default();
        // Missing matrices default to identity
        inverse_bind_matrices.resize(names.len(), Mat4::IDENTITY);
        SkinJoints {
            names,
            inverse_bind_matrices,
        }
    }

    /// Convert every triangle primitive of `mesh`; returns foreign mesh indices
    fn read_mesh(&mut self, mesh: &gltf::Mesh, joints: Option<&SkinJoints>) -> Result<Vec<usize>> {
        let base_name = mesh
            .name()
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
            .unwrap_or_else(|| format!("mesh{}", mesh.index()));
        let primitive_count = mesh.primitives().len();

        let mut converted = Vec::new();
        for primitive in mesh.primitives() {
            let name = if primitive_count > 1 {
                format!("{}_{}", base_name, primitive.index())
            } else {
                base_name.clone()
            };
            let Some(mut foreign) = self.read_primitive(&primitive, &name, joints)? else {
                tracing::debug!(
                    "Dropping {:?} primitive {} of mesh '{}'",
                    primitive.mode(),
                    primitive.index(),
                    base_name
                );
                continue;
            };
            foreign.material = self.material_index(primitive.material().index());
            converted.push(self.builder.add_mesh(foreign));
        }
        Ok(converted)
    }

    fn read_primitive(
        &self,
        primitive: &gltf::Primitive,
        name: &str,
        joints: Option<&SkinJoints>,
    ) -> Result<Option<ForeignMesh>> {
        let reader = primitive.reader(|buffer| Some(&self.buffers[buffer.index()]));

        let positions: Vec<Vec3> = reader
            .read_positions()
            .with_context(|| format!("No positions in mesh '{}'", name))?
            .map(Vec3::from_array)
            .collect();

        let indices: Vec<u32> = match reader.read_indices() {
            Some(iter) => iter.into_u32().collect(),
            None => (0..positions.len() as u32).collect(),
        };
        let Some(faces) = triangulate(primitive.mode(), &indices) else {
            return Ok(None);
        };

        let mut mesh = ForeignMesh::new(name, positions);
        mesh.faces = faces;
        mesh.normals = reader
            .read_normals()
            .map(|iter| iter.map(Vec3::from_array).collect());
        mesh.uvs = reader
            .read_tex_coords(0)
            .map(|iter| iter.into_f32().map(Vec2::from_array).collect());

        // Tangents (vec4): xyz = direction, w = handedness
        if let (Some(tangents), Some(normals)) = (reader.read_tangents(), mesh.normals.as_ref()) {
            let tangents: Vec<[f32; 4]> = tangents.collect();
            if tangents.len() == normals.len() {
                mesh.bitangents = Some(
                    normals
                        .iter()
                        .zip(&tangents)
                        .map(|(n, t)| n.cross(Vec3::new(t[0], t[1], t[2])) * t[3])
                        .collect(),
                );
                mesh.tangents = Some(
                    tangents
                        .iter()
                        .map(|t| Vec3::new(t[0], t[1], t[2]))
                        .collect(),
                );
            } else {
                tracing::warn!(
                    "Mesh '{}' has mismatched tangent count ({} vs {} vertices), ignoring tangents",
                    name,
                    tangents.len(),
                    normals.len()
                );
            }
        }

        if let Some(joints) = joints {
            mesh.bones = read_bones(&reader, joints, name);
        }

        mesh.aabb = mesh.compute_aabb();
        Ok(Some(mesh))
    }

    fn read_animation(
        &self,
        animation: &gltf::Animation,
        index: usize,
    ) -> Result<ForeignAnimation> {
        let name = animation
            .name()
            .map(str::to_owned)
            .unwrap_or_else(|| format!("animation{}", index));

        // (glTF node, channel) in first-seen order
        let mut channels: Vec<(gltf::Node, NodeChannel)> = Vec::new();
        let mut by_node: HashMap<usize, usize> = HashMap::new();
        let mut duration = 0.0f64;

        for channel in animation.channels() {
            let target = channel.target();
            let node = target.node();
            let slot = *by_node.entry(node.index()).or_insert_with(|| {
                channels.push((
                    node.clone(),
                    NodeChannel {
                        node_name: self.node_names[node.index()].clone(),
                        positions: Vec::new(),
                        rotations: Vec::new(),
                        scales: Vec::new(),
                    },
                ));
                channels.len() - 1
            });

            let reader = channel.reader(|buffer| Some(&self.buffers[buffer.index()]));
            let times: Vec<f64> = reader
                .read_inputs()
                .with_context(|| format!("Animation '{}' channel has no key times", name))?
                .map(f64::from)
                .collect();
            if let Some(&last) = times.last() {
                duration = duration.max(last);
            }
            let cubic = channel.sampler().interpolation() == Interpolation::CubicSpline;
            let track = &mut channels[slot].1;

            match (target.property(), reader.read_outputs()) {
                (Property::Translation, Some(ReadOutputs::Translations(values))) => {
                    let values = spline_values(values.map(Vec3::from_array).collect(), cubic);
                    track.positions = vector_keys(&times, &values);
                }
                (Property::Rotation, Some(ReadOutputs::Rotations(values))) => {
                    let values = spline_values(
                        values.into_f32().map(Quat::from_array).collect(),
                        cubic,
                    );
                    track.rotations = times
                        .iter()
                        .zip(values)
                        .map(|(&time, value)| QuatKey {
                            time,
                            value: value.normalize(),
                        })
                        .collect();
                }
                (Property::Scale, Some(ReadOutputs::Scales(values))) => {
                    let values = spline_values(values.map(Vec3::from_array).collect(), cubic);
                    track.scales = vector_keys(&times, &values);
                }
                _ => {} // Morph target weights
            }
        }

        let channels = channels
            .into_iter()
            .map(|(node, mut channel)| {
                complete_channel(&mut channel, &node, duration);
                channel
            })
            .collect();

        Ok(ForeignAnimation {
            name,
            duration,
            ticks_per_second: GLTF_TICKS_PER_SECOND,
            channels,
        })
    }
}

fn format_hint_from_mime(mime: &str) -> Option<String> {
    match mime {
        "image/png" => Some("png".to_string()),
        "image/jpeg" => Some("jpg".to_string()),
        _ => None,
    }
}

/// Relative image URIs are percent-encoded; file references carry the
/// decoded path. Undecodable URIs are kept as written.
fn decode_uri(uri: &str) -> String {
    match urlencoding::decode(uri) {
        Ok(decoded) => decoded.into_owned(),
        Err(e) => {
            tracing::warn!("Image URI '{}' is not valid UTF-8 once decoded: {}", uri, e);
            uri.to_string()
        }
    }
}

/// Split an index list into triangles according to the primitive mode
fn triangulate(mode: Mode, indices: &[u32]) -> Option<Vec<Face>> {
    let faces = match mode {
        Mode::Triangles => indices
            .chunks_exact(3)
            .map(|t| smallvec![t[0], t[1], t[2]])
            .collect(),
        Mode::TriangleStrip => indices
            .windows(3)
            .enumerate()
            .map(|(i, t)| {
                if i % 2 == 0 {
                    smallvec![t[0], t[1], t[2]]
                } else {
                    smallvec![t[1], t[0], t[2]]
                }
            })
            .collect(),
        Mode::TriangleFan => match indices.split_first() {
            Some((&first, rest)) => rest
                .windows(2)
                .map(|t| smallvec![first, t[0], t[1]])
                .collect(),
            None => Vec::new(),
        },
        Mode::Points | Mode::Lines | Mode::LineLoop | Mode::LineStrip => return None,
    };
    Some(faces)
}

/// One bone per joint carrying at least one non-zero weight
fn read_bones<'a, 's, F>(
    reader: &gltf::mesh::Reader<'a, 's, F>,
    joints: &SkinJoints,
    mesh_name: &str,
) -> Vec<ForeignBone>
where
    F: Clone + Fn(gltf::Buffer<'a>) -> Option<&'s [u8]>,
{
    let (Some(joint_sets), Some(weight_sets)) = (reader.read_joints(0), reader.read_weights(0))
    else {
        return Vec::new();
    };

    let mut weights: Vec<Vec<VertexWeight>> = vec![Vec::new(); joints.names.len()];
    for (vertex, (joint_set, weight_set)) in joint_sets
        .into_u16()
        .zip(weight_sets.into_f32())
        .enumerate()
    {
        for (&joint, &weight) in joint_set.iter().zip(&weight_set) {
            if weight <= 0.0 {
                continue;
            }
            match weights.get_mut(joint as usize) {
                Some(list) => list.push(VertexWeight {
                    vertex: vertex as u32,
                    weight,
                }),
                None => tracing::warn!(
                    "Mesh '{}' vertex {} references joint {} but the skin has {} joints",
                    mesh_name,
                    vertex,
                    joint,
                    joints.names.len()
                ),
            }
        }
    }

    weights
        .into_iter()
        .enumerate()
        .filter(|(_, list)| !list.is_empty())
        .map(|(joint, list)| ForeignBone {
            name: joints.names[joint].clone(),
            weights: list,
            offset: joints.inverse_bind_matrices[joint],
        })
        .collect()
}

/// Cubic-spline outputs store (in-tangent, value, out-tangent) per key
fn spline_values<T: Copy>(values: Vec<T>, cubic: bool) -> Vec<T> {
    if cubic {
        values.chunks_exact(3).map(|c| c[1]).collect()
    } else {
        values
    }
}

fn vector_keys(times: &[f64], values: &[Vec3]) -> Vec<VectorKey> {
    times
        .iter()
        .zip(values)
        .map(|(&time, &value)| VectorKey { time, value })
        .collect()
}

/// Fill absent tracks with the node's rest pose and hold short tracks to the
/// clip end, so every track covers the whole clip.
fn complete_channel(channel: &mut NodeChannel, node: &gltf::Node, duration: f64) {
    let (t, r, s) = node.transform().decomposed();

    if channel.positions.is_empty() {
        channel.positions.push(VectorKey {
            time: 0.0,
            value: Vec3::from_array(t),
        });
    }
    if channel.rotations.is_empty() {
        channel.rotations.push(QuatKey {
            time: 0.0,
            value: Quat::from_array(r),
        });
    }
    if channel.scales.is_empty() {
        channel.scales.push(VectorKey {
            time: 0.0,
            value: Vec3::from_array(s),
        });
    }

    hold_until(&mut channel.positions, duration, |k| k.time, |k, time| {
        VectorKey { time, ..*k }
    });
    hold_until(&mut channel.rotations, duration, |k| k.time, |k, time| {
        QuatKey { time, ..*k }
    });
    hold_until(&mut channel.scales, duration, |k| k.time, |k, time| {
        VectorKey { time, ..*k }
    });
}

fn hold_until<K>(
    keys: &mut Vec<K>,
    duration: f64,
    time_of: impl Fn(&K) -> f64,
    retime: impl Fn(&K, f64) -> K,
) {
    if keys.len() < 2 {
        return;
    }
    if let Some(last) = keys.last() {
        if time_of(last) < duration {
            let held = retime(last, duration);
            keys.push(held);
        }
    }
}
