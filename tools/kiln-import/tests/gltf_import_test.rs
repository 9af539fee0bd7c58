//! glTF import tests on a generated skinned, animated model

use std::fs;
use std::path::{Path, PathBuf};

use kiln_common::{
    AnimationAsset, AssetDocument, MaterialAsset, MeshAsset, SceneAsset, SkeletonAsset,
};
use kiln_import::foreign::{DecodeOptions, TextureRef, load_scene};
use kiln_import::{ImportSession, import_file};
use serde_json::json;

const POSITIONS: [[f32; 3]; 3] = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 2.0, 0.0]];
const INDICES: [u16; 3] = [0, 1, 2];
const JOINTS: [[u8; 4]; 3] = [[0, 0, 0, 0], [0, 1, 0, 0], [1, 0, 0, 0]];
const WEIGHTS: [[f32; 4]; 3] = [
    [1.0, 0.0, 0.0, 0.0],
    [0.5, 0.5, 0.0, 0.0],
    [1.0, 0.0, 0.0, 0.0],
];
const KEY_TIMES: [f32; 2] = [0.0, 1.0];
const SPINE_TRANSLATIONS: [[f32; 3]; 2] = [[0.0, 1.0, 0.0], [0.0, 2.0, 0.0]];

/// Byte layout of `wave.bin`
struct Layout {
    positions: usize,
    indices: usize,
    joints: usize,
    weights: usize,
    inverse_binds: usize,
    times: usize,
    translations: usize,
    len: usize,
}

fn push_f32s(bytes: &mut Vec<u8>, values: impl IntoIterator<Item = f32>) {
    for v in values {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
}

fn pad_to_4(bytes: &mut Vec<u8>) {
    while bytes.len() % 4 != 0 {
        bytes.push(0);
    }
}

fn translation_matrix(y: f32) -> [f32; 16] {
    // Column-major, translation in the last column
    [
        1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, y, 0.0, 1.0,
    ]
}

fn pack_buffer() -> (Vec<u8>, Layout) {
    let mut bytes = Vec::new();

    let positions = bytes.len();
    push_f32s(&mut bytes, POSITIONS.iter().flatten().copied());

    let indices = bytes.len();
    for i in INDICES {
        bytes.extend_from_slice(&i.to_le_bytes());
    }
    pad_to_4(&mut bytes);

    let joints = bytes.len();
    bytes.extend(JOINTS.iter().flatten());

    let weights = bytes.len();
    push_f32s(&mut bytes, WEIGHTS.iter().flatten().copied());

    let inverse_binds = bytes.len();
    push_f32s(&mut bytes, translation_matrix(-1.0));
    push_f32s(&mut bytes, translation_matrix(-2.0));

    let times = bytes.len();
    push_f32s(&mut bytes, KEY_TIMES);

    let translations = bytes.len();
    push_f32s(&mut bytes, SPINE_TRANSLATIONS.iter().flatten().copied());

    let len = bytes.len();
    (
        bytes,
        Layout {
            positions,
            indices,
            joints,
            weights,
            inverse_binds,
            times,
            translations,
            len,
        },
    )
}

/// Write `wave.gltf`, `wave.bin` and `skin tone.png` into `dir`. The image
/// URI is percent-encoded.
fn write_wave_model(dir: &Path) -> PathBuf {
    let (bytes, layout) = pack_buffer();
    fs::write(dir.join("wave.bin"), &bytes).unwrap();
    fs::write(dir.join("skin tone.png"), b"skin pixels").unwrap();

    let view = |offset: usize, length: usize| {
        json!({ "buffer": 0, "byteOffset": offset, "byteLength": length })
    };

    let document = json!({
        "asset": { "version": "2.0", "generator": "kiln-import tests" },
        "scene": 0,
        "scenes": [{ "nodes": [0, 1] }],
        "nodes": [
            { "name": "Body", "mesh": 0, "skin": 0 },
            { "name": "Hips", "translation": [0.0, 1.0, 0.0], "children": [2] },
            { "name": "Spine", "translation": [0.0, 1.0, 0.0] }
        ],
        "skins": [{ "joints": [1, 2], "inverseBindMatrices": 4 }],
        "meshes": [{
            "primitives": [{
                "attributes": { "POSITION": 0, "JOINTS_0": 2, "WEIGHTS_0": 3 },
                "indices": 1,
                "material": 0
            }]
        }],
        "materials": [{
            "name": "Skin",
            "pbrMetallicRoughness": { "baseColorTexture": { "index": 0 } }
        }],
        "textures": [{ "source": 0 }],
        "images": [{ "uri": "skin%20tone.png" }],
        "animations": [{
            "name": "Armature|Wave",
            "channels": [{ "sampler": 0, "target": { "node": 2, "path": "translation" } }],
            "samplers": [{ "input": 5, "output": 6, "interpolation": "LINEAR" }]
        }],
        "accessors": [
            {
                "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
                "min": [0.0, 0.0, 0.0], "max": [1.0, 2.0, 0.0]
            },
            { "bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR" },
            { "bufferView": 2, "componentType": 5121, "count": 3, "type": "VEC4" },
            { "bufferView": 3, "componentType": 5126, "count": 3, "type": "VEC4" },
            { "bufferView": 4, "componentType": 5126, "count": 2, "type": "MAT4" },
            {
                "bufferView": 5, "componentType": 5126, "count": 2, "type": "SCALAR",
                "min": [0.0], "max": [1.0]
            },
            { "bufferView": 6, "componentType": 5126, "count": 2, "type": "VEC3" }
        ],
        "bufferViews": [
            view(layout.positions, layout.indices - layout.positions),
            view(layout.indices, INDICES.len() * 2),
            view(layout.joints, layout.weights - layout.joints),
            view(layout.weights, layout.inverse_binds - layout.weights),
            view(layout.inverse_binds, layout.times - layout.inverse_binds),
            view(layout.times, layout.translations - layout.times),
            view(layout.translations, layout.len - layout.translations)
        ],
        "buffers": [{ "uri": "wave.bin", "byteLength": layout.len }]
    });

    let path = dir.join("wave.gltf");
    fs::write(&path, serde_json::to_string_pretty(&document).unwrap()).unwrap();
    path
}

#[test]
fn test_buffer_layout() {
    let (bytes, layout) = pack_buffer();
    assert_eq!(layout.indices, 36);
    assert_eq!(layout.joints, 44);
    assert_eq!(layout.weights, 56);
    assert_eq!(layout.inverse_binds, 104);
    assert_eq!(layout.times, 232);
    assert_eq!(layout.translations, 240);
    assert_eq!(bytes.len(), 264);
}

#[test]
fn test_decode_wave_model() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_wave_model(dir.path());

    let scene = load_scene(&path, &DecodeOptions::default()).unwrap();
    let names: Vec<_> = scene
        .preorder()
        .into_iter()
        .map(|id| scene.node(id).name.as_str())
        .collect();
    assert_eq!(names, ["RootNode", "Body", "Hips", "Spine"]);

    assert_eq!(scene.meshes().len(), 1);
    let mesh = &scene.meshes()[0];
    assert_eq!(mesh.name, "mesh0");
    assert_eq!(mesh.faces.len(), 1);
    let bones: Vec<_> = mesh.bones.iter().map(|b| b.name.as_str()).collect();
    assert_eq!(bones, ["Hips", "Spine"]);
    assert_eq!(mesh.bones[1].weights.len(), 2);
    assert!((mesh.bones[1].offset.w_axis.y + 2.0).abs() < 1e-6);

    assert!(matches!(
        scene.materials()[mesh.material].diffuse,
        Some(TextureRef::File(ref uri)) if uri == "skin tone.png"
    ));

    let animation = &scene.animations()[0];
    assert_eq!(animation.name, "Armature|Wave");
    assert_eq!(animation.duration, 1.0);
    let spine = &animation.channels[0];
    assert_eq!(spine.node_name, "Spine");
    assert_eq!(spine.positions.len(), 2);
    // Untouched tracks fall back to the rest pose
    assert_eq!(spine.rotations.len(), 1);
    assert_eq!(spine.scales.len(), 1);
}

#[test]
fn test_import_wave_model() {
    let src = tempfile::tempdir().unwrap();
    let dest = tempfile::tempdir().unwrap();
    let path = write_wave_model(src.path());

    let mut session = ImportSession::new(dest.path());
    import_file(&path, &mut session, &DecodeOptions::default()).unwrap();

    let skeleton = SkeletonAsset::load(&dest.path().join("wave.skeleton")).unwrap();
    assert_eq!(skeleton.bone_count(), 2);
    assert_eq!(skeleton.bone("Hips").unwrap().index, 0);
    assert_eq!(skeleton.bone("Hips").unwrap().parent, None);
    assert_eq!(skeleton.bone("Spine").unwrap().index, 1);
    assert_eq!(skeleton.bone("Spine").unwrap().parent, Some(0));

    let mesh = MeshAsset::load(&dest.path().join("Body.skinMesh")).unwrap();
    assert_eq!(mesh.skeleton.as_deref(), Some("wave.skeleton"));
    assert_eq!(mesh.material.as_deref(), Some("Skin.material"));
    assert_eq!(mesh.aabb.max, [1.0, 2.0, 0.0]);
    let v1 = mesh.vertices[1].skin.unwrap();
    assert_eq!(v1.bones, [0, 1, 0, 0]);
    assert_eq!(v1.weights, [0.5, 0.5, 0.0, 0.0]);

    let material = MaterialAsset::load(&dest.path().join("Skin.material")).unwrap();
    assert_eq!(material.diffuse_texture.as_deref(), Some("skin tone.png"));
    assert_eq!(fs::read(dest.path().join("skin tone.png")).unwrap(), b"skin pixels");

    let clip = AnimationAsset::load(&dest.path().join("Armature_Wave.anim")).unwrap();
    let keys = clip.track("Spine").unwrap();
    assert_eq!(keys.len(), 30);
    assert!((keys[14].position[1] - 1.5).abs() < 1e-5);
    assert_eq!(keys.last().unwrap().position, [0.0, 2.0, 0.0]);
    assert!((clip.duration - 1.0).abs() < 1e-6);

    let scene = SceneAsset::load(&dest.path().join("wave.scene")).unwrap();
    assert_eq!(scene.entities.len(), 4);
    assert_eq!(scene.mesh_entities().count(), 1);
    let spine = scene.entity_by_name("Spine").unwrap();
    let hips = scene.entity_by_name("Hips").unwrap();
    assert_eq!(spine.parent, Some(hips.id));
    assert_eq!(spine.transform.translation, [0.0, 1.0, 0.0]);

    let used: Vec<_> = session
        .used_files()
        .iter()
        .filter_map(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .collect();
    assert_eq!(
        used,
        [
            "Armature_Wave.anim",
            "skin tone.png",
            "Skin.material",
            "wave.skeleton",
            "wave.scene",
            "Body.skinMesh"
        ]
    );
}
