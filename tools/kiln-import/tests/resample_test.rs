//! Resampling scenarios on hand-built clips

mod scene_fixtures;

use glam::{Quat, Vec3};
use kiln_import::foreign::{ForeignAnimation, NodeChannel};
use kiln_import::{FrameGrid, ImportError, TARGET_FRAME_RATE, resample_animation, resample_channel};
use scene_fixtures::{constant_channel, quat_key, vector_key};

fn approx(a: [f32; 3], b: [f32; 3]) -> bool {
    a.iter().zip(b.iter()).all(|(x, y)| (x - y).abs() < 1e-4)
}

fn clip(duration: f64, ticks_per_second: f64, channels: Vec<NodeChannel>) -> ForeignAnimation {
    ForeignAnimation {
        name: "clip".into(),
        duration,
        ticks_per_second,
        channels,
    }
}

#[test]
fn test_single_key_holds_every_frame() {
    let rotation = Quat::from_rotation_y(0.5);
    let channel = constant_channel("Hips", Vec3::new(1.0, 2.0, 3.0), rotation, Vec3::ONE);
    let animation = clip(48.0, 24.0, vec![channel]);

    let asset = resample_animation(&animation, "idle").unwrap();
    let keys = asset.track("Hips").unwrap();

    // 2 seconds at 30 fps
    assert_eq!(keys.len(), 60);
    assert_eq!(keys.first().unwrap().frame, 1);
    assert_eq!(keys.last().unwrap().frame, 60);
    for key in keys {
        assert_eq!(key.position, [1.0, 2.0, 3.0]);
        assert_eq!(key.scale, [1.0, 1.0, 1.0]);
        let q = Quat::from_array(key.rotation);
        assert!(q.angle_between(rotation) < 1e-4);
    }
    assert_eq!(asset.fps, TARGET_FRAME_RATE as f32);
    assert!((asset.duration - 2.0).abs() < 1e-6);
}

#[test]
fn test_two_keys_interpolate_across_grid() {
    let channel = NodeChannel {
        node_name: "Arm".into(),
        positions: vec![
            vector_key(0.0, Vec3::ZERO),
            vector_key(10.0, Vec3::new(3.0, 0.0, 0.0)),
        ],
        rotations: vec![
            quat_key(0.0, Quat::IDENTITY),
            quat_key(10.0, Quat::from_rotation_z(1.0)),
        ],
        scales: vec![vector_key(0.0, Vec3::ONE), vector_key(10.0, Vec3::splat(2.0))],
    };
    let grid = FrameGrid::new(10.0, 10.0);
    assert_eq!(grid.frame_count, 30);

    let keys = resample_channel("swing", &channel, &grid).unwrap();
    assert_eq!(keys.len(), 30);

    // Frame 1 sits a thirtieth of the way in
    let first = &keys[0];
    assert_eq!(first.frame, 1);
    assert!(approx(first.position, [0.1, 0.0, 0.0]));
    assert!(approx(first.scale, [1.0 + 1.0 / 30.0; 3]));

    // The last frame lands exactly on the end key
    let last = keys.last().unwrap();
    assert_eq!(last.frame, 30);
    assert_eq!(last.position, [3.0, 0.0, 0.0]);
    assert_eq!(last.scale, [2.0, 2.0, 2.0]);
    let q = Quat::from_array(last.rotation);
    assert!(q.angle_between(Quat::from_rotation_z(1.0)) < 1e-4);

    // Halfway
    assert!(approx(keys[14].position, [1.5, 0.0, 0.0]));
    let mid = Quat::from_array(keys[14].rotation);
    assert!((mid.length() - 1.0).abs() < 1e-5);
    assert!(mid.angle_between(Quat::from_rotation_z(0.5)) < 1e-4);
}

#[test]
fn test_late_track_truncates_channel_and_clip() {
    // Position keyed from 0, rotation only from tick 15
    let late = NodeChannel {
        node_name: "Tail".into(),
        positions: vec![vector_key(0.0, Vec3::ZERO), vector_key(30.0, Vec3::Y)],
        rotations: vec![
            quat_key(15.0, Quat::IDENTITY),
            quat_key(30.0, Quat::from_rotation_x(1.0)),
        ],
        scales: vec![vector_key(0.0, Vec3::ONE)],
    };
    let early = constant_channel("Hips", Vec3::ZERO, Quat::IDENTITY, Vec3::ONE);
    let animation = clip(30.0, 30.0, vec![late, early]);

    let asset = resample_animation(&animation, "wag").unwrap();

    let tail = asset.track("Tail").unwrap();
    assert_eq!(tail.len(), 16);
    assert_eq!(tail[0].frame, 15);
    assert!(approx(tail[0].position, [0.0, 0.5, 0.0]));
    assert_eq!(tail.last().unwrap().frame, 30);

    assert_eq!(asset.track("Hips").unwrap().len(), 30);
    // Clip length follows the longest emitted channel
    assert!((asset.duration - 1.0).abs() < 1e-6);

    let alone = resample_animation(
        &clip(30.0, 30.0, vec![animation.channels[0].clone()]),
        "wag",
    )
    .unwrap();
    assert!((alone.duration - 16.0 / 30.0).abs() < 1e-6);
}

#[test]
fn test_missing_rate_defaults_to_target() {
    let grid = FrameGrid::new(60.0, 0.0);
    assert_eq!(grid.ticks_per_second, TARGET_FRAME_RATE);
    assert_eq!(grid.frame_count, 60);
}

#[test]
fn test_empty_track_is_out_of_range() {
    let channel = NodeChannel {
        node_name: "Broken".into(),
        positions: vec![vector_key(0.0, Vec3::ZERO)],
        rotations: Vec::new(),
        scales: vec![vector_key(0.0, Vec3::ONE)],
    };
    let err = resample_animation(&clip(30.0, 30.0, vec![channel]), "broken").unwrap_err();
    assert!(matches!(
        err,
        ImportError::KeyframeOutOfRange { track: "rotation", ref node, .. } if node == "Broken"
    ));
}
