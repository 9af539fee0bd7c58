//! Keyframe resampling (foreign channels -> .anim)
//!
//! Sparse, independently-timed translation/rotation/scale tracks are sampled
//! onto a fixed 30 fps grid. Frame 0 is never emitted; frame `f` is the pose
//! at `f / 30` seconds.
//!
//! A frame whose time precedes the first key of any track of a node is
//! skipped for that node. Clips whose tracks start late are therefore
//! shortened: the clip duration is recomputed from the longest emitted key
//! sequence rather than taken from the source.

use anyhow::Result;
use glam::{Quat, Vec3};

use kiln_common::{AnimationAsset, AnimationKey, AssetDocument};

use crate::error::ImportError;
use crate::foreign::{ForeignAnimation, ForeignScene, NodeChannel, QuatKey, VectorKey};
use crate::naming::{animation_path, animation_stem};
use crate::session::ImportSession;

/// Output sampling rate (frames per second)
pub const TARGET_FRAME_RATE: f64 = 30.0;

/// Tolerance used when comparing key times and snapping factors
pub const KEY_EPSILON: f64 = 0.001;

/// Sample times of one clip, in source ticks
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameGrid {
    /// Last frame index to emit
    pub frame_count: u32,
    pub ticks_per_second: f64,
    /// Clip end in ticks
    pub duration: f64,
}

impl FrameGrid {
    /// Grid covering `duration` ticks at the target rate. A source rate of 0
    /// means the source did not declare one; the target rate is assumed.
    pub fn new(duration: f64, ticks_per_second: f64) -> Self {
        let ticks_per_second = if ticks_per_second > 0.0 {
            ticks_per_second
        } else {
            TARGET_FRAME_RATE
        };
        let seconds = duration.max(0.0) / ticks_per_second;
        let frame_count = (seconds * TARGET_FRAME_RATE - KEY_EPSILON).ceil().max(0.0) as u32;
        Self {
            frame_count,
            ticks_per_second,
            duration,
        }
    }

    pub fn for_animation(animation: &ForeignAnimation) -> Self {
        Self::new(animation.duration, animation.ticks_per_second)
    }

    /// Time of `frame` in ticks, clamped to the clip end
    pub fn time_in_ticks(&self, frame: u32) -> f64 {
        let time = frame as f64 / TARGET_FRAME_RATE * self.ticks_per_second;
        time.min(self.duration)
    }

    /// Emitted frame indices (1-based)
    pub fn frames(&self) -> impl Iterator<Item = u32> {
        1..=self.frame_count
    }
}

/// Locate the key pair bracketing `time` and the blend factor between them.
///
/// Returns `None` when no key at or after `time` exists. A single-key track
/// brackets every time with itself.
fn bracket(times: &[f64], time: f64) -> Option<(usize, usize, f32)> {
    match times {
        [] => None,
        [_] => Some((0, 0, 0.0)),
        _ => {
            let i = (0..times.len() - 1).find(|&i| time <= times[i + 1] + KEY_EPSILON)?;
            let (t0, t1) = (times[i], times[i + 1]);
            let span = t1 - t0;
            let mut factor = if span > 0.0 { (time - t0) / span } else { 1.0 };
            if factor.abs() < KEY_EPSILON {
                factor = 0.0;
            } else if (factor - 1.0).abs() < KEY_EPSILON {
                factor = 1.0;
            }
            Some((i, i + 1, factor.clamp(0.0, 1.0) as f32))
        }
    }
}

/// Linearly interpolated vector at `time`
pub fn interpolate_vector(keys: &[VectorKey], time: f64) -> Option<Vec3> {
    let times: Vec<f64> = keys.iter().map(|k| k.time).collect();
    let (a, b, factor) = bracket(&times, time)?;
    Some(keys[a].value.lerp(keys[b].value, factor))
}

/// Spherically interpolated, renormalized rotation at `time`
pub fn interpolate_rotation(keys: &[QuatKey], time: f64) -> Option<Quat> {
    let times: Vec<f64> = keys.iter().map(|k| k.time).collect();
    let (a, b, factor) = bracket(&times, time)?;
    Some(keys[a].value.slerp(keys[b].value, factor).normalize())
}

/// True if `time` lies before the first key of the track by more than the
/// tolerance
fn precedes(first: Option<f64>, time: f64) -> bool {
    first.is_some_and(|first| time < first - KEY_EPSILON)
}

/// Sample one node channel on `grid`
pub fn resample_channel(
    animation: &str,
    channel: &NodeChannel,
    grid: &FrameGrid,
) -> Result<Vec<AnimationKey>, ImportError> {
    let out_of_range = |track: &'static str, time: f64| ImportError::KeyframeOutOfRange {
        animation: animation.to_string(),
        node: channel.node_name.clone(),
        track,
        time: time as f32,
    };

    let mut keys = Vec::with_capacity(grid.frame_count as usize);
    for frame in grid.frames() {
        let time = grid.time_in_ticks(frame);

        // Frames before a track's first key are skipped for the whole node
        if precedes(channel.positions.first().map(|k| k.time), time)
            || precedes(channel.rotations.first().map(|k| k.time), time)
            || precedes(channel.scales.first().map(|k| k.time), time)
        {
            continue;
        }

        let position = interpolate_vector(&channel.positions, time)
            .ok_or_else(|| out_of_range("position", time))?;
        let rotation = interpolate_rotation(&channel.rotations, time)
            .ok_or_else(|| out_of_range("rotation", time))?;
        let scale =
            interpolate_vector(&channel.scales, time).ok_or_else(|| out_of_range("scale", time))?;

        keys.push(AnimationKey {
            frame,
            position: position.to_array(),
            rotation: rotation.to_array(),
            scale: scale.to_array(),
        });
    }
    Ok(keys)
}

/// Resample every channel of a clip into an animation asset named `name`
pub fn resample_animation(
    animation: &ForeignAnimation,
    name: &str,
) -> Result<AnimationAsset, ImportError> {
    let grid = FrameGrid::for_animation(animation);
    let mut asset = AnimationAsset::new(name, TARGET_FRAME_RATE as f32);

    let mut emitted = 0usize;
    for channel in &animation.channels {
        let keys = resample_channel(name, channel, &grid)?;
        emitted = emitted.max(keys.len());
        tracing::debug!(
            "Resampled '{}' in '{}': {} of {} frames",
            channel.node_name,
            name,
            keys.len(),
            grid.frame_count
        );
        asset.keys.insert(channel.node_name.clone(), keys);
    }

    // Late-starting tracks shorten the clip
    asset.duration = (emitted as f64 / TARGET_FRAME_RATE) as f32;
    Ok(asset)
}

/// Write one `.anim` file per animation in the scene
pub fn import_animations(scene: &ForeignScene, session: &mut ImportSession) -> Result<()> {
    for (index, animation) in scene.animations().iter().enumerate() {
        let stem = animation_stem(&animation.name, index);
        let path = animation_path(session.dest(), &stem);
        session.record_used(&path);

        let asset = resample_animation(animation, &stem)?;
        asset.save(&path)?;

        tracing::info!(
            "Exported animation '{}': {} channels, {} frames at {} fps ({:.2}s)",
            stem,
            asset.keys.len(),
            asset.max_key_count(),
            asset.fps,
            asset.duration
        );
    }
    Ok(())
}
