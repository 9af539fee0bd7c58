//! Math types for Kiln asset documents
//!
//! Plain-array, serializable math types. Documents never store glam types
//! directly; conversion helpers live here so every crate decomposes and
//! composes matrices the same way.

use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Local translation / rotation / scale of a transform node.
///
/// Rotation is a unit quaternion stored as `[x, y, z, w]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub translation: [f32; 3],
    pub rotation: [f32; 4],
    pub scale: [f32; 3],
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    /// Identity transform (no rotation, no translation, unit scale)
    pub const IDENTITY: Self = Self {
        translation: [0.0, 0.0, 0.0],
        rotation: [0.0, 0.0, 0.0, 1.0],
        scale: [1.0, 1.0, 1.0],
    };

    /// Decompose an affine matrix into translation, rotation and scale.
    pub fn from_matrix(matrix: &Mat4) -> Self {
        let (scale, rotation, translation) = matrix.to_scale_rotation_translation();
        Self {
            translation: translation.to_array(),
            rotation: rotation.to_array(),
            scale: scale.to_array(),
        }
    }

    /// Compose `translation * rotation * scale`.
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(
            Vec3::from_array(self.scale),
            Quat::from_array(self.rotation),
            Vec3::from_array(self.translation),
        )
    }

    pub fn is_identity(&self, eps: f32) -> bool {
        self.to_matrix().abs_diff_eq(Mat4::IDENTITY, eps)
    }
}

/// Axis-aligned bounding box.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: [f32; 3],
    pub max: [f32; 3],
}

impl Aabb {
    pub const fn new(min: [f32; 3], max: [f32; 3]) -> Self {
        Self { min, max }
    }

    /// Tight box around a point set. Returns `None` for an empty set.
    pub fn from_points(points: &[[f32; 3]]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let mut min = Vec3::from_array(*first);
        let mut max = min;
        for p in rest {
            let p = Vec3::from_array(*p);
            min = min.min(p);
            max = max.max(p);
        }
        Some(Self::new(min.to_array(), max.to_array()))
    }

    /// Smallest box containing both boxes.
    pub fn union(&self, other: &Aabb) -> Self {
        let min = Vec3::from_array(self.min).min(Vec3::from_array(other.min));
        let max = Vec3::from_array(self.max).max(Vec3::from_array(other.max));
        Self::new(min.to_array(), max.to_array())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity() {
        let t = Transform::IDENTITY;
        assert_eq!(t.translation, [0.0, 0.0, 0.0]);
        assert_eq!(t.rotation, [0.0, 0.0, 0.0, 1.0]);
        assert_eq!(t.scale, [1.0, 1.0, 1.0]);
        assert!(t.is_identity(1e-6));
    }

    #[test]
    fn test_decompose_compose() {
        let matrix = Mat4::from_scale_rotation_translation(
            Vec3::new(2.0, 2.0, 2.0),
            Quat::from_rotation_y(std::f32::consts::FRAC_PI_2),
            Vec3::new(1.0, 2.0, 3.0),
        );
        let t = Transform::from_matrix(&matrix);
        assert!((t.translation[0] - 1.0).abs() < 1e-5);
        assert!((t.translation[2] - 3.0).abs() < 1e-5);
        assert!((t.scale[1] - 2.0).abs() < 1e-5);
        assert!(t.to_matrix().abs_diff_eq(matrix, 1e-5));
    }

    #[test]
    fn test_aabb_from_points() {
        let aabb = Aabb::from_points(&[[1.0, -2.0, 0.0], [-1.0, 4.0, 0.5]]).unwrap();
        assert_eq!(aabb.min, [-1.0, -2.0, 0.0]);
        assert_eq!(aabb.max, [1.0, 4.0, 0.5]);
        assert!(Aabb::from_points(&[]).is_none());
    }

    #[test]
    fn test_aabb_union() {
        let a = Aabb::new([0.0, 0.0, 0.0], [1.0, 1.0, 1.0]);
        let b = Aabb::new([-1.0, 0.5, 0.0], [0.5, 2.0, 1.0]);
        let u = a.union(&b);
        assert_eq!(u.min, [-1.0, 0.0, 0.0]);
        assert_eq!(u.max, [1.0, 2.0, 1.0]);
    }
}
