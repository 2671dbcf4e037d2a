use glam::{EulerRot, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Location of a scene node in world space.
///
/// Stored as f32; motion maths done in f64 is rounded on write.
pub type Position = Vec3;

/// Spatial transform: position, rotation, scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Position,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    /// Build a transform from a position, XYZ Euler angles in radians and a
    /// uniform scale factor.
    pub fn from_placement(position: Vec3, euler_xyz: Vec3, uniform_scale: f32) -> Self {
        Self {
            position,
            rotation: Quat::from_euler(EulerRot::XYZ, euler_xyz.x, euler_xyz.y, euler_xyz.z),
            scale: Vec3::splat(uniform_scale),
        }
    }
}

/// Axis-aligned bounding box in model space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Default for Aabb {
    /// Unit cube centred on the origin.
    fn default() -> Self {
        Self {
            min: Vec3::splat(-0.5),
            max: Vec3::splat(0.5),
        }
    }
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Smallest box containing both `self` and `other`.
    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }
}

/// Physically based surface parameters for a drawn model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Surface {
    /// Linear RGBA base colour.
    pub base_color: [f32; 4],
    pub metalness: f32,
    pub roughness: f32,
}

impl Default for Surface {
    fn default() -> Self {
        Self {
            base_color: [0.8, 0.8, 0.8, 1.0],
            metalness: 0.0,
            roughness: 1.0,
        }
    }
}

impl Surface {
    /// Surface from a packed `0xRRGGBB` sRGB colour.
    pub fn from_hex(rgb: u32, metalness: f32, roughness: f32) -> Self {
        let channel = |shift: u32| srgb_to_linear(((rgb >> shift) & 0xff) as f32 / 255.0);
        Self {
            base_color: [channel(16), channel(8), channel(0), 1.0],
            metalness,
            roughness,
        }
    }
}

fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transform_default_is_identity() {
        let t = Transform::default();
        assert_eq!(t.position, Vec3::ZERO);
        assert_eq!(t.rotation, Quat::IDENTITY);
        assert_eq!(t.scale, Vec3::ONE);
    }

    #[test]
    fn placement_applies_uniform_scale() {
        let t = Transform::from_placement(Vec3::new(1.0, 0.3, 0.2), Vec3::ZERO, 0.005);
        assert_eq!(t.scale, Vec3::splat(0.005));
        assert_eq!(t.position, Vec3::new(1.0, 0.3, 0.2));
        assert!(t.rotation.abs_diff_eq(Quat::IDENTITY, 1e-6));
    }

    #[test]
    fn aabb_new_orders_corners() {
        let b = Aabb::new(Vec3::new(1.0, -1.0, 2.0), Vec3::new(-1.0, 1.0, 0.0));
        assert_eq!(b.min, Vec3::new(-1.0, -1.0, 0.0));
        assert_eq!(b.max, Vec3::new(1.0, 1.0, 2.0));
        assert_eq!(b.center(), Vec3::new(0.0, 0.0, 1.0));
        assert_eq!(b.size(), Vec3::new(2.0, 2.0, 2.0));
    }

    #[test]
    fn aabb_union_covers_both() {
        let a = Aabb::new(Vec3::ZERO, Vec3::ONE);
        let b = Aabb::new(Vec3::splat(-2.0), Vec3::splat(-1.0));
        let u = a.union(&b);
        assert_eq!(u.min, Vec3::splat(-2.0));
        assert_eq!(u.max, Vec3::ONE);
    }

    #[test]
    fn surface_from_hex_is_linear() {
        let s = Surface::from_hex(0xffffff, 0.9, 0.1);
        assert_eq!(s.base_color, [1.0, 1.0, 1.0, 1.0]);
        let black = Surface::from_hex(0x000000, 0.0, 1.0);
        assert_eq!(black.base_color, [0.0, 0.0, 0.0, 1.0]);
        let green = Surface::from_hex(0x1daa21, 0.9, 0.1);
        assert!(green.base_color[1] > green.base_color[0]);
        assert!(green.base_color[1] > green.base_color[2]);
    }
}
