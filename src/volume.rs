//! SDF volume descriptor
//!
//! Describes the voxel volume an external provider has baked. Read-only to
//! this crate; a volume without a texture, or in `None` mode, disables the
//! tracer for that frame.

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

/// Opaque handle to the provider's 3D SDF texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TextureHandle(pub u64);

impl TextureHandle {
    pub const NULL: Self = Self(0);

    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub const fn is_null(&self) -> bool {
        self.0 == 0
    }
}

/// How the provider maintains its volume
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VolumeMode {
    /// No volume; consumers skip the frame
    #[default]
    None,
    /// Baked once
    Static,
    /// Regenerated at runtime
    Dynamic,
}

/// Per-frame description of an SDF voxel volume
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SdfVolume {
    pub texture: TextureHandle,
    /// Maps world positions into [0, 1]^3 texture coordinates
    pub world_to_tex_coords: Mat4,
    /// World-space size of the voxel bounds
    pub voxel_bounds_size: Vec3,
    pub mode: VolumeMode,
}

impl SdfVolume {
    pub fn new(
        texture: TextureHandle,
        world_to_tex_coords: Mat4,
        voxel_bounds_size: Vec3,
        mode: VolumeMode,
    ) -> Self {
        Self {
            texture,
            world_to_tex_coords,
            voxel_bounds_size,
            mode,
        }
    }

    /// Volume covering an axis-aligned world box
    pub fn from_bounds(texture: TextureHandle, center: Vec3, size: Vec3, mode: VolumeMode) -> Self {
        let world_to_tex_coords = Mat4::from_translation(Vec3::splat(0.5))
            * Mat4::from_scale(size.recip())
            * Mat4::from_translation(-center);
        Self::new(texture, world_to_tex_coords, size, mode)
    }

    #[inline]
    pub fn has_texture(&self) -> bool {
        !self.texture.is_null()
    }

    /// Whether the tracer should run against this volume
    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.has_texture() && self.mode != VolumeMode::None
    }

    /// World-space margin for a fraction of the bounds diagonal
    #[inline]
    pub fn margin_distance(&self, fraction: f32) -> f32 {
        fraction * self.voxel_bounds_size.length()
    }

    /// Transform a world position into texture coordinates
    pub fn world_to_tex(&self, p: Vec3) -> Vec3 {
        self.world_to_tex_coords.transform_point3(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_margin_scales_by_bounds_diagonal() {
        let vol = SdfVolume::from_bounds(
            TextureHandle::new(1),
            Vec3::ZERO,
            Vec3::splat(2.0),
            VolumeMode::Static,
        );
        let expected = 0.3 * 12.0_f32.sqrt();
        assert!((vol.margin_distance(0.3) - expected).abs() < 1e-6);
    }

    #[test]
    fn test_enabled_requires_texture_and_mode() {
        let mut vol = SdfVolume::from_bounds(
            TextureHandle::NULL,
            Vec3::ZERO,
            Vec3::ONE,
            VolumeMode::Static,
        );
        assert!(!vol.is_enabled());
        vol.texture = TextureHandle::new(9);
        assert!(vol.is_enabled());
        vol.mode = VolumeMode::None;
        assert!(!vol.is_enabled());
        assert!(vol.has_texture());
    }

    #[test]
    fn test_from_bounds_maps_corners() {
        let vol = SdfVolume::from_bounds(
            TextureHandle::new(1),
            Vec3::new(1.0, 2.0, 3.0),
            Vec3::new(2.0, 4.0, 8.0),
            VolumeMode::Dynamic,
        );
        let min = vol.world_to_tex(Vec3::new(0.0, 0.0, -1.0));
        let max = vol.world_to_tex(Vec3::new(2.0, 4.0, 7.0));
        assert!((min - Vec3::ZERO).length() < 1e-5);
        assert!((max - Vec3::ONE).length() < 1e-5);
    }
}
