//! Scene-graph inputs
//!
//! Plain snapshots of the host's transforms and lights. The host owns the
//! real scene graph; these are what it hands over each frame.

use glam::{Vec3, Vec4};

/// World-space snapshot of a transform
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    /// Local scale (x is used as the sphere diameter)
    pub scale: Vec3,
    /// Unit forward axis
    pub forward: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            scale: Vec3::ONE,
            forward: Vec3::Z,
        }
    }
}

impl Transform {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_forward(mut self, forward: Vec3) -> Self {
        self.forward = forward.normalize_or_zero();
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightKind {
    Directional,
    Point,
    Spot,
}

/// A light source as seen by the tracer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    pub kind: LightKind,
    /// Linear RGBA color (intensity folded in)
    pub color: Vec4,
    pub transform: Transform,
}

impl Light {
    pub fn directional(color: Vec4, forward: Vec3) -> Self {
        Self {
            kind: LightKind::Directional,
            color,
            transform: Transform::default().with_forward(forward),
        }
    }

    pub fn point(color: Vec4, position: Vec3) -> Self {
        Self {
            kind: LightKind::Point,
            color,
            transform: Transform::at(position),
        }
    }

    /// Light direction used for shading an object at `receiver`.
    ///
    /// Only directional lights are modelled properly. Point and spot lights
    /// are approximated by a single direction from the light to the
    /// receiving object, which ignores per-pixel direction and attenuation.
    pub fn direction_toward(&self, receiver: Vec3) -> Vec3 {
        match self.kind {
            LightKind::Directional => self.transform.forward,
            LightKind::Point | LightKind::Spot => {
                (receiver - self.transform.position).normalize_or_zero()
            }
        }
    }
}
