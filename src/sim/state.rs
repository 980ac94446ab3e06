//! Jiggle simulation state
//!
//! Sphere bodies are snapshotted from child transforms when the group is
//! enabled; the count is fixed until the next enable.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::scene::Transform;
use crate::settings::JiggleSettings;

/// A simulated sphere
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SphereBody {
    pub position: Vec3,
    /// Position captured at enable time; the return spring pulls toward it
    pub rest_position: Vec3,
    pub velocity: Vec3,
    radius: f32,
}

impl SphereBody {
    pub fn new(position: Vec3, radius: f32) -> Self {
        Self {
            position,
            rest_position: position,
            velocity: Vec3::ZERO,
            radius,
        }
    }

    /// Sphere at rest on a child transform (radius is half the x scale)
    pub fn from_transform(t: &Transform) -> Self {
        Self::new(t.position, t.scale.x * 0.5)
    }

    #[inline]
    pub fn radius(&self) -> f32 {
        self.radius
    }

    #[inline]
    pub fn offset_from_rest(&self) -> Vec3 {
        self.position - self.rest_position
    }

    pub fn gpu(&self) -> SphereGpu {
        SphereGpu {
            position: self.position.to_array(),
            radius: self.radius,
        }
    }
}

/// Sphere record as laid out in the GPU buffer (xyz = position, w = radius)
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct SphereGpu {
    pub position: [f32; 3],
    pub radius: f32,
}

/// Reference position observed at the end of the previous tick
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ReferenceMotion {
    pub previous_position: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimPhase {
    /// No sphere store yet
    Uninitialized,
    Active,
}

/// Jiggle simulator: owns the sphere store and the lagged reference
#[derive(Debug, Clone)]
pub struct JiggleSim {
    pub(super) phase: SimPhase,
    pub(super) settings: JiggleSettings,
    pub(super) spheres: Vec<SphereBody>,
    pub(super) reference: ReferenceMotion,
}

impl Default for JiggleSim {
    fn default() -> Self {
        Self::new(JiggleSettings::default())
    }
}

impl JiggleSim {
    pub fn new(mut settings: JiggleSettings) -> Self {
        settings.sanitize();
        Self {
            phase: SimPhase::Uninitialized,
            settings,
            spheres: Vec::new(),
            reference: ReferenceMotion::default(),
        }
    }

    /// (Re)build the sphere store from the current child transforms.
    ///
    /// Any previous state, velocities included, is discarded.
    pub fn enable(&mut self, children: &[Transform], reference_position: Vec3) {
        self.spheres = children.iter().map(SphereBody::from_transform).collect();
        self.reference.previous_position = reference_position;
        self.phase = SimPhase::Active;
        log::info!("Jiggle simulation enabled with {} spheres", self.spheres.len());
    }

    pub fn phase(&self) -> SimPhase {
        self.phase
    }

    pub fn is_active(&self) -> bool {
        self.phase == SimPhase::Active
    }

    pub fn spheres(&self) -> &[SphereBody] {
        &self.spheres
    }

    pub fn len(&self) -> usize {
        self.spheres.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spheres.is_empty()
    }

    pub fn reference(&self) -> ReferenceMotion {
        self.reference
    }

    pub fn settings(&self) -> &JiggleSettings {
        &self.settings
    }

    /// Replace the gains (sanitized on the way in)
    pub fn set_settings(&mut self, mut settings: JiggleSettings) {
        if settings.sanitize() {
            log::info!("Jiggle settings coerced into range: {:?}", settings);
        }
        self.settings = settings;
    }

    /// Current position + radius records for upload
    pub fn packed(&self) -> Vec<SphereGpu> {
        self.spheres.iter().map(SphereBody::gpu).collect()
    }
}
