//! Fixed-step jiggle tick
//!
//! Forward-Euler spring-damper integration, one step per frame. Per sphere:
//! jiggle force from the lagged reference displacement (attenuated by
//! distance), then the return spring, then damping on the combined velocity,
//! then position integration.

use glam::Vec3;

use super::state::JiggleSim;
use crate::consts::FALLOFF_EPSILON;

/// Attenuation of the jiggle force for a sphere `distance` from the reference
#[inline]
pub fn falloff(distance: f32, mult: f32, power: f32) -> f32 {
    (mult / (distance + FALLOFF_EPSILON)).powf(power)
}

impl JiggleSim {
    /// Advance every sphere by one tick toward `reference_position`.
    ///
    /// No-op until the simulator has been enabled.
    pub fn tick(&mut self, reference_position: Vec3) {
        if !self.is_active() {
            return;
        }

        let s = self.settings;
        let displacement = reference_position - self.reference.previous_position;
        let jiggle_force = displacement * s.jiggle_force;

        for sphere in &mut self.spheres {
            let distance = (sphere.position - reference_position).length();
            let f = falloff(distance, s.distance_falloff_mult, s.distance_falloff_power);

            let mut v = sphere.velocity;
            v += jiggle_force * f;
            v += (sphere.rest_position - sphere.position) * s.return_force;
            v *= 1.0 - s.damping;

            sphere.position += v;
            sphere.velocity = v;
        }

        // Stored after integration so the next tick sees a one-tick lag
        self.reference.previous_position = reference_position;
    }
}
