//! Deterministic jiggle simulation
//!
//! Secondary motion for a small group of spheres. This module must stay pure:
//! - One fixed step per tick, no sub-stepping
//! - Stable iteration order (child order at enable time)
//! - No rendering or platform dependencies

pub mod state;
pub mod tick;

pub use state::{JiggleSim, ReferenceMotion, SimPhase, SphereBody, SphereGpu};
pub use tick::falloff;
