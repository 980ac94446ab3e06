//! SDF Jiggle - jiggle-sphere secondary motion for an SDF volumetric raymarcher
//!
//! Core modules:
//! - `sim`: Deterministic jiggle simulation (sphere bodies, spring-damper tick)
//! - `volume`: SDF volume descriptor supplied by an external baker
//! - `renderer`: Per-frame parameter bundles, sphere GPU buffer, marshalers
//! - `scene`: Transform and light snapshots from the host scene graph
//! - `settings`: Serializable configuration with sanitize-on-edit
//!
//! Per frame: tick the simulator with the reference position, then let the
//! tracer build and hand off its parameter bundle.

pub mod error;
pub mod renderer;
pub mod scene;
pub mod settings;
pub mod sim;
pub mod volume;

pub use error::TracerError;
pub use renderer::{RenderParameterBundle, SdfDeform, SdfTracer};
pub use settings::{DeformSettings, JiggleSettings, SceneSettings, TraceMode, TracerSettings};
pub use sim::JiggleSim;
pub use volume::{SdfVolume, TextureHandle, VolumeMode};

/// Tuning constants shared with the shaders
pub mod consts {
    /// Added to sphere-reference distance so the falloff stays finite
    pub const FALLOFF_EPSILON: f32 = 0.1;

    /// Sky scatter amount multiplier
    pub const SKY_SCATTER_AMOUNT_SCALE: f32 = 50.0;
    /// Directional scatter amount multiplier
    pub const DIR_SCATTER_AMOUNT_SCALE: f32 = 0.001;
    /// Upper bound on emitted phase anisotropy
    pub const MAX_ANISOTROPY: f32 = 0.99;

    /// Sanitize floors
    pub const MIN_SCATTER_START: f32 = 0.0001;
    pub const MIN_SCATTER_ITERATIONS: i32 = 10;
    pub const MIN_SCATTER_MAX_DEPTH: f32 = 0.1;
}
