//! Scene configuration
//!
//! In-memory settings owned by the host application. Every struct has a
//! `sanitize` pass that coerces out-of-range values to the nearest valid one;
//! it runs when settings change, never per frame.

use std::path::Path;

use glam::{Vec3, Vec4};
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::TracerError;

/// What the raymarcher traces against the SDF
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TraceMode {
    #[default]
    Box,
    Spheres,
}

impl TraceMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TraceMode::Box => "Box",
            TraceMode::Spheres => "Spheres",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "box" => Some(TraceMode::Box),
            "spheres" | "sphere" => Some(TraceMode::Spheres),
            _ => None,
        }
    }

    /// Integer value the shader switches on
    pub fn shader_value(&self) -> i32 {
        match self {
            TraceMode::Box => 0,
            TraceMode::Spheres => 1,
        }
    }
}

/// Spring-damper gains for the jiggle simulation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JiggleSettings {
    /// Gain on the reference displacement (0 - 1)
    pub jiggle_force: f32,
    /// Spring gain pulling spheres back to rest (0 - 1)
    pub return_force: f32,
    /// Fraction of velocity removed per tick (0 - 1)
    pub damping: f32,
    pub distance_falloff_mult: f32,
    pub distance_falloff_power: f32,
}

impl Default for JiggleSettings {
    fn default() -> Self {
        Self {
            jiggle_force: 0.1,
            return_force: 0.1,
            damping: 0.1,
            distance_falloff_mult: 1.0,
            distance_falloff_power: 1.0,
        }
    }
}

impl JiggleSettings {
    /// Clamp gains into their slider ranges. Returns true if anything changed.
    pub fn sanitize(&mut self) -> bool {
        let before = *self;
        self.jiggle_force = self.jiggle_force.clamp(0.0, 1.0);
        self.return_force = self.return_force.clamp(0.0, 1.0);
        self.damping = self.damping.clamp(0.0, 1.0);
        // Negative base or exponent breaks the falloff (NaN, or growth with distance)
        self.distance_falloff_mult = self.distance_falloff_mult.max(0.0);
        self.distance_falloff_power = self.distance_falloff_power.max(0.0);
        *self != before
    }
}

/// Shading and scattering configuration for the SDF tracer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TracerSettings {
    pub mode: TraceMode,
    /// Margin as a fraction of the voxel bounds diagonal (0 - 1)
    pub margin: f32,
    /// Smooth-union distance when blending spheres into the SDF
    pub blend_distance: f32,

    // === Shading ===
    pub ambient: Vec3,
    pub albedo: Vec3,
    /// HDR sky color
    pub sky: Vec3,

    // === Sky scatter ===
    pub scatter_amount: f32,
    pub scatter_start: f32,
    pub scatter_iterations: i32,
    pub scatter_max_depth: f32,

    // === Directional scatter ===
    pub dir_scatter_amount: f32,
    pub extinction_coeff: f32,
    /// Phase function anisotropy; emitted clamped below 1
    pub anisotropy: f32,
    pub dir_scatter_iterations: i32,
    pub dir_scatter_iterations_secondary: i32,
}

impl Default for TracerSettings {
    fn default() -> Self {
        Self {
            mode: TraceMode::Box,
            margin: 0.0,
            blend_distance: 0.08,

            ambient: Vec3::ZERO,
            albedo: Vec3::ONE,
            sky: Vec3::ONE,

            scatter_amount: 1.0,
            scatter_start: 0.05,
            scatter_iterations: 100,
            scatter_max_depth: 1.0,

            dir_scatter_amount: 1.0,
            extinction_coeff: 1.0,
            anisotropy: 0.5,
            dir_scatter_iterations: 20,
            dir_scatter_iterations_secondary: 10,
        }
    }
}

impl TracerSettings {
    /// Coerce invalid values to the nearest valid one. Returns true if anything changed.
    pub fn sanitize(&mut self) -> bool {
        let before = self.clone();

        self.margin = self.margin.clamp(0.0, 1.0);

        self.scatter_amount = self.scatter_amount.max(0.0);
        self.scatter_start = self.scatter_start.max(MIN_SCATTER_START);
        self.scatter_iterations = self.scatter_iterations.max(MIN_SCATTER_ITERATIONS);
        self.scatter_max_depth = self.scatter_max_depth.max(MIN_SCATTER_MAX_DEPTH);

        self.dir_scatter_amount = self.dir_scatter_amount.max(0.0);
        self.extinction_coeff = self.extinction_coeff.max(0.0);

        *self != before
    }

    /// Sky scatter parameters as the shader expects them:
    /// (amount, start distance, step size, max depth)
    pub fn scatter_params(&self) -> Vec4 {
        Vec4::new(
            self.scatter_amount * SKY_SCATTER_AMOUNT_SCALE,
            self.scatter_start,
            self.scatter_max_depth / self.scatter_iterations as f32,
            self.scatter_max_depth,
        )
    }
}

/// Settings for the deform-only SDF binding
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeformSettings {
    /// World-space margin, passed through unscaled
    pub margin: f32,
}

impl Default for DeformSettings {
    fn default() -> Self {
        Self { margin: 0.3 }
    }
}

impl DeformSettings {
    pub fn sanitize(&mut self) -> bool {
        let before = *self;
        self.margin = self.margin.max(0.0);
        *self != before
    }
}

/// All scene configuration, as loaded from disk
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneSettings {
    /// Seed for procedural scene layout
    pub seed: u64,
    pub jiggle: JiggleSettings,
    pub tracer: TracerSettings,
    pub deform: DeformSettings,
}

impl SceneSettings {
    /// Sanitize every section. Returns true if anything changed.
    pub fn sanitize(&mut self) -> bool {
        let jiggle = self.jiggle.sanitize();
        let tracer = self.tracer.sanitize();
        let deform = self.deform.sanitize();
        jiggle || tracer || deform
    }

    /// Parse settings from JSON (missing fields take defaults)
    pub fn from_json(json: &str) -> Result<Self, TracerError> {
        let mut settings: Self = serde_json::from_str(json)?;
        if settings.sanitize() {
            log::info!("Settings contained out-of-range values; coerced to nearest valid");
        }
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, TracerError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TracerError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }
}
