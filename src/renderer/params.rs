//! Render parameter bundle
//!
//! Named shader slots and the per-frame bundle that carries their values to
//! the external renderer. Slot names are resolved to IDs once per process.

use std::collections::HashMap;
use std::sync::LazyLock;

use glam::{Mat4, Vec4};

use super::buffer_cache::BufferHandle;
use crate::volume::TextureHandle;

/// Shader parameter slots
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Slot {
    Color,
    BoxSize,
    BoxPos,
    WorldToSdfSpace,
    Sdf,
    Margin,
    ScatterParams,
    LightColor,
    LightDir,
    Ambient,
    Albedo,
    Sky,
    DirScatterAmount,
    DirScatterMaxIterations,
    DirScatterMaxIterationsSecondary,
    ExtinctionCoeff,
    Anisotropy,
    Spheres,
    BlendDistance,
    Mode,
    WorldToSdf,
}

static SLOT_IDS: LazyLock<HashMap<&'static str, Slot>> =
    LazyLock::new(|| Slot::ALL.iter().map(|s| (s.name(), *s)).collect());

impl Slot {
    pub const ALL: [Slot; 21] = [
        Slot::Color,
        Slot::BoxSize,
        Slot::BoxPos,
        Slot::WorldToSdfSpace,
        Slot::Sdf,
        Slot::Margin,
        Slot::ScatterParams,
        Slot::LightColor,
        Slot::LightDir,
        Slot::Ambient,
        Slot::Albedo,
        Slot::Sky,
        Slot::DirScatterAmount,
        Slot::DirScatterMaxIterations,
        Slot::DirScatterMaxIterationsSecondary,
        Slot::ExtinctionCoeff,
        Slot::Anisotropy,
        Slot::Spheres,
        Slot::BlendDistance,
        Slot::Mode,
        Slot::WorldToSdf,
    ];

    /// Shader-side property name
    pub const fn name(self) -> &'static str {
        match self {
            Slot::Color => "_Color",
            Slot::BoxSize => "_BoxSize",
            Slot::BoxPos => "_BoxPos",
            Slot::WorldToSdfSpace => "_WorldToSDFSpace",
            Slot::Sdf => "_SDF",
            Slot::Margin => "_Margin",
            Slot::ScatterParams => "_ScatterParams",
            Slot::LightColor => "_LightColor",
            Slot::LightDir => "_LightDir",
            Slot::Ambient => "_Ambient",
            Slot::Albedo => "_Albedo",
            Slot::Sky => "_Sky",
            Slot::DirScatterAmount => "_DirScatterAmount",
            Slot::DirScatterMaxIterations => "_DirScatterMaxIterations",
            Slot::DirScatterMaxIterationsSecondary => "_DirScatterMaxIterationsSecondary",
            Slot::ExtinctionCoeff => "_ExtinctionCoeff",
            Slot::Anisotropy => "_Anisotropy",
            Slot::Spheres => "_Spheres",
            Slot::BlendDistance => "_BlendDistance",
            Slot::Mode => "_Mode",
            Slot::WorldToSdf => "_WorldToSDF",
        }
    }

    /// Stable integer ID
    #[inline]
    pub const fn id(self) -> u32 {
        self as u32
    }

    /// Resolve a shader property name
    pub fn from_name(name: &str) -> Option<Slot> {
        SLOT_IDS.get(name).copied()
    }
}

/// A typed slot value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamValue {
    Color(Vec4),
    Vector(Vec4),
    Matrix(Mat4),
    Float(f32),
    Int(i32),
    Texture(TextureHandle),
    Buffer(BufferHandle),
}

/// Ordered slot -> value mapping, rebuilt from scratch every frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderParameterBundle {
    entries: Vec<(Slot, ParamValue)>,
}

impl RenderParameterBundle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Set a slot, replacing any earlier value in place
    pub fn set(&mut self, slot: Slot, value: ParamValue) {
        match self.entries.iter_mut().find(|(s, _)| *s == slot) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((slot, value)),
        }
    }

    pub fn set_color(&mut self, slot: Slot, color: Vec4) {
        self.set(slot, ParamValue::Color(color));
    }

    pub fn set_vector(&mut self, slot: Slot, v: Vec4) {
        self.set(slot, ParamValue::Vector(v));
    }

    pub fn set_matrix(&mut self, slot: Slot, m: Mat4) {
        self.set(slot, ParamValue::Matrix(m));
    }

    pub fn set_float(&mut self, slot: Slot, f: f32) {
        self.set(slot, ParamValue::Float(f));
    }

    pub fn set_int(&mut self, slot: Slot, i: i32) {
        self.set(slot, ParamValue::Int(i));
    }

    pub fn set_texture(&mut self, slot: Slot, texture: TextureHandle) {
        self.set(slot, ParamValue::Texture(texture));
    }

    pub fn set_buffer(&mut self, slot: Slot, buffer: BufferHandle) {
        self.set(slot, ParamValue::Buffer(buffer));
    }

    pub fn get(&self, slot: Slot) -> Option<ParamValue> {
        self.entries
            .iter()
            .find(|(s, _)| *s == slot)
            .map(|(_, v)| *v)
    }

    pub fn float(&self, slot: Slot) -> Option<f32> {
        match self.get(slot) {
            Some(ParamValue::Float(f)) => Some(f),
            _ => None,
        }
    }

    pub fn int(&self, slot: Slot) -> Option<i32> {
        match self.get(slot) {
            Some(ParamValue::Int(i)) => Some(i),
            _ => None,
        }
    }

    /// Vector or color slot
    pub fn vector(&self, slot: Slot) -> Option<Vec4> {
        match self.get(slot) {
            Some(ParamValue::Vector(v) | ParamValue::Color(v)) => Some(v),
            _ => None,
        }
    }

    pub fn contains(&self, slot: Slot) -> bool {
        self.entries.iter().any(|(s, _)| *s == slot)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(Slot, ParamValue)> {
        self.entries.iter()
    }
}

/// Receives a complete bundle once per frame (no partial updates)
pub trait PropertySink {
    fn set_property_block(&mut self, bundle: &RenderParameterBundle);
}

/// Records every bundle it receives
impl PropertySink for Vec<RenderParameterBundle> {
    fn set_property_block(&mut self, bundle: &RenderParameterBundle) {
        self.push(bundle.clone());
    }
}
