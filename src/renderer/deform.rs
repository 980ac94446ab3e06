//! Deform-only SDF binding
//!
//! Binds the SDF texture, its transform and a raw world-space margin for
//! materials that displace geometry by the field.

use super::params::{PropertySink, RenderParameterBundle, Slot};
use crate::settings::DeformSettings;
use crate::volume::SdfVolume;

pub struct SdfDeform {
    settings: DeformSettings,
    bundle: RenderParameterBundle,
}

impl SdfDeform {
    pub fn new(mut settings: DeformSettings) -> Self {
        settings.sanitize();
        Self {
            settings,
            bundle: RenderParameterBundle::new(),
        }
    }

    pub fn settings(&self) -> &DeformSettings {
        &self.settings
    }

    pub fn set_settings(&mut self, mut settings: DeformSettings) {
        if settings.sanitize() {
            log::info!("Deform margin coerced to {}", settings.margin);
        }
        self.settings = settings;
    }

    /// Only a missing texture disables the binding; volume mode is ignored.
    pub fn build_frame(&mut self, volume: Option<&SdfVolume>) -> &RenderParameterBundle {
        self.bundle.clear();
        if let Some(volume) = volume.filter(|v| v.has_texture()) {
            self.bundle.set_texture(Slot::Sdf, volume.texture);
            self.bundle
                .set_matrix(Slot::WorldToSdf, volume.world_to_tex_coords);
            self.bundle.set_float(Slot::Margin, self.settings.margin);
        }
        &self.bundle
    }

    pub fn update(&mut self, volume: Option<&SdfVolume>, sink: &mut impl PropertySink) {
        let bundle = self.build_frame(volume);
        if !bundle.is_empty() {
            sink.set_property_block(bundle);
        }
    }
}
