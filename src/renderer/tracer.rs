//! SDF tracer parameter marshaling
//!
//! Every frame the bundle is cleared and refilled from the SDF volume, the
//! scene references, the tracer settings and the jiggle spheres, then handed
//! to the renderer in one call. Steps run in a fixed order and each writes
//! only its own slots:
//! 1. volume guard (disabled volume => empty bundle, nothing else touched)
//! 2. geometry and trace shape
//! 3. lighting
//! 4. scattering
//! 5. sphere buffer

use glam::{Vec3, Vec4};

use super::buffer_cache::{BufferAllocator, GpuBufferCache};
use super::params::{PropertySink, RenderParameterBundle, Slot};
use crate::consts::*;
use crate::error::TracerError;
use crate::scene::{Light, Transform};
use crate::settings::TracerSettings;
use crate::sim::{JiggleSim, SphereGpu};
use crate::volume::SdfVolume;

/// Constant debug color the shader reads from `_Color`
const DEBUG_COLOR: Vec4 = Vec4::new(1.0, 0.0, 0.0, 1.0);

const SPHERE_STRIDE: usize = std::mem::size_of::<SphereGpu>();

/// Ownership state of the tracer's GPU resources
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Nothing allocated yet
    Uninitialized,
    /// Sphere buffer acquired
    Active,
    /// Resources released by teardown; reacquired lazily on next use
    Released,
}

/// Scene references the tracer reads every frame
#[derive(Debug, Clone, Copy, Default)]
pub struct TracerScene {
    /// World position of the traced object
    pub position: Vec3,
    pub bounding_box: Option<Transform>,
    pub light: Option<Light>,
}

/// Per-frame parameter marshaler for the SDF raymarcher
pub struct SdfTracer<A: BufferAllocator> {
    settings: TracerSettings,
    pub scene: TracerScene,
    bundle: RenderParameterBundle,
    spheres_cb: GpuBufferCache<A>,
    lifecycle: Lifecycle,
    volume_enabled: bool,
}

impl<A: BufferAllocator> SdfTracer<A> {
    pub fn new(allocator: A, settings: TracerSettings) -> Self {
        let mut tracer = Self {
            settings,
            scene: TracerScene::default(),
            bundle: RenderParameterBundle::new(),
            spheres_cb: GpuBufferCache::new(allocator, "sdf_spheres"),
            lifecycle: Lifecycle::Uninitialized,
            volume_enabled: false,
        };
        tracer.sanitize_settings();
        tracer
    }

    pub fn settings(&self) -> &TracerSettings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: TracerSettings) {
        self.settings = settings;
        self.sanitize_settings();
    }

    /// Edit settings in place; the result is sanitized once afterwards
    pub fn update_settings(&mut self, edit: impl FnOnce(&mut TracerSettings)) {
        edit(&mut self.settings);
        self.sanitize_settings();
    }

    fn sanitize_settings(&mut self) {
        if self.settings.sanitize() {
            log::info!("Tracer settings coerced to nearest valid values");
        }
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    /// Bundle produced by the last `build_frame`
    pub fn bundle(&self) -> &RenderParameterBundle {
        &self.bundle
    }

    pub fn sphere_buffer(&self) -> &GpuBufferCache<A> {
        &self.spheres_cb
    }

    /// Rebuild the parameter bundle for this frame.
    ///
    /// An absent or disabled volume yields an empty bundle with no buffer
    /// work. A missing box or light reference fails the frame before any
    /// slot or buffer is touched.
    pub fn build_frame(
        &mut self,
        volume: Option<&SdfVolume>,
        spheres: &JiggleSim,
    ) -> Result<&RenderParameterBundle, TracerError> {
        self.bundle.clear();

        let Some(volume) = volume.filter(|v| v.is_enabled()) else {
            if self.volume_enabled {
                log::debug!("SDF volume disabled; tracer idle");
                self.volume_enabled = false;
            }
            return Ok(&self.bundle);
        };
        if !self.volume_enabled {
            log::debug!("SDF volume enabled; tracer active");
            self.volume_enabled = true;
        }

        let bounding_box = self
            .scene
            .bounding_box
            .ok_or(TracerError::MissingReference("bounding box"))?;
        let light = self
            .scene
            .light
            .ok_or(TracerError::MissingReference("light"))?;

        self.write_geometry(volume, &bounding_box);
        self.write_lighting(&light);
        self.write_scattering();
        self.write_spheres(spheres);

        Ok(&self.bundle)
    }

    /// Build the frame and hand it to `sink`. Disabled frames send nothing.
    pub fn update(
        &mut self,
        volume: Option<&SdfVolume>,
        spheres: &JiggleSim,
        sink: &mut impl PropertySink,
    ) -> Result<(), TracerError> {
        let bundle = self.build_frame(volume, spheres)?;
        if !bundle.is_empty() {
            sink.set_property_block(bundle);
        }
        Ok(())
    }

    fn write_geometry(&mut self, volume: &SdfVolume, bounding_box: &Transform) {
        let s = &self.settings;
        let b = &mut self.bundle;

        b.set_color(Slot::Color, DEBUG_COLOR);
        b.set_vector(Slot::BoxSize, (bounding_box.scale * 0.5).extend(0.0));
        b.set_vector(Slot::BoxPos, bounding_box.position.extend(0.0));
        b.set_matrix(Slot::WorldToSdfSpace, volume.world_to_tex_coords);
        b.set_texture(Slot::Sdf, volume.texture);
        b.set_float(Slot::Margin, volume.margin_distance(s.margin));
        b.set_float(Slot::BlendDistance, s.blend_distance);
        b.set_int(Slot::Mode, s.mode.shader_value());
    }

    fn write_lighting(&mut self, light: &Light) {
        let s = &self.settings;
        let b = &mut self.bundle;

        b.set_vector(Slot::LightColor, light.color);
        let dir = light.direction_toward(self.scene.position);
        b.set_vector(Slot::LightDir, dir.extend(0.0));
        b.set_color(Slot::Ambient, s.ambient.extend(1.0));
        b.set_color(Slot::Albedo, s.albedo.extend(1.0));
        b.set_color(Slot::Sky, s.sky.extend(1.0));
    }

    fn write_scattering(&mut self) {
        let s = &self.settings;
        let b = &mut self.bundle;

        b.set_vector(Slot::ScatterParams, s.scatter_params());
        b.set_float(
            Slot::DirScatterAmount,
            s.dir_scatter_amount * DIR_SCATTER_AMOUNT_SCALE,
        );
        b.set_int(Slot::DirScatterMaxIterations, s.dir_scatter_iterations);
        b.set_int(
            Slot::DirScatterMaxIterationsSecondary,
            s.dir_scatter_iterations_secondary,
        );
        b.set_float(Slot::ExtinctionCoeff, s.extinction_coeff);
        // Shader phase function is singular at 1
        b.set_float(Slot::Anisotropy, s.anisotropy.min(MAX_ANISOTROPY));
    }

    fn write_spheres(&mut self, spheres: &JiggleSim) {
        if spheres.is_empty() {
            return;
        }

        let handle = self.spheres_cb.ensure(spheres.len(), SPHERE_STRIDE);
        self.spheres_cb.upload(&spheres.packed());
        self.bundle.set_buffer(Slot::Spheres, handle);
        self.lifecycle = Lifecycle::Active;
    }

    /// Release GPU resources. Call before the host reclaims the tracer or
    /// swaps out its code; safe to call more than once.
    pub fn teardown(&mut self) {
        if self.lifecycle == Lifecycle::Active {
            log::info!("Releasing SDF tracer GPU resources");
        }
        self.spheres_cb.release();
        self.lifecycle = Lifecycle::Released;
    }

    /// Host is about to reload; native handles must not survive it
    pub fn before_reload(&mut self) {
        log::info!("Host reload pending");
        self.teardown();
    }
}

impl<A: BufferAllocator> Drop for SdfTracer<A> {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::buffer_cache::HostAllocator;
    use crate::renderer::params::ParamValue;
    use crate::scene::LightKind;
    use crate::settings::TraceMode;
    use crate::volume::{TextureHandle, VolumeMode};

    fn volume() -> SdfVolume {
        SdfVolume::from_bounds(
            TextureHandle::new(42),
            Vec3::ZERO,
            Vec3::splat(2.0),
            VolumeMode::Static,
        )
    }

    fn tracer() -> SdfTracer<HostAllocator> {
        let mut tracer = SdfTracer::new(HostAllocator::default(), TracerSettings::default());
        tracer.scene = TracerScene {
            position: Vec3::ZERO,
            bounding_box: Some(Transform::at(Vec3::new(0.0, 1.0, 0.0)).with_scale(Vec3::splat(2.0))),
            light: Some(Light::directional(Vec4::ONE, Vec3::NEG_Y)),
        };
        tracer
    }

    fn sim(count: usize) -> JiggleSim {
        let children: Vec<Transform> = (0..count)
            .map(|i| Transform::at(Vec3::new(i as f32, 0.0, 0.0)).with_scale(Vec3::splat(0.4)))
            .collect();
        let mut sim = JiggleSim::default();
        sim.enable(&children, Vec3::ZERO);
        sim
    }

    #[test]
    fn test_absent_volume_is_noop() {
        let mut t = tracer();
        t.update_settings(|s| s.anisotropy = 3.0);
        let mut sink: Vec<RenderParameterBundle> = Vec::new();

        t.update(None, &sim(3), &mut sink).unwrap();

        assert!(t.bundle().is_empty());
        assert!(sink.is_empty());
        assert_eq!(t.sphere_buffer().allocator().allocations, 0);
        assert_eq!(t.sphere_buffer().allocator().uploads, 0);
        assert_eq!(t.lifecycle(), Lifecycle::Uninitialized);
    }

    #[test]
    fn test_none_mode_volume_is_noop() {
        let mut t = tracer();
        let mut vol = volume();
        vol.mode = VolumeMode::None;
        let bundle = t.build_frame(Some(&vol), &sim(2)).unwrap();
        assert!(bundle.is_empty());
        assert_eq!(t.sphere_buffer().allocator().allocations, 0);
    }

    #[test]
    fn test_margin_is_world_distance() {
        let mut t = tracer();
        t.update_settings(|s| s.margin = 0.3);
        let bundle = t.build_frame(Some(&volume()), &sim(0)).unwrap();
        let margin = bundle.float(Slot::Margin).unwrap();
        assert!((margin - 0.3 * 12.0_f32.sqrt()).abs() < 1e-6);
    }

    #[test]
    fn test_anisotropy_clamped_below_one() {
        let mut t = tracer();
        t.update_settings(|s| s.anisotropy = 1.5);
        let bundle = t.build_frame(Some(&volume()), &sim(0)).unwrap();
        assert_eq!(bundle.float(Slot::Anisotropy), Some(0.99));

        t.update_settings(|s| s.anisotropy = -0.4);
        let bundle = t.build_frame(Some(&volume()), &sim(0)).unwrap();
        assert_eq!(bundle.float(Slot::Anisotropy), Some(-0.4));
    }

    #[test]
    fn test_scattering_constants() {
        let mut t = tracer();
        t.update_settings(|s| {
            s.scatter_amount = 0.5;
            s.scatter_start = 0.2;
            s.scatter_iterations = 50;
            s.scatter_max_depth = 2.0;
            s.dir_scatter_amount = 3.0;
        });
        let bundle = t.build_frame(Some(&volume()), &sim(0)).unwrap();

        let p = bundle.vector(Slot::ScatterParams).unwrap();
        assert_eq!(p.x, 25.0);
        assert_eq!(p.y, 0.2);
        assert!((p.z - 0.04).abs() < 1e-7);
        assert_eq!(p.w, 2.0);
        assert!((bundle.float(Slot::DirScatterAmount).unwrap() - 0.003).abs() < 1e-9);
        assert_eq!(bundle.int(Slot::DirScatterMaxIterations), Some(20));
        assert_eq!(bundle.int(Slot::DirScatterMaxIterationsSecondary), Some(10));
    }

    #[test]
    fn test_geometry_slots() {
        let mut t = tracer();
        t.update_settings(|s| s.mode = TraceMode::Spheres);
        let vol = volume();
        let bundle = t.build_frame(Some(&vol), &sim(0)).unwrap();

        assert_eq!(bundle.vector(Slot::BoxSize), Some(Vec4::new(1.0, 1.0, 1.0, 0.0)));
        assert_eq!(bundle.vector(Slot::BoxPos), Some(Vec4::new(0.0, 1.0, 0.0, 0.0)));
        assert_eq!(
            bundle.get(Slot::WorldToSdfSpace),
            Some(ParamValue::Matrix(vol.world_to_tex_coords))
        );
        assert_eq!(
            bundle.get(Slot::Sdf),
            Some(ParamValue::Texture(TextureHandle::new(42)))
        );
        assert_eq!(bundle.int(Slot::Mode), Some(1));
        assert_eq!(bundle.float(Slot::BlendDistance), Some(0.08));
        assert_eq!(bundle.get(Slot::Color), Some(ParamValue::Color(DEBUG_COLOR)));
    }

    #[test]
    fn test_light_direction_policy() {
        let mut t = tracer();
        let bundle = t.build_frame(Some(&volume()), &sim(0)).unwrap();
        assert_eq!(bundle.vector(Slot::LightDir), Some(Vec4::new(0.0, -1.0, 0.0, 0.0)));

        t.scene.position = Vec3::new(3.0, 0.0, 0.0);
        t.scene.light = Some(Light {
            kind: LightKind::Point,
            color: Vec4::new(2.0, 1.0, 0.5, 1.0),
            transform: Transform::at(Vec3::ZERO).with_forward(Vec3::Y),
        });
        let bundle = t.build_frame(Some(&volume()), &sim(0)).unwrap();
        assert_eq!(bundle.vector(Slot::LightDir), Some(Vec4::new(1.0, 0.0, 0.0, 0.0)));
        assert_eq!(bundle.vector(Slot::LightColor), Some(Vec4::new(2.0, 1.0, 0.5, 1.0)));
    }

    #[test]
    fn test_zero_spheres_skips_buffer() {
        let mut t = tracer();
        let bundle = t.build_frame(Some(&volume()), &sim(0)).unwrap();
        assert!(!bundle.contains(Slot::Spheres));
        assert!(bundle.contains(Slot::ScatterParams));
        assert_eq!(t.sphere_buffer().allocator().allocations, 0);
    }

    #[test]
    fn test_sphere_buffer_reused_across_frames() {
        let mut t = tracer();
        let spheres = sim(3);
        let mut sink: Vec<RenderParameterBundle> = Vec::new();

        t.update(Some(&volume()), &spheres, &mut sink).unwrap();
        t.update(Some(&volume()), &spheres, &mut sink).unwrap();

        assert_eq!(sink.len(), 2);
        assert_eq!(sink[0].get(Slot::Spheres), sink[1].get(Slot::Spheres));
        let alloc = t.sphere_buffer().allocator();
        assert_eq!(alloc.allocations, 1);
        assert_eq!(alloc.uploads, 2);
        assert_eq!(t.lifecycle(), Lifecycle::Active);

        match sink[1].get(Slot::Spheres) {
            Some(ParamValue::Buffer(handle)) => {
                assert_eq!(handle.count, 3);
                assert_eq!(handle.stride, 16);
            }
            other => panic!("expected buffer slot, got {other:?}"),
        }
    }

    #[test]
    fn test_sphere_upload_contents() {
        let mut t = tracer();
        let spheres = sim(2);
        t.build_frame(Some(&volume()), &spheres).unwrap();
        let expected = spheres.packed();
        let uploaded = t.sphere_buffer().buffer().unwrap();
        assert_eq!(uploaded.as_slice(), bytemuck::cast_slice::<SphereGpu, u8>(&expected));
    }

    #[test]
    fn test_sphere_count_change_reallocates() {
        let mut t = tracer();
        t.build_frame(Some(&volume()), &sim(3)).unwrap();
        t.build_frame(Some(&volume()), &sim(5)).unwrap();
        let alloc = t.sphere_buffer().allocator();
        assert_eq!(alloc.allocations, 2);
        assert_eq!(alloc.releases, 1);
    }

    #[test]
    fn test_stale_slots_do_not_persist() {
        let mut t = tracer();
        let bundle = t.build_frame(Some(&volume()), &sim(2)).unwrap();
        assert!(bundle.contains(Slot::Spheres));

        let bundle = t.build_frame(Some(&volume()), &sim(0)).unwrap();
        assert!(!bundle.contains(Slot::Spheres));

        let bundle = t.build_frame(None, &sim(0)).unwrap();
        assert!(bundle.is_empty());
    }

    #[test]
    fn test_missing_light_fails_fast() {
        let mut t = tracer();
        t.scene.light = None;
        let mut sink: Vec<RenderParameterBundle> = Vec::new();

        let err = t.update(Some(&volume()), &sim(2), &mut sink).unwrap_err();

        assert!(matches!(err, TracerError::MissingReference("light")));
        assert!(sink.is_empty());
        assert!(t.bundle().is_empty());
        assert_eq!(t.sphere_buffer().allocator().allocations, 0);
    }

    #[test]
    fn test_missing_box_fails_fast() {
        let mut t = tracer();
        t.scene.bounding_box = None;
        let err = t.build_frame(Some(&volume()), &sim(1)).unwrap_err();
        assert!(matches!(err, TracerError::MissingReference("bounding box")));
    }

    #[test]
    fn test_teardown_releases_and_reacquires() {
        let mut t = tracer();
        let spheres = sim(2);
        t.build_frame(Some(&volume()), &spheres).unwrap();

        t.before_reload();
        assert_eq!(t.lifecycle(), Lifecycle::Released);
        assert!(!t.sphere_buffer().is_allocated());
        assert_eq!(t.sphere_buffer().allocator().releases, 1);

        t.teardown();
        assert_eq!(t.sphere_buffer().allocator().releases, 1);

        t.build_frame(Some(&volume()), &spheres).unwrap();
        assert_eq!(t.lifecycle(), Lifecycle::Active);
        assert_eq!(t.sphere_buffer().allocator().live(), 1);
    }

    #[test]
    fn test_settings_sanitized_on_edit() {
        let mut t = tracer();
        t.update_settings(|s| {
            s.scatter_iterations = 0;
            s.margin = 4.0;
        });
        assert_eq!(t.settings().scatter_iterations, 10);
        assert_eq!(t.settings().margin, 1.0);

        t.set_settings(TracerSettings {
            scatter_start: -1.0,
            ..Default::default()
        });
        assert_eq!(t.settings().scatter_start, 0.0001);
    }
}
