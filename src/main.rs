//! SDF Jiggle headless demo
//!
//! Drives a ring of jiggle spheres around a moving reference and runs the
//! tracer each frame against a CPU-side buffer allocator.
//!
//! Usage: `sdf-jiggle [settings.json]`

use std::f32::consts::TAU;
use std::process::ExitCode;

use glam::{Vec3, Vec4};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use sdf_jiggle::renderer::{HostAllocator, PropertySink, RenderParameterBundle, Slot, TracerScene};
use sdf_jiggle::scene::{Light, Transform};
use sdf_jiggle::{JiggleSim, SceneSettings, SdfDeform, SdfTracer, SdfVolume, TextureHandle, VolumeMode};

const FRAMES: u32 = 240;
const RING_SPHERES: usize = 8;
const RING_RADIUS: f32 = 0.6;
/// Frame at which a host reload is simulated
const RELOAD_FRAME: u32 = 120;

/// Sink that logs a short digest of each bundle
#[derive(Default)]
struct LoggingSink {
    frames: u32,
}

impl PropertySink for LoggingSink {
    fn set_property_block(&mut self, bundle: &RenderParameterBundle) {
        self.frames += 1;
        if self.frames % 60 == 1 {
            log::debug!(
                "frame {}: {} slots, margin {:?}, spheres bound: {}",
                self.frames,
                bundle.len(),
                bundle.float(Slot::Margin),
                bundle.contains(Slot::Spheres)
            );
        }
    }
}

fn ring_children(seed: u64) -> Vec<Transform> {
    let mut rng = Pcg32::seed_from_u64(seed);
    (0..RING_SPHERES)
        .map(|i| {
            let theta = i as f32 / RING_SPHERES as f32 * TAU;
            let jitter = Vec3::new(
                rng.random_range(-0.05..0.05),
                rng.random_range(-0.05..0.05),
                rng.random_range(-0.05..0.05),
            );
            let pos = Vec3::new(theta.cos(), 0.0, theta.sin()) * RING_RADIUS + jitter;
            let diameter = rng.random_range(0.2..0.4);
            Transform::at(pos).with_scale(Vec3::splat(diameter))
        })
        .collect()
}

/// Reference path: small horizontal circle with a vertical bob
fn reference_at(frame: u32) -> Vec3 {
    let t = frame as f32 / 60.0;
    Vec3::new((t * 2.0).cos() * 0.2, (t * 5.0).sin() * 0.1, (t * 2.0).sin() * 0.2)
}

fn run(settings: SceneSettings) -> Result<(), sdf_jiggle::TracerError> {
    let volume = SdfVolume::from_bounds(
        TextureHandle::new(1),
        Vec3::ZERO,
        Vec3::splat(2.0),
        VolumeMode::Static,
    );

    let mut sim = JiggleSim::new(settings.jiggle);
    sim.enable(&ring_children(settings.seed), reference_at(0));

    let mut tracer = SdfTracer::new(HostAllocator::default(), settings.tracer.clone());
    tracer.scene = TracerScene {
        position: Vec3::ZERO,
        bounding_box: Some(Transform::at(Vec3::ZERO).with_scale(Vec3::splat(1.5))),
        light: Some(Light::directional(Vec4::new(1.0, 0.95, 0.9, 1.0), Vec3::new(-0.3, -1.0, 0.2))),
    };
    let mut deform = SdfDeform::new(settings.deform);

    let mut tracer_sink = LoggingSink::default();
    let mut deform_sink: Vec<RenderParameterBundle> = Vec::new();

    for frame in 1..=FRAMES {
        sim.tick(reference_at(frame));
        tracer.update(Some(&volume), &sim, &mut tracer_sink)?;
        deform.update(Some(&volume), &mut deform_sink);

        if frame == RELOAD_FRAME {
            tracer.before_reload();
        }
    }

    let max_offset = sim
        .spheres()
        .iter()
        .map(|s| s.offset_from_rest().length())
        .fold(0.0_f32, f32::max);
    let alloc = tracer.sphere_buffer().allocator();

    log::info!("Simulated {} frames with {} spheres", FRAMES, sim.len());
    log::info!("Max sphere offset from rest: {:.4}", max_offset);
    log::info!(
        "Sphere buffer: {} allocations, {} releases, {} uploads",
        alloc.allocations,
        alloc.releases,
        alloc.uploads
    );
    log::info!(
        "Bundles sent: tracer {}, deform {}",
        tracer_sink.frames,
        deform_sink.len()
    );

    tracer.teardown();
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("SDF Jiggle (headless) starting...");

    let settings = match std::env::args().nth(1) {
        Some(path) => match SceneSettings::load(&path) {
            Ok(settings) => settings,
            Err(e) => {
                log::error!("Failed to load settings from {}: {}", path, e);
                return ExitCode::FAILURE;
            }
        },
        None => {
            log::info!("Using default settings");
            SceneSettings::default()
        }
    };

    match run(settings) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("Tracer frame failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
