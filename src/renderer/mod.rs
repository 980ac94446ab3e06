//! Renderer-facing marshaling
//!
//! Builds the named-slot bundles the external SDF shaders consume and owns
//! the GPU buffer that carries the jiggle spheres.

pub mod buffer_cache;
pub mod deform;
pub mod params;
pub mod tracer;
pub mod wgpu_backend;

pub use buffer_cache::{BufferAllocator, BufferHandle, GpuBufferCache, HostAllocator};
pub use deform::SdfDeform;
pub use params::{ParamValue, PropertySink, RenderParameterBundle, Slot};
pub use tracer::{Lifecycle, SdfTracer, TracerScene};
pub use wgpu_backend::WgpuBufferAllocator;
