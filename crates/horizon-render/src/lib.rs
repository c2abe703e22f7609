//! wgpu rendering for the clipmap: headless GPU setup, block buffers, the
//! triangle-strip pipeline, and a [`GraphicsBackend`](horizon_clipmap::GraphicsBackend)
//! that replays a frame's draws into a render pass.

pub mod backend;
pub mod buffer;
pub mod camera;
pub mod gpu;
pub mod pipeline;
pub mod shader;

pub use backend::{
    BackendError, MeshHandle, ProgramHandle, WgpuBackend, pack_draw_uniforms,
    restart_index_supported,
};
pub use buffer::{BufferAllocator, MeshBuffer, UploadError, check_buffer, grid_vertex_layout};
pub use camera::{Camera, Projection};
pub use gpu::{GpuContext, GpuContextError, init_gpu_context_blocking, required_limits};
pub use pipeline::{
    CLIPMAP_SHADER_SOURCE, CameraUniform, ClipmapBindGroupLayouts, ClipmapPipeline, DrawUniform,
    draw_uniform_stride,
};
pub use shader::{ShaderError, ShaderLibrary, embedded_source};
