//! [`GraphicsBackend`] implementation on top of wgpu.
//!
//! wgpu has no immediate-mode state, so the backend records the clipmap's
//! command stream into a draw list. A frame goes through three steps:
//!
//! 1. [`WgpuBackend::begin_frame`] clears the previous draw list.
//! 2. [`Clipmap::draw`](horizon_clipmap::Clipmap::draw) records draws.
//! 3. [`WgpuBackend::prepare`] writes the uniforms, then
//!    [`WgpuBackend::encode`] replays the draws into a render pass.

use std::collections::HashMap;
use std::num::NonZeroU64;

use glam::Mat4;
use horizon_clipmap::{BlockMesh, FillMode, GraphicsBackend, PRIMITIVE_RESTART, Uniform};

use crate::buffer::{BufferAllocator, MeshBuffer, UploadError};
use crate::pipeline::{
    CAMERA_UNIFORM_SIZE, CameraUniform, ClipmapBindGroupLayouts, ClipmapPipeline,
    DRAW_UNIFORM_SIZE, DrawUniform, draw_uniform_stride,
};
use crate::shader::{ShaderError, ShaderLibrary};

/// Draw slots allocated before the first frame. The reference clipmap needs 79.
const INITIAL_DRAW_CAPACITY: usize = 128;

/// Handle to a mesh uploaded to a [`WgpuBackend`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshHandle(usize);

/// Handle to a pipeline pair created by a [`WgpuBackend`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramHandle(usize);

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error(transparent)]
    Shader(#[from] ShaderError),
}

/// One recorded strip draw.
#[derive(Debug, Clone, Copy, PartialEq)]
struct DrawCommand {
    program: ProgramHandle,
    mesh: MeshHandle,
    index_count: u32,
    mode: FillMode,
}

/// Uniform buffers and their bind groups.
struct FrameResources {
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    draw_buffer: wgpu::Buffer,
    draw_bind_group: wgpu::BindGroup,
    capacity: usize,
}

impl FrameResources {
    fn new(device: &wgpu::Device, layouts: &ClipmapBindGroupLayouts, stride: u64, capacity: usize) -> Self {
        let camera_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("clipmap-camera-uniforms"),
            size: CAMERA_UNIFORM_SIZE,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("clipmap-camera-bind-group"),
            layout: &layouts.camera,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });

        let draw_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("clipmap-draw-uniforms"),
            size: stride * capacity as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let draw_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("clipmap-draw-bind-group"),
            layout: &layouts.draw,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &draw_buffer,
                    offset: 0,
                    size: NonZeroU64::new(DRAW_UNIFORM_SIZE),
                }),
            }],
        });

        Self {
            camera_buffer,
            camera_bind_group,
            draw_buffer,
            draw_bind_group,
            capacity,
        }
    }
}

/// Pack per-draw uniforms at `stride`-byte intervals.
pub fn pack_draw_uniforms(uniforms: &[DrawUniform], stride: u64) -> Vec<u8> {
    let stride = stride as usize;
    let mut bytes = vec![0u8; uniforms.len() * stride];
    for (slot, uniform) in bytes.chunks_exact_mut(stride).zip(uniforms) {
        slot[..DRAW_UNIFORM_SIZE as usize].copy_from_slice(bytemuck::bytes_of(uniform));
    }
    bytes
}

/// Draws clipmap blocks with wgpu.
pub struct WgpuBackend {
    device: wgpu::Device,
    color_format: wgpu::TextureFormat,
    depth_format: Option<wgpu::TextureFormat>,
    layouts: ClipmapBindGroupLayouts,
    shaders: ShaderLibrary,
    programs: HashMap<String, ProgramHandle>,
    pipelines: Vec<ClipmapPipeline>,
    meshes: Vec<MeshBuffer>,
    resources: FrameResources,
    stride: u64,

    camera: CameraUniform,
    model: Mat4,
    level: f32,
    program: Option<ProgramHandle>,
    bound: Option<MeshHandle>,
    mode: FillMode,
    draws: Vec<DrawCommand>,
    uniforms: Vec<DrawUniform>,
    prepared: usize,
}

impl WgpuBackend {
    pub fn new(
        device: &wgpu::Device,
        color_format: wgpu::TextureFormat,
        depth_format: Option<wgpu::TextureFormat>,
    ) -> Self {
        let layouts = ClipmapBindGroupLayouts::new(device);
        let stride = draw_uniform_stride(device.limits().min_uniform_buffer_offset_alignment);
        let resources = FrameResources::new(device, &layouts, stride, INITIAL_DRAW_CAPACITY);

        Self {
            device: device.clone(),
            color_format,
            depth_format,
            layouts,
            shaders: ShaderLibrary::new(),
            programs: HashMap::new(),
            pipelines: Vec::new(),
            meshes: Vec::new(),
            resources,
            stride,
            camera: CameraUniform::default(),
            model: Mat4::IDENTITY,
            level: 0.0,
            program: None,
            bound: None,
            mode: FillMode::Fill,
            draws: Vec::new(),
            uniforms: Vec::new(),
            prepared: 0,
        }
    }

    /// Forget the previous frame's draws.
    pub fn begin_frame(&mut self) {
        self.draws.clear();
        self.uniforms.clear();
        self.prepared = 0;
    }

    /// Upload this frame's uniforms, growing the draw buffer if needed.
    pub fn prepare(&mut self, queue: &wgpu::Queue) {
        if self.draws.len() > self.resources.capacity {
            let capacity = self.draws.len().next_power_of_two();
            log::debug!("Growing clipmap draw buffer to {} slots", capacity);
            self.resources = FrameResources::new(&self.device, &self.layouts, self.stride, capacity);
        }

        queue.write_buffer(
            &self.resources.camera_buffer,
            0,
            bytemuck::bytes_of(&self.camera),
        );
        if !self.uniforms.is_empty() {
            let bytes = pack_draw_uniforms(&self.uniforms, self.stride);
            queue.write_buffer(&self.resources.draw_buffer, 0, &bytes);
        }
        self.prepared = self.draws.len();
    }

    /// Replay the prepared draws into a render pass.
    pub fn encode<'a>(&'a self, render_pass: &mut wgpu::RenderPass<'a>) {
        if self.prepared < self.draws.len() {
            log::warn!(
                "{} clipmap draws recorded after prepare() were skipped",
                self.draws.len() - self.prepared
            );
        }

        render_pass.set_bind_group(0, &self.resources.camera_bind_group, &[]);
        let mut current: Option<(ProgramHandle, FillMode)> = None;
        for (slot, draw) in self.draws[..self.prepared].iter().enumerate() {
            if current != Some((draw.program, draw.mode)) {
                render_pass.set_pipeline(self.pipelines[draw.program.0].select(draw.mode));
                current = Some((draw.program, draw.mode));
            }
            let offset = (slot as u64 * self.stride) as u32;
            render_pass.set_bind_group(1, &self.resources.draw_bind_group, &[offset]);
            let mesh = &self.meshes[draw.mesh.0];
            mesh.bind(render_pass);
            render_pass.draw_indexed(0..draw.index_count, 0, 0..1);
        }
    }

    /// Draws recorded since [`begin_frame`](Self::begin_frame).
    pub fn draw_count(&self) -> usize {
        self.draws.len()
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    pub fn supports_wireframe(&self) -> bool {
        self.device
            .features()
            .contains(wgpu::Features::POLYGON_MODE_LINE)
    }
}

/// Whether the strip pipeline honours a requested restart index.
///
/// The pipeline's `strip_index_format` is fixed at `Uint32`, so wgpu restarts
/// at [`PRIMITIVE_RESTART`] and nowhere else. Meshes without a sentinel draw
/// the same with or without restart.
pub fn restart_index_supported(index: Option<u32>) -> bool {
    index.is_none_or(|index| index == PRIMITIVE_RESTART)
}

impl GraphicsBackend for WgpuBackend {
    type Mesh = MeshHandle;
    type Program = ProgramHandle;
    type Error = BackendError;

    fn upload_mesh(&mut self, label: &str, mesh: &BlockMesh) -> Result<MeshHandle, BackendError> {
        let buffer = BufferAllocator::new(&self.device).create_mesh(label, mesh)?;
        self.meshes.push(buffer);
        Ok(MeshHandle(self.meshes.len() - 1))
    }

    fn create_program(&mut self, name: &str) -> Result<ProgramHandle, BackendError> {
        if let Some(&handle) = self.programs.get(name) {
            return Ok(handle);
        }
        let module = self.shaders.load_embedded(&self.device, name)?;
        let pipeline = ClipmapPipeline::new(
            &self.device,
            &module,
            &self.layouts,
            self.color_format,
            self.depth_format,
        );
        self.pipelines.push(pipeline);
        let handle = ProgramHandle(self.pipelines.len() - 1);
        self.programs.insert(name.to_string(), handle);
        Ok(handle)
    }

    fn use_program(&mut self, program: &ProgramHandle) {
        self.program = Some(*program);
    }

    fn set_uniform(&mut self, uniform: Uniform) {
        match uniform {
            Uniform::Model(m) => self.model = m,
            Uniform::View(m) => self.camera.view = m.to_cols_array_2d(),
            Uniform::Projection(m) => self.camera.projection = m.to_cols_array_2d(),
            Uniform::Level(l) => self.level = l,
        }
    }

    fn set_fill_mode(&mut self, mode: FillMode) {
        if mode == FillMode::Wireframe && !self.supports_wireframe() {
            log::warn!("POLYGON_MODE_LINE unsupported; wireframe falls back to fill");
        }
        self.mode = mode;
    }

    /// Restart is fixed by the pipeline; the request is only checked.
    fn set_primitive_restart(&mut self, index: Option<u32>) {
        if !restart_index_supported(index) {
            log::warn!(
                "wgpu restarts Uint32 strips only at {:#x}, not {:?}",
                PRIMITIVE_RESTART,
                index
            );
        }
    }

    fn bind_mesh(&mut self, mesh: &MeshHandle) {
        self.bound = Some(*mesh);
    }

    fn unbind_mesh(&mut self) {
        self.bound = None;
    }

    fn draw_strip(&mut self, index_count: u32) {
        let (Some(program), Some(mesh)) = (self.program, self.bound) else {
            log::error!("Clipmap draw issued without a program and a bound mesh");
            return;
        };
        self.draws.push(DrawCommand {
            program,
            mesh,
            index_count,
            mode: self.mode,
        });
        self.uniforms.push(DrawUniform::new(self.model, self.level));
    }
}
