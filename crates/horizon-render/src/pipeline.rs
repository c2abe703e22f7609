//! Render pipeline for clipmap blocks.
//!
//! Blocks are drawn as indexed triangle strips with `Uint32` strip indices, so
//! the `0xFFFF_FFFF` sentinel restarts the strip. Camera matrices live in group
//! 0; each draw's model matrix and level sit in group 1 behind a dynamic offset.

use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use horizon_clipmap::FillMode;
use std::num::NonZeroU64;

use crate::buffer::grid_vertex_layout;

/// View and projection matrices, written once per frame.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct CameraUniform {
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new(view: Mat4, projection: Mat4) -> Self {
        Self {
            view: view.to_cols_array_2d(),
            projection: projection.to_cols_array_2d(),
        }
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new(Mat4::IDENTITY, Mat4::IDENTITY)
    }
}

/// Per-draw block transform and normalized level.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct DrawUniform {
    pub model: [[f32; 4]; 4],
    pub level: f32,
    pub _padding: [f32; 3],
}

impl DrawUniform {
    pub fn new(model: Mat4, level: f32) -> Self {
        Self {
            model: model.to_cols_array_2d(),
            level,
            _padding: [0.0; 3],
        }
    }
}

pub const CAMERA_UNIFORM_SIZE: u64 = std::mem::size_of::<CameraUniform>() as u64;
pub const DRAW_UNIFORM_SIZE: u64 = std::mem::size_of::<DrawUniform>() as u64;

/// Distance between consecutive draw uniforms in the dynamic-offset buffer.
pub fn draw_uniform_stride(min_offset_alignment: u32) -> u64 {
    let align = u64::from(min_offset_alignment.max(1));
    DRAW_UNIFORM_SIZE.div_ceil(align) * align
}

/// Bind group layouts shared by every clipmap pipeline: camera in group 0,
/// per-draw uniforms with a dynamic offset in group 1.
pub struct ClipmapBindGroupLayouts {
    pub camera: wgpu::BindGroupLayout,
    pub draw: wgpu::BindGroupLayout,
}

impl ClipmapBindGroupLayouts {
    pub fn new(device: &wgpu::Device) -> Self {
        let camera = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("clipmap-camera-bind-group-layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: NonZeroU64::new(CAMERA_UNIFORM_SIZE),
                },
                count: None,
            }],
        });

        let draw = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("clipmap-draw-bind-group-layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: NonZeroU64::new(DRAW_UNIFORM_SIZE),
                },
                count: None,
            }],
        });

        Self { camera, draw }
    }
}

/// Fill pipeline plus an optional line pipeline for wireframe drawing.
pub struct ClipmapPipeline {
    pub fill: wgpu::RenderPipeline,
    /// Present only when the device supports `POLYGON_MODE_LINE`.
    pub wireframe: Option<wgpu::RenderPipeline>,
}

impl ClipmapPipeline {
    pub fn new(
        device: &wgpu::Device,
        shader: &wgpu::ShaderModule,
        layouts: &ClipmapBindGroupLayouts,
        color_format: wgpu::TextureFormat,
        depth_format: Option<wgpu::TextureFormat>,
    ) -> Self {
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("clipmap-pipeline-layout"),
            bind_group_layouts: &[&layouts.camera, &layouts.draw],
            immediate_size: 0,
        });

        let build = |label: &str, polygon_mode: wgpu::PolygonMode| {
            create_strip_pipeline(
                device,
                &layout,
                shader,
                color_format,
                depth_format,
                label,
                polygon_mode,
            )
        };

        let fill = build("clipmap-fill-pipeline", wgpu::PolygonMode::Fill);
        let wireframe = device
            .features()
            .contains(wgpu::Features::POLYGON_MODE_LINE)
            .then(|| build("clipmap-wireframe-pipeline", wgpu::PolygonMode::Line));

        Self { fill, wireframe }
    }

    /// Pipeline for a fill mode, falling back to fill when lines are
    /// unsupported.
    pub fn select(&self, mode: FillMode) -> &wgpu::RenderPipeline {
        match mode {
            FillMode::Wireframe => self.wireframe.as_ref().unwrap_or(&self.fill),
            FillMode::Fill => &self.fill,
        }
    }
}

fn create_strip_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    color_format: wgpu::TextureFormat,
    depth_format: Option<wgpu::TextureFormat>,
    label: &str,
    polygon_mode: wgpu::PolygonMode,
) -> wgpu::RenderPipeline {
    let depth_stencil = depth_format.map(|format| wgpu::DepthStencilState {
        format,
        depth_write_enabled: true,
        depth_compare: wgpu::CompareFunction::GreaterEqual, // reverse-Z
        stencil: wgpu::StencilState::default(),
        bias: wgpu::DepthBiasState::default(),
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: &[grid_vertex_layout()],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleStrip,
            strip_index_format: Some(wgpu::IndexFormat::Uint32),
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            unclipped_depth: false,
            polygon_mode,
            conservative: false,
        },
        depth_stencil,
        multisample: wgpu::MultisampleState {
            count: 1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: color_format,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        multiview_mask: None,
        cache: None,
    })
}

/// WGSL source for clipmap blocks. Shades by normalized level.
pub const CLIPMAP_SHADER_SOURCE: &str = r#"
struct CameraUniform {
    view: mat4x4<f32>,
    projection: mat4x4<f32>,
};

struct DrawUniform {
    model: mat4x4<f32>,
    level: f32,
};

@group(0) @binding(0)
var<uniform> camera: CameraUniform;

@group(1) @binding(0)
var<uniform> per_draw: DrawUniform;

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) level: f32,
};

@vertex
fn vs_main(@location(0) position: vec3<f32>) -> VertexOutput {
    var out: VertexOutput;
    let world = per_draw.model * vec4<f32>(position, 1.0);
    out.clip_position = camera.projection * camera.view * world;
    out.level = per_draw.level;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let near = vec3<f32>(0.25, 0.55, 0.22);
    let far = vec3<f32>(0.72, 0.68, 0.55);
    return vec4<f32>(mix(near, far, in.level), 1.0);
}
"#;
