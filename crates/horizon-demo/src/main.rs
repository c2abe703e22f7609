//! Headless clipmap flyover.
//!
//! Flies a camera over the ground plane and draws the clipmap every frame into
//! an offscreen target. Without a GPU the same frames are drawn through the
//! recording backend, so ring placement can still be inspected in the logs.

use std::path::PathBuf;

use clap::Parser;
use glam::Vec3;
use horizon_clipmap::{Clipmap, ClipmapError, FrameContext, FrameStats, MeshShape, RecordingBackend};
use horizon_config::{CliArgs, Config, default_config_dir};
use horizon_render::{Camera, GpuContext, WgpuBackend, init_gpu_context_blocking};
use tracing::{error, info, warn};

const FRAMES: u32 = 240;
const TARGET_SIZE: u32 = 512;
const COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;
const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Camera for a frame of the flyover: a slow climbing spiral looking ahead.
fn flight_camera(frame: u32) -> Camera {
    let t = frame as f32 / 60.0;
    let radius = 40.0 + 25.0 * t;
    let position = Vec3::new(radius * t.cos(), 20.0 + 4.0 * t, radius * t.sin());
    let ahead = Vec3::new(-t.sin(), -0.35, t.cos());
    let mut camera = Camera::looking_at(position, position + ahead);
    camera.set_aspect_ratio(TARGET_SIZE as f32, TARGET_SIZE as f32);
    camera
}

fn log_frame(frame: u32, camera: &Camera, stats: &FrameStats) {
    if frame % 60 != 0 {
        return;
    }
    info!(
        frame,
        x = camera.position.x,
        z = camera.position.z,
        draws = stats.draw_calls(),
        tiles = stats.count(MeshShape::Tile),
        connectors = stats.count(MeshShape::HorizontalConnector)
            + stats.count(MeshShape::VerticalConnector),
        "clipmap frame"
    );
}

fn render_target(device: &wgpu::Device, format: wgpu::TextureFormat) -> wgpu::TextureView {
    device
        .create_texture(&wgpu::TextureDescriptor {
            label: Some("horizon-demo-target"),
            size: wgpu::Extent3d {
                width: TARGET_SIZE,
                height: TARGET_SIZE,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        })
        .create_view(&wgpu::TextureViewDescriptor::default())
}

fn run_gpu(ctx: &GpuContext, config: &Config) -> Result<(), ClipmapError> {
    let mut backend = WgpuBackend::new(&ctx.device, COLOR_FORMAT, Some(DEPTH_FORMAT));
    let clipmap = Clipmap::from_config(&mut backend, config)?;
    if clipmap.wireframe && !backend.supports_wireframe() {
        warn!("Wireframe requested but the device lacks line rasterization");
    }

    let color = render_target(&ctx.device, COLOR_FORMAT);
    let depth = render_target(&ctx.device, DEPTH_FORMAT);

    for frame in 0..FRAMES {
        let camera = flight_camera(frame);
        backend.begin_frame();
        let stats = clipmap.draw(&mut backend, &FrameContext::new(&camera))?;
        backend.prepare(&ctx.queue);

        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("horizon-demo-encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("horizon-demo-pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &color,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: 0.53,
                            g: 0.81,
                            b: 0.92,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &depth,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(0.0), // reverse-Z
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });
            backend.encode(&mut pass);
        }
        ctx.queue.submit(std::iter::once(encoder.finish()));
        log_frame(frame, &camera, &stats);
    }

    info!("Rendered {} frames on the GPU", FRAMES);
    Ok(())
}

fn run_recording(config: &Config) -> Result<(), ClipmapError> {
    let mut backend = RecordingBackend::new();
    let clipmap = Clipmap::from_config(&mut backend, config)?;

    let mut commands = 0;
    for frame in 0..FRAMES {
        let camera = flight_camera(frame);
        let stats = clipmap.draw(&mut backend, &FrameContext::new(&camera))?;
        commands += backend.take_commands().len();
        log_frame(frame, &camera, &stats);
    }

    info!("Recorded {} commands over {} frames", commands, FRAMES);
    Ok(())
}

fn main() {
    let args = CliArgs::parse();

    let config_dir = args
        .config
        .clone()
        .or_else(default_config_dir)
        .unwrap_or_else(|| PathBuf::from(".horizon"));

    let mut config = Config::load_or_create(&config_dir).unwrap_or_else(|e| {
        eprintln!("Failed to load config: {e}, using defaults");
        Config::default()
    });
    config.apply_cli_overrides(&args);

    let log_dir = config_dir.join("logs");
    horizon_log::init_logging(Some(&log_dir), cfg!(debug_assertions), Some(&config));

    let result = match init_gpu_context_blocking() {
        Ok(ctx) => run_gpu(&ctx, &config),
        Err(e) => {
            warn!("{e}; drawing through the recording backend instead");
            run_recording(&config)
        }
    };

    if let Err(e) = result {
        error!("Clipmap demo failed: {e}");
        std::process::exit(1);
    }
}
