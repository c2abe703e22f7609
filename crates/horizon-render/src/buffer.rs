//! Vertex and index buffers for clipmap blocks.

use horizon_clipmap::{BlockMesh, GridVertex};

/// Reasons a mesh cannot be turned into GPU buffers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UploadError {
    #[error("mesh '{label}' has no {kind}")]
    EmptyData { label: String, kind: &'static str },

    #[error("mesh '{label}' needs a {size}-byte {kind} buffer, device limit is {limit}")]
    BufferTooLarge {
        label: String,
        kind: &'static str,
        size: u64,
        limit: u64,
    },
}

/// A block's vertex and index buffers, ready to draw as a triangle strip.
pub struct MeshBuffer {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
}

impl MeshBuffer {
    /// Index format of every clipmap mesh.
    pub const INDEX_FORMAT: wgpu::IndexFormat = wgpu::IndexFormat::Uint32;

    /// Bind vertex and index buffers to a render pass.
    pub fn bind<'a>(&'a self, render_pass: &mut wgpu::RenderPass<'a>) {
        render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        render_pass.set_index_buffer(self.index_buffer.slice(..), Self::INDEX_FORMAT);
    }

    /// Draw the whole strip.
    pub fn draw(&self, render_pass: &mut wgpu::RenderPass) {
        render_pass.draw_indexed(0..self.index_count, 0, 0..1);
    }
}

/// Creates mesh buffers on a device.
pub struct BufferAllocator<'a> {
    device: &'a wgpu::Device,
}

impl<'a> BufferAllocator<'a> {
    pub fn new(device: &'a wgpu::Device) -> Self {
        Self { device }
    }

    /// Create vertex and index buffers for a block mesh.
    ///
    /// Empty meshes and buffers larger than the device allows are rejected
    /// before anything is allocated.
    pub fn create_mesh(&self, label: &str, mesh: &BlockMesh) -> Result<MeshBuffer, UploadError> {
        let limit = self.device.limits().max_buffer_size;
        check_buffer(label, "vertex", mesh.vertex_bytes(), limit)?;
        check_buffer(label, "index", mesh.index_bytes(), limit)?;

        let vertex_buffer = self.create_buffer(
            &format!("{}-vertices", label),
            mesh.vertex_bytes(),
            wgpu::BufferUsages::VERTEX,
        );
        let index_buffer = self.create_buffer(
            &format!("{}-indices", label),
            mesh.index_bytes(),
            wgpu::BufferUsages::INDEX,
        );

        Ok(MeshBuffer {
            vertex_buffer,
            index_buffer,
            index_count: mesh.index_count(),
        })
    }

    fn create_buffer(&self, label: &str, data: &[u8], usage: wgpu::BufferUsages) -> wgpu::Buffer {
        use wgpu::util::DeviceExt;

        self.device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: data,
                usage: usage | wgpu::BufferUsages::COPY_DST,
            })
    }
}

/// Validate one buffer's contents against the device limit.
pub fn check_buffer(
    label: &str,
    kind: &'static str,
    data: &[u8],
    max_buffer_size: u64,
) -> Result<(), UploadError> {
    if data.is_empty() {
        return Err(UploadError::EmptyData {
            label: label.to_string(),
            kind,
        });
    }
    let size = data.len() as u64;
    if size > max_buffer_size {
        return Err(UploadError::BufferTooLarge {
            label: label.to_string(),
            kind,
            size,
            limit: max_buffer_size,
        });
    }
    Ok(())
}

/// Vertex buffer layout for [`GridVertex`].
pub fn grid_vertex_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<GridVertex>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[wgpu::VertexAttribute {
            offset: 0,
            shader_location: 0,
            format: wgpu::VertexFormat::Float32x3,
        }],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use horizon_clipmap::TileMeshFactory;

    fn create_test_device() -> Option<(wgpu::Device, wgpu::Queue)> {
        pollster::block_on(async {
            let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
                backends: wgpu::Backends::all(),
                ..Default::default()
            });

            let adapter = instance
                .request_adapter(&wgpu::RequestAdapterOptions {
                    power_preference: wgpu::PowerPreference::default(),
                    compatible_surface: None,
                    force_fallback_adapter: false,
                })
                .await
                .ok()?;

            adapter
                .request_device(&wgpu::DeviceDescriptor {
                    label: None,
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::default(),
                    experimental_features: Default::default(),
                    ..Default::default()
                })
                .await
                .ok()
        })
    }

    #[test]
    fn test_grid_vertex_layout_stride() {
        let layout = grid_vertex_layout();
        assert_eq!(layout.array_stride, 12);
        assert_eq!(layout.attributes.len(), 1);
        assert_eq!(layout.attributes[0].format, wgpu::VertexFormat::Float32x3);
    }

    #[test]
    fn test_check_buffer_rejects_empty() {
        assert_eq!(
            check_buffer("tile", "vertex", &[], 1024),
            Err(UploadError::EmptyData {
                label: "tile".to_string(),
                kind: "vertex"
            })
        );
    }

    #[test]
    fn test_check_buffer_rejects_oversized() {
        let data = [0u8; 64];
        assert!(matches!(
            check_buffer("tile", "index", &data, 32),
            Err(UploadError::BufferTooLarge {
                size: 64,
                limit: 32,
                ..
            })
        ));
        assert_eq!(check_buffer("tile", "index", &data, 64), Ok(()));
    }

    #[test]
    fn test_create_mesh_buffers() {
        let Some((device, _queue)) = create_test_device() else {
            return;
        };
        let allocator = BufferAllocator::new(&device);
        let mesh = TileMeshFactory::default().generate(3, 3, 2.0).unwrap();
        let buffers = allocator.create_mesh("tile", &mesh).unwrap();

        assert_eq!(buffers.index_count, mesh.index_count());
        assert_eq!(buffers.vertex_buffer.size(), 16 * 12);
        assert_eq!(buffers.index_buffer.size(), mesh.indices.len() as u64 * 4);
    }

    #[test]
    fn test_create_mesh_rejects_empty_mesh() {
        let Some((device, _queue)) = create_test_device() else {
            return;
        };
        let allocator = BufferAllocator::new(&device);
        let empty = BlockMesh {
            vertices: Vec::new(),
            indices: Vec::new(),
            rows: 0,
            columns: 0,
        };
        assert!(matches!(
            allocator.create_mesh("empty", &empty),
            Err(UploadError::EmptyData { kind: "vertex", .. })
        ));
    }
}
