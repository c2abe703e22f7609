//! GPU-resident block meshes.

use crate::backend::GraphicsBackend;
use crate::error::ClipmapError;
use crate::layout::MeshShape;
use crate::mesh::BlockMesh;

/// One uploaded block mesh. Holds nothing beyond the backend handle and the
/// counts needed to draw it.
pub struct Block<B: GraphicsBackend> {
    shape: MeshShape,
    mesh: Option<B::Mesh>,
    index_count: u32,
    vertex_count: u32,
}

impl<B: GraphicsBackend> Block<B> {
    /// An empty block; [`draw`](Self::draw) fails until [`upload`](Self::upload).
    pub fn new(shape: MeshShape) -> Self {
        Self {
            shape,
            mesh: None,
            index_count: 0,
            vertex_count: 0,
        }
    }

    /// Upload vertex and index data, replacing any previous mesh.
    pub fn upload(&mut self, backend: &mut B, mesh: &BlockMesh) -> Result<(), ClipmapError> {
        if mesh.vertices.is_empty() || mesh.indices.is_empty() {
            return Err(ClipmapError::InvalidDimensions {
                rows: mesh.rows,
                columns: mesh.columns,
            });
        }

        let handle = backend
            .upload_mesh(self.shape.label(), mesh)
            .map_err(|e| ClipmapError::UploadFailure {
                shape: self.shape,
                message: e.to_string(),
            })?;

        self.mesh = Some(handle);
        self.index_count = mesh.index_count();
        self.vertex_count = mesh.vertex_count();
        Ok(())
    }

    /// Bind, draw and unbind. The unbind also runs if drawing unwinds.
    pub fn draw(&self, backend: &mut B) -> Result<(), ClipmapError> {
        let mesh = self
            .mesh
            .as_ref()
            .ok_or(ClipmapError::NotInitialized { shape: self.shape })?;

        let guard = BindGuard::bind(backend, mesh);
        guard.backend.draw_strip(self.index_count);
        Ok(())
    }

    pub fn shape(&self) -> MeshShape {
        self.shape
    }

    pub fn is_uploaded(&self) -> bool {
        self.mesh.is_some()
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    /// Backend handle, if uploaded.
    pub fn mesh(&self) -> Option<&B::Mesh> {
        self.mesh.as_ref()
    }
}

/// Keeps a mesh bound for its lifetime.
struct BindGuard<'a, B: GraphicsBackend> {
    backend: &'a mut B,
}

impl<'a, B: GraphicsBackend> BindGuard<'a, B> {
    fn bind(backend: &'a mut B, mesh: &B::Mesh) -> Self {
        backend.bind_mesh(mesh);
        Self { backend }
    }
}

impl<B: GraphicsBackend> Drop for BindGuard<'_, B> {
    fn drop(&mut self) {
        self.backend.unbind_mesh();
    }
}
