//! Seams between the clipmap and whatever issues the graphics commands.

use std::fmt;

use glam::{Mat4, Vec2, Vec3};

use crate::mesh::BlockMesh;

/// A named shader uniform and its value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Uniform {
    Model(Mat4),
    View(Mat4),
    Projection(Mat4),
    /// Normalized level index in `[0, 1]`.
    Level(f32),
}

impl Uniform {
    /// Shader-side name of the uniform.
    pub fn name(&self) -> &'static str {
        match self {
            Uniform::Model(_) => "u_Model",
            Uniform::View(_) => "u_View",
            Uniform::Projection(_) => "u_Projection",
            Uniform::Level(_) => "u_Level",
        }
    }
}

/// Polygon fill mode for subsequent draws.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum FillMode {
    #[default]
    Fill,
    Wireframe,
}

/// Command sink for clipmap drawing.
///
/// Calls arrive from a single thread in frame order. A mesh is bound before
/// every `draw_strip` and unbound afterwards.
pub trait GraphicsBackend {
    /// Handle to an uploaded vertex/index buffer pair.
    type Mesh;
    /// Handle to a compiled shader program.
    type Program;
    type Error: fmt::Display;

    fn upload_mesh(&mut self, label: &str, mesh: &BlockMesh) -> Result<Self::Mesh, Self::Error>;
    fn create_program(&mut self, name: &str) -> Result<Self::Program, Self::Error>;
    fn use_program(&mut self, program: &Self::Program);
    fn set_uniform(&mut self, uniform: Uniform);
    fn set_fill_mode(&mut self, mode: FillMode);
    /// Enable primitive restart with the given index, or disable it.
    fn set_primitive_restart(&mut self, index: Option<u32>);
    fn bind_mesh(&mut self, mesh: &Self::Mesh);
    fn unbind_mesh(&mut self);
    /// Indexed triangle-strip draw of the bound mesh.
    fn draw_strip(&mut self, index_count: u32);
}

/// What the clipmap needs to know about the camera.
pub trait CameraView {
    fn world_position(&self) -> Vec3;
    fn view_matrix(&self) -> Mat4;
    fn projection_matrix(&self) -> Mat4;

    /// Viewer position on the ground plane, as `(x, z)`.
    fn ground_position(&self) -> Vec2 {
        let p = self.world_position();
        Vec2::new(p.x, p.z)
    }
}

/// Per-frame state handed to [`Clipmap::draw`](crate::Clipmap::draw).
#[derive(Clone, Copy)]
pub struct FrameContext<'a> {
    pub camera: &'a dyn CameraView,
    /// Shadow-only passes draw no terrain.
    pub shadow_pass: bool,
}

impl<'a> FrameContext<'a> {
    pub fn new(camera: &'a dyn CameraView) -> Self {
        Self {
            camera,
            shadow_pass: false,
        }
    }

    pub fn shadow(camera: &'a dyn CameraView) -> Self {
        Self {
            camera,
            shadow_pass: true,
        }
    }
}

impl fmt::Debug for FrameContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameContext")
            .field("camera_position", &self.camera.world_position())
            .field("shadow_pass", &self.shadow_pass)
            .finish()
    }
}
