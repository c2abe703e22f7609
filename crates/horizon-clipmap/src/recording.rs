//! Headless backend that records every command it receives.
//!
//! Useful for tests and for inspecting a frame's command stream without a GPU.

use crate::backend::{FillMode, GraphicsBackend, Uniform};
use crate::mesh::BlockMesh;

/// Handle to a mesh uploaded to a [`RecordingBackend`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshId(pub u32);

/// Handle to a program created on a [`RecordingBackend`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramId(pub u32);

/// One recorded per-frame command. Uploads and program creation are kept
/// separately.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    UseProgram(ProgramId),
    SetUniform(Uniform),
    SetFillMode(FillMode),
    SetPrimitiveRestart(Option<u32>),
    BindMesh(MeshId),
    UnbindMesh,
    DrawStrip { index_count: u32 },
}

/// A mesh upload seen by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRecord {
    pub id: MeshId,
    pub label: String,
    pub vertex_count: u32,
    pub index_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordingError {
    #[error("upload of '{label}' rejected")]
    UploadRejected { label: String },

    #[error("program '{name}' rejected")]
    ProgramRejected { name: String },
}

#[derive(Debug, Default)]
pub struct RecordingBackend {
    commands: Vec<Command>,
    uploads: Vec<UploadRecord>,
    programs: Vec<String>,
    reject_uploads: bool,
    reject_programs: bool,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend whose every upload fails.
    pub fn rejecting_uploads() -> Self {
        Self {
            reject_uploads: true,
            ..Self::default()
        }
    }

    /// A backend whose every program creation fails.
    pub fn rejecting_programs() -> Self {
        Self {
            reject_programs: true,
            ..Self::default()
        }
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Drain the recorded commands, e.g. between frames.
    pub fn take_commands(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.commands)
    }

    pub fn uploads(&self) -> &[UploadRecord] {
        &self.uploads
    }

    pub fn programs(&self) -> &[String] {
        &self.programs
    }

    /// Number of recorded draw calls.
    pub fn draw_calls(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, Command::DrawStrip { .. }))
            .count()
    }

    /// Every `BindMesh` is followed by exactly one `UnbindMesh` before the next
    /// bind, and nothing is left bound.
    pub fn binds_balanced(&self) -> bool {
        let mut bound = false;
        for command in &self.commands {
            match command {
                Command::BindMesh(_) if bound => return false,
                Command::BindMesh(_) => bound = true,
                Command::UnbindMesh if !bound => return false,
                Command::UnbindMesh => bound = false,
                Command::DrawStrip { .. } if !bound => return false,
                _ => {}
            }
        }
        !bound
    }
}

impl GraphicsBackend for RecordingBackend {
    type Mesh = MeshId;
    type Program = ProgramId;
    type Error = RecordingError;

    fn upload_mesh(&mut self, label: &str, mesh: &BlockMesh) -> Result<MeshId, RecordingError> {
        if self.reject_uploads {
            return Err(RecordingError::UploadRejected {
                label: label.to_string(),
            });
        }
        let id = MeshId(self.uploads.len() as u32);
        self.uploads.push(UploadRecord {
            id,
            label: label.to_string(),
            vertex_count: mesh.vertex_count(),
            index_count: mesh.index_count(),
        });
        Ok(id)
    }

    fn create_program(&mut self, name: &str) -> Result<ProgramId, RecordingError> {
        if self.reject_programs {
            return Err(RecordingError::ProgramRejected {
                name: name.to_string(),
            });
        }
        self.programs.push(name.to_string());
        Ok(ProgramId(self.programs.len() as u32 - 1))
    }

    fn use_program(&mut self, program: &ProgramId) {
        self.commands.push(Command::UseProgram(*program));
    }

    fn set_uniform(&mut self, uniform: Uniform) {
        self.commands.push(Command::SetUniform(uniform));
    }

    fn set_fill_mode(&mut self, mode: FillMode) {
        self.commands.push(Command::SetFillMode(mode));
    }

    fn set_primitive_restart(&mut self, index: Option<u32>) {
        self.commands.push(Command::SetPrimitiveRestart(index));
    }

    fn bind_mesh(&mut self, mesh: &MeshId) {
        self.commands.push(Command::BindMesh(*mesh));
    }

    fn unbind_mesh(&mut self) {
        self.commands.push(Command::UnbindMesh);
    }

    fn draw_strip(&mut self, index_count: u32) {
        self.commands.push(Command::DrawStrip { index_count });
    }
}
