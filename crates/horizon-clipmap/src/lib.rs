//! Geometric clipmap terrain: nested square rings of flat grid blocks that
//! follow the camera, each ring twice as coarse as the one inside it.
//!
//! - [`ClipmapLayout`] fixes the slot grid and block shapes of a ring.
//! - [`TileMeshFactory`] builds the block meshes as stitched triangle strips.
//! - [`LevelPlacementSolver`] snaps each ring to the viewer and reports how the
//!   next finer ring sits inside its hole.
//! - [`ClipmapAssembler`] turns a viewer position into a list of placements.
//! - [`Clipmap`] owns the uploaded [`Block`]s and draws a frame through any
//!   [`GraphicsBackend`].

pub mod assembler;
pub mod backend;
pub mod block;
pub mod clipmap;
pub mod error;
pub mod layout;
pub mod mesh;
pub mod placement;
pub mod recording;

pub use assembler::{ClipmapAssembler, ConnectorCoverage, Placement, transform_matrix};
pub use backend::{CameraView, FillMode, FrameContext, GraphicsBackend, Uniform};
pub use block::Block;
pub use clipmap::{Clipmap, FrameStats, PROGRAM_NAME};
pub use error::ClipmapError;
pub use layout::{ClipmapLayout, FIXUP_SEGMENTS, MeshShape, SlotRole};
pub use mesh::{BlockMesh, GridVertex, PRIMITIVE_RESTART, StripStitching, TileMeshFactory};
pub use placement::{
    AxisAlignment, LevelAlignment, LevelPlacement, LevelPlacementSolver, MAX_LEVEL,
};
pub use recording::{Command, MeshId, ProgramId, RecordingBackend, RecordingError};
