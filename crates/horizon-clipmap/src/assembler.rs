//! Per-frame ring assembly: which block goes where for every active level.

use std::convert::Infallible;

use glam::{Mat4, Vec2, Vec3};

use crate::error::ClipmapError;
use crate::layout::{ClipmapLayout, MeshShape, SlotRole};
use crate::placement::{AxisAlignment, LevelPlacement, LevelPlacementSolver, MAX_LEVEL};

/// Which inter-level connector strips are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectorCoverage {
    /// Only the strip along the X side of the gap. The Z side stays open.
    HorizontalOnly,
    /// Both strips, closing the gap to the finer ring completely.
    Both,
}

/// One block to draw this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub shape: MeshShape,
    pub level: u32,
    /// World-space XZ position of the block's local origin, stored as `(x, z)`.
    pub origin: Vec2,
    pub scale: f32,
    /// Rotation about +Y in radians.
    pub rotation: f32,
    /// `level / levels`, or 0 for a single-level clipmap.
    pub normalized_level: f32,
}

impl Placement {
    /// Model matrix for the block, `T * R * S`.
    pub fn model_matrix(&self) -> Mat4 {
        transform_matrix(self.origin, self.scale, self.rotation)
    }
}

/// Compose translate-rotate-scale for a block lying in the XZ plane.
pub fn transform_matrix(position: Vec2, scale: f32, angle: f32) -> Mat4 {
    let t = Mat4::from_translation(Vec3::new(position.x, 0.0, position.y));
    let r = Mat4::from_rotation_y(angle);
    let s = Mat4::from_scale(Vec3::splat(scale));
    t * r * s
}

/// Walks every active level and emits its block placements.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipmapAssembler {
    solver: LevelPlacementSolver,
    min_level: u32,
    levels: u32,
    connectors: ConnectorCoverage,
}

impl ClipmapAssembler {
    /// Build an assembler drawing levels `min_level..=levels`.
    pub fn new(
        layout: ClipmapLayout,
        min_level: u32,
        levels: u32,
        connectors: ConnectorCoverage,
    ) -> Result<Self, ClipmapError> {
        if levels > MAX_LEVEL {
            return Err(ClipmapError::invalid_config(format!(
                "levels must be at most {MAX_LEVEL}, got {levels}"
            )));
        }
        if min_level > levels {
            return Err(ClipmapError::invalid_config(format!(
                "min_level {min_level} exceeds levels {levels}"
            )));
        }
        Ok(Self {
            solver: LevelPlacementSolver::new(layout),
            min_level,
            levels,
            connectors,
        })
    }

    pub fn solver(&self) -> &LevelPlacementSolver {
        &self.solver
    }

    pub fn layout(&self) -> &ClipmapLayout {
        self.solver.layout()
    }

    pub fn min_level(&self) -> u32 {
        self.min_level
    }

    pub fn levels(&self) -> u32 {
        self.levels
    }

    pub fn connectors(&self) -> ConnectorCoverage {
        self.connectors
    }

    fn normalized_level(&self, level: u32) -> f32 {
        if self.levels == 0 {
            0.0
        } else {
            level as f32 / self.levels as f32
        }
    }

    /// Emit every placement for the viewer position, finest level first.
    ///
    /// Within a level the connectors come first, then the ring slots in
    /// row-major order. The finest level also fills its hole, so the drawn
    /// levels cover the outermost ring's square without gaps. Stops at the
    /// first error returned by `emit`.
    pub fn visit<E>(
        &self,
        viewer: Vec2,
        mut emit: impl FnMut(Placement) -> Result<(), E>,
    ) -> Result<(), E> {
        let layout = *self.layout();

        for level in self.min_level..=self.levels {
            let lp = self.solver.level_placement(level, viewer);
            let place = |shape: MeshShape, offset: Vec2| Placement {
                shape,
                level,
                origin: lp.base + offset,
                scale: lp.scale,
                rotation: 0.0,
                normalized_level: self.normalized_level(level),
            };

            if level > self.min_level {
                let alignment = self.solver.alignment(level, viewer);
                let (horizontal, vertical) = connector_offsets(&layout, &lp, alignment.x, alignment.z);
                emit(place(MeshShape::HorizontalConnector, horizontal))?;
                if self.connectors == ConnectorCoverage::Both {
                    emit(place(MeshShape::VerticalConnector, vertical))?;
                }
            }

            // Nothing finer covers the innermost hole.
            let fill_hole = level == self.min_level;
            let n = layout.slots_per_side();
            let mut row_segments = 0u32;
            for r in 0..n {
                let mut col_segments = 0u32;
                for c in 0..n {
                    let role = match layout.classify(r, c) {
                        SlotRole::Skip if fill_hole => layout.fill_role(r, c),
                        role => role,
                    };
                    if let Some(shape) = role.shape() {
                        let offset = Vec2::new(row_segments as f32, col_segments as f32)
                            * lp.scaled_segment_size;
                        emit(place(shape, offset))?;
                    }
                    col_segments += layout.slot_advance_segments(c);
                }
                row_segments += layout.slot_advance_segments(r);
            }
        }

        Ok(())
    }

    /// Collect every placement for the viewer position.
    pub fn assemble(&self, viewer: Vec2) -> Vec<Placement> {
        let mut placements = Vec::new();
        let collected = self.visit(viewer, |p| {
            placements.push(p);
            Ok::<(), Infallible>(())
        });
        match collected {
            Ok(()) => placements,
            Err(never) => match never {},
        }
    }
}

/// Offsets from the ring base of the horizontal and vertical connectors.
///
/// The horizontal connector spans the whole hole along Z and sits in the gap
/// on the X axis; the vertical connector spans the finer ring along X and sits
/// in the gap on the Z axis. Together they fill the L-shaped gap exactly.
fn connector_offsets(
    layout: &ClipmapLayout,
    lp: &LevelPlacement,
    x: AxisAlignment,
    z: AxisAlignment,
) -> (Vec2, Vec2) {
    let hole = (layout.border_tiles() * layout.segments()) as f32;
    let seg = lp.scaled_segment_size;

    let horizontal = Vec2::new(
        hole + x.gap_offset_segments(layout) as f32,
        hole,
    ) * seg;
    let vertical = Vec2::new(
        hole + x.ring_offset_segments() as f32,
        hole + z.gap_offset_segments(layout) as f32,
    ) * seg;
    (horizontal, vertical)
}
