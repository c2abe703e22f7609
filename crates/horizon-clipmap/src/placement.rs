//! Per-level ring placement: snapping a level's ring to the viewer and
//! aligning it against the next finer level.
//!
//! Level `l` has vertex spacing `segment_size * 2^l`. Its ring snaps to the
//! vertex grid of level `l + 1` (twice its own spacing), so the ring only moves
//! in steps the coarser level can represent and stays put while the viewer
//! moves inside one snap cell. Because every level snaps to a grid exactly
//! twice as coarse as the one below, the finer ring always lands in one of two
//! positions inside this ring's hole: flush against the near edge, or one
//! segment in from it.

use glam::Vec2;

use crate::layout::ClipmapLayout;

/// Highest level index whose power-of-two scale keeps snap-cell arithmetic
/// exact in `f32`.
pub const MAX_LEVEL: u32 = 24;

/// Where the next finer ring sits inside this level's hole along one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AxisAlignment {
    /// The finer ring starts at the near edge of the hole; the one-segment gap
    /// is at the far edge.
    Flush,
    /// The finer ring starts one segment in; the gap is at the near edge.
    Inset,
}

impl AxisAlignment {
    /// Segments from the hole's near edge to the gap.
    pub fn gap_offset_segments(self, layout: &ClipmapLayout) -> u32 {
        match self {
            AxisAlignment::Flush => layout.connector_shift_segments(),
            AxisAlignment::Inset => 0,
        }
    }

    /// Segments from the hole's near edge to the finer ring.
    pub fn ring_offset_segments(self) -> u32 {
        match self {
            AxisAlignment::Flush => 0,
            AxisAlignment::Inset => 1,
        }
    }
}

/// Alignment of the next finer ring on both horizontal axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LevelAlignment {
    pub x: AxisAlignment,
    pub z: AxisAlignment,
}

/// Per-frame placement data for one level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelPlacement {
    pub level: u32,
    /// `2^level`.
    pub scale: f32,
    /// World-space size of one segment at this level.
    pub scaled_segment_size: f32,
    /// World-space size of one regular tile at this level.
    pub tile_size: f32,
    /// World-space XZ corner of the ring (stored as `(x, z)`).
    pub base: Vec2,
}

/// Stateless solver for ring bases and inter-level alignment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelPlacementSolver {
    layout: ClipmapLayout,
}

impl LevelPlacementSolver {
    pub fn new(layout: ClipmapLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &ClipmapLayout {
        &self.layout
    }

    /// Linear scale of a level, `2^level`.
    pub fn scale(&self, level: u32) -> f32 {
        debug_assert!(level <= MAX_LEVEL, "level {level} exceeds MAX_LEVEL");
        2f32.powi(level as i32)
    }

    pub fn scaled_segment_size(&self, level: u32) -> f32 {
        self.layout.segment_size() * self.scale(level)
    }

    pub fn tile_size(&self, level: u32) -> f32 {
        self.layout.segments() as f32 * self.scaled_segment_size(level)
    }

    /// Spacing of the grid a level's ring snaps to: the vertex spacing of the
    /// next coarser level.
    ///
    /// With a segment size of 2 this is `2^(level + 2)`.
    pub fn snap_spacing(&self, level: u32) -> f32 {
        2.0 * self.scaled_segment_size(level)
    }

    /// Index of the snap cell containing the viewer, component-wise.
    fn snap_cell(&self, level: u32, viewer: Vec2) -> Vec2 {
        (viewer / self.snap_spacing(level)).floor()
    }

    /// Viewer position snapped down to the level's snap grid.
    pub fn snapped(&self, level: u32, viewer: Vec2) -> Vec2 {
        self.snap_cell(level, viewer) * self.snap_spacing(level)
    }

    /// World-space corner of the level's ring.
    pub fn base(&self, level: u32, viewer: Vec2) -> Vec2 {
        let recenter = self.layout.center_tiles() as f32 * self.tile_size(level);
        self.snapped(level, viewer) - Vec2::splat(recenter)
    }

    /// Full placement data for a level.
    pub fn level_placement(&self, level: u32, viewer: Vec2) -> LevelPlacement {
        LevelPlacement {
            level,
            scale: self.scale(level),
            scaled_segment_size: self.scaled_segment_size(level),
            tile_size: self.tile_size(level),
            base: self.base(level, viewer),
        }
    }

    /// `|base(level) - base(level - 1)|`, component-wise.
    ///
    /// Each component is either `border_tiles * tile_size(level)` or that plus
    /// one `scaled_segment_size(level)`.
    pub fn level_offset(&self, level: u32, viewer: Vec2) -> Vec2 {
        debug_assert!(level > 0, "level 0 has no finer neighbour");
        (self.base(level, viewer) - self.base(level - 1, viewer)).abs()
    }

    /// Where the ring of `level - 1` sits inside the hole of `level`.
    ///
    /// Decided from snap-cell parity rather than by comparing float offsets,
    /// so the answer is exact for any segment size.
    pub fn alignment(&self, level: u32, viewer: Vec2) -> LevelAlignment {
        debug_assert!(level > 0, "level 0 has no finer neighbour");
        let fine = self.snap_cell(level - 1, viewer);
        let coarse = self.snap_cell(level, viewer);
        let parity = fine - coarse * 2.0;
        let axis = |p: f32| {
            if p == 0.0 {
                AxisAlignment::Flush
            } else {
                AxisAlignment::Inset
            }
        };
        LevelAlignment {
            x: axis(parity.x),
            z: axis(parity.y),
        }
    }
}
