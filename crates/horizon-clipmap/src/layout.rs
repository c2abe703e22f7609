//! Ring layout: the slot grid of one level and the block shapes that fill it.
//!
//! A ring is an `N × N` grid of slots with `N = 4b + 1` for a border of `b`
//! tiles. Only the border slots are drawn; the hole they enclose is covered by
//! the next finer level, which is exactly one of this level's segments
//! narrower than the hole. Connector strips fill that one-segment gap. The
//! finest drawn level has no finer neighbour, so its hole is filled with the
//! same shapes plus a centre block (see [`ClipmapLayout::fill_role`]).
//!
//! ```text
//!   b = 1 (reference)          T = tile, C = column fixup, R = row fixup
//!   T T C T T                  X = centre fixup (finest level only)
//!   T . . . T
//!   R . . . R                  finest: T C T / R X R / T C T inside
//!   T . . . T
//!   T T C T T
//! ```

use crate::error::ClipmapError;

/// Width of a fixup strip in segments.
pub const FIXUP_SEGMENTS: u32 = 2;

/// The distinct block meshes a clipmap draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MeshShape {
    /// Regular square tile.
    Tile,
    /// Narrow strip in the middle column of the top and bottom borders.
    ColumnFixup,
    /// Narrow strip in the middle row of the left and right borders.
    RowFixup,
    /// One-segment-wide strip spanning the hole along Z, closing the X side of
    /// the gap to the finer level.
    HorizontalConnector,
    /// One-segment-deep strip spanning the finer ring along X, closing the Z
    /// side of the gap.
    VerticalConnector,
    /// Fixup-sized square where the middle row and column cross in the
    /// finest level's filled hole.
    CenterFixup,
}

impl MeshShape {
    /// Number of distinct shapes.
    pub const COUNT: usize = 6;

    /// Every shape, in block-table order.
    pub const ALL: [MeshShape; Self::COUNT] = [
        MeshShape::Tile,
        MeshShape::ColumnFixup,
        MeshShape::RowFixup,
        MeshShape::HorizontalConnector,
        MeshShape::VerticalConnector,
        MeshShape::CenterFixup,
    ];

    /// Position of this shape in [`MeshShape::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    /// Short label for GPU resources and logs.
    pub fn label(self) -> &'static str {
        match self {
            MeshShape::Tile => "clipmap-tile",
            MeshShape::ColumnFixup => "clipmap-column-fixup",
            MeshShape::RowFixup => "clipmap-row-fixup",
            MeshShape::HorizontalConnector => "clipmap-horizontal-connector",
            MeshShape::VerticalConnector => "clipmap-vertical-connector",
            MeshShape::CenterFixup => "clipmap-center-fixup",
        }
    }
}

/// Role of a slot in the ring grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotRole {
    Tile,
    RowFixup,
    ColumnFixup,
    /// Middle slot of a filled hole.
    Center,
    /// Interior slot, covered by the finer level.
    Skip,
}

impl SlotRole {
    /// Mesh drawn for this slot, `None` for skipped slots.
    pub fn shape(self) -> Option<MeshShape> {
        match self {
            SlotRole::Tile => Some(MeshShape::Tile),
            SlotRole::RowFixup => Some(MeshShape::RowFixup),
            SlotRole::ColumnFixup => Some(MeshShape::ColumnFixup),
            SlotRole::Center => Some(MeshShape::CenterFixup),
            SlotRole::Skip => None,
        }
    }
}

/// Validated geometry shared by every level of a clipmap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipmapLayout {
    segments: u32,
    segment_size: f32,
    border_tiles: u32,
}

impl ClipmapLayout {
    /// Validate and build a layout.
    ///
    /// Fails with [`ClipmapError::InvalidConfiguration`] for zero segments,
    /// a zero border, a non-positive or non-finite segment size, or a ring too
    /// wide to count in `u32` segments.
    pub fn new(segments: u32, segment_size: f32, border_tiles: u32) -> Result<Self, ClipmapError> {
        if segments == 0 {
            return Err(ClipmapError::invalid_config("segments must be at least 1"));
        }
        if border_tiles == 0 {
            return Err(ClipmapError::invalid_config("border_tiles must be at least 1"));
        }
        if !segment_size.is_finite() || segment_size <= 0.0 {
            return Err(ClipmapError::invalid_config(format!(
                "segment_size must be positive and finite, got {segment_size}"
            )));
        }
        // The ring is the widest run of segments we ever count.
        4u32.checked_mul(border_tiles)
            .and_then(|n| n.checked_mul(segments))
            .and_then(|n| n.checked_add(FIXUP_SEGMENTS))
            .ok_or_else(|| ClipmapError::invalid_config("ring width overflows u32 segments"))?;

        Ok(Self {
            segments,
            segment_size,
            border_tiles,
        })
    }

    /// Segments along one side of a regular tile.
    pub fn segments(&self) -> u32 {
        self.segments
    }

    /// Segment size at level 0.
    pub fn segment_size(&self) -> f32 {
        self.segment_size
    }

    /// Border width in tiles.
    pub fn border_tiles(&self) -> u32 {
        self.border_tiles
    }

    /// Slots along one side of the ring grid.
    pub fn slots_per_side(&self) -> u32 {
        4 * self.border_tiles + 1
    }

    /// Index of the middle row/column, which holds the fixup strips.
    pub fn middle_slot(&self) -> u32 {
        2 * self.border_tiles
    }

    /// Tiles between the ring's base corner and the snapped viewer point.
    pub fn center_tiles(&self) -> u32 {
        2 * self.border_tiles
    }

    /// Width of the whole ring in this level's segments.
    pub fn ring_segments(&self) -> u32 {
        4 * self.border_tiles * self.segments + FIXUP_SEGMENTS
    }

    /// Width of the hole enclosed by the border, in this level's segments.
    pub fn hole_segments(&self) -> u32 {
        2 * self.border_tiles * self.segments + FIXUP_SEGMENTS
    }

    /// Width of the next finer ring measured in this level's segments.
    ///
    /// Always one less than [`hole_segments`](Self::hole_segments); the
    /// missing segment is where the connectors go. This is also the lateral
    /// shift applied to a connector when the finer ring sits flush against
    /// the near edge of the hole (7 for the reference layout).
    pub fn connector_shift_segments(&self) -> u32 {
        self.ring_segments() / 2
    }

    /// Segments a slot spans along its axis.
    pub fn slot_advance_segments(&self, index: u32) -> u32 {
        if index == self.middle_slot() {
            FIXUP_SEGMENTS
        } else {
            self.segments
        }
    }

    /// Mesh grid dimensions `(rows, columns)` for a shape.
    ///
    /// Columns run along X and rows along Z.
    pub fn mesh_dimensions(&self, shape: MeshShape) -> (u32, u32) {
        match shape {
            MeshShape::Tile => (self.segments, self.segments),
            MeshShape::ColumnFixup => (FIXUP_SEGMENTS, self.segments),
            MeshShape::RowFixup => (self.segments, FIXUP_SEGMENTS),
            MeshShape::HorizontalConnector => (self.hole_segments(), 1),
            MeshShape::VerticalConnector => (1, self.connector_shift_segments()),
            MeshShape::CenterFixup => (FIXUP_SEGMENTS, FIXUP_SEGMENTS),
        }
    }

    /// Classify the slot at `(row, col)`.
    pub fn classify(&self, row: u32, col: u32) -> SlotRole {
        let n = self.slots_per_side();
        let b = self.border_tiles;
        let on_border = row < b || row >= n - b || col < b || col >= n - b;
        if !on_border {
            return SlotRole::Skip;
        }

        self.fill_role(row, col)
    }

    /// Role of a slot when the hole is drawn too, as it is on the finest
    /// level. Border slots classify as in [`classify`](Self::classify).
    pub fn fill_role(&self, row: u32, col: u32) -> SlotRole {
        let middle = self.middle_slot();
        match (row == middle, col == middle) {
            (true, true) => SlotRole::Center,
            (false, true) => SlotRole::ColumnFixup,
            (true, false) => SlotRole::RowFixup,
            (false, false) => SlotRole::Tile,
        }
    }
}
