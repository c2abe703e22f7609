//! Fixed-topology block meshes: flat vertex grids indexed as triangle strips.
//!
//! Every block is a `(rows + 1) × (columns + 1)` grid of vertices. Each row of
//! quads becomes one triangle strip of `(top, bottom)` index pairs, and the
//! strips of all rows are joined into a single index stream so the whole block
//! renders in one draw call.

use bytemuck::{Pod, Zeroable};

use crate::error::ClipmapError;
use crate::layout::{ClipmapLayout, MeshShape};

/// Index value that terminates a strip. No vertex index may ever equal it.
pub const PRIMITIVE_RESTART: u32 = u32::MAX;

/// A flat grid vertex. Height is fixed at zero.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct GridVertex {
    pub position: [f32; 3],
}

static_assertions::assert_eq_size!(GridVertex, [u8; 12]);

/// CPU-side vertex and index data for one block shape.
#[derive(Clone, Debug, PartialEq)]
pub struct BlockMesh {
    pub vertices: Vec<GridVertex>,
    pub indices: Vec<u32>,
    pub rows: u32,
    pub columns: u32,
}

impl BlockMesh {
    /// Raw vertex bytes for upload.
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Raw index bytes for upload.
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    /// Number of indices, as passed to an indexed draw.
    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> u32 {
        self.vertices.len() as u32
    }
}

/// How consecutive row strips of a block mesh are joined into one draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StripStitching {
    /// Terminate each row with [`PRIMITIVE_RESTART`].
    PrimitiveRestart,
    /// Bridge rows with repeated indices forming zero-area triangles, for
    /// backends without primitive restart.
    DegenerateTriangles,
}

/// Builds block meshes with a fixed row-stitching strategy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileMeshFactory {
    stitching: StripStitching,
}

impl Default for TileMeshFactory {
    fn default() -> Self {
        Self::new(StripStitching::PrimitiveRestart)
    }
}

impl TileMeshFactory {
    pub fn new(stitching: StripStitching) -> Self {
        Self { stitching }
    }

    pub fn stitching(&self) -> StripStitching {
        self.stitching
    }

    /// Generate a `rows × columns` quad grid with spacing `segment_size`.
    ///
    /// Vertices are row-major starting at the origin, columns along +X and
    /// rows along +Z.
    pub fn generate(
        &self,
        rows: u32,
        columns: u32,
        segment_size: f32,
    ) -> Result<BlockMesh, ClipmapError> {
        let invalid = ClipmapError::InvalidDimensions { rows, columns };
        if rows == 0 || columns == 0 {
            return Err(invalid);
        }
        if !segment_size.is_finite() || segment_size <= 0.0 {
            return Err(ClipmapError::invalid_config(format!(
                "segment_size must be positive and finite, got {segment_size}"
            )));
        }

        let stride = columns.checked_add(1).ok_or(invalid.clone())?;
        let vertex_count = rows
            .checked_add(1)
            .and_then(|r| r.checked_mul(stride))
            .filter(|&count| count < PRIMITIVE_RESTART)
            .ok_or(invalid)?;

        let mut vertices = Vec::with_capacity(vertex_count as usize);
        for y in 0..=rows {
            for x in 0..=columns {
                vertices.push(GridVertex {
                    position: [x as f32 * segment_size, 0.0, y as f32 * segment_size],
                });
            }
        }

        let per_row = 2 * stride as usize;
        let joins = match self.stitching {
            StripStitching::PrimitiveRestart => rows as usize,
            StripStitching::DegenerateTriangles => 2 * (rows as usize - 1),
        };
        let mut indices = Vec::with_capacity(rows as usize * per_row + joins);

        for r in 0..rows {
            if r > 0 && self.stitching == StripStitching::DegenerateTriangles {
                // Repeat the previous row's last index and this row's first
                // index; the triangles between them have zero area.
                let last = r * stride + columns;
                indices.push(last);
                indices.push(r * stride);
            }
            for c in 0..stride {
                indices.push(r * stride + c);
                indices.push((r + 1) * stride + c);
            }
            if self.stitching == StripStitching::PrimitiveRestart {
                indices.push(PRIMITIVE_RESTART);
            }
        }

        Ok(BlockMesh {
            vertices,
            indices,
            rows,
            columns,
        })
    }

    /// Generate the mesh for one clipmap block shape.
    pub fn generate_shape(
        &self,
        layout: &ClipmapLayout,
        shape: MeshShape,
    ) -> Result<BlockMesh, ClipmapError> {
        let (rows, columns) = layout.mesh_dimensions(shape);
        self.generate(rows, columns, layout.segment_size())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn restart() -> TileMeshFactory {
        TileMeshFactory::new(StripStitching::PrimitiveRestart)
    }

    fn degenerate() -> TileMeshFactory {
        TileMeshFactory::new(StripStitching::DegenerateTriangles)
    }

    #[test]
    fn test_three_by_two_counts() {
        let mesh = restart().generate(3, 2, 1.0).unwrap();
        assert_eq!(mesh.vertex_count(), 12);
        assert_eq!(mesh.index_count(), 21);
    }

    #[test]
    fn test_sentinel_terminates_every_row() {
        let mesh = restart().generate(3, 2, 1.0).unwrap();
        let sentinels: Vec<usize> = mesh
            .indices
            .iter()
            .enumerate()
            .filter(|&(_, &i)| i == PRIMITIVE_RESTART)
            .map(|(pos, _)| pos)
            .collect();
        assert_eq!(sentinels, vec![6, 13, 20]);
    }

    #[test]
    fn test_row_runs_have_even_length() {
        let mesh = restart().generate(4, 5, 1.0).unwrap();
        for run in mesh.indices.split(|&i| i == PRIMITIVE_RESTART) {
            assert_eq!(run.len() % 2, 0);
        }
    }

    #[test]
    fn test_first_row_pairs_top_and_bottom() {
        let mesh = restart().generate(3, 2, 1.0).unwrap();
        assert_eq!(&mesh.indices[..7], &[0, 3, 1, 4, 2, 5, PRIMITIVE_RESTART]);
        assert_eq!(&mesh.indices[7..14], &[3, 6, 4, 7, 5, 8, PRIMITIVE_RESTART]);
    }

    #[test]
    fn test_vertices_row_major_with_spacing() {
        let mesh = restart().generate(2, 3, 2.5).unwrap();
        assert_eq!(mesh.vertices[0].position, [0.0, 0.0, 0.0]);
        assert_eq!(mesh.vertices[3].position, [7.5, 0.0, 0.0]);
        assert_eq!(mesh.vertices[4].position, [0.0, 0.0, 2.5]);
        assert_eq!(mesh.vertices[11].position, [7.5, 0.0, 5.0]);
        assert!(mesh.vertices.iter().all(|v| v.position[1] == 0.0));
    }

    #[test]
    fn test_indices_stay_in_range() {
        let mesh = restart().generate(8, 1, 1.0).unwrap();
        assert!(
            mesh.indices
                .iter()
                .filter(|&&i| i != PRIMITIVE_RESTART)
                .all(|&i| i < mesh.vertex_count())
        );
    }

    #[test]
    fn test_degenerate_stitching_has_no_sentinel() {
        let mesh = degenerate().generate(3, 2, 1.0).unwrap();
        assert!(!mesh.indices.contains(&PRIMITIVE_RESTART));
        // 3 rows of 6 plus 2 joins of 2.
        assert_eq!(mesh.index_count(), 22);
        assert_eq!(mesh.index_count() % 2, 0);
    }

    #[test]
    fn test_degenerate_join_repeats_boundary_indices() {
        let mesh = degenerate().generate(2, 2, 1.0).unwrap();
        assert_eq!(
            mesh.indices,
            vec![0, 3, 1, 4, 2, 5, 5, 3, 3, 6, 4, 7, 5, 8]
        );
    }

    #[test]
    fn test_degenerate_join_triangles_have_zero_area() {
        let mesh = degenerate().generate(3, 4, 1.0).unwrap();
        let per_row = 2 * (4 + 1);
        for r in 1..3 {
            let join = r * per_row + (r - 1) * 2;
            // Every strip triangle touching the two join indices reuses a vertex.
            for start in join - 2..join + 1 {
                let tri = &mesh.indices[start..start + 3];
                assert!(
                    tri[0] == tri[1] || tri[1] == tri[2] || tri[0] == tri[2],
                    "triangle {tri:?} at {start} is not degenerate"
                );
            }
        }
    }

    #[test]
    fn test_single_row_has_no_join() {
        let mesh = degenerate().generate(1, 7, 1.0).unwrap();
        assert_eq!(mesh.index_count(), 16);
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        assert_eq!(
            restart().generate(0, 2, 1.0),
            Err(ClipmapError::InvalidDimensions {
                rows: 0,
                columns: 2
            })
        );
        assert_eq!(
            restart().generate(3, 0, 1.0),
            Err(ClipmapError::InvalidDimensions {
                rows: 3,
                columns: 0
            })
        );
    }

    #[test]
    fn test_vertex_count_must_stay_below_sentinel() {
        let result = restart().generate(u32::MAX - 1, 1, 1.0);
        assert!(matches!(result, Err(ClipmapError::InvalidDimensions { .. })));
    }

    #[test]
    fn test_bad_segment_size_rejected() {
        assert!(matches!(
            restart().generate(3, 3, 0.0),
            Err(ClipmapError::InvalidConfiguration { .. })
        ));
        assert!(matches!(
            restart().generate(3, 3, f32::INFINITY),
            Err(ClipmapError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn test_shapes_follow_layout() {
        let layout = ClipmapLayout::new(3, 2.0, 1).unwrap();
        let factory = TileMeshFactory::default();
        let connector = factory
            .generate_shape(&layout, MeshShape::HorizontalConnector)
            .unwrap();
        assert_eq!((connector.rows, connector.columns), (8, 1));
        assert_eq!(connector.vertex_count(), 9 * 2);
        let last = connector.vertices.last().unwrap().position;
        assert_eq!(last, [2.0, 0.0, 16.0]);
    }

    #[test]
    fn test_byte_views_match_counts() {
        let mesh = restart().generate(3, 3, 1.0).unwrap();
        assert_eq!(mesh.vertex_bytes().len(), 16 * 12);
        assert_eq!(mesh.index_bytes().len(), mesh.indices.len() * 4);
    }
}
