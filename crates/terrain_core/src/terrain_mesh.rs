//! Tile grid to triangle mesh conversion.
//!
//! Every tile cell expands into its 3x3 pattern, giving a dense
//! `(3 * width) x (3 * height)` raster of edge codes. Each raster sample
//! becomes one vertex:
//!
//! - water sits at `WATER_LEVEL` with an up normal
//! - sand, land and road are flattened to z = 0 with an up normal
//! - a vertex whose left or bottom raster neighbour is water is pulled down
//!   to `WATER_LEVEL` so the shoreline has no cracks
//! - fallback (invalid) samples keep the raw heightmap elevation and get a
//!   finite-difference normal, which makes unresolved cells stand out
//!
//! Positions are normalized so the whole raster covers the unit square
//! centred on the origin in the XY plane; z is up. Each unit quad becomes two
//! triangles with the same winding.
//!
//! Building is deterministic: the same grid, tile set and height field always
//! produce the same mesh.

use bevy::asset::RenderAssetUsages;
use bevy::mesh::{Indices, MeshVertexAttribute, PrimitiveTopology};
use bevy::prelude::*;
use bevy::render::render_resource::VertexFormat;

use crate::grid::{GridCell, TileGrid};
use crate::height::HeightField;
use crate::tile::EdgeCode;
use crate::tileset::TileSet;

/// Elevation of water vertices.
pub const WATER_LEVEL: f32 = -0.03125;

/// Sub-cells per tile side.
pub const TILE_SPAN: usize = 3;

/// Custom vertex attribute carrying the raw edge code of each vertex.
pub const ATTRIBUTE_TILE_CODE: MeshVertexAttribute =
    MeshVertexAttribute::new("TileCode", 988540930, VertexFormat::Uint32);

const UP: [f32; 3] = [0.0, 0.0, 1.0];

/// Dense raster of edge codes, `(3 * width) x (3 * height)`, index `x + y * width`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeRaster {
    width: usize,
    height: usize,
    codes: Vec<EdgeCode>,
}

impl EdgeRaster {
    /// Copy every cell's pattern into the raster. Fallback cells, and tile
    /// ids the tile set does not know, use the tile set's fallback pattern.
    pub fn expand(grid: &TileGrid, tileset: &TileSet) -> Self {
        let width = grid.width() * TILE_SPAN;
        let height = grid.height() * TILE_SPAN;
        let mut codes = vec![EdgeCode::Invalid; width * height];

        for (gx, gy, cell) in grid.iter() {
            let pattern = match cell {
                GridCell::Solved(tile) => tileset
                    .patterns()
                    .get(tile)
                    .unwrap_or_else(|| tileset.fallback()),
                GridCell::Fallback => tileset.fallback(),
            };
            for dx in 0..TILE_SPAN {
                for dy in 0..TILE_SPAN {
                    let x = gx * TILE_SPAN + dx;
                    let y = gy * TILE_SPAN + dy;
                    codes[x + y * width] = pattern.get(dx, dy);
                }
            }
        }

        Self {
            width,
            height,
            codes,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Code at (x, y). Panics if out of bounds.
    pub fn get(&self, x: usize, y: usize) -> EdgeCode {
        self.codes[x + y * self.width]
    }

    pub fn codes(&self) -> &[EdgeCode] {
        &self.codes
    }

    /// One text line per raster row, top row first, digits = edge codes.
    pub fn to_text(&self) -> String {
        let mut out = String::with_capacity((self.width + 1) * self.height);
        for y in (0..self.height).rev() {
            for x in 0..self.width {
                out.push(char::from(b'0' + self.get(x, y).value()));
            }
            out.push('\n');
        }
        out
    }
}

/// Renderable terrain mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct TerrainMesh {
    /// `[x, y, z]`, x and y in [-0.5, 0.5), z up
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    /// Triangle vertex indices
    pub faces: Vec<[u32; 3]>,
    /// Edge code of each vertex (for shading)
    pub codes: Vec<EdgeCode>,
    /// Expanded raster the mesh was built from
    pub raster: EdgeRaster,
    /// Tile grid the mesh was built from
    pub tile_map: TileGrid,
}

impl TerrainMesh {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Vertex codes packed four at a time as base-10 digits
    /// (`c0 * 1000 + c1 * 100 + c2 * 10 + c3`), the layout the terrain shader
    /// reads. A trailing partial group is padded with zeros.
    pub fn packed_codes(&self) -> Vec<u32> {
        self.codes
            .chunks(4)
            .map(|group| {
                (0..4).fold(0, |acc, i| {
                    acc * 10 + group.get(i).map_or(0, |c| c.value() as u32)
                })
            })
            .collect()
    }

    /// Build a Bevy mesh with positions, normals, per-code vertex colors and
    /// the raw codes in `ATTRIBUTE_TILE_CODE`.
    pub fn to_bevy_mesh(&self) -> Mesh {
        let colors: Vec<[f32; 4]> = self.codes.iter().map(|&c| code_color(c)).collect();
        let codes: Vec<u32> = self.codes.iter().map(|&c| c.value() as u32).collect();
        let indices: Vec<u32> = self.faces.iter().flatten().copied().collect();

        Mesh::new(PrimitiveTopology::TriangleList, RenderAssetUsages::default())
            .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, self.positions.clone())
            .with_inserted_attribute(Mesh::ATTRIBUTE_NORMAL, self.normals.clone())
            .with_inserted_attribute(Mesh::ATTRIBUTE_COLOR, colors)
            .with_inserted_attribute(ATTRIBUTE_TILE_CODE, codes)
            .with_inserted_indices(Indices::U32(indices))
    }
}

/// Linear RGBA used to shade each edge code.
pub fn code_color(code: EdgeCode) -> [f32; 4] {
    match code {
        EdgeCode::Water => [0.05, 0.25, 0.6, 1.0],
        EdgeCode::Sand => [0.85, 0.75, 0.45, 1.0],
        EdgeCode::Land => [0.2, 0.5, 0.15, 1.0],
        EdgeCode::Road => [0.35, 0.33, 0.3, 1.0],
        EdgeCode::Invalid => [1.0, 0.0, 1.0, 1.0],
    }
}

/// Builds `TerrainMesh`es for a tile set over a height field.
pub struct MeshBuilder<'a, H: HeightField> {
    tileset: &'a TileSet,
    heights: &'a H,
}

impl<'a, H: HeightField> MeshBuilder<'a, H> {
    pub fn new(tileset: &'a TileSet, heights: &'a H) -> Self {
        Self { tileset, heights }
    }

    /// Heightmap sample recentred around zero.
    fn elevation(&self, x: usize, y: usize) -> f32 {
        self.heights.get(x as i64, y as i64) - 0.5
    }

    /// Finite-difference normal of the height field at raster sample (x, y).
    fn gradient_normal(&self, x: usize, y: usize, width: usize, height: usize) -> [f32; 3] {
        let (x, y) = (x as i64, y as i64);
        let h = |x: i64, y: i64| self.heights.get(x, y);

        let dx = h(x + 1, y) - h(x - 1, y);
        let dy = h(x, y + 1) - h(x, y - 1);

        Vec3::new(-dx * (width as f32 / 2.0), -dy * (height as f32 / 2.0), 1.0)
            .normalize()
            .to_array()
    }

    pub fn build(&self, grid: &TileGrid) -> TerrainMesh {
        let raster = EdgeRaster::expand(grid, self.tileset);
        let width = raster.width();
        let height = raster.height();
        let vertex_count = width * height;

        let mut positions = Vec::with_capacity(vertex_count);
        let mut normals = Vec::with_capacity(vertex_count);

        for y in 0..height {
            for x in 0..width {
                let code = raster.get(x, y);

                let (mut z, normal) = match code {
                    EdgeCode::Water => (WATER_LEVEL, UP),
                    EdgeCode::Sand | EdgeCode::Land | EdgeCode::Road => (0.0, UP),
                    EdgeCode::Invalid => (
                        self.elevation(x, y),
                        self.gradient_normal(x, y, width, height),
                    ),
                };

                let water_left = x > 0 && raster.get(x - 1, y).is_water();
                let water_below = y > 0 && raster.get(x, y - 1).is_water();
                if water_left || water_below {
                    z = WATER_LEVEL;
                }

                positions.push([
                    x as f32 / width as f32 - 0.5,
                    y as f32 / height as f32 - 0.5,
                    z,
                ]);
                normals.push(normal);
            }
        }

        let faces = triangulate(width, height);

        TerrainMesh {
            positions,
            normals,
            faces,
            codes: raster.codes().to_vec(),
            raster,
            tile_map: grid.clone(),
        }
    }
}

/// Two triangles per unit quad of a `width x height` vertex grid.
///
/// With `va = (x, y)`, `vb = (x + 1, y)`, `vc = (x, y + 1)`, `vd = (x + 1, y + 1)`
/// the triangles are `[va, vb, vc]` and `[vb, vd, vc]`.
pub fn triangulate(width: usize, height: usize) -> Vec<[u32; 3]> {
    let index = |x: usize, y: usize| (x + y * width) as u32;
    let quads = width.saturating_sub(1) * height.saturating_sub(1);
    let mut faces = Vec::with_capacity(quads * 2);

    for y in 0..height.saturating_sub(1) {
        for x in 0..width.saturating_sub(1) {
            let va = index(x, y);
            let vb = index(x + 1, y);
            let vc = index(x, y + 1);
            let vd = index(x + 1, y + 1);
            faces.push([va, vb, vc]);
            faces.push([vb, vd, vc]);
        }
    }

    faces
}

/// Build the terrain mesh for a solved grid.
///
/// Cells holding a tile id outside `tileset` are meshed like fallback cells.
pub fn build_mesh<H: HeightField>(grid: &TileGrid, tileset: &TileSet, heights: &H) -> TerrainMesh {
    MeshBuilder::new(tileset, heights).build(grid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::height::HeightSampler;
    use crate::tile::TilePattern;
    use crate::tileset::coastal;

    /// Water on the left column, land on the right column.
    const SHORE_X: usize = 2;
    /// Water along y = 0, land along y = 2.
    const SHORE_Y: usize = 4;

    fn flat() -> HeightSampler {
        HeightSampler::flat(4, 4, 0.7).unwrap()
    }

    #[test]
    fn test_vertex_and_face_counts() {
        let tileset = TileSet::coastal();
        let grid = TileGrid::filled(2, 3, coastal::LAND);
        let mesh = build_mesh(&grid, &tileset, &flat());

        assert_eq!(mesh.vertex_count(), 6 * 9);
        assert_eq!(mesh.normals.len(), 6 * 9);
        assert_eq!(mesh.codes.len(), 6 * 9);
        assert_eq!(mesh.face_count(), 2 * 5 * 8);
    }

    #[test]
    fn test_expand_copies_patterns() {
        let tileset = TileSet::coastal();
        let cells = vec![GridCell::Solved(coastal::WATER), GridCell::Solved(SHORE_X)];
        let grid = TileGrid::from_cells(2, 1, cells).unwrap();
        let raster = EdgeRaster::expand(&grid, &tileset);

        assert_eq!((raster.width(), raster.height()), (6, 3));
        let shore = tileset.pattern(SHORE_X);
        for dx in 0..3 {
            for dy in 0..3 {
                assert_eq!(raster.get(dx, dy), EdgeCode::Water);
                assert_eq!(raster.get(3 + dx, dy), shore.get(dx, dy));
            }
        }
        assert_eq!(raster.to_text(), "000012\n000012\n000012\n");
    }

    #[test]
    fn test_water_vertices_clamped() {
        let tileset = TileSet::coastal();
        let grid = TileGrid::filled(2, 2, coastal::WATER);
        let mesh = build_mesh(&grid, &tileset, &flat());

        for (i, position) in mesh.positions.iter().enumerate() {
            assert_eq!(position[2], WATER_LEVEL);
            assert_eq!(mesh.normals[i], UP);
        }
    }

    #[test]
    fn test_land_is_flattened() {
        let tileset = TileSet::coastal();
        let grid = TileGrid::filled(1, 1, coastal::LAND);
        let mesh = build_mesh(&grid, &tileset, &flat());

        assert!(mesh.positions.iter().all(|p| p[2] == 0.0));
        assert!(mesh.normals.iter().all(|&n| n == UP));
    }

    #[test]
    fn test_shoreline_left_neighbor() {
        let tileset = TileSet::coastal();
        let grid = TileGrid::filled(1, 1, SHORE_X);
        let mesh = build_mesh(&grid, &tileset, &flat());

        for y in 0..3 {
            // Own code water
            assert_eq!(mesh.positions[y * 3][2], WATER_LEVEL);
            // Sand with water to the left
            assert_eq!(mesh.positions[1 + y * 3][2], WATER_LEVEL);
            assert_eq!(mesh.normals[1 + y * 3], UP);
            // Land with sand to the left
            assert_eq!(mesh.positions[2 + y * 3][2], 0.0);
        }
    }

    #[test]
    fn test_shoreline_bottom_neighbor() {
        let tileset = TileSet::coastal();
        let grid = TileGrid::filled(1, 1, SHORE_Y);
        let mesh = build_mesh(&grid, &tileset, &flat());

        for x in 0..3 {
            assert_eq!(mesh.positions[x][2], WATER_LEVEL);
            // Sand row sits above the water row
            assert_eq!(mesh.positions[x + 3][2], WATER_LEVEL);
            assert_eq!(mesh.positions[x + 6][2], 0.0);
        }
    }

    #[test]
    fn test_positions_cover_unit_square() {
        let tileset = TileSet::coastal();
        let grid = TileGrid::filled(2, 1, coastal::LAND);
        let mesh = build_mesh(&grid, &tileset, &flat());

        assert_eq!(mesh.positions[0], [-0.5, -0.5, 0.0]);
        let last = mesh.positions[mesh.vertex_count() - 1];
        assert!((last[0] - (5.0 / 6.0 - 0.5)).abs() < 1e-6);
        assert!((last[1] - (2.0 / 3.0 - 0.5)).abs() < 1e-6);
    }

    #[test]
    fn test_triangulation_winding() {
        let faces = triangulate(3, 2);
        assert_eq!(faces, vec![[0, 1, 3], [1, 4, 3], [1, 2, 4], [2, 5, 4]]);
        assert!(triangulate(1, 5).is_empty());
    }

    #[test]
    fn test_fallback_uses_heightmap() {
        let tileset = TileSet::coastal();
        let grid = TileGrid::from_cells(1, 1, vec![GridCell::Fallback]).unwrap();
        // Ramp along x: 0.0, 0.1, 0.2 on every row
        let heights = HeightSampler::from_f32(
            3,
            3,
            vec![0.0, 0.1, 0.2, 0.0, 0.1, 0.2, 0.0, 0.1, 0.2],
        )
        .unwrap();
        let mesh = build_mesh(&grid, &tileset, &heights);

        assert!(mesh.codes.iter().all(|&c| c == EdgeCode::Invalid));

        let centre = 1 + 3;
        assert!((mesh.positions[centre][2] - (0.1 - 0.5)).abs() < 1e-6);

        // Central difference 0.2 scaled by 3 / 2
        let expected = Vec3::new(-0.3, 0.0, 1.0).normalize();
        let normal = Vec3::from_array(mesh.normals[centre]);
        assert!((normal - expected).length() < 1e-5, "normal {:?}", normal);
    }

    #[test]
    fn test_fallback_next_to_water_is_pulled_down() {
        let tileset = TileSet::coastal();
        let cells = vec![GridCell::Solved(coastal::WATER), GridCell::Fallback];
        let grid = TileGrid::from_cells(2, 1, cells).unwrap();
        let mesh = build_mesh(&grid, &tileset, &flat());

        // First fallback column touches water on its left
        assert_eq!(mesh.positions[3][2], WATER_LEVEL);
        // Next column keeps the heightmap elevation
        assert!((mesh.positions[4][2] - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_unknown_tile_id_expands_as_fallback() {
        let tileset = TileSet::coastal();
        let cells = vec![GridCell::Solved(coastal::LAND), GridCell::Solved(99)];
        let grid = TileGrid::from_cells(2, 1, cells).unwrap();
        let mesh = build_mesh(&grid, &tileset, &flat());

        for dx in 0..3 {
            for dy in 0..3 {
                assert_eq!(mesh.raster.get(dx, dy), EdgeCode::Land);
                assert_eq!(mesh.raster.get(3 + dx, dy), EdgeCode::Invalid);
            }
        }
        assert_eq!(mesh.vertex_count(), 54);
    }

    #[test]
    fn test_custom_fallback_pattern() {
        let tileset = TileSet::coastal().with_fallback(TilePattern::uniform(EdgeCode::Water));
        let grid = TileGrid::from_cells(1, 1, vec![GridCell::Fallback]).unwrap();
        let mesh = build_mesh(&grid, &tileset, &flat());
        assert!(mesh.positions.iter().all(|p| p[2] == WATER_LEVEL));
    }

    #[test]
    fn test_build_is_deterministic() {
        let tileset = TileSet::coastal();
        let cells = vec![
            GridCell::Solved(SHORE_X),
            GridCell::Fallback,
            GridCell::Solved(coastal::ROAD_CROSS),
            GridCell::Solved(SHORE_Y),
        ];
        let grid = TileGrid::from_cells(2, 2, cells).unwrap();
        let data: Vec<u8> = (0..36).map(|i| (i * 7 % 256) as u8).collect();
        let heights = HeightSampler::from_unorm8(6, 6, data).unwrap();

        let a = build_mesh(&grid, &tileset, &heights);
        let b = build_mesh(&grid, &tileset, &heights);

        let bits = |m: &TerrainMesh| -> Vec<u32> {
            m.positions
                .iter()
                .chain(m.normals.iter())
                .flatten()
                .map(|v| v.to_bits())
                .collect()
        };
        assert_eq!(bits(&a), bits(&b));
        assert_eq!(a.faces, b.faces);
        assert_eq!(a.codes, b.codes);
    }

    #[test]
    fn test_packed_codes() {
        let tileset = TileSet::coastal();
        let grid = TileGrid::filled(1, 1, SHORE_X);
        let mesh = build_mesh(&grid, &tileset, &flat());

        // Nine vertex codes 0 1 2 0 1 2 0 1 2 group as 0120 | 1201 | 2 (zero padded)
        assert_eq!(mesh.packed_codes(), vec![120, 1201, 2000]);
    }

    #[test]
    fn test_to_bevy_mesh() {
        let tileset = TileSet::coastal();
        let grid = TileGrid::filled(2, 2, coastal::LAND);
        let terrain = build_mesh(&grid, &tileset, &flat());
        let mesh = terrain.to_bevy_mesh();

        assert_eq!(mesh.count_vertices(), 36);
        assert_eq!(mesh.indices().map(|i| i.len()), Some(terrain.face_count() * 3));
        assert!(mesh.attribute(ATTRIBUTE_TILE_CODE).is_some());
        assert!(mesh.attribute(Mesh::ATTRIBUTE_COLOR).is_some());
    }
}
