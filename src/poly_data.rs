//! Polygonal datasets and their topology.
//!
//! A [`PolyData`] owns points and four cell arrays. Cell ids number the vertex cells first, then
//! lines, polygons and triangle strips. Random access by cell id needs [`PolyData::build_cells`]
//! and point to cell queries need [`PolyData::build_links`]; both caches are dropped whenever
//! the points or a cell array are replaced or mutably borrowed.
use crate::*;

/// One of the four cell arrays of a [`PolyData`], in cell id order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum CellBlock {
    Verts,
    Lines,
    Polys,
    Strips,
}

impl CellBlock {
    pub const ALL: [CellBlock; 4] = [
        CellBlock::Verts,
        CellBlock::Lines,
        CellBlock::Polys,
        CellBlock::Strips,
    ];

    /// The type of a cell of `size` points stored in this block.
    pub fn cell_type(self, size: usize) -> CellType {
        use CellType::*;
        match (self, size) {
            (_, 0) => Empty,
            (CellBlock::Verts, 1) => Vertex,
            (CellBlock::Verts, _) => PolyVertex,
            (CellBlock::Lines, 2) => Line,
            (CellBlock::Lines, _) => PolyLine,
            (CellBlock::Polys, 3) => Triangle,
            (CellBlock::Polys, 4) => Quad,
            (CellBlock::Polys, _) => Polygon,
            (CellBlock::Strips, _) => TriangleStrip,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
struct CellLocation {
    cell_type: CellType,
    block: CellBlock,
    offset: usize,
}

/// Point to cell adjacency, compressed: the cells of point `p` are
/// `cells[offsets[p]..offsets[p + 1]]`.
#[derive(Clone, Debug, PartialEq)]
struct Links {
    offsets: Vec<usize>,
    cells: Vec<usize>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PolyData {
    points: PointSet,
    verts: CellArray,
    lines: CellArray,
    polys: CellArray,
    strips: CellArray,
    cells: Option<Vec<CellLocation>>,
    links: Option<Links>,
}

impl PolyData {
    pub fn new() -> Self {
        Self::default()
    }

    fn invalidate(&mut self) {
        if self.cells.is_some() || self.links.is_some() {
            log::trace!("dropping cached poly data topology");
        }
        self.cells = None;
        self.links = None;
    }

    pub fn points(&self) -> &PointSet {
        &self.points
    }

    pub fn set_points(&mut self, points: PointSet) {
        self.points = points;
        self.invalidate();
    }

    pub fn points_mut(&mut self) -> &mut PointSet {
        self.invalidate();
        &mut self.points
    }

    pub fn cell_array(&self, block: CellBlock) -> &CellArray {
        match block {
            CellBlock::Verts => &self.verts,
            CellBlock::Lines => &self.lines,
            CellBlock::Polys => &self.polys,
            CellBlock::Strips => &self.strips,
        }
    }

    pub fn cell_array_mut(&mut self, block: CellBlock) -> &mut CellArray {
        self.invalidate();
        match block {
            CellBlock::Verts => &mut self.verts,
            CellBlock::Lines => &mut self.lines,
            CellBlock::Polys => &mut self.polys,
            CellBlock::Strips => &mut self.strips,
        }
    }

    pub fn set_cell_array(&mut self, block: CellBlock, cells: CellArray) {
        *self.cell_array_mut(block) = cells;
    }

    pub fn verts(&self) -> &CellArray {
        &self.verts
    }

    pub fn lines(&self) -> &CellArray {
        &self.lines
    }

    pub fn polys(&self) -> &CellArray {
        &self.polys
    }

    pub fn strips(&self) -> &CellArray {
        &self.strips
    }

    pub fn set_verts(&mut self, cells: CellArray) {
        self.set_cell_array(CellBlock::Verts, cells);
    }

    pub fn set_lines(&mut self, cells: CellArray) {
        self.set_cell_array(CellBlock::Lines, cells);
    }

    pub fn set_polys(&mut self, cells: CellArray) {
        self.set_cell_array(CellBlock::Polys, cells);
    }

    pub fn set_strips(&mut self, cells: CellArray) {
        self.set_cell_array(CellBlock::Strips, cells);
    }

    pub fn verts_mut(&mut self) -> &mut CellArray {
        self.cell_array_mut(CellBlock::Verts)
    }

    pub fn lines_mut(&mut self) -> &mut CellArray {
        self.cell_array_mut(CellBlock::Lines)
    }

    pub fn polys_mut(&mut self) -> &mut CellArray {
        self.cell_array_mut(CellBlock::Polys)
    }

    pub fn strips_mut(&mut self) -> &mut CellArray {
        self.cell_array_mut(CellBlock::Strips)
    }

    pub fn number_of_points(&self) -> usize {
        self.points.number_of_points()
    }

    /// Total cells over all four arrays.
    pub fn number_of_cells(&self) -> usize {
        CellBlock::ALL
            .iter()
            .map(|&b| self.cell_array(b).number_of_cells())
            .sum()
    }

    pub fn has_cells(&self) -> bool {
        self.cells.is_some()
    }

    pub fn has_links(&self) -> bool {
        self.links.is_some()
    }

    /// Index every cell by id. Does nothing if the index is current.
    pub fn build_cells(&mut self) {
        if self.cells.is_some() {
            return;
        }

        let mut cells = Vec::with_capacity(self.number_of_cells());
        for block in CellBlock::ALL {
            let a = self.cell_array(block);
            cells.extend(
                a.cell_offsets()
                    .zip(a.cell_sizes())
                    .map(|(offset, size)| CellLocation {
                        cell_type: block.cell_type(size),
                        block,
                        offset,
                    }),
            );
        }

        log::debug!("built {} poly data cells", cells.len());
        self.cells = Some(cells);
    }

    /// Build the point to cell links, building cells first if needed.
    ///
    /// A point used more than once by a cell links to it once. Fails if a cell references a
    /// point id beyond the point set.
    pub fn build_links(&mut self) -> Result<()> {
        if self.links.is_some() {
            return Ok(());
        }
        self.build_cells();
        let cells = self.cells.as_deref().unwrap_or_default();
        let npts = self.number_of_points();

        // pass 1: count uses per point, validating ids
        let mut counts = vec![0usize; npts + 1];
        let mut scratch = Vec::new();
        let mut seen = vec![usize::MAX; npts];
        for (cell_id, loc) in cells.iter().enumerate() {
            self.unique_ids(cell_id, loc, &mut seen, &mut scratch)?;
            for &p in &scratch {
                counts[p + 1] += 1;
            }
        }

        let mut offsets = counts;
        for i in 1..offsets.len() {
            offsets[i] += offsets[i - 1];
        }

        // pass 2: fill, cell ids ascend within each point
        let mut next = offsets.clone();
        let mut links = vec![0; offsets[npts]];
        seen.fill(usize::MAX);
        for (cell_id, loc) in cells.iter().enumerate() {
            self.unique_ids(cell_id, loc, &mut seen, &mut scratch)?;
            for &p in &scratch {
                links[next[p]] = cell_id;
                next[p] += 1;
            }
        }

        log::debug!(
            "built links for {} points over {} cells",
            npts,
            cells.len()
        );
        self.links = Some(Links {
            offsets,
            cells: links,
        });
        Ok(())
    }

    /// The distinct, valid point ids of a cell into `out`.
    ///
    /// `seen` holds, per point, the last cell id that used it.
    fn unique_ids(
        &self,
        cell_id: usize,
        loc: &CellLocation,
        seen: &mut [usize],
        out: &mut Vec<usize>,
    ) -> Result<()> {
        out.clear();
        let npts = self.number_of_points();
        for p in self.cell_array(loc.block).cell(loc.offset)?.iter() {
            if p >= npts {
                return Err(Error::PointIdOutOfRange { id: p, len: npts });
            }
            if seen[p] != cell_id {
                seen[p] = cell_id;
                out.push(p);
            }
        }
        Ok(())
    }

    fn location(&self, cell_id: usize) -> Result<&CellLocation> {
        let cells = self.cells.as_ref().ok_or(Error::CellsNotBuilt)?;
        cells.get(cell_id).ok_or(Error::CellIdOutOfRange {
            id: cell_id,
            len: cells.len(),
        })
    }

    pub fn cell_type(&self, cell_id: usize) -> Result<CellType> {
        self.location(cell_id).map(|l| l.cell_type)
    }

    /// The point ids of a cell, borrowed from its cell array.
    pub fn cell_points(&self, cell_id: usize) -> Result<CellIds<'_>> {
        let loc = self.location(cell_id)?;
        self.cell_array(loc.block).cell(loc.offset)
    }

    /// Load cell `cell_id` into `cell`, overwriting its contents and reusing its buffers.
    ///
    /// # Example
    /// ```rust
    /// # use cellgeom::*;
    /// let mut pd = PolyData::new();
    /// pd.set_points([[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]].into_iter().collect());
    /// pd.set_polys(CellArray::from_cells([[0, 1, 2]]));
    /// pd.build_cells();
    ///
    /// let mut cell = Cell::new();
    /// pd.get_cell(0, &mut cell).unwrap();
    /// assert_eq!(cell.cell_type, CellType::Triangle);
    /// assert_eq!(cell.point_ids, vec![0, 1, 2]);
    /// assert_eq!(cell.points[1], [1.0, 0.0, 0.0]);
    /// ```
    pub fn get_cell(&self, cell_id: usize, cell: &mut Cell) -> Result<()> {
        let loc = self.location(cell_id)?;
        let ids = self.cell_array(loc.block).cell(loc.offset)?;

        cell.clear();
        cell.cell_type = loc.cell_type;
        cell.point_ids.extend(ids.iter());
        for &id in &cell.point_ids {
            cell.points.push(self.points.get_point(id)?);
        }
        Ok(())
    }

    /// Allocating variant of [`Self::get_cell`].
    pub fn cell(&self, cell_id: usize) -> Result<Cell> {
        let mut c = Cell::new();
        self.get_cell(cell_id, &mut c)?;
        Ok(c)
    }

    /// The cells using point `point_id`, ascending.
    pub fn point_cells(&self, point_id: usize) -> Result<&[usize]> {
        let links = self.links.as_ref().ok_or(Error::LinksNotBuilt)?;
        let len = links.offsets.len() - 1;
        if point_id >= len {
            return Err(Error::PointIdOutOfRange { id: point_id, len });
        }
        Ok(&links.cells[links.offsets[point_id]..links.offsets[point_id + 1]])
    }

    /// Cells other than `cell_id` that use both `p1` and `p2`.
    pub fn cell_edge_neighbors(&self, cell_id: usize, p1: usize, p2: usize) -> Result<Vec<usize>> {
        let mut v = Vec::new();
        for &c in self.point_cells(p1)? {
            if c != cell_id && self.cell_points(c)?.contains(p2) {
                v.push(c);
            }
        }
        Ok(v)
    }

    /// Whether `p1` and `p2` are joined by an edge of some cell.
    pub fn is_edge(&self, p1: usize, p2: usize) -> Result<bool> {
        for &c in self.point_cells(p1)? {
            let ids = self.cell_points(c)?.to_vec();
            let t = self.cell_type(c)?;
            if t
                .edges(&ids)
                .iter()
                .any(|&[a, b]| (a == p1 && b == p2) || (a == p2 && b == p1))
            {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// The bounds of the points used by cells, or of all points when there are no cells.
    ///
    /// Cell point ids beyond the point set are skipped.
    pub fn bounds(&self) -> Bounds {
        if self.number_of_cells() == 0 {
            return self.points.get_bounds();
        }

        CellBlock::ALL
            .iter()
            .flat_map(|&b| self.cell_array(b).cells())
            .flat_map(|ids| ids.iter())
            .filter_map(|id| self.points.get_point(id).ok())
            .collect()
    }

    /// Every distinct edge of every cell, as two point line cells in first seen order.
    pub fn extract_edges(&self) -> Result<CellArray> {
        let npts = self.number_of_points();
        let mut locator = EdgeLocator::<()>::default();
        let mut out = CellArray::for_points(npts, 2);

        let to_u32 = |id: usize| {
            u32::try_from(id)
                .ok()
                .filter(|_| id < npts)
                .ok_or(Error::PointIdOutOfRange { id, len: npts })
        };

        for block in CellBlock::ALL {
            let a = self.cell_array(block);
            for (offset, size) in a.cell_offsets().zip(a.cell_sizes()) {
                let ids = a.cell(offset)?.to_vec();
                for [p, q] in block.cell_type(size).edges(&ids) {
                    let (ep, eq) = (to_u32(p)?, to_u32(q)?);
                    if ep == eq || locator.is_inserted_edge(ep, eq).is_some() {
                        continue;
                    }
                    locator.insert_unique_edge(ep, eq, None);
                    out.insert_next_cell(&[p, q]);
                }
            }
        }

        log::debug!("extracted {} edges", out.number_of_cells());
        Ok(out)
    }
}

impl Aabb for PolyData {
    fn aabb(&self) -> Bounds {
        self.bounds()
    }
}
