//! Packed cell connectivity.
//!
//! A cell array is a single flat buffer of unsigned integers holding cells back to back as
//! `[size, id0, id1, ..., id(size-1)]`. The cell id is the ordinal position of a cell when
//! walking the buffer; it is never stored. This layout is shared verbatim with external writers.
use crate::*;

/// Storage width of a cell array.
#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, serde::Serialize,
    serde::Deserialize,
)]
pub enum IdWidth {
    U8,
    U16,
    #[default]
    U32,
    U64,
}

impl IdWidth {
    /// The smallest width that can represent `max_value`.
    pub fn smallest_for(max_value: u64) -> Self {
        if max_value <= u8::MAX as u64 {
            IdWidth::U8
        } else if max_value <= u16::MAX as u64 {
            IdWidth::U16
        } else if max_value <= u32::MAX as u64 {
            IdWidth::U32
        } else {
            IdWidth::U64
        }
    }

    /// The largest value this width can hold.
    pub fn max_value(self) -> u64 {
        match self {
            IdWidth::U8 => u8::MAX as u64,
            IdWidth::U16 => u16::MAX as u64,
            IdWidth::U32 => u32::MAX as u64,
            IdWidth::U64 => u64::MAX,
        }
    }
}

/// The raw flat buffer, in one of the supported widths.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum CellData {
    U8(Vec<u8>),
    U16(Vec<u16>),
    U32(Vec<u32>),
    U64(Vec<u64>),
}

macro_rules! each_width {
    ($data:expr, $enum:ident, $v:ident => $body:expr) => {
        match $data {
            $enum::U8($v) => $body,
            $enum::U16($v) => $body,
            $enum::U32($v) => $body,
            $enum::U64($v) => $body,
        }
    };
}

impl CellData {
    fn empty(width: IdWidth) -> Self {
        match width {
            IdWidth::U8 => CellData::U8(Vec::new()),
            IdWidth::U16 => CellData::U16(Vec::new()),
            IdWidth::U32 => CellData::U32(Vec::new()),
            IdWidth::U64 => CellData::U64(Vec::new()),
        }
    }

    fn from_u64(raw: &[u64], width: IdWidth) -> Self {
        match width {
            IdWidth::U8 => CellData::U8(raw.iter().map(|&x| x as u8).collect()),
            IdWidth::U16 => CellData::U16(raw.iter().map(|&x| x as u16).collect()),
            IdWidth::U32 => CellData::U32(raw.iter().map(|&x| x as u32).collect()),
            IdWidth::U64 => CellData::U64(raw.to_vec()),
        }
    }

    pub fn width(&self) -> IdWidth {
        match self {
            CellData::U8(_) => IdWidth::U8,
            CellData::U16(_) => IdWidth::U16,
            CellData::U32(_) => IdWidth::U32,
            CellData::U64(_) => IdWidth::U64,
        }
    }

    pub fn len(&self) -> usize {
        each_width!(self, CellData, v => v.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    fn get(&self, i: usize) -> u64 {
        each_width!(self, CellData, v => v[i] as u64)
    }
}

impl From<Vec<u8>> for CellData {
    fn from(v: Vec<u8>) -> Self {
        CellData::U8(v)
    }
}

impl From<Vec<u16>> for CellData {
    fn from(v: Vec<u16>) -> Self {
        CellData::U16(v)
    }
}

impl From<Vec<u32>> for CellData {
    fn from(v: Vec<u32>) -> Self {
        CellData::U32(v)
    }
}

impl From<Vec<u64>> for CellData {
    fn from(v: Vec<u64>) -> Self {
        CellData::U64(v)
    }
}

/// The point ids of one cell, borrowed from a [`CellArray`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CellIds<'a> {
    U8(&'a [u8]),
    U16(&'a [u16]),
    U32(&'a [u32]),
    U64(&'a [u64]),
}

impl<'a> CellIds<'a> {
    pub fn len(&self) -> usize {
        each_width!(self, CellIds, s => s.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// # Panics
    /// Panics if `i` is out of range.
    pub fn get(&self, i: usize) -> usize {
        each_width!(self, CellIds, s => s[i] as usize)
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = usize> + 'a {
        let ids = *self;
        (0..ids.len()).map(move |i| ids.get(i))
    }

    pub fn to_vec(&self) -> Vec<usize> {
        self.iter().collect()
    }

    pub fn contains(&self, id: usize) -> bool {
        self.iter().any(|x| x == id)
    }
}

/// A packed list of cells.
///
/// Serialises as its raw [`CellData`]; deserialising validates the layout like
/// [`CellArray::from_data`].
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "CellData", into = "CellData")]
pub struct CellArray {
    data: CellData,
    num_cells: usize,
    max_cell_size: usize,
}

impl Default for CellArray {
    fn default() -> Self {
        Self::new()
    }
}

impl TryFrom<CellData> for CellArray {
    type Error = Error;

    fn try_from(data: CellData) -> Result<Self> {
        Self::from_data(data)
    }
}

impl From<CellArray> for CellData {
    fn from(a: CellArray) -> Self {
        a.data
    }
}

impl CellArray {
    /// An empty array with the default 32-bit width.
    pub fn new() -> Self {
        Self::with_width(IdWidth::default())
    }

    pub fn with_width(width: IdWidth) -> Self {
        Self {
            data: CellData::empty(width),
            num_cells: 0,
            max_cell_size: 0,
        }
    }

    /// An empty array using the smallest width that holds point ids below `num_points` and
    /// cell sizes up to `max_cell_size`.
    pub fn for_points(num_points: usize, max_cell_size: usize) -> Self {
        let max = num_points.saturating_sub(1).max(max_cell_size) as u64;
        Self::with_width(IdWidth::smallest_for(max))
    }

    /// Bulk load a flat buffer, validating the `[size, ids...]` layout.
    pub fn from_data(data: impl Into<CellData>) -> Result<Self> {
        let data = data.into();
        let len = data.len();
        let mut offset = 0;
        let mut num_cells = 0;
        let mut max_cell_size = 0;

        while offset < len {
            let size = data.get(offset) as usize;
            let remaining = len - offset - 1;
            if size > remaining {
                return Err(Error::MalformedCellArray {
                    offset,
                    size,
                    remaining,
                });
            }
            max_cell_size = max_cell_size.max(size);
            num_cells += 1;
            offset += size + 1;
        }

        Ok(Self {
            data,
            num_cells,
            max_cell_size,
        })
    }

    /// Build from a list of cells, each a list of point ids.
    pub fn from_cells<I, C>(cells: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: AsRef<[usize]>,
    {
        let mut a = Self::new();
        for c in cells {
            a.insert_next_cell(c.as_ref());
        }
        a
    }

    /// Replace the contents with a bulk loaded buffer.
    pub fn set_data(&mut self, data: impl Into<CellData>) -> Result<()> {
        *self = Self::from_data(data)?;
        Ok(())
    }

    /// Append a cell, returning its cell id.
    ///
    /// Storage grows by doubling. If the size or an id does not fit the current width the
    /// storage is widened first.
    pub fn insert_next_cell(&mut self, ids: &[usize]) -> usize {
        let needed = ids.iter().copied().fold(ids.len(), usize::max) as u64;
        if needed > self.width().max_value() {
            let to = IdWidth::smallest_for(needed);
            log::debug!(
                "widening cell array from {:?} to {:?} to hold {}",
                self.width(),
                to,
                needed
            );
            self.data = CellData::from_u64(&self.data_u64(), to);
        }

        each_width!(&mut self.data, CellData, v => {
            reserve_doubling(v, ids.len() + 1);
            v.push(ids.len() as _);
            for &id in ids {
                v.push(id as _);
            }
        });

        self.max_cell_size = self.max_cell_size.max(ids.len());
        let id = self.num_cells;
        self.num_cells += 1;
        id
    }

    pub fn width(&self) -> IdWidth {
        self.data.width()
    }

    pub fn number_of_cells(&self) -> usize {
        self.num_cells
    }

    pub fn max_cell_size(&self) -> usize {
        self.max_cell_size
    }

    /// Length of the flat buffer.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn data(&self) -> &CellData {
        &self.data
    }

    /// The flat buffer widened to `u64`.
    pub fn data_u64(&self) -> Vec<u64> {
        each_width!(&self.data, CellData, v => v.iter().map(|&x| x as u64).collect())
    }

    pub fn clear(&mut self) {
        *self = Self::with_width(self.width());
    }

    /// The size of every cell, in order.
    pub fn cell_sizes(&self) -> impl Iterator<Item = usize> + '_ {
        let mut offset = 0;
        std::iter::from_fn(move || {
            if offset >= self.len() {
                return None;
            }
            let size = self.data.get(offset) as usize;
            offset += size + 1;
            Some(size)
        })
    }

    /// The point ids of the cell starting at `offset` in the flat buffer.
    pub fn cell(&self, offset: usize) -> Result<CellIds<'_>> {
        let len = self.len();
        if offset >= len {
            return Err(Error::MalformedCellArray {
                offset,
                size: 0,
                remaining: 0,
            });
        }

        let size = self.data.get(offset) as usize;
        let remaining = len - offset - 1;
        if size > remaining {
            return Err(Error::MalformedCellArray {
                offset,
                size,
                remaining,
            });
        }

        let r = offset + 1..offset + 1 + size;
        Ok(match &self.data {
            CellData::U8(v) => CellIds::U8(&v[r]),
            CellData::U16(v) => CellIds::U16(&v[r]),
            CellData::U32(v) => CellIds::U32(&v[r]),
            CellData::U64(v) => CellIds::U64(&v[r]),
        })
    }

    /// Walk the cells in cell id order.
    pub fn cells(&self) -> impl Iterator<Item = CellIds<'_>> + '_ {
        self.cell_offsets().filter_map(move |o| self.cell(o).ok())
    }

    /// The flat buffer offset of every cell, in cell id order.
    pub fn cell_offsets(&self) -> impl Iterator<Item = usize> + '_ {
        let mut offset = 0;
        self.cell_sizes().map(move |s| {
            let o = offset;
            offset += s + 1;
            o
        })
    }
}

/// Grow to fit `additional` more elements, at least doubling the capacity when full.
fn reserve_doubling<T>(v: &mut Vec<T>, additional: usize) {
    let need = v.len() + additional;
    if need > v.capacity() {
        let target = need.max(v.capacity() * 2);
        v.reserve_exact(target - v.len());
    }
}

/// Lazily walk a flat cell buffer, yielding each cell's size.
pub fn extract_cell_sizes<T>(data: &[T]) -> CellSizes<'_, T>
where
    T: Copy + Into<u64>,
{
    CellSizes { data, offset: 0 }
}

/// Iterator returned by [`extract_cell_sizes`].
pub struct CellSizes<'a, T> {
    data: &'a [T],
    offset: usize,
}

impl<'a, T> Iterator for CellSizes<'a, T>
where
    T: Copy + Into<u64>,
{
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let size: u64 = (*self.data.get(self.offset)?).into();
        let size = size as usize;
        self.offset = self.offset.saturating_add(size).saturating_add(1);
        Some(size)
    }
}
