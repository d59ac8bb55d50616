use crate::*;

/// Key of an edge: the Cantor pairing of its two point ids.
pub type EdgeKey = u128;

/// An inserted edge.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EdgeRecord<V> {
    pub key: EdgeKey,
    /// Insertion ordinal, unique per record.
    pub edge_id: usize,
    pub value: Option<V>,
}

/// Hash based lookup of edges between point ids.
///
/// An _unoriented_ locator treats `(a, b)` and `(b, a)` as the same edge. An _oriented_ locator
/// keeps them apart.
#[derive(Clone, Debug)]
pub struct EdgeLocator<V = ()> {
    oriented: bool,
    /// Every record ever inserted, `edge_id` is the index.
    records: Vec<EdgeRecord<V>>,
    /// The newest record for each key.
    map: HashMap<EdgeKey, usize>,
}

impl<V> Default for EdgeLocator<V> {
    fn default() -> Self {
        Self::new(false)
    }
}

impl<V> EdgeLocator<V> {
    pub fn new(oriented: bool) -> Self {
        Self {
            oriented,
            records: Vec::new(),
            map: HashMap::default(),
        }
    }

    pub fn is_oriented(&self) -> bool {
        self.oriented
    }

    /// Remove all edges.
    pub fn initialize(&mut self) {
        self.records.clear();
        self.map.clear();
    }

    /// The number of records, including repeated inserts through [`Self::insert_edge`].
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The key for an edge.
    ///
    /// Unoriented locators pair `(min, max)` so the key is symmetric.
    pub fn compute_edge_key(&self, a: u32, b: u32) -> EdgeKey {
        if self.oriented || a <= b {
            cantor_pair(a, b)
        } else {
            cantor_pair(b, a)
        }
    }

    /// Return the record for `(a, b)`, creating one if the edge is new.
    ///
    /// If the edge exists and `value` is `Some`, the stored value is replaced.
    pub fn insert_unique_edge(&mut self, a: u32, b: u32, value: Option<V>) -> &EdgeRecord<V> {
        let key = self.compute_edge_key(a, b);
        let existing = self.map.get(&key).copied();
        match existing {
            Some(i) => {
                if value.is_some() {
                    self.records[i].value = value;
                }
                &self.records[i]
            }
            None => self.push(key, value),
        }
    }

    /// Always create a new record for `(a, b)`, even if the edge exists.
    ///
    /// Lookups for the key resolve to this newest record afterwards; earlier records remain
    /// visible through [`Self::iter`].
    pub fn insert_edge(&mut self, a: u32, b: u32, value: Option<V>) -> &EdgeRecord<V> {
        let key = self.compute_edge_key(a, b);
        self.push(key, value)
    }

    /// Look up an edge, `None` if it was never inserted.
    pub fn is_inserted_edge(&self, a: u32, b: u32) -> Option<&EdgeRecord<V>> {
        let key = self.compute_edge_key(a, b);
        self.map.get(&key).map(|&i| &self.records[i])
    }

    /// Recover the point ids of a record.
    ///
    /// For unoriented locators the ids come back ordered `(min, max)`. `None` if the record key
    /// was not computed by a locator.
    pub fn edge_point_ids(&self, record: &EdgeRecord<V>) -> Option<(u32, u32)> {
        cantor_unpair(record.key)
    }

    /// All records in insertion order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &EdgeRecord<V>> {
        self.records.iter()
    }

    fn push(&mut self, key: EdgeKey, value: Option<V>) -> &EdgeRecord<V> {
        let edge_id = self.records.len();
        self.records.push(EdgeRecord {
            key,
            edge_id,
            value,
        });
        self.map.insert(key, edge_id);
        &self.records[edge_id]
    }
}

/// `(x + y)(x + y + 1) / 2 + y`, exact for the whole `u32` range.
pub fn cantor_pair(x: u32, y: u32) -> EdgeKey {
    let (x, y) = (x as u128, y as u128);
    let w = x + y;
    w * (w + 1) / 2 + y
}

/// Exact inverse of [`cantor_pair`], `None` for a key it cannot produce.
pub fn cantor_unpair(key: EdgeKey) -> Option<(u32, u32)> {
    let n = key.checked_mul(8)?.checked_add(1)?;
    let w = (isqrt(n) - 1) / 2;
    let t = w * (w + 1) / 2;
    let y = key - t;
    let x = w - y;
    Some((u32::try_from(x).ok()?, u32::try_from(y).ok()?))
}

/// Floor of the square root.
fn isqrt(n: u128) -> u128 {
    // float estimate, then correct the last few units
    let mut r = (n as f64).sqrt() as u128;
    while r.checked_mul(r).map_or(true, |s| s > n) {
        r -= 1;
    }
    while (r + 1).checked_mul(r + 1).is_some_and(|s| s <= n) {
        r += 1;
    }
    r
}
