//! Incremental octree point locator.
//!
//! Points are inserted one at a time into a tree rooted at fixed bounds. A leaf that holds more
//! than [`OctreeConfig::max_points_per_leaf`] points splits into 8 children through its centre
//! and redistributes its points. Queries walk the tree nearest node first and prune any node
//! whose box is further away than the best candidate so far, so results are exact.
use crate::*;

/// Leaves this deep are never split.
const MAX_DEPTH: usize = 32;

/// Relative padding applied to the root bounds.
const BOUNDS_PAD: f64 = 0.01;

/// Settings for an [`IncrementalOctreePointLocator`].
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct OctreeConfig {
    /// Split threshold of a leaf.
    pub max_points_per_leaf: usize,
    /// Make the root a cube on the longest side of the inserted bounds.
    pub build_cubic_octree: bool,
    /// Distance within which [`IncrementalOctreePointLocator::is_inserted_point`] treats a
    /// point as already present.
    pub tolerance: f64,
}

impl Default for OctreeConfig {
    fn default() -> Self {
        Self {
            max_points_per_leaf: 128,
            build_cubic_octree: false,
            tolerance: 0.0,
        }
    }
}

#[derive(Clone, Debug)]
struct Node {
    bounds: Bounds,
    depth: usize,
    /// Index of the first of 8 contiguous children, `None` for a leaf.
    children: Option<usize>,
    points: Vec<usize>,
}

impl Node {
    fn leaf(bounds: Bounds, depth: usize) -> Self {
        Self {
            bounds,
            depth,
            children: None,
            points: Vec::new(),
        }
    }
}

/// The child octant of `b` containing `p`, see [`Bounds::octant`].
fn octant_of(b: &Bounds, p: Point3) -> usize {
    let c = b.center();
    (0..3)
        .filter(|&i| p[i] > c[i])
        .fold(0, |o, i| o | (1 << i))
}

/// A point locator which indexes points as they are inserted.
#[derive(Clone, Debug, Default)]
pub struct IncrementalOctreePointLocator {
    config: OctreeConfig,
    /// Arena of nodes, the root is at index 0.
    nodes: Vec<Node>,
    points: PointSet,
    /// Whether each point id is held by a leaf.
    indexed: Vec<bool>,
    inserted: usize,
}

impl IncrementalOctreePointLocator {
    pub fn new(config: OctreeConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn config(&self) -> &OctreeConfig {
        &self.config
    }

    /// Start a new tree over `bounds`, dropping any previous points.
    ///
    /// The bounds are padded slightly (and made cubic if configured) so points on the given
    /// boundary can be inserted.
    pub fn init_point_insertion(&mut self, bounds: Bounds) -> Result<()> {
        if !bounds.is_valid() {
            return Err(Error::InvalidBounds);
        }

        let pad = (bounds.diagonal_length() * BOUNDS_PAD).max(f64::EPSILON);
        let mut root = bounds.expand(pad);
        if self.config.build_cubic_octree {
            root = root.to_cube();
        }

        self.free_search_structure();
        self.nodes.push(Node::leaf(root, 0));
        log::debug!("octree initialised over {:?}", root.to_array());
        Ok(())
    }

    /// Initialise over the bounds of `points` and insert every point under its id.
    pub fn build_locator(&mut self, points: &PointSet) -> Result<()> {
        if points.is_empty() {
            log::debug!("no points to locate");
            self.free_search_structure();
            return Ok(());
        }

        self.init_point_insertion(points.get_bounds())?;
        self.points.set_number_of_points(points.number_of_points());
        for (id, p) in points.iter().enumerate() {
            self.insert_point(id, p)?;
        }
        Ok(())
    }

    /// Drop the tree and all points.
    pub fn free_search_structure(&mut self) {
        self.nodes.clear();
        self.points = PointSet::new();
        self.indexed.clear();
        self.inserted = 0;
    }

    /// The root bounds, `None` before initialisation.
    pub fn bounds(&self) -> Option<Bounds> {
        self.nodes.first().map(|n| n.bounds)
    }

    /// The number of points inserted into the tree.
    pub fn number_of_points(&self) -> usize {
        self.inserted
    }

    pub fn number_of_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// The coordinate stored for point `id`.
    pub fn point(&self, id: usize) -> Result<Point3> {
        self.points.get_point(id)
    }

    /// The bounds and point ids of every leaf.
    pub fn leaves(&self) -> impl Iterator<Item = (&Bounds, &[usize])> + '_ {
        self.nodes
            .iter()
            .filter(|n| n.children.is_none())
            .map(|n| (&n.bounds, n.points.as_slice()))
    }

    /// Insert `p` under the caller chosen `id`.
    ///
    /// Fails if `id` is already held by the tree, its coordinate is left untouched.
    pub fn insert_point(&mut self, id: usize, p: Point3) -> Result<()> {
        let mut leaf = self.leaf_for_insert(p)?;
        if self.is_indexed(id) {
            return Err(Error::PointAlreadyInserted(id));
        }

        let len = id.checked_add(1).ok_or(Error::PointIdOutOfRange {
            id,
            len: self.points.number_of_points(),
        })?;
        if len > self.points.number_of_points() {
            self.points.set_number_of_points(len);
        }
        if len > self.indexed.len() {
            self.indexed.resize(len, false);
        }
        self.points.set_point(id, p);
        self.indexed[id] = true;
        self.nodes[leaf].points.push(id);
        self.inserted += 1;

        while self.nodes[leaf].points.len() > self.config.max_points_per_leaf
            && self.is_splittable(leaf)
        {
            let first = self.split(leaf);
            leaf = first + octant_of(&self.nodes[leaf].bounds, p);
        }
        Ok(())
    }

    /// Insert `p` under the next free id, returning it.
    pub fn insert_next_point(&mut self, p: Point3) -> Result<usize> {
        let id = self.points.number_of_points();
        self.insert_point(id, p)?;
        Ok(id)
    }

    fn is_indexed(&self, id: usize) -> bool {
        self.indexed.get(id).copied().unwrap_or(false)
    }

    /// Insert `p` unless a point lies within `tol` of it.
    ///
    /// Returns whether a point was inserted, and the id of the new or existing point.
    pub fn insert_unique_point(&mut self, p: Point3, tol: f64) -> Result<(bool, usize)> {
        if self.nodes.is_empty() {
            return Err(Error::LocatorNotInitialized);
        }
        match self.find_closest_point_within_radius(tol, p) {
            Some((id, _)) => Ok((false, id)),
            None => self.insert_next_point(p).map(|id| (true, id)),
        }
    }

    /// The id of a point within the configured tolerance of `p`.
    pub fn is_inserted_point(&self, p: Point3) -> Option<usize> {
        self.find_closest_point_within_radius(self.config.tolerance, p)
            .map(|(id, _)| id)
    }

    /// The closest inserted point, ties resolving to the lowest id.
    pub fn find_closest_point(&self, p: Point3) -> Option<usize> {
        self.closest(p, f64::INFINITY).map(|(id, _)| id)
    }

    /// The closest point no further than `radius`, with its squared distance.
    pub fn find_closest_point_within_radius(
        &self,
        radius: f64,
        p: Point3,
    ) -> Option<(usize, f64)> {
        if radius < 0.0 {
            return None;
        }
        self.closest(p, radius * radius)
    }

    /// Every point no further than `radius` from `p`, ascending by id.
    pub fn find_points_within_radius(&self, radius: f64, p: Point3) -> Vec<usize> {
        let r2 = radius * radius;
        let mut found = Vec::new();
        let mut stack = Vec::new();
        if !self.nodes.is_empty() {
            stack.push(0);
        }

        while let Some(n) = stack.pop() {
            let node = &self.nodes[n];
            if node.bounds.dist2_to_point(p) > r2 {
                continue;
            }
            match node.children {
                Some(first) => stack.extend(first..first + 8),
                None => found.extend(
                    node.points
                        .iter()
                        .copied()
                        .filter(|&id| dist2(p, self.points.point(id)) <= r2),
                ),
            }
        }

        found.sort_unstable();
        found
    }

    fn closest(&self, p: Point3, limit2: f64) -> Option<(usize, f64)> {
        let mut best: Option<(usize, f64)> = None;
        let mut bound = limit2;
        let mut stack = Vec::new();
        if !self.nodes.is_empty() {
            stack.push(0);
        }

        while let Some(n) = stack.pop() {
            let node = &self.nodes[n];
            if node.bounds.dist2_to_point(p) > bound {
                continue;
            }

            match node.children {
                Some(first) => {
                    // push the furthest first so the nearest child is visited next
                    let mut kids: [(f64, usize); 8] = [(0.0, 0); 8];
                    for (i, k) in kids.iter_mut().enumerate() {
                        *k = (self.nodes[first + i].bounds.dist2_to_point(p), first + i);
                    }
                    kids.sort_unstable_by(|a, b| b.0.total_cmp(&a.0));
                    stack.extend(kids.iter().filter(|k| k.0 <= bound).map(|k| k.1));
                }
                None => {
                    for &id in &node.points {
                        let d = dist2(p, self.points.point(id));
                        let better = match best {
                            _ if d > bound => false,
                            None => true,
                            Some((bid, bd)) => d < bd || (d == bd && id < bid),
                        };
                        if better {
                            best = Some((id, d));
                            bound = d;
                        }
                    }
                }
            }
        }

        best
    }

    fn leaf_for_insert(&self, p: Point3) -> Result<usize> {
        let root = self.nodes.first().ok_or(Error::LocatorNotInitialized)?;
        if !root.bounds.envelops(p) {
            return Err(Error::PointOutsideBounds(p));
        }

        let mut n = 0;
        while let Some(first) = self.nodes[n].children {
            n = first + octant_of(&self.nodes[n].bounds, p);
        }
        Ok(n)
    }

    /// A leaf can split if it is above the depth limit and its points are not all coincident.
    fn is_splittable(&self, leaf: usize) -> bool {
        let node = &self.nodes[leaf];
        if node.depth >= MAX_DEPTH {
            log::debug!(
                "octree leaf {} at maximum depth holds {} points",
                leaf,
                node.points.len()
            );
            return false;
        }

        let mut pts = node.points.iter().map(|&id| self.points.point(id));
        let Some(first) = pts.next() else {
            return false;
        };
        if pts.all(|q| q == first) {
            log::debug!(
                "octree leaf {} holds {} coincident points",
                leaf,
                node.points.len()
            );
            return false;
        }
        true
    }

    /// Split a leaf into 8 children, returning the index of the first child.
    fn split(&mut self, leaf: usize) -> usize {
        let first = self.nodes.len();
        let bounds = self.nodes[leaf].bounds;
        let depth = self.nodes[leaf].depth + 1;
        let points = std::mem::take(&mut self.nodes[leaf].points);

        self.nodes
            .extend((0..8).map(|o| Node::leaf(bounds.octant(o), depth)));
        for id in points {
            let o = octant_of(&bounds, self.points.point(id));
            self.nodes[first + o].points.push(id);
        }
        self.nodes[leaf].children = Some(first);

        log::debug!("split octree leaf {} at depth {}", leaf, depth - 1);
        first
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck::TestResult;

    fn locator(max: usize) -> IncrementalOctreePointLocator {
        IncrementalOctreePointLocator::new(OctreeConfig {
            max_points_per_leaf: max,
            ..Default::default()
        })
    }

    fn grid(n: usize) -> PointSet {
        let mut ps = PointSet::new();
        for i in 0..n {
            for j in 0..n {
                for k in 0..n {
                    ps.insert_next_point([i as f64, j as f64 * 0.5, k as f64 * 2.0]);
                }
            }
        }
        ps
    }

    fn brute_force(ps: &PointSet, p: Point3) -> Option<usize> {
        ps.iter()
            .enumerate()
            .map(|(i, q)| (dist2(p, q), i))
            .min_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)))
            .map(|(_, i)| i)
    }

    #[test]
    fn config_defaults() {
        let c = OctreeConfig::default();
        assert_eq!(c.max_points_per_leaf, 128);
        assert!(!c.build_cubic_octree);
        assert_eq!(c.tolerance, 0.0);
    }

    #[test]
    fn uninitialised_and_outside() {
        let mut l = locator(4);
        assert_eq!(
            l.insert_next_point([0.0; 3]),
            Err(Error::LocatorNotInitialized)
        );
        assert_eq!(l.find_closest_point([0.0; 3]), None);

        l.init_point_insertion(Bounds::new([0.0; 3], [1.0; 3])).unwrap();
        assert_eq!(
            l.insert_next_point([5.0, 0.0, 0.0]),
            Err(Error::PointOutsideBounds([5.0, 0.0, 0.0]))
        );
        assert_eq!(
            l.init_point_insertion(Bounds::INVALID),
            Err(Error::InvalidBounds)
        );
    }

    #[test]
    fn leaves_respect_threshold() {
        let ps = grid(6);
        let mut l = locator(4);
        l.build_locator(&ps).unwrap();

        assert_eq!(l.number_of_points(), ps.number_of_points());
        assert!(l.number_of_nodes() > 1);
        assert_eq!((l.number_of_nodes() - 1) % 8, 0);

        let mut seen = Vec::new();
        for (b, ids) in l.leaves() {
            assert!(ids.len() <= 4);
            for &id in ids {
                assert!(b.envelops(ps.point(id)));
                seen.push(id);
            }
        }
        seen.sort_unstable();
        assert_eq!(seen, (0..ps.number_of_points()).collect::<Vec<_>>());
    }

    #[test]
    fn coincident_points_stay_in_one_leaf() {
        let mut l = locator(2);
        l.init_point_insertion(Bounds::new([0.0; 3], [1.0; 3])).unwrap();
        for _ in 0..10 {
            l.insert_next_point([0.25; 3]).unwrap();
        }
        assert_eq!(l.number_of_nodes(), 1);
        assert_eq!(l.leaves().next().map(|(_, ids)| ids.len()), Some(10));

        // a distinct point lets the leaf split, the coincident ones stay together
        l.insert_next_point([0.75; 3]).unwrap();
        assert!(l.number_of_nodes() > 1);
        assert!(l.leaves().any(|(_, ids)| ids.len() == 10));
        assert_eq!(l.find_closest_point([0.7; 3]), Some(10));
        assert_eq!(l.find_closest_point([0.3; 3]), Some(0));
    }

    #[test]
    fn unique_insertion() {
        let mut l = locator(2);
        l.init_point_insertion(Bounds::new([0.0; 3], [1.0; 3])).unwrap();
        assert_eq!(l.insert_unique_point([0.5; 3], 1e-3), Ok((true, 0)));
        assert_eq!(l.insert_unique_point([0.1; 3], 1e-3), Ok((true, 1)));
        assert_eq!(
            l.insert_unique_point([0.5, 0.5, 0.5005], 1e-3),
            Ok((false, 0))
        );
        assert_eq!(l.insert_unique_point([0.5, 0.5, 0.6], 1e-3), Ok((true, 2)));
        assert_eq!(l.number_of_points(), 3);

        assert_eq!(l.is_inserted_point([0.1; 3]), Some(1));
        assert_eq!(l.is_inserted_point([0.1, 0.1, 0.1001]), None);
    }

    #[test]
    fn reinserting_an_id_is_refused() {
        let mut l = locator(1);
        l.init_point_insertion(Bounds::new([0.0; 3], [1.0; 3])).unwrap();
        l.insert_point(0, [0.1; 3]).unwrap();
        l.insert_point(1, [0.9; 3]).unwrap();

        assert_eq!(
            l.insert_point(0, [0.9, 0.9, 0.1]),
            Err(Error::PointAlreadyInserted(0))
        );
        assert_eq!(l.number_of_points(), 2);
        assert_eq!(l.point(0).unwrap(), [0.1; 3]);
        assert!(l
            .leaves()
            .all(|(b, ids)| ids.iter().all(|&id| b.envelops(l.point(id).unwrap()))));

        // ids skipped over by a sparse insert are still free
        l.insert_point(5, [0.5; 3]).unwrap();
        l.insert_point(3, [0.2; 3]).unwrap();
        assert_eq!(l.number_of_points(), 4);
        assert_eq!(l.insert_next_point([0.3; 3]), Ok(6));

        let err = l.insert_point(usize::MAX, [0.5; 3]).unwrap_err();
        assert!(matches!(err, Error::PointIdOutOfRange { id, .. } if id == usize::MAX));

        l.free_search_structure();
        l.init_point_insertion(Bounds::new([0.0; 3], [1.0; 3])).unwrap();
        assert_eq!(l.insert_point(0, [0.9; 3]), Ok(()));
    }

    #[test]
    fn radius_queries() {
        let ps = grid(5);
        let mut l = locator(3);
        l.build_locator(&ps).unwrap();

        let p = [2.0, 1.0, 4.0];
        let r = 1.01;
        let expected = ps
            .iter()
            .enumerate()
            .filter(|(_, q)| dist2(p, *q) <= r * r)
            .map(|(i, _)| i)
            .collect::<Vec<_>>();
        assert_eq!(l.find_points_within_radius(r, p), expected);

        let (id, d) = l.find_closest_point_within_radius(0.1, p).unwrap();
        assert_eq!(l.point(id).unwrap(), p);
        assert_eq!(d, 0.0);
        assert_eq!(
            l.find_closest_point_within_radius(0.1, [2.0, 1.0, 5.0]),
            None
        );
    }

    #[test]
    fn cubic_root() {
        let mut l = IncrementalOctreePointLocator::new(OctreeConfig {
            build_cubic_octree: true,
            ..Default::default()
        });
        l.init_point_insertion(Bounds::new([0.0; 3], [4.0, 1.0, 1.0])).unwrap();
        let b = l.bounds().unwrap();
        let len = b.lengths();
        assert!(approx(len[0], len[1]) && approx(len[1], len[2]));
        assert!(b.envelops([4.0, 1.0, 1.0]));

        l.free_search_structure();
        assert_eq!(l.bounds(), None);
        assert_eq!(l.number_of_points(), 0);
    }

    #[quickcheck]
    fn closest_matches_brute_force(pts: Vec<(i8, i8, i8)>, q: (i8, i8, i8)) -> TestResult {
        if pts.is_empty() {
            return TestResult::discard();
        }
        let ps: PointSet = pts
            .iter()
            .map(|&(x, y, z)| [x as f64, y as f64 * 0.5, z as f64 * 0.25])
            .collect();
        let mut l = locator(3);
        l.build_locator(&ps).unwrap();

        let within = l
            .leaves()
            .all(|(b, ids)| ids.iter().all(|&id| b.envelops(ps.point(id))));

        // query points may lie outside the root
        let q = [q.0 as f64 * 1.5, q.1 as f64, q.2 as f64];
        TestResult::from_bool(within && l.find_closest_point(q) == brute_force(&ps, q))
    }
}
