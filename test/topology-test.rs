// Tests a small pipeline through the public API: points and cells in, topology and locators out
use cellgeom::sphere::*;
use cellgeom::*;

fn same(p1: Point3, p2: Point3) -> bool {
    p1.sub(p2).mag() < 1e-9
}

/// A `n` by `n` grid of quads on the z = 0 plane.
fn quad_grid(n: usize) -> PolyData {
    let mut pd = PolyData::new();
    let mut points = PointSet::with_capacity((n + 1) * (n + 1));
    for j in 0..=n {
        for i in 0..=n {
            points.insert_next_point([i as f64, j as f64, 0.0]);
        }
    }
    pd.set_points(points);

    let id = |i: usize, j: usize| j * (n + 1) + i;
    let mut polys = CellArray::for_points((n + 1) * (n + 1), 4);
    for j in 0..n {
        for i in 0..n {
            polys.insert_next_cell(&[id(i, j), id(i + 1, j), id(i + 1, j + 1), id(i, j + 1)]);
        }
    }
    pd.set_polys(polys);
    pd
}

#[test]
fn grid_topology() {
    let n = 4;
    let mut pd = quad_grid(n);
    pd.build_links().unwrap();

    assert_eq!(pd.number_of_cells(), n * n);
    assert_eq!(pd.polys().width(), IdWidth::U8);

    // interior points are shared by 4 quads, corners by 1
    assert_eq!(pd.point_cells(0).unwrap().len(), 1);
    assert_eq!(pd.point_cells(n + 2).unwrap().len(), 4);

    // every interior edge has exactly one neighbour across it
    let mut cell = Cell::new();
    for c in 0..pd.number_of_cells() {
        pd.get_cell(c, &mut cell).unwrap();
        assert_eq!(cell.cell_type, CellType::Quad);
        for [a, b] in cell.edges() {
            let neighbours = pd.cell_edge_neighbors(c, a, b).unwrap();
            assert!(neighbours.len() <= 1);
            assert!(pd.is_edge(a, b).unwrap());
        }
    }

    // (n + 1) * n edges in each direction
    let edges = pd.extract_edges().unwrap();
    assert_eq!(edges.number_of_cells(), 2 * n * (n + 1));

    let b = pd.bounds();
    assert_eq!(b.to_array(), [0.0, 4.0, 0.0, 4.0, 0.0, 0.0]);
}

#[test]
fn raw_cell_layout_is_shared() {
    let pd = quad_grid(2);
    let raw = pd.polys().data_u64();
    assert_eq!(raw.len(), 4 * 5);
    assert_eq!(
        extract_cell_sizes(&raw).collect::<Vec<_>>(),
        vec![4, 4, 4, 4]
    );

    let reloaded = CellArray::from_data(raw).unwrap();
    assert_eq!(reloaded.number_of_cells(), 4);
    assert_eq!(
        reloaded.cells().map(|c| c.to_vec()).collect::<Vec<_>>(),
        pd.polys().cells().map(|c| c.to_vec()).collect::<Vec<_>>()
    );
}

#[test]
fn locators_agree() {
    let pd = quad_grid(10);
    let mut octree = IncrementalOctreePointLocator::new(OctreeConfig {
        max_points_per_leaf: 8,
        ..Default::default()
    });
    octree.build_locator(pd.points()).unwrap();

    for q in [[3.2, 4.7, 0.3], [-1.0, -1.0, 0.0], [9.9, 0.1, -2.0], [5.5, 5.2, 0.0]] {
        assert_eq!(octree.find_closest_point(q), pd.points().find_point(q));
    }

    // merging coincident points through the locator
    let (inserted, id) = octree.insert_unique_point([3.0, 4.0, 0.0], 1e-6).unwrap();
    assert!(!inserted);
    assert_eq!(octree.point(id).unwrap(), [3.0, 4.0, 0.0]);

    let mut edges = EdgeLocator::<usize>::default();
    for c in pd.polys().cells() {
        let ids = c.to_vec();
        for [a, b] in CellType::Quad.edges(&ids) {
            edges.insert_unique_edge(a as u32, b as u32, None);
        }
    }
    assert_eq!(edges.len(), pd.extract_edges().unwrap().number_of_cells());
}

#[test]
fn structured_extents() {
    let mut topo = StructuredTopology::new();
    assert_eq!(topo.set_extent(Extent::new(0, 9, 0, 9, 0, 0)), DataDescription::XyPlane);
    assert_eq!(topo.set_extent(Extent::new(0, 9, 0, 9, 0, 0)), DataDescription::Unchanged);
    assert_eq!(topo.extent().number_of_points(), 100);
    assert_eq!(topo.extent().number_of_cells(), 81);

    let e = Extent::try_from(&[0, 9, 0, 9, 0, 9][..]).unwrap();
    assert_eq!(topo.set_extent(e), DataDescription::XyzGrid);
    assert!(Extent::try_from(&[0, 9][..]).is_err());
}

#[test]
fn primitives_cut_a_grid() {
    let pd = quad_grid(4);
    let pts = pd.points().as_flat();

    let s = compute_bounding_sphere(pts, pd.number_of_points(), None).unwrap();
    assert!(same([s[0], s[1], s[2]], [2.0, 2.0, 0.0]));
    assert!((s[3] - 8f64.sqrt()).abs() < 1e-9);

    let primitives: Vec<Primitive> = vec![
        Plane::new([2.0, 0.0, 0.0], [1.0, 0.0, 0.0]).into(),
        Sphere::new([2.0, 2.0, 0.0], 1.5).into(),
        ImplicitBox::new(Bounds::new([1.0, 1.0, -1.0], [3.0, 3.0, 1.0])).into(),
        Cylinder::new([2.0, 2.0, 0.0], [0.0, 0.0, 1.0], 1.0).into(),
    ];

    let mut values = Vec::new();
    for p in &primitives {
        p.evaluate_flat(pts, &mut values);
        assert_eq!(values.len(), pd.number_of_points());
        // the centre point is inside or on every primitive, the far corner outside
        assert!(values[12] <= 0.0);
        assert!(values[24] > 0.0);
    }

    let hit = ImplicitBox::intersect_box(
        &Bounds::new([1.0, 1.0, -1.0], [3.0, 3.0, 1.0]),
        [0.0, 2.0, 0.0],
        [4.0, 0.0, 0.0],
    );
    let (x, t) = hit.unwrap();
    assert!(same(x, [1.0, 2.0, 0.0]));
    assert!((t - 0.25).abs() < 1e-12);

    let q = Quad::new([[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]]);
    let x = q.intersect_with_line([0.25, 0.75, 1.0], [0.25, 0.75, -1.0], 1e-9);
    assert_eq!(x.state, IntersectionState::YesIntersection);
    assert!(same(x.pcoords, [0.25, 0.75, 0.0]));
}
