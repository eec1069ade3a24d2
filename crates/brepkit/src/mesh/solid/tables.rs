//! Canonical incidence tables of the fixed polyhedron shapes.
//!
//! Facet vertex lists are oriented outward for positively oriented
//! polyhedra. Conventions: tetrahedron facet `f` is opposite vertex `f`;
//! hexahedra are numbered bottom quad `0..4` counterclockwise seen from
//! above, top quad `4..8` aligned; prisms bottom triangle `0..3`, top
//! `3..6`; pyramids base quad `0..4`, apex `4`. Facet and edge ids follow
//! these tables everywhere, including derived-table registration order.

use super::PolyhedronShape;

pub(crate) const TETRAHEDRON_FACETS: &[&[u8]] =
    &[&[1, 2, 3], &[0, 3, 2], &[0, 1, 3], &[0, 2, 1]];

pub(crate) const TETRAHEDRON_EDGES: &[[u8; 2]] =
    &[[0, 1], [0, 2], [0, 3], [1, 2], [1, 3], [2, 3]];

pub(crate) const PYRAMID_FACETS: &[&[u8]] = &[
    &[0, 3, 2, 1],
    &[0, 1, 4],
    &[1, 2, 4],
    &[2, 3, 4],
    &[3, 0, 4],
];

pub(crate) const PYRAMID_EDGES: &[[u8; 2]] = &[
    [0, 1],
    [1, 2],
    [2, 3],
    [3, 0],
    [0, 4],
    [1, 4],
    [2, 4],
    [3, 4],
];

pub(crate) const PRISM_FACETS: &[&[u8]] = &[
    &[0, 2, 1],
    &[3, 4, 5],
    &[0, 1, 4, 3],
    &[1, 2, 5, 4],
    &[2, 0, 3, 5],
];

pub(crate) const PRISM_EDGES: &[[u8; 2]] = &[
    [0, 1],
    [1, 2],
    [2, 0],
    [3, 4],
    [4, 5],
    [5, 3],
    [0, 3],
    [1, 4],
    [2, 5],
];

pub(crate) const HEXAHEDRON_FACETS: &[&[u8]] = &[
    &[0, 3, 2, 1],
    &[4, 5, 6, 7],
    &[0, 1, 5, 4],
    &[1, 2, 6, 5],
    &[2, 3, 7, 6],
    &[3, 0, 4, 7],
];

pub(crate) const HEXAHEDRON_EDGES: &[[u8; 2]] = &[
    [0, 1],
    [1, 2],
    [2, 3],
    [3, 0],
    [4, 5],
    [5, 6],
    [6, 7],
    [7, 4],
    [0, 4],
    [1, 5],
    [2, 6],
    [3, 7],
];

/// Local facet layouts of a fixed shape; `None` for general polyhedra.
pub(crate) fn shape_facets(
    shape: PolyhedronShape,
) -> Option<&'static [&'static [u8]]> {
    match shape {
        PolyhedronShape::Tetrahedron => Some(TETRAHEDRON_FACETS),
        PolyhedronShape::Pyramid => Some(PYRAMID_FACETS),
        PolyhedronShape::Prism => Some(PRISM_FACETS),
        PolyhedronShape::Hexahedron => Some(HEXAHEDRON_FACETS),
        PolyhedronShape::General => None,
    }
}

/// Local edge layouts of a fixed shape; `None` for general polyhedra.
pub(crate) fn shape_edges(
    shape: PolyhedronShape,
) -> Option<&'static [[u8; 2]]> {
    match shape {
        PolyhedronShape::Tetrahedron => Some(TETRAHEDRON_EDGES),
        PolyhedronShape::Pyramid => Some(PYRAMID_EDGES),
        PolyhedronShape::Prism => Some(PRISM_EDGES),
        PolyhedronShape::Hexahedron => Some(HEXAHEDRON_EDGES),
        PolyhedronShape::General => None,
    }
}

pub(crate) fn shape_nb_vertices(shape: PolyhedronShape) -> Option<u8> {
    match shape {
        PolyhedronShape::Tetrahedron => Some(4),
        PolyhedronShape::Pyramid => Some(5),
        PolyhedronShape::Prism => Some(6),
        PolyhedronShape::Hexahedron => Some(8),
        PolyhedronShape::General => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn euler_check(facets: &[&[u8]], edges: &[[u8; 2]], nb_vertices: i32) {
        let nb_facets = facets.len() as i32;
        let nb_edges = edges.len() as i32;
        assert_eq!(nb_vertices - nb_edges + nb_facets, 2);
    }

    #[test]
    fn tables_are_euler_consistent() {
        euler_check(TETRAHEDRON_FACETS, TETRAHEDRON_EDGES, 4);
        euler_check(PYRAMID_FACETS, PYRAMID_EDGES, 5);
        euler_check(PRISM_FACETS, PRISM_EDGES, 6);
        euler_check(HEXAHEDRON_FACETS, HEXAHEDRON_EDGES, 8);
    }

    #[test]
    fn every_facet_edge_is_in_the_edge_table() {
        for (facets, edges) in [
            (TETRAHEDRON_FACETS, TETRAHEDRON_EDGES),
            (PYRAMID_FACETS, PYRAMID_EDGES),
            (PRISM_FACETS, PRISM_EDGES),
            (HEXAHEDRON_FACETS, HEXAHEDRON_EDGES),
        ] {
            for facet in facets {
                for i in 0..facet.len() {
                    let v0 = facet[i];
                    let v1 = facet[(i + 1) % facet.len()];
                    let key = if v0 < v1 { [v0, v1] } else { [v1, v0] };
                    assert!(edges.contains(&key));
                }
            }
        }
    }

    #[test]
    fn facets_use_every_edge_twice_in_opposite_directions() {
        for facets in [
            TETRAHEDRON_FACETS,
            PYRAMID_FACETS,
            PRISM_FACETS,
            HEXAHEDRON_FACETS,
        ] {
            let mut directed = Vec::new();
            for facet in facets {
                for i in 0..facet.len() {
                    directed.push((facet[i], facet[(i + 1) % facet.len()]));
                }
            }
            for &(v0, v1) in &directed {
                assert!(
                    directed.contains(&(v1, v0)),
                    "edge ({v0}, {v1}) has no reversed twin"
                );
                assert_eq!(
                    directed.iter().filter(|&&e| e == (v0, v1)).count(),
                    1
                );
            }
        }
    }
}
