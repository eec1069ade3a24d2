//! Static AABB tree over a set of input boxes.
//!
//! The tree reorders the input boxes by recursive median splits along the
//! longest axis and stores node boxes in an implicit binary heap: node 1
//! is the root, node `i` has children `2i` and `2i + 1`, each covering a
//! contiguous range of the sorted element order. Visitors return `true`
//! to stop a traversal early.

use crate::geometry::{BoundingBox, Point, Vector};

#[derive(Clone, Debug)]
pub struct AabbTree<const D: usize> {
    boxes: Vec<BoundingBox<D>>,
    nodes: Vec<BoundingBox<D>>,
    /// Element ids in sorted (leaf) order.
    mapping: Vec<u32>,
}

const ROOT: usize = 1;

fn max_node_index(node: usize, begin: usize, end: usize) -> usize {
    if end - begin <= 1 {
        return node;
    }
    let middle = begin + (end - begin) / 2;
    max_node_index(2 * node, begin, middle)
        .max(max_node_index(2 * node + 1, middle, end))
}

impl<const D: usize> AabbTree<D> {
    pub fn new(boxes: Vec<BoundingBox<D>>) -> Self {
        let nb = boxes.len();
        let mut mapping: Vec<u32> = (0..nb as u32).collect();
        if nb > 1 {
            sort_range(&boxes, &mut mapping);
        }
        let nb_nodes = if nb == 0 {
            0
        } else {
            max_node_index(ROOT, 0, nb) + 1
        };
        let mut tree = Self {
            boxes,
            nodes: vec![BoundingBox::new(); nb_nodes],
            mapping,
        };
        if nb > 0 {
            tree.init_node(ROOT, 0, nb);
        }
        tree
    }

    pub fn nb_bboxes(&self) -> u32 {
        self.boxes.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    pub fn bounding_box(&self) -> &BoundingBox<D> {
        &self.nodes[ROOT]
    }

    fn init_node(&mut self, node: usize, begin: usize, end: usize) {
        if end - begin == 1 {
            self.nodes[node] =
                self.boxes[self.mapping[begin] as usize].clone();
            return;
        }
        let middle = begin + (end - begin) / 2;
        self.init_node(2 * node, begin, middle);
        self.init_node(2 * node + 1, middle, end);
        let mut merged = self.nodes[2 * node].clone();
        merged.add_box(&self.nodes[2 * node + 1]);
        self.nodes[node] = merged;
    }

    /// The element minimizing the caller-supplied exact distance, with the
    /// foot of that distance. Best-first descent pruning on box distance.
    pub fn closest_element<F>(
        &self,
        query: &Point<D>,
        distance: F,
    ) -> Option<(u32, Point<D>, f64)>
    where
        F: Fn(&Point<D>, u32) -> (f64, Point<D>),
    {
        if self.is_empty() {
            return None;
        }
        // Seed with one leaf to get a finite pruning bound.
        let hint = self.mapping[0];
        let (hint_distance, hint_point) = distance(query, hint);
        let mut best = (hint, hint_point, hint_distance);
        self.closest_recursive(
            ROOT,
            0,
            self.boxes.len(),
            query,
            &distance,
            &mut best,
        );
        Some(best)
    }

    fn closest_recursive<F>(
        &self,
        node: usize,
        begin: usize,
        end: usize,
        query: &Point<D>,
        distance: &F,
        best: &mut (u32, Point<D>, f64),
    ) where
        F: Fn(&Point<D>, u32) -> (f64, Point<D>),
    {
        if self.nodes[node].distance_to_point(query) > best.2 {
            return;
        }
        if end - begin == 1 {
            let element = self.mapping[begin];
            let (element_distance, point) = distance(query, element);
            if element_distance < best.2 {
                *best = (element, point, element_distance);
            }
            return;
        }
        let middle = begin + (end - begin) / 2;
        // Visit the closer child first.
        let left = self.nodes[2 * node].distance_to_point(query);
        let right = self.nodes[2 * node + 1].distance_to_point(query);
        if left <= right {
            self.closest_recursive(2 * node, begin, middle, query, distance, best);
            self.closest_recursive(
                2 * node + 1,
                middle,
                end,
                query,
                distance,
                best,
            );
        } else {
            self.closest_recursive(
                2 * node + 1,
                middle,
                end,
                query,
                distance,
                best,
            );
            self.closest_recursive(2 * node, begin, middle, query, distance, best);
        }
    }

    /// Visits every element whose box intersects `query`; the visitor
    /// returns `true` to stop.
    pub fn box_intersections<F>(&self, query: &BoundingBox<D>, mut visitor: F)
    where
        F: FnMut(u32) -> bool,
    {
        if self.is_empty() {
            return;
        }
        self.box_recursive(ROOT, 0, self.boxes.len(), query, &mut visitor);
    }

    fn box_recursive<F>(
        &self,
        node: usize,
        begin: usize,
        end: usize,
        query: &BoundingBox<D>,
        visitor: &mut F,
    ) -> bool
    where
        F: FnMut(u32) -> bool,
    {
        if !self.nodes[node].intersects(query) {
            return false;
        }
        if end - begin == 1 {
            return visitor(self.mapping[begin]);
        }
        let middle = begin + (end - begin) / 2;
        self.box_recursive(2 * node, begin, middle, query, visitor)
            || self.box_recursive(2 * node + 1, middle, end, query, visitor)
    }

    /// Visits every unordered pair of elements with intersecting boxes,
    /// each pair once.
    pub fn self_intersections<F>(&self, mut visitor: F)
    where
        F: FnMut(u32, u32) -> bool,
    {
        if self.boxes.len() < 2 {
            return;
        }
        let range = (0, self.boxes.len());
        self.pair_recursive(
            self,
            ROOT,
            range,
            ROOT,
            range,
            true,
            &mut visitor,
        );
    }

    /// Visits every element pair `(self, other)` with intersecting boxes.
    pub fn other_intersections<F>(&self, other: &AabbTree<D>, mut visitor: F)
    where
        F: FnMut(u32, u32) -> bool,
    {
        if self.is_empty() || other.is_empty() {
            return;
        }
        self.pair_recursive(
            other,
            ROOT,
            (0, self.boxes.len()),
            ROOT,
            (0, other.boxes.len()),
            false,
            &mut visitor,
        );
    }

    #[allow(clippy::too_many_arguments)]
    fn pair_recursive<F>(
        &self,
        other: &AabbTree<D>,
        node: usize,
        range: (usize, usize),
        other_node: usize,
        other_range: (usize, usize),
        symmetric: bool,
        visitor: &mut F,
    ) -> bool
    where
        F: FnMut(u32, u32) -> bool,
    {
        // In the symmetric (self) case, ranges strictly behind the other
        // were already enumerated on the mirror side.
        if symmetric && other_range.1 <= range.0 {
            return false;
        }
        if !self.nodes[node].intersects(&other.nodes[other_node]) {
            return false;
        }
        let leaf = range.1 - range.0 == 1;
        let other_leaf = other_range.1 - other_range.0 == 1;
        if leaf && other_leaf {
            let element = self.mapping[range.0];
            let other_element = other.mapping[other_range.0];
            if symmetric && element == other_element {
                return false;
            }
            return visitor(element, other_element);
        }
        if leaf {
            let middle = other_range.0 + (other_range.1 - other_range.0) / 2;
            return self.pair_recursive(
                other,
                node,
                range,
                2 * other_node,
                (other_range.0, middle),
                symmetric,
                visitor,
            ) || self.pair_recursive(
                other,
                node,
                range,
                2 * other_node + 1,
                (middle, other_range.1),
                symmetric,
                visitor,
            );
        }
        let middle = range.0 + (range.1 - range.0) / 2;
        self.pair_recursive(
            other,
            2 * node,
            (range.0, middle),
            other_node,
            other_range,
            symmetric,
            visitor,
        ) || self.pair_recursive(
            other,
            2 * node + 1,
            (middle, range.1),
            other_node,
            other_range,
            symmetric,
            visitor,
        )
    }

    /// Visits every element whose box the ray `origin + t * direction`
    /// (`t >= 0`) hits.
    pub fn ray_intersections<F>(
        &self,
        origin: &Point<D>,
        direction: &Vector<D>,
        mut visitor: F,
    ) where
        F: FnMut(u32) -> bool,
    {
        if self.is_empty() {
            return;
        }
        self.line_recursive(
            ROOT,
            0,
            self.boxes.len(),
            origin,
            direction,
            true,
            &mut visitor,
        );
    }

    /// Same as [`AabbTree::ray_intersections`] for the whole line.
    pub fn line_intersections<F>(
        &self,
        origin: &Point<D>,
        direction: &Vector<D>,
        mut visitor: F,
    ) where
        F: FnMut(u32) -> bool,
    {
        if self.is_empty() {
            return;
        }
        self.line_recursive(
            ROOT,
            0,
            self.boxes.len(),
            origin,
            direction,
            false,
            &mut visitor,
        );
    }

    #[allow(clippy::too_many_arguments)]
    fn line_recursive<F>(
        &self,
        node: usize,
        begin: usize,
        end: usize,
        origin: &Point<D>,
        direction: &Vector<D>,
        bounded_below: bool,
        visitor: &mut F,
    ) -> bool
    where
        F: FnMut(u32) -> bool,
    {
        if !self.nodes[node].intersects_line(
            origin,
            direction,
            bounded_below,
            false,
        ) {
            return false;
        }
        if end - begin == 1 {
            return visitor(self.mapping[begin]);
        }
        let middle = begin + (end - begin) / 2;
        self.line_recursive(
            2 * node,
            begin,
            middle,
            origin,
            direction,
            bounded_below,
            visitor,
        ) || self.line_recursive(
            2 * node + 1,
            middle,
            end,
            origin,
            direction,
            bounded_below,
            visitor,
        )
    }
}

/// Recursive median split along the longest axis of the range's box.
fn sort_range<const D: usize>(
    boxes: &[BoundingBox<D>],
    mapping: &mut [u32],
) {
    if mapping.len() <= 1 {
        return;
    }
    let mut range_box = BoundingBox::new();
    for &element in mapping.iter() {
        range_box.add_box(&boxes[element as usize]);
    }
    let diagonal = range_box.diagonal();
    let mut axis = 0;
    for d in 1..D {
        if diagonal[d] > diagonal[axis] {
            axis = d;
        }
    }
    let middle = mapping.len() / 2;
    mapping.select_nth_unstable_by(middle, |&a, &b| {
        let center_a = boxes[a as usize].center()[axis];
        let center_b = boxes[b as usize].center()[axis];
        center_a.total_cmp(&center_b)
    });
    let (low, high) = mapping.split_at_mut(middle);
    #[cfg(feature = "rayon")]
    {
        const PARALLEL_THRESHOLD: usize = 1024;
        if low.len() + high.len() >= PARALLEL_THRESHOLD {
            rayon::join(
                || sort_range(boxes, low),
                || sort_range(boxes, high),
            );
            return;
        }
    }
    sort_range(boxes, low);
    sort_range(boxes, high);
}
