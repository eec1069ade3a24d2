//! Structured regular grid, 2D or 3D.
//!
//! The grid provides the mesh read interface by computation: no per-cell
//! or per-vertex storage exists until an attribute manager is requested,
//! at which point it is materialized lazily and sized to the grid.
//! Indexing is lexicographic with axis 0 varying fastest.

use once_cell::sync::OnceCell;
use smallvec::SmallVec;

use crate::GLOBAL_EPSILON;
use crate::attributes::AttributeManager;
use crate::geometry::{BoundingBox, Point, Vector};

#[derive(Debug)]
pub struct RegularGrid<const D: usize> {
    origin: Point<D>,
    nb_cells: [u32; D],
    /// One vector per axis; its length is the cell size on that axis.
    frame: [Vector<D>; D],
    cell_attributes: OnceCell<AttributeManager>,
    vertex_attributes: OnceCell<AttributeManager>,
}

impl<const D: usize> Clone for RegularGrid<D> {
    fn clone(&self) -> Self {
        let clone = Self {
            origin: self.origin,
            nb_cells: self.nb_cells,
            frame: self.frame,
            cell_attributes: OnceCell::new(),
            vertex_attributes: OnceCell::new(),
        };
        if let Some(manager) = self.cell_attributes.get() {
            let _ = clone.cell_attributes.set(manager.clone());
        }
        if let Some(manager) = self.vertex_attributes.get() {
            let _ = clone.vertex_attributes.set(manager.clone());
        }
        clone
    }
}

impl<const D: usize> RegularGrid<D> {
    /// Axis-aligned grid from per-axis cell counts and sizes.
    pub fn new(
        origin: Point<D>,
        nb_cells: [u32; D],
        cell_lengths: [f64; D],
    ) -> Self {
        let mut frame = [Vector::zeros(); D];
        for d in 0..D {
            frame[d][d] = cell_lengths[d];
        }
        Self::with_frame(origin, nb_cells, frame)
    }

    pub fn with_frame(
        origin: Point<D>,
        nb_cells: [u32; D],
        frame: [Vector<D>; D],
    ) -> Self {
        Self {
            origin,
            nb_cells,
            frame,
            cell_attributes: OnceCell::new(),
            vertex_attributes: OnceCell::new(),
        }
    }

    pub fn origin(&self) -> &Point<D> {
        &self.origin
    }

    pub fn nb_cells(&self) -> u32 {
        self.nb_cells.iter().product()
    }

    pub fn nb_cells_in_direction(&self, direction: usize) -> u32 {
        self.nb_cells[direction]
    }

    pub fn cell_length_in_direction(&self, direction: usize) -> f64 {
        self.frame[direction].norm()
    }

    /// Measure of one cell (area in 2D, volume in 3D).
    pub fn cell_size(&self) -> f64 {
        (0..D).map(|d| self.cell_length_in_direction(d)).product()
    }

    pub fn nb_grid_vertices(&self) -> u32 {
        self.nb_cells.iter().map(|&n| n + 1).product()
    }

    pub fn nb_vertices_in_direction(&self, direction: usize) -> u32 {
        self.nb_cells[direction] + 1
    }

    pub fn nb_cell_vertices(&self) -> u32 {
        1 << D
    }

    pub fn cell_index(&self, indices: [u32; D]) -> u32 {
        let mut index = 0;
        for d in (0..D).rev() {
            debug_assert!(indices[d] < self.nb_cells[d]);
            index = index * self.nb_cells[d] + indices[d];
        }
        index
    }

    pub fn cell_indices(&self, index: u32) -> [u32; D] {
        let mut remainder = index;
        let mut indices = [0; D];
        for d in 0..D {
            indices[d] = remainder % self.nb_cells[d];
            remainder /= self.nb_cells[d];
        }
        indices
    }

    pub fn vertex_index(&self, indices: [u32; D]) -> u32 {
        let mut index = 0;
        for d in (0..D).rev() {
            debug_assert!(indices[d] <= self.nb_cells[d]);
            index = index * (self.nb_cells[d] + 1) + indices[d];
        }
        index
    }

    pub fn vertex_indices(&self, index: u32) -> [u32; D] {
        let mut remainder = index;
        let mut indices = [0; D];
        for d in 0..D {
            indices[d] = remainder % (self.nb_cells[d] + 1);
            remainder /= self.nb_cells[d] + 1;
        }
        indices
    }

    pub fn next_cell(
        &self,
        indices: [u32; D],
        direction: usize,
    ) -> Option<[u32; D]> {
        let mut next = indices;
        next[direction] += 1;
        (next[direction] < self.nb_cells[direction]).then_some(next)
    }

    pub fn previous_cell(
        &self,
        indices: [u32; D],
        direction: usize,
    ) -> Option<[u32; D]> {
        let mut previous = indices;
        previous[direction] = previous[direction].checked_sub(1)?;
        Some(previous)
    }

    pub fn next_vertex(
        &self,
        indices: [u32; D],
        direction: usize,
    ) -> Option<[u32; D]> {
        let mut next = indices;
        next[direction] += 1;
        (next[direction] <= self.nb_cells[direction]).then_some(next)
    }

    pub fn previous_vertex(
        &self,
        indices: [u32; D],
        direction: usize,
    ) -> Option<[u32; D]> {
        let mut previous = indices;
        previous[direction] = previous[direction].checked_sub(1)?;
        Some(previous)
    }

    pub fn is_cell_on_border(&self, indices: [u32; D]) -> bool {
        (0..D).any(|d| {
            indices[d] == 0 || indices[d] + 1 == self.nb_cells[d]
        })
    }

    pub fn is_grid_vertex_on_border(&self, indices: [u32; D]) -> bool {
        (0..D).any(|d| indices[d] == 0 || indices[d] == self.nb_cells[d])
    }

    pub fn nb_vertices_on_borders(&self) -> u32 {
        let interior: u32 = self
            .nb_cells
            .iter()
            .map(|&n| n.saturating_sub(1))
            .product();
        self.nb_grid_vertices() - interior
    }

    /// Vertex indices of the `corner`-th cell corner; bit `d` of `corner`
    /// selects the far side on axis `d`.
    pub fn cell_vertex_indices(
        &self,
        cell: [u32; D],
        corner: u32,
    ) -> [u32; D] {
        let mut indices = cell;
        for (d, index) in indices.iter_mut().enumerate() {
            *index += (corner >> d) & 1;
        }
        indices
    }

    pub fn cell_vertices(
        &self,
        cell: [u32; D],
    ) -> SmallVec<[[u32; D]; 8]> {
        (0..self.nb_cell_vertices())
            .map(|corner| self.cell_vertex_indices(cell, corner))
            .collect()
    }

    pub fn grid_point(&self, indices: [u32; D]) -> Point<D> {
        let mut point = self.origin;
        for d in 0..D {
            point += self.frame[d] * f64::from(indices[d]);
        }
        point
    }

    pub fn cell_barycenter(&self, cell: [u32; D]) -> Point<D> {
        let mut point = self.origin;
        for d in 0..D {
            point += self.frame[d] * (f64::from(cell[d]) + 0.5);
        }
        point
    }

    pub fn grid_bounding_box(&self) -> BoundingBox<D> {
        let mut bbox = BoundingBox::new();
        bbox.add_point(&self.origin);
        bbox.add_point(&self.grid_point(self.nb_cells));
        bbox
    }

    /// Coordinates of `point` in grid units, one value per axis.
    fn grid_coordinates(&self, point: &Point<D>) -> [f64; D] {
        let offset = point - self.origin;
        let mut coordinates = [0.0; D];
        for d in 0..D {
            coordinates[d] =
                offset.dot(&self.frame[d]) / self.frame[d].norm_squared();
        }
        coordinates
    }

    /// Containment with a `GLOBAL_EPSILON` slack in grid units.
    pub fn contains(&self, point: &Point<D>) -> bool {
        let coordinates = self.grid_coordinates(point);
        (0..D).all(|d| {
            coordinates[d] >= -GLOBAL_EPSILON
                && coordinates[d]
                    <= f64::from(self.nb_cells[d]) + GLOBAL_EPSILON
        })
    }

    /// Cells containing `point`: up to `2^D` when the point sits within
    /// `GLOBAL_EPSILON` of interior cell boundaries, enumerated
    /// lexicographically, axis 0 fastest.
    pub fn cells(&self, point: &Point<D>) -> SmallVec<[[u32; D]; 8]> {
        if !self.contains(point) {
            return SmallVec::new();
        }
        let coordinates = self.grid_coordinates(point);
        let mut candidates: [SmallVec<[u32; 2]>; D] =
            std::array::from_fn(|_| SmallVec::new());
        for d in 0..D {
            let n = self.nb_cells[d];
            let rounded = coordinates[d].round();
            if (coordinates[d] - rounded).abs() < GLOBAL_EPSILON {
                // On a grid plane: both neighbor cells, clamped.
                let boundary = rounded as i64;
                if boundary > 0 {
                    candidates[d].push((boundary - 1).min(i64::from(n) - 1) as u32);
                }
                if boundary < i64::from(n) {
                    candidates[d].push(boundary.max(0) as u32);
                }
            } else {
                let cell = coordinates[d].floor().max(0.0) as u32;
                candidates[d].push(cell.min(n - 1));
            }
        }
        let mut result = SmallVec::new();
        let total: usize =
            candidates.iter().map(|options| options.len()).product();
        for combination in 0..total {
            let mut remainder = combination;
            let mut cell = [0; D];
            for d in 0..D {
                cell[d] = candidates[d][remainder % candidates[d].len()];
                remainder /= candidates[d].len();
            }
            result.push(cell);
        }
        result
    }

    /// Closest grid vertex, clamping each axis then rounding to nearest.
    pub fn closest_vertex(&self, point: &Point<D>) -> [u32; D] {
        let coordinates = self.grid_coordinates(point);
        let mut indices = [0; D];
        for d in 0..D {
            let clamped =
                coordinates[d].clamp(0.0, f64::from(self.nb_cells[d]));
            indices[d] = clamped.round() as u32;
        }
        indices
    }

    /// Lazily materialized, sized to the cell count.
    pub fn cell_attribute_manager(&self) -> &AttributeManager {
        self.cell_attributes
            .get_or_init(|| AttributeManager::new(self.nb_cells()))
    }

    pub fn cell_attribute_manager_mut(&mut self) -> &mut AttributeManager {
        self.cell_attribute_manager();
        self.cell_attributes
            .get_mut()
            .expect("initialized just above")
    }

    /// Lazily materialized, sized to the grid vertex count.
    pub fn grid_vertex_attribute_manager(&self) -> &AttributeManager {
        self.vertex_attributes
            .get_or_init(|| AttributeManager::new(self.nb_grid_vertices()))
    }

    pub fn grid_vertex_attribute_manager_mut(
        &mut self,
    ) -> &mut AttributeManager {
        self.grid_vertex_attribute_manager();
        self.vertex_attributes
            .get_mut()
            .expect("initialized just above")
    }
}
