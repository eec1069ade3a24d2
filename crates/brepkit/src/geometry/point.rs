use nalgebra as na;
use serde::{Deserialize, Serialize};

use crate::GLOBAL_EPSILON;
use crate::error::GeometryError;

pub type Point<const D: usize> = na::Point<f64, D>;
pub type Vector<const D: usize> = na::SVector<f64, D>;
pub type Point2 = Point<2>;
pub type Point3 = Point<3>;
pub type Vector2 = Vector<2>;
pub type Vector3 = Vector<3>;

/// Normalizes `v`, failing when its length is not safely above zero.
pub fn try_normalize<const D: usize>(
    v: Vector<D>,
) -> Result<Vector<D>, GeometryError> {
    let length = v.norm();
    if length <= GLOBAL_EPSILON {
        return Err(GeometryError::DegenerateVector { length });
    }
    Ok(v / length)
}

/// Axis-aligned box, the building block of every spatial query.
///
/// An empty box (no point added yet) contains nothing and reports an
/// infinite distance to every query point.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox<const D: usize> {
    min: Point<D>,
    max: Point<D>,
}

impl<const D: usize> Default for BoundingBox<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const D: usize> BoundingBox<D> {
    pub fn new() -> Self {
        Self {
            min: Point::from(Vector::repeat(f64::INFINITY)),
            max: Point::from(Vector::repeat(f64::NEG_INFINITY)),
        }
    }

    pub fn from_points<'a>(
        points: impl IntoIterator<Item = &'a Point<D>>,
    ) -> Self {
        let mut bbox = Self::new();
        for point in points {
            bbox.add_point(point);
        }
        bbox
    }

    pub fn min(&self) -> &Point<D> {
        &self.min
    }

    pub fn max(&self) -> &Point<D> {
        &self.max
    }

    pub fn is_empty(&self) -> bool {
        (0..D).any(|d| self.min[d] > self.max[d])
    }

    pub fn add_point(&mut self, point: &Point<D>) {
        for d in 0..D {
            self.min[d] = self.min[d].min(point[d]);
            self.max[d] = self.max[d].max(point[d]);
        }
    }

    pub fn add_box(&mut self, other: &BoundingBox<D>) {
        self.add_point(&other.min);
        self.add_point(&other.max);
    }

    pub fn contains(&self, point: &Point<D>) -> bool {
        (0..D).all(|d| self.min[d] <= point[d] && point[d] <= self.max[d])
    }

    pub fn intersects(&self, other: &BoundingBox<D>) -> bool {
        (0..D).all(|d| self.min[d] <= other.max[d] && other.min[d] <= self.max[d])
    }

    pub fn center(&self) -> Point<D> {
        na::center(&self.min, &self.max)
    }

    pub fn diagonal(&self) -> Vector<D> {
        self.max - self.min
    }

    /// Euclidean distance from `point` to the box, zero inside.
    pub fn distance_to_point(&self, point: &Point<D>) -> f64 {
        let mut distance2 = 0.0;
        for d in 0..D {
            let gap = (self.min[d] - point[d]).max(point[d] - self.max[d]);
            if gap > 0.0 {
                distance2 += gap * gap;
            }
        }
        distance2.sqrt()
    }

    /// Intersects the box with the line `origin + t * direction`.
    ///
    /// Standard slab test. `bounded_below` restricts to `t >= 0` (ray),
    /// `bounded` to `t` in `[0, 1]` (segment).
    pub fn intersects_line(
        &self,
        origin: &Point<D>,
        direction: &Vector<D>,
        bounded_below: bool,
        bounded_above: bool,
    ) -> bool {
        let mut t_min = f64::NEG_INFINITY;
        let mut t_max = f64::INFINITY;
        if bounded_below {
            t_min = 0.0;
        }
        if bounded_above {
            t_max = 1.0;
        }
        for d in 0..D {
            if direction[d] == 0.0 {
                if origin[d] < self.min[d] || origin[d] > self.max[d] {
                    return false;
                }
                continue;
            }
            let inv = 1.0 / direction[d];
            let mut t0 = (self.min[d] - origin[d]) * inv;
            let mut t1 = (self.max[d] - origin[d]) * inv;
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }
            t_min = t_min.max(t0);
            t_max = t_max.min(t1);
            if t_min > t_max {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bbox_accumulates_points() {
        let mut bbox = BoundingBox::<3>::new();
        assert!(bbox.is_empty());
        bbox.add_point(&Point3::new(0.1, 0.2, 0.3));
        bbox.add_point(&Point3::new(9.3, 9.4, 6.7));
        bbox.add_point(&Point3::new(7.5, 5.2, 6.3));
        assert_eq!(bbox.min(), &Point3::new(0.1, 0.2, 0.3));
        assert_eq!(bbox.max(), &Point3::new(9.3, 9.4, 6.7));
        assert!(bbox.contains(&Point3::new(5.0, 5.0, 5.0)));
        assert!(!bbox.contains(&Point3::new(-1.0, 5.0, 5.0)));
    }

    #[test]
    fn bbox_distance() {
        let mut bbox = BoundingBox::<2>::new();
        bbox.add_point(&Point2::new(0.0, 0.0));
        bbox.add_point(&Point2::new(1.0, 1.0));
        assert_eq!(bbox.distance_to_point(&Point2::new(0.5, 0.5)), 0.0);
        assert_eq!(bbox.distance_to_point(&Point2::new(4.0, 1.0)), 3.0);
        assert_eq!(bbox.distance_to_point(&Point2::new(4.0, 5.0)), 5.0);
    }

    #[test]
    fn bbox_slab_test() {
        let mut bbox = BoundingBox::<2>::new();
        bbox.add_point(&Point2::new(1.0, 1.0));
        bbox.add_point(&Point2::new(2.0, 2.0));
        let origin = Point2::new(0.0, 0.0);
        assert!(bbox.intersects_line(&origin, &Vector2::new(1.0, 1.0), true, false));
        assert!(!bbox.intersects_line(&origin, &Vector2::new(-1.0, -1.0), true, false));
        assert!(bbox.intersects_line(&origin, &Vector2::new(-1.0, -1.0), false, false));
        assert!(!bbox.intersects_line(&origin, &Vector2::new(0.5, 0.5), true, true));
        assert!(bbox.intersects_line(&origin, &Vector2::new(2.0, 2.0), true, true));
    }

    #[test]
    fn normalize_rejects_tiny_vectors() {
        assert!(try_normalize(Vector3::new(0.0, 0.0, 0.0)).is_err());
        let n = try_normalize(Vector3::new(0.0, 3.0, 4.0)).unwrap();
        assert_eq!(n, Vector3::new(0.0, 0.6, 0.8));
    }
}
