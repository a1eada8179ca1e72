use nalgebra::{Point2, Vector2};

/// Axis aligned box in the sample plane, stored as center and half extents.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub center: Point2<f64>,
    pub half_extents: Vector2<f64>,
}

impl Aabb {
    #[inline(always)]
    pub fn from_min_max(min: Point2<f64>, max: Point2<f64>) -> Self {
        let center = nalgebra::center(&min, &max);
        let half_extents = (max - min) / 2.0;
        Self {
            center,
            half_extents,
        }
    }

    /// Smallest box enclosing all points, `None` for an empty iterator.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point2<f64>>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = *iter.next()?;
        let (min, max) = iter.fold((first, first), |(min, max), p| {
            (min.inf(p), max.sup(p))
        });
        Some(Self::from_min_max(min, max))
    }

    #[inline(always)]
    pub fn mins(&self) -> Point2<f64> {
        self.center - self.half_extents
    }

    #[inline(always)]
    pub fn maxs(&self) -> Point2<f64> {
        self.center + self.half_extents
    }

    #[inline(always)]
    pub fn extents(&self) -> Vector2<f64> {
        self.half_extents * 2.0
    }

    /// Length of the box diagonal.
    #[inline(always)]
    pub fn diagonal(&self) -> f64 {
        self.extents().norm()
    }
}
