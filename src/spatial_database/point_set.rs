use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use nalgebra::Point2;
use ordered_float::OrderedFloat;
use rstar::primitives::GeomWithData;
use rstar::RTree;

use super::coordinate_system::CoordinateUnits;
use super::{parse_column, CoordinateResolver, PointId};
use crate::error::VariogramError;
use crate::geometry::aabb::Aabb;

type IndexedPoint = GeomWithData<[f64; 2], usize>;

/// Beam locations of a dataset in millimetres, indexed by point id and by an r-tree.
#[derive(Clone)]
pub struct PointSet {
    pub tree: RTree<IndexedPoint>,
    pub ids: Vec<PointId>,
    pub points: Vec<Point2<f64>>,
    lookup: HashMap<PointId, usize>,
}

impl PointSet {
    /// Builds the set from raw coordinates in `units`; coordinates are stored in millimetres.
    pub fn new(
        ids: Vec<PointId>,
        points: Vec<Point2<f64>>,
        units: CoordinateUnits,
    ) -> Result<Self, VariogramError> {
        if ids.len() != points.len() {
            return Err(VariogramError::LengthMismatch {
                what: "points",
                expected: ids.len(),
                actual: points.len(),
            });
        }

        let points = points
            .into_iter()
            .map(|p| units.to_millimeters(p))
            .collect::<Vec<_>>();
        let tree_points = points
            .iter()
            .enumerate()
            .map(|(i, p)| IndexedPoint::new([p.x, p.y], i))
            .collect();
        let tree = RTree::bulk_load(tree_points);
        let lookup = ids.iter().enumerate().map(|(i, id)| (*id, i)).collect();

        Ok(Self {
            tree,
            ids,
            points,
            lookup,
        })
    }

    pub fn from_csv_reader<R: Read>(
        reader: R,
        id_col: &str,
        x_col: &str,
        y_col: &str,
        units: CoordinateUnits,
    ) -> Result<Self, VariogramError> {
        let mut rdr = csv::Reader::from_reader(reader);
        let mut ids = Vec::new();
        let mut points = Vec::new();

        for result in rdr.deserialize() {
            let record: HashMap<String, String> = result?;
            ids.push(parse_column::<PointId>(&record, id_col)?);
            let x = parse_column::<f64>(&record, x_col)?;
            let y = parse_column::<f64>(&record, y_col)?;
            points.push(Point2::new(x, y));
        }

        Self::new(ids, points, units)
    }

    pub fn from_csv_path(
        path: impl AsRef<Path>,
        id_col: &str,
        x_col: &str,
        y_col: &str,
        units: CoordinateUnits,
    ) -> Result<Self, VariogramError> {
        let file = std::fs::File::open(path).map_err(csv::Error::from)?;
        Self::from_csv_reader(file, id_col, x_col, y_col, units)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn point(&self, point_id: PointId) -> Option<Point2<f64>> {
        self.lookup.get(&point_id).map(|&i| self.points[i])
    }

    /// Bounding box of every beam location.
    pub fn footprint(&self) -> Option<Aabb> {
        Aabb::from_points(&self.points)
    }

    /// Smallest positive distance between any point and its nearest neighbour.
    ///
    /// Coincident points are skipped, `None` when fewer than two distinct locations exist.
    pub fn min_separation(&self) -> Option<f64> {
        self.points
            .iter()
            .filter_map(|p| {
                self.tree
                    .nearest_neighbor_iter_with_distance_2(&[p.x, p.y])
                    .map(|(_, d2)| d2)
                    .find(|d2| *d2 > 0.0)
            })
            .min_by_key(|d2| OrderedFloat(*d2))
            .map(f64::sqrt)
    }
}

impl CoordinateResolver for PointSet {
    fn resolve_point(&self, point_id: PointId) -> Option<Point2<f64>> {
        self.point(point_id)
    }
}

#[cfg(test)]
mod test {
    use approx::assert_relative_eq;

    use super::*;

    fn line_set() -> PointSet {
        PointSet::new(
            vec![10, 11, 12, 13],
            vec![
                Point2::new(0.0, 0.0),
                Point2::new(1.0, 0.0),
                Point2::new(2.5, 0.0),
                Point2::new(2.5, 0.0),
            ],
            CoordinateUnits::Millimeters,
        )
        .unwrap()
    }

    #[test]
    fn lookup_by_id() {
        let set = line_set();
        assert_eq!(set.len(), 4);
        assert_eq!(set.point(11), Some(Point2::new(1.0, 0.0)));
        assert_eq!(set.point(99), None);
        assert_eq!(set.resolve_millimeters(12), Some(Point2::new(2.5, 0.0)));
    }

    #[test]
    fn min_separation_skips_duplicates() {
        let set = line_set();
        assert_relative_eq!(set.min_separation().unwrap(), 1.0);
    }

    #[test]
    fn single_point_has_no_separation() {
        let set = PointSet::new(
            vec![1],
            vec![Point2::new(5.0, 5.0)],
            CoordinateUnits::Millimeters,
        )
        .unwrap();
        assert!(set.min_separation().is_none());
    }

    #[test]
    fn csv_in_meters() {
        let data = "id,x,y\n1,0.001,0.0\n2,0.003,0.002\n";
        let set =
            PointSet::from_csv_reader(data.as_bytes(), "id", "x", "y", CoordinateUnits::Meters)
                .unwrap();

        let footprint = set.footprint().unwrap();
        assert_relative_eq!(footprint.mins(), Point2::new(1.0, 0.0), epsilon = 1e-9);
        assert_relative_eq!(footprint.maxs(), Point2::new(3.0, 2.0), epsilon = 1e-9);
    }

    #[test]
    fn mismatched_lengths() {
        let err = PointSet::new(vec![1, 2], vec![Point2::origin()], CoordinateUnits::Meters)
            .err()
            .unwrap();
        assert!(matches!(err, VariogramError::LengthMismatch { .. }));
    }
}
