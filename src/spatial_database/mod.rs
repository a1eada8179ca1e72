use std::collections::HashMap;
use std::io::Read;

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::error::VariogramError;
use coordinate_system::CoordinateUnits;

pub mod coordinate_system;
pub mod point_set;
pub mod region;

/// Identifier of a sampled location in the source dataset.
pub type PointId = i64;

/// Maps point identifiers to coordinates in the sample plane.
pub trait CoordinateResolver {
    /// Raw coordinate of a point, in [`CoordinateResolver::units`].
    fn resolve_point(&self, point_id: PointId) -> Option<Point2<f64>>;

    fn units(&self) -> CoordinateUnits {
        CoordinateUnits::Millimeters
    }

    fn resolve_millimeters(&self, point_id: PointId) -> Option<Point2<f64>> {
        let units = self.units();
        self.resolve_point(point_id)
            .map(|point| units.to_millimeters(point))
    }
}

/// Source of scalar field values, one series per field/region pair.
pub trait DataQuery {
    fn fetch_scalar_series(
        &self,
        field_id: &str,
        region_id: &str,
    ) -> Result<ScalarSeries, VariogramError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScalarSample {
    pub point_id: PointId,
    pub value: f64,
}

impl ScalarSample {
    pub fn new(point_id: PointId, value: f64) -> Self {
        Self { point_id, value }
    }
}

/// Ordered scalar values, positionally aligned with a coordinate sequence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScalarSeries {
    samples: Vec<ScalarSample>,
}

impl ScalarSeries {
    pub fn new(samples: Vec<ScalarSample>) -> Self {
        Self { samples }
    }

    pub fn from_pairs(pairs: impl IntoIterator<Item = (PointId, f64)>) -> Self {
        pairs
            .into_iter()
            .map(|(point_id, value)| ScalarSample::new(point_id, value))
            .collect()
    }

    /// Reads `id_col` and `value_col` from a csv with a header row.
    pub fn from_csv_reader<R: Read>(
        reader: R,
        id_col: &str,
        value_col: &str,
    ) -> Result<Self, VariogramError> {
        let mut rdr = csv::Reader::from_reader(reader);
        let mut samples = Vec::new();

        for result in rdr.deserialize() {
            let record: HashMap<String, String> = result?;
            let point_id = parse_column::<PointId>(&record, id_col)?;
            let value = parse_column::<f64>(&record, value_col)?;
            samples.push(ScalarSample::new(point_id, value));
        }

        Ok(Self::new(samples))
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[ScalarSample] {
        &self.samples
    }

    pub fn point_ids(&self) -> impl Iterator<Item = PointId> + '_ {
        self.samples.iter().map(|s| s.point_id)
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().map(|s| s.value)
    }

    /// Checks that `other` covers the same points in the same order.
    pub fn ensure_aligned(&self, other: &ScalarSeries) -> Result<(), VariogramError> {
        if self.len() != other.len() {
            return Err(VariogramError::LengthMismatch {
                what: "right series",
                expected: self.len(),
                actual: other.len(),
            });
        }

        match self
            .samples
            .iter()
            .zip(other.samples.iter())
            .position(|(l, r)| l.point_id != r.point_id)
        {
            Some(index) => Err(VariogramError::MismatchedPointIds {
                index,
                left: self.samples[index].point_id,
                right: other.samples[index].point_id,
            }),
            None => Ok(()),
        }
    }

    /// Millimetre coordinates of every sample, `None` where the resolver has no location.
    pub fn coordinates<C>(&self, resolver: &C) -> Vec<Option<Point2<f64>>>
    where
        C: CoordinateResolver + ?Sized,
    {
        self.point_ids()
            .map(|id| resolver.resolve_millimeters(id))
            .collect()
    }
}

impl FromIterator<ScalarSample> for ScalarSeries {
    fn from_iter<I: IntoIterator<Item = ScalarSample>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

pub(crate) fn parse_column<T: std::str::FromStr>(
    record: &HashMap<String, String>,
    column: &str,
) -> Result<T, VariogramError> {
    let raw = record
        .get(column)
        .ok_or_else(|| VariogramError::MissingColumn(column.to_string()))?;
    raw.trim().parse::<T>().map_err(|_| VariogramError::Parse {
        column: column.to_string(),
        value: raw.clone(),
    })
}
