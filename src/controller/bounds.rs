use serde::{Deserialize, Serialize};

use crate::spatial_database::point_set::PointSet;
use crate::variography::experimental::MAX_BIN_COUNT;

/// Slider limits derived from the spatial extent of the active dataset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SliderBounds {
    /// Smallest separation between distinct beam locations, in millimetres.
    pub distance_min: f64,
    /// Diagonal of the beam footprint, in millimetres.
    pub distance_max: f64,
    pub bin_min: u32,
    /// Number of points in the dataset, capped at [`MAX_BIN_COUNT`].
    pub bin_max: u32,
}

impl SliderBounds {
    pub fn from_point_set(points: &PointSet) -> Self {
        let distance_max = points.footprint().map_or(0.0, |aabb| aabb.diagonal());
        let distance_min = points.min_separation().unwrap_or(0.0).min(distance_max);
        let bin_max = u32::try_from(points.len())
            .unwrap_or(u32::MAX)
            .clamp(1, MAX_BIN_COUNT);

        tracing::debug!(distance_min, distance_max, bin_max, "slider bounds updated");

        Self {
            distance_min,
            distance_max,
            bin_min: 1,
            bin_max,
        }
    }

    pub fn default_max_distance(&self) -> f64 {
        (self.distance_min + self.distance_max) / 2.0
    }

    pub fn default_bin_count(&self) -> u32 {
        ((self.bin_min as u64 + self.bin_max as u64) / 2).max(1) as u32
    }

    pub fn clamp_max_distance(&self, distance: f64) -> f64 {
        distance.clamp(self.distance_min, self.distance_max)
    }

    pub fn clamp_bin_count(&self, bins: u32) -> u32 {
        bins.clamp(self.bin_min, self.bin_max)
    }
}
