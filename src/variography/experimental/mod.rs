use serde::{Deserialize, Serialize};

use crate::error::VariogramError;

pub mod combine;
pub mod cpu_calculator;

/// Distance interval `[lb, ub)` covered by one bin.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LagBounds {
    pub lb: f64,
    pub ub: f64,
}

impl LagBounds {
    pub fn new(lb: f64, ub: f64) -> Self {
        Self { lb, ub }
    }

    pub fn mid_point(&self) -> f64 {
        (self.lb + self.ub) / 2.0
    }

    pub fn contains(&self, distance: f64) -> bool {
        distance >= self.lb && distance < self.ub
    }
}

/// Upper limit on the bin count; every binning pass allocates one accumulator per bin.
pub const MAX_BIN_COUNT: u32 = 1 << 20;

/// Equal width partition of `[0, max_distance)` into `bin_count` bins.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LagBins {
    max_distance: f64,
    bin_count: usize,
    bin_width: f64,
}

impl LagBins {
    pub fn new(max_distance: f64, bin_count: u32) -> Result<Self, VariogramError> {
        if !(1..=MAX_BIN_COUNT).contains(&bin_count) {
            return Err(VariogramError::InvalidBinCount(bin_count));
        }
        if !(max_distance > 0.0) || !max_distance.is_finite() {
            return Err(VariogramError::InvalidMaxDistance(max_distance));
        }

        Ok(Self {
            max_distance,
            bin_count: bin_count as usize,
            bin_width: max_distance / bin_count as f64,
        })
    }

    pub fn max_distance(&self) -> f64 {
        self.max_distance
    }

    pub fn bin_count(&self) -> usize {
        self.bin_count
    }

    pub fn bin_width(&self) -> f64 {
        self.bin_width
    }

    /// Bin holding `distance`, `None` outside `[0, max_distance)`.
    #[inline(always)]
    pub fn bin_index(&self, distance: f64) -> Option<usize> {
        if !(distance >= 0.0 && distance < self.max_distance) {
            return None;
        }
        // rounding in the division can land exactly on bin_count just below the max
        let index = (distance / self.bin_width).floor() as usize;
        Some(index.min(self.bin_count - 1))
    }

    pub fn bounds(&self, index: usize) -> LagBounds {
        LagBounds::new(
            self.bin_width * index as f64,
            self.bin_width * (index + 1) as f64,
        )
    }

    /// Distance a bin is labelled with: its upper edge.
    pub fn label(&self, index: usize) -> f64 {
        self.bin_width * (index + 1) as f64
    }
}

/// Aggregate of every point pair falling into one distance bin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VariogramPoint {
    pub distance: f64,
    pub sum: f64,
    pub count: u64,
    /// `0.5 * sum / count`, `None` for an empty bin.
    pub mean_value: Option<f64>,
}

impl VariogramPoint {
    pub fn empty(distance: f64) -> Self {
        Self {
            distance,
            sum: 0.0,
            count: 0,
            mean_value: None,
        }
    }

    pub fn from_sum(distance: f64, sum: f64, count: u64) -> Self {
        let mean_value = (count > 0).then(|| 0.5 * sum / count as f64);
        Self {
            distance,
            sum,
            count,
            mean_value,
        }
    }
}
