use nalgebra::Point2;
use rayon::prelude::*;

use super::combine::CombineStrategy;
use super::{LagBins, VariogramPoint};
use crate::error::VariogramError;
use crate::spatial_database::ScalarSeries;

/// Bins the pairwise product of two field increments by point separation.
///
/// Every ordered pair of distinct located points is visited, so the cost is
/// quadratic in the number of points with coordinates. For regions with
/// thousands of points this dominates the latency of a rebuild; prefer
/// [`DistanceBinner::compute_bins_par`] or run it off the interactive thread.
#[derive(Clone, Copy, Debug)]
pub struct DistanceBinner {
    lags: LagBins,
    left: CombineStrategy,
    right: CombineStrategy,
}

impl DistanceBinner {
    pub fn new(
        max_distance: f64,
        bin_count: u32,
        left: CombineStrategy,
        right: CombineStrategy,
    ) -> Result<Self, VariogramError> {
        Ok(Self {
            lags: LagBins::new(max_distance, bin_count)?,
            left,
            right,
        })
    }

    pub fn lags(&self) -> &LagBins {
        &self.lags
    }

    /// Serial binning. `series_b == series_a` gives the auto-variogram.
    pub fn compute_bins(
        &self,
        series_a: &ScalarSeries,
        series_b: &ScalarSeries,
        coords: &[Option<Point2<f64>>],
    ) -> Result<Vec<VariogramPoint>, VariogramError> {
        let located = self.located(series_a, series_b, coords)?;
        let mut acc = vec![(0f64, 0u64); self.lags.bin_count()];

        for &(c, p_c) in located.iter() {
            self.accumulate(&mut acc, c, p_c, &located, series_a, series_b);
        }

        Ok(self.finalize(acc))
    }

    /// Same aggregation as [`DistanceBinner::compute_bins`] spread over the rayon pool.
    ///
    /// Sums may differ from the serial path in the last bits since the
    /// reduction order changes.
    pub fn compute_bins_par(
        &self,
        series_a: &ScalarSeries,
        series_b: &ScalarSeries,
        coords: &[Option<Point2<f64>>],
    ) -> Result<Vec<VariogramPoint>, VariogramError> {
        let located = self.located(series_a, series_b, coords)?;
        let n_bins = self.lags.bin_count();

        let acc = located
            .par_iter()
            .fold(
                || vec![(0f64, 0u64); n_bins],
                |mut acc, &(c, p_c)| {
                    self.accumulate(&mut acc, c, p_c, &located, series_a, series_b);
                    acc
                },
            )
            .reduce(
                || vec![(0f64, 0u64); n_bins],
                |mut a, b| {
                    a.iter_mut().zip(b).for_each(|(a, (sum, count))| {
                        a.0 += sum;
                        a.1 += count;
                    });
                    a
                },
            );

        Ok(self.finalize(acc))
    }

    /// Validates the inputs and returns the indices of points with coordinates.
    fn located(
        &self,
        series_a: &ScalarSeries,
        series_b: &ScalarSeries,
        coords: &[Option<Point2<f64>>],
    ) -> Result<Vec<(usize, Point2<f64>)>, VariogramError> {
        series_a.ensure_aligned(series_b)?;
        if coords.len() != series_a.len() {
            return Err(VariogramError::LengthMismatch {
                what: "coordinates",
                expected: series_a.len(),
                actual: coords.len(),
            });
        }

        Ok(coords
            .iter()
            .enumerate()
            .filter_map(|(i, p)| p.map(|p| (i, p)))
            .collect())
    }

    #[inline(always)]
    fn accumulate(
        &self,
        acc: &mut [(f64, u64)],
        c: usize,
        p_c: Point2<f64>,
        located: &[(usize, Point2<f64>)],
        series_a: &ScalarSeries,
        series_b: &ScalarSeries,
    ) {
        let left = self.left.function();
        let right = self.right.function();
        let a = series_a.samples();
        let b = series_b.samples();

        for &(i, p_i) in located.iter() {
            if i == c {
                continue;
            }

            let Some(bin) = self.lags.bin_index(nalgebra::distance(&p_c, &p_i)) else {
                continue;
            };

            let lvalue = left(a[c].value, a[i].value);
            let rvalue = right(b[c].value, b[i].value);

            acc[bin].0 += lvalue * rvalue;
            acc[bin].1 += 1;
        }
    }

    fn finalize(&self, acc: Vec<(f64, u64)>) -> Vec<VariogramPoint> {
        acc.into_iter()
            .enumerate()
            .map(|(bin, (sum, count))| VariogramPoint::from_sum(self.lags.label(bin), sum, count))
            .collect()
    }
}

/// Flag based entry point: `xor_a`/`xor_b` pick XOR instead of difference per field.
pub fn compute_bins(
    series_a: &ScalarSeries,
    series_b: &ScalarSeries,
    coords: &[Option<Point2<f64>>],
    max_distance: f64,
    bin_count: u32,
    xor_a: bool,
    xor_b: bool,
) -> Result<Vec<VariogramPoint>, VariogramError> {
    DistanceBinner::new(
        max_distance,
        bin_count,
        CombineStrategy::from_xor_flag(xor_a),
        CombineStrategy::from_xor_flag(xor_b),
    )?
    .compute_bins(series_a, series_b, coords)
}
