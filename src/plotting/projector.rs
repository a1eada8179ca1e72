use nalgebra::Point2;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use super::axis::LinearAxis;
use crate::error::VariogramError;
use crate::variography::dataset::VariogramDataset;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Padding in pixels between the viewport edge and the plot area.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChartMargins {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

impl Default for ChartMargins {
    fn default() -> Self {
        Self {
            left: 40.0,
            right: 10.0,
            top: 10.0,
            bottom: 30.0,
        }
    }
}

/// Screen positions of one group's non-empty bins.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedGroup {
    pub region_id: String,
    pub points: Vec<Point2<f64>>,
    /// Bin index of each entry in `points`.
    pub bins: Vec<usize>,
}

/// Projection of a dataset for one viewport. Dropped when either changes.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedDataset {
    pub viewport: Viewport,
    pub x_axis: LinearAxis,
    pub y_axis: LinearAxis,
    pub groups: Vec<ProjectedGroup>,
}

impl ProjectedDataset {
    pub fn points(&self) -> Vec<Vec<Point2<f64>>> {
        self.groups.iter().map(|g| g.points.clone()).collect()
    }

    /// Closest projected point within `radius` pixels, as `(group, bin)`.
    pub fn hit_test(&self, screen: Point2<f64>, radius: f64) -> Option<(usize, usize)> {
        self.groups
            .iter()
            .enumerate()
            .flat_map(|(g, group)| {
                group
                    .points
                    .iter()
                    .zip(group.bins.iter())
                    .map(move |(p, bin)| (g, *bin, nalgebra::distance(p, &screen)))
            })
            .filter(|(_, _, d)| *d <= radius)
            .min_by_key(|(_, _, d)| OrderedFloat(*d))
            .map(|(g, bin, _)| (g, bin))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenProjector {
    pub margins: ChartMargins,
    pub tick_count: usize,
}

impl Default for ScreenProjector {
    fn default() -> Self {
        Self {
            margins: ChartMargins::default(),
            tick_count: 5,
        }
    }
}

impl ScreenProjector {
    pub fn new(margins: ChartMargins, tick_count: usize) -> Self {
        Self {
            margins,
            tick_count,
        }
    }

    /// Maps every non-empty bin of `dataset` into `viewport` pixels.
    ///
    /// The x axis spans `[0, ceil(1.1 * max_distance)]`, the y axis the value
    /// range padded by 10% and always including zero. Empty bins are left out.
    pub fn project(
        &self,
        dataset: &VariogramDataset,
        viewport: Viewport,
        max_distance: f64,
    ) -> Result<ProjectedDataset, VariogramError> {
        let m = &self.margins;
        let left = m.left;
        let right = viewport.width - m.right;
        let top = m.top;
        let bottom = viewport.height - m.bottom;
        if !(right > left) || !(bottom > top) {
            return Err(VariogramError::DegenerateViewport {
                width: viewport.width,
                height: viewport.height,
            });
        }

        let x_max = (max_distance * 1.1).ceil();
        let x_axis = LinearAxis::nice(0.0, x_max, left, right, self.tick_count)?;

        let y_min = dataset.value_range.min.map_or(0.0, |v| (v * 1.1).min(0.0));
        let y_max = dataset.value_range.max.map_or(0.0, |v| (v * 1.1).max(0.0));
        let y_axis = LinearAxis::nice(y_min, y_max, bottom, top, self.tick_count)?;

        let groups = dataset
            .groups
            .iter()
            .map(|group| {
                let (points, bins) = group
                    .points
                    .iter()
                    .enumerate()
                    .filter_map(|(bin, point)| {
                        point.mean_value.map(|mean| {
                            (
                                Point2::new(x_axis.to_screen(point.distance), y_axis.to_screen(mean)),
                                bin,
                            )
                        })
                    })
                    .unzip();
                ProjectedGroup {
                    region_id: group.region_id.clone(),
                    points,
                    bins,
                }
            })
            .collect();

        Ok(ProjectedDataset {
            viewport,
            x_axis,
            y_axis,
            groups,
        })
    }
}
