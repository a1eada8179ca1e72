use std::time::Instant;

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use super::experimental::cpu_calculator::DistanceBinner;
use super::experimental::VariogramPoint;
use crate::controller::RangeParameters;
use crate::error::VariogramError;
use crate::geometry::min_max::MinMax;
use crate::spatial_database::region::{PointShape, Region, Rgba};
use crate::spatial_database::{CoordinateResolver, DataQuery, ScalarSeries};

/// Regions with more located points than this are binned on the rayon pool.
pub const PARALLEL_POINT_THRESHOLD: usize = 512;

/// Binned statistic of one region, drawn as one series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariogramPointGroup {
    pub region_id: String,
    pub color: Rgba,
    pub shape: PointShape,
    pub points: Vec<VariogramPoint>,
    pub value_range: MinMax<f64>,
}

impl VariogramPointGroup {
    pub fn new(region: &Region, color: Rgba, points: Vec<VariogramPoint>) -> Self {
        let value_range = MinMax::from_values(points.iter().filter_map(|p| p.mean_value));
        Self {
            region_id: region.id.clone(),
            color,
            shape: region.shape,
            points,
            value_range,
        }
    }
}

/// Already fetched inputs for one region.
#[derive(Debug, Clone)]
pub struct RegionSeries {
    pub region: Region,
    pub left: ScalarSeries,
    /// `None` computes the auto-variogram of `left`.
    pub right: Option<ScalarSeries>,
    /// Millimetre coordinates aligned with `left`.
    pub coords: Vec<Option<Point2<f64>>>,
}

/// Everything the chart needs, replaced wholesale on every recompute.
///
/// Failures are carried in `error_message` with no groups, never as a panic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VariogramDataset {
    pub title: String,
    pub groups: Vec<VariogramPointGroup>,
    pub value_range: MinMax<f64>,
    pub error_message: String,
}

impl VariogramDataset {
    pub fn with_error(title: impl Into<String>, error_message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            groups: Vec::new(),
            value_range: MinMax::new(),
            error_message: error_message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        !self.error_message.is_empty()
    }

    /// Fetches each region's series through `query` and bins them.
    ///
    /// One field id gives the auto-variogram, two give the cross-variogram;
    /// ids past the second are ignored.
    pub fn build<Q, C>(
        regions: &[Region],
        field_ids: &[String],
        params: &RangeParameters,
        query: &Q,
        resolver: &C,
    ) -> Self
    where
        Q: DataQuery + ?Sized,
        C: CoordinateResolver + ?Sized,
    {
        let title = title_for(field_ids);
        match fetch_region_series(regions, field_ids, params, query, resolver)
            .and_then(|inputs| Self::try_from_region_series(&title, &inputs, params))
        {
            Ok(dataset) => dataset,
            Err(err) => Self::from_error(title, err),
        }
    }

    /// Bins series that were fetched elsewhere.
    pub fn from_region_series(
        title: impl Into<String>,
        inputs: &[RegionSeries],
        params: &RangeParameters,
    ) -> Self {
        let title = title.into();
        if inputs.is_empty() {
            return Self::from_error(title, VariogramError::EmptySelection);
        }
        match Self::try_from_region_series(&title, inputs, params) {
            Ok(dataset) => dataset,
            Err(err) => Self::from_error(title, err),
        }
    }

    fn try_from_region_series(
        title: &str,
        inputs: &[RegionSeries],
        params: &RangeParameters,
    ) -> Result<Self, VariogramError> {
        let binner = DistanceBinner::new(
            params.max_distance,
            params.bin_count,
            params.left_strategy(),
            params.right_strategy(),
        )?;

        let start = Instant::now();
        let mut groups = Vec::with_capacity(inputs.len());
        let mut value_range = MinMax::new();

        for input in inputs {
            let Some(color) = input.region.color else {
                tracing::warn!(region = %input.region.id, "skipping region without display color");
                continue;
            };

            let right = input.right.as_ref().unwrap_or(&input.left);
            let located = input.coords.iter().flatten().count();
            let points = if located > PARALLEL_POINT_THRESHOLD {
                binner.compute_bins_par(&input.left, right, &input.coords)
            } else {
                binner.compute_bins(&input.left, right, &input.coords)
            }?;

            tracing::debug!(
                region = %input.region.id,
                located,
                pairs = points.iter().map(|p| p.count).sum::<u64>(),
                "binned region"
            );

            let group = VariogramPointGroup::new(&input.region, color, points);
            value_range.expand_by_min_max(&group.value_range);
            groups.push(group);
        }

        tracing::info!(
            groups = groups.len(),
            bins = params.bin_count,
            max_distance = params.max_distance,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "variogram dataset built"
        );

        Ok(Self {
            title: title.to_string(),
            groups,
            value_range,
            error_message: String::new(),
        })
    }

    fn from_error(title: String, err: VariogramError) -> Self {
        if err.is_validation() {
            tracing::debug!(%err, "variogram parameters rejected");
        } else {
            tracing::error!(%err, "variogram computation failed");
        }
        Self::with_error(title, err.to_string())
    }
}

fn title_for(field_ids: &[String]) -> String {
    match field_ids {
        [] => String::new(),
        [field] => format!("Variogram: {field}"),
        [left, right, ..] => format!("Cross-variogram: {left} / {right}"),
    }
}

fn fetch_region_series<Q, C>(
    regions: &[Region],
    field_ids: &[String],
    params: &RangeParameters,
    query: &Q,
    resolver: &C,
) -> Result<Vec<RegionSeries>, VariogramError>
where
    Q: DataQuery + ?Sized,
    C: CoordinateResolver + ?Sized,
{
    if regions.is_empty() || field_ids.is_empty() {
        return Err(VariogramError::EmptySelection);
    }
    params.validate()?;

    if field_ids.len() > 2 {
        tracing::debug!(
            ignored = field_ids.len() - 2,
            "only the first two fields are used"
        );
    }

    let mut inputs = Vec::with_capacity(regions.len());
    for region in regions.iter().filter(|r| r.color.is_some()) {
        let left = query.fetch_scalar_series(&field_ids[0], &region.id)?;
        let right = match field_ids.get(1) {
            Some(field) => Some(query.fetch_scalar_series(field, &region.id)?),
            None => None,
        };
        let coords = left.coordinates(resolver);

        inputs.push(RegionSeries {
            region: region.clone(),
            left,
            right,
            coords,
        });
    }

    Ok(inputs)
}

#[cfg(test)]
mod test {
    use std::cell::RefCell;
    use std::collections::HashMap;

    use approx::assert_relative_eq;

    use super::*;
    use crate::spatial_database::coordinate_system::CoordinateUnits;
    use crate::spatial_database::point_set::PointSet;

    const RED: Rgba = Rgba::new(255, 0, 0, 255);
    const BLUE: Rgba = Rgba::new(0, 0, 255, 255);

    #[derive(Default)]
    struct MapQuery {
        series: HashMap<(String, String), ScalarSeries>,
        calls: RefCell<Vec<(String, String)>>,
    }

    impl MapQuery {
        fn insert(&mut self, field: &str, region: &str, series: ScalarSeries) {
            self.series
                .insert((field.to_string(), region.to_string()), series);
        }
    }

    impl DataQuery for MapQuery {
        fn fetch_scalar_series(
            &self,
            field_id: &str,
            region_id: &str,
        ) -> Result<ScalarSeries, VariogramError> {
            self.calls
                .borrow_mut()
                .push((field_id.to_string(), region_id.to_string()));
            self.series
                .get(&(field_id.to_string(), region_id.to_string()))
                .cloned()
                .ok_or_else(|| VariogramError::Fetch(format!("no {field_id} for {region_id}")))
        }
    }

    fn points() -> PointSet {
        PointSet::new(
            vec![1, 2, 3, 4],
            (0..4).map(|i| Point2::new(i as f64, 0.0)).collect(),
            CoordinateUnits::Millimeters,
        )
        .unwrap()
    }

    fn params(max_distance: f64, bin_count: u32) -> RangeParameters {
        RangeParameters {
            max_distance,
            bin_count,
            ..RangeParameters::default()
        }
    }

    fn fields(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    fn query() -> MapQuery {
        let mut query = MapQuery::default();
        query.insert(
            "Fe",
            "roi-a",
            ScalarSeries::from_pairs([(1, 10.0), (2, 12.0), (3, 14.0), (4, 11.0)]),
        );
        query.insert(
            "Ca",
            "roi-a",
            ScalarSeries::from_pairs([(1, 1.0), (2, 3.0), (3, 2.0), (4, 2.0)]),
        );
        query.insert(
            "Fe",
            "roi-b",
            ScalarSeries::from_pairs([(1, 0.0), (2, 1.0), (3, 0.0), (4, 1.0)]),
        );
        query
    }

    #[test]
    fn empty_selection() {
        let regions = vec![Region::new("roi-a", "A").with_color(RED)];
        let no_regions: Vec<Region> = Vec::new();

        for (regions, fields) in [(&regions, fields(&[])), (&no_regions, fields(&["Fe"]))] {
            let dataset =
                VariogramDataset::build(regions, &fields, &params(4.0, 4), &query(), &points());
            assert_eq!(dataset.error_message, "invalid expressions or ROIs selected");
            assert!(dataset.groups.is_empty());
        }
    }

    #[test]
    fn invalid_parameters_are_reported() {
        let regions = vec![Region::new("roi-a", "A").with_color(RED)];
        let q = query();

        let dataset = VariogramDataset::build(&regions, &fields(&["Fe"]), &params(4.0, 0), &q, &points());
        assert!(dataset.is_error());
        assert!(dataset.error_message.contains("bin count"));

        let dataset =
            VariogramDataset::build(&regions, &fields(&["Fe"]), &params(-2.0, 4), &q, &points());
        assert!(dataset.error_message.contains("max distance"));
        assert!(dataset.groups.is_empty());
        assert!(q.calls.borrow().is_empty());
    }

    #[test]
    fn auto_variogram_per_region() {
        let regions = vec![
            Region::new("roi-a", "A").with_color(RED),
            Region::new("roi-b", "B").with_color(BLUE).with_shape(PointShape::Square),
            Region::new("roi-hidden", "Hidden"),
        ];
        let q = query();
        let dataset = VariogramDataset::build(&regions, &fields(&["Fe"]), &params(4.0, 4), &q, &points());

        assert!(!dataset.is_error());
        assert_eq!(dataset.title, "Variogram: Fe");
        assert_eq!(dataset.groups.len(), 2);
        assert_eq!(dataset.groups[1].shape, PointShape::Square);
        // the colourless region is never fetched
        assert!(q.calls.borrow().iter().all(|(_, r)| r != "roi-hidden"));

        let a = &dataset.groups[0];
        assert_eq!(a.points[0].mean_value, None);
        assert_relative_eq!(a.points[1].mean_value.unwrap(), 34.0 / 12.0);
        assert_relative_eq!(a.value_range.min.unwrap(), 0.5);
        assert_relative_eq!(a.value_range.max.unwrap(), 4.25);

        // roi-b alternates 0,1: separation 1 -> 0.5, separation 2 -> 0, separation 3 -> 0.5
        let b = &dataset.groups[1];
        assert_relative_eq!(b.points[1].mean_value.unwrap(), 0.5);
        assert_relative_eq!(b.points[2].mean_value.unwrap(), 0.0);

        assert_relative_eq!(dataset.value_range.min.unwrap(), 0.0);
        assert_relative_eq!(dataset.value_range.max.unwrap(), 4.25);
    }

    #[test]
    fn colourless_regions_only() {
        let regions = vec![Region::new("roi-a", "A")];
        let q = query();
        let dataset =
            VariogramDataset::build(&regions, &fields(&["Fe"]), &params(4.0, 4), &q, &points());

        assert!(!dataset.is_error());
        assert!(dataset.groups.is_empty());
        assert!(dataset.value_range.is_empty());
        assert!(q.calls.borrow().is_empty());
    }

    #[test]
    fn cross_variogram_uses_first_two_fields() {
        let regions = vec![Region::new("roi-a", "A").with_color(RED)];
        let q = query();
        let dataset = VariogramDataset::build(
            &regions,
            &fields(&["Fe", "Ca", "Mg"]),
            &params(2.0, 2),
            &q,
            &points(),
        );

        assert!(!dataset.is_error(), "{}", dataset.error_message);
        assert_eq!(dataset.title, "Cross-variogram: Fe / Ca");
        assert!(q.calls.borrow().iter().all(|(f, _)| f != "Mg"));

        // separation 1: (10-12)(1-3)=4, (12-14)(3-2)=-2, (14-11)(2-2)=0, doubled
        let bin = &dataset.groups[0].points[1];
        assert_eq!(bin.count, 6);
        assert_relative_eq!(bin.sum, 4.0);
        assert_relative_eq!(bin.mean_value.unwrap(), 0.5 * 4.0 / 6.0);
    }

    #[test]
    fn fetch_failure_becomes_message() {
        let regions = vec![Region::new("roi-b", "B").with_color(RED)];
        let dataset = VariogramDataset::build(
            &regions,
            &fields(&["Fe", "Ca"]),
            &params(4.0, 4),
            &query(),
            &points(),
        );
        assert!(dataset.error_message.contains("no Ca for roi-b"));
        assert!(dataset.groups.is_empty());
    }

    #[test]
    fn mismatched_series_returns_no_groups() {
        let mut q = query();
        q.insert(
            "Ca",
            "roi-a",
            ScalarSeries::from_pairs([(1, 1.0), (3, 3.0), (2, 2.0), (4, 2.0)]),
        );
        let regions = vec![Region::new("roi-a", "A").with_color(RED)];
        let dataset =
            VariogramDataset::build(&regions, &fields(&["Fe", "Ca"]), &params(4.0, 4), &q, &points());

        assert!(dataset.error_message.contains("point id mismatch"));
        assert!(dataset.groups.is_empty());
        assert!(dataset.value_range.is_empty());
    }

    #[test]
    fn from_prefetched_series() {
        let inputs = vec![RegionSeries {
            region: Region::new("roi-a", "A").with_color(RED),
            left: ScalarSeries::from_pairs([(1, 2.0), (2, 4.0)]),
            right: None,
            coords: vec![Some(Point2::new(0.0, 0.0)), Some(Point2::new(0.0, 1.5))],
        }];
        let dataset = VariogramDataset::from_region_series("pre", &inputs, &params(2.0, 1));

        assert_eq!(dataset.groups[0].points.len(), 1);
        assert_eq!(dataset.groups[0].points[0].distance, 2.0);
        assert_relative_eq!(dataset.groups[0].points[0].mean_value.unwrap(), 2.0);
    }
}
