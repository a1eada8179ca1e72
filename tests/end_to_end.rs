use std::collections::HashMap;
use std::sync::Arc;

use approx::assert_relative_eq;
use covario::prelude::*;
use covario::spatial_database::region::Rgba;

struct CsvQuery {
    series: HashMap<(String, String), ScalarSeries>,
}

impl DataQuery for CsvQuery {
    fn fetch_scalar_series(
        &self,
        field_id: &str,
        region_id: &str,
    ) -> Result<ScalarSeries, VariogramError> {
        self.series
            .get(&(field_id.to_string(), region_id.to_string()))
            .cloned()
            .ok_or_else(|| VariogramError::Fetch(format!("{field_id}/{region_id}")))
    }
}

fn scenario() -> (Arc<CsvQuery>, Arc<PointSet>) {
    let beams = "pmc,x,y\n1,0.000,0\n2,0.001,0\n3,0.002,0\n4,0.003,0\n";
    let points =
        PointSet::from_csv_reader(beams.as_bytes(), "pmc", "x", "y", CoordinateUnits::Meters)
            .unwrap();

    let fe = "pmc,value\n1,10\n2,12\n3,14\n4,11\n";
    let mut series = HashMap::new();
    series.insert(
        ("Fe".to_string(), "all".to_string()),
        ScalarSeries::from_csv_reader(fe.as_bytes(), "pmc", "value").unwrap(),
    );

    (Arc::new(CsvQuery { series }), Arc::new(points))
}

#[test]
fn four_points_end_to_end() {
    let (query, points) = scenario();

    let mut controller = RangeController::new(Scheduling::Background);
    controller.update_bounds(&points);
    controller.set_parameters(RangeParameters {
        max_distance: 4.0,
        bin_count: 4,
        ..*controller.parameters()
    });
    controller.set_regions(vec![
        Region::new("all", "All points").with_color(Rgba::new(200, 40, 40, 255))
    ]);
    controller.set_field_ids(vec!["Fe".to_string()]);
    assert!(controller.rebuild(query, points));

    let dataset = controller.dataset();
    assert!(!dataset.is_error(), "{}", dataset.error_message);
    let bins = &dataset.groups[0].points;

    assert_eq!(
        bins.iter().map(|b| b.distance).collect::<Vec<_>>(),
        vec![1.0, 2.0, 3.0, 4.0]
    );
    assert_eq!(
        bins.iter().map(|b| b.count).collect::<Vec<_>>(),
        vec![0, 6, 4, 2]
    );
    assert_eq!(bins[0].mean_value, None);
    assert_relative_eq!(bins[1].mean_value.unwrap(), 0.5 * 34.0 / 6.0, epsilon = 1e-9);
    assert_relative_eq!(bins[2].mean_value.unwrap(), 0.5 * 34.0 / 4.0, epsilon = 1e-9);
    assert_relative_eq!(bins[3].mean_value.unwrap(), 0.5 * 2.0 / 2.0, epsilon = 1e-9);

    let projected = controller
        .projection(&ScreenProjector::default(), Viewport::new(640.0, 480.0))
        .clone()
        .unwrap();
    assert_eq!(projected.groups[0].bins, vec![1, 2, 3]);
    assert!(projected
        .points()
        .iter()
        .flatten()
        .all(|p| p.x >= 40.0 && p.x <= 630.0 && p.y >= 10.0 && p.y <= 450.0));
}

#[test]
fn cross_field_with_shuffled_ids_is_rejected() {
    let (query, points) = scenario();
    let mut series = query.series.clone();
    series.insert(
        ("Ca".to_string(), "all".to_string()),
        ScalarSeries::from_pairs([(1, 1.0), (2, 1.0), (4, 1.0), (3, 1.0)]),
    );
    let query = Arc::new(CsvQuery { series });

    let mut controller = RangeController::with_parameters(
        RangeParameters {
            max_distance: 4.0,
            bin_count: 4,
            ..RangeParameters::default()
        },
        Scheduling::Inline,
    );
    controller.set_regions(vec![Region::new("all", "All").with_color(Rgba::new(0, 0, 0, 255))]);
    controller.set_field_ids(vec!["Fe".to_string(), "Ca".to_string()]);
    controller.rebuild(query, points);

    let dataset = controller.dataset();
    assert!(dataset.groups.is_empty());
    assert!(dataset.error_message.contains("mismatch"));
}

#[test]
fn unlocated_points_leave_gaps() {
    let (_, points) = scenario();
    let series = ScalarSeries::from_pairs([(1, 10.0), (2, 12.0), (99, 14.0), (4, 11.0)]);
    let coords = series.coordinates(points.as_ref());

    assert!(coords[2].is_none());
    let bins = compute_bins(&series, &series, &coords, 4.0, 4, false, false).unwrap();
    assert_eq!(bins.iter().map(|b| b.count).sum::<u64>(), 6);
    assert_relative_eq!(
        coords[1].unwrap().x - coords[0].unwrap().x,
        1.0,
        epsilon = 1e-9
    );
}
