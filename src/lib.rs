pub mod controller;
pub mod error;
pub mod geometry;
pub mod plotting;
pub mod spatial_database;
pub mod variography;

pub mod prelude {

    pub mod re_exports {
        pub use nalgebra;
        pub use rstar;
    }

    pub use crate::controller::{
        bounds::SliderBounds,
        range_controller::{PendingDataset, RangeController},
        RangeParameters, Scheduling,
    };
    pub use crate::error::VariogramError;
    pub use crate::plotting::projector::{ProjectedDataset, ScreenProjector, Viewport};
    pub use crate::spatial_database::{
        coordinate_system::CoordinateUnits, point_set::PointSet, region::Region,
        CoordinateResolver, DataQuery, ScalarSample, ScalarSeries,
    };
    pub use crate::variography::{
        dataset::{VariogramDataset, VariogramPointGroup},
        experimental::{
            combine::CombineStrategy,
            cpu_calculator::{compute_bins, DistanceBinner},
            VariogramPoint,
        },
        model_variograms::VariogramModelKind,
    };
}
