use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Unit of the raw beam coordinates reported by a dataset.
///
/// All distances inside the engine are in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CoordinateUnits {
    #[default]
    Millimeters,
    Meters,
}

impl CoordinateUnits {
    pub fn from_beam_units_in_meters(in_meters: bool) -> Self {
        if in_meters {
            CoordinateUnits::Meters
        } else {
            CoordinateUnits::Millimeters
        }
    }

    #[inline(always)]
    pub fn scale_to_millimeters(&self) -> f64 {
        match self {
            CoordinateUnits::Millimeters => 1.0,
            CoordinateUnits::Meters => 1000.0,
        }
    }

    #[inline(always)]
    pub fn to_millimeters(&self, point: Point2<f64>) -> Point2<f64> {
        point * self.scale_to_millimeters()
    }
}
