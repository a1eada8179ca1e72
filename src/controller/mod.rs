use serde::{Deserialize, Serialize};

use crate::error::VariogramError;
use crate::variography::experimental::combine::CombineStrategy;
use crate::variography::experimental::LagBins;
use crate::variography::model_variograms::VariogramModelKind;

pub mod bounds;
pub mod range_controller;

/// Interactive parameters of the variogram view, persisted as a plain record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeParameters {
    /// Largest pair separation considered, in millimetres.
    pub max_distance: f64,
    pub bin_count: u32,
    pub combine_left_xor: bool,
    pub combine_right_xor: bool,
    #[serde(default)]
    pub vario_model: VariogramModelKind,
}

impl Default for RangeParameters {
    fn default() -> Self {
        Self {
            max_distance: 1.0,
            bin_count: 1,
            combine_left_xor: false,
            combine_right_xor: false,
            vario_model: VariogramModelKind::default(),
        }
    }
}

impl RangeParameters {
    pub fn left_strategy(&self) -> CombineStrategy {
        CombineStrategy::from_xor_flag(self.combine_left_xor)
    }

    pub fn right_strategy(&self) -> CombineStrategy {
        CombineStrategy::from_xor_flag(self.combine_right_xor)
    }

    pub fn validate(&self) -> Result<(), VariogramError> {
        LagBins::new(self.max_distance, self.bin_count).map(|_| ())
    }

    /// True when switching from `self` to `other` changes the binned result.
    pub fn requires_rebuild(&self, other: &RangeParameters) -> bool {
        self.max_distance != other.max_distance
            || self.bin_count != other.bin_count
            || self.combine_left_xor != other.combine_left_xor
            || self.combine_right_xor != other.combine_right_xor
    }

    pub fn to_json(&self) -> Result<String, VariogramError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, VariogramError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Where a requested rebuild runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Scheduling {
    /// On the calling thread, before `compute_async` returns.
    Inline,
    /// On the rayon pool.
    #[default]
    Background,
}
