use serde::{Deserialize, Serialize};

use crate::error::VariogramError;

/// Rounds `range` to 1, 2, 5 or 10 times a power of ten.
///
/// With `round` the closest such number is taken, otherwise the smallest one
/// not below `range`.
pub fn nice_number(range: f64, round: bool) -> f64 {
    if !(range > 0.0) || !range.is_finite() {
        return 0.0;
    }
    let exponent = range.log10().floor();
    let fraction = range / 10f64.powf(exponent);

    let nice = if round {
        if fraction < 1.5 {
            1.0
        } else if fraction < 3.0 {
            2.0
        } else if fraction < 7.0 {
            5.0
        } else {
            10.0
        }
    } else if fraction <= 1.0 {
        1.0
    } else if fraction <= 2.0 {
        2.0
    } else if fraction <= 5.0 {
        5.0
    } else {
        10.0
    };

    nice * 10f64.powf(exponent)
}

/// Expands `[min, max]` outward to multiples of a nice tick step.
///
/// A zero width range is widened to one unit above `min`.
pub fn nice_bounds(min: f64, max: f64, tick_count: usize) -> (f64, f64) {
    if !(max > min) {
        return (min, min + 1.0);
    }
    let range = nice_number(max - min, false);
    let step = nice_number(range / (tick_count.max(2) - 1) as f64, true);
    ((min / step).floor() * step, (max / step).ceil() * step)
}

/// Linear map between a value interval and a pixel interval.
///
/// The pixel interval may be reversed, as for a y axis growing downward.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearAxis {
    pub value_min: f64,
    pub value_max: f64,
    pub screen_start: f64,
    pub screen_end: f64,
}

impl LinearAxis {
    pub fn new(
        value_min: f64,
        value_max: f64,
        screen_start: f64,
        screen_end: f64,
    ) -> Result<Self, VariogramError> {
        if !value_min.is_finite() || !value_max.is_finite() || value_max <= value_min {
            return Err(VariogramError::DegenerateAxis {
                min: value_min,
                max: value_max,
            });
        }
        Ok(Self {
            value_min,
            value_max,
            screen_start,
            screen_end,
        })
    }

    /// Axis over `[min, max]` rounded outward to nice bounds.
    pub fn nice(
        min: f64,
        max: f64,
        screen_start: f64,
        screen_end: f64,
        tick_count: usize,
    ) -> Result<Self, VariogramError> {
        if !min.is_finite() || !max.is_finite() || max < min {
            return Err(VariogramError::DegenerateAxis { min, max });
        }
        let (nice_min, nice_max) = nice_bounds(min, max, tick_count);
        Self::new(nice_min, nice_max, screen_start, screen_end)
    }

    #[inline(always)]
    pub fn to_screen(&self, value: f64) -> f64 {
        let t = (value - self.value_min) / (self.value_max - self.value_min);
        self.screen_start + t * (self.screen_end - self.screen_start)
    }

    /// Inverse of [`LinearAxis::to_screen`].
    #[inline(always)]
    pub fn to_value(&self, screen: f64) -> f64 {
        let t = (screen - self.screen_start) / (self.screen_end - self.screen_start);
        self.value_min + t * (self.value_max - self.value_min)
    }
}
