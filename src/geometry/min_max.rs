use num_traits::Float;
use serde::{Deserialize, Serialize};

/// Running minimum and maximum of a set of values. Both ends are `None` until
/// the first finite value is seen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MinMax<T> {
    pub min: Option<T>,
    pub max: Option<T>,
}

impl<T> Default for MinMax<T> {
    fn default() -> Self {
        Self {
            min: None,
            max: None,
        }
    }
}

impl<T> MinMax<T>
where
    T: Float,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_values(values: impl IntoIterator<Item = T>) -> Self {
        let mut range = Self::new();
        values.into_iter().for_each(|v| range.expand(v));
        range
    }

    /// Non-finite values are ignored.
    pub fn expand(&mut self, value: T) {
        if !value.is_finite() {
            return;
        }
        self.min = Some(self.min.map_or(value, |m| m.min(value)));
        self.max = Some(self.max.map_or(value, |m| m.max(value)));
    }

    pub fn expand_by_min_max(&mut self, other: &MinMax<T>) {
        if let Some(min) = other.min {
            self.expand(min);
        }
        if let Some(max) = other.max {
            self.expand(max);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min.is_none() || self.max.is_none()
    }

    pub fn range(&self) -> Option<T> {
        Some(self.max? - self.min?)
    }
}
