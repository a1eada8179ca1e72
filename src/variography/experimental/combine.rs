use serde::{Deserialize, Serialize};

/// How two values of one field are combined for a point pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CombineStrategy {
    /// Signed difference, for continuous quantities.
    #[default]
    Difference,
    /// Bitwise XOR of the nearest integers, for bitmask encoded fields.
    BitwiseXor,
}

impl CombineStrategy {
    pub fn from_xor_flag(xor: bool) -> Self {
        if xor {
            CombineStrategy::BitwiseXor
        } else {
            CombineStrategy::Difference
        }
    }

    pub fn is_xor(&self) -> bool {
        matches!(self, CombineStrategy::BitwiseXor)
    }

    /// The pair function, resolved once per computation.
    #[inline(always)]
    pub fn function(&self) -> fn(f64, f64) -> f64 {
        match self {
            CombineStrategy::Difference => difference,
            CombineStrategy::BitwiseXor => bitwise_xor_sum,
        }
    }

    #[inline(always)]
    pub fn combine(&self, a: f64, b: f64) -> f64 {
        (self.function())(a, b)
    }
}

#[inline(always)]
pub fn difference(a: f64, b: f64) -> f64 {
    a - b
}

/// XOR of the nearest integer representations of `a` and `b`.
#[inline(always)]
pub fn bitwise_xor_sum(a: f64, b: f64) -> f64 {
    ((a.round() as i64) ^ (b.round() as i64)) as f64
}
