use serde::{Deserialize, Serialize};

/// Theoretical model selected for display next to the experimental variogram.
///
/// Stored and persisted with the range parameters only; nothing is fitted
/// against it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariogramModelKind {
    #[default]
    Exponential,
    Spherical,
    Gaussian,
}

impl VariogramModelKind {
    pub const ALL: [VariogramModelKind; 3] = [
        VariogramModelKind::Exponential,
        VariogramModelKind::Spherical,
        VariogramModelKind::Gaussian,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            VariogramModelKind::Exponential => "exponential",
            VariogramModelKind::Spherical => "spherical",
            VariogramModelKind::Gaussian => "gaussian",
        }
    }
}

impl std::fmt::Display for VariogramModelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
