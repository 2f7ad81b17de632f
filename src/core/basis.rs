use serde::{Deserialize, Serialize};
use std::fmt;

/// A transmitted or measured key bit.
pub type Bit = bool;

/// Encoding/measurement basis of a single photon.
///
/// - `Rectilinear` encodes bit 0 as $|0\rangle$ and bit 1 as $|1\rangle$.
/// - `Diagonal` encodes bit 0 as $|+\rangle$ and bit 1 as $|-\rangle$.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Basis {
    Rectilinear,
    Diagonal,
}

impl Basis {
    /// Maps a uniform coin flip onto a basis (false -> Rectilinear).
    pub fn from_bool(diagonal: bool) -> Self {
        if diagonal {
            Basis::Diagonal
        } else {
            Basis::Rectilinear
        }
    }

    pub fn is_diagonal(self) -> bool {
        matches!(self, Basis::Diagonal)
    }
}

impl fmt::Display for Basis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Basis::Rectilinear => write!(f, "+"),
            Basis::Diagonal => write!(f, "x"),
        }
    }
}
