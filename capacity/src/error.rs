use std::{
    error::Error,
    fmt::{self, Display},
};

use machine_learning::MlErr;

/// The result type of the capacity estimators.
pub type Result<T> = std::result::Result<T, CapacityErr>;

#[derive(Debug)]
pub enum CapacityErr {
    /// A search range that can't be iterated.
    InvalidRange(String),
    /// A data set size or sample count the generators can't produce.
    InvalidSize(String),
    ShapeMismatch {
        what: &'static str,
        got: usize,
        expected: usize,
    },
    Ml(MlErr),
}

impl Display for CapacityErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CapacityErr::InvalidRange(msg) => write!(f, "invalid range: {msg}"),
            CapacityErr::InvalidSize(msg) => write!(f, "invalid size: {msg}"),
            CapacityErr::ShapeMismatch {
                what,
                got,
                expected,
            } => write!(
                f,
                "There's a shape mismatch for {what}, got {got} and expected {expected}"
            ),
            CapacityErr::Ml(e) => write!(f, "{e}"),
        }
    }
}

impl Error for CapacityErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            CapacityErr::Ml(e) => Some(e),
            _ => None,
        }
    }
}

impl From<MlErr> for CapacityErr {
    fn from(value: MlErr) -> Self {
        Self::Ml(value)
    }
}
