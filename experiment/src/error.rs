use std::{
    error::Error,
    fmt::{self, Display},
    io,
};

use capacity::CapacityErr;
use machine_learning::MlErr;

pub type Result<T> = std::result::Result<T, ExperimentErr>;

/// All errors that can occur while running an experiment.
#[derive(Debug)]
pub enum ExperimentErr {
    /// Invalid configuration, caught before any computation.
    Config(String),
    Yaml(serde_yaml::Error),
    Json(serde_json::Error),
    Io(io::Error),
    Capacity(CapacityErr),
}

impl Display for ExperimentErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "invalid config: {msg}"),
            Self::Yaml(e) => write!(f, "failed to parse config: {e}"),
            Self::Json(e) => write!(f, "failed to write results: {e}"),
            Self::Io(e) => write!(f, "io error: {e}"),
            Self::Capacity(e) => write!(f, "capacity estimation failed: {e}"),
        }
    }
}

impl Error for ExperimentErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Yaml(e) => Some(e),
            Self::Json(e) => Some(e),
            Self::Io(e) => Some(e),
            Self::Capacity(e) => Some(e),
            Self::Config(_) => None,
        }
    }
}

impl From<serde_yaml::Error> for ExperimentErr {
    fn from(e: serde_yaml::Error) -> Self {
        Self::Yaml(e)
    }
}

impl From<serde_json::Error> for ExperimentErr {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

impl From<io::Error> for ExperimentErr {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<CapacityErr> for ExperimentErr {
    fn from(e: CapacityErr) -> Self {
        Self::Capacity(e)
    }
}

impl From<MlErr> for ExperimentErr {
    fn from(e: MlErr) -> Self {
        Self::Capacity(CapacityErr::Ml(e))
    }
}
