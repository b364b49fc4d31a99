use std::{
    ffi::OsString,
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::Result;

/// A snapshot of the parameters that achieved the best value of some metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub epoch: usize,
    pub value: f64,
    pub params: Vec<f64>,
}

/// The metric a checkpoint was selected by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckpointKind {
    BestTrain,
    BestValid,
    BestMre,
}

impl CheckpointKind {
    fn suffix(self) -> &'static str {
        match self {
            CheckpointKind::BestTrain => "_besttrain.json",
            CheckpointKind::BestValid => "_bestval.json",
            CheckpointKind::BestMre => "_bestmre.json",
        }
    }

    /// Returns the file for this kind of checkpoint under `prefix`.
    pub fn path(self, prefix: &Path) -> PathBuf {
        let mut path = OsString::from(prefix.as_os_str());
        path.push(self.suffix());
        PathBuf::from(path)
    }
}

impl Checkpoint {
    pub fn save(&self, path: &Path) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }
}
