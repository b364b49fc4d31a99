mod backprop;
mod checkpoint;
mod regression;
mod trainer;
mod writer;

pub use backprop::{Evaluation, backprop_batch, evaluate};
pub use checkpoint::{Checkpoint, CheckpointKind};
pub use regression::{RegressionTrainer, TrainerConfig};
pub use trainer::{EpochReport, Trainer};
pub use writer::{EpochWriter, LogWriter};
