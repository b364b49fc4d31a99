mod capacity;
mod fat;
mod instance;

pub use capacity::{CapacityData, DataGenCapacity};
pub use fat::DataGenFat;
pub use instance::{Instance, InstanceGen};

use ndarray_rand::rand_distr::Uniform;
use rand::{SeedableRng, rngs::StdRng};

use crate::Result;
use machine_learning::MlErr;

/// Seeds an rng from `seed`, or from the OS when there is none.
fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

/// The uniform distribution over `[low, high)`.
fn uniform(low: f64, high: f64) -> Result<Uniform<f64>> {
    Ok(Uniform::new(low, high).map_err(MlErr::from)?)
}
