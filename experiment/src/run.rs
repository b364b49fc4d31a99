use std::{path::PathBuf, time::Instant};

use capacity::{
    FatShattering, OptimizerFitter, StartPolicy,
    datagen::{DataGenCapacity, DataGenFat},
    memory, normalize_const,
};
use log::{info, warn};
use machine_learning::{
    arch::{IqpeReuploadSu2Parity, loss::Mse},
    initialization::RandParamGen,
    optimization::Adam,
    training::{RegressionTrainer, TrainerConfig},
};
use rand::{SeedableRng, rngs::StdRng};

use crate::{
    ExperimentConfig, Result,
    results::{FatResults, MemoryResults, ParamCounts, save_results},
};

/// The seed of the data generators, kept apart from the one initializing the model so the two
/// random streams differ.
fn data_seed(seed: Option<u64>) -> Option<u64> {
    seed.map(|seed| seed.wrapping_add(1))
}

fn build_model(config: &ExperimentConfig) -> Result<IqpeReuploadSu2Parity> {
    if config.cuda {
        warn!("cuda was requested but only the cpu backend is available");
    }

    let rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let mut param_gen = RandParamGen::normal(rng, usize::MAX, 0.0, 1.0)?;

    let model = IqpeReuploadSu2Parity::init(
        config.num_qubits,
        config.num_reups,
        config.num_layers,
        config.omega,
        &mut param_gen,
    )?;

    info!(
        "model: {} qubits, {} gate and {} observable parameters",
        model.num_qubits(),
        model.num_params_gates(),
        model.num_params_obs()
    );
    Ok(model)
}

fn param_counts(model: &IqpeReuploadSu2Parity) -> ParamCounts {
    ParamCounts::new(model.num_params_gates(), model.num_params_obs())
}

/// Estimates the fat-shattering dimension of a freshly initialized QNN and saves the results.
///
/// # Returns
/// The path of the results file.
pub fn run_fat(config: ExperimentConfig) -> Result<PathBuf> {
    config.validate()?;

    let mut model = build_model(&config)?;
    let sizex = config.num_qubits;
    let mut datagen = DataGenFat::new(
        sizex,
        config.sb,
        config.sr,
        config.gamma_fac * config.gamma,
        data_seed(config.seed),
    )?;

    let (lr, amsgrad) = (config.lr, config.amsgrad);
    let mut fitter = OptimizerFitter::new(
        move |len| Adam::with_lr(len, lr).amsgrad(amsgrad),
        config.opt_steps,
        config.opt_stop,
    );

    let start = Instant::now();
    let dim = FatShattering::new(config.dmin, config.dmax, config.gamma)
        .dstep(config.dstep)
        .start(StartPolicy::Cold)
        .estimate(&mut model, &mut datagen, &mut fitter)?;
    let elapsed = start.elapsed();

    info!(
        "fat-shattering dimension {} ({:?}) in {:.1}s",
        dim.dim,
        dim.boundary,
        elapsed.as_secs_f64()
    );

    let norm = normalize_const(model.weights(), config.gamma, Some(sizex as f64));
    let save_dir = config.save_dir.clone();
    let results = FatResults::new(
        config,
        elapsed,
        param_counts(&model),
        dim.dim,
        dim.boundary,
        norm,
    );

    save_results(&results, &save_dir)
}

/// Estimates the memorization capacity of a freshly initialized QNN and saves the results.
///
/// # Returns
/// The path of the results file.
pub fn run_memory(config: ExperimentConfig) -> Result<PathBuf> {
    config.validate()?;

    let mut model = build_model(&config)?;
    let mut datagen = DataGenCapacity::new(
        config.num_qubits,
        config.num_samples,
        data_seed(config.seed),
    )?;

    let (lr, amsgrad) = (config.lr, config.amsgrad);
    let mut trainer = RegressionTrainer::new(
        move |len| Adam::with_lr(len, lr).amsgrad(amsgrad),
        Mse,
        TrainerConfig {
            num_epochs: config.num_epochs,
            opt_stop: config.opt_stop,
            ..Default::default()
        },
    );

    let stop_count = config.early_stop.then_some(config.stop_count);

    let start = Instant::now();
    let points = memory(
        &mut model,
        &mut datagen,
        &mut trainer,
        config.nmin,
        config.nmax,
        stop_count,
    )?;
    let elapsed = start.elapsed();

    let save_dir = config.save_dir.clone();
    let results = MemoryResults::new(config, elapsed, param_counts(&model), points);
    info!(
        "memorization capacity {} bits in {:.1}s",
        results.max_capacity,
        elapsed.as_secs_f64()
    );

    save_results(&results, &save_dir)
}

#[cfg(test)]
mod tests {
    use std::{fs, path::Path};

    use serde_json::Value;

    use super::*;
    use crate::ExperimentErr;

    fn tiny_config(save_dir: PathBuf) -> ExperimentConfig {
        ExperimentConfig {
            dmin: 1,
            dmax: 2,
            num_qubits: 1,
            sb: 2,
            sr: 1,
            opt_steps: 5,
            seed: Some(1),
            save_dir,
            nmin: 1,
            nmax: 2,
            num_samples: 2,
            num_epochs: 3,
            ..Default::default()
        }
    }

    fn read(path: &Path) -> Value {
        serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
    }

    #[test]
    fn fat_run_writes_results() {
        let dir = tempfile::tempdir().unwrap();
        let path = run_fat(tiny_config(dir.path().to_path_buf())).unwrap();

        let json = read(&path);
        let dim = json["fat_dim"].as_i64().unwrap();
        assert!((0..=2).contains(&dim));
        // one qubit: one initial theta, no pairs, two parity weights
        assert_eq!(json["num_params_gates"], 1);
        assert_eq!(json["num_params_obs"], 2);
        assert_eq!(json["num_params"], 3);
        assert_eq!(json["hyperparameters"]["dmax"], 2);
    }

    #[test]
    fn memory_run_writes_one_point_per_size() {
        let dir = tempfile::tempdir().unwrap();
        let config = ExperimentConfig {
            early_stop: false,
            ..tiny_config(dir.path().to_path_buf())
        };

        let json = read(&run_memory(config).unwrap());
        let points = json["memory"].as_array().unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0]["samples"], 1);
        assert_eq!(points[1]["samples"], 2);
    }

    #[test]
    fn model_and_data_streams_are_seeded_apart() {
        assert_eq!(data_seed(None), None);
        assert_eq!(data_seed(Some(u64::MAX)), Some(0));

        let config = tiny_config(PathBuf::from("unused"));
        let mut datagen = DataGenCapacity::new(1, 3, config.seed).unwrap();
        let same_seed = datagen.gen_data(1).unwrap();
        let mut datagen = DataGenCapacity::new(1, 3, data_seed(config.seed)).unwrap();
        let apart = datagen.gen_data(1).unwrap();

        assert_ne!(data_seed(config.seed), config.seed);
        assert_ne!(same_seed, apart);
    }

    #[test]
    fn invalid_config_fails_before_running() {
        let dir = tempfile::tempdir().unwrap();
        let config = ExperimentConfig {
            num_qubits: 0,
            ..tiny_config(dir.path().join("never"))
        };

        assert!(matches!(run_fat(config), Err(ExperimentErr::Config(_))));
        assert!(!dir.path().join("never").exists());
    }
}
