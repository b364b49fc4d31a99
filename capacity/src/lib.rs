//! Empirical capacity estimation for trainable models.
//!
//! Two measures are provided: the fat-shattering dimension, searched linearly over data set
//! sizes with an optimizer-driven shattering test at each size, and the memorization capacity,
//! the amount of bits of random labels a model is able to fit as the data set grows.

pub mod datagen;
pub mod error;
pub mod fat;
pub mod fitter;
pub mod memory;
pub mod normalize;
pub mod shatter;

pub use error::{CapacityErr, Result};
pub use fat::{Boundary, FatDim, FatShattering, fat_shattering_dim, search_dim};
pub use fitter::{Fitter, OptimizerFitter};
pub use memory::{MemoryPoint, fit_rand_labels, memory};
pub use normalize::normalize_const;
pub use shatter::{ShatterChecker, StartPolicy, check_shattering};
