use log::{debug, info, warn};
use machine_learning::arch::Model;
use serde::Serialize;

use crate::{
    CapacityErr, Fitter, Result,
    datagen::InstanceGen,
    shatter::{ShatterChecker, StartPolicy},
};

/// How the search over data set sizes ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Boundary {
    /// A size in the range failed, the dimension is the last size before it.
    Exact,
    /// The first size already failed, the dimension is only known to be below `dmin`.
    BelowMin,
    /// Every size shattered, the dimension is at least `dmax`.
    ReachedMax,
}

/// An estimated fat-shattering dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FatDim {
    pub dim: i64,
    pub boundary: Boundary,
}

/// Searches `d = dmin, dmin + dstep, ..` up to `dmax` for the first size `shatters` rejects.
///
/// # Returns
/// `d - dstep` for the first rejected `d`, or `dmax` if none is. The returned `Boundary` tells
/// these cases apart from a rejection at `dmin`, where `dmin - dstep` is only a sentinel.
pub fn search_dim<O>(dmin: usize, dmax: usize, dstep: usize, mut shatters: O) -> Result<FatDim>
where
    O: FnMut(usize) -> Result<bool>,
{
    if dmin == 0 {
        return Err(CapacityErr::InvalidRange("dmin must be at least 1".into()));
    }
    if dstep == 0 {
        return Err(CapacityErr::InvalidRange("dstep must be at least 1".into()));
    }
    if dmax < dmin {
        return Err(CapacityErr::InvalidRange(format!(
            "dmax ({dmax}) is smaller than dmin ({dmin})"
        )));
    }

    for d in (dmin..=dmax).step_by(dstep) {
        if shatters(d)? {
            debug!("d = {d} shattered");
            continue;
        }

        let dim = d as i64 - dstep as i64;
        if d == dmin {
            warn!("stopped at dmin = {dmin}");
            return Ok(FatDim {
                dim,
                boundary: Boundary::BelowMin,
            });
        }

        info!("fat-shattering dimension estimate: {dim}");
        return Ok(FatDim {
            dim,
            boundary: Boundary::Exact,
        });
    }

    warn!("reached dmax = {dmax}");
    Ok(FatDim {
        dim: dmax as i64,
        boundary: Boundary::ReachedMax,
    })
}

/// The fat-shattering dimension estimator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FatShattering {
    pub dmin: usize,
    pub dmax: usize,
    pub dstep: usize,
    pub gamma: f64,
    pub start: StartPolicy,
}

impl FatShattering {
    pub fn new(dmin: usize, dmax: usize, gamma: f64) -> Self {
        Self {
            dmin,
            dmax,
            dstep: 1,
            gamma,
            start: StartPolicy::default(),
        }
    }

    pub fn dstep(mut self, dstep: usize) -> Self {
        self.dstep = dstep;
        self
    }

    pub fn start(mut self, start: StartPolicy) -> Self {
        self.start = start;
        self
    }

    /// Estimates the fat-shattering dimension of `model`, drawing a fresh instance from
    /// `datagen` for every size. With `StartPolicy::Cold` every size starts from the parameters
    /// the model had on entry.
    pub fn estimate<M, G, F>(&self, model: &mut M, datagen: &mut G, fitter: &mut F) -> Result<FatDim>
    where
        M: Model,
        G: InstanceGen,
        F: Fitter,
    {
        let checker = ShatterChecker::new(self.gamma, self.start);
        let initial = model.params().to_vec();

        search_dim(self.dmin, self.dmax, self.dstep, |d| {
            let instance = datagen.gen_instance(d)?;
            if self.start == StartPolicy::Cold {
                model.set_params(&initial)?;
            }
            checker.check(model, &instance, fitter)
        })
    }
}

/// Estimates the fat-shattering dimension of `model` with margin `gamma`, starting every fit
/// from the parameters the model had when the search began.
///
/// # Returns
/// An error if the range is invalid (`dmin` or `dstep` zero, `dmax < dmin`) or if the model
/// fails to fit.
pub fn fat_shattering_dim<M, G, F>(
    model: &mut M,
    datagen: &mut G,
    fitter: &mut F,
    dmin: usize,
    dmax: usize,
    gamma: f64,
    dstep: usize,
) -> Result<FatDim>
where
    M: Model,
    G: InstanceGen,
    F: Fitter,
{
    FatShattering::new(dmin, dmax, gamma)
        .dstep(dstep)
        .estimate(model, datagen, fitter)
}
