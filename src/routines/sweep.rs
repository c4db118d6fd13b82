use eyre::{Result, WrapErr};
use rayon::prelude::*;

use crate::{
    model::ModelParameters,
    routines::settings::Solver,
    simulator::{simulate, Trajectory},
};

/// One run of a parameter sweep
#[derive(Debug, Clone)]
pub struct SweepResult {
    pub parameter: String,
    pub value: f64,
    pub trajectory: Trajectory,
}

/// Integrate one copy of the model per value of `parameter`
///
/// Runs are independent and execute on the rayon thread pool. The results keep the order of `values`.
/// Every variant is validated before it is integrated, and the first failing run aborts the sweep.
pub fn sweep<P: ModelParameters>(
    base: &P,
    parameter: &str,
    values: &[f64],
    y0: &[f64],
    solver: &Solver,
) -> Result<Vec<SweepResult>> {
    tracing::info!(
        "Sweeping '{}' over {} values",
        parameter,
        values.len()
    );

    values
        .par_iter()
        .map(|&value| {
            let mut params = base.clone();
            params.set(parameter, value)?;
            params
                .validate()
                .wrap_err_with(|| format!("Invalid parameters for {} = {}", parameter, value))?;

            let model = P::Model::from(params);
            let trajectory = simulate(&model, y0, solver)
                .wrap_err_with(|| format!("Integration failed for {} = {}", parameter, value))?;

            tracing::debug!("Finished run with {} = {}", parameter, value);
            Ok(SweepResult {
                parameter: parameter.to_string(),
                value,
                trajectory,
            })
        })
        .collect()
}
