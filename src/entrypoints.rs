use crate::logger;
use crate::model::{Compartmental, ModelParameters};
use crate::routines::output::write_outputs;
use crate::routines::settings::{read_settings, ModelKind, Settings};
use crate::routines::sweep::sweep;
use crate::simulator::{simulate, Trajectory};

use eyre::{eyre, Result};
use std::path::Path;
use std::time::Instant;

/// Primary entrypoint
///
/// Reads the settings from a TOML configuration file (see [crate::routines::settings]), configures logging
/// and runs the simulation with [run_with].
pub fn run(settings_path: impl AsRef<Path>) -> Result<Vec<Trajectory>> {
    let settings = read_settings(settings_path)?;
    logger::setup_log(&settings)?;
    tracing::info!("Starting immunsim");
    run_with(settings)
}

/// Alternative entrypoint, primarily meant for third-party libraries
///
/// Takes parsed [Settings] and does not configure logging. Output files are written if `config.output`
/// is set. Returns one trajectory, or one per value when a sweep is configured.
pub fn run_with(settings: Settings) -> Result<Vec<Trajectory>> {
    let now = Instant::now();
    settings.validate()?;

    tracing::info!(
        "Running the {} model from t = {} to t = {} with {:?}",
        settings.config.model,
        settings.solver.t0,
        settings.solver.t_end,
        settings.solver.method
    );

    let trajectories = match settings.config.model {
        ModelKind::Active => {
            let section = settings
                .active
                .as_ref()
                .ok_or_else(|| eyre!("Missing [active] section"))?;
            execute(&settings, &section.parameters, &section.initial.to_vec())?
        }
        ModelKind::Passive => {
            let section = settings
                .passive
                .as_ref()
                .ok_or_else(|| eyre!("Missing [passive] section"))?;
            execute(&settings, &section.parameters, &section.initial.to_vec())?
        }
    };

    if settings.config.output {
        write_outputs(&settings, &trajectories)?;
    } else {
        tracing::info!("Output files will not be written - set `output = true` in the configuration file to enable output files");
    }

    tracing::info!("Program complete after {:.2?}", now.elapsed());
    Ok(trajectories
        .into_iter()
        .map(|(_, trajectory)| trajectory)
        .collect())
}

fn execute<P: ModelParameters>(
    settings: &Settings,
    parameters: &P,
    y0: &[f64],
) -> Result<Vec<(String, Trajectory)>> {
    match &settings.sweep {
        Some(config) => {
            let results = sweep(parameters, &config.parameter, &config.values, y0, &settings.solver)?;
            Ok(results
                .into_iter()
                .enumerate()
                .map(|(index, result)| {
                    tracing::info!(
                        "Run {} ({} = {}): population drift {:.3e}",
                        index,
                        result.parameter,
                        result.value,
                        result.trajectory.max_abs_population_drift()
                    );
                    let name = format!(
                        "trajectory_{}_{}_{}.csv",
                        index, result.parameter, result.value
                    );
                    (name, result.trajectory)
                })
                .collect())
        }
        None => {
            let model = P::Model::from(parameters.clone());
            let trajectory = simulate(&model, y0, &settings.solver)?;
            tracing::info!(
                "Integrated {} compartments over {} time points, population drift {:.3e}",
                model.nstates(),
                trajectory.len(),
                trajectory.max_abs_population_drift()
            );
            Ok(vec![("trajectory.csv".to_string(), trajectory)])
        }
    }
}
