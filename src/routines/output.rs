use crate::routines::settings::{write_settings_to_file, Settings};
use crate::simulator::Trajectory;
use eyre::{Result, WrapErr};
use std::path::PathBuf;

/// Write the results of a run into `paths.output_folder`
///
/// The folder receives a `settings.json` echo of the settings that were used, and one CSV file per
/// trajectory, named by the accompanying string.
pub fn write_outputs(settings: &Settings, trajectories: &[(String, Trajectory)]) -> Result<()> {
    let folder = PathBuf::from(&settings.paths.output_folder);
    std::fs::create_dir_all(&folder)
        .wrap_err_with(|| format!("Unable to create output folder {}", folder.display()))?;

    write_settings_to_file(settings, &folder)?;
    for (name, trajectory) in trajectories {
        let path = folder.join(name);
        trajectory
            .write_csv(&path)
            .wrap_err_with(|| format!("Error while writing {}", path.display()))?;
    }
    tracing::info!("Output files were written to {}", folder.display());
    Ok(())
}
