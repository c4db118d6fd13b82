pub mod ode_solvers;

use std::path::Path;

use eyre::{ensure, Result, WrapErr};
use ndarray::{Array2, ArrayView1, Axis};

use crate::{model::Compartmental, routines::settings::Solver};

/// Output of a single integration run
///
/// `states` has one row per output time and one column per compartment.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    compartments: Vec<String>,
    times: Vec<f64>,
    states: Array2<f64>,
}

impl Trajectory {
    pub fn new(compartments: Vec<String>, times: Vec<f64>, states: Array2<f64>) -> Result<Self> {
        ensure!(
            states.nrows() == times.len(),
            "Trajectory has {} time points but {} state rows",
            times.len(),
            states.nrows()
        );
        ensure!(
            states.ncols() == compartments.len(),
            "Trajectory has {} compartments but {} state columns",
            compartments.len(),
            states.ncols()
        );
        Ok(Trajectory {
            compartments,
            times,
            states,
        })
    }

    pub fn compartments(&self) -> &[String] {
        &self.compartments
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn states(&self) -> &Array2<f64> {
        &self.states
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// State at the last output time
    pub fn final_state(&self) -> Option<ArrayView1<'_, f64>> {
        if self.is_empty() {
            return None;
        }
        Some(self.states.row(self.len() - 1))
    }

    /// Time course of a single compartment
    pub fn column(&self, name: &str) -> Option<ArrayView1<'_, f64>> {
        let index = self
            .compartments
            .iter()
            .position(|c| c.eq_ignore_ascii_case(name))?;
        Some(self.states.column(index))
    }

    /// Total population at every output time
    pub fn totals(&self) -> Vec<f64> {
        self.states.sum_axis(Axis(1)).to_vec()
    }

    /// Largest absolute deviation of the total population from its initial value
    pub fn max_abs_population_drift(&self) -> f64 {
        let totals = self.totals();
        let Some(first) = totals.first() else {
            return 0.0;
        };
        totals
            .iter()
            .map(|total| (total - first).abs())
            .fold(0.0, f64::max)
    }

    /// Write the trajectory as CSV, with a `time` column followed by one column per compartment
    pub fn write_csv(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(path)
            .wrap_err_with(|| format!("Unable to create {}", path.display()))?;

        let mut header = vec!["time".to_string()];
        header.extend(self.compartments.iter().cloned());
        writer.write_record(&header)?;

        for (time, row) in self.times.iter().zip(self.states.outer_iter()) {
            let mut record = vec![time.to_string()];
            record.extend(row.iter().map(|value| value.to_string()));
            writer.write_record(&record)?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Integrate a model from the initial state `y0`
///
/// Checks the shape of `y0` and the solver configuration, then delegates to [ode_solvers::integrate].
pub fn simulate<M: Compartmental>(model: &M, y0: &[f64], solver: &Solver) -> Result<Trajectory> {
    ensure!(
        y0.len() == model.nstates(),
        "Initial state has {} compartments, the model expects {} ({:?})",
        y0.len(),
        model.nstates(),
        M::COMPARTMENTS
    );
    solver.validate()?;

    tracing::debug!(
        "Integrating {} compartments from t = {} to t = {} with {:?}",
        model.nstates(),
        solver.t0,
        solver.t_end,
        solver.method
    );

    let (times, states) = self::ode_solvers::integrate(model, y0, solver)?;

    let nrows = states.len();
    let flat: Vec<f64> = states.into_iter().flatten().collect();
    let states = Array2::from_shape_vec((nrows, model.nstates()), flat)
        .wrap_err("Solver returned states of inconsistent length")?;

    let compartments = M::COMPARTMENTS.iter().map(|c| c.to_string()).collect();
    let trajectory = Trajectory::new(compartments, times, states)?;

    tracing::debug!(
        "Integration produced {} time points, population drift {:.3e}",
        trajectory.len(),
        trajectory.max_abs_population_drift()
    );
    Ok(trajectory)
}
