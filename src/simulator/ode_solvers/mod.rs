use eyre::{eyre, Result};
use ode_solvers::{dop_shared::OutputType, DVector, Dopri5, Rk4};

use crate::{
    model::Compartmental,
    routines::settings::{Method, Solver},
};

type State = DVector<f64>;
type Time = f64;

/// Output times within this fraction of `step` from `t_end` are reported as `t_end`
const END_TOLERANCE: f64 = 1e-6;

/// Adapter between a [Compartmental] model and the `ode_solvers` system trait
#[derive(Debug, Clone)]
struct Model<'a, M> {
    model: &'a M,
}

impl<M: Compartmental> ode_solvers::System<Time, State> for Model<'_, M> {
    #[inline(always)]
    fn system(&self, t: Time, y: &State, dy: &mut State) {
        self.model.derivative(t, y.as_slice(), dy.as_mut_slice());
    }
}

/// Integrate `model` from `solver.t0` to `solver.t_end`
///
/// Returns the output times and the state at each of them. The first output time is `t0` and the
/// last one is exactly `t_end`, also when the span is not a multiple of `step`.
pub fn integrate<M: Compartmental>(
    model: &M,
    y0: &[f64],
    solver: &Solver,
) -> Result<(Vec<Time>, Vec<Vec<f64>>)> {
    if solver.t_end <= solver.t0 {
        return Ok((vec![solver.t0], vec![y0.to_vec()]));
    }

    let system = Model { model };
    let x = State::from_vec(y0.to_vec());

    let (mut times, mut states) = match solver.method {
        Method::Rk4 => {
            let mut stepper = Rk4::new(system, solver.t0, x, solver.t_end, solver.step);
            stepper
                .integrate()
                .map_err(|e| eyre!("RK4 integration failed: {:?}", e))?;
            (stepper.x_out().to_vec(), stepper.y_out().to_vec())
        }
        Method::Dopri5 => {
            let mut stepper = Dopri5::new(
                system,
                solver.t0,
                solver.t_end,
                solver.step,
                x,
                solver.rtol,
                solver.atol,
            );
            stepper
                .integrate()
                .map_err(|e| eyre!("Dopri5 integration failed: {:?}", e))?;
            (stepper.x_out().to_vec(), stepper.y_out().to_vec())
        }
    };

    // RK4 rounds the number of steps up and can overshoot
    let tolerance = END_TOLERANCE * solver.step;
    let keep = times
        .iter()
        .take_while(|&&t| t <= solver.t_end + tolerance)
        .count();
    times.truncate(keep);
    states.truncate(keep);

    let (Some(&last_time), Some(last_state)) = (times.last(), states.last()) else {
        return Err(eyre!(
            "{:?} integration produced no output before t = {}",
            solver.method,
            solver.t_end
        ));
    };

    if times.len() == 1 || solver.t_end - last_time > tolerance {
        let y_end = step_to_end(model, last_time, last_state.clone(), solver)?;
        times.push(solver.t_end);
        states.push(y_end);
    } else if let Some(t) = times.last_mut() {
        *t = solver.t_end;
    }

    let states = states
        .into_iter()
        .map(|y| y.as_slice().to_vec())
        .collect();
    Ok((times, states))
}

/// Advance `y` from `t` to `solver.t_end` in one stretch
///
/// RK4 takes a single shortened step. Dopri5 keeps its adaptive control and reports only the state
/// at the end of the stretch.
fn step_to_end<M: Compartmental>(
    model: &M,
    t: Time,
    y: State,
    solver: &Solver,
) -> Result<State> {
    let system = Model { model };
    let span = solver.t_end - t;
    let y_end = match solver.method {
        Method::Rk4 => {
            let mut stepper = Rk4::new(system, t, y, solver.t_end, span);
            stepper
                .integrate()
                .map_err(|e| eyre!("RK4 integration failed near t = {}: {:?}", t, e))?;
            stepper.y_out().last().cloned()
        }
        Method::Dopri5 => {
            let mut stepper = Dopri5::from_param(
                system,
                t,
                solver.t_end,
                span,
                y,
                solver.rtol,
                solver.atol,
                0.9,
                0.04,
                0.2,
                10.0,
                span,
                0.0,
                100_000,
                1_000,
                OutputType::Sparse,
            );
            stepper
                .integrate()
                .map_err(|e| eyre!("Dopri5 integration failed near t = {}: {:?}", t, e))?;
            stepper.y_out().last().cloned()
        }
    };
    y_end.ok_or_else(|| eyre!("No state was produced at t = {}", solver.t_end))
}
