//! Derivative functions and an integration driver for two SEIR models with immunisation
//!
//! - The **active** model follows susceptibles through a two-dose vaccination pipeline
//!   (`S, S_v0, S_v1, S_v2, E, I_m, I_s, R`).
//! - The **passive** model has a single prophylaxis stage (`S, S_s, E, I_m, I_s, R`).
//!
//! Both right-hand sides are pure functions, see [model]. The remaining modules drive them:
//! [simulator] integrates a model with `ode_solvers`, [routines::settings] reads a TOML configuration,
//! [routines::sweep] runs parameter sweeps in parallel and [entrypoints] ties everything together.
pub mod entrypoints;
pub mod logger;
pub mod model;
pub mod routines {
    pub mod output;
    pub mod settings;
    pub mod sweep;
}
pub mod simulator;

pub mod prelude {
    pub use crate::entrypoints::{run, run_with};
    pub use crate::model::{
        active_model, passive_model, ActiveModel, ActiveParams, ActiveState, Compartmental,
        ModelParameters, PassiveModel, PassiveParams, PassiveState,
    };
    pub use crate::routines::settings::{
        read_settings, Method, ModelKind, ModelSection, Settings, Solver, Sweep,
    };
    pub use crate::routines::sweep::{sweep, SweepResult};
    pub use crate::simulator::{simulate, Trajectory};
}

//Tests
#[cfg(test)]
mod tests;
