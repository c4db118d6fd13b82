//! Compartmental models with active and passive immunisation
//!
//! Each model is exposed three ways:
//! - a named-field form ([ActiveParams::derivative], [PassiveParams::derivative]),
//! - a positional form following the usual `f(y, t, k)` integrator convention
//!   ([active_model], [passive_model]),
//! - a [Compartmental] implementation used by the integration driver in [crate::simulator].
//!
//! The models are autonomous: time is accepted everywhere but never enters the equations.
pub mod active;
pub mod passive;

pub use active::{active_model, ActiveModel, ActiveParams, ActiveState};
pub use passive::{passive_model, PassiveModel, PassiveParams, PassiveState};

use eyre::{ensure, Result};

/// Shared capability of every derivative function in this crate
///
/// The integration driver is generic over this trait, so either model can be
/// integrated, swept or benchmarked without changes to the driver.
pub trait Compartmental: Send + Sync {
    /// Compartment names, in state-vector order
    const COMPARTMENTS: &'static [&'static str];
    /// Parameter names, in parameter-vector order
    const PARAMETERS: &'static [&'static str];

    /// Evaluate the right-hand side at `(t, y)` and write it into `dy`
    ///
    /// `y` and `dy` must both hold [Compartmental::COMPARTMENTS]`.len()` values.
    fn derivative(&self, t: f64, y: &[f64], dy: &mut [f64]);

    fn nstates(&self) -> usize {
        Self::COMPARTMENTS.len()
    }
}

/// Named parameter record of a [Compartmental] model
///
/// Lets the driver layer build, modify and validate parameters without knowing which model it runs.
pub trait ModelParameters: Clone + Send + Sync {
    type Model: Compartmental + From<Self>;

    fn set(&mut self, name: &str, value: f64) -> Result<()>;
    fn validate(&self) -> Result<()>;
}

impl ModelParameters for ActiveParams {
    type Model = ActiveModel;

    fn set(&mut self, name: &str, value: f64) -> Result<()> {
        ActiveParams::set(self, name, value)
    }

    fn validate(&self) -> Result<()> {
        ActiveParams::validate(self)
    }
}

impl ModelParameters for PassiveParams {
    type Model = PassiveModel;

    fn set(&mut self, name: &str, value: f64) -> Result<()> {
        PassiveParams::set(self, name, value)
    }

    fn validate(&self) -> Result<()> {
        PassiveParams::validate(self)
    }
}

/// Frequency-dependent force of infection `(beta_s*I_s + beta_m*I_m) / N`
#[inline(always)]
pub(crate) fn force_of_infection(beta_s: f64, i_s: f64, beta_m: f64, i_m: f64, n: f64) -> f64 {
    (beta_s * i_s + beta_m * i_m) / n
}

/// Find the position of a named parameter or compartment
pub(crate) fn position(names: &[&str], name: &str) -> Result<usize> {
    names
        .iter()
        .position(|candidate| candidate.eq_ignore_ascii_case(name))
        .ok_or_else(|| eyre::eyre!("Unknown name '{}', expected one of {:?}", name, names))
}

pub(crate) fn check_len(kind: &str, values: &[f64], names: &[&str]) -> Result<()> {
    ensure!(
        values.len() == names.len(),
        "Expected {} {} values ({:?}), found {}",
        names.len(),
        kind,
        names,
        values.len()
    );
    Ok(())
}

pub(crate) fn check_rate(name: &str, value: f64) -> Result<()> {
    ensure!(
        value.is_finite() && value >= 0.0,
        "Rate parameter '{}' must be finite and non-negative, found {}",
        name,
        value
    );
    Ok(())
}

pub(crate) fn check_fraction(name: &str, value: f64) -> Result<()> {
    ensure!(
        (0.0..=1.0).contains(&value),
        "Parameter '{}' must lie in [0, 1], found {}",
        name,
        value
    );
    Ok(())
}

pub(crate) fn check_population(value: f64) -> Result<()> {
    ensure!(
        value.is_finite() && value > 0.0,
        "Total population N must be finite and positive, found {}",
        value
    );
    Ok(())
}

pub(crate) fn check_compartments(values: &[f64], names: &[&str]) -> Result<()> {
    for (value, name) in values.iter().zip(names) {
        ensure!(
            value.is_finite() && *value >= 0.0,
            "Compartment '{}' must be finite and non-negative, found {}",
            name,
            value
        );
    }
    Ok(())
}
