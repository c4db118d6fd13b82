//! SEIR model with two-dose active immunisation
//!
//! Susceptibles move through an unvaccinated -> dose 0 -> dose 1 -> dose 2 pipeline.
//! Dose 0 marks a vaccine that has been administered but has not yet induced immunity,
//! so it is exposed to the wild-type force of infection. Each later stage scales its
//! force of infection by `1 - epsilon_k`.
use super::{
    check_compartments, check_fraction, check_len, check_population, check_rate,
    force_of_infection, position, Compartmental,
};
use eyre::Result;
use serde_derive::{Deserialize, Serialize};

/// Compartments of the active immunisation model
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ActiveState {
    /// Susceptible, unvaccinated
    pub s: f64,
    /// Susceptible, vaccinated but not yet protected
    pub s_v0: f64,
    /// Susceptible after the first dose
    pub s_v1: f64,
    /// Susceptible after the second dose
    pub s_v2: f64,
    /// Exposed
    pub e: f64,
    /// Infectious, mild
    pub i_m: f64,
    /// Infectious, severe
    pub i_s: f64,
    /// Recovered
    pub r: f64,
}

impl ActiveState {
    pub const COMPARTMENTS: [&'static str; 8] =
        ["s", "s_v0", "s_v1", "s_v2", "e", "i_m", "i_s", "r"];

    /// Read a state from a slice in [ActiveState::COMPARTMENTS] order
    ///
    /// Panics if `y` holds fewer than 8 values.
    #[inline(always)]
    pub fn from_slice(y: &[f64]) -> Self {
        ActiveState {
            s: y[0],
            s_v0: y[1],
            s_v1: y[2],
            s_v2: y[3],
            e: y[4],
            i_m: y[5],
            i_s: y[6],
            r: y[7],
        }
    }

    /// Checked counterpart of [ActiveState::from_slice]
    pub fn try_from_slice(y: &[f64]) -> Result<Self> {
        check_len("state", y, &Self::COMPARTMENTS)?;
        Ok(Self::from_slice(y))
    }

    #[inline(always)]
    pub fn to_array(&self) -> [f64; 8] {
        [
            self.s, self.s_v0, self.s_v1, self.s_v2, self.e, self.i_m, self.i_s, self.r,
        ]
    }

    pub fn to_vec(&self) -> Vec<f64> {
        self.to_array().to_vec()
    }

    /// Write the state into `out` in [ActiveState::COMPARTMENTS] order
    #[inline(always)]
    pub fn write_to(&self, out: &mut [f64]) {
        out[..8].copy_from_slice(&self.to_array());
    }

    /// Sum over all compartments
    pub fn total(&self) -> f64 {
        self.to_array().iter().sum()
    }

    /// All compartments must be finite and non-negative
    pub fn validate(&self) -> Result<()> {
        check_compartments(&self.to_array(), &Self::COMPARTMENTS)
    }
}

/// Parameters of the active immunisation model
///
/// Positional order matches [ActiveParams::NAMES]. The last entry, `n`, is the total population.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct ActiveParams {
    /// Fraction of the vaccination capacity `c` applied per unit time
    pub q: f64,
    /// Rate from dose 0 to dose 1
    pub q_v1: f64,
    /// Rate from dose 1 to dose 2
    pub q_v2: f64,
    pub beta_m: f64,
    pub beta_v1m: f64,
    pub beta_v2m: f64,
    pub beta_s: f64,
    pub beta_v1s: f64,
    pub beta_v2s: f64,
    pub gamma_m: f64,
    pub gamma_s: f64,
    /// Efficacy of the first dose
    pub epsilon_1: f64,
    /// Efficacy of the second dose
    pub epsilon_2: f64,
    /// Vaccination capacity
    pub c: f64,
    /// Rate of progression from exposed to infectious
    pub a: f64,
    /// Probability that an infection is mild
    pub p: f64,
    /// Total population
    pub n: f64,
}

impl ActiveParams {
    pub const NAMES: [&'static str; 17] = [
        "q",
        "q_v1",
        "q_v2",
        "beta_m",
        "beta_v1m",
        "beta_v2m",
        "beta_s",
        "beta_v1s",
        "beta_v2s",
        "gamma_m",
        "gamma_s",
        "epsilon_1",
        "epsilon_2",
        "c",
        "a",
        "p",
        "n",
    ];

    /// Build the record from a positional parameter vector, checking its length once
    pub fn try_from_slice(k: &[f64]) -> Result<Self> {
        check_len("parameter", k, &Self::NAMES)?;
        Ok(Self::from_slice(k))
    }

    #[inline(always)]
    fn from_slice(k: &[f64]) -> Self {
        ActiveParams {
            q: k[0],
            q_v1: k[1],
            q_v2: k[2],
            beta_m: k[3],
            beta_v1m: k[4],
            beta_v2m: k[5],
            beta_s: k[6],
            beta_v1s: k[7],
            beta_v2s: k[8],
            gamma_m: k[9],
            gamma_s: k[10],
            epsilon_1: k[11],
            epsilon_2: k[12],
            c: k[13],
            a: k[14],
            p: k[15],
            n: k[16],
        }
    }

    pub fn to_vec(&self) -> Vec<f64> {
        vec![
            self.q,
            self.q_v1,
            self.q_v2,
            self.beta_m,
            self.beta_v1m,
            self.beta_v2m,
            self.beta_s,
            self.beta_v1s,
            self.beta_v2s,
            self.gamma_m,
            self.gamma_s,
            self.epsilon_1,
            self.epsilon_2,
            self.c,
            self.a,
            self.p,
            self.n,
        ]
    }

    pub fn get(&self, name: &str) -> Result<f64> {
        let index = position(&Self::NAMES, name)?;
        Ok(self.to_vec()[index])
    }

    /// Replace a single parameter by name
    pub fn set(&mut self, name: &str, value: f64) -> Result<()> {
        let index = position(&Self::NAMES, name)?;
        let mut values = self.to_vec();
        values[index] = value;
        *self = Self::from_slice(&values);
        Ok(())
    }

    /// Check the parameter ranges
    ///
    /// Rates must be non-negative, `p` and the efficacies must lie in `[0, 1]`, and `n` must be positive.
    /// The derivative itself never calls this.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in Self::NAMES.iter().zip(self.to_vec()) {
            match *name {
                "epsilon_1" | "epsilon_2" | "p" => check_fraction(name, value)?,
                "n" => check_population(value)?,
                _ => check_rate(name, value)?,
            }
        }
        Ok(())
    }

    /// Right-hand side of the model
    #[inline(always)]
    pub fn derivative(&self, y: &ActiveState) -> ActiveState {
        let force_wild = force_of_infection(self.beta_s, y.i_s, self.beta_m, y.i_m, self.n);
        let force_dose1 = (1.0 - self.epsilon_1)
            * force_of_infection(self.beta_v1s, y.i_s, self.beta_v1m, y.i_m, self.n);
        let force_dose2 = (1.0 - self.epsilon_2)
            * force_of_infection(self.beta_v2s, y.i_s, self.beta_v2m, y.i_m, self.n);
        let vaccination = self.q * self.c;

        ActiveState {
            s: -(vaccination + force_wild) * y.s,
            s_v0: vaccination * y.s - (self.q_v1 + force_wild) * y.s_v0,
            s_v1: self.q_v1 * y.s_v0 - (self.q_v2 + force_dose1) * y.s_v1,
            s_v2: self.q_v2 * y.s_v1 - force_dose2 * y.s_v2,
            e: force_wild * (y.s + y.s_v0) + force_dose1 * y.s_v1 + force_dose2 * y.s_v2
                - self.a * y.e,
            i_m: self.a * self.p * y.e - self.gamma_m * y.i_m,
            i_s: self.a * (1.0 - self.p) * y.e - self.gamma_s * y.i_s,
            r: self.gamma_m * y.i_m + self.gamma_s * y.i_s,
        }
    }
}

/// Positional derivative, `dy = f(y, t, k)`
///
/// `y` holds the 8 compartments in [ActiveState::COMPARTMENTS] order and `k` the 17 parameters in
/// [ActiveParams::NAMES] order. Nothing is validated: mis-sized slices panic and `N = 0`
/// produces non-finite values.
pub fn active_model(y: &[f64], _t: f64, k: &[f64]) -> Vec<f64> {
    let params = ActiveParams::from_slice(k);
    params.derivative(&ActiveState::from_slice(y)).to_vec()
}

/// [Compartmental] wrapper around [ActiveParams]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActiveModel {
    params: ActiveParams,
}

impl ActiveModel {
    pub fn new(params: ActiveParams) -> Self {
        ActiveModel { params }
    }

    pub fn params(&self) -> &ActiveParams {
        &self.params
    }
}

impl From<ActiveParams> for ActiveModel {
    fn from(params: ActiveParams) -> Self {
        ActiveModel::new(params)
    }
}

impl Compartmental for ActiveModel {
    const COMPARTMENTS: &'static [&'static str] = &ActiveState::COMPARTMENTS;
    const PARAMETERS: &'static [&'static str] = &ActiveParams::NAMES;

    #[inline(always)]
    fn derivative(&self, _t: f64, y: &[f64], dy: &mut [f64]) {
        self.params
            .derivative(&ActiveState::from_slice(y))
            .write_to(dy);
    }
}
