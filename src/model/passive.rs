//! SEIR model with passive immunisation (prophylaxis)
//!
//! A single protected stage `S_s` replaces the dose pipeline of [super::active]. Protected
//! susceptibles face their own transmission rates, scaled by `1 - epsilon_ss`.
use super::{
    check_compartments, check_fraction, check_len, check_population, check_rate,
    force_of_infection, position, Compartmental,
};
use eyre::Result;
use serde_derive::{Deserialize, Serialize};

/// Compartments of the passive immunisation model
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct PassiveState {
    pub s: f64,
    /// Susceptible under prophylaxis
    pub s_s: f64,
    pub e: f64,
    pub i_m: f64,
    pub i_s: f64,
    pub r: f64,
}

impl PassiveState {
    pub const COMPARTMENTS: [&'static str; 6] = ["s", "s_s", "e", "i_m", "i_s", "r"];

    /// Panics if `y` holds fewer than 6 values.
    #[inline(always)]
    pub fn from_slice(y: &[f64]) -> Self {
        PassiveState {
            s: y[0],
            s_s: y[1],
            e: y[2],
            i_m: y[3],
            i_s: y[4],
            r: y[5],
        }
    }

    pub fn try_from_slice(y: &[f64]) -> Result<Self> {
        check_len("state", y, &Self::COMPARTMENTS)?;
        Ok(Self::from_slice(y))
    }

    #[inline(always)]
    pub fn to_array(&self) -> [f64; 6] {
        [self.s, self.s_s, self.e, self.i_m, self.i_s, self.r]
    }

    pub fn to_vec(&self) -> Vec<f64> {
        self.to_array().to_vec()
    }

    #[inline(always)]
    pub fn write_to(&self, out: &mut [f64]) {
        out[..6].copy_from_slice(&self.to_array());
    }

    pub fn total(&self) -> f64 {
        self.to_array().iter().sum()
    }

    pub fn validate(&self) -> Result<()> {
        check_compartments(&self.to_array(), &Self::COMPARTMENTS)
    }
}

/// Parameters of the passive immunisation model, positional order in [PassiveParams::NAMES]
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct PassiveParams {
    pub q: f64,
    pub beta_m: f64,
    /// Mild transmission rate towards protected susceptibles
    pub beta_m2: f64,
    pub beta_s: f64,
    /// Severe transmission rate towards protected susceptibles
    pub beta_s2: f64,
    pub gamma_m: f64,
    pub gamma_s: f64,
    /// Efficacy of the prophylaxis
    pub epsilon_ss: f64,
    pub c: f64,
    pub a: f64,
    pub p: f64,
    pub n: f64,
}

impl PassiveParams {
    pub const NAMES: [&'static str; 12] = [
        "q",
        "beta_m",
        "beta_m2",
        "beta_s",
        "beta_s2",
        "gamma_m",
        "gamma_s",
        "epsilon_ss",
        "c",
        "a",
        "p",
        "n",
    ];

    pub fn try_from_slice(k: &[f64]) -> Result<Self> {
        check_len("parameter", k, &Self::NAMES)?;
        Ok(Self::from_slice(k))
    }

    #[inline(always)]
    fn from_slice(k: &[f64]) -> Self {
        PassiveParams {
            q: k[0],
            beta_m: k[1],
            beta_m2: k[2],
            beta_s: k[3],
            beta_s2: k[4],
            gamma_m: k[5],
            gamma_s: k[6],
            epsilon_ss: k[7],
            c: k[8],
            a: k[9],
            p: k[10],
            n: k[11],
        }
    }

    pub fn to_vec(&self) -> Vec<f64> {
        vec![
            self.q,
            self.beta_m,
            self.beta_m2,
            self.beta_s,
            self.beta_s2,
            self.gamma_m,
            self.gamma_s,
            self.epsilon_ss,
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

    pub fn set(&mut self, name: &str, value: f64) -> Result<()> {
        let index = position(&Self::NAMES, name)?;
        let mut values = self.to_vec();
        values[index] = value;
        *self = Self::from_slice(&values);
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in Self::NAMES.iter().zip(self.to_vec()) {
            match *name {
                "epsilon_ss" | "p" => check_fraction(name, value)?,
                "n" => check_population(value)?,
                _ => check_rate(name, value)?,
            }
        }
        Ok(())
    }

    #[inline(always)]
    pub fn derivative(&self, y: &PassiveState) -> PassiveState {
        let force_wild = force_of_infection(self.beta_s, y.i_s, self.beta_m, y.i_m, self.n);
        let force_prop = (1.0 - self.epsilon_ss)
            * force_of_infection(self.beta_s2, y.i_s, self.beta_m2, y.i_m, self.n);
        let prophylaxis = self.q * self.c;

        PassiveState {
            s: -(prophylaxis + force_wild) * y.s,
            s_s: prophylaxis * y.s - force_prop * y.s_s,
            e: force_wild * y.s + force_prop * y.s_s - self.a * y.e,
            i_m: self.a * self.p * y.e - self.gamma_m * y.i_m,
            i_s: self.a * (1.0 - self.p) * y.e - self.gamma_s * y.i_s,
            r: self.gamma_m * y.i_m + self.gamma_s * y.i_s,
        }
    }
}

/// Positional derivative, `dy = f(y, t, k)`, with 6 compartments and 12 parameters
///
/// Same caller contract as [super::active_model].
pub fn passive_model(y: &[f64], _t: f64, k: &[f64]) -> Vec<f64> {
    let params = PassiveParams::from_slice(k);
    params.derivative(&PassiveState::from_slice(y)).to_vec()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PassiveModel {
    params: PassiveParams,
}

impl PassiveModel {
    pub fn new(params: PassiveParams) -> Self {
        PassiveModel { params }
    }

    pub fn params(&self) -> &PassiveParams {
        &self.params
    }
}

impl From<PassiveParams> for PassiveModel {
    fn from(params: PassiveParams) -> Self {
        PassiveModel::new(params)
    }
}

impl Compartmental for PassiveModel {
    const COMPARTMENTS: &'static [&'static str] = &PassiveState::COMPARTMENTS;
    const PARAMETERS: &'static [&'static str] = &PassiveParams::NAMES;

    #[inline(always)]
    fn derivative(&self, _t: f64, y: &[f64], dy: &mut [f64]) {
        self.params
            .derivative(&PassiveState::from_slice(y))
            .write_to(dy);
    }
}
