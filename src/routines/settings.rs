use config::Config as eConfig;
use eyre::{bail, ensure, Result, WrapErr};
use serde_derive::{Deserialize, Serialize};
use std::path::Path;

use crate::model::{ActiveParams, ActiveState, PassiveParams, PassiveState};

/// Settings for a simulation run
///
/// Read from a TOML file with [read_settings]. Every key can be overridden by an environment variable
/// prefixed with `IMMUNSIM_`, nested keys separated by `__`, e.g. `IMMUNSIM_SOLVER__T_END=200`.
#[derive(Debug, Deserialize, Clone, Serialize)]
pub struct Settings {
    pub config: Config,
    #[serde(default)]
    pub paths: Paths,
    pub solver: Solver,
    pub active: Option<ModelSection<ActiveParams, ActiveState>>,
    pub passive: Option<ModelSection<PassiveParams, PassiveState>>,
    pub sweep: Option<Sweep>,
}

#[derive(Debug, Deserialize, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    Active,
    Passive,
}

impl std::fmt::Display for ModelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelKind::Active => write!(f, "active"),
            ModelKind::Passive => write!(f, "passive"),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Serialize)]
pub struct Config {
    pub model: ModelKind,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_true")]
    pub output: bool,
}

#[derive(Debug, Deserialize, Clone, Serialize)]
pub struct Paths {
    pub log: Option<String>,
    #[serde(default = "default_output_folder")]
    pub output_folder: String,
}

impl Default for Paths {
    fn default() -> Self {
        Paths {
            log: None,
            output_folder: default_output_folder(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    /// Classic fixed-step Runge-Kutta
    Rk4,
    /// Adaptive Dormand-Prince 5(4)
    Dopri5,
}

/// Integrator configuration
///
/// For [Method::Rk4], `step` is the integration step. For [Method::Dopri5], it is the output interval,
/// while the internal step size is controlled by `rtol` and `atol`.
#[derive(Debug, Deserialize, Clone, Serialize, PartialEq)]
pub struct Solver {
    #[serde(default = "default_method")]
    pub method: Method,
    #[serde(default)]
    pub t0: f64,
    pub t_end: f64,
    #[serde(default = "default_step")]
    pub step: f64,
    #[serde(default = "default_tol")]
    pub rtol: f64,
    #[serde(default = "default_tol")]
    pub atol: f64,
}

impl Solver {
    pub fn rk4(t0: f64, t_end: f64, step: f64) -> Self {
        Solver {
            method: Method::Rk4,
            t0,
            t_end,
            step,
            rtol: default_tol(),
            atol: default_tol(),
        }
    }

    pub fn dopri5(t0: f64, t_end: f64, step: f64, rtol: f64, atol: f64) -> Self {
        Solver {
            method: Method::Dopri5,
            t0,
            t_end,
            step,
            rtol,
            atol,
        }
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.t0.is_finite() && self.t_end.is_finite(),
            "Integration bounds must be finite, found [{}, {}]",
            self.t0,
            self.t_end
        );
        ensure!(
            self.t_end >= self.t0,
            "t_end ({}) must not precede t0 ({})",
            self.t_end,
            self.t0
        );
        ensure!(
            self.step > 0.0,
            "The step size must be positive, found {}",
            self.step
        );
        if self.method == Method::Dopri5 {
            ensure!(
                self.rtol > 0.0 && self.atol > 0.0,
                "Tolerances must be positive, found rtol = {} and atol = {}",
                self.rtol,
                self.atol
            );
        }
        Ok(())
    }
}

/// Parameters and initial condition of one model
#[derive(Debug, Deserialize, Clone, Serialize, PartialEq)]
pub struct ModelSection<P, S> {
    pub parameters: P,
    pub initial: S,
}

impl ModelSection<ActiveParams, ActiveState> {
    pub fn validate(&self) -> Result<()> {
        self.parameters
            .validate()
            .wrap_err("Invalid [active.parameters]")?;
        self.initial.validate().wrap_err("Invalid [active.initial]")?;
        check_total(self.initial.total(), self.parameters.n);
        Ok(())
    }
}

impl ModelSection<PassiveParams, PassiveState> {
    pub fn validate(&self) -> Result<()> {
        self.parameters
            .validate()
            .wrap_err("Invalid [passive.parameters]")?;
        self.initial.validate().wrap_err("Invalid [passive.initial]")?;
        check_total(self.initial.total(), self.parameters.n);
        Ok(())
    }
}

/// The force of infection divides by `n`, which is expected to match the initial population
fn check_total(total: f64, n: f64) {
    if ((total - n) / n).abs() > 1e-6 {
        tracing::warn!(
            "The initial compartments sum to {}, but the population parameter n is {}",
            total,
            n
        );
    }
}

/// Repeat the run once per value of a single named parameter
#[derive(Debug, Deserialize, Clone, Serialize, PartialEq)]
pub struct Sweep {
    pub parameter: String,
    pub values: Vec<f64>,
}

impl Settings {
    /// Check the settings before running
    ///
    /// The section matching `config.model` must be present and valid, and a sweep must name
    /// a parameter of that model.
    pub fn validate(&self) -> Result<()> {
        self.solver.validate().wrap_err("Invalid [solver]")?;

        let names: &[&str] = match self.config.model {
            ModelKind::Active => {
                let Some(section) = &self.active else {
                    bail!("config.model is 'active' but the [active] section is missing");
                };
                section.validate()?;
                &ActiveParams::NAMES
            }
            ModelKind::Passive => {
                let Some(section) = &self.passive else {
                    bail!("config.model is 'passive' but the [passive] section is missing");
                };
                section.validate()?;
                &PassiveParams::NAMES
            }
        };

        if let Some(sweep) = &self.sweep {
            ensure!(
                !sweep.values.is_empty(),
                "[sweep] must list at least one value"
            );
            ensure!(
                names.iter().any(|n| n.eq_ignore_ascii_case(&sweep.parameter)),
                "Cannot sweep over '{}', the {} model has parameters {:?}",
                sweep.parameter,
                self.config.model,
                names
            );
        }
        Ok(())
    }

    /// Parse settings from a TOML string, without environment overrides
    pub fn from_toml_str(contents: &str) -> Result<Settings> {
        let parsed = eConfig::builder()
            .add_source(config::File::from_str(contents, config::FileFormat::Toml))
            .build()?;
        let settings: Settings = parsed.try_deserialize()?;
        Ok(settings)
    }
}

pub fn read_settings(path: impl AsRef<Path>) -> Result<Settings> {
    let settings_path = path.as_ref();

    let parsed = eConfig::builder()
        .add_source(config::File::from(settings_path).format(config::FileFormat::Toml))
        .add_source(
            config::Environment::with_prefix("IMMUNSIM")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()
        .wrap_err_with(|| format!("Unable to read settings from {}", settings_path.display()))?;

    let settings: Settings = parsed.try_deserialize()?;
    Ok(settings)
}

/// Echo the settings as pretty JSON into `folder/settings.json`
pub fn write_settings_to_file(settings: &Settings, folder: impl AsRef<Path>) -> Result<()> {
    let serialized = serde_json::to_string_pretty(settings)?;

    let file_path = folder.as_ref().join("settings.json");
    std::fs::write(&file_path, serialized)
        .wrap_err_with(|| format!("Unable to write {}", file_path.display()))?;
    Ok(())
}

// *********************************
// Default values for deserializing
// *********************************
fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_output_folder() -> String {
    "outputs".to_string()
}

fn default_method() -> Method {
    Method::Rk4
}

fn default_step() -> f64 {
    0.1
}

fn default_tol() -> f64 {
    1e-6
}
