#[cfg(test)]
use crate::prelude::*;

const CONFIG: &str = "src/tests/config.toml";

#[test]
fn read_mandatory_settings() {
    let settings = read_settings(CONFIG).unwrap();
    assert_eq!(settings.config.model, ModelKind::Active);
    assert_eq!(settings.config.log_level, "debug");
    assert!(!settings.config.output);
    assert_eq!(settings.paths.output_folder, "outputs/active");
    assert!(settings.paths.log.is_none());
}

#[test]
fn read_solver() {
    let settings = read_settings(CONFIG).unwrap();
    assert_eq!(settings.solver.method, Method::Dopri5);
    assert_eq!(settings.solver.t0, 0.0);
    assert_eq!(settings.solver.t_end, 60.0);
    assert_eq!(settings.solver.step, 0.5);
    assert_eq!(settings.solver.rtol, 1e-8);
}

#[test]
fn read_named_parameters() {
    let settings = read_settings(CONFIG).unwrap();
    let section = settings.active.unwrap();
    assert_eq!(section.parameters.q_v2, 0.05);
    assert_eq!(section.parameters.epsilon_2, 0.9);
    assert_eq!(section.parameters.n, 1000.0);
    assert_eq!(section.parameters.to_vec().len(), ActiveParams::NAMES.len());
}

#[test]
fn missing_compartments_default_to_zero() {
    let settings = read_settings(CONFIG).unwrap();
    let initial = settings.active.unwrap().initial;
    assert_eq!(initial.s, 990.0);
    assert_eq!(initial.s_v0, 0.0);
    assert_eq!(initial.r, 0.0);
    assert_eq!(initial.total(), 1000.0);
}

#[test]
fn read_sweep() {
    let settings = read_settings(CONFIG).unwrap();
    assert!(settings.passive.is_none());
    let sweep = settings.sweep.unwrap();
    assert_eq!(sweep.parameter, "epsilon_2");
    assert_eq!(sweep.values, vec![0.5, 0.7, 0.9]);
}

#[test]
fn fixture_is_valid() {
    let settings = read_settings(CONFIG).unwrap();
    assert!(settings.validate().is_ok());
}

#[test]
fn run_fixture_without_output() {
    let settings = read_settings(CONFIG).unwrap();
    let trajectories = run_with(settings).unwrap();
    assert_eq!(trajectories.len(), 3);

    // Better protection after the second dose leaves fewer infections
    let recovered: Vec<f64> = trajectories
        .iter()
        .map(|t| t.column("r").unwrap()[t.len() - 1])
        .collect();
    assert!(recovered[0] > recovered[1]);
    assert!(recovered[1] > recovered[2]);

    for trajectory in &trajectories {
        assert!(trajectory.max_abs_population_drift() < 1e-6);
    }
}
