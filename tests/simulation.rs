use eyre::Result;
use immunsim::prelude::*;

fn active() -> ActiveParams {
    ActiveParams {
        q: 0.01,
        q_v1: 0.1,
        q_v2: 0.05,
        beta_m: 0.5,
        beta_v1m: 0.5,
        beta_v2m: 0.5,
        beta_s: 0.3,
        beta_v1s: 0.3,
        beta_v2s: 0.3,
        gamma_m: 0.1,
        gamma_s: 0.07,
        epsilon_1: 0.6,
        epsilon_2: 0.9,
        c: 1.0,
        a: 0.2,
        p: 0.8,
        n: 1000.0,
    }
}

fn passive() -> PassiveParams {
    PassiveParams {
        q: 0.02,
        beta_m: 0.5,
        beta_m2: 0.5,
        beta_s: 0.3,
        beta_s2: 0.3,
        gamma_m: 0.1,
        gamma_s: 0.07,
        epsilon_ss: 0.7,
        c: 1.0,
        a: 0.2,
        p: 0.8,
        n: 1000.0,
    }
}

fn active_y0() -> Vec<f64> {
    ActiveState {
        s: 990.0,
        i_m: 8.0,
        i_s: 2.0,
        ..Default::default()
    }
    .to_vec()
}

fn passive_y0() -> Vec<f64> {
    PassiveState {
        s: 990.0,
        i_m: 8.0,
        i_s: 2.0,
        ..Default::default()
    }
    .to_vec()
}

#[test]
fn rk4_conserves_population() -> Result<()> {
    let model = ActiveModel::new(active());
    let trajectory = simulate(&model, &active_y0(), &Solver::rk4(0.0, 100.0, 0.1))?;

    assert_eq!(trajectory.compartments().len(), 8);
    assert!(trajectory.len() > 900);
    assert!(trajectory.max_abs_population_drift() < 1e-8);
    Ok(())
}

#[test]
fn dopri5_conserves_population() -> Result<()> {
    let model = PassiveModel::new(passive());
    let solver = Solver::dopri5(0.0, 100.0, 1.0, 1e-8, 1e-8);
    let trajectory = simulate(&model, &passive_y0(), &solver)?;

    assert_eq!(trajectory.compartments()[1], "s_s");
    assert!(trajectory.max_abs_population_drift() < 1e-6);
    Ok(())
}

#[test]
fn solvers_agree() -> Result<()> {
    let model = ActiveModel::new(active());
    let rk4 = simulate(&model, &active_y0(), &Solver::rk4(0.0, 50.0, 0.015625))?;
    let dopri5 = simulate(
        &model,
        &active_y0(),
        &Solver::dopri5(0.0, 50.0, 1.0, 1e-10, 1e-10),
    )?;

    let a = rk4.final_state().unwrap();
    let b = dopri5.final_state().unwrap();
    for (x, y) in a.iter().zip(b.iter()) {
        assert!((x - y).abs() < 1e-3, "{} != {}", x, y);
    }
    Ok(())
}

#[test]
fn rk4_stops_at_t_end_when_the_span_is_not_a_multiple_of_step() -> Result<()> {
    let model = ActiveModel::new(active());
    let trajectory = simulate(&model, &active_y0(), &Solver::rk4(0.0, 1.05, 0.1))?;

    let times = trajectory.times();
    assert_eq!(times.len(), 12);
    assert_eq!(times[0], 0.0);
    assert_eq!(times[times.len() - 1], 1.05);
    assert!(times.windows(2).all(|w| w[0] < w[1]));

    let reference = simulate(
        &model,
        &active_y0(),
        &Solver::dopri5(0.0, 1.05, 0.05, 1e-10, 1e-10),
    )?;
    let a = trajectory.final_state().unwrap();
    let b = reference.final_state().unwrap();
    for (x, y) in a.iter().zip(b.iter()) {
        assert!((x - y).abs() < 1e-2, "{} != {}", x, y);
    }
    Ok(())
}

#[test]
fn rk4_step_longer_than_the_span() -> Result<()> {
    let model = PassiveModel::new(passive());
    let trajectory = simulate(&model, &passive_y0(), &Solver::rk4(0.0, 0.5, 1.0))?;
    assert_eq!(trajectory.times(), &[0.0, 0.5]);

    let exact = simulate(&model, &passive_y0(), &Solver::rk4(0.0, 1.0, 0.1))?;
    assert_eq!(exact.times()[exact.len() - 1], 1.0);
    assert_eq!(exact.len(), 11);
    Ok(())
}

#[test]
fn dopri5_reports_the_state_at_t_end() -> Result<()> {
    let model = ActiveModel::new(active());
    let solver = Solver::dopri5(0.0, 10.5, 1.0, 1e-8, 1e-8);
    let trajectory = simulate(&model, &active_y0(), &solver)?;

    let times = trajectory.times();
    assert_eq!(times.len(), 12);
    assert_eq!(times[times.len() - 2], 10.0);
    assert_eq!(times[times.len() - 1], 10.5);
    assert!(trajectory.max_abs_population_drift() < 1e-6);

    let reference = simulate(&model, &active_y0(), &Solver::rk4(0.0, 10.5, 0.015625))?;
    let a = trajectory.final_state().unwrap();
    let b = reference.final_state().unwrap();
    for (x, y) in a.iter().zip(b.iter()) {
        assert!((x - y).abs() < 1e-3, "{} != {}", x, y);
    }
    Ok(())
}

#[test]
fn zero_length_span_returns_the_initial_state() -> Result<()> {
    let model = ActiveModel::new(active());
    for solver in [
        Solver::rk4(5.0, 5.0, 0.1),
        Solver::dopri5(5.0, 5.0, 1.0, 1e-6, 1e-6),
    ] {
        let trajectory = simulate(&model, &active_y0(), &solver)?;
        assert_eq!(trajectory.times(), &[5.0]);
        assert_eq!(trajectory.final_state().unwrap().to_vec(), active_y0());
    }
    Ok(())
}

#[test]
fn compartments_stay_non_negative() -> Result<()> {
    let model = ActiveModel::new(active());
    let trajectory = simulate(&model, &active_y0(), &Solver::rk4(0.0, 200.0, 0.1))?;
    assert!(trajectory.states().iter().all(|value| *value > -1e-9));
    Ok(())
}

#[test]
fn disease_free_start_stays_disease_free() -> Result<()> {
    let model = PassiveModel::new(passive());
    let y0 = PassiveState {
        s: 1000.0,
        ..Default::default()
    }
    .to_vec();
    let trajectory = simulate(&model, &y0, &Solver::rk4(0.0, 30.0, 0.5))?;

    for name in ["e", "i_m", "i_s", "r"] {
        assert!(trajectory.column(name).unwrap().iter().all(|v| *v == 0.0));
    }
    // Prophylaxis moves susceptibles into S_s
    let s_s = trajectory.column("s_s").unwrap();
    assert!(s_s[s_s.len() - 1] > 0.0);
    Ok(())
}

#[test]
fn prophylaxis_reduces_the_epidemic() -> Result<()> {
    let solver = Solver::rk4(0.0, 150.0, 0.1);

    let mut untreated = passive();
    untreated.q = 0.0;
    let baseline = simulate(&PassiveModel::new(untreated), &passive_y0(), &solver)?;
    let treated = simulate(&PassiveModel::new(passive()), &passive_y0(), &solver)?;

    let recovered = |t: &Trajectory| t.column("r").unwrap()[t.len() - 1];
    assert!(recovered(&treated) < recovered(&baseline));
    Ok(())
}

#[test]
fn wrong_initial_state_length_is_rejected() {
    let model = ActiveModel::new(active());
    let result = simulate(&model, &passive_y0(), &Solver::rk4(0.0, 10.0, 0.1));
    assert!(result.is_err());
}

#[test]
fn invalid_solver_is_rejected() {
    let model = ActiveModel::new(active());
    assert!(simulate(&model, &active_y0(), &Solver::rk4(10.0, 0.0, 0.1)).is_err());
    assert!(simulate(&model, &active_y0(), &Solver::rk4(0.0, 10.0, 0.0)).is_err());
    assert!(simulate(
        &model,
        &active_y0(),
        &Solver::dopri5(0.0, 10.0, 0.1, 0.0, 1e-6)
    )
    .is_err());
}

#[test]
fn models_can_be_integrated_concurrently() -> Result<()> {
    let handles: Vec<_> = (0..4)
        .map(|i| {
            std::thread::spawn(move || {
                let mut params = active();
                params.q = 0.01 * i as f64;
                simulate(
                    &ActiveModel::new(params),
                    &active_y0(),
                    &Solver::rk4(0.0, 20.0, 0.1),
                )
            })
        })
        .collect();

    for handle in handles {
        let trajectory = handle.join().expect("integration thread panicked")?;
        assert!(trajectory.max_abs_population_drift() < 1e-8);
    }
    Ok(())
}
