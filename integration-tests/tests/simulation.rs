use approx::assert_relative_eq;
use integration_tests::coarse_config;
use uom::si::{
    electric_potential::volt,
    f64::{ElectricPotential, Time},
    time::second,
};
use voltaic_models::Family;
use voltaic_sim::{ResolutionSweep, Simulation, SimulationConfig, relative_error};
use voltaic_solvers::transient::Status;

#[test]
fn spm_and_dfn_agree_at_low_rate() {
    let mut config = coarse_config();
    config.c_rate = Some(0.1);
    let t_eval = [0.0, 0.01, 0.02, 0.03];

    let spm = Simulation::new(Family::Spm, &[], config.clone()).unwrap().solve(&t_eval).unwrap();
    let dfn = Simulation::new(Family::Dfn, &[], config).unwrap().solve(&t_eval).unwrap();
    assert_eq!(*spm.status(), Status::Complete);
    assert_eq!(*dfn.status(), Status::Complete);

    let spm = spm.variable("Terminal voltage [V]").unwrap();
    let dfn = dfn.variable("Terminal voltage [V]").unwrap();
    let error = relative_error(
        &dfn.series().unwrap().to_vec(),
        &spm.series().unwrap().to_vec(),
    )
    .unwrap();
    assert!(error < 0.01, "relative error {error}");
}

#[test]
fn discharge_stops_at_lower_cutoff() {
    let mut config = coarse_config();
    config.c_rate = Some(2.0);
    let free = Simulation::new(Family::Spm, &[], config.clone()).unwrap();
    let free = free.solve_until(Time::new::<second>(360.0), 11).unwrap();
    let voltage = free.variable("Terminal voltage [V]").unwrap();
    let cutoff = voltage.series().unwrap()[5];

    config.lower_cutoff = Some(ElectricPotential::new::<volt>(cutoff));
    let simulation = Simulation::new(Family::Spm, &[], config).unwrap();
    let solution = simulation.solve_until(Time::new::<second>(360.0), 11).unwrap();

    assert_eq!(*solution.status(), Status::Event("Minimum voltage".to_owned()));
    let voltage = solution.variable("Terminal voltage [V]").unwrap();
    let last = *voltage.series().unwrap().last().unwrap();
    assert_relative_eq!(last, cutoff, epsilon = 1e-3);
    assert!(solution.times().last().unwrap().get::<second>() < 360.0);
}

#[test]
fn solution_profiles_interpolate_in_time() {
    let simulation = Simulation::new(Family::Dfn, &[], coarse_config()).unwrap();
    let solution = simulation.solve(&[0.0, 0.01, 0.02]).unwrap();
    let concentration = solution.variable("Electrolyte concentration").unwrap();

    let midway = concentration.at_times(&[0.005]).unwrap();
    let entries = concentration.entries();
    for (i, value) in midway.column(0).iter().enumerate() {
        assert_relative_eq!(*value, 0.5 * (entries[[i, 0]] + entries[[i, 1]]), epsilon = 1e-12);
    }
    assert!(concentration.at_times(&[0.05]).is_err());

    let x = concentration.coordinates()[0];
    assert_relative_eq!(concentration.at(0.0, x).unwrap(), entries[[0, 0]], epsilon = 1e-12);
}

#[test]
fn config_reads_from_toml() {
    let config = SimulationConfig::from_toml_str(
        r#"
            c_rate = 0.5
            interpolation = "harmonic"

            [points]
            x_n = 6
            r_p = 8

            [solver]
            mode = "fast"
        "#,
    )
    .unwrap();
    let simulation = Simulation::new(Family::Spme, &[], config).unwrap();
    let solution = simulation.solve(&[0.0, 0.01]).unwrap();
    assert_eq!(*solution.status(), Status::Complete);
    assert!(solution.variable_names().any(|name| name == "Terminal voltage"));
}

#[test]
fn spme_converges_toward_dfn() {
    let sweep = ResolutionSweep::new(vec![4, 8, 16], vec![0.0, 0.01, 0.02]).run().unwrap();
    assert_eq!(sweep.len(), 3);
    for point in &sweep {
        assert_eq!(point.errors.len(), 4);
        for (name, error) in &point.errors {
            assert!(error.is_finite(), "{name} at {} points: {error}", point.points);
        }
        assert!(point.errors["Terminal voltage"] < 0.05, "{:?}", point.errors);
    }

    // Refinement leaves the model error, which falls or levels off.
    let coarse = sweep[0].errors["Terminal voltage"];
    let fine = sweep[2].errors["Terminal voltage"];
    assert!(fine <= 1.1 * coarse + 1e-6, "{coarse} at 4 points, {fine} at 16 points");
}

#[test]
fn dfn_voltage_converges_under_refinement() {
    let t_eval = [0.0, 0.01, 0.02];
    let voltage = |points: usize| -> Vec<f64> {
        let config = coarse_config().with_uniform_points(points);
        let solution = Simulation::new(Family::Dfn, &[], config).unwrap().solve(&t_eval).unwrap();
        assert_eq!(*solution.status(), Status::Complete);
        solution.variable("Terminal voltage").unwrap().series().unwrap().to_vec()
    };

    let reference = voltage(32);
    let errors: Vec<f64> = [4, 8, 16]
        .into_iter()
        .map(|points| relative_error(&reference, &voltage(points)).unwrap())
        .collect();
    assert!(errors.iter().all(|e| *e < 0.01), "{errors:?}");
    assert!(errors[2] <= errors[0], "{errors:?}");
}
