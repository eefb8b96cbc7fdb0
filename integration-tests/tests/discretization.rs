use integration_tests::coarse_config;
use voltaic_core::DaeProblem;
use voltaic_discretize::{DiscretizationError, FiniteVolume, Interpolation, discretize};
use voltaic_models::Family;
use voltaic_sim::{Simulation, SimulationError};

#[test]
fn two_dimensional_collectors_are_not_implemented() {
    let simulation = Simulation::new(
        Family::Dfn,
        &[
            ("thermal", "x-lumped"),
            ("current collector", "potential pair"),
            ("dimensionality", "2"),
        ],
        coarse_config(),
    )
    .unwrap();
    let err = simulation.discretized().unwrap_err();
    assert!(
        matches!(
            err,
            SimulationError::Discretization(DiscretizationError::NotImplemented(_))
        ),
        "{err}"
    );
}

#[test]
fn discretizing_twice_gives_equal_systems() {
    for family in Family::ALL {
        let simulation = Simulation::new(family, &[], coarse_config()).unwrap();
        let method = FiniteVolume::new(Interpolation::Arithmetic);
        let processed = simulation.parameters().process_model(simulation.model()).unwrap();
        let first = discretize(&processed, simulation.mesh(), &method).unwrap();
        let second = discretize(&processed, simulation.mesh(), &method).unwrap();
        assert_eq!(first, second, "{family}");
    }
}

#[test]
fn discretized_sizes_follow_the_mesh() {
    let coarse = Simulation::new(Family::Dfn, &[], coarse_config()).unwrap();
    let fine = Simulation::new(
        Family::Dfn,
        &[],
        coarse_config().with_uniform_points(10),
    )
    .unwrap();
    let (coarse, fine) = (coarse.discretized().unwrap(), fine.discretized().unwrap());
    assert!(fine.size() > coarse.size());
    assert!(fine.algebraic_size() > coarse.algebraic_size());
    assert_eq!(fine.event_count(), coarse.event_count());
}

#[test]
fn initial_state_evaluates_to_finite_values() {
    for family in Family::ALL {
        let simulation = Simulation::new(family, &[], coarse_config()).unwrap();
        let system = simulation.discretized().unwrap();
        let f = system.rhs_algebraic(0.0, system.initial_state()).unwrap();
        assert_eq!(f.len(), system.size(), "{family}");
        assert!(f.iter().all(|value| value.is_finite()), "{family}: {f}");

        let events = system.events(0.0, system.initial_state()).unwrap();
        assert!(events.iter().all(|value| *value > 0.0), "{family}: {events}");
    }
}

#[test]
fn single_particle_systems_are_ordinary() {
    for family in [Family::Spm, Family::Spme] {
        let simulation = Simulation::new(family, &[], coarse_config()).unwrap();
        let system = simulation.discretized().unwrap();
        assert_eq!(system.algebraic_size(), 0, "{family}");
    }
}
