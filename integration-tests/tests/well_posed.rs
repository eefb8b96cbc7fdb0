use integration_tests::option_grid;
use voltaic_models::{Family, build_model};

#[test]
fn every_supported_option_set_is_well_posed() {
    for family in Family::ALL {
        for options in option_grid(family) {
            let model = build_model(family, options)
                .unwrap_or_else(|err| panic!("{family} {options:?}: {err}"));
            model
                .check_well_posedness()
                .unwrap_or_else(|err| panic!("{family} {options:?}: {err}"));
            assert!(
                model.variables().contains_key("Terminal voltage [V]"),
                "{family} {options:?}"
            );
        }
    }
}

#[test]
fn sei_with_averaged_film_resistance_is_well_posed() {
    let model = build_model(
        Family::Dfn,
        &[("sei", "reaction limited"), ("sei film resistance", "average")],
    )
    .unwrap();
    model.check_well_posedness().unwrap();
}

#[test]
fn every_model_stops_at_voltage_cutoffs() {
    for family in Family::ALL {
        let model = build_model(family, &[]).unwrap();
        let names: Vec<&str> = model.events().iter().map(|event| event.name.as_str()).collect();
        assert!(names.contains(&"Minimum voltage"), "{family}: {names:?}");
        assert!(names.contains(&"Maximum voltage"), "{family}: {names:?}");
    }
}
