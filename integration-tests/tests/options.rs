use voltaic_core::NotImplementedError;
use voltaic_models::{BuildError, Family, OptionError, Options, build, build_model};

fn option_error(family: Family, options: &[(&str, &str)]) -> OptionError {
    match build_model(family, options) {
        Err(BuildError::Option(err)) => err,
        other => panic!("expected an option error for {options:?}, got {other:?}"),
    }
}

fn not_implemented(family: Family, options: &[(&str, &str)]) -> NotImplementedError {
    match build_model(family, options) {
        Err(BuildError::NotImplemented(err)) => err,
        other => panic!("expected a not-implemented error for {options:?}, got {other:?}"),
    }
}

#[test]
fn dfn_rejects_integrated_conductivity() {
    let err = option_error(Family::Dfn, &[("electrolyte conductivity", "integrated")]);
    assert!(err.to_string().contains("electrolyte conductivity"), "{err}");
    assert!(err.to_string().contains("full"), "{err}");
}

#[test]
fn unknown_option_names_are_rejected() {
    let err = option_error(Family::Dfn, &[("bc_options", "dirichlet")]);
    assert!(matches!(err, OptionError::UnknownOption { ref option, .. } if option == "bc_options"));
}

#[test]
fn out_of_domain_values_name_the_option() {
    let cases: &[(&str, &str)] = &[
        ("thermal", "adiabatic"),
        ("current collector", "bad"),
        ("dimensionality", "3"),
        ("particle", "cubic profile"),
        ("particle shape", "cube"),
        ("surface form", "yes"),
        ("sei", "bad"),
        ("sei film resistance", "bad"),
        ("sei porosity change", "maybe"),
        ("lithium plating", "bad"),
        ("particle cracking", "bad"),
        ("loss of active material", "bad"),
    ];
    for &(option, value) in cases {
        let err = option_error(Family::Dfn, &[(option, value)]);
        let message = err.to_string();
        assert!(message.contains(option), "{message}");
        assert!(message.contains(value), "{message}");
    }
}

#[test]
fn lead_acid_rejects_lithium_ion_options() {
    let err = option_error(Family::NewmanTiedemann, &[("lithium plating", "reversible")]);
    assert!(matches!(err, OptionError::UnknownOption { .. }), "{err}");

    let err = option_error(Family::NewmanTiedemann, &[("thermal", "lumped")]);
    assert!(err.to_string().contains("thermal"), "{err}");
}

#[test]
fn inconsistent_collector_dimensionality_is_rejected() {
    let err = option_error(Family::Dfn, &[("current collector", "potential pair")]);
    assert!(matches!(err, OptionError::Inconsistent { .. }), "{err}");

    let err = option_error(Family::Dfn, &[("dimensionality", "1")]);
    assert!(matches!(err, OptionError::Inconsistent { .. }), "{err}");
}

#[test]
fn x_full_thermal_with_collector_dimensions_is_not_implemented() {
    for dimensionality in ["1", "2"] {
        let err = not_implemented(
            Family::Dfn,
            &[
                ("thermal", "x-full"),
                ("current collector", "potential pair"),
                ("dimensionality", dimensionality),
            ],
        );
        assert!(err.to_string().contains("x-full"), "{err}");
    }
}

#[test]
fn options_read_from_toml() {
    let options = Options::from_toml_str(
        Family::Dfn,
        r#"
            thermal = "x-lumped"
            "current collector" = "potential pair"
            dimensionality = 1
            "sei porosity change" = false
        "#,
    )
    .unwrap();
    let summary = options.summary();
    assert!(summary.contains(&("thermal", "x-lumped".to_owned())));
    assert!(summary.contains(&("dimensionality", "1".to_owned())));
    assert!(summary.contains(&("electrolyte conductivity", "full".to_owned())));
    build(&options).unwrap().check_well_posedness().unwrap();
}
