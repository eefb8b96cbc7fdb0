//! Model families and their sub-model dispatch tables.

use log::debug;
use voltaic_core::Model;

use crate::{
    BuildError, Electrode, Family, Options, Scope, SubModel, assemble,
    options::{
        CurrentCollector, Dimensionality, ElectrolyteConductivity, LithiumPlating, Particle as Profile,
        ParticleShape, Sei as SeiOption, SeiFilmResistance, SurfaceForm, Thermal as ThermalOption,
    },
    submodels::{
        Chemistry,
        active_material::ActiveMaterial,
        collector::Collector,
        conductivity::Conductivity,
        convection::Convection,
        current::Current,
        electrode_ohm::{AveragedElectrodeOhm, ElectrodeOhm},
        electrolyte::{ElectrolyteDiffusion, ElectrolyteModel},
        interfacial::InterfacialCurrent,
        kinetics::Kinetics,
        mechanics::Mechanics,
        particle::Particle,
        plating::Plating,
        porosity::{Porosity, PorosityModel},
        sei::Sei,
        thermal::Thermal,
    },
};

/// Builds a model of `family` from option `(name, value)` pairs.
///
/// # Errors
///
/// Returns [`BuildError::Option`] if the options are invalid for the family,
/// [`BuildError::NotImplemented`] for valid but unsupported combinations,
/// and [`BuildError::Model`] if assembly fails.
pub fn build_model(family: Family, options: &[(&str, &str)]) -> Result<Model, BuildError> {
    let options = Options::parse(family, options.iter().copied())?;
    build(&options)
}

/// Builds a model from already validated options.
///
/// # Errors
///
/// Returns [`BuildError::NotImplemented`] for unsupported combinations and
/// [`BuildError::Model`] if assembly fails.
pub fn build(options: &Options) -> Result<Model, BuildError> {
    check_supported(options)?;
    let family = options.family();
    let submodels = if family.is_lithium_ion() {
        lithium_ion(options)
    } else {
        lead_acid(options)
    };
    debug!("building {family} from {} sub-models", submodels.len());
    assemble(family.name(), options, &submodels)
}

fn check_supported(options: &Options) -> Result<(), BuildError> {
    let family = options.family();
    let cracking = options.particle_cracking.cracks(true) || options.particle_cracking.cracks(false);
    if cracking && options.particle != Profile::Fickian {
        return Err(BuildError::not_implemented(format!(
            "particle cracking with the {} particle profile",
            options.particle
        )));
    }
    if options.thermal == ThermalOption::XFull {
        if options.dimensionality != Dimensionality::Zero {
            return Err(BuildError::not_implemented(format!(
                "x-full thermal model with {}D current collectors",
                options.dimensionality.value()
            )));
        }
        if family.is_single_particle() {
            return Err(BuildError::not_implemented(format!(
                "x-full thermal model in the {family}"
            )));
        }
    }
    Ok(())
}

fn lithium_ion(options: &Options) -> Vec<Box<dyn SubModel>> {
    let family = options.family();
    let chemistry = Chemistry::LithiumIon;
    let scope = if family.is_single_particle() {
        Scope::Averaged
    } else {
        Scope::Distributed
    };
    let surface_form = options.surface_form;
    let conductivity = options.electrolyte_conductivity.resolve(family);
    let sei = options.sei != SeiOption::None;
    let plating = options.lithium_plating != LithiumPlating::None;
    let film = if sei {
        options.sei_film_resistance
    } else {
        SeiFilmResistance::None
    };
    let inverse = scope == Scope::Averaged && surface_form == SurfaceForm::False;

    let mut submodels: Vec<Box<dyn SubModel>> = vec![
        Box::new(Current),
        Box::new(Thermal::new(options.thermal, options.dimensionality, scope)),
        Box::new(Porosity::new(
            if options.sei_porosity_change {
                PorosityModel::SeiDriven
            } else {
                PorosityModel::Constant
            },
            scope,
        )),
    ];

    for k in Electrode::BOTH {
        let negative = k.is_negative();
        submodels.push(Box::new(ActiveMaterial::new(
            k,
            scope,
            options.particle_shape,
            options.loss_of_active_material.applies(negative),
        )));
        if options.particle_cracking.has_mechanics() {
            submodels.push(Box::new(Mechanics::new(
                k,
                scope,
                options.particle_cracking.cracks(negative),
            )));
        }
        let mut particle = Particle::new(k, options.particle, scope);
        if !inverse {
            particle = particle.with_forward_kinetics();
        }
        submodels.push(Box::new(particle));
    }

    let electrolyte = match family {
        Family::Spm => ElectrolyteModel::Constant,
        _ => ElectrolyteModel::Full,
    };
    submodels.push(Box::new(ElectrolyteDiffusion::new(electrolyte, chemistry, scope)));
    submodels.push(Box::new(
        Conductivity::new(conductivity, chemistry).with_surface_form(surface_form),
    ));

    match scope {
        Scope::Distributed => {
            for k in Electrode::BOTH {
                submodels.push(Box::new(
                    ElectrodeOhm::new(k, chemistry).with_surface_form(surface_form),
                ));
            }
        }
        Scope::Averaged => {
            let composite = matches!(
                conductivity,
                ElectrolyteConductivity::Composite | ElectrolyteConductivity::Integrated
            );
            submodels.push(Box::new(AveragedElectrodeOhm::new(composite)));
        }
    }

    for k in Electrode::BOTH {
        let negative = k.is_negative();
        let kinetics = Kinetics::new(k, chemistry, scope)
            .with_surface_form(surface_form)
            .with_film(if negative { film } else { SeiFilmResistance::None });
        submodels.push(Box::new(kinetics));
    }
    if sei {
        submodels.push(Box::new(Sei::new(options.sei, scope)));
    }
    if plating {
        submodels.push(Box::new(Plating::new(options.lithium_plating, scope)));
    }
    for k in Electrode::BOTH {
        let negative = k.is_negative();
        let interfacial = InterfacialCurrent::new(k, scope)
            .with_side_reactions(negative && sei, negative && plating)
            .with_film_state(negative && film == SeiFilmResistance::Distributed)
            .with_inverse_kinetics(inverse);
        submodels.push(Box::new(interfacial));
    }
    submodels.push(Box::new(Collector::new(options.current_collector, chemistry)));
    submodels
}

fn lead_acid(options: &Options) -> Vec<Box<dyn SubModel>> {
    let chemistry = Chemistry::LeadAcid;
    let scope = Scope::Distributed;
    let surface_form = options.surface_form;

    let mut submodels: Vec<Box<dyn SubModel>> = vec![
        Box::new(Current),
        Box::new(Thermal::new(options.thermal, options.dimensionality, scope)),
        Box::new(Porosity::new(PorosityModel::LeadAcid, scope)),
    ];
    for k in Electrode::BOTH {
        submodels.push(Box::new(ActiveMaterial::new(k, scope, ParticleShape::User, false)));
    }
    submodels.push(Box::new(
        ElectrolyteDiffusion::new(ElectrolyteModel::Full, chemistry, scope)
            .with_convection(options.convection),
    ));
    if options.convection {
        submodels.push(Box::new(Convection));
    }
    submodels.push(Box::new(
        Conductivity::new(ElectrolyteConductivity::Full, chemistry).with_surface_form(surface_form),
    ));
    for k in Electrode::BOTH {
        submodels.push(Box::new(
            ElectrodeOhm::new(k, chemistry).with_surface_form(surface_form),
        ));
    }
    for k in Electrode::BOTH {
        submodels.push(Box::new(
            Kinetics::new(k, chemistry, scope).with_surface_form(surface_form),
        ));
    }
    for k in Electrode::BOTH {
        submodels.push(Box::new(InterfacialCurrent::new(k, scope)));
    }
    submodels.push(Box::new(Collector::new(CurrentCollector::Uniform, chemistry)));
    submodels
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::OptionError;

    fn well_posed(family: Family, options: &[(&str, &str)]) -> Model {
        let model = build_model(family, options)
            .unwrap_or_else(|err| panic!("{family} {options:?}: {err}"));
        if let Err(err) = model.check_well_posedness() {
            panic!("{family} {options:?}: {err}");
        }
        model
    }

    #[test]
    fn default_families_are_well_posed() {
        for family in Family::ALL {
            let model = well_posed(family, &[]);
            assert_eq!(model.name(), family.name());
            assert!(model.variables().contains_key("Terminal voltage"));
            assert!(model.events().iter().any(|e| e.name == "Minimum voltage"));
        }
    }

    #[test]
    fn spme_electrolyte_reads_averaged_surface_area() {
        for options in [
            &[][..],
            &[("sei", "reaction limited"), ("sei film resistance", "average")][..],
        ] {
            let model = well_posed(Family::Spme, options);
            assert!(model.rhs().iter().any(|(v, _)| v.name() == "Electrolyte concentration"));
        }
    }

    #[test]
    fn single_particle_models_have_no_algebraic_equations() {
        for family in [Family::Spm, Family::Spme] {
            let model = well_posed(family, &[]);
            assert!(model.algebraic().is_empty(), "{family}");
        }
        assert!(!well_posed(Family::Dfn, &[]).algebraic().is_empty());
    }

    #[test]
    fn particle_profiles() {
        for family in [Family::Dfn, Family::Spm, Family::Spme] {
            for profile in Profile::CHOICES {
                well_posed(family, &[("particle", *profile)]);
            }
        }
    }

    #[test]
    fn thermal_options() {
        for family in [Family::Dfn, Family::Spm, Family::Spme] {
            for thermal in ["lumped", "x-lumped"] {
                let model = well_posed(family, &[("thermal", thermal)]);
                assert!(model.variables().contains_key("X-averaged total heating"));
            }
        }
        well_posed(Family::Dfn, &[("thermal", "x-full")]);
        well_posed(
            Family::Spm,
            &[
                ("thermal", "x-lumped"),
                ("current collector", "potential pair"),
                ("dimensionality", "1"),
            ],
        );
    }

    #[test]
    fn surface_forms() {
        for family in Family::ALL {
            for form in ["differential", "algebraic"] {
                well_posed(family, &[("surface form", form)]);
            }
        }
        well_posed(
            Family::Spm,
            &[("surface form", "differential"), ("particle", "quadratic profile")],
        );
    }

    #[test]
    fn sei_and_plating() {
        for family in [Family::Dfn, Family::Spm, Family::Spme] {
            for sei in SeiOption::CHOICES.iter().skip(1) {
                for film in ["distributed", "average"] {
                    well_posed(family, &[("sei", *sei), ("sei film resistance", film)]);
                }
            }
            well_posed(family, &[("sei", "reaction limited"), ("sei porosity change", "true")]);
            for plating in ["reversible", "irreversible"] {
                well_posed(family, &[("lithium plating", plating)]);
            }
        }
    }

    #[test]
    fn mechanics() {
        for family in [Family::Dfn, Family::Spm] {
            for cracking in ["no cracking", "negative", "positive", "both"] {
                well_posed(family, &[("particle cracking", cracking)]);
            }
            well_posed(
                family,
                &[("particle cracking", "both"), ("loss of active material", "both")],
            );
        }
    }

    #[test]
    fn current_collectors() {
        well_posed(
            Family::Dfn,
            &[("current collector", "potential pair"), ("dimensionality", "1")],
        );
        well_posed(
            Family::Spme,
            &[
                ("current collector", "potential pair quite conductive"),
                ("dimensionality", "1"),
            ],
        );
    }

    #[test]
    fn lead_acid_convection() {
        let model = well_posed(Family::NewmanTiedemann, &[("convection", "true")]);
        assert!(model.variables().contains_key("Volume-averaged velocity"));
    }

    #[test]
    fn unsupported_combinations_are_not_implemented() {
        let cases: [(Family, &[(&str, &str)]); 3] = [
            (
                Family::Dfn,
                &[("particle cracking", "both"), ("particle", "quadratic profile")],
            ),
            (
                Family::Dfn,
                &[
                    ("thermal", "x-full"),
                    ("current collector", "potential pair"),
                    ("dimensionality", "1"),
                ],
            ),
            (Family::Spm, &[("thermal", "x-full")]),
        ];
        for (family, options) in cases {
            let err = build_model(family, options).unwrap_err();
            assert!(matches!(err, BuildError::NotImplemented(_)), "{err}");
        }
    }

    #[test]
    fn invalid_options_are_option_errors() {
        let err = build_model(Family::Spm, &[("electrolyte conductivity", "full")]).unwrap_err();
        assert!(matches!(
            err,
            BuildError::Option(OptionError::InvalidValue { .. })
        ));
        let err = build_model(Family::NewmanTiedemann, &[("sei", "constant")]).unwrap_err();
        assert!(matches!(
            err,
            BuildError::Option(OptionError::UnknownOption { .. })
        ));
    }
}
