//! Model options: a fixed schema per family, read from strings or TOML.

use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::Deserialize;

use crate::OptionError;

/// A model family, selecting the schema and the sub-model dispatch tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Family {
    /// Doyle-Fuller-Newman.
    Dfn,
    /// Single particle model.
    Spm,
    /// Single particle model with electrolyte.
    Spme,
    /// Newman-Tiedemann lead-acid model.
    NewmanTiedemann,
}

impl Family {
    pub const ALL: [Family; 4] = [
        Family::Dfn,
        Family::Spm,
        Family::Spme,
        Family::NewmanTiedemann,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Dfn => "DFN",
            Self::Spm => "SPM",
            Self::Spme => "SPMe",
            Self::NewmanTiedemann => "Newman-Tiedemann",
        }
    }

    #[must_use]
    pub fn is_lithium_ion(self) -> bool {
        !matches!(self, Self::NewmanTiedemann)
    }

    /// Returns `true` for families with x-averaged particles.
    #[must_use]
    pub fn is_single_particle(self) -> bool {
        matches!(self, Self::Spm | Self::Spme)
    }

    /// Option names accepted by this family.
    #[must_use]
    pub fn option_names(self) -> &'static [&'static str] {
        if self.is_lithium_ion() {
            &[
                Thermal::NAME,
                CurrentCollector::NAME,
                Dimensionality::NAME,
                Particle::NAME,
                ParticleShape::NAME,
                SurfaceForm::NAME,
                ElectrolyteConductivity::NAME,
                Sei::NAME,
                SeiFilmResistance::NAME,
                SEI_POROSITY_CHANGE,
                LithiumPlating::NAME,
                ParticleCracking::NAME,
                LossOfActiveMaterial::NAME,
            ]
        } else {
            &[Thermal::NAME, SurfaceForm::NAME, CONVECTION]
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Family {
    type Err = OptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|family| family.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                OptionError::invalid("family", s, &Self::ALL.map(Family::name))
            })
    }
}

/// Defines an option whose values form a closed set of strings.
///
/// The first listed value is the default.
macro_rules! option_enum {
    (
        $(#[$meta:meta])*
        $name:ident = $key:literal {
            $first:ident => $first_text:literal
            $(, $variant:ident => $text:literal)* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
        pub enum $name {
            #[default]
            $first,
            $($variant,)*
        }

        impl $name {
            pub const NAME: &'static str = $key;
            pub const CHOICES: &'static [&'static str] = &[$first_text $(, $text)*];

            #[must_use]
            pub fn as_str(self) -> &'static str {
                match self {
                    Self::$first => $first_text,
                    $(Self::$variant => $text,)*
                }
            }
        }

        impl FromStr for $name {
            type Err = OptionError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $first_text => Ok(Self::$first),
                    $($text => Ok(Self::$variant),)*
                    _ => Err(OptionError::invalid(Self::NAME, s, Self::CHOICES)),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

option_enum! {
    Thermal = "thermal" {
        Isothermal => "isothermal",
        Lumped => "lumped",
        XLumped => "x-lumped",
        XFull => "x-full",
    }
}

option_enum! {
    CurrentCollector = "current collector" {
        Uniform => "uniform",
        PotentialPair => "potential pair",
        QuiteConductive => "potential pair quite conductive",
    }
}

option_enum! {
    /// Number of current-collector dimensions resolved.
    Dimensionality = "dimensionality" {
        Zero => "0",
        One => "1",
        Two => "2",
    }
}

option_enum! {
    Particle = "particle" {
        Fickian => "Fickian diffusion",
        Uniform => "uniform profile",
        Quadratic => "quadratic profile",
        Quartic => "quartic profile",
    }
}

option_enum! {
    ParticleShape = "particle shape" {
        Spherical => "spherical",
        User => "user",
    }
}

option_enum! {
    SurfaceForm = "surface form" {
        False => "false",
        Differential => "differential",
        Algebraic => "algebraic",
    }
}

option_enum! {
    /// Electrolyte potential treatment; which values apply depends on the family.
    ElectrolyteConductivity = "electrolyte conductivity" {
        Default => "default",
        Full => "full",
        LeadingOrder => "leading order",
        Composite => "composite",
        Integrated => "integrated",
    }
}

option_enum! {
    Sei = "sei" {
        None => "none",
        Constant => "constant",
        ReactionLimited => "reaction limited",
        SolventDiffusionLimited => "solvent-diffusion limited",
        ElectronMigrationLimited => "electron-migration limited",
        InterstitialDiffusionLimited => "interstitial-diffusion limited",
        EcReactionLimited => "ec reaction limited",
    }
}

option_enum! {
    SeiFilmResistance = "sei film resistance" {
        None => "none",
        Distributed => "distributed",
        Average => "average",
    }
}

option_enum! {
    LithiumPlating = "lithium plating" {
        None => "none",
        Reversible => "reversible",
        Irreversible => "irreversible",
    }
}

option_enum! {
    ParticleCracking = "particle cracking" {
        None => "none",
        NoCracking => "no cracking",
        Negative => "negative",
        Positive => "positive",
        Both => "both",
    }
}

option_enum! {
    LossOfActiveMaterial = "loss of active material" {
        None => "none",
        Negative => "negative",
        Positive => "positive",
        Both => "both",
    }
}

const SEI_POROSITY_CHANGE: &str = "sei porosity change";
const CONVECTION: &str = "convection";
const BOOLEAN: &[&str] = &["false", "true"];

impl Dimensionality {
    #[must_use]
    pub fn value(self) -> usize {
        match self {
            Self::Zero => 0,
            Self::One => 1,
            Self::Two => 2,
        }
    }
}

impl ParticleCracking {
    /// Returns `true` if stresses are computed at all.
    #[must_use]
    pub fn has_mechanics(self) -> bool {
        self != Self::None
    }

    /// Returns `true` if the given electrode grows cracks.
    #[must_use]
    pub fn cracks(self, negative: bool) -> bool {
        match self {
            Self::None | Self::NoCracking => false,
            Self::Negative => negative,
            Self::Positive => !negative,
            Self::Both => true,
        }
    }
}

impl LossOfActiveMaterial {
    /// Returns `true` if the given electrode loses active material.
    #[must_use]
    pub fn applies(self, negative: bool) -> bool {
        match self {
            Self::None => false,
            Self::Negative => negative,
            Self::Positive => !negative,
            Self::Both => true,
        }
    }
}

impl ElectrolyteConductivity {
    /// Values accepted by a family.
    #[must_use]
    pub fn choices(family: Family) -> &'static [&'static str] {
        match family {
            Family::Dfn => &["default", "full"],
            Family::Spm => &["default", "leading order"],
            Family::Spme => &["default", "composite", "integrated"],
            Family::NewmanTiedemann => &["default"],
        }
    }

    /// Resolves `default` to the family's own treatment.
    #[must_use]
    pub fn resolve(self, family: Family) -> Self {
        match (self, family) {
            (Self::Default, Family::Dfn | Family::NewmanTiedemann) => Self::Full,
            (Self::Default, Family::Spm) => Self::LeadingOrder,
            (Self::Default, Family::Spme) => Self::Composite,
            (other, _) => other,
        }
    }
}

/// One option value as written in a TOML table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Integer(i64),
    Text(String),
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(value) => write!(f, "{value}"),
            Self::Integer(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value),
        }
    }
}

/// A validated set of options for one model family.
///
/// Fields not in a family's schema keep their defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Options {
    family: Family,
    pub thermal: Thermal,
    pub current_collector: CurrentCollector,
    pub dimensionality: Dimensionality,
    pub particle: Particle,
    pub particle_shape: ParticleShape,
    pub surface_form: SurfaceForm,
    pub electrolyte_conductivity: ElectrolyteConductivity,
    pub sei: Sei,
    pub sei_film_resistance: SeiFilmResistance,
    pub sei_porosity_change: bool,
    pub lithium_plating: LithiumPlating,
    pub particle_cracking: ParticleCracking,
    pub loss_of_active_material: LossOfActiveMaterial,
    pub convection: bool,
}

impl Options {
    /// The default options of a family.
    #[must_use]
    pub fn new(family: Family) -> Self {
        Self {
            family,
            thermal: Thermal::default(),
            current_collector: CurrentCollector::default(),
            dimensionality: Dimensionality::default(),
            particle: Particle::default(),
            particle_shape: ParticleShape::default(),
            surface_form: SurfaceForm::default(),
            electrolyte_conductivity: ElectrolyteConductivity::default(),
            sei: Sei::default(),
            sei_film_resistance: SeiFilmResistance::default(),
            sei_porosity_change: false,
            lithium_plating: LithiumPlating::default(),
            particle_cracking: ParticleCracking::default(),
            loss_of_active_material: LossOfActiveMaterial::default(),
            convection: false,
        }
    }

    /// Parses options from `(name, value)` pairs and validates them.
    ///
    /// # Errors
    ///
    /// Returns an [`OptionError`] for unknown names, out-of-domain values,
    /// and inconsistent combinations.
    pub fn parse<'a>(
        family: Family,
        pairs: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<Self, OptionError> {
        let mut options = Self::new(family);
        for (name, value) in pairs {
            options.set(name, value)?;
        }
        options.validate()?;
        Ok(options)
    }

    /// Parses options from a table of TOML values.
    ///
    /// # Errors
    ///
    /// Returns an [`OptionError`] as [`Options::parse`] does.
    pub fn from_table(
        family: Family,
        table: &BTreeMap<String, OptionValue>,
    ) -> Result<Self, OptionError> {
        let text: Vec<(&str, String)> = table
            .iter()
            .map(|(name, value)| (name.as_str(), value.to_string()))
            .collect();
        Self::parse(family, text.iter().map(|(name, value)| (*name, value.as_str())))
    }

    /// Parses options from a TOML document of `name = value` lines.
    ///
    /// # Errors
    ///
    /// Returns [`OptionError::Parse`] for malformed TOML, otherwise as
    /// [`Options::parse`].
    pub fn from_toml_str(family: Family, text: &str) -> Result<Self, OptionError> {
        let table: BTreeMap<String, OptionValue> =
            toml::from_str(text).map_err(|err| OptionError::Parse(err.to_string()))?;
        Self::from_table(family, &table)
    }

    #[must_use]
    pub fn family(&self) -> Family {
        self.family
    }

    /// Sets one option by name.
    ///
    /// # Errors
    ///
    /// Returns an [`OptionError`] if the name is not in the family's schema
    /// or the value is not one of the option's choices.
    pub fn set(&mut self, name: &str, value: &str) -> Result<(), OptionError> {
        let family = self.family;
        let unknown = || OptionError::UnknownOption {
            option: name.to_owned(),
            family: family.name(),
            choices: family.option_names().to_vec(),
        };
        if !family.option_names().contains(&name) {
            return Err(unknown());
        }
        match name {
            Thermal::NAME => {
                let thermal = value.parse()?;
                if !family.is_lithium_ion() && thermal != Thermal::Isothermal {
                    return Err(OptionError::invalid(Thermal::NAME, value, &["isothermal"]));
                }
                self.thermal = thermal;
            }
            CurrentCollector::NAME => self.current_collector = value.parse()?,
            Dimensionality::NAME => self.dimensionality = value.parse()?,
            Particle::NAME => self.particle = value.parse()?,
            ParticleShape::NAME => self.particle_shape = value.parse()?,
            SurfaceForm::NAME => self.surface_form = value.parse()?,
            ElectrolyteConductivity::NAME => {
                let choices = ElectrolyteConductivity::choices(family);
                if !choices.contains(&value) {
                    return Err(OptionError::invalid(
                        ElectrolyteConductivity::NAME,
                        value,
                        choices,
                    ));
                }
                self.electrolyte_conductivity = value.parse()?;
            }
            Sei::NAME => self.sei = value.parse()?,
            SeiFilmResistance::NAME => self.sei_film_resistance = value.parse()?,
            SEI_POROSITY_CHANGE => {
                self.sei_porosity_change = parse_bool(SEI_POROSITY_CHANGE, value)?;
            }
            LithiumPlating::NAME => self.lithium_plating = value.parse()?,
            ParticleCracking::NAME => self.particle_cracking = value.parse()?,
            LossOfActiveMaterial::NAME => self.loss_of_active_material = value.parse()?,
            CONVECTION => self.convection = parse_bool(CONVECTION, value)?,
            _ => return Err(unknown()),
        }
        Ok(())
    }

    /// Checks combinations that can never describe a consistent model.
    ///
    /// # Errors
    ///
    /// Returns [`OptionError::Inconsistent`] naming the offending option.
    pub fn validate(&self) -> Result<(), OptionError> {
        if !self.family.is_lithium_ion() {
            return Ok(());
        }
        match (self.current_collector, self.dimensionality) {
            (CurrentCollector::Uniform, Dimensionality::Zero) => {}
            (CurrentCollector::Uniform, dim) => {
                return Err(OptionError::inconsistent(
                    CurrentCollector::NAME,
                    CurrentCollector::Uniform,
                    format!("requires dimensionality 0, found {dim}"),
                ));
            }
            (collector, Dimensionality::Zero) => {
                return Err(OptionError::inconsistent(
                    CurrentCollector::NAME,
                    collector,
                    "requires dimensionality 1 or 2",
                ));
            }
            _ => {}
        }
        if self.loss_of_active_material != LossOfActiveMaterial::None
            && self.particle_cracking == ParticleCracking::None
        {
            return Err(OptionError::inconsistent(
                LossOfActiveMaterial::NAME,
                self.loss_of_active_material,
                "requires particle cracking other than none",
            ));
        }
        if self.sei == Sei::None {
            if self.sei_film_resistance != SeiFilmResistance::None {
                return Err(OptionError::inconsistent(
                    SeiFilmResistance::NAME,
                    self.sei_film_resistance,
                    "requires an sei model",
                ));
            }
            if self.sei_porosity_change {
                return Err(OptionError::inconsistent(
                    SEI_POROSITY_CHANGE,
                    true,
                    "requires an sei model",
                ));
            }
        }
        Ok(())
    }

    /// The options of this family's schema as `(name, value)` pairs.
    #[must_use]
    pub fn summary(&self) -> Vec<(&'static str, String)> {
        self.family
            .option_names()
            .iter()
            .map(|&name| (name, self.value_of(name)))
            .collect()
    }

    fn value_of(&self, name: &str) -> String {
        match name {
            Thermal::NAME => self.thermal.to_string(),
            CurrentCollector::NAME => self.current_collector.to_string(),
            Dimensionality::NAME => self.dimensionality.to_string(),
            Particle::NAME => self.particle.to_string(),
            ParticleShape::NAME => self.particle_shape.to_string(),
            SurfaceForm::NAME => self.surface_form.to_string(),
            ElectrolyteConductivity::NAME => self
                .electrolyte_conductivity
                .resolve(self.family)
                .to_string(),
            Sei::NAME => self.sei.to_string(),
            SeiFilmResistance::NAME => self.sei_film_resistance.to_string(),
            SEI_POROSITY_CHANGE => self.sei_porosity_change.to_string(),
            LithiumPlating::NAME => self.lithium_plating.to_string(),
            ParticleCracking::NAME => self.particle_cracking.to_string(),
            LossOfActiveMaterial::NAME => self.loss_of_active_material.to_string(),
            CONVECTION => self.convection.to_string(),
            _ => String::new(),
        }
    }
}

fn parse_bool(option: &'static str, value: &str) -> Result<bool, OptionError> {
    match value {
        "false" => Ok(false),
        "true" => Ok(true),
        _ => Err(OptionError::invalid(option, value, BOOLEAN)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_come_first() {
        let options = Options::new(Family::Dfn);
        assert_eq!(options.thermal, Thermal::Isothermal);
        assert_eq!(options.particle, Particle::Fickian);
        assert_eq!(options.current_collector, CurrentCollector::Uniform);
        assert_eq!(
            options.electrolyte_conductivity.resolve(Family::Spme),
            ElectrolyteConductivity::Composite
        );
        assert!(options.validate().is_ok());
    }

    #[test]
    fn unknown_option_lists_the_schema() {
        let err = Options::parse(Family::Dfn, [("bc_options", "x")]).unwrap_err();
        let message = err.to_string();
        assert!(matches!(err, OptionError::UnknownOption { .. }));
        assert!(message.contains("bc_options"));
        assert!(message.contains("particle cracking"));
    }

    #[test]
    fn invalid_value_names_option_and_choices() {
        let err = Options::parse(Family::Spm, [("sei", "bad sei")]).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("`sei`"));
        assert!(message.contains("reaction limited"));
    }

    #[test]
    fn electrolyte_conductivity_choices_depend_on_family() {
        let err =
            Options::parse(Family::Dfn, [("electrolyte conductivity", "integrated")]).unwrap_err();
        assert!(err.to_string().contains("electrolyte conductivity"));
        assert!(
            Options::parse(Family::Spme, [("electrolyte conductivity", "integrated")]).is_ok()
        );
        assert!(
            Options::parse(Family::Spm, [("electrolyte conductivity", "composite")]).is_err()
        );
    }

    #[test]
    fn collector_and_dimensionality_must_agree() {
        let err = Options::parse(Family::Dfn, [("dimensionality", "1")]).unwrap_err();
        assert!(matches!(err, OptionError::Inconsistent { option: "current collector", .. }));

        let err = Options::parse(Family::Spm, [("current collector", "potential pair")])
            .unwrap_err();
        assert!(err.to_string().contains("dimensionality 1 or 2"));

        let options = Options::parse(
            Family::Spm,
            [("current collector", "potential pair"), ("dimensionality", "2")],
        )
        .unwrap();
        assert_eq!(options.dimensionality.value(), 2);
    }

    #[test]
    fn degradation_options_need_their_parents() {
        let err = Options::parse(Family::Dfn, [("loss of active material", "both")]).unwrap_err();
        assert!(matches!(err, OptionError::Inconsistent { .. }));

        let err = Options::parse(Family::Dfn, [("sei film resistance", "average")]).unwrap_err();
        assert!(err.to_string().contains("sei film resistance"));

        let err = Options::parse(Family::Dfn, [("sei porosity change", "true")]).unwrap_err();
        assert!(err.to_string().contains("sei porosity change"));
    }

    #[test]
    fn lead_acid_schema_is_small() {
        assert!(Options::parse(Family::NewmanTiedemann, [("convection", "true")]).is_ok());
        let err = Options::parse(Family::NewmanTiedemann, [("particle", "uniform profile")])
            .unwrap_err();
        assert!(matches!(err, OptionError::UnknownOption { .. }));
        let err = Options::parse(Family::NewmanTiedemann, [("thermal", "lumped")]).unwrap_err();
        assert!(err.to_string().contains("isothermal"));
    }

    #[test]
    fn toml_values_may_be_integers_and_booleans() {
        let text = r#"
            "current collector" = "potential pair"
            dimensionality = 1
            sei = "reaction limited"
            "sei porosity change" = true
        "#;
        let options = Options::from_toml_str(Family::Dfn, text).unwrap();
        assert_eq!(options.dimensionality, Dimensionality::One);
        assert!(options.sei_porosity_change);

        let err = Options::from_toml_str(Family::Dfn, "thermal = [1, 2]").unwrap_err();
        assert!(matches!(err, OptionError::Parse(_)));
    }

    #[test]
    fn family_names_parse() {
        assert_eq!("spme".parse::<Family>().unwrap(), Family::Spme);
        assert!("SPMx".parse::<Family>().is_err());
    }

    #[test]
    fn summary_follows_the_schema() {
        let options = Options::new(Family::NewmanTiedemann);
        let summary = options.summary();
        assert_eq!(summary.len(), 3);
        assert_eq!(summary[2], ("convection", "false".to_owned()));
    }
}
