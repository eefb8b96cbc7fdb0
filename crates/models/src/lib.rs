//! Battery model families assembled from composable sub-models.
//!
//! A model is requested by [`Family`] plus string options. The options pick
//! a sub-model for each physical process, and [`assemble`] combines them
//! into a [`voltaic_core::Model`]:
//!
//! ```
//! use voltaic_models::{Family, build_model};
//!
//! let model = build_model(Family::Spm, &[("thermal", "lumped")]).unwrap();
//! assert!(model.check_well_posedness().is_ok());
//! ```

mod electrode;
mod error;
mod families;
mod options;
mod submodel;
mod variables;

pub mod parameters;
pub mod submodels;

pub use electrode::{Electrode, Scope};
pub use error::{BuildError, OptionError};
pub use families::{build, build_model};
pub use options::{
    CurrentCollector, Dimensionality, ElectrolyteConductivity, Family, LithiumPlating,
    LossOfActiveMaterial, OptionValue, Options, Particle, ParticleCracking, ParticleShape, Sei,
    SeiFilmResistance, SurfaceForm, Thermal,
};
pub use submodel::{SubModel, assemble};
pub use variables::{Variables, names, quantities};
