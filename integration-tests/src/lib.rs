//! Shared fixtures for cross-crate tests.

use voltaic_models::Family;
use voltaic_sim::SimulationConfig;

/// DFN option sets exercised by the well-posedness grid.
pub const DFN_OPTIONS: &[&[(&str, &str)]] = &[
    &[],
    &[("thermal", "lumped")],
    &[("thermal", "x-lumped")],
    &[("thermal", "x-full")],
    &[("thermal", "x-lumped"), ("current collector", "potential pair"), ("dimensionality", "1")],
    &[("thermal", "x-lumped"), ("current collector", "potential pair"), ("dimensionality", "2")],
    &[("current collector", "potential pair quite conductive"), ("dimensionality", "1")],
    &[("particle", "uniform profile")],
    &[("particle", "quadratic profile")],
    &[("particle", "quartic profile")],
    &[("particle shape", "user")],
    &[("surface form", "differential")],
    &[("surface form", "algebraic")],
    &[("sei", "constant")],
    &[("sei", "reaction limited")],
    &[("sei", "solvent-diffusion limited")],
    &[("sei", "electron-migration limited")],
    &[("sei", "interstitial-diffusion limited")],
    &[("sei", "ec reaction limited")],
    &[("sei", "reaction limited"), ("sei film resistance", "distributed")],
    &[("sei", "reaction limited"), ("sei film resistance", "average")],
    &[("sei", "reaction limited"), ("sei porosity change", "true")],
    &[("lithium plating", "reversible")],
    &[("lithium plating", "irreversible")],
    &[("particle cracking", "no cracking")],
    &[("particle cracking", "negative")],
    &[("particle cracking", "both")],
    &[("particle cracking", "both"), ("loss of active material", "both")],
];

/// SPM and SPMe option sets exercised by the well-posedness grid.
pub const SINGLE_PARTICLE_OPTIONS: &[&[(&str, &str)]] = &[
    &[],
    &[("thermal", "lumped")],
    &[("thermal", "x-lumped"), ("current collector", "potential pair"), ("dimensionality", "1")],
    &[("particle", "quadratic profile")],
    &[("surface form", "differential")],
    &[("surface form", "algebraic")],
    &[("sei", "reaction limited")],
    &[("lithium plating", "reversible")],
];

/// Lead-acid option sets exercised by the well-posedness grid.
pub const LEAD_ACID_OPTIONS: &[&[(&str, &str)]] = &[
    &[],
    &[("convection", "true")],
    &[("surface form", "differential")],
    &[("surface form", "algebraic")],
    &[("convection", "true"), ("surface form", "algebraic")],
];

/// Option sets for `family` in the well-posedness grid.
#[must_use]
pub fn option_grid(family: Family) -> &'static [&'static [(&'static str, &'static str)]] {
    match family {
        Family::Dfn => DFN_OPTIONS,
        Family::Spm | Family::Spme => SINGLE_PARTICLE_OPTIONS,
        Family::NewmanTiedemann => LEAD_ACID_OPTIONS,
    }
}

/// A coarse mesh that keeps end-to-end solves quick.
#[must_use]
pub fn coarse_config() -> SimulationConfig {
    SimulationConfig::default().with_uniform_points(5)
}
