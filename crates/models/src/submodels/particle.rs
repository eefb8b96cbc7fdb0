//! Lithium diffusion in electrode particles.
//!
//! Fickian diffusion solves the radial PDE in a spherical particle. The
//! polynomial profiles replace it with ODEs for the volume average, plus a
//! gradient moment for the quartic profile, and recover the surface value
//! from the interfacial flux.

use std::f64::consts::PI;

use voltaic_core::{BoundaryCondition, Event, ModelBuilder, Side, Symbol, Variable};

use crate::{
    BuildError, Electrode, Scope, SubModel, Variables,
    options::Particle as Profile,
    parameters::electrode,
    variables::quantities,
};

use super::x_average;

/// Surface concentrations below this stop a simulation.
const MINIMUM_SURFACE: f64 = 0.01;
/// Surface concentrations above this stop a simulation.
const MAXIMUM_SURFACE: f64 = 0.99;

#[derive(Debug, Clone, Copy)]
pub struct Particle {
    electrode: Electrode,
    profile: Profile,
    scope: Scope,
    forward: bool,
}

impl Particle {
    #[must_use]
    pub fn new(electrode: Electrode, profile: Profile, scope: Scope) -> Self {
        Self {
            electrode,
            profile,
            scope,
            forward: scope == Scope::Distributed,
        }
    }

    /// Marks the interfacial current as computed from the surface value,
    /// as with a double layer in an x-averaged model.
    #[must_use]
    pub fn with_forward_kinetics(mut self) -> Self {
        self.forward = true;
        self
    }

    fn is_polynomial(&self) -> bool {
        matches!(self.profile, Profile::Quadratic | Profile::Quartic)
    }

    fn name(&self, quantity: &str) -> String {
        self.scope.name(self.electrode, quantity)
    }

    fn concentration(&self) -> Variable {
        let domain = match self.profile {
            Profile::Fickian => self.scope.particle_domain(self.electrode),
            _ => self.scope.domain(self.electrode),
        };
        let quantity = match self.profile {
            Profile::Fickian => quantities::PARTICLE_CONCENTRATION,
            _ => quantities::AVERAGE_CONCENTRATION,
        };
        Variable::new(&self.name(quantity), domain)
    }

    fn gradient_moment(&self) -> Variable {
        Variable::new(
            &self.name(quantities::PROFILE_STATE),
            self.scope.domain(self.electrode),
        )
    }

    /// A separate algebraic surface state breaks the loop between the
    /// surface value and forward kinetics in polynomial models.
    fn surface_state(&self) -> Option<Variable> {
        (self.is_polynomial() && self.forward).then(|| {
            Variable::new(
                &self.name(quantities::SURFACE_CONCENTRATION_STATE),
                self.scope.domain(self.electrode),
            )
        })
    }

    /// Surface value implied by the average, moment and flux.
    fn surface_from_profile(&self, vars: &Variables) -> Result<Symbol, BuildError> {
        let k = self.electrode;
        let average = self.concentration().symbol();
        let flux = vars.get(&self.name(quantities::INTERFACIAL_CURRENT))?;
        let timescale = k.parameter(electrode::PARTICLE_TIMESCALE);
        let capacity = k.parameter(electrode::CAPACITY);
        let correction = timescale.times(&flux)?.over(&capacity)?;
        let surface = match self.profile {
            Profile::Fickian | Profile::Uniform => average,
            Profile::Quadratic => average.minus(&(correction / 5.0))?,
            Profile::Quartic => {
                let moment = self.gradient_moment().symbol() * (8.0 / 35.0);
                average.plus(&moment)?.minus(&(correction / 35.0))?
            }
        };
        Ok(surface)
    }

    /// With inverse kinetics the flux is known up front, so polynomial
    /// surface values are computed in the coupled phase.
    fn surface_is_coupled(&self) -> bool {
        self.is_polynomial() && !self.forward
    }
}

impl SubModel for Particle {
    fn name(&self) -> &'static str {
        match self.electrode {
            Electrode::Negative => "negative particle",
            Electrode::Positive => "positive particle",
        }
    }

    fn provides(&self) -> Vec<String> {
        if self.surface_is_coupled() {
            vec![self.name(quantities::SURFACE_CONCENTRATION)]
        } else {
            Vec::new()
        }
    }

    fn requires(&self) -> Vec<String> {
        if self.surface_is_coupled() {
            vec![self.name(quantities::INTERFACIAL_CURRENT)]
        } else {
            Vec::new()
        }
    }

    fn fundamental(&self, vars: &mut Variables) -> Result<(), BuildError> {
        let c = self.concentration().symbol();
        let (surface, average) = match self.profile {
            Profile::Fickian => {
                let volume = 4.0 / 3.0 * PI;
                (c.boundary_value(Side::Right)?, c.integral()? / volume)
            }
            _ => (c.clone(), c),
        };
        vars.insert(self.name(quantities::AVERAGE_CONCENTRATION), average);
        match (self.surface_state(), self.profile) {
            (Some(state), _) => {
                vars.insert(self.name(quantities::SURFACE_CONCENTRATION), state.symbol());
            }
            (None, Profile::Fickian | Profile::Uniform) => {
                vars.insert(self.name(quantities::SURFACE_CONCENTRATION), surface);
            }
            (None, _) => {}
        }
        Ok(())
    }

    fn coupled(&self, vars: &mut Variables) -> Result<(), BuildError> {
        if self.surface_is_coupled() {
            let surface = self.surface_from_profile(vars)?;
            vars.insert(self.name(quantities::SURFACE_CONCENTRATION), surface);
        }
        Ok(())
    }

    fn equations(&self, vars: &Variables, builder: &mut ModelBuilder) -> Result<(), BuildError> {
        let k = self.electrode;
        let timescale = k.parameter(electrode::PARTICLE_TIMESCALE);
        let capacity = k.parameter(electrode::CAPACITY);
        let initial = k.parameter(electrode::INITIAL_CONCENTRATION);
        let flux = vars.get(&self.name(quantities::INTERFACIAL_CURRENT))?;
        let c = self.concentration();

        match self.profile {
            Profile::Fickian => {
                let rhs = c.symbol().grad()?.div()?.over(&timescale)?;
                let edge_flux = -timescale.times(&flux)?.over(&capacity)?;
                builder
                    .rhs(&c, rhs)?
                    .boundary_conditions(
                        &c,
                        BoundaryCondition::no_flux(),
                        BoundaryCondition::neumann(edge_flux),
                    )
                    .initial_condition(&c, initial)
                    .variable(c.name(), c.symbol());
            }
            Profile::Uniform | Profile::Quadratic | Profile::Quartic => {
                let uptake = -3.0 * flux.over(&capacity)?;
                builder
                    .rhs(&c, uptake)?
                    .initial_condition(&c, initial);
            }
        }

        if self.profile == Profile::Quartic {
            let q = self.gradient_moment();
            let decay = -30.0 * q.symbol().over(&timescale)?;
            let forcing = -22.5 * flux.over(&capacity)?;
            builder
                .rhs(&q, decay.plus(&forcing)?)?
                .initial_condition(&q, Symbol::constant(0.0))
                .variable(q.name(), q.symbol());
        }

        if let Some(state) = self.surface_state() {
            let residual = state.symbol().minus(&self.surface_from_profile(vars)?)?;
            builder
                .algebraic(&state, residual)?
                .initial_condition(&state, k.parameter(electrode::INITIAL_CONCENTRATION));
        }

        let surface = vars.get(&self.name(quantities::SURFACE_CONCENTRATION))?;
        let average = vars.get(&self.name(quantities::AVERAGE_CONCENTRATION))?;
        let surface_name = k.name(quantities::SURFACE_CONCENTRATION);
        let averaged_surface_name = k.averaged(quantities::SURFACE_CONCENTRATION);
        match self.scope {
            Scope::Distributed => {
                builder
                    .variable(&surface_name, surface.clone())
                    .variable(
                        &averaged_surface_name,
                        x_average(&surface, &k.thickness())?,
                    );
            }
            Scope::Averaged => {
                builder
                    .variable(&averaged_surface_name, surface.clone())
                    .variable(&surface_name, surface.broadcast(k.domain())?);
            }
        }
        builder.variable(&self.name(quantities::AVERAGE_CONCENTRATION), average);

        builder
            .event(Event::termination(
                format!("Minimum {} particle surface concentration", k.lower()),
                surface.min() - MINIMUM_SURFACE,
            ))
            .event(Event::termination(
                format!("Maximum {} particle surface concentration", k.lower()),
                MAXIMUM_SURFACE - surface.max(),
            ));
        Ok(())
    }
}
