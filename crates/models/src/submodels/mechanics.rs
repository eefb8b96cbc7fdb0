use voltaic_core::{ModelBuilder, Symbol, Variable};

use crate::{
    BuildError, Electrode, Scope, SubModel, Variables,
    parameters::{electrode, names},
    variables::quantities,
};

/// Particle surface stress and, when enabled, crack growth by a Paris law.
#[derive(Debug, Clone, Copy)]
pub struct Mechanics {
    electrode: Electrode,
    scope: Scope,
    cracking: bool,
}

impl Mechanics {
    #[must_use]
    pub fn new(electrode: Electrode, scope: Scope, cracking: bool) -> Self {
        Self {
            electrode,
            scope,
            cracking,
        }
    }

    fn name(&self, quantity: &str) -> String {
        self.scope.name(self.electrode, quantity)
    }

    fn crack_length(&self) -> Variable {
        Variable::new(
            &self.name(quantities::CRACK_LENGTH),
            self.scope.domain(self.electrode),
        )
    }
}

impl SubModel for Mechanics {
    fn name(&self) -> &'static str {
        match self.electrode {
            Electrode::Negative => "negative mechanics",
            Electrode::Positive => "positive mechanics",
        }
    }

    fn provides(&self) -> Vec<String> {
        vec![self.name(quantities::STRESS)]
    }

    fn requires(&self) -> Vec<String> {
        vec![
            self.name(quantities::AVERAGE_CONCENTRATION),
            self.name(quantities::SURFACE_CONCENTRATION),
        ]
    }

    fn fundamental(&self, vars: &mut Variables) -> Result<(), BuildError> {
        let enhancement = if self.cracking {
            let factor = self.electrode.parameter(electrode::CRACK_AREA);
            1.0 + factor.times(&(self.crack_length().symbol() - 1.0))?
        } else {
            Symbol::constant(1.0)
        };
        vars.insert(self.name(quantities::CRACK_ENHANCEMENT), enhancement);
        Ok(())
    }

    fn coupled(&self, vars: &mut Variables) -> Result<(), BuildError> {
        let average = vars.get(&self.name(quantities::AVERAGE_CONCENTRATION))?;
        let surface = vars.get(&self.name(quantities::SURFACE_CONCENTRATION))?;
        let stress = self
            .electrode
            .parameter(electrode::STRESS)
            .times(&average.minus(&surface)?)?;
        vars.insert(self.name(quantities::STRESS), stress);
        Ok(())
    }

    fn equations(&self, vars: &Variables, builder: &mut ModelBuilder) -> Result<(), BuildError> {
        let stress = vars.get(&self.name(quantities::STRESS))?;
        if self.cracking {
            let length = self.crack_length();
            let exponent = Symbol::parameter(names::PARIS_EXPONENT);
            let growth = self
                .electrode
                .parameter(electrode::CRACK_GROWTH)
                .times(&stress.positive_part().pow(&exponent)?)?
                .times(&length.symbol().pow(&(exponent / 2.0))?)?;
            builder
                .rhs(&length, growth)?
                .initial_condition(&length, Symbol::constant(1.0))
                .variable(length.name(), length.symbol())
                .variable(
                    &self.name(quantities::CRACK_ENHANCEMENT),
                    vars.get(&self.name(quantities::CRACK_ENHANCEMENT))?,
                );
        }
        builder.variable(&self.name(quantities::STRESS), stress);
        Ok(())
    }
}
