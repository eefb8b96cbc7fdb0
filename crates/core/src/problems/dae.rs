use nalgebra::DVector;

/// Defines a semi-explicit DAE problem to be integrated in time.
///
/// The system is `M y' = F(t, y)` with a diagonal mass matrix `M` whose
/// entries are 1 on differential rows and 0 on algebraic rows. Rows with a
/// zero mass entry are constraints `0 = F_i(t, y)`.
///
/// Event functions are positive while integration may continue; a sign
/// change marks an event.
pub trait DaeProblem {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Number of entries in the state vector.
    fn size(&self) -> usize;

    /// Diagonal of the mass matrix.
    fn mass(&self) -> &DVector<f64>;

    /// Evaluates `F(t, y)`.
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if the function cannot be evaluated.
    fn rhs_algebraic(&self, t: f64, y: &DVector<f64>) -> Result<DVector<f64>, Self::Error>;

    /// Names of the event functions, in the order [`Self::events`] returns them.
    ///
    /// The default has no events.
    fn event_names(&self) -> Vec<&str> {
        Vec::new()
    }

    /// Evaluates the event functions.
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if an event cannot be evaluated.
    fn events(&self, _t: f64, _y: &DVector<f64>) -> Result<DVector<f64>, Self::Error> {
        Ok(DVector::zeros(0))
    }

    /// Evaluates the residual `M y' - F(t, y)`.
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if `F` cannot be evaluated.
    fn residual(
        &self,
        t: f64,
        y: &DVector<f64>,
        y_dot: &DVector<f64>,
    ) -> Result<DVector<f64>, Self::Error> {
        let f = self.rhs_algebraic(t, y)?;
        Ok(self.mass().component_mul(y_dot) - f)
    }

    /// Returns `true` if row `i` is an algebraic constraint.
    fn is_algebraic(&self, i: usize) -> bool {
        self.mass()[i] == 0.0
    }
}
