use nalgebra::{DMatrix, DVector};

/// Forward-difference Jacobian of `f` at `x`, given `fx = f(x)`.
///
/// Each column perturbs one entry by `step` scaled to the entry's magnitude.
pub(crate) fn jacobian<F, E>(
    f: &mut F,
    x: &DVector<f64>,
    fx: &DVector<f64>,
    step: f64,
) -> Result<DMatrix<f64>, E>
where
    F: FnMut(&DVector<f64>) -> Result<DVector<f64>, E>,
{
    let mut jac = DMatrix::zeros(fx.len(), x.len());
    let mut perturbed = x.clone();
    for j in 0..x.len() {
        let h = step * x[j].abs().max(1.0);
        perturbed[j] = x[j] + h;
        let column = (f(&perturbed)? - fx) / h;
        jac.set_column(j, &column);
        perturbed[j] = x[j];
    }
    Ok(jac)
}

/// Largest absolute entry, or infinity if any entry is not finite.
pub(crate) fn max_norm(v: &DVector<f64>) -> f64 {
    v.iter().try_fold(0.0_f64, |norm, value| {
        value.is_finite().then(|| norm.max(value.abs()))
    })
    .unwrap_or(f64::INFINITY)
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn matches_analytic_jacobian() {
        let mut f = |x: &DVector<f64>| -> Result<DVector<f64>, Infallible> {
            Ok(DVector::from_vec(vec![x[0] * x[1], x[0].powi(2) + 3.0 * x[1]]))
        };
        let x = DVector::from_vec(vec![2.0, -1.0]);
        let fx = f(&x).unwrap();
        let jac = jacobian(&mut f, &x, &fx, 1e-7).unwrap();

        assert_relative_eq!(jac[(0, 0)], -1.0, epsilon = 1e-5);
        assert_relative_eq!(jac[(0, 1)], 2.0, epsilon = 1e-5);
        assert_relative_eq!(jac[(1, 0)], 4.0, epsilon = 1e-5);
        assert_relative_eq!(jac[(1, 1)], 3.0, epsilon = 1e-5);
    }

    #[test]
    fn max_norm_flags_non_finite_entries() {
        assert_relative_eq!(max_norm(&DVector::from_vec(vec![1.0, -3.0])), 3.0);
        assert_relative_eq!(max_norm(&DVector::zeros(0)), 0.0);
        assert!(max_norm(&DVector::from_vec(vec![1.0, f64::NAN])).is_infinite());
    }
}
