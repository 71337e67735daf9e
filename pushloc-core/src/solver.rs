//! Bracketing Brent root finder.
//!
//! Inverse localization reduces to one-dimensional root finding twice
//! (mean-plane crossing over the line range, pixel crossing along the
//! line). Both need a solver that is derivative-free, guaranteed to stay
//! inside its bracket, and explicit about the two ways it can fail:
//! no sign change in the interval, and evaluation budget exhausted. The
//! objective functions themselves are fallible (they run the whole frame
//! pipeline), so the solver is generic over the function error.

use thiserror::Error;

/// Failures of [`BracketingBrentSolver::solve`].
#[derive(Error, Debug)]
pub enum SolverError<E> {
    /// The function has the same sign at both interval ends; no root is
    /// bracketed.
    #[error("no root bracketed in [{lower}, {upper}]")]
    NoBracketing { lower: f64, upper: f64 },

    /// The evaluation budget was exhausted before convergence.
    #[error("maximum number of function evaluations ({max}) exceeded")]
    TooManyEvaluations { max: usize },

    /// The objective function itself failed.
    #[error("{0}")]
    Function(E),
}

/// Brent's method on a bracketing interval.
///
/// Combines bisection, secant and inverse quadratic interpolation;
/// converges superlinearly on smooth functions while never leaving the
/// initial bracket. Stops when the bracket half-width falls below
/// `absolute_accuracy` (plus a floating-point floor scaled to the
/// current iterate).
#[derive(Debug, Clone, Copy)]
pub struct BracketingBrentSolver {
    absolute_accuracy: f64,
}

impl BracketingBrentSolver {
    /// Creates a solver converging to the given absolute accuracy on the
    /// abscissa.
    pub fn new(absolute_accuracy: f64) -> Self {
        Self { absolute_accuracy }
    }

    /// Finds a root of `f` in `[lower, upper]`, spending at most
    /// `max_eval` function evaluations.
    pub fn solve<E, F>(
        &self,
        max_eval: usize,
        mut f: F,
        lower: f64,
        upper: f64,
    ) -> Result<f64, SolverError<E>>
    where
        F: FnMut(f64) -> Result<f64, E>,
    {
        let mut evaluations = 0usize;
        let mut eval = |x: f64, n: &mut usize| -> Result<f64, SolverError<E>> {
            if *n >= max_eval {
                return Err(SolverError::TooManyEvaluations { max: max_eval });
            }
            *n += 1;
            f(x).map_err(SolverError::Function)
        };

        let mut a = lower;
        let mut b = upper;
        let mut fa = eval(a, &mut evaluations)?;
        let mut fb = eval(b, &mut evaluations)?;

        if fa == 0.0 {
            return Ok(a);
        }
        if fb == 0.0 {
            return Ok(b);
        }
        if fa * fb > 0.0 {
            return Err(SolverError::NoBracketing { lower, upper });
        }

        let mut c = a;
        let mut fc = fa;
        let mut d = b - a;
        let mut e = d;

        loop {
            if fc.abs() < fb.abs() {
                a = b;
                b = c;
                c = a;
                fa = fb;
                fb = fc;
                fc = fa;
            }

            let tol1 = 2.0 * f64::EPSILON * b.abs() + 0.5 * self.absolute_accuracy;
            let xm = 0.5 * (c - b);
            if xm.abs() <= tol1 || fb == 0.0 {
                return Ok(b);
            }

            if e.abs() >= tol1 && fa.abs() > fb.abs() {
                // attempt inverse quadratic interpolation / secant
                let s = fb / fa;
                let (mut p, mut q);
                if a == c {
                    p = 2.0 * xm * s;
                    q = 1.0 - s;
                } else {
                    let qq = fa / fc;
                    let r = fb / fc;
                    p = s * (2.0 * xm * qq * (qq - r) - (b - a) * (r - 1.0));
                    q = (qq - 1.0) * (r - 1.0) * (s - 1.0);
                }
                if p > 0.0 {
                    q = -q;
                }
                p = p.abs();
                let min1 = 3.0 * xm * q - (tol1 * q).abs();
                let min2 = (e * q).abs();
                if 2.0 * p < min1.min(min2) {
                    // interpolation accepted
                    e = d;
                    d = p / q;
                } else {
                    // fall back to bisection
                    d = xm;
                    e = d;
                }
            } else {
                d = xm;
                e = d;
            }

            a = b;
            fa = fb;
            if d.abs() > tol1 {
                b += d;
            } else {
                b += tol1.copysign(xm);
            }
            fb = eval(b, &mut evaluations)?;

            if (fb > 0.0) == (fc > 0.0) {
                c = a;
                fc = fa;
                d = b - a;
                e = d;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    fn ok(f: impl Fn(f64) -> f64) -> impl FnMut(f64) -> Result<f64, Infallible> {
        move |x| Ok(f(x))
    }

    #[test]
    fn test_finds_simple_root() {
        let solver = BracketingBrentSolver::new(1e-12);
        let root = solver.solve(100, ok(|x| x * x - 2.0), 0.0, 2.0).unwrap();
        assert!((root - std::f64::consts::SQRT_2).abs() < 1e-10);
    }

    #[test]
    fn test_finds_transcendental_root() {
        let solver = BracketingBrentSolver::new(1e-10);
        let root = solver.solve(100, ok(|x| libm::cos(x) - x), 0.0, 1.0).unwrap();
        assert!((libm::cos(root) - root).abs() < 1e-9);
    }

    #[test]
    fn test_no_bracketing() {
        let solver = BracketingBrentSolver::new(1e-10);
        let result = solver.solve(100, ok(|x| x * x + 1.0), -1.0, 1.0);
        assert!(matches!(result, Err(SolverError::NoBracketing { .. })));
    }

    #[test]
    fn test_too_many_evaluations() {
        let solver = BracketingBrentSolver::new(1e-15);
        let result = solver.solve(3, ok(|x| x - 0.123456789), 0.0, 1.0);
        assert!(matches!(
            result,
            Err(SolverError::TooManyEvaluations { max: 3 })
        ));
    }

    #[test]
    fn test_root_at_interval_end() {
        let solver = BracketingBrentSolver::new(1e-10);
        let root = solver.solve(100, ok(|x| x), 0.0, 1.0).unwrap();
        assert_eq!(root, 0.0);
    }

    #[test]
    fn test_function_error_propagates() {
        #[derive(Debug, thiserror::Error)]
        #[error("boom")]
        struct Boom;

        let solver = BracketingBrentSolver::new(1e-10);
        let result = solver.solve(100, |_x| Err::<f64, _>(Boom), 0.0, 1.0);
        assert!(matches!(result, Err(SolverError::Function(Boom))));
    }

    #[test]
    fn test_coarse_accuracy_uses_few_evaluations() {
        // the inverse localization first stage runs at 1e-2 accuracy; a
        // smooth function should converge well within a dozen evaluations
        let solver = BracketingBrentSolver::new(1e-2);
        let mut count = 0usize;
        let root = solver
            .solve(
                1000,
                |x| {
                    count += 1;
                    Ok::<_, Infallible>(libm::sin(x - 0.3))
                },
                -1.0,
                1.0,
            )
            .unwrap();
        assert!((root - 0.3).abs() < 1e-2);
        assert!(count < 15, "used {} evaluations", count);
    }
}
