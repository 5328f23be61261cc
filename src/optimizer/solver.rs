//! Bounded minimization over a capped simplex
//!
//! The feasible region is `{x : lower <= x <= upper, sum(x) = total}`. Any
//! algorithm that can minimize a black-box objective over it implements
//! [`Minimizer`]; [`ProjectedGradient`] is the default.

use crate::error::{ConfigError, Result};

/// Box bounds plus a fixed total
#[derive(Debug, Clone, PartialEq)]
pub struct SimplexRegion {
    lower: Vec<f64>,
    upper: Vec<f64>,
    total: f64,
}

impl SimplexRegion {
    pub fn new(lower: Vec<f64>, upper: Vec<f64>, total: f64) -> Result<Self> {
        if lower.len() != upper.len() || lower.is_empty() {
            return Err(ConfigError::invalid_config(format!(
                "bounds of length {} and {}",
                lower.len(),
                upper.len()
            )));
        }
        if lower.iter().zip(&upper).any(|(l, u)| !(l.is_finite() && u.is_finite()) || l > u) {
            return Err(ConfigError::invalid_config("lower bound above upper bound"));
        }

        let capacity: f64 = upper.iter().sum();
        let floor: f64 = lower.iter().sum();
        if capacity < total - 1e-9 {
            return Err(ConfigError::InfeasibleBounds { capacity });
        }
        if floor > total + 1e-9 {
            return Err(ConfigError::invalid_config(format!(
                "lower bounds sum to {:.4}, above the required total {}",
                floor, total
            )));
        }

        Ok(Self { lower, upper, total })
    }

    /// Long-only, fully invested region with the given caps
    pub fn fully_invested(upper: Vec<f64>) -> Result<Self> {
        Self::new(vec![0.0; upper.len()], upper, 1.0)
    }

    pub fn dim(&self) -> usize {
        self.lower.len()
    }

    pub fn upper(&self) -> &[f64] {
        &self.upper
    }

    pub fn contains(&self, point: &[f64], tolerance: f64) -> bool {
        point.len() == self.dim()
            && (point.iter().sum::<f64>() - self.total).abs() <= tolerance
            && point
                .iter()
                .zip(self.lower.iter().zip(&self.upper))
                .all(|(x, (l, u))| *x >= l - tolerance && *x <= u + tolerance)
    }

    /// Euclidean projection onto the region.
    ///
    /// The projection is `clamp(y - tau, lower, upper)` for the `tau` that restores
    /// the total; the clamped sum is monotone in `tau`, so bisection finds it.
    pub fn project(&self, point: &[f64]) -> Vec<f64> {
        let clamped_sum = |tau: f64| -> f64 {
            point
                .iter()
                .zip(self.lower.iter().zip(&self.upper))
                .map(|(y, (l, u))| (y - tau).clamp(*l, *u))
                .sum()
        };

        // At tau_lo everything sits at its upper bound, at tau_hi at its lower bound
        let mut tau_lo = point
            .iter()
            .zip(&self.upper)
            .map(|(y, u)| y - u)
            .fold(f64::INFINITY, f64::min);
        let mut tau_hi = point
            .iter()
            .zip(&self.lower)
            .map(|(y, l)| y - l)
            .fold(f64::NEG_INFINITY, f64::max);

        for _ in 0..200 {
            let mid = 0.5 * (tau_lo + tau_hi);
            if clamped_sum(mid) > self.total {
                tau_lo = mid;
            } else {
                tau_hi = mid;
            }
            if tau_hi - tau_lo <= f64::EPSILON * (1.0 + tau_lo.abs().max(tau_hi.abs())) {
                break;
            }
        }

        let tau = 0.5 * (tau_lo + tau_hi);
        point
            .iter()
            .zip(self.lower.iter().zip(&self.upper))
            .map(|(y, (l, u))| (y - tau).clamp(*l, *u))
            .collect()
    }
}

/// Result of a minimization
#[derive(Debug, Clone)]
pub struct SolverOutcome {
    pub solution: Vec<f64>,
    pub objective: f64,
    pub iterations: usize,
    pub converged: bool,
}

/// Minimize a black-box objective over a simplex region
pub trait Minimizer: Send + Sync {
    fn minimize(
        &self,
        objective: &dyn Fn(&[f64]) -> f64,
        region: &SimplexRegion,
        initial_guess: &[f64],
    ) -> SolverOutcome;
}

/// Projected gradient descent with finite-difference gradients and
/// Armijo backtracking
#[derive(Debug, Clone, Copy)]
pub struct ProjectedGradient {
    pub max_iterations: usize,

    /// Relative change in objective that counts as converged
    pub tolerance: f64,

    /// Finite-difference step
    pub gradient_step: f64,
}

impl Default for ProjectedGradient {
    fn default() -> Self {
        Self::new(500, 1e-6)
    }
}

const ARMIJO_FACTOR: f64 = 1e-4;
const MAX_BACKTRACKS: usize = 60;

impl ProjectedGradient {
    pub fn new(max_iterations: usize, tolerance: f64) -> Self {
        Self {
            max_iterations,
            tolerance,
            gradient_step: 1e-7,
        }
    }

    fn gradient(&self, objective: &dyn Fn(&[f64]) -> f64, x: &[f64]) -> Vec<f64> {
        let h = self.gradient_step;
        let mut probe = x.to_vec();
        (0..x.len())
            .map(|i| {
                probe[i] = x[i] + h;
                let up = objective(&probe);
                probe[i] = x[i] - h;
                let down = objective(&probe);
                probe[i] = x[i];
                (up - down) / (2.0 * h)
            })
            .collect()
    }
}

impl Minimizer for ProjectedGradient {
    fn minimize(
        &self,
        objective: &dyn Fn(&[f64]) -> f64,
        region: &SimplexRegion,
        initial_guess: &[f64],
    ) -> SolverOutcome {
        let mut x = region.project(initial_guess);
        let mut fx = objective(&x);
        let mut step: Option<f64> = None;

        for iteration in 1..=self.max_iterations {
            let grad = self.gradient(objective, &x);
            let grad_max = grad.iter().fold(0.0_f64, |m, g| m.max(g.abs()));
            if grad_max == 0.0 || !grad_max.is_finite() {
                return SolverOutcome {
                    solution: x,
                    objective: fx,
                    iterations: iteration,
                    converged: grad_max == 0.0,
                };
            }

            let mut alpha = step.map_or(1.0 / grad_max, |s| s * 2.0);
            let mut accepted = None;
            for _ in 0..MAX_BACKTRACKS {
                let trial: Vec<f64> = x.iter().zip(&grad).map(|(xi, gi)| xi - alpha * gi).collect();
                let candidate = region.project(&trial);
                let predicted: f64 = grad
                    .iter()
                    .zip(x.iter().zip(&candidate))
                    .map(|(g, (xi, ci))| g * (xi - ci))
                    .sum();
                let f_candidate = objective(&candidate);
                if f_candidate <= fx - ARMIJO_FACTOR * predicted && predicted > 0.0 {
                    accepted = Some((candidate, f_candidate));
                    break;
                }
                alpha *= 0.5;
            }

            // No descent left along the projected gradient
            let Some((candidate, f_candidate)) = accepted else {
                return SolverOutcome {
                    solution: x,
                    objective: fx,
                    iterations: iteration,
                    converged: true,
                };
            };

            let change = (fx - f_candidate).abs();
            x = candidate;
            fx = f_candidate;
            step = Some(alpha);

            if change <= self.tolerance * (1.0 + fx.abs()) {
                return SolverOutcome {
                    solution: x,
                    objective: fx,
                    iterations: iteration,
                    converged: true,
                };
            }
        }

        SolverOutcome {
            solution: x,
            objective: fx,
            iterations: self.max_iterations,
            converged: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_projection_respects_caps() {
        let region = SimplexRegion::fully_invested(vec![0.5, 0.5, 0.2, 0.4]).unwrap();
        let projected = region.project(&[0.25, 0.25, 0.25, 0.25]);

        assert!(region.contains(&projected, 1e-9));
        assert_abs_diff_eq!(projected[2], 0.2, epsilon = 1e-9);
        // Excess 0.05 spread evenly over the other three
        assert_abs_diff_eq!(projected[0], 0.25 + 0.05 / 3.0, epsilon = 1e-9);
    }

    #[test]
    fn test_projection_of_feasible_point_is_identity() {
        let region = SimplexRegion::fully_invested(vec![0.5, 0.5, 0.2, 0.4]).unwrap();
        let point = [0.3, 0.4, 0.2, 0.1];
        let projected = region.project(&point);
        for (p, q) in point.iter().zip(&projected) {
            assert_abs_diff_eq!(p, q, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_infeasible_region() {
        assert!(matches!(
            SimplexRegion::fully_invested(vec![0.2, 0.4]),
            Err(ConfigError::InfeasibleBounds { .. })
        ));
    }

    #[test]
    fn test_quadratic_minimum() {
        // min sum (x_i - t_i)^2 with t inside the region: solution is t
        let region = SimplexRegion::fully_invested(vec![0.5, 0.5, 0.5]).unwrap();
        let target = [0.2, 0.3, 0.5];
        let objective = |x: &[f64]| -> f64 {
            x.iter().zip(&target).map(|(a, b)| (a - b).powi(2)).sum()
        };

        let outcome = ProjectedGradient::default().minimize(&objective, &region, &[1.0 / 3.0; 3]);
        assert!(outcome.converged);
        for (x, t) in outcome.solution.iter().zip(&target) {
            assert_abs_diff_eq!(x, t, epsilon = 1e-3);
        }
    }

    #[test]
    fn test_linear_objective_hits_caps() {
        // Maximize 3a + 2b + c with caps 0.5: put 0.5 in a, 0.5 in b
        let region = SimplexRegion::fully_invested(vec![0.5, 0.5, 0.5]).unwrap();
        let objective = |x: &[f64]| -> f64 { -(3.0 * x[0] + 2.0 * x[1] + x[2]) };

        let outcome = ProjectedGradient::default().minimize(&objective, &region, &[1.0 / 3.0; 3]);
        assert_abs_diff_eq!(outcome.solution[0], 0.5, epsilon = 1e-6);
        assert_abs_diff_eq!(outcome.solution[1], 0.5, epsilon = 1e-6);
        assert_abs_diff_eq!(outcome.solution[2], 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_iteration_cap_reports_non_convergence() {
        let region = SimplexRegion::fully_invested(vec![1.0, 1.0]).unwrap();
        let objective = |x: &[f64]| -> f64 { (x[0] - 0.7).powi(2) * 1e3 + x[1].sin() };

        let outcome = ProjectedGradient::new(1, 1e-12).minimize(&objective, &region, &[0.5, 0.5]);
        assert_eq!(outcome.iterations, 1);
        assert!(!outcome.converged);
        assert!(region.contains(&outcome.solution, 1e-9));
    }
}
