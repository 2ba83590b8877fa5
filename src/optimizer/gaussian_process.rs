//! Gaussian Process regression for Bayesian optimization
//!
//! GP surrogate with RBF and Matern kernels plus the acquisition functions
//! used to rank candidate configurations. Everything here is phrased for
//! minimization; the tuning objective is already negated upstream.

use crate::error::{Result, TreeTuneError};
use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};

/// Kernel function types
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum KernelType {
    /// Radial Basis Function (squared exponential)
    RBF { length_scale: f64 },
    /// Matern kernel, closed forms for nu in {0.5, 1.5, 2.5}
    Matern { nu: f64, length_scale: f64 },
}

impl Default for KernelType {
    fn default() -> Self {
        KernelType::Matern { nu: 2.5, length_scale: 1.0 }
    }
}

fn kernel_value(x1: ArrayView1<f64>, x2: ArrayView1<f64>, kernel: &KernelType) -> f64 {
    let dist_sq: f64 = x1
        .iter()
        .zip(x2.iter())
        .map(|(a, b)| (a - b) * (a - b))
        .sum();

    match kernel {
        KernelType::RBF { length_scale } => {
            (-0.5 * dist_sq / (length_scale * length_scale)).exp()
        }
        KernelType::Matern { nu, length_scale } => {
            let dist = dist_sq.sqrt();
            if dist < 1e-12 {
                return 1.0;
            }
            let r = dist / length_scale;

            if (*nu - 0.5).abs() < 1e-6 {
                (-r).exp()
            } else if (*nu - 1.5).abs() < 1e-6 {
                let sqrt3 = 3.0_f64.sqrt();
                (1.0 + sqrt3 * r) * (-sqrt3 * r).exp()
            } else if (*nu - 2.5).abs() < 1e-6 {
                let sqrt5 = 5.0_f64.sqrt();
                (1.0 + sqrt5 * r + 5.0 / 3.0 * r * r) * (-sqrt5 * r).exp()
            } else {
                // No closed form for other nu, fall back to RBF shape
                (-0.5 * r * r).exp()
            }
        }
    }
}

fn compute_kernel(x1: &Array2<f64>, x2: &Array2<f64>, kernel: &KernelType) -> Array2<f64> {
    let n1 = x1.nrows();
    let n2 = x2.nrows();
    let mut k = Array2::zeros((n1, n2));
    for i in 0..n1 {
        for j in 0..n2 {
            k[[i, j]] = kernel_value(x1.row(i), x2.row(j), kernel);
        }
    }
    k
}

/// Acquisition function, evaluated in minimization terms.
///
/// Higher return values mean more promising candidates, so callers always
/// maximize the acquisition regardless of variant.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum AcquisitionFunction {
    /// Expected Improvement over the incumbent
    EI,
    /// Probability of Improvement over the incumbent
    PI,
    /// Negated Lower Confidence Bound, mean - kappa * std
    LCB { kappa: f64 },
}

impl Default for AcquisitionFunction {
    fn default() -> Self {
        AcquisitionFunction::EI
    }
}

impl AcquisitionFunction {
    pub fn evaluate(&self, mean: f64, std: f64, best_y: f64) -> f64 {
        let std = std.max(1e-10);
        match self {
            AcquisitionFunction::EI => {
                let improvement = best_y - mean;
                let z = improvement / std;
                improvement * normal_cdf(z) + std * normal_pdf(z)
            }
            AcquisitionFunction::PI => normal_cdf((best_y - mean) / std),
            AcquisitionFunction::LCB { kappa } => -(mean - kappa * std),
        }
    }
}

/// Gaussian Process regression model
#[derive(Debug, Clone)]
pub struct GaussianProcess {
    kernel: KernelType,
    /// Noise variance added to the kernel diagonal
    noise: f64,
    x_train: Option<Array2<f64>>,
    /// Cholesky factor of K + noise * I
    l_chol: Option<Array2<f64>>,
    /// (K + noise * I)^-1 y, precomputed for prediction
    alpha: Option<Array1<f64>>,
    y_mean: f64,
    y_std: f64,
}

impl GaussianProcess {
    pub fn new(kernel: KernelType) -> Self {
        Self {
            kernel,
            noise: 1e-6,
            x_train: None,
            l_chol: None,
            alpha: None,
            y_mean: 0.0,
            y_std: 1.0,
        }
    }

    pub fn with_noise(mut self, noise: f64) -> Self {
        self.noise = noise.max(1e-10);
        self
    }

    /// Fit the GP to observed points
    pub fn fit(&mut self, x: Array2<f64>, y: Array1<f64>) -> Result<()> {
        let n = y.len();
        if n == 0 {
            return Err(TreeTuneError::OptimizationError(
                "cannot fit a Gaussian process on zero observations".to_string(),
            ));
        }
        if x.nrows() != n {
            return Err(TreeTuneError::ShapeError {
                expected: format!("{} rows", n),
                actual: format!("{} rows", x.nrows()),
            });
        }

        // Normalize targets so kernel hyperparameters stay in a sane range
        self.y_mean = y.mean().unwrap_or(0.0);
        self.y_std = y.std(0.0);
        if self.y_std < 1e-10 {
            self.y_std = 1.0;
        }
        let y_normalized: Array1<f64> = y.iter().map(|&yi| (yi - self.y_mean) / self.y_std).collect();

        let mut k = compute_kernel(&x, &x, &self.kernel);
        for i in 0..n {
            k[[i, i]] += self.noise;
        }

        let l = cholesky(&k);
        let alpha = solve_cholesky_system(&l, &y_normalized);

        self.x_train = Some(x);
        self.l_chol = Some(l);
        self.alpha = Some(alpha);
        Ok(())
    }

    /// Posterior mean and variance at test points
    pub fn predict(&self, x_test: &Array2<f64>) -> Result<(Array1<f64>, Array1<f64>)> {
        let (x_train, l, alpha) = match (&self.x_train, &self.l_chol, &self.alpha) {
            (Some(x), Some(l), Some(a)) => (x, l, a),
            _ => return Err(TreeTuneError::ModelNotFitted),
        };
        if x_test.ncols() != x_train.ncols() {
            return Err(TreeTuneError::ShapeError {
                expected: format!("{} columns", x_train.ncols()),
                actual: format!("{} columns", x_test.ncols()),
            });
        }

        let k_star = compute_kernel(x_test, x_train, &self.kernel);
        let mean: Array1<f64> = k_star
            .dot(alpha)
            .iter()
            .map(|&m| m * self.y_std + self.y_mean)
            .collect();

        let n_test = x_test.nrows();
        let mut var = Array1::zeros(n_test);
        for i in 0..n_test {
            let k_self = kernel_value(x_test.row(i), x_test.row(i), &self.kernel);
            let v = solve_lower_triangular(l, &k_star.row(i).to_owned());
            var[i] = (k_self - v.dot(&v)).max(1e-10) * self.y_std * self.y_std;
        }

        Ok((mean, var))
    }
}

/// Plain Cholesky decomposition, diagonal clamped for stability
fn cholesky(a: &Array2<f64>) -> Array2<f64> {
    let n = a.nrows();
    let mut l = Array2::zeros((n, n));

    for i in 0..n {
        for j in 0..=i {
            let mut sum = 0.0;
            if i == j {
                for k in 0..j {
                    sum += l[[j, k]] * l[[j, k]];
                }
                l[[j, j]] = (a[[j, j]] - sum).max(1e-10).sqrt();
            } else {
                for k in 0..j {
                    sum += l[[i, k]] * l[[j, k]];
                }
                l[[i, j]] = (a[[i, j]] - sum) / l[[j, j]].max(1e-10);
            }
        }
    }
    l
}

/// Solve L x = b for lower triangular L
fn solve_lower_triangular(l: &Array2<f64>, b: &Array1<f64>) -> Array1<f64> {
    let n = b.len();
    let mut x = Array1::zeros(n);
    for i in 0..n {
        let mut sum = b[i];
        for j in 0..i {
            sum -= l[[i, j]] * x[j];
        }
        x[i] = sum / l[[i, i]].max(1e-10);
    }
    x
}

/// Solve L L^T x = b
fn solve_cholesky_system(l: &Array2<f64>, b: &Array1<f64>) -> Array1<f64> {
    let n = b.len();
    let y = solve_lower_triangular(l, b);

    let mut x = Array1::zeros(n);
    for i in (0..n).rev() {
        let mut sum = y[i];
        for j in (i + 1)..n {
            sum -= l[[j, i]] * x[j];
        }
        x[i] = sum / l[[i, i]].max(1e-10);
    }
    x
}

/// Standard normal CDF
pub(crate) fn normal_cdf(x: f64) -> f64 {
    0.5 * (1.0 + erf(x / std::f64::consts::SQRT_2))
}

/// Standard normal PDF
pub(crate) fn normal_pdf(x: f64) -> f64 {
    (-0.5 * x * x).exp() / (2.0 * std::f64::consts::PI).sqrt()
}

/// Error function approximation (Abramowitz and Stegun 7.1.26)
fn erf(x: f64) -> f64 {
    let a1 = 0.254829592;
    let a2 = -0.284496736;
    let a3 = 1.421413741;
    let a4 = -1.453152027;
    let a5 = 1.061405429;
    let p = 0.3275911;

    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();

    let t = 1.0 / (1.0 + p * x);
    let y = 1.0 - (((((a5 * t + a4) * t) + a3) * t + a2) * t + a1) * t * (-x * x).exp();

    sign * y
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kernel_identity() {
        let x = Array1::from_vec(vec![0.3, 0.7]);
        for kernel in [
            KernelType::RBF { length_scale: 1.0 },
            KernelType::Matern { nu: 2.5, length_scale: 1.0 },
        ] {
            let k = kernel_value(x.view(), x.view(), &kernel);
            assert!((k - 1.0).abs() < 1e-9, "same point should have kernel 1.0");
        }
    }

    #[test]
    fn test_kernel_decays_with_distance() {
        let a = Array1::from_vec(vec![0.0]);
        let b = Array1::from_vec(vec![0.5]);
        let c = Array1::from_vec(vec![2.0]);
        let kernel = KernelType::Matern { nu: 2.5, length_scale: 1.0 };

        let k_near = kernel_value(a.view(), b.view(), &kernel);
        let k_far = kernel_value(a.view(), c.view(), &kernel);
        assert!(k_near > k_far);
        assert!(k_far > 0.0);
    }

    #[test]
    fn test_gp_fit_predict() {
        let mut gp = GaussianProcess::new(KernelType::RBF { length_scale: 1.0 });

        // y = x^2 on a small grid
        let x_train = Array2::from_shape_vec((5, 1), vec![-2.0, -1.0, 0.0, 1.0, 2.0]).unwrap();
        let y_train = Array1::from_vec(vec![4.0, 1.0, 0.0, 1.0, 4.0]);
        gp.fit(x_train, y_train).unwrap();

        let x_test = Array2::from_shape_vec((3, 1), vec![-1.0, 0.0, 1.0]).unwrap();
        let (mean, var) = gp.predict(&x_test).unwrap();

        assert!((mean[0] - 1.0).abs() < 0.2, "mean at x=-1 was {}", mean[0]);
        assert!(mean[1].abs() < 0.2, "mean at x=0 was {}", mean[1]);
        assert!(var.iter().all(|&v| v > 0.0), "variance must stay positive");
    }

    #[test]
    fn test_gp_predict_before_fit_fails() {
        let gp = GaussianProcess::new(KernelType::default());
        let x = Array2::zeros((1, 2));
        assert!(matches!(gp.predict(&x), Err(TreeTuneError::ModelNotFitted)));
    }

    #[test]
    fn test_ei_rewards_improvement() {
        let acq = AcquisitionFunction::EI;
        // Candidate mean well below the incumbent should score higher
        let good = acq.evaluate(0.1, 0.1, 1.0);
        let bad = acq.evaluate(2.0, 0.1, 1.0);
        assert!(good > bad);
        assert!(good > 0.0);
    }

    #[test]
    fn test_lcb_prefers_low_mean() {
        let acq = AcquisitionFunction::LCB { kappa: 1.96 };
        let low_mean = acq.evaluate(0.1, 0.1, 0.0);
        let high_mean = acq.evaluate(1.0, 0.1, 0.0);
        assert!(low_mean > high_mean);
    }

    #[test]
    fn test_normal_cdf() {
        assert!((normal_cdf(0.0) - 0.5).abs() < 1e-7);
        assert!(normal_cdf(-3.0) < 0.01);
        assert!(normal_cdf(3.0) > 0.99);
    }
}
