//! Least-squares quadratic trend fit
//!
//! Solves the 3×3 normal equations with partial pivoting. The abscissa is
//! scaled to `[-1, 1]` before the sums are built so that windows spanning
//! minutes of milliseconds stay well conditioned; coefficients are mapped
//! back to the original units afterwards.

use super::{FeatureError, QuadFit, Window};

/// Fit `y = a·x² + b·x + c` over raw points
pub fn fit_quadratic(points: &[(f64, f64)]) -> Result<QuadFit, FeatureError> {
    if points.is_empty() {
        return Err(FeatureError::NoSamples);
    }
    let n = points.len() as f64;

    let scale = points
        .iter()
        .map(|(x, _)| x.abs())
        .fold(0.0_f64, f64::max);
    if scale == 0.0 {
        return Err(FeatureError::SingularSystem);
    }

    // Power sums of the scaled abscissa and moments of y
    let mut xs = [0.0_f64; 5];
    let mut ys = [0.0_f64; 3];
    for (x, y) in points {
        let u = x / scale;
        let mut p = 1.0;
        for (k, sum) in xs.iter_mut().enumerate() {
            *sum += p;
            if k < 3 {
                ys[k] += p * y;
            }
            p *= u;
        }
    }

    let mut system = [[0.0_f64; 4]; 3];
    for (i, row) in system.iter_mut().enumerate() {
        row[..3].copy_from_slice(&xs[i..i + 3]);
        row[3] = ys[i];
    }
    let [c, b_scaled, a_scaled] = solve3(system, n * 1e-10)?;

    let y_mean = ys[0] / n;
    let mut ss_tot = 0.0;
    let mut ss_res = 0.0;
    for (x, y) in points {
        let u = x / scale;
        let predicted = c + b_scaled * u + a_scaled * u * u;
        ss_tot += (y - y_mean) * (y - y_mean);
        ss_res += (y - predicted) * (y - predicted);
    }
    if ss_tot <= 1e-12 * n * (1.0 + y_mean * y_mean) {
        return Err(FeatureError::ConstantSeries);
    }

    Ok(QuadFit {
        a: a_scaled / (scale * scale),
        b: b_scaled / scale,
        c,
        r_squared: 1.0 - ss_res / ss_tot,
        samples: points.len(),
    })
}

/// Gaussian elimination with partial pivoting on an augmented 3×4 system
fn solve3(mut m: [[f64; 4]; 3], tolerance: f64) -> Result<[f64; 3], FeatureError> {
    for col in 0..3 {
        let pivot = (col..3)
            .max_by(|&i, &j| m[i][col].abs().total_cmp(&m[j][col].abs()))
            .unwrap_or(col);
        if m[pivot][col].abs() <= tolerance {
            return Err(FeatureError::SingularSystem);
        }
        m.swap(col, pivot);
        for row in col + 1..3 {
            let ratio = m[row][col] / m[col][col];
            for k in col..4 {
                m[row][k] -= ratio * m[col][k];
            }
        }
    }

    let mut z = [0.0_f64; 3];
    for row in (0..3).rev() {
        let tail: f64 = (row + 1..3).map(|k| m[row][k] * z[k]).sum();
        z[row] = (m[row][3] - tail) / m[row][row];
    }
    Ok(z)
}

/// Fits quadratic trends over windows
#[derive(Debug, Clone, Copy, Default)]
pub struct QuadraticFitter;

impl QuadraticFitter {
    /// Fit a window; incomplete windows report insufficient history
    pub fn fit(&self, window: &Window) -> Result<QuadFit, FeatureError> {
        if !window.complete {
            return Err(FeatureError::InsufficientHistory {
                width_ms: window.width_ms,
            });
        }
        fit_quadratic(&window.points())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::RingBuffer;

    fn close(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol * (1.0 + b.abs())
    }

    #[test]
    fn test_recovers_exact_quadratic() {
        let (a, b, c) = (2.0e-7, -3.0e-3, 1.5);
        let points: Vec<(f64, f64)> = (0..60)
            .map(|i| {
                let x = -(i as f64) * 1000.0;
                (x, a * x * x + b * x + c)
            })
            .collect();

        let fit = fit_quadratic(&points).unwrap();
        assert!(close(fit.a, a, 1e-9), "a = {}", fit.a);
        assert!(close(fit.b, b, 1e-9), "b = {}", fit.b);
        assert!(close(fit.c, c, 1e-9), "c = {}", fit.c);
        assert!(close(fit.r_squared, 1.0, 1e-9));
        assert_eq!(fit.samples, 60);
    }

    #[test]
    fn test_three_tick_scenario() {
        let mut ring = RingBuffer::new(8);
        ring.append(0, 100_000);
        ring.append(1000, 100_050);
        ring.append(2000, 100_100);
        let window = Window::collect(&ring, 2, 3000, 100_000).unwrap();

        // direct fit over all three points
        let fit = fit_quadratic(&window.points()).unwrap();
        assert!(fit.a.abs() < 1e-9);
        assert!(close(fit.r_squared, 1.0, 1e-9));
        assert!(fit.b > 0.0);
    }

    #[test]
    fn test_noisy_fit_has_partial_r_squared() {
        let points: Vec<(f64, f64)> = (0..50)
            .map(|i| {
                let x = i as f64;
                let noise = if i % 2 == 0 { 3.0 } else { -3.0 };
                (x, 0.5 * x + noise)
            })
            .collect();
        let fit = fit_quadratic(&points).unwrap();
        assert!(fit.r_squared > 0.0 && fit.r_squared < 1.0);
    }

    #[test]
    fn test_no_samples() {
        assert_eq!(fit_quadratic(&[]).unwrap_err(), FeatureError::NoSamples);
    }

    #[test]
    fn test_two_distinct_times_is_singular() {
        let points = [(0.0, 1.0), (-10.0, 2.0), (-10.0, 3.0), (0.0, 4.0)];
        assert_eq!(
            fit_quadratic(&points).unwrap_err(),
            FeatureError::SingularSystem
        );
    }

    #[test]
    fn test_single_time_is_singular() {
        let points = [(0.0, 1.0), (0.0, 2.0)];
        assert_eq!(
            fit_quadratic(&points).unwrap_err(),
            FeatureError::SingularSystem
        );
    }

    #[test]
    fn test_constant_series() {
        let points = [(0.0, -49.95), (-500.0, -49.95), (-1000.0, -49.95)];
        assert_eq!(
            fit_quadratic(&points).unwrap_err(),
            FeatureError::ConstantSeries
        );
    }

    #[test]
    fn test_fitter_skips_incomplete_window() {
        let mut ring = RingBuffer::new(8);
        ring.append(0, 100_000);
        ring.append(1000, 100_050);
        let window = Window::collect(&ring, 1, 5000, 100_000).unwrap();
        assert_eq!(
            QuadraticFitter.fit(&window).unwrap_err(),
            FeatureError::InsufficientHistory { width_ms: 5000 }
        );
    }
}
