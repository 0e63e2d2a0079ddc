//! Moving standard deviation.
//!
//! `ewm = false` is a rolling sample standard deviation (ddof = 1, so window
//! must be at least 2 for any value). `ewm = true` tracks exponential means
//! of x and x² with the same seeding as the exponential mean and takes
//! sqrt(E[x²] - E[x]²), floored at zero against rounding.

use crate::domain::indicator::ma::first_finite;

pub fn rolling_std(values: &[f64], window: usize, ewm: bool) -> Vec<f64> {
    let n = values.len();
    let mut out = vec![f64::NAN; n];
    if window < 2 {
        return out;
    }

    let start = match first_finite(values) {
        Some(start) => start,
        None => return out,
    };
    if n - start < window {
        return out;
    }

    if ewm {
        let k = 2.0 / (window as f64 + 1.0);
        let seed = &values[start..start + window];
        let mut mean = seed.iter().sum::<f64>() / window as f64;
        let mut mean_sq = seed.iter().map(|v| v * v).sum::<f64>() / window as f64;
        out[start + window - 1] = (mean_sq - mean * mean).max(0.0).sqrt();

        for i in (start + window)..n {
            mean = values[i] * k + mean * (1.0 - k);
            mean_sq = values[i] * values[i] * k + mean_sq * (1.0 - k);
            out[i] = (mean_sq - mean * mean).max(0.0).sqrt();
        }
    } else {
        let mut sum: f64 = values[start..start + window].iter().sum();
        let mut sum_sq: f64 = values[start..start + window].iter().map(|v| v * v).sum();
        let w = window as f64;

        out[start + window - 1] = ((sum_sq - sum * sum / w) / (w - 1.0)).max(0.0).sqrt();
        for i in (start + window)..n {
            sum += values[i] - values[i - window];
            sum_sq += values[i] * values[i] - values[i - window] * values[i - window];
            out[i] = ((sum_sq - sum * sum / w) / (w - 1.0)).max(0.0).sqrt();
        }
    }

    out
}
