//! Moving average.
//!
//! `ewm = false` is a simple rolling mean; `ewm = true` is an exponential
//! mean seeded with the simple mean of the first window and smoothed with
//! k = 2 / (window + 1). Leading NaNs in the input (warmup of an upstream
//! series) shift the valid region right, so the same routine serves both raw
//! price columns and derived lines like MACD.

/// First index holding a finite value, if any.
pub(crate) fn first_finite(values: &[f64]) -> Option<usize> {
    values.iter().position(|v| v.is_finite())
}

pub fn rolling_mean(values: &[f64], window: usize, ewm: bool) -> Vec<f64> {
    let n = values.len();
    let mut out = vec![f64::NAN; n];
    if window == 0 {
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
        let seed = values[start..start + window].iter().sum::<f64>() / window as f64;
        let k = 2.0 / (window as f64 + 1.0);
        out[start + window - 1] = seed;

        let mut ema = seed;
        for i in (start + window)..n {
            ema = values[i] * k + ema * (1.0 - k);
            out[i] = ema;
        }
    } else {
        let mut sum: f64 = values[start..start + window].iter().sum();
        out[start + window - 1] = sum / window as f64;

        for i in (start + window)..n {
            sum += values[i] - values[i - window];
            out[i] = sum / window as f64;
        }
    }

    out
}
