//! Stochastic oscillator.
//!
//! %K = 100 * (close - lowest_low) / (highest_high - lowest_low) over
//! `k_window` bars; %D is a moving average of %K over `d_window` bars
//! (exponential when `d_ewm`). A flat window (highest == lowest) leaves %K
//! as NaN.

use crate::domain::indicator::ma::rolling_mean;

/// Returns `(percent_k, percent_d)`.
pub fn stochastic(
    high: &[f64],
    low: &[f64],
    close: &[f64],
    k_window: usize,
    d_window: usize,
    d_ewm: bool,
) -> (Vec<f64>, Vec<f64>) {
    let n = close.len();
    let mut percent_k = vec![f64::NAN; n];
    if k_window == 0 || n < k_window {
        return (percent_k.clone(), vec![f64::NAN; n]);
    }

    for i in (k_window - 1)..n {
        let lo = i + 1 - k_window;
        let mut highest = high[lo];
        let mut lowest = low[lo];
        for j in (lo + 1)..=i {
            highest = highest.max(high[j]);
            lowest = lowest.min(low[j]);
        }

        let range = highest - lowest;
        if range > 0.0 {
            percent_k[i] = 100.0 * (close[i] - lowest) / range;
        }
    }

    let percent_d = rolling_mean(&percent_k, d_window, d_ewm);
    (percent_k, percent_d)
}
