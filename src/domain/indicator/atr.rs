//! Average True Range.
//!
//! TR[0] = high - low; afterwards
//! TR = max(high - low, |high - prev_close|, |low - prev_close|).
//!
//! `ewm = true` applies Wilder smoothing: the first value is the simple mean
//! of the first `window` true ranges, then
//! ATR = (prev_ATR * (window - 1) + TR) / window. `ewm = false` is a plain
//! rolling mean of TR.

use crate::domain::indicator::ma::rolling_mean;

pub fn true_range(high: &[f64], low: &[f64], close: &[f64]) -> Vec<f64> {
    let n = close.len();
    let mut tr = Vec::with_capacity(n);

    for i in 0..n {
        if i == 0 {
            tr.push(high[0] - low[0]);
        } else {
            let prev_close = close[i - 1];
            let hl = high[i] - low[i];
            let hc = (high[i] - prev_close).abs();
            let lc = (low[i] - prev_close).abs();
            tr.push(hl.max(hc).max(lc));
        }
    }

    tr
}

/// Returns `(atr, tr)`.
pub fn average_true_range(
    high: &[f64],
    low: &[f64],
    close: &[f64],
    window: usize,
    ewm: bool,
) -> (Vec<f64>, Vec<f64>) {
    let tr = true_range(high, low, close);
    let n = tr.len();
    if window == 0 || n < window {
        return (vec![f64::NAN; n], tr);
    }

    let atr = if ewm {
        let mut atr = vec![f64::NAN; n];
        let mut value = tr[..window].iter().sum::<f64>() / window as f64;
        atr[window - 1] = value;

        for i in window..n {
            value = (value * (window as f64 - 1.0) + tr[i]) / window as f64;
            atr[i] = value;
        }
        atr
    } else {
        rolling_mean(&tr, window, false)
    };

    (atr, tr)
}
