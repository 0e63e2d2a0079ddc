//! RSI (Relative Strength Index).
//!
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss), 100 when avg_loss is zero.
//! `ewm = true` uses Wilder smoothing (first average is the simple mean of
//! the first `window` changes, then avg = (prev * (window - 1) + x) /
//! window); `ewm = false` averages the last `window` changes directly.
//!
//! Warmup: `window` price changes, so the first value lands at index
//! `window`.

pub fn relative_strength_index(close: &[f64], window: usize, ewm: bool) -> Vec<f64> {
    let n = close.len();
    let mut out = vec![f64::NAN; n];
    if window == 0 || n < window + 1 {
        return out;
    }

    let mut gains = Vec::with_capacity(n - 1);
    let mut losses = Vec::with_capacity(n - 1);
    for i in 1..n {
        let change = close[i] - close[i - 1];
        gains.push(if change > 0.0 { change } else { 0.0 });
        losses.push(if change < 0.0 { -change } else { 0.0 });
    }

    let mut avg_gain = gains[..window].iter().sum::<f64>() / window as f64;
    let mut avg_loss = losses[..window].iter().sum::<f64>() / window as f64;
    out[window] = rsi_value(avg_gain, avg_loss);

    for i in (window + 1)..n {
        let change_idx = i - 1;
        if ewm {
            avg_gain = (avg_gain * (window as f64 - 1.0) + gains[change_idx]) / window as f64;
            avg_loss = (avg_loss * (window as f64 - 1.0) + losses[change_idx]) / window as f64;
        } else {
            let lo = change_idx + 1 - window;
            avg_gain = gains[lo..=change_idx].iter().sum::<f64>() / window as f64;
            avg_loss = losses[lo..=change_idx].iter().sum::<f64>() / window as f64;
        }
        out[i] = rsi_value(avg_gain, avg_loss);
    }

    out
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        100.0
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}
