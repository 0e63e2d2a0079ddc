//! MACD (Moving Average Convergence Divergence).
//!
//! MACD line = MA(fast) - MA(slow), signal = MA(MACD line, signal_window),
//! hist = MACD line - signal. Which averages are exponential is controlled
//! separately for the line (`macd_ewm`) and the signal (`signal_ewm`).
//!
//! Warmup with defaults: slow - 1 bars for the line, plus signal - 1 for the
//! signal and histogram. The NaN head of the line shifts the signal's valid
//! region automatically.

use crate::domain::indicator::ma::rolling_mean;

/// Returns `(macd, signal, hist)`.
pub fn macd(
    close: &[f64],
    fast: usize,
    slow: usize,
    signal_window: usize,
    macd_ewm: bool,
    signal_ewm: bool,
) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
    let n = close.len();
    let fast_ma = rolling_mean(close, fast, macd_ewm);
    let slow_ma = rolling_mean(close, slow, macd_ewm);

    let mut line = Vec::with_capacity(n);
    for i in 0..n {
        line.push(fast_ma[i] - slow_ma[i]);
    }

    let signal = rolling_mean(&line, signal_window, signal_ewm);

    let mut hist = Vec::with_capacity(n);
    for i in 0..n {
        hist.push(line[i] - signal[i]);
    }

    (line, signal, hist)
}
