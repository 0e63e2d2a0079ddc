//! OBV (On-Balance Volume).
//!
//! Running total of volume, added on up-closes and subtracted on
//! down-closes. The first bar seeds the total with its own volume. No
//! warmup: every bar has a value.

pub fn on_balance_volume(close: &[f64], volume: &[f64]) -> Vec<f64> {
    let n = close.len();
    let mut out = Vec::with_capacity(n);
    if n == 0 {
        return out;
    }

    let mut total = volume[0];
    out.push(total);

    for i in 1..n {
        if close[i] > close[i - 1] {
            total += volume[i];
        } else if close[i] < close[i - 1] {
            total -= volume[i];
        }
        out.push(total);
    }

    out
}
