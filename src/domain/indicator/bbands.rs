//! Bollinger Bands.
//!
//! middle = moving average of close, upper/lower = middle ± alpha * moving
//! std, bandwidth = (upper - lower) / middle, %B = (close - lower) /
//! (upper - lower). A zero-width band leaves %B as NaN.

use crate::domain::indicator::ma::rolling_mean;
use crate::domain::indicator::mstd::rolling_std;

#[derive(Debug, Clone)]
pub struct BollingerBands {
    pub middle: Vec<f64>,
    pub upper: Vec<f64>,
    pub lower: Vec<f64>,
    pub bandwidth: Vec<f64>,
    pub percent_b: Vec<f64>,
}

pub fn bollinger_bands(close: &[f64], window: usize, ewm: bool, alpha: f64) -> BollingerBands {
    let n = close.len();
    let middle = rolling_mean(close, window, ewm);
    let std = rolling_std(close, window, ewm);

    let mut upper = Vec::with_capacity(n);
    let mut lower = Vec::with_capacity(n);
    let mut bandwidth = Vec::with_capacity(n);
    let mut percent_b = Vec::with_capacity(n);

    for i in 0..n {
        let up = middle[i] + alpha * std[i];
        let lo = middle[i] - alpha * std[i];
        upper.push(up);
        lower.push(lo);
        bandwidth.push((up - lo) / middle[i]);
        let width = up - lo;
        if width.abs() > 0.0 {
            percent_b.push((close[i] - lo) / width);
        } else {
            percent_b.push(f64::NAN);
        }
    }

    BollingerBands {
        middle,
        upper,
        lower,
        bandwidth,
        percent_b,
    }
}
