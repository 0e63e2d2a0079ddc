//! Indicator computation over pivoted price columns.
//!
//! Each module computes one indicator type as plain `Vec<f64>` series aligned
//! to the input index, with NaN during warmup. [`run_instance`] dispatches on
//! the instance kind and assembles the named outputs in catalog order,
//! including the pass-through input columns.

pub mod atr;
pub mod bbands;
pub mod ma;
pub mod macd;
pub mod mstd;
pub mod obv;
pub mod rsi;
pub mod stoch;

use crate::domain::catalog::IndicatorKind;
use crate::domain::error::EvalError;
use crate::domain::ohlcv::PriceSeries;
use crate::domain::session::IndicatorInstance;

/// Computed output series for one instance, parallel to the catalog entry's
/// output list.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluatedIndicator {
    pub kind: IndicatorKind,
    pub outputs: Vec<Vec<f64>>,
}

impl EvaluatedIndicator {
    pub fn output(&self, idx: usize) -> &[f64] {
        &self.outputs[idx]
    }
}

/// Fewest bars for which the instance produces at least one non-NaN value on
/// its primary output.
pub fn min_bars(inst: &IndicatorInstance) -> usize {
    match inst.kind {
        IndicatorKind::Ma => inst.int_param("window") as usize,
        IndicatorKind::Mstd => (inst.int_param("window") as usize).max(2),
        IndicatorKind::Atr => inst.int_param("window") as usize,
        IndicatorKind::Bbands => (inst.int_param("window") as usize).max(2),
        IndicatorKind::Macd => {
            inst.int_param("slow_window") as usize + inst.int_param("signal_window") as usize - 1
        }
        IndicatorKind::Obv => 1,
        IndicatorKind::Rsi => inst.int_param("window") as usize + 1,
        IndicatorKind::Stoch => {
            inst.int_param("k_window") as usize + inst.int_param("d_window") as usize - 1
        }
    }
}

/// Run one instance over one symbol's history.
pub fn run_instance(
    inst: &IndicatorInstance,
    series: &PriceSeries,
) -> Result<EvaluatedIndicator, EvalError> {
    if series.is_empty() {
        return Err(EvalError::EmptyHistory {
            symbol: series.symbol.clone(),
        });
    }

    let minimum = min_bars(inst);
    if series.len() < minimum {
        return Err(EvalError::InsufficientHistory {
            symbol: series.symbol.clone(),
            bars: series.len(),
            minimum,
        });
    }

    let outputs = match inst.kind {
        IndicatorKind::Ma => {
            let window = inst.int_param("window") as usize;
            let ewm = inst.bool_param("ewm");
            vec![
                ma::rolling_mean(&series.close, window, ewm),
                series.close.clone(),
            ]
        }
        IndicatorKind::Mstd => {
            let window = inst.int_param("window") as usize;
            let ewm = inst.bool_param("ewm");
            vec![
                mstd::rolling_std(&series.close, window, ewm),
                series.close.clone(),
            ]
        }
        IndicatorKind::Atr => {
            let window = inst.int_param("window") as usize;
            let ewm = inst.bool_param("ewm");
            let (atr, tr) =
                atr::average_true_range(&series.high, &series.low, &series.close, window, ewm);
            vec![
                atr,
                tr,
                series.high.clone(),
                series.low.clone(),
                series.close.clone(),
            ]
        }
        IndicatorKind::Bbands => {
            let window = inst.int_param("window") as usize;
            let ewm = inst.bool_param("ewm");
            let alpha = inst.float_param("alpha");
            let bands = bbands::bollinger_bands(&series.close, window, ewm, alpha);
            vec![
                bands.middle,
                bands.upper,
                bands.lower,
                bands.bandwidth,
                bands.percent_b,
                series.close.clone(),
            ]
        }
        IndicatorKind::Macd => {
            let fast = inst.int_param("fast_window") as usize;
            let slow = inst.int_param("slow_window") as usize;
            let signal_window = inst.int_param("signal_window") as usize;
            let macd_ewm = inst.bool_param("macd_ewm");
            let signal_ewm = inst.bool_param("signal_ewm");
            let (line, signal, hist) = macd::macd(
                &series.close,
                fast,
                slow,
                signal_window,
                macd_ewm,
                signal_ewm,
            );
            vec![line, signal, hist, series.close.clone()]
        }
        IndicatorKind::Obv => {
            vec![
                obv::on_balance_volume(&series.close, &series.volume),
                series.close.clone(),
                series.volume.clone(),
            ]
        }
        IndicatorKind::Rsi => {
            let window = inst.int_param("window") as usize;
            let ewm = inst.bool_param("ewm");
            vec![
                rsi::relative_strength_index(&series.close, window, ewm),
                series.close.clone(),
            ]
        }
        IndicatorKind::Stoch => {
            let k_window = inst.int_param("k_window") as usize;
            let d_window = inst.int_param("d_window") as usize;
            let d_ewm = inst.bool_param("d_ewm");
            let (percent_k, percent_d) = stoch::stochastic(
                &series.high,
                &series.low,
                &series.close,
                k_window,
                d_window,
                d_ewm,
            );
            vec![
                percent_k,
                percent_d,
                series.high.clone(),
                series.low.clone(),
                series.close.clone(),
            ]
        }
    };

    Ok(EvaluatedIndicator {
        kind: inst.kind,
        outputs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::{self, ParamValue};
    use crate::domain::ohlcv::OhlcvBar;
    use crate::domain::session::Session;
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    fn make_series(closes: &[f64]) -> PriceSeries {
        let bars: Vec<OhlcvBar> = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| OhlcvBar {
                symbol: "TEST".into(),
                date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Days::new(i as u64),
                open: close,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: 1000,
            })
            .collect();
        PriceSeries::from_bars("TEST", &bars)
    }

    fn instance(type_name: &str, pairs: &[(&str, ParamValue)]) -> IndicatorInstance {
        let mut session = Session::new();
        let params: BTreeMap<String, ParamValue> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        let id = session.add_instance(type_name, &params).unwrap();
        session.instance(id).clone()
    }

    #[test]
    fn outputs_align_with_catalog_entry() {
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + i as f64).collect();
        let series = make_series(&closes);

        for type_name in ["ATR", "BBANDS", "MA", "MACD", "MSTD", "OBV", "RSI", "STOCH"] {
            let inst = instance(type_name, &[]);
            let evaluated = run_instance(&inst, &series).unwrap();
            let spec = catalog::get_spec(inst.kind);

            assert_eq!(evaluated.outputs.len(), spec.outputs.len(), "{type_name}");
            for output in &evaluated.outputs {
                assert_eq!(output.len(), series.len(), "{type_name}");
            }
        }
    }

    #[test]
    fn empty_history_is_an_error() {
        let inst = instance("MA", &[]);
        let series = make_series(&[]);
        assert_eq!(
            run_instance(&inst, &series),
            Err(EvalError::EmptyHistory {
                symbol: "TEST".into()
            })
        );
    }

    #[test]
    fn insufficient_history_is_an_error() {
        let inst = instance("RSI", &[("window", ParamValue::Int(14))]);
        let series = make_series(&[100.0, 101.0, 102.0]);
        assert_eq!(
            run_instance(&inst, &series),
            Err(EvalError::InsufficientHistory {
                symbol: "TEST".into(),
                bars: 3,
                minimum: 15,
            })
        );
    }

    #[test]
    fn min_bars_per_kind() {
        assert_eq!(
            min_bars(&instance("MA", &[("window", ParamValue::Int(10))])),
            10
        );
        assert_eq!(
            min_bars(&instance("RSI", &[("window", ParamValue::Int(14))])),
            15
        );
        assert_eq!(min_bars(&instance("MACD", &[])), 26 + 9 - 1);
        assert_eq!(min_bars(&instance("STOCH", &[])), 14 + 3 - 1);
        assert_eq!(min_bars(&instance("OBV", &[])), 1);
    }

    #[test]
    fn pass_through_columns_copy_inputs() {
        let closes: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        let series = make_series(&closes);
        let inst = instance("MA", &[]);

        let evaluated = run_instance(&inst, &series).unwrap();
        assert_eq!(evaluated.output(1), series.close.as_slice());
    }
}
