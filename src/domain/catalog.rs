//! Static indicator catalog.
//!
//! One entry per supported indicator type: the ordered parameter list with
//! defaults, the input-series group the type consumes, and the named outputs
//! it produces (primary output first, pass-through input columns last). The
//! operator vocabulary of an entry is its outputs crossed with the five
//! comparisons, spelled `<output>_<comparison>` (e.g. `rsi_below`,
//! `close_crossed_above`).

use crate::domain::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorKind {
    Atr,
    Bbands,
    Ma,
    Macd,
    Mstd,
    Obv,
    Rsi,
    Stoch,
}

pub const ALL_KINDS: [IndicatorKind; 8] = [
    IndicatorKind::Atr,
    IndicatorKind::Bbands,
    IndicatorKind::Ma,
    IndicatorKind::Macd,
    IndicatorKind::Mstd,
    IndicatorKind::Obv,
    IndicatorKind::Rsi,
    IndicatorKind::Stoch,
];

impl fmt::Display for IndicatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IndicatorKind::Atr => "ATR",
            IndicatorKind::Bbands => "BBANDS",
            IndicatorKind::Ma => "MA",
            IndicatorKind::Macd => "MACD",
            IndicatorKind::Mstd => "MSTD",
            IndicatorKind::Obv => "OBV",
            IndicatorKind::Rsi => "RSI",
            IndicatorKind::Stoch => "STOCH",
        };
        write!(f, "{name}")
    }
}

impl FromStr for IndicatorKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "ATR" => Ok(IndicatorKind::Atr),
            "BBANDS" => Ok(IndicatorKind::Bbands),
            "MA" => Ok(IndicatorKind::Ma),
            "MACD" => Ok(IndicatorKind::Macd),
            "MSTD" => Ok(IndicatorKind::Mstd),
            "OBV" => Ok(IndicatorKind::Obv),
            "RSI" => Ok(IndicatorKind::Rsi),
            "STOCH" => Ok(IndicatorKind::Stoch),
            _ => Err(ConfigError::UnknownIndicatorType(s.to_string())),
        }
    }
}

/// Which shared input columns an indicator reads. The evaluator materializes
/// each group once per symbol, not once per instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputGroup {
    Close,
    HighLowClose,
    CloseVolume,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Int,
    Float,
    Bool,
    Text,
}

/// A parameter value supplied by the user or filled from the catalog default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

impl ParamValue {
    pub fn kind(&self) -> ParamKind {
        match self {
            ParamValue::Int(_) => ParamKind::Int,
            ParamValue::Float(_) => ParamKind::Float,
            ParamValue::Bool(_) => ParamKind::Bool,
            ParamValue::Text(_) => ParamKind::Text,
        }
    }
}

/// Const-friendly default for a catalog parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamDefault {
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(&'static str),
}

impl ParamDefault {
    pub fn to_value(self) -> ParamValue {
        match self {
            ParamDefault::Int(v) => ParamValue::Int(v),
            ParamDefault::Float(v) => ParamValue::Float(v),
            ParamDefault::Bool(v) => ParamValue::Bool(v),
            ParamDefault::Text(v) => ParamValue::Text(v.to_string()),
        }
    }

    pub fn kind(self) -> ParamKind {
        match self {
            ParamDefault::Int(_) => ParamKind::Int,
            ParamDefault::Float(_) => ParamKind::Float,
            ParamDefault::Bool(_) => ParamKind::Bool,
            ParamDefault::Text(_) => ParamKind::Text,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub default: ParamDefault,
}

/// Static catalog entry for one indicator type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorSpec {
    pub kind: IndicatorKind,
    pub params: &'static [ParamSpec],
    pub input_group: InputGroup,
    /// Named outputs, primary first. Pass-through input columns come last so
    /// operators like `close_above` resolve against any instance that reads
    /// that column.
    pub outputs: &'static [&'static str],
}

/// The five comparison verbs an operator can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparison {
    Above,
    Below,
    CrossedAbove,
    CrossedBelow,
    Equal,
}

pub const ALL_COMPARISONS: [Comparison; 5] = [
    Comparison::Above,
    Comparison::Below,
    Comparison::CrossedAbove,
    Comparison::CrossedBelow,
    Comparison::Equal,
];

impl Comparison {
    pub fn suffix(self) -> &'static str {
        match self {
            Comparison::Above => "above",
            Comparison::Below => "below",
            Comparison::CrossedAbove => "crossed_above",
            Comparison::CrossedBelow => "crossed_below",
            Comparison::Equal => "equal",
        }
    }
}

impl IndicatorSpec {
    /// Primary output name (the series an unqualified RHS reference means).
    pub fn primary_output(&self) -> &'static str {
        self.outputs[0]
    }

    pub fn output_index(&self, name: &str) -> Option<usize> {
        self.outputs.iter().position(|o| *o == name)
    }

    /// Every operator this type supports: outputs crossed with the five
    /// comparisons.
    pub fn operators(&self) -> Vec<String> {
        let mut ops = Vec::with_capacity(self.outputs.len() * ALL_COMPARISONS.len());
        for output in self.outputs {
            for cmp in ALL_COMPARISONS {
                ops.push(format!("{}_{}", output, cmp.suffix()));
            }
        }
        ops
    }

    pub fn param(&self, name: &str) -> Option<&'static ParamSpec> {
        self.params.iter().find(|p| p.name == name)
    }
}

const ATR_SPEC: IndicatorSpec = IndicatorSpec {
    kind: IndicatorKind::Atr,
    params: &[
        ParamSpec { name: "window", default: ParamDefault::Int(14) },
        ParamSpec { name: "ewm", default: ParamDefault::Bool(true) },
        ParamSpec { name: "short_name", default: ParamDefault::Text("atr") },
    ],
    input_group: InputGroup::HighLowClose,
    outputs: &["atr", "tr", "high", "low", "close"],
};

const BBANDS_SPEC: IndicatorSpec = IndicatorSpec {
    kind: IndicatorKind::Bbands,
    params: &[
        ParamSpec { name: "window", default: ParamDefault::Int(20) },
        ParamSpec { name: "ewm", default: ParamDefault::Bool(false) },
        ParamSpec { name: "alpha", default: ParamDefault::Float(2.0) },
        ParamSpec { name: "short_name", default: ParamDefault::Text("bb") },
    ],
    input_group: InputGroup::Close,
    outputs: &["middle", "upper", "lower", "bandwidth", "percent_b", "close"],
};

const MA_SPEC: IndicatorSpec = IndicatorSpec {
    kind: IndicatorKind::Ma,
    params: &[
        ParamSpec { name: "window", default: ParamDefault::Int(10) },
        ParamSpec { name: "ewm", default: ParamDefault::Bool(false) },
        ParamSpec { name: "short_name", default: ParamDefault::Text("ma") },
    ],
    input_group: InputGroup::Close,
    outputs: &["ma", "close"],
};

const MACD_SPEC: IndicatorSpec = IndicatorSpec {
    kind: IndicatorKind::Macd,
    params: &[
        ParamSpec { name: "fast_window", default: ParamDefault::Int(12) },
        ParamSpec { name: "slow_window", default: ParamDefault::Int(26) },
        ParamSpec { name: "signal_window", default: ParamDefault::Int(9) },
        ParamSpec { name: "macd_ewm", default: ParamDefault::Bool(false) },
        ParamSpec { name: "signal_ewm", default: ParamDefault::Bool(false) },
        ParamSpec { name: "short_name", default: ParamDefault::Text("macd") },
    ],
    input_group: InputGroup::Close,
    outputs: &["macd", "signal", "hist", "close"],
};

const MSTD_SPEC: IndicatorSpec = IndicatorSpec {
    kind: IndicatorKind::Mstd,
    params: &[
        ParamSpec { name: "window", default: ParamDefault::Int(10) },
        ParamSpec { name: "ewm", default: ParamDefault::Bool(false) },
        ParamSpec { name: "short_name", default: ParamDefault::Text("mstd") },
    ],
    input_group: InputGroup::Close,
    outputs: &["mstd", "close"],
};

const OBV_SPEC: IndicatorSpec = IndicatorSpec {
    kind: IndicatorKind::Obv,
    params: &[
        ParamSpec { name: "short_name", default: ParamDefault::Text("obv") },
    ],
    input_group: InputGroup::CloseVolume,
    outputs: &["obv", "close", "volume"],
};

const RSI_SPEC: IndicatorSpec = IndicatorSpec {
    kind: IndicatorKind::Rsi,
    params: &[
        ParamSpec { name: "window", default: ParamDefault::Int(14) },
        ParamSpec { name: "ewm", default: ParamDefault::Bool(false) },
        ParamSpec { name: "short_name", default: ParamDefault::Text("rsi") },
    ],
    input_group: InputGroup::Close,
    outputs: &["rsi", "close"],
};

const STOCH_SPEC: IndicatorSpec = IndicatorSpec {
    kind: IndicatorKind::Stoch,
    params: &[
        ParamSpec { name: "k_window", default: ParamDefault::Int(14) },
        ParamSpec { name: "d_window", default: ParamDefault::Int(3) },
        ParamSpec { name: "d_ewm", default: ParamDefault::Bool(false) },
        ParamSpec { name: "short_name", default: ParamDefault::Text("stoch") },
    ],
    input_group: InputGroup::HighLowClose,
    outputs: &["percent_k", "percent_d", "high", "low", "close"],
};

pub fn get_spec(kind: IndicatorKind) -> &'static IndicatorSpec {
    match kind {
        IndicatorKind::Atr => &ATR_SPEC,
        IndicatorKind::Bbands => &BBANDS_SPEC,
        IndicatorKind::Ma => &MA_SPEC,
        IndicatorKind::Macd => &MACD_SPEC,
        IndicatorKind::Mstd => &MSTD_SPEC,
        IndicatorKind::Obv => &OBV_SPEC,
        IndicatorKind::Rsi => &RSI_SPEC,
        IndicatorKind::Stoch => &STOCH_SPEC,
    }
}

/// Look up a catalog entry by type name.
pub fn lookup(type_name: &str) -> Result<&'static IndicatorSpec, ConfigError> {
    let kind = IndicatorKind::from_str(type_name)?;
    Ok(get_spec(kind))
}

/// Startup-time sanity check over every catalog entry. A failure here means
/// the binary itself is broken and must not serve commands.
pub fn verify_catalog() -> Result<(), ConfigError> {
    for kind in ALL_KINDS {
        let spec = get_spec(kind);

        if spec.outputs.is_empty() {
            return Err(ConfigError::BadCatalogEntry {
                indicator: kind.to_string(),
                reason: "no outputs".into(),
            });
        }

        for (i, output) in spec.outputs.iter().enumerate() {
            if spec.outputs[..i].contains(output) {
                return Err(ConfigError::BadCatalogEntry {
                    indicator: kind.to_string(),
                    reason: format!("duplicate output '{output}'"),
                });
            }
        }

        for (i, param) in spec.params.iter().enumerate() {
            if spec.params[..i].iter().any(|p| p.name == param.name) {
                return Err(ConfigError::BadCatalogEntry {
                    indicator: kind.to_string(),
                    reason: format!("duplicate parameter '{}'", param.name),
                });
            }
            if let ParamDefault::Int(v) = param.default {
                if param.name.ends_with("window") && v < 1 {
                    return Err(ConfigError::BadCatalogEntry {
                        indicator: kind.to_string(),
                        reason: format!("non-positive default for '{}'", param.name),
                    });
                }
            }
        }

        if spec.param("short_name").is_none() {
            return Err(ConfigError::BadCatalogEntry {
                indicator: kind.to_string(),
                reason: "missing short_name parameter".into(),
            });
        }
    }

    Ok(())
}
