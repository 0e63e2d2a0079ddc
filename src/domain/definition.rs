//! Serializable scan and backtest definitions.
//!
//! A definition file is the declarative surface of the engine: an ordered
//! indicator list (type name plus parameter map) and ordered clause lists.
//! `build` replays it into a session and compiled expressions, so a
//! round-tripped definition evaluates identically to the original.

use crate::domain::backtest::Side;
use crate::domain::catalog::ParamValue;
use crate::domain::error::{ConfigError, TascanError};
use crate::domain::expr::{self, ConditionClause, Expression};
use crate::domain::session::Session;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorDef {
    #[serde(rename = "type")]
    pub type_name: String,
    /// Overrides for catalog defaults, `short_name` included.
    #[serde(default)]
    pub params: BTreeMap<String, ParamValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanDefinition {
    pub indicators: Vec<IndicatorDef>,
    pub conditions: Vec<ConditionClause>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestDefinition {
    pub indicators: Vec<IndicatorDef>,
    #[serde(default)]
    pub side: Side,
    pub entries: Vec<ConditionClause>,
    pub exits: Vec<ConditionClause>,
}

fn build_session(indicators: &[IndicatorDef]) -> Result<Session, ConfigError> {
    let mut session = Session::new();
    for def in indicators {
        session.add_instance(&def.type_name, &def.params)?;
    }
    Ok(session)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, TascanError> {
    let content = fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|e| TascanError::Definition {
        file: path.display().to_string(),
        reason: e.to_string(),
    })
}

impl ScanDefinition {
    pub fn from_json_str(json: &str) -> Result<Self, TascanError> {
        serde_json::from_str(json).map_err(|e| TascanError::Definition {
            file: "<inline>".into(),
            reason: e.to_string(),
        })
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, TascanError> {
        read_json(path.as_ref())
    }

    /// Replay the definition into a session and a compiled expression.
    pub fn build(&self) -> Result<(Session, Expression), ConfigError> {
        let session = build_session(&self.indicators)?;
        let expr = expr::compile(&session, &self.conditions)?;
        Ok((session, expr))
    }
}

impl BacktestDefinition {
    pub fn from_json_str(json: &str) -> Result<Self, TascanError> {
        serde_json::from_str(json).map_err(|e| TascanError::Definition {
            file: "<inline>".into(),
            reason: e.to_string(),
        })
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, TascanError> {
        read_json(path.as_ref())
    }

    /// Replay the definition into a session and compiled entry/exit
    /// expressions.
    pub fn build(&self) -> Result<(Session, Expression, Expression), ConfigError> {
        let session = build_session(&self.indicators)?;
        let entries = expr::compile(&session, &self.entries)?;
        let exits = expr::compile(&session, &self.exits)?;
        Ok((session, entries, exits))
    }
}
