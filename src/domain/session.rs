//! Indicator instance builder.
//!
//! A [`Session`] owns the indicator instances one scan or backtest is built
//! from. Instances are addressed by their unique `short_name`; parameters are
//! validated against the catalog and missing ones are filled from defaults in
//! catalog order.

use crate::domain::catalog::{self, IndicatorKind, InputGroup, ParamValue};
use crate::domain::error::ConfigError;
use std::collections::BTreeMap;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceId(pub usize);

/// A configured indicator: catalog kind plus fully-resolved parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorInstance {
    pub id: InstanceId,
    pub kind: IndicatorKind,
    pub short_name: String,
    /// Resolved parameters in catalog order, `short_name` included.
    pub params: Vec<(String, ParamValue)>,
    pub input_group: InputGroup,
}

impl IndicatorInstance {
    pub fn spec(&self) -> &'static catalog::IndicatorSpec {
        catalog::get_spec(self.kind)
    }

    /// Integer parameter by name. Parameters are validated at build time, so
    /// a missing name yields 0 rather than a panic path.
    pub fn int_param(&self, name: &str) -> i64 {
        match self.params.iter().find(|(n, _)| n == name) {
            Some((_, ParamValue::Int(v))) => *v,
            _ => 0,
        }
    }

    pub fn float_param(&self, name: &str) -> f64 {
        match self.params.iter().find(|(n, _)| n == name) {
            Some((_, ParamValue::Float(v))) => *v,
            Some((_, ParamValue::Int(v))) => *v as f64,
            _ => 0.0,
        }
    }

    pub fn bool_param(&self, name: &str) -> bool {
        match self.params.iter().find(|(n, _)| n == name) {
            Some((_, ParamValue::Bool(v))) => *v,
            _ => false,
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct Session {
    instances: Vec<IndicatorInstance>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an indicator instance. Unknown parameter names, ill-typed values,
    /// and short-name collisions are rejected before anything is stored.
    pub fn add_instance(
        &mut self,
        type_name: &str,
        params: &BTreeMap<String, ParamValue>,
    ) -> Result<InstanceId, ConfigError> {
        let spec = catalog::lookup(type_name)?;
        let resolved = resolve_params(spec, params)?;
        let short_name = extract_short_name(&resolved);

        if self.find(&short_name).is_some() {
            return Err(ConfigError::DuplicateShortName(short_name));
        }

        let id = InstanceId(self.instances.len());
        self.instances.push(IndicatorInstance {
            id,
            kind: spec.kind,
            short_name,
            params: resolved,
            input_group: spec.input_group,
        });

        Ok(id)
    }

    /// Replace the parameters of an existing instance. Only valid before
    /// evaluation; the given map is re-resolved from scratch against the
    /// catalog entry, so omitted parameters fall back to defaults.
    pub fn update_params(
        &mut self,
        id: InstanceId,
        params: &BTreeMap<String, ParamValue>,
    ) -> Result<(), ConfigError> {
        let spec = self.instance(id).spec();
        let resolved = resolve_params(spec, params)?;
        let short_name = extract_short_name(&resolved);

        let taken = self
            .instances
            .iter()
            .any(|inst| inst.id != id && inst.short_name == short_name);
        if taken {
            return Err(ConfigError::DuplicateShortName(short_name));
        }

        let inst = &mut self.instances[id.0];
        inst.short_name = short_name;
        inst.params = resolved;
        Ok(())
    }

    pub fn instance(&self, id: InstanceId) -> &IndicatorInstance {
        &self.instances[id.0]
    }

    pub fn find(&self, short_name: &str) -> Option<InstanceId> {
        self.instances
            .iter()
            .find(|inst| inst.short_name == short_name)
            .map(|inst| inst.id)
    }

    pub fn instances(&self) -> &[IndicatorInstance] {
        &self.instances
    }

    /// Input groups needed across all instances, so callers can see which
    /// pivoted columns a scan will touch.
    pub fn required_groups(&self) -> HashSet<InputGroup> {
        self.instances.iter().map(|inst| inst.input_group).collect()
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

fn resolve_params(
    spec: &'static catalog::IndicatorSpec,
    params: &BTreeMap<String, ParamValue>,
) -> Result<Vec<(String, ParamValue)>, ConfigError> {
    for name in params.keys() {
        if spec.param(name).is_none() {
            return Err(ConfigError::UnknownParam {
                indicator: spec.kind.to_string(),
                param: name.clone(),
            });
        }
    }

    let mut resolved = Vec::with_capacity(spec.params.len());
    for param_spec in spec.params {
        let value = match params.get(param_spec.name) {
            Some(value) => coerce(spec, param_spec, value)?,
            None => param_spec.default.to_value(),
        };
        resolved.push((param_spec.name.to_string(), value));
    }

    for (name, value) in &resolved {
        if name.ends_with("window") {
            if let ParamValue::Int(v) = value {
                if *v < 1 {
                    return Err(ConfigError::InvalidParam {
                        indicator: spec.kind.to_string(),
                        param: name.clone(),
                        reason: format!("window must be at least 1, got {v}"),
                    });
                }
            }
        }
        if name == "short_name" {
            if let ParamValue::Text(s) = value {
                if s.is_empty() {
                    return Err(ConfigError::InvalidParam {
                        indicator: spec.kind.to_string(),
                        param: name.clone(),
                        reason: "short name must not be empty".into(),
                    });
                }
            }
        }
        if name == "alpha" {
            if let ParamValue::Float(v) = value {
                if *v <= 0.0 {
                    return Err(ConfigError::InvalidParam {
                        indicator: spec.kind.to_string(),
                        param: name.clone(),
                        reason: format!("alpha must be positive, got {v}"),
                    });
                }
            }
        }
    }

    Ok(resolved)
}

/// Integers are accepted where the catalog expects a float; everything else
/// must match the declared kind exactly.
fn coerce(
    spec: &catalog::IndicatorSpec,
    param_spec: &catalog::ParamSpec,
    value: &ParamValue,
) -> Result<ParamValue, ConfigError> {
    let expected = param_spec.default.kind();
    match (expected, value) {
        (catalog::ParamKind::Float, ParamValue::Int(v)) => Ok(ParamValue::Float(*v as f64)),
        _ if value.kind() == expected => Ok(value.clone()),
        _ => Err(ConfigError::InvalidParam {
            indicator: spec.kind.to_string(),
            param: param_spec.name.to_string(),
            reason: format!("expected {:?}, got {:?}", expected, value.kind()),
        }),
    }
}

fn extract_short_name(resolved: &[(String, ParamValue)]) -> String {
    match resolved.iter().find(|(n, _)| n == "short_name") {
        Some((_, ParamValue::Text(s))) => s.clone(),
        _ => String::new(),
    }
}
