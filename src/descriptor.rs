//! Post-function arguments as persisted by the workflow descriptor store.
//!
//! The store keeps a flat string-to-string map. The selected connection and
//! plan are stored as plain values; the variable bindings are stored as a
//! Base64 map of variable name to template.

use crate::catalog::PlanCache;
use crate::codec;
use crate::error::{DecodeError, Error, Result};
use crate::plan::Plan;
use crate::template;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const SELECTED_CONNECTION: &str = "selected_applink";
pub const SELECTED_PLAN_FOR: &str = "selected_plan_for_";
pub const SELECTED_VALUES_BY_VARIABLE: &str = "selected_values_by_variable";
pub const VARIABLES_TO_USE: &str = "variables_to_use";

/// Older descriptors stored field ids per variable as a plain map.
pub const LEGACY_SELECTED_FIELDS_BY_VARIABLE: &str = "selected_fields_by_variable";

/// Flat argument map of a post-function descriptor.
pub type DescriptorArgs = BTreeMap<String, String>;

/// Where a plan variable gets its value from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum VariableBinding {
    /// Value of a field on the transitioned issue
    Field { field: String },
    /// Literal text, which may contain `$(field)` placeholders
    CustomValue { value: String },
}

impl VariableBinding {
    pub fn field(identifier: &str) -> Self {
        VariableBinding::Field {
            field: identifier.to_string(),
        }
    }

    pub fn custom_value(value: &str) -> Self {
        VariableBinding::CustomValue {
            value: value.to_string(),
        }
    }

    /// Template stored for this binding.
    pub fn template(&self) -> String {
        match self {
            VariableBinding::Field { field } => template::field_placeholder(field),
            VariableBinding::CustomValue { value } => value.clone(),
        }
    }

    /// Field identifiers the binding reads when expanded.
    pub fn referenced_fields(&self) -> Vec<String> {
        template::placeholders(&self.template())
    }
}

/// Encode a configuration for `plan` into descriptor args.
///
/// Every bound variable must be declared by the plan.
pub fn encode_args(
    connection_id: &str,
    plan: &Plan,
    bindings: &BTreeMap<String, VariableBinding>,
) -> Result<DescriptorArgs> {
    let mut templates = BTreeMap::new();
    for (variable, binding) in bindings {
        if !plan.declares(variable) {
            return Err(Error::UndeclaredVariable {
                plan: plan.key.clone(),
                variable: variable.clone(),
            });
        }
        templates.insert(variable.clone(), binding.template());
    }

    let mut args = DescriptorArgs::new();
    args.insert(SELECTED_CONNECTION.to_string(), connection_id.to_string());
    args.insert(format!("{SELECTED_PLAN_FOR}{connection_id}"), plan.key.clone());
    args.insert(VARIABLES_TO_USE.to_string(), codec::encode_list(templates.keys()));
    args.insert(
        SELECTED_VALUES_BY_VARIABLE.to_string(),
        codec::encode_map_base64(&templates),
    );
    Ok(args)
}

/// Like [`encode_args`], re-validating the selection against cached plans.
pub fn encode_args_cached(
    cache: &PlanCache,
    connection_id: &str,
    plan_key: &str,
    bindings: &BTreeMap<String, VariableBinding>,
) -> Result<DescriptorArgs> {
    let plan = cache
        .find(connection_id, plan_key)
        .ok_or_else(|| Error::UnknownPlan {
            connection: connection_id.to_string(),
            plan: plan_key.to_string(),
        })?;
    encode_args(connection_id, plan, bindings)
}

/// Typed view over stored descriptor args.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PostFunctionArgs {
    pub connection: Option<String>,
    pub plan: Option<String>,
    pub variables_to_use: Vec<String>,
    encoded_bindings: Option<String>,
    legacy_bindings: Option<String>,
}

impl PostFunctionArgs {
    /// Read the args. Blank values count as unset.
    pub fn from_args(args: &DescriptorArgs) -> Self {
        let connection = non_blank(args.get(SELECTED_CONNECTION));
        let plan = connection.as_ref().and_then(|conn| {
            non_blank(args.get(&format!("{SELECTED_PLAN_FOR}{conn}"))).and_then(|selected| {
                let key = selected
                    .strip_prefix(&format!("{conn}_"))
                    .unwrap_or(&selected)
                    .trim()
                    .to_string();
                (!key.is_empty()).then_some(key)
            })
        });

        Self {
            connection,
            plan,
            variables_to_use: args
                .get(VARIABLES_TO_USE)
                .map(|s| codec::decode_list(s))
                .unwrap_or_default(),
            encoded_bindings: non_blank(args.get(SELECTED_VALUES_BY_VARIABLE)),
            legacy_bindings: non_blank(args.get(LEGACY_SELECTED_FIELDS_BY_VARIABLE)),
        }
    }

    /// Variable name to template.
    ///
    /// Legacy plain maps hold bare field ids, which are turned into field
    /// placeholders. Keys stored with a `..for_<connection>_<plan>_` prefix are
    /// reduced to the variable name.
    pub fn bindings(&self) -> std::result::Result<BTreeMap<String, String>, DecodeError> {
        let decoded = match (&self.encoded_bindings, &self.legacy_bindings) {
            (Some(encoded), _) => codec::decode_map_base64(encoded)?,
            (None, Some(legacy)) => codec::decode_map(legacy)?
                .into_iter()
                .map(|(variable, field)| (variable, template::field_placeholder(&field)))
                .collect(),
            (None, None) => BTreeMap::new(),
        };

        Ok(decoded
            .into_iter()
            .map(|(variable, template)| (self.variable_name(&variable).to_string(), template))
            .collect())
    }

    fn variable_name<'a>(&self, key: &'a str) -> &'a str {
        let (Some(conn), Some(plan)) = (&self.connection, &self.plan) else {
            return key;
        };
        let marker = format!("for_{conn}_{plan}_");
        match key.rfind(&marker) {
            Some(idx) => &key[idx + marker.len()..],
            None => key,
        }
    }
}

fn non_blank(value: Option<&String>) -> Option<String> {
    value
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
