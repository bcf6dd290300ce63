//! Field lookup against issue-like records.
//!
//! Identifiers are tried as a custom-field id, then as a custom-field name,
//! then as a system-field id. Missing and ambiguous fields are values, not
//! errors, so a template can always be expanded.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Separator used when a field holds several values.
pub const MULTI_VALUE_SEPARATOR: &str = ", ";

/// System fields that never carry a usable string value.
const NON_STRING_SYSTEM_FIELDS: &[&str] = &[
    "thumbnail",
    "issuelinks",
    "progress",
    "aggregateprogress",
    "subtasks",
];

/// Whether a field is a custom or a system field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Custom,
    System,
}

/// Catalog entry describing a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    pub id: String,
    pub name: String,
    pub kind: FieldKind,
    /// Whether the field's value can be rendered as text
    #[serde(default = "default_exportable")]
    pub exportable: bool,
}

fn default_exportable() -> bool {
    true
}

impl FieldDef {
    pub fn custom(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            kind: FieldKind::Custom,
            exportable: true,
        }
    }

    pub fn system(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            kind: FieldKind::System,
            exportable: true,
        }
    }

    /// Mark the field as not exportable.
    pub fn not_exportable(mut self) -> Self {
        self.exportable = false;
        self
    }
}

/// Raw value of a field on a record.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    #[default]
    Absent,
    Single(String),
    Multi(Vec<String>),
}

impl FieldValue {
    /// Render the value as substitution text.
    pub fn render(&self) -> String {
        match self {
            FieldValue::Absent => String::new(),
            FieldValue::Single(value) => value.clone(),
            FieldValue::Multi(values) => values.join(MULTI_VALUE_SEPARATOR),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Single(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Single(value)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(values: Vec<String>) -> Self {
        FieldValue::Multi(values)
    }
}

/// The host's field catalog.
pub trait FieldCatalog {
    /// Record type values are read from.
    type Record;

    /// Custom field with exactly this id.
    fn custom_field(&self, id: &str) -> Option<FieldDef>;

    /// All custom fields whose display name is exactly `name`.
    fn custom_fields_named(&self, name: &str) -> Vec<FieldDef>;

    /// System field with exactly this id.
    fn system_field(&self, id: &str) -> Option<FieldDef>;

    /// Value of `field` on `record`.
    fn value(&self, field: &FieldDef, record: &Self::Record) -> FieldValue;

    /// Every field the catalog knows about.
    fn fields(&self) -> Vec<FieldDef> {
        Vec::new()
    }
}

/// Outcome of resolving an identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Value(String),
    NotFound,
    Ambiguous,
}

impl Resolution {
    /// Resolved text, if any.
    pub fn value(&self) -> Option<&str> {
        match self {
            Resolution::Value(value) => Some(value),
            _ => None,
        }
    }
}

/// Resolve `identifier` against `record`.
pub fn resolve<C: FieldCatalog + ?Sized>(
    catalog: &C,
    record: &C::Record,
    identifier: &str,
) -> Resolution {
    let custom = match catalog.custom_field(identifier) {
        Some(field) => Some(field),
        None => {
            let mut named = catalog.custom_fields_named(identifier);
            match named.len() {
                0 => None,
                1 => named.pop(),
                count => {
                    tracing::warn!(
                        field = identifier,
                        matches = count,
                        "Ambiguous custom field name, use the custom field id instead"
                    );
                    return Resolution::Ambiguous;
                }
            }
        }
    };

    if let Some(field) = custom {
        if field.exportable {
            return Resolution::Value(render(catalog, &field, record));
        }
        tracing::warn!(field = %field.id, "Custom field is not exportable, trying as system field");
    } else {
        tracing::debug!(field = identifier, "Custom field not found, trying as system field");
    }

    match catalog.system_field(identifier) {
        Some(field) if field.exportable => Resolution::Value(render(catalog, &field, record)),
        Some(field) => {
            tracing::warn!(field = %field.id, "System field is not exportable");
            Resolution::NotFound
        }
        None => {
            tracing::warn!(field = identifier, "Field is not resolvable");
            Resolution::NotFound
        }
    }
}

fn render<C: FieldCatalog + ?Sized>(catalog: &C, field: &FieldDef, record: &C::Record) -> String {
    let value = catalog.value(field, record);
    if value == FieldValue::Absent {
        tracing::debug!(field = %field.id, "Field value is absent, using empty string");
    }
    value.render()
}

/// Fields offered for binding to plan variables, sorted by name.
pub fn selectable_fields<C: FieldCatalog + ?Sized>(catalog: &C) -> Vec<FieldDef> {
    let mut fields: Vec<FieldDef> = catalog
        .fields()
        .into_iter()
        .filter(|f| f.exportable)
        .filter(|f| !f.name.starts_with('?'))
        .filter(|f| !(f.kind == FieldKind::System && NON_STRING_SYSTEM_FIELDS.contains(&f.id.as_str())))
        .collect();
    fields.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
    fields
}

/// A record holding field values by field id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    values: HashMap<String, FieldValue>,
}

impl Issue {
    pub fn new(key: &str) -> Self {
        Self {
            key: key.to_string(),
            values: HashMap::new(),
        }
    }

    /// Set a field value.
    pub fn with<V: Into<FieldValue>>(mut self, field_id: &str, value: V) -> Self {
        self.set(field_id, value);
        self
    }

    pub fn set<V: Into<FieldValue>>(&mut self, field_id: &str, value: V) {
        self.values.insert(field_id.to_string(), value.into());
    }

    pub fn get(&self, field_id: &str) -> Option<&FieldValue> {
        self.values.get(field_id)
    }
}

/// In-memory field catalog over [`Issue`] records.
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    fields: Vec<FieldDef>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a field.
    pub fn with_field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    fn find(&self, kind: FieldKind, id: &str) -> Option<FieldDef> {
        self.fields
            .iter()
            .find(|f| f.kind == kind && f.id == id)
            .cloned()
    }
}

impl FieldCatalog for MemoryCatalog {
    type Record = Issue;

    fn custom_field(&self, id: &str) -> Option<FieldDef> {
        self.find(FieldKind::Custom, id)
    }

    fn custom_fields_named(&self, name: &str) -> Vec<FieldDef> {
        self.fields
            .iter()
            .filter(|f| f.kind == FieldKind::Custom && f.name == name)
            .cloned()
            .collect()
    }

    fn system_field(&self, id: &str) -> Option<FieldDef> {
        self.find(FieldKind::System, id)
    }

    fn value(&self, field: &FieldDef, record: &Issue) -> FieldValue {
        record.get(&field.id).cloned().unwrap_or_default()
    }

    fn fields(&self) -> Vec<FieldDef> {
        self.fields.clone()
    }
}
