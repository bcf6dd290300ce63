//! `$(identifier)` placeholder expansion.

use crate::fields::{self, FieldCatalog, Resolution};

/// Text substituted for fields that cannot be resolved.
pub const FIELD_VALUE_UNRESOLVED: &str = "[field value unresolved]";

const PREFIX: &str = "$(";
const SUFFIX: char = ')';
const ESCAPE: char = '\\';

/// Expands placeholders against one record.
///
/// Expansion is single pass: substituted values are never scanned again.
pub struct Substitutor<'a, C: FieldCatalog + ?Sized> {
    catalog: &'a C,
    record: &'a C::Record,
    unresolved: String,
}

impl<'a, C: FieldCatalog + ?Sized> Substitutor<'a, C> {
    pub fn new(catalog: &'a C, record: &'a C::Record) -> Self {
        Self {
            catalog,
            record,
            unresolved: FIELD_VALUE_UNRESOLVED.to_string(),
        }
    }

    /// Use a localized text for unresolved fields.
    pub fn unresolved_text(mut self, text: &str) -> Self {
        self.unresolved = text.to_string();
        self
    }

    /// Expand every `$(identifier)` in `template`.
    pub fn substitute(&self, template: &str) -> String {
        expand(template, |identifier| {
            match fields::resolve(self.catalog, self.record, identifier) {
                Resolution::Value(value) => value,
                Resolution::NotFound | Resolution::Ambiguous => {
                    tracing::warn!(field = identifier, "Substituting unresolved field value");
                    self.unresolved.clone()
                }
            }
        })
    }
}

/// Expand placeholders with an arbitrary lookup.
pub fn expand<F>(template: &str, mut lookup: F) -> String
where
    F: FnMut(&str) -> String,
{
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find(PREFIX) {
        let (before, at_prefix) = rest.split_at(start);

        if let Some(literal) = before.strip_suffix(ESCAPE) {
            out.push_str(literal);
            out.push_str(PREFIX);
            rest = &at_prefix[PREFIX.len()..];
            continue;
        }

        out.push_str(before);
        let body = &at_prefix[PREFIX.len()..];
        match body.find(SUFFIX) {
            Some(end) => {
                out.push_str(&lookup(&body[..end]));
                rest = &body[end + 1..];
            }
            None => {
                out.push_str(at_prefix);
                rest = "";
            }
        }
    }

    out.push_str(rest);
    out
}

/// Identifiers referenced by `template`, in order of appearance.
pub fn placeholders(template: &str) -> Vec<String> {
    let mut found = Vec::new();
    expand(template, |identifier| {
        found.push(identifier.to_string());
        String::new()
    });
    found
}

/// Template that expands to the value of a single field.
pub fn field_placeholder(identifier: &str) -> String {
    format!("{PREFIX}{identifier}{SUFFIX}")
}
