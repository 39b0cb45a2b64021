//! Output types handed back to callers. Nothing here borrows from the request body.

use indexmap::IndexMap;
use serde::Serialize;

use crate::error::Diagnostic;

/// A decoded, lightly typed form field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Bool(bool),
    List(Vec<String>),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            FieldValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// Flattens the value into the string items it contributes to a repeated field.
    fn into_items(self) -> Vec<String> {
        match self {
            FieldValue::Text(s) => vec![s],
            FieldValue::Bool(b) => vec![b.to_string()],
            FieldValue::List(items) => items,
        }
    }

    /// Merges a later occurrence of the same field name into this one.
    /// The result is always a `List`, in source order.
    fn append(&mut self, next: FieldValue) {
        let previous = std::mem::replace(self, FieldValue::List(Vec::new()));
        let mut items = previous.into_items();
        items.extend(next.into_items());
        *self = FieldValue::List(items);
    }
}

/// Form fields keyed by name, in the order each name first appeared in the body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Fields(IndexMap<String, FieldValue>);

impl Fields {
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.0.get(name)
    }

    /// Shorthand for the common case of a single text field.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(FieldValue::as_text)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Inserts a field, accumulating repeated names into a `List`.
    pub(crate) fn insert(&mut self, name: String, value: FieldValue) {
        match self.0.get_mut(&name) {
            Some(existing) => existing.append(value),
            None => {
                self.0.insert(name, value);
            }
        }
    }
}

impl IntoIterator for Fields {
    type Item = (String, FieldValue);
    type IntoIter = indexmap::map::IntoIter<String, FieldValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// A file part, with its content copied out of the body byte-for-byte.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileAttachment {
    pub field_name: String,
    pub file_name: String,
    pub mime_type: String,
    #[serde(skip)]
    pub content: Vec<u8>,
    pub size: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParseResult {
    pub fields: Fields,
    pub files: Vec<FileAttachment>,
}

impl ParseResult {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.files.is_empty()
    }
}

/// A `ParseResult` together with every non-fatal signal raised while producing it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseReport {
    pub result: ParseResult,
    pub diagnostics: Vec<Diagnostic>,
}

impl ParseReport {
    /// Number of parts that were present in the body but left out of the result.
    pub fn dropped_parts(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.drops_part()).count()
    }

    pub(crate) fn record(&mut self, diagnostic: Diagnostic) {
        tracing::debug!("multipart: {diagnostic}");
        self.diagnostics.push(diagnostic);
    }
}
