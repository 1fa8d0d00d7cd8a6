use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::{MediaError, MediaResult, MediaUpload};

/// How the request layer received a write body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyFormat {
    /// JSON object; media arrive as base64 strings
    Json,
    /// multipart/form-data; text parts are strings, file parts are uploads
    Multipart,
}

/// Incoming document as handed over by the request layer.
///
/// The request layer knows nothing about the schema: it only separates
/// file parts from everything else.
#[derive(Debug, Clone)]
pub struct WriteBody {
    pub format: BodyFormat,
    pub fields: Map<String, Value>,
    pub files: BTreeMap<String, MediaUpload>,
}

impl WriteBody {
    pub fn json(fields: Map<String, Value>) -> Self {
        Self {
            format: BodyFormat::Json,
            fields,
            files: BTreeMap::new(),
        }
    }

    /// Parse a JSON body; anything but an object is rejected.
    pub fn from_value(value: Value) -> MediaResult<Self> {
        match value {
            Value::Object(fields) => Ok(Self::json(fields)),
            other => Err(MediaError::invalid(format!(
                "document body must be a JSON object, got {}",
                json_type(&other)
            ))),
        }
    }

    pub fn multipart() -> Self {
        Self {
            format: BodyFormat::Multipart,
            fields: Map::new(),
            files: BTreeMap::new(),
        }
    }

    /// Add a text part or JSON value
    pub fn with_field<K: Into<String>, V: Into<Value>>(mut self, name: K, value: V) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Add a file part
    pub fn with_file<K: Into<String>>(mut self, name: K, upload: MediaUpload) -> Self {
        self.files.insert(name.into(), upload);
        self
    }
}

pub(crate) fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
