use std::collections::BTreeMap;
use std::fmt;

use serde_json::{Map, Value};

use crate::body::json_type;
use crate::document::{ETAG_FIELD, ID_FIELD};
use crate::{
    codec, BodyFormat, FieldKind, MediaConfig, MediaId, MediaUpload, ResourceSchema, WriteBody,
};

/// Per-field validation issues: `{"field": ["message", ...]}`.
///
/// Body-level problems go under `_schema`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MediaIssues {
    map: Map<String, Value>,
}

impl MediaIssues {
    pub fn push_schema(&mut self, msg: impl Into<String>) {
        self.push_field("_schema", msg);
    }

    pub fn push_field(&mut self, field: &str, msg: impl Into<String>) {
        let msg = Value::String(msg.into());
        match self.map.get_mut(field) {
            Some(Value::Array(arr)) => arr.push(msg),
            _ => {
                self.map.insert(field.to_string(), Value::Array(vec![msg]));
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Messages recorded for one field
    pub fn field(&self, field: &str) -> Vec<&str> {
        match self.map.get(field) {
            Some(Value::Array(arr)) => arr.iter().filter_map(Value::as_str).collect(),
            _ => Vec::new(),
        }
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.map.clone())
    }
}

impl fmt::Display for MediaIssues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for field in self.map.keys() {
            for msg in self.field(field) {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{field}: {msg}")?;
                first = false;
            }
        }
        Ok(())
    }
}

/// Which write verb a body belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    Create,
    Replace,
    Patch,
}

impl WriteMode {
    /// Patch bodies are partial, so nothing is required in them.
    fn enforces_required(&self) -> bool {
        !matches!(self, WriteMode::Patch)
    }
}

/// What a write does to one media field
#[derive(Debug, Clone, PartialEq)]
pub enum MediaChange {
    /// Store a new payload and point the field at it
    Store(MediaUpload),
    /// The body echoed the reference the field already holds
    Keep(MediaId),
    /// Explicit null: the field no longer holds media
    Clear,
}

/// A body that passed validation, split into inline fields and media changes
#[derive(Debug, Clone)]
pub struct PreparedWrite {
    pub fields: Map<String, Value>,
    pub media: BTreeMap<String, MediaChange>,
}

/// Type check used by the validation layer: does `field` carry a file?
///
/// File parts always qualify; in JSON bodies so does a base64 string or a
/// `{"file": <base64>, ...}` object. A media reference is not a payload,
/// even though its hex digits happen to decode as base64.
pub fn is_file_like(body: &WriteBody, field: &str) -> bool {
    if body.files.contains_key(field) {
        return true;
    }
    match (body.format, body.fields.get(field)) {
        (BodyFormat::Json, Some(value)) => {
            let reference = media_text(value).and_then(MediaId::parse).is_some();
            !reference && decode_json_media(field, value).is_ok()
        }
        _ => false,
    }
}

/// Check a write body against the schema and resolve every media field.
///
/// `prior` holds the fields of the document being replaced or patched.
/// A media value equal to the reference the prior document holds for that
/// field is kept as is; any other media reference is rejected, never
/// decoded as base64.
///
/// All issues are collected before returning, so a rejected body reports
/// every offending field at once. Nothing is stored here.
pub fn validate_write(
    schema: &ResourceSchema,
    body: WriteBody,
    mode: WriteMode,
    config: &MediaConfig,
    prior: Option<&Map<String, Value>>,
) -> Result<PreparedWrite, MediaIssues> {
    let WriteBody {
        format,
        mut fields,
        mut files,
    } = body;

    fields.remove(ID_FIELD);
    fields.remove(ETAG_FIELD);

    let mut issues = MediaIssues::default();
    let mut media = BTreeMap::new();

    for name in files.keys() {
        if !schema.is_media(name) {
            issues.push_field(name, "unexpected file");
        }
    }

    for (name, spec) in schema.fields() {
        let required = spec.required && mode.enforces_required();

        if spec.kind == FieldKind::Value {
            match fields.get(name) {
                None if required => issues.push_field(name, "is required"),
                Some(Value::Null) if spec.required => issues.push_field(name, "is required"),
                _ => {}
            }
            continue;
        }

        let upload = if let Some(upload) = files.remove(name) {
            fields.remove(name);
            upload
        } else if let Some(value) = fields.remove(name) {
            if let Some(text) = media_text(&value) {
                let held = prior
                    .and_then(|doc| doc.get(name))
                    .and_then(MediaId::from_field);
                if let Some(held) = held.filter(|held| held.as_str() == text) {
                    media.insert(name.to_string(), MediaChange::Keep(held));
                    continue;
                }
                if MediaId::parse(text).is_some() {
                    issues.push_field(
                        name,
                        "file was expected, got a media reference this field does not hold",
                    );
                    continue;
                }
            }
            match (format, value) {
                (_, Value::Null) => {
                    // Explicit null clears; a required field cannot be cleared, even by patch.
                    if spec.required {
                        issues.push_field(name, "is required");
                    } else {
                        media.insert(name.to_string(), MediaChange::Clear);
                    }
                    continue;
                }
                (BodyFormat::Json, value) => match decode_json_media(name, &value) {
                    Ok(upload) => upload,
                    Err(msg) => {
                        issues.push_field(name, msg);
                        continue;
                    }
                },
                (BodyFormat::Multipart, value) => {
                    issues.push_field(
                        name,
                        format!("file was expected, got {} instead", json_type(&value)),
                    );
                    continue;
                }
            }
        } else {
            if required {
                issues.push_field(name, "is required");
            }
            continue;
        };

        if upload.data.len() as u64 > config.max_media_bytes {
            issues.push_field(
                name,
                format!("file exceeds maximum size of {} bytes", config.max_media_bytes),
            );
            continue;
        }
        media.insert(name.to_string(), MediaChange::Store(upload));
    }

    if issues.is_empty() {
        Ok(PreparedWrite { fields, media })
    } else {
        Err(issues)
    }
}

/// The text a media value carries: a bare string or the `file` of an
/// extended `{"file": ...}` object.
fn media_text(value: &Value) -> Option<&str> {
    match value {
        Value::String(text) => Some(text),
        Value::Object(obj) => obj.get("file").and_then(Value::as_str),
        _ => None,
    }
}

fn decode_json_media(field: &str, value: &Value) -> Result<MediaUpload, String> {
    let (text, filename, content_type) = match value {
        Value::String(text) => (text.as_str(), field, None),
        Value::Object(obj) => match obj.get("file") {
            Some(Value::String(text)) => (
                text.as_str(),
                obj.get("name").and_then(Value::as_str).unwrap_or(field),
                obj.get("content_type").and_then(Value::as_str),
            ),
            _ => return Err("file was expected, got object without 'file' instead".to_string()),
        },
        other => return Err(format!("file was expected, got {} instead", json_type(other))),
    };

    let data = codec::decode(text)
        .map_err(|_| "file was expected, got a string that is not base64".to_string())?;

    let mut upload = MediaUpload::new(data, filename);
    if let Some(content_type) = content_type {
        upload = upload.with_content_type(content_type);
    }
    Ok(upload)
}
