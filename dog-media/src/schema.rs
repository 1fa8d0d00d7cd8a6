use std::collections::BTreeMap;

/// What a declared field holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Ordinary JSON value, persisted inline
    Value,
    /// Binary payload, persisted as a [`MediaId`](crate::MediaId)
    Media,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub kind: FieldKind,
    pub required: bool,
}

/// Field declarations of one resource type.
///
/// The set of media fields is fixed here; the orchestrator never guesses
/// from values whether a field holds media.
#[derive(Debug, Clone)]
pub struct ResourceSchema {
    name: String,
    fields: BTreeMap<String, FieldSpec>,
}

impl ResourceSchema {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn field<S: Into<String>>(mut self, name: S, spec: FieldSpec) -> Self {
        self.fields.insert(name.into(), spec);
        self
    }

    pub fn value<S: Into<String>>(self, name: S) -> Self {
        self.field(name, FieldSpec { kind: FieldKind::Value, required: false })
    }

    pub fn required_value<S: Into<String>>(self, name: S) -> Self {
        self.field(name, FieldSpec { kind: FieldKind::Value, required: true })
    }

    pub fn media<S: Into<String>>(self, name: S) -> Self {
        self.field(name, FieldSpec { kind: FieldKind::Media, required: false })
    }

    pub fn required_media<S: Into<String>>(self, name: S) -> Self {
        self.field(name, FieldSpec { kind: FieldKind::Media, required: true })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn spec(&self, field: &str) -> Option<&FieldSpec> {
        self.fields.get(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldSpec)> {
        self.fields.iter().map(|(name, spec)| (name.as_str(), spec))
    }

    pub fn media_fields(&self) -> impl Iterator<Item = &str> {
        self.fields()
            .filter(|(_, spec)| spec.kind == FieldKind::Media)
            .map(|(name, _)| name)
    }

    pub fn is_media(&self, field: &str) -> bool {
        matches!(self.spec(field), Some(spec) if spec.kind == FieldKind::Media)
    }
}
