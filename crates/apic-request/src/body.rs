//! Request body editor state.

use apic_core::{FormPart, Payload};
use apic_model::PayloadDecl;
use serde::{Deserialize, Serialize};

pub const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";
pub const MULTIPART_FORM: &str = "multipart/form-data";

/// One row of the url-encoded form editor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormField {
    pub name: String,
    pub value: String,
    pub enabled: bool,
}

impl FormField {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            enabled: true,
        }
    }
}

/// Body content as edited for the selected media type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BodyValue {
    Raw(String),
    UrlEncoded(Vec<FormField>),
    Multipart(Vec<FormPart>),
}

impl Default for BodyValue {
    fn default() -> Self {
        BodyValue::Raw(String::new())
    }
}

/// Editor state for the request body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BodyEditor {
    media_types: Vec<String>,
    examples: Vec<Option<String>>,
    media_type: Option<String>,
    value: BodyValue,
}

impl BodyEditor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Editor for an operation's declared payloads.
    ///
    /// The first declared media type is selected and its example, if any,
    /// seeds the editor.
    pub fn for_payloads(payloads: &[PayloadDecl]) -> Self {
        let mut editor = Self {
            media_types: payloads.iter().map(|p| p.media_type.clone()).collect(),
            examples: payloads.iter().map(|p| p.example.clone()).collect(),
            ..Self::default()
        };
        if let Some(first) = payloads.first() {
            editor.select_media_type(&first.media_type);
        }
        editor
    }

    pub fn media_types(&self) -> &[String] {
        &self.media_types
    }

    pub fn media_type(&self) -> Option<&str> {
        self.media_type.as_deref()
    }

    pub fn value(&self) -> &BodyValue {
        &self.value
    }

    /// Select a media type and reset the editor to its empty or example value.
    pub fn select_media_type(&mut self, media_type: &str) {
        let example = self
            .media_types
            .iter()
            .position(|m| m == media_type)
            .and_then(|i| self.examples.get(i).cloned().flatten());

        self.value = if is_media(media_type, FORM_URLENCODED) {
            BodyValue::UrlEncoded(Vec::new())
        } else if is_media(media_type, MULTIPART_FORM) {
            BodyValue::Multipart(Vec::new())
        } else {
            BodyValue::Raw(example.unwrap_or_default())
        };
        self.media_type = Some(media_type.to_string());
    }

    pub fn set_raw(&mut self, text: impl Into<String>) {
        self.value = BodyValue::Raw(text.into());
    }

    pub fn set_fields(&mut self, fields: Vec<FormField>) {
        self.value = BodyValue::UrlEncoded(fields);
    }

    pub fn set_parts(&mut self, parts: Vec<FormPart>) {
        self.value = BodyValue::Multipart(parts);
    }

    pub fn is_multipart(&self) -> bool {
        matches!(self.value, BodyValue::Multipart(_))
    }

    /// Serialized payload. Url-encoded fields use form encoding (`+` for spaces).
    pub fn serialize(&self) -> Option<Payload> {
        match &self.value {
            BodyValue::Raw(text) => Some(Payload::Text(text.clone())),
            BodyValue::UrlEncoded(fields) => {
                let mut serializer = ::url::form_urlencoded::Serializer::new(String::new());
                for field in fields.iter().filter(|f| f.enabled && !f.name.is_empty()) {
                    serializer.append_pair(&field.name, &field.value);
                }
                Some(Payload::Text(serializer.finish()))
            }
            BodyValue::Multipart(parts) => Some(Payload::Multipart(parts.clone())),
        }
    }
}

fn is_media(media_type: &str, expected: &str) -> bool {
    media_type
        .split(';')
        .next()
        .is_some_and(|base| base.trim().eq_ignore_ascii_case(expected))
}
