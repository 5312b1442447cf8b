//! Paste record value object: one typed clipboard item

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::error::{MimeTypeError, RecordError};

pub const MIMETYPE_TEXT_HTML: &str = "text/html";
pub const MIMETYPE_TEXT_PLAIN: &str = "text/plain";
pub const MIMETYPE_TEXT_URI: &str = "text/uri";
pub const MIMETYPE_TEXT_WANT: &str = "text/want";

const BUILTIN_MIME_TYPES: &[&str] = &[
    MIMETYPE_TEXT_HTML,
    MIMETYPE_TEXT_PLAIN,
    MIMETYPE_TEXT_URI,
    MIMETYPE_TEXT_WANT,
];

/// MIME type tag of a record
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MimeType(String);

impl MimeType {
    pub fn text_html() -> Self {
        Self(MIMETYPE_TEXT_HTML.to_string())
    }

    pub fn text_plain() -> Self {
        Self(MIMETYPE_TEXT_PLAIN.to_string())
    }

    pub fn text_uri() -> Self {
        Self(MIMETYPE_TEXT_URI.to_string())
    }

    pub fn text_want() -> Self {
        Self(MIMETYPE_TEXT_WANT.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is one of the four types with a dedicated content field
    pub fn is_builtin(&self) -> bool {
        BUILTIN_MIME_TYPES.contains(&self.0.as_str())
    }
}

impl fmt::Display for MimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for MimeType {
    type Err = MimeTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let valid = match trimmed.split_once('/') {
            Some((kind, subtype)) => {
                !kind.is_empty()
                    && !subtype.is_empty()
                    && !subtype.contains('/')
                    && !trimmed.chars().any(char::is_whitespace)
            }
            None => false,
        };
        if !valid {
            return Err(MimeTypeError {
                input: s.to_string(),
            });
        }
        Ok(Self(trimmed.to_ascii_lowercase()))
    }
}

impl TryFrom<String> for MimeType {
    type Error = MimeTypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MimeType> for String {
    fn from(mime: MimeType) -> Self {
        mime.0
    }
}

/// Structured intent: an action with an optional target and parameters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Want {
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bundle: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, String>,
}

impl Want {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            ..Default::default()
        }
    }

    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    pub fn with_bundle(mut self, bundle: impl Into<String>) -> Self {
        self.bundle = Some(bundle.into());
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Intent URI form: `#Intent;action=..;uri=..;bundle=..;k=v;end`.
    /// Parameters come out in key order, so the result is deterministic.
    pub fn to_intent_string(&self) -> String {
        let mut out = String::from("#Intent;");
        out.push_str(&format!("action={};", self.action));
        if let Some(uri) = &self.uri {
            out.push_str(&format!("uri={};", uri));
        }
        if let Some(bundle) = &self.bundle {
            out.push_str(&format!("bundle={};", bundle));
        }
        for (key, value) in &self.params {
            out.push_str(&format!("{}={};", key, value));
        }
        out.push_str("end");
        out
    }
}

/// The single populated content field of a record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum RecordContent {
    Html(String),
    PlainText(String),
    Uri(String),
    Want(Want),
    Custom(#[serde(with = "base64_bytes")] Vec<u8>),
}

impl RecordContent {
    fn kind(&self) -> &'static str {
        match self {
            Self::Html(_) => "html",
            Self::PlainText(_) => "plain_text",
            Self::Uri(_) => "uri",
            Self::Want(_) => "want",
            Self::Custom(_) => "custom",
        }
    }

    fn builtin_mime(&self) -> Option<&'static str> {
        match self {
            Self::Html(_) => Some(MIMETYPE_TEXT_HTML),
            Self::PlainText(_) => Some(MIMETYPE_TEXT_PLAIN),
            Self::Uri(_) => Some(MIMETYPE_TEXT_URI),
            Self::Want(_) => Some(MIMETYPE_TEXT_WANT),
            Self::Custom(_) => None,
        }
    }
}

/// One typed clipboard item.
///
/// The content is an enum, so exactly one content field is populated. The
/// MIME tag is checked against the content both on construction and when a
/// record is decoded from the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RecordWire", into = "RecordWire")]
pub struct PasteRecord {
    mime_type: MimeType,
    content: RecordContent,
}

impl PasteRecord {
    pub fn new_html(html: impl Into<String>) -> Self {
        Self {
            mime_type: MimeType::text_html(),
            content: RecordContent::Html(html.into()),
        }
    }

    pub fn new_plain_text(text: impl Into<String>) -> Self {
        Self {
            mime_type: MimeType::text_plain(),
            content: RecordContent::PlainText(text.into()),
        }
    }

    pub fn new_uri(uri: impl Into<String>) -> Self {
        Self {
            mime_type: MimeType::text_uri(),
            content: RecordContent::Uri(uri.into()),
        }
    }

    pub fn new_want(want: Want) -> Self {
        Self {
            mime_type: MimeType::text_want(),
            content: RecordContent::Want(want),
        }
    }

    /// Record of an arbitrary caller-provided type.
    /// The four built-in types must use their dedicated constructors.
    pub fn new_custom(mime_type: MimeType, data: Vec<u8>) -> Result<Self, RecordError> {
        Self::from_parts(mime_type, RecordContent::Custom(data))
    }

    fn from_parts(mime_type: MimeType, content: RecordContent) -> Result<Self, RecordError> {
        match content.builtin_mime() {
            Some(expected) if mime_type.as_str() != expected => Err(RecordError::MimeMismatch {
                mime_type: mime_type.to_string(),
                content: content.kind().to_string(),
            }),
            None if mime_type.is_builtin() => {
                Err(RecordError::ReservedMimeType(mime_type.to_string()))
            }
            _ => Ok(Self { mime_type, content }),
        }
    }

    pub fn mime_type(&self) -> &MimeType {
        &self.mime_type
    }

    pub fn content(&self) -> &RecordContent {
        &self.content
    }

    pub fn html_text(&self) -> Option<&str> {
        match &self.content {
            RecordContent::Html(html) => Some(html),
            _ => None,
        }
    }

    pub fn plain_text(&self) -> Option<&str> {
        match &self.content {
            RecordContent::PlainText(text) => Some(text),
            _ => None,
        }
    }

    pub fn uri(&self) -> Option<&str> {
        match &self.content {
            RecordContent::Uri(uri) => Some(uri),
            _ => None,
        }
    }

    pub fn want(&self) -> Option<&Want> {
        match &self.content {
            RecordContent::Want(want) => Some(want),
            _ => None,
        }
    }

    pub fn custom_data(&self) -> Option<&[u8]> {
        match &self.content {
            RecordContent::Custom(data) => Some(data),
            _ => None,
        }
    }

    /// Deterministic textual projection, whichever field is populated.
    /// Used for size accounting and diagnostics.
    pub fn convert_to_text(&self) -> String {
        match &self.content {
            RecordContent::Html(html) => html.clone(),
            RecordContent::PlainText(text) => text.clone(),
            RecordContent::Uri(uri) => uri.clone(),
            RecordContent::Want(want) => want.to_intent_string(),
            RecordContent::Custom(data) => String::from_utf8_lossy(data).into_owned(),
        }
    }
}

#[derive(Serialize, Deserialize)]
struct RecordWire {
    mime_type: MimeType,
    content: RecordContent,
}

impl TryFrom<RecordWire> for PasteRecord {
    type Error = RecordError;

    fn try_from(wire: RecordWire) -> Result<Self, Self::Error> {
        Self::from_parts(wire.mime_type, wire.content)
    }
}

impl From<PasteRecord> for RecordWire {
    fn from(record: PasteRecord) -> Self {
        Self {
            mime_type: record.mime_type,
            content: record.content,
        }
    }
}

mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_constructors_tag_mime_type() {
        assert_eq!(PasteRecord::new_html("<b>x</b>").mime_type().as_str(), "text/html");
        assert_eq!(PasteRecord::new_plain_text("hi").mime_type().as_str(), "text/plain");
        assert_eq!(PasteRecord::new_uri("file:///a").mime_type().as_str(), "text/uri");
        assert_eq!(
            PasteRecord::new_want(Want::new("view")).mime_type().as_str(),
            "text/want"
        );
    }

    #[test]
    fn only_matching_accessor_is_populated() {
        let record = PasteRecord::new_html("<p>a</p>");
        assert_eq!(record.html_text(), Some("<p>a</p>"));
        assert!(record.plain_text().is_none());
        assert!(record.uri().is_none());
        assert!(record.want().is_none());
        assert!(record.custom_data().is_none());
    }

    #[test]
    fn convert_to_text_for_every_variant() {
        assert_eq!(PasteRecord::new_plain_text("hi").convert_to_text(), "hi");
        assert_eq!(PasteRecord::new_html("<i>h</i>").convert_to_text(), "<i>h</i>");
        assert_eq!(
            PasteRecord::new_uri("dataability:///x").convert_to_text(),
            "dataability:///x"
        );
        let custom =
            PasteRecord::new_custom("application/x-demo".parse().unwrap(), b"raw".to_vec())
                .unwrap();
        assert_eq!(custom.convert_to_text(), "raw");
    }

    #[test]
    fn want_text_is_deterministic() {
        let a = Want::new("send")
            .with_uri("content://doc/1")
            .with_param("z", "1")
            .with_param("a", "2");
        let b = Want::new("send")
            .with_uri("content://doc/1")
            .with_param("a", "2")
            .with_param("z", "1");
        let text = PasteRecord::new_want(a).convert_to_text();
        assert_eq!(text, PasteRecord::new_want(b).convert_to_text());
        assert_eq!(text, "#Intent;action=send;uri=content://doc/1;a=2;z=1;end");
    }

    #[test]
    fn custom_record_rejects_builtin_mime() {
        let err = PasteRecord::new_custom(MimeType::text_plain(), vec![1]).unwrap_err();
        assert!(matches!(err, RecordError::ReservedMimeType(_)));
    }

    #[test]
    fn mime_type_parsing() {
        assert_eq!("Text/HTML".parse::<MimeType>().unwrap(), MimeType::text_html());
        assert!("plain".parse::<MimeType>().is_err());
        assert!("text/".parse::<MimeType>().is_err());
        assert!("a/b/c".parse::<MimeType>().is_err());
        assert!("text/pl ain".parse::<MimeType>().is_err());
    }

    #[test]
    fn decoding_rejects_mismatched_content() {
        let json = r#"{"mime_type":"text/html","content":{"kind":"plain_text","value":"x"}}"#;
        assert!(serde_json::from_str::<PasteRecord>(json).is_err());
    }

    #[test]
    fn custom_bytes_travel_as_base64() {
        let record =
            PasteRecord::new_custom("image/png".parse().unwrap(), vec![0, 159, 255]).unwrap();
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("AJ//"));
        let back: PasteRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
