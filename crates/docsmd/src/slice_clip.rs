//! Google Docs "Slice Clip" decoding.
//!
//! When a selection is copied out of Google Docs, the clipboard carries a
//! private JSON representation next to the HTML. It is a wrapper object whose
//! `data` field holds the document, sometimes itself encoded as a JSON string.

use std::borrow::Cow;
use std::ops::Range;

use log::debug;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::{Error, Result};

const EXPECTED: &str = "GDocs Slice Clip";

/// The resolved part of a Slice Clip document.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SliceClip {
    /// Entity id → position(s) in `spacers`
    #[serde(rename = "dsl_entitypositionmap")]
    pub entity_position_map: Map<String, Value>,

    /// The plain text of the selection, with control characters standing in
    /// for paragraph ends and embedded objects
    #[serde(rename = "dsl_spacers")]
    pub spacers: String,

    /// Style runs over `spacers`, one entry per style type
    #[serde(rename = "dsl_styleslices")]
    pub style_slices: Vec<Value>,
}

#[derive(Deserialize)]
struct Document {
    resolved: SliceClip,
}

/// One entry of `dsl_styleslices`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StyleSlice {
    /// Style type, e.g. `text`, `suggest_insert`, `suggest_delete`
    #[serde(rename = "stsl_type")]
    pub kind: String,

    /// One entry per spacer index; `null` keeps the previous style
    #[serde(rename = "stsl_styles", default)]
    pub styles: Vec<Value>,
}

impl StyleSlice {
    /// Index ranges of `spacers` (clamped to `len`) over which `is_marked`
    /// holds for the style in effect.
    pub fn runs(&self, len: usize, is_marked: impl Fn(&Value) -> bool) -> Vec<Range<usize>> {
        let mut runs = Vec::new();
        let mut start = None;
        let mut marked = false;

        for index in 0..len.min(self.styles.len()) {
            match &self.styles[index] {
                Value::Null => {}
                style => marked = is_marked(style),
            }
            match (marked, start) {
                (true, None) => start = Some(index),
                (false, Some(begin)) => {
                    runs.push(begin..index);
                    start = None;
                }
                _ => {}
            }
        }

        // The last style stays in effect to the end of the text
        if let Some(begin) = start {
            runs.push(begin..len);
        }
        runs
    }
}

impl SliceClip {
    /// Decode a Slice Clip from a JSON value.
    ///
    /// `raw` is either the wrapper object or a JSON string holding it. The
    /// wrapper's `data` may itself be a JSON string.
    pub fn decode(raw: &Value) -> Result<Self> {
        let wrapper: Cow<Value> = match raw {
            Value::String(text) => Cow::Owned(parse_json(text, raw)?),
            other => Cow::Borrowed(other),
        };

        let data: Cow<Value> = match wrapper.get("data") {
            Some(Value::String(text)) => Cow::Owned(parse_json(text, raw)?),
            Some(data) => Cow::Borrowed(data),
            None => Cow::Owned(Value::Null),
        };

        let document =
            Document::deserialize(data.as_ref()).map_err(|e| format_error(raw, Some(e)))?;
        debug!(
            "Decoded slice clip: {} spacer chars, {} style slices, {} entities",
            document.resolved.spacers.chars().count(),
            document.resolved.style_slices.len(),
            document.resolved.entity_position_map.len()
        );
        Ok(document.resolved)
    }

    /// Decode a Slice Clip from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Self::decode(&Value::String(json.to_string()))
    }

    /// The first style slice of the given type that has a readable shape.
    pub fn style_slice(&self, kind: &str) -> Option<StyleSlice> {
        self.style_slices
            .iter()
            .filter_map(|value| StyleSlice::deserialize(value).ok())
            .find(|slice| slice.kind == kind)
    }

    /// Bookmark ids and their positions in `spacers`, ordered by position.
    pub fn bookmark_positions(&self) -> Vec<(usize, String)> {
        let mut positions: Vec<(usize, String)> = self
            .entity_position_map
            .iter()
            .filter(|(key, _)| key.starts_with("id."))
            .filter_map(|(key, value)| {
                let position = match value {
                    Value::Array(items) => items.first().and_then(Value::as_u64),
                    other => other.as_u64(),
                }?;
                Some((usize::try_from(position).ok()?, key.clone()))
            })
            .collect();
        positions.sort();
        positions
    }
}

fn parse_json(text: &str, raw: &Value) -> Result<Value> {
    serde_json::from_str(text).map_err(|e| format_error(raw, Some(e)))
}

fn format_error(raw: &Value, source: Option<serde_json::Error>) -> Error {
    Error::Format {
        expected: EXPECTED,
        raw: raw.to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn document() -> Value {
        json!({
            "resolved": {
                "dsl_entitypositionmap": {},
                "dsl_spacers": "Hello",
                "dsl_styleslices": [],
            }
        })
    }

    #[test]
    fn test_decode_wrapper_object() {
        let clip = SliceClip::decode(&json!({ "data": document() })).unwrap();
        assert_eq!(clip.spacers, "Hello");
        assert!(clip.style_slices.is_empty());
    }

    #[test]
    fn test_decode_double_encoded() {
        let raw = json!({ "data": document().to_string() });
        let clip = SliceClip::decode(&raw).unwrap();
        assert_eq!(clip.spacers, "Hello");

        let text = raw.to_string();
        assert_eq!(SliceClip::from_json_str(&text).unwrap(), clip);
    }

    #[test]
    fn test_missing_field_is_rejected() {
        let raw = json!({
            "data": {
                "resolved": {
                    "dsl_entitypositionmap": {},
                    "dsl_styleslices": [],
                }
            }
        });
        let err = SliceClip::decode(&raw).unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with("Document does not appear to be a GDocs Slice Clip: "));
        assert!(message.contains("dsl_entitypositionmap"));
    }

    #[test]
    fn test_mistyped_field_is_rejected() {
        let raw = json!({
            "data": {
                "resolved": {
                    "dsl_entitypositionmap": {},
                    "dsl_spacers": 5,
                    "dsl_styleslices": [],
                }
            }
        });
        assert!(matches!(
            SliceClip::decode(&raw),
            Err(Error::Format { expected: "GDocs Slice Clip", .. })
        ));
    }

    #[test]
    fn test_invalid_json_is_rejected() {
        assert!(SliceClip::from_json_str("{not json").is_err());
        assert!(SliceClip::decode(&json!({ "data": "[1," })).is_err());
        assert!(SliceClip::decode(&json!(42)).is_err());
    }

    #[test]
    fn test_style_runs() {
        let slice: StyleSlice = serde_json::from_value(json!({
            "stsl_type": "text",
            "stsl_styles": [
                { "ts_un": false },
                { "ts_un": true },
                null,
                { "ts_un": false },
                { "ts_un": true },
            ],
        }))
        .unwrap();

        let underlined = |style: &Value| style["ts_un"] == json!(true);
        assert_eq!(slice.runs(7, underlined), vec![1..3, 4..7]);
        assert_eq!(slice.runs(2, underlined), vec![1..2]);
    }

    #[test]
    fn test_style_slice_lookup_skips_malformed() {
        let clip = SliceClip {
            entity_position_map: Map::new(),
            spacers: String::new(),
            style_slices: vec![
                json!("garbage"),
                json!({ "stsl_type": "suggest_insert", "stsl_styles": [] }),
            ],
        };
        assert!(clip.style_slice("suggest_insert").is_some());
        assert!(clip.style_slice("text").is_none());
    }

    #[test]
    fn test_bookmark_positions() {
        let mut map = Map::new();
        map.insert("id.b".to_string(), json!([7]));
        map.insert("id.a".to_string(), json!(2));
        map.insert("kix.comment".to_string(), json!(1));
        map.insert("id.bad".to_string(), json!("x"));
        let clip = SliceClip {
            entity_position_map: map,
            spacers: String::new(),
            style_slices: Vec::new(),
        };

        assert_eq!(
            clip.bookmark_positions(),
            vec![(2, "id.a".to_string()), (7, "id.b".to_string())]
        );
    }
}
