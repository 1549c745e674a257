//! MentionCodec - Canonical mention markup transcoding
//!
//! Converts between the canonical markup string form `@[Display Name](id)`
//! and an ordered sequence of typed segments (plain text / mention token).
//! The markup form is the only representation exchanged with the host;
//! segments are the in-memory editing representation.
//!
//! # Guarantees
//! - `decode` never fails: malformed partial patterns (e.g. `@[x` with no
//!   closing paren) degrade to plain text.
//! - `encode` is byte-stable: identical segments always produce an
//!   identical string, so `decode(encode(s)) == s` holds for any segment
//!   list whose plain text contains no literal `@[...](...)` span.

use regex::Regex;
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

// ==================== TYPE DEFINITIONS ====================

/// An atomic, non-splittable reference to a directory entry (or the
/// "everyone" pseudo-entry) displayed inline in editable text.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct MentionToken {
    pub id: String,
    pub display_name: String,
}

impl MentionToken {
    pub fn new(id: &str, display_name: &str) -> Self {
        Self {
            id: id.to_string(),
            display_name: display_name.to_string(),
        }
    }
}

/// One span of a decoded markup string.
///
/// Segments never overlap; concatenating their display lengths equals the
/// logical length of the buffer they form.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum Segment {
    Text(String),
    Mention(MentionToken),
}

impl Segment {
    pub fn text(value: &str) -> Self {
        Segment::Text(value.to_string())
    }

    pub fn mention(id: &str, display_name: &str) -> Self {
        Segment::Mention(MentionToken::new(id, display_name))
    }

    pub fn is_mention(&self) -> bool {
        matches!(self, Segment::Mention(_))
    }
}

// ==================== MAIN IMPLEMENTATION ====================

/// MentionCodec - bidirectional markup/segment transcoder
///
/// Holds the compiled mention pattern; one instance per consumer, built
/// once and reused for every decode.
#[wasm_bindgen]
pub struct MentionCodec {
    mention_re: Regex,
}

impl MentionCodec {
    /// Decode a canonical markup string into an ordered segment list.
    ///
    /// Everything between (and around) `@[name](id)` matches becomes a
    /// `Text` segment. Unmatched fragments of the pattern stay plain text.
    pub fn decode(&self, markup: &str) -> Vec<Segment> {
        let mut segments = Vec::new();
        let mut cursor = 0;

        for cap in self.mention_re.captures_iter(markup) {
            let full = cap.get(0).unwrap();
            if full.start() > cursor {
                segments.push(Segment::text(&markup[cursor..full.start()]));
            }
            segments.push(Segment::Mention(MentionToken {
                display_name: cap[1].to_string(),
                id: cap[2].to_string(),
            }));
            cursor = full.end();
        }

        if cursor < markup.len() {
            segments.push(Segment::text(&markup[cursor..]));
        }

        segments
    }

    /// Extract all mention ids in left-to-right order, duplicates kept.
    ///
    /// Used to compute the tagged-user notification list for a submission.
    pub fn ids_of(&self, markup: &str) -> Vec<String> {
        self.mention_re
            .captures_iter(markup)
            .map(|cap| cap[2].to_string())
            .collect()
    }
}

/// Encode a segment list back into canonical markup.
///
/// Inverse of [`MentionCodec::decode`]; text is concatenated verbatim and
/// each mention renders as `@[display_name](id)`.
pub fn encode(segments: &[Segment]) -> String {
    let mut out = String::new();
    for seg in segments {
        match seg {
            Segment::Text(value) => out.push_str(value),
            Segment::Mention(token) => {
                out.push_str(&format!("@[{}]({})", token.display_name, token.id));
            }
        }
    }
    out
}

// ==================== WASM BINDINGS ====================

#[wasm_bindgen]
impl MentionCodec {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        // Group 1: display name, Group 2: id. Both must be non-empty;
        // anything else falls through as plain text.
        let mention_re = Regex::new(r"@\[([^\]]+)\]\(([^)]+)\)").unwrap();
        Self { mention_re }
    }

    /// Decode markup to a JS array of segment objects.
    #[wasm_bindgen(js_name = decode)]
    pub fn decode_js(&self, markup: &str) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.decode(markup))
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }

    /// Encode a JS array of segment objects to canonical markup.
    #[wasm_bindgen(js_name = encode)]
    pub fn encode_js(&self, segments: JsValue) -> Result<String, JsValue> {
        let segments: Vec<Segment> = serde_wasm_bindgen::from_value(segments)
            .map_err(|e| JsValue::from_str(&format!("Invalid segments: {}", e)))?;
        Ok(encode(&segments))
    }

    /// Extract mention ids from markup as a JS string array.
    #[wasm_bindgen(js_name = idsOf)]
    pub fn ids_of_js(&self, markup: &str) -> Vec<String> {
        self.ids_of(markup)
    }
}

impl Default for MentionCodec {
    fn default() -> Self {
        Self::new()
    }
}

// ==================== TESTS ====================
