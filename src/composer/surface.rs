//! ComposerSurface - mention-aware editable surface controller
//!
//! Owns one [`EditorSession`] and keeps its segment buffer in sync with
//! free-form host edits while mention tokens behave as single atomic
//! units. State machine: Idle -> Composing on first content;
//! Composing -> Suggesting when an unterminated `@` trigger sits before
//! the caret; back to Composing on whitespace after the `@`, on commit,
//! or on explicit cancel.
//!
//! Every operation is total: invalid offsets clamp to the buffer bounds
//! instead of erroring. This is pure in-memory text manipulation; there
//! is no recoverable-vs-fatal error split here.

use serde::Serialize;
use unicode_segmentation::UnicodeSegmentation;
use wasm_bindgen::prelude::*;

use super::offsets::{
    clamp_offset, display_text, mention_ending_at, mention_spans, mention_starting_at, normalize,
    remove_range, insert_at, logical_len, seg_len,
};
use super::session::{ComposerState, EditorSession, Submission, TriggerState};
use crate::markup::{encode, MentionCodec, MentionToken, Segment};

// ==================== TYPE DEFINITIONS ====================

/// Host-facing snapshot of the session after an operation.
#[derive(Serialize)]
pub struct SurfaceSnapshot {
    pub segments: Vec<Segment>,
    pub caret: usize,
    pub trigger: Option<TriggerState>,
    pub state: String,
    pub display_text: String,
}

// ==================== TRIGGER DETECTION ====================

/// Re-derive the trigger by scanning the display text backward from the
/// caret for the nearest unconsumed `@`.
///
/// Whitespace between the `@` and the caret abandons the trigger; an `@`
/// belonging to a mention token's display span is consumed and cannot
/// start a new trigger (nor can any `@` further left, since the token
/// would sit inside the query).
fn derive_trigger(segments: &[Segment], caret: usize) -> Option<TriggerState> {
    let text = display_text(segments);
    let glyphs: Vec<&str> = text.graphemes(true).collect();
    let caret = caret.min(glyphs.len());
    let spans = mention_spans(segments);

    for i in (0..caret).rev() {
        let glyph = glyphs[i];
        if glyph.chars().any(char::is_whitespace) {
            return None;
        }
        if glyph == "@" {
            if spans.iter().any(|&(start, end)| i >= start && i < end) {
                return None;
            }
            return Some(TriggerState {
                start_offset: i,
                query: glyphs[i + 1..caret].concat(),
            });
        }
    }
    None
}

/// Reconcile a freshly edited display text against the previous segment
/// list. Each surviving mention is matched by its `@Name` display form
/// left-to-right; a mention whose display form is gone was deleted
/// wholesale. Everything around the survivors becomes plain text.
fn reconcile(old: &[Segment], new_text: &str) -> Vec<Segment> {
    let mut out = Vec::new();
    let mut rest = new_text;

    for seg in old {
        if let Segment::Mention(token) = seg {
            let needle = format!("@{}", token.display_name);
            if let Some(pos) = rest.find(&needle) {
                if pos > 0 {
                    out.push(Segment::text(&rest[..pos]));
                }
                out.push(seg.clone());
                rest = &rest[pos + needle.len()..];
            }
        }
    }

    if !rest.is_empty() {
        out.push(Segment::text(rest));
    }
    normalize(out)
}

// ==================== MAIN IMPLEMENTATION ====================

/// ComposerSurface - one controller per logical input
#[wasm_bindgen]
pub struct ComposerSurface {
    codec: MentionCodec,
    session: EditorSession,
}

impl ComposerSurface {
    pub fn session(&self) -> &EditorSession {
        &self.session
    }

    /// Seed the buffer from existing canonical markup (edit-in-place
    /// boxes); the caret lands at the end of the buffer.
    pub fn load_markup(&mut self, markup: &str) {
        self.session.segments = self.codec.decode(markup);
        self.session.caret = logical_len(&self.session.segments);
        self.session.trigger = None;
    }

    /// The host surface changed: recompute segments from the new display
    /// text, clamp the caret, and re-derive the trigger.
    pub fn on_text_changed(&mut self, new_display_text: &str, caret: usize) {
        self.session.segments = reconcile(&self.session.segments, new_display_text);
        self.session.caret = clamp_offset(&self.session.segments, caret);
        self.session.trigger = derive_trigger(&self.session.segments, self.session.caret);
    }

    /// Backspace at `caret`: a mention ending exactly at the caret is
    /// removed as one unit; otherwise one grapheme goes. Returns the new
    /// caret offset.
    pub fn on_backspace(&mut self, caret: usize) -> usize {
        let caret = clamp_offset(&self.session.segments, caret);
        let new_caret = if let Some((start, end)) = mention_ending_at(&self.session.segments, caret)
        {
            self.session.segments = normalize(remove_range(&self.session.segments, start, end));
            start
        } else if caret > 0 {
            self.session.segments =
                normalize(remove_range(&self.session.segments, caret - 1, caret));
            caret - 1
        } else {
            caret
        };
        self.session.caret = new_caret;
        self.session.trigger = derive_trigger(&self.session.segments, new_caret);
        new_caret
    }

    /// Forward delete at `caret`: a mention starting exactly at the caret
    /// is removed as one unit; otherwise one grapheme goes.
    pub fn on_delete(&mut self, caret: usize) -> usize {
        let caret = clamp_offset(&self.session.segments, caret);
        if let Some((start, end)) = mention_starting_at(&self.session.segments, caret) {
            self.session.segments = normalize(remove_range(&self.session.segments, start, end));
        } else {
            self.session.segments =
                normalize(remove_range(&self.session.segments, caret, caret + 1));
        }
        self.session.caret = caret;
        self.session.trigger = derive_trigger(&self.session.segments, caret);
        caret
    }

    /// Replace the active trigger range with a mention token plus one
    /// trailing space; the caret lands after the space. The separator
    /// keeps a committed token from merging with whatever the user types
    /// next when the buffer is re-encoded.
    ///
    /// Returns false (and changes nothing) when no trigger is active.
    pub fn commit_mention(&mut self, token: &MentionToken) -> bool {
        let Some(trigger) = self.session.trigger.take() else {
            return false;
        };

        let caret = self.session.caret;
        let start = trigger.start_offset.min(caret);
        let mention = Segment::Mention(token.clone());
        let mention_len = seg_len(&mention);

        let trimmed = remove_range(&self.session.segments, start, caret);
        let inserted = insert_at(&trimmed, start, vec![mention, Segment::text(" ")]);
        self.session.segments = normalize(inserted);
        self.session.caret = start + mention_len + 1;
        true
    }

    /// Drop the trigger without touching the buffer (escape key).
    pub fn cancel_suggestion(&mut self) {
        self.session.trigger = None;
    }

    /// Encode the buffer for persistence. Unavailable while a suggestion
    /// is in progress. Clearing the session afterwards is the caller's
    /// job, not implicit.
    pub fn submit(&self) -> Option<Submission> {
        if self.session.trigger.is_some() {
            return None;
        }
        let markup = encode(&self.session.segments);
        let tagged_user_ids = self.codec.ids_of(&markup);
        Some(Submission {
            markup,
            tagged_user_ids,
        })
    }

    /// Reset to an empty session.
    pub fn clear(&mut self) {
        self.session = EditorSession::default();
    }

    pub fn state(&self) -> ComposerState {
        self.session.state()
    }

    fn make_snapshot(&self) -> SurfaceSnapshot {
        SurfaceSnapshot {
            segments: self.session.segments.clone(),
            caret: self.session.caret,
            trigger: self.session.trigger.clone(),
            state: self.state().as_str().to_string(),
            display_text: display_text(&self.session.segments),
        }
    }
}

// ==================== WASM BINDINGS ====================

#[wasm_bindgen]
impl ComposerSurface {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            codec: MentionCodec::new(),
            session: EditorSession::default(),
        }
    }

    /// Seed the buffer from canonical markup and return a snapshot.
    #[wasm_bindgen(js_name = loadMarkup)]
    pub fn load_markup_js(&mut self, markup: &str) -> Result<JsValue, JsValue> {
        self.load_markup(markup);
        self.snapshot()
    }

    /// Apply a host edit and return a snapshot.
    #[wasm_bindgen(js_name = onTextChanged)]
    pub fn on_text_changed_js(&mut self, text: &str, caret: usize) -> Result<JsValue, JsValue> {
        self.on_text_changed(text, caret);
        self.snapshot()
    }

    /// Backspace; returns a snapshot with the updated caret.
    #[wasm_bindgen(js_name = onBackspace)]
    pub fn on_backspace_js(&mut self, caret: usize) -> Result<JsValue, JsValue> {
        self.on_backspace(caret);
        self.snapshot()
    }

    /// Forward delete; returns a snapshot.
    #[wasm_bindgen(js_name = onDelete)]
    pub fn on_delete_js(&mut self, caret: usize) -> Result<JsValue, JsValue> {
        self.on_delete(caret);
        self.snapshot()
    }

    /// Commit a mention token into the active trigger range.
    #[wasm_bindgen(js_name = commitMention)]
    pub fn commit_mention_js(&mut self, token: JsValue) -> Result<bool, JsValue> {
        let token: MentionToken = serde_wasm_bindgen::from_value(token)
            .map_err(|e| JsValue::from_str(&format!("Invalid token: {}", e)))?;
        Ok(self.commit_mention(&token))
    }

    /// Cancel the suggestion session (escape).
    #[wasm_bindgen(js_name = cancelSuggestion)]
    pub fn cancel_suggestion_js(&mut self) {
        self.cancel_suggestion();
    }

    /// Encode the buffer; rejects while a suggestion is in progress.
    #[wasm_bindgen(js_name = submit)]
    pub fn submit_js(&self) -> Result<JsValue, JsValue> {
        let submission = self
            .submit()
            .ok_or_else(|| JsValue::from_str("Mention suggestion still active"))?;
        serde_wasm_bindgen::to_value(&submission)
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }

    /// Reset to an empty session.
    #[wasm_bindgen(js_name = clear)]
    pub fn clear_js(&mut self) {
        self.clear();
    }

    /// Current session snapshot as a JS object.
    #[wasm_bindgen(js_name = snapshot)]
    pub fn snapshot(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.make_snapshot())
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }

    /// Coarse state for the host: "idle", "composing" or "suggesting".
    #[wasm_bindgen(js_name = getState)]
    pub fn get_state(&self) -> String {
        self.state().as_str().to_string()
    }
}

impl Default for ComposerSurface {
    fn default() -> Self {
        Self::new()
    }
}

// ==================== TESTS ====================

#[cfg(test)]
mod tests {
    use super::*;

    fn surface_with(markup: &str) -> ComposerSurface {
        let mut surface = ComposerSurface::new();
        surface.load_markup(markup);
        surface
    }

    #[test]
    fn test_trigger_detected_behind_caret() {
        let mut surface = ComposerSurface::new();
        surface.on_text_changed("Hi @ja", 6);

        assert_eq!(
            surface.session().trigger,
            Some(TriggerState {
                start_offset: 3,
                query: "ja".into(),
            })
        );
        assert_eq!(surface.state(), ComposerState::Suggesting);
    }

    #[test]
    fn test_whitespace_after_at_abandons_trigger() {
        let mut surface = ComposerSurface::new();
        surface.on_text_changed("Hi @ja x", 8);

        assert_eq!(surface.session().trigger, None);
        assert_eq!(surface.state(), ComposerState::Composing);
    }

    #[test]
    fn test_caret_before_at_means_no_trigger() {
        let mut surface = ComposerSurface::new();
        surface.on_text_changed("Hi @ja", 3);

        assert_eq!(surface.session().trigger, None);
    }

    #[test]
    fn test_at_inside_committed_mention_is_consumed() {
        let mut surface = surface_with("@[Ann](u7)");
        // Caret right after the mention display "@Ann"
        surface.on_text_changed("@Ann", 4);

        assert_eq!(surface.session().trigger, None);
    }

    #[test]
    fn test_commit_replaces_trigger_range_and_adds_space() {
        let mut surface = ComposerSurface::new();
        surface.on_text_changed("Hi @ja", 6);

        let committed = surface.commit_mention(&MentionToken::new("u2", "Janek Vos"));
        assert!(committed);

        assert_eq!(
            surface.session().segments,
            vec![
                Segment::text("Hi "),
                Segment::mention("u2", "Janek Vos"),
                Segment::text(" "),
            ]
        );
        // "Hi " (3) + "@Janek Vos" (10) + the separator space
        assert_eq!(surface.session().caret, 14);
        assert_eq!(surface.session().trigger, None);
        assert_eq!(surface.state(), ComposerState::Composing);
    }

    #[test]
    fn test_commit_mid_text_keeps_tail() {
        let mut surface = ComposerSurface::new();
        surface.on_text_changed("a @an b", 5);
        assert!(surface.session().trigger.is_some());

        assert!(surface.commit_mention(&MentionToken::new("u1", "Ann")));
        assert_eq!(
            surface.session().segments,
            vec![
                Segment::text("a "),
                Segment::mention("u1", "Ann"),
                Segment::text("  b"),
            ]
        );
        assert_eq!(surface.session().caret, 7);
    }

    #[test]
    fn test_commit_without_trigger_is_rejected() {
        let mut surface = surface_with("hello");
        assert!(!surface.commit_mention(&MentionToken::new("u1", "Ann")));
        assert_eq!(surface.session().segments, vec![Segment::text("hello")]);
    }

    #[test]
    fn test_backspace_removes_whole_mention() {
        let mut surface = surface_with("Hi @[Ann](7) !");
        // Buffer: "Hi " + @Ann + " !", caret right after the mention
        let caret = surface.on_backspace(7);

        assert_eq!(caret, 3);
        assert_eq!(surface.session().segments, vec![Segment::text("Hi  !")]);
    }

    #[test]
    fn test_backspace_removes_single_grapheme_elsewhere() {
        let mut surface = surface_with("abc");
        let caret = surface.on_backspace(2);

        assert_eq!(caret, 1);
        assert_eq!(surface.session().segments, vec![Segment::text("ac")]);
    }

    #[test]
    fn test_backspace_at_start_is_noop() {
        let mut surface = surface_with("abc");
        assert_eq!(surface.on_backspace(0), 0);
        assert_eq!(surface.session().segments, vec![Segment::text("abc")]);
    }

    #[test]
    fn test_delete_removes_whole_mention() {
        let mut surface = surface_with("Hi @[Ann](7) !");
        let caret = surface.on_delete(3);

        assert_eq!(caret, 3);
        assert_eq!(surface.session().segments, vec![Segment::text("Hi  !")]);
    }

    #[test]
    fn test_delete_at_end_is_noop() {
        let mut surface = surface_with("ab");
        assert_eq!(surface.on_delete(2), 2);
        assert_eq!(surface.session().segments, vec![Segment::text("ab")]);
    }

    #[test]
    fn test_text_edit_preserves_mentions() {
        let mut surface = surface_with("Hi @[Ann](7)!");
        // Host inserted " there" into the leading text run
        surface.on_text_changed("Hi there @Ann!", 8);

        assert_eq!(
            surface.session().segments,
            vec![
                Segment::text("Hi there "),
                Segment::mention("7", "Ann"),
                Segment::text("!"),
            ]
        );
    }

    #[test]
    fn test_wholesale_mention_removal_via_text_change() {
        let mut surface = surface_with("Hi @[Ann](7)!");
        surface.on_text_changed("Hi !", 4);

        assert_eq!(surface.session().segments, vec![Segment::text("Hi !")]);
    }

    #[test]
    fn test_caret_clamps_to_buffer() {
        let mut surface = ComposerSurface::new();
        surface.on_text_changed("ab", 99);
        assert_eq!(surface.session().caret, 2);
    }

    #[test]
    fn test_submit_yields_markup_and_tagged_ids() {
        let mut surface = ComposerSurface::new();
        surface.on_text_changed("ping @an", 8);
        assert!(surface.commit_mention(&MentionToken::new("u1", "Ann")));
        surface.on_text_changed("ping @Ann and @ev", 17);
        assert!(surface.commit_mention(&MentionToken::new("everyone", "Everyone")));

        let submission = surface.submit().unwrap();
        assert_eq!(submission.markup, "ping @[Ann](u1) and @[Everyone](everyone) ");
        assert_eq!(submission.tagged_user_ids, vec!["u1", "everyone"]);
    }

    #[test]
    fn test_submit_rejected_while_suggesting() {
        let mut surface = ComposerSurface::new();
        surface.on_text_changed("@an", 3);
        assert!(surface.submit().is_none());

        surface.cancel_suggestion();
        assert!(surface.submit().is_some());
    }

    #[test]
    fn test_clear_resets_session() {
        let mut surface = surface_with("some text");
        surface.clear();

        assert_eq!(surface.state(), ComposerState::Idle);
        assert!(surface.session().segments.is_empty());
        assert_eq!(surface.session().caret, 0);
    }

    #[test]
    fn test_load_markup_places_caret_at_end() {
        let surface = surface_with("Hi @[Ann](7)!");
        // "Hi " (3) + "@Ann" (4) + "!" (1)
        assert_eq!(surface.session().caret, 8);
        assert_eq!(surface.state(), ComposerState::Composing);
    }
}
