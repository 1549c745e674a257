//! SuggestionBox - stateful candidate picker
//!
//! Owns the hydrated directory snapshot, the active query, the filtered
//! candidate list, and the wrap-around selection cursor driven by the
//! host's arrow-key events.

use serde::Serialize;
use wasm_bindgen::prelude::*;

use super::engine::{filter_directory, resolve_candidate, Candidate, DirectoryEntry};
use crate::markup::MentionToken;

/// Statistics about the picker state
#[derive(Serialize)]
pub struct PickerStats {
    pub directory_size: usize,
    pub candidate_count: usize,
    pub cursor: usize,
    pub query: String,
}

/// SuggestionBox - selection cursor over the filtered candidate list
///
/// The cursor resets to 0 on every re-filter and wraps around in both
/// directions. The directory is a snapshot per suggestion session; the
/// host re-hydrates on whatever cadence it controls.
#[wasm_bindgen]
pub struct SuggestionBox {
    directory: Vec<DirectoryEntry>,
    query: String,
    candidates: Vec<Candidate>,
    cursor: usize,
}

impl SuggestionBox {
    /// Replace the directory snapshot and re-run the active query.
    pub fn hydrate(&mut self, directory: Vec<DirectoryEntry>) {
        self.directory = directory;
        self.refilter();
    }

    /// Set the active query and re-filter; cursor resets to the top.
    pub fn set_query(&mut self, query: &str) {
        self.query = query.to_string();
        self.refilter();
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    /// Candidate under the cursor, or None when the list is empty.
    pub fn current(&self) -> Option<&Candidate> {
        self.candidates.get(self.cursor)
    }

    /// Resolve the candidate under the cursor into a mention token.
    pub fn resolve_current(&self) -> Option<MentionToken> {
        self.current().map(resolve_candidate)
    }

    fn refilter(&mut self) {
        self.candidates = filter_directory(&self.directory, &self.query);
        self.cursor = 0;
    }
}

// ==================== WASM BINDINGS ====================

#[wasm_bindgen]
impl SuggestionBox {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            directory: Vec::new(),
            query: String::new(),
            candidates: filter_directory(&[], ""),
            cursor: 0,
        }
    }

    /// Hydrate the picker with the organization member list.
    ///
    /// # Arguments
    /// * `directory` - JSON array of `{ id, display_name, email }` objects
    #[wasm_bindgen(js_name = hydrateDirectory)]
    pub fn hydrate_directory_js(&mut self, directory: JsValue) -> Result<(), JsValue> {
        let entries: Vec<DirectoryEntry> = serde_wasm_bindgen::from_value(directory)
            .map_err(|e| JsValue::from_str(&format!("Invalid directory: {}", e)))?;
        self.hydrate(entries);
        Ok(())
    }

    /// Re-filter for a new query and return the candidate list.
    #[wasm_bindgen(js_name = setQuery)]
    pub fn set_query_js(&mut self, query: &str) -> Result<JsValue, JsValue> {
        self.set_query(query);
        serde_wasm_bindgen::to_value(&self.candidates)
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }

    /// Move the cursor down, wrapping past the end.
    #[wasm_bindgen(js_name = moveNext)]
    pub fn move_next(&mut self) {
        if !self.candidates.is_empty() {
            self.cursor = (self.cursor + 1) % self.candidates.len();
        }
    }

    /// Move the cursor up, wrapping past the start.
    #[wasm_bindgen(js_name = movePrev)]
    pub fn move_prev(&mut self) {
        if !self.candidates.is_empty() {
            self.cursor = (self.cursor + self.candidates.len() - 1) % self.candidates.len();
        }
    }

    /// Candidate under the cursor as a JS object, or null.
    #[wasm_bindgen(js_name = current)]
    pub fn current_js(&self) -> JsValue {
        match self.current() {
            Some(candidate) => serde_wasm_bindgen::to_value(candidate).unwrap_or(JsValue::NULL),
            None => JsValue::NULL,
        }
    }

    /// Resolved mention token for the candidate under the cursor, or null.
    #[wasm_bindgen(js_name = resolveCurrent)]
    pub fn resolve_current_js(&self) -> JsValue {
        match self.resolve_current() {
            Some(token) => serde_wasm_bindgen::to_value(&token).unwrap_or(JsValue::NULL),
            None => JsValue::NULL,
        }
    }

    /// Get picker statistics
    #[wasm_bindgen(js_name = getStats)]
    pub fn get_stats(&self) -> JsValue {
        let stats = PickerStats {
            directory_size: self.directory.len(),
            candidate_count: self.candidates.len(),
            cursor: self.cursor,
            query: self.query.clone(),
        };
        serde_wasm_bindgen::to_value(&stats).unwrap_or(JsValue::NULL)
    }
}

impl Default for SuggestionBox {
    fn default() -> Self {
        Self::new()
    }
}

// ==================== TESTS ====================
