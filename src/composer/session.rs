//! EditorSession - per-input composer state
//!
//! One session belongs to exactly one logical input (top-level comment
//! box, a specific reply box, or an edit-in-place box) and is never
//! shared. All composer operations take and mutate the session through
//! its owning [`super::surface::ComposerSurface`]; there is no ambient
//! or global editing state.

use serde::{Deserialize, Serialize};

use crate::markup::Segment;

/// The in-progress `@query` substring that activates the suggestion popup.
///
/// Present only while an active, unterminated `@` trigger sits before
/// the caret. Offsets are logical (grapheme) offsets into the display
/// text.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct TriggerState {
    pub start_offset: usize,
    pub query: String,
}

/// Coarse composer state reported to the host.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ComposerState {
    Idle,
    Composing,
    Suggesting,
}

impl ComposerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComposerState::Idle => "idle",
            ComposerState::Composing => "composing",
            ComposerState::Suggesting => "suggesting",
        }
    }
}

/// Live edit buffer of one logical input.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct EditorSession {
    pub segments: Vec<Segment>,
    pub caret: usize,
    pub trigger: Option<TriggerState>,
}

impl EditorSession {
    pub fn state(&self) -> ComposerState {
        if self.trigger.is_some() {
            ComposerState::Suggesting
        } else if self.segments.is_empty() {
            ComposerState::Idle
        } else {
            ComposerState::Composing
        }
    }
}

/// Result of a successful submit: the canonical markup plus the ordered
/// mention id list used for tagged-user notifications.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Submission {
    pub markup: String,
    pub tagged_user_ids: Vec<String>,
}
