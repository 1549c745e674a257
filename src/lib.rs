//! QuillCore: Mention Composer + Comment Thread Engine
//!
//! A Rust/WASM implementation of the mention-aware rich-text composer and
//! the threaded-comment model it feeds. The host UI owns networking,
//! persistence and painting; this core owns the algorithmic middle:
//!
//! ## Composer components
//! - `markup/codec.rs` - MentionCodec: canonical `@[Name](id)` markup <-> segments
//! - `suggest/engine.rs` - directory filtering + candidate resolution
//! - `suggest/picker.rs` - SuggestionBox: wrap-around selection cursor
//! - `composer/offsets.rs` - logical caret math over atomic mention tokens
//! - `composer/surface.rs` - ComposerSurface: trigger detection, commit, submit
//!
//! ## Thread components
//! - `thread/model.rs` - CommentThread: flat working set, ownership, idempotent remote merge
//! - `thread/tree.rs` - parent/child tree construction (orphans surfaced, never dropped)
//! - `thread/render.rs` - indented row projection
//!
//! # Usage (WASM)
//! ```javascript,ignore
//! import init, { ComposerSurface, SuggestionBox, CommentThread } from 'quillcore';
//!
//! await init();
//!
//! const composer = new ComposerSurface();
//! const picker = new SuggestionBox();
//! picker.hydrateDirectory([{ id: 'u1', display_name: 'Ann', email: 'ann@x.org' }]);
//!
//! let snap = composer.onTextChanged('Hi @an', 6);
//! if (snap.trigger) picker.setQuery(snap.trigger.query);
//! composer.commitMention(picker.resolveCurrent());
//!
//! const { markup, tagged_user_ids } = composer.submit();
//!
//! const thread = new CommentThread('motion-1', 'me');
//! thread.hydrate(commentRecords);
//! thread.mergeRemote({ kind: 'created', data: record });
//! console.log(thread.rows());
//! ```

pub mod composer;
pub mod markup;
pub mod suggest;
pub mod thread;

// Public exports
pub use composer::*;
pub use markup::*;
pub use suggest::*;
pub use thread::*;

use wasm_bindgen::prelude::*;

// When the `wee_alloc` feature is enabled, use `wee_alloc` as the global
// allocator for smaller WASM bundle size.
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

/// Initialize panic hook for better error messages in browser console
#[wasm_bindgen(start)]
pub fn main() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Browser console warning; no-op off wasm so native tests stay quiet.
pub(crate) fn console_warn(message: &str) {
    #[cfg(target_arch = "wasm32")]
    web_sys::console::warn_1(&message.into());
    #[cfg(not(target_arch = "wasm32"))]
    let _ = message;
}

/// Get version information
#[wasm_bindgen]
pub fn version() -> String {
    format!("quillcore v{}", env!("CARGO_PKG_VERSION"))
}
