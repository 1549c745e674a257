//! CommentThread - flat working set of one container's comments
//!
//! Owns the in-memory comment set for exactly one container (motion,
//! task or issue). Rebuilt from the authoritative flat list on reload
//! and patched incrementally by local optimistic mutations and remote
//! events in between. Remote application is idempotent and tolerant of
//! duplicates and replays; it does NOT guarantee causal ordering (an
//! `Updated` arriving before its `Created` is dropped, see DESIGN.md).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

use super::render::{render_rows, ThreadRow};
use super::tree::{build_tree, CommentNode};
use crate::markup::MentionCodec;

// ==================== TYPE DEFINITIONS ====================

/// One comment record, as exchanged with the host.
///
/// `editable` is derived (author == current user), never stored, so a
/// record is independent of who is looking at it.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Comment {
    pub id: String,
    pub container_id: String,
    pub parent_id: Option<String>,
    pub author_id: String,
    /// Canonical mention markup, never display text.
    pub text: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub is_edited: bool,
}

/// A remote mutation delivered by the host once its transport has data.
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(tag = "kind", content = "data", rename_all = "lowercase")]
pub enum RemoteEvent {
    Created(Comment),
    Updated(Comment),
    Deleted { id: String, container_id: String },
}

/// Rejected thread operations. Local and recoverable; there is no fatal
/// class here.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ThreadError {
    NotOwner,
    UnknownId,
    DuplicateId,
}

impl ThreadError {
    pub fn message(&self) -> &'static str {
        match self {
            ThreadError::NotOwner => "comment belongs to another author",
            ThreadError::UnknownId => "no comment with that id",
            ThreadError::DuplicateId => "comment id already present",
        }
    }
}

/// Outcome of applying one remote event.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum MergeOutcome {
    Applied,
    Ignored,
}

impl MergeOutcome {
    pub fn applied(&self) -> bool {
        matches!(self, MergeOutcome::Applied)
    }
}

// ==================== MAIN IMPLEMENTATION ====================

/// CommentThread - sole mutable owner of one container's comment set
#[wasm_bindgen]
pub struct CommentThread {
    container_id: String,
    current_user_id: String,
    records: Vec<Comment>,
    codec: MentionCodec,
}

impl CommentThread {
    /// Replace the working set from the authoritative flat list.
    ///
    /// Insertion order is preserved; the model never re-sorts by
    /// timestamp. Records for other containers are discarded.
    pub fn hydrate(&mut self, records: Vec<Comment>) {
        self.records = records
            .into_iter()
            .filter(|r| r.container_id == self.container_id)
            .collect();
    }

    pub fn records(&self) -> &[Comment] {
        &self.records
    }

    pub fn get(&self, id: &str) -> Option<&Comment> {
        self.records.iter().find(|r| r.id == id)
    }

    /// True iff the current user authored the comment.
    pub fn editable(&self, id: &str) -> bool {
        self.get(id)
            .map(|r| r.author_id == self.current_user_id)
            .unwrap_or(false)
    }

    /// Optimistic local insert, before server confirmation.
    pub fn add(&mut self, record: Comment) -> Result<(), ThreadError> {
        if self.get(&record.id).is_some() {
            return Err(ThreadError::DuplicateId);
        }
        self.records.push(record);
        Ok(())
    }

    /// Replace a comment's markup; ownership-checked, marks it edited.
    pub fn edit(&mut self, id: &str, new_text: &str) -> Result<(), ThreadError> {
        let user = self.current_user_id.clone();
        match self.records.iter_mut().find(|r| r.id == id) {
            None => Err(ThreadError::UnknownId),
            Some(record) if record.author_id != user => Err(ThreadError::NotOwner),
            Some(record) => {
                record.text = new_text.to_string();
                record.is_edited = true;
                Ok(())
            }
        }
    }

    /// Remove a comment; ownership-checked. Children are neither cascade
    /// deleted nor re-parented: they keep their dangling `parent_id` and
    /// render as orphaned replies.
    pub fn remove(&mut self, id: &str) -> Result<(), ThreadError> {
        if self.get(id).is_none() {
            return Err(ThreadError::UnknownId);
        }
        if !self.editable(id) {
            return Err(ThreadError::NotOwner);
        }
        self.records.retain(|r| r.id != id);
        Ok(())
    }

    /// Apply one remote event, idempotently.
    ///
    /// `Created` for a present id, `Updated`/`Deleted` for an unknown id,
    /// and events for another container are all no-ops, so the host may
    /// replay events any number of times.
    pub fn merge_remote(&mut self, event: RemoteEvent) -> MergeOutcome {
        match event {
            RemoteEvent::Created(record) => {
                if record.container_id != self.container_id || self.get(&record.id).is_some() {
                    return MergeOutcome::Ignored;
                }
                self.records.push(record);
                MergeOutcome::Applied
            }
            RemoteEvent::Updated(record) => {
                if record.container_id != self.container_id {
                    return MergeOutcome::Ignored;
                }
                match self.records.iter_mut().find(|r| r.id == record.id) {
                    Some(existing) => {
                        *existing = record;
                        MergeOutcome::Applied
                    }
                    None => {
                        // Update delivered ahead of its create; dropped,
                        // not buffered (see DESIGN.md).
                        crate::console_warn(&format!(
                            "[CommentThread] Dropped update for unknown comment {}",
                            record.id
                        ));
                        MergeOutcome::Ignored
                    }
                }
            }
            RemoteEvent::Deleted { id, container_id } => {
                if container_id != self.container_id || self.get(&id).is_none() {
                    return MergeOutcome::Ignored;
                }
                self.records.retain(|r| r.id != id);
                MergeOutcome::Applied
            }
        }
    }

    /// Swap an optimistic temporary id for the server-assigned one, fixing
    /// any children that already reply to the temporary id.
    ///
    /// When the server id is already present (its `Created` event beat the
    /// confirmation callback) the temporary record is dropped instead, so
    /// the set never holds both.
    pub fn reconcile_local_id(&mut self, temp_id: &str, server_id: &str) -> Result<(), ThreadError> {
        if self.get(temp_id).is_none() {
            return Err(ThreadError::UnknownId);
        }

        if self.get(server_id).is_some() {
            self.records.retain(|r| r.id != temp_id);
        } else if let Some(record) = self.records.iter_mut().find(|r| r.id == temp_id) {
            record.id = server_id.to_string();
        }

        for record in self.records.iter_mut() {
            if record.parent_id.as_deref() == Some(temp_id) {
                record.parent_id = Some(server_id.to_string());
            }
        }
        Ok(())
    }

    /// Mention ids tagged in a stored comment, in order, duplicates kept.
    pub fn tagged_ids(&self, id: &str) -> Result<Vec<String>, ThreadError> {
        self.get(id)
            .map(|r| self.codec.ids_of(&r.text))
            .ok_or(ThreadError::UnknownId)
    }

    /// Parent/child tree over the current working set.
    pub fn tree(&self) -> Vec<CommentNode> {
        build_tree(&self.records)
    }

    /// Flat indented rows for painting the thread.
    pub fn rows(&self) -> Vec<ThreadRow> {
        render_rows(&self.tree())
    }
}

// ==================== WASM BINDINGS ====================

#[wasm_bindgen]
impl CommentThread {
    #[wasm_bindgen(constructor)]
    pub fn new(container_id: &str, current_user_id: &str) -> Self {
        Self {
            container_id: container_id.to_string(),
            current_user_id: current_user_id.to_string(),
            records: Vec::new(),
            codec: MentionCodec::new(),
        }
    }

    /// Rebuild the working set from the authoritative flat list.
    ///
    /// # Arguments
    /// * `records` - JSON array of comment records
    #[wasm_bindgen(js_name = hydrate)]
    pub fn hydrate_js(&mut self, records: JsValue) -> Result<(), JsValue> {
        let records: Vec<Comment> = serde_wasm_bindgen::from_value(records)
            .map_err(|e| JsValue::from_str(&format!("Invalid records: {}", e)))?;
        self.hydrate(records);
        Ok(())
    }

    /// Optimistic local insert.
    #[wasm_bindgen(js_name = add)]
    pub fn add_js(&mut self, record: JsValue) -> Result<(), JsValue> {
        let record: Comment = serde_wasm_bindgen::from_value(record)
            .map_err(|e| JsValue::from_str(&format!("Invalid record: {}", e)))?;
        self.add(record).map_err(|e| JsValue::from_str(e.message()))
    }

    /// Ownership-checked edit.
    #[wasm_bindgen(js_name = edit)]
    pub fn edit_js(&mut self, id: &str, new_text: &str) -> Result<(), JsValue> {
        self.edit(id, new_text)
            .map_err(|e| JsValue::from_str(e.message()))
    }

    /// Ownership-checked delete.
    #[wasm_bindgen(js_name = remove)]
    pub fn remove_js(&mut self, id: &str) -> Result<(), JsValue> {
        self.remove(id).map_err(|e| JsValue::from_str(e.message()))
    }

    /// Apply a remote event; returns true when it changed the set.
    #[wasm_bindgen(js_name = mergeRemote)]
    pub fn merge_remote_js(&mut self, event: JsValue) -> Result<bool, JsValue> {
        let event: RemoteEvent = serde_wasm_bindgen::from_value(event)
            .map_err(|e| JsValue::from_str(&format!("Invalid event: {}", e)))?;
        Ok(self.merge_remote(event).applied())
    }

    /// Swap an optimistic temporary id for the server-assigned one.
    #[wasm_bindgen(js_name = reconcileLocalId)]
    pub fn reconcile_local_id_js(&mut self, temp_id: &str, server_id: &str) -> Result<(), JsValue> {
        self.reconcile_local_id(temp_id, server_id)
            .map_err(|e| JsValue::from_str(e.message()))
    }

    /// True iff the current user may edit/delete the comment.
    #[wasm_bindgen(js_name = isEditable)]
    pub fn is_editable_js(&self, id: &str) -> bool {
        self.editable(id)
    }

    /// Mention ids tagged in a stored comment.
    #[wasm_bindgen(js_name = taggedIds)]
    pub fn tagged_ids_js(&self, id: &str) -> Result<Vec<String>, JsValue> {
        self.tagged_ids(id).map_err(|e| JsValue::from_str(e.message()))
    }

    /// The parent/child tree as a JS array of nodes.
    #[wasm_bindgen(js_name = tree)]
    pub fn tree_js(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.tree())
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }

    /// Flat indented rows as a JS array.
    #[wasm_bindgen(js_name = rows)]
    pub fn rows_js(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.rows())
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }

    /// Get thread status
    #[wasm_bindgen(js_name = getStatus)]
    pub fn get_status(&self) -> JsValue {
        let status = serde_json::json!({
            "container_id": self.container_id,
            "current_user_id": self.current_user_id,
            "record_count": self.records.len(),
            "root_count": self.records.iter().filter(|r| r.parent_id.is_none()).count(),
        });
        JsValue::from_str(&status.to_string())
    }
}

// ==================== TESTS ====================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(id: &str, parent: Option<&str>, author: &str, text: &str) -> Comment {
        Comment {
            id: id.into(),
            container_id: "motion-1".into(),
            parent_id: parent.map(String::from),
            author_id: author.into(),
            text: text.into(),
            created_at: Utc.with_ymd_and_hms(2026, 3, 14, 9, 0, 0).unwrap(),
            is_edited: false,
        }
    }

    fn thread() -> CommentThread {
        let mut thread = CommentThread::new("motion-1", "me");
        thread.hydrate(vec![
            record("1", None, "me", "first @[Ann](u1)"),
            record("2", Some("1"), "other", "reply"),
        ]);
        thread
    }

    #[test]
    fn test_hydrate_drops_foreign_containers() {
        let mut thread = CommentThread::new("motion-1", "me");
        let mut foreign = record("9", None, "me", "elsewhere");
        foreign.container_id = "task-4".into();

        thread.hydrate(vec![record("1", None, "me", "here"), foreign]);
        assert_eq!(thread.records().len(), 1);
        assert_eq!(thread.records()[0].id, "1");
    }

    #[test]
    fn test_editable_is_derived_from_author() {
        let thread = thread();
        assert!(thread.editable("1"));
        assert!(!thread.editable("2"));
        assert!(!thread.editable("missing"));
    }

    #[test]
    fn test_add_rejects_duplicate_id() {
        let mut thread = thread();
        let err = thread.add(record("1", None, "me", "again")).unwrap_err();
        assert_eq!(err, ThreadError::DuplicateId);
        assert_eq!(thread.records().len(), 2);
    }

    #[test]
    fn test_edit_marks_edited() {
        let mut thread = thread();
        thread.edit("1", "updated @[Bo](u2)").unwrap();

        let comment = thread.get("1").unwrap();
        assert_eq!(comment.text, "updated @[Bo](u2)");
        assert!(comment.is_edited);
    }

    #[test]
    fn test_edit_by_non_owner_rejected_and_unapplied() {
        let mut thread = thread();
        let err = thread.edit("2", "hijacked").unwrap_err();

        assert_eq!(err, ThreadError::NotOwner);
        assert_eq!(thread.get("2").unwrap().text, "reply");
        assert!(!thread.get("2").unwrap().is_edited);
    }

    #[test]
    fn test_edit_unknown_id() {
        let mut thread = thread();
        assert_eq!(thread.edit("99", "x").unwrap_err(), ThreadError::UnknownId);
    }

    #[test]
    fn test_remove_keeps_children_dangling() {
        let mut thread = thread();
        thread.remove("1").unwrap();

        assert_eq!(thread.records().len(), 1);
        let orphan = thread.get("2").unwrap();
        assert_eq!(orphan.parent_id.as_deref(), Some("1"));
    }

    #[test]
    fn test_remove_by_non_owner_rejected() {
        let mut thread = thread();
        assert_eq!(thread.remove("2").unwrap_err(), ThreadError::NotOwner);
        assert_eq!(thread.records().len(), 2);
    }

    #[test]
    fn test_merge_created_is_idempotent() {
        let mut thread = thread();
        let incoming = record("1", None, "me", "first @[Ann](u1)");

        let outcome = thread.merge_remote(RemoteEvent::Created(incoming));
        assert_eq!(outcome, MergeOutcome::Ignored);
        assert_eq!(thread.records().iter().filter(|r| r.id == "1").count(), 1);
    }

    #[test]
    fn test_merge_created_appends_new() {
        let mut thread = thread();
        let outcome = thread.merge_remote(RemoteEvent::Created(record("3", None, "other", "new")));

        assert_eq!(outcome, MergeOutcome::Applied);
        assert_eq!(thread.records().len(), 3);
    }

    #[test]
    fn test_merge_updated_replaces_record() {
        let mut thread = thread();
        let mut updated = record("2", Some("1"), "other", "reply v2");
        updated.is_edited = true;

        let outcome = thread.merge_remote(RemoteEvent::Updated(updated));
        assert_eq!(outcome, MergeOutcome::Applied);
        assert_eq!(thread.get("2").unwrap().text, "reply v2");
        assert!(thread.get("2").unwrap().is_edited);
    }

    #[test]
    fn test_merge_updated_unknown_id_dropped() {
        let mut thread = thread();
        let outcome = thread.merge_remote(RemoteEvent::Updated(record("99", None, "other", "x")));

        assert_eq!(outcome, MergeOutcome::Ignored);
        assert!(thread.get("99").is_none());
    }

    #[test]
    fn test_merge_deleted_unknown_id_is_noop() {
        let mut thread = thread();
        let outcome = thread.merge_remote(RemoteEvent::Deleted {
            id: "99".into(),
            container_id: "motion-1".into(),
        });

        assert_eq!(outcome, MergeOutcome::Ignored);
        assert_eq!(thread.records().len(), 2);
    }

    #[test]
    fn test_merge_deleted_removes_without_ownership_check() {
        // Server-delivered deletes are authoritative regardless of author.
        let mut thread = thread();
        let outcome = thread.merge_remote(RemoteEvent::Deleted {
            id: "2".into(),
            container_id: "motion-1".into(),
        });

        assert_eq!(outcome, MergeOutcome::Applied);
        assert!(thread.get("2").is_none());
    }

    #[test]
    fn test_merge_ignores_foreign_container() {
        let mut thread = thread();
        let mut foreign = record("7", None, "other", "elsewhere");
        foreign.container_id = "task-4".into();

        assert_eq!(
            thread.merge_remote(RemoteEvent::Created(foreign)),
            MergeOutcome::Ignored
        );
        assert_eq!(
            thread.merge_remote(RemoteEvent::Deleted {
                id: "1".into(),
                container_id: "task-4".into(),
            }),
            MergeOutcome::Ignored
        );
        assert_eq!(thread.records().len(), 2);
    }

    #[test]
    fn test_merge_replay_safe() {
        let mut thread = thread();
        let event = RemoteEvent::Deleted {
            id: "2".into(),
            container_id: "motion-1".into(),
        };

        assert_eq!(thread.merge_remote(event.clone()), MergeOutcome::Applied);
        assert_eq!(thread.merge_remote(event.clone()), MergeOutcome::Ignored);
        assert_eq!(thread.merge_remote(event), MergeOutcome::Ignored);
        assert_eq!(thread.records().len(), 1);
    }

    #[test]
    fn test_reconcile_swaps_id_and_fixes_children() {
        let mut thread = CommentThread::new("motion-1", "me");
        thread.add(record("tmp-1", None, "me", "optimistic")).unwrap();
        thread.add(record("2", Some("tmp-1"), "me", "self reply")).unwrap();

        thread.reconcile_local_id("tmp-1", "41").unwrap();

        assert!(thread.get("tmp-1").is_none());
        assert!(thread.get("41").is_some());
        assert_eq!(thread.get("2").unwrap().parent_id.as_deref(), Some("41"));
    }

    #[test]
    fn test_reconcile_when_created_event_won_the_race() {
        let mut thread = CommentThread::new("motion-1", "me");
        thread.add(record("tmp-1", None, "me", "optimistic")).unwrap();
        let outcome =
            thread.merge_remote(RemoteEvent::Created(record("41", None, "me", "optimistic")));
        assert_eq!(outcome, MergeOutcome::Applied);

        thread.reconcile_local_id("tmp-1", "41").unwrap();

        assert_eq!(thread.records().len(), 1);
        assert_eq!(thread.records()[0].id, "41");
    }

    #[test]
    fn test_tagged_ids_reads_stored_markup() {
        let thread = thread();
        assert_eq!(thread.tagged_ids("1").unwrap(), vec!["u1"]);
        assert_eq!(thread.tagged_ids("99").unwrap_err(), ThreadError::UnknownId);
    }
}
