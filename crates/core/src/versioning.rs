use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::document::{Document, DocumentId};
use crate::patch::Patch;

pub const DEFAULT_RETENTION_CAP: usize = 50;

/// An immutable deep copy of a document at one point in its edit history.
#[derive(Clone, Debug)]
pub struct DocumentVersion {
    pub version_id: String,
    pub document: Document,
    /// The patch that produced this snapshot; `None` only for the initial
    /// snapshot seeded before a document's first patch.
    pub patch_applied: Option<Patch>,
    pub timestamp: DateTime<Utc>,
    pub description: String,
}

/// Display-only projection of a version, for history listings.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct VersionSummary {
    pub version_id: String,
    pub timestamp: DateTime<Utc>,
    pub description: String,
    pub patch_description: Option<String>,
}

#[derive(Debug, Default)]
struct History {
    versions: Vec<DocumentVersion>,
    cursor: usize,
}

/// Per-document append-only snapshot list with a movable cursor.
///
/// The store itself serializes `save`/`undo`/`redo` behind a mutex, so a
/// concurrent host cannot corrupt the cursor/list pair for a document id.
/// Unknown document ids behave as empty histories: every operation is a
/// no-op or `None`, never an error.
#[derive(Debug, Default)]
pub struct VersionStore {
    retention_cap: usize,
    histories: Mutex<HashMap<DocumentId, History>>,
}

impl VersionStore {
    pub fn new() -> Self {
        Self::with_retention_cap(DEFAULT_RETENTION_CAP)
    }

    pub fn with_retention_cap(retention_cap: usize) -> Self {
        Self { retention_cap: retention_cap.max(1), histories: Mutex::new(HashMap::new()) }
    }

    /// Records a deep-copied snapshot of `document`, discarding any
    /// previously-undone branch beyond the cursor, and evicting from the
    /// front past the retention cap.
    pub fn save(&self, document: &Document, patch: Option<&Patch>, description: &str) -> String {
        let mut histories = self.lock();
        let history = histories.entry(document.id.clone()).or_default();

        // Anything past the cursor is an abandoned redo branch.
        history.versions.truncate(history.cursor + 1);

        let version = DocumentVersion {
            version_id: Uuid::new_v4().to_string(),
            document: document.clone(),
            patch_applied: patch.cloned(),
            timestamp: Utc::now(),
            description: description.to_string(),
        };
        let version_id = version.version_id.clone();

        history.versions.push(version);
        history.cursor = history.versions.len() - 1;

        while history.versions.len() > self.retention_cap {
            history.versions.remove(0);
            history.cursor = history.cursor.saturating_sub(1);
        }

        version_id
    }

    /// Moves the cursor one step back and returns the snapshot now current.
    /// `None` at the start of history or for unknown documents.
    pub fn undo(&self, doc_id: &DocumentId) -> Option<Document> {
        let mut histories = self.lock();
        let history = histories.get_mut(doc_id)?;

        if history.cursor == 0 {
            return None;
        }
        history.cursor -= 1;
        Some(history.versions[history.cursor].document.clone())
    }

    /// Moves the cursor one step forward and returns the snapshot now
    /// current. `None` at the end of history or for unknown documents.
    pub fn redo(&self, doc_id: &DocumentId) -> Option<Document> {
        let mut histories = self.lock();
        let history = histories.get_mut(doc_id)?;

        if history.cursor + 1 >= history.versions.len() {
            return None;
        }
        history.cursor += 1;
        Some(history.versions[history.cursor].document.clone())
    }

    /// Ordered version summaries for display. Does not move the cursor.
    pub fn history(&self, doc_id: &DocumentId) -> Vec<VersionSummary> {
        let histories = self.lock();
        let Some(history) = histories.get(doc_id) else { return Vec::new() };

        history
            .versions
            .iter()
            .map(|version| VersionSummary {
                version_id: version.version_id.clone(),
                timestamp: version.timestamp,
                description: version.description.clone(),
                patch_description: version
                    .patch_applied
                    .as_ref()
                    .map(|patch| patch.description.clone()),
            })
            .collect()
    }

    /// Whether any snapshot has been recorded for this document.
    pub fn is_tracked(&self, doc_id: &DocumentId) -> bool {
        self.lock().get(doc_id).map(|history| !history.versions.is_empty()).unwrap_or(false)
    }

    /// Drops a document's entire history.
    pub fn discard(&self, doc_id: &DocumentId) {
        self.lock().remove(doc_id);
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<DocumentId, History>> {
        match self.histories.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::document::{Block, BlockId, Document, DocumentId};
    use crate::patch::Patch;

    use super::{VersionStore, DEFAULT_RETENTION_CAP};

    fn doc(text: &str) -> Document {
        let mut document = Document::new(DocumentId("doc-1".to_string()));
        let mut block = Block::new(BlockId("headline".to_string()), "text");
        block.text = Some(text.to_string());
        document.blocks.push(block);
        document
    }

    fn empty_patch(description: &str) -> Patch {
        Patch::new(Vec::new(), description, 1.0).expect("valid patch")
    }

    #[test]
    fn undo_returns_previous_snapshot_and_stops_at_history_start() {
        let store = VersionStore::new();
        let initial = doc("v0");
        store.save(&initial, None, "initial");
        store.save(&doc("v1"), Some(&empty_patch("p1")), "p1");

        assert_eq!(store.undo(&initial.id), Some(initial.clone()));
        assert_eq!(store.undo(&initial.id), None);
    }

    #[test]
    fn redo_restores_the_state_before_the_undo() {
        let store = VersionStore::new();
        let d0 = doc("v0");
        let d1 = doc("v1");
        store.save(&d0, None, "initial");
        store.save(&d1, Some(&empty_patch("p1")), "p1");

        assert_eq!(store.undo(&d0.id), Some(d0.clone()));
        assert_eq!(store.redo(&d0.id), Some(d1));
        assert_eq!(store.redo(&d0.id), None);
    }

    #[test]
    fn save_after_undo_truncates_the_redo_branch() {
        let store = VersionStore::new();
        let d0 = doc("v0");
        store.save(&d0, None, "initial");
        store.save(&doc("v1"), Some(&empty_patch("p1")), "p1");

        store.undo(&d0.id);
        store.save(&doc("v2"), Some(&empty_patch("p2")), "p2");

        assert_eq!(store.redo(&d0.id), None);
        let descriptions: Vec<_> =
            store.history(&d0.id).into_iter().map(|entry| entry.description).collect();
        assert_eq!(descriptions, vec!["initial", "p2"]);
    }

    #[test]
    fn history_length_never_exceeds_the_retention_cap() {
        let store = VersionStore::new();
        let d0 = doc("v0");
        for index in 0..(DEFAULT_RETENTION_CAP * 2) {
            let label = format!("p{index}");
            store.save(&doc(&label), Some(&empty_patch(&label)), &label);
        }

        assert_eq!(store.history(&d0.id).len(), DEFAULT_RETENTION_CAP);
    }

    #[test]
    fn eviction_keeps_the_cursor_on_the_newest_snapshot() {
        let store = VersionStore::with_retention_cap(3);
        let d0 = doc("v0");
        for index in 0..5 {
            store.save(&doc(&format!("v{index}")), None, "save");
        }

        // Newest snapshot is v4; one undo steps to v3.
        let undone = store.undo(&d0.id).expect("undo within cap");
        assert_eq!(undone.blocks[0].text.as_deref(), Some("v3"));
    }

    #[test]
    fn unknown_document_ids_are_empty_not_errors() {
        let store = VersionStore::new();
        let unknown = DocumentId("ghost".to_string());

        assert_eq!(store.undo(&unknown), None);
        assert_eq!(store.redo(&unknown), None);
        assert!(store.history(&unknown).is_empty());
        assert!(!store.is_tracked(&unknown));
    }

    #[test]
    fn history_reports_patch_descriptions_without_moving_the_cursor() {
        let store = VersionStore::new();
        let d0 = doc("v0");
        store.save(&d0, None, "initial");
        store.save(&doc("v1"), Some(&empty_patch("restyle")), "restyle");

        let summaries = store.history(&d0.id);
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].patch_description, None);
        assert_eq!(summaries[1].patch_description.as_deref(), Some("restyle"));

        // Listing history must not disturb undo.
        assert_eq!(store.undo(&d0.id), Some(d0));
    }
}
