use tracing::debug;

use crate::document::{BlockId, Document, DocumentId};
use crate::patch::{Operation, Patch, PatchOp};
use crate::versioning::{VersionStore, VersionSummary};

/// Applies patches to documents and keeps the version store consistent.
///
/// `apply` is the only sanctioned way to mutate a document: it seeds the
/// initial snapshot the first time a document is patched, applies the
/// operations in patch order, and records the post-patch snapshot, so undo
/// always returns to the state that predates the patch. Unknown block ids
/// are tolerated (skipped, debug-logged) to favor idempotent replay over
/// strict consistency.
#[derive(Debug, Default)]
pub struct EditEngine {
    store: VersionStore,
}

impl EditEngine {
    pub fn new() -> Self {
        Self { store: VersionStore::new() }
    }

    pub fn with_store(store: VersionStore) -> Self {
        Self { store }
    }

    /// Applies `patch` to a copy of `document` and returns the result.
    pub fn apply(&self, document: &Document, patch: &Patch) -> Document {
        if !self.store.is_tracked(&document.id) {
            self.store.save(document, None, "initial");
        }

        let mut updated = document.clone();
        for patch_op in &patch.ops {
            apply_op(&mut updated, patch_op);
        }

        self.store.save(&updated, Some(patch), &patch.description);
        updated
    }

    pub fn undo(&self, doc_id: &DocumentId) -> Option<Document> {
        self.store.undo(doc_id)
    }

    pub fn redo(&self, doc_id: &DocumentId) -> Option<Document> {
        self.store.redo(doc_id)
    }

    pub fn history(&self, doc_id: &DocumentId) -> Vec<VersionSummary> {
        self.store.history(doc_id)
    }

    pub fn store(&self) -> &VersionStore {
        &self.store
    }
}

fn apply_op(document: &mut Document, patch_op: &PatchOp) {
    match &patch_op.op {
        Operation::ReplaceText { block_id, new_text } => {
            match document.block_mut(block_id) {
                Some(block) => block.text = Some(new_text.clone()),
                None => skip(block_id, "replace_text"),
            }
        }
        Operation::UpdateStyle { block_id, style } => match document.block_mut(block_id) {
            Some(block) => {
                block.style.extend(style.iter().map(|(key, value)| (key.clone(), value.clone())));
            }
            None => skip(block_id, "update_style"),
        },
        Operation::MoveBlock { block_id, position } => match document.block_mut(block_id) {
            Some(block) => block.position.extend(position.iter().map(|(k, v)| (k.clone(), *v))),
            None => skip(block_id, "move_block"),
        },
        Operation::AddBlock { block } => {
            let id = match &block.id {
                // A colliding id would break per-document uniqueness.
                Some(id) if !document.has_block(id) => id.clone(),
                _ => BlockId::fresh(),
            };
            document.blocks.push(block.clone().into_block(id));
        }
        Operation::DeleteBlock { block_id } => {
            match document.blocks.iter().position(|block| &block.id == block_id) {
                Some(index) => {
                    document.blocks.remove(index);
                }
                None => skip(block_id, "delete_block"),
            }
        }
        Operation::ChangeLayout { layout } => {
            document.layout = layout.clone();
        }
    }
}

fn skip(block_id: &BlockId, operation: &str) {
    debug!(block_id = %block_id, operation, "patch target not found; skipping operation");
}
