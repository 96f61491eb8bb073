//! Delete confirmation flow.
//!
//! Selecting delete never calls the backend. It arms a [`PendingDeletion`]
//! that the user then confirms, cancels or dismisses. Only a confirmation hands
//! out the note id to delete, and the pending state is cleared in every case.

use crate::models::{Note, NoteId};

const PREVIEW_CHARS: usize = 60;

/// The note awaiting confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingDeletion {
    pub note_id: NoteId,
    /// Short text shown in the confirmation prompt.
    pub preview: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeletionFlow {
    pending: Option<PendingDeletion>,
}

impl DeletionFlow {
    /// Arm the prompt for `note`, replacing any prompt already open.
    pub fn request(&mut self, note: &Note) -> PendingDeletion {
        let pending = PendingDeletion {
            note_id: note.id.clone(),
            preview: note.preview(PREVIEW_CHARS),
        };
        if let Some(previous) = self.pending.replace(pending.clone()) {
            tracing::debug!("Delete prompt moved from {} to {}", previous.note_id, note.id);
        }
        pending
    }

    pub const fn pending(&self) -> Option<&PendingDeletion> {
        self.pending.as_ref()
    }

    /// Confirm the prompt, returning the id to delete.
    pub fn confirm(&mut self) -> Option<NoteId> {
        self.pending.take().map(|pending| pending.note_id)
    }

    /// Cancel the prompt. Returns whether one was open.
    pub fn cancel(&mut self) -> bool {
        self.pending.take().is_some()
    }

    /// The prompt was closed without an explicit choice.
    pub fn dismiss(&mut self) -> bool {
        self.cancel()
    }
}
