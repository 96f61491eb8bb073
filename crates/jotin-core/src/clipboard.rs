//! Dual-path clipboard copy and the transient "copied" indicator.
//!
//! A copy tries the privileged backend command and, independently, the
//! OS-native clipboard. [`reconcile_copy`] merges the two results: any success
//! wins, and only when both fail is the most diagnostic message reported.

use tokio::time::Instant;

use crate::commands::StorageClient;
use crate::error::{ClipboardFailure, StorageFailure};
use crate::models::NoteId;

/// Message used when neither path produced a useful error.
pub const GENERIC_COPY_FAILURE: &str = "Failed to copy note";

/// OS-native clipboard write available to the surface itself.
pub trait NativeClipboard: Send + Sync {
    fn write_text(&self, text: &str) -> Result<(), String>;
}

/// Which path delivered the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyPath {
    Privileged,
    Native,
}

/// Merge the outcomes of both paths into one user-visible result.
///
/// The privileged path's message is preferred when it carries one, then the
/// native path's, then [`GENERIC_COPY_FAILURE`].
pub fn reconcile_copy(
    privileged: Result<(), StorageFailure>,
    native: Result<(), String>,
) -> Result<CopyPath, ClipboardFailure> {
    match (privileged, native) {
        (Ok(()), _) => Ok(CopyPath::Privileged),
        (Err(_), Ok(())) => Ok(CopyPath::Native),
        (Err(privileged), Err(native)) => {
            let message = [privileged.message(), native.as_str()]
                .into_iter()
                .map(str::trim)
                .find(|message| !message.is_empty())
                .unwrap_or(GENERIC_COPY_FAILURE);
            Err(ClipboardFailure::new(message))
        }
    }
}

/// Attempt both paths for `text` and reconcile.
pub async fn copy_text(
    client: &StorageClient,
    native: &dyn NativeClipboard,
    text: &str,
) -> Result<CopyPath, ClipboardFailure> {
    let privileged = client.copy_to_system_clipboard(text).await;
    if let Err(error) = &privileged {
        tracing::debug!("Privileged clipboard path failed: {error}");
    }
    let native = native.write_text(text);
    if let Err(error) = &native {
        tracing::debug!("Native clipboard path failed: {error}");
    }
    reconcile_copy(privileged, native)
}

/// The single note currently showing the "copied" indicator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyFeedbackState {
    pub note_id: NoteId,
    pub expires_at: Instant,
    generation: u64,
}

impl CopyFeedbackState {
    pub const fn generation(&self) -> u64 {
        self.generation
    }
}

/// Tracks the "copied" marker. A newer mark supersedes the older one, and an
/// expiry only clears the mark it was scheduled for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CopyFeedback {
    active: Option<CopyFeedbackState>,
    generation: u64,
}

impl CopyFeedback {
    /// Mark `note_id` as copied until `expires_at`, replacing any previous mark.
    pub fn mark(&mut self, note_id: NoteId, expires_at: Instant) -> CopyFeedbackState {
        self.generation += 1;
        let state = CopyFeedbackState {
            note_id,
            expires_at,
            generation: self.generation,
        };
        self.active = Some(state.clone());
        state
    }

    /// Clear the mark if it is still the one created with `generation`.
    pub fn expire(&mut self, generation: u64) -> bool {
        if self
            .active
            .as_ref()
            .is_some_and(|active| active.generation == generation)
        {
            self.active = None;
            true
        } else {
            false
        }
    }

    pub const fn active(&self) -> Option<&CopyFeedbackState> {
        self.active.as_ref()
    }

    pub fn is_copied(&self, note_id: &NoteId) -> bool {
        self.active
            .as_ref()
            .is_some_and(|active| &active.note_id == note_id)
    }
}


#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use pretty_assertions::assert_eq;

    use super::testing::FakeClipboard;
    use super::*;
    use crate::commands::testing::ScriptedTransport;

    #[test]
    fn privileged_success_wins() {
        assert_eq!(
            reconcile_copy(Ok(()), Err("denied".to_string())),
            Ok(CopyPath::Privileged)
        );
    }

    #[test]
    fn native_success_covers_privileged_failure() {
        assert_eq!(
            reconcile_copy(Err(StorageFailure::new("no clipboard")), Ok(())),
            Ok(CopyPath::Native)
        );
    }

    #[test]
    fn both_failing_prefers_structured_privileged_message() {
        let error = reconcile_copy(
            Err(StorageFailure::new("Failed to access clipboard: locked")),
            Err("NotAllowedError".to_string()),
        )
        .unwrap_err();
        assert_eq!(error.message(), "Failed to access clipboard: locked");
    }

    #[test]
    fn both_failing_falls_back_to_native_then_generic() {
        let native = reconcile_copy(Err(StorageFailure::new("  ")), Err("denied".to_string()))
            .unwrap_err();
        assert_eq!(native.message(), "denied");

        let generic =
            reconcile_copy(Err(StorageFailure::new("")), Err(String::new())).unwrap_err();
        assert_eq!(generic.message(), GENERIC_COPY_FAILURE);
    }

    #[tokio::test]
    async fn copy_text_always_tries_both_paths() {
        let transport = Arc::new(ScriptedTransport::default());
        let client = StorageClient::new(transport.clone());
        let native = FakeClipboard::default();

        let path = copy_text(&client, &native, "buy milk").await.unwrap();

        assert_eq!(path, CopyPath::Privileged);
        assert_eq!(transport.count("copy_note_text"), 1);
        assert_eq!(native.written(), vec!["buy milk".to_string()]);
    }

    #[test]
    fn newer_mark_supersedes_older_expiry() {
        let now = Instant::now();
        let mut feedback = CopyFeedback::default();
        let first = feedback.mark(NoteId::from("a"), now + Duration::from_secs(1));
        let second = feedback.mark(NoteId::from("b"), now + Duration::from_secs(2));

        assert!(!feedback.expire(first.generation()));
        assert!(feedback.is_copied(&NoteId::from("b")));
        assert!(!feedback.is_copied(&NoteId::from("a")));
        assert!(feedback.expire(second.generation()));
        assert_eq!(feedback.active(), None);
    }

    #[test]
    fn re_marking_same_note_resets_generation() {
        let now = Instant::now();
        let mut feedback = CopyFeedback::default();
        let first = feedback.mark(NoteId::from("a"), now);
        let second = feedback.mark(NoteId::from("a"), now);

        assert_ne!(first.generation(), second.generation());
        assert!(!feedback.expire(first.generation()));
        assert!(feedback.is_copied(&NoteId::from("a")));
    }
}
