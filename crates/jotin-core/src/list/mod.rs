//! Note list synchronization: the cached list, its search filter and the
//! refresh bookkeeping that keeps stale responses from overwriting newer ones.

mod surface;

pub use surface::{ListSurface, ListSurfaceState};

use crate::error::StorageFailure;
use crate::models::{Note, NoteId};

/// Filter notes by a case-insensitive substring query.
///
/// A blank query keeps every note. Order is preserved.
#[must_use]
pub fn filter_notes(notes: &[Note], search_query: &str) -> Vec<Note> {
    let normalized_query = normalize_query(search_query);
    notes
        .iter()
        .filter(|note| note.contains_lowercase(&normalized_query))
        .cloned()
        .collect()
}

fn normalize_query(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Identifies one issued `list` request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct RefreshTicket(u64);

/// Client-side view of the backend's notes for one surface.
///
/// Every refresh is issued a ticket in order. A response is applied only if
/// its ticket is newer than the last applied one, so an old response that
/// arrives late never replaces fresher data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteListState {
    notes: Vec<Note>,
    search_query: String,
    error: Option<String>,
    issued: u64,
    applied: u64,
}

impl NoteListState {
    /// Record a new outgoing `list` request.
    pub fn begin_refresh(&mut self) -> RefreshTicket {
        self.issued += 1;
        RefreshTicket(self.issued)
    }

    /// Apply the response for `ticket`. Returns `false` if it was stale.
    ///
    /// Success replaces the cache and clears the error. Failure keeps the
    /// cache and records the error.
    pub fn finish_refresh(
        &mut self,
        ticket: RefreshTicket,
        result: Result<Vec<Note>, StorageFailure>,
    ) -> bool {
        if ticket.0 <= self.applied {
            tracing::debug!(
                "Discarding stale list response {} (applied {})",
                ticket.0,
                self.applied
            );
            return false;
        }
        self.applied = ticket.0;
        match result {
            Ok(notes) => {
                tracing::debug!("Loaded {} notes", notes.len());
                self.notes = notes;
                self.error = None;
            }
            Err(error) => {
                tracing::error!("Failed to load notes: {error}");
                self.error = Some(error.message().to_string());
            }
        }
        true
    }

    /// True until the first response has been applied.
    pub const fn is_loading(&self) -> bool {
        self.issued > 0 && self.applied == 0
    }

    /// True when no issued request is still awaiting a fresher response.
    pub const fn is_settled(&self) -> bool {
        self.applied == self.issued
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn note(&self, id: &NoteId) -> Option<&Note> {
        self.notes.iter().find(|note| &note.id == id)
    }

    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    /// Returns whether the query changed.
    pub fn set_search_query(&mut self, query: impl Into<String>) -> bool {
        let query = query.into();
        if self.search_query == query {
            return false;
        }
        self.search_query = query;
        true
    }

    /// Cached notes matching the current query.
    pub fn visible(&self) -> Vec<Note> {
        filter_notes(&self.notes, &self.search_query)
    }

    /// The empty placeholder shows only once loading finished with nothing
    /// to display.
    pub fn shows_empty_state(&self) -> bool {
        !self.is_loading() && self.visible().is_empty()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    pub fn clear_error(&mut self) -> bool {
        self.error.take().is_some()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn notes(texts: &[&str]) -> Vec<Note> {
        texts
            .iter()
            .enumerate()
            .map(|(index, text)| Note::new(format!("n-{index}"), *text))
            .collect()
    }

    fn texts(notes: &[Note]) -> Vec<&str> {
        notes.iter().map(|note| note.text.as_str()).collect()
    }

    #[test]
    fn filter_is_case_insensitive_and_trimmed() {
        let all = notes(&["Buy MILK", "call mom", "milkshake recipe"]);

        assert_eq!(
            texts(&filter_notes(&all, "  milk ")),
            vec!["Buy MILK", "milkshake recipe"]
        );
    }

    #[test]
    fn blank_query_keeps_everything_in_order() {
        let all = notes(&["b", "a", "c"]);

        assert_eq!(filter_notes(&all, "   "), all);
        assert_eq!(filter_notes(&all, ""), all);
    }

    #[test]
    fn filter_is_idempotent_subset() {
        let all = notes(&["alpha", "beta", "alphabet", "gamma"]);
        let once = filter_notes(&all, "alp");
        let twice = filter_notes(&once, "alp");

        assert_eq!(once, twice);
        assert!(once.iter().all(|note| all.contains(note)));
    }

    #[test]
    fn loading_until_first_response() {
        let mut state = NoteListState::default();
        assert!(!state.is_loading());

        let ticket = state.begin_refresh();
        assert!(state.is_loading());
        assert!(!state.shows_empty_state());

        state.finish_refresh(ticket, Ok(Vec::new()));
        assert!(!state.is_loading());
        assert!(state.shows_empty_state());

        state.begin_refresh();
        assert!(!state.is_loading());
        assert!(!state.is_settled());
    }

    #[test]
    fn failure_keeps_cache_and_success_clears_error() {
        let mut state = NoteListState::default();
        let first = state.begin_refresh();
        state.finish_refresh(first, Ok(notes(&["kept"])));

        let failed = state.begin_refresh();
        state.finish_refresh(failed, Err(StorageFailure::new("disk unavailable")));
        assert_eq!(state.error(), Some("disk unavailable"));
        assert_eq!(texts(state.notes()), vec!["kept"]);

        let recovered = state.begin_refresh();
        state.finish_refresh(recovered, Ok(notes(&["kept", "new"])));
        assert_eq!(state.error(), None);
        assert_eq!(state.notes().len(), 2);
    }

    #[test]
    fn late_response_to_older_request_is_discarded() {
        let mut state = NoteListState::default();
        let older = state.begin_refresh();
        let newer = state.begin_refresh();

        assert!(state.finish_refresh(newer, Ok(notes(&["fresh", "older"]))));
        assert!(!state.finish_refresh(older, Ok(notes(&["older"]))));

        assert_eq!(texts(state.notes()), vec!["fresh", "older"]);
        assert!(state.is_settled());
    }

    #[test]
    fn stale_failure_does_not_set_error() {
        let mut state = NoteListState::default();
        let older = state.begin_refresh();
        let newer = state.begin_refresh();
        state.finish_refresh(newer, Ok(Vec::new()));

        state.finish_refresh(older, Err(StorageFailure::new("timeout")));

        assert_eq!(state.error(), None);
    }

    #[test]
    fn visible_follows_query() {
        let mut state = NoteListState::default();
        let ticket = state.begin_refresh();
        state.finish_refresh(ticket, Ok(notes(&["buy milk", "walk dog"])));

        assert!(state.set_search_query("DOG"));
        assert!(!state.set_search_query("DOG"));
        assert_eq!(texts(&state.visible()), vec!["walk dog"]);

        state.set_search_query("cat");
        assert!(state.shows_empty_state());
    }
}
