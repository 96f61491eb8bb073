//! Formatting and lookup helpers shared by the list-based commands.

use std::io::{self, BufRead, Write};

use chrono::{DateTime, Utc};
use jotin_core::Note;
use serde::Serialize;

use crate::error::CliError;

const SHORT_ID_LEN: usize = 13;
const LINE_PREVIEW_CHARS: usize = 40;
const JSON_PREVIEW_CHARS: usize = 80;

/// One row of `jotin list --json`.
#[derive(Debug, Serialize)]
pub struct NoteListItem {
    pub id: String,
    pub preview: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub age: String,
}

impl NoteListItem {
    pub fn from_note(note: &Note, now: DateTime<Utc>) -> Self {
        Self {
            id: note.id.to_string(),
            preview: note.preview(JSON_PREVIEW_CHARS),
            text: note.text.clone(),
            created_at: note.created_at,
            updated_at: note.updated_at,
            age: describe_age(note.created_at, now),
        }
    }
}

pub fn short_id(note: &Note) -> &str {
    let id = note.id.as_str();
    id.char_indices()
        .nth(SHORT_ID_LEN)
        .map_or(id, |(end, _)| &id[..end])
}

/// `<short id>  <first line>  <age>` per note, padded into columns.
pub fn render_rows(notes: &[Note], now: DateTime<Utc>) -> Vec<String> {
    notes
        .iter()
        .map(|note| {
            format!(
                "{:<id_width$}  {:<preview_width$}  {}",
                short_id(note),
                note.preview(LINE_PREVIEW_CHARS),
                describe_age(note.created_at, now),
                id_width = SHORT_ID_LEN,
                preview_width = LINE_PREVIEW_CHARS,
            )
        })
        .collect()
}

/// Coarse age of a note such as `3h ago`. Timestamps in the future read as
/// `just now`.
pub fn describe_age(created_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(created_at);
    let units = [
        (elapsed.num_days() / 365, "y"),
        (elapsed.num_days() / 30, "mo"),
        (elapsed.num_weeks(), "w"),
        (elapsed.num_days(), "d"),
        (elapsed.num_hours(), "h"),
        (elapsed.num_minutes(), "m"),
    ];

    units
        .into_iter()
        .find(|(count, _)| *count > 0)
        .map_or_else(|| "just now".to_string(), |(count, unit)| format!("{count}{unit} ago"))
}

/// Find a cached note by full id or unique id prefix.
pub fn find_note(notes: &[Note], query: &str) -> Result<Note, CliError> {
    let query = query.trim();
    if query.is_empty() {
        return Err(CliError::EmptyNoteId);
    }

    if let Some(exact) = notes.iter().find(|note| note.id.as_str() == query) {
        return Ok(exact.clone());
    }

    let mut candidates = notes
        .iter()
        .filter(|note| note.id.as_str().starts_with(query));
    let Some(first) = candidates.next() else {
        return Err(CliError::NoteNotFound(query.to_string()));
    };
    let others = candidates.collect::<Vec<_>>();
    if others.is_empty() {
        return Ok(first.clone());
    }

    let shown = std::iter::once(first)
        .chain(others.iter().copied())
        .take(3)
        .map(short_id)
        .collect::<Vec<_>>();
    Err(CliError::AmbiguousNoteId(format!(
        "'{query}' matches several notes: {}",
        shown.join(", ")
    )))
}

/// Ask a yes/no question on stderr. Anything but `y`/`yes` is a no.
pub fn confirm(prompt: &str) -> Result<bool, CliError> {
    let mut stderr = io::stderr().lock();
    write!(stderr, "{prompt}")?;
    stderr.flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(is_affirmative(&answer))
}

pub fn is_affirmative(answer: &str) -> bool {
    let answer = answer.trim();
    answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes")
}
