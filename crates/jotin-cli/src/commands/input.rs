//! Where `jotin add` gets its text: arguments, a pipe, or an editor session.

use std::env;
use std::io::{self, IsTerminal, Read};
use std::path::Path;
use std::process::Command;

use jotin_core::util::normalize_text;

use crate::error::CliError;

const FALLBACK_EDITOR: &str = if cfg!(windows) { "notepad" } else { "vi" };

/// Resolve note text in order of precedence. Blank input at every source is
/// [`CliError::EmptyContent`].
pub fn read_note_text(args: &[String]) -> Result<String, CliError> {
    if let Some(text) = normalize_text(&args.join(" ")) {
        return Ok(text);
    }

    let stdin = io::stdin();
    let text = if stdin.is_terminal() {
        compose_in_editor(&editor_command())?
    } else {
        let mut piped = String::new();
        stdin.lock().read_to_string(&mut piped)?;
        piped
    };

    normalize_text(&text).ok_or(CliError::EmptyContent)
}

/// `$VISUAL`, then `$EDITOR`, then the platform default.
pub fn editor_command() -> String {
    ["VISUAL", "EDITOR"]
        .into_iter()
        .filter_map(|key| env::var(key).ok())
        .find(|value| !value.trim().is_empty())
        .unwrap_or_else(|| FALLBACK_EDITOR.to_string())
}

/// Open `editor` on an empty scratch file and return what was saved.
fn compose_in_editor(editor: &str) -> Result<String, CliError> {
    let scratch = tempfile::Builder::new()
        .prefix("jotin-note-")
        .suffix(".md")
        .tempfile()?;

    run_editor(editor, scratch.path())?;
    Ok(std::fs::read_to_string(scratch.path())?)
}

fn run_editor(editor: &str, file: &Path) -> Result<(), CliError> {
    let mut words = editor.split_whitespace();
    let program = words
        .next()
        .ok_or_else(|| CliError::EditorFailed("no editor configured".to_string()))?;

    let status = Command::new(program).args(words).arg(file).status()?;
    if !status.success() {
        return Err(CliError::EditorFailed(format!("{program} exited with {status}")));
    }
    Ok(())
}
