use crate::commands::common::{confirm, find_note};
use crate::error::CliError;
use crate::host::Host;

pub async fn run_delete(query: &str, skip_confirmation: bool, host: &Host) -> Result<(), CliError> {
    let list = host.loaded_list().await?;
    let note = find_note(list.snapshot().list.notes(), query)?;

    let pending = list
        .request_delete(&note.id)
        .ok_or_else(|| CliError::NoteNotFound(query.trim().to_string()))?;

    if !skip_confirmation && !confirm(&format!("Delete \"{}\"? [y/N] ", pending.preview))? {
        list.cancel_delete();
        eprintln!("Kept {}", note.id);
        return Ok(());
    }

    match list.confirm_delete().await {
        Some(result) => result?,
        None => return Err(CliError::NoteNotFound(note.id.to_string())),
    }
    println!("{}", note.id);
    Ok(())
}
