use crate::commands::common::find_note;
use crate::error::CliError;
use crate::host::Host;

pub async fn run_copy(query: &str, host: &Host) -> Result<(), CliError> {
    let list = host.loaded_list().await?;
    let note = find_note(list.snapshot().list.notes(), query)?;

    let path = list.copy_note(&note.id).await?;
    tracing::debug!("Copied {} via {path:?} path", note.id);
    if list.is_copied(&note.id) {
        eprintln!("Copied to clipboard");
    }
    println!("{}", note.id);
    Ok(())
}
