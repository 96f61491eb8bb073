use chrono::Utc;

use crate::commands::common::{render_rows, NoteListItem};
use crate::error::CliError;
use crate::host::Host;

pub async fn run_list(
    search: Option<&str>,
    limit: usize,
    as_json: bool,
    host: &Host,
) -> Result<(), CliError> {
    let list = host.loaded_list().await?;
    if let Some(query) = search {
        list.set_search_query(query);
    }
    let mut notes = list.visible_notes();
    notes.truncate(limit);

    let now = Utc::now();
    if as_json {
        let items = notes
            .iter()
            .map(|note| NoteListItem::from_note(note, now))
            .collect::<Vec<_>>();
        println!("{}", serde_json::to_string_pretty(&items)?);
    } else if notes.is_empty() {
        eprintln!("No notes yet");
    } else {
        for row in render_rows(&notes, now) {
            println!("{row}");
        }
    }

    Ok(())
}
