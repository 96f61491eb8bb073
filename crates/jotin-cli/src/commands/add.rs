use jotin_core::capture::SubmitOutcome;

use crate::commands::input::read_note_text;
use crate::error::CliError;
use crate::host::Host;

pub async fn run_add(args: &[String], host: &Host) -> Result<(), CliError> {
    let text = read_note_text(args)?;

    let capture = host.mount_capture();
    capture.set_draft(text);
    match capture.submit().await? {
        SubmitOutcome::Created(note) => {
            println!("{}", note.id);
            Ok(())
        }
        SubmitOutcome::Cancelled | SubmitOutcome::Ignored => Err(CliError::EmptyContent),
    }
}
