use crate::cli::ThemeCommands;
use crate::error::CliError;
use crate::host::Host;

pub fn run_theme(command: Option<ThemeCommands>, host: &Host) -> Result<(), CliError> {
    let theme = host.list().theme();
    let mode = match command.unwrap_or(ThemeCommands::Get) {
        ThemeCommands::Get => theme.current(),
        ThemeCommands::Set { mode } => {
            theme.set(mode.into());
            theme.current()
        }
        ThemeCommands::Toggle => theme.toggle(),
    };

    println!("{mode}");
    Ok(())
}
