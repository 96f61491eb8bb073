//! Clipboard writes through the platform's command-line tools.

use std::io::{self, Write};
use std::process::{Command, Stdio};

use jotin_core::clipboard::NativeClipboard;

struct ClipboardProgram {
    program: &'static str,
    args: &'static [&'static str],
}

const MACOS_PROGRAMS: &[ClipboardProgram] = &[ClipboardProgram {
    program: "pbcopy",
    args: &[],
}];

const WINDOWS_PROGRAMS: &[ClipboardProgram] = &[ClipboardProgram {
    program: "clip",
    args: &[],
}];

const UNIX_PROGRAMS: &[ClipboardProgram] = &[
    ClipboardProgram {
        program: "wl-copy",
        args: &[],
    },
    ClipboardProgram {
        program: "xclip",
        args: &["-selection", "clipboard"],
    },
    ClipboardProgram {
        program: "xsel",
        args: &["--clipboard", "--input"],
    },
];

const fn default_programs() -> &'static [ClipboardProgram] {
    if cfg!(target_os = "macos") {
        MACOS_PROGRAMS
    } else if cfg!(windows) {
        WINDOWS_PROGRAMS
    } else {
        UNIX_PROGRAMS
    }
}

/// Tries each known clipboard program in turn until one accepts the text.
pub struct CommandClipboard {
    programs: &'static [ClipboardProgram],
}

impl Default for CommandClipboard {
    fn default() -> Self {
        Self {
            programs: default_programs(),
        }
    }
}

impl NativeClipboard for CommandClipboard {
    fn write_text(&self, text: &str) -> Result<(), String> {
        let mut failures = Vec::new();
        for candidate in self.programs {
            match pipe_to(candidate, text) {
                Ok(()) => {
                    tracing::debug!("Copied through {}", candidate.program);
                    return Ok(());
                }
                Err(error) => failures.push(format!("{}: {error}", candidate.program)),
            }
        }

        if failures.is_empty() {
            Err("No clipboard program available".to_string())
        } else {
            Err(failures.join("; "))
        }
    }
}

fn pipe_to(candidate: &ClipboardProgram, text: &str) -> io::Result<()> {
    let mut child = Command::new(candidate.program)
        .args(candidate.args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(text.as_bytes())?;
    }

    let status = child.wait()?;
    if status.success() {
        Ok(())
    } else {
        Err(io::Error::other(format!("exited with status {status}")))
    }
}
