use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use jotin_core::ThemeMode;

#[derive(Parser)]
#[command(name = "jotin")]
#[command(about = "Jot fleeting notes down and find them again")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Directory holding notes.json and the theme file
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Path to a config.json overriding the default location
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Quick capture: jotin "my thought here"
    #[arg(trailing_var_arg = true)]
    pub note: Vec<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Capture a new note
    #[command(alias = "new")]
    Add {
        /// Note text (read from stdin or $EDITOR when omitted)
        content: Vec<String>,
    },
    /// List notes, newest first
    #[command(alias = "ls")]
    List {
        /// Only show notes containing this text (case-insensitive)
        #[arg(short, long)]
        search: Option<String>,
        /// Number of notes to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a note after confirmation
    #[command(alias = "rm")]
    Delete {
        /// Note ID or unique ID prefix
        id: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Copy a note's text to the clipboard
    Copy {
        /// Note ID or unique ID prefix
        id: String,
    },
    /// Show or change the color theme
    Theme {
        #[command(subcommand)]
        command: Option<ThemeCommands>,
    },
}

#[derive(Subcommand)]
pub enum ThemeCommands {
    /// Print the current theme
    Get,
    /// Switch to the given theme
    Set {
        #[arg(value_enum)]
        mode: ThemeArg,
    },
    /// Switch between light and dark
    Toggle,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum ThemeArg {
    Light,
    Dark,
}

impl From<ThemeArg> for ThemeMode {
    fn from(value: ThemeArg) -> Self {
        match value {
            ThemeArg::Light => Self::Light,
            ThemeArg::Dark => Self::Dark,
        }
    }
}
