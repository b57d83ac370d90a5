use appstore_switcher::{Language, WindowMode};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// CLI arguments for appstore-switcher
#[derive(Parser, Debug)]
#[command(name = "appstore-switcher")]
#[command(about = "Switch App Store storefront regions from the command line")]
#[command(version)]
pub struct Cli {
    /// Preference store file (default: <config dir>/appstore-switcher/storage.json)
    #[arg(long, global = true, value_name = "PATH")]
    pub store: Option<PathBuf>,

    /// Enable debug logging; RUST_LOG overrides the level
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List storefront regions as JSON, priority regions first
    Regions {
        /// Label language
        #[arg(long, value_enum, default_value_t = LanguageArg::En)]
        lang: LanguageArg,

        /// Filter region codes by glob pattern (e.g. "u*"); repeat for OR
        #[arg(short, long = "query", value_name = "GLOB")]
        query: Vec<String>,
    },

    /// Print the display label of a region
    Label {
        /// Region code, e.g. "jp"
        code: String,

        #[arg(long, value_enum, default_value_t = LanguageArg::En)]
        lang: LanguageArg,
    },

    /// Print the region of an App Store URL, or null
    Region {
        url: String,
    },

    /// Print an App Store URL rewritten for another region
    Switch {
        url: String,

        /// Target region code
        code: String,
    },

    /// Show or change the stored preferences
    Prefs {
        #[command(subcommand)]
        action: PrefsCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum PrefsCommand {
    /// Print the current preference record as JSON
    Show,

    /// Write the defaults if no record exists yet
    Init,

    /// Change one or more preference fields
    Set {
        /// Comma-separated favorite regions, e.g. "us,jp,kr"
        #[arg(long, value_delimiter = ',')]
        favorites: Option<Vec<String>>,

        #[arg(long, value_enum)]
        language: Option<LanguageArg>,

        /// Show the in-page quick switch overlay (true/false)
        #[arg(long)]
        overlay: Option<bool>,

        #[arg(long, value_enum)]
        window_mode: Option<WindowModeArg>,
    },
}

/// UI language
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LanguageArg {
    En,
    Zh,
}

impl From<LanguageArg> for Language {
    fn from(arg: LanguageArg) -> Self {
        match arg {
            LanguageArg::En => Language::En,
            LanguageArg::Zh => Language::Zh,
        }
    }
}

/// Surface opened by the toolbar action
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum WindowModeArg {
    Popup,
    Sidepanel,
}

impl From<WindowModeArg> for WindowMode {
    fn from(arg: WindowModeArg) -> Self {
        match arg {
            WindowModeArg::Popup => WindowMode::Popup,
            WindowModeArg::Sidepanel => WindowMode::Sidepanel,
        }
    }
}
