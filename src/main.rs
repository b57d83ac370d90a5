mod cli;
mod commands;

use appstore_switcher::PreferencePatch;
use clap::Parser;
use cli::{Cli, Commands, PrefsCommand};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    appstore_switcher::init_logging(cli.debug);

    let store = cli.store.as_deref();
    match cli.command {
        Commands::Regions { lang, query } => commands::list_regions(lang.into(), &query),
        Commands::Label { code, lang } => commands::show_label(&code, lang.into()),
        Commands::Region { url } => commands::show_region(&url),
        Commands::Switch { url, code } => commands::switch_url(&url, &code),
        Commands::Prefs { action } => match action {
            PrefsCommand::Show => commands::show_prefs(store),
            PrefsCommand::Init => commands::init_prefs(store),
            PrefsCommand::Set {
                favorites,
                language,
                overlay,
                window_mode,
            } => commands::set_prefs(
                store,
                PreferencePatch {
                    favorites,
                    overlay_enabled: overlay,
                    language: language.map(Into::into),
                    window_mode: window_mode.map(Into::into),
                },
            ),
        },
    }
}
