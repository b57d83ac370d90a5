use appstore_switcher::{
    default_store_path, extract_region, is_valid_region, normalize_region, plan_region_switch,
    query_regions, region_label, region_options, JsonFileStore, Language, PreferencePatch,
    PreferenceStore, RegionSwitch, APP_STORE_HOST,
};
use std::path::{Path, PathBuf};

type CommandResult = Result<(), Box<dyn std::error::Error>>;

/// Open the preference store at `path` or at the default location
fn open_store(path: Option<&Path>) -> Result<PreferenceStore<JsonFileStore>, Box<dyn std::error::Error>> {
    let path: PathBuf = match path {
        Some(path) => path.to_path_buf(),
        None => default_store_path().ok_or_else(|| {
            anyhow::anyhow!("Could not determine the config directory. Use --store to choose a file.")
        })?,
    };
    tracing::debug!(path = %path.display(), "using preference store");
    Ok(PreferenceStore::new(JsonFileStore::new(path)))
}

/// List regions, optionally filtered by glob patterns
pub fn list_regions(language: Language, patterns: &[String]) -> CommandResult {
    let options = region_options(language);

    let options = if patterns.is_empty() {
        options
    } else {
        let patterns: Vec<&str> = patterns.iter().map(String::as_str).collect();
        let codes = query_regions(&patterns)
            .map_err(|e| anyhow::anyhow!("Failed to apply query: {}", e))?;
        options
            .into_iter()
            .filter(|option| codes.contains(&option.code))
            .collect()
    };

    println!("{}", serde_json::to_string_pretty(&options)?);
    Ok(())
}

/// Print the label of one region
pub fn show_label(code: &str, language: Language) -> CommandResult {
    let normalized = normalize_region(code);
    if !is_valid_region(&normalized) {
        return Err(anyhow::anyhow!(
            "Unknown region '{}'. Use 'appstore-switcher regions' to see available regions.",
            code
        )
        .into());
    }
    println!("{}", region_label(&normalized, language));
    Ok(())
}

/// Print the region segment of a URL
pub fn show_region(url: &str) -> CommandResult {
    match extract_region(url) {
        Some(region) => println!("{}", region),
        None => println!("null"),
    }
    Ok(())
}

/// Print the URL rewritten for `code`
pub fn switch_url(url: &str, code: &str) -> CommandResult {
    match plan_region_switch(url, code) {
        RegionSwitch::Navigate(target) => println!("{}", target),
        RegionSwitch::AlreadyThere => println!("already in this region"),
        RegionSwitch::Unsupported => {
            return Err(anyhow::anyhow!(
                "Cannot switch '{}' to region '{}'. Only {} URLs and known regions are supported.",
                url,
                code,
                APP_STORE_HOST
            )
            .into());
        }
    }
    Ok(())
}

/// Print the stored preferences merged against defaults
pub fn show_prefs(store: Option<&Path>) -> CommandResult {
    let prefs = open_store(store)?;
    show_prefs_of(&prefs)
}

/// Seed the store with defaults
pub fn init_prefs(store: Option<&Path>) -> CommandResult {
    let prefs = open_store(store)?;
    let written = prefs
        .ensure_initialized()
        .map_err(|e| anyhow::anyhow!("Failed to initialize preferences: {}", e))?;
    if written {
        eprintln!("Initialized default preferences");
    } else {
        eprintln!("Preferences already initialized");
    }
    show_prefs_of(&prefs)
}

/// Apply a patch to the stored preferences
pub fn set_prefs(store: Option<&Path>, patch: PreferencePatch) -> CommandResult {
    if patch.is_empty() {
        return Err(anyhow::anyhow!(
            "Nothing to change. Pass at least one of --favorites, --language, --overlay, --window-mode."
        )
        .into());
    }
    if let Some(favorites) = &patch.favorites {
        let unknown: Vec<&String> = favorites
            .iter()
            .filter(|code| !is_valid_region(&normalize_region(code)))
            .collect();
        if !unknown.is_empty() {
            tracing::warn!(?unknown, "ignoring unknown regions");
        }
    }

    let prefs = open_store(store)?;
    prefs
        .write(&patch)
        .map_err(|e| anyhow::anyhow!("Failed to save preferences: {}", e))?;
    show_prefs_of(&prefs)
}

fn show_prefs_of(prefs: &PreferenceStore<JsonFileStore>) -> CommandResult {
    let record = prefs
        .read()
        .map_err(|e| anyhow::anyhow!("Failed to read preferences: {}", e))?;
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}
