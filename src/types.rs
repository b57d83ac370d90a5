use serde::{Deserialize, Serialize};
use std::fmt;

/// Region code as stored and emitted: trimmed, lowercase
pub type RegionCode = String;

/// UI language used to pick a localized string table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Zh,
}

impl Language {
    pub const ALL: [Language; 2] = [Language::En, Language::Zh];

    /// Canonical code used in storage and on the command line
    pub const fn as_str(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Zh => "zh",
        }
    }

    /// Parse a stored language value, tolerant of case and region tags
    /// (`"zh-CN"` reads as [`Language::Zh`])
    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.split(['-', '_']).next().unwrap_or("") {
            "en" => Some(Language::En),
            "zh" => Some(Language::Zh),
            _ => None,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which UI surface the primary action opens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowMode {
    Popup,
    #[default]
    Sidepanel,
}

impl WindowMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            WindowMode::Popup => "popup",
            WindowMode::Sidepanel => "sidepanel",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "popup" => Some(WindowMode::Popup),
            "sidepanel" | "side-panel" | "side_panel" => Some(WindowMode::Sidepanel),
            _ => None,
        }
    }
}

impl fmt::Display for WindowMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The single persisted preference record
///
/// A record obtained from [`crate::PreferenceStore`] is always fully
/// populated: `favorites` is non-empty and holds only normalized catalog
/// codes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferenceRecord {
    /// Favorite regions in insertion order, no duplicates
    pub favorites: Vec<RegionCode>,
    /// Whether the in-page quick switch overlay is shown
    pub overlay_enabled: bool,
    /// UI language
    pub language: Language,
    /// Surface opened by the primary action
    pub window_mode: WindowMode,
}

impl PreferenceRecord {
    pub fn is_favorite(&self, code: &str) -> bool {
        let code = crate::regions::normalize_region(code);
        self.favorites.iter().any(|f| *f == code)
    }
}

/// A partial update to [`PreferenceRecord`]
///
/// Absent fields leave the stored value untouched. `favorites` carries raw
/// codes; they are normalized and filtered against the catalog on merge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferencePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favorites: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overlay_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<Language>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_mode: Option<WindowMode>,
}

impl PreferencePatch {
    pub fn favorites<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            favorites: Some(codes.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    pub fn language(language: Language) -> Self {
        Self {
            language: Some(language),
            ..Self::default()
        }
    }

    pub fn overlay_enabled(enabled: bool) -> Self {
        Self {
            overlay_enabled: Some(enabled),
            ..Self::default()
        }
    }

    pub fn window_mode(mode: WindowMode) -> Self {
        Self {
            window_mode: Some(mode),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.favorites.is_none()
            && self.overlay_enabled.is_none()
            && self.language.is_none()
            && self.window_mode.is_none()
    }

    /// Combine two patches; fields set in `later` win
    pub fn merged_with(self, later: PreferencePatch) -> PreferencePatch {
        PreferencePatch {
            favorites: later.favorites.or(self.favorites),
            overlay_enabled: later.overlay_enabled.or(self.overlay_enabled),
            language: later.language.or(self.language),
            window_mode: later.window_mode.or(self.window_mode),
        }
    }
}

/// A region entry prepared for display in a list or select box
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegionOption {
    pub code: RegionCode,
    pub label: String,
}
