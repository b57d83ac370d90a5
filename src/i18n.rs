//! Localized UI strings
//!
//! Lookup is by [`MessageKey`]; templates may contain `{placeholder}` tokens
//! that are substituted from the supplied parameters. Placeholders without a
//! value render as an empty string.

use crate::types::Language;

/// Keys of every user-facing message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKey {
    HeaderTitle,
    CurrentRegionLabel,
    LanguageLabel,
    LanguageOptionEnglish,
    LanguageOptionChinese,
    SearchPlaceholder,
    PinnedLabel,
    AllRegionsLabel,
    OverlayToggleLabel,
    SaveButton,
    InactiveMessage,
    StatusSwitching,
    StatusAlready,
    StatusUnsupported,
    StatusCantLoadTab,
    StatusSaveInProgress,
    StatusSaveSuccess,
    StatusSaveFailed,
    StatusSelectFavorites,
    StatusLoadSettingsFailed,
    StatusSwitchFailed,
    OverlayTitle,
    OverlayStatusHint,
    OverlayStatusCurrent,
    OverlayStatusSelected,
    OverlayStatusUnsupported,
    OverlayStatusAlready,
    OverlayStatusNoFavorites,
    OverlayStatusSwitching,
}

fn english(key: MessageKey) -> &'static str {
    use MessageKey::*;
    match key {
        HeaderTitle => "AppStoreSwitcher",
        CurrentRegionLabel => "Current region",
        LanguageLabel => "Language",
        LanguageOptionEnglish => "English",
        LanguageOptionChinese => "中文",
        SearchPlaceholder => "Search regions",
        PinnedLabel => "Pinned",
        AllRegionsLabel => "All Regions",
        OverlayToggleLabel => "Show quick switch overlay on page",
        SaveButton => "Save settings",
        InactiveMessage => "Open a {domain} page to switch regions.",
        StatusSwitching => "Switching to {region}…",
        StatusAlready => "Already in this region.",
        StatusUnsupported => "Only works on apps.apple.com pages.",
        StatusCantLoadTab => "Unable to get the current tab.",
        StatusSaveInProgress => "Saving…",
        StatusSaveSuccess => "Saved.",
        StatusSaveFailed => "Save failed. Try again.",
        StatusSelectFavorites => "Select at least one region.",
        StatusLoadSettingsFailed => "Failed to load settings. Try again.",
        StatusSwitchFailed => "Failed to switch region. Try again.",
        OverlayTitle => "App Store Region",
        OverlayStatusHint => "Configure favorite regions in the popup.",
        OverlayStatusCurrent => "Current: {region}",
        OverlayStatusSelected => "Selected: {region}",
        OverlayStatusUnsupported => "This page does not support region switching.",
        OverlayStatusAlready => "Already in this region.",
        OverlayStatusNoFavorites => "No regions available. Configure them in the popup.",
        OverlayStatusSwitching => "Switching to {region}…",
    }
}

fn chinese(key: MessageKey) -> &'static str {
    use MessageKey::*;
    match key {
        HeaderTitle => "AppStoreSwitcher",
        CurrentRegionLabel => "当前地区",
        LanguageLabel => "界面语言",
        LanguageOptionEnglish => "英文",
        LanguageOptionChinese => "中文",
        SearchPlaceholder => "搜索地区",
        PinnedLabel => "已置顶",
        AllRegionsLabel => "所有地区",
        OverlayToggleLabel => "页面左上角显示快速切换控件",
        SaveButton => "保存设置",
        InactiveMessage => "请打开 {domain} 页面后再切换地区。",
        StatusSwitching => "正在切换到 {region}…",
        StatusAlready => "已处于该地区。",
        StatusUnsupported => "仅支持 apps.apple.com 页面。",
        StatusCantLoadTab => "无法获取当前标签页。",
        StatusSaveInProgress => "保存中…",
        StatusSaveSuccess => "已保存。",
        StatusSaveFailed => "保存失败，请重试。",
        StatusSelectFavorites => "请至少勾选一个地区。",
        StatusLoadSettingsFailed => "设置加载失败，请稍后重试。",
        StatusSwitchFailed => "切换失败，请重试。",
        OverlayTitle => "App Store 区域",
        OverlayStatusHint => "请在弹窗中配置常用地区。",
        OverlayStatusCurrent => "当前：{region}",
        OverlayStatusSelected => "已选择：{region}",
        OverlayStatusUnsupported => "当前页面不支持切换区域。",
        OverlayStatusAlready => "已处于该地区。",
        OverlayStatusNoFavorites => "没有可用地区，请在弹窗中配置。",
        OverlayStatusSwitching => "正在切换到 {region}…",
    }
}

/// Look up `key` in the table for `language` and substitute `params`
///
/// # Example
///
/// ```rust
/// use appstore_switcher::{t, Language, MessageKey};
///
/// let text = t(Language::En, MessageKey::StatusSwitching, &[("region", "Japan (JP)")]);
/// assert_eq!(text, "Switching to Japan (JP)…");
/// ```
pub fn t(language: Language, key: MessageKey, params: &[(&str, &str)]) -> String {
    let template = match language {
        Language::En => english(key),
        Language::Zh => chinese(key),
    };
    substitute(template, params)
}

fn substitute(template: &str, params: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close)
                if close > 0
                    && after[..close]
                        .chars()
                        .all(|c| c.is_alphanumeric() || c == '_') =>
            {
                let token = &after[..close];
                if let Some((_, value)) = params.iter().find(|(name, _)| *name == token) {
                    out.push_str(value);
                }
                rest = &after[close + 1..];
            }
            _ => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_per_language() {
        assert_eq!(t(Language::En, MessageKey::StatusAlready, &[]), "Already in this region.");
        assert_eq!(t(Language::Zh, MessageKey::StatusAlready, &[]), "已处于该地区。");
        assert_eq!(
            t(Language::En, MessageKey::StatusSelectFavorites, &[]),
            "Select at least one region."
        );
    }

    #[test]
    fn test_missing_placeholder_renders_empty() {
        assert_eq!(t(Language::En, MessageKey::OverlayStatusCurrent, &[]), "Current: ");
    }

    #[test]
    fn test_substitute_keeps_unmatched_braces() {
        assert_eq!(substitute("a {b c} {", &[]), "a {b c} {");
        assert_eq!(substitute("{x}{y}", &[("x", "1"), ("y", "2")]), "12");
    }
}
