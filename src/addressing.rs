//! Storefront URL addressing
//!
//! Pure functions that recognise App Store URLs, read their region segment
//! and rewrite it. None of them fail: inapplicable input yields `None` or
//! `false`.
//!
//! # Example
//!
//! ```rust
//! use appstore_switcher::{build_url_for_region, extract_region};
//!
//! let url = "https://apps.apple.com/de/app/x/id123";
//! let switched = build_url_for_region(url, "US").unwrap();
//! assert_eq!(switched, "https://apps.apple.com/us/app/x/id123");
//! assert_eq!(extract_region(&switched).as_deref(), Some("us"));
//! ```

use crate::regions::{is_valid_region, normalize_region};
use crate::types::RegionCode;
use url::Url;

/// The single host whose URLs carry a region segment
pub const APP_STORE_HOST: &str = "apps.apple.com";

/// What a region switch request resolves to before any navigation happens
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegionSwitch {
    /// Navigate to this URL
    Navigate(String),
    /// The target URL equals the current one
    AlreadyThere,
    /// Not an App Store URL, or the region is not in the catalog
    Unsupported,
}

/// True iff the URL parses and its host is exactly [`APP_STORE_HOST`]
pub fn is_addressable_url(url: &str) -> bool {
    parse_addressable(url).is_some()
}

/// The normalized first non-empty path segment of an App Store URL
pub fn extract_region(url: &str) -> Option<RegionCode> {
    let parsed = parse_addressable(url)?;
    parsed
        .path()
        .split('/')
        .find(|segment| !is_blank_segment(segment))
        .map(normalize_region)
}

/// Rewrite the region segment of an App Store URL
///
/// The first path segment is replaced when it looks like a storefront code
/// and the code is inserted in front of the path otherwise. Duplicate
/// separators are collapsed; query and fragment are kept. Returns `None`
/// for URLs on other hosts and for codes outside the catalog.
pub fn build_url_for_region(url: &str, code: &str) -> Option<String> {
    let mut parsed = parse_addressable(url)?;
    let code = normalize_region(code);
    if !is_valid_region(&code) {
        return None;
    }
    let path = rewrite_path(parsed.path(), Some(&code));
    parsed.set_path(&path);
    Some(parsed.to_string())
}

/// Decide whether switching `current_url` to `code` needs a navigation
///
/// The comparison is made against the current URL in canonical form
/// (lowercase region segment, collapsed separators), so `/US/app` is already
/// in region `us`.
pub fn plan_region_switch(current_url: &str, code: &str) -> RegionSwitch {
    let Some(target) = build_url_for_region(current_url, code) else {
        return RegionSwitch::Unsupported;
    };
    match canonical_url(current_url) {
        Some(current) if current == target => RegionSwitch::AlreadyThere,
        _ if target == current_url => RegionSwitch::AlreadyThere,
        _ => RegionSwitch::Navigate(target),
    }
}

/// The URL with its region segment lowercased and separators collapsed
pub fn canonical_url(url: &str) -> Option<String> {
    let mut parsed = parse_addressable(url)?;
    let path = rewrite_path(parsed.path(), None);
    parsed.set_path(&path);
    Some(parsed.to_string())
}

fn parse_addressable(url: &str) -> Option<Url> {
    let parsed = Url::parse(url.trim()).ok()?;
    if parsed.host_str() == Some(APP_STORE_HOST) {
        Some(parsed)
    } else {
        None
    }
}

/// Replace or insert the region segment (`code = None` only normalizes it)
fn rewrite_path(path: &str, code: Option<&str>) -> String {
    let trailing_slash = path.ends_with('/');
    let mut segments: Vec<String> = path
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect();

    let has_region = segments
        .first()
        .is_some_and(|first| is_region_segment(first));

    match (code, has_region) {
        (Some(code), true) => segments[0] = code.to_string(),
        (Some(code), false) => segments.insert(0, code.to_string()),
        (None, true) => segments[0] = normalize_region(&segments[0]),
        (None, false) => {}
    }

    let mut rewritten = format!("/{}", segments.join("/"));
    if trailing_slash && !segments.is_empty() {
        rewritten.push('/');
    }
    rewritten
}

/// Storefront codes are catalog codes or, for storefronts the catalog does
/// not list, two ASCII letters. Words such as `app` or `developer` start a
/// region-less path.
fn is_region_segment(segment: &str) -> bool {
    if is_blank_segment(segment) {
        return false;
    }
    let normalized = normalize_region(segment);
    is_valid_region(&normalized)
        || (normalized.len() == 2 && normalized.chars().all(|c| c.is_ascii_alphabetic()))
}

/// Empty or whitespace once percent-decoded (`%20`, `%09`, `%0A`, ...)
fn is_blank_segment(segment: &str) -> bool {
    match urlencoding::decode(segment) {
        Ok(decoded) => decoded.trim().is_empty(),
        Err(_) => segment.trim().is_empty(),
    }
}
