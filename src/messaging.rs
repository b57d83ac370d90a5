//! The `switch-region` message exchanged between a surface and a page
//!
//! Wire shapes:
//!
//! ```text
//! request   {"type":"switch-region","region":"jp"}
//! response  {"success":true,"url":"https://apps.apple.com/jp/app/x/id1"}
//!           {"success":false,"reason":"unsupported"}
//! ```

use crate::addressing::build_url_for_region;
use crate::regions::normalize_region;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchRegionRequest {
    pub region: String,
}

impl SwitchRegionRequest {
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
        }
    }
}

/// Every message a page understands
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum PageRequest {
    SwitchRegion(SwitchRegionRequest),
}

impl PageRequest {
    /// Decode a raw message; messages of other types yield `None`
    pub fn from_value(message: &Value) -> Option<Self> {
        serde_json::from_value(message.clone()).ok()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureReason {
    Unsupported,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchRegionResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<FailureReason>,
}

impl SwitchRegionResponse {
    pub fn navigated(url: impl Into<String>) -> Self {
        Self {
            success: true,
            url: Some(url.into()),
            reason: None,
        }
    }

    pub fn unsupported() -> Self {
        Self {
            success: false,
            url: None,
            reason: Some(FailureReason::Unsupported),
        }
    }

    /// The target URL of a successful response
    pub fn target(&self) -> Option<&str> {
        if self.success {
            self.url.as_deref()
        } else {
            None
        }
    }
}

/// Answer a switch request for a page currently showing `current_url`
///
/// The response carries the rewritten URL; the page navigates there after
/// replying.
pub fn handle_switch_region(current_url: &str, request: &SwitchRegionRequest) -> SwitchRegionResponse {
    let region = normalize_region(&request.region);
    match build_url_for_region(current_url, &region) {
        Some(url) => SwitchRegionResponse::navigated(url),
        None => SwitchRegionResponse::unsupported(),
    }
}
