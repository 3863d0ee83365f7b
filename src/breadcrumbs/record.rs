use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::host::clock::Timestamp;
use crate::host::target::HostEvent;

/// Sentinel message when the event target cannot be resolved.
pub const UNKNOWN_TARGET: &str = "<unknown>";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Category {
    #[serde(rename = "ui.click")]
    UiClick,
    #[serde(rename = "ui.input")]
    UiInput,
    #[serde(rename = "xhr")]
    Xhr,
    #[serde(rename = "fetch")]
    Fetch,
    #[serde(rename = "navigation")]
    Navigation,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::UiClick => "ui.click",
            Category::UiInput => "ui.input",
            Category::Xhr => "xhr",
            Category::Fetch => "fetch",
            Category::Navigation => "navigation",
        }
    }

    pub fn is_ui(&self) -> bool {
        matches!(self, Category::UiClick | Category::UiInput)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CrumbKind {
    #[serde(rename = "http")]
    Http,
}

/// Finalized trail record. Append-only, ordered, ring-buffered on the scope.
#[derive(Debug, Clone, Serialize)]
pub struct Breadcrumb {
    pub category: Category,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<CrumbKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub data: BTreeMap<String, Value>,
    pub timestamp: Timestamp,
}

impl Breadcrumb {
    pub fn plain(category: Category, message: &str, timestamp: Timestamp) -> Self {
        Self {
            category,
            kind: None,
            message: Some(message.to_string()),
            data: BTreeMap::new(),
            timestamp,
        }
    }

    pub fn http(category: Category, data: BTreeMap<String, Value>, timestamp: Timestamp) -> Self {
        Self {
            category,
            kind: Some(CrumbKind::Http),
            message: None,
            data,
            timestamp,
        }
    }
}

/// Auxiliary data handed alongside a breadcrumb to processors. Not
/// persisted on the crumb itself: raw payloads (request bodies, host
/// events) stay out of the durable trail.
#[derive(Debug, Clone, Default)]
pub struct Hint {
    pub input: Option<String>,
    pub event: Option<HostEvent>,
    pub name: Option<String>,
    pub global: Option<bool>,
}
