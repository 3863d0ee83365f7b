use serde::{Deserialize, Serialize};

/// SDK configuration. Capability flags are decided by the embedding
/// application, not detected at runtime; the tunables are environment
/// constants, not invariants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SdkConfig {
    pub instrument_dom: bool,
    pub instrument_xhr: bool,
    pub instrument_fetch: bool,
    pub instrument_timers: bool,
    pub instrument_history: bool,
    /// Quiet period before a pending input crumb finalizes.
    pub debounce_ms: u64,
    /// Ring capacity of the breadcrumb trail, oldest evicted first.
    pub max_breadcrumbs: usize,
    pub dedupe: bool,
    /// Requests against the SDK's own reporting endpoint never become
    /// breadcrumbs (self-recursion guard).
    pub report_endpoint: Option<String>,
}

impl Default for SdkConfig {
    fn default() -> Self {
        Self {
            instrument_dom: true,
            instrument_xhr: true,
            instrument_fetch: true,
            instrument_timers: true,
            instrument_history: true,
            debounce_ms: 100,
            max_breadcrumbs: 100,
            dedupe: true,
            report_endpoint: None,
        }
    }
}
