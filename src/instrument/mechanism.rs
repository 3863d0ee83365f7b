use serde::Serialize;

use crate::client::Client;
use crate::host::callback::{Callback, CallbackResult, Invocation};

pub const ANONYMOUS: &str = "<anonymous>";
pub const DEFAULT_TARGET: &str = "EventTarget";

/// Structured description of how an exception was intercepted. This core
/// only labels errors; whether they get reported is the capture pipeline's
/// and the dedupe filter's business.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MechanismDescriptor {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub handled: bool,
    pub data: MechanismData,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MechanismData {
    pub function: String,
    pub handler: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

impl MechanismDescriptor {
    /// Descriptor for a synchronous in-callback throw intercepted by a
    /// wrapped built-in. Always `handled: true` here, unlike global
    /// uncaught handlers.
    pub fn instrument(function: &str, handler: Option<&str>, target: Option<String>) -> Self {
        Self {
            kind: "instrument",
            handled: true,
            data: MechanismData {
                function: function.to_string(),
                handler: handler.unwrap_or(ANONYMOUS).to_string(),
                target,
            },
        }
    }
}

/// Failure boundary around a wrapped callback. Success passes through
/// untouched; a throw is forwarded to capture with a mechanism descriptor
/// and then handed back to the host. Repeated throws produce independent
/// captures; no dedupe happens here.
pub fn invoke_guarded(
    client: &Client,
    function: &str,
    target_type: Option<String>,
    callback: &Callback,
    invocation: &Invocation,
) -> CallbackResult {
    match callback.invoke(invocation) {
        Ok(()) => Ok(()),
        Err(thrown) => {
            let descriptor = MechanismDescriptor::instrument(function, callback.name(), target_type);
            client.capture_error(&thrown, Some(descriptor));
            Err(thrown)
        }
    }
}
