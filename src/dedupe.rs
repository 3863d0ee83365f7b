use tracing::debug;

use crate::client::CapturedEvent;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Signature {
    message: Option<String>,
    exception: Option<(String, String)>,
    fingerprint: Option<Vec<String>>,
}

impl Signature {
    fn of(event: &CapturedEvent) -> Self {
        Self {
            message: event.message.clone(),
            exception: event
                .exception
                .as_ref()
                .map(|e| (e.kind.clone(), e.value.clone())),
            fingerprint: event.fingerprint.clone(),
        }
    }
}

/// Drops a captured event when it repeats the single most recently sent
/// one. Not a breadcrumb concern: this filters whole events at the
/// transport boundary. A deliberate drop, not an error path.
#[derive(Debug, Default)]
pub struct DedupeFilter {
    previous: Option<Signature>,
}

impl DedupeFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn should_drop(&mut self, event: &CapturedEvent) -> bool {
        let signature = Signature::of(event);
        let duplicate = match &self.previous {
            Some(previous) => is_same_occurrence(previous, &signature),
            None => false,
        };
        if duplicate {
            debug!("duplicate captured event dropped");
            return true;
        }
        self.previous = Some(signature);
        false
    }
}

fn is_same_occurrence(previous: &Signature, current: &Signature) -> bool {
    // An explicit fingerprint decides when both sides carry one; a
    // fingerprint on only one side always separates them.
    match (&previous.fingerprint, &current.fingerprint) {
        (Some(a), Some(b)) => return a == b,
        (None, None) => {}
        _ => return false,
    }
    if let (Some(a), Some(b)) = (&previous.exception, &current.exception) {
        return a == b;
    }
    if previous.exception.is_some() || current.exception.is_some() {
        return false;
    }
    match (&previous.message, &current.message) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}
