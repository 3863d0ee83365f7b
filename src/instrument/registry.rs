use std::collections::HashMap;

use crate::host::callback::{Callback, CallbackId};

/// Marker attached to a wrapped callable: which original it wraps and how
/// many live registrations point at it.
#[derive(Debug, Clone)]
pub struct WrappedMarker {
    pub original: Callback,
    pub wrapper: Callback,
    registrations: usize,
}

/// Side table associating originals with their wrappers, both directions.
///
/// Forward lookup (original → wrapper) prevents a callback registered twice
/// from being wrapped twice; reverse lookup (wrapper → original) lets
/// removal succeed whichever reference the caller holds. Entries are
/// registration-counted and dropped at zero; entries for listeners that are
/// never removed persist, which is a bounded leak, not a correctness bug.
#[derive(Debug, Default)]
pub struct CallbackRegistry {
    markers: HashMap<CallbackId, WrappedMarker>,
    by_original: HashMap<CallbackId, CallbackId>,
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, original: Callback, wrapper: Callback) {
        let marker = WrappedMarker {
            registrations: 1,
            original: original.clone(),
            wrapper: wrapper.clone(),
        };
        self.by_original.insert(original.id(), wrapper.id());
        self.markers.insert(wrapper.id(), marker);
    }

    pub fn is_wrapper(&self, id: CallbackId) -> bool {
        self.markers.contains_key(&id)
    }

    pub fn wrapper_for(&self, original: CallbackId) -> Option<Callback> {
        let wrapper_id = self.by_original.get(&original)?;
        Some(self.markers.get(wrapper_id)?.wrapper.clone())
    }

    pub fn original_of(&self, wrapper: CallbackId) -> Option<Callback> {
        Some(self.markers.get(&wrapper)?.original.clone())
    }

    /// Walk the marker chain down to the innermost original. Recovers the
    /// pre-wrap identity even through multiple wrapping layers.
    pub fn unwrap_chain(&self, callback: &Callback) -> Callback {
        let mut current = callback.clone();
        while let Some(original) = self.original_of(current.id()) {
            current = original;
        }
        current
    }

    /// Record an additional registration of an already-wrapped callback.
    /// Accepts either the original or the wrapper reference.
    pub fn note_registration(&mut self, id: CallbackId) {
        if let Some(marker) = self.marker_mut(id) {
            marker.registrations += 1;
        }
    }

    /// Resolve the wrapper that was actually installed for `id` (original or
    /// wrapper reference) and release one registration. The entry is dropped
    /// once no registrations remain.
    pub fn resolve_for_removal(&mut self, id: CallbackId) -> Option<Callback> {
        let wrapper_id = if self.markers.contains_key(&id) {
            id
        } else {
            *self.by_original.get(&id)?
        };
        let marker = self.markers.get_mut(&wrapper_id)?;
        let wrapper = marker.wrapper.clone();
        marker.registrations = marker.registrations.saturating_sub(1);
        if marker.registrations == 0 {
            if let Some(removed) = self.markers.remove(&wrapper_id) {
                self.by_original.remove(&removed.original.id());
            }
        }
        Some(wrapper)
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    fn marker_mut(&mut self, id: CallbackId) -> Option<&mut WrappedMarker> {
        let wrapper_id = if self.markers.contains_key(&id) {
            id
        } else {
            *self.by_original.get(&id)?
        };
        self.markers.get_mut(&wrapper_id)
    }
}
