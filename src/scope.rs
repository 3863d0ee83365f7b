use std::collections::VecDeque;
use std::rc::Rc;

use crate::breadcrumbs::record::{Breadcrumb, Hint};

pub type BreadcrumbProcessor = Rc<dyn Fn(&Breadcrumb, &Hint)>;

/// Holds the active breadcrumb trail. Crumbs are appended in dispatch
/// order, never reordered; the oldest is evicted once the retained count
/// reaches the configured maximum.
pub struct Scope {
    entries: VecDeque<(Breadcrumb, Hint)>,
    max_breadcrumbs: usize,
    processors: Vec<BreadcrumbProcessor>,
}

impl Scope {
    pub fn new(max_breadcrumbs: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(max_breadcrumbs.min(64)),
            max_breadcrumbs,
            processors: Vec::new(),
        }
    }

    pub fn add_breadcrumb(&mut self, breadcrumb: Breadcrumb, hint: Hint) {
        for processor in &self.processors {
            processor(&breadcrumb, &hint);
        }
        if self.max_breadcrumbs == 0 {
            return;
        }
        if self.entries.len() >= self.max_breadcrumbs {
            self.entries.pop_front();
        }
        self.entries.push_back((breadcrumb, hint));
    }

    /// Inspect crumb and hint together before the hint is discarded.
    pub fn add_breadcrumb_processor(&mut self, processor: BreadcrumbProcessor) {
        self.processors.push(processor);
    }

    pub fn breadcrumbs(&self) -> Vec<Breadcrumb> {
        self.entries.iter().map(|(crumb, _)| crumb.clone()).collect()
    }

    pub fn entries(&self) -> Vec<(Breadcrumb, Hint)> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
