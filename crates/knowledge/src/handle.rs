//! Shared, swappable reference to the active knowledge base.

use crate::knowledge_base::KnowledgeBase;
use std::sync::{Arc, RwLock};

/// Cloneable handle to the knowledge base currently serving queries.
///
/// Readers take a snapshot and keep using it for the rest of their request,
/// even if a reindex publishes a replacement meanwhile.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeHandle {
    inner: Arc<RwLock<Option<Arc<KnowledgeBase>>>>,
}

impl KnowledgeHandle {
    /// A handle with nothing published yet.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(kb: KnowledgeBase) -> Self {
        let handle = Self::empty();
        handle.publish(kb);
        handle
    }

    /// The knowledge base as of now, if any.
    pub fn snapshot(&self) -> Option<Arc<KnowledgeBase>> {
        match self.inner.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Replace the active knowledge base in one step.
    pub fn publish(&self, kb: KnowledgeBase) {
        let kb = Arc::new(kb);
        match self.inner.write() {
            Ok(mut guard) => *guard = Some(kb),
            Err(poisoned) => *poisoned.into_inner() = Some(kb),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.snapshot().is_some()
    }
}
