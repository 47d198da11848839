//! Local preview handles for accepted images
//!
//! Every image accepted into a form gets a revocable preview reference, the
//! equivalent of a browser object URL. A [`PreviewHandle`] is acquired from
//! the [`PreviewRegistry`] when the image is accepted and revoked when the
//! handle is dropped: on removal, on submission, on cancel, or when the
//! owning form is torn down.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use ulid::Ulid;

/// Identifier of a live preview
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PreviewId(pub Ulid);

impl PreviewId {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for PreviewId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PreviewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone)]
struct PreviewEntry {
    file_name: String,
    size: usize,
}

#[derive(Debug, Default)]
struct RegistryInner {
    live: DashMap<PreviewId, PreviewEntry>,
    acquired: AtomicUsize,
    released: AtomicUsize,
}

/// Tracks every preview that has been handed out and not yet revoked
#[derive(Debug, Clone, Default)]
pub struct PreviewRegistry {
    inner: Arc<RegistryInner>,
}

impl PreviewRegistry {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a preview for an accepted image
    #[must_use]
    pub fn acquire(&self, file_name: &str, size: usize) -> PreviewHandle {
        let id = PreviewId::new();
        self.inner.live.insert(
            id,
            PreviewEntry {
                file_name: file_name.to_string(),
                size,
            },
        );
        self.inner.acquired.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(preview = %id, file_name, "preview acquired");

        PreviewHandle {
            id,
            registry: Arc::clone(&self.inner),
        }
    }

    /// Previews currently outstanding
    #[inline]
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.inner.live.len()
    }

    #[inline]
    #[must_use]
    pub fn is_live(&self, id: PreviewId) -> bool {
        self.inner.live.contains_key(&id)
    }

    /// Bytes referenced by outstanding previews
    #[must_use]
    pub fn live_bytes(&self) -> usize {
        self.inner.live.iter().map(|e| e.value().size).sum()
    }

    #[inline]
    #[must_use]
    pub fn total_acquired(&self) -> usize {
        self.inner.acquired.load(Ordering::Relaxed)
    }

    #[inline]
    #[must_use]
    pub fn total_released(&self) -> usize {
        self.inner.released.load(Ordering::Relaxed)
    }
}

/// Owned preview reference; revoked on drop
#[derive(Debug)]
pub struct PreviewHandle {
    id: PreviewId,
    registry: Arc<RegistryInner>,
}

impl PreviewHandle {
    #[inline]
    #[must_use]
    pub fn id(&self) -> PreviewId {
        self.id
    }

    /// Local URL the presentation layer can render
    #[must_use]
    pub fn url(&self) -> String {
        format!("blob:civic/{}", self.id)
    }

    /// Revoke now rather than at end of scope
    #[inline]
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for PreviewHandle {
    fn drop(&mut self) {
        if let Some((_, entry)) = self.registry.live.remove(&self.id) {
            self.registry.released.fetch_add(1, Ordering::Relaxed);
            tracing::trace!(preview = %self.id, file_name = %entry.file_name, "preview released");
        }
    }
}
