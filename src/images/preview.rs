use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use bytes::Bytes;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct PreviewEntry {
    pub body: Bytes,
    pub content_type: String,
}

/// Short-lived preview links for selected images. An entry lives exactly as
/// long as the `PreviewHandle` that created it.
#[derive(Debug, Clone, Default)]
pub struct PreviewRegistry {
    inner: Arc<RwLock<HashMap<Uuid, PreviewEntry>>>,
}

impl PreviewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire(&self, body: Bytes, content_type: &str) -> PreviewHandle {
        let id = Uuid::new_v4();
        let entry = PreviewEntry {
            body,
            content_type: content_type.to_string(),
        };
        if let Ok(mut map) = self.inner.write() {
            map.insert(id, entry);
        }
        debug!(preview_id = %id, "preview acquired");
        PreviewHandle {
            id,
            registry: self.clone(),
        }
    }

    pub fn get(&self, id: Uuid) -> Option<PreviewEntry> {
        self.inner.read().ok()?.get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|m| m.len()).unwrap_or(0)
    }

    fn revoke(&self, id: Uuid) {
        if let Ok(mut map) = self.inner.write() {
            map.remove(&id);
        }
        debug!(preview_id = %id, "preview revoked");
    }
}

/// Owning handle for a preview entry; dropping it revokes the entry.
#[derive(Debug)]
pub struct PreviewHandle {
    id: Uuid,
    registry: PreviewRegistry,
}

impl PreviewHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn url(&self) -> String {
        format!("/api/v1/previews/{}", self.id)
    }
}

impl Drop for PreviewHandle {
    fn drop(&mut self) {
        self.registry.revoke(self.id);
    }
}
