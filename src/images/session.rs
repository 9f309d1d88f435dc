use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
};

use tracing::debug;
use uuid::Uuid;

use super::{
    preview::{PreviewHandle, PreviewRegistry},
    upload::UploadedImage,
};
use crate::analysis::normalizer::AnalysisResult;

/// Upload state of one user: at most one selected image and its preview.
#[derive(Debug, Default)]
pub struct UploadSession {
    image: Option<UploadedImage>,
    preview: Option<PreviewHandle>,
    last_result: Option<AnalysisResult>,
    analyzing: bool,
}

impl UploadSession {
    /// Replaces the current selection. The previous preview is released and
    /// the previous result is discarded.
    pub fn select(&mut self, image: UploadedImage, previews: &PreviewRegistry) -> &PreviewHandle {
        let handle = previews.acquire(image.content.clone(), &image.mime_type);
        self.image = Some(image);
        self.last_result = None;
        self.preview.insert(handle)
    }

    pub fn remove(&mut self) -> bool {
        self.last_result = None;
        self.preview = None;
        self.image.take().is_some()
    }

    pub fn image(&self) -> Option<&UploadedImage> {
        self.image.as_ref()
    }

    pub fn preview_url(&self) -> Option<String> {
        self.preview.as_ref().map(PreviewHandle::url)
    }

    pub fn last_result(&self) -> Option<&AnalysisResult> {
        self.last_result.as_ref()
    }

    /// Identifies the current selection; changes on every `select`.
    pub fn selection_id(&self) -> Option<Uuid> {
        self.preview.as_ref().map(PreviewHandle::id)
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("an analysis is already running for this image")]
    AlreadyAnalyzing,
}

#[derive(Debug, Clone)]
pub struct SelectionView {
    pub image: Option<UploadedImage>,
    pub preview_url: Option<String>,
    pub last_result: Option<AnalysisResult>,
}

/// In-memory upload sessions keyed by user id.
#[derive(Debug, Clone, Default)]
pub struct UploadSessions {
    sessions: Arc<Mutex<HashMap<Uuid, UploadSession>>>,
    previews: PreviewRegistry,
}

impl UploadSessions {
    pub fn new(previews: PreviewRegistry) -> Self {
        Self {
            sessions: Arc::default(),
            previews,
        }
    }

    pub fn previews(&self) -> &PreviewRegistry {
        &self.previews
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, UploadSession>> {
        self.sessions.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Selects an image for `user_id` and returns its preview url.
    pub fn select(&self, user_id: Uuid, image: UploadedImage) -> String {
        let mut map = self.lock();
        let session = map.entry(user_id).or_default();
        let url = session.select(image, &self.previews).url();
        debug!(%user_id, preview = %url, "image selected");
        url
    }

    pub fn remove(&self, user_id: Uuid) -> bool {
        let mut map = self.lock();
        let removed = map.get_mut(&user_id).map(UploadSession::remove).unwrap_or(false);
        if let Some(session) = map.get(&user_id) {
            if !session.analyzing {
                map.remove(&user_id);
            }
        }
        removed
    }

    pub fn view(&self, user_id: Uuid) -> SelectionView {
        let map = self.lock();
        match map.get(&user_id) {
            Some(s) => SelectionView {
                image: s.image().cloned(),
                preview_url: s.preview_url(),
                last_result: s.last_result().cloned(),
            },
            None => SelectionView {
                image: None,
                preview_url: None,
                last_result: None,
            },
        }
    }

    /// Marks the user's session as analyzing until the guard drops. The guard
    /// snapshots the selected image and its selection id.
    pub fn begin_analysis(&self, user_id: Uuid) -> Result<AnalysisGuard, SessionError> {
        let mut map = self.lock();
        let session = map.entry(user_id).or_default();
        if session.analyzing {
            return Err(SessionError::AlreadyAnalyzing);
        }
        session.analyzing = true;
        Ok(AnalysisGuard {
            sessions: self.clone(),
            user_id,
            selection: session.selection_id(),
            image: session.image.clone(),
        })
    }

    /// Replaces the result of `selection` wholesale; `None` clears it.
    /// Ignored once the selection has been replaced or removed.
    pub fn record_result(&self, user_id: Uuid, selection: Uuid, result: Option<AnalysisResult>) -> bool {
        let mut map = self.lock();
        match map.get_mut(&user_id) {
            Some(session) if session.selection_id() == Some(selection) => {
                session.last_result = result;
                true
            }
            _ => {
                debug!(%user_id, %selection, "stale analysis result dropped");
                false
            }
        }
    }
}

pub struct AnalysisGuard {
    sessions: UploadSessions,
    user_id: Uuid,
    selection: Option<Uuid>,
    image: Option<UploadedImage>,
}

impl AnalysisGuard {
    pub fn image(&self) -> Option<&UploadedImage> {
        self.image.as_ref()
    }

    /// Stores the outcome against the selection that was analysed.
    pub fn record(&self, result: Option<AnalysisResult>) -> bool {
        match self.selection {
            Some(selection) => self.sessions.record_result(self.user_id, selection, result),
            None => false,
        }
    }
}

impl Drop for AnalysisGuard {
    fn drop(&mut self) {
        let mut map = self.sessions.lock();
        if let Some(session) = map.get_mut(&self.user_id) {
            session.analyzing = false;
        }
    }
}
