//! Resource status lookup abstraction.
//!
//! The [`StatusSource`] trait is the readiness watcher's only view of the
//! backend: given a [`ResourceReference`] it returns the resource's current
//! [`ResourceStatus`] or a [`StatusError`]. Production code plugs in whatever
//! client talks to the cluster; this crate ships [`FileStatusSource`], which
//! reads a JSON status snapshot, and tests use `MockStatusSource`.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │ ReadinessWatcher │
//! └────────┬─────────┘
//!          │ status(&reference)
//!          ▼
//!   ┌──────────────┐
//!   │ StatusSource │ (trait)
//!   └──────────────┘
//!        │      │
//!        ▼      ▼
//!   ┌──────┐ ┌──────┐
//!   │ File │ │ Mock │
//!   └──────┘ └──────┘
//! ```
//!
//! # Snapshot format
//!
//! [`FileStatusSource`] re-reads its file on every call so an external writer
//! can update it while a run is in progress:
//!
//! ```json
//! [
//!   {
//!     "reference": {"kind": "Broker", "api_version": "eventing.knative.dev/v1",
//!                   "name": "default", "namespace": "ns-123"},
//!     "status": {"conditions": [{"type": "Ready", "status": "True"}]}
//!   }
//! ]
//! ```

use std::future::Future;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use relaycheck_core::types::{ResourceReference, ResourceStatus};

use crate::error::StatusError;

/// Trait abstracting resource status queries.
///
/// The trait is `Send + Sync + 'static` so a single source can be shared by
/// the concurrent per-reference wait tasks.
///
/// # Error Handling
///
/// - [`StatusError::NotFound`] / [`StatusError::Lookup`]: transient, the
///   watcher keeps polling until the per-resource timeout.
/// - [`StatusError::Unrecoverable`]: aborts the wait immediately.
pub trait StatusSource: Send + Sync + 'static {
    /// Returns the current status of `reference`.
    fn status(
        &self,
        reference: &ResourceReference,
    ) -> impl Future<Output = Result<ResourceStatus, StatusError>> + Send;
}

/// One entry of a status snapshot file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusEntry {
    /// Resource the status belongs to
    pub reference: ResourceReference,
    /// Reported status
    #[serde(default)]
    pub status: ResourceStatus,
}

/// Status source backed by a JSON snapshot file.
///
/// A missing file, a partially written file, or a missing entry are all
/// reported as transient errors.
#[derive(Debug, Clone)]
pub struct FileStatusSource {
    path: PathBuf,
}

impl FileStatusSource {
    /// Creates a source reading from `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Snapshot file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_entries(&self) -> Result<Vec<StatusEntry>, StatusError> {
        let content = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            StatusError::Lookup(format!("failed to read {}: {e}", self.path.display()))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            StatusError::Lookup(format!("failed to parse {}: {e}", self.path.display()))
        })
    }
}

impl StatusSource for FileStatusSource {
    async fn status(&self, reference: &ResourceReference) -> Result<ResourceStatus, StatusError> {
        let entries = self.read_entries().await?;
        entries
            .into_iter()
            .find(|e| &e.reference == reference)
            .map(|e| e.status)
            .ok_or_else(|| StatusError::NotFound(reference.to_string()))
    }
}

/// 테스트용 Mock 상태 소스
///
/// 리소스별로 응답 스크립트를 지정합니다. 스크립트가 끝나면 마지막
/// 응답을 반복하고, 스크립트가 없는 리소스는 `NotFound`를 반환합니다.
#[cfg(test)]
#[derive(Default)]
pub struct MockStatusSource {
    scripts: std::sync::Mutex<
        std::collections::HashMap<
            ResourceReference,
            std::collections::VecDeque<Result<ResourceStatus, StatusError>>,
        >,
    >,
    ready_at: std::collections::HashMap<ResourceReference, tokio::time::Instant>,
    polls: std::sync::Mutex<std::collections::HashMap<ResourceReference, u32>>,
}

#[cfg(test)]
impl MockStatusSource {
    /// 빈 mock 소스를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 리소스의 응답 스크립트를 지정합니다.
    pub fn with_script(
        self,
        reference: ResourceReference,
        script: Vec<Result<ResourceStatus, StatusError>>,
    ) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(reference, script.into_iter().collect());
        self
    }

    /// 항상 Ready를 반환하도록 지정합니다.
    pub fn with_ready(self, reference: ResourceReference) -> Self {
        self.with_script(reference, vec![Ok(ResourceStatus::ready())])
    }

    /// 지금부터 `after`가 지난 뒤 Ready가 되도록 지정합니다.
    pub fn with_ready_after(mut self, reference: ResourceReference, after: std::time::Duration) -> Self {
        self.ready_at
            .insert(reference, tokio::time::Instant::now() + after);
        self
    }

    /// 리소스가 조회된 횟수를 반환합니다.
    pub fn polls(&self, reference: &ResourceReference) -> u32 {
        self.polls
            .lock()
            .unwrap()
            .get(reference)
            .copied()
            .unwrap_or(0)
    }
}

#[cfg(test)]
impl StatusSource for MockStatusSource {
    async fn status(&self, reference: &ResourceReference) -> Result<ResourceStatus, StatusError> {
        *self
            .polls
            .lock()
            .unwrap()
            .entry(reference.clone())
            .or_insert(0) += 1;

        if let Some(at) = self.ready_at.get(reference) {
            return if tokio::time::Instant::now() >= *at {
                Ok(ResourceStatus::ready())
            } else {
                Ok(ResourceStatus::pending())
            };
        }

        let mut scripts = self.scripts.lock().unwrap();
        match scripts.get_mut(reference) {
            Some(script) if script.len() > 1 => script.pop_front().unwrap(),
            Some(script) => script
                .front()
                .cloned()
                .unwrap_or_else(|| Err(StatusError::NotFound(reference.to_string()))),
            None => Err(StatusError::NotFound(reference.to_string())),
        }
    }
}
