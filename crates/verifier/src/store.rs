//! Observation store abstraction.
//!
//! The [`ObservationStore`] trait is the verifier's view of wherever remote
//! recorders persist what they received. It is queried with an
//! [`ObservationFilter`] and returns the matching [`ObservedEvent`]s. Stores may
//! return a superset; the verifier re-applies the filter.
//!
//! [`FileObservationStore`] reads an exported file in either format:
//!
//! - a JSON array of events
//! - JSON lines, one event per line (blank lines are ignored)
//!
//! ```json
//! {"observer": "recorder-ns-123",
//!  "origin": {"kind": "Namespace", "name": "default", "api_version": "v1"},
//!  "event": {"id": "1", "type": "dev.example.sent"}}
//! ```
//!
//! Retries are the store's own concern. The verifier issues each query once.

use std::future::Future;
use std::path::{Path, PathBuf};

use relaycheck_core::types::ObservedEvent;

use crate::error::VerifierError;
use crate::filter::ObservationFilter;

/// Trait abstracting observation queries.
pub trait ObservationStore: Send + Sync + 'static {
    /// Returns the observations matching `filter`.
    fn query(
        &self,
        filter: &ObservationFilter,
    ) -> impl Future<Output = Result<Vec<ObservedEvent>, VerifierError>> + Send;
}

/// Observation store backed by an exported JSON or JSON-lines file.
#[derive(Debug, Clone)]
pub struct FileObservationStore {
    path: PathBuf,
}

impl FileObservationStore {
    /// Creates a store reading from `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Export file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ObservationStore for FileObservationStore {
    async fn query(&self, filter: &ObservationFilter) -> Result<Vec<ObservedEvent>, VerifierError> {
        let content = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            VerifierError::Query(format!("failed to read {}: {e}", self.path.display()))
        })?;
        let events = parse_events(&content).map_err(|e| {
            VerifierError::Query(format!("failed to parse {}: {e}", self.path.display()))
        })?;
        Ok(filter.apply(events))
    }
}

/// Parses a JSON array or JSON-lines export.
pub fn parse_events(content: &str) -> Result<Vec<ObservedEvent>, serde_json::Error> {
    let trimmed = content.trim_start();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    if trimmed.starts_with('[') {
        return serde_json::from_str(trimmed);
    }

    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(serde_json::from_str::<ObservedEvent>)
        .collect()
}

/// 테스트용 Mock 관측 저장소
///
/// 조회마다 스크립트의 다음 응답을 반환하고, 스크립트가 끝나면 마지막
/// 응답을 반복합니다. 조회 횟수를 기록합니다.
#[cfg(test)]
pub struct MockObservationStore {
    responses: std::sync::Mutex<std::collections::VecDeque<Result<Vec<ObservedEvent>, String>>>,
    queries: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl MockObservationStore {
    /// 항상 같은 이벤트 목록을 반환하는 저장소를 생성합니다.
    pub fn new(events: Vec<ObservedEvent>) -> Self {
        Self::scripted(vec![Ok(events)])
    }

    /// 항상 조회 에러를 반환하는 저장소를 생성합니다.
    pub fn failing(reason: &str) -> Self {
        Self::scripted(vec![Err(reason.to_owned())])
    }

    /// 조회마다 순서대로 응답하는 저장소를 생성합니다.
    pub fn scripted(responses: Vec<Result<Vec<ObservedEvent>, String>>) -> Self {
        Self {
            responses: std::sync::Mutex::new(responses.into_iter().collect()),
            queries: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    /// 지금까지의 조회 횟수
    pub fn queries(&self) -> usize {
        self.queries.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(test)]
impl ObservationStore for MockObservationStore {
    async fn query(&self, _filter: &ObservationFilter) -> Result<Vec<ObservedEvent>, VerifierError> {
        self.queries
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        let mut responses = self.responses.lock().unwrap();
        let response = if responses.len() > 1 {
            responses.pop_front()
        } else {
            responses.front().cloned()
        };
        match response {
            Some(Ok(events)) => Ok(events),
            Some(Err(reason)) => Err(VerifierError::Query(reason)),
            None => Ok(Vec::new()),
        }
    }
}
