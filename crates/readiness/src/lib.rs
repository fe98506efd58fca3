//! relaycheck 준비 상태 감시기
//!
//! 관리 리소스 집합이 Ready 또는 Done 상태에 수렴할 때까지 폴링합니다.
//! 전달 검증은 이 단계가 모든 관련 리소스에 대해 성공한 뒤에만 시작해야 합니다.
//!
//! # 모듈 구성
//!
//! - [`status`]: 상태 조회 트레이트 [`StatusSource`]와 파일 기반 구현
//! - [`watcher`]: [`ReadinessWatcher`] 폴링 루프
//! - [`config`]: [`WatcherConfig`]와 빌더
//! - [`outcome`]: 리소스별 결과와 전체 보고서
//! - [`error`]: [`ReadinessError`], [`StatusError`]

pub mod config;
pub mod error;
pub mod outcome;
pub mod status;
pub mod watcher;

pub use config::{PollStrategy, WatcherConfig, WatcherConfigBuilder};
pub use error::{ReadinessError, StatusError};
pub use outcome::{ReadinessOutcome, ReadinessReport, ResourceOutcome};
pub use status::{FileStatusSource, StatusEntry, StatusSource};
pub use watcher::ReadinessWatcher;
