//! 준비 상태 감시기 에러 타입
//!
//! [`ReadinessError`]는 실행을 중단시키는 치명적 실패를, [`StatusError`]는
//! 상태 조회 협력자가 반환하는 개별 조회 실패를 표현합니다.
//! `From<ReadinessError> for RelaycheckError`가 구현되어 있어
//! 상위 레이어에서 `?`로 전파할 수 있습니다.

use std::time::Duration;

use relaycheck_core::error::RelaycheckError;
use relaycheck_core::types::ResourceReference;

use crate::outcome::ReadinessOutcome;

/// 상태 조회 협력자 에러
///
/// `Unrecoverable`을 제외한 모든 변형은 일시적 실패로 간주되어
/// 타임아웃까지 재시도됩니다.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StatusError {
    /// 리소스가 아직 존재하지 않음
    #[error("resource not found: {0}")]
    NotFound(String),

    /// 조회 실패 (연결, 파싱 등)
    #[error("status lookup failed: {0}")]
    Lookup(String),

    /// 재시도해도 달라지지 않는 실패 (권한 거부, 잘못된 참조 등)
    #[error("unrecoverable status error: {0}")]
    Unrecoverable(String),
}

impl StatusError {
    /// 재시도 가능한 일시적 실패인지 확인합니다.
    pub fn is_transient(&self) -> bool {
        !matches!(self, Self::Unrecoverable(_))
    }
}

/// 준비 상태 감시 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum ReadinessError {
    /// 리소스가 타임아웃 내에 Ready/Done에 도달하지 못함
    #[error("timed out after {waited:?} ({polls} polls) waiting for {reference}{}", last_seen_suffix(.last_seen))]
    Timeout {
        /// 실패한 리소스
        reference: ResourceReference,
        /// 대기한 시간
        waited: Duration,
        /// 조회 횟수
        polls: u32,
        /// 마지막으로 관측한 상태나 조회 에러
        last_seen: Option<String>,
    },

    /// 복구 불가능한 실패
    #[error("{reference} failed: {reason}")]
    Unrecoverable {
        /// 실패한 리소스
        reference: ResourceReference,
        /// 실패 사유
        reason: String,
    },

    /// 외부 취소 신호
    #[error("cancelled while waiting for {reference}")]
    Cancelled {
        /// 대기 중이던 리소스
        reference: ResourceReference,
    },

    /// 대기 태스크가 비정상 종료됨
    #[error("readiness task failed: {0}")]
    Task(String),

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },
}

fn last_seen_suffix(last_seen: &Option<String>) -> String {
    match last_seen {
        Some(seen) => format!(", last seen: {seen}"),
        None => String::new(),
    }
}

impl ReadinessError {
    /// 실패한 리소스 참조를 반환합니다.
    pub fn reference(&self) -> Option<&ResourceReference> {
        match self {
            Self::Timeout { reference, .. }
            | Self::Unrecoverable { reference, .. }
            | Self::Cancelled { reference } => Some(reference),
            Self::Task(_) | Self::Config { .. } => None,
        }
    }

    /// 리소스별 결과로 환산합니다. 취소는 결과가 아니므로 `None`입니다.
    pub fn outcome(&self) -> Option<ReadinessOutcome> {
        match self {
            Self::Timeout { .. } => Some(ReadinessOutcome::TimedOut),
            Self::Unrecoverable { .. } | Self::Task(_) => Some(ReadinessOutcome::Error),
            Self::Cancelled { .. } | Self::Config { .. } => None,
        }
    }

    /// 취소로 인한 에러인지 확인합니다.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

impl From<ReadinessError> for RelaycheckError {
    fn from(err: ReadinessError) -> Self {
        match &err {
            ReadinessError::Cancelled { .. } => RelaycheckError::Cancelled("readiness".to_owned()),
            ReadinessError::Config { field, reason } => {
                RelaycheckError::Config(relaycheck_core::ConfigError::InvalidValue {
                    field: field.clone(),
                    reason: reason.clone(),
                })
            }
            _ => RelaycheckError::Readiness(err.to_string()),
        }
    }
}
