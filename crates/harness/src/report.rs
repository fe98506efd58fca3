//! 실행 결과 보고서
//!
//! 실행은 통과/실패 두 가지와 별도의 취소 상태로 끝납니다. 부분 성공은
//! 없습니다. [`RunReport`]는 진단을 위해 각 단계의 산출물을 함께 담습니다.

use std::time::Duration;

use serde::Serialize;

use relaycheck_core::error::{ConfigError, RelaycheckError};
use relaycheck_core::types::ResourceReference;
use relaycheck_readiness::{ReadinessError, ReadinessOutcome, ReadinessReport};
use relaycheck_verifier::{SettleReport, VerificationResult, VerifierError};

use crate::state::{RunState, StateTransition};

/// 실행 실패 사유
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(rename_all = "snake_case")]
pub enum RunFailure {
    /// 리소스가 Ready/Done에 도달하지 못함
    #[error("readiness failed: {message}")]
    Readiness {
        /// 실패한 리소스
        reference: Option<ResourceReference>,
        /// 리소스별 결과 (TimedOut, Error)
        outcome: Option<ReadinessOutcome>,
        /// 상세 메시지
        message: String,
    },

    /// 관측 저장소 조회 실패
    #[error("observation query failed: {0}")]
    ObservationQuery(String),

    /// 관측 개수 불일치
    #[error("count mismatch: want {expected}, got {actual}")]
    CountMismatch { expected: usize, actual: usize },

    /// 검증기 설정 오류 (조회 전에 거부됨)
    #[error("invalid verifier config {field}: {reason}")]
    Config { field: String, reason: String },
}

impl From<&ReadinessError> for RunFailure {
    fn from(err: &ReadinessError) -> Self {
        Self::Readiness {
            reference: err.reference().cloned(),
            outcome: err.outcome(),
            message: err.to_string(),
        }
    }
}

impl From<RunFailure> for RelaycheckError {
    fn from(failure: RunFailure) -> Self {
        match failure {
            RunFailure::Readiness { message, .. } => RelaycheckError::Readiness(message),
            RunFailure::ObservationQuery(reason) => RelaycheckError::ObservationQuery(reason),
            RunFailure::CountMismatch { expected, actual } => {
                RelaycheckError::CountMismatch { expected, actual }
            }
            RunFailure::Config { field, reason } => {
                ConfigError::InvalidValue { field, reason }.into()
            }
        }
    }
}

/// 실행 결과
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    Passed,
    Failed(RunFailure),
    /// 외부 취소 (취소 시점의 단계 포함)
    Cancelled { phase: RunState },
}

impl RunOutcome {
    /// 검증기 에러를 실행 결과로 바꿉니다.
    pub(crate) fn from_verifier(err: VerifierError, phase: RunState) -> Self {
        match err {
            VerifierError::Cancelled(_) => Self::Cancelled { phase },
            VerifierError::Query(reason) => Self::Failed(RunFailure::ObservationQuery(reason)),
            VerifierError::CountMismatch {
                expected, actual, ..
            } => Self::Failed(RunFailure::CountMismatch { expected, actual }),
            VerifierError::Config { field, reason } => {
                Self::Failed(RunFailure::Config { field, reason })
            }
        }
    }

    /// 최종 상태
    pub fn state(&self) -> RunState {
        match self {
            Self::Passed => RunState::Passed,
            Self::Failed(_) => RunState::Failed,
            Self::Cancelled { .. } => RunState::Cancelled,
        }
    }
}

/// 실행 보고서
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: String,
    pub namespace: String,
    pub observer: String,
    pub outcome: RunOutcome,
    /// 상태 전이 기록 (순서대로)
    pub transitions: Vec<StateTransition>,
    /// 준비 상태 단계 결과 (성공한 경우)
    pub readiness: Option<ReadinessReport>,
    /// 정착 단계 결과
    pub settle: Option<SettleReport>,
    /// 조회 단계 결과 (실패해도 진단용으로 포함)
    pub verification: Option<VerificationResult>,
    /// 전체 소요 시간
    pub elapsed: Duration,
}

impl RunReport {
    /// 최종 상태
    pub fn state(&self) -> RunState {
        self.outcome.state()
    }

    pub fn is_passed(&self) -> bool {
        matches!(self.outcome, RunOutcome::Passed)
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self.outcome, RunOutcome::Cancelled { .. })
    }

    /// 통과가 아니면 해당하는 최상위 에러를 반환합니다.
    pub fn error(&self) -> Option<RelaycheckError> {
        match &self.outcome {
            RunOutcome::Passed => None,
            RunOutcome::Failed(failure) => Some(failure.clone().into()),
            RunOutcome::Cancelled { phase } => Some(RelaycheckError::Cancelled(phase.to_string())),
        }
    }

    /// 상태 전이 경로 (`not_started`부터 최종 상태까지)
    pub fn path(&self) -> Vec<RunState> {
        let mut path: Vec<RunState> = self.transitions.iter().map(|t| t.from).take(1).collect();
        path.extend(self.transitions.iter().map(|t| t.to));
        path
    }
}
