//! 전달 검증기 에러 타입
//!
//! [`VerifierError`]는 검증 단계의 모든 실패를 표현하며
//! `From<VerifierError> for RelaycheckError`로 상위 에러로 변환됩니다.

use relaycheck_core::error::{ConfigError, RelaycheckError};
use relaycheck_core::types::ObservedEvent;

/// 전달 검증 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum VerifierError {
    /// 관측 저장소 조회 실패 (재시도하지 않음)
    #[error("observation query failed: {0}")]
    Query(String),

    /// 필터링된 관측 개수가 기대와 다름
    #[error("count mismatch: want {expected}, got {actual}")]
    CountMismatch {
        /// 기대 개수
        expected: usize,
        /// 실제 개수
        actual: usize,
        /// 진단용 관측 목록
        events: Vec<ObservedEvent>,
    },

    /// 외부 취소 신호 (단계명 포함)
    #[error("cancelled during {0}")]
    Cancelled(&'static str),

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },
}

impl VerifierError {
    /// 취소로 인한 에러인지 확인합니다.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }
}

impl From<VerifierError> for RelaycheckError {
    fn from(err: VerifierError) -> Self {
        match err {
            VerifierError::Query(reason) => RelaycheckError::ObservationQuery(reason),
            VerifierError::CountMismatch {
                expected, actual, ..
            } => RelaycheckError::CountMismatch { expected, actual },
            VerifierError::Cancelled(phase) => RelaycheckError::Cancelled(phase.to_owned()),
            VerifierError::Config { field, reason } => {
                RelaycheckError::Config(ConfigError::InvalidValue { field, reason })
            }
        }
    }
}
