//! 검증 결과와 개수 비교 모드

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use relaycheck_core::types::ObservedEvent;

use crate::error::VerifierError;

/// 관측 개수 비교 모드
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// 정확히 같아야 함 (중복 전달과 누락 모두 실패)
    #[default]
    Exact,
    /// 기대 개수 이상이면 통과
    AtLeast,
}

impl MatchMode {
    /// 실제 개수가 기대를 만족하는지 확인합니다.
    pub fn accepts(&self, expected: usize, actual: usize) -> bool {
        match self {
            Self::Exact => actual == expected,
            Self::AtLeast => actual >= expected,
        }
    }
}

impl FromStr for MatchMode {
    type Err = VerifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "exact" => Ok(Self::Exact),
            "at_least" => Ok(Self::AtLeast),
            other => Err(VerifierError::Config {
                field: "match_mode".to_owned(),
                reason: format!("unknown match mode '{other}', must be exact or at_least"),
            }),
        }
    }
}

impl fmt::Display for MatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact => f.write_str("exact"),
            Self::AtLeast => f.write_str("at_least"),
        }
    }
}

/// 전달 검증 결과
///
/// 실행 끝에 한 번 만들어지며 저장되지 않습니다.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerificationResult {
    /// 집계한 관찰자 식별자
    pub observer: String,
    /// 기대 개수
    pub expected: usize,
    /// 필터를 통과한 관측 개수
    pub actual: usize,
    /// 비교 모드
    pub match_mode: MatchMode,
    /// 통과 여부
    pub passed: bool,
    /// 필터를 통과한 관측 목록
    pub events: Vec<ObservedEvent>,
}

impl VerificationResult {
    /// 필터링된 관측 목록으로 결과를 만듭니다.
    pub fn evaluate(
        observer: impl Into<String>,
        expected: usize,
        match_mode: MatchMode,
        events: Vec<ObservedEvent>,
    ) -> Self {
        let actual = events.len();
        Self {
            observer: observer.into(),
            expected,
            actual,
            match_mode,
            passed: match_mode.accepts(expected, actual),
            events,
        }
    }

    /// 실패한 결과를 `CountMismatch` 에러로 바꿉니다.
    pub fn ensure_passed(self) -> Result<Self, VerifierError> {
        if self.passed {
            Ok(self)
        } else {
            Err(VerifierError::CountMismatch {
                expected: self.expected,
                actual: self.actual,
                events: self.events,
            })
        }
    }
}
