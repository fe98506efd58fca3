//! 리소스별 수렴 결과와 전체 보고서

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use relaycheck_core::types::ResourceReference;

/// 리소스별 준비 상태 결과
///
/// `Ready`와 `Done`은 모두 성공 종료 상태입니다. `Done`은 일회성 작업처럼
/// 계속 Ready로 남지 않고 완료되는 리소스를 뜻합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadinessOutcome {
    Ready,
    Done,
    TimedOut,
    Error,
}

impl ReadinessOutcome {
    /// 성공 종료 상태인지 확인합니다.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Ready | Self::Done)
    }

    /// 메트릭 레이블용 이름
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ready => "ready",
            Self::Done => "done",
            Self::TimedOut => "timed_out",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for ReadinessOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 한 리소스의 수렴 기록
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceOutcome {
    /// 대상 리소스
    pub reference: ResourceReference,
    /// 결과
    pub outcome: ReadinessOutcome,
    /// 조회 횟수
    pub polls: u32,
    /// 수렴까지 걸린 시간
    pub waited: Duration,
}

/// 준비 상태 감시 전체 보고서
///
/// `converged`는 입력 순서를 유지합니다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReadinessReport {
    /// Ready/Done에 도달한 리소스
    pub converged: Vec<ResourceOutcome>,
    /// 플랫폼 도메인 밖이라 폴링하지 않은 리소스
    pub skipped: Vec<ResourceReference>,
    /// 전체 소요 시간
    pub elapsed: Duration,
}

impl ReadinessReport {
    /// 특정 결과를 가진 리소스 수
    pub fn count(&self, outcome: ReadinessOutcome) -> usize {
        self.converged
            .iter()
            .filter(|o| o.outcome == outcome)
            .count()
    }

    /// 폴링한 리소스 수
    pub fn polled(&self) -> usize {
        self.converged.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_states() {
        assert!(ReadinessOutcome::Ready.is_success());
        assert!(ReadinessOutcome::Done.is_success());
        assert!(!ReadinessOutcome::TimedOut.is_success());
        assert!(!ReadinessOutcome::Error.is_success());
    }

    #[test]
    fn outcome_serializes_snake_case() {
        let json = serde_json::to_string(&ReadinessOutcome::TimedOut).unwrap();
        assert_eq!(json, "\"timed_out\"");
    }

    #[test]
    fn report_counts_by_outcome() {
        let make = |name: &str, outcome| ResourceOutcome {
            reference: ResourceReference::new("Broker", "eventing.knative.dev/v1", name, "ns"),
            outcome,
            polls: 1,
            waited: Duration::ZERO,
        };
        let report = ReadinessReport {
            converged: vec![
                make("a", ReadinessOutcome::Ready),
                make("b", ReadinessOutcome::Done),
                make("c", ReadinessOutcome::Ready),
            ],
            skipped: Vec::new(),
            elapsed: Duration::ZERO,
        };
        assert_eq!(report.count(ReadinessOutcome::Ready), 2);
        assert_eq!(report.count(ReadinessOutcome::Done), 1);
        assert_eq!(report.polled(), 3);
    }
}
