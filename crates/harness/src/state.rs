//! 실행 상태 머신
//!
//! ```text
//! NotStarted → AwaitingReadiness → AwaitingSettlement → Querying → Passed
//!                     │                    │                │
//!                     └────────────────────┴────────────────┴──→ Failed | Cancelled
//! ```
//!
//! 종료 상태(`Passed`, `Failed`, `Cancelled`)에서는 더 이상 전이하지 않습니다.
//! 실패한 실행은 재시도하지 않으며 호출자가 새 실행을 만들어야 합니다.

use std::fmt;
use std::time::Duration;

use serde::Serialize;

/// 실행 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    NotStarted,
    AwaitingReadiness,
    AwaitingSettlement,
    Querying,
    Passed,
    Failed,
    Cancelled,
}

impl RunState {
    /// 종료 상태인지 확인합니다.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Passed | Self::Failed | Self::Cancelled)
    }

    /// `next`로 전이할 수 있는지 확인합니다.
    pub fn can_transition_to(&self, next: RunState) -> bool {
        use RunState::*;
        match (self, next) {
            (NotStarted, AwaitingReadiness) => true,
            (AwaitingReadiness, AwaitingSettlement) => true,
            (AwaitingSettlement, Querying) => true,
            (Querying, Passed) => true,
            (AwaitingReadiness | AwaitingSettlement | Querying, Failed | Cancelled) => true,
            _ => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::AwaitingReadiness => "awaiting_readiness",
            Self::AwaitingSettlement => "awaiting_settlement",
            Self::Querying => "querying",
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 기록된 상태 전이
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StateTransition {
    pub from: RunState,
    pub to: RunState,
    /// 실행 시작 기준 경과 시간
    pub at: Duration,
}
