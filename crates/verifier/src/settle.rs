//! 정착 대기 -- 비동기 전달이 끝나기를 기다리는 단계
//!
//! 기본은 고정 시간 대기(`Fixed`)입니다. `UntilStable`은 관측 저장소를
//! 주기적으로 조회하여 개수가 연속으로 같게 나오면 일찍 끝내고, 그렇지
//! 않으면 최대 대기 시간에서 멈춥니다. 어느 쪽이든 최소 한 번의 성공한
//! 조회 없이는 끝나지 않습니다.

use std::time::Duration;

use metrics::counter;
use serde::Serialize;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use relaycheck_core::config::DeliveryConfig;
use relaycheck_core::metrics as m;

use crate::error::VerifierError;
use crate::filter::ObservationFilter;
use crate::store::ObservationStore;

/// 정착 대기 전략
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettleStrategy {
    /// 고정 시간 동안 무조건 대기
    Fixed(Duration),
    /// 개수가 안정될 때까지 폴링
    UntilStable {
        /// 조회 주기
        interval: Duration,
        /// 같은 개수가 연속으로 관측되어야 하는 횟수
        stable_polls: u32,
        /// 최대 대기 시간
        max_wait: Duration,
    },
}

impl Default for SettleStrategy {
    fn default() -> Self {
        Self::Fixed(Duration::from_secs(60))
    }
}

impl SettleStrategy {
    /// core의 `DeliveryConfig`에서 전략을 만듭니다.
    pub fn from_core(config: &DeliveryConfig) -> Result<Self, VerifierError> {
        match config.settle_strategy.as_str() {
            "fixed" => Ok(Self::Fixed(config.settling_delay())),
            "until_stable" => {
                let strategy = Self::UntilStable {
                    interval: Duration::from_millis(config.stable_poll_interval_ms),
                    stable_polls: config.stable_polls,
                    max_wait: config.settling_delay(),
                };
                strategy.validate()?;
                Ok(strategy)
            }
            other => Err(VerifierError::Config {
                field: "settle_strategy".to_owned(),
                reason: format!("unknown strategy '{other}', must be fixed or until_stable"),
            }),
        }
    }

    /// 전략 파라미터를 검증합니다.
    pub fn validate(&self) -> Result<(), VerifierError> {
        if let Self::UntilStable {
            interval,
            stable_polls,
            ..
        } = self
        {
            if interval.is_zero() {
                return Err(VerifierError::Config {
                    field: "stable_poll_interval".to_owned(),
                    reason: "must be greater than 0".to_owned(),
                });
            }
            if *stable_polls == 0 {
                return Err(VerifierError::Config {
                    field: "stable_polls".to_owned(),
                    reason: "must be at least 1".to_owned(),
                });
            }
        }
        Ok(())
    }

    /// 최대 대기 시간
    pub fn max_wait(&self) -> Duration {
        match self {
            Self::Fixed(delay) => *delay,
            Self::UntilStable { max_wait, .. } => *max_wait,
        }
    }

    /// 로그용 이름
    pub fn name(&self) -> &'static str {
        match self {
            Self::Fixed(_) => "fixed",
            Self::UntilStable { .. } => "until_stable",
        }
    }
}

/// 정착 대기 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SettleReport {
    /// 실제 대기 시간
    pub waited: Duration,
    /// 정착 중 조회 횟수 (`Fixed`는 0)
    pub polls: u32,
    /// 마지막으로 관측한 개수
    pub last_count: Option<usize>,
    /// 개수가 안정되어 끝났는지 (`Fixed`는 항상 false)
    pub stable: bool,
}

pub(crate) async fn settle<S: ObservationStore>(
    strategy: SettleStrategy,
    store: &S,
    filter: &ObservationFilter,
    cancel: &CancellationToken,
) -> Result<SettleReport, VerifierError> {
    let started = Instant::now();
    match strategy {
        SettleStrategy::Fixed(delay) => {
            info!(delay_secs = delay.as_secs(), "waiting for deliveries to settle");
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(VerifierError::Cancelled("settlement")),
                _ = tokio::time::sleep(delay) => {}
            }
            Ok(SettleReport {
                waited: started.elapsed(),
                polls: 0,
                last_count: None,
                stable: false,
            })
        }
        SettleStrategy::UntilStable {
            interval,
            stable_polls,
            max_wait,
        } => {
            info!(
                interval_ms = interval.as_millis() as u64,
                stable_polls,
                max_wait_secs = max_wait.as_secs(),
                "polling until observation count stabilizes"
            );
            let deadline = started + max_wait;
            let mut polls: u32 = 0;
            let mut last_count: Option<usize> = None;
            let mut streak: u32 = 0;

            loop {
                let events = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(VerifierError::Cancelled("settlement")),
                    r = store.query(filter) => r?,
                };
                polls += 1;
                counter!(m::VERIFIER_QUERIES_TOTAL).increment(1);

                let count = filter.apply(events).len();
                if last_count == Some(count) {
                    streak += 1;
                } else {
                    streak = 1;
                    last_count = Some(count);
                }
                debug!(count, streak, polls, "settling");

                let stable = streak >= stable_polls;
                let now = Instant::now();
                if stable || now >= deadline {
                    if !stable {
                        info!(count, polls, "settling window ended before count stabilized");
                    }
                    return Ok(SettleReport {
                        waited: now.duration_since(started),
                        polls,
                        last_count,
                        stable,
                    });
                }

                let pause = interval.min(deadline - now);
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(VerifierError::Cancelled("settlement")),
                    _ = tokio::time::sleep(pause) => {}
                }
            }
        }
    }
}
