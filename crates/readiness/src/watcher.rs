//! 준비 상태 감시기 -- 리소스 집합이 Ready/Done에 수렴할 때까지 폴링합니다.
//!
//! [`ReadinessWatcher`]는 플랫폼 도메인에 속한 리소스만 골라
//! [`StatusSource`]를 주기적으로 조회합니다.
//!
//! # 폴링 규칙
//! - 첫 조회는 즉시 수행하고, 이후 `poll_interval`(남은 시간보다 길면 남은 시간)만큼 쉽니다.
//! - 조회 한 번의 제한 시간은 남은 시간과 `poll_interval` 중 큰 값입니다.
//! - 일시적 조회 실패는 "아직 준비되지 않음"으로 취급하고 재시도합니다.
//! - 리소스별 타임아웃이 지나면 해당 리소스를 지목하며 실패합니다.
//! - 모든 대기 지점에서 취소 토큰을 확인합니다.
//!
//! # 동시성
//! 기본 전략(`Concurrent`)은 리소스마다 태스크를 하나씩 띄우고 join합니다.
//! 첫 실패가 도착하면 나머지 태스크를 중단하므로 전체 대기 시간은
//! 리소스별 타임아웃 하나로 제한됩니다.

use std::sync::Arc;
use std::time::Duration;

use metrics::{counter, histogram};
use tokio::task::JoinSet;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use relaycheck_core::metrics as m;
use relaycheck_core::types::{ResourceReference, ResourceStatus};

use crate::config::{PollStrategy, WatcherConfig};
use crate::error::ReadinessError;
use crate::outcome::{ReadinessOutcome, ReadinessReport, ResourceOutcome};
use crate::status::StatusSource;

/// 준비 상태 감시기
///
/// 상태 소스를 `Arc`로 공유하여 리소스별 대기 태스크에 전달합니다.
pub struct ReadinessWatcher<S: StatusSource> {
    source: Arc<S>,
    config: WatcherConfig,
}

impl<S: StatusSource> ReadinessWatcher<S> {
    /// 새 감시기를 생성합니다.
    pub fn new(source: Arc<S>, config: WatcherConfig) -> Self {
        Self { source, config }
    }

    /// 감시기 설정을 반환합니다.
    pub fn config(&self) -> &WatcherConfig {
        &self.config
    }

    /// 참조를 (폴링 대상, 건너뛸 대상)으로 나눕니다. 두 목록 모두 입력 순서를 유지합니다.
    pub fn partition(
        &self,
        references: &[ResourceReference],
    ) -> (Vec<ResourceReference>, Vec<ResourceReference>) {
        references
            .iter()
            .cloned()
            .partition(|r| r.belongs_to_domain(&self.config.platform_domain))
    }

    /// 모든 관련 리소스가 Ready 또는 Done이 될 때까지 기다립니다.
    ///
    /// 빈 입력이나 모두 도메인 밖인 입력은 즉시 성공합니다.
    /// 첫 타임아웃/복구 불가 에러에서 전체 대기를 중단하고 해당 리소스를 보고합니다.
    pub async fn wait_for_all_ready(
        &self,
        references: &[ResourceReference],
        cancel: &CancellationToken,
    ) -> Result<ReadinessReport, ReadinessError> {
        let started = Instant::now();
        let (polled, skipped) = self.partition(references);

        for reference in &skipped {
            debug!(reference = %reference, "skipping resource outside platform domain");
        }
        if !skipped.is_empty() {
            counter!(m::READINESS_SKIPPED_TOTAL).increment(skipped.len() as u64);
        }

        info!(
            polled = polled.len(),
            skipped = skipped.len(),
            strategy = %self.config.strategy,
            timeout_secs = self.config.per_resource_timeout.as_secs(),
            "waiting for resources to become ready"
        );

        let converged = match self.config.strategy {
            PollStrategy::Concurrent => self.wait_concurrent(polled, cancel).await?,
            PollStrategy::Sequential => self.wait_sequential(polled, cancel).await?,
        };

        let report = ReadinessReport {
            converged,
            skipped,
            elapsed: started.elapsed(),
        };

        info!(
            ready = report.count(ReadinessOutcome::Ready),
            done = report.count(ReadinessOutcome::Done),
            skipped = report.skipped.len(),
            elapsed_ms = report.elapsed.as_millis() as u64,
            "all resources ready"
        );

        Ok(report)
    }

    /// 단일 리소스가 Ready 또는 Done이 될 때까지 기다립니다.
    ///
    /// 도메인 필터는 적용하지 않습니다.
    pub async fn wait_for_ready_or_done(
        &self,
        reference: &ResourceReference,
        cancel: &CancellationToken,
    ) -> Result<ResourceOutcome, ReadinessError> {
        wait_one(
            Arc::clone(&self.source),
            reference.clone(),
            self.config.poll_interval,
            self.config.per_resource_timeout,
            cancel.clone(),
        )
        .await
    }

    async fn wait_concurrent(
        &self,
        polled: Vec<ResourceReference>,
        cancel: &CancellationToken,
    ) -> Result<Vec<ResourceOutcome>, ReadinessError> {
        let mut slots: Vec<Option<ResourceOutcome>> = vec![None; polled.len()];
        let mut tasks = JoinSet::new();

        for (index, reference) in polled.into_iter().enumerate() {
            let source = Arc::clone(&self.source);
            let cancel = cancel.clone();
            let interval = self.config.poll_interval;
            let timeout = self.config.per_resource_timeout;
            tasks.spawn(async move {
                (
                    index,
                    wait_one(source, reference, interval, timeout, cancel).await,
                )
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, Ok(outcome))) => {
                    if let Some(slot) = slots.get_mut(index) {
                        *slot = Some(outcome);
                    }
                }
                Ok((_, Err(err))) => {
                    tasks.abort_all();
                    report_failure(&err);
                    return Err(err);
                }
                Err(join_err) => {
                    tasks.abort_all();
                    let err = ReadinessError::Task(join_err.to_string());
                    report_failure(&err);
                    return Err(err);
                }
            }
        }

        Ok(slots.into_iter().flatten().collect())
    }

    async fn wait_sequential(
        &self,
        polled: Vec<ResourceReference>,
        cancel: &CancellationToken,
    ) -> Result<Vec<ResourceOutcome>, ReadinessError> {
        let mut converged = Vec::with_capacity(polled.len());
        for reference in polled {
            let result = wait_one(
                Arc::clone(&self.source),
                reference,
                self.config.poll_interval,
                self.config.per_resource_timeout,
                cancel.clone(),
            )
            .await;
            match result {
                Ok(outcome) => converged.push(outcome),
                Err(err) => {
                    report_failure(&err);
                    return Err(err);
                }
            }
        }
        Ok(converged)
    }
}

fn report_failure(err: &ReadinessError) {
    if let Some(outcome) = err.outcome() {
        counter!(m::READINESS_OUTCOMES_TOTAL, m::LABEL_RESULT => outcome.as_str()).increment(1);
    }
    if err.is_cancelled() {
        info!(error = %err, "readiness wait cancelled");
    } else {
        warn!(error = %err, "resource failed to become ready");
    }
}

/// 한 리소스를 폴링합니다.
///
/// 조회 한 번의 제한 시간은 남은 시간과 `poll_interval` 중 큰 값입니다.
/// 마감 시각에 하는 마지막 조회도 결과를 돌려받습니다.
async fn wait_one<S: StatusSource>(
    source: Arc<S>,
    reference: ResourceReference,
    poll_interval: Duration,
    timeout: Duration,
    cancel: CancellationToken,
) -> Result<ResourceOutcome, ReadinessError> {
    let started = Instant::now();
    let deadline = started + timeout;
    let mut polls: u32 = 0;

    loop {
        let budget = deadline
            .saturating_duration_since(Instant::now())
            .max(poll_interval);
        polls += 1;
        counter!(m::READINESS_POLLS_TOTAL, m::LABEL_KIND => reference.kind.clone()).increment(1);

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Err(ReadinessError::Cancelled { reference });
            }
            r = tokio::time::timeout(budget, source.status(&reference)) => r,
        };

        let last_seen = match result {
            Ok(Ok(status)) => {
                if let Some(outcome) = converged_outcome(&status) {
                    let waited = started.elapsed();
                    counter!(m::READINESS_OUTCOMES_TOTAL, m::LABEL_RESULT => outcome.as_str())
                        .increment(1);
                    histogram!(m::READINESS_WAIT_DURATION_SECONDS).record(waited.as_secs_f64());
                    info!(reference = %reference, outcome = %outcome, polls, "resource converged");
                    return Ok(ResourceOutcome {
                        reference,
                        outcome,
                        polls,
                        waited,
                    });
                }
                if let Some(failed) = status.terminal_failure() {
                    let reason = format!(
                        "{}={}{}",
                        failed.condition_type,
                        failed.status,
                        failed
                            .message
                            .as_deref()
                            .filter(|m| !m.is_empty())
                            .or(failed.reason.as_deref())
                            .map(|m| format!(": {m}"))
                            .unwrap_or_default()
                    );
                    return Err(ReadinessError::Unrecoverable { reference, reason });
                }
                let seen = describe_status(&status);
                debug!(reference = %reference, status = %seen, polls, "resource not ready yet");
                seen
            }
            Ok(Err(err)) if err.is_transient() => {
                counter!(m::READINESS_POLL_ERRORS_TOTAL, m::LABEL_KIND => reference.kind.clone())
                    .increment(1);
                debug!(reference = %reference, error = %err, polls, "status lookup failed, retrying");
                err.to_string()
            }
            Ok(Err(err)) => {
                return Err(ReadinessError::Unrecoverable {
                    reference,
                    reason: err.to_string(),
                });
            }
            Err(_) => {
                debug!(
                    reference = %reference,
                    budget_ms = budget.as_millis() as u64,
                    polls,
                    "status query timed out"
                );
                "status query did not return in time".to_owned()
            }
        };

        let now = Instant::now();
        if now >= deadline {
            return Err(ReadinessError::Timeout {
                reference,
                waited: now.duration_since(started),
                polls,
                last_seen: Some(last_seen),
            });
        }

        let pause = poll_interval.min(deadline - now);
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Err(ReadinessError::Cancelled { reference });
            }
            _ = tokio::time::sleep(pause) => {}
        }
    }
}

fn converged_outcome(status: &ResourceStatus) -> Option<ReadinessOutcome> {
    if status.is_ready() {
        Some(ReadinessOutcome::Ready)
    } else if status.is_done() {
        Some(ReadinessOutcome::Done)
    } else {
        None
    }
}

/// 진단용 상태 요약 ("Ready=False (Reason), ...")
fn describe_status(status: &ResourceStatus) -> String {
    if status.conditions.is_empty() {
        return "no conditions reported".to_owned();
    }
    status
        .conditions
        .iter()
        .map(|c| match &c.reason {
            Some(reason) => format!("{}={} ({reason})", c.condition_type, c.status),
            None => format!("{}={}", c.condition_type, c.status),
        })
        .collect::<Vec<_>>()
        .join(", ")
}
