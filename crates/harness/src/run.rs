//! 검증 실행 -- 준비 상태 수렴, 정착 대기, 관측 조회를 순서대로 수행합니다.
//!
//! 각 단계의 완료가 다음 단계의 장벽입니다. 준비 상태 단계가 모든 관련
//! 리소스에 대해 성공하기 전에는 정착 대기를 시작하지 않고, 정착 대기가
//! 끝나기 전에는 조회하지 않습니다. 첫 실패에서 즉시 종료합니다.

use std::sync::Arc;

use metrics::{counter, histogram};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use relaycheck_core::metrics as m;
use relaycheck_readiness::{ReadinessReport, ReadinessWatcher, StatusSource};
use relaycheck_verifier::{
    DeliveryVerifier, ObservationStore, SettleReport, VerificationResult,
};

use crate::plan::RunPlan;
use crate::report::{RunFailure, RunOutcome, RunReport};
use crate::state::{RunState, StateTransition};

/// 한 번의 전달 검증 실행
///
/// [`execute`](Self::execute)는 실행을 소비합니다. 실패한 실행은
/// 재시도하지 않으며 새 실행을 만들어야 합니다.
pub struct DeliveryRun<S: StatusSource, O: ObservationStore> {
    plan: RunPlan,
    watcher: ReadinessWatcher<S>,
    verifier: DeliveryVerifier<O>,
    state: RunState,
    transitions: Vec<StateTransition>,
    started: Instant,
}

impl<S: StatusSource, O: ObservationStore> DeliveryRun<S, O> {
    /// 실행 계획과 협력자로 새 실행을 만듭니다.
    pub fn new(plan: RunPlan, status_source: Arc<S>, store: Arc<O>) -> Self {
        let watcher = ReadinessWatcher::new(status_source, plan.watcher.clone());
        Self {
            plan,
            watcher,
            verifier: DeliveryVerifier::new(store),
            state: RunState::NotStarted,
            transitions: Vec::new(),
            started: Instant::now(),
        }
    }

    /// 현재 상태
    pub fn state(&self) -> RunState {
        self.state
    }

    /// 실행 계획
    pub fn plan(&self) -> &RunPlan {
        &self.plan
    }

    /// 실행을 끝까지 수행하고 보고서를 반환합니다.
    pub async fn execute(mut self, cancel: &CancellationToken) -> RunReport {
        self.started = Instant::now();
        info!(
            run_id = %self.plan.run_id,
            namespace = %self.plan.environment.namespace,
            observer = %self.plan.expectation.observer,
            expected = self.plan.expectation.expected_count,
            references = self.plan.environment.references.len(),
            "starting delivery run"
        );

        let mut readiness: Option<ReadinessReport> = None;
        let mut settle: Option<SettleReport> = None;
        let mut verification: Option<VerificationResult> = None;

        let outcome = 'run: {
            self.transition(RunState::AwaitingReadiness);
            match self
                .watcher
                .wait_for_all_ready(&self.plan.environment.references, cancel)
                .await
            {
                Ok(report) => readiness = Some(report),
                Err(err) if err.is_cancelled() => {
                    break 'run RunOutcome::Cancelled {
                        phase: RunState::AwaitingReadiness,
                    };
                }
                Err(err) => break 'run RunOutcome::Failed(RunFailure::from(&err)),
            }

            self.transition(RunState::AwaitingSettlement);
            match self.verifier.settle(&self.plan.expectation, cancel).await {
                Ok(report) => settle = Some(report),
                Err(err) => {
                    break 'run RunOutcome::from_verifier(err, RunState::AwaitingSettlement);
                }
            }

            self.transition(RunState::Querying);
            match self.verifier.collect(&self.plan.expectation, cancel).await {
                Ok(result) => {
                    let outcome = if result.passed {
                        RunOutcome::Passed
                    } else {
                        RunOutcome::Failed(RunFailure::CountMismatch {
                            expected: result.expected,
                            actual: result.actual,
                        })
                    };
                    verification = Some(result);
                    outcome
                }
                Err(err) => RunOutcome::from_verifier(err, RunState::Querying),
            }
        };

        self.transition(outcome.state());
        let elapsed = self.started.elapsed();

        counter!(m::RUN_COMPLETED_TOTAL, m::LABEL_RESULT => outcome.state().as_str()).increment(1);
        histogram!(m::RUN_DURATION_SECONDS).record(elapsed.as_secs_f64());

        match &outcome {
            RunOutcome::Passed => info!(
                run_id = %self.plan.run_id,
                elapsed_ms = elapsed.as_millis() as u64,
                "delivery run passed"
            ),
            RunOutcome::Failed(failure) => warn!(
                run_id = %self.plan.run_id,
                error = %failure,
                "delivery run failed"
            ),
            RunOutcome::Cancelled { phase } => info!(
                run_id = %self.plan.run_id,
                phase = %phase,
                "delivery run cancelled"
            ),
        }

        RunReport {
            run_id: self.plan.run_id.clone(),
            namespace: self.plan.environment.namespace.clone(),
            observer: self.plan.expectation.observer.to_string(),
            outcome,
            transitions: self.transitions,
            readiness,
            settle,
            verification,
            elapsed,
        }
    }

    fn transition(&mut self, next: RunState) {
        if !self.state.can_transition_to(next) {
            warn!(from = %self.state, to = %next, "ignoring invalid run state transition");
            return;
        }
        info!(run_id = %self.plan.run_id, from = %self.state, to = %next, "run state changed");
        self.transitions.push(StateTransition {
            from: self.state,
            to: next,
            at: self.started.elapsed(),
        });
        self.state = next;
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use relaycheck_core::types::{Environment, ObservedEvent, OriginRef, ResourceReference, ResourceStatus};
    use relaycheck_readiness::{StatusError, WatcherConfigBuilder};
    use relaycheck_verifier::{
        Expectation, ObservationFilter, ObserverIdentity, SettleStrategy, VerifierError,
    };
    use serde_json::json;

    struct ReadySource;

    impl StatusSource for ReadySource {
        async fn status(&self, _reference: &ResourceReference) -> Result<ResourceStatus, StatusError> {
            Ok(ResourceStatus::ready())
        }
    }

    struct FixedStore(Vec<ObservedEvent>);

    impl ObservationStore for FixedStore {
        async fn query(&self, _filter: &ObservationFilter) -> Result<Vec<ObservedEvent>, VerifierError> {
            Ok(self.0.clone())
        }
    }

    fn plan(expected: usize) -> RunPlan {
        let environment = Environment::new(
            "ns-123",
            vec![ResourceReference::new(
                "Broker",
                "eventing.knative.dev/v1",
                "default",
                "ns-123",
            )],
        );
        let watcher = WatcherConfigBuilder::new()
            .poll_interval(Duration::from_secs(1))
            .per_resource_timeout(Duration::from_secs(10))
            .build()
            .unwrap();
        let expectation = Expectation::new(ObserverIdentity::for_namespace("ns-123"), expected)
            .with_settle(SettleStrategy::Fixed(Duration::from_secs(5)));
        RunPlan::new(environment, watcher, expectation)
    }

    fn events(n: usize) -> Vec<ObservedEvent> {
        (0..n)
            .map(|i| ObservedEvent::new("recorder-ns-123", OriginRef::namespace("default"), json!(i)))
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn new_run_is_not_started() {
        let run = DeliveryRun::new(plan(1), Arc::new(ReadySource), Arc::new(FixedStore(Vec::new())));
        assert_eq!(run.state(), RunState::NotStarted);
        assert_eq!(run.plan().expectation.expected_count, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn passing_run_walks_every_phase() {
        let run = DeliveryRun::new(plan(2), Arc::new(ReadySource), Arc::new(FixedStore(events(2))));
        let report = run.execute(&CancellationToken::new()).await;

        assert!(report.is_passed());
        assert_eq!(
            report.path(),
            vec![
                RunState::NotStarted,
                RunState::AwaitingReadiness,
                RunState::AwaitingSettlement,
                RunState::Querying,
                RunState::Passed,
            ]
        );
        assert_eq!(report.elapsed, Duration::from_secs(5));
        assert!(report.readiness.is_some());
        assert_eq!(report.verification.as_ref().map(|v| v.actual), Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn mismatch_keeps_verification_for_diagnostics() {
        let run = DeliveryRun::new(plan(5), Arc::new(ReadySource), Arc::new(FixedStore(events(3))));
        let report = run.execute(&CancellationToken::new()).await;

        assert_eq!(report.state(), RunState::Failed);
        assert_eq!(
            report.outcome,
            RunOutcome::Failed(RunFailure::CountMismatch {
                expected: 5,
                actual: 3
            })
        );
        assert_eq!(report.verification.map(|v| v.events.len()), Some(3));
    }
}
