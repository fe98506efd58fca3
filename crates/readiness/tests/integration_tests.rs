//! 통합 테스트 -- 여러 리소스의 준비 상태 수렴 시나리오
//!
//! 가상 시간(`start_paused`)에서 테스트용 상태 소스를 사용하여
//! 동시/순차 폴링, 도메인 필터, 타임아웃, 취소를 검증합니다.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use relaycheck_core::types::{ResourceReference, ResourceStatus};
use relaycheck_readiness::{
    PollStrategy, ReadinessError, ReadinessOutcome, ReadinessWatcher, StatusError,
    WatcherConfigBuilder,
};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

mod mock {
    use super::*;
    use relaycheck_readiness::StatusSource;
    use tokio::sync::Mutex;

    /// 리소스별 동작
    #[derive(Clone)]
    pub enum Behavior {
        /// 지정 시각 이후 Ready
        ReadyAt(Instant),
        /// 지정 시각 이후 Done
        DoneAt(Instant),
        /// 조회마다 순서대로 응답, 마지막 응답 반복
        Script(Vec<Result<ResourceStatus, StatusError>>),
        /// 항상 Ready가 아님
        Never,
    }

    pub struct TestStatusSource {
        behaviors: HashMap<ResourceReference, Behavior>,
        calls: Arc<Mutex<HashMap<ResourceReference, usize>>>,
    }

    impl TestStatusSource {
        pub fn new() -> Self {
            Self {
                behaviors: HashMap::new(),
                calls: Arc::new(Mutex::new(HashMap::new())),
            }
        }

        pub fn with(mut self, reference: ResourceReference, behavior: Behavior) -> Self {
            self.behaviors.insert(reference, behavior);
            self
        }

        pub async fn calls(&self, reference: &ResourceReference) -> usize {
            self.calls.lock().await.get(reference).copied().unwrap_or(0)
        }
    }

    impl StatusSource for TestStatusSource {
        async fn status(&self, reference: &ResourceReference) -> Result<ResourceStatus, StatusError> {
            let call = {
                let mut calls = self.calls.lock().await;
                let count = calls.entry(reference.clone()).or_insert(0);
                *count += 1;
                *count
            };

            match self.behaviors.get(reference) {
                Some(Behavior::ReadyAt(at)) if Instant::now() >= *at => Ok(ResourceStatus::ready()),
                Some(Behavior::DoneAt(at)) if Instant::now() >= *at => Ok(ResourceStatus::done()),
                Some(Behavior::ReadyAt(_)) | Some(Behavior::DoneAt(_)) | Some(Behavior::Never) => {
                    Ok(ResourceStatus::pending())
                }
                Some(Behavior::Script(script)) => {
                    let index = (call - 1).min(script.len().saturating_sub(1));
                    script
                        .get(index)
                        .cloned()
                        .unwrap_or_else(|| Err(StatusError::NotFound(reference.to_string())))
                }
                None => Err(StatusError::NotFound(reference.to_string())),
            }
        }
    }
}

use mock::{Behavior, TestStatusSource};

fn knative(kind: &str, name: &str) -> ResourceReference {
    ResourceReference::new(kind, "eventing.knative.dev/v1", name, "ns-123")
}

fn watcher(
    source: Arc<TestStatusSource>,
    timeout_secs: u64,
    strategy: PollStrategy,
) -> ReadinessWatcher<TestStatusSource> {
    let config = WatcherConfigBuilder::new()
        .poll_interval(Duration::from_secs(1))
        .per_resource_timeout(Duration::from_secs(timeout_secs))
        .strategy(strategy)
        .build()
        .unwrap();
    ReadinessWatcher::new(source, config)
}

#[tokio::test(start_paused = true)]
async fn concurrent_wait_is_bounded_by_single_timeout() {
    let now = Instant::now();
    let refs: Vec<_> = (1..=5)
        .map(|i| knative("Trigger", &format!("t{i}")))
        .collect();
    let mut source = TestStatusSource::new();
    for (i, reference) in refs.iter().enumerate() {
        let at = now + Duration::from_secs(10 * (i as u64 + 1));
        source = source.with(reference.clone(), Behavior::ReadyAt(at));
    }
    let watcher = watcher(Arc::new(source), 60, PollStrategy::Concurrent);

    let report = watcher
        .wait_for_all_ready(&refs, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.count(ReadinessOutcome::Ready), 5);
    assert!(report.elapsed <= Duration::from_secs(60));
    assert_eq!(now.elapsed(), Duration::from_secs(50));
    // 입력 순서 유지
    let names: Vec<_> = report
        .converged
        .iter()
        .map(|o| o.reference.name.as_str())
        .collect();
    assert_eq!(names, ["t1", "t2", "t3", "t4", "t5"]);
}

#[tokio::test(start_paused = true)]
async fn ready_and_done_are_both_success() {
    let now = Instant::now();
    let broker = knative("Broker", "default");
    let job = ResourceReference::new("JobSink", "sinks.knative.dev/v1alpha1", "once", "ns-123");
    let source = TestStatusSource::new()
        .with(broker.clone(), Behavior::ReadyAt(now))
        .with(job.clone(), Behavior::DoneAt(now + Duration::from_secs(3)));
    let watcher = watcher(Arc::new(source), 30, PollStrategy::Concurrent);

    let report = watcher
        .wait_for_all_ready(&[broker, job], &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(report.count(ReadinessOutcome::Ready), 1);
    assert_eq!(report.count(ReadinessOutcome::Done), 1);
}

#[tokio::test(start_paused = true)]
async fn never_ready_reference_is_identified() {
    let now = Instant::now();
    let good = knative("Broker", "default");
    let stuck = knative("Trigger", "stuck");
    let source = TestStatusSource::new()
        .with(good.clone(), Behavior::ReadyAt(now + Duration::from_secs(2)))
        .with(stuck.clone(), Behavior::Never);
    let watcher = watcher(Arc::new(source), 30, PollStrategy::Concurrent);

    let err = watcher
        .wait_for_all_ready(&[good, stuck.clone()], &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, ReadinessError::Timeout { .. }));
    assert_eq!(err.reference(), Some(&stuck));
    assert_eq!(now.elapsed(), Duration::from_secs(30));
}

#[tokio::test(start_paused = true)]
async fn first_failure_aborts_remaining_waits() {
    let now = Instant::now();
    let slow = knative("Broker", "slow");
    let broken = knative("Trigger", "broken");
    let source = TestStatusSource::new()
        .with(slow.clone(), Behavior::Never)
        .with(
            broken.clone(),
            Behavior::Script(vec![
                Ok(ResourceStatus::pending()),
                Err(StatusError::Unrecoverable("trigger spec rejected".to_owned())),
            ]),
        );
    let watcher = watcher(Arc::new(source), 300, PollStrategy::Concurrent);

    let err = watcher
        .wait_for_all_ready(&[slow, broken.clone()], &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.reference(), Some(&broken));
    assert_eq!(err.outcome(), Some(ReadinessOutcome::Error));
    assert_eq!(now.elapsed(), Duration::from_secs(1));
}

#[tokio::test(start_paused = true)]
async fn out_of_domain_references_are_never_polled() {
    let broker = knative("Broker", "default");
    let pod = ResourceReference::new("Pod", "v1", "recorder", "ns-123");
    let deployment = ResourceReference::new("Deployment", "apps/v1", "sender", "ns-123");
    let source = Arc::new(
        TestStatusSource::new()
            .with(broker.clone(), Behavior::ReadyAt(Instant::now()))
            .with(
                pod.clone(),
                Behavior::Script(vec![Err(StatusError::Unrecoverable("crash loop".to_owned()))]),
            )
            .with(deployment.clone(), Behavior::Never),
    );
    let watcher = watcher(Arc::clone(&source), 10, PollStrategy::Concurrent);

    let report = watcher
        .wait_for_all_ready(
            &[pod.clone(), broker.clone(), deployment.clone()],
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(report.polled(), 1);
    assert_eq!(report.skipped, vec![pod.clone(), deployment.clone()]);
    assert_eq!(source.calls(&pod).await, 0);
    assert_eq!(source.calls(&deployment).await, 0);
    assert_eq!(source.calls(&broker).await, 1);
}

#[tokio::test(start_paused = true)]
async fn only_foreign_references_succeeds_without_polling() {
    let pod = ResourceReference::new("Pod", "v1", "recorder", "ns-123");
    let source = Arc::new(TestStatusSource::new().with(pod.clone(), Behavior::Never));
    let watcher = watcher(Arc::clone(&source), 10, PollStrategy::Concurrent);

    let report = watcher
        .wait_for_all_ready(&[pod.clone()], &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(report.polled(), 0);
    assert_eq!(source.calls(&pod).await, 0);
}

#[tokio::test(start_paused = true)]
async fn flapping_resource_is_judged_at_poll_instants() {
    let trigger = knative("Trigger", "flappy");
    let source = Arc::new(TestStatusSource::new().with(
        trigger.clone(),
        Behavior::Script(vec![
            Ok(ResourceStatus::pending()),
            Err(StatusError::Lookup("etcd leader changed".to_owned())),
            Ok(ResourceStatus::ready()),
            Ok(ResourceStatus::pending()),
        ]),
    ));
    let watcher = watcher(Arc::clone(&source), 30, PollStrategy::Concurrent);

    let report = watcher
        .wait_for_all_ready(&[trigger.clone()], &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(report.converged[0].polls, 3);
    assert_eq!(source.calls(&trigger).await, 3);
}

#[tokio::test(start_paused = true)]
async fn sequential_strategy_polls_in_order() {
    let now = Instant::now();
    let first = knative("Broker", "default");
    let second = knative("Trigger", "t1");
    let source = TestStatusSource::new()
        .with(first.clone(), Behavior::ReadyAt(now + Duration::from_secs(4)))
        .with(second.clone(), Behavior::ReadyAt(now));
    let watcher = watcher(Arc::new(source), 30, PollStrategy::Sequential);

    let report = watcher
        .wait_for_all_ready(&[first, second], &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.converged[0].waited, Duration::from_secs(4));
    // 두 번째 리소스는 첫 번째가 끝난 뒤 한 번의 조회로 수렴
    assert_eq!(report.converged[1].polls, 1);
    assert_eq!(report.converged[1].waited, Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn sequential_strategy_stops_at_first_failure() {
    let stuck = knative("Broker", "stuck");
    let never_reached = knative("Trigger", "t1");
    let source = Arc::new(
        TestStatusSource::new()
            .with(stuck.clone(), Behavior::Never)
            .with(never_reached.clone(), Behavior::ReadyAt(Instant::now())),
    );
    let watcher = watcher(Arc::clone(&source), 5, PollStrategy::Sequential);

    let err = watcher
        .wait_for_all_ready(&[stuck.clone(), never_reached.clone()], &CancellationToken::new())
        .await
        .unwrap_err();
    assert_eq!(err.reference(), Some(&stuck));
    assert_eq!(source.calls(&never_reached).await, 0);
}

#[tokio::test(start_paused = true)]
async fn cancellation_stops_all_waits_promptly() {
    let refs = vec![knative("Broker", "default"), knative("Trigger", "t1")];
    let source = TestStatusSource::new()
        .with(refs[0].clone(), Behavior::Never)
        .with(refs[1].clone(), Behavior::Never);
    let watcher = watcher(Arc::new(source), 300, PollStrategy::Concurrent);
    let cancel = CancellationToken::new();

    let canceller = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(4500)).await;
        canceller.cancel();
    });

    let start = Instant::now();
    let err = watcher.wait_for_all_ready(&refs, &cancel).await.unwrap_err();
    assert!(err.is_cancelled());
    assert_eq!(start.elapsed(), Duration::from_millis(4500));
}

#[tokio::test(start_paused = true)]
async fn already_cancelled_token_polls_nothing() {
    let broker = knative("Broker", "default");
    let source = Arc::new(TestStatusSource::new().with(broker.clone(), Behavior::Never));
    let watcher = watcher(Arc::clone(&source), 300, PollStrategy::Sequential);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = watcher
        .wait_for_all_ready(&[broker.clone()], &cancel)
        .await
        .unwrap_err();
    assert!(err.is_cancelled());
    assert_eq!(source.calls(&broker).await, 0);
}

// =============================================================================
// 파일 기반 상태 소스 (실제 I/O, 실시간)
// =============================================================================

fn write_snapshot(path: &std::path::Path, reference: &ResourceReference, status: ResourceStatus) {
    let entries = vec![relaycheck_readiness::StatusEntry {
        reference: reference.clone(),
        status,
    }];
    let staging = path.with_extension("tmp");
    std::fs::write(&staging, serde_json::to_string(&entries).unwrap()).unwrap();
    std::fs::rename(&staging, path).unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn file_source_ready_before_deadline_is_seen_by_last_poll() {
    let trigger = knative("Trigger", "late");
    let config = WatcherConfigBuilder::new()
        .poll_interval(Duration::from_millis(300))
        .per_resource_timeout(Duration::from_millis(300))
        .build()
        .unwrap();

    for _ in 0..5 {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("status.json");
        write_snapshot(&path, &trigger, ResourceStatus::pending());

        let writer_path = path.clone();
        let writer_ref = trigger.clone();
        let writer = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            write_snapshot(&writer_path, &writer_ref, ResourceStatus::ready());
        });

        let watcher = ReadinessWatcher::new(
            Arc::new(relaycheck_readiness::FileStatusSource::new(&path)),
            config.clone(),
        );
        let outcome = watcher
            .wait_for_ready_or_done(&trigger, &CancellationToken::new())
            .await
            .expect("ready snapshot must be seen by the poll at the deadline");
        assert_eq!(outcome.outcome, ReadinessOutcome::Ready);
        assert_eq!(outcome.polls, 2);
        writer.await.unwrap();
    }
}
