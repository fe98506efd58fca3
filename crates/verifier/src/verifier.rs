//! 전달 검증기 -- 정착 대기 후 관측을 조회하고 기대 개수와 비교합니다.
//!
//! # 처리 흐름
//! 1. [`settle`](DeliveryVerifier::settle): 정착 전략에 따라 대기
//! 2. [`collect`](DeliveryVerifier::collect): 저장소를 한 번 조회하고 필터를 다시 적용,
//!    모든 관측을 진단 로그로 남긴 뒤 결과를 계산
//! 3. [`verify`](DeliveryVerifier::verify): 1, 2를 수행하고 불일치를 에러로 반환
//!
//! 조회 실패는 재시도하지 않고 그대로 실패합니다. 모든 대기 지점에서
//! 취소 토큰을 확인합니다.

use std::sync::Arc;

use metrics::{counter, gauge};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use relaycheck_core::metrics as m;

use crate::error::VerifierError;
use crate::expectation::Expectation;
use crate::result::VerificationResult;
use crate::settle::{self, SettleReport};
use crate::store::ObservationStore;

/// 전달 검증기
pub struct DeliveryVerifier<S: ObservationStore> {
    store: Arc<S>,
}

impl<S: ObservationStore> DeliveryVerifier<S> {
    /// 새 검증기를 생성합니다.
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// 관측 저장소 참조
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// 정착 전략에 따라 대기합니다.
    pub async fn settle(
        &self,
        expectation: &Expectation,
        cancel: &CancellationToken,
    ) -> Result<SettleReport, VerifierError> {
        settle::settle(
            expectation.settle,
            self.store.as_ref(),
            &expectation.filter(),
            cancel,
        )
        .await
    }

    /// 관측을 조회하여 결과를 계산합니다.
    ///
    /// 개수 불일치는 에러가 아니라 `passed = false`인 결과로 반환됩니다.
    pub async fn collect(
        &self,
        expectation: &Expectation,
        cancel: &CancellationToken,
    ) -> Result<VerificationResult, VerifierError> {
        let filter = expectation.filter();
        info!(filter = %filter, "querying observation store");

        let events = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(VerifierError::Cancelled("query")),
            r = self.store.query(&filter) => r,
        };
        counter!(m::VERIFIER_QUERIES_TOTAL).increment(1);

        let events = match events {
            Ok(events) => events,
            Err(err) => {
                warn!(error = %err, "observation query failed");
                return Err(err);
            }
        };

        let returned = events.len();
        let matched = filter.apply(events);
        if matched.len() != returned {
            info!(
                returned,
                matched = matched.len(),
                "store returned observations outside the filter, ignoring them"
            );
        }
        gauge!(m::VERIFIER_MATCHED_EVENTS).set(matched.len() as f64);

        for (index, event) in matched.iter().enumerate() {
            info!(
                index,
                observer = %event.observer,
                origin = %event.origin,
                payload = %event.event,
                "observed event"
            );
        }

        let result = VerificationResult::evaluate(
            expectation.observer.as_str(),
            expectation.expected_count,
            expectation.match_mode,
            matched,
        );

        if result.passed {
            info!(
                observer = %result.observer,
                expected = result.expected,
                actual = result.actual,
                match_mode = %result.match_mode,
                "delivery verified"
            );
        } else {
            warn!(
                observer = %result.observer,
                expected = result.expected,
                actual = result.actual,
                match_mode = %result.match_mode,
                "delivery count mismatch"
            );
        }

        Ok(result)
    }

    /// 정착 대기 후 조회하고, 불일치이면 `CountMismatch`를 반환합니다.
    pub async fn verify(
        &self,
        expectation: &Expectation,
        cancel: &CancellationToken,
    ) -> Result<VerificationResult, VerifierError> {
        self.settle(expectation, cancel).await?;
        self.collect(expectation, cancel).await?.ensure_passed()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::expectation::ObserverIdentity;
    use crate::result::MatchMode;
    use crate::settle::SettleStrategy;
    use crate::store::MockObservationStore;
    use relaycheck_core::types::{ObservedEvent, OriginRef};
    use serde_json::json;
    use tokio::time::Instant;

    fn events(observer: &str, n: usize) -> Vec<ObservedEvent> {
        (0..n)
            .map(|i| {
                ObservedEvent::new(
                    observer,
                    OriginRef::namespace("default"),
                    json!({"id": format!("{i}")}),
                )
            })
            .collect()
    }

    fn expectation(expected: usize) -> Expectation {
        Expectation::new(ObserverIdentity::for_namespace("ns-123"), expected)
            .with_settle(SettleStrategy::Fixed(Duration::from_secs(60)))
    }

    #[tokio::test(start_paused = true)]
    async fn exact_count_passes() {
        let store = Arc::new(MockObservationStore::new(events("recorder-ns-123", 5)));
        let verifier = DeliveryVerifier::new(Arc::clone(&store));

        let start = Instant::now();
        let result = verifier
            .verify(&expectation(5), &CancellationToken::new())
            .await
            .unwrap();
        assert!(result.passed);
        assert_eq!(result.actual, 5);
        assert_eq!(start.elapsed(), Duration::from_secs(60));
        assert_eq!(store.queries(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn missing_event_is_mismatch() {
        let store = Arc::new(MockObservationStore::new(events("recorder-ns-123", 4)));
        let verifier = DeliveryVerifier::new(store);

        let err = verifier
            .verify(&expectation(5), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            VerifierError::CountMismatch {
                expected: 5,
                actual: 4,
                ..
            }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn duplicate_event_is_mismatch_in_exact_mode() {
        let store = Arc::new(MockObservationStore::new(events("recorder-ns-123", 6)));
        let verifier = DeliveryVerifier::new(store);

        let result = verifier
            .collect(&expectation(5), &CancellationToken::new())
            .await
            .unwrap();
        assert!(!result.passed);
        assert_eq!(result.actual, 6);
    }

    #[tokio::test(start_paused = true)]
    async fn duplicate_event_passes_in_at_least_mode() {
        let store = Arc::new(MockObservationStore::new(events("recorder-ns-123", 6)));
        let verifier = DeliveryVerifier::new(store);

        let result = verifier
            .collect(
                &expectation(5).with_match_mode(MatchMode::AtLeast),
                &CancellationToken::new(),
            )
            .await
            .unwrap();
        assert!(result.passed);
    }

    #[tokio::test(start_paused = true)]
    async fn superset_from_store_is_filtered_again() {
        let mut all = events("recorder-ns-123", 5);
        all.extend(events("recorder-other", 2));
        let store = Arc::new(MockObservationStore::new(all));
        let verifier = DeliveryVerifier::new(store);

        let result = verifier
            .collect(&expectation(5), &CancellationToken::new())
            .await
            .unwrap();
        assert!(result.passed);
        assert!(result.events.iter().all(|e| e.observer == "recorder-ns-123"));
    }

    #[tokio::test(start_paused = true)]
    async fn query_error_is_not_retried() {
        let store = Arc::new(MockObservationStore::failing("connection refused"));
        let verifier = DeliveryVerifier::new(Arc::clone(&store));

        let err = verifier
            .verify(&expectation(5), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, VerifierError::Query(_)));
        assert_eq!(store.queries(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_before_query_issues_no_query() {
        let store = Arc::new(MockObservationStore::new(events("recorder-ns-123", 5)));
        let verifier = DeliveryVerifier::new(Arc::clone(&store));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = verifier.collect(&expectation(5), &cancel).await.unwrap_err();
        assert!(matches!(err, VerifierError::Cancelled("query")));
        assert_eq!(store.queries(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn until_stable_settles_early_then_queries_once_more() {
        let store = Arc::new(MockObservationStore::scripted(vec![
            Ok(events("recorder-ns-123", 3)),
            Ok(events("recorder-ns-123", 5)),
            Ok(events("recorder-ns-123", 5)),
        ]));
        let verifier = DeliveryVerifier::new(Arc::clone(&store));
        let expectation = expectation(5).with_settle(SettleStrategy::UntilStable {
            interval: Duration::from_secs(1),
            stable_polls: 2,
            max_wait: Duration::from_secs(60),
        });

        let start = Instant::now();
        let result = verifier
            .verify(&expectation, &CancellationToken::new())
            .await
            .unwrap();
        assert!(result.passed);
        assert_eq!(start.elapsed(), Duration::from_secs(2));
        assert_eq!(store.queries(), 4);
    }
}
