//! 메트릭 상수 및 설명 등록
//!
//! 모든 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 각 크레이트는 이 상수를 사용하여 `metrics::counter!()`, `metrics::gauge!()`,
//! `metrics::histogram!()` 매크로를 호출합니다. 레코더는 CLI가 `[metrics]`
//! 설정에 따라 설치하며(Prometheus 텍스트 파일), 설치되지 않으면 매크로
//! 호출은 아무 일도 하지 않습니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `relaycheck_`
//! - 모듈명: `readiness_`, `verifier_`, `run_`
//! - 접미어: `_total` (counter), `_seconds` (histogram), 없음 (gauge)

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 결과 레이블 키 (ready, done, timed_out, error / passed, failed, cancelled)
pub const LABEL_RESULT: &str = "result";

/// 리소스 종류 레이블 키
pub const LABEL_KIND: &str = "kind";

// ─── Readiness 메트릭 ──────────────────────────────────────────────

/// Readiness: 상태 조회 횟수 (counter, label: kind)
pub const READINESS_POLLS_TOTAL: &str = "relaycheck_readiness_polls_total";

/// Readiness: 일시적 조회 실패 횟수 (counter, label: kind)
pub const READINESS_POLL_ERRORS_TOTAL: &str = "relaycheck_readiness_poll_errors_total";

/// Readiness: 리소스별 수렴 결과 (counter, label: result)
pub const READINESS_OUTCOMES_TOTAL: &str = "relaycheck_readiness_outcomes_total";

/// Readiness: 리소스 하나가 수렴하기까지 걸린 시간 (histogram, 초)
pub const READINESS_WAIT_DURATION_SECONDS: &str = "relaycheck_readiness_wait_duration_seconds";

/// Readiness: 도메인 밖이라 건너뛴 참조 수 (counter)
pub const READINESS_SKIPPED_TOTAL: &str = "relaycheck_readiness_skipped_total";

// ─── Verifier 메트릭 ──────────────────────────────────────────────

/// Verifier: 관측 저장소 조회 횟수 (counter)
pub const VERIFIER_QUERIES_TOTAL: &str = "relaycheck_verifier_queries_total";

/// Verifier: 마지막 조회에서 필터를 통과한 관측 수 (gauge)
pub const VERIFIER_MATCHED_EVENTS: &str = "relaycheck_verifier_matched_events";

// ─── Run 메트릭 ──────────────────────────────────────────────────

/// Run: 종료된 실행 수 (counter, label: result)
pub const RUN_COMPLETED_TOTAL: &str = "relaycheck_run_completed_total";

/// Run: 실행 전체 소요 시간 (histogram, 초)
pub const RUN_DURATION_SECONDS: &str = "relaycheck_run_duration_seconds";

// ─── 설명 등록 함수 ─────────────────────────────────────────────────

/// 모든 메트릭의 설명(description)을 등록합니다.
///
/// 전역 레코더 설치 후 한 번만 호출해야 합니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_gauge, describe_histogram};

    describe_counter!(
        READINESS_POLLS_TOTAL,
        "Total number of resource status queries issued"
    );
    describe_counter!(
        READINESS_POLL_ERRORS_TOTAL,
        "Total number of transient status lookup failures"
    );
    describe_counter!(
        READINESS_OUTCOMES_TOTAL,
        "Per-resource readiness outcomes by result"
    );
    describe_histogram!(
        READINESS_WAIT_DURATION_SECONDS,
        "Time for a single resource to reach Ready or Done in seconds"
    );
    describe_counter!(
        READINESS_SKIPPED_TOTAL,
        "References skipped because they are outside the platform domain"
    );

    describe_counter!(
        VERIFIER_QUERIES_TOTAL,
        "Total number of observation store queries"
    );
    describe_gauge!(
        VERIFIER_MATCHED_EVENTS,
        "Observed events matching the run's observer identity in the last query"
    );

    describe_counter!(RUN_COMPLETED_TOTAL, "Completed verification runs by result");
    describe_histogram!(
        RUN_DURATION_SECONDS,
        "Wall-clock duration of a verification run in seconds"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metric_names_share_prefix() {
        let names = [
            READINESS_POLLS_TOTAL,
            READINESS_POLL_ERRORS_TOTAL,
            READINESS_OUTCOMES_TOTAL,
            READINESS_WAIT_DURATION_SECONDS,
            READINESS_SKIPPED_TOTAL,
            VERIFIER_QUERIES_TOTAL,
            VERIFIER_MATCHED_EVENTS,
            RUN_COMPLETED_TOTAL,
            RUN_DURATION_SECONDS,
        ];
        for name in names {
            assert!(name.starts_with("relaycheck_"), "{name}");
        }
    }

    #[test]
    fn describe_all_without_recorder_is_noop() {
        describe_all();
    }
}
