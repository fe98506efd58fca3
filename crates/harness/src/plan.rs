//! 실행 계획 -- 한 번의 검증 실행에 필요한 입력 전체
//!
//! 환경(네임스페이스와 리소스 참조), 감시기 설정, 기대값을 명시적으로
//! 묶어 전달합니다. 실행은 전역 상태를 읽지 않습니다.

use relaycheck_core::config::RelaycheckConfig;
use relaycheck_core::error::RelaycheckError;
use relaycheck_core::types::Environment;
use relaycheck_readiness::WatcherConfig;
use relaycheck_verifier::Expectation;

/// 검증 실행 계획
#[derive(Debug, Clone)]
pub struct RunPlan {
    /// 실행 식별자 (로그 상관관계용)
    pub run_id: String,
    /// 테스트 환경
    pub environment: Environment,
    /// 준비 상태 감시 설정
    pub watcher: WatcherConfig,
    /// 전달 검증 기대값
    pub expectation: Expectation,
}

impl RunPlan {
    /// 구성 요소로 실행 계획을 만듭니다. 실행 식별자는 새로 생성됩니다.
    pub fn new(environment: Environment, watcher: WatcherConfig, expectation: Expectation) -> Self {
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            environment,
            watcher,
            expectation,
        }
    }

    /// 전체 설정과 환경에서 실행 계획을 만듭니다.
    ///
    /// 관찰자 식별자는 `delivery.observer_identity`가 비어 있으면
    /// 환경의 네임스페이스에서 도출됩니다.
    pub fn from_config(
        config: &RelaycheckConfig,
        environment: Environment,
    ) -> Result<Self, RelaycheckError> {
        let watcher = WatcherConfig::from_core(&config.readiness)?;
        let expectation = Expectation::from_core(&config.delivery, &environment.namespace)?;
        Ok(Self::new(environment, watcher, expectation))
    }

    /// 실행 식별자를 지정합니다.
    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = run_id.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relaycheck_core::types::ResourceReference;

    fn environment() -> Environment {
        Environment::new(
            "ns-123",
            vec![ResourceReference::new(
                "Broker",
                "eventing.knative.dev/v1",
                "default",
                "ns-123",
            )],
        )
    }

    #[test]
    fn from_config_derives_observer_from_namespace() {
        let plan = RunPlan::from_config(&RelaycheckConfig::default(), environment()).unwrap();
        assert_eq!(plan.expectation.observer.as_str(), "recorder-ns-123");
        assert_eq!(plan.expectation.expected_count, 5);
        assert_eq!(plan.environment.references.len(), 1);
    }

    #[test]
    fn run_ids_are_unique() {
        let a = RunPlan::from_config(&RelaycheckConfig::default(), environment()).unwrap();
        let b = RunPlan::from_config(&RelaycheckConfig::default(), environment()).unwrap();
        assert_ne!(a.run_id, b.run_id);
    }

    #[test]
    fn with_run_id_overrides() {
        let plan = RunPlan::from_config(&RelaycheckConfig::default(), environment())
            .unwrap()
            .with_run_id("run-1");
        assert_eq!(plan.run_id, "run-1");
    }

    #[test]
    fn invalid_readiness_strategy_is_config_error() {
        let mut config = RelaycheckConfig::default();
        config.readiness.strategy = "parallel".to_owned();
        let err = RunPlan::from_config(&config, environment()).unwrap_err();
        assert!(matches!(err, RelaycheckError::Config(_)));
    }

    #[test]
    fn invalid_match_mode_is_config_error() {
        let mut config = RelaycheckConfig::default();
        config.delivery.match_mode = "fuzzy".to_owned();
        let err = RunPlan::from_config(&config, environment()).unwrap_err();
        assert!(matches!(err, RelaycheckError::Config(_)));
    }
}
