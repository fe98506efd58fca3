//! 실행별 기대값 -- 기대 개수, 관찰자 식별자, 조회 범위, 정착 전략
//!
//! [`Expectation`]은 실행마다 한 번 만들어지고 실행 동안 바뀌지 않습니다.

use std::fmt;

use serde::{Deserialize, Serialize};

use relaycheck_core::config::DeliveryConfig;
use relaycheck_core::types::OriginRef;

use crate::error::VerifierError;
use crate::filter::ObservationFilter;
use crate::result::MatchMode;
use crate::settle::SettleStrategy;

/// 기본 관찰자 식별자 접두어
pub const DEFAULT_OBSERVER_PREFIX: &str = "recorder-";

/// 레코더가 받은 이벤트에 붙는 관찰자 식별자
///
/// 실행 네임스페이스에서 결정적으로 도출되므로 인프라를 공유하는
/// 동시 실행끼리 개수가 섞이지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObserverIdentity(String);

impl ObserverIdentity {
    /// 식별자를 그대로 사용합니다.
    pub fn new(identity: impl Into<String>) -> Self {
        Self(identity.into())
    }

    /// 기본 접두어로 네임스페이스에서 식별자를 도출합니다. (`recorder-{namespace}`)
    pub fn for_namespace(namespace: &str) -> Self {
        Self::with_prefix(DEFAULT_OBSERVER_PREFIX, namespace)
    }

    /// 주어진 접두어로 네임스페이스에서 식별자를 도출합니다.
    pub fn with_prefix(prefix: &str, namespace: &str) -> Self {
        Self(format!("{prefix}{namespace}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObserverIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ObserverIdentity {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// 전달 검증 기대값
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expectation {
    /// 기대 전달 개수
    pub expected_count: usize,
    /// 집계할 관찰자
    pub observer: ObserverIdentity,
    /// 조회 범위
    pub origin: OriginRef,
    /// 정착 전략
    pub settle: SettleStrategy,
    /// 개수 비교 모드
    pub match_mode: MatchMode,
}

impl Expectation {
    /// 기본 범위(`Namespace/default`), 60초 고정 정착, 정확 일치로 기대값을 만듭니다.
    pub fn new(observer: ObserverIdentity, expected_count: usize) -> Self {
        Self {
            expected_count,
            observer,
            origin: OriginRef::namespace("default"),
            settle: SettleStrategy::default(),
            match_mode: MatchMode::Exact,
        }
    }

    /// 조회 범위를 지정합니다.
    pub fn with_origin(mut self, origin: OriginRef) -> Self {
        self.origin = origin;
        self
    }

    /// 정착 전략을 지정합니다.
    pub fn with_settle(mut self, settle: SettleStrategy) -> Self {
        self.settle = settle;
        self
    }

    /// 비교 모드를 지정합니다.
    pub fn with_match_mode(mut self, match_mode: MatchMode) -> Self {
        self.match_mode = match_mode;
        self
    }

    /// core 설정과 실행 네임스페이스에서 기대값을 만듭니다.
    ///
    /// `observer_identity`가 비어 있으면 `observer_prefix + namespace`를 사용합니다.
    pub fn from_core(config: &DeliveryConfig, namespace: &str) -> Result<Self, VerifierError> {
        if config.observer_identity.is_empty() && namespace.is_empty() {
            return Err(VerifierError::Config {
                field: "namespace".to_owned(),
                reason: "required to derive the observer identity".to_owned(),
            });
        }
        let observer = ObserverIdentity::new(config.observer_for(namespace));

        Ok(Self {
            expected_count: config.expected_count,
            observer,
            origin: config.origin(),
            settle: SettleStrategy::from_core(config)?,
            match_mode: config.match_mode.parse()?,
        })
    }

    /// 저장소 조회용 필터
    pub fn filter(&self) -> ObservationFilter {
        ObservationFilter::new()
            .observer(self.observer.as_str())
            .origin(self.origin.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn observer_identity_derives_from_namespace() {
        assert_eq!(
            ObserverIdentity::for_namespace("ns-123").as_str(),
            "recorder-ns-123"
        );
        assert_eq!(
            ObserverIdentity::with_prefix("sink-", "ns-123").to_string(),
            "sink-ns-123"
        );
    }

    #[test]
    fn distinct_namespaces_yield_distinct_observers() {
        assert_ne!(
            ObserverIdentity::for_namespace("ns-1"),
            ObserverIdentity::for_namespace("ns-2")
        );
    }

    #[test]
    fn from_core_uses_defaults() {
        let expectation = Expectation::from_core(&DeliveryConfig::default(), "ns-123").unwrap();
        assert_eq!(expectation.expected_count, 5);
        assert_eq!(expectation.observer.as_str(), "recorder-ns-123");
        assert_eq!(expectation.origin, OriginRef::namespace("default"));
        assert_eq!(expectation.settle, SettleStrategy::Fixed(Duration::from_secs(60)));
        assert_eq!(expectation.match_mode, MatchMode::Exact);
    }

    #[test]
    fn explicit_identity_overrides_derivation() {
        let config = DeliveryConfig {
            observer_identity: "shared-recorder".to_owned(),
            ..DeliveryConfig::default()
        };
        let expectation = Expectation::from_core(&config, "ns-123").unwrap();
        assert_eq!(expectation.observer.as_str(), "shared-recorder");
    }

    #[test]
    fn from_core_agrees_with_config_derivation() {
        let config = DeliveryConfig {
            observer_prefix: "sink-".to_owned(),
            ..DeliveryConfig::default()
        };
        let expectation = Expectation::from_core(&config, "ns-9").unwrap();
        assert_eq!(expectation.observer.as_str(), config.observer_for("ns-9"));
    }

    #[test]
    fn explicit_identity_does_not_need_namespace() {
        let config = DeliveryConfig {
            observer_identity: "shared-recorder".to_owned(),
            ..DeliveryConfig::default()
        };
        let expectation = Expectation::from_core(&config, "").unwrap();
        assert_eq!(expectation.observer.as_str(), "shared-recorder");
    }

    #[test]
    fn derivation_requires_namespace() {
        let err = Expectation::from_core(&DeliveryConfig::default(), "").unwrap_err();
        assert!(matches!(err, VerifierError::Config { .. }));
    }

    #[test]
    fn from_core_rejects_unknown_match_mode() {
        let config = DeliveryConfig {
            match_mode: "fuzzy".to_owned(),
            ..DeliveryConfig::default()
        };
        assert!(Expectation::from_core(&config, "ns-123").is_err());
    }

    #[test]
    fn filter_scopes_observer_and_origin() {
        let expectation = Expectation::new(ObserverIdentity::for_namespace("ns-123"), 5);
        let filter = expectation.filter();
        assert_eq!(filter.observer.as_deref(), Some("recorder-ns-123"));
        assert_eq!(filter.origin, Some(OriginRef::namespace("default")));
    }

    #[test]
    fn identity_serializes_as_plain_string() {
        let json = serde_json::to_string(&ObserverIdentity::for_namespace("ns-123")).unwrap();
        assert_eq!(json, "\"recorder-ns-123\"");
    }
}
