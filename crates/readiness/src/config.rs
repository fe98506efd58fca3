//! 준비 상태 감시기 설정
//!
//! [`WatcherConfig`]는 core의 [`ReadinessConfig`](relaycheck_core::config::ReadinessConfig)를
//! 기반으로 감시기 전용 설정을 제공합니다.
//!
//! # 사용 예시
//! ```ignore
//! use relaycheck_core::config::RelaycheckConfig;
//! use relaycheck_readiness::config::WatcherConfig;
//!
//! let core_config = RelaycheckConfig::default();
//! let config = WatcherConfig::from_core(&core_config.readiness)?;
//! ```

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use relaycheck_core::config::ReadinessConfig;

use crate::error::ReadinessError;

/// 여러 리소스를 기다리는 방식
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PollStrategy {
    /// 모든 리소스를 동시에 폴링 (기본값)
    #[default]
    Concurrent,
    /// 입력 순서대로 하나씩 폴링
    Sequential,
}

impl FromStr for PollStrategy {
    type Err = ReadinessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "concurrent" => Ok(Self::Concurrent),
            "sequential" => Ok(Self::Sequential),
            other => Err(ReadinessError::Config {
                field: "strategy".to_owned(),
                reason: format!("unknown strategy '{other}', must be concurrent or sequential"),
            }),
        }
    }
}

impl fmt::Display for PollStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Concurrent => f.write_str("concurrent"),
            Self::Sequential => f.write_str("sequential"),
        }
    }
}

/// 준비 상태 감시기 설정
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatcherConfig {
    /// 폴링 주기
    pub poll_interval: Duration,
    /// 리소스별 타임아웃
    pub per_resource_timeout: Duration,
    /// 폴링 대상 API 그룹 도메인 (빈 문자열이면 모든 리소스)
    pub platform_domain: String,
    /// 폴링 전략
    pub strategy: PollStrategy,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            per_resource_timeout: Duration::from_secs(300),
            platform_domain: "knative.dev".to_owned(),
            strategy: PollStrategy::Concurrent,
        }
    }
}

impl WatcherConfig {
    /// core의 `ReadinessConfig`에서 감시기 설정을 생성합니다.
    pub fn from_core(core: &ReadinessConfig) -> Result<Self, ReadinessError> {
        let config = Self {
            poll_interval: core.poll_interval(),
            per_resource_timeout: core.per_resource_timeout(),
            platform_domain: core.platform_domain.clone(),
            strategy: core.strategy.parse()?,
        };
        config.validate()?;
        Ok(config)
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), ReadinessError> {
        if self.poll_interval.is_zero() {
            return Err(ReadinessError::Config {
                field: "poll_interval".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }

        if self.per_resource_timeout.is_zero() {
            return Err(ReadinessError::Config {
                field: "per_resource_timeout".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }

        Ok(())
    }
}

/// 감시기 설정 빌더
#[derive(Default)]
pub struct WatcherConfigBuilder {
    config: WatcherConfig,
}

impl WatcherConfigBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 폴링 주기를 설정합니다.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll_interval = interval;
        self
    }

    /// 리소스별 타임아웃을 설정합니다.
    pub fn per_resource_timeout(mut self, timeout: Duration) -> Self {
        self.config.per_resource_timeout = timeout;
        self
    }

    /// 플랫폼 도메인을 설정합니다.
    pub fn platform_domain(mut self, domain: impl Into<String>) -> Self {
        self.config.platform_domain = domain.into();
        self
    }

    /// 폴링 전략을 설정합니다.
    pub fn strategy(mut self, strategy: PollStrategy) -> Self {
        self.config.strategy = strategy;
        self
    }

    /// 설정을 검증하고 `WatcherConfig`를 생성합니다.
    pub fn build(self) -> Result<WatcherConfig, ReadinessError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        WatcherConfig::default().validate().unwrap();
    }

    #[test]
    fn default_matches_core_defaults() {
        let from_core = WatcherConfig::from_core(&ReadinessConfig::default()).unwrap();
        assert_eq!(from_core, WatcherConfig::default());
    }

    #[test]
    fn from_core_preserves_values() {
        let core = ReadinessConfig {
            poll_interval_ms: 250,
            per_resource_timeout_secs: 30,
            platform_domain: "example.io".to_owned(),
            strategy: "sequential".to_owned(),
        };
        let config = WatcherConfig::from_core(&core).unwrap();
        assert_eq!(config.poll_interval, Duration::from_millis(250));
        assert_eq!(config.per_resource_timeout, Duration::from_secs(30));
        assert_eq!(config.platform_domain, "example.io");
        assert_eq!(config.strategy, PollStrategy::Sequential);
    }

    #[test]
    fn from_core_rejects_unknown_strategy() {
        let core = ReadinessConfig {
            strategy: "parallel".to_owned(),
            ..ReadinessConfig::default()
        };
        let err = WatcherConfig::from_core(&core).unwrap_err();
        assert!(err.to_string().contains("parallel"));
    }

    #[test]
    fn builder_rejects_zero_interval() {
        let result = WatcherConfigBuilder::new()
            .poll_interval(Duration::ZERO)
            .build();
        assert!(matches!(result, Err(ReadinessError::Config { field, .. }) if field == "poll_interval"));
    }

    #[test]
    fn builder_rejects_zero_timeout() {
        let result = WatcherConfigBuilder::new()
            .per_resource_timeout(Duration::ZERO)
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn builder_sets_all_fields() {
        let config = WatcherConfigBuilder::new()
            .poll_interval(Duration::from_millis(100))
            .per_resource_timeout(Duration::from_secs(5))
            .platform_domain("")
            .strategy(PollStrategy::Sequential)
            .build()
            .unwrap();
        assert_eq!(config.poll_interval, Duration::from_millis(100));
        assert_eq!(config.per_resource_timeout, Duration::from_secs(5));
        assert!(config.platform_domain.is_empty());
        assert_eq!(config.strategy, PollStrategy::Sequential);
    }

    #[test]
    fn strategy_round_trips_through_display() {
        for strategy in [PollStrategy::Concurrent, PollStrategy::Sequential] {
            assert_eq!(strategy.to_string().parse::<PollStrategy>().unwrap(), strategy);
        }
    }
}
