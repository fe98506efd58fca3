//! 설정 관리 -- relaycheck.toml 파싱 및 런타임 설정
//!
//! [`RelaycheckConfig`]는 감시기, 검증기, 협력자 소스 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`RELAYCHECK_DELIVERY_EXPECTED_COUNT=5` 형식)
//! 3. 설정 파일 (`relaycheck.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), relaycheck_core::error::RelaycheckError> {
//! use relaycheck_core::config::RelaycheckConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = RelaycheckConfig::load("relaycheck.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = RelaycheckConfig::parse("[delivery]\nexpected_count = 10")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, RelaycheckError};
use crate::types::OriginRef;

/// 설정 상한값 상수
const MAX_POLL_INTERVAL_MS: u64 = 60_000;
const MAX_PER_RESOURCE_TIMEOUT_SECS: u64 = 3600;
const MAX_SETTLING_DELAY_SECS: u64 = 3600;
const MAX_STABLE_POLLS: u32 = 100;

/// relaycheck 통합 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelaycheckConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 준비 상태 감시 설정
    #[serde(default)]
    pub readiness: ReadinessConfig,
    /// 전달 검증 설정
    #[serde(default)]
    pub delivery: DeliveryConfig,
    /// 협력자 소스 설정
    #[serde(default)]
    pub sources: SourcesConfig,
    /// 메트릭 내보내기 설정
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl RelaycheckConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, RelaycheckError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, RelaycheckError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                RelaycheckError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                RelaycheckError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, RelaycheckError> {
        toml::from_str(toml_str).map_err(|e| {
            RelaycheckError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `RELAYCHECK_{SECTION}_{FIELD}`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "RELAYCHECK_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "RELAYCHECK_GENERAL_LOG_FORMAT");

        // Readiness
        override_u64(
            &mut self.readiness.poll_interval_ms,
            "RELAYCHECK_READINESS_POLL_INTERVAL_MS",
        );
        override_u64(
            &mut self.readiness.per_resource_timeout_secs,
            "RELAYCHECK_READINESS_PER_RESOURCE_TIMEOUT_SECS",
        );
        override_string(
            &mut self.readiness.platform_domain,
            "RELAYCHECK_READINESS_PLATFORM_DOMAIN",
        );
        override_string(&mut self.readiness.strategy, "RELAYCHECK_READINESS_STRATEGY");

        // Delivery
        override_usize(
            &mut self.delivery.expected_count,
            "RELAYCHECK_DELIVERY_EXPECTED_COUNT",
        );
        override_string(
            &mut self.delivery.observer_prefix,
            "RELAYCHECK_DELIVERY_OBSERVER_PREFIX",
        );
        override_string(
            &mut self.delivery.observer_identity,
            "RELAYCHECK_DELIVERY_OBSERVER_IDENTITY",
        );
        override_u64(
            &mut self.delivery.settling_delay_secs,
            "RELAYCHECK_DELIVERY_SETTLING_DELAY_SECS",
        );
        override_string(
            &mut self.delivery.settle_strategy,
            "RELAYCHECK_DELIVERY_SETTLE_STRATEGY",
        );
        override_u64(
            &mut self.delivery.stable_poll_interval_ms,
            "RELAYCHECK_DELIVERY_STABLE_POLL_INTERVAL_MS",
        );
        override_u32(
            &mut self.delivery.stable_polls,
            "RELAYCHECK_DELIVERY_STABLE_POLLS",
        );
        override_string(&mut self.delivery.match_mode, "RELAYCHECK_DELIVERY_MATCH_MODE");
        override_string(&mut self.delivery.origin_kind, "RELAYCHECK_DELIVERY_ORIGIN_KIND");
        override_string(&mut self.delivery.origin_name, "RELAYCHECK_DELIVERY_ORIGIN_NAME");
        override_string(
            &mut self.delivery.origin_api_version,
            "RELAYCHECK_DELIVERY_ORIGIN_API_VERSION",
        );

        // Sources
        override_string(&mut self.sources.status_file, "RELAYCHECK_SOURCES_STATUS_FILE");
        override_string(
            &mut self.sources.observations_file,
            "RELAYCHECK_SOURCES_OBSERVATIONS_FILE",
        );

        // Metrics
        override_bool(&mut self.metrics.enabled, "RELAYCHECK_METRICS_ENABLED");
        override_string(&mut self.metrics.textfile, "RELAYCHECK_METRICS_TEXTFILE");
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), RelaycheckError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(invalid(
                "general.log_level",
                format!("must be one of: {}", valid_levels.join(", ")),
            ));
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(invalid(
                "general.log_format",
                format!("must be one of: {}", valid_formats.join(", ")),
            ));
        }

        if self.readiness.poll_interval_ms == 0
            || self.readiness.poll_interval_ms > MAX_POLL_INTERVAL_MS
        {
            return Err(invalid(
                "readiness.poll_interval_ms",
                format!("must be 1-{MAX_POLL_INTERVAL_MS}"),
            ));
        }

        if self.readiness.per_resource_timeout_secs == 0
            || self.readiness.per_resource_timeout_secs > MAX_PER_RESOURCE_TIMEOUT_SECS
        {
            return Err(invalid(
                "readiness.per_resource_timeout_secs",
                format!("must be 1-{MAX_PER_RESOURCE_TIMEOUT_SECS}"),
            ));
        }

        let valid_strategies = ["concurrent", "sequential"];
        if !valid_strategies.contains(&self.readiness.strategy.as_str()) {
            return Err(invalid(
                "readiness.strategy",
                format!("must be one of: {}", valid_strategies.join(", ")),
            ));
        }

        if self.delivery.settling_delay_secs > MAX_SETTLING_DELAY_SECS {
            return Err(invalid(
                "delivery.settling_delay_secs",
                format!("must be 0-{MAX_SETTLING_DELAY_SECS}"),
            ));
        }

        let valid_settle = ["fixed", "until_stable"];
        if !valid_settle.contains(&self.delivery.settle_strategy.as_str()) {
            return Err(invalid(
                "delivery.settle_strategy",
                format!("must be one of: {}", valid_settle.join(", ")),
            ));
        }

        if self.delivery.settle_strategy == "until_stable" {
            if self.delivery.stable_poll_interval_ms == 0 {
                return Err(invalid(
                    "delivery.stable_poll_interval_ms",
                    "must be greater than 0 when settle_strategy is until_stable",
                ));
            }
            if self.delivery.stable_polls == 0 || self.delivery.stable_polls > MAX_STABLE_POLLS {
                return Err(invalid(
                    "delivery.stable_polls",
                    format!("must be 1-{MAX_STABLE_POLLS}"),
                ));
            }
        }

        let valid_modes = ["exact", "at_least"];
        if !valid_modes.contains(&self.delivery.match_mode.as_str()) {
            return Err(invalid(
                "delivery.match_mode",
                format!("must be one of: {}", valid_modes.join(", ")),
            ));
        }

        if self.delivery.observer_identity.is_empty() && self.delivery.observer_prefix.is_empty() {
            return Err(invalid(
                "delivery.observer_prefix",
                "observer_prefix must not be empty when observer_identity is unset",
            ));
        }

        if self.delivery.origin_kind.is_empty() || self.delivery.origin_name.is_empty() {
            return Err(invalid(
                "delivery.origin_kind",
                "origin kind and name must not be empty",
            ));
        }

        if self.metrics.enabled && self.metrics.textfile.is_empty() {
            return Err(invalid(
                "metrics.textfile",
                "must not be empty when metrics are enabled",
            ));
        }

        Ok(())
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> RelaycheckError {
    ConfigError::InvalidValue {
        field: field.to_owned(),
        reason: reason.into(),
    }
    .into()
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "pretty".to_owned(),
        }
    }
}

/// 준비 상태 감시 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadinessConfig {
    /// 폴링 주기 (밀리초)
    pub poll_interval_ms: u64,
    /// 리소스별 타임아웃 (초)
    pub per_resource_timeout_secs: u64,
    /// 폴링 대상 API 그룹 도메인
    pub platform_domain: String,
    /// 폴링 전략 (concurrent, sequential)
    pub strategy: String,
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1000,
            per_resource_timeout_secs: 300,
            platform_domain: "knative.dev".to_owned(),
            strategy: "concurrent".to_owned(),
        }
    }
}

impl ReadinessConfig {
    /// 폴링 주기
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// 리소스별 타임아웃
    pub fn per_resource_timeout(&self) -> Duration {
        Duration::from_secs(self.per_resource_timeout_secs)
    }
}

/// 전달 검증 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryConfig {
    /// 기대 전달 개수
    pub expected_count: usize,
    /// 관찰자 식별자 접두어 (네임스페이스와 결합)
    pub observer_prefix: String,
    /// 관찰자 식별자 직접 지정 (비어 있으면 접두어 + 네임스페이스)
    pub observer_identity: String,
    /// 정착 대기 시간 (초)
    pub settling_delay_secs: u64,
    /// 정착 전략 (fixed, until_stable)
    pub settle_strategy: String,
    /// until_stable 폴링 주기 (밀리초)
    pub stable_poll_interval_ms: u64,
    /// until_stable에서 같은 개수가 연속으로 관측되어야 하는 횟수
    pub stable_polls: u32,
    /// 개수 비교 모드 (exact, at_least)
    pub match_mode: String,
    /// 조회 범위 출처 kind
    pub origin_kind: String,
    /// 조회 범위 출처 이름
    pub origin_name: String,
    /// 조회 범위 출처 API 버전
    pub origin_api_version: String,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            expected_count: 5,
            observer_prefix: "recorder-".to_owned(),
            observer_identity: String::new(),
            settling_delay_secs: 60,
            settle_strategy: "fixed".to_owned(),
            stable_poll_interval_ms: 2000,
            stable_polls: 3,
            match_mode: "exact".to_owned(),
            origin_kind: "Namespace".to_owned(),
            origin_name: "default".to_owned(),
            origin_api_version: "v1".to_owned(),
        }
    }
}

impl DeliveryConfig {
    /// 정착 대기 시간
    pub fn settling_delay(&self) -> Duration {
        Duration::from_secs(self.settling_delay_secs)
    }

    /// 조회 범위 출처 참조
    pub fn origin(&self) -> OriginRef {
        OriginRef::new(
            self.origin_kind.clone(),
            self.origin_name.clone(),
            self.origin_api_version.clone(),
        )
    }

    /// 네임스페이스에 대한 관찰자 식별자를 결정합니다.
    ///
    /// `observer_identity`가 지정되어 있으면 그대로, 아니면
    /// `observer_prefix + namespace`를 반환합니다.
    pub fn observer_for(&self, namespace: &str) -> String {
        if self.observer_identity.is_empty() {
            format!("{}{}", self.observer_prefix, namespace)
        } else {
            self.observer_identity.clone()
        }
    }
}

/// 협력자 소스 설정 (파일 기반 상태 스냅샷과 관측 내보내기)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    /// 리소스 상태 스냅샷 JSON 파일 경로
    pub status_file: String,
    /// 관측 이벤트 내보내기 파일 경로 (JSON 배열 또는 JSON lines)
    pub observations_file: String,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            status_file: "status.json".to_owned(),
            observations_file: "observations.json".to_owned(),
        }
    }
}

/// 메트릭 내보내기 설정
///
/// 실행이 끝나면 Prometheus 텍스트 형식으로 `textfile`에 기록합니다
/// (node_exporter textfile collector 등에서 수집).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// 메트릭 기록 활성화
    pub enabled: bool,
    /// Prometheus 텍스트 파일 경로
    pub textfile: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            textfile: "relaycheck.prom".to_owned(),
        }
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_usize(target: &mut usize, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<usize>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse usize from env var, ignoring"
            ),
        }
    }
}

fn override_u32(target: &mut u32, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u32>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u32 from env var, ignoring"
            ),
        }
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u64 from env var, ignoring"
            ),
        }
    }
}
