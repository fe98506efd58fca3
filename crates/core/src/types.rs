//! 도메인 타입 -- 감시기와 검증기가 공유하는 데이터 구조
//!
//! 리소스 참조와 상태는 준비 상태 감시에, 관측 이벤트와 출처 참조는
//! 전달 검증에 사용됩니다. 이 크레이트는 어떤 타입도 생성/삭제하지 않으며
//! 외부 협력자가 만든 값을 읽기만 합니다.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::RelaycheckError;

/// 완료(Done) 상태로 간주하는 컨디션 타입
pub const DONE_CONDITION_TYPES: [&str; 4] = ["Succeeded", "Complete", "Completed", "Done"];

/// 준비(Ready) 컨디션 타입
pub const READY_CONDITION_TYPE: &str = "Ready";

/// 종료 실패를 나타내는 컨디션 타입
pub const FAILED_CONDITION_TYPE: &str = "Failed";

/// 테스트 대상 관리 리소스의 식별자
///
/// kind, API 버전(그룹/버전), 이름, 네임스페이스로 구성됩니다.
/// 외부 환경이 소유하며 이 하네스는 준비 상태 폴링에만 사용합니다.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceReference {
    /// 리소스 종류 (예: "Broker", "Trigger")
    pub kind: String,
    /// API 버전 (예: "eventing.knative.dev/v1")
    #[serde(alias = "apiVersion")]
    pub api_version: String,
    /// 리소스 이름
    pub name: String,
    /// 네임스페이스
    pub namespace: String,
}

impl ResourceReference {
    /// 새 리소스 참조를 생성합니다.
    pub fn new(
        kind: impl Into<String>,
        api_version: impl Into<String>,
        name: impl Into<String>,
        namespace: impl Into<String>,
    ) -> Self {
        Self {
            kind: kind.into(),
            api_version: api_version.into(),
            name: name.into(),
            namespace: namespace.into(),
        }
    }

    /// API 그룹을 반환합니다. core 그룹(`v1`)은 빈 문자열입니다.
    pub fn api_group(&self) -> &str {
        match self.api_version.rsplit_once('/') {
            Some((group, _)) => group,
            None => "",
        }
    }

    /// API 그룹이 주어진 플랫폼 도메인에 속하는지 확인합니다.
    ///
    /// `eventing.knative.dev/v1`은 `knative.dev`에 속하고,
    /// `v1`, `apps/v1`, `notknative.dev/v1`은 속하지 않습니다.
    /// 빈 도메인은 모든 참조를 허용합니다.
    pub fn belongs_to_domain(&self, domain: &str) -> bool {
        if domain.is_empty() {
            return true;
        }
        let group = self.api_group();
        group == domain
            || group
                .strip_suffix(domain)
                .is_some_and(|prefix| prefix.ends_with('.'))
    }
}

impl fmt::Display for ResourceReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}/{} ({})",
            self.kind, self.namespace, self.name, self.api_version
        )
    }
}

/// 컨디션 상태 값
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionStatus {
    True,
    False,
    #[default]
    Unknown,
}

impl fmt::Display for ConditionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::True => write!(f, "True"),
            Self::False => write!(f, "False"),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}

/// 리소스 상태 컨디션
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    /// 컨디션 타입 (예: "Ready", "Succeeded")
    #[serde(rename = "type")]
    pub condition_type: String,
    /// 컨디션 상태
    #[serde(default)]
    pub status: ConditionStatus,
    /// 기계 판독용 사유
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// 사람이 읽는 메시지
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Condition {
    /// 사유/메시지 없이 컨디션을 생성합니다.
    pub fn new(condition_type: impl Into<String>, status: ConditionStatus) -> Self {
        Self {
            condition_type: condition_type.into(),
            status,
            reason: None,
            message: None,
        }
    }

    /// 사유와 메시지를 지정합니다.
    pub fn with_reason(mut self, reason: impl Into<String>, message: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self.message = Some(message.into());
        self
    }

    fn is(&self, condition_type: &str, status: ConditionStatus) -> bool {
        self.condition_type == condition_type && self.status == status
    }
}

/// 리소스 상태 조회 결과
///
/// 상태 조회 협력자가 반환하는 값으로, 컨디션 목록에서
/// ready/done 여부를 판정합니다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceStatus {
    /// 보고된 컨디션 목록
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

impl ResourceStatus {
    /// 컨디션이 없는 (아직 준비되지 않은) 상태
    pub fn pending() -> Self {
        Self::default()
    }

    /// `Ready=True` 상태
    pub fn ready() -> Self {
        Self::default().with_condition(Condition::new(
            READY_CONDITION_TYPE,
            ConditionStatus::True,
        ))
    }

    /// `Succeeded=True` 상태
    pub fn done() -> Self {
        Self::default().with_condition(Condition::new("Succeeded", ConditionStatus::True))
    }

    /// 컨디션을 추가합니다.
    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// 타입으로 컨디션을 찾습니다.
    pub fn condition(&self, condition_type: &str) -> Option<&Condition> {
        self.conditions
            .iter()
            .find(|c| c.condition_type == condition_type)
    }

    /// `Ready` 컨디션이 `True`인지 확인합니다.
    pub fn is_ready(&self) -> bool {
        self.conditions
            .iter()
            .any(|c| c.is(READY_CONDITION_TYPE, ConditionStatus::True))
    }

    /// 완료 계열 컨디션 중 하나가 `True`인지 확인합니다.
    pub fn is_done(&self) -> bool {
        self.conditions.iter().any(|c| {
            DONE_CONDITION_TYPES
                .iter()
                .any(|t| c.is(t, ConditionStatus::True))
        })
    }

    /// 종료 실패 컨디션을 반환합니다.
    ///
    /// `Failed=True` 또는 `Succeeded=False`는 일회성 리소스가
    /// 실패로 끝났다는 뜻이며 다시 폴링해도 바뀌지 않습니다.
    pub fn terminal_failure(&self) -> Option<&Condition> {
        self.conditions.iter().find(|c| {
            c.is(FAILED_CONDITION_TYPE, ConditionStatus::True)
                || c.is("Succeeded", ConditionStatus::False)
        })
    }
}

/// 관측 이벤트의 출처 또는 조회 범위를 나타내는 참조
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OriginRef {
    /// 종류 (예: "Namespace")
    pub kind: String,
    /// 이름
    pub name: String,
    /// 네임스페이스 (클러스터 범위 객체는 없음)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// API 버전
    #[serde(alias = "apiVersion")]
    pub api_version: String,
}

impl OriginRef {
    /// 네임스페이스 없는 출처 참조를 생성합니다.
    pub fn new(
        kind: impl Into<String>,
        name: impl Into<String>,
        api_version: impl Into<String>,
    ) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
            namespace: None,
            api_version: api_version.into(),
        }
    }

    /// `Namespace` 객체를 가리키는 참조를 생성합니다.
    pub fn namespace(name: impl Into<String>) -> Self {
        Self::new("Namespace", name, "v1")
    }

    /// 네임스페이스를 지정합니다.
    pub fn in_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// 이 참조를 범위로 했을 때 `other`가 범위 안에 있는지 확인합니다.
    ///
    /// 같은 객체이거나, 이 참조가 `Namespace`이고 `other`가
    /// 그 네임스페이스에 속하면 범위 안입니다.
    pub fn covers(&self, other: &OriginRef) -> bool {
        if self.kind == other.kind
            && self.name == other.name
            && self.api_version == other.api_version
        {
            return true;
        }
        self.kind == "Namespace" && other.namespace.as_deref() == Some(self.name.as_str())
    }
}

impl fmt::Display for OriginRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{} {}/{}", self.kind, ns, self.name),
            None => write!(f, "{} {}", self.kind, self.name),
        }
    }
}

/// 레코더가 전달받은 메시지에 대해 남긴 관측 기록
///
/// 원격 레코더가 생성하며 이 하네스에서는 읽기 전용입니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservedEvent {
    /// 이벤트를 기록한 관찰자 식별자
    pub observer: String,
    /// 출처 참조
    pub origin: OriginRef,
    /// 이벤트 페이로드/엔벨로프
    #[serde(default)]
    pub event: serde_json::Value,
}

impl ObservedEvent {
    /// 새 관측 이벤트를 생성합니다.
    pub fn new(observer: impl Into<String>, origin: OriginRef, event: serde_json::Value) -> Self {
        Self {
            observer: observer.into(),
            origin,
            event,
        }
    }
}

impl fmt::Display for ObservedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "seen by {:?} from {}: {}", self.observer, self.origin, self.event)
    }
}

/// 테스트 실행 환경 -- 네임스페이스와 테스트 대상 리소스 참조 집합
///
/// 전역 컨텍스트 대신 실행마다 명시적으로 전달됩니다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    /// 테스트 네임스페이스
    pub namespace: String,
    /// 테스트 대상 리소스 참조 (순서는 로그 출력에만 의미가 있음)
    #[serde(default)]
    pub references: Vec<ResourceReference>,
}

impl Environment {
    /// 새 실행 환경을 생성합니다.
    pub fn new(namespace: impl Into<String>, references: Vec<ResourceReference>) -> Self {
        Self {
            namespace: namespace.into(),
            references,
        }
    }

    /// TOML 문자열에서 환경을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, RelaycheckError> {
        let env: Self =
            toml::from_str(toml_str).map_err(|e| RelaycheckError::Environment(e.to_string()))?;
        if env.namespace.is_empty() {
            return Err(RelaycheckError::Environment(
                "namespace must not be empty".to_owned(),
            ));
        }
        Ok(env)
    }

    /// TOML 파일에서 환경을 로드합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, RelaycheckError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            RelaycheckError::Environment(format!("{}: {e}", path.display()))
        })?;
        Self::parse(&content)
    }
}
