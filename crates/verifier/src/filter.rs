//! 선언적 관측 필터
//!
//! 관찰자 식별자 일치와 출처 범위를 데이터로 표현하여 실제 백엔드 없이
//! 단위 테스트할 수 있게 합니다. 저장소 구현은 이 필터를 조회 조건으로
//! 사용하고, 검증기는 저장소가 상위 집합을 돌려줄 수 있으므로 결과에
//! 필터를 다시 적용합니다.

use std::fmt;

use serde::{Deserialize, Serialize};

use relaycheck_core::types::{ObservedEvent, OriginRef};

/// 관측 필터
///
/// 지정하지 않은 조건은 모든 이벤트와 일치합니다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservationFilter {
    /// 관찰자 식별자 (정확히 일치)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observer: Option<String>,
    /// 출처 범위 ([`OriginRef::covers`])
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<OriginRef>,
}

impl ObservationFilter {
    /// 모든 이벤트와 일치하는 필터를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 관찰자 식별자 조건을 지정합니다.
    pub fn observer(mut self, observer: impl Into<String>) -> Self {
        self.observer = Some(observer.into());
        self
    }

    /// 출처 범위 조건을 지정합니다.
    pub fn origin(mut self, origin: OriginRef) -> Self {
        self.origin = Some(origin);
        self
    }

    /// 이벤트가 모든 조건과 일치하는지 확인합니다.
    pub fn matches(&self, event: &ObservedEvent) -> bool {
        if let Some(observer) = &self.observer {
            if &event.observer != observer {
                return false;
            }
        }
        if let Some(origin) = &self.origin {
            if !origin.covers(&event.origin) {
                return false;
            }
        }
        true
    }

    /// 일치하는 이벤트만 남깁니다. 순서는 유지됩니다.
    pub fn apply(&self, events: Vec<ObservedEvent>) -> Vec<ObservedEvent> {
        events.into_iter().filter(|e| self.matches(e)).collect()
    }
}

impl fmt::Display for ObservationFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let observer = self.observer.as_deref().unwrap_or("*");
        match &self.origin {
            Some(origin) => write!(f, "observer={observer} origin={origin}"),
            None => write!(f, "observer={observer} origin=*"),
        }
    }
}
