//! relaycheck 공통 크레이트
//!
//! 준비 상태 감시기(`relaycheck-readiness`)와 전달 검증기(`relaycheck-verifier`)가
//! 공유하는 도메인 타입, 에러 분류, 설정, 메트릭 이름을 정의합니다.
//!
//! # 모듈 구성
//!
//! - [`types`]: 리소스 참조, 리소스 상태, 관측 이벤트, 실행 환경
//! - [`error`]: 최상위 에러 [`RelaycheckError`]와 설정 에러
//! - [`config`]: `relaycheck.toml` 파싱 및 환경변수 오버라이드
//! - [`metrics`]: 메트릭 이름 상수와 설명 등록

pub mod config;
pub mod error;
pub mod metrics;
pub mod types;

// --- 주요 타입 re-export ---

// 에러
pub use error::{ConfigError, RelaycheckError};

// 설정
pub use config::RelaycheckConfig;

// 도메인 타입
pub use types::{
    Condition, ConditionStatus, Environment, ObservedEvent, OriginRef, ResourceReference,
    ResourceStatus,
};
