//! relaycheck 전달 검증기
//!
//! 준비 상태 수렴이 끝난 뒤 정착 시간을 기다리고, 관측 저장소에서
//! 이번 실행의 관찰자가 기록한 이벤트를 조회하여 기대 개수와 비교합니다.
//!
//! # 모듈 구성
//!
//! - [`store`]: 관측 조회 트레이트 [`ObservationStore`]와 파일 기반 구현
//! - [`filter`]: 선언적 관측 필터 [`ObservationFilter`]
//! - [`expectation`]: 실행별 기대값 [`Expectation`], [`ObserverIdentity`]
//! - [`settle`]: 정착 전략 [`SettleStrategy`]
//! - [`result`]: [`VerificationResult`], [`MatchMode`]
//! - [`verifier`]: [`DeliveryVerifier`]
//! - [`error`]: [`VerifierError`]

pub mod error;
pub mod expectation;
pub mod filter;
pub mod result;
pub mod settle;
pub mod store;
pub mod verifier;

pub use error::VerifierError;
pub use expectation::{DEFAULT_OBSERVER_PREFIX, Expectation, ObserverIdentity};
pub use filter::ObservationFilter;
pub use result::{MatchMode, VerificationResult};
pub use settle::{SettleReport, SettleStrategy};
pub use store::{FileObservationStore, ObservationStore, parse_events};
pub use verifier::DeliveryVerifier;
