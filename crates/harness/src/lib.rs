//! relaycheck 실행 하네스
//!
//! 준비 상태 감시기와 전달 검증기를 한 번의 실행으로 묶습니다.
//!
//! # 사용 예시
//! ```ignore
//! use std::sync::Arc;
//! use relaycheck_harness::{DeliveryRun, RunPlan};
//!
//! let plan = RunPlan::from_config(&config, environment)?;
//! let run = DeliveryRun::new(plan, Arc::new(status_source), Arc::new(store));
//! let report = run.execute(&cancel).await;
//! ```
//!
//! # 모듈 구성
//!
//! - [`plan`]: 실행 입력 [`RunPlan`]
//! - [`state`]: 상태 머신 [`RunState`]
//! - [`run`]: [`DeliveryRun`]
//! - [`report`]: [`RunReport`], [`RunOutcome`], [`RunFailure`]

pub mod plan;
pub mod report;
pub mod run;
pub mod state;

pub use plan::RunPlan;
pub use report::{RunFailure, RunOutcome, RunReport};
pub use run::DeliveryRun;
pub use state::{RunState, StateTransition};
