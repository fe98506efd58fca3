//! 에러 타입 -- 도메인별 에러 정의
//!
//! 각 크레이트는 자체 도메인 에러를 정의하고 `From` 구현으로
//! [`RelaycheckError`]로 변환되어 상위 레이어에서 `?`로 전파됩니다.

/// relaycheck 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum RelaycheckError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 리소스 준비 상태 수렴 실패
    #[error("readiness error: {0}")]
    Readiness(String),

    /// 관측 저장소 조회 실패
    #[error("observation query error: {0}")]
    ObservationQuery(String),

    /// 관측 개수 불일치
    #[error("count mismatch: want {expected}, got {actual}")]
    CountMismatch { expected: usize, actual: usize },

    /// 외부 취소 신호로 중단됨
    #[error("cancelled during {0}")]
    Cancelled(String),

    /// 환경 파일 파싱 실패
    #[error("environment error: {0}")]
    Environment(String),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}
