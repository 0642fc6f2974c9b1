//! 에러 타입 — 도메인별 에러 정의
//!
//! 전파 정책: 시작 시점의 [`ConfigError`]만 프로세스를 종료시킬 수
//! 있습니다. 런타임의 전송/싱크 에러는 모두 로깅 후 격리되며, 다음
//! 메시지 처리가 계속됩니다. 인식 불가/손상 페이로드는 에러 타입이
//! 아예 없습니다 — 가장 작은 단위(엔트리 > 메시지)에서 조용히
//! 건너뜁니다.

/// Trackgate 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum TrackgateError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 브로커 전송 계층 에러
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// 싱크 처리 에러
    #[error("sink error: {0}")]
    Sink(#[from] SinkError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러 — 시작 시점에만 발생, 재시도 없음
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

/// 브로커 전송 계층 에러
///
/// 재연결은 수신 루프의 책임이므로, 이 에러는 로깅용 상태 표현에
/// 가깝습니다. 수신 루프 밖으로 전파되지 않습니다.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// 연결 시도 실패
    #[error("connect failed: {reason}")]
    Connect { reason: String },

    /// 브로커가 연결을 거부함 (reason code 포함)
    #[error("connection refused: {status}")]
    Refused { status: String },

    /// 예기치 않은 연결 종료
    #[error("unexpected disconnect: {reason}")]
    Disconnected { reason: String },
}

/// 싱크 처리 에러 — 싱크 하나에 격리되며 수신 루프를 중단시키지 않음
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// 파일 쓰기 등 I/O 실패
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// 레코드 직렬화 실패
    #[error("serialize error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// 싱크별 기타 실패
    #[error("sink '{sink}' failed: {reason}")]
    Write { sink: String, reason: String },
}
