//! 설정 관리 — trackgate.toml 파싱 및 런타임 설정
//!
//! [`TrackgateConfig`]는 모든 모듈의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`TRACKGATE_BROKER_HOST=10.0.0.1` 형식)
//! 3. 설정 파일 (`trackgate.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), trackgate_core::error::TrackgateError> {
//! use trackgate_core::config::TrackgateConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = TrackgateConfig::load("trackgate.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = TrackgateConfig::parse("[broker]\nhost = \"10.0.0.1\"")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, TrackgateError};

/// Trackgate 통합 설정
///
/// `trackgate.toml` 파일의 최상위 구조를 나타냅니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrackgateConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 브로커 연결 설정
    #[serde(default)]
    pub broker: BrokerConfig,
    /// 싱크 설정
    #[serde(default)]
    pub sinks: SinkConfig,
    /// 메트릭 설정
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl TrackgateConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, TrackgateError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, TrackgateError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                TrackgateError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                TrackgateError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, TrackgateError> {
        toml::from_str(toml_str).map_err(|e| {
            TrackgateError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `TRACKGATE_{SECTION}_{FIELD}`
    /// 예: `TRACKGATE_BROKER_HOST=10.0.0.1`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "TRACKGATE_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "TRACKGATE_GENERAL_LOG_FORMAT");

        // Broker
        override_string(&mut self.broker.host, "TRACKGATE_BROKER_HOST");
        override_u16(&mut self.broker.port, "TRACKGATE_BROKER_PORT");
        override_csv(&mut self.broker.topics, "TRACKGATE_BROKER_TOPICS");
        override_u8(&mut self.broker.qos, "TRACKGATE_BROKER_QOS");
        override_opt_string(&mut self.broker.username, "TRACKGATE_BROKER_USERNAME");
        override_opt_string(&mut self.broker.password, "TRACKGATE_BROKER_PASSWORD");
        override_u64(
            &mut self.broker.keepalive_secs,
            "TRACKGATE_BROKER_KEEPALIVE_SECS",
        );
        override_string(&mut self.broker.client_id, "TRACKGATE_BROKER_CLIENT_ID");

        // Sinks
        override_bool(&mut self.sinks.console, "TRACKGATE_SINKS_CONSOLE");
        override_bool(
            &mut self.sinks.pretty,
            "TRACKGATE_SINKS_PRETTY",
        );
        override_opt_string(&mut self.sinks.jsonl_path, "TRACKGATE_SINKS_JSONL_PATH");
        override_opt_string(&mut self.sinks.raw_log_path, "TRACKGATE_SINKS_RAW_LOG_PATH");

        // Metrics
        override_bool(&mut self.metrics.enabled, "TRACKGATE_METRICS_ENABLED");
        override_string(&mut self.metrics.listen_addr, "TRACKGATE_METRICS_LISTEN_ADDR");
        override_u16(&mut self.metrics.port, "TRACKGATE_METRICS_PORT");
    }

    /// 설정값의 유효성을 검증합니다.
    ///
    /// 네트워크 I/O 이전에 빠르게 실패합니다 — 여기서 통과한 설정만
    /// 구독자 생성에 사용됩니다.
    pub fn validate(&self) -> Result<(), TrackgateError> {
        // log_level 검증
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            }
            .into());
        }

        // log_format 검증
        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            }
            .into());
        }

        self.broker.validate()?;

        Ok(())
    }
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
            log_format: "json".to_owned(),
        }
    }
}

/// 브로커 연결 설정
///
/// 구독자는 이 값을 소비만 합니다. 어디서 채울지(파일, 환경변수,
/// CLI)는 데몬의 관심사입니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerConfig {
    /// 브로커 호스트
    pub host: String,
    /// 브로커 포트
    pub port: u16,
    /// 구독 토픽 목록 (순서 보존, 중복 허용)
    pub topics: Vec<String>,
    /// 구독 QoS 레벨 (0, 1, 2)
    pub qos: u8,
    /// 인증 사용자명 (선택)
    pub username: Option<String>,
    /// 인증 비밀번호 (선택)
    pub password: Option<String>,
    /// keepalive 간격 (초)
    pub keepalive_secs: u64,
    /// MQTT 클라이언트 ID
    pub client_id: String,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 1883,
            topics: vec!["test-topic".to_owned()],
            qos: 0,
            username: None,
            password: None,
            keepalive_secs: 60,
            client_id: "trackgate".to_owned(),
        }
    }
}

impl BrokerConfig {
    /// 연결 파라미터를 검증합니다.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "broker.host".to_owned(),
                reason: "host must not be empty".to_owned(),
            });
        }
        if self.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "broker.port".to_owned(),
                reason: "port must not be 0".to_owned(),
            });
        }
        if self.topics.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "broker.topics".to_owned(),
                reason: "at least one topic is required".to_owned(),
            });
        }
        if self.topics.iter().any(|t| t.is_empty()) {
            return Err(ConfigError::InvalidValue {
                field: "broker.topics".to_owned(),
                reason: "topics must not be empty strings".to_owned(),
            });
        }
        if self.qos > 2 {
            return Err(ConfigError::InvalidValue {
                field: "broker.qos".to_owned(),
                reason: "must be 0, 1, or 2".to_owned(),
            });
        }
        Ok(())
    }
}

/// 싱크 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SinkConfig {
    /// 콘솔 싱크 활성화 여부
    pub console: bool,
    /// 인식 불가 페이로드가 JSON이면 pretty-print할지 여부 (원문 폴백 경로 공통)
    pub pretty: bool,
    /// append-only JSONL 레코드 파일 경로 (미설정 시 비활성)
    pub jsonl_path: Option<String>,
    /// 인식 불가 페이로드 텍스트 로그 파일 경로 (미설정 시 비활성)
    pub raw_log_path: Option<String>,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            console: true,
            pretty: false,
            jsonl_path: None,
            raw_log_path: None,
        }
    }
}

/// 메트릭 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Prometheus 익스포터 활성화 여부
    pub enabled: bool,
    /// HTTP 리스너 바인드 주소
    pub listen_addr: String,
    /// HTTP 리스너 포트
    pub port: u16,
    /// 스크레이프 엔드포인트 경로
    pub endpoint: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen_addr: "127.0.0.1".to_owned(),
            port: 9187,
            endpoint: "/metrics".to_owned(),
        }
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_opt_string(target: &mut Option<String>, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = Some(val);
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

fn override_u8(target: &mut u8, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u8>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u8 from env var, ignoring"
            ),
        }
    }
}

fn override_u16(target: &mut u16, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u16>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u16 from env var, ignoring"
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

fn override_csv(target: &mut Vec<String>, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val.split(',').map(|s| s.trim().to_owned()).collect();
    }
}
