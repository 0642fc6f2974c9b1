//! 싱크 모듈 — 정규화된 이벤트를 기록/표시하는 백엔드
//!
//! # 변형
//! - [`ConsoleSink`]: 이벤트당 한 줄을 표준 출력으로
//! - [`JsonlSink`]: append-only JSONL 파일 (레코드 = 한 줄 JSON 객체)
//! - [`RawLogSink`]: 인식 불가 페이로드 전용 텍스트 로그
//! - [`FanoutSink`]: 하위 싱크 시퀀스에 순서대로 전달
//!
//! 팬아웃은 그 자체로 [`DetectionSink`] 변형이므로 임의 중첩이
//! 가능합니다. 하위 싱크 하나의 실패는 여기서 격리됩니다 — 로깅 후
//! 나머지 싱크로 전달을 계속합니다.

pub mod console;
pub mod jsonl;
pub mod raw_log;

pub use console::ConsoleSink;
pub use jsonl::JsonlSink;
pub use raw_log::RawLogSink;

use tracing::{info, warn};

use trackgate_core::config::SinkConfig;
use trackgate_core::error::{SinkError, TrackgateError};
use trackgate_core::event::DetectionEvent;
use trackgate_core::metrics::{LABEL_SINK, SINK_ERRORS_TOTAL};
use trackgate_core::pipeline::DetectionSink;

/// 팬아웃 싱크 — 하위 싱크 목록에 순서대로 전달합니다.
pub struct FanoutSink {
    sinks: Vec<Box<dyn DetectionSink>>,
}

impl FanoutSink {
    /// 빈 팬아웃 싱크를 생성합니다.
    pub fn new() -> Self {
        Self { sinks: Vec::new() }
    }

    /// 하위 싱크를 추가합니다. 전달 순서는 추가 순서입니다.
    pub fn with_sink(mut self, sink: Box<dyn DetectionSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// 등록된 하위 싱크 수를 반환합니다.
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    /// 하위 싱크가 하나도 없는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    fn record_failure(sink_name: &str, error: &SinkError) {
        warn!(sink = sink_name, error = %error, "sink failed; continuing with remaining sinks");
        metrics::counter!(SINK_ERRORS_TOTAL, LABEL_SINK => sink_name.to_owned()).increment(1);
    }
}

impl Default for FanoutSink {
    fn default() -> Self {
        Self::new()
    }
}

impl DetectionSink for FanoutSink {
    fn name(&self) -> &str {
        "fanout"
    }

    fn handle(&self, event: &DetectionEvent) -> Result<(), SinkError> {
        for sink in &self.sinks {
            if let Err(e) = sink.handle(event) {
                Self::record_failure(sink.name(), &e);
            }
        }
        Ok(())
    }

    fn handle_raw(&self, topic: &str, text: &str) -> Result<(), SinkError> {
        for sink in &self.sinks {
            if let Err(e) = sink.handle_raw(topic, text) {
                Self::record_failure(sink.name(), &e);
            }
        }
        Ok(())
    }
}

/// 설정에서 싱크 팬아웃을 조립합니다.
///
/// 파일 싱크는 여기서 열리므로, 경로 문제는 수신 시작 전에 드러납니다.
pub fn build_sinks(config: &SinkConfig) -> Result<FanoutSink, TrackgateError> {
    let mut fanout = FanoutSink::new();

    if config.console {
        fanout = fanout.with_sink(Box::new(ConsoleSink::new()));
    }
    if let Some(path) = &config.jsonl_path {
        let sink = JsonlSink::new(path)?;
        info!(path = %sink.path().display(), "jsonl sink active");
        fanout = fanout.with_sink(Box::new(sink));
    }
    if let Some(path) = &config.raw_log_path {
        let sink = RawLogSink::new(path)?;
        info!(path = %sink.path().display(), "raw log sink active");
        fanout = fanout.with_sink(Box::new(sink));
    }

    Ok(fanout)
}
