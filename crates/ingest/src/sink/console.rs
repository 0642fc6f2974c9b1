//! 콘솔 싱크 — 이벤트당 한 줄을 표준 출력으로 내보냅니다.

use chrono::SecondsFormat;

use trackgate_core::error::SinkError;
use trackgate_core::event::DetectionEvent;
use trackgate_core::pipeline::DetectionSink;

/// 사람이 읽기 좋은 한 줄 요약을 표준 출력으로 쓰는 싱크.
pub struct ConsoleSink;

impl ConsoleSink {
    pub fn new() -> Self {
        Self
    }

    /// 이벤트를 `" | "` 구분 한 줄로 렌더링합니다.
    ///
    /// 필드 순서는 고정: 타임스탬프, 토픽, 센서(있을 때만), id,
    /// bbox, cls(있을 때만), conf(있을 때만).
    pub fn render(event: &DetectionEvent) -> String {
        let mut parts: Vec<String> = Vec::with_capacity(7);
        parts.push(event.ts.to_rfc3339_opts(SecondsFormat::Millis, true));
        parts.push(event.topic.clone());
        if let Some(sensor) = &event.sensor {
            if !sensor.is_empty() {
                parts.push(sensor.clone());
            }
        }
        parts.push(format!("id={}", event.track_id));
        parts.push(format!(
            "bbox=[{}, {}, {}, {}]",
            fmt_num(event.bbox.0),
            fmt_num(event.bbox.1),
            fmt_num(event.bbox.2),
            fmt_num(event.bbox.3),
        ));
        if let Some(cls) = &event.cls {
            parts.push(format!("cls={cls}"));
        }
        if let Some(conf) = event.conf {
            parts.push(format!("conf={}", fmt_num(conf)));
        }
        parts.join(" | ")
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new()
    }
}

impl DetectionSink for ConsoleSink {
    fn name(&self) -> &str {
        "console"
    }

    fn handle(&self, event: &DetectionEvent) -> Result<(), SinkError> {
        println!("{}", Self::render(event));
        Ok(())
    }

    fn handle_raw(&self, topic: &str, text: &str) -> Result<(), SinkError> {
        println!("\n{topic}:\n{text}");
        Ok(())
    }
}

/// 표시용 숫자 포맷. 정수값은 소수점 없이, 그 외는 소수 3자리.
fn fmt_num(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{value:.3}")
    }
}
