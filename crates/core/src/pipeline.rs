//! 파이프라인 trait — 디코더/싱크 확장 포인트 정의

use chrono::{DateTime, Utc};

use crate::error::SinkError;
use crate::event::{BBox, DetectionEvent};

/// 페이로드 공통 메타데이터
///
/// 인코딩 변형과 무관하게 문서 최상위에서 추출되는 필드입니다.
/// 라우터가 한 번 추출하여 모든 디코더 전략에 전달합니다.
#[derive(Debug, Clone)]
pub struct PayloadMeta {
    /// 페이로드의 `@timestamp`, 없거나 파싱 불가하면 수신 시각
    pub ts: DateTime<Utc>,
    /// `sensorId` 또는 중첩 `sensor.id`, 없으면 `"unknown"`
    pub sensor: Option<String>,
}

/// 디코더가 생성하는 이벤트 초안
///
/// 토픽과 공통 메타데이터는 라우터가 채우므로, 각 디코더 전략은
/// 엔트리 고유 필드만 생성합니다.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionDraft {
    /// 추적 객체 식별자 (문자열로 강제 변환됨)
    pub track_id: String,
    /// 바운딩 박스
    pub bbox: BBox,
    /// 클래스 레이블
    pub cls: Option<String>,
    /// 신뢰도
    pub conf: Option<f64>,
}

/// 페이로드 디코더 전략 trait
///
/// 새로운 와이어 인코딩을 지원하려면 이 trait을 구현하고 라우터에
/// 등록합니다. 전략은 등록 순서대로 시도되며 첫 매칭이 승리합니다.
/// 런타임 타입 검사로 분기하지 말고, 전략 추가로 확장합니다.
pub trait PayloadDecoder: Send + Sync {
    /// 인코딩 변형 이름 (로깅 및 메트릭 레이블에 사용)
    fn variant_name(&self) -> &str;

    /// 구조화된 문서에서 이벤트 초안을 디코딩합니다.
    ///
    /// - `None`: 이 전략이 아는 인코딩이 아님 — 라우터가 다음 전략을 시도
    /// - `Some(drafts)`: 매칭됨. 유효하지 않은 엔트리는 조용히 건너뛰므로
    ///   빈 벡터일 수 있습니다
    fn decode(&self, doc: &serde_json::Value, meta: &PayloadMeta) -> Option<Vec<DetectionDraft>>;
}

/// 탐지 이벤트 싱크 trait
///
/// 정규화된 이벤트를 기록하거나 표시하는 백엔드입니다.
/// 싱크 하나의 실패는 호출자가 격리합니다 — 형제 싱크나 수신 루프에
/// 전파되지 않습니다.
pub trait DetectionSink: Send + Sync {
    /// 싱크 이름 (로깅 및 메트릭 레이블에 사용)
    fn name(&self) -> &str;

    /// 정규화된 이벤트 하나를 처리합니다.
    fn handle(&self, event: &DetectionEvent) -> Result<(), SinkError>;

    /// 인식되지 않은 페이로드의 원문 텍스트 경로.
    ///
    /// 탐지 인코딩이 아닌 메시지는 디코딩 대신 이 경로로 전달됩니다.
    /// 기본 구현은 무시합니다.
    fn handle_raw(&self, _topic: &str, _text: &str) -> Result<(), SinkError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    struct NullSink;

    impl DetectionSink for NullSink {
        fn name(&self) -> &str {
            "null"
        }

        fn handle(&self, _event: &DetectionEvent) -> Result<(), SinkError> {
            Ok(())
        }
    }

    #[test]
    fn default_raw_path_is_noop() {
        let sink = NullSink;
        assert!(sink.handle_raw("topic", "text").is_ok());
    }

    #[test]
    fn traits_are_object_safe() {
        let _sink: Box<dyn DetectionSink> = Box::new(NullSink);

        struct NullDecoder;
        impl PayloadDecoder for NullDecoder {
            fn variant_name(&self) -> &str {
                "null"
            }
            fn decode(
                &self,
                _doc: &serde_json::Value,
                _meta: &PayloadMeta,
            ) -> Option<Vec<DetectionDraft>> {
                None
            }
        }
        let _decoder: Box<dyn PayloadDecoder> = Box::new(NullDecoder);
    }

    #[test]
    fn payload_meta_holds_defaults() {
        let meta = PayloadMeta {
            ts: Utc::now(),
            sensor: Some("unknown".to_owned()),
        };
        assert_eq!(meta.sensor.as_deref(), Some("unknown"));
    }
}
