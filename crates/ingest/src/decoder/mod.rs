//! 페이로드 디코딩 모듈 — 와이어 인코딩별 디코더와 자동 감지 라우터
//!
//! [`DecoderRouter`]는 원시 페이로드를 구조화 문서로 파싱한 뒤, 등록된
//! 디코더 전략을 고정된 우선순위로 시도합니다. 각 전략은 core의
//! [`PayloadDecoder`](trackgate_core::pipeline::PayloadDecoder) trait을 구현합니다.
//!
//! # 지원 인코딩
//! - 컴팩트 다중 객체 ([`ObjectListDecoder`]): `objects` 배열, 파이프 구분 문자열
//! - 단일 중첩 객체 ([`SingleObjectDecoder`]): `object` 객체, 중첩 `bbox`
//!
//! # 실패 의미론
//! 디코딩은 치명적 에러를 만들지 않습니다. 구조 파싱 실패, 미인식 형식,
//! 인식됐지만 유효 엔트리가 없는 배치는 모두 빈 결과가 되어 호출자의
//! 원문 폴백 경로로 흘러갑니다. 손상된 엔트리 하나가 나머지 배치를
//! 버리게 하지 않습니다.
//!
//! # 사용 예시
//! ```
//! use trackgate_ingest::decoder::DecoderRouter;
//!
//! let router = DecoderRouter::with_defaults();
//! let events = router.decode("ds/cam1", br#"{"objects":["7|10|20|110|220|person"]}"#);
//! assert_eq!(events.len(), 1);
//! assert_eq!(events[0].track_id, "7");
//! ```

pub mod object_list;
pub mod single_object;

pub use object_list::ObjectListDecoder;
pub use single_object::SingleObjectDecoder;

use chrono::{DateTime, Utc};

use trackgate_core::event::DetectionEvent;
use trackgate_core::pipeline::{PayloadDecoder, PayloadMeta};

/// 디코더 라우터 — 인코딩 변형을 자동 감지하여 적절한 디코더를 선택합니다.
///
/// 등록된 디코더를 순서대로 시도하며, 첫 번째로 매칭된 디코더의 결과를
/// 사용합니다. 새 인코딩은 전략 등록으로 추가합니다 — 런타임 타입
/// 검사로 분기하지 않습니다.
pub struct DecoderRouter {
    /// 등록된 디코더 목록 (순서대로 시도)
    decoders: Vec<Box<dyn PayloadDecoder>>,
}

impl DecoderRouter {
    /// 빈 라우터를 생성합니다.
    pub fn new() -> Self {
        Self {
            decoders: Vec::new(),
        }
    }

    /// 기본 디코더 세트(컴팩트 다중 객체 + 단일 중첩 객체)로 라우터를 생성합니다.
    pub fn with_defaults() -> Self {
        Self::new()
            .register(Box::new(ObjectListDecoder))
            .register(Box::new(SingleObjectDecoder))
    }

    /// 디코더를 등록합니다. 등록 순서대로 시도됩니다.
    pub fn register(mut self, decoder: Box<dyn PayloadDecoder>) -> Self {
        self.decoders.push(decoder);
        self
    }

    /// 등록된 인코딩 변형 이름 목록을 반환합니다.
    pub fn registered_variants(&self) -> Vec<&str> {
        self.decoders.iter().map(|d| d.variant_name()).collect()
    }

    /// 원시 페이로드를 디코딩합니다.
    ///
    /// 빈 결과는 "인식된 탐지 형식이 아님"을 뜻하며, 호출자는 원문
    /// 폴백 경로로 전달해야 합니다. 에러를 반환하지 않습니다.
    pub fn decode(&self, topic: &str, raw: &[u8]) -> Vec<DetectionEvent> {
        // 구조 파싱 실패 → 폴백. key-value 문서가 아닌 JSON(배열, 스칼라)도
        // 탐지 인코딩일 수 없으므로 동일하게 처리합니다.
        let Ok(doc) = serde_json::from_slice::<serde_json::Value>(raw) else {
            return Vec::new();
        };
        if !doc.is_object() {
            return Vec::new();
        }

        let meta = extract_meta(&doc);

        for decoder in &self.decoders {
            if let Some(drafts) = decoder.decode(&doc, &meta) {
                if !drafts.is_empty() {
                    metrics::counter!(
                        trackgate_core::metrics::EVENTS_DECODED_TOTAL,
                        trackgate_core::metrics::LABEL_VARIANT => decoder.variant_name().to_owned(),
                    )
                    .increment(drafts.len() as u64);
                }
                return drafts
                    .into_iter()
                    .map(|draft| DetectionEvent {
                        ts: meta.ts,
                        topic: topic.to_owned(),
                        sensor: meta.sensor.clone(),
                        track_id: draft.track_id,
                        bbox: draft.bbox,
                        cls: draft.cls,
                        conf: draft.conf,
                    })
                    .collect();
            }
        }

        Vec::new()
    }
}

impl Default for DecoderRouter {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// 문서 최상위에서 공통 메타데이터를 추출합니다.
///
/// `@timestamp`는 RFC 3339로 파싱하며, 없거나 파싱 불가하면 수신
/// 시각을 사용합니다. 센서 ID는 `sensorId` → 중첩 `sensor.id` 순으로
/// 찾고, 없으면 `"unknown"`입니다.
fn extract_meta(doc: &serde_json::Value) -> PayloadMeta {
    let ts = doc
        .get("@timestamp")
        .and_then(|v| v.as_str())
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(Utc::now);

    let sensor = doc
        .get("sensorId")
        .and_then(coerce_string)
        .or_else(|| {
            doc.get("sensor")
                .and_then(|s| s.get("id"))
                .and_then(coerce_string)
        })
        .or_else(|| Some("unknown".to_owned()));

    PayloadMeta { ts, sensor }
}

/// JSON 값을 문자열로 강제 변환합니다.
///
/// 식별자 필드는 문자열로도 숫자로도 인코딩되어 들어오므로 둘 다
/// 허용합니다.
pub(crate) fn coerce_string(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// JSON 값을 f64로 강제 변환합니다 (숫자 또는 숫자 문자열).
pub(crate) fn coerce_f64(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.parse().ok(),
        _ => None,
    }
}
