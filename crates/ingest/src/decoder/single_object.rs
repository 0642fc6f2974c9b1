//! 단일 중첩 객체 디코더
//!
//! 메시지당 탐지 하나를 중첩 객체로 싣는 인코딩입니다:
//!
//! ```json
//! {"object": {"id": 3,
//!             "bbox": {"topleftx": 1, "toplefty": 2,
//!                      "bottomrightx": 5, "bottomrighty": 6},
//!             "person": {"confidence": 0.87}}}
//! ```
//!
//! `id`와 네 모서리 좌표가 모두 있어야 이벤트가 생성됩니다. confidence는
//! `person.confidence`가 숫자로 해석될 때만 실리고, 클래스 레이블은 이
//! 인코딩이 싣지 않습니다.

use tracing::trace;

use trackgate_core::event::BBox;
use trackgate_core::metrics::{DECODE_SKIPS_TOTAL, LABEL_VARIANT};
use trackgate_core::pipeline::{DetectionDraft, PayloadDecoder, PayloadMeta};

use super::{coerce_f64, coerce_string};

/// 단일 중첩 객체 디코더 ("object" 변형)
pub struct SingleObjectDecoder;

impl SingleObjectDecoder {
    fn decode_object(
        obj: &serde_json::Map<String, serde_json::Value>,
    ) -> Option<DetectionDraft> {
        let track_id = obj.get("id").and_then(coerce_string)?;

        let bbox = obj.get("bbox")?.as_object()?;
        let x1 = bbox.get("topleftx").and_then(coerce_f64)?;
        let y1 = bbox.get("toplefty").and_then(coerce_f64)?;
        let x2 = bbox.get("bottomrightx").and_then(coerce_f64)?;
        let y2 = bbox.get("bottomrighty").and_then(coerce_f64)?;

        let conf = obj
            .get("person")
            .and_then(|p| p.get("confidence"))
            .and_then(coerce_f64);

        Some(DetectionDraft {
            track_id,
            bbox: BBox(x1, y1, x2, y2),
            // 이 인코딩의 모델링 범위에는 클래스 레이블이 없음
            cls: None,
            conf,
        })
    }
}

impl PayloadDecoder for SingleObjectDecoder {
    fn variant_name(&self) -> &str {
        "single_object"
    }

    fn decode(&self, doc: &serde_json::Value, _meta: &PayloadMeta) -> Option<Vec<DetectionDraft>> {
        // "object"가 객체가 아니면 이 변형이 아님
        let obj = doc.get("object")?.as_object()?;

        match Self::decode_object(obj) {
            Some(draft) => Some(vec![draft]),
            None => {
                trace!("skipping object without usable id/bbox");
                metrics::counter!(DECODE_SKIPS_TOTAL, LABEL_VARIANT => "single_object")
                    .increment(1);
                Some(Vec::new())
            }
        }
    }
}
