//! 컴팩트 다중 객체 디코더
//!
//! 프레임당 여러 탐지를 파이프 구분 문자열 배열로 싣는 인코딩입니다:
//!
//! ```json
//! {"objects": ["id|x1|y1|x2|y2|class|...|conf", ...]}
//! ```
//!
//! 엔트리 형식: 필드 0 = track_id, 필드 1–4 = bbox 좌표(숫자 필수),
//! 필드 5 = 클래스 레이블(선택), 필드가 13개 이상이면 마지막 필드를
//! confidence로 해석합니다. 유효하지 않은 엔트리는 배치 전체를 버리지
//! 않고 그 엔트리만 건너뜁니다.

use tracing::trace;

use trackgate_core::event::BBox;
use trackgate_core::metrics::{DECODE_SKIPS_TOTAL, LABEL_VARIANT};
use trackgate_core::pipeline::{DetectionDraft, PayloadDecoder, PayloadMeta};

/// confidence가 실리는 최소 필드 수
///
/// 확장 엔트리는 `id|x1|y1|x2|y2|class|#|gender|age|hair|cap|apparel|conf`
/// 형태로, 마지막 필드가 confidence입니다.
const MIN_FIELDS_WITH_CONF: usize = 13;

/// 컴팩트 다중 객체 디코더 ("objects" 배열 변형)
pub struct ObjectListDecoder;

impl ObjectListDecoder {
    /// 파이프 구분 엔트리 하나를 디코딩합니다.
    ///
    /// 필드가 5개 미만이거나 좌표가 숫자로 파싱되지 않으면 `None`입니다.
    fn decode_entry(entry: &str) -> Option<DetectionDraft> {
        let parts: Vec<&str> = entry.split('|').collect();
        if parts.len() < 5 {
            return None;
        }

        let track_id = parts[0].to_owned();
        let x1: f64 = parts[1].trim().parse().ok()?;
        let y1: f64 = parts[2].trim().parse().ok()?;
        let x2: f64 = parts[3].trim().parse().ok()?;
        let y2: f64 = parts[4].trim().parse().ok()?;

        let cls = parts
            .get(5)
            .filter(|c| !c.is_empty())
            .map(|c| (*c).to_owned());

        // 마지막 필드의 confidence는 파싱 실패 시 조용히 무시
        let conf = if parts.len() >= MIN_FIELDS_WITH_CONF {
            parts.last().and_then(|c| c.trim().parse::<f64>().ok())
        } else {
            None
        };

        Some(DetectionDraft {
            track_id,
            bbox: BBox(x1, y1, x2, y2),
            cls,
            conf,
        })
    }
}

impl PayloadDecoder for ObjectListDecoder {
    fn variant_name(&self) -> &str {
        "object_list"
    }

    fn decode(&self, doc: &serde_json::Value, _meta: &PayloadMeta) -> Option<Vec<DetectionDraft>> {
        // "objects"가 배열이 아니면 이 변형이 아님
        let entries = doc.get("objects")?.as_array()?;

        let mut drafts = Vec::with_capacity(entries.len());
        for entry in entries {
            let Some(text) = entry.as_str() else {
                metrics::counter!(DECODE_SKIPS_TOTAL, LABEL_VARIANT => "object_list")
                    .increment(1);
                continue;
            };
            match Self::decode_entry(text) {
                Some(draft) => drafts.push(draft),
                None => {
                    trace!(entry = text, "skipping malformed object entry");
                    metrics::counter!(DECODE_SKIPS_TOTAL, LABEL_VARIANT => "object_list")
                        .increment(1);
                }
            }
        }

        Some(drafts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn meta() -> PayloadMeta {
        PayloadMeta {
            ts: Utc::now(),
            sensor: Some("unknown".to_owned()),
        }
    }

    fn doc(raw: &str) -> serde_json::Value {
        serde_json::from_str(raw).unwrap()
    }

    #[test]
    fn decodes_minimal_entry() {
        let decoder = ObjectListDecoder;
        let drafts = decoder
            .decode(&doc(r#"{"objects":["7|10|20|110|220|person|#"]}"#), &meta())
            .unwrap();
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].track_id, "7");
        assert_eq!(drafts[0].bbox, BBox(10.0, 20.0, 110.0, 220.0));
        assert_eq!(drafts[0].cls.as_deref(), Some("person"));
        assert_eq!(drafts[0].conf, None);
    }

    #[test]
    fn entry_without_class_has_no_cls() {
        let drafts = ObjectListDecoder
            .decode(&doc(r#"{"objects":["3|1|2|3|4"]}"#), &meta())
            .unwrap();
        assert_eq!(drafts[0].cls, None);
    }

    #[test]
    fn empty_class_field_treated_as_absent() {
        let drafts = ObjectListDecoder
            .decode(&doc(r#"{"objects":["3|1|2|3|4|"]}"#), &meta())
            .unwrap();
        assert_eq!(drafts[0].cls, None);
    }

    #[test]
    fn extended_entry_carries_confidence() {
        let raw = r#"{"objects":["12|5|6|50|60|person|#|male|30|black|none|jacket|0.91"]}"#;
        let drafts = ObjectListDecoder.decode(&doc(raw), &meta()).unwrap();
        assert_eq!(drafts[0].conf, Some(0.91));
        assert_eq!(drafts[0].cls.as_deref(), Some("person"));
    }

    #[test]
    fn extended_entry_with_bad_confidence_ignores_it() {
        let raw = r#"{"objects":["12|5|6|50|60|person|#|male|30|black|none|jacket|high"]}"#;
        let drafts = ObjectListDecoder.decode(&doc(raw), &meta()).unwrap();
        assert_eq!(drafts[0].conf, None);
    }

    #[test]
    fn short_entry_without_conf_fields_has_no_confidence() {
        // 12개 필드까지는 confidence를 찾지 않음
        let raw = r#"{"objects":["12|5|6|50|60|person|#|male|30|black|none|0.91"]}"#;
        let drafts = ObjectListDecoder.decode(&doc(raw), &meta()).unwrap();
        assert_eq!(drafts[0].conf, None);
    }

    #[test]
    fn invalid_entries_dropped_valid_kept() {
        let raw = r#"{"objects":["1|0|0|10|10","too|few","2|a|b|c|d","3|5|5|15|15|car",42]}"#;
        let drafts = ObjectListDecoder.decode(&doc(raw), &meta()).unwrap();
        assert_eq!(drafts.len(), 2);
        assert_eq!(drafts[0].track_id, "1");
        assert_eq!(drafts[1].track_id, "3");
        assert_eq!(drafts[1].cls.as_deref(), Some("car"));
    }

    #[test]
    fn all_invalid_entries_is_matched_but_empty() {
        let drafts = ObjectListDecoder
            .decode(&doc(r#"{"objects":["bad","also|bad"]}"#), &meta())
            .unwrap();
        assert!(drafts.is_empty());
    }

    #[test]
    fn objects_not_an_array_is_not_matched() {
        assert!(
            ObjectListDecoder
                .decode(&doc(r#"{"objects":"7|1|2|3|4"}"#), &meta())
                .is_none()
        );
    }

    #[test]
    fn missing_objects_field_is_not_matched() {
        assert!(
            ObjectListDecoder
                .decode(&doc(r#"{"object":{}}"#), &meta())
                .is_none()
        );
    }
}
