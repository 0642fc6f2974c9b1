//! 탐지 이벤트 — 파이프라인의 기본 통화 단위
//!
//! 업스트림 비전 시스템이 어떤 인코딩으로 발행했든, 디코더를 거치면
//! 모든 탐지는 [`DetectionEvent`] 하나의 형태로 정규화됩니다.
//! 이벤트는 디코더만 생성하며, 생성 이후에는 불변입니다 — 싱크는
//! 읽기만 합니다.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 이미지 픽셀 좌표계의 바운딩 박스 `(x1, y1, x2, y2)`
///
/// JSON으로는 4원소 배열 `[x1, y1, x2, y2]`로 직렬화됩니다.
/// 좌표 순서(x2 > x1 등)는 디코딩 시점에 검증하지 않습니다 —
/// 표시 레이어의 관심사입니다.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox(pub f64, pub f64, pub f64, pub f64);

impl fmt::Display for BBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{},{},{},{}]", self.0, self.1, self.2, self.3)
    }
}

/// 정규화된 탐지 이벤트
///
/// append-log 레코드 형식과 1:1 대응합니다: 한 줄에 JSON 객체 하나,
/// 필드는 `ts`, `topic`, `sensor`, `track_id`, `bbox`, `cls`, `conf`.
/// `ts`는 밀리초 정밀도의 ISO-8601 UTC(`Z` 접미) 문자열로 직렬화됩니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionEvent {
    /// 이벤트 시각 — 페이로드 메타데이터에서 추출, 없으면 수신 시각
    #[serde(with = "ts_millis")]
    pub ts: DateTime<Utc>,
    /// 메시지가 도착한 버스 토픽 (비어 있지 않음)
    pub topic: String,
    /// 발신 센서/카메라 식별자. 페이로드에 없으면 `"unknown"`
    pub sensor: Option<String>,
    /// 센서 내 추적 객체 식별자. 숫자로 인코딩된 경우에도 문자열로 강제 변환
    pub track_id: String,
    /// 바운딩 박스
    pub bbox: BBox,
    /// 클래스 레이블 (없을 수 있음)
    pub cls: Option<String>,
    /// 신뢰도 점수. 보통 [0,1] 범위이지만 클램핑하지 않음
    pub conf: Option<f64>,
}

impl fmt::Display for DetectionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DetectionEvent[{}] topic={} sensor={} bbox={}",
            self.track_id,
            self.topic,
            self.sensor.as_deref().unwrap_or("-"),
            self.bbox,
        )
    }
}

/// `ts` 필드의 밀리초 정밀도 직렬화 모듈
///
/// chrono 기본 serde 구현은 나노초까지 내보내므로, append-log 레코드
/// 계약(밀리초 + 후행 `Z`)을 지키기 위해 별도 모듈을 사용합니다.
pub mod ts_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}
