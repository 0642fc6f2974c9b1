//! 메트릭 상수 정의
//!
//! 모든 Prometheus 메트릭의 이름을 중앙에서 정의합니다.
//! 각 모듈은 이 상수로 `metrics::counter!()` 매크로를 호출하고,
//! 레코더 설치는 `trackgate-daemon`이 담당합니다 (레코더가 없으면
//! 모든 호출은 no-op입니다).
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `trackgate_`
//! - 접미어: `_total` (counter)

/// 인코딩 변형 레이블 키 (object_list, single_object)
pub const LABEL_VARIANT: &str = "variant";

/// 싱크 레이블 키 (console, jsonl, raw_log, fanout)
pub const LABEL_SINK: &str = "sink";

/// 수신한 전체 버스 메시지 수 (counter)
pub const MESSAGES_RECEIVED_TOTAL: &str = "trackgate_messages_received_total";

/// 디코딩된 탐지 이벤트 수 (counter, label: variant)
pub const EVENTS_DECODED_TOTAL: &str = "trackgate_events_decoded_total";

/// 건너뛴 페이로드 엔트리 수 (counter, label: variant)
pub const DECODE_SKIPS_TOTAL: &str = "trackgate_decode_skips_total";

/// 원문 폴백 경로로 전달된 메시지 수 (counter)
pub const RAW_FALLBACK_TOTAL: &str = "trackgate_raw_fallback_total";

/// 싱크 처리 실패 수 (counter, label: sink)
pub const SINK_ERRORS_TOTAL: &str = "trackgate_sink_errors_total";

/// 브로커 재연결 시도 수 (counter)
pub const RECONNECTS_TOTAL: &str = "trackgate_reconnects_total";

/// 모든 메트릭의 설명(description)을 등록합니다.
///
/// Prometheus HELP 텍스트 설정용으로, 전역 레코더 설치 후
/// `trackgate-daemon` 시작 시점에서 한 번 호출합니다.
pub fn describe_all() {
    use metrics::describe_counter;

    describe_counter!(
        MESSAGES_RECEIVED_TOTAL,
        "Total number of bus messages received"
    );
    describe_counter!(
        EVENTS_DECODED_TOTAL,
        "Detection events decoded, labelled by payload variant"
    );
    describe_counter!(
        DECODE_SKIPS_TOTAL,
        "Payload entries skipped during decoding, labelled by payload variant"
    );
    describe_counter!(
        RAW_FALLBACK_TOTAL,
        "Messages routed to the raw fallback path"
    );
    describe_counter!(SINK_ERRORS_TOTAL, "Sink delivery failures, labelled by sink");
    describe_counter!(RECONNECTS_TOTAL, "Broker reconnect attempts");
}
