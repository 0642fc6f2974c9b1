//! 디코더 → 팬아웃 → 파일 싱크 전 구간 시나리오 테스트.

use std::sync::Mutex;

use trackgate_core::config::SinkConfig;
use trackgate_core::error::SinkError;
use trackgate_core::event::DetectionEvent;
use trackgate_core::pipeline::DetectionSink;
use trackgate_ingest::decoder::DecoderRouter;
use trackgate_ingest::sink::{FanoutSink, JsonlSink, RawLogSink, build_sinks};

struct FailingSink;

impl DetectionSink for FailingSink {
    fn name(&self) -> &str {
        "failing"
    }
    fn handle(&self, _event: &DetectionEvent) -> Result<(), SinkError> {
        Err(SinkError::Write {
            sink: "failing".to_owned(),
            reason: "disk full".to_owned(),
        })
    }
    fn handle_raw(&self, _topic: &str, _text: &str) -> Result<(), SinkError> {
        Err(SinkError::Write {
            sink: "failing".to_owned(),
            reason: "disk full".to_owned(),
        })
    }
}

struct CollectingSink {
    events: Mutex<Vec<DetectionEvent>>,
}

impl CollectingSink {
    fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }
}

impl DetectionSink for &'static CollectingSink {
    fn name(&self) -> &str {
        "collecting"
    }
    fn handle(&self, event: &DetectionEvent) -> Result<(), SinkError> {
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }
}

#[test]
fn object_list_payload_lands_in_jsonl_file() {
    let dir = tempfile::tempdir().unwrap();
    let jsonl_path = dir.path().join("events.jsonl");

    let router = DecoderRouter::with_defaults();
    let fanout =
        FanoutSink::new().with_sink(Box::new(JsonlSink::new(&jsonl_path).unwrap()));

    let payload = br#"{
        "@timestamp": "2024-01-15T12:00:00.123Z",
        "sensorId": "cam-01",
        "objects": ["7|10|20|110|220|person", "8|30|40|130|240|car"]
    }"#;

    let events = router.decode("ds/events", payload);
    assert_eq!(events.len(), 2);
    for event in &events {
        fanout.handle(event).unwrap();
    }

    let body = std::fs::read_to_string(&jsonl_path).unwrap();
    let lines: Vec<&str> = body.lines().collect();
    assert_eq!(lines.len(), 2);

    let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(first["ts"], "2024-01-15T12:00:00.123Z");
    assert_eq!(first["topic"], "ds/events");
    assert_eq!(first["sensor"], "cam-01");
    assert_eq!(first["track_id"], "7");
    assert_eq!(first["bbox"], serde_json::json!([10.0, 20.0, 110.0, 220.0]));
    assert_eq!(first["cls"], "person");
    assert_eq!(first["conf"], serde_json::Value::Null);

    let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
    assert_eq!(second["track_id"], "8");
    assert_eq!(second["cls"], "car");
}

#[test]
fn single_object_payload_normalizes_without_class() {
    let router = DecoderRouter::with_defaults();
    let payload = br#"{
        "sensor": {"id": "gate-3"},
        "object": {
            "id": 3,
            "bbox": {"topleftx": 1, "toplefty": 2, "bottomrightx": 5, "bottomrighty": 6},
            "person": {"confidence": 0.87}
        }
    }"#;

    let events = router.decode("ds/door", payload);
    assert_eq!(events.len(), 1);
    let event = &events[0];
    assert_eq!(event.track_id, "3");
    assert_eq!(event.sensor.as_deref(), Some("gate-3"));
    assert_eq!(event.bbox.0, 1.0);
    assert_eq!(event.bbox.3, 6.0);
    assert_eq!(event.cls, None);
    assert_eq!(event.conf, Some(0.87));
}

#[test]
fn undecodable_payload_goes_to_raw_log() {
    let dir = tempfile::tempdir().unwrap();
    let raw_path = dir.path().join("raw.log");

    let router = DecoderRouter::with_defaults();
    let sink = RawLogSink::new(&raw_path).unwrap();

    let payload = b"not json at all";
    let events = router.decode("ds/events", payload);
    assert!(events.is_empty());

    sink.handle_raw("ds/events", std::str::from_utf8(payload).unwrap())
        .unwrap();

    let body = std::fs::read_to_string(&raw_path).unwrap();
    let line = body.lines().next().unwrap();
    assert!(line.starts_with('['));
    assert!(line.ends_with("ds/events not json at all"));
}

#[test]
fn failing_sink_does_not_starve_healthy_sinks() {
    static COLLECTOR: std::sync::OnceLock<CollectingSink> = std::sync::OnceLock::new();
    let collector = COLLECTOR.get_or_init(CollectingSink::new);

    let fanout = FanoutSink::new()
        .with_sink(Box::new(FailingSink))
        .with_sink(Box::new(collector));

    let router = DecoderRouter::with_defaults();
    let events = router.decode(
        "ds/events",
        br#"{"objects": ["7|10|20|110|220|person"]}"#,
    );
    assert_eq!(events.len(), 1);
    fanout.handle(&events[0]).unwrap();

    let collected = collector.events.lock().unwrap();
    assert_eq!(collected.len(), 1);
    assert_eq!(collected[0].track_id, "7");
}

#[test]
fn build_sinks_wires_configured_backends() {
    let dir = tempfile::tempdir().unwrap();
    let config = SinkConfig {
        console: true,
        pretty: false,
        jsonl_path: Some(dir.path().join("events.jsonl").display().to_string()),
        raw_log_path: Some(dir.path().join("raw.log").display().to_string()),
    };
    let fanout = build_sinks(&config).unwrap();
    assert_eq!(fanout.len(), 3);
}

#[test]
fn jsonl_record_round_trips_through_serde() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("events.jsonl");
    let sink = JsonlSink::new(&path).unwrap();

    let router = DecoderRouter::with_defaults();
    let events = router.decode(
        "ds/events",
        br#"{"@timestamp": "2024-01-15T12:00:00.123Z", "objects": ["7|10|20|110.5|220|person|a|b|c|d|e|f|0.91"]}"#,
    );
    assert_eq!(events.len(), 1);
    sink.handle(&events[0]).unwrap();

    let body = std::fs::read_to_string(&path).unwrap();
    let restored: DetectionEvent = serde_json::from_str(body.trim_end()).unwrap();
    assert_eq!(restored.track_id, events[0].track_id);
    assert_eq!(restored.bbox, events[0].bbox);
    assert_eq!(restored.conf, Some(0.91));
    assert_eq!(restored.ts, events[0].ts);
}
