//! 원문 로그 싱크 — 디코딩에 실패한 페이로드를 텍스트 파일에 보존합니다.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{SecondsFormat, Utc};

use trackgate_core::error::SinkError;
use trackgate_core::pipeline::DetectionSink;

/// 인식 불가 페이로드를 `[수신시각] 토픽 본문` 형태로 append 하는 싱크.
///
/// 정규화된 이벤트에는 관심이 없으므로 [`DetectionSink::handle`]은
/// 아무것도 하지 않습니다.
pub struct RawLogSink {
    path: PathBuf,
    file: Mutex<File>,
}

impl RawLogSink {
    /// 대상 파일을 append 모드로 엽니다. 상위 디렉터리가 없으면
    /// 먼저 생성합니다.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, SinkError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    /// 기록 대상 경로를 반환합니다.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DetectionSink for RawLogSink {
    fn name(&self) -> &str {
        "raw_log"
    }

    fn handle(&self, _event: &trackgate_core::event::DetectionEvent) -> Result<(), SinkError> {
        Ok(())
    }

    fn handle_raw(&self, topic: &str, text: &str) -> Result<(), SinkError> {
        let ts = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let mut file = self.file.lock().map_err(|_| SinkError::Write {
            sink: "raw_log".to_owned(),
            reason: "lock poisoned".to_owned(),
        })?;
        writeln!(file, "[{ts}] {topic} {text}")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use trackgate_core::event::{BBox, DetectionEvent};

    #[test]
    fn appends_timestamped_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("raw.log");
        let sink = RawLogSink::new(&path).unwrap();
        assert_eq!(sink.path(), path);

        sink.handle_raw("ds/events", "not json at all").unwrap();
        sink.handle_raw("ds/events", "{\"weird\": 1}").unwrap();

        let body = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = body.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with('['));
        assert!(lines[0].ends_with("ds/events not json at all"));
        assert!(lines[1].ends_with("ds/events {\"weird\": 1}"));
    }

    #[test]
    fn timestamp_prefix_is_rfc3339_millis() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("raw.log");
        let sink = RawLogSink::new(&path).unwrap();
        sink.handle_raw("t", "x").unwrap();

        let body = std::fs::read_to_string(&path).unwrap();
        let line = body.lines().next().unwrap();
        let end = line.find(']').unwrap();
        let stamp = &line[1..end];
        assert!(chrono::DateTime::parse_from_rfc3339(stamp).is_ok());
        assert!(stamp.ends_with('Z'));
    }

    #[test]
    fn normalized_events_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("raw.log");
        let sink = RawLogSink::new(&path).unwrap();

        let event = DetectionEvent {
            ts: Utc::now(),
            topic: "t".to_owned(),
            sensor: None,
            track_id: "1".to_owned(),
            bbox: BBox(0.0, 0.0, 1.0, 1.0),
            cls: None,
            conf: None,
        };
        sink.handle(&event).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
    }
}
