//! JSONL 싱크 — append-only 파일에 이벤트당 한 줄 JSON 객체를 씁니다.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use trackgate_core::error::SinkError;
use trackgate_core::event::DetectionEvent;
use trackgate_core::pipeline::DetectionSink;

/// 파일 기반 JSONL 싱크.
///
/// 파일은 생성 시 한 번 append 모드로 열리고 프로세스 수명 동안
/// 유지됩니다. 쓰기마다 뮤텍스를 잡으므로 여러 태스크가 공유해도
/// 레코드가 섞이지 않습니다.
pub struct JsonlSink {
    path: PathBuf,
    file: Mutex<File>,
}

impl JsonlSink {
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

impl DetectionSink for JsonlSink {
    fn name(&self) -> &str {
        "jsonl"
    }

    fn handle(&self, event: &DetectionEvent) -> Result<(), SinkError> {
        let line = serde_json::to_string(event)?;
        let mut file = self.file.lock().map_err(|_| SinkError::Write {
            sink: "jsonl".to_owned(),
            reason: "lock poisoned".to_owned(),
        })?;
        file.write_all(line.as_bytes())?;
        file.write_all(b"\n")?;
        Ok(())
    }
}
