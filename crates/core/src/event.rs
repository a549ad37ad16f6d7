//! 이벤트 시스템 -- 진행 상황 통지의 기본 단위
//!
//! 분석기는 진행 상황을 콜백 대신 이벤트 값으로 채널에 전송합니다.
//! [`EventMetadata`]는 모든 이벤트에 공통으로 포함되는 메타데이터이며,
//! [`Event`] trait은 모든 이벤트 타입이 구현해야 하는 인터페이스입니다.

use std::fmt;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

// --- 모듈명 상수 ---

/// 배포본 분석기 모듈명
pub const MODULE_ANALYZER: &str = "distribution-analyzer";

// --- 이벤트 타입 상수 ---

/// 분석 진행 이벤트 타입
pub const EVENT_TYPE_ANALYSIS: &str = "analysis";

/// 이벤트 메타데이터 -- 모든 이벤트에 공통으로 포함되는 추적 정보
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMetadata {
    /// 이벤트 발생 시각
    pub timestamp: SystemTime,
    /// 이벤트를 생성한 모듈명
    pub source_module: String,
    /// 추적 ID -- 같은 분석 실행의 이벤트를 연결합니다
    pub trace_id: String,
}

impl EventMetadata {
    /// 기존 trace_id를 사용하여 새 메타데이터를 생성합니다.
    ///
    /// 하나의 분석 실행 안에서 동일한 추적 ID를 유지할 때 사용합니다.
    pub fn new(source_module: impl Into<String>, trace_id: impl Into<String>) -> Self {
        Self {
            timestamp: SystemTime::now(),
            source_module: source_module.into(),
            trace_id: trace_id.into(),
        }
    }

    /// 새로운 UUID v4 trace_id를 생성하여 메타데이터를 만듭니다.
    pub fn with_new_trace(source_module: impl Into<String>) -> Self {
        Self {
            timestamp: SystemTime::now(),
            source_module: source_module.into(),
            trace_id: uuid::Uuid::new_v4().to_string(),
        }
    }
}

impl fmt::Display for EventMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] source={} trace={}",
            unix_timestamp_str(self.timestamp),
            self.source_module,
            self.trace_id,
        )
    }
}

/// 모든 이벤트가 구현해야 하는 기본 trait
///
/// `Send + Sync + 'static` 바운드로 `tokio::mpsc` 채널을 통한
/// 안전한 전송을 보장합니다.
pub trait Event: Send + Sync + 'static {
    /// 이벤트 고유 ID (UUID v4)
    fn event_id(&self) -> &str;

    /// 이벤트 메타데이터 (timestamp, source_module, trace_id)
    fn metadata(&self) -> &EventMetadata;

    /// 이벤트 타입명 (로깅 및 라우팅에 사용)
    fn event_type(&self) -> &str;
}

fn unix_timestamp_str(time: SystemTime) -> String {
    match time.duration_since(SystemTime::UNIX_EPOCH) {
        Ok(duration) => {
            let secs = duration.as_secs();
            format!("{secs}")
        }
        Err(_) => "unknown".to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_new_trace_generates_uuid() {
        let a = EventMetadata::with_new_trace(MODULE_ANALYZER);
        let b = EventMetadata::with_new_trace(MODULE_ANALYZER);
        assert_eq!(a.source_module, "distribution-analyzer");
        assert_eq!(a.trace_id.len(), 36);
        assert_ne!(a.trace_id, b.trace_id);
    }

    #[test]
    fn new_keeps_trace_id() {
        let meta = EventMetadata::new(MODULE_ANALYZER, "trace-1");
        assert_eq!(meta.trace_id, "trace-1");
    }

    #[test]
    fn display_contains_source_and_trace() {
        let meta = EventMetadata::new(MODULE_ANALYZER, "trace-42");
        let s = meta.to_string();
        assert!(s.contains("source=distribution-analyzer"));
        assert!(s.contains("trace=trace-42"));
    }

    #[test]
    fn unix_timestamp_before_epoch_is_unknown() {
        let before = SystemTime::UNIX_EPOCH - std::time::Duration::from_secs(1);
        assert_eq!(unix_timestamp_str(before), "unknown");
    }
}
