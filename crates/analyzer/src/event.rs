//! 분석 진행 이벤트
//!
//! 분석기는 진행 상황을 [`AnalysisEvent`]로 선택적 채널에 보냅니다.
//! 한 번의 분석 실행에서 나온 이벤트는 모두 같은 trace ID를 가집니다.

use std::fmt;

use serde::Serialize;
use tokio::sync::mpsc;

use distfinder_core::event::{EVENT_TYPE_ANALYSIS, Event, EventMetadata, MODULE_ANALYZER};
use distfinder_core::types::ChecksumType;

/// 이벤트 종류
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnalysisEventKind {
    /// 루트 입력 분석 시작
    InputStarted { input: String },
    /// 체크섬 계산 또는 캐시 복원 완료
    ChecksumsComputed {
        input: String,
        checksum_type: ChecksumType,
        count: usize,
        from_cache: bool,
    },
    /// 중첩 아카이브 열림
    ArchiveOpened { path: String, depth: usize },
    /// 파일 에러 기록
    FileFailed { path: String, message: String },
    /// 루트 입력 분석 완료
    InputFinished { input: String },
    /// 전체 분석 완료
    AnalysisFinished {
        checksums: usize,
        file_errors: usize,
    },
}

/// 분석 진행 이벤트
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisEvent {
    /// 이벤트 고유 ID
    pub id: String,
    /// 이벤트 메타데이터
    pub metadata: EventMetadata,
    /// 이벤트 종류와 내용
    pub kind: AnalysisEventKind,
}

impl AnalysisEvent {
    /// 주어진 trace ID로 이벤트를 생성합니다.
    pub fn with_trace(kind: AnalysisEventKind, trace_id: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            metadata: EventMetadata::new(MODULE_ANALYZER, trace_id),
            kind,
        }
    }
}

impl Event for AnalysisEvent {
    fn event_id(&self) -> &str {
        &self.id
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }

    fn event_type(&self) -> &str {
        EVENT_TYPE_ANALYSIS
    }
}

impl fmt::Display for AnalysisEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AnalysisEvent[{}] {:?}", self.id, self.kind)
    }
}

/// 이벤트 수신측
pub type EventReceiver = mpsc::UnboundedReceiver<AnalysisEvent>;

/// 이벤트 송신 도우미
///
/// 채널이 없거나 수신측이 닫혀도 에러가 되지 않습니다.
#[derive(Debug, Clone)]
pub(crate) struct EventEmitter {
    tx: Option<mpsc::UnboundedSender<AnalysisEvent>>,
    trace_id: String,
}

impl EventEmitter {
    pub(crate) fn new(tx: Option<mpsc::UnboundedSender<AnalysisEvent>>) -> Self {
        Self {
            tx,
            trace_id: uuid::Uuid::new_v4().to_string(),
        }
    }

    pub(crate) fn emit(&self, kind: AnalysisEventKind) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(AnalysisEvent::with_trace(kind, &self.trace_id));
        }
    }
}
