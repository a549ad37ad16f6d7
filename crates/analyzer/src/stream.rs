//! 결과 스트림 -- 주 다이제스트 체크섬의 실시간 전달
//!
//! 분석기는 병합된 주 다이제스트 체크섬을 즉시 채널에 넣고,
//! 실행이 끝나면 (성공이든 실패든) 정확히 한 번 [`StreamItem::Done`]을 넣습니다.
//! 채널은 무제한이므로 생산자는 블로킹되지 않습니다.

use tokio::sync::mpsc;
use tracing::debug;

use distfinder_core::types::{Checksum, ChecksumType};

/// 스트림 항목
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamItem {
    /// 병합된 주 다이제스트 체크섬
    Checksum(Checksum),
    /// 종료 표시 (항상 마지막, 정확히 한 번)
    Done,
}

/// 스트림 수신측
pub type ChecksumReceiver = mpsc::UnboundedReceiver<StreamItem>;

/// 스트림 송신측
///
/// drop 시 아직 종료 표시를 보내지 않았다면 보냅니다.
#[derive(Debug)]
pub struct ResultStream {
    tx: Option<mpsc::UnboundedSender<StreamItem>>,
    primary: Option<ChecksumType>,
    finished: bool,
    disconnected: bool,
    pushed: u64,
}

impl ResultStream {
    /// 주 다이제스트 종류에 대한 스트림과 수신측을 생성합니다.
    pub fn channel(primary: ChecksumType) -> (Self, ChecksumReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        let stream = Self {
            tx: Some(tx),
            primary: Some(primary),
            finished: false,
            disconnected: false,
            pushed: 0,
        };
        (stream, rx)
    }

    /// 비활성 스트림 (아무것도 보내지 않음)
    pub fn disabled() -> Self {
        Self {
            tx: None,
            primary: None,
            finished: true,
            disconnected: false,
            pushed: 0,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.tx.is_some()
    }

    /// 주 다이제스트 종류
    pub fn primary(&self) -> Option<ChecksumType> {
        self.primary
    }

    /// 체크섬을 보냅니다. 주 다이제스트 종류가 아니면 무시합니다.
    pub fn push(&mut self, checksum: &Checksum) {
        if self.finished || Some(checksum.checksum_type) != self.primary {
            return;
        }
        self.send(StreamItem::Checksum(checksum.clone()));
        self.pushed += 1;
    }

    /// 종료 표시를 보냅니다. 두 번째 호출부터는 아무 일도 하지 않습니다.
    pub fn finish(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        self.send(StreamItem::Done);
    }

    /// 지금까지 보낸 체크섬 수
    pub fn pushed(&self) -> u64 {
        self.pushed
    }

    fn send(&mut self, item: StreamItem) {
        let Some(tx) = &self.tx else {
            return;
        };
        if tx.send(item).is_err() && !self.disconnected {
            self.disconnected = true;
            debug!("checksum stream receiver dropped, discarding further items");
        }
    }
}

impl Drop for ResultStream {
    fn drop(&mut self) {
        self.finish();
    }
}

/// 종료 표시가 올 때까지 모든 체크섬을 수집합니다.
///
/// 종료 표시 없이 송신측이 닫히면 그때까지 받은 항목을 반환합니다.
pub async fn collect_until_done(rx: &mut ChecksumReceiver) -> Vec<Checksum> {
    let mut checksums = Vec::new();
    while let Some(item) = rx.recv().await {
        match item {
            StreamItem::Checksum(checksum) => checksums.push(checksum),
            StreamItem::Done => break,
        }
    }
    checksums
}
