//! 가상 파일시스템 -- 로컬 경로와 중첩 아카이브 레이어
//!
//! [`VirtualFileSystem`] trait은 루트 입력 해석, 폴더 나열, 파일 내용 스트리밍,
//! 아카이브 노드를 중첩 파일시스템([`LayerGuard`])으로 여는 기능을 제공합니다.
//!
//! # 경로 형식
//!
//! 레이어 안의 경로는 컨테이너 경로 뒤에 `!/`를 붙여 이어집니다.
//!
//! ```text
//! /srv/dist.zip                         (로컬 파일)
//! /srv/dist.zip!/                       (dist.zip 레이어의 루트 폴더)
//! /srv/dist.zip!/lib/inner.jar!/A.class (중첩 레이어 안의 파일)
//! ```
//!
//! # 확장
//!
//! 다른 저장소(원격 저장소, 추가 압축 형식)를 지원하려면 이 trait을 구현하고
//! `DistributionAnalyzerBuilder::vfs()`로 등록합니다.

pub mod local;

use std::io::Read;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use bytes::Bytes;
use tracing::trace;

use crate::error::AnalyzerError;

pub use local::LocalVfs;

/// 레이어 구분자
pub const LAYER_SEPARATOR: &str = "!/";

/// 노드를 담고 있는 파일시스템의 스킴
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    /// 로컬 파일시스템
    File,
    /// zip 계열 (zip, jar, war, ...)
    Zip,
    /// tar (압축 tar 포함)
    Tar,
    /// 단일 파일 gzip
    Gzip,
    /// 단일 파일 bzip2
    Bzip2,
}

impl Scheme {
    /// 스킴 이름을 반환합니다.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Zip => "zip",
            Self::Tar => "tar",
            Self::Gzip => "gz",
            Self::Bzip2 => "bz2",
        }
    }
}

/// 노드 내용의 위치
#[derive(Debug, Clone)]
pub enum NodeContent {
    /// 로컬 디스크의 파일
    Path(std::path::PathBuf),
    /// 로컬 디스크의 디렉토리
    Directory(std::path::PathBuf),
    /// 레이어에서 디코딩된 파일 내용
    Bytes(Bytes),
    /// 레이어 안의 폴더와 그 자식들
    Folder(Vec<Node>),
}

/// 가상 파일시스템의 파일 또는 폴더
#[derive(Debug, Clone)]
pub struct Node {
    path: String,
    name: String,
    size: u64,
    scheme: Scheme,
    content: NodeContent,
}

impl Node {
    /// 새 노드를 생성합니다.
    pub fn new(
        path: impl Into<String>,
        name: impl Into<String>,
        size: u64,
        scheme: Scheme,
        content: NodeContent,
    ) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            size,
            scheme,
            content,
        }
    }

    /// 전체 경로 (레이어 구분자 포함)
    pub fn path(&self) -> &str {
        &self.path
    }

    /// 기본 이름
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 크기 (바이트, 폴더는 0)
    pub fn size(&self) -> u64 {
        self.size
    }

    /// 이 노드를 담고 있는 파일시스템의 스킴
    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    pub fn content(&self) -> &NodeContent {
        &self.content
    }

    /// 파일 여부
    pub fn is_file(&self) -> bool {
        matches!(self.content, NodeContent::Path(_) | NodeContent::Bytes(_))
    }

    /// 폴더 여부
    pub fn is_folder(&self) -> bool {
        !self.is_file()
    }

    /// 레이어 루트 폴더 여부 (경로가 `!/`로 끝남)
    pub fn is_layer_root(&self) -> bool {
        self.path.ends_with(LAYER_SEPARATOR)
    }

    /// 확장자 (마지막 `.` 이후, 없으면 빈 문자열)
    ///
    /// `dist.tar.gz`의 확장자는 `gz`입니다.
    pub fn extension(&self) -> &str {
        match self.name.rfind('.') {
            Some(idx) => &self.name[idx + 1..],
            None => "",
        }
    }
}

/// 열린 중첩 파일시스템
///
/// 스코프를 벗어나면 (에러 경로 포함) 자동으로 닫히며,
/// 추적 카운터가 연결된 경우 열린 레이어 수가 감소합니다.
#[derive(Debug)]
pub struct LayerGuard {
    root: Node,
    rejected: Vec<(String, AnalyzerError)>,
    tracker: Option<Arc<AtomicUsize>>,
}

impl LayerGuard {
    /// 루트 폴더와 거부된 엔트리 목록으로 레이어를 생성합니다.
    pub fn new(root: Node, rejected: Vec<(String, AnalyzerError)>) -> Self {
        Self {
            root,
            rejected,
            tracker: None,
        }
    }

    /// 열린 레이어 카운터를 연결합니다.
    pub fn tracked(mut self, tracker: Arc<AtomicUsize>) -> Self {
        tracker.fetch_add(1, Ordering::SeqCst);
        self.tracker = Some(tracker);
        self
    }

    /// 레이어 루트 폴더
    pub fn root(&self) -> &Node {
        &self.root
    }

    /// 디코딩 중 거부된 엔트리 (경로, 사유)를 가져갑니다.
    pub fn take_rejected(&mut self) -> Vec<(String, AnalyzerError)> {
        std::mem::take(&mut self.rejected)
    }
}

impl Drop for LayerGuard {
    fn drop(&mut self) {
        if let Some(tracker) = &self.tracker {
            tracker.fetch_sub(1, Ordering::SeqCst);
        }
        trace!(path = %self.root.path, "layer closed");
    }
}

/// 가상 파일시스템 trait
///
/// 구현체는 여러 워커 스레드에서 동시에 내용을 읽을 수 있어야 합니다.
pub trait VirtualFileSystem: Send + Sync {
    /// 이 파일시스템이 중첩 레이어로 열 수 있는 스킴(확장자) 목록
    fn schemes(&self) -> &[&'static str];

    /// 입력 로케이터(경로 또는 `file://` URI)를 루트 노드로 해석합니다.
    fn resolve(&self, locator: &str) -> Result<Node, AnalyzerError>;

    /// 폴더의 직계 자식을 이름 순으로 반환합니다.
    fn children(&self, folder: &Node) -> Result<Vec<Node>, AnalyzerError>;

    /// 파일 내용을 스트림으로 엽니다.
    fn open_content(&self, file: &Node) -> Result<Box<dyn Read + Send>, AnalyzerError>;

    /// 아카이브 파일을 중첩 파일시스템으로 엽니다.
    fn open_layer(&self, file: &Node) -> Result<LayerGuard, AnalyzerError>;
}
