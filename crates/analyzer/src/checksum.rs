//! 체크섬 엔진 -- 한 번의 스트리밍으로 요청된 모든 다이제스트 계산
//!
//! 파일 내용을 64 KiB 버퍼로 읽으며 md5, sha1, sha256을 동시에 갱신합니다.
//! 포함 정책([`InclusionPolicy`])도 이 모듈에서 정의합니다.

use std::collections::BTreeSet;
use std::io::Read;

use md5::Md5;
use regex::Regex;
use sha1::Sha1;
use sha2::{Digest, Sha256};

use distfinder_core::types::{Checksum, ChecksumType};

use crate::error::AnalyzerError;
use crate::vfs::{Node, VirtualFileSystem};

/// 스트리밍 버퍼 크기 (64 KiB)
pub const BUFFER_SIZE: usize = 64 * 1024;

/// 허용 목록에 없어도 항상 포함되는 확장자
const ALWAYS_INCLUDED_EXTENSION: &str = "rpm";

enum Hasher {
    Md5(Md5),
    Sha1(Sha1),
    Sha256(Sha256),
}

impl Hasher {
    fn new(checksum_type: ChecksumType) -> Self {
        match checksum_type {
            ChecksumType::Md5 => Self::Md5(Md5::new()),
            ChecksumType::Sha1 => Self::Sha1(Sha1::new()),
            ChecksumType::Sha256 => Self::Sha256(Sha256::new()),
        }
    }

    fn update(&mut self, data: &[u8]) {
        match self {
            Self::Md5(h) => h.update(data),
            Self::Sha1(h) => h.update(data),
            Self::Sha256(h) => h.update(data),
        }
    }

    fn finalize_hex(self) -> String {
        match self {
            Self::Md5(h) => hex::encode(h.finalize()),
            Self::Sha1(h) => hex::encode(h.finalize()),
            Self::Sha256(h) => hex::encode(h.finalize()),
        }
    }
}

/// 다이제스트 계산 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Digests {
    /// (종류, 16진 값)
    pub values: Vec<(ChecksumType, String)>,
    /// 읽은 바이트 수
    pub size: u64,
}

/// 체크섬 엔진
#[derive(Debug, Clone)]
pub struct ChecksumEngine {
    types: BTreeSet<ChecksumType>,
}

impl ChecksumEngine {
    /// 계산할 다이제스트 종류로 생성합니다.
    pub fn new(types: impl IntoIterator<Item = ChecksumType>) -> Self {
        Self {
            types: types.into_iter().collect(),
        }
    }

    pub fn checksum_types(&self) -> &BTreeSet<ChecksumType> {
        &self.types
    }

    /// 리더의 내용을 끝까지 읽어 다이제스트를 계산합니다.
    pub fn digest_reader<R: Read>(&self, mut reader: R) -> std::io::Result<Digests> {
        let mut hashers: Vec<(ChecksumType, Hasher)> =
            self.types.iter().map(|t| (*t, Hasher::new(*t))).collect();

        let mut buf = vec![0u8; BUFFER_SIZE];
        let mut size = 0u64;
        loop {
            let n = match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            for (_, hasher) in &mut hashers {
                hasher.update(&buf[..n]);
            }
            size += n as u64;
        }

        let values = hashers
            .into_iter()
            .map(|(t, h)| (t, h.finalize_hex()))
            .collect();
        Ok(Digests { values, size })
    }

    /// 노드의 체크섬을 계산합니다.
    ///
    /// 파일명은 `root_prefix` 기준으로 정규화된 경로입니다.
    pub fn compute(
        &self,
        vfs: &dyn VirtualFileSystem,
        node: &Node,
        root_prefix: &str,
    ) -> Result<BTreeSet<Checksum>, AnalyzerError> {
        let filename = normalize_path(node.path(), root_prefix);
        let reader = vfs.open_content(node).map_err(|e| match e {
            AnalyzerError::Io { source, .. } => AnalyzerError::Checksum {
                path: filename.clone(),
                source,
            },
            other => other,
        })?;

        let digests = self
            .digest_reader(reader)
            .map_err(|source| AnalyzerError::Checksum {
                path: filename.clone(),
                source,
            })?;

        Ok(digests
            .values
            .into_iter()
            .map(|(t, value)| Checksum::new(t, value, filename.clone(), digests.size))
            .collect())
    }
}

/// 경로에서 루트 접두어를 제거합니다.
pub fn normalize_path(path: &str, root_prefix: &str) -> String {
    path.strip_prefix(root_prefix).unwrap_or(path).to_owned()
}

/// 파일 포함 정책
///
/// 제외된 파일도 순회(아카이브 열기)는 계속되며, 체크섬 맵과
/// 파일 에러 목록에만 나타나지 않습니다.
#[derive(Debug, Clone, Default)]
pub struct InclusionPolicy {
    archive_extensions: Vec<String>,
    excludes: Vec<Regex>,
}

impl InclusionPolicy {
    /// 허용 확장자 목록과 컴파일된 제외 패턴으로 생성합니다.
    ///
    /// 제외 패턴은 전체 경로와 일치해야 하므로 `^(?:...)$`로 감싸 컴파일되어
    /// 있어야 합니다.
    pub fn new(archive_extensions: Vec<String>, excludes: Vec<Regex>) -> Self {
        Self {
            archive_extensions,
            excludes,
        }
    }

    /// 정규화된 경로의 파일을 체크섬 대상에 포함할지 판단합니다.
    pub fn include_file(&self, node: &Node, normalized_path: &str) -> bool {
        let extension = node.extension();
        if !self.archive_extensions.is_empty()
            && !self.archive_extensions.iter().any(|e| e == extension)
            && extension != ALWAYS_INCLUDED_EXTENSION
        {
            return false;
        }
        !self.excludes.iter().any(|re| re.is_match(normalized_path))
    }
}
