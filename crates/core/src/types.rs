//! 도메인 타입 -- 체크섬 매핑 결과를 표현하는 공통 타입
//!
//! 분석기, CLI, 캐시가 모두 이 타입들로 결과를 주고받습니다.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

/// 다이제스트 종류
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ChecksumType {
    /// MD5 (128-bit)
    Md5,
    /// SHA-1 (160-bit)
    Sha1,
    /// SHA-256 (256-bit)
    Sha256,
}

impl ChecksumType {
    /// 지원하는 모든 다이제스트 종류
    pub const ALL: [ChecksumType; 3] = [Self::Md5, Self::Sha1, Self::Sha256];

    /// 소문자 이름을 반환합니다 (파일명, 캐시 네임스페이스에 사용).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Md5 => "md5",
            Self::Sha1 => "sha1",
            Self::Sha256 => "sha256",
        }
    }

    /// 16진수 문자열 길이
    pub fn hex_len(&self) -> usize {
        match self {
            Self::Md5 => 32,
            Self::Sha1 => 40,
            Self::Sha256 => 64,
        }
    }

    /// 대소문자 구분 없이 문자열에서 변환합니다.
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "md5" => Some(Self::Md5),
            "sha1" | "sha-1" => Some(Self::Sha1),
            "sha256" | "sha-256" => Some(Self::Sha256),
            _ => None,
        }
    }
}

impl fmt::Display for ChecksumType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 물리적 파일 하나의 출현 위치
///
/// `filename`은 루트 입력 기준으로 정규화된 경로입니다
/// (중첩 아카이브는 `lib/inner.jar!/META-INF/MANIFEST.MF` 형식).
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct LocalFile {
    /// 정규화된 파일 경로
    pub filename: String,
    /// 파일 크기 (바이트)
    pub size: u64,
}

impl LocalFile {
    pub fn new(filename: impl Into<String>, size: u64) -> Self {
        Self {
            filename: filename.into(),
            size,
        }
    }
}

impl fmt::Display for LocalFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} bytes)", self.filename, self.size)
    }
}

/// 파일 하나에 대한 특정 다이제스트 결과
///
/// 생성 후 변경되지 않으며, (파일, 다이제스트 종류) 쌍마다 하나씩 존재합니다.
/// 네 필드 모두로 비교/해시되므로 동일 튜플의 중복 병합을 걸러낼 수 있습니다.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Checksum {
    /// 다이제스트 종류
    #[serde(rename = "type")]
    pub checksum_type: ChecksumType,
    /// 소문자 16진수 값
    pub value: String,
    /// 정규화된 파일 경로
    pub filename: String,
    /// 파일 크기 (바이트)
    pub file_size: u64,
}

impl Checksum {
    pub fn new(
        checksum_type: ChecksumType,
        value: impl Into<String>,
        filename: impl Into<String>,
        file_size: u64,
    ) -> Self {
        Self {
            checksum_type,
            value: value.into(),
            filename: filename.into(),
            file_size,
        }
    }

    /// 캐시/맵 엔트리 (값, 파일)로부터 체크섬을 재구성합니다.
    pub fn from_entry(checksum_type: ChecksumType, value: &str, file: &LocalFile) -> Self {
        Self::new(checksum_type, value, file.filename.clone(), file.size)
    }

    /// 이 체크섬이 가리키는 파일 출현 위치
    pub fn local_file(&self) -> LocalFile {
        LocalFile::new(self.filename.clone(), self.file_size)
    }

    /// 집합에서 특정 종류의 체크섬을 찾습니다.
    pub fn find_by_type<'a>(
        checksums: impl IntoIterator<Item = &'a Checksum>,
        checksum_type: ChecksumType,
    ) -> Option<&'a Checksum> {
        checksums
            .into_iter()
            .find(|c| c.checksum_type == checksum_type)
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{} {} ({} bytes)",
            self.checksum_type, self.value, self.filename, self.file_size
        )
    }
}

/// 한 다이제스트 종류의 값 → 파일 집합 매핑
///
/// 순서 있는 컬렉션을 사용하므로 JSON 덤프 결과가 항상 동일합니다.
pub type ChecksumMap = BTreeMap<String, BTreeSet<LocalFile>>;

/// 치명적이지 않은 파일 단위 실패
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileError {
    /// 정규화된 파일 경로
    pub path: String,
    /// 실패 사유 (원인 체인을 `: `로 연결)
    pub message: String,
}

impl FileError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}
