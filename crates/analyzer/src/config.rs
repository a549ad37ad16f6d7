//! 배포본 분석기 설정
//!
//! [`DistributionAnalyzerConfig`]는 core의
//! [`AnalyzerConfig`](distfinder_core::config::AnalyzerConfig)를 타입이 있는
//! 형태로 변환한 설정입니다 (다이제스트 종류 집합, 경로, 선택적 캐시).
//!
//! # 사용 예시
//!
//! ```
//! use distfinder_analyzer::DistributionAnalyzerConfig;
//!
//! // 기본값으로 생성
//! let config = DistributionAnalyzerConfig::default();
//! config.validate().unwrap();
//!
//! // 빌더로 생성
//! use distfinder_analyzer::DistributionAnalyzerConfigBuilder;
//! use distfinder_core::types::ChecksumType;
//!
//! let config = DistributionAnalyzerConfigBuilder::new()
//!     .checksum_types([ChecksumType::Sha256])
//!     .disable_recursion(true)
//!     .exclude(r".*\.bak")
//!     .build()
//!     .unwrap();
//! ```

use std::collections::BTreeSet;
use std::path::PathBuf;

use regex::Regex;
use serde::{Deserialize, Serialize};

use distfinder_core::types::ChecksumType;

use crate::error::AnalyzerError;

const MAX_DEPTH_LIMIT: usize = 1024;
const MAX_WORKER_THREADS: usize = 1024;
const MAX_ENTRY_SIZE_LIMIT: u64 = 4 * 1024 * 1024 * 1024; // 4 GB

/// 배포본 분석기 설정
///
/// # 필드
///
/// - **checksum_types**: 계산할 다이제스트 종류 (비어 있으면 라이선스 전용 모드)
/// - **disable_recursion**: 전역 재귀 비활성화 (배포본/단일 tar 예외는 유지)
/// - **archive_extensions**: 체크섬 대상 확장자 허용 목록
/// - **excludes**: 정규화된 경로 전체와 매칭되는 제외 정규식
/// - **max_depth**: 최대 아카이브 중첩 깊이
/// - **worker_threads**: 체크섬 워커 풀 크기 (0이면 논리 CPU 수)
/// - **max_entry_size**: 아카이브 엔트리 하나의 메모리 디코딩 상한
/// - **output_dir**: JSON 결과 디렉토리
/// - **cache_dir**: 캐시 디렉토리 (None이면 캐시 비활성화)
/// - **license_mapping_path**: 라이선스 매핑 JSON 경로
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistributionAnalyzerConfig {
    /// 계산할 다이제스트 종류
    pub checksum_types: BTreeSet<ChecksumType>,
    /// 전역 재귀 비활성화
    pub disable_recursion: bool,
    /// 체크섬 대상 확장자 허용 목록 (비어 있으면 전체)
    pub archive_extensions: Vec<String>,
    /// 제외 정규식
    pub excludes: Vec<String>,
    /// 최대 아카이브 중첩 깊이
    pub max_depth: usize,
    /// 체크섬 워커 스레드 수 (0이면 논리 CPU 수)
    pub worker_threads: usize,
    /// 엔트리 최대 메모리 디코딩 크기 (바이트)
    pub max_entry_size: u64,
    /// JSON 결과 디렉토리
    pub output_dir: PathBuf,
    /// 캐시 디렉토리
    pub cache_dir: Option<PathBuf>,
    /// 라이선스 매핑 JSON 경로
    pub license_mapping_path: Option<PathBuf>,
}

impl Default for DistributionAnalyzerConfig {
    fn default() -> Self {
        Self {
            checksum_types: ChecksumType::ALL.into_iter().collect(),
            disable_recursion: false,
            archive_extensions: Vec::new(),
            excludes: Vec::new(),
            max_depth: 64,
            worker_threads: 0,
            max_entry_size: 512 * 1024 * 1024, // 512 MB
            output_dir: PathBuf::from("."),
            cache_dir: None,
            license_mapping_path: None,
        }
    }
}

impl DistributionAnalyzerConfig {
    /// core의 `AnalyzerConfig`에서 분석기 설정을 생성합니다.
    ///
    /// 빈 문자열 경로는 "사용 안 함"으로 해석합니다.
    pub fn from_core(core: &distfinder_core::config::AnalyzerConfig) -> Self {
        Self {
            checksum_types: core
                .checksum_types
                .iter()
                .filter_map(|s| ChecksumType::from_str_loose(s))
                .collect(),
            disable_recursion: core.disable_recursion,
            archive_extensions: core.archive_extensions.clone(),
            excludes: core.excludes.clone(),
            max_depth: core.max_depth,
            worker_threads: core.worker_threads,
            max_entry_size: core.max_entry_size,
            output_dir: PathBuf::from(&core.output_dir),
            cache_dir: non_empty_path(&core.cache_dir),
            license_mapping_path: non_empty_path(&core.license_mapping_path),
        }
    }

    /// 실시간 스트림으로 내보낼 기본 다이제스트 종류
    ///
    /// md5가 요청되었으면 md5, 아니면 가장 앞선 종류입니다.
    pub fn primary_checksum_type(&self) -> Option<ChecksumType> {
        if self.checksum_types.contains(&ChecksumType::Md5) {
            Some(ChecksumType::Md5)
        } else {
            self.checksum_types.iter().next().copied()
        }
    }

    /// 워커 풀 크기를 결정합니다.
    pub fn effective_worker_threads(&self) -> usize {
        if self.worker_threads > 0 {
            self.worker_threads
        } else {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        }
    }

    /// 제외 패턴을 경로 전체 매칭 정규식으로 컴파일합니다.
    pub fn compile_excludes(&self) -> Result<Vec<Regex>, AnalyzerError> {
        self.excludes
            .iter()
            .map(|pattern| {
                Regex::new(&format!("^(?:{pattern})$")).map_err(|e| AnalyzerError::Config {
                    field: "excludes".to_owned(),
                    reason: format!("invalid pattern '{pattern}': {e}"),
                })
            })
            .collect()
    }

    /// 설정 값의 유효성을 검증합니다.
    ///
    /// # 검증 규칙
    ///
    /// - `max_depth`: 1-1024
    /// - `worker_threads`: 0-1024
    /// - `max_entry_size`: 1-4294967296 (4GB)
    /// - `archive_extensions`: 빈 문자열 불가
    /// - `excludes`: 모두 유효한 정규식
    pub fn validate(&self) -> Result<(), AnalyzerError> {
        if self.max_depth == 0 || self.max_depth > MAX_DEPTH_LIMIT {
            return Err(AnalyzerError::Config {
                field: "max_depth".to_owned(),
                reason: format!("must be 1-{MAX_DEPTH_LIMIT}"),
            });
        }

        if self.worker_threads > MAX_WORKER_THREADS {
            return Err(AnalyzerError::Config {
                field: "worker_threads".to_owned(),
                reason: format!("must be 0 (auto) or 1-{MAX_WORKER_THREADS}"),
            });
        }

        if self.max_entry_size == 0 || self.max_entry_size > MAX_ENTRY_SIZE_LIMIT {
            return Err(AnalyzerError::Config {
                field: "max_entry_size".to_owned(),
                reason: format!("must be 1-{MAX_ENTRY_SIZE_LIMIT}"),
            });
        }

        if self.archive_extensions.iter().any(|e| e.trim().is_empty()) {
            return Err(AnalyzerError::Config {
                field: "archive_extensions".to_owned(),
                reason: "extension must not be empty".to_owned(),
            });
        }

        if self.output_dir.as_os_str().is_empty() {
            return Err(AnalyzerError::Config {
                field: "output_dir".to_owned(),
                reason: "output_dir must not be empty".to_owned(),
            });
        }

        self.compile_excludes()?;

        Ok(())
    }
}

fn non_empty_path(s: &str) -> Option<PathBuf> {
    if s.trim().is_empty() {
        None
    } else {
        Some(PathBuf::from(s))
    }
}

/// [`DistributionAnalyzerConfig`] 빌더
///
/// 유연한 설정 구성 및 빌드 시 유효성 검증을 제공합니다.
#[derive(Default)]
pub struct DistributionAnalyzerConfigBuilder {
    config: DistributionAnalyzerConfig,
}

impl DistributionAnalyzerConfigBuilder {
    /// 기본값을 가진 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 다이제스트 종류를 설정합니다.
    pub fn checksum_types(mut self, types: impl IntoIterator<Item = ChecksumType>) -> Self {
        self.config.checksum_types = types.into_iter().collect();
        self
    }

    /// 전역 재귀 비활성화 여부를 설정합니다.
    pub fn disable_recursion(mut self, disable: bool) -> Self {
        self.config.disable_recursion = disable;
        self
    }

    /// 체크섬 대상 확장자 허용 목록을 설정합니다.
    pub fn archive_extensions(mut self, extensions: Vec<String>) -> Self {
        self.config.archive_extensions = extensions;
        self
    }

    /// 제외 정규식을 추가합니다.
    pub fn exclude(mut self, pattern: impl Into<String>) -> Self {
        self.config.excludes.push(pattern.into());
        self
    }

    /// 제외 정규식 목록을 설정합니다.
    pub fn excludes(mut self, patterns: Vec<String>) -> Self {
        self.config.excludes = patterns;
        self
    }

    /// 최대 중첩 깊이를 설정합니다.
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.config.max_depth = depth;
        self
    }

    /// 워커 스레드 수를 설정합니다.
    pub fn worker_threads(mut self, threads: usize) -> Self {
        self.config.worker_threads = threads;
        self
    }

    /// 엔트리 최대 메모리 디코딩 크기를 설정합니다.
    pub fn max_entry_size(mut self, size: u64) -> Self {
        self.config.max_entry_size = size;
        self
    }

    /// 결과 디렉토리를 설정합니다.
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    /// 캐시 디렉토리를 설정합니다.
    pub fn cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.cache_dir = Some(dir.into());
        self
    }

    /// 라이선스 매핑 파일 경로를 설정합니다.
    pub fn license_mapping_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.license_mapping_path = Some(path.into());
        self
    }

    /// 설정을 검증하고 빌드합니다.
    ///
    /// # Errors
    ///
    /// 유효성 검증 실패 시 `AnalyzerError::Config` 반환
    pub fn build(self) -> Result<DistributionAnalyzerConfig, AnalyzerError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
