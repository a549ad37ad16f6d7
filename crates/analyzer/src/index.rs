//! 중복 제거 인덱스 + 파일 에러 수집
//!
//! [`DedupIndex`]는 다이제스트 종류별 값 → 파일 집합 맵과
//! 파일명 → 체크섬 집합 역인덱스를 함께 유지합니다.
//! 병합은 순회 스레드 한 곳에서만 수행되므로 잠금이 필요 없습니다.

use std::collections::{BTreeMap, BTreeSet};

use distfinder_core::types::{Checksum, ChecksumMap, ChecksumType, FileError};

/// 파일명 → 체크섬 집합 역인덱스
pub type InverseIndex = BTreeMap<String, BTreeSet<Checksum>>;

/// 체크섬 맵 + 역인덱스
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DedupIndex {
    maps: BTreeMap<ChecksumType, ChecksumMap>,
    inverse: InverseIndex,
}

impl DedupIndex {
    /// 주어진 다이제스트 종류마다 빈 맵을 가진 인덱스를 생성합니다.
    pub fn new(types: impl IntoIterator<Item = ChecksumType>) -> Self {
        Self {
            maps: types.into_iter().map(|t| (t, ChecksumMap::new())).collect(),
            inverse: InverseIndex::new(),
        }
    }

    /// 체크섬 하나를 병합합니다.
    ///
    /// 동일한 (종류, 값, 파일명, 크기) 튜플은 한 번만 기록되며,
    /// 새 엔트리였는지 여부를 반환합니다.
    pub fn merge(&mut self, checksum: &Checksum) -> bool {
        let inserted = self
            .maps
            .entry(checksum.checksum_type)
            .or_default()
            .entry(checksum.value.clone())
            .or_default()
            .insert(checksum.local_file());

        self.inverse
            .entry(checksum.filename.clone())
            .or_default()
            .insert(checksum.clone());

        inserted
    }

    /// 캐시에서 복원한 맵 조각을 병합하고 새로 추가된 체크섬을 반환합니다.
    pub fn merge_map(&mut self, checksum_type: ChecksumType, fragment: &ChecksumMap) -> Vec<Checksum> {
        let mut added = Vec::new();
        for (value, files) in fragment {
            for file in files {
                let checksum = Checksum::from_entry(checksum_type, value, file);
                if self.merge(&checksum) {
                    added.push(checksum);
                }
            }
        }
        added
    }

    /// 특정 종류의 체크섬 맵
    pub fn checksums(&self, checksum_type: ChecksumType) -> Option<&ChecksumMap> {
        self.maps.get(&checksum_type)
    }

    /// 모든 종류의 체크섬 맵
    pub fn maps(&self) -> &BTreeMap<ChecksumType, ChecksumMap> {
        &self.maps
    }

    /// 파일명 → 체크섬 역인덱스
    pub fn inverse(&self) -> &InverseIndex {
        &self.inverse
    }

    /// 특정 종류의 (값, 파일) 엔트리 수
    pub fn entry_count(&self, checksum_type: ChecksumType) -> usize {
        self.maps
            .get(&checksum_type)
            .map(|m| m.values().map(BTreeSet::len).sum())
            .unwrap_or(0)
    }

    /// 모든 종류의 엔트리 수 합계
    pub fn total_entries(&self) -> usize {
        self.maps.keys().map(|t| self.entry_count(*t)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total_entries() == 0
    }

    /// (맵, 역인덱스)로 분해합니다.
    pub fn into_parts(self) -> (BTreeMap<ChecksumType, ChecksumMap>, InverseIndex) {
        (self.maps, self.inverse)
    }
}

/// 치명적이지 않은 파일 에러 목록 (발생 순서 유지)
#[derive(Debug, Clone, Default)]
pub struct ErrorSink {
    errors: Vec<FileError>,
}

impl ErrorSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// 파일 에러를 기록합니다.
    pub fn record(&mut self, path: impl Into<String>, message: impl Into<String>) {
        metrics::counter!(distfinder_core::metrics::ANALYZER_FILE_ERRORS_TOTAL).increment(1);
        self.errors.push(FileError::new(path, message));
    }

    pub fn errors(&self) -> &[FileError] {
        &self.errors
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn into_inner(self) -> Vec<FileError> {
        self.errors
    }
}
