//! 체크섬 캐시 -- 루트 입력 다이제스트 → 중첩 전체의 체크섬 맵 조각
//!
//! 같은 배포본을 다시 분석할 때, 루트 입력 자체의 다이제스트로 이전 결과를
//! 찾아 중첩 아카이브를 다시 열지 않고 결과를 복원합니다.
//!
//! # 저장 형식
//!
//! 다이제스트 종류별 네임스페이스(`files-<type>`)에 JSON 봉투를 저장합니다.
//!
//! ```text
//! { "schema_version": 1, "checksum_type": "md5", "entries": { "<value>": [ { "filename": ..., "size": ... } ] } }
//! ```
//!
//! 버전이나 다이제스트 종류가 다르거나 디코딩할 수 없는 값은
//! [`AnalyzerError::CacheIncompatible`]로 보고됩니다.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use distfinder_core::types::{ChecksumMap, ChecksumType};

use crate::error::AnalyzerError;

/// 캐시 스키마 버전
pub const CACHE_SCHEMA_VERSION: u32 = 1;

/// 키-값 캐시 저장소 trait
pub trait CacheStore: Send + Sync {
    /// 값을 조회합니다.
    fn get(&self, namespace: &str, key: &str) -> Result<Option<Vec<u8>>, AnalyzerError>;

    /// 값을 저장합니다 (기존 값 덮어쓰기).
    fn put(&self, namespace: &str, key: &str, value: Vec<u8>) -> Result<(), AnalyzerError>;

    /// 디스크에 반영합니다.
    fn flush(&self) -> Result<(), AnalyzerError>;

    /// 사람이 읽을 수 있는 저장소 위치
    fn location(&self) -> String;
}

/// sled 기반 디스크 캐시
pub struct SledCacheStore {
    db: sled::Db,
    location: PathBuf,
}

impl SledCacheStore {
    /// 디렉토리에 캐시 데이터베이스를 열거나 생성합니다.
    pub fn open(dir: &Path) -> Result<Self, AnalyzerError> {
        std::fs::create_dir_all(dir)
            .map_err(|e| AnalyzerError::io(dir.display().to_string(), e))?;
        let db = sled::open(dir).map_err(|e| {
            AnalyzerError::Cache(format!("failed to open cache at {}: {e}", dir.display()))
        })?;
        debug!(location = %dir.display(), "cache opened");
        Ok(Self {
            db,
            location: dir.to_path_buf(),
        })
    }

    fn tree(&self, namespace: &str) -> Result<sled::Tree, AnalyzerError> {
        self.db
            .open_tree(namespace)
            .map_err(|e| AnalyzerError::Cache(format!("{}: {namespace}: {e}", self.location())))
    }
}

impl CacheStore for SledCacheStore {
    fn get(&self, namespace: &str, key: &str) -> Result<Option<Vec<u8>>, AnalyzerError> {
        let value = self
            .tree(namespace)?
            .get(key.as_bytes())
            .map_err(|e| AnalyzerError::Cache(format!("{}: {e}", self.location())))?;
        Ok(value.map(|v| v.to_vec()))
    }

    fn put(&self, namespace: &str, key: &str, value: Vec<u8>) -> Result<(), AnalyzerError> {
        self.tree(namespace)?
            .insert(key.as_bytes(), value)
            .map_err(|e| AnalyzerError::Cache(format!("{}: {e}", self.location())))?;
        Ok(())
    }

    fn flush(&self) -> Result<(), AnalyzerError> {
        self.db
            .flush()
            .map_err(|e| AnalyzerError::Cache(format!("{}: {e}", self.location())))?;
        Ok(())
    }

    fn location(&self) -> String {
        self.location.display().to_string()
    }
}

/// 메모리 캐시 (테스트, 단일 프로세스 재사용)
#[derive(Default)]
pub struct MemoryCacheStore {
    entries: Mutex<HashMap<(String, String), Vec<u8>>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 저장된 값 수
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl CacheStore for MemoryCacheStore {
    fn get(&self, namespace: &str, key: &str) -> Result<Option<Vec<u8>>, AnalyzerError> {
        Ok(self
            .entries
            .lock()
            .get(&(namespace.to_owned(), key.to_owned()))
            .cloned())
    }

    fn put(&self, namespace: &str, key: &str, value: Vec<u8>) -> Result<(), AnalyzerError> {
        self.entries
            .lock()
            .insert((namespace.to_owned(), key.to_owned()), value);
        Ok(())
    }

    fn flush(&self) -> Result<(), AnalyzerError> {
        Ok(())
    }

    fn location(&self) -> String {
        "memory".to_owned()
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheEnvelope {
    schema_version: u32,
    checksum_type: ChecksumType,
    entries: ChecksumMap,
}

/// 다이제스트 값 → 체크섬 맵 조각 캐시
#[derive(Clone)]
pub struct CacheGateway {
    store: Arc<dyn CacheStore>,
}

impl CacheGateway {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store }
    }

    /// 다이제스트 종류별 네임스페이스
    pub fn namespace(checksum_type: ChecksumType) -> String {
        format!("files-{checksum_type}")
    }

    pub fn location(&self) -> String {
        self.store.location()
    }

    /// 루트 입력 다이제스트 값으로 조각을 조회합니다.
    pub fn lookup(
        &self,
        checksum_type: ChecksumType,
        value: &str,
    ) -> Result<Option<ChecksumMap>, AnalyzerError> {
        let Some(raw) = self.store.get(&Self::namespace(checksum_type), value)? else {
            return Ok(None);
        };

        let incompatible = |reason: String| AnalyzerError::CacheIncompatible {
            location: self.location(),
            reason,
        };

        let json: serde_json::Value = serde_json::from_slice(&raw)
            .map_err(|e| incompatible(format!("undecodable entry for {value}: {e}")))?;

        let version = json.get("schema_version").and_then(serde_json::Value::as_u64);
        if version != Some(u64::from(CACHE_SCHEMA_VERSION)) {
            return Err(incompatible(format!(
                "schema version {} does not match {CACHE_SCHEMA_VERSION}",
                version.map_or_else(|| "<missing>".to_owned(), |v| v.to_string())
            )));
        }

        let envelope: CacheEnvelope = serde_json::from_value(json)
            .map_err(|e| incompatible(format!("undecodable entry for {value}: {e}")))?;

        if envelope.checksum_type != checksum_type {
            return Err(incompatible(format!(
                "entry for {value} holds {} checksums, expected {checksum_type}",
                envelope.checksum_type
            )));
        }

        Ok(Some(envelope.entries))
    }

    /// 루트 입력 다이제스트 값 아래에 조각을 저장합니다.
    pub fn store(
        &self,
        checksum_type: ChecksumType,
        value: &str,
        entries: &ChecksumMap,
    ) -> Result<(), AnalyzerError> {
        let envelope = CacheEnvelope {
            schema_version: CACHE_SCHEMA_VERSION,
            checksum_type,
            entries: entries.clone(),
        };
        let raw = serde_json::to_vec(&envelope)
            .map_err(|e| AnalyzerError::Cache(format!("failed to encode entry for {value}: {e}")))?;
        self.store.put(&Self::namespace(checksum_type), value, raw)
    }

    pub fn flush(&self) -> Result<(), AnalyzerError> {
        self.store.flush()
    }
}

impl std::fmt::Debug for CacheGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheGateway")
            .field("location", &self.location())
            .finish()
    }
}
