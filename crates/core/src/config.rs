//! 설정 관리 -- distfinder.toml 파싱 및 런타임 설정
//!
//! [`DistfinderConfig`]는 모든 구성 요소의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`DISTFINDER_ANALYZER_DISABLE_RECURSION=true` 형식)
//! 3. 설정 파일 (`distfinder.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), distfinder_core::error::DistfinderError> {
//! use distfinder_core::config::DistfinderConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = DistfinderConfig::load("distfinder.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = DistfinderConfig::parse("[general]\nlog_level = \"debug\"")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, DistfinderError};
use crate::types::ChecksumType;

/// distfinder 통합 설정
///
/// `distfinder.toml` 파일의 최상위 구조를 나타냅니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DistfinderConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 배포본 분석기 설정
    #[serde(default)]
    pub analyzer: AnalyzerConfig,
}

impl DistfinderConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, DistfinderError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, DistfinderError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                DistfinderError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                DistfinderError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// 설정 파일이 없으면 기본값에 환경변수만 적용합니다.
    ///
    /// CLI처럼 설정 파일이 선택 사항인 경우에 사용합니다.
    pub async fn load_or_default(path: impl AsRef<Path>) -> Result<Self, DistfinderError> {
        match Self::load(path.as_ref()).await {
            Err(DistfinderError::Config(ConfigError::FileNotFound { .. })) => {
                let mut config = Self::default();
                config.apply_env_overrides();
                config.validate()?;
                Ok(config)
            }
            other => other,
        }
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, DistfinderError> {
        toml::from_str(toml_str).map_err(|e| {
            DistfinderError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `DISTFINDER_{SECTION}_{FIELD}`
    /// 예: `DISTFINDER_ANALYZER_CHECKSUM_TYPES=md5,sha256`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "DISTFINDER_GENERAL_LOG_LEVEL");
        override_string(
            &mut self.general.log_format,
            "DISTFINDER_GENERAL_LOG_FORMAT",
        );

        // Analyzer
        override_csv(
            &mut self.analyzer.checksum_types,
            "DISTFINDER_ANALYZER_CHECKSUM_TYPES",
        );
        override_bool(
            &mut self.analyzer.disable_recursion,
            "DISTFINDER_ANALYZER_DISABLE_RECURSION",
        );
        override_csv(
            &mut self.analyzer.archive_extensions,
            "DISTFINDER_ANALYZER_ARCHIVE_EXTENSIONS",
        );
        override_csv(&mut self.analyzer.excludes, "DISTFINDER_ANALYZER_EXCLUDES");
        override_usize(
            &mut self.analyzer.max_depth,
            "DISTFINDER_ANALYZER_MAX_DEPTH",
        );
        override_usize(
            &mut self.analyzer.worker_threads,
            "DISTFINDER_ANALYZER_WORKER_THREADS",
        );
        override_u64(
            &mut self.analyzer.max_entry_size,
            "DISTFINDER_ANALYZER_MAX_ENTRY_SIZE",
        );
        override_string(
            &mut self.analyzer.output_dir,
            "DISTFINDER_ANALYZER_OUTPUT_DIR",
        );
        override_string(&mut self.analyzer.cache_dir, "DISTFINDER_ANALYZER_CACHE_DIR");
        override_string(
            &mut self.analyzer.license_mapping_path,
            "DISTFINDER_ANALYZER_LICENSE_MAPPING_PATH",
        );
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), DistfinderError> {
        // log_level 검증
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            }
            .into());
        }

        // log_format 검증
        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            }
            .into());
        }

        // checksum_types 검증 (빈 목록은 라이선스 전용 모드)
        for name in &self.analyzer.checksum_types {
            if ChecksumType::from_str_loose(name).is_none() {
                return Err(ConfigError::InvalidValue {
                    field: "analyzer.checksum_types".to_owned(),
                    reason: format!("unknown checksum type '{name}' (expected: md5, sha1, sha256)"),
                }
                .into());
            }
        }

        if self.analyzer.max_depth == 0 {
            return Err(ConfigError::InvalidValue {
                field: "analyzer.max_depth".to_owned(),
                reason: "must be greater than 0".to_owned(),
            }
            .into());
        }

        if self.analyzer.max_entry_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "analyzer.max_entry_size".to_owned(),
                reason: "must be greater than 0".to_owned(),
            }
            .into());
        }

        if self.analyzer.output_dir.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "analyzer.output_dir".to_owned(),
                reason: "output_dir must not be empty".to_owned(),
            }
            .into());
        }

        Ok(())
    }
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "pretty".to_owned(),
        }
    }
}

/// 배포본 분석기 설정
///
/// 문자열 기반 원시 설정입니다. 분석기 크레이트가 타입이 있는 설정으로 변환합니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// 계산할 다이제스트 종류 (md5, sha1, sha256)
    pub checksum_types: Vec<String>,
    /// 전역 재귀 비활성화
    pub disable_recursion: bool,
    /// 체크섬 대상 확장자 허용 목록 (비어 있으면 전체)
    pub archive_extensions: Vec<String>,
    /// 제외 패턴 (정규화된 경로 전체와 매칭되는 정규식)
    pub excludes: Vec<String>,
    /// 최대 아카이브 중첩 깊이
    pub max_depth: usize,
    /// 체크섬 워커 스레드 수 (0이면 논리 CPU 수)
    pub worker_threads: usize,
    /// 아카이브 엔트리 하나의 최대 메모리 디코딩 크기 (바이트)
    pub max_entry_size: u64,
    /// 결과 JSON 출력 디렉토리
    pub output_dir: String,
    /// 캐시 디렉토리 (비어 있으면 캐시 비활성화)
    pub cache_dir: String,
    /// 라이선스 매핑 JSON 경로 (비어 있으면 빈 매핑)
    pub license_mapping_path: String,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            checksum_types: ChecksumType::ALL
                .iter()
                .map(|t| t.as_str().to_owned())
                .collect(),
            disable_recursion: false,
            archive_extensions: Vec::new(),
            excludes: Vec::new(),
            max_depth: 64,
            worker_threads: 0,
            max_entry_size: 512 * 1024 * 1024, // 512 MB
            output_dir: ".".to_owned(),
            cache_dir: String::new(),
            license_mapping_path: String::new(),
        }
    }
}

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_usize(target: &mut usize, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<usize>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse usize from env var, ignoring"
            ),
        }
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u64 from env var, ignoring"
            ),
        }
    }
}

fn override_csv(target: &mut Vec<String>, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val
            .split(',')
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty())
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_sane_values() {
        let config = DistfinderConfig::default();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.general.log_format, "pretty");
        assert_eq!(config.analyzer.checksum_types, vec!["md5", "sha1", "sha256"]);
        assert!(!config.analyzer.disable_recursion);
        assert_eq!(config.analyzer.max_depth, 64);
        assert!(config.analyzer.cache_dir.is_empty());
    }

    #[test]
    fn default_config_passes_validation() {
        let config = DistfinderConfig::default();
        config.validate().unwrap();
    }

    #[test]
    fn from_str_empty_toml_uses_defaults() {
        let config = DistfinderConfig::parse("").unwrap();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.analyzer.output_dir, ".");
    }

    #[test]
    fn from_str_partial_toml_merges_with_defaults() {
        let toml = r#"
[general]
log_level = "debug"

[analyzer]
disable_recursion = true
checksum_types = ["sha256"]
"#;
        let config = DistfinderConfig::parse(toml).unwrap();
        assert_eq!(config.general.log_level, "debug");
        // log_format은 기본값 유지
        assert_eq!(config.general.log_format, "pretty");
        assert!(config.analyzer.disable_recursion);
        assert_eq!(config.analyzer.checksum_types, vec!["sha256"]);
        assert_eq!(config.analyzer.max_depth, 64);
    }

    #[test]
    fn from_str_full_toml() {
        let toml = r#"
[general]
log_level = "warn"
log_format = "json"

[analyzer]
checksum_types = ["md5", "sha1"]
disable_recursion = true
archive_extensions = ["jar", "zip"]
excludes = [".*\\.bak$", "^docs/.*"]
max_depth = 8
worker_threads = 4
max_entry_size = 1048576
output_dir = "/tmp/out"
cache_dir = "/tmp/cache"
license_mapping_path = "/etc/distfinder/license-mapping.json"
"#;
        let config = DistfinderConfig::parse(toml).unwrap();
        assert_eq!(config.general.log_format, "json");
        assert_eq!(config.analyzer.checksum_types.len(), 2);
        assert_eq!(config.analyzer.archive_extensions, vec!["jar", "zip"]);
        assert_eq!(config.analyzer.excludes[0], ".*\\.bak$");
        assert_eq!(config.analyzer.max_depth, 8);
        assert_eq!(config.analyzer.worker_threads, 4);
        assert_eq!(config.analyzer.max_entry_size, 1_048_576);
        assert_eq!(config.analyzer.cache_dir, "/tmp/cache");
        config.validate().unwrap();
    }

    #[test]
    fn from_str_invalid_toml_returns_error() {
        let result = DistfinderConfig::parse("invalid = [[[toml");
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(
            err,
            DistfinderError::Config(ConfigError::ParseFailed { .. })
        ));
    }

    #[test]
    fn validate_rejects_invalid_log_level() {
        let mut config = DistfinderConfig::default();
        config.general.log_level = "verbose".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("log_level"));
    }

    #[test]
    fn validate_rejects_invalid_log_format() {
        let mut config = DistfinderConfig::default();
        config.general.log_format = "xml".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("log_format"));
    }

    #[test]
    fn validate_rejects_unknown_checksum_type() {
        let mut config = DistfinderConfig::default();
        config.analyzer.checksum_types = vec!["md5".to_owned(), "crc32".to_owned()];
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("crc32"));
    }

    #[test]
    fn validate_accepts_empty_checksum_types() {
        let mut config = DistfinderConfig::default();
        config.analyzer.checksum_types.clear();
        config.validate().unwrap();
    }

    #[test]
    fn validate_rejects_zero_max_depth() {
        let mut config = DistfinderConfig::default();
        config.analyzer.max_depth = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_depth"));
    }

    #[test]
    fn validate_rejects_empty_output_dir() {
        let mut config = DistfinderConfig::default();
        config.analyzer.output_dir = String::new();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("output_dir"));
    }

    #[test]
    fn env_override_string() {
        let mut val = "original".to_owned();
        // SAFETY: 테스트는 고유한 환경변수 이름만 사용합니다.
        unsafe { std::env::set_var("TEST_DISTFINDER_STR", "overridden") };
        override_string(&mut val, "TEST_DISTFINDER_STR");
        assert_eq!(val, "overridden");
        unsafe { std::env::remove_var("TEST_DISTFINDER_STR") };
    }

    #[test]
    fn env_override_bool_valid() {
        let mut val = false;
        // SAFETY: 테스트는 고유한 환경변수 이름만 사용합니다.
        unsafe { std::env::set_var("TEST_DISTFINDER_BOOL", "true") };
        override_bool(&mut val, "TEST_DISTFINDER_BOOL");
        assert!(val);
        unsafe { std::env::remove_var("TEST_DISTFINDER_BOOL") };
    }

    #[test]
    fn env_override_bool_invalid_keeps_original() {
        let mut val = false;
        // SAFETY: 테스트는 고유한 환경변수 이름만 사용합니다.
        unsafe { std::env::set_var("TEST_DISTFINDER_BOOL_BAD", "not-a-bool") };
        override_bool(&mut val, "TEST_DISTFINDER_BOOL_BAD");
        assert!(!val); // 원래 값 유지
        unsafe { std::env::remove_var("TEST_DISTFINDER_BOOL_BAD") };
    }

    #[test]
    fn env_override_usize_invalid_keeps_original() {
        let mut val = 64usize;
        // SAFETY: 테스트는 고유한 환경변수 이름만 사용합니다.
        unsafe { std::env::set_var("TEST_DISTFINDER_USIZE_BAD", "deep") };
        override_usize(&mut val, "TEST_DISTFINDER_USIZE_BAD");
        assert_eq!(val, 64);
        unsafe { std::env::remove_var("TEST_DISTFINDER_USIZE_BAD") };
    }

    #[test]
    fn env_override_csv_skips_empty_items() {
        let mut val = vec!["a".to_owned()];
        // SAFETY: 테스트는 고유한 환경변수 이름만 사용합니다.
        unsafe { std::env::set_var("TEST_DISTFINDER_CSV", "md5, ,sha256") };
        override_csv(&mut val, "TEST_DISTFINDER_CSV");
        assert_eq!(val, vec!["md5", "sha256"]);
        unsafe { std::env::remove_var("TEST_DISTFINDER_CSV") };
    }

    #[test]
    fn env_override_missing_var_keeps_original() {
        let mut val = "original".to_owned();
        override_string(&mut val, "TEST_DISTFINDER_NONEXISTENT_12345");
        assert_eq!(val, "original");
    }

    #[test]
    fn config_serialize_roundtrip() {
        let config = DistfinderConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed = DistfinderConfig::parse(&toml_str).unwrap();
        assert_eq!(config.general.log_level, parsed.general.log_level);
        assert_eq!(
            config.analyzer.checksum_types,
            parsed.analyzer.checksum_types
        );
        assert_eq!(
            config.analyzer.max_entry_size,
            parsed.analyzer.max_entry_size
        );
    }

    #[tokio::test]
    async fn from_file_not_found() {
        let result = DistfinderConfig::from_file("/nonexistent/path/distfinder.toml").await;
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(
            err,
            DistfinderError::Config(ConfigError::FileNotFound { .. })
        ));
    }
}
