//! distfinder.toml 통합 설정 테스트
//!
//! - distfinder.toml.example 파싱 테스트
//! - 부분 설정 로딩 테스트
//! - 환경변수 우선순위 테스트
//! - 파일 없음 / 잘못된 형식 에러 테스트

use distfinder_core::config::DistfinderConfig;
use distfinder_core::error::{ConfigError, DistfinderError};

// =============================================================================
// distfinder.toml.example 파싱 테스트
// =============================================================================

#[test]
fn example_config_parses_successfully() {
    let content = include_str!("../../../distfinder.toml.example");
    let config = DistfinderConfig::parse(content).expect("example config should parse");

    assert_eq!(config.general.log_level, "info");
    assert_eq!(config.general.log_format, "pretty");
}

#[test]
fn example_config_passes_validation() {
    let content = include_str!("../../../distfinder.toml.example");
    let config = DistfinderConfig::parse(content).expect("should parse");
    config
        .validate()
        .expect("example config should pass validation");
}

#[test]
fn example_config_matches_defaults() {
    let content = include_str!("../../../distfinder.toml.example");
    let config = DistfinderConfig::parse(content).expect("should parse");
    let defaults = DistfinderConfig::default();

    assert_eq!(
        config.analyzer.checksum_types,
        defaults.analyzer.checksum_types
    );
    assert_eq!(
        config.analyzer.disable_recursion,
        defaults.analyzer.disable_recursion
    );
    assert_eq!(config.analyzer.max_depth, defaults.analyzer.max_depth);
    assert_eq!(
        config.analyzer.max_entry_size,
        defaults.analyzer.max_entry_size
    );
    assert_eq!(config.analyzer.cache_dir, defaults.analyzer.cache_dir);
}

// =============================================================================
// 부분 설정 테스트
// =============================================================================

#[test]
fn analyzer_only_section_keeps_general_defaults() {
    let toml = r#"
[analyzer]
checksum_types = ["sha256"]
excludes = [".*\\.bak$"]
"#;

    let config = DistfinderConfig::parse(toml).expect("should parse");
    assert_eq!(config.general.log_level, "info");
    assert_eq!(config.analyzer.checksum_types, vec!["sha256"]);
    assert_eq!(config.analyzer.excludes, vec![".*\\.bak$"]);
    assert_eq!(config.analyzer.output_dir, ".");
}

// =============================================================================
// 파일 로딩 테스트
// =============================================================================

#[tokio::test]
async fn load_reads_file_from_disk() {
    let dir = tempfile::tempdir().expect("should create temp dir");
    let path = dir.path().join("distfinder.toml");
    std::fs::write(
        &path,
        "[general]\nlog_level = \"debug\"\n\n[analyzer]\nmax_depth = 3\n",
    )
    .expect("should write config");

    let config = DistfinderConfig::from_file(&path)
        .await
        .expect("should load");
    assert_eq!(config.general.log_level, "debug");
    assert_eq!(config.analyzer.max_depth, 3);
}

#[tokio::test]
async fn from_file_rejects_invalid_values() {
    let dir = tempfile::tempdir().expect("should create temp dir");
    let path = dir.path().join("distfinder.toml");
    std::fs::write(&path, "[analyzer]\nchecksum_types = [\"crc32\"]\n")
        .expect("should write config");

    let err = DistfinderConfig::from_file(&path)
        .await
        .expect_err("unknown checksum type should fail");
    assert!(matches!(
        err,
        DistfinderError::Config(ConfigError::InvalidValue { .. })
    ));
}

#[tokio::test]
#[serial_test::serial]
async fn load_or_default_falls_back_when_file_missing() {
    let config = DistfinderConfig::load_or_default("/nonexistent/distfinder.toml")
        .await
        .expect("missing file should fall back to defaults");
    assert_eq!(config.analyzer.max_depth, 64);
}

#[tokio::test]
async fn load_or_default_still_reports_parse_errors() {
    let dir = tempfile::tempdir().expect("should create temp dir");
    let path = dir.path().join("distfinder.toml");
    std::fs::write(&path, "[general\nlog_level = \"info\"\n").expect("should write config");

    let err = DistfinderConfig::load_or_default(&path)
        .await
        .expect_err("malformed config should fail");
    assert!(matches!(
        err,
        DistfinderError::Config(ConfigError::ParseFailed { .. })
    ));
}

// =============================================================================
// 환경변수 우선순위 테스트
// =============================================================================

#[test]
#[serial_test::serial]
fn env_override_takes_precedence_over_toml() {
    let toml = r#"
[analyzer]
disable_recursion = false
"#;

    let original = std::env::var("DISTFINDER_ANALYZER_DISABLE_RECURSION").ok();
    // SAFETY: serial_test로 직렬화되어 환경변수 조작이 안전합니다.
    unsafe {
        std::env::set_var("DISTFINDER_ANALYZER_DISABLE_RECURSION", "true");
    }

    let mut config = DistfinderConfig::parse(toml).expect("should parse");
    config.apply_env_overrides();
    let result = config.analyzer.disable_recursion;

    // SAFETY: 테스트 정리
    unsafe {
        match original {
            Some(val) => std::env::set_var("DISTFINDER_ANALYZER_DISABLE_RECURSION", val),
            None => std::env::remove_var("DISTFINDER_ANALYZER_DISABLE_RECURSION"),
        }
    }

    assert!(result);
}

#[test]
#[serial_test::serial]
fn env_override_csv_replaces_checksum_types() {
    let original = std::env::var("DISTFINDER_ANALYZER_CHECKSUM_TYPES").ok();
    // SAFETY: serial_test로 직렬화되어 환경변수 조작이 안전합니다.
    unsafe {
        std::env::set_var("DISTFINDER_ANALYZER_CHECKSUM_TYPES", "md5, sha256");
    }

    let mut config = DistfinderConfig::default();
    config.apply_env_overrides();
    let result = config.analyzer.checksum_types.clone();

    // SAFETY: 테스트 정리
    unsafe {
        match original {
            Some(val) => std::env::set_var("DISTFINDER_ANALYZER_CHECKSUM_TYPES", val),
            None => std::env::remove_var("DISTFINDER_ANALYZER_CHECKSUM_TYPES"),
        }
    }

    assert_eq!(result, vec!["md5", "sha256"]);
}

#[test]
#[serial_test::serial]
fn env_override_invalid_number_keeps_value() {
    let original = std::env::var("DISTFINDER_ANALYZER_MAX_DEPTH").ok();
    // SAFETY: serial_test로 직렬화되어 환경변수 조작이 안전합니다.
    unsafe {
        std::env::set_var("DISTFINDER_ANALYZER_MAX_DEPTH", "very-deep");
    }

    let mut config = DistfinderConfig::default();
    config.apply_env_overrides();
    let result = config.analyzer.max_depth;

    // SAFETY: 테스트 정리
    unsafe {
        match original {
            Some(val) => std::env::set_var("DISTFINDER_ANALYZER_MAX_DEPTH", val),
            None => std::env::remove_var("DISTFINDER_ANALYZER_MAX_DEPTH"),
        }
    }

    assert_eq!(result, 64);
}
