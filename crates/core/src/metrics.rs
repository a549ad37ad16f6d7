//! 메트릭 상수 및 설명 등록
//!
//! 모든 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 분석기는 이 상수를 사용하여 `metrics::counter!()`, `metrics::histogram!()`
//! 매크로를 호출합니다. 레코더가 설치되지 않으면 호출은 아무 일도 하지 않습니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `distfinder_`
//! - 모듈명: `analyzer_`
//! - 접미어: `_total` (counter), `_seconds` (histogram)
//!
//! # 사용 예시
//!
//! ```ignore
//! use metrics::counter;
//!
//! counter!(distfinder_core::metrics::ANALYZER_CHECKSUMS_COMPUTED_TOTAL).increment(1);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 다이제스트 종류 레이블 키 (md5, sha1, sha256)
pub const LABEL_CHECKSUM_TYPE: &str = "checksum_type";

/// 결과 레이블 키 (success, failure)
pub const LABEL_RESULT: &str = "result";

// ─── Analyzer 메트릭 ────────────────────────────────────────────────

/// Analyzer: 분석한 루트 입력 수 (counter)
pub const ANALYZER_INPUTS_ANALYZED_TOTAL: &str = "distfinder_analyzer_inputs_analyzed_total";

/// Analyzer: 새로 계산한 체크섬 수 (counter, label: checksum_type)
pub const ANALYZER_CHECKSUMS_COMPUTED_TOTAL: &str =
    "distfinder_analyzer_checksums_computed_total";

/// Analyzer: 캐시에서 복원한 체크섬 수 (counter, label: checksum_type)
pub const ANALYZER_CHECKSUMS_CACHED_TOTAL: &str = "distfinder_analyzer_checksums_cached_total";

/// Analyzer: 캐시 적중 수 (counter)
pub const ANALYZER_CACHE_HITS_TOTAL: &str = "distfinder_analyzer_cache_hits_total";

/// Analyzer: 캐시 미스 수 (counter)
pub const ANALYZER_CACHE_MISSES_TOTAL: &str = "distfinder_analyzer_cache_misses_total";

/// Analyzer: 연 중첩 아카이브 수 (counter, label: result)
pub const ANALYZER_ARCHIVES_OPENED_TOTAL: &str = "distfinder_analyzer_archives_opened_total";

/// Analyzer: 기록된 파일 에러 수 (counter)
pub const ANALYZER_FILE_ERRORS_TOTAL: &str = "distfinder_analyzer_file_errors_total";

/// Analyzer: 수집한 라이선스 좌표 수 (counter)
pub const ANALYZER_LICENSES_FOUND_TOTAL: &str = "distfinder_analyzer_licenses_found_total";

/// Analyzer: 분석 소요 시간 (histogram, 초)
pub const ANALYZER_ANALYSIS_DURATION_SECONDS: &str =
    "distfinder_analyzer_analysis_duration_seconds";

// ─── 설명 등록 함수 ─────────────────────────────────────────────────

/// 모든 메트릭의 설명(description)을 등록합니다.
///
/// 전역 레코더 설치 후 한 번만 호출해야 합니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_histogram};

    describe_counter!(
        ANALYZER_INPUTS_ANALYZED_TOTAL,
        "Total number of root inputs analyzed"
    );
    describe_counter!(
        ANALYZER_CHECKSUMS_COMPUTED_TOTAL,
        "Total number of checksums computed from file content"
    );
    describe_counter!(
        ANALYZER_CHECKSUMS_CACHED_TOTAL,
        "Total number of checksums recovered from the cache"
    );
    describe_counter!(
        ANALYZER_CACHE_HITS_TOTAL,
        "Total number of cache lookups that found a stored fragment"
    );
    describe_counter!(
        ANALYZER_CACHE_MISSES_TOTAL,
        "Total number of cache lookups that found nothing"
    );
    describe_counter!(
        ANALYZER_ARCHIVES_OPENED_TOTAL,
        "Total number of nested archives opened, by result"
    );
    describe_counter!(
        ANALYZER_FILE_ERRORS_TOTAL,
        "Total number of non-fatal per-file errors recorded"
    );
    describe_counter!(
        ANALYZER_LICENSES_FOUND_TOTAL,
        "Total number of package coordinates with harvested licenses"
    );
    describe_histogram!(
        ANALYZER_ANALYSIS_DURATION_SECONDS,
        "Time to analyze all configured inputs in seconds"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_METRIC_NAMES: &[&str] = &[
        ANALYZER_INPUTS_ANALYZED_TOTAL,
        ANALYZER_CHECKSUMS_COMPUTED_TOTAL,
        ANALYZER_CHECKSUMS_CACHED_TOTAL,
        ANALYZER_CACHE_HITS_TOTAL,
        ANALYZER_CACHE_MISSES_TOTAL,
        ANALYZER_ARCHIVES_OPENED_TOTAL,
        ANALYZER_FILE_ERRORS_TOTAL,
        ANALYZER_LICENSES_FOUND_TOTAL,
        ANALYZER_ANALYSIS_DURATION_SECONDS,
    ];

    #[test]
    fn all_metrics_start_with_distfinder_prefix() {
        for name in ALL_METRIC_NAMES {
            assert!(
                name.starts_with("distfinder_analyzer_"),
                "Metric '{}' does not start with 'distfinder_analyzer_' prefix",
                name
            );
        }
    }

    #[test]
    fn counters_end_with_total() {
        for name in ALL_METRIC_NAMES
            .iter()
            .filter(|n| **n != ANALYZER_ANALYSIS_DURATION_SECONDS)
        {
            assert!(name.ends_with("_total"), "Counter '{}' must end with _total", name);
        }
    }

    #[test]
    fn describe_all_does_not_panic() {
        // 레코더 미설치 상태에서도 패닉하지 않아야 함
        describe_all();
    }

    #[test]
    fn label_keys_are_lowercase() {
        for label in [LABEL_CHECKSUM_TYPE, LABEL_RESULT] {
            assert_eq!(label.to_lowercase(), label);
        }
    }
}
