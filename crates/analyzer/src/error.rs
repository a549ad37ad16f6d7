//! 배포본 분석기 에러 타입
//!
//! [`AnalyzerError`]는 분석기 내부에서 발생할 수 있는 모든 에러를 나타냅니다.
//! `From<AnalyzerError> for DistfinderError` 구현을 통해 `?` 연산자로
//! 상위 에러 타입으로 전파됩니다.
//!
//! # 에러 카테고리
//!
//! 치명적 여부는 분석기가 결정합니다.
//!
//! - **입력**: `InputNotFound`, `UnsupportedInput` (즉시 중단)
//! - **아카이브**: `Archive`, `EntryTooLarge` (파일 에러로 기록 후 계속)
//! - **체크섬**: `Checksum` (진행 중 배치 완료 후 중단)
//! - **캐시**: `CacheIncompatible`, `Cache` (중단)
//! - **라이선스**: `Descriptor` (경고 후 계속)
//! - **설정**: `Config`
//! - **결과 파일**: `Output`
//! - **파일 I/O**: `Io`
//! - **중단 요청**: `Cancelled`

use std::error::Error as StdError;

use distfinder_core::error::{AnalysisError, DistfinderError};

/// 배포본 분석기 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum AnalyzerError {
    /// 입력 파일이 존재하지 않음
    #[error("input file {input} does not exist")]
    InputNotFound {
        /// 입력 로케이터
        input: String,
    },

    /// 지원하지 않는 입력 (원격 URI 등)
    #[error("unsupported input: {input}: {reason}")]
    UnsupportedInput {
        /// 입력 로케이터
        input: String,
        /// 거부 사유
        reason: String,
    },

    /// 아카이브 열기/디코딩 실패
    #[error("unable to open archive: {path}: {reason}")]
    Archive {
        /// 아카이브 경로
        path: String,
        /// 실패 사유
        reason: String,
    },

    /// 엔트리 크기 초과
    #[error("entry too large: {path}: {size} bytes (max: {max})")]
    EntryTooLarge {
        /// 엔트리 경로
        path: String,
        /// 실제 크기 (바이트)
        size: u64,
        /// 최대 허용 크기 (바이트)
        max: u64,
    },

    /// 체크섬 계산 실패
    #[error("checksum failed: {path}: {source}")]
    Checksum {
        /// 파일 경로
        path: String,
        /// 원본 I/O 에러
        source: std::io::Error,
    },

    /// 캐시 형식 불일치
    #[error("incompatible cache at {location}: {reason}")]
    CacheIncompatible {
        /// 캐시 위치
        location: String,
        /// 불일치 사유
        reason: String,
    },

    /// 캐시 저장소 에러
    #[error("cache error: {0}")]
    Cache(String),

    /// 패키지 기술자(pom) 파싱 실패
    #[error("descriptor parse error: {path}: {reason}")]
    Descriptor {
        /// 기술자 경로
        path: String,
        /// 파싱 실패 사유
        reason: String,
    },

    /// 결과 파일 쓰기/읽기 실패
    #[error("output error: {path}: {reason}")]
    Output {
        /// 결과 파일 경로
        path: String,
        /// 실패 사유
        reason: String,
    },

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },

    /// 파일 I/O 에러
    #[error("io error: {path}: {source}")]
    Io {
        /// 관련 파일 경로
        path: String,
        /// 원본 I/O 에러
        source: std::io::Error,
    },

    /// 분석 중단 요청
    #[error("analysis cancelled")]
    Cancelled,
}

impl AnalyzerError {
    /// 아카이브 에러를 생성합니다.
    pub fn archive(path: impl Into<String>, reason: impl ToString) -> Self {
        Self::Archive {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// I/O 에러를 생성합니다.
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<AnalyzerError> for DistfinderError {
    fn from(err: AnalyzerError) -> Self {
        match err {
            AnalyzerError::InputNotFound { input } => {
                DistfinderError::Analysis(AnalysisError::InputNotFound(input))
            }
            AnalyzerError::Checksum { path, source } => DistfinderError::Analysis(
                AnalysisError::Checksum(format!("{path}: {source}")),
            ),
            AnalyzerError::CacheIncompatible { location, reason } => DistfinderError::Analysis(
                AnalysisError::CacheIncompatible(format!("{location}: {reason}")),
            ),
            AnalyzerError::Cache(msg) => DistfinderError::Analysis(AnalysisError::Cache(msg)),
            AnalyzerError::Cancelled => DistfinderError::Analysis(AnalysisError::Cancelled),
            AnalyzerError::Io { source, .. } => DistfinderError::Io(source),
            other => DistfinderError::Analysis(AnalysisError::Failed(other.to_string())),
        }
    }
}

/// 에러와 그 원인 체인 전체를 `: `로 연결한 메시지를 만듭니다.
///
/// 파일 에러 목록에 기록되는 메시지 형식입니다. 바로 위 메시지에
/// 이미 포함된 원인은 반복하지 않습니다.
pub fn message_chain(err: &(dyn StdError + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.ends_with(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_not_found_display() {
        let err = AnalyzerError::InputNotFound {
            input: "/tmp/missing.zip".to_owned(),
        };
        assert_eq!(err.to_string(), "input file /tmp/missing.zip does not exist");
    }

    #[test]
    fn archive_error_display() {
        let err = AnalyzerError::archive("lib/bad.gz", "invalid gzip header");
        let msg = err.to_string();
        assert!(msg.contains("lib/bad.gz"));
        assert!(msg.contains("invalid gzip header"));
    }

    #[test]
    fn entry_too_large_display() {
        let err = AnalyzerError::EntryTooLarge {
            path: "big.bin".to_owned(),
            size: 2048,
            max: 1024,
        };
        let msg = err.to_string();
        assert!(msg.contains("2048"));
        assert!(msg.contains("1024"));
    }

    #[test]
    fn cache_incompatible_display() {
        let err = AnalyzerError::CacheIncompatible {
            location: "/var/cache/distfinder".to_owned(),
            reason: "schema version 0 != 1".to_owned(),
        };
        assert!(err.to_string().contains("/var/cache/distfinder"));
    }

    #[test]
    fn converts_input_not_found_to_core() {
        let err: DistfinderError = AnalyzerError::InputNotFound {
            input: "x".to_owned(),
        }
        .into();
        assert!(matches!(
            err,
            DistfinderError::Analysis(AnalysisError::InputNotFound(_))
        ));
    }

    #[test]
    fn converts_cancelled_to_core() {
        let err: DistfinderError = AnalyzerError::Cancelled.into();
        assert!(matches!(
            err,
            DistfinderError::Analysis(AnalysisError::Cancelled)
        ));
    }

    #[test]
    fn converts_io_to_core_io() {
        let err: DistfinderError = AnalyzerError::io(
            "out/checksums-md5.json",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        )
        .into();
        assert!(matches!(err, DistfinderError::Io(_)));
    }

    #[test]
    fn converts_descriptor_to_failed() {
        let err: DistfinderError = AnalyzerError::Descriptor {
            path: "pom.xml".to_owned(),
            reason: "missing artifactId".to_owned(),
        }
        .into();
        assert!(matches!(
            err,
            DistfinderError::Analysis(AnalysisError::Failed(_))
        ));
    }

    #[test]
    fn message_chain_joins_sources() {
        let inner = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "unexpected end of file");
        let err = AnalyzerError::Checksum {
            path: "a.bin".to_owned(),
            source: inner,
        };
        // Display가 이미 원인을 포함하므로 중복되지 않음
        assert_eq!(
            message_chain(&err),
            "checksum failed: a.bin: unexpected end of file"
        );
    }
}
