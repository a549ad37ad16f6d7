//! 에러 타입 -- 도메인별 에러 정의

/// distfinder 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum DistfinderError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 배포본 분석 에러
    #[error("analysis error: {0}")]
    Analysis(#[from] AnalysisError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 배포본 분석 에러
///
/// 분석기 크레이트의 세부 에러가 워크스페이스 경계를 넘을 때 사용됩니다.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    /// 입력 파일이 존재하지 않음
    #[error("input not found: {0}")]
    InputNotFound(String),

    /// 체크섬 계산 실패
    #[error("checksum failed: {0}")]
    Checksum(String),

    /// 캐시 형식 불일치
    #[error("incompatible cache: {0}")]
    CacheIncompatible(String),

    /// 캐시 저장소 에러
    #[error("cache error: {0}")]
    Cache(String),

    /// 분석 중단
    #[error("analysis cancelled")]
    Cancelled,

    /// 기타 분석 실패
    #[error("analysis failed: {0}")]
    Failed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_converts_to_distfinder_error() {
        let err: DistfinderError = ConfigError::FileNotFound {
            path: "/etc/distfinder/distfinder.toml".to_owned(),
        }
        .into();
        assert!(matches!(err, DistfinderError::Config(_)));
        assert!(err.to_string().contains("distfinder.toml"));
    }

    #[test]
    fn analysis_error_converts_to_distfinder_error() {
        let err: DistfinderError = AnalysisError::InputNotFound("dist.zip".to_owned()).into();
        assert!(matches!(
            err,
            DistfinderError::Analysis(AnalysisError::InputNotFound(_))
        ));
        assert_eq!(err.to_string(), "analysis error: input not found: dist.zip");
    }

    #[test]
    fn io_error_converts_to_distfinder_error() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: DistfinderError = io.into();
        assert!(matches!(err, DistfinderError::Io(_)));
    }

    #[test]
    fn invalid_value_display_includes_field_and_reason() {
        let err = ConfigError::InvalidValue {
            field: "analyzer.max_depth".to_owned(),
            reason: "must be greater than 0".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("analyzer.max_depth"));
        assert!(msg.contains("greater than 0"));
    }

    #[test]
    fn cancelled_display() {
        assert_eq!(AnalysisError::Cancelled.to_string(), "analysis cancelled");
    }
}
