#![doc = include_str!("../README.md")]

pub mod config;
pub mod error;
pub mod event;
pub mod metrics;
pub mod types;

// --- 주요 타입 re-export ---

// 에러
pub use error::{AnalysisError, ConfigError, DistfinderError};

// 설정
pub use config::DistfinderConfig;

// 이벤트
pub use event::{Event, EventMetadata};

// 도메인 타입
pub use types::{Checksum, ChecksumMap, ChecksumType, FileError, LocalFile};
