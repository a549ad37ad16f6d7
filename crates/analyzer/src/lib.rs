#![doc = include_str!("../README.md")]
//!
//! # Module Structure
//!
//! - [`error`]: Domain error types (`AnalyzerError`)
//! - [`config`]: Analyzer configuration (`DistributionAnalyzerConfig`, builder)
//! - [`vfs`]: Virtual file system over nested archives (`VirtualFileSystem`, `LocalVfs`, `LayerGuard`)
//! - [`recursion`]: Archive descent decisions (`RecursionController`)
//! - [`checksum`]: Streaming digests and inclusion policy (`ChecksumEngine`, `InclusionPolicy`)
//! - [`index`]: Deduplicating checksum index and file error sink (`DedupIndex`, `ErrorSink`)
//! - [`stream`]: Real-time primary checksum stream (`ResultStream`, `StreamItem`)
//! - [`cache`]: Persistent checksum cache (`CacheStore`, `SledCacheStore`, `CacheGateway`)
//! - [`license`]: Package descriptor license harvesting (`LicenseExtractor`, `LicenseIndex`)
//! - [`event`]: Analysis progress events (`AnalysisEvent`)
//! - [`output`]: JSON result files
//! - [`analyzer`]: Main orchestrator (`DistributionAnalyzer`, `DistributionAnalyzerBuilder`)
//!
//! # Architecture
//!
//! ```text
//! inputs --> LocalVfs --> CacheGateway --hit--> DedupIndex
//!                |                                  ^
//!                | miss                             |
//!                v                                  |
//!       RecursionController --> ChecksumEngine -----+--> ResultStream --> consumer
//!                |
//!                +--> LicenseExtractor --> LicenseIndex
//!                                               |
//!                                     output (checksums-<type>.json, licenses.json)
//! ```

pub mod analyzer;
pub mod cache;
pub mod checksum;
pub mod config;
pub mod error;
pub mod event;
pub mod index;
pub mod license;
pub mod output;
pub mod recursion;
pub mod stream;
pub mod vfs;

// --- Public API Re-exports ---

// Analyzer (main orchestrator)
pub use analyzer::{AnalysisReport, AnalysisStats, DistributionAnalyzer, DistributionAnalyzerBuilder};

// Configuration
pub use config::{DistributionAnalyzerConfig, DistributionAnalyzerConfigBuilder};

// Error
pub use error::AnalyzerError;

// Events
pub use event::{AnalysisEvent, AnalysisEventKind, EventReceiver};

// Virtual file system
pub use vfs::{LayerGuard, LocalVfs, Node, NodeContent, Scheme, VirtualFileSystem};

// Checksums
pub use checksum::{ChecksumEngine, InclusionPolicy};
pub use index::{DedupIndex, ErrorSink, InverseIndex};
pub use stream::{ChecksumReceiver, ResultStream, StreamItem, collect_until_done};

// Cache
pub use cache::{CacheGateway, CacheStore, MemoryCacheStore, SledCacheStore};

// Licenses
pub use license::{
    LicenseExtractor, LicenseIndex, LicenseInfo, LicenseMapping, LicenseResolver,
    PomLicenseExtractor,
};
