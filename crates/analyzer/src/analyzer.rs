//! 배포본 분석기 오케스트레이터 -- 전체 분석 흐름 관리
//!
//! [`DistributionAnalyzer`]는 설정된 루트 입력을 순서대로 분석하여
//! 다이제스트 종류별 체크섬 맵, 역인덱스, 파일 에러, 라이선스를 모읍니다.
//!
//! # 내부 아키텍처
//!
//! ```text
//! inputs --> VirtualFileSystem::resolve --> CacheGateway (root digest)
//!                                               | miss
//!                                               v
//!                    RecursionController <-- layer walk --> LicenseExtractor
//!                                               |
//!                                  ChecksumEngine (rayon pool / tar inline)
//!                                               |
//!                                  DedupIndex --+--> ResultStream --> consumer
//!                                               |
//!                                  CacheGateway (write-back)
//! ```
//!
//! 순회(나열, 재귀 결정, 레이어 열기/닫기)는 호출 스레드에서 수행하고,
//! 체크섬 계산만 워커 풀에서 병렬로 실행합니다. 배치 결과는 호출 스레드에서
//! 한 번에 병합되므로 인덱스에 잠금이 필요 없습니다.

use std::collections::{BTreeMap, BTreeSet};
use std::io::Read;
use std::sync::Arc;
use std::time::Instant;

use metrics::{counter, histogram};
use rayon::prelude::*;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use distfinder_core::metrics as m;
use distfinder_core::types::{Checksum, ChecksumMap, ChecksumType, FileError};

use crate::cache::{CacheGateway, CacheStore, SledCacheStore};
use crate::checksum::{ChecksumEngine, InclusionPolicy, normalize_path};
use crate::config::DistributionAnalyzerConfig;
use crate::error::{AnalyzerError, message_chain};
use crate::event::{AnalysisEvent, AnalysisEventKind, EventEmitter};
use crate::index::{DedupIndex, ErrorSink, InverseIndex};
use crate::license::{
    LicenseExtractor, LicenseIndex, LicenseInfo, LicenseMapping, LicenseResolver,
    PomLicenseExtractor,
};
use crate::output;
use crate::recursion::{Descent, ParentInfo, RecursionController};
use crate::stream::{ChecksumReceiver, ResultStream};
use crate::vfs::{LAYER_SEPARATOR, LocalVfs, Node, Scheme, VirtualFileSystem};

/// 분석 실행 통계
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AnalysisStats {
    /// 분석한 루트 입력 수
    pub inputs_analyzed: usize,
    /// 새로 계산하여 병합한 체크섬 수 (모든 종류 합계)
    pub checksums_computed: usize,
    /// 캐시에서 복원한 체크섬 수 (모든 종류 합계)
    pub checksums_from_cache: usize,
    pub cache_hits: usize,
    pub cache_misses: usize,
    /// 연 중첩 아카이브 수
    pub archives_opened: usize,
    /// 포함 정책으로 제외된 파일 수
    pub files_excluded: usize,
    /// 라이선스를 수집한 좌표 수
    pub licenses_found: usize,
    /// 소요 시간 (밀리초)
    pub duration_ms: u64,
}

/// 분석 결과 (실행 완료 후 읽기 전용)
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    /// 분석한 루트 입력
    pub inputs: Vec<String>,
    /// 다이제스트 종류별 체크섬 맵
    pub checksums: BTreeMap<ChecksumType, ChecksumMap>,
    /// 파일명 → 체크섬 역인덱스
    pub files: InverseIndex,
    /// 파일 에러 (발생 순서)
    pub file_errors: Vec<FileError>,
    /// 좌표 → 라이선스
    pub licenses: BTreeMap<String, BTreeSet<LicenseInfo>>,
    /// 실행 통계
    pub stats: AnalysisStats,
}

impl AnalysisReport {
    /// 특정 종류의 체크섬 맵
    pub fn checksums_for(&self, checksum_type: ChecksumType) -> Option<&ChecksumMap> {
        self.checksums.get(&checksum_type)
    }

    /// 특정 종류의 (값, 파일) 엔트리 수
    pub fn entry_count(&self, checksum_type: ChecksumType) -> usize {
        self.checksums
            .get(&checksum_type)
            .map(|m| m.values().map(BTreeSet::len).sum())
            .unwrap_or(0)
    }

    /// 체크섬 파일과 라이선스 파일을 씁니다.
    pub fn write_outputs(
        &self,
        output_dir: &std::path::Path,
    ) -> Result<Vec<std::path::PathBuf>, AnalyzerError> {
        let mut paths = output::write_all_checksums(output_dir, &self.checksums)?;
        paths.push(output::write_licenses(output_dir, &self.licenses)?);
        Ok(paths)
    }
}

/// 실행 중 누적 상태 (순회 스레드 전용)
struct RunState {
    index: DedupIndex,
    errors: ErrorSink,
    licenses: LicenseIndex,
    stats: AnalysisStats,
    stream: ResultStream,
}

/// 루트 입력 하나의 순회 범위
struct InputScope {
    input: String,
    prefix: String,
    engine: ChecksumEngine,
    /// 입력 내부에서 계산한 체크섬 (캐시에 다시 기록할 조각)
    fragment: DedupIndex,
}

impl InputScope {
    fn new(input: &str, prefix: String, types: &BTreeSet<ChecksumType>) -> Self {
        Self {
            input: input.to_owned(),
            prefix,
            engine: ChecksumEngine::new(types.iter().copied()),
            fragment: DedupIndex::new(types.iter().copied()),
        }
    }

    /// 로그/에러용 정규화 경로
    ///
    /// 열린 루트 아카이브 자체는 레이어 접두어와 맞지 않으므로 부모 디렉토리 기준으로 줄입니다.
    fn relative(&self, path: &str) -> String {
        match self.prefix.strip_suffix(LAYER_SEPARATOR) {
            Some(root_path) if root_path == path => {
                let parent = path.rfind('/').map_or("", |i| &path[..=i]);
                normalize_path(path, parent)
            }
            _ => normalize_path(path, &self.prefix),
        }
    }
}

/// 루트 입력의 캐시 조회 결과
struct CacheRecovery {
    /// 루트 입력 자체의 다이제스트 (요청된 모든 종류)
    own: BTreeSet<Checksum>,
    /// 미스한 (종류, 루트 다이제스트 값)
    misses: Vec<(ChecksumType, String)>,
}

/// 배포본 분석기
///
/// 한 인스턴스는 한 번만 실행됩니다 ([`analyze`](Self::analyze)가 소유권을 가져감).
/// 다시 분석하려면 [`DistributionAnalyzerBuilder`]로 새 인스턴스를 만들어야 합니다.
pub struct DistributionAnalyzer {
    config: DistributionAnalyzerConfig,
    inputs: Vec<String>,
    vfs: Arc<dyn VirtualFileSystem>,
    recursion: RecursionController,
    policy: InclusionPolicy,
    cache: Option<CacheGateway>,
    extractors: Vec<Box<dyn LicenseExtractor>>,
    resolver: LicenseResolver,
    pool: rayon::ThreadPool,
    stream: ResultStream,
    events: EventEmitter,
    cancel: CancellationToken,
}

impl DistributionAnalyzer {
    /// 분석기 설정
    pub fn config(&self) -> &DistributionAnalyzerConfig {
        &self.config
    }

    /// 분석할 루트 입력
    pub fn inputs(&self) -> &[String] {
        &self.inputs
    }

    /// 캐시 사용 여부
    pub fn has_cache(&self) -> bool {
        self.cache.is_some()
    }

    /// 모든 입력을 분석합니다 (블로킹).
    ///
    /// 성공이든 실패든 결과 스트림에는 마지막에 종료 표시가 정확히 한 번 들어갑니다.
    /// 비동기 컨텍스트에서는 `tokio::task::spawn_blocking` 안에서 호출해야 합니다.
    pub fn analyze(mut self) -> Result<AnalysisReport, AnalyzerError> {
        let started = Instant::now();
        let types = self.config.checksum_types.clone();

        info!(
            inputs = self.inputs.len(),
            checksum_types = ?types.iter().map(ChecksumType::as_str).collect::<Vec<_>>(),
            disable_recursion = self.config.disable_recursion,
            workers = self.pool.current_num_threads(),
            "starting distribution analysis"
        );

        let stream = std::mem::replace(&mut self.stream, ResultStream::disabled());
        let mut run = RunState {
            index: DedupIndex::new(types.iter().copied()),
            errors: ErrorSink::new(),
            licenses: LicenseIndex::new(),
            stats: AnalysisStats::default(),
            stream,
        };

        let result = self.analyze_inputs(&mut run);
        run.stream.finish();

        let elapsed = started.elapsed();
        histogram!(m::ANALYZER_ANALYSIS_DURATION_SECONDS).record(elapsed.as_secs_f64());
        run.stats.duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);

        if let Err(e) = result {
            error!(error = %e, "distribution analysis failed");
            return Err(e);
        }

        for checksum_type in &types {
            info!(
                checksum_type = %checksum_type,
                checksums = run.index.entry_count(*checksum_type),
                "analysis produced {checksum_type} checksums"
            );
        }

        let (unique, total) = run.licenses.summary();
        run.stats.licenses_found = run.licenses.len();
        info!(
            "Found {} unique licenses (out of {} total): {}",
            unique.len(),
            total,
            unique.into_iter().collect::<Vec<_>>().join(", ")
        );

        if !run.errors.is_empty() {
            warn!(file_errors = run.errors.len(), "analysis finished with file errors");
        }

        self.events.emit(AnalysisEventKind::AnalysisFinished {
            checksums: run.index.total_entries(),
            file_errors: run.errors.len(),
        });

        info!(
            duration_ms = run.stats.duration_ms,
            checksums = run.stats.checksums_computed,
            from_cache = run.stats.checksums_from_cache,
            archives = run.stats.archives_opened,
            "distribution analysis completed"
        );

        let (checksums, files) = run.index.into_parts();
        Ok(AnalysisReport {
            inputs: self.inputs.clone(),
            checksums,
            files,
            file_errors: run.errors.into_inner(),
            licenses: run.licenses.into_records(),
            stats: run.stats,
        })
    }

    fn analyze_inputs(&self, run: &mut RunState) -> Result<(), AnalyzerError> {
        for input in &self.inputs {
            self.check_cancelled()?;
            self.analyze_input(run, input)?;
            run.stats.inputs_analyzed += 1;
            counter!(m::ANALYZER_INPUTS_ANALYZED_TOTAL).increment(1);
        }
        Ok(())
    }

    fn check_cancelled(&self) -> Result<(), AnalyzerError> {
        if self.cancel.is_cancelled() {
            warn!("analysis cancelled");
            return Err(AnalyzerError::Cancelled);
        }
        Ok(())
    }

    fn analyze_input(&self, run: &mut RunState, input: &str) -> Result<(), AnalyzerError> {
        info!(input = %input, "analyzing input");
        self.events.emit(AnalysisEventKind::InputStarted {
            input: input.to_owned(),
        });

        let root = self.vfs.resolve(input)?;
        let root_parent = ParentInfo {
            is_layer_root: false,
            child_count: 1,
        };
        let descent = if root.is_folder() {
            None
        } else {
            Some(self.recursion.decide(&root, 1, root_parent))
        };

        let mut remaining = self.config.checksum_types.clone();
        let mut pending_writes: Vec<(ChecksumType, String)> = Vec::new();
        let mut own: Option<BTreeSet<Checksum>> = None;

        if let Some(cache) = &self.cache
            && root.is_file()
            && !remaining.is_empty()
        {
            let recovered = self.recover_from_cache(run, cache, &root, input, &mut remaining)?;
            pending_writes = recovered.misses;
            own = Some(recovered.own);

            if remaining.is_empty() {
                // 캐시 조각에는 입력 내부 내용만 있으므로 열지 않는 루트 파일 자체는 매번 병합
                if descent == Some(Descent::Skip) {
                    let scope = InputScope::new(input, parent_prefix(&root), &remaining);
                    self.merge_root_file(run, &scope, &root, own)?;
                }
                info!(input = %input, "all checksums recovered from cache, skipping traversal");
                self.events.emit(AnalysisEventKind::InputFinished {
                    input: input.to_owned(),
                });
                return Ok(());
            }
        }

        let errors_before = run.errors.len();
        let mut scope = InputScope::new(input, String::new(), &remaining);

        match descent {
            None => {
                scope.prefix = format!("{}/", root.path().trim_end_matches('/'));
                self.walk_layer(run, &mut scope, &root, 1)?;
            }
            Some(Descent::Open) => {
                scope.prefix = format!("{}{LAYER_SEPARATOR}", root.path());
                self.open_and_walk(run, &mut scope, &root, 1)?;
            }
            Some(Descent::TooDeep) => {
                scope.prefix = parent_prefix(&root);
                self.record_too_deep(run, &scope, &root);
            }
            Some(Descent::Skip) => {
                scope.prefix = parent_prefix(&root);
                self.merge_root_file(run, &scope, &root, own)?;
                self.harvest_licenses(run, &scope, &root);
            }
        }

        for checksum_type in &remaining {
            self.events.emit(AnalysisEventKind::ChecksumsComputed {
                input: input.to_owned(),
                checksum_type: *checksum_type,
                count: scope.fragment.entry_count(*checksum_type),
                from_cache: false,
            });
        }

        if let Some(cache) = &self.cache {
            if run.errors.len() > errors_before {
                warn!(
                    input = %input,
                    "input produced file errors, not writing its checksums to the cache"
                );
            } else {
                for (checksum_type, value) in &pending_writes {
                    let fragment = scope
                        .fragment
                        .checksums(*checksum_type)
                        .cloned()
                        .unwrap_or_default();
                    cache.store(*checksum_type, value, &fragment)?;
                    debug!(
                        input = %input,
                        checksum_type = %checksum_type,
                        checksums = fragment.len(),
                        "stored checksums in cache"
                    );
                }
                cache.flush()?;
            }
        }

        self.events.emit(AnalysisEventKind::InputFinished {
            input: input.to_owned(),
        });
        Ok(())
    }

    /// 열지 않는 루트 파일 자체의 체크섬을 전체 인덱스에만 병합합니다.
    ///
    /// 이 엔트리는 입력 내부 내용이 아니므로 캐시 조각(`scope.fragment`)에 넣지 않습니다.
    /// `own`은 캐시 조회 때 계산한 루트 다이제스트이며, 파일명만 다시 정규화합니다.
    fn merge_root_file(
        &self,
        run: &mut RunState,
        scope: &InputScope,
        root: &Node,
        own: Option<BTreeSet<Checksum>>,
    ) -> Result<(), AnalyzerError> {
        if self.config.checksum_types.is_empty() {
            return Ok(());
        }

        let normalized = normalize_path(root.path(), &scope.prefix);
        if !self.policy.include_file(root, &normalized) {
            debug!(path = %normalized, "file excluded from checksums");
            run.stats.files_excluded += 1;
            return Ok(());
        }

        let checksums: BTreeSet<Checksum> = match own {
            Some(own) => own
                .into_iter()
                .map(|c| Checksum::new(c.checksum_type, c.value, normalized.clone(), c.file_size))
                .collect(),
            None => ChecksumEngine::new(self.config.checksum_types.iter().copied()).compute(
                self.vfs.as_ref(),
                root,
                &scope.prefix,
            )?,
        };

        for checksum in &checksums {
            merge_into_run(run, checksum);
        }
        Ok(())
    }

    /// 루트 입력의 다이제스트로 캐시를 조회합니다.
    ///
    /// 적중한 종류는 `remaining`에서 제거되고, 미스한 종류는 (종류, 값)으로 반환되어
    /// 순회 후 다시 기록됩니다.
    fn recover_from_cache(
        &self,
        run: &mut RunState,
        cache: &CacheGateway,
        root: &Node,
        input: &str,
        remaining: &mut BTreeSet<ChecksumType>,
    ) -> Result<CacheRecovery, AnalyzerError> {
        let engine = ChecksumEngine::new(remaining.iter().copied());
        let own = engine.compute(self.vfs.as_ref(), root, "")?;
        let mut misses = Vec::new();

        for checksum_type in remaining.clone() {
            let Some(own_checksum) = Checksum::find_by_type(&own, checksum_type) else {
                continue;
            };
            let value = own_checksum.value.clone();

            let fragment = match cache.lookup(checksum_type, &value) {
                Ok(found) => found,
                Err(e @ AnalyzerError::CacheIncompatible { .. }) => {
                    error!(
                        location = %cache.location(),
                        error = %e,
                        "cache format has changed; delete the existing cache at {} and re-run",
                        cache.location()
                    );
                    return Err(e);
                }
                Err(e) => return Err(e),
            };

            match fragment {
                Some(fragment) => {
                    run.stats.cache_hits += 1;
                    counter!(m::ANALYZER_CACHE_HITS_TOTAL).increment(1);

                    let count: usize = fragment.values().map(BTreeSet::len).sum();
                    for checksum in run.index.merge_map(checksum_type, &fragment) {
                        run.stream.push(&checksum);
                    }
                    run.stats.checksums_from_cache += count;
                    counter!(
                        m::ANALYZER_CHECKSUMS_CACHED_TOTAL,
                        m::LABEL_CHECKSUM_TYPE => checksum_type.as_str()
                    )
                    .increment(count as u64);

                    remaining.remove(&checksum_type);
                    self.events.emit(AnalysisEventKind::ChecksumsComputed {
                        input: input.to_owned(),
                        checksum_type,
                        count,
                        from_cache: true,
                    });
                    info!(
                        input = %input,
                        checksum_type = %checksum_type,
                        "Loaded {count} checksums for file {input} from cache"
                    );
                }
                None => {
                    run.stats.cache_misses += 1;
                    counter!(m::ANALYZER_CACHE_MISSES_TOTAL).increment(1);
                    info!(
                        input = %input,
                        checksum_type = %checksum_type,
                        "{checksum_type} checksum {value} for file {input} not found in cache"
                    );
                    misses.push((checksum_type, value));
                }
            }
        }

        Ok(CacheRecovery { own, misses })
    }

    /// 아카이브 노드(깊이 `depth`)를 레이어로 열고 구성원을 `depth + 1`에서 순회합니다.
    ///
    /// 열기 실패는 파일 에러로 기록하고 계속합니다. 레이어는 반환 시 닫힙니다.
    fn open_and_walk(
        &self,
        run: &mut RunState,
        scope: &mut InputScope,
        archive: &Node,
        depth: usize,
    ) -> Result<(), AnalyzerError> {
        let mut layer = match self.vfs.open_layer(archive) {
            Ok(layer) => layer,
            Err(e) => {
                counter!(m::ANALYZER_ARCHIVES_OPENED_TOTAL, m::LABEL_RESULT => "failure")
                    .increment(1);
                let message = match &e {
                    AnalyzerError::Archive { reason, .. } => reason.clone(),
                    other => message_chain(other),
                };
                warn!(
                    path = %archive.path(),
                    error = %message,
                    "Unable to process archive/compressed file"
                );
                self.record_error(run, scope, archive.path(), message);
                return Ok(());
            }
        };

        counter!(m::ANALYZER_ARCHIVES_OPENED_TOTAL, m::LABEL_RESULT => "success").increment(1);
        run.stats.archives_opened += 1;
        self.events.emit(AnalysisEventKind::ArchiveOpened {
            path: scope.relative(archive.path()),
            depth,
        });

        for (path, err) in layer.take_rejected() {
            warn!(path = %path, error = %err, "archive entry rejected");
            self.record_error(run, scope, &path, message_chain(&err));
        }

        self.walk_layer(run, scope, layer.root(), depth + 1)
    }

    /// 폴더 아래의 모든 파일을 깊이 `depth`에서 처리합니다.
    fn walk_layer(
        &self,
        run: &mut RunState,
        scope: &mut InputScope,
        folder: &Node,
        depth: usize,
    ) -> Result<(), AnalyzerError> {
        let mut files = Vec::new();
        self.collect_files(run, scope, folder, &mut files);

        self.check_cancelled()?;

        let inline = folder.scheme() == Scheme::Tar;
        self.process_files(run, scope, &files, inline)?;

        for (file, parent) in &files {
            self.harvest_licenses(run, scope, file);

            match self.recursion.decide(file, depth, *parent) {
                Descent::Open => self.open_and_walk(run, scope, file, depth)?,
                Descent::TooDeep => self.record_too_deep(run, scope, file),
                Descent::Skip => {}
            }
        }
        Ok(())
    }

    /// 폴더를 재귀적으로 나열하여 (파일, 부모 정보)를 순회 순서대로 모읍니다.
    fn collect_files(
        &self,
        run: &mut RunState,
        scope: &InputScope,
        folder: &Node,
        out: &mut Vec<(Node, ParentInfo)>,
    ) {
        let children = match self.vfs.children(folder) {
            Ok(children) => children,
            Err(e) => {
                warn!(path = %folder.path(), error = %e, "unable to list folder");
                self.record_error(run, scope, folder.path(), message_chain(&e));
                return;
            }
        };

        let parent = ParentInfo {
            is_layer_root: folder.is_layer_root(),
            child_count: children.len(),
        };

        for child in children {
            if child.is_folder() {
                self.collect_files(run, scope, &child, out);
            } else {
                out.push((child, parent));
            }
        }
    }

    /// 포함 대상 파일의 체크섬을 계산하여 병합합니다.
    ///
    /// `inline`이면 순회 순서대로 하나씩, 아니면 워커 풀에서 배치로 계산합니다.
    /// 배치 중 실패가 있으면 배치를 모두 병합한 뒤 첫 번째 에러를 반환합니다.
    fn process_files(
        &self,
        run: &mut RunState,
        scope: &mut InputScope,
        files: &[(Node, ParentInfo)],
        inline: bool,
    ) -> Result<(), AnalyzerError> {
        if scope.engine.checksum_types().is_empty() {
            return Ok(());
        }

        let mut eligible: Vec<&Node> = Vec::with_capacity(files.len());
        for (file, _) in files {
            let normalized = normalize_path(file.path(), &scope.prefix);
            if self.policy.include_file(file, &normalized) {
                eligible.push(file);
            } else {
                debug!(path = %normalized, "file excluded from checksums");
                run.stats.files_excluded += 1;
            }
        }

        if inline {
            for file in eligible {
                self.check_cancelled()?;
                let checksums = scope.engine.compute(self.vfs.as_ref(), file, &scope.prefix)?;
                merge_checksums(run, scope, checksums);
            }
            return Ok(());
        }

        if eligible.is_empty() {
            return Ok(());
        }

        let engine = &scope.engine;
        let prefix = scope.prefix.as_str();
        let vfs = self.vfs.as_ref();
        let results: Vec<Result<BTreeSet<Checksum>, AnalyzerError>> = self.pool.install(|| {
            eligible
                .par_iter()
                .map(|file| engine.compute(vfs, file, prefix))
                .collect()
        });

        let mut first_error = None;
        for result in results {
            match result {
                Ok(checksums) => merge_checksums(run, scope, checksums),
                Err(e) => {
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// 패키지 기술자라면 라이선스를 추출합니다. 실패는 경고만 남깁니다.
    fn harvest_licenses(&self, run: &mut RunState, scope: &InputScope, file: &Node) {
        let Some(extractor) = self.extractors.iter().find(|e| e.is_descriptor(file.name()))
        else {
            return;
        };

        let mut content = Vec::new();
        let read = self
            .vfs
            .open_content(file)
            .and_then(|mut r| {
                r.read_to_end(&mut content)
                    .map_err(|e| AnalyzerError::io(file.path(), e))
            });
        if let Err(e) = read {
            warn!(path = %file.path(), error = %e, "Unable to read licenses from file");
            return;
        }

        match extractor.extract(file.path(), &content) {
            Ok(package) => {
                let coordinate = package.coordinate.clone();
                if run.licenses.add(package, file.path(), &self.resolver) {
                    counter!(m::ANALYZER_LICENSES_FOUND_TOTAL).increment(1);
                    debug!(
                        coordinate = %coordinate,
                        source = %normalize_path(file.path(), &scope.prefix),
                        "licenses harvested"
                    );
                }
            }
            Err(e) => {
                warn!(path = %file.path(), error = %e, "Unable to read licenses from file");
            }
        }
    }

    fn record_too_deep(&self, run: &mut RunState, scope: &InputScope, file: &Node) {
        let message = format!(
            "maximum archive nesting depth {} exceeded",
            self.recursion.max_depth()
        );
        warn!(path = %file.path(), "{message}");
        self.record_error(run, scope, file.path(), message);
    }

    fn record_error(&self, run: &mut RunState, scope: &InputScope, path: &str, message: String) {
        let normalized = scope.relative(path);
        debug!(input = %scope.input, path = %normalized, "recording file error");
        self.events.emit(AnalysisEventKind::FileFailed {
            path: normalized.clone(),
            message: message.clone(),
        });
        run.errors.record(normalized, message);
    }
}

/// 계산된 체크섬을 입력 조각과 전체 인덱스에 병합하고, 새 항목은 스트림으로 보냅니다.
fn merge_checksums(run: &mut RunState, scope: &mut InputScope, checksums: BTreeSet<Checksum>) {
    for checksum in &checksums {
        scope.fragment.merge(checksum);
        merge_into_run(run, checksum);
    }
}

/// 전체 인덱스에 병합하고, 새 항목이면 통계를 올리고 스트림으로 보냅니다.
fn merge_into_run(run: &mut RunState, checksum: &Checksum) {
    if run.index.merge(checksum) {
        run.stats.checksums_computed += 1;
        counter!(
            m::ANALYZER_CHECKSUMS_COMPUTED_TOTAL,
            m::LABEL_CHECKSUM_TYPE => checksum.checksum_type.as_str()
        )
        .increment(1);
        run.stream.push(checksum);
    }
}

/// 열지 않은 루트 파일의 접두어 (부모 디렉토리 + `/`)
fn parent_prefix(root: &Node) -> String {
    let path = root.path();
    path.strip_suffix(root.name()).unwrap_or(path).to_owned()
}

/// 배포본 분석기 빌더
///
/// 분석기를 구성하고 결과 스트림 채널을 생성합니다.
pub struct DistributionAnalyzerBuilder {
    config: DistributionAnalyzerConfig,
    inputs: Vec<String>,
    vfs: Option<Arc<dyn VirtualFileSystem>>,
    cache_store: Option<Arc<dyn CacheStore>>,
    extractors: Vec<Box<dyn LicenseExtractor>>,
    license_mapping: Option<LicenseMapping>,
    stream_enabled: bool,
    event_tx: Option<mpsc::UnboundedSender<AnalysisEvent>>,
    cancel: Option<CancellationToken>,
}

impl DistributionAnalyzerBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self {
            config: DistributionAnalyzerConfig::default(),
            inputs: Vec::new(),
            vfs: None,
            cache_store: None,
            extractors: Vec::new(),
            license_mapping: None,
            stream_enabled: true,
            event_tx: None,
            cancel: None,
        }
    }

    /// 분석기 설정을 지정합니다.
    pub fn config(mut self, config: DistributionAnalyzerConfig) -> Self {
        self.config = config;
        self
    }

    /// 루트 입력을 추가합니다 (경로 또는 `file://` URI).
    pub fn input(mut self, input: impl Into<String>) -> Self {
        self.inputs.push(input.into());
        self
    }

    /// 루트 입력 여러 개를 추가합니다.
    pub fn inputs<I, S>(mut self, inputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inputs.extend(inputs.into_iter().map(Into::into));
        self
    }

    /// 가상 파일시스템을 지정합니다 (기본: [`LocalVfs`]).
    pub fn vfs(mut self, vfs: Arc<dyn VirtualFileSystem>) -> Self {
        self.vfs = Some(vfs);
        self
    }

    /// 캐시 저장소를 지정합니다.
    ///
    /// 지정하지 않으면 설정의 `cache_dir`가 있을 때 sled 캐시를 엽니다.
    pub fn cache_store(mut self, store: Arc<dyn CacheStore>) -> Self {
        self.cache_store = Some(store);
        self
    }

    /// 라이선스 추출기를 추가합니다 (기본: [`PomLicenseExtractor`]).
    pub fn license_extractor(mut self, extractor: Box<dyn LicenseExtractor>) -> Self {
        self.extractors.push(extractor);
        self
    }

    /// 라이선스 매핑 테이블을 지정합니다.
    ///
    /// 지정하지 않으면 설정의 `license_mapping_path`에서 읽습니다.
    pub fn license_mapping(mut self, mapping: LicenseMapping) -> Self {
        self.license_mapping = Some(mapping);
        self
    }

    /// 결과 스트림 사용 여부 (기본: 사용)
    pub fn stream(mut self, enabled: bool) -> Self {
        self.stream_enabled = enabled;
        self
    }

    /// 진행 이벤트 채널을 설정합니다.
    pub fn event_sender(mut self, tx: mpsc::UnboundedSender<AnalysisEvent>) -> Self {
        self.event_tx = Some(tx);
        self
    }

    /// 중단 토큰을 설정합니다.
    pub fn cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// 분석기를 빌드합니다.
    ///
    /// # Returns
    ///
    /// - `DistributionAnalyzer`: 분석기 인스턴스
    /// - `Option<ChecksumReceiver>`: 주 다이제스트 체크섬 스트림
    ///   (스트림을 끄거나 다이제스트 종류가 없으면 None)
    pub fn build(self) -> Result<(DistributionAnalyzer, Option<ChecksumReceiver>), AnalyzerError> {
        self.config.validate()?;

        if self.inputs.is_empty() {
            return Err(AnalyzerError::Config {
                field: "inputs".to_owned(),
                reason: "at least one input is required".to_owned(),
            });
        }

        let vfs: Arc<dyn VirtualFileSystem> = match self.vfs {
            Some(vfs) => vfs,
            None => Arc::new(LocalVfs::new(self.config.max_entry_size)),
        };

        let recursion = RecursionController::new(
            self.config.disable_recursion,
            self.config.max_depth,
            vfs.schemes(),
        );
        let policy = InclusionPolicy::new(
            self.config.archive_extensions.clone(),
            self.config.compile_excludes()?,
        );

        let cache_store = match (self.cache_store, &self.config.cache_dir) {
            (Some(store), _) => Some(store),
            (None, Some(dir)) => Some(Arc::new(SledCacheStore::open(dir)?) as Arc<dyn CacheStore>),
            (None, None) => None,
        };
        let cache = cache_store.map(CacheGateway::new);
        if let Some(cache) = &cache {
            info!(location = %cache.location(), "using checksum cache");
        }

        let mapping = match (self.license_mapping, &self.config.license_mapping_path) {
            (Some(mapping), _) => mapping,
            (None, Some(path)) => LicenseMapping::load(path)?,
            (None, None) => LicenseMapping::empty(),
        };

        let mut extractors = self.extractors;
        if extractors.is_empty() {
            extractors.push(Box::new(PomLicenseExtractor::new()?));
        }

        let workers = self.config.effective_worker_threads();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("distfinder-checksum-{i}"))
            .build()
            .map_err(|e| AnalyzerError::Config {
                field: "worker_threads".to_owned(),
                reason: e.to_string(),
            })?;

        let (stream, rx) = match self.config.primary_checksum_type() {
            Some(primary) if self.stream_enabled => {
                let (stream, rx) = ResultStream::channel(primary);
                (stream, Some(rx))
            }
            _ => (ResultStream::disabled(), None),
        };

        let analyzer = DistributionAnalyzer {
            config: self.config,
            inputs: self.inputs,
            vfs,
            recursion,
            policy,
            cache,
            extractors,
            resolver: LicenseResolver::new(mapping),
            pool,
            stream,
            events: EventEmitter::new(self.event_tx),
            cancel: self.cancel.unwrap_or_default(),
        };

        Ok((analyzer, rx))
    }
}

impl Default for DistributionAnalyzerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;
    use crate::vfs::NodeContent;

    #[test]
    fn build_requires_inputs() {
        let result = DistributionAnalyzerBuilder::new().build();
        assert!(matches!(
            result,
            Err(AnalyzerError::Config { ref field, .. }) if field == "inputs"
        ));
    }

    #[test]
    fn build_rejects_invalid_config() {
        let mut config = DistributionAnalyzerConfig::default();
        config.max_depth = 0;
        let result = DistributionAnalyzerBuilder::new()
            .config(config)
            .input("/tmp/x.zip")
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn build_returns_stream_for_primary_type() {
        let (analyzer, rx) = DistributionAnalyzerBuilder::new()
            .input("/tmp/x.zip")
            .build()
            .expect("build");
        assert!(rx.is_some());
        assert!(!analyzer.has_cache());
        assert_eq!(analyzer.inputs(), ["/tmp/x.zip".to_owned()]);
    }

    #[test]
    fn no_stream_without_checksum_types() {
        let mut config = DistributionAnalyzerConfig::default();
        config.checksum_types.clear();
        let (_, rx) = DistributionAnalyzerBuilder::new()
            .config(config)
            .input("/tmp/x.zip")
            .build()
            .expect("build");
        assert!(rx.is_none());
    }

    #[test]
    fn stream_can_be_disabled() {
        let (_, rx) = DistributionAnalyzerBuilder::new()
            .input("/tmp/x.zip")
            .stream(false)
            .build()
            .expect("build");
        assert!(rx.is_none());
    }

    #[test]
    fn parent_prefix_of_local_file() {
        let node = Node::new(
            "/srv/dist/a.txt",
            "a.txt",
            1,
            Scheme::File,
            NodeContent::Bytes(Bytes::from_static(b"x")),
        );
        assert_eq!(parent_prefix(&node), "/srv/dist/");
    }

    #[test]
    fn missing_input_is_fatal() {
        let (analyzer, _rx) = DistributionAnalyzerBuilder::new()
            .input("/nonexistent/dist.zip")
            .build()
            .expect("build");
        let err = analyzer.analyze().expect_err("missing input");
        assert!(matches!(err, AnalyzerError::InputNotFound { .. }));
    }

    #[test]
    fn cancelled_token_stops_before_first_input() {
        let token = CancellationToken::new();
        token.cancel();
        let (analyzer, _rx) = DistributionAnalyzerBuilder::new()
            .input("/nonexistent/dist.zip")
            .cancellation_token(token.clone())
            .build()
            .expect("build");
        assert!(matches!(analyzer.analyze(), Err(AnalyzerError::Cancelled)));
        assert!(token.is_cancelled());
    }
}
