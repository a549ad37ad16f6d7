//! `distfinder analyze` command handler

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use distfinder_analyzer::{
    AnalysisReport, AnalysisStats, ChecksumReceiver, DistributionAnalyzerBuilder,
    DistributionAnalyzerConfig, StreamItem,
};
use distfinder_core::config::{AnalyzerConfig, DistfinderConfig};
use distfinder_core::types::{ChecksumType, FileError};

use crate::cli::AnalyzeArgs;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `analyze` command.
///
/// The analyzer runs on a blocking thread while an async task drains the
/// live checksum stream. Ctrl-C cancels the run at the next checkpoint.
pub async fn execute(
    args: AnalyzeArgs,
    config_path: &Path,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let config = DistfinderConfig::load_or_default(config_path).await?;
    let analyzer_config = build_analyzer_config(&args, &config.analyzer)?;
    let output_dir = analyzer_config.output_dir.clone();

    info!(inputs = args.inputs.len(), "starting distribution analysis");

    let cancel = CancellationToken::new();
    let (analyzer, stream_rx) = DistributionAnalyzerBuilder::new()
        .config(analyzer_config)
        .inputs(args.inputs.iter().cloned())
        .cancellation_token(cancel.clone())
        .build()?;

    let consumer = stream_rx.map(|mut rx| tokio::spawn(async move { consume_stream(&mut rx).await }));

    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupt received, cancelling analysis");
                cancel.cancel();
            }
        })
    };

    let result = tokio::task::spawn_blocking(move || analyzer.analyze())
        .await
        .map_err(|e| CliError::Command(format!("analysis task failed: {e}")))?;
    interrupt.abort();

    let streamed = match consumer {
        Some(handle) => handle
            .await
            .map_err(|e| CliError::Command(format!("stream consumer failed: {e}")))?,
        None => 0,
    };

    let report = result?;

    let written = if args.no_write {
        Vec::new()
    } else {
        report
            .write_outputs(&output_dir)?
            .into_iter()
            .map(|p| p.display().to_string())
            .collect()
    };

    let summary = AnalysisSummary::from_report(&report, streamed, written);
    writer.render(&summary)?;

    Ok(())
}

/// Merge CLI flags over the file/env configuration and validate the result.
///
/// Non-empty list flags replace the configured lists.
pub fn build_analyzer_config(
    args: &AnalyzeArgs,
    core: &AnalyzerConfig,
) -> Result<DistributionAnalyzerConfig, CliError> {
    let mut config = DistributionAnalyzerConfig::from_core(core);

    if !args.checksum_types.is_empty() {
        config.checksum_types = args
            .checksum_types
            .iter()
            .map(|s| {
                ChecksumType::from_str_loose(s).ok_or_else(|| {
                    CliError::Command(format!(
                        "invalid checksum type: {s} (expected: md5, sha1, sha256)"
                    ))
                })
            })
            .collect::<Result<_, _>>()?;
    }
    if args.disable_recursion {
        config.disable_recursion = true;
    }
    if !args.excludes.is_empty() {
        config.excludes = args.excludes.clone();
    }
    if !args.archive_extensions.is_empty() {
        config.archive_extensions = args.archive_extensions.clone();
    }
    if let Some(dir) = &args.output_dir {
        config.output_dir = dir.clone();
    }
    if let Some(dir) = &args.cache_dir {
        config.cache_dir = Some(dir.clone());
    }
    if let Some(path) = &args.license_mapping {
        config.license_mapping_path = Some(path.clone());
    }

    config.validate()?;
    Ok(config)
}

/// Drain the live stream until the sentinel, returning the number of checksums seen.
async fn consume_stream(rx: &mut ChecksumReceiver) -> usize {
    let mut count = 0;
    while let Some(item) = rx.recv().await {
        match item {
            StreamItem::Checksum(checksum) => {
                count += 1;
                debug!(checksum = %checksum, "streamed");
            }
            StreamItem::Done => break,
        }
    }
    count
}

/// Analysis result summary.
#[derive(Serialize)]
pub struct AnalysisSummary {
    pub inputs: Vec<String>,
    /// Digest type -> (value, file) entry count
    pub checksums: BTreeMap<String, usize>,
    /// Digest type -> number of distinct digest values
    pub unique_values: BTreeMap<String, usize>,
    pub streamed: usize,
    pub file_errors: Vec<FileError>,
    /// Coordinate -> license identifiers
    pub licenses: BTreeMap<String, Vec<String>>,
    pub stats: AnalysisStats,
    pub written: Vec<String>,
}

impl AnalysisSummary {
    pub fn from_report(report: &AnalysisReport, streamed: usize, written: Vec<String>) -> Self {
        let checksums = report
            .checksums
            .keys()
            .map(|t| (t.as_str().to_owned(), report.entry_count(*t)))
            .collect();
        let unique_values = report
            .checksums
            .iter()
            .map(|(t, map)| (t.as_str().to_owned(), map.len()))
            .collect();
        let licenses = report
            .licenses
            .iter()
            .map(|(coordinate, facts)| {
                let mut ids: Vec<String> =
                    facts.iter().map(|f| f.spdx_license_id.clone()).collect();
                ids.sort();
                ids.dedup();
                (coordinate.clone(), ids)
            })
            .collect();

        Self {
            inputs: report.inputs.clone(),
            checksums,
            unique_values,
            streamed,
            file_errors: report.file_errors.clone(),
            licenses,
            stats: report.stats.clone(),
            written,
        }
    }
}

impl Render for AnalysisSummary {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        for input in &self.inputs {
            writeln!(w, "Input: {}", input.bold())?;
        }
        writeln!(
            w,
            "Archives opened: {}  Duration: {} ms",
            self.stats.archives_opened, self.stats.duration_ms
        )?;
        writeln!(w)?;

        writeln!(w, "{:<8} {:>10} {:>10}", "Type", "Files", "Unique")?;
        writeln!(w, "{}", "-".repeat(30))?;
        for (checksum_type, count) in &self.checksums {
            writeln!(
                w,
                "{:<8} {:>10} {:>10}",
                checksum_type,
                count,
                self.unique_values.get(checksum_type).copied().unwrap_or(0)
            )?;
        }
        if self.stats.checksums_from_cache > 0 {
            writeln!(
                w,
                "Recovered from cache: {}",
                self.stats.checksums_from_cache.to_string().cyan()
            )?;
        }
        writeln!(w)?;

        if self.file_errors.is_empty() {
            writeln!(w, "File errors: {}", "0".green().bold())?;
        } else {
            writeln!(
                w,
                "File errors: {}",
                self.file_errors.len().to_string().red().bold()
            )?;
            for error in &self.file_errors {
                writeln!(w, "  {} {}", error.path.yellow(), error.message)?;
            }
        }

        writeln!(w, "Licenses: {}", self.licenses.len())?;
        for (coordinate, ids) in &self.licenses {
            let joined = ids.join(", ");
            let ids_colored = if ids.iter().any(|id| id == "NOASSERTION") {
                joined.yellow()
            } else {
                joined.normal()
            };
            writeln!(w, "  {coordinate:<50} {ids_colored}")?;
        }

        if !self.written.is_empty() {
            writeln!(w)?;
            for path in &self.written {
                writeln!(w, "Wrote {}", path.dimmed())?;
            }
        }

        Ok(())
    }
}
