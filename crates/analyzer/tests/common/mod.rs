//! Fixture builders shared by analyzer integration tests
//!
//! Archives are generated at test time with the zip/tar/flate2 writers.

#![allow(dead_code)]

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use flate2::Compression;
use flate2::write::GzEncoder;
use zip::write::SimpleFileOptions;

use distfinder_analyzer::{
    AnalysisReport, ChecksumReceiver, DistributionAnalyzerBuilder, DistributionAnalyzerConfig,
};
use distfinder_core::types::ChecksumType;

/// In-memory zip archive from (name, bytes) entries
pub fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, data) in entries {
        writer
            .start_file(*name, SimpleFileOptions::default())
            .unwrap();
        writer.write_all(data).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// In-memory tar archive from (name, bytes) entries
pub fn tar_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());
    for (name, data) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, name, *data).unwrap();
    }
    builder.into_inner().unwrap()
}

/// gzip-compressed bytes
pub fn gzip_bytes(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// bzip2-compressed bytes
pub fn bzip2_bytes(data: &[u8]) -> Vec<u8> {
    let mut encoder = bzip2::write::BzEncoder::new(Vec::new(), bzip2::Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// Writes bytes to `dir/name` and returns the path
pub fn write_file(dir: &Path, name: &str, data: &[u8]) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, data).unwrap();
    path
}

/// Analyzer config limited to the given digest types, with two workers so batches run in parallel
pub fn config_with(types: &[ChecksumType]) -> DistributionAnalyzerConfig {
    DistributionAnalyzerConfig {
        checksum_types: types.iter().copied().collect(),
        worker_threads: 2,
        ..Default::default()
    }
}

/// Builds an analyzer for one input and runs it to completion
pub fn analyze(
    config: DistributionAnalyzerConfig,
    input: &Path,
) -> (AnalysisReport, Option<ChecksumReceiver>) {
    let (analyzer, rx) = DistributionAnalyzerBuilder::new()
        .config(config)
        .input(input.to_string_lossy().to_string())
        .build()
        .unwrap();
    (analyzer.analyze().unwrap(), rx)
}

pub const HELLO_SHA256: &str = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";
pub const HELLO_MD5: &str = "5d41402abc4b2a76b9719d911017c592";

pub const WIDGET_POM: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<project xmlns="http://maven.apache.org/POM/4.0.0">
  <modelVersion>4.0.0</modelVersion>
  <groupId>org.acme</groupId>
  <artifactId>widget</artifactId>
  <version>1.0</version>
  <licenses>
    <license>
      <name>The Apache Software License, Version 2.0</name>
      <url>https://www.apache.org/licenses/LICENSE-2.0.txt</url>
      <distribution>repo</distribution>
    </license>
  </licenses>
</project>
"#;

pub const MYSTERY_POM: &str = r#"<project>
  <groupId>org.acme</groupId>
  <artifactId>mystery</artifactId>
  <version>2.0</version>
  <licenses>
    <license>
      <name>Acme Internal License</name>
      <url>https://acme.example/license</url>
    </license>
  </licenses>
</project>
"#;
