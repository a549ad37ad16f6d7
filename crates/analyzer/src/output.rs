//! 결과 파일 쓰기/읽기
//!
//! - `checksums-<type>.json`: 다이제스트 값 → 파일 목록
//! - `licenses.json`: 좌표 → 라이선스 정보 목록
//!
//! 모두 들여쓰기된 JSON이며 개행으로 끝납니다.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use distfinder_core::types::{ChecksumMap, ChecksumType};

use crate::error::AnalyzerError;
use crate::license::LicenseInfo;

/// 라이선스 파일 이름
pub const LICENSES_FILENAME: &str = "licenses.json";

/// 다이제스트 종류별 체크섬 파일 이름
pub fn checksums_filename(checksum_type: ChecksumType) -> String {
    format!("checksums-{checksum_type}.json")
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), AnalyzerError> {
    let display = path.display().to_string();
    let mut json = serde_json::to_string_pretty(value).map_err(|e| AnalyzerError::Output {
        path: display.clone(),
        reason: e.to_string(),
    })?;
    json.push('\n');
    std::fs::write(path, json).map_err(|e| AnalyzerError::io(display, e))
}

/// 체크섬 맵을 `output_dir/checksums-<type>.json`에 씁니다.
pub fn write_checksums(
    output_dir: &Path,
    checksum_type: ChecksumType,
    map: &ChecksumMap,
) -> Result<PathBuf, AnalyzerError> {
    std::fs::create_dir_all(output_dir)
        .map_err(|e| AnalyzerError::io(output_dir.display().to_string(), e))?;
    let path = output_dir.join(checksums_filename(checksum_type));
    write_json(&path, map)?;
    info!(
        path = %path.display(),
        checksums = map.len(),
        "wrote {checksum_type} checksums"
    );
    Ok(path)
}

/// 모든 다이제스트 종류의 체크섬 맵을 씁니다.
pub fn write_all_checksums(
    output_dir: &Path,
    maps: &BTreeMap<ChecksumType, ChecksumMap>,
) -> Result<Vec<PathBuf>, AnalyzerError> {
    maps.iter()
        .map(|(checksum_type, map)| write_checksums(output_dir, *checksum_type, map))
        .collect()
}

/// 라이선스 맵을 `output_dir/licenses.json`에 씁니다.
pub fn write_licenses(
    output_dir: &Path,
    licenses: &BTreeMap<String, BTreeSet<LicenseInfo>>,
) -> Result<PathBuf, AnalyzerError> {
    std::fs::create_dir_all(output_dir)
        .map_err(|e| AnalyzerError::io(output_dir.display().to_string(), e))?;
    let path = output_dir.join(LICENSES_FILENAME);
    write_json(&path, licenses)?;
    info!(path = %path.display(), coordinates = licenses.len(), "wrote licenses");
    Ok(path)
}

/// 이전에 쓴 체크섬 파일을 다시 읽습니다.
pub fn load_checksums_file(path: &Path) -> Result<ChecksumMap, AnalyzerError> {
    let display = path.display().to_string();
    let content = std::fs::read_to_string(path).map_err(|e| AnalyzerError::io(&display, e))?;
    serde_json::from_str(&content).map_err(|e| AnalyzerError::Output {
        path: display,
        reason: e.to_string(),
    })
}
