//! 패키지 라이선스 수집
//!
//! 패키지 기술자(`pom.xml`, `*.pom`)에서 선언된 라이선스를 추출하고,
//! 표준 식별자로 해석하여 좌표별로 모읍니다.
//!
//! # 해석 순서
//!
//! 1. 내장 SPDX 목록 (식별자, 이름, URL)
//! 2. 매핑 테이블의 URL
//! 3. 매핑 테이블의 이름
//! 4. [`NOASSERTION`] (경고)
//!
//! 선언된 라이선스가 있지만 모두 건너뛰었다면 [`NONE`] 하나를 기록합니다.

pub mod mapping;
pub mod pom;
pub mod spdx;

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::AnalyzerError;
use crate::vfs::LAYER_SEPARATOR;

pub use mapping::LicenseMapping;
pub use pom::PomLicenseExtractor;

/// 해석할 수 없는 라이선스
pub const NOASSERTION: &str = "NOASSERTION";

/// 선언은 있으나 유효한 항목이 없음
pub const NONE: &str = "NONE";

/// 기술자에 선언된 라이선스 하나
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeclaredLicense {
    pub name: Option<String>,
    pub url: Option<String>,
    pub distribution: Option<String>,
    pub comments: Option<String>,
}

/// 기술자 하나에서 추출한 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageLicenses {
    /// `groupId:artifactId:version`
    pub coordinate: String,
    pub licenses: Vec<DeclaredLicense>,
}

/// 패키지 기술자 라이선스 추출 trait
pub trait LicenseExtractor: Send + Sync {
    /// 파일 이름이 이 추출기가 처리하는 기술자인지 확인합니다.
    fn is_descriptor(&self, name: &str) -> bool;

    /// 기술자 내용에서 좌표와 라이선스를 추출합니다.
    fn extract(&self, path: &str, content: &[u8]) -> Result<PackageLicenses, AnalyzerError>;
}

/// 해석된 라이선스 정보
///
/// 필드 선언 순서가 정렬 순서입니다
/// (식별자, 이름, 출처, 배포 방식, 설명, URL).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenseInfo {
    /// SPDX 식별자 또는 `NOASSERTION`/`NONE`
    pub spdx_license_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// 가장 안쪽 레이어 기준 기술자 경로
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distribution: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// 기술자 경로의 출처 표기 (마지막 `!/` 이후, 없으면 기본 이름)
pub fn license_source(path: &str) -> String {
    match path.rfind(LAYER_SEPARATOR) {
        Some(idx) => path[idx + LAYER_SEPARATOR.len()..].to_owned(),
        None => path.rsplit('/').next().unwrap_or(path).to_owned(),
    }
}

/// 라이선스 식별자 해석기
#[derive(Debug, Clone, Default)]
pub struct LicenseResolver {
    mapping: LicenseMapping,
}

impl LicenseResolver {
    pub fn new(mapping: LicenseMapping) -> Self {
        Self { mapping }
    }

    /// 이름/URL을 식별자로 해석합니다. 해석할 수 없으면 `None`.
    pub fn resolve(&self, name: Option<&str>, url: Option<&str>) -> Option<String> {
        if let Some(id) = spdx::find_matching(name, url) {
            return Some(id.to_owned());
        }
        self.mapping
            .find(url)
            .or_else(|| self.mapping.find(name))
            .map(str::to_owned)
    }
}

/// 좌표 → 라이선스 정보 집합
#[derive(Debug, Clone, Default)]
pub struct LicenseIndex {
    records: BTreeMap<String, BTreeSet<LicenseInfo>>,
}

impl LicenseIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// 패키지 라이선스를 추가합니다.
    ///
    /// 이미 기록된 좌표는 무시하며 (먼저 본 것이 우선), 추가 여부를 반환합니다.
    pub fn add(
        &mut self,
        package: PackageLicenses,
        descriptor_path: &str,
        resolver: &LicenseResolver,
    ) -> bool {
        if self.records.contains_key(&package.coordinate) {
            debug!(coordinate = %package.coordinate, "coordinate already recorded");
            return false;
        }

        let source = license_source(descriptor_path);
        let mut facts = BTreeSet::new();

        for declared in &package.licenses {
            let name = declared
                .name
                .as_deref()
                .map(|n| n.split_whitespace().collect::<Vec<_>>().join(" "))
                .filter(|n| !n.is_empty());
            let url = declared
                .url
                .as_deref()
                .map(str::trim)
                .filter(|u| !u.is_empty())
                .map(str::to_owned);

            if name.is_none() && url.is_none() {
                warn!(
                    coordinate = %package.coordinate,
                    source = %source,
                    "No licenses found in descriptor entry, skipping"
                );
                continue;
            }

            let spdx_license_id = resolver
                .resolve(name.as_deref(), url.as_deref())
                .unwrap_or_else(|| {
                    warn!(
                        coordinate = %package.coordinate,
                        name = name.as_deref().unwrap_or(""),
                        url = url.as_deref().unwrap_or(""),
                        "Missing mapping for license"
                    );
                    NOASSERTION.to_owned()
                });

            facts.insert(LicenseInfo {
                spdx_license_id,
                name,
                source: source.clone(),
                distribution: declared.distribution.clone(),
                comments: declared.comments.clone(),
                url,
            });
        }

        if !package.licenses.is_empty() && facts.is_empty() {
            facts.insert(LicenseInfo {
                spdx_license_id: NONE.to_owned(),
                name: None,
                source,
                distribution: None,
                comments: None,
                url: None,
            });
        }

        debug!(
            coordinate = %package.coordinate,
            licenses = facts.len(),
            "licenses recorded"
        );
        self.records.insert(package.coordinate, facts);
        true
    }

    /// 좌표별 라이선스
    pub fn records(&self) -> &BTreeMap<String, BTreeSet<LicenseInfo>> {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// (고유 식별자 목록, 전체 식별자 수)
    pub fn summary(&self) -> (BTreeSet<String>, usize) {
        let all: Vec<&str> = self
            .records
            .values()
            .flatten()
            .map(|l| l.spdx_license_id.as_str())
            .collect();
        let total = all.len();
        (all.into_iter().map(str::to_owned).collect(), total)
    }

    pub fn into_records(self) -> BTreeMap<String, BTreeSet<LicenseInfo>> {
        self.records
    }
}
