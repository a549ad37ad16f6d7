//! 라이선스 매핑 테이블 -- SPDX 목록에 없는 URL/이름을 식별자로 연결
//!
//! JSON 형식:
//!
//! ```json
//! { "Apache-2.0": ["http://repository.jboss.org/licenses/apache-2.0.txt"], "LGPL-2.1-or-later": ["GNU Lesser General Public License"] }
//! ```

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use tracing::info;

use super::spdx::normalize_key;
use crate::error::AnalyzerError;

/// URL/이름 → 식별자 매핑
#[derive(Debug, Clone, Default)]
pub struct LicenseMapping {
    entries: HashMap<String, String>,
    licenses: usize,
}

impl LicenseMapping {
    /// 빈 매핑
    pub fn empty() -> Self {
        Self::default()
    }

    /// JSON 파일에서 매핑을 읽습니다.
    pub fn load(path: &Path) -> Result<Self, AnalyzerError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AnalyzerError::io(path.display().to_string(), e))?;
        let mapping = Self::parse(&content).map_err(|reason| AnalyzerError::Config {
            field: "license_mapping_path".to_owned(),
            reason: format!("{}: {reason}", path.display()),
        })?;

        info!(
            path = %path.display(),
            licenses = mapping.licenses,
            "Loaded URL mappings for {} licenses",
            mapping.licenses
        );
        Ok(mapping)
    }

    /// JSON 문자열을 파싱합니다.
    pub fn parse(json: &str) -> Result<Self, String> {
        let table: BTreeMap<String, Vec<String>> =
            serde_json::from_str(json).map_err(|e| e.to_string())?;

        let mut entries = HashMap::new();
        for (id, keys) in &table {
            for key in keys {
                entries.insert(normalize_key(key), id.clone());
            }
        }
        Ok(Self {
            entries,
            licenses: table.len(),
        })
    }

    /// URL 또는 이름에 대응하는 식별자를 찾습니다.
    pub fn find(&self, value: Option<&str>) -> Option<&str> {
        let key = normalize_key(value?);
        if key.is_empty() {
            return None;
        }
        self.entries.get(&key).map(String::as_str)
    }

    /// 매핑된 라이선스(식별자) 수
    pub fn license_count(&self) -> usize {
        self.licenses
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
