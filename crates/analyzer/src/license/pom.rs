//! Maven POM 라이선스 추출기
//!
//! `pom.xml` 또는 `*.pom` 파일에서 좌표(`groupId:artifactId:version`)와
//! `<licenses>` 항목을 정규식으로 추출합니다.
//!
//! # 처리 순서
//!
//! 1. 주석 제거
//! 2. `<parent>`에서 상속 가능한 groupId/version 추출
//! 3. 좌표를 가릴 수 있는 블록 제거 (`<dependencies>`, `<build>`, `<profiles>` 등)
//! 4. 프로젝트 좌표와 `<properties>` 추출, `${...}` 치환
//! 5. `<license>` 항목별 name/url/distribution/comments 추출

use std::collections::HashMap;

use regex::Regex;

use super::{DeclaredLicense, LicenseExtractor, PackageLicenses};
use crate::error::AnalyzerError;

/// 좌표 추출 전에 제거하는 블록 (중첩 순서대로)
const STRIPPED_BLOCKS: &[&str] = &[
    "parent",
    "profiles",
    "build",
    "reporting",
    "dependencyManagement",
    "dependencies",
    "repositories",
    "pluginRepositories",
    "distributionManagement",
];

/// `${...}` 치환 최대 반복 횟수
const MAX_INTERPOLATION_PASSES: usize = 8;

/// Maven POM 라이선스 추출기
#[derive(Debug, Clone)]
pub struct PomLicenseExtractor {
    comment: Regex,
    project: Regex,
    parent: Regex,
    blocks: Vec<Regex>,
    properties: Regex,
    property: Regex,
    licenses: Regex,
    license: Regex,
    placeholder: Regex,
    group_id: Regex,
    artifact_id: Regex,
    version: Regex,
    name: Regex,
    url: Regex,
    distribution: Regex,
    comments: Regex,
}

fn compile(pattern: &str) -> Result<Regex, AnalyzerError> {
    Regex::new(pattern).map_err(|e| AnalyzerError::Config {
        field: "pom_extractor".to_owned(),
        reason: e.to_string(),
    })
}

fn element(tag: &str) -> Result<Regex, AnalyzerError> {
    compile(&format!(r"(?s)<{tag}>(.*?)</{tag}>"))
}

fn block(tag: &str) -> Result<Regex, AnalyzerError> {
    compile(&format!(r"(?s)<{tag}\b[^>]*>.*?</{tag}>"))
}

impl PomLicenseExtractor {
    /// 추출기를 생성합니다.
    pub fn new() -> Result<Self, AnalyzerError> {
        Ok(Self {
            comment: compile(r"(?s)<!--.*?-->")?,
            project: compile(r"<project[\s>]")?,
            parent: compile(r"(?s)<parent\b[^>]*>(.*?)</parent>")?,
            blocks: STRIPPED_BLOCKS
                .iter()
                .map(|tag| block(tag))
                .collect::<Result<_, _>>()?,
            properties: compile(r"(?s)<properties\b[^>]*>(.*?)</properties>")?,
            property: compile(r"(?s)<([A-Za-z0-9_.\-]+)>(.*?)</[A-Za-z0-9_.\-]+>")?,
            licenses: compile(r"(?s)<licenses\b[^>]*>(.*?)</licenses>")?,
            license: compile(r"(?s)<license\b[^>]*>(.*?)</license>")?,
            placeholder: compile(r"\$\{([^}]+)\}")?,
            group_id: element("groupId")?,
            artifact_id: element("artifactId")?,
            version: element("version")?,
            name: element("name")?,
            url: element("url")?,
            distribution: element("distribution")?,
            comments: element("comments")?,
        })
    }

    fn first(re: &Regex, text: &str) -> Option<String> {
        re.captures(text)
            .and_then(|c| c.get(1))
            .map(|m| clean_value(m.as_str()))
            .filter(|v| !v.is_empty())
    }

    fn interpolate(&self, value: &str, properties: &HashMap<String, String>) -> String {
        let mut current = value.to_owned();
        for _ in 0..MAX_INTERPOLATION_PASSES {
            if !current.contains("${") {
                break;
            }
            let next = self
                .placeholder
                .replace_all(&current, |caps: &regex::Captures<'_>| {
                    properties
                        .get(&caps[1])
                        .cloned()
                        .unwrap_or_else(|| caps[0].to_owned())
                })
                .into_owned();
            if next == current {
                break;
            }
            current = next;
        }
        current
    }

    /// POM 텍스트를 파싱합니다.
    pub fn parse(&self, path: &str, text: &str) -> Result<PackageLicenses, AnalyzerError> {
        let descriptor_error = |reason: &str| AnalyzerError::Descriptor {
            path: path.to_owned(),
            reason: reason.to_owned(),
        };

        let text = self.comment.replace_all(text, "");
        if !self.project.is_match(&text) {
            return Err(descriptor_error("missing <project> element"));
        }

        let parent = self
            .parent
            .captures(&text)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_owned())
            .unwrap_or_default();
        let parent_group = Self::first(&self.group_id, &parent);
        let parent_version = Self::first(&self.version, &parent);

        let mut body = text.into_owned();
        for re in &self.blocks {
            body = re.replace_all(&body, "").into_owned();
        }

        let mut properties = HashMap::new();
        if let Some(section) = self.properties.captures(&body).and_then(|c| c.get(1)) {
            for caps in self.property.captures_iter(section.as_str()) {
                properties.insert(caps[1].to_owned(), clean_value(&caps[2]));
            }
        }
        // 라이선스 블록 안의 <name>/<url>이 좌표로 오인되지 않도록 분리
        let licenses_section = self
            .licenses
            .captures(&body)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_owned());
        let head = self.licenses.replace_all(&body, "").into_owned();
        let head = self.properties.replace_all(&head, "").into_owned();

        let group_id = Self::first(&self.group_id, &head)
            .or(parent_group.clone())
            .ok_or_else(|| descriptor_error("missing groupId"))?;
        let artifact_id = Self::first(&self.artifact_id, &head)
            .ok_or_else(|| descriptor_error("missing artifactId"))?;
        let version = Self::first(&self.version, &head)
            .or(parent_version.clone())
            .ok_or_else(|| descriptor_error("missing version"))?;

        for (key, value) in [
            ("project.groupId", &group_id),
            ("pom.groupId", &group_id),
            ("groupId", &group_id),
            ("project.artifactId", &artifact_id),
            ("pom.artifactId", &artifact_id),
            ("artifactId", &artifact_id),
            ("project.version", &version),
            ("pom.version", &version),
            ("version", &version),
        ] {
            properties
                .entry(key.to_owned())
                .or_insert_with(|| value.clone());
        }
        if let Some(v) = &parent_version {
            properties.insert("project.parent.version".to_owned(), v.clone());
            properties.insert("parent.version".to_owned(), v.clone());
        }
        if let Some(g) = &parent_group {
            properties.insert("project.parent.groupId".to_owned(), g.clone());
            properties.insert("parent.groupId".to_owned(), g.clone());
        }

        let coordinate = format!(
            "{}:{}:{}",
            self.interpolate(&group_id, &properties),
            self.interpolate(&artifact_id, &properties),
            self.interpolate(&version, &properties)
        );

        let licenses = licenses_section
            .map(|section| {
                self.license
                    .captures_iter(&section)
                    .filter_map(|c| c.get(1))
                    .map(|entry| {
                        let field = |re: &Regex| {
                            Self::first(re, entry.as_str()).map(|v| self.interpolate(&v, &properties))
                        };
                        DeclaredLicense {
                            name: field(&self.name),
                            url: field(&self.url),
                            distribution: field(&self.distribution),
                            comments: field(&self.comments),
                        }
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(PackageLicenses {
            coordinate,
            licenses,
        })
    }
}

impl LicenseExtractor for PomLicenseExtractor {
    fn is_descriptor(&self, name: &str) -> bool {
        name == "pom.xml" || name.ends_with(".pom")
    }

    fn extract(&self, path: &str, content: &[u8]) -> Result<PackageLicenses, AnalyzerError> {
        let text = String::from_utf8_lossy(content);
        self.parse(path, &text)
    }
}

/// CDATA 제거, XML 엔티티 복원, 앞뒤 공백 제거
fn clean_value(raw: &str) -> String {
    let trimmed = raw.trim();
    let inner = trimmed
        .strip_prefix("<![CDATA[")
        .and_then(|s| s.strip_suffix("]]>"))
        .unwrap_or(trimmed);
    unescape_xml(inner).trim().to_owned()
}

fn unescape_xml(value: &str) -> String {
    value
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    const POM: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<project xmlns="http://maven.apache.org/POM/4.0.0">
  <modelVersion>4.0.0</modelVersion>
  <parent>
    <groupId>org.acme</groupId>
    <artifactId>acme-parent</artifactId>
    <version>7</version>
  </parent>
  <artifactId>widget</artifactId>
  <version>${widget.version}</version>
  <name>Acme Widget</name>
  <url>https://acme.example/widget</url>
  <properties>
    <widget.version>1.2.3</widget.version>
  </properties>
  <licenses>
    <license>
      <name>The Apache   Software License,
        Version 2.0</name>
      <url>http://www.apache.org/licenses/LICENSE-2.0.txt</url>
      <distribution>repo</distribution>
    </license>
    <!-- <license><name>commented out</name></license> -->
    <license>
      <name>Acme &amp; Co License</name>
    </license>
  </licenses>
  <dependencies>
    <dependency>
      <groupId>junit</groupId>
      <artifactId>junit</artifactId>
      <version>4.13</version>
    </dependency>
  </dependencies>
</project>
"#;

    fn extractor() -> PomLicenseExtractor {
        PomLicenseExtractor::new().expect("patterns compile")
    }

    #[test]
    fn extracts_coordinate_with_parent_and_properties() {
        let package = extractor().parse("pom.xml", POM).expect("parse");
        assert_eq!(package.coordinate, "org.acme:widget:1.2.3");
    }

    #[test]
    fn extracts_license_entries() {
        let package = extractor().parse("pom.xml", POM).expect("parse");
        assert_eq!(package.licenses.len(), 2);

        let first = &package.licenses[0];
        assert_eq!(
            first.url.as_deref(),
            Some("http://www.apache.org/licenses/LICENSE-2.0.txt")
        );
        assert_eq!(first.distribution.as_deref(), Some("repo"));
        assert_eq!(package.licenses[1].name.as_deref(), Some("Acme & Co License"));
        assert_eq!(package.licenses[1].url, None);
    }

    #[test]
    fn pom_without_licenses_has_empty_list() {
        let pom = "<project><groupId>g</groupId><artifactId>a</artifactId><version>1</version></project>";
        let package = extractor().parse("a.pom", pom).expect("parse");
        assert_eq!(package.coordinate, "g:a:1");
        assert!(package.licenses.is_empty());
    }

    #[test]
    fn non_pom_xml_is_descriptor_error() {
        let err = extractor()
            .parse("pom.xml", "<settings><localRepository/></settings>")
            .expect_err("not a pom");
        assert!(matches!(err, AnalyzerError::Descriptor { .. }));
    }

    #[test]
    fn missing_artifact_id_is_descriptor_error() {
        let err = extractor()
            .parse("pom.xml", "<project><groupId>g</groupId><version>1</version></project>")
            .expect_err("no artifactId");
        assert!(err.to_string().contains("artifactId"));
    }

    #[test]
    fn recognizes_descriptor_names() {
        let ex = extractor();
        assert!(ex.is_descriptor("pom.xml"));
        assert!(ex.is_descriptor("widget-1.2.3.pom"));
        assert!(!ex.is_descriptor("pom.xml.bak"));
        assert!(!ex.is_descriptor("web.xml"));
    }

    #[test]
    fn clean_value_handles_cdata() {
        assert_eq!(clean_value("  <![CDATA[a < b]]> "), "a < b");
        assert_eq!(clean_value("&lt;x&gt;"), "<x>");
    }
}
