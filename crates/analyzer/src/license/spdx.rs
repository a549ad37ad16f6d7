//! 내장 SPDX 라이선스 목록 (자주 쓰이는 라이선스 일부)

/// 내장 라이선스 목록 버전
pub const SPDX_LICENSE_LIST_VERSION: &str = "3.25";

/// SPDX 라이선스 항목
#[derive(Debug, Clone, Copy)]
pub struct SpdxLicense {
    /// SPDX 식별자
    pub id: &'static str,
    /// 공식 이름
    pub name: &'static str,
    /// 참조 URL
    pub urls: &'static [&'static str],
}

/// 내장 라이선스 목록
pub const SPDX_LICENSES: &[SpdxLicense] = &[
    SpdxLicense {
        id: "Apache-2.0",
        name: "Apache License 2.0",
        urls: &[
            "https://www.apache.org/licenses/LICENSE-2.0",
            "https://www.apache.org/licenses/LICENSE-2.0.txt",
            "https://www.apache.org/licenses/LICENSE-2.0.html",
            "https://opensource.org/licenses/Apache-2.0",
        ],
    },
    SpdxLicense {
        id: "BSD-2-Clause",
        name: "BSD 2-Clause \"Simplified\" License",
        urls: &["https://opensource.org/licenses/BSD-2-Clause"],
    },
    SpdxLicense {
        id: "BSD-3-Clause",
        name: "BSD 3-Clause \"New\" or \"Revised\" License",
        urls: &[
            "https://opensource.org/licenses/BSD-3-Clause",
            "https://www.opensource.org/licenses/bsd-license.php",
        ],
    },
    SpdxLicense {
        id: "BSL-1.0",
        name: "Boost Software License 1.0",
        urls: &[
            "https://www.boost.org/LICENSE_1_0.txt",
            "https://opensource.org/licenses/BSL-1.0",
        ],
    },
    SpdxLicense {
        id: "CC0-1.0",
        name: "Creative Commons Zero v1.0 Universal",
        urls: &["https://creativecommons.org/publicdomain/zero/1.0/legalcode"],
    },
    SpdxLicense {
        id: "CDDL-1.0",
        name: "Common Development and Distribution License 1.0",
        urls: &["https://opensource.org/licenses/cddl1"],
    },
    SpdxLicense {
        id: "CDDL-1.1",
        name: "Common Development and Distribution License 1.1",
        urls: &[
            "https://glassfish.java.net/public/CDDL+GPL_1_1.html",
            "https://javaee.github.io/glassfish/LICENSE",
        ],
    },
    SpdxLicense {
        id: "EPL-1.0",
        name: "Eclipse Public License 1.0",
        urls: &[
            "https://www.eclipse.org/legal/epl-v10.html",
            "https://opensource.org/licenses/EPL-1.0",
        ],
    },
    SpdxLicense {
        id: "EPL-2.0",
        name: "Eclipse Public License 2.0",
        urls: &[
            "https://www.eclipse.org/legal/epl-2.0",
            "https://www.opensource.org/licenses/EPL-2.0",
        ],
    },
    SpdxLicense {
        id: "GPL-2.0-only",
        name: "GNU General Public License v2.0 only",
        urls: &[
            "https://www.gnu.org/licenses/old-licenses/gpl-2.0-standalone.html",
            "https://opensource.org/licenses/GPL-2.0",
        ],
    },
    SpdxLicense {
        id: "GPL-3.0-only",
        name: "GNU General Public License v3.0 only",
        urls: &[
            "https://www.gnu.org/licenses/gpl-3.0-standalone.html",
            "https://opensource.org/licenses/GPL-3.0",
        ],
    },
    SpdxLicense {
        id: "ISC",
        name: "ISC License",
        urls: &[
            "https://www.isc.org/licenses/",
            "https://opensource.org/licenses/ISC",
        ],
    },
    SpdxLicense {
        id: "LGPL-2.1-only",
        name: "GNU Lesser General Public License v2.1 only",
        urls: &[
            "https://www.gnu.org/licenses/old-licenses/lgpl-2.1-standalone.html",
            "https://opensource.org/licenses/LGPL-2.1",
        ],
    },
    SpdxLicense {
        id: "LGPL-3.0-only",
        name: "GNU Lesser General Public License v3.0 only",
        urls: &[
            "https://www.gnu.org/licenses/lgpl-3.0-standalone.html",
            "https://opensource.org/licenses/LGPL-3.0",
        ],
    },
    SpdxLicense {
        id: "MIT",
        name: "MIT License",
        urls: &["https://opensource.org/licenses/MIT"],
    },
    SpdxLicense {
        id: "MPL-1.1",
        name: "Mozilla Public License 1.1",
        urls: &[
            "https://www.mozilla.org/MPL/MPL-1.1.html",
            "https://opensource.org/licenses/MPL-1.1",
        ],
    },
    SpdxLicense {
        id: "MPL-2.0",
        name: "Mozilla Public License 2.0",
        urls: &[
            "https://www.mozilla.org/MPL/2.0/",
            "https://opensource.org/licenses/MPL-2.0",
        ],
    },
    SpdxLicense {
        id: "Unlicense",
        name: "The Unlicense",
        urls: &["https://unlicense.org/"],
    },
    SpdxLicense {
        id: "Zlib",
        name: "zlib License",
        urls: &[
            "http://www.zlib.net/zlib_license.html",
            "https://opensource.org/licenses/Zlib",
        ],
    },
];

/// 비교용 키로 정규화합니다.
///
/// 앞뒤 공백 제거, 소문자화, `http://`/`https://` 제거, 끝의 `/` 제거.
pub fn normalize_key(value: &str) -> String {
    let lower = value.trim().to_lowercase();
    let without_scheme = lower
        .strip_prefix("https://")
        .or_else(|| lower.strip_prefix("http://"))
        .unwrap_or(&lower);
    without_scheme.trim_end_matches('/').to_owned()
}

/// 이름 또는 URL이 일치하는 SPDX 식별자를 찾습니다.
///
/// 식별자, 공식 이름, URL 순으로 비교합니다 (대소문자 무시).
pub fn find_matching(name: Option<&str>, url: Option<&str>) -> Option<&'static str> {
    if let Some(name) = name {
        let key = normalize_key(name);
        if let Some(license) = SPDX_LICENSES
            .iter()
            .find(|l| normalize_key(l.id) == key || normalize_key(l.name) == key)
        {
            return Some(license.id);
        }
    }

    let key = normalize_key(url?);
    SPDX_LICENSES
        .iter()
        .find(|l| l.urls.iter().any(|u| normalize_key(u) == key))
        .map(|l| l.id)
}

/// 식별자로 항목을 찾습니다.
pub fn by_id(id: &str) -> Option<&'static SpdxLicense> {
    SPDX_LICENSES.iter().find(|l| l.id.eq_ignore_ascii_case(id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_scheme_and_trailing_slash() {
        assert_eq!(
            normalize_key(" HTTP://www.Apache.org/licenses/LICENSE-2.0/ "),
            "www.apache.org/licenses/license-2.0"
        );
        assert_eq!(normalize_key("MIT License"), "mit license");
    }

    #[test]
    fn matches_by_id_name_or_url() {
        assert_eq!(find_matching(Some("apache-2.0"), None), Some("Apache-2.0"));
        assert_eq!(find_matching(Some("MIT License"), None), Some("MIT"));
        assert_eq!(
            find_matching(
                Some("The Apache Software License, Version 2.0"),
                Some("http://www.apache.org/licenses/LICENSE-2.0.txt")
            ),
            Some("Apache-2.0")
        );
    }

    #[test]
    fn unknown_license_has_no_match() {
        assert_eq!(
            find_matching(Some("Acme Proprietary"), Some("https://acme.example/license")),
            None
        );
        assert_eq!(find_matching(None, None), None);
    }

    #[test]
    fn ids_are_unique() {
        for (i, a) in SPDX_LICENSES.iter().enumerate() {
            for b in &SPDX_LICENSES[i + 1..] {
                assert_ne!(a.id, b.id);
            }
        }
        assert!(by_id("mit").is_some());
    }
}
