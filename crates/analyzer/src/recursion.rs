//! 재귀 제어 -- 아카이브 노드를 중첩 레이어로 열지 결정
//!
//! # 규칙
//!
//! 1. 확장자가 파일시스템 스킴이 아니면(또는 `tmp`, `res`, `ram`, `file`,
//!    `http`, `https`이면) 아카이브가 아님
//! 2. 재귀가 활성화되어 있으면 모든 아카이브를 엶
//! 3. 재귀가 비활성화되어도 다음은 엶
//!    - 배포본 아카이브: 깊이 1이고 패키지 아카이브(jar 등)가 아닌 것
//!    - 단일 tar 예외: 깊이 2이고, 부모가 레이어 루트이며 자식이 하나뿐인 것
//!      (`dist.tar.gz!/dist.tar` 형태)
//! 4. 최대 깊이를 넘으면 열지 않고 파일 에러로 기록

use crate::vfs::Node;

/// 아카이브로 취급하지 않는 스킴
pub const NON_ARCHIVE_SCHEMES: &[&str] = &["tmp", "res", "ram", "file", "http", "https"];

/// 패키지 아카이브 확장자 (재귀 비활성화 시 깊이 1에서도 열지 않음)
pub const PACKAGE_ARCHIVE_EXTENSIONS: &[&str] = &[
    "jar",
    "war",
    "rar",
    "ear",
    "sar",
    "kar",
    "jdocbook",
    "jdocbook-style",
    "plugin",
];

/// 부모 폴더 정보
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParentInfo {
    /// 부모가 레이어 루트 폴더(`!/`로 끝남)인지 여부
    pub is_layer_root: bool,
    /// 부모의 직계 자식 수
    pub child_count: usize,
}

/// 재귀 결정 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Descent {
    /// 레이어로 엶
    Open,
    /// 열지 않음 (일반 파일로 취급)
    Skip,
    /// 최대 깊이 초과
    TooDeep,
}

/// 재귀 제어기
#[derive(Debug, Clone)]
pub struct RecursionController {
    disable_recursion: bool,
    max_depth: usize,
    schemes: Vec<String>,
}

impl RecursionController {
    /// 재귀 설정과 파일시스템 스킴 목록으로 생성합니다.
    pub fn new(disable_recursion: bool, max_depth: usize, schemes: &[&str]) -> Self {
        Self {
            disable_recursion,
            max_depth,
            schemes: schemes.iter().map(|s| s.to_ascii_lowercase()).collect(),
        }
    }

    /// 아카이브 여부 (확장자가 레이어 스킴인지)
    pub fn is_archive(&self, node: &Node) -> bool {
        let extension = node.extension().to_ascii_lowercase();
        if extension.is_empty() || NON_ARCHIVE_SCHEMES.contains(&extension.as_str()) {
            return false;
        }
        self.schemes.iter().any(|s| *s == extension)
    }

    /// 패키지 아카이브(jar 계열) 여부
    pub fn is_package_archive(node: &Node) -> bool {
        let extension = node.extension().to_ascii_lowercase();
        PACKAGE_ARCHIVE_EXTENSIONS.contains(&extension.as_str())
    }

    /// 배포본 아카이브 여부
    pub fn is_distribution_archive(node: &Node, depth: usize) -> bool {
        depth == 1 && !Self::is_package_archive(node)
    }

    /// 단일 tar 예외 여부
    pub fn is_singleton_tar(depth: usize, parent: ParentInfo) -> bool {
        depth == 2 && parent.is_layer_root && parent.child_count == 1
    }

    /// 노드를 나열 대상으로 삼을지 결정합니다 (아카이브 여부 제외).
    pub fn should_list(&self, node: &Node, depth: usize, parent: ParentInfo) -> bool {
        !self.disable_recursion
            || Self::is_distribution_archive(node, depth)
            || Self::is_singleton_tar(depth, parent)
    }

    /// 깊이 `depth`에 있는 노드를 레이어로 열지 결정합니다.
    pub fn decide(&self, node: &Node, depth: usize, parent: ParentInfo) -> Descent {
        if !node.is_file() || !self.is_archive(node) || !self.should_list(node, depth, parent) {
            return Descent::Skip;
        }
        if depth > self.max_depth {
            return Descent::TooDeep;
        }
        Descent::Open
    }

    /// 최대 깊이
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;
    use crate::vfs::{NodeContent, Scheme};

    const SCHEMES: &[&str] = &["zip", "jar", "war", "tar", "tgz", "gz", "file", "http"];

    fn node(name: &str) -> Node {
        Node::new(
            format!("/srv/{name}"),
            name,
            1,
            Scheme::File,
            NodeContent::Bytes(Bytes::from_static(b"x")),
        )
    }

    fn plain_parent() -> ParentInfo {
        ParentInfo {
            is_layer_root: false,
            child_count: 3,
        }
    }

    fn singleton_root() -> ParentInfo {
        ParentInfo {
            is_layer_root: true,
            child_count: 1,
        }
    }

    #[test]
    fn archive_detection_uses_scheme_list() {
        let rc = RecursionController::new(false, 64, SCHEMES);
        assert!(rc.is_archive(&node("a.zip")));
        assert!(rc.is_archive(&node("A.JAR")));
        assert!(rc.is_archive(&node("x.tar.gz")));
        assert!(!rc.is_archive(&node("a.txt")));
        assert!(!rc.is_archive(&node("a.bz2")));
        assert!(!rc.is_archive(&node("README")));
    }

    #[test]
    fn non_archive_schemes_are_excluded() {
        let rc = RecursionController::new(false, 64, SCHEMES);
        assert!(!rc.is_archive(&node("index.http")));
        assert!(!rc.is_archive(&node("notes.file")));
    }

    #[test]
    fn recursion_enabled_opens_every_archive() {
        let rc = RecursionController::new(false, 64, SCHEMES);
        assert_eq!(rc.decide(&node("lib.jar"), 3, plain_parent()), Descent::Open);
        assert_eq!(rc.decide(&node("a.txt"), 3, plain_parent()), Descent::Skip);
    }

    #[test]
    fn disabled_recursion_opens_distribution_only() {
        let rc = RecursionController::new(true, 64, SCHEMES);
        assert_eq!(rc.decide(&node("dist.zip"), 1, plain_parent()), Descent::Open);
        assert_eq!(rc.decide(&node("lib.jar"), 1, plain_parent()), Descent::Skip);
        assert_eq!(rc.decide(&node("inner.zip"), 2, plain_parent()), Descent::Skip);
    }

    #[test]
    fn singleton_tar_exception_applies_at_depth_two() {
        let rc = RecursionController::new(true, 64, SCHEMES);
        assert_eq!(rc.decide(&node("dist.tar"), 2, singleton_root()), Descent::Open);
        assert_eq!(rc.decide(&node("dist.tar"), 3, singleton_root()), Descent::Skip);

        let two_children = ParentInfo {
            is_layer_root: true,
            child_count: 2,
        };
        assert_eq!(rc.decide(&node("dist.tar"), 2, two_children), Descent::Skip);
    }

    #[test]
    fn depth_beyond_max_is_reported() {
        let rc = RecursionController::new(false, 2, SCHEMES);
        assert_eq!(rc.decide(&node("deep.zip"), 2, plain_parent()), Descent::Open);
        assert_eq!(rc.decide(&node("deep.zip"), 3, plain_parent()), Descent::TooDeep);
    }

    #[test]
    fn package_archive_extensions() {
        assert!(RecursionController::is_package_archive(&node("x.war")));
        assert!(RecursionController::is_package_archive(&node("x.plugin")));
        assert!(!RecursionController::is_package_archive(&node("x.zip")));
    }
}
