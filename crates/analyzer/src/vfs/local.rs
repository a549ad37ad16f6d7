//! 로컬 파일시스템 + 아카이브 디코더
//!
//! 루트 입력은 로컬 디스크에서 해석하고, 아카이브 노드는 메모리로 디코딩하여
//! 폴더 트리 형태의 [`LayerGuard`]로 엽니다.
//!
//! # 지원 스킴
//!
//! | 확장자 | 형식 |
//! |--------|------|
//! | zip, jar, war, ear, sar, par, ejb3 | zip |
//! | tar | tar |
//! | tgz | gzip 압축 tar |
//! | tbz2 | bzip2 압축 tar |
//! | gz | 단일 파일 gzip (자식 이름은 `.gz`를 제외한 이름) |
//! | bz2 | 단일 파일 bzip2 (자식 이름은 `.bz2`를 제외한 이름) |
//!
//! rpm 등 그 밖의 형식은 일반 파일로 취급됩니다.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{Cursor, Read, Seek};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use bytes::Bytes;
use bzip2::read::BzDecoder;
use flate2::read::GzDecoder;
use tracing::debug;

use super::{LAYER_SEPARATOR, LayerGuard, Node, NodeContent, Scheme, VirtualFileSystem};
use crate::error::AnalyzerError;

/// zip 계열 확장자
const ZIP_SCHEMES: &[&str] = &["zip", "jar", "war", "ear", "sar", "par", "ejb3"];

/// 지원하는 모든 레이어 스킴
const SCHEMES: &[&str] = &[
    "zip", "jar", "war", "ear", "sar", "par", "ejb3", "tar", "tgz", "tbz2", "gz", "bz2",
];

trait ReadSeek: Read + Seek + Send {}

impl<T: Read + Seek + Send> ReadSeek for T {}

/// 디코딩 결과 (루트 자식 노드, 거부된 엔트리)
type Decoded = (Vec<Node>, Vec<(String, AnalyzerError)>);

/// 로컬 파일시스템 기반 가상 파일시스템
#[derive(Debug, Clone)]
pub struct LocalVfs {
    max_entry_size: u64,
    open_layers: Arc<AtomicUsize>,
}

impl LocalVfs {
    /// 엔트리 최대 크기를 지정하여 생성합니다.
    pub fn new(max_entry_size: u64) -> Self {
        Self {
            max_entry_size,
            open_layers: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// 현재 열려 있는 레이어 수
    pub fn open_layers(&self) -> usize {
        self.open_layers.load(Ordering::SeqCst)
    }

    fn random_access(&self, file: &Node) -> Result<Box<dyn ReadSeek>, AnalyzerError> {
        match file.content() {
            NodeContent::Path(path) => {
                let f = File::open(path).map_err(|e| AnalyzerError::io(file.path(), e))?;
                Ok(Box::new(f))
            }
            NodeContent::Bytes(bytes) => Ok(Box::new(Cursor::new(bytes.clone()))),
            _ => Err(AnalyzerError::archive(file.path(), "not a file")),
        }
    }

    fn decode_zip(&self, file: &Node, base: &str) -> Result<Decoded, AnalyzerError> {
        let reader = self.random_access(file)?;
        let mut archive =
            zip::ZipArchive::new(reader).map_err(|e| AnalyzerError::archive(file.path(), e))?;

        let mut tree = FolderBuilder::default();
        let mut rejected = Vec::new();

        for i in 0..archive.len() {
            let mut entry = archive
                .by_index(i)
                .map_err(|e| AnalyzerError::archive(file.path(), e))?;
            let name = entry.name().to_owned();

            if entry.is_dir() {
                tree.ensure_folder(&name);
                continue;
            }

            let declared = entry.size();
            match read_capped(&mut entry, entry_capacity(declared), self.max_entry_size) {
                Ok(Some(data)) => tree.insert_file(&name, data),
                Ok(None) => rejected.push(self.too_large(base, &name, declared)),
                Err(e) => return Err(AnalyzerError::archive(file.path(), e)),
            }
        }

        Ok((tree.into_nodes(base, Scheme::Zip), rejected))
    }

    fn decode_tar<R: Read>(
        &self,
        reader: R,
        file: &Node,
        base: &str,
    ) -> Result<Decoded, AnalyzerError> {
        let mut archive = tar::Archive::new(reader);
        let mut tree = FolderBuilder::default();
        let mut rejected = Vec::new();

        let entries = archive
            .entries()
            .map_err(|e| AnalyzerError::archive(file.path(), e))?;

        for entry in entries {
            let mut entry = entry.map_err(|e| AnalyzerError::archive(file.path(), e))?;
            let name = entry
                .path()
                .map_err(|e| AnalyzerError::archive(file.path(), e))?
                .to_string_lossy()
                .into_owned();
            let entry_type = entry.header().entry_type();

            if entry_type.is_dir() {
                tree.ensure_folder(&name);
                continue;
            }
            // 심볼릭 링크, 장치 파일 등은 내용이 없으므로 건너뜀
            if !entry_type.is_file() {
                continue;
            }

            let declared = entry.size();
            match read_capped(&mut entry, entry_capacity(declared), self.max_entry_size) {
                Ok(Some(data)) => tree.insert_file(&name, data),
                Ok(None) => rejected.push(self.too_large(base, &name, declared)),
                Err(e) => return Err(AnalyzerError::archive(file.path(), e)),
            }
        }

        Ok((tree.into_nodes(base, Scheme::Tar), rejected))
    }

    /// 단일 파일 압축 스트림을 자식 하나짜리 레이어로 디코딩합니다.
    ///
    /// 자식 이름은 `suffix`를 뗀 이름이며, 떼고 남는 것이 없으면 원래 이름을 씁니다.
    fn decode_single<R: Read>(
        &self,
        mut decoder: R,
        file: &Node,
        base: &str,
        suffix: &str,
        scheme: Scheme,
    ) -> Result<Decoded, AnalyzerError> {
        let child_name = match file.name().strip_suffix(suffix) {
            Some(stem) if !stem.is_empty() => stem.to_owned(),
            _ => file.name().to_owned(),
        };

        match read_capped(&mut decoder, 0, self.max_entry_size) {
            Ok(Some(data)) => {
                let size = data.len() as u64;
                let child = Node::new(
                    format!("{base}{child_name}"),
                    child_name,
                    size,
                    scheme,
                    NodeContent::Bytes(data),
                );
                Ok((vec![child], Vec::new()))
            }
            Ok(None) => Ok((Vec::new(), vec![self.too_large(base, &child_name, 0)])),
            Err(e) => Err(AnalyzerError::archive(file.path(), e)),
        }
    }

    fn too_large(&self, base: &str, name: &str, declared: u64) -> (String, AnalyzerError) {
        let path = format!("{base}{}", clean_entry_name(name));
        let err = AnalyzerError::EntryTooLarge {
            path: path.clone(),
            size: declared.max(self.max_entry_size.saturating_add(1)),
            max: self.max_entry_size,
        };
        (path, err)
    }
}

impl Default for LocalVfs {
    fn default() -> Self {
        Self::new(512 * 1024 * 1024)
    }
}

impl VirtualFileSystem for LocalVfs {
    fn schemes(&self) -> &[&'static str] {
        SCHEMES
    }

    fn resolve(&self, locator: &str) -> Result<Node, AnalyzerError> {
        let raw = match locator.split_once("://") {
            Some(("file", rest)) => rest.replace("%20", " "),
            Some((scheme, _)) => {
                return Err(AnalyzerError::UnsupportedInput {
                    input: locator.to_owned(),
                    reason: format!("scheme '{scheme}' is not supported"),
                });
            }
            None => locator.to_owned(),
        };

        let path = PathBuf::from(&raw);
        if !path.exists() {
            return Err(AnalyzerError::InputNotFound {
                input: locator.to_owned(),
            });
        }

        let path = std::path::absolute(&path).map_err(|e| AnalyzerError::io(&raw, e))?;
        local_node(&path)
    }

    fn children(&self, folder: &Node) -> Result<Vec<Node>, AnalyzerError> {
        match folder.content() {
            NodeContent::Folder(children) => Ok(children.clone()),
            NodeContent::Directory(dir) => {
                let read_dir = fs::read_dir(dir).map_err(|e| AnalyzerError::io(folder.path(), e))?;
                let mut children = Vec::new();
                for entry in read_dir {
                    let entry = entry.map_err(|e| AnalyzerError::io(folder.path(), e))?;
                    let path = entry.path();
                    // 깨진 심볼릭 링크 등은 건너뜀
                    let Ok(meta) = fs::metadata(&path) else {
                        debug!(path = %path.display(), "skipping unreadable directory entry");
                        continue;
                    };
                    if meta.is_file() || meta.is_dir() {
                        children.push(local_node(&path)?);
                    }
                }
                children.sort_by(|a, b| a.name().cmp(b.name()));
                Ok(children)
            }
            _ => Err(AnalyzerError::archive(folder.path(), "not a folder")),
        }
    }

    fn open_content(&self, file: &Node) -> Result<Box<dyn Read + Send>, AnalyzerError> {
        match file.content() {
            NodeContent::Path(path) => {
                let f = File::open(path).map_err(|e| AnalyzerError::io(file.path(), e))?;
                Ok(Box::new(f))
            }
            NodeContent::Bytes(bytes) => Ok(Box::new(Cursor::new(bytes.clone()))),
            _ => Err(AnalyzerError::io(
                file.path(),
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a file"),
            )),
        }
    }

    fn open_layer(&self, file: &Node) -> Result<LayerGuard, AnalyzerError> {
        let extension = file.extension().to_ascii_lowercase();
        let base = format!("{}{LAYER_SEPARATOR}", file.path());

        let (children, rejected, scheme) = if ZIP_SCHEMES.contains(&extension.as_str()) {
            let (children, rejected) = self.decode_zip(file, &base)?;
            (children, rejected, Scheme::Zip)
        } else {
            match extension.as_str() {
                "tar" => {
                    let reader = self.open_content(file)?;
                    let (children, rejected) = self.decode_tar(reader, file, &base)?;
                    (children, rejected, Scheme::Tar)
                }
                "tgz" => {
                    let reader = GzDecoder::new(self.open_content(file)?);
                    let (children, rejected) = self.decode_tar(reader, file, &base)?;
                    (children, rejected, Scheme::Tar)
                }
                "tbz2" => {
                    let reader = BzDecoder::new(self.open_content(file)?);
                    let (children, rejected) = self.decode_tar(reader, file, &base)?;
                    (children, rejected, Scheme::Tar)
                }
                "gz" => {
                    let decoder = GzDecoder::new(self.open_content(file)?);
                    let (children, rejected) =
                        self.decode_single(decoder, file, &base, ".gz", Scheme::Gzip)?;
                    (children, rejected, Scheme::Gzip)
                }
                "bz2" => {
                    let decoder = BzDecoder::new(self.open_content(file)?);
                    let (children, rejected) =
                        self.decode_single(decoder, file, &base, ".bz2", Scheme::Bzip2)?;
                    (children, rejected, Scheme::Bzip2)
                }
                other => {
                    return Err(AnalyzerError::archive(
                        file.path(),
                        format!("unsupported archive type '{other}'"),
                    ));
                }
            }
        };

        debug!(
            path = %file.path(),
            scheme = scheme.as_str(),
            children = children.len(),
            "layer opened"
        );

        let root = Node::new(base, "", 0, scheme, NodeContent::Folder(children));
        Ok(LayerGuard::new(root, rejected).tracked(Arc::clone(&self.open_layers)))
    }
}

fn local_node(path: &Path) -> Result<Node, AnalyzerError> {
    let display = path.to_string_lossy().into_owned();
    let meta = fs::metadata(path).map_err(|e| AnalyzerError::io(&display, e))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let content = if meta.is_dir() {
        NodeContent::Directory(path.to_path_buf())
    } else {
        NodeContent::Path(path.to_path_buf())
    };
    let size = if meta.is_dir() { 0 } else { meta.len() };
    Ok(Node::new(display, name, size, Scheme::File, content))
}

/// 선언 크기로 초기 버퍼 용량을 정합니다 (과도한 선언값 방지).
fn entry_capacity(declared: u64) -> usize {
    declared.min(1024 * 1024) as usize
}

/// 최대 `max` 바이트까지 읽습니다. 초과하면 `None`을 반환합니다.
fn read_capped<R: Read>(reader: &mut R, capacity: usize, max: u64) -> std::io::Result<Option<Bytes>> {
    let mut buf = Vec::with_capacity(capacity);
    reader.take(max.saturating_add(1)).read_to_end(&mut buf)?;
    if buf.len() as u64 > max {
        return Ok(None);
    }
    Ok(Some(Bytes::from(buf)))
}

/// 엔트리 이름에서 `./`, 선행 `/`, 빈 구성요소를 제거합니다.
fn clean_entry_name(name: &str) -> String {
    name.split('/')
        .filter(|c| !c.is_empty() && *c != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// 평탄한 엔트리 목록에서 폴더 트리를 구성합니다.
#[derive(Default)]
struct FolderBuilder {
    folders: BTreeMap<String, FolderBuilder>,
    files: BTreeMap<String, Bytes>,
}

impl FolderBuilder {
    fn ensure_folder(&mut self, name: &str) {
        let cleaned = clean_entry_name(name);
        let mut current = self;
        for component in cleaned.split('/').filter(|c| !c.is_empty()) {
            current = current.folders.entry(component.to_owned()).or_default();
        }
    }

    fn insert_file(&mut self, name: &str, data: Bytes) {
        let cleaned = clean_entry_name(name);
        let mut components: Vec<&str> = cleaned.split('/').filter(|c| !c.is_empty()).collect();
        let Some(file_name) = components.pop() else {
            return;
        };
        let mut current = self;
        for component in components {
            current = current.folders.entry(component.to_owned()).or_default();
        }
        current.files.insert(file_name.to_owned(), data);
    }

    fn into_nodes(self, prefix: &str, scheme: Scheme) -> Vec<Node> {
        let mut nodes = Vec::with_capacity(self.folders.len() + self.files.len());

        for (name, folder) in self.folders {
            let path = format!("{prefix}{name}");
            let children = folder.into_nodes(&format!("{path}/"), scheme);
            nodes.push(Node::new(path, name, 0, scheme, NodeContent::Folder(children)));
        }
        for (name, data) in self.files {
            let size = data.len() as u64;
            nodes.push(Node::new(
                format!("{prefix}{name}"),
                name,
                size,
                scheme,
                NodeContent::Bytes(data),
            ));
        }

        nodes.sort_by(|a, b| a.name().cmp(b.name()));
        nodes
    }
}
