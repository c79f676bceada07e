//! 入力ファイルの収集
//!
//! パス（ファイル/フォルダ）を解析対象の `MediaFile` 一覧に展開する。

use crate::error::{DeepScanError, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

const MEDIA_EXTENSIONS: &[(&str, &str)] = &[
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("webp", "image/webp"),
    ("gif", "image/gif"),
    ("bmp", "image/bmp"),
    ("heic", "image/heic"),
    ("mp4", "video/mp4"),
    ("mov", "video/quicktime"),
    ("webm", "video/webm"),
    ("avi", "video/x-msvideo"),
    ("mkv", "video/x-matroska"),
];

const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

#[derive(Debug, Clone)]
enum MediaSource {
    Path(PathBuf),
    Memory(Arc<[u8]>),
}

/// 解析対象のファイル
///
/// バイト列は `read_bytes` で必要になった時点で読み込む。
#[derive(Debug, Clone)]
pub struct MediaFile {
    pub file_name: String,
    pub mime_type: String,
    source: MediaSource,
}

impl MediaFile {
    /// ディスク上のファイルから作成（MIMEタイプは拡張子から判定）
    pub fn from_path(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(DeepScanError::FileNotFound(path.display().to_string()));
        }

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let mime_type = mime_type_for(path).unwrap_or(FALLBACK_MIME_TYPE).to_string();

        Ok(Self {
            file_name,
            mime_type,
            source: MediaSource::Path(path.to_path_buf()),
        })
    }

    /// メモリ上のバイト列から作成（ドラッグ&ドロップ等）
    pub fn from_bytes(
        file_name: impl Into<String>,
        mime_type: impl Into<String>,
        bytes: impl Into<Arc<[u8]>>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            source: MediaSource::Memory(bytes.into()),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match &self.source {
            MediaSource::Path(path) => Some(path),
            MediaSource::Memory(_) => None,
        }
    }

    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }

    /// 表示用のプレビュー参照
    pub fn preview_ref(&self) -> String {
        match &self.source {
            MediaSource::Path(path) => path.display().to_string(),
            MediaSource::Memory(_) => format!("memory://{}", self.file_name),
        }
    }

    pub async fn read_bytes(&self) -> Result<Arc<[u8]>> {
        match &self.source {
            MediaSource::Path(path) => {
                let bytes = tokio::fs::read(path).await?;
                Ok(bytes.into())
            }
            MediaSource::Memory(bytes) => Ok(Arc::clone(bytes)),
        }
    }
}

/// 拡張子からMIMEタイプを判定
pub fn mime_type_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_string_lossy().to_lowercase();
    MEDIA_EXTENSIONS
        .iter()
        .find(|(e, _)| *e == ext)
        .map(|(_, mime)| *mime)
}

/// パス一覧を解析対象に展開
///
/// - ファイル: 拡張子に関係なくそのまま対象にする
/// - フォルダ: 対応拡張子のファイルのみ、ファイル名順
pub fn scan_paths(paths: &[PathBuf], recursive: bool) -> Result<Vec<MediaFile>> {
    let mut files = Vec::new();

    for path in paths {
        if path.is_dir() {
            files.extend(scan_folder(path, recursive)?);
        } else {
            files.push(MediaFile::from_path(path)?);
        }
    }

    Ok(files)
}

pub fn scan_folder(folder: &Path, recursive: bool) -> Result<Vec<MediaFile>> {
    if !folder.exists() {
        return Err(DeepScanError::FolderNotFound(folder.display().to_string()));
    }

    let max_depth = if recursive { usize::MAX } else { 1 };
    let mut files = Vec::new();

    for entry in WalkDir::new(folder)
        .max_depth(max_depth)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if path.is_file() && mime_type_for(path).is_some() {
            files.push(MediaFile::from_path(path)?);
        }
    }

    // ファイル名でソート
    files.sort_by(|a, b| a.file_name.cmp(&b.file_name));

    Ok(files)
}
