use crate::error::{AppError, AppResult, FileError};
use crate::models::detection::ScanDocument;
use std::path::{Path, PathBuf};
use tokio::fs;

/// 支持的检测文档格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Toml,
}

impl DocumentFormat {
    /// 根据扩展名判断格式
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|s| s.to_str()) {
            Some("json") => Some(DocumentFormat::Json),
            Some("toml") => Some(DocumentFormat::Toml),
            _ => None,
        }
    }
}

/// 解析检测文档内容
///
/// 文档名为空时用文件名（不含扩展名）代替，并把页码同步到每条记录。
pub fn parse_document(content: &str, format: DocumentFormat, path: &Path) -> AppResult<ScanDocument> {
    let path_str = path.display().to_string();
    let mut document: ScanDocument = match format {
        DocumentFormat::Json => serde_json::from_str(content).map_err(|source| FileError::JsonFailed {
            path: path_str.clone(),
            source,
        })?,
        DocumentFormat::Toml => toml::from_str(content).map_err(|source| FileError::TomlParseFailed {
            path: path_str.clone(),
            source,
        })?,
    };

    if document.name.trim().is_empty() {
        document.name = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
    }
    document.assign_pages();

    Ok(document.with_file_path(path_str))
}

/// 从 JSON / TOML 文件加载检测文档
pub async fn load_document(path: &Path) -> AppResult<ScanDocument> {
    let format = DocumentFormat::from_path(path).ok_or_else(|| FileError::UnsupportedFormat {
        path: path.display().to_string(),
    })?;

    let content = fs::read_to_string(path)
        .await
        .map_err(|e| AppError::file_read_failed(path.display().to_string(), e))?;

    parse_document(&content, format, path)
}

/// 从文件夹中加载所有检测文档
///
/// 单个文件解析失败只记录警告，不影响其他文件。结果按文件名排序。
pub async fn load_all_documents(folder_path: &str) -> AppResult<Vec<ScanDocument>> {
    let folder = PathBuf::from(folder_path);

    if !folder.exists() {
        return Err(FileError::DirectoryNotFound {
            path: folder_path.to_string(),
        }
        .into());
    }

    let mut paths = Vec::new();
    let mut entries = fs::read_dir(&folder)
        .await
        .map_err(|e| AppError::file_read_failed(folder_path, e))?;

    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| AppError::file_read_failed(folder_path, e))?
    {
        let path = entry.path();
        if DocumentFormat::from_path(&path).is_some() {
            paths.push(path);
        }
    }
    paths.sort();

    let mut documents = Vec::new();
    for path in paths {
        tracing::info!(
            "正在加载: {}",
            path.file_name().unwrap_or_default().to_string_lossy()
        );

        match load_document(&path).await {
            Ok(document) => {
                tracing::info!("成功加载 {} 页检测结果", document.pages.len());
                documents.push(document);
            }
            Err(e) => {
                tracing::warn!("加载文件失败 {}: {}", path.display(), e);
            }
        }
    }

    Ok(documents)
}
