use crate::error::{AppError, BusinessError};
use crate::models::difficulty::Difficulty;
use crate::models::quiz::GenerationRequest;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tokio::fs;

/// TOML 生成请求文件的原始结构
///
/// `content` 与 `content_file` 二选一：内联文档文本，或指向文档文本文件的路径
/// （相对路径以 TOML 文件所在目录为基准）
#[derive(Debug, Deserialize)]
struct RequestFile {
    title: String,
    description: String,
    difficulty: String,
    #[serde(default)]
    question_count: usize,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    content_file: Option<String>,
}

/// 从 TOML 文件加载数据并转换为 GenerationRequest 对象
pub async fn load_toml_to_request(toml_file_path: &Path) -> Result<GenerationRequest> {
    let content = fs::read_to_string(toml_file_path)
        .await
        .with_context(|| format!("无法读取TOML文件: {}", toml_file_path.display()))?;

    let file: RequestFile = toml::from_str(&content)
        .with_context(|| format!("无法解析TOML文件: {}", toml_file_path.display()))?;

    let difficulty = Difficulty::from_str(&file.difficulty).ok_or_else(|| {
        AppError::Business(BusinessError::DifficultyParseFailed {
            difficulty: file.difficulty.clone(),
        })
    })?;

    // 解析文档文本：优先内联，其次读取外部文件
    let document_text = match (file.content, file.content_file) {
        (Some(text), _) => text,
        (None, Some(rel_path)) => {
            let base = toml_file_path.parent().unwrap_or_else(|| Path::new("."));
            let doc_path = base.join(&rel_path);
            fs::read_to_string(&doc_path)
                .await
                .with_context(|| format!("无法读取文档文件: {}", doc_path.display()))?
        }
        (None, None) => anyhow::bail!(
            "请求文件缺少文档内容 (content 或 content_file): {}",
            toml_file_path.display()
        ),
    };

    // 空文档在进入流程前拒绝
    if document_text.trim().is_empty() {
        return Err(AppError::Business(BusinessError::EmptyDocument {
            title: file.title,
        })
        .into());
    }

    Ok(GenerationRequest {
        title: file.title,
        description: file.description,
        difficulty,
        question_count: file.question_count,
        document_text,
    })
}

/// 从文件夹中加载所有 TOML 文件并转换为 GenerationRequest 对象列表
pub async fn load_all_toml_files(folder_path: &str) -> Result<Vec<GenerationRequest>> {
    let folder = PathBuf::from(folder_path);

    if !folder.exists() {
        anyhow::bail!("文件夹不存在: {}", folder_path);
    }

    let mut requests = Vec::new();
    let mut entries = fs::read_dir(&folder)
        .await
        .with_context(|| format!("无法读取文件夹: {}", folder_path))?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) == Some("toml") {
            tracing::info!(
                "正在加载: {}",
                path.file_name().unwrap_or_default().to_string_lossy()
            );

            match load_toml_to_request(&path).await {
                Ok(request) => requests.push(request),
                Err(e) => {
                    tracing::warn!("⚠️ 跳过无法加载的请求文件 {}: {}", path.display(), e);
                }
            }
        }
    }

    // 按标题排序，保证批处理顺序稳定
    requests.sort_by(|a, b| a.title.cmp(&b.title));

    Ok(requests)
}
