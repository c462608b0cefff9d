//! 单个文档处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块负责处理单个生成请求，是文档级别的编排器。
//!
//! ## 核心功能
//!
//! 1. **流程调度**：创建并运行 `GenerationFlow`
//! 2. **结果落盘**：把生成的测验写成 JSON 文件
//! 3. **统计输出**：记录题目数量与产出状态

use crate::config::Config;
use crate::models::quiz::{GenerationRequest, Quiz};
use crate::workflow::{GenerationCtx, GenerationFlow};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// 处理单个生成请求
///
/// # 参数
/// - `request`: 生成请求数据
/// - `doc_index`: 文档索引（用于日志）
/// - `config`: 配置
///
/// # 返回
/// 返回是否产出了非空测验（true=产出，false=空结果跳过）
pub async fn process_document(
    request: GenerationRequest,
    doc_index: usize,
    config: &Config,
) -> Result<bool> {
    log_document_start(doc_index, &request);

    // 创建流程对象（只创建一次，复用）
    let flow = GenerationFlow::new(config);
    let ctx = GenerationCtx::new(doc_index, &request.title);

    // 执行流程（委托给 GenerationFlow）
    let quiz = flow.run(&request, &ctx).await?;

    // 空测验是正常结果：记录并跳过落盘
    if quiz.questions.is_empty() {
        warn!("[文档 {}] ⚠️ 未产出任何题目，跳过输出", doc_index);
        return Ok(false);
    }

    // 结果落盘
    let output_path = write_quiz(&quiz, &ctx, &config.output_folder, doc_index).await?;

    log_document_complete(doc_index, &quiz, &output_path);

    Ok(true)
}

/// 把测验写成 JSON 文件
async fn write_quiz(
    quiz: &Quiz,
    ctx: &GenerationCtx,
    output_folder: &str,
    doc_index: usize,
) -> Result<PathBuf> {
    tokio::fs::create_dir_all(output_folder)
        .await
        .with_context(|| format!("无法创建输出目录: {}", output_folder))?;

    let output_path = Path::new(output_folder).join(format!("{}.json", ctx.output_slug));
    let payload = serde_json::to_string_pretty(quiz).context("无法序列化测验对象")?;

    tokio::fs::write(&output_path, payload)
        .await
        .with_context(|| format!("无法写入输出文件: {}", output_path.display()))?;

    info!(
        "[文档 {}] 📤 测验已写入: {}",
        doc_index,
        output_path.display()
    );

    Ok(output_path)
}

// ========== 日志辅助函数 ==========

fn log_document_start(doc_index: usize, request: &GenerationRequest) {
    info!("[文档 {}] 开始处理", doc_index);
    info!("[文档 {}] 标题: {}", doc_index, request.title);
    info!(
        "[文档 {}] 难度: {} / 请求题目数: {}",
        doc_index,
        request.difficulty.as_str(),
        request.question_count
    );
    info!(
        "[文档 {}] 文档长度: {} 字符",
        doc_index,
        request.document_text.chars().count()
    );
}

fn log_document_complete(doc_index: usize, quiz: &Quiz, output_path: &Path) {
    info!(
        "[文档 {}] 题目统计: 共 {} 道 (输出: {})",
        doc_index,
        quiz.total_questions,
        output_path.display()
    );
    info!("\n[文档 {}] ✅ 文档处理完成\n", doc_index);
}
