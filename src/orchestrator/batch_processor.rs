//! 批量文档处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责批量生成请求的处理和资源管理。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：启动日志、准备输出目录
//! 2. **批量加载**：扫描并加载所有待处理的生成请求（`Vec<GenerationRequest>`）
//! 3. **并发控制**：使用 Semaphore 限制并发数量
//! 4. **分批处理**：将请求分批次处理，每批完成后再开始下一批
//! 5. **全局统计**：汇总所有文档的处理结果
//!
//! ## 设计特点
//!
//! - **顶层编排**：不处理单个文档的细节
//! - **并发安全**：流程各阶段是纯函数，跨请求并发不共享可变状态
//! - **向下委托**：委托 document_processor 处理单个文档

use crate::config::Config;
use crate::models::{load_all_toml_files, GenerationRequest};
use crate::orchestrator::document_processor;
use crate::utils::logging::{
    init_log_file, log_batch_complete, log_batch_start, log_requests_loaded, log_startup,
    print_final_stats,
};
use anyhow::Result;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

/// 应用主结构
pub struct App {
    config: Config,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        // 初始化日志文件
        init_log_file(&config.output_log_file)?;

        log_startup(config.max_concurrent_documents);

        // 预先准备输出目录
        tokio::fs::create_dir_all(&config.output_folder).await?;

        Ok(Self { config })
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<()> {
        // 加载所有待处理的生成请求
        let all_requests = self.load_requests().await?;

        if all_requests.is_empty() {
            warn!("⚠️ 没有找到待处理的TOML请求文件，程序结束");
            return Ok(());
        }

        let total_requests = all_requests.len();
        log_requests_loaded(total_requests, self.config.max_concurrent_documents);

        // 处理所有请求
        let stats = self.process_all_documents(all_requests).await?;

        // 输出最终统计
        print_final_stats(
            stats.success,
            stats.failed,
            stats.total,
            &self.config.output_log_file,
        );

        Ok(())
    }

    /// 加载生成请求
    async fn load_requests(&self) -> Result<Vec<GenerationRequest>> {
        info!("\n📁 正在扫描待处理的生成请求...");
        load_all_toml_files(&self.config.request_folder).await
    }

    /// 处理所有文档
    async fn process_all_documents(
        &self,
        all_requests: Vec<GenerationRequest>,
    ) -> Result<ProcessingStats> {
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_documents));
        let total_requests = all_requests.len();
        let mut stats = ProcessingStats {
            total: total_requests,
            ..Default::default()
        };

        // 分批处理
        for batch_start in (0..total_requests).step_by(self.config.max_concurrent_documents) {
            let batch_end =
                (batch_start + self.config.max_concurrent_documents).min(total_requests);
            let batch_requests = &all_requests[batch_start..batch_end];
            let batch_num = (batch_start / self.config.max_concurrent_documents) + 1;
            let total_batches = (total_requests + self.config.max_concurrent_documents - 1)
                / self.config.max_concurrent_documents;

            log_batch_start(
                batch_num,
                total_batches,
                batch_start + 1,
                batch_end,
                total_requests,
            );

            // 处理本批
            let batch_result = self
                .process_batch(batch_requests, batch_start, semaphore.clone())
                .await?;

            stats.success += batch_result.success;
            stats.failed += batch_result.failed;

            log_batch_complete(
                batch_num,
                batch_result.success,
                batch_result.success + batch_result.failed,
            );
        }

        Ok(stats)
    }

    /// 处理单个批次
    async fn process_batch(
        &self,
        batch_requests: &[GenerationRequest],
        batch_start: usize,
        semaphore: Arc<Semaphore>,
    ) -> Result<BatchResult> {
        let mut batch_handles = Vec::new();

        // 为本批创建并发任务
        // 流程各阶段是单个文档文本上的纯函数，跨请求并发无共享可变状态
        for (idx, request) in batch_requests.iter().enumerate() {
            let doc_index = batch_start + idx + 1;
            let permit = semaphore.clone().acquire_owned().await?;

            let request_clone = request.clone();
            let config_clone = self.config.clone();

            let handle = tokio::spawn(async move {
                let _permit = permit;
                match document_processor::process_document(request_clone, doc_index, &config_clone)
                    .await
                {
                    Ok(produced) => Ok(produced),
                    Err(e) => {
                        error!("[文档 {}] ❌ 处理过程中发生错误: {}", doc_index, e);
                        Err(e)
                    }
                }
            });
            batch_handles.push((doc_index, handle));
        }

        // 等待本批所有任务完成
        let mut result = BatchResult::default();

        for (doc_index, handle) in batch_handles {
            match handle.await {
                Ok(Ok(true)) => {
                    result.success += 1;
                }
                Ok(Ok(false)) | Ok(Err(_)) => {
                    result.failed += 1;
                }
                Err(e) => {
                    error!("[文档 {}] 任务执行失败: {}", doc_index, e);
                    result.failed += 1;
                }
            }
        }

        Ok(result)
    }
}

/// 处理统计
#[derive(Debug, Default)]
struct ProcessingStats {
    success: usize,
    failed: usize,
    total: usize,
}

/// 批次处理结果
#[derive(Debug, Default)]
struct BatchResult {
    success: usize,
    failed: usize,
}
