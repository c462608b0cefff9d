//! # Auto Quiz Generate
//!
//! 一个从文档文本自动生成测验题目的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单个文档的文本
//! - `TextNormalizer` - 提取文本清洗能力（伪影、词边界、连字）
//! - `ContentAnalyzer` - 内容分析能力（句子 / 关键词 / 概念）
//! - `QuestionSynthesizer` - 规则题目合成能力（确定性兜底）
//! - `LlmService` - OpenAI 兼容后端生成能力
//! - `OllamaService` - 本地 Ollama 后端生成能力
//!
//! ### ② 流程层（Workflow）
//! - `workflow/` - 定义"一个文档"的完整生成流程
//! - `GenerationCtx` - 上下文封装（doc_index + output_slug）
//! - `GenerationFlow` - 策略编排（归一化 → openai → ollama → 规则兜底）
//!
//! ### ③ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 批量文档处理器，管理并发和统计
//! - `orchestrator/document_processor` - 单个文档处理器，流程调度与落盘
//!
//! ### ④ 数据与配套（Models / Ambient）
//! - `models/` - 题目、测验、请求的数据契约与 TOML 加载器
//! - `config` / `error` / `utils` - 配置、错误分类、日志工具
//!
//! ## 模块结构

pub mod config;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::{Difficulty, GenerationRequest, Provenance, Question, QuestionKind, Quiz};
pub use orchestrator::{process_document, App};
pub use services::{ContentAnalyzer, QuestionSynthesizer, TextNormalizer};
pub use workflow::{GenerationCtx, GenerationFlow};
