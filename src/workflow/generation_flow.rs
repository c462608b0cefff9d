//! 测验生成流程 - 流程层
//!
//! 核心职责：定义"一个文档"的完整生成流程
//!
//! 流程顺序：
//! 1. 归一化文档文本（一次，所有策略共享）
//! 2. OpenAI 兼容后端 → Ollama 后端 → 规则合成器（兜底）
//! 3. 组装 Quiz 输出对象
//!
//! 策略按优先级排成变体列表，契约统一为
//! `try_generate(content, request, target_count) -> Result<Vec<Question>>`；
//! 规则合成器是最后一个、永远可用的策略，后端失败/超时/未配置时
//! 自动落到它，不需要调用方特判任何异常

use anyhow::Result;
use chrono::Local;
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::models::quiz::{GenerationRequest, Question, Quiz};
use crate::services::{
    ContentAnalyzer, LlmService, OllamaService, QuestionSynthesizer, TextNormalizer,
};
use crate::utils::logging::truncate_text;
use crate::workflow::generation_ctx::GenerationCtx;

/// 外部后端单次调用的超时（规则兜底无 I/O，不受此限制）
const BACKEND_TIMEOUT: Duration = Duration::from_secs(120);

/// 生成策略变体
enum Strategy {
    /// OpenAI 兼容后端
    OpenAi(LlmService),
    /// 本地 Ollama 后端
    Ollama(OllamaService),
    /// 规则合成器（确定性兜底）
    RuleBased {
        analyzer: ContentAnalyzer,
        synthesizer: QuestionSynthesizer,
    },
}

impl Strategy {
    fn name(&self) -> &'static str {
        match self {
            Strategy::OpenAi(_) => "openai",
            Strategy::Ollama(_) => "ollama",
            Strategy::RuleBased { .. } => "rule-based",
        }
    }

    /// 是否是外部网络调用（需要调用方包裹超时）
    fn is_external(&self) -> bool {
        !matches!(self, Strategy::RuleBased { .. })
    }

    /// 统一的策略契约
    async fn try_generate(
        &self,
        content: &str,
        request: &GenerationRequest,
        target_count: usize,
    ) -> Result<Vec<Question>> {
        match self {
            Strategy::OpenAi(service) => {
                service.generate_questions(content, request, target_count).await
            }
            Strategy::Ollama(service) => {
                service.generate_questions(content, request, target_count).await
            }
            Strategy::RuleBased {
                analyzer,
                synthesizer,
            } => {
                let analysis = analyzer.analyze(content);
                Ok(synthesizer.synthesize(content, &analysis, target_count))
            }
        }
    }
}

/// 测验生成流程
///
/// - 编排完整的文档到测验流程
/// - 决定策略顺序和何时落到兜底
/// - 不持有任何 I/O 资源（输出写盘在编排层）
/// - 只依赖业务能力（services）
pub struct GenerationFlow {
    strategies: Vec<Strategy>,
    normalizer: TextNormalizer,
    default_question_count: usize,
    verbose_logging: bool,
}

impl GenerationFlow {
    /// 创建新的生成流程
    ///
    /// 策略列表按配置组装：API Key 可用时加入 OpenAI 兼容后端，
    /// Ollama 启用时加入 Ollama 后端，规则合成器永远在最后
    pub fn new(config: &Config) -> Self {
        let mut strategies = Vec::new();

        if config.llm_available() {
            strategies.push(Strategy::OpenAi(LlmService::new(config)));
        }
        if config.ollama_enabled {
            strategies.push(Strategy::Ollama(OllamaService::new(config)));
        }
        strategies.push(Strategy::RuleBased {
            analyzer: ContentAnalyzer::new(),
            synthesizer: QuestionSynthesizer::new(),
        });

        Self {
            strategies,
            normalizer: TextNormalizer::new(),
            default_question_count: config.default_question_count,
            verbose_logging: config.verbose_logging,
        }
    }

    pub async fn run(&self, request: &GenerationRequest, ctx: &GenerationCtx) -> Result<Quiz> {
        // 归一化只做一次，所有策略消费同一份文本
        let content = self.normalizer.normalize(&request.document_text);

        let target_count = self.resolve_target_count(request);

        info!(
            "[文档 {}] 目标题目数: {} (难度: {})",
            ctx.doc_index,
            target_count,
            request.difficulty.as_str()
        );

        let mut questions: Vec<Question> = Vec::new();

        for strategy in &self.strategies {
            info!("[文档 {}] 🔍 尝试 {} 策略...", ctx.doc_index, strategy.name());

            // 外部后端调用包裹统一超时
            let result = if strategy.is_external() {
                match tokio::time::timeout(
                    BACKEND_TIMEOUT,
                    strategy.try_generate(&content, request, target_count),
                )
                .await
                {
                    Ok(inner) => inner,
                    Err(_) => Err(anyhow::anyhow!(
                        "{} 策略超时 ({}s)",
                        strategy.name(),
                        BACKEND_TIMEOUT.as_secs()
                    )),
                }
            } else {
                strategy.try_generate(&content, request, target_count).await
            };

            match result {
                Ok(generated) if !generated.is_empty() => {
                    info!(
                        "[文档 {}] ✓ {} 策略生成 {} 道题目",
                        ctx.doc_index,
                        strategy.name(),
                        generated.len()
                    );
                    questions = generated;
                    break;
                }
                Ok(_) => {
                    info!(
                        "[文档 {}] {} 策略返回空结果，尝试下一个策略",
                        ctx.doc_index,
                        strategy.name()
                    );
                }
                Err(e) => {
                    warn!(
                        "[文档 {}] ⚠️ {} 策略失败: {}，尝试下一个策略",
                        ctx.doc_index,
                        strategy.name(),
                        e
                    );
                }
            }
        }

        // 详细日志（如果启用）
        if self.verbose_logging {
            self.log_questions(ctx.doc_index, &questions);
        }

        // 空题目列表是正常结果（内容过稀疏），由调用方决定是否视为错误
        if questions.is_empty() {
            warn!("[文档 {}] ⚠️ 所有策略均未产出题目", ctx.doc_index);
        }

        Ok(self.assemble_quiz(request, questions))
    }

    /// 归一化目标题目数
    ///
    /// 0 归一化为配置默认值，再按难度追加额外题目
    fn resolve_target_count(&self, request: &GenerationRequest) -> usize {
        let base = if request.question_count == 0 {
            self.default_question_count
        } else {
            request.question_count
        };
        base + request.difficulty.bonus_questions()
    }

    /// 组装最终的测验对象
    fn assemble_quiz(&self, request: &GenerationRequest, questions: Vec<Question>) -> Quiz {
        let now = Local::now();
        Quiz {
            id: Uuid::new_v4().to_string(),
            title: request.title.clone(),
            description: request.description.clone(),
            total_questions: questions.len(),
            questions,
            difficulty: request.difficulty,
            created_at: now,
            updated_at: now,
        }
    }

    // ========== 日志辅助方法 ==========

    /// 显示生成的题目预览
    fn log_questions(&self, doc_index: usize, questions: &[Question]) {
        for (i, question) in questions.iter().enumerate() {
            info!(
                "[文档 {}]   {}. {}",
                doc_index,
                i + 1,
                truncate_text(&question.text, 60)
            );
        }
    }
}
