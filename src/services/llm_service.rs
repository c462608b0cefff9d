//! LLM 服务 - 业务能力层
//!
//! 只负责"调用 OpenAI 兼容接口生成题目"能力，不关心流程
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 支持自定义 API 端点和模型
//! - 兼容 OpenAI API 的服务（如 Azure, Gemini, Doubao 等）

use anyhow::Result;
use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use serde::Deserialize;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::error::{AppError, LlmError};
use crate::models::quiz::{GenerationRequest, Provenance, Question, QuestionKind};
use crate::utils::logging::truncate_text;

/// 发送给 LLM 的内容最大字符数，超出部分截断
const MAX_PROMPT_CONTENT_CHARS: usize = 3000;

/// 单次响应最多接受的题目数量
const MAX_PARSED_QUESTIONS: usize = 20;

/// LLM 服务
///
/// 职责：
/// - 调用 LLM API 生成题目
/// - 提供通用的 LLM 调用接口
/// - 不出现回退逻辑（策略顺序由 workflow 决定）
/// - 不关心批处理
pub struct LlmService {
    client: Client<OpenAIConfig>,
    model_name: String,
}

impl LlmService {
    /// 创建新的 LLM 服务
    pub fn new(config: &Config) -> Self {
        // 配置 OpenAI 客户端（兼容 OpenAI API 的服务）
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.llm_api_key)
            .with_api_base(&config.llm_api_base_url);

        let client = Client::with_config(openai_config);

        Self {
            client,
            model_name: config.llm_model_name.clone(),
        }
    }

    /// 通用的 LLM 调用函数
    ///
    /// 这是最基础的 LLM 调用接口，其他所有 LLM 相关功能都应该基于此函数。
    ///
    /// # 参数
    /// - `user_message`: 用户消息内容
    /// - `system_message`: 系统消息（可选）
    ///
    /// # 返回
    /// 返回 LLM 的响应内容（字符串）
    pub async fn send_to_llm(
        &self,
        user_message: &str,
        system_message: Option<&str>,
    ) -> Result<String> {
        debug!("调用 LLM API，模型: {}", self.model_name);
        debug!("用户消息长度: {} 字符", user_message.len());

        // 构建消息列表
        let mut messages = Vec::new();

        // 添加系统消息（如果提供）
        if let Some(sys_msg) = system_message {
            let system_msg = ChatCompletionRequestSystemMessageArgs::default()
                .content(sys_msg)
                .build()?;
            messages.push(ChatCompletionRequestMessage::System(system_msg));
        }

        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(user_message)
            .build()?;
        messages.push(ChatCompletionRequestMessage::User(user_msg));

        // 构建请求
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(messages)
            .temperature(0.7)
            .max_tokens(2000u32)
            .build()?;

        // 调用 API
        let response = self.client.chat().create(request).await.map_err(|e| {
            warn!("LLM API 调用失败: {}", e);
            AppError::llm_api_failed(&self.model_name, e)
        })?;

        debug!("LLM API 调用成功");

        // 提取响应内容
        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| LlmError::EmptyContent {
                model: self.model_name.clone(),
            })?;

        Ok(content.trim().to_string())
    }

    /// 基于文档内容生成一组题目
    ///
    /// 这个函数基于 `send_to_llm` 实现，专门用于测验生成场景。
    ///
    /// # 参数
    /// - `content`: 归一化后的文档文本
    /// - `request`: 生成请求（标题、难度等）
    /// - `target_count`: 目标题目数量
    ///
    /// # 返回
    /// 返回解析并校验后的题目列表（1 到 20 道）
    pub async fn generate_questions(
        &self,
        content: &str,
        request: &GenerationRequest,
        target_count: usize,
    ) -> Result<Vec<Question>> {
        debug!(
            "开始 LLM 生成，目标数量: {}, 模型: {}",
            target_count, self.model_name
        );

        let (user_message, system_message) =
            self.build_generation_messages(content, request, target_count);

        let response = self
            .send_to_llm(&user_message, Some(&system_message))
            .await?;

        let questions = parse_questions_response(&response, Provenance::OpenAi)?;

        debug!("LLM 返回 {} 道合法题目", questions.len());

        Ok(questions)
    }

    /// 构建用于测验生成的消息
    ///
    /// 返回 (user_message, system_message)
    fn build_generation_messages(
        &self,
        content: &str,
        request: &GenerationRequest,
        target_count: usize,
    ) -> (String, String) {
        let system_message = "You are an expert quiz generator. Generate high-quality multiple choice questions based on the provided content. Return ONLY valid JSON without any additional text or formatting.".to_string();

        // 过长的内容截断，避免超出上下文窗口
        let truncated: String = if content.chars().count() > MAX_PROMPT_CONTENT_CHARS {
            content
                .chars()
                .take(MAX_PROMPT_CONTENT_CHARS)
                .collect::<String>()
                + "..."
        } else {
            content.to_string()
        };

        let user_message = format!(
            r#"Based on the following content, generate {count} multiple choice questions. {instruction}

Content:
{content}

Requirements:
- Generate exactly {count} questions
- Each question should have 4 options (A, B, C, D)
- Indicate the correct answer (0-3 index)
- Return the response as a JSON array of questions

JSON Format:
[
  {{
    "question": "Question text here?",
    "options": ["Option A", "Option B", "Option C", "Option D"],
    "correctAnswer": 0
  }}
]

Return ONLY the JSON array, no additional text."#,
            count = target_count,
            instruction = request.difficulty.prompt_instruction(),
            content = truncated,
        );

        (user_message, system_message)
    }
}

/// LLM 响应中单道题目的原始结构
#[derive(Debug, Deserialize)]
struct RawQuestion {
    question: String,
    options: Vec<String>,
    #[serde(rename = "correctAnswer")]
    correct_answer: usize,
}

/// 解析 LLM 后端返回的题目 JSON
///
/// OpenAI 兼容后端与 Ollama 后端共用同一解析器：
/// 剥掉 Markdown 代码围栏，解析 JSON 数组，丢弃选项数不为 4
/// 或正确答案下标越界的题目，数量上限截断
pub fn parse_questions_response(
    response: &str,
    provenance: Provenance,
) -> Result<Vec<Question>> {
    // 清理响应，去掉可能的 Markdown 格式
    let cleaned = response
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();

    let raw_questions: Vec<RawQuestion> =
        serde_json::from_str(cleaned).map_err(|e| LlmError::ResponseParseFailed {
            snippet: truncate_text(cleaned, 80),
            source: Box::new(e),
        })?;

    let mut questions = Vec::new();
    for raw in raw_questions {
        // 跳过格式不完整的题目
        if raw.options.len() != 4 || raw.correct_answer >= raw.options.len() {
            continue;
        }

        let correct = raw.options[raw.correct_answer].clone();
        questions.push(Question {
            id: Uuid::new_v4().to_string(),
            kind: QuestionKind::MultipleChoice,
            text: raw.question,
            options: raw.options,
            correct,
            points: 1,
            provenance,
        });

        // 防止过量题目
        if questions.len() >= MAX_PARSED_QUESTIONS {
            break;
        }
    }

    if questions.is_empty() {
        return Err(LlmError::NoValidQuestions.into());
    }

    Ok(questions)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_json_array() {
        let response = r#"[
            {"question": "What is a determinant?", "options": ["A scalar", "A vector", "A matrix", "A basis"], "correctAnswer": 0},
            {"question": "When is it zero?", "options": ["Always", "Never", "Dependent rows", "Square only"], "correctAnswer": 2}
        ]"#;

        let questions = parse_questions_response(response, Provenance::OpenAi).unwrap();
        assert_eq!(questions.len(), 2);
        assert_eq!(questions[0].correct, "A scalar");
        assert_eq!(questions[1].correct, "Dependent rows");
        assert!(questions.iter().all(|q| q.provenance == Provenance::OpenAi));
        assert!(questions
            .iter()
            .all(|q| q.kind == QuestionKind::MultipleChoice));
    }

    #[test]
    fn test_parse_fenced_json() {
        let response = "```json\n[{\"question\": \"Q?\", \"options\": [\"a\", \"b\", \"c\", \"d\"], \"correctAnswer\": 1}]\n```";
        let questions = parse_questions_response(response, Provenance::Ollama).unwrap();
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].correct, "b");
        assert_eq!(questions[0].provenance, Provenance::Ollama);
    }

    #[test]
    fn test_parse_skips_malformed_questions() {
        // 第一道题只有 3 个选项，第二道正确答案越界，都被跳过
        let response = r#"[
            {"question": "Bad A?", "options": ["a", "b", "c"], "correctAnswer": 0},
            {"question": "Bad B?", "options": ["a", "b", "c", "d"], "correctAnswer": 7},
            {"question": "Good?", "options": ["a", "b", "c", "d"], "correctAnswer": 3}
        ]"#;
        let questions = parse_questions_response(response, Provenance::OpenAi).unwrap();
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].text, "Good?");
    }

    #[test]
    fn test_parse_rejects_invalid_json() {
        assert!(parse_questions_response("not json at all", Provenance::OpenAi).is_err());
    }

    #[test]
    fn test_parse_rejects_empty_result() {
        // JSON 合法但没有任何合格题目
        let response = r#"[{"question": "Bad?", "options": ["a"], "correctAnswer": 0}]"#;
        assert!(parse_questions_response(response, Provenance::OpenAi).is_err());
    }

    #[test]
    fn test_parse_caps_question_count() {
        let one = r#"{"question": "Q?", "options": ["a", "b", "c", "d"], "correctAnswer": 0}"#;
        let many = format!("[{}]", vec![one; 30].join(","));
        let questions = parse_questions_response(&many, Provenance::OpenAi).unwrap();
        assert_eq!(questions.len(), MAX_PARSED_QUESTIONS);
    }
}
