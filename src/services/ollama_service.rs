//! Ollama 服务 - 业务能力层
//!
//! 只负责"调用本地 Ollama 生成题目"能力，作为 OpenAI 兼容后端
//! 之外的免费备选。走 Ollama 原生 HTTP API，不依赖 OpenAI 协议

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::Config;
use crate::models::quiz::{GenerationRequest, Provenance, Question};
use crate::services::llm_service::parse_questions_response;

/// 单次请求超时
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Ollama 生成接口的响应体
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
}

/// Ollama 服务
pub struct OllamaService {
    client: reqwest::Client,
    base_url: String,
    model_name: String,
}

impl OllamaService {
    /// 创建新的 Ollama 服务
    pub fn new(config: &Config) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();

        Self {
            client,
            base_url: config.ollama_api_base_url.clone(),
            model_name: config.ollama_model_name.clone(),
        }
    }

    /// 基于文档内容生成一组题目
    ///
    /// # 参数
    /// - `content`: 归一化后的文档文本
    /// - `request`: 生成请求
    /// - `target_count`: 目标题目数量
    pub async fn generate_questions(
        &self,
        content: &str,
        request: &GenerationRequest,
        target_count: usize,
    ) -> Result<Vec<Question>> {
        debug!("使用 Ollama 生成测验，模型: {}", self.model_name);

        let url = format!("{}/api/generate", self.base_url);
        let prompt = self.build_prompt(content, request, target_count);

        let request_body = json!({
            "model": self.model_name,
            "prompt": prompt,
            "stream": false,
        });

        let response = self
            .client
            .post(&url)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                warn!("Ollama API 请求失败: {}", e);
                anyhow::anyhow!("Ollama API 请求失败: {}", e)
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!("Ollama API 返回错误响应: {}", body);
            anyhow::bail!("Ollama API 返回状态码 {}", status);
        }

        let ollama_response: OllamaResponse = response
            .json()
            .await
            .context("无法解码 Ollama 响应")?;

        // 与 OpenAI 兼容后端共用同一解析器
        let questions = parse_questions_response(&ollama_response.response, Provenance::Ollama)?;

        debug!("Ollama 返回 {} 道合法题目", questions.len());

        Ok(questions)
    }

    /// 构建 Ollama 的生成 Prompt
    ///
    /// 与 OpenAI 后端要求相同的 JSON 数组格式，保证两个后端的
    /// 响应可以走同一个解析器
    fn build_prompt(
        &self,
        content: &str,
        request: &GenerationRequest,
        target_count: usize,
    ) -> String {
        format!(
            r#"Create a quiz with {count} questions based on the following content.

Content:
{content}

Requirements:
- Title: {title}
- Description: {description}
- Difficulty: {difficulty}
- Generate exactly {count} multiple choice questions
- Each question must have 4 options
- Indicate the correct answer as a 0-3 index
- Format as a JSON array with this structure:
[
  {{
    "question": "Question text?",
    "options": ["A", "B", "C", "D"],
    "correctAnswer": 0
  }}
]

Ensure questions are clear, relevant, and test understanding of the key concepts. Return ONLY the JSON array."#,
            count = target_count,
            content = content,
            title = request.title,
            description = request.description,
            difficulty = request.difficulty.as_str(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::difficulty::Difficulty;

    fn test_request() -> GenerationRequest {
        GenerationRequest {
            title: "线性代数".to_string(),
            description: "行列式基础".to_string(),
            difficulty: Difficulty::Medium,
            question_count: 5,
            document_text: String::new(),
        }
    }

    #[test]
    fn test_build_prompt_contains_request_fields() {
        let service = OllamaService::new(&Config::default());
        let prompt = service.build_prompt("determinant content", &test_request(), 5);

        assert!(prompt.contains("5 questions"));
        assert!(prompt.contains("determinant content"));
        assert!(prompt.contains("线性代数"));
        assert!(prompt.contains("medium"));
        assert!(prompt.contains("correctAnswer"));
    }

    /// 测试 Ollama 连接性（需要本地 Ollama 实例）
    ///
    /// 运行方式：
    /// ```bash
    /// cargo test test_ollama_connectivity -- --ignored --nocapture
    /// ```
    #[tokio::test]
    #[ignore]
    async fn test_ollama_connectivity() {
        let service = OllamaService::new(&Config::default());
        let content = "The matrix determinant equals zero when rows are linearly dependent.";

        let result = service.generate_questions(content, &test_request(), 2).await;

        match result {
            Ok(questions) => {
                println!("✅ Ollama 调用成功，返回 {} 道题", questions.len());
                assert!(!questions.is_empty());
            }
            Err(e) => {
                println!("❌ Ollama 调用失败: {}", e);
                panic!("Ollama 测试失败: {}", e);
            }
        }
    }
}
