use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::models::difficulty::Difficulty;

/// 题目类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuestionKind {
    /// 四选一选择题
    #[serde(rename = "multiple-choice")]
    MultipleChoice,
    /// 判断题
    #[serde(rename = "true-false")]
    TrueFalse,
    /// 填空题（已定义但未接入生成循环，见 synthesizer）
    #[serde(rename = "fill-blank")]
    FillBlank,
}

/// 题目来源标记：由哪个生成策略产出
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Provenance {
    #[serde(rename = "openai")]
    OpenAi,
    #[serde(rename = "ollama")]
    Ollama,
    #[serde(rename = "rule-based")]
    RuleBased,
}

/// 单个题目
///
/// 选择题固定 4 个选项，正确答案始终位于 options[0]；
/// 判断题选项固定为 {"True", "False"}，correct 为其中之一
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub kind: QuestionKind,
    pub text: String,
    pub options: Vec<String>,
    pub correct: String,
    pub points: u32,
    pub provenance: Provenance,
}

/// 完整的测验对象（最终输出契约）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quiz {
    pub id: String,
    pub title: String,
    pub description: String,
    pub questions: Vec<Question>,
    pub difficulty: Difficulty,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Local>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Local>,
    #[serde(rename = "totalQuestions")]
    pub total_questions: usize,
}

/// 一次生成请求
///
/// `question_count = 0` 会在进入流程前被归一化为配置的默认值
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub title: String,
    pub description: String,
    pub difficulty: Difficulty,
    pub question_count: usize,
    /// 提取得到的原始文档文本（尚未归一化）
    pub document_text: String,
}
