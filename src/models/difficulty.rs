/// 难度枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    /// 简单
    Easy,
    /// 中等
    Medium,
    /// 困难
    Hard,
}

impl Difficulty {
    /// 获取标准名称
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    /// 尝试从字符串解析难度（不区分大小写）
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "medium" => Some(Difficulty::Medium),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    /// 难度越高，额外追加的题目数量越多
    ///
    /// 追加发生在调用生成器之前，生成算法本身与难度无关
    pub fn bonus_questions(self) -> usize {
        match self {
            Difficulty::Easy => 0,
            Difficulty::Medium => 1,
            Difficulty::Hard => 2,
        }
    }

    /// 构建 LLM Prompt 时使用的难度说明
    pub fn prompt_instruction(self) -> &'static str {
        match self {
            Difficulty::Easy => {
                "Create simple, straightforward questions that test basic understanding."
            }
            Difficulty::Medium => {
                "Create moderately challenging questions that require analysis and comprehension."
            }
            Difficulty::Hard => {
                "Create complex questions that require deep understanding and critical thinking."
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str() {
        assert_eq!(Difficulty::from_str("easy"), Some(Difficulty::Easy));
        assert_eq!(Difficulty::from_str("Medium"), Some(Difficulty::Medium));
        assert_eq!(Difficulty::from_str("HARD"), Some(Difficulty::Hard));
        assert_eq!(Difficulty::from_str("expert"), None);
    }

    #[test]
    fn test_bonus_questions_monotonic() {
        assert!(Difficulty::Easy.bonus_questions() <= Difficulty::Medium.bonus_questions());
        assert!(Difficulty::Medium.bonus_questions() <= Difficulty::Hard.bonus_questions());
    }
}
