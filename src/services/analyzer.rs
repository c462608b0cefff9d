//! 内容分析 - 业务能力层
//!
//! 在归一化后的文本上做三个互相独立的提取遍历：
//! 候选句子池、按频率排序的关键词表、两词概念短语表。
//!
//! 三个遍历都是输入字符串加静态配置（停用词表、长度界限）的纯函数，
//! 不持有任何跨请求状态。

use std::collections::{HashMap, HashSet};

use phf::phf_set;
use regex::Regex;

/// 停用词表（英语 + 印尼语，文档可能以这两种语言出现）
///
/// 作为不可变的版本化配置数据注入分析器，便于按语言替换后做确定性测试
pub static STOP_WORDS: phf::Set<&'static str> = phf_set! {
    "the", "a", "an", "and", "or", "but",
    "in", "on", "at", "to", "for", "of",
    "with", "by", "from", "as", "is", "was",
    "are", "were", "been", "be", "have", "has",
    "had", "do", "does", "did", "will", "would",
    "could", "should", "may", "might", "must",
    "can", "this", "that", "these", "those",
    "yang", "dan", "atau", "adalah", "ini", "itu",
    "dari", "ke", "di", "untuk", "dengan", "pada",
};

/// 每个 token 两侧要剥离的标点
const TOKEN_TRIM: &[char] = &['.', ',', '!', '?', ';', ':', '(', ')', '[', ']', '{', '}', '"', '\''];

/// 概念提取时词两侧要剥离的标点
const CONCEPT_TRIM: &[char] = &['.', ',', '!', '?', ';', ':'];

/// 分析器配置
///
/// 全部字段为静态数据，构造后不再变化
#[derive(Debug, Clone, Copy)]
pub struct AnalyzerConfig {
    pub stop_words: &'static phf::Set<&'static str>,
    /// 句子最少/最多词数
    pub min_sentence_words: usize,
    pub max_sentence_words: usize,
    /// 句子最短/最长字符数
    pub min_sentence_chars: usize,
    pub max_sentence_chars: usize,
    /// 关键词 token 的最小字符数（不含）
    pub min_token_chars: usize,
    /// 关键词表上限
    pub max_keywords: usize,
    /// 概念表上限
    pub max_concepts: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            stop_words: &STOP_WORDS,
            min_sentence_words: 5,
            max_sentence_words: 30,
            min_sentence_chars: 30,
            max_sentence_chars: 200,
            min_token_chars: 3,
            max_keywords: 30,
            max_concepts: 20,
        }
    }
}

/// 三个提取遍历的汇总结果，作为不可变输入交给题目合成器
#[derive(Debug, Clone, Default)]
pub struct ContentAnalysis {
    /// 文档顺序的候选句子池
    pub sentences: Vec<String>,
    /// 按频率降序的关键词（同频保持首次出现顺序）
    pub keywords: Vec<String>,
    /// 按发现顺序的两词概念短语（小写，去重，上限 20）
    pub concepts: Vec<String>,
}

/// 内容分析器
pub struct ContentAnalyzer {
    config: AnalyzerConfig,
    sentence_split: Regex,
}

impl Default for ContentAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentAnalyzer {
    pub fn new() -> Self {
        Self::with_config(AnalyzerConfig::default())
    }

    pub fn with_config(config: AnalyzerConfig) -> Self {
        Self {
            config,
            // ! 和 ? 在切分意义上等价于句号
            sentence_split: Regex::new(r"[.!?]\s+").expect("句子切分正则必须合法"),
        }
    }

    /// 对归一化文本执行全部三个提取遍历
    pub fn analyze(&self, text: &str) -> ContentAnalysis {
        ContentAnalysis {
            sentences: self.extract_sentences(text),
            keywords: self.extract_keywords(text),
            concepts: self.extract_concepts(text),
        }
    }

    /// 句子提取
    ///
    /// 在终止标点加空白处切分，对每个片段做接受/拒绝过滤：
    /// 词数与字符数在界限内、至少一半是字母。
    /// 不满足的片段直接丢弃，从不修补。顺序保持文档顺序。
    pub fn extract_sentences(&self, text: &str) -> Vec<String> {
        let mut sentences = Vec::new();

        for part in self.sentence_split.split(text) {
            let trimmed = part.trim();
            if trimmed.is_empty() {
                continue;
            }

            // 切分会吃掉终止标点，长度检查前先补回
            let mut sentence = trimmed.to_string();
            if !sentence.ends_with(['.', '!', '?']) {
                sentence.push('.');
            }

            let word_count = sentence.split_whitespace().count();
            if word_count < self.config.min_sentence_words
                || word_count > self.config.max_sentence_words
            {
                continue;
            }

            let char_count = sentence.chars().count();
            if char_count < self.config.min_sentence_chars
                || char_count > self.config.max_sentence_chars
            {
                continue;
            }

            // 至少一半字符是字母，排除纯数字/符号片段
            let letter_count = sentence.chars().filter(|c| c.is_ascii_alphabetic()).count();
            if letter_count < char_count / 2 {
                continue;
            }

            sentences.push(sentence);
        }

        sentences
    }

    /// 关键词提取
    ///
    /// 按空白分词、剥离两侧标点、小写化，丢弃停用词与过短 token，
    /// 统计词频后稳定降序排序（同频保持首次出现顺序），取前 N 个
    pub fn extract_keywords(&self, text: &str) -> Vec<String> {
        let mut first_seen: Vec<String> = Vec::new();
        let mut frequency: HashMap<String, usize> = HashMap::new();

        for token in text.split_whitespace() {
            let cleaned = token.trim_matches(TOKEN_TRIM).to_lowercase();
            if cleaned.chars().count() <= self.config.min_token_chars
                || self.config.stop_words.contains(cleaned.as_str())
            {
                continue;
            }

            match frequency.get_mut(&cleaned) {
                Some(count) => *count += 1,
                None => {
                    frequency.insert(cleaned.clone(), 1);
                    first_seen.push(cleaned);
                }
            }
        }

        // sort_by 是稳定排序：同频关键词保持首次出现顺序
        let mut ranked = first_seen;
        ranked.sort_by(|a, b| frequency[b].cmp(&frequency[a]));
        ranked.truncate(self.config.max_keywords);
        ranked
    }

    /// 概念提取
    ///
    /// 独立于句子过滤，按句号重新切分（被句子过滤拒绝的片段也能产出概念）。
    /// 在每个片段内滑动两词窗口，两词都超过最小长度且拼接短语超过 8 字符时保留；
    /// 小写化后去重，保持发现顺序，上限截断
    pub fn extract_concepts(&self, text: &str) -> Vec<String> {
        let mut concepts = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        for sentence in text.split('.') {
            let words: Vec<&str> = sentence.split_whitespace().collect();
            for pair in words.windows(2) {
                let w1 = pair[0].trim_matches(CONCEPT_TRIM);
                let w2 = pair[1].trim_matches(CONCEPT_TRIM);

                if w1.chars().count() <= 3 || w2.chars().count() <= 3 {
                    continue;
                }

                let phrase = format!("{} {}", w1, w2).to_lowercase();
                if phrase.chars().count() <= 8 {
                    continue;
                }

                if !seen.contains(&phrase) && concepts.len() < self.config.max_concepts {
                    seen.insert(phrase.clone());
                    concepts.push(phrase);
                }
            }
        }

        concepts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DETERMINANT_DOC: &str = "The matrix determinant equals zero when rows are linearly dependent. The determinant calculation requires careful row reduction.";

    #[test]
    fn test_sentence_extraction_bounds() {
        let analyzer = ContentAnalyzer::new();

        let sentences = analyzer.extract_sentences(DETERMINANT_DOC);
        assert_eq!(sentences.len(), 2);
        assert!(sentences[0].ends_with('.'));
        assert!(sentences[1].ends_with('.'));

        // 过短片段被拒绝
        assert!(analyzer.extract_sentences("Too short here. Tiny.").is_empty());
        // 过长片段被拒绝
        let long = format!("{}.", "word ".repeat(40).trim_end());
        assert!(analyzer.extract_sentences(&long).is_empty());
    }

    #[test]
    fn test_sentence_mostly_numeric_rejected() {
        let analyzer = ContentAnalyzer::new();
        let noisy = "12 34 56 78 90 11 22 33 44 55 66 77 ab. ";
        assert!(analyzer.extract_sentences(noisy).is_empty());
    }

    #[test]
    fn test_exclamation_and_question_split() {
        let analyzer = ContentAnalyzer::new();
        let text = "Linear algebra underpins most numerical computing today! Which decomposition should engineers reach for first?";
        let sentences = analyzer.extract_sentences(text);
        assert_eq!(sentences.len(), 2);
        // 切分吃掉 '!'，补回 '.'
        assert!(sentences[0].ends_with('.'));
        // 末尾片段保留原始 '?'
        assert!(sentences[1].ends_with('?'));
    }

    #[test]
    fn test_keyword_frequency_ranking() {
        let analyzer = ContentAnalyzer::new();
        let keywords = analyzer.extract_keywords(DETERMINANT_DOC);

        // determinant 出现两次，排最前
        assert_eq!(keywords[0], "determinant");
        assert!(keywords.contains(&"matrix".to_string()));
        // 停用词与短 token 不出现
        assert!(!keywords.contains(&"the".to_string()));
        assert!(!keywords.contains(&"are".to_string()));
    }

    #[test]
    fn test_keyword_ranking_stable_on_ties() {
        let analyzer = ContentAnalyzer::new();
        // zebra 与 apple 同频；zebra 先出现，必须排在前面
        let keywords = analyzer.extract_keywords("zebra apple zebra apple banana");
        assert_eq!(keywords, vec!["zebra", "apple", "banana"]);
    }

    #[test]
    fn test_keyword_cap() {
        let analyzer = ContentAnalyzer::new();
        let text = (0..50)
            .map(|i| format!("unique{:02} ", i))
            .collect::<String>();
        let keywords = analyzer.extract_keywords(&text);
        assert_eq!(keywords.len(), 30);
    }

    #[test]
    fn test_concept_extraction() {
        let analyzer = ContentAnalyzer::new();
        let concepts = analyzer.extract_concepts(DETERMINANT_DOC);

        assert!(concepts.contains(&"matrix determinant".to_string()));
        assert!(concepts.contains(&"determinant calculation".to_string()));
        // 全部小写
        assert!(concepts.iter().all(|c| c == &c.to_lowercase()));
    }

    #[test]
    fn test_concept_dedup_and_cap() {
        let analyzer = ContentAnalyzer::new();

        // 大小写不同的同一短语只保留一次
        let concepts =
            analyzer.extract_concepts("Matrix Determinant rules. matrix determinant rules.");
        let hits = concepts
            .iter()
            .filter(|c| c.as_str() == "matrix determinant")
            .count();
        assert_eq!(hits, 1);

        // 上限 20
        let text = (0..40)
            .map(|i| format!("konsep{:02} lanjutan{:02} ", i, i))
            .collect::<String>();
        let concepts = analyzer.extract_concepts(&text);
        assert!(concepts.len() <= 20);
    }

    #[test]
    fn test_concepts_from_rejected_sentences() {
        let analyzer = ContentAnalyzer::new();
        // 句子过滤会拒绝这个过短片段，但概念提取照常工作
        let text = "Aljabar linear penting.";
        assert!(analyzer.extract_sentences(text).is_empty());
        assert!(!analyzer.extract_concepts(text).is_empty());
    }

    #[test]
    fn test_alternate_stop_word_set() {
        static MATH_STOP_WORDS: phf::Set<&'static str> = phf_set! { "matrix", "determinant" };

        let analyzer = ContentAnalyzer::with_config(AnalyzerConfig {
            stop_words: &MATH_STOP_WORDS,
            ..AnalyzerConfig::default()
        });

        let keywords = analyzer.extract_keywords(DETERMINANT_DOC);
        assert!(!keywords.contains(&"matrix".to_string()));
        assert!(!keywords.contains(&"determinant".to_string()));
        // 默认停用词表换掉后，"the" 这类词不再被过滤
        assert!(keywords.contains(&"when".to_string()));
    }

    #[test]
    fn test_empty_input() {
        let analyzer = ContentAnalyzer::new();
        let analysis = analyzer.analyze("");
        assert!(analysis.sentences.is_empty());
        assert!(analysis.keywords.is_empty());
        assert!(analysis.concepts.is_empty());
    }
}
