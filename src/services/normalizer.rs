//! 文本归一化 - 业务能力层
//!
//! 负责清洗 PDF / 纯文本提取器产出的原始文本：
//! 剔除伪影字符、折叠空白、恢复提取时丢失的词边界、替换连字。
//!
//! 对外只有一个纯函数契约：`&str -> String`，不感知任何文件格式。
//! 各个处理阶段顺序固定，后面的阶段假设前面的清理已经完成。

/// 文本归一化器
///
/// 职责：
/// - 只做字符串到字符串的转换
/// - 无失败分支（总是返回字符串，可能为空）
/// - 对自身输出再次归一化是无操作（幂等）
#[derive(Debug, Default, Clone, Copy)]
pub struct TextNormalizer;

impl TextNormalizer {
    pub fn new() -> Self {
        Self
    }

    /// 归一化一段原始提取文本
    ///
    /// 处理顺序：
    /// 1. 伪影字符：占位方框 `□` 与 U+FFFD 删除，不间断空格替换为普通空格
    /// 2. 空白折叠为单个空格
    /// 3. 单次从左到右扫描，恢复丢失的词边界
    /// 4. 连字替换（ﬁ ﬂ ﬀ ﬃ ﬄ）
    /// 5. 再次折叠空白并去除首尾空白
    pub fn normalize(&self, raw: &str) -> String {
        let text = strip_artifacts(raw);
        let text = collapse_whitespace(&text);
        let text = repair_word_boundaries(&text);
        let text = replace_ligatures(&text);
        collapse_whitespace(&text)
    }
}

/// 剔除已知的提取伪影字符
fn strip_artifacts(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '□' | '\u{fffd}' => {}
            '\u{a0}' => out.push(' '),
            _ => out.push(ch),
        }
    }
    out
}

/// 将所有空白序列折叠为单个空格（按词切分后重组，自带 trim 效果）
fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// 单次从左到右扫描，在检测到的边界丢失处补回一个空格
///
/// 游标每轮前进恰好一个源字符（插入空格只写入输出，不回扫），
/// 避免对插入内容的二次处理
fn repair_word_boundaries(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len() + text.len() / 8);

    for i in 0..chars.len() {
        let current = chars[i];
        out.push(current);

        let next = match chars.get(i + 1) {
            Some(&c) => c,
            None => break,
        };

        // 任一侧已有空格则跳过
        if current == ' ' || next == ' ' {
            continue;
        }

        // 小写接大写（驼峰断词），例如 "matriksselisihBerikut"
        if current.is_ascii_lowercase() && next.is_ascii_uppercase() {
            out.push(' ');
            continue;
        }

        // 大写接小写：仅当该大写字符紧跟在小写字符之后（保护连续大写的缩写词）
        if current.is_ascii_uppercase()
            && next.is_ascii_lowercase()
            && i > 0
            && chars[i - 1].is_ascii_lowercase()
        {
            out.push(' ');
            continue;
        }

        // 字母接数字
        if current.is_ascii_alphabetic() && next.is_ascii_digit() {
            out.push(' ');
            continue;
        }

        // 数字接字母
        if current.is_ascii_digit() && next.is_ascii_alphabetic() {
            out.push(' ');
            continue;
        }

        // 闭括号接字母
        if matches!(current, ')' | ']' | '}') && next.is_ascii_alphabetic() {
            out.push(' ');
            continue;
        }

        // 字母接开括号
        if current.is_ascii_alphabetic() && matches!(next, '(' | '[' | '{') {
            out.push(' ');
            continue;
        }

        // 句号接大写字母（句子边界）
        if current == '.' && next.is_ascii_uppercase() {
            out.push(' ');
            continue;
        }

        // 逗号接字母
        if current == ',' && next.is_ascii_alphabetic() {
            out.push(' ');
            continue;
        }

        // 冒号/分号接字母
        if matches!(current, ':' | ';') && next.is_ascii_alphabetic() {
            out.push(' ');
        }
    }

    out
}

/// 连字替换表，全局应用
fn replace_ligatures(text: &str) -> String {
    // 三字符连字先替换，避免被双字符规则部分命中
    text.replace('\u{fb03}', "ffi")
        .replace('\u{fb04}', "ffl")
        .replace('\u{fb01}', "fi")
        .replace('\u{fb02}', "fl")
        .replace('\u{fb00}', "ff")
}
