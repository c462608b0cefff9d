//! 生成处理上下文
//!
//! 封装"我正在处理第几个文档、输出到哪"这一信息

use std::fmt::Display;

/// 生成处理上下文
///
/// 包含处理单个生成请求所需的所有上下文信息
#[derive(Debug, Clone)]
pub struct GenerationCtx {
    /// 文档索引（仅用于日志显示）
    pub doc_index: usize,

    /// 输出文件名（不含扩展名），由请求标题派生
    pub output_slug: String,
}

impl GenerationCtx {
    /// 创建新的生成上下文
    pub fn new(doc_index: usize, title: &str) -> Self {
        Self {
            doc_index,
            output_slug: slugify(title),
        }
    }
}

impl Display for GenerationCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[文档 #{} 输出#{}]", self.doc_index, self.output_slug)
    }
}

/// 把标题转成可作为文件名的 slug
///
/// 字母数字保留（ASCII 小写化），其余字符折叠为单个连字符
fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut last_was_dash = false;

    for ch in title.chars() {
        if ch.is_alphanumeric() {
            slug.extend(ch.to_lowercase());
            last_was_dash = false;
        } else if !last_was_dash && !slug.is_empty() {
            slug.push('-');
            last_was_dash = true;
        }
    }

    let slug = slug.trim_end_matches('-').to_string();
    if slug.is_empty() {
        "untitled".to_string()
    } else {
        slug
    }
}
