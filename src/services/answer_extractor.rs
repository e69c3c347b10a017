//! 答案提取 - 业务能力层
//!
//! 从模型的自由文本中取出 `\boxed{...}` 里的最终答案

use std::sync::OnceLock;

use regex::Regex;

fn boxed_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // 允许一层嵌套花括号，例如 \boxed{\text{A}}
    PATTERN.get_or_init(|| {
        Regex::new(r"\\boxed\s*\{((?:[^{}]|\{[^{}]*\})*)\}").expect("boxed pattern is valid")
    })
}

/// 提取最后一个 `\boxed{...}` 的内容（去掉首尾空白）
///
/// 模型常在推理过程中多次写 boxed，只有最后一个是最终答案。
pub fn extract_boxed_answer(text: &str) -> Option<String> {
    boxed_pattern()
        .captures_iter(text)
        .last()
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|answer| !answer.is_empty())
}

/// 把选择题答案规整为大写、去重、排序后的字母串，例如 "b, A" → "AB"
///
/// 出现 A-D 以外的英文字母，或者一个选项字母都没有时返回 None。
pub fn normalize_choice(answer: &str) -> Option<String> {
    let cleaned = answer.replace("\\text", "").replace("\\mathrm", "");

    let mut letters = Vec::new();
    for c in cleaned.chars().filter(char::is_ascii_alphabetic) {
        let upper = c.to_ascii_uppercase();
        if !('A'..='D').contains(&upper) {
            return None;
        }
        letters.push(upper);
    }
    letters.sort_unstable();
    letters.dedup();

    if letters.is_empty() {
        None
    } else {
        Some(letters.into_iter().collect())
    }
}
