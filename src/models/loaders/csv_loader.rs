use std::collections::HashSet;
use std::path::Path;

use tokio::fs;

use crate::error::{AppError, AppResult, FileError, InputError};
use crate::models::question::Question;

/// 从文件加载题目列表，保持输入顺序
///
/// 每行一道题：第一个字段按制表符切分，首段为题目ID，其余片段与后续逗号字段拼接为题干。
/// 上游有的阶段产出制表符分隔、有的产出逗号分隔，两种格式都按这一规则读取。
pub async fn load_questions(input_path: impl AsRef<Path>) -> AppResult<Vec<Question>> {
    let input_path = input_path.as_ref();
    let path_str = input_path.display().to_string();

    if !fs::try_exists(input_path).await.unwrap_or(false) {
        return Err(FileError::NotFound { path: path_str }.into());
    }

    let content = fs::read_to_string(input_path)
        .await
        .map_err(|e| AppError::file_read_failed(&path_str, e))?;

    let questions = parse_questions(&content)?;
    tracing::info!("成功加载 {} 个题目: {}", questions.len(), path_str);
    Ok(questions)
}

/// 解析题目文本内容
pub fn parse_questions(content: &str) -> AppResult<Vec<Question>> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut questions = Vec::new();
    let mut seen = HashSet::new();

    for record in reader.records() {
        let record = record.map_err(|source| {
            let line = source
                .position()
                .map(|p| p.line() as usize)
                .unwrap_or_default();
            InputError::Malformed { line, source }
        })?;
        let line = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or_default();

        let Some(first) = record.get(0) else {
            continue;
        };
        if record.len() == 1 && first.trim().is_empty() {
            continue;
        }

        let mut parts = first.split('\t');
        let raw_id = parts.next().unwrap_or_default().trim();
        // 只接受规范写法，保证写出的ID与读入的文本一致（"007"、"+5" 会被拒绝）
        let id = raw_id
            .parse::<i64>()
            .ok()
            .filter(|id| id.to_string() == raw_id)
            .ok_or_else(|| InputError::InvalidId {
                line,
                value: raw_id.to_string(),
            })?;

        if !seen.insert(id) {
            return Err(InputError::DuplicateId { id, line }.into());
        }

        let mut text: String = parts.collect();
        for field in record.iter().skip(1) {
            text.push_str(field);
        }

        questions.push(Question::new(id, text));
    }

    Ok(questions)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tab_delimited_lines() {
        let questions = parse_questions("1\t什么是市盈率？\n2\t债券久期的含义\n").unwrap();
        assert_eq!(
            questions,
            vec![
                Question::new(1, "什么是市盈率？"),
                Question::new(2, "债券久期的含义"),
            ]
        );
    }

    #[test]
    fn test_parse_comma_fields_are_concatenated() {
        let questions = parse_questions("7,下列说法正确的是,A. 甲,B. 乙\n").unwrap();
        assert_eq!(questions[0].id, 7);
        assert_eq!(questions[0].text, "下列说法正确的是A. 甲B. 乙");
    }

    #[test]
    fn test_parse_mixed_tab_and_comma() {
        let questions = parse_questions("12\t题干前半,后半\n").unwrap();
        assert_eq!(questions[0], Question::new(12, "题干前半后半"));
    }

    #[test]
    fn test_parse_skips_blank_lines_and_keeps_order() {
        let questions = parse_questions("\u{feff}10\ta\n\n7\tb\n9\tc\n").unwrap();
        let ids: Vec<i64> = questions.iter().map(|q| q.id).collect();
        assert_eq!(ids, vec![10, 7, 9]);
    }

    #[test]
    fn test_parse_rejects_non_numeric_id() {
        let err = parse_questions("1\tok\nabc\tbad\n").unwrap_err();
        match err {
            AppError::Input(InputError::InvalidId { line, value }) => {
                assert_eq!(line, 2);
                assert_eq!(value, "abc");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_parse_rejects_non_canonical_id() {
        for input in ["007\tq\n", "+5\tq\n", "-0\tq\n"] {
            let err = parse_questions(input).unwrap_err();
            assert!(
                matches!(err, AppError::Input(InputError::InvalidId { line: 1, .. })),
                "{input:?} gave {err}"
            );
        }
        let questions = parse_questions("-3\tq\n 0 \tz\n").unwrap();
        assert_eq!(questions[0].id, -3);
        assert_eq!(questions[1].id, 0);
    }

    #[test]
    fn test_parse_rejects_duplicate_id() {
        let err = parse_questions("3\ta\n3\tb\n").unwrap_err();
        assert!(matches!(
            err,
            AppError::Input(InputError::DuplicateId { id: 3, .. })
        ));
    }

    #[tokio::test]
    async fn test_load_missing_file_is_not_found() {
        let err = load_questions("/definitely/not/here.csv").await.unwrap_err();
        assert!(matches!(err, AppError::File(FileError::NotFound { .. })));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input.csv");
        std::fs::write(&path, "2\t第二题\n1\t第一题,\"含逗号, 的选项\"\n").unwrap();

        let questions = tokio_test::block_on(load_questions(&path)).unwrap();

        assert_eq!(
            questions,
            vec![
                Question::new(2, "第二题"),
                Question::new(1, "第一题含逗号, 的选项"),
            ]
        );
    }
}
