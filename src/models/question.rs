use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// 失败尝试的兜底答案
///
/// 保持 `\boxed{}` 形式，下游的答案提取对它同样适用。
pub const FAILURE_SENTINEL: &str = "$\\boxed{模型响应异常}$";

/// 输入的一道题
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    /// 外部分配的唯一ID，不一定连续
    pub id: i64,
    pub text: String,
}

impl Question {
    pub fn new(id: i64, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
        }
    }
}

/// 一次尝试的结果，每个 (question_id, attempt_index) 恰好一条
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptResult {
    #[serde(rename = "id")]
    pub question_id: i64,
    #[serde(rename = "attempt")]
    pub attempt_index: u32,
    pub response: String,
}

impl AttemptResult {
    pub fn new(question_id: i64, attempt_index: u32, response: impl Into<String>) -> Self {
        Self {
            question_id,
            attempt_index,
            response: response.into(),
        }
    }

    pub fn sentinel(question_id: i64, attempt_index: u32) -> Self {
        Self::new(question_id, attempt_index, FAILURE_SENTINEL)
    }

    /// 是否为兜底答案
    pub fn is_failure(&self) -> bool {
        self.response == FAILURE_SENTINEL
    }

    fn sort_key(&self) -> (i64, u32) {
        (self.question_id, self.attempt_index)
    }
}

/// 一次批量运行的最终结果
///
/// `records` 按 (question_id, attempt_index) 升序排列，与网络完成顺序无关。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutput {
    pub records: Vec<AttemptResult>,
    /// 实际派发的题目数量
    pub dispatched: usize,
    /// 是否因取消而提前停止派发
    pub cancelled: bool,
}

impl BatchOutput {
    /// 从任意到达顺序的记录构建，排序是记录集合的纯函数
    pub fn from_collected(mut records: Vec<AttemptResult>, dispatched: usize, cancelled: bool) -> Self {
        records.sort_by_key(AttemptResult::sort_key);
        Self {
            records,
            dispatched,
            cancelled,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn failed_count(&self) -> usize {
        self.records.iter().filter(|r| r.is_failure()).count()
    }

    /// 出现过的题目ID（升序、去重）
    pub fn question_ids(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = self.records.iter().map(|r| r.question_id).collect();
        ids.dedup();
        ids
    }
}

/// 处理区间 `[start, end)`，按输入位置计，不是按题目ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Window {
    pub start: usize,
    /// None 表示处理到末尾
    pub end: Option<usize>,
}

impl Window {
    pub fn new(start: usize, end: Option<usize>) -> Self {
        Self { start, end }
    }

    /// 处理全部题目
    pub fn full() -> Self {
        Self::default()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.end {
            Some(end) if self.start > end => Err(ConfigError::InvalidWindow {
                start: self.start,
                end,
            }),
            _ => Ok(()),
        }
    }

    /// 换算成对 `len` 个题目合法的下标范围，超出部分被截断
    pub fn resolve(&self, len: usize) -> Range<usize> {
        let end = self.end.map_or(len, |end| end.min(len));
        let start = self.start.min(end);
        start..end
    }
}
