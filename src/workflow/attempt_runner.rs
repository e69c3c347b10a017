//! 单题多次尝试 - 流程层
//!
//! 对一道题顺序调用模型 k 次，每次调用对应一个新的尝试序号。
//! 这里的"重试"是为了采样多样的答案，不是对同一次请求的退避重发：
//! 某次失败只会让该序号写入兜底答案，不会再发一次。

use std::time::Duration;

use tracing::{info, warn};

use crate::clients::ModelClient;
use crate::error::InvokeError;
use crate::models::{AttemptResult, FAILURE_SENTINEL};
use crate::utils::logging::truncate_text;

/// 日志里答案预览的长度
const ANSWER_PREVIEW: usize = 80;

/// 单题尝试执行器
///
/// 不持有题目列表，不关心并发；并发只存在于题目之间。
pub struct AttemptRunner<C> {
    client: C,
    call_timeout: Duration,
}

impl<C: ModelClient> AttemptRunner<C> {
    /// `call_timeout` 是每次调用的绝对上限，客户端自身没有超时也能按时返回
    pub fn new(client: C, call_timeout: Duration) -> Self {
        Self {
            client,
            call_timeout,
        }
    }

    /// 对一道题执行 k 次尝试
    ///
    /// # 返回
    /// 恰好 k 条记录，`attempt_index` 依次为 0..k-1，与失败次数无关
    pub async fn run(&self, question_id: i64, question_text: &str, k: u32) -> Vec<AttemptResult> {
        let mut results = Vec::with_capacity(k as usize);

        for attempt_index in 0..k {
            let response = match self.attempt(question_text).await {
                Ok(answer) => {
                    info!(
                        "[问题 {}] ✓ 尝试 {}/{} 成功: {}",
                        question_id,
                        attempt_index + 1,
                        k,
                        truncate_text(&answer, ANSWER_PREVIEW)
                    );
                    answer
                }
                Err(e) => {
                    warn!(
                        "[问题 {}] ⚠️ 尝试 {}/{} 失败，写入兜底答案: {}",
                        question_id,
                        attempt_index + 1,
                        k,
                        e
                    );
                    FAILURE_SENTINEL.to_string()
                }
            };

            results.push(AttemptResult::new(question_id, attempt_index, response));
        }

        results
    }

    async fn attempt(&self, question_text: &str) -> Result<String, InvokeError> {
        match tokio::time::timeout(self.call_timeout, self.client.invoke(question_text)).await {
            Ok(result) => result,
            Err(_) => Err(InvokeError::Timeout(self.call_timeout)),
        }
    }
}

/// 整道题都无法处理时使用的 k 条兜底记录
pub fn sentinel_records(question_id: i64, k: u32) -> Vec<AttemptResult> {
    (0..k)
        .map(|attempt_index| AttemptResult::sentinel(question_id, attempt_index))
        .collect()
}
