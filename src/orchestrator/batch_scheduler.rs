//! 批量题目调度器 - 编排层
//!
//! ## 职责
//!
//! 1. **并发控制**：使用 Semaphore 把同时执行的题目数限制在 `pool_width`
//! 2. **区间处理**：只派发 `Window` 选中的题目
//! 3. **结果汇总**：worker 通过 channel 把整题结果交给唯一的收集方
//! 4. **确定性排序**：全部完成后按 (题目ID, 尝试序号) 排序
//! 5. **取消**：收到取消信号后停止派发，已派发的题目照常完成
//!
//! ## 失败策略
//!
//! 单题处理中的 panic 在任务边界被捕获，记录日志后输出 k 条兜底记录，
//! 不影响其他题目。因此每道已派发的题目在结果里都恰好有 k 行。

use std::any::Any;
use std::collections::HashSet;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::clients::ModelClient;
use crate::config::Config;
use crate::error::{AppResult, ConfigError, InputError};
use crate::models::{AttemptResult, BatchOutput, Question, Window};
use crate::workflow::{sentinel_records, AttemptRunner};

/// 一道题的全部结果
#[derive(Debug)]
struct TaskOutcome {
    question_id: i64,
    records: Vec<AttemptResult>,
}

/// 批量调度器
pub struct BatchScheduler<C> {
    runner: Arc<AttemptRunner<C>>,
    attempts: u32,
    pool_width: usize,
}

impl<C: ModelClient + 'static> BatchScheduler<C> {
    pub fn new(runner: AttemptRunner<C>, attempts: u32, pool_width: usize) -> Self {
        Self {
            runner: Arc::new(runner),
            attempts,
            pool_width,
        }
    }

    /// 按配置创建调度器，单次调用超时取 `timeout_secs`
    pub fn from_config(client: C, config: &Config) -> Self {
        let runner = AttemptRunner::new(client, Duration::from_secs(config.timeout_secs));
        Self::new(runner, config.attempts, config.pool_width)
    }

    /// 处理 `window` 选中的题目
    ///
    /// # 参数
    /// - `questions`: 完整的题目列表（输入顺序）
    /// - `window`: 按位置计的处理区间
    /// - `cancel`: 取消信号，触发后不再派发新题目
    ///
    /// # 返回
    /// 按 (题目ID, 尝试序号) 排序的结果；配置或输入非法时在派发前返回错误
    pub async fn run(
        &self,
        questions: &[Question],
        window: Window,
        cancel: &CancellationToken,
    ) -> AppResult<BatchOutput> {
        self.validate(questions, window)?;

        let range = window.resolve(questions.len());
        let selected = &questions[range];
        let total = selected.len();

        let semaphore = Arc::new(Semaphore::new(self.pool_width));
        let (tx, rx) = mpsc::unbounded_channel::<TaskOutcome>();

        let dispatch = async move {
            let mut dispatched = 0usize;
            let mut cancelled = false;

            for question in selected {
                let permit = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => None,
                    permit = semaphore.clone().acquire_owned() => permit.ok(),
                };
                let Some(permit) = permit else {
                    cancelled = true;
                    warn!(
                        "⏹️ 收到取消信号，停止派发 (已派发 {}/{})",
                        dispatched, total
                    );
                    break;
                };

                let runner = Arc::clone(&self.runner);
                let tx = tx.clone();
                let question = question.clone();
                let k = self.attempts;

                tokio::spawn(async move {
                    let _permit = permit;
                    let records = match AssertUnwindSafe(runner.run(question.id, &question.text, k))
                        .catch_unwind()
                        .await
                    {
                        Ok(records) => records,
                        Err(panic) => {
                            error!(
                                "[问题 {}] ❌ 处理过程中发生错误，写入 {} 条兜底记录: {}",
                                question.id,
                                k,
                                panic_message(panic.as_ref())
                            );
                            sentinel_records(question.id, k)
                        }
                    };
                    // 收集方在所有发送端释放前不会退出
                    let _ = tx.send(TaskOutcome {
                        question_id: question.id,
                        records,
                    });
                });

                dispatched += 1;
            }

            // 释放最后一个发送端：在途任务结束后 channel 关闭，即为结束信号
            drop(tx);
            (dispatched, cancelled)
        };

        let ((dispatched, cancelled), records) = tokio::join!(dispatch, collect(rx, total));

        Ok(BatchOutput::from_collected(records, dispatched, cancelled))
    }

    fn validate(&self, questions: &[Question], window: Window) -> AppResult<()> {
        if self.attempts == 0 {
            return Err(ConfigError::MustBePositive { name: "attempts" }.into());
        }
        if self.pool_width == 0 {
            return Err(ConfigError::MustBePositive { name: "pool_width" }.into());
        }
        window.validate()?;

        let mut seen = HashSet::with_capacity(questions.len());
        for question in questions {
            if !seen.insert(question.id) {
                return Err(InputError::DuplicateQuestion { id: question.id }.into());
            }
        }
        Ok(())
    }
}

/// 唯一的收集方：按到达顺序追加，不做任何顺序假设
async fn collect(mut rx: UnboundedReceiver<TaskOutcome>, total: usize) -> Vec<AttemptResult> {
    let mut records = Vec::new();
    let mut finished = 0usize;

    while let Some(outcome) = rx.recv().await {
        finished += 1;
        let failed = outcome.records.iter().filter(|r| r.is_failure()).count();
        info!(
            "[问题 {}] ✅ 处理完成 ({}/{})，兜底 {} 条",
            outcome.question_id, finished, total, failed
        );
        records.extend(outcome.records);
    }

    records
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "未知错误".to_string()
    }
}
