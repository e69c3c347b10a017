//! # Batch Answer
//!
//! 并发批量调用大模型接口、为每道题生成多个候选答案的 Rust 应用程序
//!
//! ## 架构设计
//!
//! ### ① 客户端层（Clients）
//! - `clients/` - 单次模型调用，负责超时与响应格式校验
//! - `ModelClient` - 调用能力的 trait，测试中可替换
//! - `HttpModelClient` - 基于 reqwest 的实现，共享连接池
//!
//! ### ② 流程层（Workflow）
//! - `workflow/` - 定义"一道题"的 k 次尝试
//! - `AttemptRunner` - 顺序执行 k 次调用，失败的尝试写入兜底答案
//!
//! ### ③ 编排层（Orchestration）
//! - `orchestrator/batch_scheduler` - 有界并发、结果汇总、确定性排序、取消
//! - `orchestrator/batch_processor` - 应用入口，串联加载、调度、写出
//!
//! ### ④ 业务能力层（Services）
//! - `ResultWriter` - 写原始 CSV 和 JSON 报告
//! - `format_converter` - 逗号分隔 → 制表符分隔
//! - `answer_extractor` - 提取 `\boxed{}` 中的最终答案
//!
//! ## 输出顺序
//!
//! 结果只在全部完成后排序一次：先按题目ID（数值）升序，再按尝试序号升序，
//! 与网络请求的完成顺序无关。

pub mod clients;
pub mod config;
pub mod error;
pub mod logger;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use clients::{HttpModelClient, ModelClient};
pub use config::Config;
pub use error::{AppError, AppResult, InvokeError};
pub use models::{AttemptResult, BatchOutput, Question, Window, FAILURE_SENTINEL};
pub use orchestrator::{App, BatchScheduler};
pub use workflow::AttemptRunner;
