//! 编排层（Orchestration Layer）
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 批量处理器
//! - 管理应用生命周期（初始化、运行）
//! - 加载题目、检查输出路径、写出结果
//!
//! ### `batch_scheduler` - 批量调度器
//! - 控制并发数量（Semaphore）
//! - 汇总并排序所有题目的结果
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理输入文件)
//!     ↓
//! batch_scheduler (处理 Vec<Question>)
//!     ↓
//! workflow::AttemptRunner (处理单个 Question 的 k 次尝试)
//!     ↓
//! clients::ModelClient (单次模型调用)
//! ```

pub mod batch_processor;
pub mod batch_scheduler;

// 重新导出主要类型
pub use batch_processor::App;
pub use batch_scheduler::BatchScheduler;
