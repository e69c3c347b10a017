//! 批量处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责把各层串起来。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：校验配置、创建共享的模型客户端
//! 2. **加载题目**：读取输入文件（`Vec<Question>`）
//! 3. **启动前检查**：确认输出路径可写，任何启动错误都在派发前暴露
//! 4. **委托调度**：交给 `BatchScheduler` 处理选中的区间
//! 5. **写出结果**：原始 CSV → 制表符文件 → 可选 JSON 报告
//! 6. **全局统计**：输出成功/兜底数量

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::clients::HttpModelClient;
use crate::config::Config;
use crate::models::{load_questions, BatchOutput};
use crate::orchestrator::batch_scheduler::BatchScheduler;
use crate::services::format_converter::comma_to_tab;
use crate::services::result_writer::{ensure_writable, ResultWriter};
use crate::utils::logging::{log_questions_loaded, log_startup, print_final_stats};

/// 应用主结构
pub struct App {
    config: Config,
    scheduler: BatchScheduler<HttpModelClient>,
    writer: ResultWriter,
    cancel: CancellationToken,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        config.validate().context("配置校验失败")?;

        log_startup(&config);

        let client = HttpModelClient::new(&config)?;
        let scheduler = BatchScheduler::from_config(client, &config);
        let writer = ResultWriter::new(
            &config.raw_output_file,
            config.json_report_file.as_ref().map(PathBuf::from),
        );

        Ok(Self {
            config,
            scheduler,
            writer,
            cancel: CancellationToken::new(),
        })
    }

    /// 取消信号，触发后不再派发新题目
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<BatchOutput> {
        let questions = load_questions(&self.config.input_file)
            .await
            .context("加载题目失败")?;

        if questions.is_empty() {
            warn!("⚠️ 输入文件中没有题目，仍会写出空结果文件");
        }

        let window = self.config.window();
        log_questions_loaded(questions.len(), &window.resolve(questions.len()));

        self.writer.prepare().context("输出路径不可写")?;
        ensure_writable(Path::new(&self.config.output_file)).context("输出路径不可写")?;

        let output = self
            .scheduler
            .run(&questions, window, &self.cancel)
            .await
            .context("调度启动失败")?;

        self.writer.write_raw(&output)?;
        comma_to_tab(&self.config.raw_output_file, &self.config.output_file)?;
        self.writer.write_json_report(&output)?;

        print_final_stats(&output, &self.config);

        Ok(output)
    }
}
