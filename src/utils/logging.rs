//! 日志工具模块
//!
//! 提供运行级别的日志横幅和文本截断
use std::ops::Range;

use tracing::info;

use crate::config::Config;
use crate::models::BatchOutput;

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 批量推理模式");
    info!("🤖 模型: {} @ {}", config.model_name, config.endpoint_url);
    info!(
        "📊 并发数: {} | 每题尝试: {} 次 | 超时: {} 秒",
        config.pool_width, config.attempts, config.timeout_secs
    );
    info!("{}", "=".repeat(60));
}

/// 记录题目加载信息
///
/// # 参数
/// - `total`: 文件中的题目总数
/// - `range`: 本次处理的下标范围
pub fn log_questions_loaded(total: usize, range: &Range<usize>) {
    info!("✓ 找到 {} 个题目", total);
    if range.start == 0 && range.end == total {
        info!("📋 本次处理全部题目");
    } else {
        info!(
            "📋 本次处理第 {} 到第 {} 个题目 (共 {} 个)",
            range.start + 1,
            range.end,
            range.len()
        );
    }
}

/// 打印最终统计信息
pub fn print_final_stats(output: &BatchOutput, config: &Config) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("📄 题目: {} | 结果行: {}", output.dispatched, output.len());
    info!(
        "✅ 成功: {}/{}",
        output.len() - output.failed_count(),
        output.len()
    );
    info!("❌ 兜底: {}", output.failed_count());
    if output.cancelled {
        info!("⏹️ 运行被取消，未派发的题目没有输出");
    }
    info!("{}", "=".repeat(60));
    info!(
        "\n结果已保存至: {} 和 {}",
        config.raw_output_file, config.output_file
    );
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度（字符数）
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
