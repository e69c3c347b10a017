//! 文件格式转换 - 业务能力层
//!
//! 只改变字段分隔符，不改变任何字段值。带引号的字段（答案里的逗号、换行）原样保留。

use std::fs::File;
use std::path::Path;

use tracing::info;

use crate::error::{AppError, AppResult};

/// 把逗号分隔文件转换为制表符分隔
pub fn comma_to_tab(source: impl AsRef<Path>, target: impl AsRef<Path>) -> AppResult<usize> {
    convert_delimiter(source, target, b',', b'\t')
}

/// 转换文件的字段分隔符
///
/// # 参数
/// - `source`: 源文件路径
/// - `target`: 目标文件路径（覆盖写入）
/// - `from` / `to`: 源/目标分隔符
///
/// # 返回
/// 返回转换的行数
pub fn convert_delimiter(
    source: impl AsRef<Path>,
    target: impl AsRef<Path>,
    from: u8,
    to: u8,
) -> AppResult<usize> {
    let source = source.as_ref();
    let target = target.as_ref();
    let source_display = source.display().to_string();
    let target_display = target.display().to_string();

    let input = File::open(source).map_err(|e| AppError::file_read_failed(&source_display, e))?;
    let output =
        File::create(target).map_err(|e| AppError::file_write_failed(&target_display, e))?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(from)
        .from_reader(input);
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(to)
        .terminator(csv::Terminator::CRLF)
        .from_writer(output);

    let mut rows = 0usize;
    for record in reader.byte_records() {
        let record = record.map_err(|e| AppError::file_read_failed(&source_display, e))?;
        writer
            .write_byte_record(&record)
            .map_err(|e| AppError::file_write_failed(&target_display, e))?;
        rows += 1;
    }
    writer
        .flush()
        .map_err(|e| AppError::file_write_failed(&target_display, e))?;

    info!(
        "✅ 文件格式转换成功: {} → {} ({} 行)",
        source_display, target_display, rows
    );
    Ok(rows)
}
