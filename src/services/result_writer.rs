//! 结果写入服务 - 业务能力层
//!
//! 只负责把排好序的结果写到磁盘，不关心结果是怎么产生的

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};

use crate::error::{AppError, AppResult};
use crate::models::BatchOutput;
use crate::services::answer_extractor::{extract_boxed_answer, normalize_choice};

/// JSON 报告中的一行
#[derive(Debug, Serialize)]
struct ReportEntry<'a> {
    id: i64,
    attempt: u32,
    response: &'a str,
    extracted_answer: Option<String>,
    /// 选择题答案规整后的字母串，非选择题为 null
    normalized_answer: Option<String>,
    failed: bool,
}

/// 结果写入服务
pub struct ResultWriter {
    raw_path: PathBuf,
    json_path: Option<PathBuf>,
}

impl ResultWriter {
    /// 创建结果写入服务
    ///
    /// # 参数
    /// - `raw_path`: 逗号分隔的原始结果文件
    /// - `json_path`: 可选的 JSON 报告
    pub fn new(raw_path: impl Into<PathBuf>, json_path: Option<PathBuf>) -> Self {
        Self {
            raw_path: raw_path.into(),
            json_path,
        }
    }

    /// 在派发任何请求之前确认输出路径可写
    pub fn prepare(&self) -> AppResult<()> {
        ensure_writable(&self.raw_path)?;
        if let Some(json_path) = &self.json_path {
            ensure_writable(json_path)?;
        }
        Ok(())
    }

    /// 写入原始结果：无表头，每行 `id,attempt,response`
    pub fn write_raw(&self, output: &BatchOutput) -> AppResult<()> {
        let path_str = self.raw_path.display().to_string();
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .terminator(csv::Terminator::CRLF)
            .from_path(&self.raw_path)
            .map_err(|e| AppError::file_write_failed(&path_str, e))?;

        for record in &output.records {
            writer
                .serialize(record)
                .map_err(|e| AppError::file_write_failed(&path_str, e))?;
        }
        writer
            .flush()
            .map_err(|e| AppError::file_write_failed(&path_str, e))?;

        info!("✓ 原始结果已写入: {} ({} 行)", path_str, output.len());
        Ok(())
    }

    /// 写入 JSON 报告（未配置路径时跳过）
    pub fn write_json_report(&self, output: &BatchOutput) -> AppResult<()> {
        let Some(json_path) = &self.json_path else {
            return Ok(());
        };
        let path_str = json_path.display().to_string();

        let entries: Vec<ReportEntry<'_>> = output
            .records
            .iter()
            .map(|record| {
                let failed = record.is_failure();
                let extracted_answer = if failed {
                    None
                } else {
                    extract_boxed_answer(&record.response)
                };
                ReportEntry {
                    id: record.question_id,
                    attempt: record.attempt_index,
                    response: &record.response,
                    normalized_answer: extracted_answer.as_deref().and_then(normalize_choice),
                    extracted_answer,
                    failed,
                }
            })
            .collect();

        let file = File::create(json_path).map_err(|e| AppError::file_write_failed(&path_str, e))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &entries)
            .map_err(|e| AppError::file_write_failed(&path_str, e))?;
        writer
            .flush()
            .map_err(|e| AppError::file_write_failed(&path_str, e))?;

        info!("✓ JSON 报告已写入: {}", path_str);
        Ok(())
    }
}

/// 创建（或截断）文件以确认路径可写
pub fn ensure_writable(path: &Path) -> AppResult<()> {
    debug!("检查输出路径: {}", path.display());
    OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)
        .map(|_| ())
        .map_err(|e| AppError::file_write_failed(path.display().to_string(), e))
}
