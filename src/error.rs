//! 错误类型
//!
//! - `AppError`：启动阶段的致命错误（配置、输入文件、输出路径），在派发任何任务之前返回
//! - `InvokeError`：单次模型调用失败，由 `AttemptRunner` 就地吸收为兜底答案，不向上传播

use std::time::Duration;

use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 输入数据错误
    #[error("输入错误: {0}")]
    Input(#[from] InputError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
    /// HTTP 客户端构建失败
    #[error("HTTP 客户端初始化失败: {0}")]
    HttpClient(#[source] reqwest::Error),
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 数值必须为正
    #[error("配置项 {name} 必须大于 0")]
    MustBePositive { name: &'static str },
    /// 处理区间非法
    #[error("处理区间非法: start_index {start} > end_index {end}")]
    InvalidWindow { start: usize, end: usize },
    /// 两个文件配置项指向同一路径
    #[error("配置项 {first} 与 {second} 指向同一文件: {path}")]
    PathConflict {
        first: &'static str,
        second: &'static str,
        path: String,
    },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// 输入数据错误
#[derive(Debug, Error)]
pub enum InputError {
    /// 题目 ID 不是整数
    #[error("第 {line} 行的题目ID无法解析为整数: '{value}'")]
    InvalidId { line: usize, value: String },
    /// 题目 ID 重复
    #[error("题目ID {id} 重复出现 (第 {line} 行)")]
    DuplicateId { id: i64, line: usize },
    /// 题目 ID 重复（调度前校验，不含行号）
    #[error("题目列表中存在重复ID: {id}")]
    DuplicateQuestion { id: i64 },
    /// CSV 记录解析失败
    #[error("第 {line} 行解析失败: {source}")]
    Malformed {
        line: usize,
        #[source]
        source: csv::Error,
    },
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 文件不存在
    #[error("文件不存在: {path}")]
    NotFound { path: String },
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 写入文件失败
    #[error("写入文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// 单次模型调用失败
///
/// 所有变体都被视为普通失败：调用方写入兜底答案，不重发同一次尝试。
#[derive(Debug, Error)]
pub enum InvokeError {
    /// 网络层失败（连接被拒、DNS 等）
    #[error("网络请求失败: {0}")]
    Transport(#[source] reqwest::Error),
    /// 超过配置的超时时间
    #[error("请求超时 ({0:?})")]
    Timeout(Duration),
    /// 非 200 状态码
    #[error("API请求失败，状态码: {status}, 响应内容: {body}")]
    Status { status: u16, body: String },
    /// 响应体不是合法 JSON
    #[error("响应数据解析错误: {0}")]
    Malformed(#[source] serde_json::Error),
    /// 缺少 choices / message / content，或 content 为空
    #[error("响应格式错误: {0}")]
    MissingContent(&'static str),
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建文件读取错误
    pub fn file_read_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::File(FileError::ReadFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }

    /// 创建文件写入错误
    pub fn file_write_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::File(FileError::WriteFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }
}

impl From<serde_json::Error> for InvokeError {
    fn from(err: serde_json::Error) -> Self {
        InvokeError::Malformed(err)
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
