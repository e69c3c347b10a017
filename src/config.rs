use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::{AppError, AppResult, ConfigError};
use crate::models::Window;

/// 指定 TOML 配置文件路径的环境变量
pub const CONFIG_FILE_ENV: &str = "BATCH_CONFIG";

const DEFAULT_SYSTEM_PROMPT: &str = "你是一位金融领域专家，尤其擅长分析金融问题和生成简明扼要的回答。你惜字如金，回复问题会尽量精简但不缺少重要分析，严格遵守提问人的需要格式。";

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    // --- 模型接口配置 ---
    /// 完整的 chat/completions 地址
    pub endpoint_url: String,
    /// Bearer token（可以为空）
    pub auth_token: String,
    pub model_name: String,
    pub system_prompt: String,
    pub temperature: f32,
    /// 单次请求超时（秒）
    pub timeout_secs: u64,
    /// 是否请求模型的思考模式
    pub enable_thinking: bool,
    /// 是否跳过 TLS 证书校验（仅用于自签名的本地服务）
    pub accept_invalid_certs: bool,
    // --- 调度配置 ---
    /// 每道题的尝试次数 k
    pub attempts: u32,
    /// 同时处理的题目数量
    pub pool_width: usize,
    /// 处理区间起点（按输入位置，含）
    pub start_index: usize,
    /// 处理区间终点（按输入位置，不含），None 表示处理到末尾
    pub end_index: Option<usize>,
    // --- 文件配置 ---
    pub input_file: String,
    /// 逗号分隔的原始结果
    pub raw_output_file: String,
    /// 制表符分隔的最终结果
    pub output_file: String,
    /// 可选的 JSON 报告
    pub json_report_file: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint_url: "http://127.0.0.1:11230/v1/chat/completions".to_string(),
            auth_token: String::new(),
            model_name: "Qwen3-4b".to_string(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            temperature: 0.6,
            timeout_secs: 500,
            enable_thinking: true,
            accept_invalid_certs: false,
            attempts: 5,
            pool_width: 10,
            start_index: 0,
            end_index: None,
            input_file: "input.csv".to_string(),
            raw_output_file: "raw_result.csv".to_string(),
            output_file: "output.csv".to_string(),
            json_report_file: None,
        }
    }
}

impl Config {
    /// 加载配置：先读 `BATCH_CONFIG` 指向的 TOML 文件（如果有），再用环境变量覆盖
    pub fn load() -> AppResult<Self> {
        let base = match std::env::var(CONFIG_FILE_ENV) {
            Ok(path) if !path.is_empty() => Self::from_toml_file(&path)?,
            _ => Self::default(),
        };
        let config = base.with_overrides(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    /// 从 TOML 文件读取配置，未出现的字段使用默认值
    pub fn from_toml_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::file_read_failed(path.display().to_string(), e))?;
        Self::from_toml_str(&content).map_err(|e| match e {
            AppError::Config(ConfigError::TomlParseFailed { source, .. }) => {
                AppError::Config(ConfigError::TomlParseFailed {
                    path: path.display().to_string(),
                    source,
                })
            }
            other => other,
        })
    }

    pub fn from_toml_str(content: &str) -> AppResult<Self> {
        toml::from_str(content).map_err(|source| {
            AppError::Config(ConfigError::TomlParseFailed {
                path: String::new(),
                source,
            })
        })
    }

    /// 用外部键值覆盖配置，`lookup` 通常是 `std::env::var`
    ///
    /// 无法解析的值会被忽略并保留原值。
    pub fn with_overrides(self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            endpoint_url: lookup("LLM_ENDPOINT_URL").unwrap_or(self.endpoint_url),
            auth_token: lookup("LLM_AUTH_TOKEN").unwrap_or(self.auth_token),
            model_name: lookup("LLM_MODEL_NAME").unwrap_or(self.model_name),
            system_prompt: lookup("LLM_SYSTEM_PROMPT").unwrap_or(self.system_prompt),
            temperature: parsed(&lookup, "LLM_TEMPERATURE").unwrap_or(self.temperature),
            timeout_secs: parsed(&lookup, "LLM_TIMEOUT_SECS").unwrap_or(self.timeout_secs),
            enable_thinking: parsed(&lookup, "LLM_ENABLE_THINKING").unwrap_or(self.enable_thinking),
            accept_invalid_certs: parsed(&lookup, "ACCEPT_INVALID_CERTS")
                .unwrap_or(self.accept_invalid_certs),
            attempts: parsed(&lookup, "ATTEMPTS").unwrap_or(self.attempts),
            pool_width: parsed(&lookup, "POOL_WIDTH").unwrap_or(self.pool_width),
            start_index: parsed(&lookup, "START_INDEX").unwrap_or(self.start_index),
            end_index: parsed(&lookup, "END_INDEX").or(self.end_index),
            input_file: lookup("INPUT_FILE").unwrap_or(self.input_file),
            raw_output_file: lookup("RAW_OUTPUT_FILE").unwrap_or(self.raw_output_file),
            output_file: lookup("OUTPUT_FILE").unwrap_or(self.output_file),
            json_report_file: lookup("JSON_REPORT_FILE").or(self.json_report_file),
        }
    }

    /// 校验配置，任何错误都在派发任务之前暴露
    pub fn validate(&self) -> AppResult<()> {
        if self.attempts == 0 {
            return Err(ConfigError::MustBePositive { name: "attempts" }.into());
        }
        if self.pool_width == 0 {
            return Err(ConfigError::MustBePositive { name: "pool_width" }.into());
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::MustBePositive {
                name: "timeout_secs",
            }
            .into());
        }
        self.window().validate()?;
        self.check_distinct_paths()?;
        Ok(())
    }

    /// 输入与各输出文件必须互不相同，否则写出时会截断尚未读取的内容
    fn check_distinct_paths(&self) -> Result<(), ConfigError> {
        let mut files = vec![
            ("input_file", self.input_file.as_str()),
            ("raw_output_file", self.raw_output_file.as_str()),
            ("output_file", self.output_file.as_str()),
        ];
        if let Some(json) = &self.json_report_file {
            files.push(("json_report_file", json.as_str()));
        }

        for (i, (first, a)) in files.iter().enumerate() {
            for (second, b) in &files[i + 1..] {
                if Path::new(a) == Path::new(b) {
                    return Err(ConfigError::PathConflict {
                        first: *first,
                        second: *second,
                        path: a.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn window(&self) -> Window {
        Window::new(self.start_index, self.end_index)
    }
}

fn parsed<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<T> {
    lookup(name).and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_pool_is_bounded() {
        let config = Config::default();
        assert_eq!(config.pool_width, 10);
        assert_eq!(config.attempts, 5);
        assert_eq!(config.timeout_secs, 500);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_partial_fields_fall_back_to_defaults() {
        let config = Config::from_toml_str(
            r#"
            model_name = "qwen-test"
            attempts = 2
            end_index = 10
            "#,
        )
        .unwrap();
        assert_eq!(config.model_name, "qwen-test");
        assert_eq!(config.attempts, 2);
        assert_eq!(config.end_index, Some(10));
        assert_eq!(config.pool_width, 10);
        assert_eq!(config.input_file, "input.csv");
    }

    #[test]
    fn test_bad_toml_is_config_error() {
        let err = Config::from_toml_str("attempts = \"many\"").unwrap_err();
        assert!(matches!(
            err,
            AppError::Config(ConfigError::TomlParseFailed { .. })
        ));
    }

    #[test]
    fn test_overrides_replace_only_parseable_values() {
        let vars: HashMap<&str, &str> = [
            ("POOL_WIDTH", "3"),
            ("ATTEMPTS", "not-a-number"),
            ("LLM_AUTH_TOKEN", "secret"),
            ("START_INDEX", "5"),
            ("END_INDEX", "10"),
        ]
        .into_iter()
        .collect();

        let config = Config::default().with_overrides(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(config.pool_width, 3);
        assert_eq!(config.attempts, 5);
        assert_eq!(config.auth_token, "secret");
        assert_eq!(config.window(), Window::new(5, Some(10)));
    }

    #[test]
    fn test_validate_rejects_shared_file_paths() {
        let config = Config {
            raw_output_file: "out.csv".to_string(),
            output_file: "out.csv".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(AppError::Config(ConfigError::PathConflict {
                first: "raw_output_file",
                second: "output_file",
                ..
            }))
        ));

        let config = Config {
            json_report_file: Some("raw_result.csv".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(AppError::Config(ConfigError::PathConflict {
                second: "json_report_file",
                ..
            }))
        ));

        let config = Config {
            output_file: "input.csv".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            json_report_file: Some("report.json".to_string()),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_values_and_inverted_window() {
        let config = Config {
            pool_width: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            attempts: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            start_index: 8,
            end_index: Some(3),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(AppError::Config(ConfigError::InvalidWindow { start: 8, end: 3 }))
        ));
    }
}
