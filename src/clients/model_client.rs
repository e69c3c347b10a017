//! 模型 API 客户端
//!
//! 一道题 → 一次 HTTP 请求 → 一个答案字符串。
//! 失败一律以 `InvokeError` 返回，不在这里重试。

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::Config;
use crate::error::{AppError, AppResult, InvokeError};
use crate::utils::logging::truncate_text;

/// 错误响应体在错误信息里保留的最大字符数
const ERROR_BODY_PREVIEW: usize = 1000;

/// 模型调用能力
///
/// 每次调用恰好一次网络往返；成功时原样返回模型答案（不做 trim）。
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn invoke(&self, question_text: &str) -> Result<String, InvokeError>;
}

/// 请求体
#[derive(Debug, Serialize)]
pub struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: [ChatMessage<'a>; 2],
    pub temperature: f32,
    pub extra_body: ExtraBody,
}

#[derive(Debug, Serialize)]
pub struct ChatMessage<'a> {
    pub role: &'static str,
    pub content: &'a str,
}

#[derive(Debug, Serialize)]
pub struct ExtraBody {
    pub chat_template_kwargs: ChatTemplateKwargs,
}

#[derive(Debug, Serialize)]
pub struct ChatTemplateKwargs {
    pub enable_thinking: bool,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Option<Vec<Choice>>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// 基于 reqwest 的模型客户端
///
/// 内部的 `reqwest::Client` 自带连接池，整个批次共享一个实例即可。
#[derive(Debug, Clone)]
pub struct HttpModelClient {
    http: reqwest::Client,
    endpoint_url: String,
    auth_token: String,
    model_name: String,
    system_prompt: String,
    temperature: f32,
    enable_thinking: bool,
    timeout: Duration,
}

impl HttpModelClient {
    /// 创建新的模型客户端
    pub fn new(config: &Config) -> AppResult<Self> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .map_err(AppError::HttpClient)?;

        Ok(Self {
            http,
            endpoint_url: config.endpoint_url.clone(),
            auth_token: config.auth_token.clone(),
            model_name: config.model_name.clone(),
            system_prompt: config.system_prompt.clone(),
            temperature: config.temperature,
            enable_thinking: config.enable_thinking,
            timeout,
        })
    }

    /// 构建请求体
    pub fn build_request<'a>(&'a self, question_text: &'a str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model_name,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &self.system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: question_text,
                },
            ],
            temperature: self.temperature,
            extra_body: ExtraBody {
                chat_template_kwargs: ChatTemplateKwargs {
                    enable_thinking: self.enable_thinking,
                },
            },
        }
    }

    fn classify(&self, err: reqwest::Error) -> InvokeError {
        if err.is_timeout() {
            InvokeError::Timeout(self.timeout)
        } else {
            InvokeError::Transport(err)
        }
    }
}

#[async_trait]
impl ModelClient for HttpModelClient {
    async fn invoke(&self, question_text: &str) -> Result<String, InvokeError> {
        debug!("调用模型 API，模型: {}", self.model_name);
        debug!("题干长度: {} 字符", question_text.chars().count());

        let response = self
            .http
            .post(&self.endpoint_url)
            .bearer_auth(&self.auth_token)
            .json(&self.build_request(question_text))
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.classify(e))?;

        if status != reqwest::StatusCode::OK {
            return Err(InvokeError::Status {
                status: status.as_u16(),
                body: truncate_text(&body, ERROR_BODY_PREVIEW),
            });
        }

        let content = extract_content(&body)?;
        debug!("模型 API 调用成功");
        Ok(content)
    }
}

/// 从成功响应体中取出 `choices[0].message.content`
///
/// 内容原样返回；空字符串视为失败。
pub fn extract_content(body: &str) -> Result<String, InvokeError> {
    let parsed: ChatResponse = serde_json::from_str(body)?;

    let choice = parsed
        .choices
        .and_then(|choices| choices.into_iter().next())
        .ok_or(InvokeError::MissingContent("缺少choices字段"))?;

    let content = choice
        .message
        .ok_or(InvokeError::MissingContent("缺少message字段"))?
        .content
        .ok_or(InvokeError::MissingContent("缺少message.content字段"))?;

    if content.is_empty() {
        return Err(InvokeError::MissingContent("message.content为空"));
    }

    Ok(content)
}
