use std::sync::Arc;

use anyhow::Context;
use reqwest::{header, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::AppConfig;
use crate::models::{ConfigResponse, OverviewRequest, OverviewResponse};

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Clone)]
pub struct FeedbackClient {
    inner: reqwest::Client,
    config: Arc<AppConfig>,
    base_url: String,
}

impl FeedbackClient {
    pub fn new(config: AppConfig) -> ClientResult<Self> {
        let base_url = normalize_base_url(&config.api_base_url);

        #[cfg_attr(target_arch = "wasm32", allow(unused_mut))]
        let mut builder = reqwest::Client::builder();
        #[cfg(not(target_arch = "wasm32"))]
        {
            builder = builder.timeout(config.request_timeout);
        }

        let client = builder
            .build()
            .context("failed to build reqwest client")
            .map_err(ClientError::Build)?;

        Ok(Self {
            inner: client,
            config: Arc::new(config),
            base_url,
        })
    }

    pub fn config(&self) -> Arc<AppConfig> {
        Arc::clone(&self.config)
    }

    pub async fn get_config(&self) -> ClientResult<ConfigResponse> {
        let builder = self.request(Method::GET, "api/config");
        self.send(builder).await
    }

    pub async fn post_overview(&self, request: &OverviewRequest) -> ClientResult<OverviewResponse> {
        let builder = self
            .request(Method::POST, "api/dashboard/overview")
            .json(request);
        self.send(builder).await
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = self.join_path(path);
        let mut builder = self
            .inner
            .request(method, url)
            .header(header::ACCEPT, "application/json");

        if let Some(token) = self.config.bearer_token() {
            builder = builder.header(header::AUTHORIZATION, token);
        }

        builder
    }

    fn join_path(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn send<T>(&self, builder: reqwest::RequestBuilder) -> ClientResult<T>
    where
        T: DeserializeOwned,
    {
        let response = builder.send().await.map_err(ClientError::from)?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(ClientError::from)?;
        decode_response(status, &bytes)
    }
}

fn normalize_base_url(input: &str) -> String {
    input.trim_end_matches('/').to_string()
}

fn decode_response<T>(status: StatusCode, bytes: &[u8]) -> ClientResult<T>
where
    T: DeserializeOwned,
{
    if bytes.is_empty() {
        return Err(ClientError::EmptyResponse(status));
    }

    if status.is_success() {
        return serde_json::from_slice(bytes).map_err(ClientError::from);
    }

    match serde_json::from_slice::<ApiErrorBody>(bytes) {
        Ok(body) => Err(ClientError::Api(body.with_status(status))),
        Err(_) => Err(ClientError::UnexpectedStatus {
            status,
            body: bytes.to_vec(),
        }),
    }
}

/// 后端错误体，兼容 `{message}` 与 `{error, status_code, path}` 两种格式。
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct ApiErrorBody {
    #[serde(alias = "error")]
    pub message: String,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(skip)]
    pub status: Option<StatusCode>,
}

impl ApiErrorBody {
    fn with_status(mut self, status: StatusCode) -> Self {
        self.status = Some(status);
        self
    }
}

impl std::fmt::Display for ApiErrorBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{code}: {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("failed to initialise http client: {0:#}")]
    Build(anyhow::Error),
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("api error: {0}")]
    Api(ApiErrorBody),
    #[error("empty response body: {0}")]
    EmptyResponse(StatusCode),
    #[error("unexpected status {status}: {}", String::from_utf8_lossy(.body))]
    UnexpectedStatus { status: StatusCode, body: Vec<u8> },
}

impl ClientError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Api(body) => body.status,
            Self::EmptyResponse(status) => Some(*status),
            Self::UnexpectedStatus { status, .. } => Some(*status),
            Self::Transport(err) => err.status(),
            _ => None,
        }
    }
}
