/// 教学服务客户端
///
/// 封装 `/teach` 与 `/quiz` 两个接口
use crate::config::Config;
use crate::error::{ApiError, AppError, AppResult};
use crate::models::{QuizRequest, QuizResponse, TeachRequest, TutorResponse};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

const TEACH_ENDPOINT: &str = "teach";
const QUIZ_ENDPOINT: &str = "quiz";

/// 教学 / 测验服务
#[async_trait]
pub trait TutorApi: Send + Sync {
    /// 请求讲解
    async fn teach(&self, request: &TeachRequest) -> Result<TutorResponse, ApiError>;

    /// 请求测验题
    async fn quiz(&self, request: &QuizRequest) -> Result<QuizResponse, ApiError>;
}

/// 基于 HTTP 的教学服务客户端
pub struct TutorClient {
    http: reqwest::Client,
    base_url: String,
}

impl TutorClient {
    /// 创建新的教学服务客户端
    pub fn new(config: &Config) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| AppError::Api(ApiError::from_reqwest(&config.tutor_api_base_url, e)))?;

        Ok(Self {
            http,
            base_url: config.tutor_api_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// 发送 JSON POST 请求并解析响应
    async fn post_json<B, T>(&self, endpoint: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let url = format!("{}/{}", self.base_url, endpoint);
        debug!("POST {}", url);

        let response = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                warn!("请求 {} 失败: {}", url, e);
                ApiError::from_reqwest(endpoint, e)
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!("{} 返回错误状态: {}", url, status);
            return Err(ApiError::BadStatus {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::from_reqwest(endpoint, e))
    }
}

#[async_trait]
impl TutorApi for TutorClient {
    async fn teach(&self, request: &TeachRequest) -> Result<TutorResponse, ApiError> {
        self.post_json(TEACH_ENDPOINT, request).await
    }

    async fn quiz(&self, request: &QuizRequest) -> Result<QuizResponse, ApiError> {
        self.post_json(QUIZ_ENDPOINT, request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let config = Config {
            tutor_api_base_url: "https://tutor.example.org/".to_string(),
            ..Config::default()
        };
        let client = TutorClient::new(&config).unwrap();
        assert_eq!(client.base_url, "https://tutor.example.org");
    }

    /// 需要本地运行教学服务：cargo test -- --ignored
    #[tokio::test]
    #[ignore]
    async fn test_teach_against_local_service() {
        let client = TutorClient::new(&Config::default()).unwrap();
        let request = TeachRequest::new("Kinetic Energy", &Default::default());
        let response = client.teach(&request).await.unwrap();
        assert!(!response.explanation_text().is_empty());
    }
}
