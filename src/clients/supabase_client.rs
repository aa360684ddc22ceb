/// Supabase 客户端
///
/// 档案 / 历史走 PostgREST（`/rest/v1`），登录注册走 GoTrue（`/auth/v1`）
use crate::clients::store::{AuthProvider, ProfileStore};
use crate::config::Config;
use crate::error::{AuthError, StoreError};
use crate::models::{AuthSession, HistoryEntry, SignUpOutcome};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

const PROFILES_TABLE: &str = "profiles";
const HISTORY_TABLE: &str = "learning_history";

/// Supabase 客户端，同时实现存储与认证
#[derive(Clone)]
pub struct SupabaseClient {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
}

impl SupabaseClient {
    /// 创建新的 Supabase 客户端
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.supabase_url.trim_end_matches('/').to_string(),
            anon_key: config.supabase_anon_key.clone(),
        })
    }

    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    /// 带用户令牌的请求
    fn authorized(&self, builder: reqwest::RequestBuilder, session: &AuthSession) -> reqwest::RequestBuilder {
        builder
            .header("apikey", &self.anon_key)
            .bearer_auth(&session.access_token)
    }

    /// 检查 PostgREST 响应状态
    async fn check_status(table: &str, response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        warn!("存储表 {} 返回错误状态 {}: {}", table, status, message);
        Err(StoreError::BadStatus {
            table: table.to_string(),
            status: status.as_u16(),
            message,
        })
    }

    /// 发送 GoTrue 请求，失败时取出服务端的错误说明
    async fn auth_request(&self, path: &str, body: &Value) -> Result<Value, AuthError> {
        let response = self
            .http
            .post(self.auth_url(path))
            .header("apikey", &self.anon_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let payload: Value = response.json().await.unwrap_or(Value::Null);
        if !status.is_success() {
            return Err(AuthError::rejected(auth_error_message(&payload)));
        }
        Ok(payload)
    }
}

/// GoTrue 的错误字段名不统一
fn auth_error_message(payload: &Value) -> String {
    ["error_description", "msg", "message", "error"]
        .iter()
        .find_map(|key| payload.get(*key).and_then(|v| v.as_str()))
        .unwrap_or("Authentication failed")
        .to_string()
}

#[derive(Debug, Deserialize)]
struct GoTrueUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GoTrueSession {
    access_token: String,
    user: GoTrueUser,
}

impl GoTrueSession {
    fn into_session(self, email: &str) -> AuthSession {
        AuthSession {
            user_id: self.user.id,
            email: self.user.email.unwrap_or_else(|| email.to_string()),
            access_token: self.access_token,
        }
    }
}

#[derive(Debug, Deserialize)]
struct PointsRow {
    points: Option<u64>,
}

#[async_trait]
impl ProfileStore for SupabaseClient {
    async fn fetch_points(&self, session: &AuthSession) -> Result<u64, StoreError> {
        let request = self
            .http
            .get(self.rest_url(PROFILES_TABLE))
            .query(&[("select", "points".to_string()), ("id", format!("eq.{}", session.user_id))]);
        let response = self
            .authorized(request, session)
            .send()
            .await
            .map_err(|e| StoreError::request_failed(PROFILES_TABLE, e))?;

        let rows: Vec<PointsRow> = Self::check_status(PROFILES_TABLE, response)
            .await?
            .json()
            .await
            .map_err(|e| StoreError::request_failed(PROFILES_TABLE, e))?;

        let points = rows.first().and_then(|row| row.points).unwrap_or(0);
        debug!("读取积分: {}", points);
        Ok(points)
    }

    async fn save_points(&self, session: &AuthSession, total: u64) -> Result<(), StoreError> {
        let request = self
            .http
            .patch(self.rest_url(PROFILES_TABLE))
            .query(&[("id", format!("eq.{}", session.user_id))])
            .json(&json!({ "points": total }));
        let response = self
            .authorized(request, session)
            .send()
            .await
            .map_err(|e| StoreError::request_failed(PROFILES_TABLE, e))?;
        Self::check_status(PROFILES_TABLE, response).await?;
        Ok(())
    }

    async fn list_history(&self, session: &AuthSession) -> Result<Vec<HistoryEntry>, StoreError> {
        let request = self.http.get(self.rest_url(HISTORY_TABLE)).query(&[
            ("select", "*".to_string()),
            ("user_id", format!("eq.{}", session.user_id)),
            ("order", "created_at.desc".to_string()),
        ]);
        let response = self
            .authorized(request, session)
            .send()
            .await
            .map_err(|e| StoreError::request_failed(HISTORY_TABLE, e))?;

        let entries: Vec<HistoryEntry> = Self::check_status(HISTORY_TABLE, response)
            .await?
            .json()
            .await
            .map_err(|e| StoreError::request_failed(HISTORY_TABLE, e))?;
        debug!("读取学习历史: {} 条", entries.len());
        Ok(entries)
    }

    async fn append_history(&self, session: &AuthSession, subject: &str) -> Result<(), StoreError> {
        let request = self
            .http
            .post(self.rest_url(HISTORY_TABLE))
            .header("Prefer", "return=minimal")
            .json(&json!({ "user_id": session.user_id, "subject": subject }));
        let response = self
            .authorized(request, session)
            .send()
            .await
            .map_err(|e| StoreError::request_failed(HISTORY_TABLE, e))?;
        Self::check_status(HISTORY_TABLE, response).await?;
        Ok(())
    }

    async fn delete_history(&self, session: &AuthSession, entry_id: &str) -> Result<(), StoreError> {
        let request = self
            .http
            .delete(self.rest_url(HISTORY_TABLE))
            .query(&[("id", format!("eq.{}", entry_id))]);
        let response = self
            .authorized(request, session)
            .send()
            .await
            .map_err(|e| StoreError::request_failed(HISTORY_TABLE, e))?;
        Self::check_status(HISTORY_TABLE, response).await?;
        Ok(())
    }
}

#[async_trait]
impl AuthProvider for SupabaseClient {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        let payload = self
            .auth_request(
                "token?grant_type=password",
                &json!({ "email": email, "password": password }),
            )
            .await?;
        let session: GoTrueSession = serde_json::from_value(payload)
            .map_err(|e| AuthError::rejected(format!("Unexpected auth response: {}", e)))?;
        Ok(session.into_session(email))
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome, AuthError> {
        let payload = self
            .auth_request("signup", &json!({ "email": email, "password": password }))
            .await?;

        // 开启邮箱确认时不返回 access_token
        match serde_json::from_value::<GoTrueSession>(payload) {
            Ok(session) => Ok(SignUpOutcome::SignedIn(session.into_session(email))),
            Err(_) => Ok(SignUpOutcome::ConfirmationSent),
        }
    }

    async fn sign_out(&self, session: &AuthSession) -> Result<(), AuthError> {
        let response = self
            .http
            .post(self.auth_url("logout"))
            .header("apikey", &self.anon_key)
            .bearer_auth(&session.access_token)
            .send()
            .await?;
        if !response.status().is_success() {
            warn!("退出登录返回错误状态: {}", response.status());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_error_message_variants() {
        assert_eq!(
            auth_error_message(&json!({"error": "invalid_grant", "error_description": "Invalid login credentials"})),
            "Invalid login credentials"
        );
        assert_eq!(
            auth_error_message(&json!({"msg": "User already registered"})),
            "User already registered"
        );
        assert_eq!(auth_error_message(&Value::Null), "Authentication failed");
    }

    #[test]
    fn test_urls() {
        let config = Config {
            supabase_url: "https://abc.supabase.co/".to_string(),
            supabase_anon_key: "anon".to_string(),
            ..Config::default()
        };
        let client = SupabaseClient::new(&config).unwrap();
        assert_eq!(client.rest_url(HISTORY_TABLE), "https://abc.supabase.co/rest/v1/learning_history");
        assert_eq!(client.auth_url("signup"), "https://abc.supabase.co/auth/v1/signup");
    }

    #[test]
    fn test_signup_without_token_means_confirmation() {
        let payload = json!({"id": "u1", "email": "ada@example.com", "confirmation_sent_at": "2025-01-01T00:00:00Z"});
        assert!(serde_json::from_value::<GoTrueSession>(payload).is_err());
    }
}
