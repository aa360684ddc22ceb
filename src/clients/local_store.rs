/// 本地存储
///
/// 未配置 Supabase 时使用：积分与学习历史保存在 TOML 文件中（或只在内存中）
use crate::clients::store::{AuthProvider, ProfileStore};
use crate::error::{AuthError, StoreError};
use crate::models::{AuthSession, HistoryEntry, SignUpOutcome};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info};

const HISTORY_TABLE: &str = "learning_history";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct LocalData {
    #[serde(default)]
    next_id: u64,
    #[serde(default)]
    points: BTreeMap<String, u64>,
    #[serde(default)]
    history: Vec<LocalHistoryRow>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LocalHistoryRow {
    id: u64,
    user_id: String,
    subject: String,
    created_at: DateTime<Utc>,
}

/// 本地档案存储
pub struct LocalStore {
    path: Option<PathBuf>,
    data: Mutex<LocalData>,
}

impl LocalStore {
    /// 只在内存中保存
    pub fn in_memory() -> Self {
        Self {
            path: None,
            data: Mutex::new(LocalData::default()),
        }
    }

    /// 打开 TOML 文件，不存在时从空数据开始
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let path_str = path.display().to_string();

        let data = if fs::try_exists(&path).await.unwrap_or(false) {
            let content = fs::read_to_string(&path)
                .await
                .map_err(|e| StoreError::file(&path_str, e))?;
            toml::from_str(&content).map_err(|source| StoreError::TomlParseFailed {
                path: path_str.clone(),
                source,
            })?
        } else {
            LocalData::default()
        };

        info!("本地存储: {} ({} 条历史)", path_str, data.history.len());
        Ok(Self {
            path: Some(path),
            data: Mutex::new(data),
        })
    }

    /// 写回文件
    async fn persist(&self, data: &LocalData) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let content = toml::to_string(data)?;
        fs::write(path, content)
            .await
            .map_err(|e| StoreError::file(path.display().to_string(), e))?;
        debug!("本地存储已保存: {}", path.display());
        Ok(())
    }

    /// 先写文件，成功后才替换内存数据
    async fn commit(&self, data: &mut LocalData, next: LocalData) -> Result<(), StoreError> {
        self.persist(&next).await?;
        *data = next;
        Ok(())
    }
}

#[async_trait]
impl ProfileStore for LocalStore {
    async fn fetch_points(&self, session: &AuthSession) -> Result<u64, StoreError> {
        let data = self.data.lock().await;
        Ok(data.points.get(&session.user_id).copied().unwrap_or(0))
    }

    async fn save_points(&self, session: &AuthSession, total: u64) -> Result<(), StoreError> {
        let mut data = self.data.lock().await;
        let mut next = data.clone();
        next.points.insert(session.user_id.clone(), total);
        self.commit(&mut data, next).await
    }

    async fn list_history(&self, session: &AuthSession) -> Result<Vec<HistoryEntry>, StoreError> {
        let data = self.data.lock().await;
        let mut rows: Vec<&LocalHistoryRow> = data
            .history
            .iter()
            .filter(|row| row.user_id == session.user_id)
            .collect();
        // 同一时刻写入的按写入顺序倒排
        rows.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));

        Ok(rows
            .into_iter()
            .map(|row| HistoryEntry {
                id: row.id.to_string(),
                subject: row.subject.clone(),
                created_at: row.created_at,
            })
            .collect())
    }

    async fn append_history(&self, session: &AuthSession, subject: &str) -> Result<(), StoreError> {
        let mut data = self.data.lock().await;
        let mut next = data.clone();
        next.next_id += 1;
        next.history.push(LocalHistoryRow {
            id: next.next_id,
            user_id: session.user_id.clone(),
            subject: subject.to_string(),
            created_at: Utc::now(),
        });
        self.commit(&mut data, next).await
    }

    async fn delete_history(&self, session: &AuthSession, entry_id: &str) -> Result<(), StoreError> {
        let mut data = self.data.lock().await;
        let mut next = data.clone();
        next.history
            .retain(|row| !(row.user_id == session.user_id && row.id.to_string() == entry_id));
        if next.history.len() == data.history.len() {
            return Err(StoreError::NotFound {
                table: HISTORY_TABLE.to_string(),
                id: entry_id.to_string(),
            });
        }
        self.commit(&mut data, next).await
    }
}

/// 离线认证：任何合法邮箱都能登录，用户 ID 为小写邮箱
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalAuth;

/// 与 Supabase 默认策略一致的最短密码长度
const MIN_PASSWORD_LEN: usize = 6;

impl LocalAuth {
    fn session_for(email: &str, password: &str) -> Result<AuthSession, AuthError> {
        let email = email.trim();
        if !email.contains('@') {
            return Err(AuthError::rejected("Unable to validate email address: invalid format"));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::rejected("Password should be at least 6 characters."));
        }
        Ok(AuthSession {
            user_id: email.to_lowercase(),
            email: email.to_string(),
            access_token: "local".to_string(),
        })
    }
}

#[async_trait]
impl AuthProvider for LocalAuth {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        Self::session_for(email, password)
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome, AuthError> {
        Self::session_for(email, password).map(SignUpOutcome::SignedIn)
    }

    async fn sign_out(&self, _session: &AuthSession) -> Result<(), AuthError> {
        Ok(())
    }
}
