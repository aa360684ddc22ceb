/// 档案与历史存储接口
use crate::error::{AuthError, StoreError};
use crate::models::{AuthSession, HistoryEntry, SignUpOutcome};
use async_trait::async_trait;

/// 积分与学习历史的持久化存储
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// 读取积分
    async fn fetch_points(&self, session: &AuthSession) -> Result<u64, StoreError>;

    /// 写入积分总数
    async fn save_points(&self, session: &AuthSession, total: u64) -> Result<(), StoreError>;

    /// 学习历史，按创建时间倒序
    async fn list_history(&self, session: &AuthSession) -> Result<Vec<HistoryEntry>, StoreError>;

    /// 追加一条学习历史
    async fn append_history(&self, session: &AuthSession, subject: &str) -> Result<(), StoreError>;

    /// 删除一条学习历史
    async fn delete_history(&self, session: &AuthSession, entry_id: &str) -> Result<(), StoreError>;
}

/// 身份认证服务
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// 邮箱密码登录
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AuthError>;

    /// 注册；可能需要邮箱确认
    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome, AuthError>;

    /// 退出登录
    async fn sign_out(&self, session: &AuthSession) -> Result<(), AuthError>;
}
