use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 用户档案；等级由积分推导，不单独存储
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub points: u64,
}

/// 学习历史条目
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub subject: String,
    pub created_at: DateTime<Utc>,
}

/// 登录会话
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    pub user_id: String,
    pub email: String,
    pub access_token: String,
}

/// 注册结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignUpOutcome {
    /// 直接登录成功
    SignedIn(AuthSession),
    /// 需要邮箱确认
    ConfirmationSent,
}

// 远程表的 id 可能是整数，也可能是 uuid 字符串
fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Visitor;
    use std::fmt;

    struct IdVisitor;

    impl<'de> Visitor<'de> for IdVisitor {
        type Value = String;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string or integer id")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.to_string())
        }
    }

    deserializer.deserialize_any(IdVisitor)
}
