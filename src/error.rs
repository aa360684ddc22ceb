use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 教学 / 测验服务调用错误
    #[error("API错误: {0}")]
    Api(#[from] ApiError),
    /// 用户档案与历史存储错误
    #[error("存储错误: {0}")]
    Store(#[from] StoreError),
    /// 身份认证错误
    #[error("认证错误: {0}")]
    Auth(#[from] AuthError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
}

/// 教学 / 测验服务调用错误（连接类错误）
#[derive(Debug, Error)]
pub enum ApiError {
    /// 网络请求失败
    #[error("API请求失败 ({endpoint}): {source}")]
    RequestFailed {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    /// 服务返回非成功状态码
    #[error("API返回错误状态 ({endpoint}): {status}")]
    BadStatus { endpoint: String, status: u16 },
    /// JSON 解析失败
    #[error("JSON解析失败 ({endpoint}): {source}")]
    JsonParseFailed {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
}

/// 档案 / 历史存储错误
#[derive(Debug, Error)]
pub enum StoreError {
    /// 网络请求失败
    #[error("存储请求失败 ({table}): {source}")]
    RequestFailed {
        table: String,
        #[source]
        source: reqwest::Error,
    },
    /// 存储返回非成功状态码
    #[error("存储返回错误状态 ({table}): {status} {message}")]
    BadStatus {
        table: String,
        status: u16,
        message: String,
    },
    /// 记录不存在
    #[error("记录不存在 ({table}): {id}")]
    NotFound { table: String, id: String },
    /// 本地存储文件读写失败
    #[error("本地存储文件失败 ({path}): {source}")]
    File {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 本地存储 TOML 解析失败
    #[error("本地存储解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    /// 本地存储 TOML 序列化失败
    #[error("本地存储序列化失败: {0}")]
    TomlSerializeFailed(#[from] toml::ser::Error),
}

/// 身份认证错误
#[derive(Debug, Error)]
pub enum AuthError {
    /// 认证服务拒绝（密码错误、邮箱已注册等）
    #[error("{message}")]
    Rejected { message: String },
    /// 网络请求失败
    #[error("认证请求失败: {0}")]
    RequestFailed(#[from] reqwest::Error),
    /// 未登录
    #[error("尚未登录")]
    NotSignedIn,
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 配置文件读取失败
    #[error("读取配置文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 配置文件解析失败
    #[error("解析配置文件失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

// ========== 便捷构造函数 ==========

impl ApiError {
    /// 将 reqwest 错误归类为请求失败或解析失败
    pub fn from_reqwest(endpoint: impl Into<String>, err: reqwest::Error) -> Self {
        let endpoint = endpoint.into();
        if err.is_decode() {
            ApiError::JsonParseFailed {
                endpoint,
                source: err,
            }
        } else {
            ApiError::RequestFailed {
                endpoint,
                source: err,
            }
        }
    }
}

impl StoreError {
    /// 创建存储请求失败错误
    pub fn request_failed(table: impl Into<String>, source: reqwest::Error) -> Self {
        StoreError::RequestFailed {
            table: table.into(),
            source,
        }
    }

    /// 创建本地文件错误
    pub fn file(path: impl Into<String>, source: std::io::Error) -> Self {
        StoreError::File {
            path: path.into(),
            source,
        }
    }
}

impl AuthError {
    /// 创建认证被拒绝错误
    pub fn rejected(message: impl Into<String>) -> Self {
        AuthError::Rejected {
            message: message.into(),
        }
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_error_display() {
        let err: AppError = ApiError::BadStatus {
            endpoint: "/teach".to_string(),
            status: 503,
        }
        .into();
        assert_eq!(err.to_string(), "API错误: API返回错误状态 (/teach): 503");
    }

    #[test]
    fn test_auth_rejected_shows_provider_message() {
        let err = AuthError::rejected("Invalid login credentials");
        assert_eq!(err.to_string(), "Invalid login credentials");
    }
}
