use crate::error::ConfigError;
use serde::Deserialize;
use std::path::Path;

/// 程序配置
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 教学服务地址（/teach 与 /quiz 的共同前缀）
    pub tutor_api_base_url: String,
    /// 请求超时（秒）
    pub request_timeout_secs: u64,
    // --- 档案 / 历史存储 ---
    /// Supabase 项目地址，为空时使用本地存储
    pub supabase_url: String,
    pub supabase_anon_key: String,
    /// 本地存储文件路径，为空时只保存在内存中
    pub local_store_path: String,
    // --- 朗读 ---
    /// 终端朗读速度（每分钟词数，语速 1.0 时）
    pub narration_words_per_minute: u32,
    /// 是否播放背景音
    pub background_audio: bool,
    /// 背景音循环间隔（毫秒）
    pub background_audio_interval_ms: u64,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tutor_api_base_url: "http://127.0.0.1:8000".to_string(),
            request_timeout_secs: 60,
            supabase_url: String::new(),
            supabase_anon_key: String::new(),
            local_store_path: "tutor_profile.toml".to_string(),
            narration_words_per_minute: 170,
            background_audio: true,
            background_audio_interval_ms: 4000,
            verbose_logging: false,
        }
    }
}

impl Config {
    /// 从环境变量加载配置（若设置了 TUTOR_CONFIG，则先加载该 TOML 文件）
    pub fn from_env() -> Result<Self, ConfigError> {
        let base = match std::env::var("TUTOR_CONFIG") {
            Ok(path) if !path.is_empty() => Self::from_file(&path)?,
            _ => Self::default(),
        };
        base.with_env_overrides()
    }

    /// 从 TOML 文件加载配置，缺失的字段取默认值
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::TomlParseFailed {
            path: path.display().to_string(),
            source,
        })
    }

    /// 环境变量覆盖已有配置
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        Ok(Self {
            tutor_api_base_url: env_string("TUTOR_API_URL", self.tutor_api_base_url),
            request_timeout_secs: env_parse("REQUEST_TIMEOUT_SECS", self.request_timeout_secs)?,
            supabase_url: env_string("SUPABASE_URL", self.supabase_url),
            supabase_anon_key: env_string("SUPABASE_ANON_KEY", self.supabase_anon_key),
            local_store_path: env_string("LOCAL_STORE_PATH", self.local_store_path),
            narration_words_per_minute: env_parse(
                "NARRATION_WORDS_PER_MINUTE",
                self.narration_words_per_minute,
            )?,
            background_audio: env_parse("BACKGROUND_AUDIO", self.background_audio)?,
            background_audio_interval_ms: env_parse(
                "BACKGROUND_AUDIO_INTERVAL_MS",
                self.background_audio_interval_ms,
            )?,
            verbose_logging: env_parse("VERBOSE_LOGGING", self.verbose_logging)?,
        })
    }

    /// 是否配置了远程存储
    pub fn uses_remote_store(&self) -> bool {
        !self.supabase_url.is_empty() && !self.supabase_anon_key.is_empty()
    }
}

fn env_string(var_name: &str, default: String) -> String {
    std::env::var(var_name).unwrap_or(default)
}

fn env_parse<T: std::str::FromStr>(var_name: &str, default: T) -> Result<T, ConfigError> {
    match std::env::var(var_name) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::EnvVarParseFailed {
                var_name: var_name.to_string(),
                value,
                expected_type: std::any::type_name::<T>().to_string(),
            }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            tutor_api_base_url = "https://tutor.example.org"
            background_audio = false
            "#,
        )
        .unwrap();

        assert_eq!(config.tutor_api_base_url, "https://tutor.example.org");
        assert!(!config.background_audio);
        assert_eq!(config.request_timeout_secs, 60);
        assert!(!config.uses_remote_store());
    }

    #[test]
    fn test_env_parse_rejects_garbage() {
        std::env::set_var("AI_TUTOR_TEST_TIMEOUT", "soon");
        let err = env_parse::<u64>("AI_TUTOR_TEST_TIMEOUT", 5).unwrap_err();
        assert!(err.to_string().contains("AI_TUTOR_TEST_TIMEOUT"));
        std::env::remove_var("AI_TUTOR_TEST_TIMEOUT");
    }
}
