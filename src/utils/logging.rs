/// 日志工具模块
///
/// 提供日志初始化和输出的辅助函数
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

/// 默认日志级别
const DEFAULT_FILTER: &str = "ai_tutor_ng=info";
const VERBOSE_FILTER: &str = "ai_tutor_ng=debug";

/// 初始化日志（输出到 stderr，stdout 留给讲解与朗读）
///
/// RUST_LOG 优先；未设置时按 `verbose` 选择级别
pub fn init(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose { VERBOSE_FILTER } else { DEFAULT_FILTER })
    });

    // 重复初始化（如测试中）时忽略错误
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .try_init();
}

/// 记录程序启动信息
///
/// # 参数
/// - `config`: 当前配置
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 AI Tutor NG 启动");
    info!("🌐 教学服务: {}", config.tutor_api_base_url);
    if config.uses_remote_store() {
        info!("🗄️ 档案存储: Supabase ({})", config.supabase_url);
    } else if config.local_store_path.is_empty() {
        info!("🗄️ 档案存储: 内存");
    } else {
        info!("🗄️ 档案存储: 本地文件 ({})", config.local_store_path);
    }
    info!("{}", "=".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度（字符数）
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
