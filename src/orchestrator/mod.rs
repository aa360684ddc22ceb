//! 编排层（Orchestration Layer）
//!
//! ## 模块划分
//!
//! ### `session` - 会话编排器
//! - 讲解 / 测验请求与过期结果丢弃
//! - 学习历史、积分与认证
//! - 朗读委托
//!
//! ### `app` - 终端应用
//! - 管理应用生命周期（初始化、命令循环）
//! - 选择存储实现（Supabase / 本地）
//! - 渲染讲解、引用、测验与积分
//!
//! ## 层次关系
//!
//! ```text
//! app (命令循环)
//!     ↓
//! session::SessionOrchestrator (单个会话)
//!     ↓
//! services (能力层：解析 / 评分 / 段位 / 朗读)
//!     ↓
//! clients + infrastructure (教学服务、存储、终端输出)
//! ```

pub mod app;
pub mod session;

// 重新导出主要类型
pub use app::{App, Command};
pub use session::{
    QuizSubmission, RequestStatus, SessionOrchestrator, SessionState, CONNECTION_ERROR,
};
