//! # AI Tutor NG
//!
//! 面向尼日利亚学生的交互式辅导客户端
//!
//! ## 架构设计
//!
//! 本系统采用四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有终端输出，只暴露能力
//! - `TerminalSpeech` - 逐词朗读
//! - `ChimeAudio` - 循环背景音
//!
//! ### ② 客户端层（Clients）
//! - `clients/` - 外部服务
//! - `TutorClient` - /teach 与 /quiz
//! - `SupabaseClient` / `LocalStore` - 档案、历史与认证
//!
//! ### ③ 业务能力层（Services）
//! - `services/` - 纯逻辑，不做 I/O
//! - `parse_citation` / `parse_quiz` - 解析服务返回的文本
//! - `QuizGradingEngine` - 作答与评分
//! - `Rank` - 积分段位
//! - `NarrationController` - 朗读状态机
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/session` - 单个会话的全部状态与流程
//! - `orchestrator/app` - 终端命令循环
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::{Citation, Mode, ModeToggles, QuizQuestion, TutorResponse};
pub use orchestrator::{App, SessionOrchestrator};
pub use services::{NarrationController, QuizGradingEngine, Rank};
