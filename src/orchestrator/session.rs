//! 会话编排器 - 编排层
//!
//! ## 职责
//!
//! 1. 发起讲解 / 测验请求，把结果写入会话状态
//! 2. 讲解成功后追加学习历史（与最近一条重复时跳过）
//! 3. 测验评分后更新积分
//! 4. 登录、注册、退出与历史删除
//! 5. 把朗读委托给 `NarrationController`
//!
//! ## 并发
//!
//! 请求可以重叠。每次发起请求都领取一个递增的序号，
//! 只有最新序号的结果会写入状态，过期结果直接丢弃。
//! 状态锁从不跨越网络等待。

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, error, info, warn};

use crate::clients::{AuthProvider, ProfileStore, TutorApi};
use crate::error::AuthError;
use crate::models::{
    AnswerLetter, AuthSession, Citation, HistoryEntry, Mode, ModeToggles, QuizRequest,
    SignUpOutcome, TeachRequest, TutorResponse, UserProfile,
};
use crate::services::grading::{GradingError, QuizGradingEngine, QuizOutcome};
use crate::services::narration::{NarrationController, NarrationState};
use crate::services::rank::Rank;
use crate::services::{parse_citation, parse_quiz};
use crate::utils::encoding::encode_uri_component;
use crate::utils::logging::truncate_text;

/// 讲解请求失败时展示给用户的信息
pub const CONNECTION_ERROR: &str = "Server connection failed.";

/// 单个会话的可变状态
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub topic: String,
    pub loading: bool,
    pub quiz_loading: bool,
    pub error: Option<String>,
    pub response: Option<TutorResponse>,
    /// 题目与本次作答
    pub quiz: Option<QuizGradingEngine>,
}

/// 登录用户的档案缓存
#[derive(Debug, Clone, Default)]
struct Account {
    session: Option<AuthSession>,
    profile: UserProfile,
    /// 按创建时间倒序
    history: Vec<HistoryEntry>,
}

#[derive(Debug, Default)]
struct Inner {
    state: SessionState,
    account: Account,
    toggles: ModeToggles,
}

/// 请求结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStatus {
    /// 主题为空，未发起请求
    Ignored,
    /// 结果已写入状态
    Applied,
    /// 请求失败（已记录）
    Failed,
    /// 已有更新的请求，结果被丢弃
    Superseded,
}

/// 一次测验提交
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizSubmission {
    pub outcome: QuizOutcome,
    /// 本次提交是否加了积分
    pub awarded: bool,
}

/// 会话编排器
pub struct SessionOrchestrator {
    tutor: Arc<dyn TutorApi>,
    store: Arc<dyn ProfileStore>,
    auth: Arc<dyn AuthProvider>,
    narration: Arc<NarrationController>,
    inner: Mutex<Inner>,
    teach_seq: AtomicU64,
    quiz_seq: AtomicU64,
}

impl SessionOrchestrator {
    /// 创建编排器
    pub fn new(
        tutor: Arc<dyn TutorApi>,
        store: Arc<dyn ProfileStore>,
        auth: Arc<dyn AuthProvider>,
        narration: Arc<NarrationController>,
    ) -> Self {
        Self {
            tutor,
            store,
            auth,
            narration,
            inner: Mutex::new(Inner::default()),
            teach_seq: AtomicU64::new(0),
            quiz_seq: AtomicU64::new(0),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ========== 讲解 ==========

    /// 提交主题并请求讲解
    ///
    /// 清空上一次的讲解、测验与错误，停止朗读；
    /// 成功后（已登录时）追加学习历史
    pub async fn submit_query(&self, topic: &str) -> RequestStatus {
        let topic = topic.trim();
        if topic.is_empty() {
            return RequestStatus::Ignored;
        }

        let ticket = self.teach_seq.fetch_add(1, Ordering::SeqCst) + 1;
        // 旧主题的测验结果不再有效
        self.quiz_seq.fetch_add(1, Ordering::SeqCst);

        let request = {
            let mut inner = self.lock();
            let state = &mut inner.state;
            state.topic = topic.to_string();
            state.loading = true;
            state.quiz_loading = false;
            state.error = None;
            state.response = None;
            state.quiz = None;
            TeachRequest::new(topic, &inner.toggles)
        };
        self.narration.stop();

        info!(
            "📚 请求讲解 #{}: {} (语言: {:?}, 模式: {})",
            ticket, topic, request.language, request.mode
        );
        let result = self.tutor.teach(&request).await;

        {
            let mut inner = self.lock();
            if ticket != self.teach_seq.load(Ordering::SeqCst) {
                debug!("丢弃过期的讲解结果 #{}", ticket);
                return RequestStatus::Superseded;
            }
            inner.state.loading = false;
            match result {
                Ok(response) => {
                    info!(
                        "✓ 讲解已返回: {}",
                        truncate_text(response.explanation_text(), 60)
                    );
                    inner.state.response = Some(response);
                }
                Err(e) => {
                    warn!("⚠️ 讲解请求失败: {}", e);
                    inner.state.error = Some(CONNECTION_ERROR.to_string());
                    return RequestStatus::Failed;
                }
            }
        }

        self.save_to_history(topic).await;
        RequestStatus::Applied
    }

    /// 追加学习历史；未登录或与最近一条相同（忽略大小写）时跳过
    async fn save_to_history(&self, topic: &str) {
        let session = {
            let inner = self.lock();
            let Some(session) = inner.account.session.clone() else {
                return;
            };
            let is_duplicate = inner
                .account
                .history
                .first()
                .is_some_and(|latest| latest.subject.to_lowercase() == topic.to_lowercase());
            if is_duplicate {
                debug!("与最近一条历史相同，跳过: {}", topic);
                return;
            }
            session
        };

        if let Err(e) = self.store.append_history(&session, topic).await {
            warn!("⚠️ 写入学习历史失败: {}", e);
        }
        self.refresh_history().await;
    }

    // ========== 测验 ==========

    /// 为当前主题请求测验；失败只记录日志
    pub async fn request_quiz(&self) -> RequestStatus {
        let topic = {
            let mut inner = self.lock();
            if inner.state.topic.is_empty() {
                return RequestStatus::Ignored;
            }
            inner.state.quiz_loading = true;
            inner.state.topic.clone()
        };
        let ticket = self.quiz_seq.fetch_add(1, Ordering::SeqCst) + 1;

        info!("❓ 请求测验 #{}: {}", ticket, topic);
        let result = self
            .tutor
            .quiz(&QuizRequest {
                subject: topic.clone(),
            })
            .await;

        let mut inner = self.lock();
        if ticket != self.quiz_seq.load(Ordering::SeqCst) {
            debug!("丢弃过期的测验结果 #{}", ticket);
            return RequestStatus::Superseded;
        }
        inner.state.quiz_loading = false;
        match result {
            Ok(quiz) => {
                let questions = parse_quiz(&quiz.quiz);
                info!("✓ 测验已生成: {} 道题", questions.len());
                inner.state.quiz = Some(QuizGradingEngine::new(questions));
                RequestStatus::Applied
            }
            Err(e) => {
                error!("测验请求失败: {}", e);
                RequestStatus::Failed
            }
        }
    }

    /// 选择答案
    pub fn select_answer(&self, question_index: usize, letter: AnswerLetter) -> Result<(), GradingError> {
        let mut inner = self.lock();
        match inner.state.quiz.as_mut() {
            Some(engine) => engine.select(question_index, letter),
            None => Err(GradingError::NoSuchQuestion {
                index: question_index,
                total: 0,
            }),
        }
    }

    /// 提交测验；得分大于 0 且已登录时加积分
    ///
    /// 重复提交只返回结果，不重复加分
    pub async fn submit_quiz(&self) -> Option<QuizSubmission> {
        let (outcome, first_submit, authenticated) = {
            let mut inner = self.lock();
            let authenticated = inner.account.session.is_some();
            let engine = inner.state.quiz.as_mut()?;
            let first_submit = !engine.attempt().graded;
            (engine.submit(), first_submit, authenticated)
        };

        info!("📝 测验得分: {}/{}", outcome.score, outcome.total);
        let awarded = first_submit && outcome.should_award(authenticated);
        if awarded {
            self.update_points(outcome.points_awarded).await;
        }
        Some(QuizSubmission { outcome, awarded })
    }

    /// 清空作答重新开始
    pub fn retry_quiz(&self) {
        if let Some(engine) = self.lock().state.quiz.as_mut() {
            engine.reset();
        }
    }

    // ========== 积分与历史 ==========

    /// 加积分：先更新本地，再写存储；写入失败时重新读取
    pub async fn update_points(&self, added: u64) {
        let (session, total) = {
            let mut inner = self.lock();
            let Some(session) = inner.account.session.clone() else {
                return;
            };
            inner.account.profile.points += added;
            (session, inner.account.profile.points)
        };

        info!("🏆 +{} Brain Points，共 {}", added, total);
        if let Err(e) = self.store.save_points(&session, total).await {
            warn!("⚠️ 保存积分失败，重新读取: {}", e);
            self.refresh_points().await;
        }
    }

    /// 删除一条历史：先从缓存移除，存储失败时重新读取
    pub async fn delete_history(&self, entry_id: &str) -> bool {
        let session = {
            let mut inner = self.lock();
            let Some(session) = inner.account.session.clone() else {
                return false;
            };
            inner.account.history.retain(|entry| entry.id != entry_id);
            session
        };

        match self.store.delete_history(&session, entry_id).await {
            Ok(()) => true,
            Err(e) => {
                warn!("⚠️ 删除历史失败，重新读取: {}", e);
                self.refresh_history().await;
                false
            }
        }
    }

    /// 重新读取学习历史
    pub async fn refresh_history(&self) {
        let Some(session) = self.session() else {
            return;
        };
        match self.store.list_history(&session).await {
            Ok(history) => self.lock().account.history = history,
            Err(e) => warn!("读取学习历史失败: {}", e),
        }
    }

    /// 重新读取积分
    pub async fn refresh_points(&self) {
        let Some(session) = self.session() else {
            return;
        };
        match self.store.fetch_points(&session).await {
            Ok(points) => self.lock().account.profile.points = points,
            Err(e) => warn!("读取积分失败: {}", e),
        }
    }

    /// 登录后同时读取积分与历史
    async fn load_account(&self) {
        futures::join!(self.refresh_points(), self.refresh_history());
    }

    // ========== 认证 ==========

    /// 登录；失败信息只在登录交互中展示，不影响讲解会话
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<(), AuthError> {
        let session = self.auth.sign_in(email, password).await?;
        info!("✓ 已登录: {}", session.email);
        self.lock().account.session = Some(session);
        self.load_account().await;
        Ok(())
    }

    /// 注册；可能需要邮箱确认
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome, AuthError> {
        let outcome = self.auth.sign_up(email, password).await?;
        if let SignUpOutcome::SignedIn(session) = &outcome {
            info!("✓ 已注册并登录: {}", session.email);
            self.lock().account.session = Some(session.clone());
            self.load_account().await;
        }
        Ok(outcome)
    }

    /// 退出登录，清空档案缓存
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        let session = {
            let mut inner = self.lock();
            let account = std::mem::take(&mut inner.account);
            account.session.ok_or(AuthError::NotSignedIn)?
        };
        if let Err(e) = self.auth.sign_out(&session).await {
            warn!("退出登录请求失败: {}", e);
        }
        info!("已退出登录: {}", session.email);
        Ok(())
    }

    // ========== 朗读 ==========

    /// 朗读当前讲解；正在朗读时停止
    ///
    /// 没有讲解时返回 None
    pub fn toggle_narration(&self) -> Option<NarrationState> {
        let (text, mode) = {
            let inner = self.lock();
            let response = inner.state.response.as_ref()?;
            (
                response.explanation_text().to_string(),
                inner.toggles.narration_mode(),
            )
        };
        Some(self.narration.speak(&text, mode))
    }

    pub fn stop_narration(&self) {
        self.narration.stop();
    }

    pub fn is_narrating(&self) -> bool {
        self.narration.is_speaking()
    }

    // ========== 模式 ==========

    pub fn toggle_griot(&self) -> ModeToggles {
        let mut inner = self.lock();
        inner.toggles.toggle_griot();
        inner.toggles
    }

    pub fn toggle_pidgin(&self) -> ModeToggles {
        let mut inner = self.lock();
        inner.toggles.toggle_pidgin();
        inner.toggles
    }

    pub fn set_mode(&self, mode: Mode) -> ModeToggles {
        let mut inner = self.lock();
        inner.toggles.set(mode);
        inner.toggles
    }

    pub fn toggles(&self) -> ModeToggles {
        self.lock().toggles
    }

    // ========== 只读视图 ==========

    /// 会话状态快照
    pub fn snapshot(&self) -> SessionState {
        self.lock().state.clone()
    }

    /// 从当前讲解的标注文本推导引用
    pub fn citation(&self) -> Option<Citation> {
        self.lock()
            .state
            .response
            .as_ref()
            .map(|response| parse_citation(response.source_annotation()))
    }

    /// 当前主题的视频搜索链接
    pub fn video_link(&self) -> Option<String> {
        let inner = self.lock();
        if inner.state.topic.is_empty() {
            return None;
        }
        let query = format!("{} physics explanation", inner.state.topic);
        Some(format!(
            "https://www.youtube.com/results?search_query={}",
            encode_uri_component(&query)
        ))
    }

    pub fn session(&self) -> Option<AuthSession> {
        self.lock().account.session.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.lock().account.session.is_some()
    }

    pub fn points(&self) -> u64 {
        self.lock().account.profile.points
    }

    pub fn rank(&self) -> Rank {
        Rank::from_points(self.points())
    }

    pub fn history(&self) -> Vec<HistoryEntry> {
        self.lock().account.history.clone()
    }
}
