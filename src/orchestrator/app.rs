//! 交互式终端应用 - 编排层
//!
//! ## 职责
//!
//! 1. **应用初始化**：启动日志、选择存储、创建朗读与背景音
//! 2. **命令循环**：读取 stdin 的命令，委托 `SessionOrchestrator` 执行
//! 3. **渲染**：把讲解、引用、测验与积分打印到 stdout
//!
//! 本模块不做业务判断，只做调度和展示。

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use crate::clients::{
    AuthProvider, LocalAuth, LocalStore, ProfileStore, SupabaseClient, TutorApi, TutorClient,
};
use crate::config::Config;
use crate::infrastructure::{ChimeAudio, TerminalSpeech};
use crate::models::{AnswerLetter, Mode, SignUpOutcome};
use crate::orchestrator::session::{QuizSubmission, RequestStatus, SessionOrchestrator};
use crate::services::grading::GradingState;
use crate::services::narration::{NarrationController, NarrationState};
use crate::utils::logging::log_startup;

const HELP: &str = "\
Commands:
  teach <topic>          ask the tutor to explain a topic
  quiz                   generate a quiz for the current topic
  answer <n> <A|B|C>     pick an answer for question n
  submit                 grade the quiz
  retry                  clear answers and try again
  speak                  start / stop narration
  mode <standard|pidgin|griot>
  griot | pidgin         toggle a mode
  history                list learning history
  open <n>               teach history entry n again
  delete <n>             delete history entry n
  login <email> <pw>     sign in
  signup <email> <pw>    create an account
  logout                 sign out
  status                 show mode, rank and points
  help | quit";

/// 终端命令
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Teach(String),
    Quiz,
    Answer { question: usize, letter: AnswerLetter },
    Submit,
    Retry,
    Speak,
    SetMode(Mode),
    ToggleGriot,
    TogglePidgin,
    History,
    Open(usize),
    Delete(usize),
    Login { email: String, password: String },
    SignUp { email: String, password: String },
    Logout,
    Status,
    Help,
    Quit,
}

impl Command {
    /// 解析一行输入；题号从 1 开始
    pub fn parse(line: &str) -> Result<Option<Self>, String> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        let (word, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();
        let mut args = rest.split_whitespace();

        let command = match word.to_lowercase().as_str() {
            "teach" | "ask" => {
                if rest.is_empty() {
                    return Err("usage: teach <topic>".to_string());
                }
                Command::Teach(rest.to_string())
            }
            "quiz" => Command::Quiz,
            "answer" => {
                let question = parse_index(args.next())?;
                let letter = args
                    .next()
                    .and_then(AnswerLetter::parse)
                    .ok_or_else(|| "usage: answer <n> <A|B|C>".to_string())?;
                Command::Answer { question, letter }
            }
            "submit" => Command::Submit,
            "retry" => Command::Retry,
            "speak" | "stop" => Command::Speak,
            "mode" => {
                let mode = args
                    .next()
                    .and_then(Mode::from_str)
                    .ok_or_else(|| "usage: mode <standard|pidgin|griot>".to_string())?;
                Command::SetMode(mode)
            }
            "griot" => Command::ToggleGriot,
            "pidgin" => Command::TogglePidgin,
            "history" => Command::History,
            "open" => Command::Open(parse_index(args.next())?),
            "delete" => Command::Delete(parse_index(args.next())?),
            "login" | "signup" => {
                let (Some(email), Some(password)) = (args.next(), args.next()) else {
                    return Err(format!("usage: {word} <email> <password>"));
                };
                let (email, password) = (email.to_string(), password.to_string());
                if word.eq_ignore_ascii_case("login") {
                    Command::Login { email, password }
                } else {
                    Command::SignUp { email, password }
                }
            }
            "logout" => Command::Logout,
            "status" => Command::Status,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => return Err(format!("unknown command: {other} (type 'help')")),
        };
        Ok(Some(command))
    }
}

/// 1 起始的序号转为 0 起始下标
fn parse_index(arg: Option<&str>) -> Result<usize, String> {
    match arg.and_then(|s| s.parse::<usize>().ok()) {
        Some(n) if n >= 1 => Ok(n - 1),
        _ => Err("expected a number starting at 1".to_string()),
    }
}

/// 应用主结构
pub struct App {
    session: SessionOrchestrator,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        log_startup(&config);

        let tutor: Arc<dyn TutorApi> = Arc::new(TutorClient::new(&config)?);

        let store: Arc<dyn ProfileStore>;
        let auth: Arc<dyn AuthProvider>;
        if config.uses_remote_store() {
            let client = Arc::new(SupabaseClient::new(&config)?);
            store = client.clone();
            auth = client;
        } else if config.local_store_path.is_empty() {
            store = Arc::new(LocalStore::in_memory());
            auth = Arc::new(LocalAuth);
        } else {
            store = Arc::new(LocalStore::open(&config.local_store_path).await?);
            auth = Arc::new(LocalAuth);
        }

        let narration = Arc::new(NarrationController::new(
            Arc::new(TerminalSpeech::new(config.narration_words_per_minute)),
            Arc::new(ChimeAudio::new(
                config.background_audio,
                Duration::from_millis(config.background_audio_interval_ms),
            )),
        ));

        Ok(Self {
            session: SessionOrchestrator::new(tutor, store, auth, narration),
        })
    }

    pub fn session(&self) -> &SessionOrchestrator {
        &self.session
    }

    /// 运行命令循环，直到 quit 或 stdin 结束
    pub async fn run(&self) -> Result<()> {
        println!("🇳🇬 AI Tutor NG - type 'help' for commands");
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        while let Some(line) = lines.next_line().await? {
            match Command::parse(&line) {
                Ok(Some(Command::Quit)) => break,
                Ok(Some(command)) => self.execute(command).await,
                Ok(None) => {}
                Err(message) => println!("{message}"),
            }
        }

        self.session.stop_narration();
        info!("👋 会话结束");
        Ok(())
    }

    /// 执行单条命令
    pub async fn execute(&self, command: Command) {
        match command {
            Command::Teach(topic) => self.teach(&topic).await,
            Command::Quiz => {
                println!("Generating quiz...");
                match self.session.request_quiz().await {
                    RequestStatus::Applied => self.render_quiz(),
                    RequestStatus::Ignored => println!("Ask about a topic first."),
                    // 测验失败只记录日志
                    RequestStatus::Failed | RequestStatus::Superseded => {}
                }
            }
            Command::Answer { question, letter } => {
                if let Err(e) = self.session.select_answer(question, letter) {
                    println!("{e}");
                }
            }
            Command::Submit => match self.session.submit_quiz().await {
                Some(QuizSubmission { outcome, awarded }) => {
                    self.render_quiz();
                    println!(
                        "{} {} / {}",
                        outcome.verdict(),
                        outcome.score,
                        outcome.total
                    );
                    if awarded {
                        println!("+{} Brain Points", outcome.points_awarded);
                    }
                }
                None => println!("No quiz yet."),
            },
            Command::Retry => {
                self.session.retry_quiz();
                self.render_quiz();
            }
            Command::Speak => match self.session.toggle_narration() {
                Some(NarrationState::Speaking { .. }) => println!("🔊 Listening..."),
                Some(NarrationState::Idle) => println!("🔇 Stopped."),
                None => println!("Nothing to read yet."),
            },
            Command::SetMode(mode) => {
                let toggles = self.session.set_mode(mode);
                println!("Mode: {}", toggles.narration_mode());
            }
            Command::ToggleGriot => {
                let toggles = self.session.toggle_griot();
                println!("Mode: {}", toggles.narration_mode());
            }
            Command::TogglePidgin => {
                let toggles = self.session.toggle_pidgin();
                println!("Mode: {}", toggles.narration_mode());
            }
            Command::History => self.render_history(),
            Command::Open(index) => match self.session.history().get(index) {
                Some(entry) => {
                    let subject = entry.subject.clone();
                    self.teach(&subject).await;
                }
                None => println!("No history entry {}.", index + 1),
            },
            Command::Delete(index) => match self.session.history().get(index) {
                Some(entry) => {
                    if !self.session.delete_history(&entry.id).await {
                        println!("Could not delete entry.");
                    }
                    self.render_history();
                }
                None => println!("No history entry {}.", index + 1),
            },
            Command::Login { email, password } => {
                match self.session.sign_in(&email, &password).await {
                    Ok(()) => {
                        println!("Welcome back!");
                        self.render_status();
                    }
                    Err(e) => println!("{e}"),
                }
            }
            Command::SignUp { email, password } => {
                match self.session.sign_up(&email, &password).await {
                    Ok(SignUpOutcome::SignedIn(_)) => {
                        println!("Account created.");
                        self.render_status();
                    }
                    Ok(SignUpOutcome::ConfirmationSent) => {
                        println!("Check your email to confirm your account.")
                    }
                    Err(e) => println!("{e}"),
                }
            }
            Command::Logout => match self.session.sign_out().await {
                Ok(()) => println!("Signed out."),
                Err(e) => println!("{e}"),
            },
            Command::Status => self.render_status(),
            Command::Help => println!("{HELP}"),
            Command::Quit => {}
        }
    }

    async fn teach(&self, topic: &str) {
        println!("Thinking...");
        match self.session.submit_query(topic).await {
            RequestStatus::Applied => self.render_explanation(),
            RequestStatus::Failed => {
                if let Some(error) = self.session.snapshot().error {
                    println!("❌ {error}");
                }
            }
            RequestStatus::Ignored => println!("usage: teach <topic>"),
            RequestStatus::Superseded => {}
        }
    }

    // ========== 渲染 ==========

    fn render_explanation(&self) {
        let state = self.session.snapshot();
        let Some(response) = state.response else {
            return;
        };

        println!("\n{}\n", response.explanation_text());

        if let Some(citation) = self.session.citation() {
            println!("📍 {}", citation.region);
            println!("   \"{}\"", citation.content);
            match citation.deep_link() {
                Some(link) => println!("   {} ({link})", citation.source),
                None => println!("   {}", citation.source),
            }
        }
        if let Some(visual) = &response.visual_aid {
            println!("🖼️ {visual}");
        }
        if let Some(video) = self.session.video_link() {
            println!("▶️ {video}");
        }
        println!();
    }

    fn render_quiz(&self) {
        let state = self.session.snapshot();
        let Some(engine) = state.quiz else {
            return;
        };
        if engine.questions().is_empty() {
            println!("The quiz came back empty. Try again.");
            return;
        }

        let submitted = engine.state() == GradingState::Submitted;
        for (i, question) in engine.questions().iter().enumerate() {
            println!("\nQ{}: {}", i + 1, question.question_text);
            let selected = engine.attempt().selections.get(&i).copied();
            for letter in AnswerLetter::ALL {
                let marker = match (submitted, selected == Some(letter)) {
                    (true, _) if letter == question.correct_letter => "✅",
                    (true, true) => "❌",
                    (false, true) => "👉",
                    _ => "  ",
                };
                println!("  {marker} {letter}) {}", question.option(letter));
            }
        }
        println!();
    }

    fn render_history(&self) {
        if !self.session.is_authenticated() {
            println!("Sign in to keep a learning history.");
            return;
        }
        let history = self.session.history();
        if history.is_empty() {
            println!("No history yet.");
            return;
        }
        for (i, entry) in history.iter().enumerate() {
            println!(
                "{:>3}. {}  ({})",
                i + 1,
                entry.subject,
                entry.created_at.format("%Y-%m-%d %H:%M")
            );
        }
    }

    fn render_status(&self) {
        let toggles = self.session.toggles();
        println!("Mode: {}", toggles.narration_mode());
        match self.session.session() {
            Some(account) => {
                let rank = self.session.rank();
                println!("Signed in as {}", account.email);
                println!("{} · {} Brain Points", rank.label(), self.session.points());
            }
            None => {
                warn!("未登录，积分与历史不会保存");
                println!("Guest (login to earn Brain Points)");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_teach_keeps_full_topic() {
        assert_eq!(
            Command::parse("teach  Newton's laws of motion ").unwrap(),
            Some(Command::Teach("Newton's laws of motion".to_string()))
        );
        assert!(Command::parse("teach").is_err());
    }

    #[test]
    fn test_parse_answer_is_one_based() {
        assert_eq!(
            Command::parse("answer 2 c").unwrap(),
            Some(Command::Answer {
                question: 1,
                letter: AnswerLetter::C
            })
        );
        assert!(Command::parse("answer 0 A").is_err());
        assert!(Command::parse("answer 1 D").is_err());
    }

    #[test]
    fn test_parse_mode_and_auth() {
        assert_eq!(
            Command::parse("mode griot").unwrap(),
            Some(Command::SetMode(Mode::Griot))
        );
        assert_eq!(
            Command::parse("login ada@example.org secret1").unwrap(),
            Some(Command::Login {
                email: "ada@example.org".to_string(),
                password: "secret1".to_string()
            })
        );
        assert!(Command::parse("signup ada@example.org").is_err());
    }

    #[test]
    fn test_parse_blank_and_unknown() {
        assert_eq!(Command::parse("   ").unwrap(), None);
        assert!(Command::parse("dance").is_err());
        assert_eq!(Command::parse("EXIT").unwrap(), Some(Command::Quit));
    }
}
