//! 朗读控制 - 业务能力层
//!
//! 把语音合成与循环背景音作为同一个独占资源管理：
//! - 同一个入口既开始也停止朗读（切换语义）
//! - 背景音只在语音进行时播放
//! - 语音引擎与背景音通过构造函数注入，测试时可替换

use anyhow::Result;
use phf::phf_map;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

use crate::models::Mode;

/// 背景音音量
pub const BACKGROUND_VOLUME: f32 = 0.05;

/// 朗读前去掉的 Markdown 符号
const MARKUP_CHARS: [char; 2] = ['*', '#'];

/// 目标口音的语言标签
const TARGET_LOCALE: &str = "en-NG";
const TARGET_NAME_HINTS: [&str; 2] = ["Nigeria", "African"];

/// 语速与音高
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prosody {
    pub rate: f32,
    pub pitch: f32,
}

const STANDARD_PROSODY: Prosody = Prosody {
    rate: 0.9,
    pitch: 1.0,
};

static PROSODY_TABLE: phf::Map<&'static str, Prosody> = phf_map! {
    "pidgin" => Prosody { rate: 1.1, pitch: 1.1 },
    "griot" => Prosody { rate: 0.85, pitch: 0.8 },
    "standard" => STANDARD_PROSODY,
};

/// 按模式取韵律
pub fn prosody_for(mode: Mode) -> Prosody {
    PROSODY_TABLE
        .get(mode.name())
        .copied()
        .unwrap_or(STANDARD_PROSODY)
}

/// 语音目录中的一个声音
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Voice {
    pub name: String,
    pub lang: String,
}

impl Voice {
    pub fn new(name: impl Into<String>, lang: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lang: lang.into(),
        }
    }
}

/// 一次朗读
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub text: String,
    /// 为空时使用引擎默认声音
    pub voice: Option<Voice>,
    pub rate: f32,
    pub pitch: f32,
}

/// 朗读自然结束时由引擎调用
pub type CompletionCallback = Box<dyn FnOnce() + Send + 'static>;

/// 语音合成引擎
pub trait SpeechEngine: Send + Sync {
    /// 可用声音目录
    fn voices(&self) -> Vec<Voice>;

    /// 开始朗读；朗读自然结束时调用 `on_end`
    fn speak(&self, utterance: Utterance, on_end: CompletionCallback) -> Result<()>;

    /// 取消当前朗读
    fn cancel(&self);
}

/// 循环背景音
pub trait BackgroundAudio: Send + Sync {
    /// 开始播放；可能因为播放权限等原因失败
    fn play(&self, volume: f32, looping: bool) -> Result<()>;

    /// 暂停并回到开头
    fn halt(&self);
}

/// 朗读状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NarrationState {
    Idle,
    Speaking { utterance_id: u64 },
}

#[derive(Debug)]
struct Inner {
    state: NarrationState,
    next_utterance_id: u64,
}

/// 朗读控制器
///
/// 全局最多一个进行中的朗读
pub struct NarrationController {
    speech: Arc<dyn SpeechEngine>,
    audio: Arc<dyn BackgroundAudio>,
    inner: Arc<Mutex<Inner>>,
}

impl NarrationController {
    /// 创建控制器，初始为空闲
    pub fn new(speech: Arc<dyn SpeechEngine>, audio: Arc<dyn BackgroundAudio>) -> Self {
        Self {
            speech,
            audio,
            inner: Arc::new(Mutex::new(Inner {
                state: NarrationState::Idle,
                next_utterance_id: 1,
            })),
        }
    }

    pub fn state(&self) -> NarrationState {
        lock(&self.inner).state
    }

    pub fn is_speaking(&self) -> bool {
        matches!(self.state(), NarrationState::Speaking { .. })
    }

    /// 朗读文本；正在朗读时等同于 `stop()`
    ///
    /// # 返回
    /// 返回调用后的状态
    pub fn speak(&self, text: &str, mode: Mode) -> NarrationState {
        let utterance_id = {
            let mut inner = lock(&self.inner);
            if matches!(inner.state, NarrationState::Speaking { .. }) {
                drop(inner);
                return self.stop();
            }
            let id = inner.next_utterance_id;
            inner.next_utterance_id += 1;
            // 先占用，引擎同步回调时也能正确结束
            inner.state = NarrationState::Speaking { utterance_id: id };
            id
        };

        let prosody = prosody_for(mode);
        let utterance = Utterance {
            text: strip_markup(text),
            voice: select_voice(&self.speech.voices()),
            rate: prosody.rate,
            pitch: prosody.pitch,
        };
        debug!(
            "开始朗读 #{}，模式: {}，声音: {:?}",
            utterance_id,
            mode,
            utterance.voice.as_ref().map(|v| &v.name)
        );

        if let Err(e) = self.audio.play(BACKGROUND_VOLUME, true) {
            warn!("背景音播放失败: {}", e);
        }

        let on_end = self.completion_callback(utterance_id);
        if let Err(e) = self.speech.speak(utterance, on_end) {
            warn!("语音引擎启动失败: {}", e);
            self.finish(utterance_id);
        }

        self.state()
    }

    /// 停止朗读与背景音；空闲时调用无副作用
    pub fn stop(&self) -> NarrationState {
        let was_speaking = {
            let mut inner = lock(&self.inner);
            let was = inner.state != NarrationState::Idle;
            inner.state = NarrationState::Idle;
            was
        };
        self.speech.cancel();
        self.audio.halt();
        if was_speaking {
            info!("⏹ 朗读已停止");
        }
        NarrationState::Idle
    }

    /// 自然结束回调，只结束属于自己的那次朗读
    fn completion_callback(&self, utterance_id: u64) -> CompletionCallback {
        let inner = Arc::clone(&self.inner);
        let audio = Arc::clone(&self.audio);
        Box::new(move || {
            if end_utterance(&inner, utterance_id) {
                audio.halt();
                info!("✓ 朗读 #{} 已结束", utterance_id);
            } else {
                debug!("忽略过期的朗读结束回调 #{}", utterance_id);
            }
        })
    }

    fn finish(&self, utterance_id: u64) {
        if end_utterance(&self.inner, utterance_id) {
            self.audio.halt();
        }
    }
}

fn end_utterance(inner: &Mutex<Inner>, utterance_id: u64) -> bool {
    let mut inner = lock(inner);
    if inner.state == (NarrationState::Speaking { utterance_id }) {
        inner.state = NarrationState::Idle;
        true
    } else {
        false
    }
}

fn lock(inner: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

/// 去掉 Markdown 符号
pub fn strip_markup(text: &str) -> String {
    text.replace(MARKUP_CHARS, "")
}

/// 选择尼日利亚口音的声音，找不到则用引擎默认
pub fn select_voice(voices: &[Voice]) -> Option<Voice> {
    voices
        .iter()
        .find(|v| {
            v.lang == TARGET_LOCALE || TARGET_NAME_HINTS.iter().any(|hint| v.name.contains(hint))
        })
        .cloned()
}
