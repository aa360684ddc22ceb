//! 终端朗读引擎
//!
//! 按语速把文本逐词输出到终端，自然结束后触发完成回调

use anyhow::{Context, Result};
use std::io::Write;
use std::sync::Mutex;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::services::narration::{CompletionCallback, SpeechEngine, Utterance, Voice};

/// 终端朗读引擎
pub struct TerminalSpeech {
    words_per_minute: u32,
    current: Mutex<Option<JoinHandle<()>>>,
}

impl TerminalSpeech {
    pub fn new(words_per_minute: u32) -> Self {
        Self {
            words_per_minute: words_per_minute.max(1),
            current: Mutex::new(None),
        }
    }

    /// 每个词的停顿
    fn word_delay(&self, rate: f32) -> Duration {
        let words_per_minute = (self.words_per_minute as f32 * rate.max(0.1)).max(1.0);
        Duration::from_secs_f32(60.0 / words_per_minute)
    }

    fn replace_task(&self, task: Option<JoinHandle<()>>) {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = current.take() {
            previous.abort();
        }
        *current = task;
    }
}

impl SpeechEngine for TerminalSpeech {
    fn voices(&self) -> Vec<Voice> {
        vec![
            Voice::new("Terminal Narrator", "en-US"),
            Voice::new("Terminal Narrator (Nigeria)", "en-NG"),
        ]
    }

    fn speak(&self, utterance: Utterance, on_end: CompletionCallback) -> Result<()> {
        let runtime = tokio::runtime::Handle::try_current().context("终端朗读需要 tokio 运行时")?;
        let delay = self.word_delay(utterance.rate);
        debug!(
            "终端朗读: {} 个字符，每词 {:?}，音高 {}",
            utterance.text.len(),
            delay,
            utterance.pitch
        );

        let words: Vec<String> = utterance.text.split_whitespace().map(str::to_string).collect();
        let task = runtime.spawn(async move {
            let mut stdout = std::io::stdout();
            for word in words {
                let _ = write!(stdout, "{} ", word);
                let _ = stdout.flush();
                tokio::time::sleep(delay).await;
            }
            let _ = writeln!(stdout);
            on_end();
        });

        self.replace_task(Some(task));
        Ok(())
    }

    fn cancel(&self) {
        self.replace_task(None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_word_delay_follows_rate() {
        let speech = TerminalSpeech::new(120);
        assert_eq!(speech.word_delay(1.0), Duration::from_millis(500));
        assert!(speech.word_delay(0.85) > speech.word_delay(1.1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_completion_fires_after_last_word() {
        let speech = TerminalSpeech::new(6000);
        let finished = Arc::new(AtomicBool::new(false));
        let flag = finished.clone();

        speech
            .speak(
                Utterance {
                    text: "one two".to_string(),
                    voice: None,
                    rate: 1.0,
                    pitch: 1.0,
                },
                Box::new(move || flag.store(true, Ordering::SeqCst)),
            )
            .unwrap();

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(finished.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_suppresses_completion() {
        let speech = TerminalSpeech::new(60);
        let finished = Arc::new(AtomicBool::new(false));
        let flag = finished.clone();

        speech
            .speak(
                Utterance {
                    text: "a long story about the tortoise".to_string(),
                    voice: None,
                    rate: 1.0,
                    pitch: 1.0,
                },
                Box::new(move || flag.store(true, Ordering::SeqCst)),
            )
            .unwrap();
        speech.cancel();

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert!(!finished.load(Ordering::SeqCst));
    }
}
