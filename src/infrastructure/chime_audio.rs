//! 终端背景音
//!
//! 用终端响铃模拟循环背景音；配置关闭时播放失败

use anyhow::{bail, Result};
use std::io::Write;
use std::sync::Mutex;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::services::narration::BackgroundAudio;

/// 终端响铃背景音
pub struct ChimeAudio {
    enabled: bool,
    interval: Duration,
    current: Mutex<Option<JoinHandle<()>>>,
}

impl ChimeAudio {
    pub fn new(enabled: bool, interval: Duration) -> Self {
        Self {
            enabled,
            interval,
            current: Mutex::new(None),
        }
    }

    fn replace_task(&self, task: Option<JoinHandle<()>>) {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = current.take() {
            previous.abort();
        }
        *current = task;
    }

    pub fn is_playing(&self) -> bool {
        self.current
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }
}

impl BackgroundAudio for ChimeAudio {
    fn play(&self, volume: f32, looping: bool) -> Result<()> {
        if !self.enabled {
            bail!("背景音已在配置中关闭");
        }
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            bail!("背景音需要 tokio 运行时");
        };
        debug!("背景音开始，音量 {}，循环 {}", volume, looping);

        let interval = self.interval;
        let audible = volume > 0.0;
        let task = runtime.spawn(async move {
            loop {
                if audible {
                    let mut stderr = std::io::stderr();
                    let _ = write!(stderr, "\x07");
                    let _ = stderr.flush();
                }
                if !looping {
                    break;
                }
                tokio::time::sleep(interval).await;
            }
        });

        // 重新开始即从头播放
        self.replace_task(Some(task));
        Ok(())
    }

    fn halt(&self) {
        self.replace_task(None);
    }
}
